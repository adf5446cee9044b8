//! Example: correct and segment one radiograph, dump its contours as JSON.
//!
//! Loads an 8- or 16-bit grayscale PNG/TIFF, runs the full `Pipeline`
//! (denoise, pseudo-flatfield, watershed, contour extraction) and writes the
//! contour set with the clip report to a JSON file next to the input.
//!
//! Run from the workspace root:
//!   cargo run -p xripl --example segment_radiograph -- --help
//!   RUST_LOG=debug cargo run -p xripl --example segment_radiograph -- \
//!       --input data/shot.tiff --pitch 4.5 --seed 320,240 --seed 100,80

use std::time::Instant;

use anyhow::{Context, Result, bail};
use clap::Parser;
use image::{ImageBuffer, ImageReader, Luma};
use serde::Serialize;
use xripl::{
    ClaheConfig, ClipReport, ContourSet, ImageView, MarkerStrategy, Pipeline, PipelineConfig,
    Radiograph, Seed, equalize_adapthist, to_f32,
};

// ── CLI ───────────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(about = "Flatfield-correct a radiograph and extract watershed region contours")]
struct Args {
    /// Grayscale PNG or TIFF radiograph
    #[arg(long)]
    input: String,

    /// JSON `PipelineConfig`; omitted fields take their defaults
    #[arg(long)]
    config: Option<String>,

    /// Physical size of one pixel; contours are reported in pixels without it
    #[arg(long)]
    pitch: Option<f32>,

    /// Seed pixel `x,y`; repeat for several markers. Selects seeded markers.
    #[arg(long = "seed", value_parser = parse_seed)]
    seeds: Vec<Seed>,

    /// Output JSON path (default: <input stem>_contours.json next to input)
    #[arg(long)]
    out: Option<String>,

    /// Also write a CLAHE-equalized view of the corrected image (16-bit PNG)
    #[arg(long)]
    equalized: Option<String>,
}

fn parse_seed(s: &str) -> std::result::Result<Seed, String> {
    let (x, y) = s
        .split_once(',')
        .ok_or_else(|| format!("expected `x,y`, got `{s}`"))?;
    let x = x.trim().parse().map_err(|e| format!("bad x in `{s}`: {e}"))?;
    let y = y.trim().parse().map_err(|e| format!("bad y in `{s}`: {e}"))?;
    Ok(Seed::new(x, y))
}

// ── JSON DTO ──────────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct Report<'a> {
    input: &'a str,
    width: usize,
    height: usize,
    /// Wall-clock time for the whole pipeline, in milliseconds.
    elapsed_ms: f64,
    markers: usize,
    clip: ClipReport,
    contours: &'a ContourSet,
}

// ── Main ──────────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let img_path = &args.input;
    let out_path = args.out.clone().unwrap_or_else(|| {
        let p = std::path::Path::new(img_path);
        let stem = p.file_stem().unwrap_or_default().to_string_lossy();
        let dir = p.parent().unwrap_or(std::path::Path::new("."));
        dir.join(format!("{stem}_contours.json"))
            .to_string_lossy()
            .into_owned()
    });

    let mut config = match &args.config {
        Some(path) => {
            let text =
                std::fs::read_to_string(path).with_context(|| format!("reading {path}"))?;
            serde_json::from_str::<PipelineConfig>(&text)
                .with_context(|| format!("parsing {path}"))?
        }
        None => PipelineConfig::default(),
    };
    if !args.seeds.is_empty() {
        config.markers = MarkerStrategy::Seeds;
    } else if config.markers == MarkerStrategy::Seeds {
        bail!("config selects seeded markers but no --seed was given");
    }
    let pipeline = Pipeline::new(config).context("validating pipeline config")?;

    // 16-bit keeps the detector's dynamic range for 8-bit inputs too.
    let gray = ImageReader::open(img_path)
        .with_context(|| format!("opening {img_path}"))?
        .decode()
        .with_context(|| format!("decoding {img_path}"))?
        .into_luma16();
    let width = gray.width() as usize;
    let height = gray.height() as usize;
    let view = ImageView::from_slice(width, height, width, gray.as_raw().as_slice())
        .context("wrapping decoded pixels")?;

    let mut frame = Radiograph::new(to_f32(&view));
    if let Some(pitch) = args.pitch {
        frame = frame.with_pixel_pitch(pitch).context("setting pixel pitch")?;
    }
    println!("loaded {img_path}: {width}x{height}");

    let seeds = (!args.seeds.is_empty()).then_some(args.seeds.as_slice());
    let t0 = Instant::now();
    let out = pipeline
        .run(&frame, seeds)
        .with_context(|| format!("processing {img_path}"))?;
    let elapsed_ms = t0.elapsed().as_secs_f64() * 1e3;

    println!(
        "{} markers, {} contours, {:.2}% clipped  ({elapsed_ms:.2} ms)",
        out.markers.len(),
        out.contours.len(),
        out.clip.fraction() * 100.0
    );
    for entry in out.contours.largest(5) {
        let d = &entry.descriptors;
        println!(
            "  label {} #{}: area {:.3}, perimeter {:.3}, r_eff {:.3}, centroid ({:.2}, {:.2})",
            entry.key.label,
            entry.key.component,
            d.area,
            d.perimeter,
            d.effective_radius,
            d.centroid.x,
            d.centroid.y
        );
    }

    let report = Report {
        input: img_path,
        width,
        height,
        elapsed_ms,
        markers: out.markers.len(),
        clip: out.clip,
        contours: &out.contours,
    };
    let out_file =
        std::fs::File::create(&out_path).with_context(|| format!("creating {out_path}"))?;
    serde_json::to_writer_pretty(out_file, &report)
        .with_context(|| format!("writing JSON to {out_path}"))?;

    println!("results written to {out_path}");

    if let Some(path) = &args.equalized {
        let view = equalize_adapthist(out.corrected.image(), &ClaheConfig::default())
            .context("equalizing corrected image")?;
        let pixels = view
            .data()
            .iter()
            .map(|&v| (v.clamp(0.0, 1.0) * f32::from(u16::MAX)).round() as u16)
            .collect();
        ImageBuffer::<Luma<u16>, Vec<u16>>::from_raw(width as u32, height as u32, pixels)
            .context("building equalized image")?
            .save(path)
            .with_context(|| format!("writing {path}"))?;
        println!("equalized view written to {path}");
    }
    Ok(())
}
