use approx::assert_relative_eq;
use xripl::{
    BackgroundMethod, ContourKey, CorrectionConfig, CorrectionMode, DenoiseMethod,
    ElevationSource, Error, ExtremaConfig, FlatfieldConfig, Image, MarkerStrategy, Pipeline,
    PipelineConfig, Point2f, Radiograph, Seed, Units, WatershedConfig,
};

fn subtractive(offset: f32) -> FlatfieldConfig {
    FlatfieldConfig {
        background: BackgroundMethod::LowPass { sigma: 50.0 },
        correction: CorrectionConfig {
            mode: CorrectionMode::Subtractive { offset },
            ..CorrectionConfig::default()
        },
    }
}

/// 10x10 frame, 200 inside the 4x4 block `[3, 7)^2`, 50 elsewhere.
fn raised_square() -> Image<f32> {
    Image::from_fn(10, 10, |x, y| {
        if (3..7).contains(&x) && (3..7).contains(&y) {
            200.0
        } else {
            50.0
        }
    })
}

fn raised_square_config() -> PipelineConfig {
    PipelineConfig {
        denoise: DenoiseMethod::None,
        flatfield: subtractive(100.0),
        elevation_source: ElevationSource::Intensity { invert: true },
        markers: MarkerStrategy::Seeds,
        watershed: WatershedConfig {
            flood_max_elevation: Some(100.0),
            ..WatershedConfig::default()
        },
        ..PipelineConfig::default()
    }
}

/// Deterministic bumpy frame: a few Gaussian blobs over an LCG ripple.
fn bumpy_frame(w: usize, h: usize) -> Image<f32> {
    let mut state = 0x2545_f491_u32;
    let noise: Vec<f32> = (0..w * h)
        .map(|_| {
            state = state.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
            (state >> 8) as f32 / (1u32 << 24) as f32
        })
        .collect();
    let blobs = [(6.0f32, 5.0f32, 40.0f32), (22.0, 8.0, 60.0), (14.0, 18.0, 50.0)];
    Image::from_fn(w, h, |x, y| {
        let bump: f32 = blobs
            .iter()
            .map(|&(cx, cy, a)| {
                let d2 = (x as f32 - cx).powi(2) + (y as f32 - cy).powi(2);
                a * (-d2 / 18.0).exp()
            })
            .sum();
        100.0 + bump + 5.0 * noise[y * w + x]
    })
}

#[test]
fn raised_square_is_segmented_exactly() {
    let pipeline = Pipeline::new(raised_square_config()).expect("valid config");
    let frame = Radiograph::new(raised_square());
    let out = pipeline
        .run(&frame, Some(&[Seed::new(5, 5)]))
        .expect("pipeline runs");

    for y in 0..10 {
        for x in 0..10 {
            let inside = (3..7).contains(&x) && (3..7).contains(&y);
            assert_eq!(out.labels.get(x, y), Some(u32::from(inside)), "({x}, {y})");
        }
    }
    assert_eq!(out.labels.area(1), 16);

    assert_eq!(out.contours.units(), Units::Pixels);
    assert_eq!(out.contours.len(), 1);
    let entry = out
        .contours
        .get(ContourKey { label: 1, component: 0 })
        .expect("square contour");
    assert_eq!(entry.points.len(), 4);
    assert_eq!(entry.points[0], Point2f::new(3.0, 3.0));
    assert_relative_eq!(entry.descriptors.area, 16.0, epsilon = 1e-4);
    assert_relative_eq!(entry.descriptors.centroid.x, 5.0, epsilon = 1e-4);
}

#[test]
fn calibration_offset_and_pitch_flow_through() {
    let raw = raised_square().map(|&v| v + 30.0);
    let frame = Radiograph::new(raw)
        .with_calibration_offset(Image::new_fill(10, 10, 30.0))
        .and_then(|r| r.with_pixel_pitch(0.1))
        .expect("valid radiograph");
    let pipeline = Pipeline::new(raised_square_config()).expect("valid config");
    let out = pipeline
        .run(&frame, Some(&[Seed::new(5, 5)]))
        .expect("pipeline runs");

    assert_eq!(out.labels.area(1), 16);
    assert_eq!(out.corrected.pixel_pitch(), Some(0.1));
    assert_eq!(out.contours.units(), Units::Physical { pitch: 0.1 });
    let d = out.contours.iter().next().expect("one contour").descriptors;
    assert_relative_eq!(d.area, 0.16, epsilon = 1e-5);
    assert_relative_eq!(d.perimeter, 1.6, epsilon = 1e-5);
    assert_eq!(d.pixel_count, 16);
}

#[test]
fn uniform_frame_flattens_to_the_correction_constant() {
    let frame = Radiograph::new(Image::new_fill(12, 9, 100.0f32));
    let seeds = [Seed::new(6, 4)];

    let divisive = PipelineConfig {
        denoise: DenoiseMethod::None,
        markers: MarkerStrategy::Seeds,
        flatfield: FlatfieldConfig {
            background: BackgroundMethod::LowPass { sigma: 50.0 },
            correction: CorrectionConfig {
                mode: CorrectionMode::Divisive { normalization: 1.0 },
                ..CorrectionConfig::default()
            },
        },
        ..PipelineConfig::default()
    };
    let out = Pipeline::new(divisive)
        .expect("valid config")
        .run(&frame, Some(&seeds))
        .expect("pipeline runs");
    for &b in out.background.image().data() {
        assert_relative_eq!(b, 100.0, epsilon = 1e-2);
    }
    for &v in out.corrected.image().data() {
        assert_relative_eq!(v, 1.0, epsilon = 1e-4);
    }
    assert_eq!(out.clip.clipped(), 0);

    let subtracted = PipelineConfig {
        denoise: DenoiseMethod::None,
        markers: MarkerStrategy::Seeds,
        flatfield: subtractive(5.0),
        ..PipelineConfig::default()
    };
    let out = Pipeline::new(subtracted)
        .expect("valid config")
        .run(&frame, Some(&seeds))
        .expect("pipeline runs");
    for &v in out.corrected.image().data() {
        assert_relative_eq!(v, 5.0, epsilon = 1e-2);
    }
    assert_eq!(out.labels.area(1), 12 * 9);
}

#[test]
fn ridge_above_flood_limit_stays_unlabelled() {
    // 21x9, zero except a 100-high ridge in column 10.
    let frame = Radiograph::new(Image::from_fn(21, 9, |x, _| if x == 10 { 100.0 } else { 0.0 }));
    let cfg = PipelineConfig {
        denoise: DenoiseMethod::None,
        flatfield: subtractive(20.0),
        elevation_source: ElevationSource::Intensity { invert: false },
        markers: MarkerStrategy::Seeds,
        watershed: WatershedConfig {
            flood_max_elevation: Some(50.0),
            ..WatershedConfig::default()
        },
        ..PipelineConfig::default()
    };
    let out = Pipeline::new(cfg)
        .expect("valid config")
        .run(&frame, Some(&[Seed::new(2, 4), Seed::new(18, 4)]))
        .expect("pipeline runs");

    for y in 0..9 {
        assert_eq!(out.labels.get(10, y), Some(0));
        assert_eq!(out.labels.get(0, y), Some(1));
        assert_eq!(out.labels.get(20, y), Some(2));
    }
    assert_eq!(out.labels.area(1), 90);
    assert_eq!(out.labels.area(2), 90);

    let keys: Vec<_> = out.contours.iter().map(|e| e.key).collect();
    assert_eq!(
        keys,
        vec![
            ContourKey { label: 1, component: 0 },
            ContourKey { label: 2, component: 0 }
        ]
    );
    for e in &out.contours {
        assert_relative_eq!(e.descriptors.area, 90.0, epsilon = 1e-3);
    }
}

#[test]
fn automatic_markers_partition_the_frame_deterministically() {
    let (w, h) = (32, 24);
    let frame = Radiograph::new(bumpy_frame(w, h));
    let cfg = PipelineConfig {
        denoise: DenoiseMethod::Gaussian { sigma: 1.0 },
        markers: MarkerStrategy::Extrema(ExtremaConfig {
            min_separation: 6.0,
            ..ExtremaConfig::default()
        }),
        elevation_source: ElevationSource::Gradient,
        ..PipelineConfig::default()
    };
    let pipeline = Pipeline::new(cfg).expect("valid config");
    let a = pipeline.run(&frame, None).expect("pipeline runs");
    let b = pipeline.run(&frame, None).expect("pipeline runs");
    assert_eq!(a, b);

    assert!(!a.markers.is_empty());
    for (id, pixels) in a.markers.iter() {
        for &(x, y) in pixels {
            assert_eq!(a.labels.get(x, y), Some(id));
        }
    }
    let ids: Vec<u32> = a.markers.ids().collect();
    for &l in a.labels.image().data() {
        assert!(ids.contains(&l), "label {l} is not a marker id");
    }

    let mut covered = 0;
    for e in &a.contours {
        assert!(e.points.len() >= 3);
        assert!(e.descriptors.area > 0.0);
        covered += e.descriptors.pixel_count;
    }
    assert_eq!(covered, w * h);
}

#[test]
fn too_few_markers_stop_the_run() {
    let frame = Radiograph::new(raised_square());
    let pipeline = Pipeline::new(raised_square_config()).expect("valid config");
    assert_eq!(
        pipeline.run(&frame, Some(&[])),
        Err(Error::InsufficientMarkers {
            found: 0,
            required: 1
        })
    );

    let cfg = PipelineConfig {
        denoise: DenoiseMethod::None,
        markers: MarkerStrategy::Extrema(ExtremaConfig {
            min_separation: 100.0,
            ..ExtremaConfig::default()
        }),
        min_markers: 3,
        ..PipelineConfig::default()
    };
    let pipeline = Pipeline::new(cfg).expect("valid config");
    assert_eq!(
        pipeline.run(&frame, None),
        Err(Error::InsufficientMarkers {
            found: 1,
            required: 3
        })
    );
}

#[test]
fn dark_frame_is_a_division_singularity() {
    let frame = Radiograph::new(Image::new_fill(6, 6, 0.0f32));
    let cfg = PipelineConfig {
        denoise: DenoiseMethod::None,
        markers: MarkerStrategy::Seeds,
        ..PipelineConfig::default()
    };
    let err = Pipeline::new(cfg)
        .expect("valid config")
        .run(&frame, Some(&[Seed::new(1, 1)]))
        .expect_err("zero background");
    assert!(matches!(err, Error::DivisionSingularity { x: 0, y: 0, .. }));
}

#[test]
fn oversized_denoise_kernel_is_rejected() {
    let frame = Radiograph::new(Image::new_fill(6, 6, 10.0f32));
    let cfg = PipelineConfig {
        denoise: DenoiseMethod::Box { size: 7 },
        markers: MarkerStrategy::Seeds,
        ..PipelineConfig::default()
    };
    let err = Pipeline::new(cfg)
        .expect("valid config")
        .run(&frame, Some(&[Seed::new(1, 1)]))
        .expect_err("kernel wider than frame");
    assert!(matches!(err, Error::InvalidParameter { .. }));
}

#[test]
fn batch_keeps_input_order_and_isolates_failures() {
    let pipeline = Pipeline::new(raised_square_config()).expect("valid config");
    let frames = [
        Radiograph::new(raised_square()),
        Radiograph::new(Image::new_fill(4, 4, 50.0f32)),
        Radiograph::new(Image::from_fn(12, 8, |x, y| {
            if (4..8).contains(&x) && (2..6).contains(&y) {
                200.0
            } else {
                50.0
            }
        })),
    ];
    let results = pipeline.run_batch(&frames, Some(&[Seed::new(5, 5)]));
    assert_eq!(results.len(), 3);

    let first = results[0].as_ref().expect("10x10 frame");
    assert_eq!(first.labels.dims(), (10, 10));
    assert_eq!(first.labels.area(1), 16);

    // Seed (5, 5) lies outside the 4x4 frame.
    assert!(matches!(results[1], Err(Error::InvalidParameter { .. })));

    let third = results[2].as_ref().expect("12x8 frame");
    assert_eq!(third.labels.dims(), (12, 8));
    assert_eq!(third.labels.area(1), 16);
}
