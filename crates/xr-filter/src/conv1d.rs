use xr_core::{BorderMode, Image, map_index};

/// 1D correlation: `out[i] = sum_k signal[i + k - radius] * kernel[k]`.
///
/// For the symmetric kernels used here this equals convolution. Samples
/// outside the signal are resolved through `border`.
pub fn convolve_f32(
    signal: &[f32],
    kernel: &[f32],
    radius: usize,
    border: BorderMode,
    out: &mut [f32],
) {
    assert_eq!(out.len(), signal.len(), "out must match signal length");
    assert_eq!(
        kernel.len(),
        2 * radius + 1,
        "kernel len must be 2*radius+1"
    );

    let n = signal.len();
    if n == 0 {
        return;
    }

    // Interior samples never touch the border.
    let interior_start = radius.min(n);
    let interior_end = n.saturating_sub(radius).max(interior_start);

    for i in interior_start..interior_end {
        let base = i - radius;
        out[i] = signal[base..base + kernel.len()]
            .iter()
            .zip(kernel)
            .map(|(&s, &k)| s * k)
            .sum();
    }

    for i in (0..interior_start).chain(interior_end..n) {
        out[i] = convolve_at_border(signal, kernel, radius, i, border);
    }
}

fn convolve_at_border(
    signal: &[f32],
    kernel: &[f32],
    radius: usize,
    i: usize,
    border: BorderMode,
) -> f32 {
    let n = signal.len();
    let mut acc = 0.0f32;
    for (k, &kv) in kernel.iter().enumerate() {
        let idx = i as isize + k as isize - radius as isize;
        acc += signal[map_index(idx, n, border)] * kv;
    }
    acc
}

/// Applies the same 1D kernel along rows, then along columns.
pub fn separable_filter(
    src: &Image<f32>,
    kernel: &[f32],
    radius: usize,
    border: BorderMode,
) -> Image<f32> {
    let (w, h) = src.dims();
    let mut tmp = Image::new_fill(w, h, 0.0f32);
    if w == 0 || h == 0 {
        return tmp;
    }

    for y in 0..h {
        let row = &src.data()[y * w..(y + 1) * w];
        let out = &mut tmp.data_mut()[y * w..(y + 1) * w];
        convolve_f32(row, kernel, radius, border, out);
    }

    let mut dst = Image::new_fill(w, h, 0.0f32);
    let mut col = vec![0.0f32; h];
    let mut col_out = vec![0.0f32; h];
    for x in 0..w {
        for (y, c) in col.iter_mut().enumerate() {
            *c = tmp.data()[y * w + x];
        }
        convolve_f32(&col, kernel, radius, border, &mut col_out);
        for (y, &v) in col_out.iter().enumerate() {
            dst.data_mut()[y * w + x] = v;
        }
    }

    dst
}
