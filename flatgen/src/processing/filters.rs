//! Median and Gaussian filters over float planes.
//!
//! Both run row-parallel; each rayon task owns a chunk of output rows.

use rayon::prelude::*;

use crate::plane::Plane;

const ROWS_PER_CHUNK: usize = 8;

/// For a normal distribution sigma = 1.4826 * MAD.
pub const MAD_TO_SIGMA: f32 = 1.4826;

/// Median of `values`, reordering them in place. Even lengths average the two middle values.
pub fn median_mut(values: &mut [f32]) -> f32 {
    debug_assert!(!values.is_empty());

    let len = values.len();
    let mid = len / 2;
    let (left, right, _) = values.select_nth_unstable_by(mid, f32::total_cmp);
    let right = *right;

    if len % 2 == 1 {
        right
    } else {
        let left = left.iter().copied().fold(f32::NEG_INFINITY, f32::max);
        (left + right) * 0.5
    }
}

/// Median and MAD-derived sigma of `values`.
pub fn robust_stats(values: &[f32]) -> (f32, f32) {
    let mut samples = values.to_vec();
    let median = median_mut(&mut samples);
    for v in samples.iter_mut() {
        *v = (*v - median).abs();
    }
    let mad = median_mut(&mut samples);
    (median, mad * MAD_TO_SIGMA)
}

/// `size x size` median filter. Windows are clipped at the plane border.
pub fn median_filter(plane: &Plane<f32>, size: usize) -> Plane<f32> {
    assert!(size % 2 == 1, "Median filter size must be odd, got {size}");

    let (width, height) = plane.dimensions();
    if size == 1 || plane.is_empty() {
        return plane.clone();
    }

    let radius = size / 2;
    let mut output = vec![0.0f32; width * height];

    output
        .par_chunks_mut(width * ROWS_PER_CHUNK)
        .enumerate()
        .for_each(|(chunk_idx, chunk)| {
            let mut window = Vec::with_capacity(size * size);
            let y_start = chunk_idx * ROWS_PER_CHUNK;

            for (local_y, out_row) in chunk.chunks_exact_mut(width).enumerate() {
                let y = y_start + local_y;
                let rows = y.saturating_sub(radius)..(y + radius + 1).min(height);

                for (x, out) in out_row.iter_mut().enumerate() {
                    let cols = x.saturating_sub(radius)..(x + radius + 1).min(width);
                    window.clear();
                    for ny in rows.clone() {
                        window.extend_from_slice(&plane.row(ny)[cols.clone()]);
                    }
                    *out = median_mut(&mut window);
                }
            }
        });

    Plane::new(width, height, output)
}

/// Normalized 1D Gaussian kernel of radius `ceil(3 * sigma)`.
pub fn gaussian_kernel_1d(sigma: f32) -> Vec<f32> {
    assert!(sigma > 0.0, "Sigma must be positive");

    let radius = (3.0 * sigma).ceil() as usize;
    let two_sigma_sq = 2.0 * sigma * sigma;

    let mut kernel: Vec<f32> = (0..2 * radius + 1)
        .map(|i| {
            let x = i as f32 - radius as f32;
            (-x * x / two_sigma_sq).exp()
        })
        .collect();

    let sum: f32 = kernel.iter().sum();
    for v in &mut kernel {
        *v /= sum;
    }
    kernel
}

/// Reflects `i` into `0..n` without repeating the edge sample.
#[inline]
fn mirror(i: isize, n: usize) -> usize {
    if n == 1 {
        return 0;
    }
    let period = 2 * (n as isize - 1);
    let i = i.rem_euclid(period);
    if i >= n as isize {
        (period - i) as usize
    } else {
        i as usize
    }
}

/// Separable Gaussian blur with mirrored borders.
pub fn gaussian_blur(plane: &Plane<f32>, sigma: f32) -> Plane<f32> {
    let kernel = gaussian_kernel_1d(sigma);
    let (width, height) = plane.dimensions();
    if plane.is_empty() {
        return plane.clone();
    }

    let radius = (kernel.len() / 2) as isize;

    let mut temp = vec![0.0f32; width * height];
    temp.par_chunks_mut(width * ROWS_PER_CHUNK)
        .enumerate()
        .for_each(|(chunk_idx, chunk)| {
            for (local_y, out_row) in chunk.chunks_exact_mut(width).enumerate() {
                let in_row = plane.row(chunk_idx * ROWS_PER_CHUNK + local_y);
                for (x, out) in out_row.iter_mut().enumerate() {
                    *out = kernel
                        .iter()
                        .enumerate()
                        .map(|(k, &w)| w * in_row[mirror(x as isize + k as isize - radius, width)])
                        .sum();
                }
            }
        });

    let mut output = vec![0.0f32; width * height];
    output
        .par_chunks_mut(width * ROWS_PER_CHUNK)
        .enumerate()
        .for_each(|(chunk_idx, chunk)| {
            for (local_y, out_row) in chunk.chunks_exact_mut(width).enumerate() {
                let y = (chunk_idx * ROWS_PER_CHUNK + local_y) as isize;
                for (x, out) in out_row.iter_mut().enumerate() {
                    *out = kernel
                        .iter()
                        .enumerate()
                        .map(|(k, &w)| {
                            let sy = mirror(y + k as isize - radius, height);
                            w * temp[sy * width + x]
                        })
                        .sum();
                }
            }
        });

    Plane::new(width, height, output)
}
