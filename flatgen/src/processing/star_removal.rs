use anyhow::Result;

use super::filters::{median_filter, median_mut, robust_stats};
use super::ChannelFilter;
use crate::plane::Plane;

/// Lower bound for sigma, relative to the plane's median level. Applies when
/// the residual MAD is zero, as on uniform or saturated planes.
const MIN_RELATIVE_SIGMA: f32 = 1.0e-3;

/// Leaves the plane untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoRemoval;

impl ChannelFilter for NoRemoval {
    fn apply(&self, plane: Plane<f32>) -> Result<Plane<f32>> {
        Ok(plane)
    }
}

/// Replaces star residue with the local median.
///
/// A pixel counts as residue when it exceeds the `size x size` median around
/// it by more than `threshold` robust sigmas of the residual plane.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MedianRemoval {
    pub threshold: f32,
    pub size: usize,
}

impl ChannelFilter for MedianRemoval {
    fn apply(&self, mut plane: Plane<f32>) -> Result<Plane<f32>> {
        if plane.is_empty() {
            return Ok(plane);
        }

        let background = median_filter(&plane, self.size);
        let residual: Vec<f32> = plane
            .iter()
            .zip(background.iter())
            .map(|(&v, &b)| v - b)
            .collect();

        let (_, residual_sigma) = robust_stats(&residual);
        let level = median_mut(&mut plane.to_vec()).abs();
        let sigma = residual_sigma.max(level * MIN_RELATIVE_SIGMA);
        let limit = self.threshold * sigma;

        let mut replaced = 0usize;
        for ((value, &res), &bg) in plane.iter_mut().zip(&residual).zip(background.iter()) {
            if res > limit {
                *value = bg;
                replaced += 1;
            }
        }

        log::debug!(
            "Median star removal: sigma={sigma:.4}, limit={limit:.4}, replaced {replaced} of {} pixels",
            plane.len()
        );
        Ok(plane)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn textured(width: usize, height: usize) -> Plane<f32> {
        Plane::from_fn(width, height, |x, y| 100.0 + ((x * 7 + y * 13) % 5) as f32 * 0.1)
    }

    #[test]
    fn no_removal_is_identity() {
        let plane = textured(6, 4);
        assert_eq!(NoRemoval.apply(plane.clone()).unwrap(), plane);
    }

    #[test]
    fn replaces_star_with_local_median() {
        let mut plane = textured(16, 12);
        plane[(5, 5)] = 1000.0;
        plane[(6, 5)] = 800.0;
        let original = textured(16, 12);

        let filter = MedianRemoval {
            threshold: 5.0,
            size: 5,
        };
        let cleaned = filter.apply(plane).unwrap();

        assert!(cleaned[(5, 5)] < 100.5, "{}", cleaned[(5, 5)]);
        assert!(cleaned[(6, 5)] < 100.5, "{}", cleaned[(6, 5)]);
        for y in 0..12 {
            for x in 0..16 {
                if (x, y) != (5, 5) && (x, y) != (6, 5) {
                    assert_eq!(cleaned[(x, y)], original[(x, y)], "({x}, {y})");
                }
            }
        }
    }

    #[test]
    fn dark_pixels_are_kept() {
        let mut plane = Plane::new_filled(8, 8, 50.0f32);
        plane[(4, 4)] = 0.0;

        let cleaned = MedianRemoval {
            threshold: 3.0,
            size: 3,
        }
        .apply(plane.clone())
        .unwrap();
        assert_eq!(cleaned, plane);
    }

    #[test]
    fn empty_plane_passes_through() {
        let plane = Plane::new(0, 0, Vec::new());
        let cleaned = MedianRemoval {
            threshold: 3.0,
            size: 3,
        }
        .apply(plane)
        .unwrap();
        assert!(cleaned.is_empty());
    }
}
