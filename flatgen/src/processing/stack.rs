//! Per-pixel combination of frames.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use strum_macros::Display;

use super::filters::median_mut;
use crate::plane::Plane;

const ROWS_PER_CHUNK: usize = 8;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Display, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum CombineMethod {
    #[default]
    Mean,
    Median,
}

/// Combines equally sized frames pixel by pixel.
pub fn stack(frames: &[Plane<f32>], method: CombineMethod) -> Plane<f32> {
    assert!(!frames.is_empty(), "Cannot stack zero frames");
    let (width, height) = frames[0].dimensions();
    assert!(
        frames.iter().all(|f| f.dimensions() == (width, height)),
        "All frames must have the same dimensions"
    );

    if frames.len() == 1 || width == 0 || height == 0 {
        return frames[0].clone();
    }

    let mut output = vec![0.0f32; width * height];
    let count = frames.len() as f32;

    output
        .par_chunks_mut(width * ROWS_PER_CHUNK)
        .enumerate()
        .for_each(|(chunk_idx, chunk)| {
            let offset = chunk_idx * width * ROWS_PER_CHUNK;
            let mut values = vec![0.0f32; frames.len()];

            for (i, out) in chunk.iter_mut().enumerate() {
                let idx = offset + i;
                *out = match method {
                    CombineMethod::Mean => frames.iter().map(|f| f[idx]).sum::<f32>() / count,
                    CombineMethod::Median => {
                        for (v, f) in values.iter_mut().zip(frames) {
                            *v = f[idx];
                        }
                        median_mut(&mut values)
                    }
                };
            }
        });

    Plane::new(width, height, output)
}
