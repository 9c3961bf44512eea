//! Splitting a Bayer mosaic into its four color planes and back.
//!
//! Every 2x2 cell of the mosaic contributes one sample to each plane, so each
//! plane is half the mosaic's width and height. The two green planes stay
//! separate: their photosites sit on different rows and do not respond
//! identically.
//!
//! The plane a site goes to follows the batch's Bayer pattern. For `RGGB`:
//!
//! | site               | plane  |
//! |--------------------|--------|
//! | even row, even col | red    |
//! | even row, odd col  | green1 |
//! | odd row, even col  | green2 |
//! | odd row, odd col   | blue   |
//!
//! `green1` is always the first green site in raster order.

use std::ops::Index;

use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter};
use thiserror::Error;

use crate::bayer::{BayerPattern, Channel};
use crate::plane::Plane;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MosaicError {
    #[error("Mosaic dimensions must be even and non-zero, got {width}x{height}")]
    OddDimensions { width: usize, height: usize },

    #[error("Pattern {0} is not a Bayer arrangement of one red, one blue and two diagonal greens")]
    UnsupportedPattern(BayerPattern),

    #[error("{channel} plane is {actual:?}, expected {expected:?}")]
    PlaneShape {
        channel: ChannelKind,
        expected: (usize, usize),
        actual: (usize, usize),
    },
}

/// The four planes of a Bayer mosaic.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display, EnumIter)]
#[strum(serialize_all = "lowercase")]
pub enum ChannelKind {
    Red,
    Green1,
    Green2,
    Blue,
}

impl ChannelKind {
    #[inline]
    fn index(self) -> usize {
        self as usize
    }

    pub fn color(self) -> Channel {
        match self {
            ChannelKind::Red => Channel::Red,
            ChannelKind::Green1 | ChannelKind::Green2 => Channel::Green,
            ChannelKind::Blue => Channel::Blue,
        }
    }
}

/// `(dx, dy)` of each plane's site inside a 2x2 cell, indexed by [`ChannelKind`].
fn site_offsets(pattern: BayerPattern) -> Result<[(usize, usize); 4], MosaicError> {
    if !pattern.is_bayer() {
        return Err(MosaicError::UnsupportedPattern(pattern));
    }

    let mut greens = pattern.sites_of(Channel::Green);
    let sites = [
        pattern.sites_of(Channel::Red).next(),
        greens.next(),
        greens.next(),
        pattern.sites_of(Channel::Blue).next(),
    ];

    let mut offsets = [(0, 0); 4];
    for (offset, site) in offsets.iter_mut().zip(sites) {
        let site = site.ok_or(MosaicError::UnsupportedPattern(pattern))?;
        *offset = (site & 1, site >> 1);
    }
    Ok(offsets)
}

/// Four equally sized planes plus the pattern they were split with.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelSet<T> {
    pattern: BayerPattern,
    offsets: [(usize, usize); 4],
    planes: [Plane<T>; 4],
}

impl<T> ChannelSet<T> {
    /// Planes are given in [`ChannelKind`] order: red, green1, green2, blue.
    pub fn new(pattern: BayerPattern, planes: [Plane<T>; 4]) -> Result<Self, MosaicError> {
        let offsets = site_offsets(pattern)?;

        let expected = planes[0].dimensions();
        for (kind, plane) in ChannelKind::iter().zip(&planes) {
            if plane.dimensions() != expected {
                return Err(MosaicError::PlaneShape {
                    channel: kind,
                    expected,
                    actual: plane.dimensions(),
                });
            }
        }

        Ok(Self {
            pattern,
            offsets,
            planes,
        })
    }

    pub fn pattern(&self) -> BayerPattern {
        self.pattern
    }

    /// `(width, height)` shared by all four planes.
    pub fn plane_dimensions(&self) -> (usize, usize) {
        self.planes[0].dimensions()
    }

    pub fn plane(&self, kind: ChannelKind) -> &Plane<T> {
        &self.planes[kind.index()]
    }

    pub fn into_planes(self) -> [Plane<T>; 4] {
        self.planes
    }

    /// Applies `f` to every plane, keeping the pattern.
    ///
    /// Stops at the first error of `f`. Planes that no longer share one size
    /// fail with [`MosaicError::PlaneShape`].
    pub fn try_map<U, E: From<MosaicError>>(
        self,
        mut f: impl FnMut(ChannelKind, Plane<T>) -> Result<Plane<U>, E>,
    ) -> Result<ChannelSet<U>, E> {
        let [red, green1, green2, blue] = self.planes;
        let planes = [
            f(ChannelKind::Red, red)?,
            f(ChannelKind::Green1, green1)?,
            f(ChannelKind::Green2, green2)?,
            f(ChannelKind::Blue, blue)?,
        ];
        Ok(ChannelSet::new(self.pattern, planes)?)
    }
}

impl<T> Index<ChannelKind> for ChannelSet<T> {
    type Output = Plane<T>;

    #[inline]
    fn index(&self, kind: ChannelKind) -> &Self::Output {
        self.plane(kind)
    }
}

/// Splits `mosaic` into its four planes according to `pattern`.
pub fn extract<T: Copy>(
    mosaic: &Plane<T>,
    pattern: BayerPattern,
) -> Result<ChannelSet<T>, MosaicError> {
    let (width, height) = mosaic.dimensions();
    if width == 0 || height == 0 || width % 2 != 0 || height % 2 != 0 {
        return Err(MosaicError::OddDimensions { width, height });
    }

    let offsets = site_offsets(pattern)?;
    let (half_width, half_height) = (width / 2, height / 2);
    let planes = offsets.map(|(dx, dy)| {
        Plane::from_fn(half_width, half_height, |x, y| mosaic[(2 * x + dx, 2 * y + dy)])
    });

    Ok(ChannelSet {
        pattern,
        offsets,
        planes,
    })
}

/// Writes the four planes back to their interleaved sites.
///
/// The result is always `f32` so that averaged frames keep fractional values.
pub fn combine<T: Copy + Into<f32>>(channels: &ChannelSet<T>) -> Plane<f32> {
    let (half_width, half_height) = channels.plane_dimensions();
    let mut mosaic = Plane::new_filled(half_width * 2, half_height * 2, 0.0f32);

    for (plane, &(dx, dy)) in channels.planes.iter().zip(&channels.offsets) {
        for (y, row) in plane.rows().enumerate() {
            for (x, &value) in row.iter().enumerate() {
                mosaic[(2 * x + dx, 2 * y + dy)] = value.into();
            }
        }
    }

    mosaic
}
