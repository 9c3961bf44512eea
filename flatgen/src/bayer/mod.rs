//! Bayer color-filter arrangement parsing.
//!
//! Camera metadata spells the 2x2 filter arrangement in many ways:
//! `[Red,Green][Green,Blue]`, `R G G B`, `[0,1,1,2]`, `0112` and so on.
//! [`BayerPattern::parse`] reduces all of them to one canonical four-letter
//! code over `{R, G, B}`, read top-left, top-right, bottom-left, bottom-right.
//!
//! Two patterns are equal only when their codes are identical. `GRBG` is not
//! considered equal to `RGGB` even though it is the same filter shifted by
//! one column.


use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use strum_macros::Display;
use thiserror::Error;

/// Color of a single photosite.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display)]
pub enum Channel {
    #[strum(serialize = "R")]
    Red,
    #[strum(serialize = "G")]
    Green,
    #[strum(serialize = "B")]
    Blue,
}

use Channel::*;

/// Tokens accepted in the textual (non-numeric) form, matched after uppercasing.
const VOCABULARY: [(&str, Channel); 6] = [
    ("R", Red),
    ("G", Green),
    ("B", Blue),
    ("RED", Red),
    ("GREEN", Green),
    ("BLUE", Blue),
];

/// A pattern string that cannot be reduced to a four-letter code.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatternError {
    #[error("Invalid Bayer pattern '{input}': numeric form needs 4 digits, got {count}")]
    NumericLength { input: String, count: usize },

    #[error("Invalid Bayer pattern '{input}': unknown component '{token}'")]
    UnknownToken { input: String, token: String },

    #[error("Invalid Bayer pattern '{input}': describes {count} positions, expected 4")]
    Length { input: String, count: usize },
}

/// Canonical 2x2 color-filter arrangement.
///
/// Sites are stored in raster order: `[top-left, top-right, bottom-left, bottom-right]`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BayerPattern([Channel; 4]);

impl BayerPattern {
    pub const RGGB: Self = Self([Red, Green, Green, Blue]);
    pub const BGGR: Self = Self([Blue, Green, Green, Red]);
    pub const GRBG: Self = Self([Green, Red, Blue, Green]);
    pub const GBRG: Self = Self([Green, Blue, Red, Green]);

    pub fn new(sites: [Channel; 4]) -> Self {
        Self(sites)
    }

    /// Parses any supported textual encoding into the canonical form.
    ///
    /// Brackets, commas and whitespace are ignored and letters are
    /// case-insensitive. A string made only of the digits `0`, `1`, `2` is read
    /// as numeric codes (0=R, 1=G, 2=B) and must have exactly four of them.
    /// Anything else is tokenized greedily against `R, G, B, RED, GREEN, BLUE`
    /// and must yield exactly four colors.
    pub fn parse(input: &str) -> Result<Self, PatternError> {
        let clean: Vec<char> = input
            .chars()
            .filter(|c| !matches!(c, '[' | ']' | ',') && !c.is_whitespace())
            .flat_map(char::to_uppercase)
            .collect();

        if !clean.is_empty() && clean.iter().all(|c| matches!(c, '0' | '1' | '2')) {
            return Self::parse_numeric(input, &clean);
        }

        let channels = tokenize(input, &clean)?;
        let sites = <[Channel; 4]>::try_from(channels.as_slice()).map_err(|_| {
            PatternError::Length {
                input: input.to_string(),
                count: channels.len(),
            }
        })?;

        Ok(Self(sites))
    }

    fn parse_numeric(input: &str, digits: &[char]) -> Result<Self, PatternError> {
        if digits.len() != 4 {
            return Err(PatternError::NumericLength {
                input: input.to_string(),
                count: digits.len(),
            });
        }

        let mut sites = [Green; 4];
        for (site, digit) in sites.iter_mut().zip(digits) {
            *site = match digit {
                '0' => Red,
                '1' => Green,
                _ => Blue,
            };
        }
        Ok(Self(sites))
    }

    /// Sites in raster order.
    #[inline]
    pub fn sites(&self) -> [Channel; 4] {
        self.0
    }

    /// Raster indices (0..4) of every site carrying `channel`.
    pub fn sites_of(&self, channel: Channel) -> impl Iterator<Item = usize> + '_ {
        self.0
            .iter()
            .enumerate()
            .filter(move |&(_, &c)| c == channel)
            .map(|(idx, _)| idx)
    }

    /// `true` for physical Bayer arrangements: one red and one blue site, with
    /// the two green sites on a diagonal.
    pub fn is_bayer(&self) -> bool {
        let greens: Vec<usize> = self.sites_of(Green).collect();
        matches!(greens.as_slice(), [0, 3] | [1, 2])
            && self.sites_of(Red).count() == 1
            && self.sites_of(Blue).count() == 1
    }
}

/// Splits the cleaned, uppercased input into colors.
///
/// At each position the token is extended one character at a time while it
/// remains a prefix of some vocabulary word. The longest extension that is a
/// whole word is emitted and consumption resumes right after it.
fn tokenize(input: &str, clean: &[char]) -> Result<Vec<Channel>, PatternError> {
    let mut channels = Vec::with_capacity(4);
    let mut pos = 0;

    while pos < clean.len() {
        let mut token = String::new();
        let mut longest_match = None;

        for (offset, &c) in clean[pos..].iter().enumerate() {
            token.push(c);
            if !VOCABULARY.iter().any(|(word, _)| word.starts_with(&token)) {
                token.pop();
                break;
            }
            if let Some(&(_, channel)) = VOCABULARY.iter().find(|(word, _)| *word == token) {
                longest_match = Some((pos + offset + 1, channel));
            }
        }

        let Some((next, channel)) = longest_match else {
            if token.is_empty() {
                token.push(clean[pos]);
            }
            return Err(PatternError::UnknownToken {
                input: input.to_string(),
                token,
            });
        };

        channels.push(channel);
        pos = next;
    }

    Ok(channels)
}

impl fmt::Display for BayerPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for channel in self.0 {
            write!(f, "{channel}")?;
        }
        Ok(())
    }
}

impl FromStr for BayerPattern {
    type Err = PatternError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for BayerPattern {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for BayerPattern {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Self::parse(&text).map_err(serde::de::Error::custom)
    }
}
