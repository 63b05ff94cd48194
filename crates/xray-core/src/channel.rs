//! Channel selection for single-intensity reads.

use std::fmt;
use std::str::FromStr;

use crate::pixel::{gray_mean, gray_rounded};
use crate::{Error, Result};

/// Which intensity to read from an RGBA pixel.
///
/// Analysis operations (ROI statistics, line profiles, FFT) work on one
/// scalar per pixel; `Channel` picks it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Channel {
    /// RGB mean.
    #[default]
    Gray,
    /// Red samples.
    #[cfg_attr(feature = "serde", serde(alias = "r"))]
    Red,
    /// Green samples.
    #[cfg_attr(feature = "serde", serde(alias = "g"))]
    Green,
    /// Blue samples.
    #[cfg_attr(feature = "serde", serde(alias = "b"))]
    Blue,
    /// Alpha samples.
    #[cfg_attr(feature = "serde", serde(alias = "a"))]
    Alpha,
}

impl Channel {
    /// Integer sample, gray rounded to the nearest level.
    ///
    /// ```rust
    /// use xray_core::Channel;
    ///
    /// let px = [10, 20, 32, 200];
    /// assert_eq!(Channel::Gray.sample(px), 21);
    /// assert_eq!(Channel::Blue.sample(px), 32);
    /// assert_eq!(Channel::Alpha.sample(px), 200);
    /// ```
    #[inline]
    pub fn sample(self, px: [u8; 4]) -> u8 {
        match self {
            Self::Gray => gray_rounded(px),
            Self::Red => px[0],
            Self::Green => px[1],
            Self::Blue => px[2],
            Self::Alpha => px[3],
        }
    }

    /// Floating-point intensity, gray kept unrounded.
    #[inline]
    pub fn intensity(self, px: [u8; 4]) -> f64 {
        match self {
            Self::Gray => gray_mean(px),
            other => other.sample(px) as f64,
        }
    }

    /// Short name used in reports.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Gray => "gray",
            Self::Red => "r",
            Self::Green => "g",
            Self::Blue => "b",
            Self::Alpha => "alpha",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Channel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "gray" | "grey" => Ok(Self::Gray),
            "r" | "red" => Ok(Self::Red),
            "g" | "green" => Ok(Self::Green),
            "b" | "blue" => Ok(Self::Blue),
            "a" | "alpha" => Ok(Self::Alpha),
            _ => Err(Error::UnknownChannel(s.to_string())),
        }
    }
}
