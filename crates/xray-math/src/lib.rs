//! # xray-math
//!
//! Descriptive statistics for image analysis.
//!
//! The functions in [`stats`] operate on flat sample sequences (ROI pixels,
//! line profiles, whole channels) of any [`Sample`] type. They are shared by
//! the ROI engine and the variance filter.
//!
//! # Example
//!
//! ```rust
//! use xray_math::{stats, StatSummary};
//!
//! let roi = vec![128u8; 100];
//! let s: StatSummary = stats::summarize(&roi);
//! assert_eq!(s.mean, 128.0);
//! assert_eq!(s.std_dev, 0.0);
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

mod error;
pub mod stats;

pub use error::{MathError, MathResult};
pub use stats::{Sample, StatSummary};
