//! Error detection and correction stages for survey tracks
//!
//! Each stage is a pure function over in-memory point sets; file handling and
//! orchestration live in [`crate::processor`].
//!
//! # Stages
//!
//! - [`gross_filter`] - dropout removal, exact join and gross-outlier rejection
//! - [`crossover`] - confirmation of rejections by crossover evidence
//! - [`scale_factor`] - scale regression and rescaling
//! - [`travel_time`] - removal of sound-velocity wrap multiples
//!
//! # Sign Convention
//!
//! Values are negative below the datum. A reference value above zero places a
//! point on land, which is always a rejection.

pub mod crossover;
pub mod gross_filter;
pub mod scale_factor;
pub mod travel_time;

pub use crossover::{CrossoverIndex, confirm_outliers, confirm_outliers_linear};
pub use gross_filter::{GrossFilterOutput, apply_gross_filter, classify, split_matched};
pub use scale_factor::{ScaleCorrection, correct_scale, fit_scale_factor};
pub use travel_time::{WrapCorrection, correct_wraps, unwrap_depth};

/// Round half-to-even at one decimal place
pub fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round_ties_even() / 10.0
}
