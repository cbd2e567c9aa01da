//! Bathymetry cleaning library
//!
//! Cleans shipborne depth soundings against a gridded reference model:
//! - Loading whitespace-delimited `lon lat value` point sets
//! - Exact-coordinate joins against a reference index
//! - Gross-outlier rejection (on land, or too far from the model)
//! - Confirmation of rejections by independent track crossovers
//! - Scale-factor and travel-time wrap corrections
//! - Atomic per-track output with JSON run reports, in single or batch mode

pub mod cli;
pub mod config;
pub mod constants;
pub mod error;
pub mod loader;
pub mod models;
pub mod processor;
pub mod qc;
pub mod reference;
pub mod x2sys;

pub use config::{CrossoverTolerance, PipelineConfig, TrackLayout, WrapConfig};
pub use error::{BathyError, Result};
pub use models::{
    ConfirmedOutlier, CoordKey, CrossoverRecord, MatchedPoint, Point, RejectedPoint,
    RejectionReason, TrackStats,
};
pub use processor::{TrackContext, TrackOutcome, TrackTask};
pub use reference::ReferenceIndex;
