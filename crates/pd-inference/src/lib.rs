//! # pd-inference
//!
//! Profile-likelihood uncertainty decomposition for PLRDecomp.
//!
//! - [`scan`]: the `total` / `stat` / per-source fit protocol for one channel
//! - [`channel`]: channel tags and the ordered cross-channel table
//! - [`breakdown`]: multi-channel driver
//! - [`gaussian`]: Gaussian reference interval solver

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod breakdown;
pub mod channel;
pub mod config;
pub mod gaussian;
pub mod scan;

pub use breakdown::{BreakdownReport, ChannelCurves, SkippedChannel, run_breakdown};
pub use channel::{ChannelEntry, ChannelTable, channel_tag};
pub use config::{DEFAULT_CONFIDENCE_LEVEL, ScanConfig};
pub use gaussian::GaussianIntervalSolver;
pub use scan::{
    ChannelScan, NuisanceScanEngine, NuisanceSnapshot, ScanStep, ScanStepResult, StepLabel,
};
