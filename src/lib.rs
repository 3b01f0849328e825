//! Validation of reduced-precision oscillator traces.
//!
//! [`data::loader`] turns a CSV dump (headered or the fixed 7-column
//! layout) into a cleaned [`data::model::Trace`]; [`data::analyzer`] rebuilds
//! missing velocity channels and reports records above a magnitude
//! threshold. The viewer binary only draws what these produce.

pub mod config;
pub mod data;

pub use config::ValidationConfig;
pub use data::analyzer::{
    analyze, Analysis, AnomalyReport, CheckedChannels, ExactDerivative, SkippedDerivative,
};
pub use data::loader::{load_any, load_trace};
pub use data::model::{Schema, Trace};
pub use data::{Result, TraceError};
