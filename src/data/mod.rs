//! Data layer: trace model, loading/cleaning, and analysis.
//!
//! Architecture:
//! ```text
//!   headered .csv / headerless .csv
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  loader   │  detect layout → coerce cells → drop non-finite records
//!   └──────────┘
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  Trace    │  t + named channels, all finite, equal length
//!   └──────────┘
//!        │
//!        ▼
//!   ┌──────────┐
//!   │ analyzer  │  rebuild missing v channels → flag |v| > threshold
//!   └──────────┘
//!        │
//!        ▼
//!   AnomalyReport + augmented Trace → ui
//! ```

pub mod analyzer;
pub mod error;
pub mod loader;
pub mod model;

pub use error::{Result, TraceError};
