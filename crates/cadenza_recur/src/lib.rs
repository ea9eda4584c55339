//! # Cadenza Recurrence
//!
//! Pure calendar math for recurring obligations.
//!
//! This crate provides:
//! - Calendar stepping with end-of-month clamping (`stepper`)
//! - Canonical recurrence descriptors (`descriptor`)
//! - Occurrence enumeration and forward lookup (`calculator`)
//!
//! Everything here is a pure function of its inputs: no clocks, no I/O,
//! no state retained between calls. Dates are UTC calendar dates with no
//! time-of-day component.
//!
//! ## Two computation paths
//!
//! The [`Schedule`] calculator interprets a canonical descriptor as its
//! primary path and falls back to bounded calendar stepping whenever the
//! descriptor cannot be interpreted. Both paths produce identical results
//! for every cadence this crate can express; the fallback exists so a
//! malformed persisted descriptor degrades to correct behavior instead of
//! an error.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod cadence;
mod calculator;
mod descriptor;
mod error;
pub mod stepper;

pub use cadence::{Cadence, CadenceUnit};
pub use calculator::{Schedule, STEP_LIMIT};
pub use descriptor::{DayAnchor, Descriptor, DescriptorError, Frequency};
pub use error::{RecurError, RecurResult};
