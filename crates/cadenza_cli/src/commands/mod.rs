//! CLI command implementations.

pub mod inspect;
pub mod populate;
pub mod sync;
pub mod upcoming;
