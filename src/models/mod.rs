//! Data models

pub mod incident;
pub mod diagnosis;

pub use incident::*;
pub use diagnosis::*;
