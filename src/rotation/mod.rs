//! Time-based rotation decisions and historical file naming

pub mod history;
pub mod policy;

pub use history::HistoryPattern;
pub use policy::{RotationPolicy, RotationState, RotationZone, When};
