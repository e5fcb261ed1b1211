//! AI systems

pub mod brains;
pub mod contacts;

// Re-export all systems
pub use brains::*;
pub use contacts::*;
