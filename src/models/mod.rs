//! Data models

pub mod risk;
pub mod batch;
pub mod envelope;

pub use risk::*;
pub use batch::*;
pub use envelope::*;
