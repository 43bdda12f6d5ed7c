//! Error types, failure taxonomy and the provider error classifier.

mod categories;
mod classifier;
mod failure;
mod kinds;
mod types;

pub use categories::*;
pub use classifier::*;
pub use failure::*;
pub use kinds::*;
pub use types::*;
