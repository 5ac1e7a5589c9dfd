//! Domain models for the clinic ledger.

mod catalog;
mod patient;
mod tooth;
mod visit;

pub use catalog::*;
pub use patient::*;
pub use tooth::*;
pub use visit::*;
