//! Invoice and dues documents (data only; layout is left to the front end).

mod dues;
mod invoice;

pub use dues::*;
pub use invoice::*;
