//! Domain models for the pharmacy stock system.

mod catalog;
mod import;
mod record;
mod stock;

pub use catalog::*;
pub use import::*;
pub use record::*;
pub use stock::*;
