//! Repository modules implementing storage operations for all Palanquée
//! entities.
//!
//! Each module adds methods to `PalService` via `impl PalService` blocks.

pub mod assignment;
pub mod audit;
pub mod curriculum;
pub mod evaluations;
pub mod groups;
pub mod links;
pub mod people;
pub mod progression;
pub mod reports;
pub mod sessions;
