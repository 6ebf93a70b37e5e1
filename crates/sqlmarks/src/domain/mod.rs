//! Core domain types.

pub mod errors;
pub mod model;
