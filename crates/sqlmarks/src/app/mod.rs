//! Application layer orchestrating domain logic and infrastructure.

pub mod content;
pub mod library;
pub mod locations;
pub mod parser;
pub mod pipeline;
pub mod resolve;
pub mod slice;
