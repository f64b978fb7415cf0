//! Job descriptions and the parser that produces them.

pub mod job;
pub mod parser;
