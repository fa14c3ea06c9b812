//! Agent review outputs: extraction, normalization, value objects

pub mod extract;
pub mod normalize;
pub mod output;
