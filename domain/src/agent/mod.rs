//! Agent panel configuration

pub mod profile;
