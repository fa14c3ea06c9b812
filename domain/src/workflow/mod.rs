//! Workflow state and derived views

pub mod questions;
pub mod state;
