//! Use cases (application logic)

pub mod review_round;
pub mod run_batch;
pub mod run_workflow;
