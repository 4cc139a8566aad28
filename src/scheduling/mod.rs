pub mod day_plan;
pub mod session_classifier;
pub mod types;
