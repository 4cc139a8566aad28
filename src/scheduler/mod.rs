pub mod action;
pub mod executor;
pub mod state;
pub mod status;
