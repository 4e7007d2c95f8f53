pub mod errors;
pub mod jobs;
pub mod models;
pub mod scheduler;
pub mod state;
