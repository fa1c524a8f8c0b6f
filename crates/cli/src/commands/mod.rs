pub mod agents;
pub mod models;
