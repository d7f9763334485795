pub mod context;
pub mod engine;
pub mod juncture;
pub mod state;
pub mod types;
