pub mod errors;
pub mod settings;
pub mod types;

// Re-export EngineError for convenience
pub use errors::{EngineError, EngineResult};
