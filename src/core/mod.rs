/*!
 * Core Module
 * Identities, limits, configuration and error handling shared by every subsystem
 */

pub mod config;
pub mod errors;
pub mod id;
pub mod limits;

// Re-export for convenience
pub use config::EngineConfig;
pub use errors::*;
pub use id::UnitId;
