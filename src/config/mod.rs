//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → SyncConfig (validated, immutable)
//!     → FamilyRegistry::from_config builds clients once at startup
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{
    ElrondConfig, EthereumConfig, FamiliesConfig, NetworkSettings, ObservabilityConfig,
    RetryConfig, ScanConfig, SyncConfig,
};
pub use validation::{validate_config, ConfigValidationError};
