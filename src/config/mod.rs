//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize, environment overrides)
//!     → validation.rs (semantic checks)
//!     → ServiceConfig (validated, immutable)
//!     → handed to startup, which builds the shared subsystems
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require a restart
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, load_effective, ConfigError};
pub use schema::CacheBackendKind;
pub use schema::CacheConfig;
pub use schema::DatabaseConfig;
pub use schema::ObservabilityConfig;
pub use schema::ServiceConfig;
pub use schema::UpdateMode;
