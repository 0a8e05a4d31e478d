//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → ConfigRoot (typed, immutable) + [properties] (legacy keys)
//!     → shared via Arc in a RestClientContext
//!
//! Per client construction:
//!     resolver asks ConfigRoot for the prefix's typed field
//!     → properties.rs for "<interface>/mp-rest/<setting>"
//!     → properties.rs for "<prefix>/mp-rest/<setting>"
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; there is no reload
//! - All fields are optional so minimal configs work
//! - Validation separates syntactic (serde) from semantic checks

pub mod keys;
pub mod loader;
pub mod properties;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError, ConfigFile};
pub use properties::{DynamicProperties, EnvSource, FromProperty, MapSource, PropertySource};
pub use schema::{ClientConfig, ClientScope, ConfigRoot, MultipartEncoderMode, QueryParamStyle};
