//! Client construction subsystem.
//!
//! # Responsibilities
//! - Resolve each setting across typed config and legacy properties
//! - Translate resolved settings into `ClientBuilder` calls
//! - Expose the built client to typed interfaces
//!
//! # Design Decisions
//! - Setting resolution is independent of the HTTP implementation; the
//!   `ClientBuilder` trait is the only seam
//! - `SettingsRecorder` lets the same pipeline report settings without I/O

pub mod base;
pub mod builder;
pub mod filter;
pub mod proxy;
pub mod recorder;
pub mod resolver;
pub mod rest_client;

pub use base::{RestClientBase, RestClientContext};
pub use builder::{ClientBuilder, ClientProperty};
pub use filter::{ResponseContext, ResponseFilter};
pub use proxy::ProxyAddress;
pub use recorder::{ClientSettings, SettingsRecorder};
pub use rest_client::{RestClient, RestInterface};
