//! REST client configuration and construction.
//!
//! Settings for each client are layered from typed configuration
//! (`[rest-client.clients."<prefix>"]`), legacy `<name>/mp-rest/<setting>`
//! properties and a base URI declared with the client interface, then applied
//! to a `ClientBuilder`. TLS key and trust stores are loaded from disk or from
//! bundled resources.
//!
//! ```rust,ignore
//! let file = rest_client_config::config::load_config(Path::new("clients.toml"))?;
//! let context = RestClientContext::from_config_file(file);
//! let client: RestClient = context.create_client(None, Some("echo"), Vec::new())?;
//! let response = client.get("/hello", &[("name", "world")]).await?;
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod keystore;
pub mod net;
pub mod registry;

pub use client::{
    ClientBuilder, ClientProperty, ClientSettings, ResponseContext, ResponseFilter, RestClient,
    RestClientBase, RestClientContext, RestInterface, SettingsRecorder,
};
pub use config::{ClientConfig, ConfigRoot, DynamicProperties};
pub use error::{RestClientError, RestClientResult, StoreKind};
pub use keystore::{KeyStore, StoreType};
pub use net::{HostnameVerifier, ReqwestClientBuilder};
pub use registry::Registry;
