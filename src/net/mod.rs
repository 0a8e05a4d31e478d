//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! ReqwestClientBuilder (collected settings)
//!     → tls.rs (rustls ClientConfig from stores, verifier, trust-all)
//!     → reqwest::Client (timeouts, pool, redirects, proxy)
//!     → RestClient
//! ```
//!
//! # Design Decisions
//! - The default reqwest TLS setup is kept unless something TLS-related
//!   was configured
//! - Hostname verifiers are a fallback, never a replacement for chain checks

pub mod hostname;
pub mod tls;
pub mod transport;

pub use hostname::{HostnameVerifier, NoopHostnameVerifier, NOOP_HOSTNAME_VERIFIER};
pub use transport::ReqwestClientBuilder;
