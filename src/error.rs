//! Error definitions shared by every stage of client construction.

use thiserror::Error;

/// Which of the two TLS stores an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    TrustStore,
    KeyStore,
}

impl std::fmt::Display for StoreKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreKind::TrustStore => write!(f, "truststore"),
            StoreKind::KeyStore => write!(f, "keystore"),
        }
    }
}

/// Errors raised while resolving configuration and constructing a client.
///
/// Everything before `build` returns is a fatal configuration error; none of
/// these are retried.
#[derive(Debug, Error)]
pub enum RestClientError {
    /// Neither `uri`, `url` nor a declared base URI resolved.
    #[error(
        "Unable to determine the proper base URL for client '{prefix}'. Declare a base URI on the \
         client interface, or add '{url_key}' or '{uri_key}' to your configuration"
    )]
    MissingBaseUrl {
        prefix: String,
        url_key: String,
        uri_key: String,
    },

    /// The resolved base URL could not be parsed.
    #[error("The value of URL was invalid: {value}")]
    InvalidBaseUrl {
        value: String,
        #[source]
        source: url::ParseError,
    },

    /// A present property value could not be decoded into its target type,
    /// or a request path could not be joined onto the base URL.
    #[error("Invalid value '{value}' for property '{key}': {reason}")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },

    #[error("Could not find provider: {0}")]
    ProviderNotFound(String),

    #[error("Could not find hostname verifier {0}")]
    HostnameVerifierNotFound(String),

    #[error("Failed to instantiate hostname verifier {name}: {reason}")]
    HostnameVerifierInstantiation { name: String, reason: String },

    #[error("The provided hostname verifier {0} is not a hostname verifier")]
    NotAHostnameVerifier(String),

    #[error("Invalid proxy string. Expected <hostname>:<port>, found '{0}'")]
    InvalidProxyAddress(String),

    #[error("Invalid proxy setting. The port is not a number in '{0}'")]
    InvalidProxyPort(String),

    #[error("Classpath resource {0} not found for rest client TLS configuration")]
    ResourceNotFound(String),

    #[error("Certificate file: {0} not found for rest client TLS configuration")]
    CertificateFileNotFound(String),

    #[error("No password provided for {0}")]
    MissingStorePassword(StoreKind),

    #[error("Unsupported {kind} type '{store_type}'")]
    UnsupportedStoreType { kind: StoreKind, store_type: String },

    #[error("Failed to initialize {kind} from {path}: {reason}")]
    StoreLoad {
        kind: StoreKind,
        path: String,
        reason: String,
    },

    /// TLS material loaded but could not be turned into a client configuration.
    #[error("TLS configuration error: {0}")]
    Tls(String),

    /// A registered response filter rejected a response.
    #[error("Response rejected by {provider}: {message}")]
    Filtered { provider: String, message: String },

    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Result type for client construction and use.
pub type RestClientResult<T> = Result<T, RestClientError>;
