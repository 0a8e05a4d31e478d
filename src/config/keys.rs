//! Property key names.
//!
//! Legacy keys have the shape `<prefix-or-interface>/mp-rest/<setting>`.
//! Structured keys address the typed `[rest-client.clients."<prefix>"]` tables.

pub const MP_REST: &str = "mp-rest";

pub const URL: &str = "url";
pub const URI: &str = "uri";
pub const SCOPE: &str = "scope";
pub const PROVIDERS: &str = "providers";
pub const CONNECT_TIMEOUT: &str = "connectTimeout";
pub const READ_TIMEOUT: &str = "readTimeout";
pub const FOLLOW_REDIRECTS: &str = "followRedirects";
pub const PROXY_ADDRESS: &str = "proxyAddress";
pub const QUERY_PARAM_STYLE: &str = "queryParamStyle";
pub const TRUST_STORE: &str = "trustStore";
pub const TRUST_STORE_PASSWORD: &str = "trustStorePassword";
pub const TRUST_STORE_TYPE: &str = "trustStoreType";
pub const KEY_STORE: &str = "keyStore";
pub const KEY_STORE_PASSWORD: &str = "keyStorePassword";
pub const KEY_STORE_TYPE: &str = "keyStoreType";
pub const HOSTNAME_VERIFIER: &str = "hostnameVerifier";

/// Global redirect limit, used when a client sets none.
pub const MAX_REDIRECTS: &str = "rest-client.max-redirects";
pub const MULTIPART_POST_ENCODER_MODE: &str = "rest-client.multipart-post-encoder-mode";
pub const TLS_TRUST_ALL: &str = "tls.trust-all";

/// `<subject>/mp-rest/<setting>`
pub fn legacy_key(subject: &str, setting: &str) -> String {
    format!("{}/{}/{}", subject, MP_REST, setting)
}

/// `rest-client.clients."<prefix>".<field>`
pub fn structured_key(prefix: &str, field: &str) -> String {
    format!("rest-client.clients.\"{}\".{}", prefix, field)
}
