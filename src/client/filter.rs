//! Response filters ("providers").

use reqwest::header::HeaderMap;
use reqwest::{Method, StatusCode};
use url::Url;

/// What a filter sees of a response.
#[derive(Debug)]
pub struct ResponseContext<'a> {
    pub method: &'a Method,
    pub url: &'a Url,
    pub status: StatusCode,
    pub headers: &'a HeaderMap,
}

/// Runs on every response a client receives.
///
/// Returning `Err` rejects the response; the message is surfaced to the
/// caller as `RestClientError::Filtered`.
pub trait ResponseFilter: Send + Sync + std::fmt::Debug {
    /// Name used in errors and logs.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    fn filter(&self, ctx: &ResponseContext<'_>) -> Result<(), String>;
}

/// Identifier under which [`RejectServerErrors`] is registered.
pub const REJECT_SERVER_ERRORS: &str = concat!(module_path!(), "::RejectServerErrors");

/// Rejects responses with a server error status.
#[derive(Debug, Clone, Copy, Default)]
pub struct RejectServerErrors;

impl ResponseFilter for RejectServerErrors {
    fn filter(&self, ctx: &ResponseContext<'_>) -> Result<(), String> {
        if ctx.status.is_server_error() {
            return Err(format!("{} {} returned {}", ctx.method, ctx.url, ctx.status));
        }
        Ok(())
    }
}

fn reject_server_errors() -> std::sync::Arc<dyn ResponseFilter> {
    std::sync::Arc::new(RejectServerErrors)
}

inventory::submit! {
    crate::registry::ProviderRegistration::new(
        REJECT_SERVER_ERRORS,
        reject_server_errors,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reject_server_errors() {
        let url = Url::parse("http://localhost/echo").unwrap();
        let headers = HeaderMap::new();
        let mut ctx = ResponseContext {
            method: &Method::GET,
            url: &url,
            status: StatusCode::OK,
            headers: &headers,
        };
        assert!(RejectServerErrors.filter(&ctx).is_ok());

        ctx.status = StatusCode::BAD_GATEWAY;
        let err = RejectServerErrors.filter(&ctx).unwrap_err();
        assert!(err.contains("502"));
    }

    #[test]
    fn test_default_name_is_type_name() {
        assert!(RejectServerErrors.name().ends_with("RejectServerErrors"));
    }
}
