//! The constructed client.

use std::sync::Arc;

use reqwest::header::CONTENT_TYPE;
use reqwest::{Method, RequestBuilder, Response};
use url::form_urlencoded::byte_serialize;
use url::Url;

use crate::client::filter::{ResponseContext, ResponseFilter};
use crate::config::{MultipartEncoderMode, QueryParamStyle};
use crate::error::{RestClientError, RestClientResult};

/// A typed client interface built on top of a configured [`RestClient`].
///
/// Implementors are usually thin wrappers exposing one method per endpoint.
pub trait RestInterface: Sized {
    /// Name used for `<interface>/mp-rest/<setting>` lookups.
    fn interface_name() -> &'static str {
        std::any::type_name::<Self>()
    }

    fn from_client(client: RestClient) -> Self;
}

impl RestInterface for RestClient {
    fn from_client(client: RestClient) -> Self {
        client
    }
}

/// HTTP client bound to a base URL.
#[derive(Debug, Clone)]
pub struct RestClient {
    http: reqwest::Client,
    base_url: Url,
    query_style: QueryParamStyle,
    encoder_mode: Option<MultipartEncoderMode>,
    filters: Vec<Arc<dyn ResponseFilter>>,
}

impl RestClient {
    pub fn new(
        http: reqwest::Client,
        base_url: Url,
        query_style: QueryParamStyle,
        encoder_mode: Option<MultipartEncoderMode>,
        filters: Vec<Arc<dyn ResponseFilter>>,
    ) -> Self {
        Self {
            http,
            base_url,
            query_style,
            encoder_mode,
            filters,
        }
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn query_param_style(&self) -> QueryParamStyle {
        self.query_style
    }

    pub fn filters(&self) -> &[Arc<dyn ResponseFilter>] {
        &self.filters
    }

    /// `GET <base>/<path>?<query>`. Repeated keys form a multi-valued parameter.
    pub async fn get(&self, path: &str, query: &[(&str, &str)]) -> RestClientResult<Response> {
        let mut url = self.url(path)?;
        let encoded = encode_query(self.query_style, query);
        if !encoded.is_empty() {
            url.set_query(Some(&encoded));
        }
        self.send(Method::GET, self.http.get(url)).await
    }

    /// `POST <base>/<path>` with a form body.
    pub async fn post_form(&self, path: &str, fields: &[(&str, &str)]) -> RestClientResult<Response> {
        let url = self.url(path)?;
        let body = encode_form(self.encoder_mode, fields);
        let request = self
            .http
            .post(url)
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(body);
        self.send(Method::POST, request).await
    }

    fn url(&self, path: &str) -> RestClientResult<Url> {
        let invalid_path = |reason: String| RestClientError::InvalidValue {
            key: "path".to_string(),
            value: path.to_string(),
            reason,
        };
        if self.base_url.cannot_be_a_base() {
            return Err(invalid_path(format!(
                "base URL '{}' cannot carry a path",
                self.base_url
            )));
        }

        let joined = format!(
            "{}/{}",
            self.base_url.as_str().trim_end_matches('/'),
            path.trim_start_matches('/')
        );
        Url::parse(&joined).map_err(|e| invalid_path(e.to_string()))
    }

    async fn send(&self, method: Method, request: RequestBuilder) -> RestClientResult<Response> {
        let response = request.send().await?;

        let ctx = ResponseContext {
            method: &method,
            url: response.url(),
            status: response.status(),
            headers: response.headers(),
        };
        for filter in &self.filters {
            filter
                .filter(&ctx)
                .map_err(|message| RestClientError::Filtered {
                    provider: filter.name().to_string(),
                    message,
                })?;
        }

        tracing::debug!(%method, url = %response.url(), status = %response.status(), "Response received");
        Ok(response)
    }
}

/// Encode query parameters; values of a repeated key are grouped at the
/// position of its first occurrence.
pub fn encode_query(style: QueryParamStyle, params: &[(&str, &str)]) -> String {
    let mut grouped: Vec<(&str, Vec<&str>)> = Vec::new();
    for &(key, value) in params {
        match grouped.iter_mut().find(|(k, _)| *k == key) {
            Some((_, values)) => values.push(value),
            None => grouped.push((key, vec![value])),
        }
    }

    let mut pairs: Vec<String> = Vec::new();
    for (key, values) in grouped {
        let key = encode_component(key);
        match style {
            QueryParamStyle::MultiPairs => {
                pairs.extend(values.iter().map(|v| format!("{}={}", key, encode_component(v))));
            }
            QueryParamStyle::CommaSeparated => {
                let joined: Vec<String> = values.iter().map(|v| encode_component(v)).collect();
                pairs.push(format!("{}={}", key, joined.join(",")));
            }
            QueryParamStyle::ArrayPairs => {
                pairs.extend(values.iter().map(|v| format!("{}[]={}", key, encode_component(v))));
            }
        }
    }
    pairs.join("&")
}

/// Encode a form body. RFC 3986 mode percent-encodes space and `*`.
pub fn encode_form(mode: Option<MultipartEncoderMode>, fields: &[(&str, &str)]) -> String {
    let encode = |s: &str| match mode {
        Some(MultipartEncoderMode::Rfc3986) => encode_component(s).replace('+', "%20").replace('*', "%2A"),
        _ => encode_component(s),
    };
    fields
        .iter()
        .map(|&(k, v)| format!("{}={}", encode(k), encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}

fn encode_component(s: &str) -> String {
    byte_serialize(s.as_bytes()).collect()
}
