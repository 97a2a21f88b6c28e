// Platform API HTTP client
//
// Wraps `reqwest::Client` with bearer-token injection, URL construction,
// and response normalization. Endpoint modules (sites, deploys, env) are
// implemented as inherent methods in separate files to keep this module
// focused on transport mechanics.

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue, LINK};
use reqwest::{Method, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use tracing::{debug, error, warn};
use url::Url;

use crate::error::Error;
use crate::models::Page;
use crate::transport::TransportConfig;

/// Error body shape returned by the platform on non-2xx responses.
#[derive(serde::Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
}

/// Delete acknowledgement shape: `{"code": 0, "message": "..."}`.
#[derive(serde::Deserialize)]
struct DeleteAck {
    code: Option<i64>,
    #[serde(default)]
    message: Option<String>,
}

// ── Request ──────────────────────────────────────────────────────────

/// One call against an endpoint given as path segments.
///
/// Each segment is percent-escaped on its own, so an id can never add
/// path levels or a query. Defaults to no query, body, or extra headers.
#[derive(Debug, Clone)]
pub struct Request {
    method: Method,
    segments: Vec<String>,
    query: Vec<(String, String)>,
    body: Option<serde_json::Value>,
    headers: HeaderMap,
}

impl Request {
    fn new<I, S>(method: Method, segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            method,
            segments: segments.into_iter().map(|s| s.as_ref().to_owned()).collect(),
            query: Vec::new(),
            body: None,
            headers: HeaderMap::new(),
        }
    }

    /// `GET` on e.g. `["sites", site_id, "deploys"]`.
    pub fn get<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::new(Method::GET, segments)
    }

    pub fn post<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::new(Method::POST, segments)
    }

    pub fn delete<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::new(Method::DELETE, segments)
    }

    /// Append a query parameter.
    pub fn query(mut self, key: &str, value: impl ToString) -> Self {
        self.query.push((key.to_owned(), value.to_string()));
        self
    }

    /// Attach a JSON body.
    pub fn json(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Add a caller header. Caller headers win over the defaults,
    /// except `Authorization`, which is always the configured token.
    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }
}

// ── Responses ────────────────────────────────────────────────────────

/// Parsed JSON body together with the response headers.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub data: serde_json::Value,
    pub headers: HeaderMap,
}

impl ApiResponse {
    /// Raw `Link` header, if the platform sent one.
    pub fn link(&self) -> Option<&str> {
        self.headers.get(LINK).and_then(|v| v.to_str().ok())
    }

    /// `true` when the `Link` header advertises a `rel="next"` page.
    pub fn has_next_page(&self) -> bool {
        self.link().is_some_and(|l| l.contains("rel=\"next\""))
    }

    /// Decode the body into a concrete type.
    pub fn decode<T: DeserializeOwned>(self) -> Result<T, Error> {
        serde_json::from_value(self.data.clone()).map_err(|e| {
            let body = self.data.to_string();
            let preview: String = body.chars().take(200).collect();
            Error::Deserialization {
                message: format!("{e} (body preview: {preview:?})"),
                body,
            }
        })
    }

    /// Decode a list endpoint into a [`Page`].
    ///
    /// A bare object carrying an `id` is treated as a one-element list;
    /// any other shape yields an empty page.
    pub fn decode_list<T: DeserializeOwned>(self) -> Result<Page<T>, Error> {
        let link = self.link().map(str::to_owned);
        let has_more = self.has_next_page();
        let data = match self.data {
            serde_json::Value::Array(items) => serde_json::Value::Array(items),
            serde_json::Value::Object(obj) if obj.contains_key("id") => {
                serde_json::Value::Array(vec![serde_json::Value::Object(obj)])
            }
            other => {
                warn!(body = %other, "unexpected list response shape");
                serde_json::Value::Array(Vec::new())
            }
        };
        let items = ApiResponse {
            data,
            headers: HeaderMap::new(),
        }
        .decode()?;
        Ok(Page {
            items,
            link,
            has_more,
        })
    }
}

/// Normalized result of a successful call.
#[derive(Debug, Clone)]
pub enum Outcome {
    /// HTTP 204, nothing to parse.
    NoContent,
    /// A DELETE whose body reported `code: 0`.
    Deleted { message: Option<String> },
    /// Any other success.
    Body(ApiResponse),
}

impl Outcome {
    /// Require a body, failing with `Unexpected` for the bodiless variants.
    pub fn into_response(self) -> Result<ApiResponse, Error> {
        match self {
            Self::Body(resp) => Ok(resp),
            Self::NoContent | Self::Deleted { .. } => Err(Error::Unexpected {
                message: "expected a response body but the platform returned none".into(),
            }),
        }
    }

    /// Require a body and decode it.
    pub fn decode<T: DeserializeOwned>(self) -> Result<T, Error> {
        self.into_response()?.decode()
    }
}

// ── Client ───────────────────────────────────────────────────────────

/// Async client for the platform REST API.
///
/// Cheap to clone: the inner `reqwest::Client` is reference-counted.
/// The token is optional at construction so that a missing credential
/// surfaces as [`Error::Configuration`] on first use rather than at startup.
#[derive(Clone)]
pub struct PlatformClient {
    http: reqwest::Client,
    base_url: Url,
    token: Option<SecretString>,
}

impl std::fmt::Debug for PlatformClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlatformClient")
            .field("base_url", &self.base_url.as_str())
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .finish_non_exhaustive()
    }
}

impl PlatformClient {
    /// Build a client from a base URL, an optional token, and transport settings.
    pub fn new(
        base_url: &str,
        token: Option<SecretString>,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Self::with_client(base_url, token, http)
    }

    /// Wrap an existing `reqwest::Client`.
    pub fn with_client(
        base_url: &str,
        token: Option<SecretString>,
        http: reqwest::Client,
    ) -> Result<Self, Error> {
        let base_url = Url::parse(base_url.trim_end_matches('/'))?;
        Ok(Self {
            http,
            base_url,
            token,
        })
    }

    // ── URL builder ──────────────────────────────────────────────────

    /// Append endpoint segments to the base URL, escaping each one.
    ///
    /// Empty, `.` and `..` segments are refused before any I/O.
    pub(crate) fn url(&self, segments: &[String]) -> Result<Url, Error> {
        if let Some(bad) = segments
            .iter()
            .find(|s| s.is_empty() || *s == "." || *s == "..")
        {
            return Err(Error::Configuration {
                message: format!("invalid identifier in request path: {bad:?}"),
            });
        }
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| Error::Configuration {
                message: format!("platform URL cannot carry a path: {}", self.base_url),
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn auth_headers(&self, extra: &HeaderMap) -> Result<HeaderMap, Error> {
        let token = self.token.as_ref().ok_or_else(|| Error::Configuration {
            message: "platform API token is not available".into(),
        })?;

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        for (name, value) in extra {
            headers.insert(name.clone(), value.clone());
        }

        let mut bearer = HeaderValue::from_str(&format!("Bearer {}", token.expose_secret()))
            .map_err(|e| Error::Configuration {
                message: format!("invalid API token header value: {e}"),
            })?;
        bearer.set_sensitive(true);
        headers.insert(AUTHORIZATION, bearer);
        Ok(headers)
    }

    // ── Request execution ────────────────────────────────────────────

    /// Issue one call and normalize the result. Never retries.
    pub async fn send(&self, request: Request) -> Result<Outcome, Error> {
        let headers = self.auth_headers(&request.headers)?;
        let url = self.url(&request.segments)?;
        debug!(method = %request.method, %url, "platform request");

        let mut builder = self
            .http
            .request(request.method.clone(), url)
            .headers(headers);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(ref body) = request.body {
            builder = builder.json(body);
        }

        let resp = builder.send().await.map_err(|e| self.network_error(e))?;
        self.normalize(&request.method, resp).await
    }

    /// Convenience for `GET` + decode.
    pub async fn get_json<T: DeserializeOwned>(&self, request: Request) -> Result<T, Error> {
        self.send(request).await?.decode()
    }

    async fn normalize(&self, method: &Method, resp: reqwest::Response) -> Result<Outcome, Error> {
        let status = resp.status();

        if !status.is_success() {
            return Err(self.parse_error(status, resp).await);
        }

        if status == StatusCode::NO_CONTENT {
            return Ok(Outcome::NoContent);
        }

        let headers = resp.headers().clone();
        let body = resp.text().await.map_err(|e| self.network_error(e))?;

        if body.trim().is_empty() {
            return Ok(Outcome::NoContent);
        }

        let data: serde_json::Value = serde_json::from_str(&body).map_err(|e| {
            let preview: String = body.chars().take(200).collect();
            Error::Deserialization {
                message: format!("{e} (body preview: {preview:?})"),
                body: body.clone(),
            }
        })?;

        if *method == Method::DELETE {
            if let Ok(DeleteAck {
                code: Some(0),
                message,
            }) = serde_json::from_value::<DeleteAck>(data.clone())
            {
                return Ok(Outcome::Deleted { message });
            }
        }

        Ok(Outcome::Body(ApiResponse { data, headers }))
    }

    async fn parse_error(&self, status: StatusCode, resp: reqwest::Response) -> Error {
        let raw = resp.text().await.unwrap_or_default();
        let message = error_message(status, &raw);

        error!(status = status.as_u16(), %message, "platform API error");

        Error::Http {
            status: status.as_u16(),
            message,
        }
    }

    fn network_error(&self, source: reqwest::Error) -> Error {
        let message = if source.is_connect() || source.is_timeout() {
            format!(
                "Unable to connect to the platform API. Please check your internet connection \
                 and proxy settings, and ensure you can access {}",
                self.base_url
            )
        } else if source.is_request() || source.is_body() || source.is_decode() {
            format!(
                "Connection to the platform API failed: {source}. Please check your internet \
                 connection and proxy settings."
            )
        } else {
            return Error::Unexpected {
                message: source.to_string(),
            };
        };
        Error::Network { message, source }
    }
}

/// Build the user-facing message for a rejected call.
///
/// Prefers the body's `message` field, then the compact JSON body,
/// then the raw text, then the status line.
fn error_message(status: StatusCode, raw: &str) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(raw) {
        if let Ok(ErrorBody {
            message: Some(message),
        }) = serde_json::from_value::<ErrorBody>(value.clone())
        {
            return message;
        }
        let is_empty_object = value.as_object().is_some_and(serde_json::Map::is_empty);
        if !is_empty_object && !value.is_null() {
            return value.to_string();
        }
    } else if !raw.trim().is_empty() {
        return raw.chars().take(200).collect();
    }

    format!(
        "Platform API request failed: {} {}",
        status.as_u16(),
        status.canonical_reason().unwrap_or("")
    )
    .trim_end()
    .to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_message_prefers_message_field() {
        let msg = error_message(StatusCode::UNPROCESSABLE_ENTITY, r#"{"message":"name taken"}"#);
        assert_eq!(msg, "name taken");
    }

    #[test]
    fn error_message_falls_back_to_json_body() {
        let msg = error_message(StatusCode::BAD_REQUEST, r#"{"errors":["bad"]}"#);
        assert_eq!(msg, r#"{"errors":["bad"]}"#);
    }

    #[test]
    fn error_message_falls_back_to_status_line() {
        assert_eq!(
            error_message(StatusCode::BAD_GATEWAY, ""),
            "Platform API request failed: 502 Bad Gateway"
        );
        assert_eq!(
            error_message(StatusCode::BAD_GATEWAY, "{}"),
            "Platform API request failed: 502 Bad Gateway"
        );
    }

    #[test]
    fn link_header_detects_next_page() {
        let mut headers = HeaderMap::new();
        headers.insert(
            LINK,
            HeaderValue::from_static(
                r#"<https://api.example.com/sites?page=2>; rel="next", <https://api.example.com/sites?page=9>; rel="last""#,
            ),
        );
        let resp = ApiResponse {
            data: serde_json::Value::Null,
            headers,
        };
        assert!(resp.has_next_page());

        let last_page = ApiResponse {
            data: serde_json::Value::Null,
            headers: HeaderMap::new(),
        };
        assert!(!last_page.has_next_page());
    }

    #[test]
    fn url_joins_segments_under_base_path() {
        let client = PlatformClient::with_client(
            "https://api.example.com/api/v1/",
            None,
            reqwest::Client::new(),
        )
        .expect("valid base url");
        let url = client
            .url(&["sites".into(), "abc".into(), "deploys".into()])
            .expect("valid path");
        assert_eq!(url.as_str(), "https://api.example.com/api/v1/sites/abc/deploys");
    }

    #[test]
    fn url_escapes_each_segment() {
        let client =
            PlatformClient::with_client("https://api.example.com", None, reqwest::Client::new())
                .expect("valid base url");
        let url = client
            .url(&["sites".into(), "a/b?c#d".into()])
            .expect("valid path");
        assert_eq!(url.path(), "/sites/a%2Fb%3Fc%23d");
        assert_eq!(url.query(), None);
    }

    #[test]
    fn url_refuses_dot_segments() {
        let client =
            PlatformClient::with_client("https://api.example.com", None, reqwest::Client::new())
                .expect("valid base url");
        for bad in ["", ".", ".."] {
            let err = client
                .url(&["sites".into(), bad.into()])
                .expect_err("dot segment accepted");
            assert!(matches!(err, Error::Configuration { .. }), "{bad:?}: {err:?}");
        }
    }
}
