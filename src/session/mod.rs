//! Cookie-carrying HTTP session against the Ancestry.com site.
//!
//! The login call stores the authentication cookies in the session's jar and
//! every later request sends them back. All responses are validated the same
//! way: anything outside the 1xx-2xx status class is fatal, and the body is
//! drained before the error is returned.

mod endpoints;

pub use endpoints::{DEFAULT_BASE_URL, Endpoints};

use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use reqwest::cookie::Jar;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};
use url::Url;

use crate::credentials::Credentials;
use crate::output::OutputSink;
use crate::{GedcomError, user_agent};

/// Default HTTP connect timeout (30 seconds).
pub const CONNECT_TIMEOUT_SECS: u64 = 30;

/// Default overall request timeout (5 minutes, the GEDCOM body can be large).
pub const READ_TIMEOUT_SECS: u64 = 300;

/// Authenticated HTTP session for one run.
///
/// Owns the cookie jar; pass it by reference to every operation that talks to
/// the site.
#[derive(Debug, Clone)]
pub struct SiteSession {
    client: Client,
    endpoints: Endpoints,
}

impl SiteSession {
    /// Creates a session with default timeouts and an empty cookie jar.
    ///
    /// # Errors
    ///
    /// Returns [`GedcomError::Configuration`] if the HTTP client cannot be built.
    pub fn new(endpoints: Endpoints) -> Result<Self, GedcomError> {
        Self::with_timeouts(endpoints, CONNECT_TIMEOUT_SECS, READ_TIMEOUT_SECS)
    }

    /// Creates a session with explicit timeout values.
    ///
    /// # Errors
    ///
    /// Returns [`GedcomError::Configuration`] if the HTTP client cannot be built.
    #[instrument(level = "debug", skip(endpoints), fields(base_url = %endpoints.base_url()))]
    pub fn with_timeouts(
        endpoints: Endpoints,
        connect_timeout_secs: u64,
        read_timeout_secs: u64,
    ) -> Result<Self, GedcomError> {
        let client = build_client(
            Arc::new(Jar::default()),
            connect_timeout_secs,
            read_timeout_secs,
        )?;
        Ok(Self { client, endpoints })
    }

    /// The site URLs this session talks to.
    #[must_use]
    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    /// Posts the sign-in form. On success the session cookies are in the jar.
    ///
    /// # Errors
    ///
    /// Returns [`GedcomError::HttpStatus`] for a 3xx-5xx answer, or a
    /// transport error if the request fails.
    #[instrument(skip(self, credentials), fields(username = %credentials.username()))]
    pub async fn login(&self, credentials: &Credentials) -> Result<(), GedcomError> {
        let url = self.endpoints.signin();
        let form = [
            ("username", credentials.username()),
            ("password", credentials.password()),
        ];
        let response = self.send(self.client.post(&url).form(&form), &url).await?;
        drain(response).await;
        debug!("sign-in accepted");
        Ok(())
    }

    /// GETs `url` with query parameters and returns the body as text.
    ///
    /// # Errors
    ///
    /// Returns [`GedcomError::HttpStatus`] or a transport error.
    pub async fn get_text(&self, url: &str, query: &[(&str, &str)]) -> Result<String, GedcomError> {
        let response = self.send(self.client.get(url).query(query), url).await?;
        response
            .text()
            .await
            .map_err(|e| GedcomError::transport(url, e))
    }

    /// GETs `url` with query parameters and decodes the JSON body.
    ///
    /// # Errors
    ///
    /// Returns [`GedcomError::HttpStatus`], a transport error, or
    /// [`GedcomError::Decode`] if the body is not the expected JSON.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, &str)],
    ) -> Result<T, GedcomError> {
        let response = self.send(self.client.get(url).query(query), url).await?;
        let body = response
            .bytes()
            .await
            .map_err(|e| GedcomError::transport(url, e))?;
        serde_json::from_slice(&body).map_err(|e| GedcomError::decode(url, e))
    }

    /// Streams the body of `url` into `sink` and returns the number of bytes written.
    ///
    /// # Errors
    ///
    /// Returns [`GedcomError::InvalidUrl`], [`GedcomError::HttpStatus`], a
    /// transport error, or [`GedcomError::Io`] if writing fails.
    #[instrument(skip(self, sink), fields(sink = %sink.label().display()))]
    pub async fn download(&self, url: &str, sink: &mut OutputSink) -> Result<u64, GedcomError> {
        Url::parse(url).map_err(|_| GedcomError::invalid_url(url))?;

        let response = self.send(self.client.get(url), url).await?;
        let mut stream = response.bytes_stream();
        let mut bytes_written: u64 = 0;

        while let Some(chunk_result) = stream.next().await {
            let chunk = chunk_result.map_err(|e| GedcomError::transport(url, e))?;
            sink.write_chunk(&chunk).await?;
            bytes_written += chunk.len() as u64;
        }

        sink.finish().await?;
        debug!(bytes = bytes_written, "download stream complete");
        Ok(bytes_written)
    }

    async fn send(&self, request: RequestBuilder, url: &str) -> Result<Response, GedcomError> {
        let response = request
            .send()
            .await
            .map_err(|e| GedcomError::transport(url, e))?;

        let status = response.status();
        debug!(url, status = status.as_u16(), "response received");
        if !is_accepted_status(status) {
            drain(response).await;
            return Err(GedcomError::http_status(url, status.as_u16()));
        }
        Ok(response)
    }
}

/// Informational and success classes pass; redirects that were not followed,
/// client errors and server errors fail.
fn is_accepted_status(status: StatusCode) -> bool {
    status.as_u16() / 100 < 3
}

async fn drain(response: Response) {
    if let Err(error) = response.bytes().await {
        debug!(error = %error, "failed to drain response body");
    }
}

fn build_client(
    jar: Arc<Jar>,
    connect_timeout_secs: u64,
    read_timeout_secs: u64,
) -> Result<Client, GedcomError> {
    Client::builder()
        .connect_timeout(Duration::from_secs(connect_timeout_secs))
        .timeout(Duration::from_secs(read_timeout_secs))
        .gzip(true)
        .user_agent(user_agent::default_user_agent())
        .cookie_provider(jar)
        .build()
        .map_err(|e| GedcomError::configuration(format!("HTTP client construction failed: {e}")))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_string_contains, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn session_for(server: &MockServer) -> SiteSession {
        SiteSession::new(Endpoints::with_base_url(server.uri()).unwrap()).unwrap()
    }

    #[tokio::test]
    async fn test_custom_timeouts_session_reaches_site() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ping"))
            .respond_with(ResponseTemplate::new(200).set_body_string("pong"))
            .expect(1)
            .mount(&server)
            .await;

        let endpoints = Endpoints::with_base_url(server.uri()).unwrap();
        let session = SiteSession::with_timeouts(endpoints, 1, 5).unwrap();
        let url = format!("{}/ping", server.uri());
        assert_eq!(session.get_text(&url, &[]).await.unwrap(), "pong");
    }

    #[test]
    fn test_status_class_boundaries() {
        assert!(is_accepted_status(StatusCode::OK));
        assert!(is_accepted_status(StatusCode::NO_CONTENT));
        assert!(is_accepted_status(StatusCode::CONTINUE));
        assert!(!is_accepted_status(StatusCode::FOUND));
        assert!(!is_accepted_status(StatusCode::NOT_FOUND));
        assert!(!is_accepted_status(StatusCode::INTERNAL_SERVER_ERROR));
    }

    #[tokio::test]
    async fn test_login_posts_form_fields() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/account/signin"))
            .and(body_string_contains("username=jane"))
            .and(body_string_contains("password=s%26cret"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let session = session_for(&server);
        session
            .login(&Credentials::new("jane", "s&cret"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_login_rejected_carries_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/account/signin"))
            .respond_with(ResponseTemplate::new(403).set_body_string("denied"))
            .mount(&server)
            .await;

        let session = session_for(&server);
        let error = session
            .login(&Credentials::new("jane", "wrong"))
            .await
            .unwrap_err();
        assert_eq!(error.status(), Some(403));
    }

    #[tokio::test]
    async fn test_get_json_sends_query_and_decodes() {
        #[derive(serde::Deserialize)]
        struct Echo {
            value: String,
        }

        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/echo"))
            .and(query_param("gid", "g 1"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"value":"ok"}"#))
            .mount(&server)
            .await;

        let session = session_for(&server);
        let url = format!("{}/echo", server.uri());
        let echo: Echo = session.get_json(&url, &[("gid", "g 1")]).await.unwrap();
        assert_eq!(echo.value, "ok");
    }

    #[tokio::test]
    async fn test_get_json_malformed_body_is_decode_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/broken"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
            .mount(&server)
            .await;

        let session = session_for(&server);
        let url = format!("{}/broken", server.uri());
        let result: Result<serde_json::Value, _> = session.get_json(&url, &[]).await;
        assert!(matches!(result, Err(GedcomError::Decode { .. })));
    }

    #[tokio::test]
    async fn test_get_text_server_error_is_http_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/page"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let session = session_for(&server);
        let url = format!("{}/page", server.uri());
        let error = session.get_text(&url, &[]).await.unwrap_err();
        assert_eq!(error.status(), Some(500));
    }

    #[tokio::test]
    async fn test_download_rejects_invalid_url() {
        let server = MockServer::start().await;
        let session = session_for(&server);
        let mut sink = OutputSink::new("buffer", Box::new(Vec::<u8>::new()));
        let result = session.download("not-a-url", &mut sink).await;
        assert!(matches!(result, Err(GedcomError::InvalidUrl { .. })));
    }
}
