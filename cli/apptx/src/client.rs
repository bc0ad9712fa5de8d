//! HTTP transport for appliance communication.

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Method, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::config::{Config, Endpoint, TlsMode};
use crate::error::{ApiError, ApiResult};
use crate::session::SessionToken;

/// Status code and body of one appliance response.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: StatusCode,
    pub body: Vec<u8>,
}

impl RawResponse {
    /// Decode the body as JSON.
    pub fn json<T: DeserializeOwned>(&self, context: &str) -> ApiResult<T> {
        serde_json::from_slice(&self.body).map_err(|e| ApiError::decode(context, e))
    }

    /// Decode the body of a 2xx response, or fail with a remote error.
    pub fn success_json<T: DeserializeOwned>(&self, action: &str) -> ApiResult<T> {
        if !self.status.is_success() {
            return Err(ApiError::remote(self.status.as_u16(), action));
        }
        self.json(action)
    }

    /// Body as lossy UTF-8, for diagnostics.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// API client for communicating with the appliance.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    endpoint: Endpoint,
    token: Option<SessionToken>,
}

impl ApiClient {
    /// Create an unauthenticated client from config.
    pub fn new(config: &Config) -> ApiResult<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .danger_accept_invalid_certs(config.tls == TlsMode::Insecure)
            .build()?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            token: None,
        })
    }

    /// Attach a bearer token to every subsequent request.
    pub fn with_token(mut self, token: SessionToken) -> Self {
        self.token = Some(token);
        self
    }

    /// Resolve an appliance path to a full URL.
    pub fn url(&self, path: &str) -> ApiResult<Url> {
        self.endpoint.url(path)
    }

    /// Issue one request and return the raw status and body.
    ///
    /// Any status code is returned as-is; only network, encode and body-read
    /// failures are errors.
    pub async fn request<B: Serialize + ?Sized>(
        &self,
        method: Method,
        url: Url,
        payload: Option<&B>,
    ) -> ApiResult<RawResponse> {
        debug!(method = %method, url = %url, "Sending request");

        let mut request = self.client.request(method.clone(), url.clone());
        if let Some(token) = &self.token {
            request = request.header(AUTHORIZATION, format!("Bearer {}", token.as_str()));
        }
        if let Some(body) = payload {
            let bytes = serde_json::to_vec(body).map_err(ApiError::Encode)?;
            request = request.body(bytes);
        }

        let response = request.send().await?;
        let status = response.status();
        let body = response.bytes().await?.to_vec();

        debug!(method = %method, url = %url, status = %status, "Received response");

        Ok(RawResponse { status, body })
    }

    /// Make a GET request.
    pub async fn get(&self, url: Url) -> ApiResult<RawResponse> {
        self.request::<()>(Method::GET, url, None).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Credentials, PollPolicy, Scheme};

    fn config() -> Config {
        Config::new(
            Endpoint::parse("appliance.example.com", Scheme::Https).unwrap(),
            Credentials::new("admin", "secret").unwrap(),
            TlsMode::Insecure,
            PollPolicy::default(),
        )
    }

    #[test]
    fn test_url_building() {
        let client = ApiClient::new(&config()).unwrap();
        assert_eq!(
            client.url("serviceaccounts").unwrap().as_str(),
            "https://appliance.example.com/discovery/serviceaccounts"
        );
    }

    #[test]
    fn success_json_rejects_non_2xx() {
        let response = RawResponse {
            status: StatusCode::NOT_FOUND,
            body: b"{}".to_vec(),
        };
        let err = response
            .success_json::<serde_json::Value>("list vCenters")
            .unwrap_err();
        assert!(matches!(err, ApiError::Remote { status: 404, .. }));
    }

    #[test]
    fn json_reports_decode_errors() {
        let response = RawResponse {
            status: StatusCode::OK,
            body: b"not json".to_vec(),
        };
        let err = response.json::<serde_json::Value>("session").unwrap_err();
        assert!(matches!(err, ApiError::Decode { .. }));
        assert_eq!(response.text(), "not json");
    }
}
