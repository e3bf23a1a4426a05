//! HTTP client implementation

use std::time::Duration;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use openapi_client::models::ErrorResponse;
use reqwest::{header, Client, RequestBuilder, Response};
use secrecy::{ExposeSecret, SecretString};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, error};
use url::Url;

use crate::errors::PushError;

/// HTTP client for the REST API
pub struct HttpClient {
    client: Client,
    base_url: Url,
    api_key: Option<SecretString>,
}

impl HttpClient {
    /// Create a new HTTP client
    pub fn new(
        base_url: &str,
        api_key: Option<SecretString>,
        timeout: Duration,
    ) -> Result<Self, PushError> {
        let base_url = Url::parse(base_url.trim_end_matches('/')).map_err(|e| {
            PushError::ConfigurationError(format!("Invalid REST base URL {}: {}", base_url, e))
        })?;

        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url,
            api_key,
        })
    }

    /// Get the base URL
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Build an absolute URL from a path and query parameters
    pub fn url(&self, path: &str, query: &[(&str, &str)]) -> Url {
        let mut url = self.base_url.clone();
        let base_path = url.path().trim_end_matches('/').to_string();
        url.set_path(&format!("{}{}", base_path, path));
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query.iter());
        }
        url
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.api_key {
            Some(key) => request.header(
                header::AUTHORIZATION,
                format!("Basic {}", STANDARD.encode(key.expose_secret().as_bytes())),
            ),
            None => request,
        }
    }

    /// Make a POST request with a JSON body
    pub async fn post<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, PushError> {
        let url = self.url(path, &[]);
        debug!("POST {}", url);

        let request = self
            .authorize(self.client.post(url))
            .header(header::ACCEPT, "application/json")
            .json(body);

        let response = check_status("POST", request.send().await?).await?;
        let body = response.json().await?;
        Ok(body)
    }

    /// Make a DELETE request, expecting an empty 2xx response
    pub async fn delete(
        &self,
        path: &str,
        query: &[(&str, &str)],
        headers: &[(&'static str, String)],
    ) -> Result<(), PushError> {
        let url = self.url(path, query);
        debug!("DELETE {}", url);

        let mut request = self.authorize(self.client.delete(url));
        for (name, value) in headers {
            request = request.header(*name, value);
        }

        check_status("DELETE", request.send().await?).await?;
        Ok(())
    }
}

/// Turn a non-2xx response into a `TransportError`
async fn check_status(method: &str, response: Response) -> Result<Response, PushError> {
    if response.status().is_success() {
        return Ok(response);
    }

    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    error!("HTTP {} failed: {} - {}", method, status, body);

    let (code, message) = match serde_json::from_str::<ErrorResponse>(&body) {
        Ok(parsed) => (parsed.error.code, parsed.error.message),
        Err(_) => (i64::from(status) * 100, body),
    };

    Err(PushError::TransportError {
        status,
        code,
        message,
    })
}
