//! HTTP client implementation

use std::time::Duration;

use reqwest::{header, Client, Method, RequestBuilder, Response};
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, error};
use url::Url;

use crate::errors::DeployError;

/// Basic auth credentials for Marathon
#[derive(Debug, Clone)]
pub struct Credentials {
    pub user: String,
    pub password: SecretString,
}

impl Credentials {
    /// Credentials are only used when both parts are present
    pub fn from_parts(user: Option<String>, password: Option<SecretString>) -> Option<Self> {
        match (user, password) {
            (Some(user), Some(password))
                if !user.is_empty() && !password.expose_secret().is_empty() =>
            {
                Some(Self { user, password })
            }
            _ => None,
        }
    }
}

/// HTTP client for the Marathon REST API
pub struct MarathonClient {
    client: Client,
    base_url: Url,
    credentials: Option<Credentials>,
    request_timeout: Duration,
}

impl MarathonClient {
    /// Create a new client. `base_url` defaults to `http://` when it has no scheme.
    pub fn new(
        base_url: &str,
        credentials: Option<Credentials>,
        request_timeout: Duration,
    ) -> Result<Self, DeployError> {
        // No client-wide timeout: the event stream stays open for the whole run.
        let client = Client::builder().build()?;

        Ok(Self {
            client,
            base_url: Url::parse(&normalize_base_url(base_url))?,
            credentials,
            request_timeout,
        })
    }

    /// Get the base URL
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Resolve an API path below the base URL, keeping any path prefix
    pub fn url(&self, path: &str) -> Url {
        let mut url = self.base_url.clone();
        let joined = format!("{}{}", self.base_url.path().trim_end_matches('/'), path);
        url.set_path(&joined);
        url
    }

    /// Request with credentials attached
    pub(crate) fn request(&self, method: Method, url: Url) -> RequestBuilder {
        debug!("{} {}", method, url);

        let mut request = self.client.request(method, url);
        if let Some(credentials) = &self.credentials {
            request = request.basic_auth(
                &credentials.user,
                Some(credentials.password.expose_secret()),
            );
        }
        request
    }

    /// Short-lived JSON API request
    pub(crate) fn api_request(&self, method: Method, url: Url) -> RequestBuilder {
        self.request(method, url)
            .timeout(self.request_timeout)
            .header(header::CONTENT_TYPE, "application/json")
    }
}

/// Prefix `http://` when the URL has no scheme
pub fn normalize_base_url(raw: &str) -> String {
    let raw = raw.trim();
    if raw.starts_with("http://") || raw.starts_with("https://") {
        raw.to_string()
    } else {
        format!("http://{}", raw)
    }
}

/// Turn a non-success response into an error carrying its body
pub(crate) async fn unexpected_status(response: Response) -> DeployError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    error!("Marathon returned an error response: {} - {}", status, body);
    DeployError::UnexpectedStatus { status, body }
}
