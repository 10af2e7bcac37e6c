//! Guacamole REST API client

use crate::error::GuacamoleError;
use crate::guacamole_trait::GuacamoleClientTrait;
use crate::models::ConnectionProfile;
use reqwest::{Certificate, Client, StatusCode};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, warn};

/// Transport settings shared by every request of a client
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Verify the server certificate
    pub verify_tls: bool,
    /// Extra PEM root certificate to trust
    pub ca_cert: Option<PathBuf>,
    /// Per-request timeout
    pub timeout: Duration,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            verify_tls: true,
            ca_cert: None,
            timeout: Duration::from_secs(30),
        }
    }
}

/// Guacamole REST API client
pub struct GuacamoleClient {
    client: Client,
    base_url: String,
    username: String,
    password: String,
}

impl fmt::Debug for GuacamoleClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GuacamoleClient")
            .field("base_url", &self.base_url)
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

impl GuacamoleClient {
    /// Create a new Guacamole client
    ///
    /// # Arguments
    /// * `base_url` - Guacamole base URL (e.g., "https://guac:8443/guacamole")
    /// * `username` / `password` - Sent as HTTP basic auth
    /// * `options` - TLS verification and timeout settings
    pub fn new(
        base_url: String,
        username: String,
        password: String,
        options: ClientOptions,
    ) -> Result<Self, GuacamoleError> {
        let mut builder = Client::builder()
            .timeout(options.timeout)
            .danger_accept_invalid_certs(!options.verify_tls);

        if let Some(path) = &options.ca_cert {
            let pem = std::fs::read(path).map_err(|e| {
                GuacamoleError::InvalidConfig(format!(
                    "cannot read CA certificate {}: {}",
                    path.display(),
                    e
                ))
            })?;
            builder = builder.add_root_certificate(Certificate::from_pem(&pem)?);
        }

        if !options.verify_tls {
            warn!("TLS certificate verification is disabled for {}", base_url);
        }

        Ok(Self {
            client: builder.build()?,
            base_url: base_url.trim_end_matches('/').to_string(),
            username,
            password,
        })
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// URL a profile is created at; the name is a single encoded path segment
    #[must_use]
    pub fn connection_url(&self, name: &str) -> String {
        format!(
            "{}/api/session/data/{}",
            self.base_url,
            urlencoding::encode(name)
        )
    }

    /// Create a connection profile
    ///
    /// Only a 200 counts as success. An existing profile of the same name is
    /// left to Guacamole to resolve; whatever it answers is reported as-is.
    pub async fn create_connection(&self, profile: &ConnectionProfile) -> Result<(), GuacamoleError> {
        let url = self.connection_url(&profile.name);
        let body = profile.request_body();
        debug!(
            "POST {} with body: {}",
            url,
            serde_json::to_string(&body).unwrap_or_default()
        );

        let response = self
            .client
            .post(&url)
            .basic_auth(&self.username, Some(&self.password))
            .header("Accept", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::OK {
            let body_text = response.text().await.unwrap_or_default();
            return Err(GuacamoleError::Api {
                status: status.as_u16(),
                body: body_text,
            });
        }

        Ok(())
    }
}

#[async_trait::async_trait]
impl GuacamoleClientTrait for GuacamoleClient {
    fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn create_connection(&self, profile: &ConnectionProfile) -> Result<(), GuacamoleError> {
        GuacamoleClient::create_connection(self, profile).await
    }
}
