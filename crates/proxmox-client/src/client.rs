//! Proxmox VE API client
//!
//! Implements the read-only inventory calls against `/api2/json/...`.

use crate::error::ProxmoxError;
use crate::models::{ClusterResource, DataResponse, VersionInfo};
use crate::proxmox_trait::ProxmoxClientTrait;
use reqwest::{Certificate, Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, warn};

/// How requests authenticate against Proxmox
#[derive(Clone)]
pub enum ProxmoxAuth {
    /// HTTP basic auth with a realm-qualified user (`root@pam`)
    Password { user: String, password: String },
    /// API token (`user@realm!token_id=secret`)
    ApiToken {
        user: String,
        token_id: String,
        secret: String,
    },
}

impl fmt::Debug for ProxmoxAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Password { user, .. } => f
                .debug_struct("Password")
                .field("user", user)
                .field("password", &"<redacted>")
                .finish(),
            Self::ApiToken { user, token_id, .. } => f
                .debug_struct("ApiToken")
                .field("user", user)
                .field("token_id", token_id)
                .field("secret", &"<redacted>")
                .finish(),
        }
    }
}

/// Transport settings shared by every request of a client
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Verify the server certificate. Disable only for self-signed labs.
    pub verify_tls: bool,
    /// Extra PEM root certificate to trust (e.g. the cluster's own CA)
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

/// Proxmox VE API client
#[derive(Debug)]
pub struct ProxmoxClient {
    client: Client,
    base_url: String,
    auth: ProxmoxAuth,
}

impl ProxmoxClient {
    /// Create a new Proxmox client
    ///
    /// # Arguments
    /// * `base_url` - Proxmox base URL (e.g., "https://pve:8006")
    /// * `auth` - Credentials used on every request
    /// * `options` - TLS verification and timeout settings
    pub fn new(
        base_url: String,
        auth: ProxmoxAuth,
        options: ClientOptions,
    ) -> Result<Self, ProxmoxError> {
        let mut builder = Client::builder()
            .timeout(options.timeout)
            .danger_accept_invalid_certs(!options.verify_tls);

        if let Some(path) = &options.ca_cert {
            let pem = std::fs::read(path).map_err(|e| {
                ProxmoxError::InvalidConfig(format!(
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
            auth,
        })
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.auth {
            ProxmoxAuth::Password { user, password } => request.basic_auth(user, Some(password)),
            ProxmoxAuth::ApiToken {
                user,
                token_id,
                secret,
            } => request.header(
                "Authorization",
                format!("PVEAPIToken={}!{}={}", user, token_id, secret),
            ),
        }
    }

    /// GET an `/api2/json` path and unwrap the `data` envelope.
    ///
    /// Anything but a 200 is an error; the body is kept for the log line.
    async fn get_data<T: DeserializeOwned>(&self, path: &str) -> Result<T, ProxmoxError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("GET {}", url);

        let response = self
            .authorize(self.client.get(&url))
            .header("Accept", "application/json")
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            return Err(ProxmoxError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let response_text = response.text().await?;
        let envelope: DataResponse<T> = serde_json::from_str(&response_text).map_err(|e| {
            ProxmoxError::Decode(format!(
                "{} - Response (first 500 chars): {}",
                e,
                response_text.chars().take(500).collect::<String>()
            ))
        })?;
        Ok(envelope.data)
    }

    /// Fetch the cluster resource inventory
    ///
    /// # Returns
    /// * `Ok(Vec<ClusterResource>)` - Every entry of the `data` array, unfiltered
    /// * `Err(ProxmoxError)` - Transport failure, non-200 status or bad body
    pub async fn cluster_resources(&self) -> Result<Vec<ClusterResource>, ProxmoxError> {
        let resources: Vec<ClusterResource> =
            self.get_data("/api2/json/cluster/resources").await?;
        debug!("Proxmox returned {} cluster resources", resources.len());
        Ok(resources)
    }

    /// Check connectivity and credentials with the lightweight version endpoint
    pub async fn version(&self) -> Result<VersionInfo, ProxmoxError> {
        self.get_data("/api2/json/version").await
    }
}

#[async_trait::async_trait]
impl ProxmoxClientTrait for ProxmoxClient {
    fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn cluster_resources(&self) -> Result<Vec<ClusterResource>, ProxmoxError> {
        ProxmoxClient::cluster_resources(self).await
    }

    async fn version(&self) -> Result<VersionInfo, ProxmoxError> {
        ProxmoxClient::version(self).await
    }
}
