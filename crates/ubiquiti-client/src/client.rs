//! EdgeOS SSH client

use crate::error::EdgeOsError;
use crate::host_keys::{HostKeyPolicy, HostKeyVerifier};
use crate::models::{CommandOutput, StaticMapping};
use crate::router_trait::EdgeRouter;
use russh::client::{self, Handle};
use russh::{ChannelMsg, Disconnect};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// How to authenticate the SSH user
#[derive(Clone, Default)]
pub enum SshAuth {
    /// Private key file, optionally encrypted
    PrivateKey {
        path: PathBuf,
        passphrase: Option<String>,
    },
    Password(String),
    /// Try `~/.ssh/id_ed25519` then `~/.ssh/id_rsa`
    #[default]
    DefaultKeys,
}

impl fmt::Debug for SshAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PrivateKey { path, .. } => f.debug_struct("PrivateKey").field("path", path).finish(),
            Self::Password(_) => f.write_str("Password(<redacted>)"),
            Self::DefaultKeys => f.write_str("DefaultKeys"),
        }
    }
}

/// Where and how to reach the router
#[derive(Debug, Clone)]
pub struct RouterConnection {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub auth: SshAuth,
    pub host_key_policy: HostKeyPolicy,
    /// Override for `~/.ssh/known_hosts`
    pub known_hosts: Option<PathBuf>,
    /// Bound on the whole session: connect, auth, command, disconnect
    pub timeout: Duration,
}

/// EdgeOS SSH client
///
/// Holds connection settings only; a fresh session is opened per command.
#[derive(Debug)]
pub struct EdgeRouterClient {
    connection: RouterConnection,
}

impl EdgeRouterClient {
    /// Create a new EdgeOS client
    pub fn new(connection: RouterConnection) -> Self {
        if connection.host_key_policy == HostKeyPolicy::Insecure {
            warn!(
                "SSH host key verification is disabled for {}:{}",
                connection.host, connection.port
            );
        }
        Self { connection }
    }

    /// Router host name or address
    pub fn host(&self) -> &str {
        &self.connection.host
    }

    /// Run a single command on the router and collect its output.
    pub async fn run_command(&self, command: &str) -> Result<CommandOutput, EdgeOsError> {
        let timeout = self.connection.timeout;
        tokio::time::timeout(timeout, self.run_command_inner(command))
            .await
            .map_err(|_elapsed| EdgeOsError::Timeout(timeout.as_secs()))?
    }

    async fn run_command_inner(&self, command: &str) -> Result<CommandOutput, EdgeOsError> {
        let conn = &self.connection;
        let config = Arc::new(client::Config {
            inactivity_timeout: Some(conn.timeout),
            ..Default::default()
        });
        let verifier = HostKeyVerifier::new(
            conn.host.clone(),
            conn.port,
            conn.host_key_policy,
            conn.known_hosts.clone(),
        );

        debug!("Opening SSH session to {}@{}:{}", conn.user, conn.host, conn.port);
        let mut session = client::connect(config, (conn.host.as_str(), conn.port), verifier).await?;

        self.authenticate(&mut session).await?;

        let mut channel = session.channel_open_session().await?;
        debug!("Executing on {}: {}", conn.host, command);
        channel.exec(true, command).await?;

        let mut stdout = Vec::new();
        let mut stderr = Vec::new();
        let mut exit_status = None;
        while let Some(msg) = channel.wait().await {
            match msg {
                ChannelMsg::Data { ref data } => stdout.extend_from_slice(data),
                ChannelMsg::ExtendedData { ref data, .. } => stderr.extend_from_slice(data),
                ChannelMsg::ExitStatus { exit_status: status } => exit_status = Some(status),
                _ => {}
            }
        }

        session
            .disconnect(Disconnect::ByApplication, "", "English")
            .await?;

        Ok(CommandOutput {
            stdout: String::from_utf8_lossy(&stdout).into_owned(),
            stderr: String::from_utf8_lossy(&stderr).into_owned(),
            exit_status,
        })
    }

    async fn authenticate(&self, session: &mut Handle<HostKeyVerifier>) -> Result<(), EdgeOsError> {
        let conn = &self.connection;
        let authenticated = match &conn.auth {
            SshAuth::Password(password) => {
                session.authenticate_password(conn.user.as_str(), password.as_str()).await?
            }
            SshAuth::PrivateKey { path, passphrase } => {
                let key = russh_keys::load_secret_key(path, passphrase.as_deref())?;
                session
                    .authenticate_publickey(conn.user.as_str(), Arc::new(key))
                    .await?
            }
            SshAuth::DefaultKeys => {
                let mut authenticated = false;
                for path in default_key_paths() {
                    if !path.exists() {
                        continue;
                    }
                    let key = match russh_keys::load_secret_key(&path, None) {
                        Ok(key) => key,
                        Err(e) => {
                            debug!("Skipping key {}: {}", path.display(), e);
                            continue;
                        }
                    };
                    if session
                        .authenticate_publickey(conn.user.as_str(), Arc::new(key))
                        .await?
                    {
                        authenticated = true;
                        break;
                    }
                }
                authenticated
            }
        };

        if authenticated {
            Ok(())
        } else {
            Err(EdgeOsError::Authentication {
                user: conn.user.clone(),
                host: conn.host.clone(),
            })
        }
    }
}

fn default_key_paths() -> Vec<PathBuf> {
    let Some(home) = dirs::home_dir() else {
        return Vec::new();
    };
    ["id_ed25519", "id_rsa"]
        .iter()
        .map(|name| home.join(".ssh").join(name))
        .collect()
}

#[async_trait::async_trait]
impl EdgeRouter for EdgeRouterClient {
    fn host(&self) -> &str {
        &self.connection.host
    }

    async fn set_static_mapping(&self, mapping: &StaticMapping) -> Result<(), EdgeOsError> {
        mapping.validate()?;
        let output = self.run_command(&mapping.command()).await?;

        match output.exit_status {
            Some(0) => Ok(()),
            Some(status) => Err(EdgeOsError::CommandFailed {
                status,
                stderr: output.stderr.trim().to_string(),
            }),
            None => {
                debug!("Router closed the channel without an exit status");
                Ok(())
            }
        }
    }
}
