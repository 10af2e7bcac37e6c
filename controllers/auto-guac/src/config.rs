//! Controller configuration
//!
//! One YAML file, loaded once at startup into an immutable [`Config`].
//! Secrets can be overridden from the environment so they need not live in
//! the file.

use crate::error::ControllerError;
use crate::identity::MacAddress;
use serde::Deserialize;
use std::fmt;
use std::net::{IpAddr, Ipv4Addr};
use std::path::{Path, PathBuf};
use std::time::Duration;
use ubiquiti_client::{HostKeyPolicy, SshAuth};

pub const DEFAULT_CONFIG_PATH: &str = "/etc/proxmox-auto-guac/config.yaml";
pub const CONFIG_PATH_ENV: &str = "AUTO_GUAC_CONFIG";
pub const DEFAULT_LOG_FILE: &str = "/var/log/proxmox-auto-guac.log";

/// A credential that never shows up in Debug output
#[derive(Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("<redacted>")
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub proxmox: ProxmoxSettings,
    #[serde(default)]
    pub ubiquiti: UbiquitiSettings,
    #[serde(default)]
    pub guacamole: GuacamoleSettings,
    #[serde(default)]
    pub identity: IdentitySettings,
    #[serde(default)]
    pub poll: PollSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProxmoxSettings {
    #[serde(default = "default_true")]
    pub enabled: bool,
    pub api_url: String,
    pub user: String,
    #[serde(default)]
    pub password: Secret,
    /// API token id; when set together with `token_secret` it replaces the password
    #[serde(default)]
    pub token_id: Option<String>,
    #[serde(default)]
    pub token_secret: Option<Secret>,
    #[serde(default = "default_true")]
    pub verify_tls: bool,
    #[serde(default)]
    pub ca_cert: Option<PathBuf>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Only provision these resource types (`qemu`, `lxc`, ...); empty means all
    #[serde(default)]
    pub resource_types: Vec<String>,
}

impl ProxmoxSettings {
    pub fn auth(&self) -> proxmox_client::ProxmoxAuth {
        match (&self.token_id, &self.token_secret) {
            (Some(token_id), Some(secret)) => proxmox_client::ProxmoxAuth::ApiToken {
                user: self.user.clone(),
                token_id: token_id.clone(),
                secret: secret.expose().to_string(),
            },
            _ => proxmox_client::ProxmoxAuth::Password {
                user: self.user.clone(),
                password: self.password.expose().to_string(),
            },
        }
    }

    pub fn client_options(&self) -> proxmox_client::ClientOptions {
        proxmox_client::ClientOptions {
            verify_tls: self.verify_tls,
            ca_cert: self.ca_cert.clone(),
            timeout: Duration::from_secs(self.timeout_secs),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct UbiquitiSettings {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub host: String,
    #[serde(default = "default_ssh_port")]
    pub port: u16,
    #[serde(default)]
    pub user: String,
    #[serde(default)]
    pub password: Option<Secret>,
    #[serde(default)]
    pub private_key: Option<PathBuf>,
    #[serde(default)]
    pub private_key_passphrase: Option<Secret>,
    #[serde(default)]
    pub host_key_policy: HostKeyPolicy,
    /// known_hosts file; `~/.ssh/known_hosts` when unset
    #[serde(default)]
    pub known_hosts: Option<PathBuf>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for UbiquitiSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            host: String::new(),
            port: default_ssh_port(),
            user: String::new(),
            password: None,
            private_key: None,
            private_key_passphrase: None,
            host_key_policy: HostKeyPolicy::default(),
            known_hosts: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl UbiquitiSettings {
    /// Private key first, then password, then the user's default keys
    pub fn ssh_auth(&self) -> SshAuth {
        if let Some(path) = &self.private_key {
            return SshAuth::PrivateKey {
                path: path.clone(),
                passphrase: self
                    .private_key_passphrase
                    .as_ref()
                    .map(|p| p.expose().to_string()),
            };
        }
        match &self.password {
            Some(password) if !password.is_empty() => {
                SshAuth::Password(password.expose().to_string())
            }
            _ => SshAuth::DefaultKeys,
        }
    }

    pub fn connection(&self) -> ubiquiti_client::RouterConnection {
        ubiquiti_client::RouterConnection {
            host: self.host.clone(),
            port: self.port,
            user: self.user.clone(),
            auth: self.ssh_auth(),
            host_key_policy: self.host_key_policy,
            known_hosts: self.known_hosts.clone(),
            timeout: Duration::from_secs(self.timeout_secs),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct GuacamoleSettings {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub api_url: String,
    #[serde(default)]
    pub user: String,
    #[serde(default)]
    pub password: Secret,
    #[serde(default = "default_true")]
    pub verify_tls: bool,
    #[serde(default)]
    pub ca_cert: Option<PathBuf>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub db_host: String,
    #[serde(default = "default_mysql_port")]
    pub db_port: u16,
    #[serde(default)]
    pub db_user: String,
    #[serde(default)]
    pub db_password: Secret,
    #[serde(default)]
    pub db_name: String,
}

impl Default for GuacamoleSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            api_url: String::new(),
            user: String::new(),
            password: Secret::default(),
            verify_tls: true,
            ca_cert: None,
            timeout_secs: default_timeout_secs(),
            db_host: String::new(),
            db_port: default_mysql_port(),
            db_user: String::new(),
            db_password: Secret::default(),
            db_name: String::new(),
        }
    }
}

impl GuacamoleSettings {
    pub fn client_options(&self) -> guacamole_client::ClientOptions {
        guacamole_client::ClientOptions {
            verify_tls: self.verify_tls,
            ca_cert: self.ca_cert.clone(),
            timeout: Duration::from_secs(self.timeout_secs),
        }
    }

    pub fn database(&self) -> guacamole_client::wol::DatabaseSettings {
        guacamole_client::wol::DatabaseSettings {
            host: self.db_host.clone(),
            port: self.db_port,
            user: self.db_user.clone(),
            password: self.db_password.expose().to_string(),
            database: self.db_name.clone(),
            timeout: Duration::from_secs(self.timeout_secs),
        }
    }
}

/// The (MAC, IP) pair handed to every resource until real derivation exists
#[derive(Debug, Clone, Deserialize)]
pub struct IdentitySettings {
    #[serde(default = "default_placeholder_mac")]
    pub placeholder_mac: MacAddress,
    #[serde(default = "default_placeholder_ip")]
    pub placeholder_ip: IpAddr,
}

impl Default for IdentitySettings {
    fn default() -> Self {
        Self {
            placeholder_mac: default_placeholder_mac(),
            placeholder_ip: default_placeholder_ip(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PollSettings {
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
        }
    }
}

impl PollSettings {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log file written alongside stdout; `null` disables it
    #[serde(default = "default_log_file")]
    pub file: Option<PathBuf>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: default_log_file(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_ssh_port() -> u16 {
    22
}

fn default_mysql_port() -> u16 {
    3306
}

fn default_placeholder_mac() -> MacAddress {
    MacAddress::new([0xAA, 0x00, 0x00, 0x01, 0x01, 0x00])
}

fn default_placeholder_ip() -> IpAddr {
    IpAddr::V4(Ipv4Addr::new(172, 16, 1, 100))
}

fn default_interval_secs() -> u64 {
    60
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_file() -> Option<PathBuf> {
    Some(PathBuf::from(DEFAULT_LOG_FILE))
}

/// Config file location: `AUTO_GUAC_CONFIG` if set, else the fixed default
pub fn config_path<F>(lookup: F) -> PathBuf
where
    F: Fn(&str) -> Option<String>,
{
    lookup(CONFIG_PATH_ENV)
        .filter(|p| !p.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

impl Config {
    pub fn from_yaml(yaml: &str) -> Result<Self, ControllerError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Read, apply environment overrides and validate.
    ///
    /// `lookup` resolves environment variables; `main` passes
    /// `std::env::var(..).ok()`, tests pass a map.
    pub fn load<F>(path: &Path, lookup: F) -> Result<Self, ControllerError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let raw = std::fs::read_to_string(path).map_err(|source| ControllerError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::from_yaml(&raw)?;
        config.apply_env_overrides(lookup);
        config.validate()?;
        Ok(config)
    }

    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("PROXMOX_PASSWORD") {
            self.proxmox.password = Secret::new(v);
        }
        if let Some(v) = lookup("PROXMOX_TOKEN_SECRET") {
            self.proxmox.token_secret = Some(Secret::new(v));
        }
        if let Some(v) = lookup("UBIQUITI_PASSWORD") {
            self.ubiquiti.password = Some(Secret::new(v));
        }
        if let Some(v) = lookup("GUACAMOLE_PASSWORD") {
            self.guacamole.password = Secret::new(v);
        }
        if let Some(v) = lookup("GUACAMOLE_DB_PASSWORD") {
            self.guacamole.db_password = Secret::new(v);
        }
    }

    pub fn validate(&self) -> Result<(), ControllerError> {
        if self.proxmox.enabled {
            require("proxmox.api_url", &self.proxmox.api_url)?;
            require("proxmox.user", &self.proxmox.user)?;
            if self.proxmox.token_id.is_some() != self.proxmox.token_secret.is_some() {
                return Err(ControllerError::InvalidConfig(
                    "proxmox.token_id and proxmox.token_secret must be set together".to_string(),
                ));
            }
        }
        if self.ubiquiti.enabled {
            require("ubiquiti.host", &self.ubiquiti.host)?;
            require("ubiquiti.user", &self.ubiquiti.user)?;
            if self.ubiquiti.port == 0 {
                return Err(ControllerError::InvalidConfig(
                    "ubiquiti.port must be non-zero".to_string(),
                ));
            }
        }
        if self.guacamole.enabled {
            require("guacamole.api_url", &self.guacamole.api_url)?;
            require("guacamole.user", &self.guacamole.user)?;
            require("guacamole.db_host", &self.guacamole.db_host)?;
            require("guacamole.db_user", &self.guacamole.db_user)?;
            require("guacamole.db_name", &self.guacamole.db_name)?;
        }
        if self.poll.interval_secs == 0 {
            return Err(ControllerError::InvalidConfig(
                "poll.interval_secs must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

fn require(field: &str, value: &str) -> Result<(), ControllerError> {
    if value.trim().is_empty() {
        return Err(ControllerError::InvalidConfig(format!(
            "{} is required when the section is enabled",
            field
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    const FULL: &str = r#"
proxmox:
  api_url: https://pve.lab:8006
  user: root@pam
  password: pvepass
  verify_tls: false
  resource_types: [qemu]
ubiquiti:
  enabled: true
  host: 172.16.1.1
  user: ubnt
  host_key_policy: accept-new
guacamole:
  enabled: true
  api_url: https://guac.lab/guacamole
  user: guacadmin
  password: guacpass
  db_host: db.lab
  db_user: guacamole_user
  db_password: dbpass
  db_name: guacamole_db
identity:
  placeholder_mac: aa-00-00-01-01-07
poll:
  interval_secs: 15
logging:
  level: debug
  file: null
"#;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config = Config::from_yaml(
            "proxmox:\n  api_url: https://pve:8006\n  user: root@pam\n  password: x\n",
        )
        .unwrap();

        assert!(config.proxmox.enabled);
        assert!(config.proxmox.verify_tls);
        assert_eq!(config.proxmox.timeout_secs, 30);
        assert!(config.proxmox.resource_types.is_empty());
        assert!(!config.ubiquiti.enabled);
        assert_eq!(config.ubiquiti.port, 22);
        assert_eq!(config.ubiquiti.host_key_policy, HostKeyPolicy::Strict);
        assert!(!config.guacamole.enabled);
        assert_eq!(config.guacamole.db_port, 3306);
        assert_eq!(config.identity.placeholder_mac.to_string(), "AA:00:00:01:01:00");
        assert_eq!(config.identity.placeholder_ip.to_string(), "172.16.1.100");
        assert_eq!(config.poll.interval(), Duration::from_secs(60));
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.file, Some(PathBuf::from(DEFAULT_LOG_FILE)));
        config.validate().unwrap();
    }

    #[test]
    fn test_full_config() {
        let config = Config::from_yaml(FULL).unwrap();

        assert!(!config.proxmox.verify_tls);
        assert_eq!(config.proxmox.resource_types, vec!["qemu".to_string()]);
        assert_eq!(config.ubiquiti.host_key_policy, HostKeyPolicy::AcceptNew);
        assert!(matches!(config.ubiquiti.ssh_auth(), SshAuth::DefaultKeys));
        assert_eq!(config.guacamole.database().database, "guacamole_db");
        assert_eq!(config.identity.placeholder_mac.to_string(), "AA:00:00:01:01:07");
        assert_eq!(config.poll.interval_secs, 15);
        assert_eq!(config.logging.file, None);
        config.validate().unwrap();
    }

    #[test]
    fn test_env_overrides_secrets() {
        let mut config = Config::from_yaml(FULL).unwrap();
        config.apply_env_overrides(env(&[
            ("PROXMOX_PASSWORD", "from-env"),
            ("UBIQUITI_PASSWORD", "router-env"),
            ("GUACAMOLE_DB_PASSWORD", "db-env"),
        ]));

        assert_eq!(config.proxmox.password.expose(), "from-env");
        assert!(matches!(config.ubiquiti.ssh_auth(), SshAuth::Password(p) if p == "router-env"));
        assert_eq!(config.guacamole.password.expose(), "guacpass");
        assert_eq!(config.guacamole.db_password.expose(), "db-env");
    }

    #[test]
    fn test_token_auth_wins_over_password() {
        let mut config = Config::from_yaml(FULL).unwrap();
        config.proxmox.token_id = Some("auto-guac".to_string());
        config.apply_env_overrides(env(&[("PROXMOX_TOKEN_SECRET", "s3cret")]));

        match config.proxmox.auth() {
            proxmox_client::ProxmoxAuth::ApiToken { token_id, secret, .. } => {
                assert_eq!(token_id, "auto-guac");
                assert_eq!(secret, "s3cret");
            }
            other => panic!("expected token auth, got {:?}", other),
        }
    }

    #[test]
    fn test_private_key_wins_over_password() {
        let mut config = Config::from_yaml(FULL).unwrap();
        config.ubiquiti.password = Some(Secret::new("pw"));
        config.ubiquiti.private_key = Some(PathBuf::from("/etc/proxmox-auto-guac/id_ed25519"));

        assert!(matches!(config.ubiquiti.ssh_auth(), SshAuth::PrivateKey { .. }));
    }

    #[test]
    fn test_validate_rejects_enabled_section_without_endpoint() {
        let mut config = Config::from_yaml(FULL).unwrap();
        config.guacamole.api_url = String::new();

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("guacamole.api_url"));
    }

    #[test]
    fn test_validate_ignores_disabled_sections() {
        let mut config = Config::from_yaml(FULL).unwrap();
        config.ubiquiti.enabled = false;
        config.ubiquiti.host = String::new();

        config.validate().unwrap();
    }

    #[test]
    fn test_validate_rejects_zero_interval() {
        let mut config = Config::from_yaml(FULL).unwrap();
        config.poll.interval_secs = 0;

        assert!(matches!(config.validate(), Err(ControllerError::InvalidConfig(_))));
    }

    #[test]
    fn test_bad_placeholder_mac_is_parse_error() {
        let yaml = "proxmox:\n  api_url: u\n  user: u\nidentity:\n  placeholder_mac: not-a-mac\n";
        assert!(matches!(Config::from_yaml(yaml), Err(ControllerError::ConfigParse(_))));
    }

    #[test]
    fn test_secrets_are_redacted_in_debug() {
        let config = Config::from_yaml(FULL).unwrap();
        let debug = format!("{:?}", config);

        assert!(!debug.contains("pvepass"));
        assert!(!debug.contains("dbpass"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(FULL.as_bytes()).unwrap();

        let config = Config::load(file.path(), env(&[("GUACAMOLE_PASSWORD", "p")])).unwrap();
        assert_eq!(config.guacamole.password.expose(), "p");
    }

    #[test]
    fn test_load_missing_file() {
        let result = Config::load(Path::new("/nonexistent/auto-guac.yaml"), env(&[]));
        assert!(matches!(result, Err(ControllerError::ConfigRead { .. })));
    }

    #[test]
    fn test_config_path_env_override() {
        assert_eq!(config_path(env(&[])), PathBuf::from(DEFAULT_CONFIG_PATH));
        assert_eq!(
            config_path(env(&[(CONFIG_PATH_ENV, "/tmp/x.yaml")])),
            PathBuf::from("/tmp/x.yaml")
        );
    }
}
