//! Wake-on-LAN parameters for Guacamole connections
//!
//! Guacamole's REST API has no notion of WOL on profile creation, so the two
//! parameter rows are written straight into the JDBC schema:
//!
//! 1. look up `connection_id` by `connection_name`
//! 2. insert (`id`, `wol-mac-addr`, mac) and (`id`, `wol-send-packet`, `true`)
//! 3. commit
//!
//! When the lookup finds nothing the transaction is dropped, which rolls it
//! back; nothing is written. Rows are never de-duplicated.

use crate::error::GuacamoleError;
use crate::models::{ConnectionParameter, WolOutcome, wol_parameters};
use sqlx::mysql::{MySql, MySqlConnectOptions};
use sqlx::{ConnectOptions, Connection, QueryBuilder, Transaction};
use std::fmt;
use std::time::Duration;
use tracing::debug;

/// The statements the WOL writer needs, inside one transaction
#[async_trait::async_trait]
pub trait ParameterTransaction: Send {
    /// `connection_id` of the connection named `connection_name`, if any
    async fn find_connection_id(&mut self, connection_name: &str) -> Result<Option<i32>, GuacamoleError>;

    async fn insert_parameters(&mut self, parameters: &[ConnectionParameter]) -> Result<(), GuacamoleError>;

    async fn commit(self) -> Result<(), GuacamoleError>
    where
        Self: Sized;
}

/// Look up `connection_name` and attach the WOL rows for `mac` to it.
pub async fn attach_wol_parameters<T: ParameterTransaction>(
    mut tx: T,
    connection_name: &str,
    mac: &str,
) -> Result<WolOutcome, GuacamoleError> {
    let Some(connection_id) = tx.find_connection_id(connection_name).await? else {
        debug!("No Guacamole connection named {}", connection_name);
        return Ok(WolOutcome::ConnectionMissing);
    };

    tx.insert_parameters(&wol_parameters(connection_id, mac)).await?;
    tx.commit().await?;

    Ok(WolOutcome::Attached { connection_id })
}

/// [`ParameterTransaction`] over a MySQL transaction
#[derive(Debug)]
pub struct MySqlParameterTransaction<'c> {
    tx: Transaction<'c, MySql>,
}

impl<'c> MySqlParameterTransaction<'c> {
    pub fn new(tx: Transaction<'c, MySql>) -> Self {
        Self { tx }
    }
}

#[async_trait::async_trait]
impl<'c> ParameterTransaction for MySqlParameterTransaction<'c> {
    async fn find_connection_id(&mut self, connection_name: &str) -> Result<Option<i32>, GuacamoleError> {
        let connection_id = sqlx::query_scalar::<_, i32>(
            "SELECT connection_id FROM guacamole_connection WHERE connection_name = ?",
        )
        .bind(connection_name)
        .fetch_optional(&mut *self.tx)
        .await?;
        Ok(connection_id)
    }

    async fn insert_parameters(&mut self, parameters: &[ConnectionParameter]) -> Result<(), GuacamoleError> {
        if parameters.is_empty() {
            return Ok(());
        }

        let mut builder = QueryBuilder::<MySql>::new(
            "INSERT INTO guacamole_connection_parameter (connection_id, parameter_name, parameter_value) ",
        );
        builder.push_values(parameters, |mut row, parameter| {
            row.push_bind(parameter.connection_id)
                .push_bind(parameter.name.clone())
                .push_bind(parameter.value.clone());
        });
        builder.build().execute(&mut *self.tx).await?;
        Ok(())
    }

    async fn commit(self) -> Result<(), GuacamoleError> {
        self.tx.commit().await?;
        Ok(())
    }
}

/// Connection settings for Guacamole's MySQL database
#[derive(Clone)]
pub struct DatabaseSettings {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: String,
    /// Bound on connect + lookup + insert + commit
    pub timeout: Duration,
}

impl fmt::Debug for DatabaseSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseSettings")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("database", &self.database)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

/// Where WOL parameters get attached
#[async_trait::async_trait]
pub trait WolStore: Send + Sync {
    /// Attach WOL parameters for `mac` to the connection named `connection_name`
    async fn attach_wol(&self, connection_name: &str, mac: &str) -> Result<WolOutcome, GuacamoleError>;
}

/// [`WolStore`] writing to MySQL; opens and closes a connection per call
#[derive(Debug)]
pub struct MySqlWolStore {
    settings: DatabaseSettings,
}

impl MySqlWolStore {
    pub fn new(settings: DatabaseSettings) -> Self {
        Self { settings }
    }

    fn connect_options(&self) -> MySqlConnectOptions {
        MySqlConnectOptions::new()
            .host(&self.settings.host)
            .port(self.settings.port)
            .username(&self.settings.user)
            .password(&self.settings.password)
            .database(&self.settings.database)
    }
}

#[async_trait::async_trait]
impl WolStore for MySqlWolStore {
    async fn attach_wol(&self, connection_name: &str, mac: &str) -> Result<WolOutcome, GuacamoleError> {
        let timeout = self.settings.timeout;
        let work = async {
            debug!(
                "Connecting to MySQL {}:{}/{}",
                self.settings.host, self.settings.port, self.settings.database
            );
            let mut conn = self.connect_options().connect().await?;
            let tx = conn.begin().await?;
            let outcome =
                attach_wol_parameters(MySqlParameterTransaction::new(tx), connection_name, mac)
                    .await?;
            conn.close().await?;
            Ok::<_, GuacamoleError>(outcome)
        };

        tokio::time::timeout(timeout, work)
            .await
            .map_err(|_elapsed| GuacamoleError::Timeout(timeout.as_secs()))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    /// Records what the WOL writer asked of the database
    #[derive(Debug, Default)]
    struct Recorded {
        lookups: Vec<String>,
        inserted: Vec<ConnectionParameter>,
        committed: bool,
    }

    struct RecordingTransaction<'a> {
        connections: HashMap<String, i32>,
        recorded: &'a mut Recorded,
        fail_insert: bool,
    }

    #[async_trait::async_trait]
    impl<'a> ParameterTransaction for RecordingTransaction<'a> {
        async fn find_connection_id(&mut self, connection_name: &str) -> Result<Option<i32>, GuacamoleError> {
            self.recorded.lookups.push(connection_name.to_string());
            Ok(self.connections.get(connection_name).copied())
        }

        async fn insert_parameters(&mut self, parameters: &[ConnectionParameter]) -> Result<(), GuacamoleError> {
            if self.fail_insert {
                return Err(GuacamoleError::InvalidConfig("insert rejected".to_string()));
            }
            self.recorded.inserted.extend_from_slice(parameters);
            Ok(())
        }

        async fn commit(self) -> Result<(), GuacamoleError> {
            let Self { recorded, .. } = self;
            recorded.committed = true;
            Ok(())
        }
    }

    fn transaction<'a>(recorded: &'a mut Recorded, known: &[(&str, i32)]) -> RecordingTransaction<'a> {
        RecordingTransaction {
            connections: known.iter().map(|(n, id)| ((*n).to_string(), *id)).collect(),
            recorded,
            fail_insert: false,
        }
    }

    #[tokio::test]
    async fn test_missing_connection_writes_nothing() {
        let mut recorded = Recorded::default();
        let tx = transaction(&mut recorded, &[("other-vm", 3)]);

        let outcome = attach_wol_parameters(tx, "vm-42", "AA:00:00:01:01:00").await.unwrap();

        assert_eq!(outcome, WolOutcome::ConnectionMissing);
        assert_eq!(recorded.lookups, vec!["vm-42".to_string()]);
        assert!(recorded.inserted.is_empty());
        assert!(!recorded.committed);
    }

    #[tokio::test]
    async fn test_found_connection_gets_two_rows_then_commit() {
        let mut recorded = Recorded::default();
        let tx = transaction(&mut recorded, &[("vm-42", 11)]);

        let outcome = attach_wol_parameters(tx, "vm-42", "AA:00:00:01:01:00").await.unwrap();

        assert_eq!(outcome, WolOutcome::Attached { connection_id: 11 });
        assert_eq!(
            recorded.inserted,
            vec![
                ConnectionParameter {
                    connection_id: 11,
                    name: "wol-mac-addr".to_string(),
                    value: "AA:00:00:01:01:00".to_string(),
                },
                ConnectionParameter {
                    connection_id: 11,
                    name: "wol-send-packet".to_string(),
                    value: "true".to_string(),
                },
            ]
        );
        assert!(recorded.committed);
    }

    #[tokio::test]
    async fn test_insert_failure_skips_commit() {
        let mut recorded = Recorded::default();
        let mut tx = transaction(&mut recorded, &[("vm-42", 11)]);
        tx.fail_insert = true;

        let result = attach_wol_parameters(tx, "vm-42", "AA:00:00:01:01:00").await;

        assert!(result.is_err());
        assert!(!recorded.committed);
    }

    #[tokio::test]
    async fn test_repeat_calls_are_not_deduplicated() {
        let mut recorded = Recorded::default();
        for _ in 0..2 {
            let tx = transaction(&mut recorded, &[("vm-42", 11)]);
            attach_wol_parameters(tx, "vm-42", "AA:00:00:01:01:00").await.unwrap();
        }
        assert_eq!(recorded.inserted.len(), 4);
    }

    #[test]
    fn test_database_settings_debug_omits_password() {
        let settings = DatabaseSettings {
            host: "db".to_string(),
            port: 3306,
            user: "guacamole_user".to_string(),
            password: "s3cret".to_string(),
            database: "guacamole_db".to_string(),
            timeout: Duration::from_secs(30),
        };
        assert!(!format!("{:?}", settings).contains("s3cret"));
    }
}
