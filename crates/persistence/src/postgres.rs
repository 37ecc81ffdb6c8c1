//! PostgreSQL sink
//!
//! Speaks the PostgreSQL wire protocol, so it also works against QuestDB's
//! PG endpoint. The connection is opened lazily on the first write and
//! re-opened on the write after it breaks.

use async_trait::async_trait;
use chrono::NaiveDateTime;
use log::{error, info, warn};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tickwatch_core::{Alarm, PriceSample, Timestamp};
use tickwatch_ports::{PersistenceSink, SinkError, SinkResult};
use tokio::sync::Mutex;
use tokio::time::timeout;
use tokio_postgres::types::ToSql;
use tokio_postgres::{Client, NoTls};

/// Connection and table settings for [`PostgresSink`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PostgresConfig {
    /// libpq-style connection string or `postgres://` URL
    pub url: String,
    pub sample_table: String,
    pub alarm_table: String,
    /// Bound on connecting and on each statement
    pub connect_timeout_ms: u64,
}

impl Default for PostgresConfig {
    fn default() -> Self {
        Self {
            url: "host=localhost port=8812 user=admin password=quest dbname=qdb".to_string(),
            sample_table: "crypto_data".to_string(),
            alarm_table: "crypto_alarms".to_string(),
            connect_timeout_ms: 3000,
        }
    }
}

impl PostgresConfig {
    pub fn validate(&self) -> SinkResult<()> {
        if self.url.trim().is_empty() {
            return Err(SinkError::Config("url must not be empty".to_string()));
        }
        if self.connect_timeout_ms == 0 {
            return Err(SinkError::Config(
                "connect_timeout_ms must be greater than 0".to_string(),
            ));
        }
        for table in [&self.sample_table, &self.alarm_table] {
            if !is_identifier(table) {
                return Err(SinkError::Config(format!(
                    "'{}' is not a valid table name",
                    table
                )));
            }
        }
        Ok(())
    }
}

/// Plain SQL identifier, optionally schema-qualified: `crypto_data`, `public.crypto_data`
fn is_identifier(name: &str) -> bool {
    let part_ok = |part: &str| {
        let mut chars = part.chars();
        match chars.next() {
            Some(c) if c.is_ascii_alphabetic() || c == '_' => {
                chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
            }
            _ => false,
        }
    };
    let parts: Vec<&str> = name.split('.').collect();
    parts.len() <= 2 && parts.into_iter().all(part_ok)
}

fn sample_insert(table: &str) -> String {
    format!(
        "INSERT INTO {} (timestamp, crypto_symbol, price, pct_variation) VALUES ($1, $2, $3, $4)",
        table
    )
}

fn alarm_insert(table: &str) -> String {
    format!(
        "INSERT INTO {} (timestamp, crypto_symbol, alarm_name) VALUES ($1, $2, $3)",
        table
    )
}

/// `timestamp` columns are `TIMESTAMP` (no zone), which is also what QuestDB
/// reports; chrono only binds `DateTime<Utc>` to `TIMESTAMPTZ`, so rows are
/// written as naive UTC.
fn sql_timestamp(timestamp: &Timestamp) -> NaiveDateTime {
    timestamp.naive_utc()
}

fn map_pg_error(e: &tokio_postgres::Error) -> SinkError {
    if let Some(db) = e.as_db_error() {
        SinkError::Rejected(db.message().to_string())
    } else {
        SinkError::Unavailable(e.to_string())
    }
}

/// Sink writing one row per sample and per alarm
pub struct PostgresSink {
    config: PostgresConfig,
    sample_sql: String,
    alarm_sql: String,
    client: Mutex<Option<Client>>,
}

impl PostgresSink {
    /// Validate the configuration. Does not connect.
    pub fn new(config: PostgresConfig) -> SinkResult<Self> {
        config.validate()?;
        Ok(Self {
            sample_sql: sample_insert(&config.sample_table),
            alarm_sql: alarm_insert(&config.alarm_table),
            config,
            client: Mutex::new(None),
        })
    }

    fn timeout(&self) -> Duration {
        Duration::from_millis(self.config.connect_timeout_ms)
    }

    async fn connect(&self) -> SinkResult<Client> {
        let connecting = tokio_postgres::connect(&self.config.url, NoTls);
        let (client, connection) = timeout(self.timeout(), connecting)
            .await
            .map_err(|_| SinkError::Timeout(self.config.connect_timeout_ms))?
            .map_err(|e| SinkError::Unavailable(e.to_string()))?;

        tokio::spawn(async move {
            if let Err(e) = connection.await {
                error!("[SINK] PostgreSQL connection error: {}", e);
            }
        });

        info!("[SINK] Connected to PostgreSQL");
        Ok(client)
    }

    /// Run one statement, connecting first if needed
    ///
    /// The client is only put back after a successful statement, so any
    /// failure forces a fresh connection on the next write.
    async fn execute(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> SinkResult<()> {
        let mut slot = self.client.lock().await;

        let client = match slot.take() {
            Some(client) if !client.is_closed() => client,
            _ => self.connect().await?,
        };

        match timeout(self.timeout(), client.execute(sql, params)).await {
            Ok(Ok(_)) => {
                *slot = Some(client);
                Ok(())
            }
            Ok(Err(e)) => {
                let err = map_pg_error(&e);
                if matches!(err, SinkError::Rejected(_)) && !client.is_closed() {
                    // Server refused the row; the connection itself is fine
                    *slot = Some(client);
                } else {
                    warn!("[SINK] Dropping PostgreSQL connection: {}", e);
                }
                Err(err)
            }
            Err(_) => {
                warn!("[SINK] Statement timed out, dropping PostgreSQL connection");
                Err(SinkError::Timeout(self.config.connect_timeout_ms))
            }
        }
    }
}

#[async_trait]
impl PersistenceSink for PostgresSink {
    async fn write_sample(&self, sample: &PriceSample) -> SinkResult<()> {
        self.execute(
            &self.sample_sql,
            &[
                &sql_timestamp(&sample.timestamp),
                &sample.symbol,
                &sample.price,
                &sample.pct_variation,
            ],
        )
        .await
    }

    async fn write_alarm(&self, alarm: &Alarm) -> SinkResult<()> {
        self.execute(
            &self.alarm_sql,
            &[
                &sql_timestamp(&alarm.timestamp),
                &alarm.symbol,
                &alarm.kind.code(),
            ],
        )
        .await
    }

    fn name(&self) -> &str {
        "PostgresSink"
    }
}
