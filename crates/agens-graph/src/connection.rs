//! AgensGraph connection over tokio-postgres.
//!
//! Vertex, edge and graphpath values have no binary representation the
//! driver understands, so every command goes through the simple-query
//! protocol and every cell arrives as text (or NULL).

use std::sync::Arc;

use agens_core::{ConnectionConfig, ResultSet, Row};
use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::task::JoinHandle;
use tokio_postgres::{Client, NoTls, SimpleQueryMessage};
use tracing::{info, warn};

/// Anything that can run a textual command and hand back text rows.
#[async_trait]
pub trait Connection: Send + Sync {
    /// Run one command (or several separated by `;`).
    ///
    /// Rows of all statements are concatenated; `affected` is the count
    /// reported by the last statement.
    async fn simple_query(&self, sql: &str) -> Result<ResultSet>;
}

#[async_trait]
impl Connection for Client {
    async fn simple_query(&self, sql: &str) -> Result<ResultSet> {
        let messages = Client::simple_query(self, sql)
            .await
            .context("AgensGraph command failed")?;
        Ok(collect_messages(messages))
    }
}

fn collect_messages(messages: Vec<SimpleQueryMessage>) -> ResultSet {
    let mut rows = Vec::new();
    let mut affected = None;
    let mut columns: Option<Arc<[String]>> = None;
    for message in messages {
        match message {
            SimpleQueryMessage::Row(row) => {
                let cols = columns
                    .get_or_insert_with(|| {
                        row.columns()
                            .iter()
                            .map(|c| c.name().to_string())
                            .collect()
                    })
                    .clone();
                let values = (0..row.len()).map(|i| row.get(i).map(str::to_string)).collect();
                rows.push(Row::new(cols, values));
            }
            SimpleQueryMessage::CommandComplete(n) => {
                affected = Some(n);
                columns = None;
            }
            _ => {}
        }
    }
    ResultSet::new(rows, affected)
}

/// A client plus the task driving its socket.
pub struct PgConnection {
    client: Client,
    handle: JoinHandle<()>,
}

impl PgConnection {
    /// The underlying driver client.
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Drop the client and wait for the connection task to finish.
    pub async fn close(self) -> Result<()> {
        let PgConnection { client, handle } = self;
        drop(client);
        handle.await.context("Connection task panicked")?;
        Ok(())
    }
}

#[async_trait]
impl Connection for PgConnection {
    async fn simple_query(&self, sql: &str) -> Result<ResultSet> {
        Connection::simple_query(&self.client, sql).await
    }
}

/// Open a connection and spawn its driver task on the current runtime.
pub async fn connect(config: &ConnectionConfig) -> Result<PgConnection> {
    let (client, connection) = tokio_postgres::connect(&config.to_conninfo(), NoTls)
        .await
        .with_context(|| {
            format!(
                "Failed to connect to {}:{} as {}",
                config.host, config.port, config.user
            )
        })?;

    let handle = tokio::spawn(async move {
        if let Err(e) = connection.await {
            warn!(error = %e, "AgensGraph connection closed with error");
        }
    });

    info!(host = %config.host, port = config.port, dbname = %config.dbname, "Connected to AgensGraph");
    Ok(PgConnection { client, handle })
}

#[cfg(any(test, feature = "testing"))]
pub mod testing {
    //! Scripted in-memory connection for session tests.

    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    use super::*;

    /// Replays queued responses in order and records every command sent.
    /// Once the script runs out, commands succeed with an empty result.
    #[derive(Default, Clone)]
    pub struct ScriptedConnection {
        sent: Arc<Mutex<Vec<String>>>,
        script: Arc<Mutex<VecDeque<std::result::Result<ResultSet, String>>>>,
    }

    impl ScriptedConnection {
        pub fn new() -> Self {
            Self::default()
        }

        /// Queue a result with named columns.
        pub fn push_rows(&self, columns: &[&str], rows: Vec<Vec<Option<&str>>>) -> &Self {
            let cols: Arc<[String]> = columns.iter().map(|c| c.to_string()).collect();
            let rows = rows
                .into_iter()
                .map(|cells| Row::new(cols.clone(), cells.into_iter().map(|c| c.map(str::to_string)).collect()))
                .collect();
            self.push(ResultSet::new(rows, None))
        }

        /// Queue a single-cell result.
        pub fn push_scalar(&self, value: &str) -> &Self {
            self.push_rows(&["?column?"], vec![vec![Some(value)]])
        }

        pub fn push_empty(&self) -> &Self {
            self.push(ResultSet::default())
        }

        pub fn push_error(&self, message: &str) -> &Self {
            self.script.lock().unwrap().push_back(Err(message.to_string()));
            self
        }

        pub fn push(&self, result: ResultSet) -> &Self {
            self.script.lock().unwrap().push_back(Ok(result));
            self
        }

        pub fn sent(&self) -> Vec<String> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Connection for ScriptedConnection {
        async fn simple_query(&self, sql: &str) -> Result<ResultSet> {
            self.sent.lock().unwrap().push(sql.to_string());
            match self.script.lock().unwrap().pop_front() {
                Some(Ok(result)) => Ok(result),
                Some(Err(message)) => Err(anyhow::anyhow!(message)),
                None => Ok(ResultSet::default()),
            }
        }
    }
}
