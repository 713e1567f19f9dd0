//! Base shared storage implementation

use async_trait::async_trait;
use std::future::Future;
use surrealdb::{Connection, Surreal};

use super::config::SharedStorageConfig;
use crate::storage::errors::StorageError;
use crate::storage::traits::BaseStore;

/// Thrown inside paired-row transactions when exactly one of the two rows exists.
pub(crate) const PAIR_INCOMPLETE: &str = "relationship pair incomplete";

/// Thrown when both rows exist but their statuses are not complementary.
pub(crate) const PAIR_INCONSISTENT: &str = "relationship pair inconsistent";

/// Thrown when neither row exists any more.
pub(crate) const PAIR_GONE: &str = "relationship pair no longer exists";

/// Thrown when the caller's row no longer holds the status the write expected.
pub(crate) const PAIR_CHANGED: &str = "relationship pair changed";

/// Main shared storage manager
#[derive(Debug)]
pub struct SharedStorage<C>
where
    C: Connection + Clone + Send + Sync + std::fmt::Debug + 'static,
{
    pub(crate) client: Surreal<C>,
    pub(crate) config: SharedStorageConfig,
}

impl<C> SharedStorage<C>
where
    C: Connection + Clone + Send + Sync + std::fmt::Debug + 'static,
{
    /// Create a new shared storage instance
    pub async fn new(client: Surreal<C>, config: SharedStorageConfig) -> Result<Self, StorageError> {
        // Set namespace and database
        client
            .use_ns(&config.namespace)
            .use_db(&config.database)
            .await
            .map_err(|e| {
                StorageError::Connection(format!("Failed to set namespace/database: {}", e))
            })?;

        let storage = Self { client, config };

        storage.initialize_schema().await?;

        Ok(storage)
    }

    /// Initialize the database schema with all required tables
    async fn initialize_schema(&self) -> Result<(), StorageError> {
        super::schema::initialize_schema(&self.client).await
    }

    /// Get the underlying client for advanced operations
    pub fn client(&self) -> &Surreal<C> {
        &self.client
    }

    /// Run one store call under the configured timeout.
    ///
    /// An expired timeout leaves any in-flight transaction to finish or roll
    /// back on its own; the caller only learns that the outcome is unknown.
    pub(crate) async fn bounded<T, F>(&self, operation: &str, call: F) -> Result<T, StorageError>
    where
        F: Future<Output = Result<T, StorageError>>,
    {
        match tokio::time::timeout(self.config.query_timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(StorageError::Timeout(format!(
                "{} did not complete within {:?}",
                operation, self.config.query_timeout
            ))),
        }
    }
}

/// Map a database error to the storage taxonomy.
///
/// SurrealDB reports unique-index violations, aborted transactions and
/// optimistic write conflicts only through their messages.
pub(crate) fn classify_error(context: &str, message: &str) -> StorageError {
    if message.contains(PAIR_INCOMPLETE) {
        StorageError::Integrity(format!("{}: {}", context, PAIR_INCOMPLETE))
    } else if message.contains(PAIR_INCONSISTENT) {
        StorageError::Integrity(format!("{}: {}", context, PAIR_INCONSISTENT))
    } else if message.contains(PAIR_GONE) {
        StorageError::Conflict(format!("{}: {}", context, PAIR_GONE))
    } else if message.contains(PAIR_CHANGED) {
        StorageError::Conflict(format!("{}: {}", context, PAIR_CHANGED))
    } else if message.contains("already contains") || message.contains("already exists") {
        StorageError::AlreadyExists(format!("{}: {}", context, message))
    } else if message.contains("conflict") || message.contains("can be retried") {
        StorageError::Conflict(format!("{}: {}", context, message))
    } else {
        StorageError::Query(format!("{}: {}", context, message))
    }
}

/// Map an error returned by the client itself rather than by a statement.
///
/// Transport failures and an unconnected client become `Connection`, which
/// callers may retry.
pub(crate) fn client_error(context: &str, err: surrealdb::Error) -> StorageError {
    match &err {
        surrealdb::Error::Api(
            surrealdb::error::Api::ConnectionUninitialised
            | surrealdb::error::Api::Http(_)
            | surrealdb::error::Api::Ws(_),
        ) => StorageError::Connection(format!("{}: {}", context, err)),
        _ => classify_error(context, &err.to_string()),
    }
}

/// Fail if any statement of a multi-statement response errored.
pub(crate) fn check_statements(
    context: &str,
    response: &mut surrealdb::Response,
) -> Result<(), StorageError> {
    let errors = response.take_errors();
    if errors.is_empty() {
        return Ok(());
    }

    let mut messages: Vec<(usize, String)> = errors
        .into_iter()
        .map(|(index, err)| (index, err.to_string()))
        .collect();
    messages.sort_by_key(|(index, _)| *index);
    let joined = messages
        .into_iter()
        .map(|(_, message)| message)
        .collect::<Vec<_>>()
        .join("; ");

    Err(classify_error(context, &joined))
}

#[async_trait]
impl<C> BaseStore for SharedStorage<C>
where
    C: Connection + Clone + Send + Sync + std::fmt::Debug + 'static,
{
    async fn health_check(&self) -> Result<bool, StorageError> {
        self.bounded("health_check", async {
            self.client
                .query("INFO FOR DB")
                .await
                .map_err(|e| StorageError::Connection(format!("Health check failed: {}", e)))?;
            Ok(true)
        })
        .await
    }

    async fn clear(&self) -> Result<(), StorageError> {
        let queries = [
            "DELETE FROM relationship",
            "DELETE FROM channel_member",
            "DELETE FROM channel",
            "DELETE FROM user",
        ];

        for query in queries {
            self.client
                .query(query)
                .await
                .map_err(|e| StorageError::Query(format!("Failed to clear table: {}", e)))?;
        }

        Ok(())
    }

    async fn get_metadata(&self) -> Result<serde_json::Value, StorageError> {
        Ok(serde_json::json!({
            "type": "shared_storage",
            "namespace": self.config.namespace,
            "database": self.config.database,
            "query_timeout_ms": self.config.query_timeout.as_millis() as u64,
            "tables": ["user", "relationship", "channel", "channel_member"],
        }))
    }

    async fn close(&self) -> Result<(), StorageError> {
        // SurrealDB connections are automatically closed when dropped
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_unique_index_violation() {
        let err = classify_error(
            "create_pair",
            "Database index `relationship_pair_idx` already contains ['a', 'b'], with record `relationship:x`",
        );
        assert!(matches!(err, StorageError::AlreadyExists(_)));
    }

    #[test]
    fn test_classify_aborted_pair_transaction() {
        let err = classify_error(
            "set_pair_status",
            "An error occurred: relationship pair incomplete; The query was not executed due to a failed transaction",
        );
        assert!(matches!(err, StorageError::Integrity(_)));
    }

    #[test]
    fn test_classify_vanished_or_changed_pair_as_conflict() {
        let err = classify_error(
            "delete_pair",
            "An error occurred: relationship pair no longer exists; The query was not executed due to a failed transaction",
        );
        assert!(matches!(err, StorageError::Conflict(_)));

        let err = classify_error("set_pair_status", "An error occurred: relationship pair changed");
        assert!(matches!(err, StorageError::Conflict(_)));

        let err = classify_error("set_pair_status", "An error occurred: relationship pair inconsistent");
        assert!(matches!(err, StorageError::Integrity(_)));
    }

    #[test]
    fn test_client_connection_errors_are_transient() {
        let err = client_error(
            "find_pair",
            surrealdb::Error::Api(surrealdb::error::Api::ConnectionUninitialised),
        );
        assert!(matches!(err, StorageError::Connection(_)));
        assert!(err.is_transient());

        let err = client_error(
            "find_pair",
            surrealdb::Error::Api(surrealdb::error::Api::Ws("socket closed".to_string())),
        );
        assert!(matches!(err, StorageError::Connection(_)));

        let err = client_error(
            "find_pair",
            surrealdb::Error::Api(surrealdb::error::Api::Query("Parse error".to_string())),
        );
        assert!(matches!(err, StorageError::Query(_)));
    }

    #[tokio::test]
    async fn test_unconnected_client_reports_connection_error() {
        use crate::storage::traits::RelationshipStore;
        use surrealdb::engine::local::Db;

        let storage = SharedStorage {
            client: Surreal::<Db>::init(),
            config: SharedStorageConfig::default(),
        };

        let err = storage
            .find_pair(uuid::Uuid::new_v4(), uuid::Uuid::new_v4())
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::Connection(_)));
        assert!(matches!(
            crate::RelayError::from(err),
            crate::RelayError::Infrastructure(_)
        ));
    }

    #[test]
    fn test_classify_write_conflict() {
        let err = classify_error(
            "create_pair",
            "Failed to commit transaction due to a read or write conflict. This transaction can be retried",
        );
        assert!(matches!(err, StorageError::Conflict(_)));
    }

    #[test]
    fn test_classify_other_errors_as_query() {
        let err = classify_error("find_pair", "Parse error: unexpected token");
        assert!(matches!(err, StorageError::Query(_)));
    }
}
