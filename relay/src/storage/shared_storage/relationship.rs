//! Relationship pair storage implementation

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use lazy_static::lazy_static;
use surrealdb::Connection;
use uuid::Uuid;

use super::base::{
    PAIR_CHANGED, PAIR_GONE, PAIR_INCOMPLETE, PAIR_INCONSISTENT, SharedStorage, check_statements,
    client_error,
};
use crate::models::{Relationship, RelationshipStatus};
use crate::storage::errors::StorageError;
use crate::storage::traits::RelationshipStore;

const RELATIONSHIP_FIELDS: &str =
    "record::id(id) AS id, owner, counterparty, status, created_at, updated_at";

lazy_static! {
    /// Opening statements of every paired write.
    ///
    /// Reads both rows and aborts unless `$a`'s row still holds `$expected`
    /// and `$b`'s row holds its complement. An absent pair or a changed status
    /// means another request got there first. One row without the other, or
    /// two rows that disagree, means the pair is corrupt.
    static ref PAIR_GUARD: String = format!(
        r#"
        LET $forward = (SELECT status FROM relationship WHERE owner = $a AND counterparty = $b);
        LET $mirror = (SELECT status FROM relationship WHERE owner = $b AND counterparty = $a);
        IF array::len($forward) = 0 AND array::len($mirror) = 0 {{
            THROW "{gone}";
        }};
        IF array::len($forward) != 1 OR array::len($mirror) != 1 {{
            THROW "{incomplete}";
        }};
        IF $forward[0].status != $expected {{
            THROW "{changed}";
        }};
        IF $mirror[0].status != $expected_mirror {{
            THROW "{inconsistent}";
        }};
        "#,
        gone = PAIR_GONE,
        incomplete = PAIR_INCOMPLETE,
        changed = PAIR_CHANGED,
        inconsistent = PAIR_INCONSISTENT,
    );
}

/// Internal representation of a relationship row for SurrealDB
#[derive(Debug, Clone, serde::Deserialize)]
struct SurrealRelationship {
    id: String,
    owner: String,
    counterparty: String,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<SurrealRelationship> for Relationship {
    type Error = StorageError;

    fn try_from(row: SurrealRelationship) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid("relationship id", &row.id)?,
            owner: parse_uuid("relationship owner", &row.owner)?,
            counterparty: parse_uuid("relationship counterparty", &row.counterparty)?,
            status: row
                .status
                .parse::<RelationshipStatus>()
                .map_err(StorageError::Serialization)?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

pub(crate) fn parse_uuid(field: &str, value: &str) -> Result<Uuid, StorageError> {
    Uuid::parse_str(value)
        .map_err(|e| StorageError::Serialization(format!("Invalid {} '{}': {}", field, value, e)))
}

fn into_relationships(rows: Vec<SurrealRelationship>) -> Result<Vec<Relationship>, StorageError> {
    rows.into_iter().map(Relationship::try_from).collect()
}

#[async_trait]
impl<C> RelationshipStore for SharedStorage<C>
where
    C: Connection + Clone + Send + Sync + std::fmt::Debug + 'static,
{
    async fn find_pair(&self, a: Uuid, b: Uuid) -> Result<Option<Relationship>, StorageError> {
        self.bounded("find_pair", async {
            let query = format!(
                "SELECT {} FROM relationship \
                 WHERE (owner = $a AND counterparty = $b) OR (owner = $b AND counterparty = $a)",
                RELATIONSHIP_FIELDS
            );

            let mut result = self
                .client
                .query(query)
                .bind(("a", a.to_string()))
                .bind(("b", b.to_string()))
                .await
                .map_err(|e| client_error("find_pair", e))?;

            let rows: Vec<SurrealRelationship> = result.take(0).map_err(|e| {
                StorageError::Query(format!("Failed to parse relationship rows: {}", e))
            })?;
            let rows = into_relationships(rows)?;

            // The caller's own row wins; the mirror stands in only when it is missing
            let (own, mirrored): (Vec<_>, Vec<_>) = rows.into_iter().partition(|r| r.owner == a);
            Ok(own.into_iter().next().or_else(|| mirrored.into_iter().next()))
        })
        .await
    }

    async fn create_pair(&self, a: Uuid, b: Uuid) -> Result<Relationship, StorageError> {
        if a == b {
            return Err(StorageError::Validation(
                "A relationship needs two distinct participants".to_string(),
            ));
        }

        self.bounded("create_pair", async {
            let forward_id = Uuid::new_v4().to_string();
            let mirror_id = Uuid::new_v4().to_string();

            // The read happens before COMMIT so it sees this transaction's rows
            let query = format!(
                r#"
                BEGIN TRANSACTION;
                CREATE type::thing('relationship', $forward_id)
                    CONTENT {{ owner: $a, counterparty: $b, status: 'outgoing' }};
                CREATE type::thing('relationship', $mirror_id)
                    CONTENT {{ owner: $b, counterparty: $a, status: 'incoming' }};
                SELECT {} FROM type::thing('relationship', $forward_id);
                COMMIT TRANSACTION;
                "#,
                RELATIONSHIP_FIELDS
            );

            let mut result = self
                .client
                .query(query)
                .bind(("forward_id", forward_id))
                .bind(("mirror_id", mirror_id))
                .bind(("a", a.to_string()))
                .bind(("b", b.to_string()))
                .await
                .map_err(|e| client_error("create_pair", e))?;

            let last = result.num_statements().saturating_sub(1);
            check_statements("create_pair", &mut result)?;

            let rows: Vec<SurrealRelationship> = result.take(last).map_err(|e| {
                StorageError::Query(format!("Failed to parse created relationship: {}", e))
            })?;

            into_relationships(rows)?.into_iter().next().ok_or_else(|| {
                StorageError::Internal("Relationship pair committed but not readable".to_string())
            })
        })
        .await
    }

    async fn set_pair_status(
        &self,
        a: Uuid,
        b: Uuid,
        expected: RelationshipStatus,
        status: RelationshipStatus,
    ) -> Result<Relationship, StorageError> {
        self.bounded("set_pair_status", async {
            let query = format!(
                r#"
                BEGIN TRANSACTION;
                {}
                UPDATE relationship SET status = $status
                    WHERE owner = $a AND counterparty = $b;
                UPDATE relationship SET status = $mirror_status
                    WHERE owner = $b AND counterparty = $a;
                SELECT {} FROM relationship WHERE owner = $a AND counterparty = $b;
                COMMIT TRANSACTION;
                "#,
                PAIR_GUARD.as_str(),
                RELATIONSHIP_FIELDS
            );

            let mut result = self
                .client
                .query(query)
                .bind(("a", a.to_string()))
                .bind(("b", b.to_string()))
                .bind(("expected", expected.as_str().to_string()))
                .bind(("expected_mirror", expected.complement().as_str().to_string()))
                .bind(("status", status.as_str().to_string()))
                .bind(("mirror_status", status.complement().as_str().to_string()))
                .await
                .map_err(|e| client_error("set_pair_status", e))?;

            let last = result.num_statements().saturating_sub(1);
            check_statements("set_pair_status", &mut result)?;

            let rows: Vec<SurrealRelationship> = result.take(last).map_err(|e| {
                StorageError::Query(format!("Failed to parse updated relationship: {}", e))
            })?;

            into_relationships(rows)?.into_iter().next().ok_or_else(|| {
                StorageError::Internal("Relationship pair updated but not readable".to_string())
            })
        })
        .await
    }

    async fn delete_pair(
        &self,
        a: Uuid,
        b: Uuid,
        expected: RelationshipStatus,
    ) -> Result<(), StorageError> {
        self.bounded("delete_pair", async {
            let query = format!(
                r#"
                BEGIN TRANSACTION;
                {}
                DELETE relationship WHERE owner = $a AND counterparty = $b;
                DELETE relationship WHERE owner = $b AND counterparty = $a;
                COMMIT TRANSACTION;
                "#,
                PAIR_GUARD.as_str()
            );

            let mut result = self
                .client
                .query(query)
                .bind(("a", a.to_string()))
                .bind(("b", b.to_string()))
                .bind(("expected", expected.as_str().to_string()))
                .bind(("expected_mirror", expected.complement().as_str().to_string()))
                .await
                .map_err(|e| client_error("delete_pair", e))?;

            check_statements("delete_pair", &mut result)
        })
        .await
    }

    async fn list_for_owner(&self, owner: Uuid) -> Result<Vec<Relationship>, StorageError> {
        self.bounded("list_for_owner", async {
            let query = format!(
                "SELECT {} FROM relationship WHERE owner = $owner ORDER BY created_at ASC",
                RELATIONSHIP_FIELDS
            );

            let mut result = self
                .client
                .query(query)
                .bind(("owner", owner.to_string()))
                .await
                .map_err(|e| client_error("list_for_owner", e))?;

            let rows: Vec<SurrealRelationship> = result.take(0).map_err(|e| {
                StorageError::Query(format!("Failed to parse relationship rows: {}", e))
            })?;

            into_relationships(rows)
        })
        .await
    }
}
