//! Schema initialization and management for SharedStorage

use crate::storage::errors::StorageError;
use surrealdb::{Connection, Surreal};

/// Initialize the SharedStorage schema with tables and indexes for Relay
pub async fn initialize_schema<C>(client: &Surreal<C>) -> Result<(), StorageError>
where
    C: Connection,
{
    let user_table_query = r#"
        DEFINE TABLE IF NOT EXISTS user SCHEMAFULL
        COMMENT "Registered accounts";

        DEFINE FIELD IF NOT EXISTS username ON user TYPE string;
        DEFINE FIELD IF NOT EXISTS email ON user TYPE string;
        DEFINE FIELD IF NOT EXISTS password_hash ON user TYPE string;
        DEFINE FIELD IF NOT EXISTS created_at ON user TYPE datetime DEFAULT time::now();
        DEFINE FIELD IF NOT EXISTS updated_at ON user TYPE datetime VALUE time::now();

        DEFINE INDEX IF NOT EXISTS user_username_idx ON user FIELDS username UNIQUE;
        DEFINE INDEX IF NOT EXISTS user_email_idx ON user FIELDS email UNIQUE;
    "#;

    // Two rows per logical relationship, one per participant
    let relationship_table_query = r#"
        DEFINE TABLE IF NOT EXISTS relationship SCHEMAFULL
        COMMENT "Per-participant relationship rows";

        DEFINE FIELD IF NOT EXISTS owner ON relationship TYPE string;
        DEFINE FIELD IF NOT EXISTS counterparty ON relationship TYPE string;
        DEFINE FIELD IF NOT EXISTS status ON relationship TYPE string
            ASSERT $value IN ['outgoing', 'incoming', 'friend', 'blocked', 'blocked_other'];
        DEFINE FIELD IF NOT EXISTS created_at ON relationship TYPE datetime DEFAULT time::now();
        DEFINE FIELD IF NOT EXISTS updated_at ON relationship TYPE datetime VALUE time::now();

        DEFINE INDEX IF NOT EXISTS relationship_pair_idx ON relationship FIELDS owner, counterparty UNIQUE;
        DEFINE INDEX IF NOT EXISTS relationship_owner_idx ON relationship FIELDS owner;
    "#;

    let channel_table_query = r#"
        DEFINE TABLE IF NOT EXISTS channel SCHEMAFULL
        COMMENT "Direct and group conversation channels";

        DEFINE FIELD IF NOT EXISTS name ON channel TYPE string;
        DEFINE FIELD IF NOT EXISTS owner ON channel TYPE string;
        DEFINE FIELD IF NOT EXISTS kind ON channel TYPE string ASSERT $value IN ['dm', 'group'];
        DEFINE FIELD IF NOT EXISTS lookup_key ON channel TYPE string;
        DEFINE FIELD IF NOT EXISTS created_at ON channel TYPE datetime DEFAULT time::now();
        DEFINE FIELD IF NOT EXISTS updated_at ON channel TYPE datetime VALUE time::now();

        DEFINE INDEX IF NOT EXISTS channel_lookup_key_idx ON channel FIELDS lookup_key UNIQUE;

        DEFINE TABLE IF NOT EXISTS channel_member SCHEMAFULL
        COMMENT "Channel memberships";

        DEFINE FIELD IF NOT EXISTS channel ON channel_member TYPE string;
        DEFINE FIELD IF NOT EXISTS member ON channel_member TYPE string;
        DEFINE FIELD IF NOT EXISTS joined_at ON channel_member TYPE datetime DEFAULT time::now();

        DEFINE INDEX IF NOT EXISTS channel_member_pair_idx ON channel_member FIELDS channel, member UNIQUE;
        DEFINE INDEX IF NOT EXISTS channel_member_member_idx ON channel_member FIELDS member;
    "#;

    for (name, query) in [
        ("user", user_table_query),
        ("relationship", relationship_table_query),
        ("channel", channel_table_query),
    ] {
        client
            .query(query)
            .await
            .map_err(|e| {
                StorageError::Query(format!("Failed to define {} tables: {}", name, e))
            })?
            .check()
            .map_err(|e| {
                StorageError::Query(format!("Failed to define {} tables: {}", name, e))
            })?;
    }

    tracing::debug!("SharedStorage schema initialized");
    Ok(())
}
