use crate::config::{ConfigBuilder, ConfigLoader, LogFormat, LogLevel, RelayConfig, validation};
use crate::storage::config::SurrealDBEngine;
use figment::Jail;
use std::path::PathBuf;
use std::time::Duration;

#[test]
fn test_default_config() {
    let config = RelayConfig::default();
    assert_eq!(config.storage.surrealdb.engine, SurrealDBEngine::Memory);
    assert_eq!(config.storage.surrealdb.namespace, "relay");
    assert_eq!(config.storage.surrealdb.database, "main");
    assert_eq!(config.storage.query_timeout, Duration::from_secs(5));
    assert_eq!(config.logging.level, LogLevel::Info);
    assert!(validation::validate_config(&config).is_ok());
}

#[test]
fn test_config_builder_with_rocksdb() {
    let config = ConfigBuilder::new()
        .with_data_dir("/tmp/relay_data")
        .with_default_storage()
        .with_namespace("staging")
        .with_query_timeout(Duration::from_millis(750))
        .with_log_level(LogLevel::Debug)
        .build()
        .unwrap();

    assert_eq!(config.storage.data_dir, PathBuf::from("/tmp/relay_data"));
    assert_eq!(config.storage.surrealdb.engine, SurrealDBEngine::RocksDB);
    assert_eq!(config.storage.surrealdb.connection, "/tmp/relay_data/db");
    assert_eq!(config.storage.surrealdb.namespace, "staging");
    assert_eq!(config.storage.query_timeout, Duration::from_millis(750));
    assert_eq!(config.logging.level, LogLevel::Debug);
}

#[test]
fn test_config_builder_with_memory() {
    let config = ConfigBuilder::new()
        .with_default_storage()
        .with_memory_storage()
        .with_log_format(LogFormat::Compact)
        .build()
        .unwrap();

    assert_eq!(config.storage.surrealdb.engine, SurrealDBEngine::Memory);
    assert!(config.storage.surrealdb.connection.is_empty());
    assert_eq!(config.logging.format, LogFormat::Compact);
}

#[test]
fn test_validation_rejects_bad_values() {
    assert!(
        ConfigBuilder::new()
            .with_query_timeout(Duration::ZERO)
            .build()
            .is_err()
    );
    assert!(ConfigBuilder::new().with_namespace("  ").build().is_err());

    let mut config = RelayConfig::default();
    config.storage.surrealdb.engine = SurrealDBEngine::RocksDB;
    config.storage.surrealdb.connection = String::new();
    assert!(validation::validate_config(&config).is_err());
}

#[test]
fn test_predefined_configs() {
    let dev = ConfigBuilder::development().build().unwrap();
    let test = ConfigBuilder::testing().build().unwrap();
    let prod = ConfigBuilder::production().build().unwrap();

    assert_eq!(dev.storage.surrealdb.engine, SurrealDBEngine::Memory);
    assert_eq!(dev.logging.level, LogLevel::Debug);
    assert_eq!(test.storage.data_dir, PathBuf::from("./test_data"));
    assert_eq!(prod.storage.surrealdb.engine, SurrealDBEngine::RocksDB);
    assert_eq!(prod.logging.format, LogFormat::Json);
}

#[test]
fn test_config_serialization() {
    let config = ConfigBuilder::new()
        .with_data_dir("/tmp/relay_data")
        .with_query_timeout(Duration::from_secs(2))
        .build()
        .unwrap();

    let json = serde_json::to_string(&config).unwrap();
    assert!(json.contains("\"query_timeout\":\"2s\""));

    let deserialized: RelayConfig = serde_json::from_str(&json).unwrap();
    assert_eq!(config.storage.data_dir, deserialized.storage.data_dir);
    assert_eq!(deserialized.storage.query_timeout, Duration::from_secs(2));
}

#[test]
fn test_loader_file_then_env() {
    Jail::expect_with(|jail| {
        jail.create_file(
            "relay.toml",
            r#"
            [storage]
            data_dir = "/var/lib/relay"
            query_timeout = "2s"

            [storage.surrealdb]
            engine = "RocksDB"
            connection = "/var/lib/relay/db"
            namespace = "from_file"

            [logging]
            level = "warn"
            "#,
        )?;
        jail.set_env("RELAY_STORAGE__SURREALDB__NAMESPACE", "from_env");
        jail.set_env("RELAY_LOGGING__FORMAT", "json");

        let mut loader = ConfigLoader::new();
        let config = loader
            .load_file("relay.toml")
            .map_err(|e| e.to_string())?
            .load_env()
            .extract()
            .map_err(|e| e.to_string())?;

        assert_eq!(config.storage.data_dir, PathBuf::from("/var/lib/relay"));
        assert_eq!(config.storage.query_timeout, Duration::from_secs(2));
        assert_eq!(config.storage.surrealdb.engine, SurrealDBEngine::RocksDB);
        assert_eq!(config.storage.surrealdb.namespace, "from_env");
        assert_eq!(config.logging.level, LogLevel::Warn);
        assert_eq!(config.logging.format, LogFormat::Json);
        Ok(())
    });
}

#[test]
fn test_loader_rejects_missing_and_unknown_files() {
    Jail::expect_with(|jail| {
        jail.create_file("relay.ini", "level = info")?;

        let mut loader = ConfigLoader::new();
        assert!(loader.load_file("missing.toml").is_err());
        assert!(loader.load_file("relay.ini").is_err());
        Ok(())
    });
}

#[test]
fn test_loader_validates_extracted_config() {
    Jail::expect_with(|jail| {
        jail.set_env("RELAY_STORAGE__QUERY_TIMEOUT", "0s");

        let mut loader = ConfigLoader::new();
        assert!(loader.load_env().extract().is_err());
        Ok(())
    });
}

#[test]
fn test_loader_layers_env_over_custom_defaults() {
    Jail::expect_with(|jail| {
        jail.set_env("RELAY_STORAGE__SURREALDB__DATABASE", "social");

        let base = ConfigBuilder::new()
            .with_data_dir(jail.directory())
            .with_default_storage()
            .build()
            .unwrap();
        let mut loader = ConfigLoader::from_defaults(base);
        let config = loader.load_env().extract().unwrap();

        assert_eq!(config.storage.surrealdb.engine, SurrealDBEngine::RocksDB);
        assert_eq!(config.storage.surrealdb.database, "social");
        Ok(())
    });
}
