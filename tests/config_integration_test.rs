//! Integration tests for configuration loading and overrides

use cloak::config::{load_config, CloakConfig, StoreBackend};
use secrecy::ExposeSecret;
use std::io::Write;
use std::sync::Mutex;
use tempfile::NamedTempFile;

// Tests that set process environment variables must not interleave
static ENV_LOCK: Mutex<()> = Mutex::new(());

fn write_config(contents: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(".toml")
        .tempfile()
        .expect("temp config file");
    file.write_all(contents.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

#[test]
fn load_full_keyvault_config() {
    let _guard = ENV_LOCK.lock().unwrap();
    std::env::set_var("CLOAK_TEST_KV_SECRET", "super-secret-value");

    let file = write_config(
        r#"
        [application]
        log_level = "debug"

        [detection]
        confidence_threshold = 0.8

        [store]
        backend = "keyvault"
        default_ttl_hours = 48

        [store.keyvault]
        vault_url = "https://support-vault.vault.azure.net"
        tenant_id = "11111111-2222-3333-4444-555555555555"
        client_id = "66666666-7777-8888-9999-000000000000"
        client_secret = "${CLOAK_TEST_KV_SECRET}"
        secret_name_prefix = "support"

        [audit]
        enabled = true
        log_path = "logs/audit.log"
        "#,
    );

    let config = load_config(file.path()).unwrap();
    std::env::remove_var("CLOAK_TEST_KV_SECRET");

    assert_eq!(config.application.log_level, "debug");
    assert_eq!(config.detection.confidence_threshold, 0.8);
    assert_eq!(config.store.backend, StoreBackend::KeyVault);
    assert_eq!(config.store.default_ttl_hours, 48);
    assert!(config.audit.enabled);

    let kv = config.store.keyvault.unwrap();
    assert_eq!(kv.secret_name_prefix, "support");
    // ${VAR} substitution pulled the secret from the environment
    assert_eq!(kv.client_secret.expose_secret().as_ref(), "super-secret-value");
}

#[test]
fn load_cosmosdb_config_with_defaults() {
    let file = write_config(
        r#"
        [store]
        backend = "cosmosdb"

        [store.cosmosdb]
        endpoint = "https://support.documents.azure.com:443/"
        key = "base64-account-key"
        "#,
    );

    let config = load_config(file.path()).unwrap();
    let cosmos = config.store.cosmosdb.unwrap();

    assert_eq!(cosmos.database_name, "cloak");
    assert_eq!(cosmos.container_name, "token_mappings");
    assert_eq!(cosmos.request_timeout_seconds, 5);
}

#[test]
fn selected_backend_without_section_is_rejected() {
    let file = write_config(
        r#"
        [store]
        backend = "keyvault"
        "#,
    );

    let err = load_config(file.path()).unwrap_err();
    assert!(err.to_string().contains("keyvault configuration is required"));
}

#[test]
fn out_of_range_threshold_is_rejected() {
    let file = write_config(
        r#"
        [detection]
        confidence_threshold = 1.3
        "#,
    );

    assert!(load_config(file.path()).is_err());
}

#[test]
fn env_overrides_take_precedence_over_file() {
    let file = write_config(
        r#"
        [store]
        backend = "memory"
        default_ttl_hours = 24
        "#,
    );

    let _guard = ENV_LOCK.lock().unwrap();
    std::env::set_var("CLOAK_DEFAULT_TTL_HOURS", "72");
    let config = load_config(file.path()).unwrap();
    std::env::remove_var("CLOAK_DEFAULT_TTL_HOURS");

    assert_eq!(config.store.default_ttl_hours, 72);
}

#[test]
fn default_config_needs_no_file() {
    let config = CloakConfig::default();
    assert!(config.validate().is_ok());
    assert_eq!(config.store.backend, StoreBackend::Memory);
    assert_eq!(config.detection.confidence_threshold, 0.7);
    assert!(!config.audit.enabled);
}

#[test]
fn missing_substitution_variable_fails_loudly() {
    let file = write_config(
        r#"
        [store]
        backend = "cosmosdb"

        [store.cosmosdb]
        endpoint = "https://support.documents.azure.com:443/"
        key = "${CLOAK_TEST_DEFINITELY_NOT_SET}"
        "#,
    );

    let err = load_config(file.path()).unwrap_err();
    assert!(err.to_string().contains("CLOAK_TEST_DEFINITELY_NOT_SET"));
}
