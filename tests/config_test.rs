use std::fs;
use tempfile::TempDir;
use wheretopublish::config::{AppConfig, ConfigManager};
use wheretopublish::{OaMatching, ResetScope};

// Helper to create a temporary config directory for testing
fn setup_test_config_dir() -> (TempDir, ConfigManager) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config_manager = ConfigManager::with_dir(temp_dir.path().to_path_buf());
    (temp_dir, config_manager)
}

fn write_user_config(config_manager: &ConfigManager, content: &str) {
    config_manager
        .ensure_config_dir()
        .expect("Failed to create config dir");
    fs::write(config_manager.config_path("config.toml"), content)
        .expect("Failed to write config");
}

#[test]
fn test_default_config() {
    let config = AppConfig::default();

    assert_eq!(config.version, "0.1");

    assert_eq!(config.histogram.bin_count, 16);
    assert_eq!(config.histogram.ceiling, 5000);

    assert_eq!(
        config.filters.reset_scope_on_dataset_switch,
        ResetScope::FieldAndRangeOnly
    );
    assert_eq!(config.filters.oa_matching, OaMatching::Prefix);

    assert!(config.columns.scimago_columns);

    assert_eq!(config.data.base, "data");
    assert_eq!(config.data.default_source, "generalist");
    assert_eq!(config.data.sources.len(), 11);

    assert!(config.preferences.enabled);
    assert_eq!(config.preferences.key, "wtp_global_state_v1");

    assert!(!config.debug.enabled);
}

#[test]
fn test_generate_default_config() {
    let (_temp_dir, config_manager) = setup_test_config_dir();

    let template = config_manager.generate_default_config();

    assert!(template.contains("[histogram]"));
    assert!(template.contains("[filters]"));
    assert!(template.contains("[columns]"));
    assert!(template.contains("[data]"));
    assert!(template.contains("[[data.sources]]"));
    assert!(template.contains("[preferences]"));
    assert!(template.contains("[debug]"));
    assert!(template.contains("version = \"0.1\""));
}

#[test]
fn test_write_default_config() {
    let (_temp_dir, config_manager) = setup_test_config_dir();

    let config_path = config_manager
        .write_default_config(false)
        .expect("Failed to write config");

    assert!(config_path.exists());
    let content = fs::read_to_string(&config_path).expect("Failed to read config");
    assert!(content.contains("[histogram]"));
}

#[test]
fn test_write_config_without_force_fails_if_exists() {
    let (_temp_dir, config_manager) = setup_test_config_dir();

    config_manager
        .write_default_config(false)
        .expect("First write should succeed");

    let result = config_manager.write_default_config(false);
    assert!(result.is_err());
    assert!(result.unwrap_err().to_string().contains("already exists"));
}

#[test]
fn test_write_config_with_force_overwrites() {
    let (_temp_dir, config_manager) = setup_test_config_dir();

    let first_path = config_manager
        .write_default_config(false)
        .expect("First write should succeed");
    let second_path = config_manager
        .write_default_config(true)
        .expect("Second write with force should succeed");

    assert_eq!(first_path, second_path);
    assert!(first_path.exists());
}

#[test]
fn test_load_with_no_file_gives_defaults() {
    let (_temp_dir, config_manager) = setup_test_config_dir();

    let config = AppConfig::load_with_manager(&config_manager).expect("Should load defaults");

    assert_eq!(config.version, "0.1");
    assert_eq!(config.histogram.bin_count, 16);
}

#[test]
fn test_load_minimal_config_keeps_other_defaults() {
    let (_temp_dir, config_manager) = setup_test_config_dir();
    write_user_config(
        &config_manager,
        r#"
version = "0.1"

[histogram]
bin_count = 10
ceiling = 10000

[filters]
oa_matching = "exact"
"#,
    );

    let config = AppConfig::load_with_manager(&config_manager).expect("Should load config");

    assert_eq!(config.histogram.bin_count, 10);
    assert_eq!(config.histogram.ceiling, 10000);
    assert_eq!(config.filters.oa_matching, OaMatching::Exact);
    assert_eq!(
        config.filters.reset_scope_on_dataset_switch,
        ResetScope::FieldAndRangeOnly
    );
    assert_eq!(config.data.sources.len(), 11);
    assert_eq!(config.preferences.max_bytes, 64 * 1024);
}

#[test]
fn test_load_custom_catalog() {
    let (_temp_dir, config_manager) = setup_test_config_dir();
    write_user_config(
        &config_manager,
        r#"
[data]
base = "https://example.org/lists"
default_source = "mine"

[[data.sources]]
id = "mine"
label = "My list"
file = "mine.csv.gz"
"#,
    );

    let config = AppConfig::load_with_manager(&config_manager).expect("Should load config");

    assert_eq!(config.data.base, "https://example.org/lists");
    assert_eq!(config.data.sources.len(), 1);
    assert_eq!(
        config.data.source("mine").map(|s| s.label.as_str()),
        Some("My list")
    );
}

#[test]
fn test_load_rejects_invalid_toml() {
    let (_temp_dir, config_manager) = setup_test_config_dir();
    write_user_config(&config_manager, "[histogram\nbin_count = ");

    let result = AppConfig::load_with_manager(&config_manager);
    assert!(result.is_err());
    assert!(result
        .unwrap_err()
        .to_string()
        .contains("Failed to parse config file"));
}

#[test]
fn test_load_rejects_unknown_reset_scope() {
    let (_temp_dir, config_manager) = setup_test_config_dir();
    write_user_config(
        &config_manager,
        "[filters]\nreset_scope_on_dataset_switch = \"sometimes\"\n",
    );

    assert!(AppConfig::load_with_manager(&config_manager).is_err());
}

#[test]
fn test_validate_config_invalid_version() {
    let config = AppConfig {
        version: "1.0".to_string(),
        ..Default::default()
    };

    let result = config.validate();
    assert!(result.is_err());
    assert!(result
        .unwrap_err()
        .to_string()
        .contains("Unsupported config version"));
}

#[test]
fn test_validate_config_zero_ceiling() {
    let mut config = AppConfig::default();
    config.histogram.ceiling = 0;

    let result = config.validate();
    assert!(result.is_err());
    assert!(result
        .unwrap_err()
        .to_string()
        .contains("ceiling must be greater than 0"));
}

#[test]
fn test_validate_config_empty_preferences_key() {
    let mut config = AppConfig::default();
    config.preferences.key = "  ".to_string();

    assert!(config.validate().is_err());
}
