mod common;

use std::sync::mpsc::channel;
use std::time::Duration;
use tempfile::TempDir;
use wheretopublish::config::DataSourceConfig;
use wheretopublish::{
    AppConfig, BusinessModelFilter, CategoryFilter, Column, DatasetSource, PublisherTypeFilter,
    ResetScope, Session,
};

/// Config whose catalog points at two CSVs in a temp dir.
fn setup_catalog() -> (TempDir, AppConfig) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    common::write_csv(temp_dir.path(), "sample.csv", &common::sample_csv());
    common::write_csv(
        temp_dir.path(),
        "plants.csv",
        &format!(
            "{}\nNew Phytologist,Plants,Wiley,For-profit Society-Run,Hybrid,,,United Kingdom,,\"2,900\"\nPlant Direct,Plants,Wiley,For-profit,OA,,,United States,,\"1,800\"\n",
            common::HEADER
        ),
    );

    let mut config = AppConfig::default();
    config.data.base = temp_dir.path().to_string_lossy().into_owned();
    config.data.default_source = "sample".to_string();
    config.data.all_fields_source = "sample".to_string();
    config.data.sources = vec![
        DataSourceConfig {
            id: "sample".to_string(),
            label: "All fields".to_string(),
            file: "sample.csv".to_string(),
        },
        DataSourceConfig {
            id: "plants".to_string(),
            label: "Plants".to_string(),
            file: "plants.csv".to_string(),
        },
        DataSourceConfig {
            id: "missing".to_string(),
            label: "Missing".to_string(),
            file: "missing.csv".to_string(),
        },
    ];
    (temp_dir, config)
}

#[test]
fn test_load_default_source() {
    let (_temp_dir, config) = setup_catalog();
    let mut session = Session::new(config);
    let source = session.resolve(None);
    assert_eq!(source.id.as_deref(), Some("sample"));

    let dataset = session.load_dataset(source);
    assert_eq!(dataset.rows.len(), 8);
    assert_eq!(session.visible_rows().len(), 8);
    assert!(session.status_message().is_none());
}

#[test]
fn test_fetch_failure_gives_empty_table_and_message() {
    let (_temp_dir, config) = setup_catalog();
    let mut session = Session::new(config);
    let source = session.resolve(Some("missing"));
    session.load_dataset(source);

    assert!(session.dataset().is_empty());
    assert!(session.visible_rows().is_empty());
    assert_eq!(session.histogram().len(), 16);
    assert_eq!(session.category_counts().publisher_total, 0);
    let message = session.status_message().expect("failure should set a status");
    assert!(message.contains("Missing"));
    assert_eq!(session.empty_message(), message);
}

#[test]
fn test_zero_records_message_names_dataset() {
    let (_temp_dir, config) = setup_catalog();
    let mut session = Session::new(config);

    let source = session.resolve(Some("plants"));
    session.load_dataset(source);
    session.set_text_query("zebrafish");
    assert!(session.visible_rows().is_empty());
    assert!(session.empty_message().contains("\"Plants\" dataset"));

    let source = session.resolve(Some("sample"));
    session.load_dataset(source);
    assert!(session.visible_rows().is_empty());
    assert!(session.empty_message().contains("only biology"));
}

#[test]
fn test_dataset_switch_resets_field_and_range() {
    let (_temp_dir, config) = setup_catalog();
    let mut session = Session::new(config);
    let source = session.resolve(Some("sample"));
    session.load_dataset(source);

    session.set_text_query("plant");
    session.set_category_filter(CategoryFilter::PublisherType(PublisherTypeFilter::ForProfit));
    session.set_field_filter(Some("Plants"));
    session.set_apc_range(0, 2000);

    let source = session.resolve(Some("plants"));
    session.load_dataset(source);

    let filters = session.filters();
    assert_eq!(filters.field_filter(), None);
    assert!(filters.is_full_apc_range());
    assert_eq!(filters.text_query(), "plant");
    assert_eq!(filters.publisher_type(), PublisherTypeFilter::ForProfit);
    assert_eq!(session.visible_rows().len(), 2);
}

#[test]
fn test_dataset_switch_can_reset_everything() {
    let (_temp_dir, mut config) = setup_catalog();
    config.filters.reset_scope_on_dataset_switch = ResetScope::All;
    let mut session = Session::new(config);
    let source = session.resolve(Some("sample"));
    session.load_dataset(source);
    session.set_text_query("cancer");

    let source = session.resolve(Some("plants"));
    session.load_dataset(source);
    assert_eq!(session.filters().text_query(), "");
}

#[test]
fn test_business_model_resets_after_switch_when_empty() {
    let (_temp_dir, config) = setup_catalog();
    let mut session = Session::new(config);
    let source = session.resolve(Some("sample"));
    session.load_dataset(source);
    session.set_category_filter(CategoryFilter::BusinessModel(BusinessModelFilter::OaDiamond));
    assert_eq!(session.visible_rows().len(), 1);

    let source = session.resolve(Some("plants"));
    session.load_dataset(source);
    assert_eq!(session.category_counts().oa_diamond, 0);
    assert_eq!(session.filters().business_model(), BusinessModelFilter::All);
    assert_eq!(session.visible_rows().len(), 2);
}

#[test]
fn test_background_load_discards_superseded_request() {
    let (_temp_dir, config) = setup_catalog();
    let mut session = Session::new(config);
    let (tx, rx) = channel();

    let sample = session.resolve(Some("sample"));
    let plants = session.resolve(Some("plants"));
    let first = session.spawn_load(sample, tx.clone());
    let second = session.spawn_load(plants, tx);
    assert!(!session.is_current(first));
    assert!(session.is_current(second));

    let mut applied = 0;
    for _ in 0..2 {
        let response = rx
            .recv_timeout(Duration::from_secs(10))
            .expect("worker should respond");
        if session.complete_load(response) {
            applied += 1;
        }
    }

    assert_eq!(applied, 1);
    assert_eq!(
        session.source().and_then(|s| s.id.as_deref()),
        Some("plants")
    );
    assert_eq!(session.dataset().rows.len(), 2);
}

#[test]
fn test_hidden_scimago_columns() {
    let (_temp_dir, mut config) = setup_catalog();
    config.columns.scimago_columns = false;
    let mut session = Session::new(config);
    session.set_column_visible(Column::HIndex, true);
    assert!(!session.columns().contains(Column::HIndex));
    session.set_column_visible(Column::Country, true);
    assert!(session.columns().contains(Column::Country));
}

#[test]
fn test_ad_hoc_path_source() {
    let (temp_dir, config) = setup_catalog();
    let path = temp_dir.path().join("plants.csv");
    let source = DatasetSource::resolve(&path.to_string_lossy(), &config.data);
    assert_eq!(source.id, None);
    assert_eq!(source.label, "plants.csv");

    let mut session = Session::new(config);
    session.load_dataset(source);
    assert_eq!(session.column_choices(Column::Country).len(), 2);
    assert_eq!(session.column_choices(Column::Subfield), vec!["Plants"]);
}
