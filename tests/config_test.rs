// ==========================================
// ConfigManager 集成测试
// ==========================================
// 测试目标: 默认值 / 持久化 / 非法值回退
// ==========================================

mod test_helpers;

use farma_inventory::config::{config_keys, defaults, ConfigManager, InventoryConfigReader};
use test_helpers::create_test_db;

#[tokio::test]
async fn test_defaults_on_empty_database() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let config = ConfigManager::new(&db_path).expect("Failed to create ConfigManager");

    assert_eq!(
        config.get_upcoming_window_months().await.unwrap(),
        defaults::UPCOMING_WINDOW_MONTHS
    );
    assert_eq!(config.get_header_scan_rows().await.unwrap(), 15);
    assert_eq!(config.get_upsert_chunk_size().await.unwrap(), 500);
    assert_eq!(config.get_fetch_page_size().await.unwrap(), 1000);
    assert_eq!(config.get_ai_model().await.unwrap(), "gemini-3-flash-preview");
    assert_eq!(config.get_report_brand().await.unwrap(), "FarmaINPER");
    assert_eq!(config.get_delete_password().await.unwrap(), "farmaciahospitalaria");
}

#[tokio::test]
async fn test_values_survive_reopen() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    {
        let config = ConfigManager::new(&db_path).unwrap();
        config
            .set_config_value(config_keys::UPCOMING_WINDOW_MONTHS, "6")
            .unwrap();
        config
            .set_config_value(config_keys::REPORT_BRAND, "Hospital Central")
            .unwrap();
    }

    let config = ConfigManager::new(&db_path).unwrap();
    assert_eq!(config.get_upcoming_window_months().await.unwrap(), 6);
    assert_eq!(config.get_report_brand().await.unwrap(), "Hospital Central");

    let listed = config.list_configs().unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].0, config_keys::REPORT_BRAND);
}

#[tokio::test]
async fn test_invalid_numbers_fall_back_to_defaults() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let config = ConfigManager::new(&db_path).unwrap();
    config
        .set_config_value(config_keys::HEADER_SCAN_ROWS, "muchas")
        .unwrap();
    config
        .set_config_value(config_keys::UPSERT_CHUNK_SIZE, "0")
        .unwrap();

    assert_eq!(config.get_header_scan_rows().await.unwrap(), defaults::HEADER_SCAN_ROWS);
    assert_eq!(config.get_upsert_chunk_size().await.unwrap(), defaults::UPSERT_CHUNK_SIZE);
}

#[tokio::test]
async fn test_remove_config_value() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let config = ConfigManager::new(&db_path).unwrap();
    config.set_config_value(config_keys::AI_MODEL, "gemini-pro").unwrap();
    assert_eq!(config.get_ai_model().await.unwrap(), "gemini-pro");

    assert!(config.remove_config_value(config_keys::AI_MODEL).unwrap());
    assert!(!config.remove_config_value(config_keys::AI_MODEL).unwrap());
    assert_eq!(config.get_ai_model().await.unwrap(), defaults::AI_MODEL);
}
