// ==========================================
// InventoryApi 集成测试
// ==========================================
// 测试目标: 内存列表 + 本地镜像 + 远端表 的协同
// 远端用内存实现/失败实现替代
// ==========================================

mod test_helpers;

use std::sync::atomic::Ordering;
use std::sync::{Arc, Mutex};

use farma_inventory::api::{ApiError, InventoryApi, SyncOutcome};
use farma_inventory::config::config_keys;
use farma_inventory::domain::{StatusFilter, SyncStatus};
use farma_inventory::repository::MedicationRepository;
use test_helpers::{
    create_test_db, medication, open_stores, sample_inventory, ymd, CannedInsights,
    FailingRepository, MemoryRepository,
};

fn api_with_remote(
    db_path: &str,
    remote: Option<Arc<dyn MedicationRepository>>,
) -> InventoryApi {
    let (local, config) = open_stores(db_path);
    InventoryApi::new(local, remote, config).with_today(ymd(2025, 6, 10))
}

#[tokio::test]
async fn test_offline_import_persists_locally() {
    let (_temp_db, db_path) = create_test_db().unwrap();
    let api = api_with_remote(&db_path, None);

    let outcome = api.append(sample_inventory()).await.unwrap();
    assert_eq!(outcome.imported, 4);
    assert_eq!(outcome.total, 4);
    assert!(outcome.remote_warning.is_none());
    assert_eq!(api.sync().await.unwrap(), SyncOutcome::Offline);

    // 重新打开：本地镜像保持插入顺序
    let reopened = api_with_remote(&db_path, None);
    assert_eq!(reopened.load_local().await.unwrap(), 4);
    let names: Vec<String> = reopened
        .snapshot()
        .unwrap()
        .into_iter()
        .map(|m| m.nombre)
        .collect();
    assert_eq!(names, vec!["Amoxicilina", "Paracetamol", "Ibuprofeno", "Omeprazol"]);
}

#[tokio::test]
async fn test_stats_list_and_dashboard() {
    let (_temp_db, db_path) = create_test_db().unwrap();
    let api = api_with_remote(&db_path, None);
    api.append(sample_inventory()).await.unwrap();

    let stats = api.stats().await.unwrap();
    assert_eq!(stats.total_medicamentos, 4);
    assert_eq!(stats.total_unidades, 784);
    assert_eq!(stats.vencidos, 1);
    assert_eq!(stats.por_vencer, 1);

    let upcoming = api.list(StatusFilter::Upcoming, "").await.unwrap();
    assert_eq!(upcoming.len(), 1);
    assert_eq!(upcoming[0].nombre, "Paracetamol");

    let search = api.list(StatusFilter::All, "l-c").await.unwrap();
    assert_eq!(search.len(), 1);
    assert_eq!(search[0].nombre, "Ibuprofeno");

    let dashboard = api.dashboard().await.unwrap();
    assert_eq!(dashboard.top_stock[0].nombre, "Paracetamol");
    assert_eq!(dashboard.top_stock.len(), 4);
}

#[tokio::test]
async fn test_import_upserts_only_new_records_remotely() {
    let (_temp_db, db_path) = create_test_db().unwrap();
    let remote = Arc::new(MemoryRepository::default());
    let api = api_with_remote(&db_path, Some(remote.clone()));

    api.append(sample_inventory()).await.unwrap();
    remote.records.lock().unwrap().clear();

    let outcome = api
        .append(vec![medication("e", "Insulina", ymd(2026, 2, 1), 12)])
        .await
        .unwrap();

    assert_eq!(outcome.total, 5);
    assert_eq!(remote.len(), 1);
    assert_eq!(remote.upsert_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_remote_failure_on_import_is_a_warning() {
    let (_temp_db, db_path) = create_test_db().unwrap();
    let remote = Arc::new(FailingRepository { table_missing: false });
    let api = api_with_remote(&db_path, Some(remote));

    let outcome = api.append(sample_inventory()).await.unwrap();

    assert_eq!(outcome.total, 4);
    assert!(outcome.remote_warning.is_some());
    assert_eq!(api.sync_state().status, SyncStatus::Error);
    assert_eq!(api_with_remote(&db_path, None).load_local().await.unwrap(), 4);
}

#[tokio::test]
async fn test_local_write_failure_leaves_list_unchanged() {
    let (_temp_db, db_path) = create_test_db().unwrap();
    let api = api_with_remote(&db_path, None);
    api.append(sample_inventory()).await.unwrap();

    let other = farma_inventory::db::open_sqlite_connection(&db_path).unwrap();
    other.execute("DROP TABLE medications", []).unwrap();

    let result = api
        .append(vec![medication("e", "Insulina", ymd(2026, 2, 1), 12)])
        .await;

    assert!(matches!(result, Err(ApiError::Repository(_))));
    let names: Vec<String> = api.snapshot().unwrap().into_iter().map(|m| m.nombre).collect();
    assert_eq!(names, vec!["Amoxicilina", "Paracetamol", "Ibuprofeno", "Omeprazol"]);
}

#[tokio::test]
async fn test_duplicate_ids_are_rekeyed() {
    let (_temp_db, db_path) = create_test_db().unwrap();
    let api = api_with_remote(&db_path, None);

    let same = medication("med-1-100", "Insulina", ymd(2026, 2, 1), 12);
    api.append(vec![same.clone()]).await.unwrap();
    api.append(vec![same]).await.unwrap();

    let ids: Vec<String> = api.snapshot().unwrap().into_iter().map(|m| m.id).collect();
    assert_eq!(ids, vec!["med-1-100", "med-1-100-1"]);
}

#[tokio::test]
async fn test_sync_replaces_local_only_when_remote_has_records() {
    let (_temp_db, db_path) = create_test_db().unwrap();
    let remote = Arc::new(MemoryRepository::default());
    let api = api_with_remote(&db_path, Some(remote.clone()));
    api.append(sample_inventory()).await.unwrap();

    // 远端为空：保留本地
    remote.records.lock().unwrap().clear();
    assert_eq!(api.sync().await.unwrap(), SyncOutcome::RemoteEmpty);
    assert_eq!(api.snapshot().unwrap().len(), 4);

    // 远端有数据：整表替换
    remote
        .records
        .lock()
        .unwrap()
        .push(medication("z", "Heparina", ymd(2027, 1, 1), 3));
    assert_eq!(api.sync().await.unwrap(), SyncOutcome::Replaced(1));
    assert_eq!(api.snapshot().unwrap()[0].nombre, "Heparina");
    assert_eq!(api.sync_state().status, SyncStatus::Success);
}

#[tokio::test]
async fn test_sync_flags_missing_table() {
    let (_temp_db, db_path) = create_test_db().unwrap();
    let api = api_with_remote(&db_path, Some(Arc::new(FailingRepository { table_missing: true })));
    api.append(sample_inventory()).await.unwrap();

    let outcome = api.sync().await.unwrap();

    assert!(matches!(outcome, SyncOutcome::Failed { needs_setup: true, .. }));
    let state = api.sync_state();
    assert_eq!(state.status, SyncStatus::Error);
    assert!(state.needs_setup);
    assert_eq!(api.snapshot().unwrap().len(), 4);
}

#[tokio::test]
async fn test_clear_requires_password() {
    let (_temp_db, db_path) = create_test_db().unwrap();
    let remote = Arc::new(MemoryRepository::default());
    let api = api_with_remote(&db_path, Some(remote.clone()));
    api.append(sample_inventory()).await.unwrap();

    let result = api.clear("incorrecta").await;
    assert!(matches!(result, Err(ApiError::InvalidDeletePassword)));
    assert_eq!(api.snapshot().unwrap().len(), 4);
    assert_eq!(remote.delete_calls.load(Ordering::SeqCst), 0);

    let outcome = api.clear("farmaciahospitalaria").await.unwrap();
    assert_eq!(outcome.local_deleted, 4);
    assert_eq!(outcome.remote_deleted, Some(4));
    assert!(api.snapshot().unwrap().is_empty());
    assert_eq!(api_with_remote(&db_path, None).load_local().await.unwrap(), 0);
}

#[tokio::test]
async fn test_clear_uses_configured_password() {
    let (_temp_db, db_path) = create_test_db().unwrap();
    let (local, config) = open_stores(&db_path);
    config
        .set_config_value(config_keys::DELETE_PASSWORD, "otra-clave")
        .unwrap();
    let api = InventoryApi::new(local, None, config);
    api.append(sample_inventory()).await.unwrap();

    assert!(api.clear("farmaciahospitalaria").await.is_err());
    assert!(api.clear("otra-clave").await.is_ok());
}

#[tokio::test]
async fn test_remote_delete_failure_keeps_local_data() {
    let (_temp_db, db_path) = create_test_db().unwrap();
    let api = api_with_remote(&db_path, Some(Arc::new(FailingRepository { table_missing: false })));
    api.append(sample_inventory()).await.unwrap();

    let result = api.clear("farmaciahospitalaria").await;

    assert!(matches!(result, Err(ApiError::Repository(_))));
    assert_eq!(api.snapshot().unwrap().len(), 4);
    assert_eq!(api_with_remote(&db_path, None).load_local().await.unwrap(), 4);
}

#[tokio::test]
async fn test_report_and_export() {
    let (_temp_db, db_path) = create_test_db().unwrap();
    let api = api_with_remote(&db_path, None);
    api.append(sample_inventory()).await.unwrap();

    let document = api.report(StatusFilter::Expired).await.unwrap();
    assert!(document.bytes.starts_with(b"%PDF"));
    assert!(document.file_name.starts_with("FarmaINPER_Reporte_"));
    assert!(document.file_name.ends_with(".pdf"));

    let mut buffer = Vec::new();
    let rows = api.export_csv(StatusFilter::All, &mut buffer).await.unwrap();
    assert_eq!(rows, 4);
    let csv_text = String::from_utf8(buffer).unwrap();
    assert_eq!(csv_text.lines().count(), 5);
    assert!(csv_text.contains("Amoxicilina"));
}

#[tokio::test]
async fn test_analyze() {
    let (_temp_db, db_path) = create_test_db().unwrap();

    // 无 AI 服务
    let api = api_with_remote(&db_path, None);
    assert!(matches!(api.analyze().await, Err(ApiError::EmptyInventory)));
    api.append(sample_inventory()).await.unwrap();
    assert!(matches!(api.analyze().await, Err(ApiError::Ai(_))));

    // 有 AI 服务
    let insights = Arc::new(CannedInsights { seen: Mutex::new(0) });
    let api = api_with_remote(&db_path, None).with_insights(insights.clone());
    api.load_local().await.unwrap();

    let text = api.analyze().await.unwrap();
    assert!(text.contains("Paracetamol"));
    assert_eq!(*insights.seen.lock().unwrap(), 4);

    let document = api.analyze_report(&text).await.unwrap();
    assert!(document.bytes.starts_with(b"%PDF"));
    assert!(document.file_name.contains("_IA_Analisis_"));
}
