// ==========================================
// FarmaINPER 医药库存系统 - 应用状态
// ==========================================
// 职责: 管理应用级别的共享状态和API实例
// 装配: 数据库连接 → 配置 → 本地镜像 / 远端表 → 导入器 → API
// ==========================================

use std::sync::{Arc, Mutex};

use crate::api::InventoryApi;
use crate::config::{env_keys, ConfigManager, InventoryConfigReader};
use crate::importer::MedicationImporterImpl;
use crate::repository::{
    LocalMedicationStore, MedicationRepository, RemoteMedicationStore, RemoteStoreConfig,
};
use crate::services::ai_insights::GeminiClient;

/// 应用状态
///
/// 包含所有API实例和共享资源
pub struct AppState {
    /// 数据库路径
    pub db_path: String,

    /// 配置管理器（与本地镜像共用连接）
    pub config: Arc<ConfigManager>,

    /// 本地镜像
    pub local_store: Arc<LocalMedicationStore>,

    /// 表格导入器
    pub importer: Arc<MedicationImporterImpl<ConfigManager>>,

    /// 库存API
    pub inventory_api: Arc<InventoryApi>,
}

impl AppState {
    /// 创建新的AppState实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    ///
    /// # 说明
    /// 远端地址与密钥都存在时才启用远端表，否则为离线模式
    pub async fn new(db_path: String) -> Result<Self, String> {
        tracing::info!("初始化AppState，数据库路径: {}", db_path);

        let conn = crate::db::open_sqlite_connection(&db_path)
            .map_err(|e| format!("无法打开数据库: {}", e))?;
        let conn = Arc::new(Mutex::new(conn));

        let config = ConfigManager::from_connection(conn.clone())
            .map_err(|e| format!("配置管理器初始化失败: {}", e))?;
        let local_store = Arc::new(
            LocalMedicationStore::from_connection(conn)
                .map_err(|e| format!("本地镜像初始化失败: {}", e))?,
        );

        let remote = Self::build_remote(&config).await;
        let insights = GeminiClient::new(
            config.get_ai_api_key().await.unwrap_or_default(),
            config
                .get_ai_model()
                .await
                .unwrap_or_else(|_| crate::config::defaults::AI_MODEL.to_string()),
        );

        let config = Arc::new(config);
        let importer = Arc::new(MedicationImporterImpl::with_defaults((*config).clone()));
        let inventory_api = Arc::new(
            InventoryApi::new(local_store.clone(), remote, config.clone())
                .with_insights(Arc::new(insights)),
        );

        tracing::info!(online = inventory_api.is_online(), "AppState初始化成功");
        Ok(Self {
            db_path,
            config,
            local_store,
            importer,
            inventory_api,
        })
    }

    async fn build_remote(config: &ConfigManager) -> Option<Arc<dyn MedicationRepository>> {
        let base_url = config.get_remote_url().await.ok().flatten()?;
        let api_key = config.get_remote_key().await.ok().flatten()?;
        let remote_config = RemoteStoreConfig {
            base_url,
            api_key,
            page_size: config
                .get_fetch_page_size()
                .await
                .unwrap_or(crate::config::defaults::FETCH_PAGE_SIZE),
            chunk_size: config
                .get_upsert_chunk_size()
                .await
                .unwrap_or(crate::config::defaults::UPSERT_CHUNK_SIZE),
        };

        match RemoteMedicationStore::new(remote_config) {
            Ok(store) => Some(Arc::new(store)),
            Err(e) => {
                tracing::warn!("远端表初始化失败，使用离线模式: {}", e);
                None
            }
        }
    }
}

/// 获取默认数据库路径
///
/// 优先级: FARMA_INVENTORY_DB_PATH > 用户数据目录 > 当前目录
pub fn get_default_db_path() -> String {
    use std::path::PathBuf;

    if let Ok(path) = std::env::var(env_keys::DB_PATH) {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./farma_inventory.db");

    if let Some(data_dir) = dirs::data_dir() {
        // 开发环境使用独立目录，避免污染生产数据
        #[cfg(debug_assertions)]
        {
            path = data_dir.join("farma-inventory-dev");
        }

        #[cfg(not(debug_assertions))]
        {
            path = data_dir.join("farma-inventory");
        }

        std::fs::create_dir_all(&path).ok();
        path = path.join("farma_inventory.db");
    }

    path.to_string_lossy().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_default_db_path() {
        let path = get_default_db_path();
        assert!(!path.is_empty());
        assert!(path.ends_with(".db"));
    }

    #[tokio::test]
    async fn test_app_state_offline_without_remote_config() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("state.db").to_string_lossy().to_string();

        // 环境变量可能提供远端配置
        if std::env::var(env_keys::REMOTE_URL).is_ok() {
            return;
        }

        let state = AppState::new(db_path).await.unwrap();
        assert!(!state.inventory_api.is_online());
        assert_eq!(state.inventory_api.load_local().await.unwrap(), 0);
    }
}
