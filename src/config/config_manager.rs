// ==========================================
// FarmaINPER 医药库存系统 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value + scope)
// 优先级: 环境变量 > config_kv > 默认值
// ==========================================

use crate::config::inventory_config_trait::{ConfigResult, InventoryConfigReader};
use crate::db::open_sqlite_connection;
use async_trait::async_trait;
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex};
use tracing::warn;

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
// 克隆共享同一连接
#[derive(Clone)]
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> ConfigResult<Self> {
        let conn = open_sqlite_connection(db_path)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 说明：会对传入连接再次应用统一 PRAGMA 与建表（幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> ConfigResult<Self> {
        {
            let conn_guard = conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
            crate::db::configure_sqlite_connection(&conn_guard)?;
            crate::db::init_schema(&conn_guard)?;
        }

        Ok(Self { conn })
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    fn get_config_value(&self, key: &str) -> ConfigResult<Option<String>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let result = conn.query_row(
            "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
            params![key],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(Box::new(e)),
        }
    }

    /// 读取 global scope 的配置值（公开方法，供 CLI 复用）
    pub fn get_global_config_value(&self, key: &str) -> ConfigResult<Option<String>> {
        self.get_config_value(key)
    }

    /// 从 config_kv 表读取配置值，带默认值
    fn get_config_or_default(&self, key: &str, default: &str) -> ConfigResult<String> {
        Ok(self.get_config_value(key)?.unwrap_or_else(|| default.to_string()))
    }

    /// 环境变量优先，其次 config_kv；空串视为未配置
    fn get_with_env(&self, env_keys: &[&str], key: &str) -> ConfigResult<Option<String>> {
        for env_key in env_keys {
            if let Ok(value) = std::env::var(env_key) {
                if !value.trim().is_empty() {
                    return Ok(Some(value.trim().to_string()));
                }
            }
        }
        Ok(self
            .get_config_value(key)?
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty()))
    }

    /// 解析正整数配置；格式错误或为 0 时回退默认值
    fn get_positive<T>(&self, key: &str, default: T) -> ConfigResult<T>
    where
        T: std::str::FromStr + PartialOrd + Default + Copy + std::fmt::Display,
    {
        let raw = self.get_config_or_default(key, &default.to_string())?;
        match raw.trim().parse::<T>() {
            Ok(v) if v > T::default() => Ok(v),
            _ => {
                warn!(config_key = key, raw_value = %raw, "配置值无效，使用默认值");
                Ok(default)
            }
        }
    }

    /// 写入配置（UPSERT）
    pub fn set_config_value(&self, key: &str, value: &str) -> ConfigResult<()> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value, updated_at)
             VALUES ('global', ?1, ?2, datetime('now'))
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2, updated_at = datetime('now')",
            params![key, value],
        )?;
        Ok(())
    }

    /// 删除配置（恢复默认值）
    pub fn remove_config_value(&self, key: &str) -> ConfigResult<bool> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
        let affected = conn.execute(
            "DELETE FROM config_kv WHERE scope_id = 'global' AND key = ?1",
            params![key],
        )?;
        Ok(affected > 0)
    }

    /// 列出所有已写入的 global 配置（按 key 排序）
    pub fn list_configs(&self) -> ConfigResult<Vec<(String, String)>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let mut stmt =
            conn.prepare("SELECT key, value FROM config_kv WHERE scope_id = 'global' ORDER BY key")?;
        let rows = stmt.query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?;

        let mut configs = Vec::new();
        for row in rows {
            configs.push(row?);
        }
        Ok(configs)
    }
}

// ==========================================
// InventoryConfigReader Trait 实现
// ==========================================
#[async_trait]
impl InventoryConfigReader for ConfigManager {
    async fn get_upcoming_window_months(&self) -> ConfigResult<u32> {
        self.get_positive(config_keys::UPCOMING_WINDOW_MONTHS, defaults::UPCOMING_WINDOW_MONTHS)
    }

    async fn get_header_scan_rows(&self) -> ConfigResult<usize> {
        self.get_positive(config_keys::HEADER_SCAN_ROWS, defaults::HEADER_SCAN_ROWS)
    }

    async fn get_upsert_chunk_size(&self) -> ConfigResult<usize> {
        self.get_positive(config_keys::UPSERT_CHUNK_SIZE, defaults::UPSERT_CHUNK_SIZE)
    }

    async fn get_fetch_page_size(&self) -> ConfigResult<usize> {
        self.get_positive(config_keys::FETCH_PAGE_SIZE, defaults::FETCH_PAGE_SIZE)
    }

    async fn get_remote_url(&self) -> ConfigResult<Option<String>> {
        self.get_with_env(&[env_keys::REMOTE_URL], config_keys::REMOTE_URL)
    }

    async fn get_remote_key(&self) -> ConfigResult<Option<String>> {
        self.get_with_env(&[env_keys::REMOTE_KEY], config_keys::REMOTE_KEY)
    }

    async fn get_ai_model(&self) -> ConfigResult<String> {
        let value = self.get_config_or_default(config_keys::AI_MODEL, defaults::AI_MODEL)?;
        if value.trim().is_empty() {
            Ok(defaults::AI_MODEL.to_string())
        } else {
            Ok(value.trim().to_string())
        }
    }

    async fn get_ai_api_key(&self) -> ConfigResult<Option<String>> {
        self.get_with_env(&[env_keys::API_KEY, env_keys::GEMINI_API_KEY], config_keys::AI_API_KEY)
    }

    async fn get_delete_password(&self) -> ConfigResult<String> {
        self.get_config_or_default(config_keys::DELETE_PASSWORD, defaults::DELETE_PASSWORD)
    }

    async fn get_report_brand(&self) -> ConfigResult<String> {
        let value = self.get_config_or_default(config_keys::REPORT_BRAND, defaults::REPORT_BRAND)?;
        if value.trim().is_empty() {
            Ok(defaults::REPORT_BRAND.to_string())
        } else {
            Ok(value.trim().to_string())
        }
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 有效期
    pub const UPCOMING_WINDOW_MONTHS: &str = "upcoming_window_months";

    // 导入
    pub const HEADER_SCAN_ROWS: &str = "header_scan_rows";

    // 远端同步
    pub const REMOTE_URL: &str = "remote_url";
    pub const REMOTE_KEY: &str = "remote_anon_key";
    pub const UPSERT_CHUNK_SIZE: &str = "remote_upsert_chunk_size";
    pub const FETCH_PAGE_SIZE: &str = "remote_page_size";

    // AI
    pub const AI_MODEL: &str = "ai_model";
    pub const AI_API_KEY: &str = "ai_api_key";

    // 安全与报表
    pub const DELETE_PASSWORD: &str = "delete_password";
    pub const REPORT_BRAND: &str = "report_brand";

    /// 所有已知配置键（CLI 校验用）
    pub const ALL: [&str; 10] = [
        UPCOMING_WINDOW_MONTHS,
        HEADER_SCAN_ROWS,
        REMOTE_URL,
        REMOTE_KEY,
        UPSERT_CHUNK_SIZE,
        FETCH_PAGE_SIZE,
        AI_MODEL,
        AI_API_KEY,
        DELETE_PASSWORD,
        REPORT_BRAND,
    ];
}

// ==========================================
// 默认值
// ==========================================
pub mod defaults {
    pub const UPCOMING_WINDOW_MONTHS: u32 = 3;
    pub const HEADER_SCAN_ROWS: usize = 15;
    pub const UPSERT_CHUNK_SIZE: usize = 500;
    pub const FETCH_PAGE_SIZE: usize = 1000;
    pub const AI_MODEL: &str = "gemini-3-flash-preview";
    pub const DELETE_PASSWORD: &str = "farmaciahospitalaria";
    pub const REPORT_BRAND: &str = "FarmaINPER";
}

// ==========================================
// 环境变量
// ==========================================
pub mod env_keys {
    pub const DB_PATH: &str = "FARMA_INVENTORY_DB_PATH";
    pub const REMOTE_URL: &str = "FARMA_REMOTE_URL";
    pub const REMOTE_KEY: &str = "FARMA_REMOTE_KEY";
    pub const API_KEY: &str = "API_KEY";
    pub const GEMINI_API_KEY: &str = "GEMINI_API_KEY";
}
