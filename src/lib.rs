// ==========================================
// FarmaINPER 医药库存系统 - 核心库
// ==========================================
// 技术栈: Rust + SQLite + PostgREST + Gemini
// 系统定位: 库存台账 + 效期风险看板
// ==========================================

// 初始化国际化系统
rust_i18n::i18n!("locales", fallback = "es");

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 导入层 - 表格文件
pub mod importer;

// 引擎层 - 效期分类/统计/筛选
pub mod engine;

// 数据仓储层 - 本地镜像 + 远程表
pub mod repository;

// 配置层 - 系统配置
pub mod config;

// 外部服务适配层 - AI / PDF
pub mod services;

// 数据库基础设施（连接初始化/PRAGMA 统一）
pub mod db;

// 日志系统
pub mod logging;

// 国际化
pub mod i18n;

// API 层 - 业务接口
pub mod api;

// 应用层 - CLI 集成
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

pub use domain::{
    ColumnMap, ColumnRole, ExpiryStatus, ImportReport, InventoryStats, Medication, StatusFilter,
    SyncStatus,
};

pub use engine::{DashboardSummary, ExpiryClassifier, InventoryFilter, StatsEngine};

pub use api::{ApiError, InventoryApi};

pub use importer::{MedicationImporter, MedicationImporterImpl};

pub use repository::{LocalMedicationStore, MedicationRepository, RemoteMedicationStore};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "FarmaINPER";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
