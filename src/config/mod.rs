// ==========================================
// FarmaINPER 医药库存系统 - 配置层
// ==========================================
// 职责: 系统配置管理,支持环境变量覆写
// 存储: config_kv 表
// ==========================================

pub mod config_manager;
pub mod inventory_config_trait;

// 重导出核心配置管理器
pub use config_manager::{config_keys, defaults, env_keys, ConfigManager};
pub use inventory_config_trait::{ConfigResult, InventoryConfigReader};
