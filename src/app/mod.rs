// ==========================================
// FarmaINPER 医药库存系统 - 应用层
// ==========================================
// 职责: CLI 集成，连接终端与 API
// ==========================================

pub mod commands;
pub mod render;
pub mod state;

// 重导出
pub use state::{get_default_db_path, AppState};
