// ==========================================
// FarmaINPER 医药库存系统 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod import;
pub mod medication;
pub mod types;

// 重导出核心类型
pub use import::{CellValue, ColumnMap, HeaderDetection, ImportReport, RawGrid};
pub use medication::{missing_expiry, InventoryStats, Medication, MISSING_NAME, MISSING_TEXT};
pub use types::{ColumnRole, ExpiryStatus, StatusFilter, SyncStatus};
