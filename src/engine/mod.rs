// ==========================================
// FarmaINPER 医药库存系统 - 引擎层
// ==========================================
// 职责: 有效期判定 / 统计 / 筛选 / 仪表盘聚合
// 红线: Engine 不拼 SQL, 不做 IO
// ==========================================

pub mod dashboard;
pub mod expiry;
pub mod filter;
pub mod stats;

// 重导出核心引擎
pub use dashboard::{short_name, BreakdownSlice, DashboardSummary, TopStockEntry};
pub use expiry::{upcoming_limit, ExpiryClassifier};
pub use filter::InventoryFilter;
pub use stats::StatsEngine;
