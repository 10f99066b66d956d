// ==========================================
// FarmaINPER 医药库存系统 - 仪表盘聚合
// ==========================================
// 输出: 统计卡片 + 库存量前 5 + 有效期分布
// ==========================================

use crate::domain::medication::{InventoryStats, Medication};
use crate::domain::types::{ExpiryStatus, StatusFilter};
use crate::engine::expiry::ExpiryClassifier;
use crate::engine::stats::StatsEngine;
use serde::{Deserialize, Serialize};

/// 库存量排行条数
pub const TOP_STOCK_LIMIT: usize = 5;

/// 短名称最大字符数
const SHORT_NAME_CHARS: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopStockEntry {
    pub id: String,
    pub nombre: String,
    pub short_name: String,
    pub lote: String,
    pub cantidad: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreakdownSlice {
    pub status: ExpiryStatus,
    pub value: usize,
    /// 点击后进入的列表筛选
    pub drill_down: StatusFilter,
}

impl BreakdownSlice {
    /// 本地化标签键
    pub fn label_key(&self) -> &'static str {
        match self.status {
            ExpiryStatus::Expired => "dashboard.slice_expired",
            ExpiryStatus::Warning => "dashboard.slice_upcoming",
            ExpiryStatus::Safe => "dashboard.slice_valid",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardSummary {
    pub stats: InventoryStats,
    pub top_stock: Vec<TopStockEntry>,
    pub breakdown: Vec<BreakdownSlice>,
}

/// 名称超过 10 个字符时截断并追加 "..."
pub fn short_name(nombre: &str) -> String {
    if nombre.chars().count() > SHORT_NAME_CHARS {
        let prefix: String = nombre.chars().take(SHORT_NAME_CHARS).collect();
        format!("{}...", prefix)
    } else {
        nombre.to_string()
    }
}

impl DashboardSummary {
    pub fn build(medications: &[Medication], classifier: &ExpiryClassifier) -> Self {
        let stats = StatsEngine::compute(medications, classifier);
        Self {
            top_stock: Self::top_stock(medications),
            breakdown: Self::breakdown(&stats),
            stats,
        }
    }

    /// 数量降序前 5（同数量保持原顺序）
    pub fn top_stock(medications: &[Medication]) -> Vec<TopStockEntry> {
        let mut sorted: Vec<&Medication> = medications.iter().collect();
        sorted.sort_by(|a, b| b.cantidad.cmp(&a.cantidad));
        sorted
            .into_iter()
            .take(TOP_STOCK_LIMIT)
            .map(|m| TopStockEntry {
                id: m.id.clone(),
                nombre: m.nombre.clone(),
                short_name: short_name(&m.nombre),
                lote: m.lote.clone(),
                cantidad: m.cantidad,
            })
            .collect()
    }

    pub fn breakdown(stats: &InventoryStats) -> Vec<BreakdownSlice> {
        vec![
            BreakdownSlice {
                status: ExpiryStatus::Expired,
                value: stats.vencidos,
                drill_down: StatusFilter::Expired,
            },
            BreakdownSlice {
                status: ExpiryStatus::Warning,
                value: stats.por_vencer,
                drill_down: StatusFilter::Upcoming,
            },
            BreakdownSlice {
                status: ExpiryStatus::Safe,
                value: stats.vigentes(),
                drill_down: StatusFilter::All,
            },
        ]
    }
}
