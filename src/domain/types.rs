// ==========================================
// FarmaINPER 医药库存系统 - 领域类型定义
// ==========================================
// 职责: 效期状态 / 列表筛选 / 同步状态 / 列角色
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 效期状态 (Expiry Status)
// ==========================================
// 序列化格式: SCREAMING_SNAKE_CASE
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExpiryStatus {
    Safe,    // 有效期充足（Vigente）
    Warning, // 临期（Próximo）
    Expired, // 已过期（Vencido）
}

impl fmt::Display for ExpiryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExpiryStatus::Safe => write!(f, "SAFE"),
            ExpiryStatus::Warning => write!(f, "WARNING"),
            ExpiryStatus::Expired => write!(f, "EXPIRED"),
        }
    }
}

impl ExpiryStatus {
    /// i18n 文案键（表格徽标）
    pub fn label_key(&self) -> &'static str {
        match self {
            ExpiryStatus::Safe => "status.safe",
            ExpiryStatus::Warning => "status.warning",
            ExpiryStatus::Expired => "status.expired",
        }
    }
}

// ==========================================
// 列表筛选 (Status Filter)
// ==========================================
// 看板卡片点击后下钻到库存表使用
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusFilter {
    #[default]
    All,
    Upcoming,
    Expired,
}

impl fmt::Display for StatusFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusFilter::All => write!(f, "all"),
            StatusFilter::Upcoming => write!(f, "upcoming"),
            StatusFilter::Expired => write!(f, "expired"),
        }
    }
}

impl StatusFilter {
    /// 从字符串解析（未知值返回 None）
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "all" | "todos" => Some(StatusFilter::All),
            "upcoming" | "proximos" | "próximos" => Some(StatusFilter::Upcoming),
            "expired" | "vencidos" => Some(StatusFilter::Expired),
            _ => None,
        }
    }

    /// 报告标题（i18n 键）
    pub fn report_title_key(&self) -> &'static str {
        match self {
            StatusFilter::All => "report.title_all",
            StatusFilter::Upcoming => "report.title_upcoming",
            StatusFilter::Expired => "report.title_expired",
        }
    }
}

// ==========================================
// 同步状态 (Sync Status)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SyncStatus {
    #[default]
    Idle,
    Syncing,
    Error,
    Success,
}

impl fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncStatus::Idle => write!(f, "IDLE"),
            SyncStatus::Syncing => write!(f, "SYNCING"),
            SyncStatus::Error => write!(f, "ERROR"),
            SyncStatus::Success => write!(f, "SUCCESS"),
        }
    }
}

// ==========================================
// 列角色 (Column Role)
// ==========================================
// 表头识别的五个目标字段，顺序即匹配优先级
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnRole {
    Clave,    // 编码
    Nombre,   // 品名
    Lote,     // 批号
    Fecha,    // 有效期
    Cantidad, // 数量
}

impl ColumnRole {
    pub const ALL: [ColumnRole; 5] = [
        ColumnRole::Clave,
        ColumnRole::Nombre,
        ColumnRole::Lote,
        ColumnRole::Fecha,
        ColumnRole::Cantidad,
    ];
}

impl fmt::Display for ColumnRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnRole::Clave => write!(f, "clave"),
            ColumnRole::Nombre => write!(f, "nombre"),
            ColumnRole::Lote => write!(f, "lote"),
            ColumnRole::Fecha => write!(f, "fecha"),
            ColumnRole::Cantidad => write!(f, "cantidad"),
        }
    }
}
