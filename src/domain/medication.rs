// ==========================================
// FarmaINPER 医药库存系统 - 药品领域模型
// ==========================================
// 职责: 库存记录 + 汇总统计
// 红线: 数量恒为整数；编码与品名不可同时缺失
// ==========================================

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// 编码/批号缺失时的占位值
pub const MISSING_TEXT: &str = "N/A";

/// 品名缺失时的占位值
pub const MISSING_NAME: &str = "Sin nombre";

/// 有效期缺失或无法解析时的占位日期
pub fn missing_expiry() -> NaiveDate {
    NaiveDate::from_ymd_opt(2099, 1, 1).unwrap_or(NaiveDate::MAX)
}

// ==========================================
// Medication - 库存记录（一个批次一行）
// ==========================================
// 对齐: medications 表 (id/clave/nombre/lote/fecha_caducidad/cantidad)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Medication {
    pub id: String,                  // 记录ID（med-{行号}-{毫秒时间戳}）
    pub clave: String,               // 药品编码
    pub nombre: String,              // 药品名称
    pub lote: String,                // 批号
    pub fecha_caducidad: NaiveDate,  // 有效期（YYYY-MM-DD）
    pub cantidad: i64,               // 库存数量（单位）
}

impl Medication {
    /// 生成导入记录ID
    ///
    /// # 参数
    /// - row_index: 源表行号（0 起）
    /// - millis: 导入时刻（Unix 毫秒）
    pub fn import_id(row_index: usize, millis: i64) -> String {
        format!("med-{}-{}", row_index, millis)
    }

    /// 是否为占位有效期
    pub fn has_missing_expiry(&self) -> bool {
        self.fecha_caducidad == missing_expiry()
    }
}

// ==========================================
// InventoryStats - 库存汇总
// ==========================================
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryStats {
    pub total_medicamentos: usize, // 记录总数
    pub total_unidades: i64,       // 单位总数
    pub por_vencer: usize,         // 临期（窗口内）
    pub vencidos: usize,           // 已过期
}

impl InventoryStats {
    /// 有效期充足的记录数（不会小于 0）
    pub fn vigentes(&self) -> usize {
        self.total_medicamentos
            .saturating_sub(self.vencidos)
            .saturating_sub(self.por_vencer)
    }
}
