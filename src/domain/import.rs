// ==========================================
// FarmaINPER 医药库存系统 - 导入领域模型
// ==========================================
// 职责: 原始单元格 / 列映射 / 导入结果
// 生命周期: 仅在导入流程内（ImportReport 交给 API 层）
// ==========================================

use crate::domain::medication::Medication;
use crate::domain::types::ColumnRole;
use serde::{Deserialize, Serialize};
use std::time::Duration;

// ==========================================
// CellValue - 原始单元格
// ==========================================
// 用途: 文件解析产物，不预设表头位置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CellValue {
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
    DateSerial(f64), // Excel 序列日期（1900 纪元）
}

impl CellValue {
    /// 是否为空（空白文本视为空）
    pub fn is_empty(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// 单元格显示文本（已 TRIM）
    ///
    /// 整数值的数字不带小数（1010.0 → "1010"）
    pub fn display_text(&self) -> String {
        match self {
            CellValue::Empty => String::new(),
            CellValue::Text(s) => s.trim().to_string(),
            CellValue::Number(n) | CellValue::DateSerial(n) => format_number(*n),
            CellValue::Bool(b) => b.to_string(),
        }
    }
}

fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

/// 原始表格：每个元素为一行
pub type RawGrid = Vec<Vec<CellValue>>;

// ==========================================
// ColumnMap - 列映射
// ==========================================
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnMap {
    pub clave: Option<usize>,
    pub nombre: Option<usize>,
    pub lote: Option<usize>,
    pub fecha: Option<usize>,
    pub cantidad: Option<usize>,
}

impl ColumnMap {
    pub fn get(&self, role: ColumnRole) -> Option<usize> {
        match role {
            ColumnRole::Clave => self.clave,
            ColumnRole::Nombre => self.nombre,
            ColumnRole::Lote => self.lote,
            ColumnRole::Fecha => self.fecha,
            ColumnRole::Cantidad => self.cantidad,
        }
    }

    pub fn set(&mut self, role: ColumnRole, column: usize) {
        let slot = match role {
            ColumnRole::Clave => &mut self.clave,
            ColumnRole::Nombre => &mut self.nombre,
            ColumnRole::Lote => &mut self.lote,
            ColumnRole::Fecha => &mut self.fecha,
            ColumnRole::Cantidad => &mut self.cantidad,
        };
        *slot = Some(column);
    }

    /// 已识别的角色数
    pub fn recognized(&self) -> usize {
        ColumnRole::ALL
            .iter()
            .filter(|r| self.get(**r).is_some())
            .count()
    }
}

// ==========================================
// HeaderDetection - 表头识别结果
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderDetection {
    pub header_row: usize, // 表头所在行（0 起）
    pub score: usize,      // 命中的关键词集合数（0-5）
    pub columns: ColumnMap,
}

// ==========================================
// ImportReport - 导入结果
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportReport {
    pub batch_id: String,
    pub source: String,
    pub header: HeaderDetection,
    pub total_rows: usize,   // 表头之后的行数
    pub skipped_rows: usize, // 空行 + 编码/品名同时缺失
    pub medications: Vec<Medication>,
    pub elapsed_time: Duration,
}

impl ImportReport {
    pub fn imported(&self) -> usize {
        self.medications.len()
    }
}
