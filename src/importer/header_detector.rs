// ==========================================
// FarmaINPER 医药库存系统 - 表头识别器实现
// ==========================================
// 阶段 1: 在未知格式的表格中定位表头行并建立列映射
// 方法: 五组关键词集合 + 子串命中计分
// ==========================================

use crate::domain::import::{CellValue, ColumnMap, HeaderDetection, RawGrid};
use crate::domain::types::ColumnRole;
use crate::importer::data_cleaner::normalize_token;
use crate::importer::medication_importer_trait::HeaderDetector;
use tracing::debug;

/// 默认扫描行数
pub const DEFAULT_HEADER_SCAN_ROWS: usize = 15;

/// 短关键词长度阈值（不享受前缀加分）
const SHORT_KEYWORD_LEN: usize = 2;

/// 表头以关键词开头时的加分
const PREFIX_BONUS: usize = 4;

fn default_keywords(role: ColumnRole) -> &'static [&'static str] {
    match role {
        ColumnRole::Clave => &["clave", "codigo", "id", "sku", "code", "no", "referencia", "ref"],
        ColumnRole::Nombre => &[
            "medicamento",
            "nombre",
            "producto",
            "descripcion",
            "item",
            "medicine",
            "articulo",
            "denominacion",
            "sustancia",
        ],
        ColumnRole::Lote => &["lote", "batch", "numlote", "serie", "number", "lot"],
        ColumnRole::Fecha => &[
            "caducidad",
            "vencimiento",
            "fecha",
            "expiry",
            "expiration",
            "vence",
            "cad",
            "venc",
        ],
        ColumnRole::Cantidad => &[
            "cantidad",
            "stock",
            "unidades",
            "qty",
            "count",
            "monto",
            "existencia",
            "disponible",
            "saldo",
            "total",
        ],
    }
}

// ==========================================
// KeywordHeaderDetector
// ==========================================
pub struct KeywordHeaderDetector {
    keywords: Vec<(ColumnRole, Vec<String>)>,
}

impl Default for KeywordHeaderDetector {
    fn default() -> Self {
        let keywords = ColumnRole::ALL
            .iter()
            .map(|role| {
                (
                    *role,
                    default_keywords(*role).iter().map(|k| k.to_string()).collect(),
                )
            })
            .collect();
        Self { keywords }
    }
}

impl KeywordHeaderDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// 为某个角色追加关键词（会做归一化）
    pub fn with_keywords(mut self, role: ColumnRole, extra: &[&str]) -> Self {
        if let Some((_, list)) = self.keywords.iter_mut().find(|(r, _)| *r == role) {
            list.extend(
                extra
                    .iter()
                    .map(|k| normalize_token(k))
                    .filter(|k| !k.is_empty()),
            );
        }
        self
    }

    fn keywords_for(&self, role: ColumnRole) -> &[String] {
        self.keywords
            .iter()
            .find(|(r, _)| *r == role)
            .map(|(_, list)| list.as_slice())
            .unwrap_or(&[])
    }

    fn normalize_row(row: &[CellValue]) -> Vec<String> {
        row.iter().map(|c| normalize_token(&c.display_text())).collect()
    }

    /// 行得分：命中的关键词集合数
    fn score_row(&self, normalized: &[String]) -> usize {
        ColumnRole::ALL
            .iter()
            .filter(|role| {
                self.keywords_for(**role)
                    .iter()
                    .any(|k| normalized.iter().any(|cell| cell.contains(k.as_str())))
            })
            .count()
    }

    /// 子串匹配得分（None = 无命中）
    fn match_score(&self, role: ColumnRole, header: &str) -> Option<usize> {
        self.keywords_for(role)
            .iter()
            .filter(|k| header.contains(k.as_str()))
            .map(|k| {
                let prefix = k.len() > SHORT_KEYWORD_LEN && header.starts_with(k.as_str());
                k.len() + if prefix { PREFIX_BONUS } else { 0 }
            })
            .max()
    }

    /// 在表头行上建立列映射
    ///
    /// # 规则
    /// 1. 精确匹配优先：表头与关键词完全相同
    /// 2. 其余角色做子串匹配：得分高者优先，同分按角色顺序、再按列顺序
    /// 3. 每列最多归属一个角色
    pub fn map_columns(&self, headers: &[String]) -> ColumnMap {
        let mut columns = ColumnMap::default();
        let mut claimed = vec![false; headers.len()];

        // 第一轮：精确匹配
        for role in ColumnRole::ALL {
            let keywords = self.keywords_for(role);
            if let Some(col) = headers
                .iter()
                .enumerate()
                .position(|(i, h)| !claimed[i] && keywords.iter().any(|k| k == h))
            {
                columns.set(role, col);
                claimed[col] = true;
            }
        }

        // 第二轮：子串匹配
        let mut candidates: Vec<(usize, ColumnRole, usize)> = Vec::new();
        for role in ColumnRole::ALL {
            if columns.get(role).is_some() {
                continue;
            }
            for (col, header) in headers.iter().enumerate() {
                if claimed[col] || header.is_empty() {
                    continue;
                }
                if let Some(score) = self.match_score(role, header) {
                    candidates.push((score, role, col));
                }
            }
        }
        candidates.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)).then(a.2.cmp(&b.2)));

        for (_, role, col) in candidates {
            if columns.get(role).is_none() && !claimed[col] {
                columns.set(role, col);
                claimed[col] = true;
            }
        }

        columns
    }
}

impl HeaderDetector for KeywordHeaderDetector {
    fn detect(&self, rows: &RawGrid, scan_rows: usize) -> HeaderDetection {
        let limit = rows.len().min(scan_rows.max(1));
        let full_score = ColumnRole::ALL.len();

        let mut header_row = 0;
        let mut best_score: Option<usize> = None;
        for (idx, row) in rows.iter().take(limit).enumerate() {
            let score = self.score_row(&Self::normalize_row(row));
            // 严格大于：同分保留更早的行
            if best_score.map_or(true, |best| score > best) {
                best_score = Some(score);
                header_row = idx;
            }
            if score == full_score {
                break;
            }
        }

        let columns = rows
            .get(header_row)
            .map(|row| self.map_columns(&Self::normalize_row(row)))
            .unwrap_or_default();

        let score = best_score.unwrap_or(0);
        debug!(header_row, score, recognized = columns.recognized(), "表头识别完成");

        HeaderDetection {
            header_row,
            score,
            columns,
        }
    }
}
