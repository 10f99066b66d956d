// ==========================================
// FarmaINPER 医药库存系统 - 数据清洗器实现
// ==========================================
// 职责: TRIM / NULL 标准化 / 日期归一化 / 数量取整
// ==========================================

use crate::domain::import::CellValue;
use crate::domain::medication::missing_expiry;
use crate::importer::medication_importer_trait::DataCleaner as DataCleanerTrait;
use chrono::{Duration, NaiveDate};

/// Excel 1900 纪元基准日（序列号 0 对应的日期，已含 1900-02-29 偏移）
fn excel_epoch() -> NaiveDate {
    NaiveDate::from_ymd_opt(1899, 12, 30).unwrap_or(NaiveDate::MIN)
}

/// 序列号上限（9999-12-31）
const MAX_EXCEL_SERIAL: f64 = 2_958_465.0;

/// 表头/关键词归一化
///
/// 小写 → 去重音（á→a, ñ→n ...）→ 仅保留 [a-z0-9]
pub fn normalize_token(value: &str) -> String {
    value
        .chars()
        .flat_map(|c| c.to_lowercase())
        .map(fold_diacritic)
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        .collect()
}

fn fold_diacritic(c: char) -> char {
    match c {
        'á' | 'à' | 'ä' | 'â' | 'ã' | 'å' => 'a',
        'é' | 'è' | 'ë' | 'ê' => 'e',
        'í' | 'ì' | 'ï' | 'î' => 'i',
        'ó' | 'ò' | 'ö' | 'ô' | 'õ' => 'o',
        'ú' | 'ù' | 'ü' | 'û' => 'u',
        'ñ' => 'n',
        'ç' => 'c',
        other => other,
    }
}

/// Excel 序列日期 → 日历日期
///
/// # 规则
/// - date = 1899-12-30 + floor(serial) 天
/// - serial < 1 或超过 9999-12-31 → None
pub fn excel_serial_to_date(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || serial < 1.0 || serial > MAX_EXCEL_SERIAL {
        return None;
    }
    excel_epoch().checked_add_signed(Duration::days(serial.floor() as i64))
}

/// 四舍五入（0.5 向上取整，与表格软件一致）
pub fn round_half_up(value: f64) -> i64 {
    if !value.is_finite() {
        return 0;
    }
    // 直接 value + 0.5 会在 0.49999999999999994 处进位
    let floor = value.floor();
    let rounded = if value - floor >= 0.5 { floor + 1.0 } else { floor };
    if rounded >= i64::MAX as f64 {
        i64::MAX
    } else if rounded <= i64::MIN as f64 {
        i64::MIN
    } else {
        rounded as i64
    }
}

/// 文本日期解析
///
/// 支持: YYYY-MM-DD[ 时间] / YYYY/MM/DD / YYYYMMDD / DD/MM/YYYY / DD-MM-YYYY /
/// DD.MM.YYYY / MM/YYYY（取当月最后一天）/ 纯数字（按序列日期）
pub fn parse_date_text(value: &str) -> Option<NaiveDate> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }

    // 去掉时间部分（2025-01-20T00:00:00 / 20/01/2025 08:00）
    let date_part = trimmed
        .split(|c: char| c == 'T' || c.is_whitespace())
        .next()
        .unwrap_or(trimmed);

    const FORMATS: [&str; 6] = ["%Y-%m-%d", "%Y/%m/%d", "%d/%m/%Y", "%d-%m-%Y", "%d.%m.%Y", "%Y%m%d"];
    for fmt in FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(date_part, fmt) {
            return Some(date);
        }
    }

    if let Some(date) = parse_month_year(date_part) {
        return Some(date);
    }

    date_part
        .parse::<f64>()
        .ok()
        .and_then(excel_serial_to_date)
}

/// MM/YYYY 或 MM-YYYY → 当月最后一天
fn parse_month_year(value: &str) -> Option<NaiveDate> {
    let (month, year) = value.split_once(['/', '-'])?;
    if year.len() != 4 {
        return None;
    }
    let month: u32 = month.parse().ok()?;
    let year: i32 = year.parse().ok()?;
    // 月份非法时直接返回 None
    NaiveDate::from_ymd_opt(year, month, 1)?;
    let next_month = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    next_month.pred_opt()
}

pub struct DataCleaner;

impl DataCleanerTrait for DataCleaner {
    fn clean_text(&self, cell: &CellValue) -> Option<String> {
        let text = cell.display_text();
        if text.is_empty() {
            None
        } else {
            Some(text)
        }
    }

    fn parse_expiry(&self, cell: &CellValue) -> NaiveDate {
        let parsed = match cell {
            CellValue::Empty | CellValue::Bool(_) => None,
            CellValue::Number(n) | CellValue::DateSerial(n) => excel_serial_to_date(*n),
            CellValue::Text(s) => parse_date_text(s),
        };
        parsed.unwrap_or_else(missing_expiry)
    }

    fn parse_quantity(&self, cell: &CellValue) -> i64 {
        match cell {
            CellValue::Number(n) | CellValue::DateSerial(n) => round_half_up(*n),
            CellValue::Text(s) => s.trim().parse::<f64>().map(round_half_up).unwrap_or(0),
            CellValue::Empty | CellValue::Bool(_) => 0,
        }
    }
}
