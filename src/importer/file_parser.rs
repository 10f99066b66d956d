// ==========================================
// FarmaINPER 医药库存系统 - 文件解析器实现
// ==========================================
// 阶段 0: 文件读取与解析
// 支持: Excel (.xlsx/.xls/.xlsm/.ods) / CSV (.csv)
// 注意: 输出原始表格，表头位置由 HeaderDetector 判定
// ==========================================

use crate::domain::import::{CellValue, RawGrid};
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::medication_importer_trait::FileParser;
use calamine::{open_workbook_auto, Data, Reader};
use csv::ReaderBuilder;
use std::fs::File;
use std::path::Path;
use tracing::debug;

const EXCEL_EXTENSIONS: [&str; 4] = ["xlsx", "xls", "xlsm", "ods"];

fn extension_of(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase()
}

fn ensure_exists(path: &Path) -> ImportResult<()> {
    if !path.exists() {
        return Err(ImportError::FileNotFound(path.display().to_string()));
    }
    Ok(())
}

// ==========================================
// CSV Parser 实现
// ==========================================
pub struct CsvParser;

impl FileParser for CsvParser {
    fn parse_to_grid(&self, file_path: &Path) -> ImportResult<RawGrid> {
        ensure_exists(file_path)?;

        let ext = extension_of(file_path);
        if ext != "csv" {
            return Err(ImportError::UnsupportedFormat(ext));
        }

        let file = File::open(file_path)?;
        let mut reader = ReaderBuilder::new()
            .has_headers(false) // 表头位置未知
            .flexible(true) // 允许行长度不一致
            .from_reader(file);

        let mut rows = Vec::new();
        for result in reader.byte_records() {
            let record = result?;
            // 兼容 Latin-1 导出：非法 UTF-8 按 lossy 处理
            let row: Vec<CellValue> = record
                .iter()
                .map(|raw| {
                    let text = String::from_utf8_lossy(raw);
                    let text = text.trim_start_matches('\u{feff}').trim();
                    if text.is_empty() {
                        CellValue::Empty
                    } else {
                        CellValue::Text(text.to_string())
                    }
                })
                .collect();
            rows.push(row);
        }

        debug!(rows = rows.len(), file = %file_path.display(), "CSV 解析完成");
        Ok(rows)
    }
}

// ==========================================
// Excel Parser 实现
// ==========================================
pub struct ExcelParser;

impl ExcelParser {
    fn convert_cell(cell: &Data) -> CellValue {
        match cell {
            Data::Empty => CellValue::Empty,
            Data::String(s) => {
                if s.trim().is_empty() {
                    CellValue::Empty
                } else {
                    CellValue::Text(s.trim().to_string())
                }
            }
            Data::Float(f) => CellValue::Number(*f),
            Data::Int(i) => CellValue::Number(*i as f64),
            Data::Bool(b) => CellValue::Bool(*b),
            Data::DateTime(dt) => CellValue::DateSerial(dt.as_f64()),
            Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::Text(s.clone()),
            Data::Error(_) => CellValue::Empty,
        }
    }
}

impl FileParser for ExcelParser {
    fn parse_to_grid(&self, file_path: &Path) -> ImportResult<RawGrid> {
        ensure_exists(file_path)?;

        let ext = extension_of(file_path);
        if !EXCEL_EXTENSIONS.contains(&ext.as_str()) {
            return Err(ImportError::UnsupportedFormat(ext));
        }

        let mut workbook = open_workbook_auto(file_path)?;

        // 只读取第一个 sheet
        let sheet_name = workbook
            .sheet_names()
            .first()
            .cloned()
            .ok_or_else(|| ImportError::ExcelParseError("Excel 文件无工作表".to_string()))?;

        let range = workbook
            .worksheet_range(&sheet_name)
            .map_err(|e| ImportError::ExcelParseError(e.to_string()))?;

        let rows: RawGrid = range
            .rows()
            .map(|row| row.iter().map(Self::convert_cell).collect())
            .collect();

        debug!(rows = rows.len(), sheet = %sheet_name, "Excel 解析完成");
        Ok(rows)
    }
}

// ==========================================
// 通用文件解析器（根据扩展名自动选择）
// ==========================================
pub struct UniversalFileParser;

impl FileParser for UniversalFileParser {
    fn parse_to_grid(&self, file_path: &Path) -> ImportResult<RawGrid> {
        let ext = extension_of(file_path);
        match ext.as_str() {
            "csv" => CsvParser.parse_to_grid(file_path),
            e if EXCEL_EXTENSIONS.contains(&e) => ExcelParser.parse_to_grid(file_path),
            _ => {
                ensure_exists(file_path)?;
                Err(ImportError::UnsupportedFormat(ext))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::Builder;

    fn temp_csv(lines: &[&str]) -> tempfile::NamedTempFile {
        let mut temp_file = Builder::new().suffix(".csv").tempfile().unwrap();
        for line in lines {
            writeln!(temp_file, "{}", line).unwrap();
        }
        temp_file
    }

    #[test]
    fn test_csv_parser_keeps_title_rows() {
        let temp_file = temp_csv(&[
            "Inventario Farmacia,,",
            "Clave,Nombre,Cantidad",
            "010.1,Paracetamol,12",
        ]);

        let rows = CsvParser.parse_to_grid(temp_file.path()).unwrap();

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0][0], CellValue::Text("Inventario Farmacia".to_string()));
        assert_eq!(rows[0][1], CellValue::Empty);
        assert_eq!(rows[2][2], CellValue::Text("12".to_string()));
    }

    #[test]
    fn test_csv_parser_strips_bom() {
        let temp_file = temp_csv(&["\u{feff}Clave,Nombre", "A1,Ibuprofeno"]);
        let rows = CsvParser.parse_to_grid(temp_file.path()).unwrap();
        assert_eq!(rows[0][0], CellValue::Text("Clave".to_string()));
    }

    #[test]
    fn test_csv_parser_file_not_found() {
        let result = CsvParser.parse_to_grid(Path::new("non_existent.csv"));
        assert!(matches!(result, Err(ImportError::FileNotFound(_))));
    }

    #[test]
    fn test_universal_parser_rejects_unknown_extension() {
        let temp_file = Builder::new().suffix(".txt").tempfile().unwrap();
        let result = UniversalFileParser.parse_to_grid(temp_file.path());
        assert!(matches!(result, Err(ImportError::UnsupportedFormat(_))));
    }

    #[test]
    fn test_convert_excel_cells() {
        assert_eq!(ExcelParser::convert_cell(&Data::Int(5)), CellValue::Number(5.0));
        assert_eq!(
            ExcelParser::convert_cell(&Data::String("  ".to_string())),
            CellValue::Empty
        );
        assert_eq!(ExcelParser::convert_cell(&Data::Bool(true)), CellValue::Bool(true));
    }
}
