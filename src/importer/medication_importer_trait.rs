// ==========================================
// FarmaINPER 医药库存系统 - 药品导入 Trait
// ==========================================
// 职责: 定义导入管道各阶段接口（不包含实现）
// 管道: 文件解析 → 表头识别 → 行映射 → 清洗/归一化
// ==========================================

use crate::domain::import::{CellValue, ColumnMap, HeaderDetection, ImportReport, RawGrid};
use crate::domain::medication::Medication;
use crate::importer::error::ImportResult;
use async_trait::async_trait;
use chrono::NaiveDate;
use std::path::Path;

// ==========================================
// MedicationImporter Trait
// ==========================================
// 用途: 药品导入主接口
// 实现者: MedicationImporterImpl
#[async_trait]
pub trait MedicationImporter: Send + Sync {
    /// 从文件导入（按扩展名选择解析器）
    ///
    /// # 返回
    /// - Ok(ImportReport): 导入结果（表头位置、列映射、药品列表）
    /// - Err: 文件读取错误、无可识别列等
    async fn import_file<P: AsRef<Path> + Send>(&self, file_path: P) -> ImportResult<ImportReport>;

    /// 从已解析的原始表格导入
    ///
    /// # 参数
    /// - rows: 原始表格（不预设表头位置）
    /// - source: 来源描述（文件名等，仅用于日志与报告）
    async fn import_rows(&self, rows: RawGrid, source: &str) -> ImportResult<ImportReport>;

    /// 批量导入多个文件（并发执行）
    ///
    /// # 说明
    /// - 每个文件的导入是独立的，互不影响
    /// - 如果某个文件导入失败，不影响其他文件
    async fn batch_import<P: AsRef<Path> + Send + Sync>(
        &self,
        file_paths: Vec<P>,
    ) -> Vec<ImportResult<ImportReport>>;
}

// ==========================================
// FileParser Trait
// ==========================================
// 用途: 文件解析接口（阶段 0）
// 实现者: CsvParser, ExcelParser
pub trait FileParser: Send + Sync {
    /// 解析文件为原始表格（首行不视为表头）
    fn parse_to_grid(&self, file_path: &Path) -> ImportResult<RawGrid>;
}

// ==========================================
// HeaderDetector Trait
// ==========================================
// 用途: 表头识别接口（阶段 1）
// 实现者: KeywordHeaderDetector
pub trait HeaderDetector: Send + Sync {
    /// 在前 scan_rows 行中选出表头行并建立列映射
    ///
    /// # 规则
    /// - 行得分 = 命中的关键词集合数（0-5）
    /// - 取最高分，同分取最早行，满分提前结束
    fn detect(&self, rows: &RawGrid, scan_rows: usize) -> HeaderDetection;
}

// ==========================================
// DataCleaner Trait
// ==========================================
// 用途: 单元格清洗与归一化接口（阶段 2）
// 实现者: DataCleanerImpl
pub trait DataCleaner: Send + Sync {
    /// 文本字段（TRIM，空值 → None）
    fn clean_text(&self, cell: &CellValue) -> Option<String>;

    /// 有效期（Excel 序列日期 / 文本日期；失败 → 占位日期）
    fn parse_expiry(&self, cell: &CellValue) -> NaiveDate;

    /// 数量（四舍五入为整数；失败 → 0）
    fn parse_quantity(&self, cell: &CellValue) -> i64;
}

// ==========================================
// FieldMapper Trait
// ==========================================
// 用途: 行映射接口（阶段 3）
// 实现者: FieldMapperImpl
pub trait FieldMapper: Send + Sync {
    /// 将一行映射为 Medication
    ///
    /// # 参数
    /// - row: 行单元格
    /// - row_index: 源表行号（0 起，用于生成ID）
    /// - columns: 列映射
    /// - cleaner: 清洗器
    /// - millis: 导入时刻（Unix 毫秒）
    ///
    /// # 返回
    /// - Some(Medication): 映射成功
    /// - None: 编码与品名同时缺失（丢弃）
    fn map_row(
        &self,
        row: &[CellValue],
        row_index: usize,
        columns: &ColumnMap,
        cleaner: &dyn DataCleaner,
        millis: i64,
    ) -> Option<Medication>;
}
