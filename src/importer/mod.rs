// ==========================================
// FarmaINPER 医药库存系统 - 导入层
// ==========================================
// 职责: 外部表格导入,生成 Medication 列表
// 支持: Excel (.xlsx/.xls/.xlsm/.ods), CSV
// ==========================================

// 模块声明
pub mod data_cleaner;
pub mod error;
pub mod field_mapper;
pub mod file_parser;
pub mod header_detector;
pub mod medication_importer_impl;
pub mod medication_importer_trait;

// 重导出核心类型
pub use data_cleaner::DataCleaner as DataCleanerImpl;
pub use error::{ImportError, ImportResult};
pub use field_mapper::FieldMapper as FieldMapperImpl;
pub use file_parser::{CsvParser, ExcelParser, UniversalFileParser};
pub use header_detector::{KeywordHeaderDetector, DEFAULT_HEADER_SCAN_ROWS};
pub use medication_importer_impl::MedicationImporterImpl;

// 重导出 Trait 接口
pub use medication_importer_trait::{
    DataCleaner, FieldMapper, FileParser, HeaderDetector, MedicationImporter,
};
