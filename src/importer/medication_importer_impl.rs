// ==========================================
// FarmaINPER 医药库存系统 - 药品导入器实现
// ==========================================
// 职责: 整合导入流程，从文件到 Medication 列表
// 流程: 解析 → 表头识别 → 行映射/清洗 → 结果汇总
// 注意: 本层不落库，持久化由 InventoryApi 负责
// ==========================================

use crate::config::InventoryConfigReader;
use crate::domain::import::{ImportReport, RawGrid};
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::header_detector::DEFAULT_HEADER_SCAN_ROWS;
use crate::importer::medication_importer_trait::{
    DataCleaner, FieldMapper, FileParser, HeaderDetector, MedicationImporter,
};
use chrono::Utc;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

// ==========================================
// MedicationImporterImpl - 药品导入器实现
// ==========================================
pub struct MedicationImporterImpl<C>
where
    C: InventoryConfigReader,
{
    // 配置读取器
    config: C,

    // 导入组件
    file_parser: Box<dyn FileParser>,
    header_detector: Box<dyn HeaderDetector>,
    field_mapper: Box<dyn FieldMapper>,
    data_cleaner: Box<dyn DataCleaner>,
}

impl<C> MedicationImporterImpl<C>
where
    C: InventoryConfigReader,
{
    /// 创建新的 MedicationImporter 实例
    ///
    /// # 参数
    /// - config: 配置读取器
    /// - file_parser: 文件解析器
    /// - header_detector: 表头识别器
    /// - field_mapper: 字段映射器
    /// - data_cleaner: 数据清洗器
    pub fn new(
        config: C,
        file_parser: Box<dyn FileParser>,
        header_detector: Box<dyn HeaderDetector>,
        field_mapper: Box<dyn FieldMapper>,
        data_cleaner: Box<dyn DataCleaner>,
    ) -> Self {
        Self {
            config,
            file_parser,
            header_detector,
            field_mapper,
            data_cleaner,
        }
    }

    /// 使用默认组件创建（通用解析器 + 关键词表头识别）
    pub fn with_defaults(config: C) -> Self {
        Self::new(
            config,
            Box::new(crate::importer::UniversalFileParser),
            Box::new(crate::importer::KeywordHeaderDetector::new()),
            Box::new(crate::importer::FieldMapperImpl),
            Box::new(crate::importer::DataCleanerImpl),
        )
    }

    async fn scan_rows(&self) -> usize {
        match self.config.get_header_scan_rows().await {
            Ok(rows) => rows,
            Err(e) => {
                warn!(error = %e, "读取表头扫描行数失败，使用默认值");
                DEFAULT_HEADER_SCAN_ROWS
            }
        }
    }
}

#[async_trait::async_trait]
impl<C> MedicationImporter for MedicationImporterImpl<C>
where
    C: InventoryConfigReader + Send + Sync,
{
    /// 从文件导入药品数据
    ///
    /// # 参数
    /// - file_path: 表格文件路径（.xlsx, .xls, .csv ...）
    #[instrument(skip(self, file_path))]
    async fn import_file<P: AsRef<Path> + Send>(&self, file_path: P) -> ImportResult<ImportReport> {
        let path = file_path.as_ref();
        let source = path.display().to_string();

        // === 步骤 1: 解析文件 ===
        debug!(file = %source, "步骤 1: 解析文件");
        let rows = self.file_parser.parse_to_grid(path).map_err(|e| {
            error!(file = %source, error = %e, "文件解析失败");
            e
        })?;

        self.import_rows(rows, &source).await
    }

    #[instrument(skip(self, rows), fields(batch_id))]
    async fn import_rows(&self, rows: RawGrid, source: &str) -> ImportResult<ImportReport> {
        let start_time = Instant::now();
        let batch_id = Uuid::new_v4().to_string();
        tracing::Span::current().record("batch_id", batch_id.as_str());
        let millis = Utc::now().timestamp_millis();

        info!(batch_id = %batch_id, source = %source, rows = rows.len(), "开始导入药品数据");

        if rows.iter().all(|row| row.iter().all(|c| c.is_empty())) {
            warn!(source = %source, "文件无数据行");
            return Err(ImportError::EmptySheet(source.to_string()));
        }

        // === 步骤 2: 表头识别 ===
        let scan_rows = self.scan_rows().await;
        let header = self.header_detector.detect(&rows, scan_rows);
        info!(
            header_row = header.header_row,
            score = header.score,
            recognized = header.columns.recognized(),
            "表头识别完成"
        );

        // === 步骤 3: 行映射 + 清洗 ===
        let data_start = header.header_row + 1;
        let total_rows = rows.len().saturating_sub(data_start);
        let medications: Vec<_> = rows
            .iter()
            .enumerate()
            .skip(data_start)
            .filter_map(|(idx, row)| {
                self.field_mapper.map_row(
                    row,
                    idx,
                    &header.columns,
                    self.data_cleaner.as_ref(),
                    millis,
                )
            })
            .collect();
        let skipped_rows = total_rows - medications.len();
        debug!(mapped = medications.len(), skipped = skipped_rows, "行映射完成");

        if medications.is_empty() {
            warn!(
                header_row = header.header_row,
                score = header.score,
                "未识别到任何药品记录"
            );
            return Err(ImportError::NoColumnsRecognized {
                header_row: header.header_row,
                score: header.score,
            });
        }

        let elapsed_time = start_time.elapsed();
        info!(
            batch_id = %batch_id,
            imported = medications.len(),
            skipped = skipped_rows,
            elapsed_ms = elapsed_time.as_millis() as u64,
            "药品数据导入完成"
        );

        Ok(ImportReport {
            batch_id,
            source: source.to_string(),
            header,
            total_rows,
            skipped_rows,
            medications,
            elapsed_time,
        })
    }

    /// 批量导入多个文件（并发执行）
    async fn batch_import<P: AsRef<Path> + Send + Sync>(
        &self,
        file_paths: Vec<P>,
    ) -> Vec<ImportResult<ImportReport>> {
        use futures::future::join_all;

        info!(count = file_paths.len(), "开始批量导入文件");

        let import_tasks = file_paths.into_iter().map(|path| {
            let path_str = path.as_ref().display().to_string();
            async move {
                match self.import_file(path).await {
                    Ok(report) => {
                        info!(file = %path_str, imported = report.imported(), "文件导入成功");
                        Ok(report)
                    }
                    Err(e) => {
                        error!(file = %path_str, error = %e, "文件导入失败");
                        Err(e)
                    }
                }
            }
        });

        // 并发执行所有导入任务（结果顺序与输入一致）
        let results = join_all(import_tasks).await;

        info!(
            total = results.len(),
            success = results.iter().filter(|r| r.is_ok()).count(),
            failed = results.iter().filter(|r| r.is_err()).count(),
            "批量导入完成"
        );

        results
    }
}
