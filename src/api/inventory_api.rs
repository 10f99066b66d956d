// ==========================================
// FarmaINPER 医药库存系统 - 库存 API
// ==========================================
// 职责: 持有内存中的库存列表，并维护两个镜像
//   - 本地 SQLite 镜像（每次变更后整表替换）
//   - 远端表（可选，未配置时为离线模式）
// 红线: 删除必须先校验密码；远端删除失败时本地数据不动
// ==========================================

use crate::api::error::{config_error, ApiError, ApiResult};
use crate::config::InventoryConfigReader;
use crate::domain::import::ImportReport;
use crate::domain::medication::{InventoryStats, Medication};
use crate::domain::types::{StatusFilter, SyncStatus};
use crate::engine::{DashboardSummary, ExpiryClassifier, InventoryFilter, StatsEngine};
use crate::i18n::{t, t_with_args};
use crate::repository::{LocalMedicationStore, MedicationRepository};
use crate::services::ai_insights::{AiError, InsightProvider};
use crate::services::report::{self, ReportDocument, ReportOptions};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::io::Write;
use std::sync::{Arc, Mutex, RwLock};
use tracing::{info, instrument, warn};

/// 同步状态快照
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncState {
    pub status: SyncStatus,
    pub last_error: Option<String>,
    /// 远端缺表，需要执行初始化脚本
    pub needs_setup: bool,
}

/// 远端拉取结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SyncOutcome {
    /// 未配置远端
    Offline,
    /// 远端有数据，已替换本地
    Replaced(usize),
    /// 远端为空，保留本地
    RemoteEmpty,
    /// 拉取失败，保留本地
    Failed { message: String, needs_setup: bool },
}

/// 导入结果
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportOutcome {
    pub imported: usize,
    pub total: usize,
    /// 远端写入失败时的提示（本地已保存）
    pub remote_warning: Option<String>,
}

/// 清空结果
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ClearOutcome {
    pub local_deleted: usize,
    pub remote_deleted: Option<usize>,
}

// ==========================================
// InventoryApi
// ==========================================
pub struct InventoryApi {
    medications: RwLock<Vec<Medication>>,
    local: Arc<LocalMedicationStore>,
    remote: Option<Arc<dyn MedicationRepository>>,
    config: Arc<dyn InventoryConfigReader>,
    insights: Option<Arc<dyn InsightProvider>>,
    sync_state: Mutex<SyncState>,
    // 固定“今天”（测试用）；None 取本地日期
    today: Option<NaiveDate>,
}

impl InventoryApi {
    /// 创建新的InventoryApi实例
    ///
    /// # 参数
    /// - local: 本地镜像
    /// - remote: 远端仓储（None 为离线模式）
    /// - config: 配置读取器
    pub fn new(
        local: Arc<LocalMedicationStore>,
        remote: Option<Arc<dyn MedicationRepository>>,
        config: Arc<dyn InventoryConfigReader>,
    ) -> Self {
        Self {
            medications: RwLock::new(Vec::new()),
            local,
            remote,
            config,
            insights: None,
            sync_state: Mutex::new(SyncState::default()),
            today: None,
        }
    }

    pub fn with_insights(mut self, provider: Arc<dyn InsightProvider>) -> Self {
        self.insights = Some(provider);
        self
    }

    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    pub fn is_online(&self) -> bool {
        self.remote.is_some()
    }

    pub fn sync_state(&self) -> SyncState {
        self.sync_state
            .lock()
            .map(|s| s.clone())
            .unwrap_or_default()
    }

    /// 当前列表快照
    pub fn snapshot(&self) -> ApiResult<Vec<Medication>> {
        Ok(self.read()?.clone())
    }

    // ===== 内部辅助 =====

    fn read(&self) -> ApiResult<std::sync::RwLockReadGuard<'_, Vec<Medication>>> {
        self.medications
            .read()
            .map_err(|e| ApiError::InternalError(format!("库存列表锁获取失败: {}", e)))
    }

    fn replace_memory(&self, medications: Vec<Medication>) -> ApiResult<()> {
        let mut guard = self
            .medications
            .write()
            .map_err(|e| ApiError::InternalError(format!("库存列表锁获取失败: {}", e)))?;
        *guard = medications;
        Ok(())
    }

    fn set_sync_state(&self, status: SyncStatus, last_error: Option<String>, needs_setup: bool) {
        if let Ok(mut state) = self.sync_state.lock() {
            *state = SyncState {
                status,
                last_error,
                needs_setup,
            };
        }
    }

    async fn classifier(&self) -> ApiResult<ExpiryClassifier> {
        let months = self
            .config
            .get_upcoming_window_months()
            .await
            .map_err(config_error)?;
        Ok(match self.today {
            Some(today) => ExpiryClassifier::new(today, months),
            None => ExpiryClassifier::for_today(months),
        })
    }

    async fn report_options(&self, window_months: u32) -> ApiResult<ReportOptions> {
        let brand = self.config.get_report_brand().await.map_err(config_error)?;
        Ok(ReportOptions::now(brand, window_months))
    }

    // ==========================================
    // 加载 / 同步
    // ==========================================

    /// 启动时加载本地镜像
    #[instrument(skip(self))]
    pub async fn load_local(&self) -> ApiResult<usize> {
        let medications = self.local.fetch_all().await?;
        let count = medications.len();
        self.replace_memory(medications)?;
        info!(count, "本地镜像已加载");
        Ok(count)
    }

    /// 从远端拉取
    ///
    /// 远端有记录时整表替换本地；远端为空或失败时保留本地数据
    #[instrument(skip(self))]
    pub async fn sync(&self) -> ApiResult<SyncOutcome> {
        let Some(remote) = self.remote.as_ref() else {
            self.set_sync_state(SyncStatus::Idle, None, false);
            return Ok(SyncOutcome::Offline);
        };

        self.set_sync_state(SyncStatus::Syncing, None, false);
        match remote.fetch_all().await {
            Ok(records) if records.is_empty() => {
                self.set_sync_state(SyncStatus::Success, None, false);
                info!("远端为空，保留本地数据");
                Ok(SyncOutcome::RemoteEmpty)
            }
            Ok(records) => {
                let count = records.len();
                self.local.replace_all(&records)?;
                self.replace_memory(records)?;
                self.set_sync_state(SyncStatus::Success, None, false);
                info!(count, "远端数据已同步到本地");
                Ok(SyncOutcome::Replaced(count))
            }
            Err(err) => {
                let needs_setup = err.is_table_missing();
                let message = if needs_setup {
                    t("sync.table_missing")
                } else {
                    err.to_string()
                };
                warn!(error = %err, needs_setup, "远端同步失败，保留本地数据");
                self.set_sync_state(SyncStatus::Error, Some(message.clone()), needs_setup);
                Ok(SyncOutcome::Failed {
                    message,
                    needs_setup,
                })
            }
        }
    }

    // ==========================================
    // 导入
    // ==========================================

    /// 追加单个导入结果
    pub async fn import(&self, report: ImportReport) -> ApiResult<ImportOutcome> {
        self.append(report.medications).await
    }

    /// 追加多个导入结果（批量导入）
    pub async fn import_all(&self, reports: Vec<ImportReport>) -> ApiResult<ImportOutcome> {
        let records = reports.into_iter().flat_map(|r| r.medications).collect();
        self.append(records).await
    }

    /// 追加记录：本地镜像整表替换，远端只写新增部分
    #[instrument(skip(self, records), fields(new = records.len()))]
    pub async fn append(&self, mut records: Vec<Medication>) -> ApiResult<ImportOutcome> {
        // 先写本地镜像，成功后才替换内存列表
        let total = {
            let mut guard = self
                .medications
                .write()
                .map_err(|e| ApiError::InternalError(format!("库存列表锁获取失败: {}", e)))?;
            let existing: HashSet<String> = guard.iter().map(|m| m.id.clone()).collect();
            dedupe_ids(&existing, &mut records);
            let mut snapshot = guard.clone();
            snapshot.extend(records.iter().cloned());
            self.local.replace_all(&snapshot)?;
            let total = snapshot.len();
            *guard = snapshot;
            total
        };
        let imported = records.len();

        let mut remote_warning = None;
        if let Some(remote) = self.remote.as_ref() {
            if let Err(err) = remote.upsert(&records).await {
                warn!(error = %err, "远端写入失败，已保存到本地");
                let needs_setup = err.is_table_missing();
                let detail = if needs_setup {
                    t("sync.table_missing")
                } else {
                    err.to_string()
                };
                self.set_sync_state(SyncStatus::Error, Some(detail.clone()), needs_setup);
                remote_warning = Some(t_with_args("import.remote_warning", &[("error", detail.as_str())]));
            }
        }

        info!(imported, total, "导入记录已追加");
        Ok(ImportOutcome {
            imported,
            total,
            remote_warning,
        })
    }

    // ==========================================
    // 清空
    // ==========================================

    /// 清空全部库存（需删除密码）
    ///
    /// 先删远端，再清本地；远端失败时直接返回错误
    #[instrument(skip(self, password))]
    pub async fn clear(&self, password: &str) -> ApiResult<ClearOutcome> {
        let expected = self.config.get_delete_password().await.map_err(config_error)?;
        if password != expected {
            warn!("删除密码错误，未删除任何数据");
            return Err(ApiError::InvalidDeletePassword);
        }

        let remote_deleted = match self.remote.as_ref() {
            Some(remote) => Some(remote.delete_all().await?),
            None => None,
        };

        let local_deleted = self.local.delete_all().await?;
        self.replace_memory(Vec::new())?;
        info!(local_deleted, ?remote_deleted, "库存已清空");
        Ok(ClearOutcome {
            local_deleted,
            remote_deleted,
        })
    }

    // ==========================================
    // 查询
    // ==========================================

    pub async fn stats(&self) -> ApiResult<InventoryStats> {
        let classifier = self.classifier().await?;
        Ok(StatsEngine::compute(&self.read()?, &classifier))
    }

    /// 按状态 + 关键字筛选
    pub async fn list(&self, status: StatusFilter, search: &str) -> ApiResult<Vec<Medication>> {
        let classifier = self.classifier().await?;
        let filter = InventoryFilter::new(status, search);
        let guard = self.read()?;
        Ok(filter.apply(&guard, &classifier).into_iter().cloned().collect())
    }

    pub async fn dashboard(&self) -> ApiResult<DashboardSummary> {
        let classifier = self.classifier().await?;
        Ok(DashboardSummary::build(&self.read()?, &classifier))
    }

    /// 当前配置的临期窗口 + 分类器（供 CLI 渲染状态徽标）
    pub async fn expiry_classifier(&self) -> ApiResult<ExpiryClassifier> {
        self.classifier().await
    }

    // ==========================================
    // 报告 / 导出
    // ==========================================

    /// 生成库存 PDF（摘要为全量统计，表格为筛选结果）
    #[instrument(skip(self))]
    pub async fn report(&self, status: StatusFilter) -> ApiResult<ReportDocument> {
        let months = self.config.get_upcoming_window_months().await.map_err(config_error)?;
        let classifier = self.classifier().await?;
        let options = self.report_options(months).await?;
        let title = t(status.report_title_key());

        let guard = self.read()?;
        let stats = StatsEngine::compute(&guard, &classifier);
        let rows = InventoryFilter::status_only(status).apply(&guard, &classifier);
        let document = report::medication_report(&title, &rows, Some(&stats), &options)?;
        info!(file = %document.file_name, rows = rows.len(), "库存报告已生成");
        Ok(document)
    }

    /// 导出 CSV
    pub async fn export_csv<W: Write>(&self, status: StatusFilter, writer: W) -> ApiResult<usize> {
        let classifier = self.classifier().await?;
        let guard = self.read()?;
        let rows = InventoryFilter::status_only(status).apply(&guard, &classifier);
        Ok(report::export_csv(writer, &rows, &classifier)?)
    }

    // ==========================================
    // AI 分析
    // ==========================================

    #[instrument(skip(self))]
    pub async fn analyze(&self) -> ApiResult<String> {
        let medications = self.snapshot()?;
        if medications.is_empty() {
            return Err(ApiError::EmptyInventory);
        }
        let provider = self.insights.as_ref().ok_or(AiError::MissingApiKey)?;
        Ok(provider.analyze(&medications).await?)
    }

    /// AI 分析结果导出为 PDF
    pub async fn analyze_report(&self, analysis: &str) -> ApiResult<ReportDocument> {
        let months = self.config.get_upcoming_window_months().await.map_err(config_error)?;
        let options = self.report_options(months).await?;
        Ok(report::ai_insight_report(analysis, &options)?)
    }
}

/// 导入ID冲突时追加序号（同一毫秒内并发导入多个文件）
fn dedupe_ids(existing: &HashSet<String>, records: &mut [Medication]) {
    let mut seen: HashSet<String> = HashSet::new();
    for med in records.iter_mut() {
        if existing.contains(&med.id) || seen.contains(&med.id) {
            let base = med.id.clone();
            let mut n = 1;
            let mut candidate = format!("{}-{}", base, n);
            while existing.contains(&candidate) || seen.contains(&candidate) {
                n += 1;
                candidate = format!("{}-{}", base, n);
            }
            med.id = candidate;
        }
        seen.insert(med.id.clone());
    }
}
