// ==========================================
// FarmaINPER 医药库存系统 - 库存配置读取 Trait
// ==========================================
// 职责: 定义导入/同步/报表/AI 所需的配置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use async_trait::async_trait;
use std::error::Error;

/// 配置读取结果
pub type ConfigResult<T> = Result<T, Box<dyn Error + Send + Sync>>;

// ==========================================
// InventoryConfigReader Trait
// ==========================================
// 用途: 各模块所需的配置读取接口
// 实现者: ConfigManager（从 config_kv 表读取，环境变量优先）
#[async_trait]
pub trait InventoryConfigReader: Send + Sync {
    // ===== 有效期配置 =====

    /// 临期窗口（自然月）
    ///
    /// # 默认值
    /// - 3
    async fn get_upcoming_window_months(&self) -> ConfigResult<u32>;

    // ===== 导入配置 =====

    /// 表头识别扫描行数
    ///
    /// # 默认值
    /// - 15
    async fn get_header_scan_rows(&self) -> ConfigResult<usize>;

    // ===== 远端同步配置 =====

    /// 远端 upsert 分块大小
    ///
    /// # 默认值
    /// - 500
    async fn get_upsert_chunk_size(&self) -> ConfigResult<usize>;

    /// 远端分页读取大小
    ///
    /// # 默认值
    /// - 1000
    async fn get_fetch_page_size(&self) -> ConfigResult<usize>;

    /// 远端服务地址（None = 离线模式）
    ///
    /// # 覆写
    /// - 环境变量 FARMA_REMOTE_URL
    async fn get_remote_url(&self) -> ConfigResult<Option<String>>;

    /// 远端匿名访问密钥
    ///
    /// # 覆写
    /// - 环境变量 FARMA_REMOTE_KEY
    async fn get_remote_key(&self) -> ConfigResult<Option<String>>;

    // ===== AI 配置 =====

    /// 生成模型名称
    ///
    /// # 默认值
    /// - gemini-3-flash-preview
    async fn get_ai_model(&self) -> ConfigResult<String>;

    /// AI 接口密钥
    ///
    /// # 覆写
    /// - 环境变量 API_KEY / GEMINI_API_KEY
    async fn get_ai_api_key(&self) -> ConfigResult<Option<String>>;

    // ===== 安全与报表 =====

    /// 清空库存所需口令
    async fn get_delete_password(&self) -> ConfigResult<String>;

    /// 报表品牌名（标题与文件名前缀）
    ///
    /// # 默认值
    /// - FarmaINPER
    async fn get_report_brand(&self) -> ConfigResult<String>;
}
