// ==========================================
// FarmaINPER 医药库存系统 - 外部服务适配层
// ==========================================
// ai_insights: Gemini 库存分析
// report: PDF 报告 / CSV 导出
// ==========================================

pub mod ai_insights;
pub mod report;

pub use ai_insights::{build_prompt, AiError, GeminiClient, InsightProvider, GEMINI_BASE_URL};
pub use report::{
    ai_insight_report, ai_report_file_name, export_csv, medication_report, report_file_name,
    wrap_text, ReportDocument, ReportError, ReportOptions,
};
