// ==========================================
// FarmaINPER 医药库存系统 - API层错误类型
// ==========================================
// 职责: 汇总各层错误，提供面向用户的本地化消息
// ==========================================

use crate::i18n::{t, t_with_args};
use crate::importer::error::ImportError;
use crate::repository::error::RepositoryError;
use crate::services::ai_insights::AiError;
use crate::services::report::ReportError;
use thiserror::Error;

/// API层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    // ===== 业务规则错误 =====
    #[error("删除密码错误")]
    InvalidDeletePassword,

    #[error("库存为空")]
    EmptyInventory,

    // ===== 下层错误 =====
    #[error(transparent)]
    Import(#[from] ImportError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error(transparent)]
    Report(#[from] ReportError),

    #[error(transparent)]
    Ai(#[from] AiError),

    #[error("配置读取失败: {0}")]
    Config(String),

    // ===== 通用错误 =====
    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ApiError {
    /// 远端缺表（需执行初始化脚本）
    pub fn is_table_missing(&self) -> bool {
        matches!(self, ApiError::Repository(err) if err.is_table_missing())
    }

    /// 面向终端用户的本地化消息
    pub fn user_message(&self) -> String {
        match self {
            ApiError::InvalidDeletePassword => t("clear.invalid_password"),
            ApiError::EmptyInventory => t("ai.empty_inventory"),
            ApiError::Import(ImportError::FileNotFound(path)) => {
                t_with_args("import.file_not_found", &[("path", path)])
            }
            ApiError::Import(ImportError::NoColumnsRecognized { .. })
            | ApiError::Import(ImportError::EmptySheet(_)) => t("import.no_columns"),
            ApiError::Repository(RepositoryError::TableMissing { .. }) => t("sync.table_missing"),
            ApiError::Ai(AiError::MissingApiKey) => t("ai.missing_key"),
            ApiError::Ai(_) => t("ai.failed"),
            other => other.to_string(),
        }
    }
}

/// 配置读取错误转换（Box<dyn Error> 无法直接 #[from]）
pub(crate) fn config_error(err: Box<dyn std::error::Error + Send + Sync>) -> ApiError {
    ApiError::Config(err.to_string())
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repository_error_conversion() {
        let api_err: ApiError = RepositoryError::TableMissing {
            table: "medications".to_string(),
        }
        .into();
        assert!(api_err.is_table_missing());

        let api_err: ApiError = RepositoryError::LockError("poisoned".to_string()).into();
        assert!(!api_err.is_table_missing());
    }

    #[test]
    fn test_user_message_localized() {
        let _guard = crate::i18n::tests::LOCALE_TEST_LOCK.lock().unwrap();
        crate::i18n::set_locale("es");

        assert_eq!(
            ApiError::InvalidDeletePassword.user_message(),
            "Contraseña incorrecta. No se eliminó ningún dato."
        );
        assert_eq!(
            ApiError::Ai(AiError::MissingApiKey).user_message(),
            "Configura tu API Key para obtener insights."
        );
        let msg = ApiError::Import(ImportError::FileNotFound("/tmp/x.csv".into())).user_message();
        assert!(msg.contains("/tmp/x.csv"));
    }
}
