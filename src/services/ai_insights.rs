// ==========================================
// FarmaINPER 医药库存系统 - AI 库存分析
// ==========================================
// 接口: Gemini REST generateContent
// 输出: 西班牙语管理建议（纯文本）
// ==========================================

use crate::domain::medication::Medication;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

/// Gemini REST 基础地址
pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

const TEMPERATURE: f32 = 0.7;
const TOP_P: f32 = 0.95;
const REQUEST_TIMEOUT_SECS: u64 = 60;

/// AI 调用错误
#[derive(Error, Debug)]
pub enum AiError {
    #[error("未配置 AI API Key")]
    MissingApiKey,

    #[error("AI 请求失败 (status={status:?}): {message}")]
    Request { status: Option<u16>, message: String },

    #[error("AI 响应为空")]
    EmptyResponse,
}

impl From<reqwest::Error> for AiError {
    fn from(err: reqwest::Error) -> Self {
        AiError::Request {
            status: err.status().map(|s| s.as_u16()),
            message: err.to_string(),
        }
    }
}

// ==========================================
// InsightProvider Trait
// ==========================================
// 实现者: GeminiClient
#[async_trait]
pub trait InsightProvider: Send + Sync {
    /// 对库存列表生成管理建议
    async fn analyze(&self, medications: &[Medication]) -> Result<String, AiError>;
}

/// 构造分析提示词（每条记录一行）
pub fn build_prompt(medications: &[Medication]) -> String {
    let inventory_summary = medications
        .iter()
        .map(|m| {
            format!(
                "- {} (Lote: {}, Clave: {}): Qty {}, Vence: {}",
                m.nombre,
                m.lote,
                m.clave,
                m.cantidad,
                m.fecha_caducidad.format("%Y-%m-%d")
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "Analiza este inventario de medicamentos y proporciona 3 recomendaciones clave:\n\
         1. Identifica riesgos críticos (vencimientos próximos por lote).\n\
         2. Sugiere optimización de stock basándote en cantidades.\n\
         3. Resumen de la salud general del inventario.\n\
         \n\
         Inventario:\n\
         {}\n\
         \n\
         Responde en español con un tono profesional médico-administrativo.",
        inventory_summary
    )
}

// ===== 请求/响应结构 =====

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize, Deserialize, Default)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    top_p: f32,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Content,
}

/// 拼接首个候选的全部文本片段
fn extract_text(response: GenerateContentResponse) -> Option<String> {
    let candidate = response.candidates.into_iter().next()?;
    let text: String = candidate
        .content
        .parts
        .into_iter()
        .filter_map(|p| p.text)
        .collect();
    if text.trim().is_empty() {
        None
    } else {
        Some(text)
    }
}

// ==========================================
// GeminiClient
// ==========================================
pub struct GeminiClient {
    client: Client,
    api_key: Option<String>,
    model: String,
    base_url: String,
}

impl GeminiClient {
    pub fn new(api_key: Option<String>, model: impl Into<String>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            client,
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            model: model.into(),
            base_url: GEMINI_BASE_URL.to_string(),
        }
    }

    /// 替换基础地址（代理/私有网关）
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }

    #[instrument(skip(self, prompt), fields(model = %self.model, prompt_chars = prompt.len()))]
    pub async fn generate(&self, prompt: &str) -> Result<String, AiError> {
        let api_key = self.api_key.as_deref().ok_or(AiError::MissingApiKey)?;

        let request = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: Some(prompt.to_string()),
                }],
            }],
            generation_config: GenerationConfig {
                temperature: TEMPERATURE,
                top_p: TOP_P,
            },
        };

        debug!("请求 Gemini generateContent");
        let response = self
            .client
            .post(self.endpoint())
            .query(&[("key", api_key)])
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            warn!(status = status.as_u16(), "Gemini 请求失败");
            return Err(AiError::Request {
                status: Some(status.as_u16()),
                message: error_text,
            });
        }

        let body: GenerateContentResponse = response.json().await?;
        let text = extract_text(body).ok_or(AiError::EmptyResponse)?;
        info!(chars = text.len(), "Gemini 分析完成");
        Ok(text)
    }
}

#[async_trait]
impl InsightProvider for GeminiClient {
    async fn analyze(&self, medications: &[Medication]) -> Result<String, AiError> {
        self.generate(&build_prompt(medications)).await
    }
}
