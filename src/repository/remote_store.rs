// ==========================================
// FarmaINPER 医药库存系统 - 远端存储（PostgREST）
// ==========================================
// 协议: /rest/v1/{table} + apikey / Bearer 认证
// 读取: 按 id 排序分页，直到空页
// 写入: on_conflict=id 合并（分块）
// 删除: id=neq.0（全部）
// ==========================================

use crate::domain::medication::{missing_expiry, Medication, MISSING_NAME, MISSING_TEXT};
use crate::importer::data_cleaner::{parse_date_text, round_half_up};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::medication_repo::MedicationRepository;
use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Deserializer, Serialize};
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// 远端表名
pub const MEDICATIONS_TABLE: &str = "medications";

/// 请求超时（秒）
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// 远端缺表时的错误特征
const TABLE_MISSING_MARKERS: [&str; 3] = ["Could not find the table", "PGRST205", "does not exist"];

/// 远端初始化脚本（在托管数据库的 SQL 编辑器中执行）
pub const SQL_SETUP_SCRIPT: &str = r#"-- Ejecuta este código en el SQL Editor de tu proyecto
create table medications (
  id text primary key,
  clave text,
  nombre text,
  lote text,
  fecha_caducidad text,
  cantidad integer
);

-- Habilitar acceso público (opcional, ajusta según tu seguridad)
alter table medications enable row level security;
create policy "Permitir todo a usuarios anon" on medications for all using (true) with check (true);"#;

// ==========================================
// RemoteMedicationRow - 远端行格式
// ==========================================
// 远端列允许为空，读取时回落到占位值
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteMedicationRow {
    pub id: String,
    #[serde(default)]
    pub clave: Option<String>,
    #[serde(default)]
    pub nombre: Option<String>,
    #[serde(default)]
    pub lote: Option<String>,
    #[serde(default)]
    pub fecha_caducidad: Option<String>,
    #[serde(default, deserialize_with = "deserialize_quantity")]
    pub cantidad: Option<i64>,
}

fn deserialize_quantity<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<f64>::deserialize(deserializer)?;
    Ok(value.map(round_half_up))
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl From<&Medication> for RemoteMedicationRow {
    fn from(med: &Medication) -> Self {
        Self {
            id: med.id.clone(),
            clave: Some(med.clave.clone()),
            nombre: Some(med.nombre.clone()),
            lote: Some(med.lote.clone()),
            fecha_caducidad: Some(med.fecha_caducidad.format("%Y-%m-%d").to_string()),
            cantidad: Some(med.cantidad),
        }
    }
}

impl From<RemoteMedicationRow> for Medication {
    fn from(row: RemoteMedicationRow) -> Self {
        let fecha_caducidad = row
            .fecha_caducidad
            .as_deref()
            .and_then(parse_date_text)
            .unwrap_or_else(missing_expiry);
        Medication {
            id: row.id,
            clave: non_blank(row.clave).unwrap_or_else(|| MISSING_TEXT.to_string()),
            nombre: non_blank(row.nombre).unwrap_or_else(|| MISSING_NAME.to_string()),
            lote: non_blank(row.lote).unwrap_or_else(|| MISSING_TEXT.to_string()),
            fecha_caducidad,
            cantidad: row.cantidad.unwrap_or(0),
        }
    }
}

/// 失败响应分类：缺表 → TableMissing，其余 → RemoteRequestError
pub fn classify_failure(status: u16, body: &str, table: &str) -> RepositoryError {
    if status == StatusCode::NOT_FOUND.as_u16()
        || TABLE_MISSING_MARKERS.iter().any(|m| body.contains(m))
    {
        RepositoryError::TableMissing {
            table: table.to_string(),
        }
    } else {
        RepositoryError::RemoteRequestError {
            status: Some(status),
            message: body.to_string(),
        }
    }
}

/// 解析 Content-Range 中的总数（"0-9/10" 或 "*/3"）
pub fn parse_content_range_total(value: &str) -> Option<usize> {
    value.rsplit('/').next()?.trim().parse().ok()
}

// ==========================================
// RemoteStoreConfig
// ==========================================
#[derive(Debug, Clone)]
pub struct RemoteStoreConfig {
    pub base_url: String,
    pub api_key: String,
    pub page_size: usize,
    pub chunk_size: usize,
}

// ==========================================
// RemoteMedicationStore
// ==========================================
pub struct RemoteMedicationStore {
    client: Client,
    config: RemoteStoreConfig,
    table: String,
}

impl RemoteMedicationStore {
    pub fn new(config: RemoteStoreConfig) -> RepositoryResult<Self> {
        if config.base_url.trim().is_empty() || config.api_key.trim().is_empty() {
            return Err(RepositoryError::RemoteNotConfigured(
                "remote_url / remote_anon_key".to_string(),
            ));
        }
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;
        Ok(Self {
            client,
            config: RemoteStoreConfig {
                base_url: config.base_url.trim().trim_end_matches('/').to_string(),
                page_size: config.page_size.max(1),
                chunk_size: config.chunk_size.max(1),
                ..config
            },
            table: MEDICATIONS_TABLE.to_string(),
        })
    }

    pub fn table_url(&self) -> String {
        format!("{}/rest/v1/{}", self.config.base_url, self.table)
    }

    fn request(&self, method: reqwest::Method) -> reqwest::RequestBuilder {
        self.client
            .request(method, self.table_url())
            .header("apikey", &self.config.api_key)
            .bearer_auth(&self.config.api_key)
    }

    async fn check(&self, response: Response) -> RepositoryResult<Response> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        let err = classify_failure(status, &body, &self.table);
        warn!(status, error = %err, "远端请求失败");
        Err(err)
    }
}

#[async_trait]
impl MedicationRepository for RemoteMedicationStore {
    #[instrument(skip(self))]
    async fn fetch_all(&self) -> RepositoryResult<Vec<Medication>> {
        let page_size = self.config.page_size;
        let mut medications = Vec::new();
        let mut offset = 0usize;

        loop {
            let response = self
                .request(reqwest::Method::GET)
                .query(&[
                    ("select", "*".to_string()),
                    ("order", "id.asc".to_string()),
                    ("offset", offset.to_string()),
                    ("limit", page_size.to_string()),
                ])
                .send()
                .await?;
            let rows: Vec<RemoteMedicationRow> = self.check(response).await?.json().await?;
            let fetched = rows.len();
            debug!(offset, fetched, "远端分页读取");

            // 服务端 max-rows 可能小于 page_size，只有空页才算读完
            if fetched == 0 {
                break;
            }
            medications.extend(rows.into_iter().map(Medication::from));
            offset += fetched;
        }

        info!(count = medications.len(), "远端读取完成");
        Ok(medications)
    }

    #[instrument(skip(self, medications), fields(count = medications.len()))]
    async fn upsert(&self, medications: &[Medication]) -> RepositoryResult<usize> {
        let mut written = 0;
        for chunk in medications.chunks(self.config.chunk_size) {
            let payload: Vec<RemoteMedicationRow> = chunk.iter().map(RemoteMedicationRow::from).collect();
            let response = self
                .request(reqwest::Method::POST)
                .query(&[("on_conflict", "id")])
                .header("Prefer", "resolution=merge-duplicates,return=minimal")
                .json(&payload)
                .send()
                .await?;
            self.check(response).await?;
            written += chunk.len();
            debug!(written, "远端分块写入");
        }
        info!(written, "远端写入完成");
        Ok(written)
    }

    #[instrument(skip(self))]
    async fn delete_all(&self) -> RepositoryResult<usize> {
        let response = self
            .request(reqwest::Method::DELETE)
            .query(&[("id", "neq.0")])
            .header("Prefer", "return=minimal,count=exact")
            .send()
            .await?;
        let response = self.check(response).await?;
        let deleted = response
            .headers()
            .get("content-range")
            .and_then(|v| v.to_str().ok())
            .and_then(parse_content_range_total)
            .unwrap_or(0);
        info!(deleted, "远端已清空");
        Ok(deleted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_row_from_json_with_nulls() {
        let row: RemoteMedicationRow = serde_json::from_str(
            r#"{"id":"med-1-1","clave":null,"nombre":"  ","lote":"L1","fecha_caducidad":"2026-03-31","cantidad":12.6}"#,
        )
        .unwrap();
        let med = Medication::from(row);

        assert_eq!(med.clave, MISSING_TEXT);
        assert_eq!(med.nombre, MISSING_NAME);
        assert_eq!(med.lote, "L1");
        assert_eq!(med.fecha_caducidad, NaiveDate::from_ymd_opt(2026, 3, 31).unwrap());
        assert_eq!(med.cantidad, 13);
    }

    #[test]
    fn test_row_missing_columns_and_bad_date() {
        let row: RemoteMedicationRow =
            serde_json::from_str(r#"{"id":"x","fecha_caducidad":"pronto"}"#).unwrap();
        let med = Medication::from(row);
        assert_eq!(med.fecha_caducidad, missing_expiry());
        assert_eq!(med.cantidad, 0);
    }

    #[test]
    fn test_row_serializes_snake_case_date() {
        let med = Medication {
            id: "a".into(),
            clave: "C".into(),
            nombre: "N".into(),
            lote: "L".into(),
            fecha_caducidad: NaiveDate::from_ymd_opt(2025, 1, 2).unwrap(),
            cantidad: 4,
        };
        let json = serde_json::to_value(RemoteMedicationRow::from(&med)).unwrap();
        assert_eq!(json["fecha_caducidad"], "2025-01-02");
        assert_eq!(json["cantidad"], 4);
    }

    #[test]
    fn test_classify_failure() {
        assert!(classify_failure(404, "", "medications").is_table_missing());
        assert!(classify_failure(
            400,
            r#"{"message":"Could not find the table 'public.medications' in the schema cache"}"#,
            "medications"
        )
        .is_table_missing());
        assert!(matches!(
            classify_failure(401, "invalid key", "medications"),
            RepositoryError::RemoteRequestError { status: Some(401), .. }
        ));
    }

    #[test]
    fn test_parse_content_range_total() {
        assert_eq!(parse_content_range_total("*/42"), Some(42));
        assert_eq!(parse_content_range_total("0-9/10"), Some(10));
        assert_eq!(parse_content_range_total("0-9/*"), None);
    }

    #[test]
    fn test_new_requires_credentials() {
        let result = RemoteMedicationStore::new(RemoteStoreConfig {
            base_url: "".into(),
            api_key: "k".into(),
            page_size: 1000,
            chunk_size: 500,
        });
        assert!(matches!(result, Err(RepositoryError::RemoteNotConfigured(_))));

        let store = RemoteMedicationStore::new(RemoteStoreConfig {
            base_url: "https://demo.example.co/".into(),
            api_key: "k".into(),
            page_size: 0,
            chunk_size: 0,
        })
        .unwrap();
        assert_eq!(store.table_url(), "https://demo.example.co/rest/v1/medications");
    }
}
