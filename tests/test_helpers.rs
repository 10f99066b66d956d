// ==========================================
// 测试辅助函数
// ==========================================
// 职责: 临时数据库 / 测试文件 / 内存版远端仓储 / 假 AI 服务
// ==========================================
#![allow(dead_code)]

use async_trait::async_trait;
use chrono::NaiveDate;
use farma_inventory::config::ConfigManager;
use farma_inventory::domain::Medication;
use farma_inventory::repository::{MedicationRepository, RepositoryError, RepositoryResult};
use farma_inventory::services::{AiError, InsightProvider};
use farma_inventory::LocalMedicationStore;
use rust_xlsxwriter::Workbook;
use std::error::Error;
use std::io::{BufRead, BufReader, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::NamedTempFile;

/// 创建临时测试数据库并初始化 schema
///
/// # 返回
/// - NamedTempFile: 临时数据库文件（需要保持存活）
/// - String: 数据库文件路径
pub fn create_test_db() -> Result<(NamedTempFile, String), Box<dyn Error>> {
    let temp_file = NamedTempFile::new()?;
    let db_path = temp_file.path().to_str().unwrap().to_string();
    farma_inventory::db::open_sqlite_connection(&db_path)?;
    Ok((temp_file, db_path))
}

/// 共享同一连接的本地镜像 + 配置管理器
pub fn open_stores(db_path: &str) -> (Arc<LocalMedicationStore>, Arc<ConfigManager>) {
    let conn = farma_inventory::db::open_sqlite_connection(db_path).unwrap();
    let conn = Arc::new(Mutex::new(conn));
    let local = LocalMedicationStore::from_connection(conn.clone()).unwrap();
    let config = ConfigManager::from_connection(conn).unwrap();
    (Arc::new(local), Arc::new(config))
}

pub fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn medication(id: &str, nombre: &str, fecha: NaiveDate, cantidad: i64) -> Medication {
    Medication {
        id: id.to_string(),
        clave: format!("CL-{}", id),
        nombre: nombre.to_string(),
        lote: format!("L-{}", id),
        fecha_caducidad: fecha,
        cantidad,
    }
}

/// 以 2025-06-10 为“今天”的样例库存（窗口 3 个月）
///
/// - a: 已过期
/// - b: 临期
/// - c/d: 有效
pub fn sample_inventory() -> Vec<Medication> {
    vec![
        medication("a", "Amoxicilina", ymd(2025, 5, 1), 40),
        medication("b", "Paracetamol", ymd(2025, 8, 15), 624),
        medication("c", "Ibuprofeno", ymd(2026, 1, 31), 120),
        medication("d", "Omeprazol", ymd(2099, 1, 1), 0),
    ]
}

pub fn write_csv(dir: &Path, name: &str, lines: &[&str]) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, lines.join("\n")).unwrap();
    path
}

/// xlsx 单元格
pub enum XlsxCell {
    Text(&'static str),
    Number(f64),
    Blank,
}

pub fn write_xlsx(path: &Path, rows: &[Vec<XlsxCell>]) {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    for (r, row) in rows.iter().enumerate() {
        for (c, cell) in row.iter().enumerate() {
            match cell {
                XlsxCell::Text(s) => {
                    worksheet.write_string(r as u32, c as u16, *s).unwrap();
                }
                XlsxCell::Number(n) => {
                    worksheet.write_number(r as u32, c as u16, *n).unwrap();
                }
                XlsxCell::Blank => {}
            }
        }
    }
    workbook.save(path).unwrap();
}

// ==========================================
// MemoryRepository - 内存版远端仓储
// ==========================================
#[derive(Default)]
pub struct MemoryRepository {
    pub records: Mutex<Vec<Medication>>,
    pub upsert_calls: AtomicUsize,
    pub delete_calls: AtomicUsize,
}

impl MemoryRepository {
    pub fn with_records(records: Vec<Medication>) -> Self {
        Self {
            records: Mutex::new(records),
            ..Default::default()
        }
    }

    pub fn len(&self) -> usize {
        self.records.lock().unwrap().len()
    }
}

#[async_trait]
impl MedicationRepository for MemoryRepository {
    async fn fetch_all(&self) -> RepositoryResult<Vec<Medication>> {
        Ok(self.records.lock().unwrap().clone())
    }

    async fn upsert(&self, medications: &[Medication]) -> RepositoryResult<usize> {
        self.upsert_calls.fetch_add(1, Ordering::SeqCst);
        let mut records = self.records.lock().unwrap();
        for med in medications {
            match records.iter_mut().find(|m| m.id == med.id) {
                Some(existing) => *existing = med.clone(),
                None => records.push(med.clone()),
            }
        }
        Ok(medications.len())
    }

    async fn delete_all(&self) -> RepositoryResult<usize> {
        self.delete_calls.fetch_add(1, Ordering::SeqCst);
        let mut records = self.records.lock().unwrap();
        let count = records.len();
        records.clear();
        Ok(count)
    }
}

// ==========================================
// FailingRepository - 总是失败的远端
// ==========================================
pub struct FailingRepository {
    pub table_missing: bool,
}

impl FailingRepository {
    fn error(&self) -> RepositoryError {
        if self.table_missing {
            RepositoryError::TableMissing {
                table: "medications".to_string(),
            }
        } else {
            RepositoryError::RemoteRequestError {
                status: Some(503),
                message: "service unavailable".to_string(),
            }
        }
    }
}

#[async_trait]
impl MedicationRepository for FailingRepository {
    async fn fetch_all(&self) -> RepositoryResult<Vec<Medication>> {
        Err(self.error())
    }

    async fn upsert(&self, _medications: &[Medication]) -> RepositoryResult<usize> {
        Err(self.error())
    }

    async fn delete_all(&self) -> RepositoryResult<usize> {
        Err(self.error())
    }
}

// ==========================================
// CannedInsights - 固定返回的 AI 服务
// ==========================================
pub struct CannedInsights {
    pub seen: Mutex<usize>,
}

#[async_trait]
impl InsightProvider for CannedInsights {
    async fn analyze(&self, medications: &[Medication]) -> Result<String, AiError> {
        *self.seen.lock().unwrap() = medications.len();
        Ok("1. Riesgo crítico en Paracetamol.\n2. Reducir stock.\n3. Salud general buena.".to_string())
    }
}

// ==========================================
// StubServer - 本地 HTTP 桩服务（PostgREST 形态）
// ==========================================
// 每个连接只处理一个请求并以 Connection: close 结束

/// 已接收的请求
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub target: String,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl RecordedRequest {
    /// 请求头（名称不区分大小写）
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// 查询参数
    pub fn query(&self, name: &str) -> Option<String> {
        let (_, query) = self.target.split_once('?')?;
        query
            .split('&')
            .filter_map(|pair| pair.split_once('='))
            .find(|(k, _)| *k == name)
            .map(|(_, v)| v.to_string())
    }

    pub fn path(&self) -> &str {
        self.target.split('?').next().unwrap_or("")
    }
}

/// 桩响应
pub struct StubResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl StubResponse {
    pub fn json(status: u16, body: serde_json::Value) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: body.to_string(),
        }
    }

    pub fn empty(status: u16) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: String::new(),
        }
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }
}

pub struct StubServer {
    pub base_url: String,
    pub requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl StubServer {
    pub fn start<F>(handler: F) -> Self
    where
        F: Fn(&RecordedRequest) -> StubResponse + Send + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());
        let requests = Arc::new(Mutex::new(Vec::new()));
        let recorded = requests.clone();

        std::thread::spawn(move || {
            for stream in listener.incoming() {
                let Ok(mut stream) = stream else { break };
                let Some(request) = read_request(&mut stream) else {
                    continue;
                };
                let response = handler(&request);
                recorded.lock().unwrap().push(request);
                write_response(&mut stream, &response);
            }
        });

        Self { base_url, requests }
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }
}

fn read_request(stream: &mut TcpStream) -> Option<RecordedRequest> {
    let mut reader = BufReader::new(stream.try_clone().ok()?);
    let mut request_line = String::new();
    reader.read_line(&mut request_line).ok()?;
    let mut parts = request_line.split_whitespace();
    let method = parts.next()?.to_string();
    let target = parts.next()?.to_string();

    let mut headers = Vec::new();
    loop {
        let mut line = String::new();
        reader.read_line(&mut line).ok()?;
        let line = line.trim_end();
        if line.is_empty() {
            break;
        }
        if let Some((k, v)) = line.split_once(':') {
            headers.push((k.trim().to_string(), v.trim().to_string()));
        }
    }

    let length = headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case("content-length"))
        .and_then(|(_, v)| v.parse::<usize>().ok())
        .unwrap_or(0);
    let mut body = vec![0u8; length];
    reader.read_exact(&mut body).ok()?;

    Some(RecordedRequest {
        method,
        target,
        headers,
        body: String::from_utf8_lossy(&body).to_string(),
    })
}

fn write_response(stream: &mut TcpStream, response: &StubResponse) {
    let mut head = format!(
        "HTTP/1.1 {} Stub\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n",
        response.status,
        response.body.len()
    );
    for (k, v) in &response.headers {
        head.push_str(&format!("{}: {}\r\n", k, v));
    }
    head.push_str("\r\n");
    let _ = stream.write_all(head.as_bytes());
    let _ = stream.write_all(response.body.as_bytes());
    let _ = stream.flush();
}

/// 远端行 JSON
pub fn remote_row(id: &str, nombre: &str, cantidad: i64) -> serde_json::Value {
    serde_json::json!({
        "id": id,
        "clave": format!("CL-{}", id),
        "nombre": nombre,
        "lote": format!("L-{}", id),
        "fecha_caducidad": "2026-03-31",
        "cantidad": cantidad,
    })
}
