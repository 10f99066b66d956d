// ==========================================
// FarmaINPER 医药库存系统 - 本地镜像存储
// ==========================================
// 职责: medications 表的 SQLite 读写（离线可用）
// 顺序: position 列保存插入顺序
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::medication::Medication;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::medication_repo::MedicationRepository;
use async_trait::async_trait;
use rusqlite::{params, Connection, Transaction};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

// ==========================================
// LocalMedicationStore
// ==========================================
pub struct LocalMedicationStore {
    conn: Arc<Mutex<Connection>>,
}

impl LocalMedicationStore {
    /// 创建新的本地存储实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)
            .map_err(|e| RepositoryError::DatabaseConnectionError(e.to_string()))?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建（与 ConfigManager 共用同一个库文件）
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> RepositoryResult<Self> {
        {
            let guard = Self::lock(&conn)?;
            crate::db::configure_sqlite_connection(&guard)?;
            crate::db::init_schema(&guard)?;
        }
        Ok(Self { conn })
    }

    fn lock(conn: &Arc<Mutex<Connection>>) -> RepositoryResult<MutexGuard<'_, Connection>> {
        conn.lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 整表替换（事务化）：镜像内存中的完整列表
    pub fn replace_all(&self, medications: &[Medication]) -> RepositoryResult<usize> {
        let mut conn = Self::lock(&self.conn)?;
        let tx = conn
            .transaction()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        tx.execute("DELETE FROM medications", [])?;
        let count = Self::insert_tx(&tx, medications, 0)?;

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
        debug!(count, "本地镜像已替换");
        Ok(count)
    }

    /// 记录数
    pub fn count(&self) -> RepositoryResult<usize> {
        let conn = Self::lock(&self.conn)?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM medications", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    fn insert_tx(tx: &Transaction, medications: &[Medication], start: i64) -> RepositoryResult<usize> {
        let mut stmt = tx.prepare(
            r#"
            INSERT INTO medications (id, clave, nombre, lote, fecha_caducidad, cantidad, position)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ON CONFLICT(id) DO UPDATE SET
                clave = excluded.clave,
                nombre = excluded.nombre,
                lote = excluded.lote,
                fecha_caducidad = excluded.fecha_caducidad,
                cantidad = excluded.cantidad
            "#,
        )?;

        let mut count = 0;
        for (offset, med) in medications.iter().enumerate() {
            stmt.execute(params![
                med.id,
                med.clave,
                med.nombre,
                med.lote,
                med.fecha_caducidad,
                med.cantidad,
                start + offset as i64,
            ])?;
            count += 1;
        }
        Ok(count)
    }
}

#[async_trait]
impl MedicationRepository for LocalMedicationStore {
    async fn fetch_all(&self) -> RepositoryResult<Vec<Medication>> {
        let conn = Self::lock(&self.conn)?;
        let mut stmt = conn.prepare(
            "SELECT id, clave, nombre, lote, fecha_caducidad, cantidad
             FROM medications ORDER BY position, rowid",
        )?;

        let rows = stmt.query_map([], |row| {
            Ok(Medication {
                id: row.get(0)?,
                clave: row.get(1)?,
                nombre: row.get(2)?,
                lote: row.get(3)?,
                fecha_caducidad: row.get(4)?,
                cantidad: row.get(5)?,
            })
        })?;

        let mut medications = Vec::new();
        for row in rows {
            medications.push(row?);
        }
        Ok(medications)
    }

    async fn upsert(&self, medications: &[Medication]) -> RepositoryResult<usize> {
        let mut conn = Self::lock(&self.conn)?;
        let tx = conn
            .transaction()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        let next_position: i64 = tx.query_row(
            "SELECT COALESCE(MAX(position), -1) + 1 FROM medications",
            [],
            |row| row.get(0),
        )?;
        let count = Self::insert_tx(&tx, medications, next_position)?;

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
        Ok(count)
    }

    async fn delete_all(&self) -> RepositoryResult<usize> {
        let conn = Self::lock(&self.conn)?;
        let affected = conn.execute("DELETE FROM medications", [])?;
        Ok(affected)
    }
}
