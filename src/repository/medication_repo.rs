// ==========================================
// FarmaINPER 医药库存系统 - 药品 Repository Trait
// ==========================================
// 职责: 定义库存记录数据访问接口（不包含业务逻辑）
// 实现者: LocalMedicationStore（SQLite）, RemoteMedicationStore（REST）
// 红线: Repository 不含业务规则，只做数据 CRUD
// ==========================================

use crate::domain::medication::Medication;
use crate::repository::error::RepositoryResult;
use async_trait::async_trait;

#[async_trait]
pub trait MedicationRepository: Send + Sync {
    /// 读取全部记录（保持存储顺序）
    async fn fetch_all(&self) -> RepositoryResult<Vec<Medication>>;

    /// 按 id 插入或覆盖
    ///
    /// # 返回
    /// - Ok(usize): 写入的记录数
    async fn upsert(&self, medications: &[Medication]) -> RepositoryResult<usize>;

    /// 删除全部记录
    ///
    /// # 返回
    /// - Ok(usize): 删除的记录数（远端不回传时为 0）
    async fn delete_all(&self) -> RepositoryResult<usize>;
}
