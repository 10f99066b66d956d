// ==========================================
// FarmaINPER 医药库存系统 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================
// 职责: 提供数据访问接口,屏蔽本地/远端存储细节
// 约束: 本地查询使用参数化; 远端只走 REST
// ==========================================

pub mod error;
pub mod local_store;
pub mod medication_repo;
pub mod remote_store;

// 重导出核心仓储
pub use error::{RepositoryError, RepositoryResult};
pub use local_store::LocalMedicationStore;
pub use medication_repo::MedicationRepository;
pub use remote_store::{
    RemoteMedicationRow, RemoteMedicationStore, RemoteStoreConfig, MEDICATIONS_TABLE,
    SQL_SETUP_SCRIPT,
};
