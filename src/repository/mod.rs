// ==========================================
// 零售促销排期系统 - 仓储层
// ==========================================
// 职责: SQLite 数据访问（商品目录、导入批次、计划快照）
// 红线: Repository 不含业务规则, 只做数据 CRUD
// ==========================================

pub mod catalog_repo;
pub mod error;
pub mod snapshot_repo;

pub use catalog_repo::ProductRepository;
pub use error::{RepositoryError, RepositoryResult};
pub use snapshot_repo::PlanSnapshotRepository;
