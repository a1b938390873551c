// ==========================================
// 零售促销排期系统 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型、业务规则接口
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod plan;
pub mod product;
pub mod types;

// 重导出核心类型
pub use plan::{
    assign_reason, DaySlot, MonthPlan, PlanSnapshot, PromoItem, UsedProductSet, WeekPlan,
};
pub use product::{
    CatalogImportSummary, DqLevel, DqViolation, ImportBatch, Product, RawProductRecord,
    SALE_FLOOR_MARGIN,
};
pub use types::{CategoryChoice, PlanScope, StockStatus};
