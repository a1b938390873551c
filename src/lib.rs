// ==========================================
// 零售促销排期系统 - 核心库
// ==========================================
// 技术栈: Rust + SQLite
// 系统定位: 促销计划自动编排 (人工最终控制权)
// ==========================================

// 初始化国际化系统
rust_i18n::i18n!("locales", fallback = "zh-CN");

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 业务规则
pub mod engine;

// 导入层 - 外部数据
pub mod importer;

// 配置层 - 系统配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一）
pub mod db;

// 日志系统
pub mod logging;

// 性能统计
pub mod perf;

// 国际化
pub mod i18n;

// 导出层 - 计划导出
pub mod export;

// API 层 - 业务接口
pub mod api;

// 应用层 - 组装与共享状态
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{CategoryChoice, PlanScope, StockStatus};

// 领域实体
pub use domain::{
    CatalogImportSummary, DaySlot, MonthPlan, PlanSnapshot, Product, PromoItem, UsedProductSet,
    WeekPlan,
};

// 引擎
pub use engine::{
    AlternativeResolver, AvailabilityAnalyzer, EligibilityFilter, GenerationOutcome,
    PlanOrchestrator, ReplacementResolver, ScheduleAssembler, SlotAllocator,
};

// API
pub use api::{CatalogApi, PlanApi};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "零售促销排期系统";

// 数据库版本
pub const DB_VERSION: &str = "v0.1";

// ==========================================
// 预编译检查
// ==========================================

// 确保编译时所有模块可见
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
