// ==========================================
// 零售促销排期系统 - 计划生成引擎层
// ==========================================
// 职责: 资格过滤、可用性分析、槽位分配、短缺协商、
//       条目替换与日历装配的纯计算引擎
// 红线: 引擎层不碰数据库, 输入输出全部走内存结构;
//       持久化与参数读取由上层 API 负责
// ==========================================

pub mod allocator;
pub mod assembler;
pub mod availability;
pub mod eligibility;
pub mod orchestrator;
pub mod replacement;
pub mod resolution;

pub use allocator::SlotAllocator;
pub use assembler::{ScheduleAssembler, DAYS_PER_WEEK};
pub use availability::{AvailabilityAnalyzer, AvailabilityReport};
pub use eligibility::EligibilityFilter;
pub use orchestrator::{GenerationError, PlanOrchestrator};
pub use replacement::{ReplacementError, ReplacementResolver};
pub use resolution::{
    AlternativeResolver, AlternativeSuggestion, GenerationOutcome, PendingGeneration,
    ResolutionError,
};
