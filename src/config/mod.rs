// ==========================================
// 零售促销排期系统 - 配置模块
// ==========================================

pub mod config_manager;
pub mod planner_config_trait;

pub use config_manager::{config_keys, ConfigManager};
pub use planner_config_trait::PlannerConfigReader;
