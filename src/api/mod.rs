// ==========================================
// 零售促销排期系统 - API模块
// ==========================================

pub mod catalog_api;
pub mod error;
pub mod plan_api;
pub mod validator;

pub use catalog_api::CatalogApi;
pub use error::{ApiError, ApiResult};
pub use plan_api::{PlanApi, ReplacementResponse};
