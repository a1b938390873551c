// ==========================================
// 零售促销排期系统 - 输入校验器
// ==========================================
// 职责: API 入参的统一校验, 在引擎执行前拦截非法输入
// ==========================================

use chrono::NaiveDate;

use crate::api::error::{ApiError, ApiResult};
use crate::domain::types::CategoryChoice;

/// 每条分类选择的商品配额下限
pub const MIN_PRODUCTS_PER_CHOICE: u32 = 1;

/// 每条分类选择的商品配额上限
pub const MAX_PRODUCTS_PER_CHOICE: u32 = 30;

/// 校验配额覆写值
///
/// # 参数
/// - quota: 配额覆写（None 表示使用配置默认值, 不校验）
///
/// # 返回
/// - Ok(()): 校验通过
/// - Err(ApiError::InvalidInput): 配额超出 1..=30
pub fn validate_quota(quota: Option<u32>) -> ApiResult<()> {
    if let Some(q) = quota {
        if !(MIN_PRODUCTS_PER_CHOICE..=MAX_PRODUCTS_PER_CHOICE).contains(&q) {
            return Err(ApiError::InvalidInput(format!(
                "配额必须在 {}~{} 之间, 实际为 {}",
                MIN_PRODUCTS_PER_CHOICE, MAX_PRODUCTS_PER_CHOICE, q
            )));
        }
    }
    Ok(())
}

/// 解析计划日期（格式: YYYY-MM-DD）
pub fn parse_plan_date(date_str: &str) -> ApiResult<NaiveDate> {
    NaiveDate::parse_from_str(date_str.trim(), "%Y-%m-%d")
        .map_err(|_| ApiError::InvalidInput(format!("无效的日期格式: {}（应为 YYYY-MM-DD）", date_str)))
}

/// 校验单日分类选择非空
pub fn validate_daily_selections(selections: &[CategoryChoice]) -> ApiResult<()> {
    if selections.is_empty() {
        return Err(ApiError::InvalidInput(
            "分类选择不能为空, 至少需要一条".to_string(),
        ));
    }
    Ok(())
}

/// 校验多日分类选择: 允许个别日为空, 但整体必须至少有一条选择
pub fn validate_selection_groups(groups: &[Vec<CategoryChoice>]) -> ApiResult<()> {
    if groups.iter().all(|g| g.is_empty()) {
        return Err(ApiError::InvalidInput(
            "所有分类选择均为空, 无法生成计划".to_string(),
        ));
    }
    Ok(())
}

/// 校验快照名称非空
pub fn validate_snapshot_label(label: &str) -> ApiResult<()> {
    if label.trim().is_empty() {
        return Err(ApiError::InvalidInput("计划名称不能为空".to_string()));
    }
    Ok(())
}

/// 校验人工促销价为正数
pub fn validate_promo_price(price: f64) -> ApiResult<()> {
    if !price.is_finite() || price <= 0.0 {
        return Err(ApiError::InvalidInput(format!(
            "促销价必须为正数, 实际为 {}",
            price
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_quota() {
        assert!(validate_quota(None).is_ok());
        assert!(validate_quota(Some(1)).is_ok());
        assert!(validate_quota(Some(30)).is_ok());
        assert!(validate_quota(Some(0)).is_err());
        assert!(validate_quota(Some(31)).is_err());
    }

    #[test]
    fn test_parse_plan_date() {
        assert_eq!(
            parse_plan_date("2024-07-01").unwrap(),
            NaiveDate::from_ymd_opt(2024, 7, 1).unwrap()
        );
        // 容忍首尾空白
        assert!(parse_plan_date(" 2024-07-01 ").is_ok());
        assert!(parse_plan_date("2024/07/01").is_err());
        assert!(parse_plan_date("2024-13-01").is_err());
        assert!(parse_plan_date("").is_err());
    }

    #[test]
    fn test_validate_daily_selections() {
        assert!(validate_daily_selections(&[]).is_err());
        assert!(validate_daily_selections(&[CategoryChoice::literal("零食")]).is_ok());
    }

    #[test]
    fn test_validate_selection_groups() {
        assert!(validate_selection_groups(&[vec![], vec![]]).is_err());
        assert!(
            validate_selection_groups(&[vec![], vec![CategoryChoice::Random], vec![]]).is_ok()
        );
    }

    #[test]
    fn test_validate_snapshot_label() {
        assert!(validate_snapshot_label("七月第一周").is_ok());
        assert!(validate_snapshot_label("   ").is_err());
    }

    #[test]
    fn test_validate_promo_price() {
        assert!(validate_promo_price(199.0).is_ok());
        assert!(validate_promo_price(0.0).is_err());
        assert!(validate_promo_price(-1.0).is_err());
        assert!(validate_promo_price(f64::NAN).is_err());
    }
}
