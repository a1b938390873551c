// ==========================================
// 零售促销排期系统 - 商品替换引擎
// ==========================================
// 红线: 替换不得引入计划内已存在的商品（同位置自替换除外）;
//       替换后的条目清空价格覆盖, 按新商品重新计价
// ==========================================
// 职责: 已生成计划内的单条目替换
// 策略: 自动替换优先同分类人气最高者, 同分类无候选时
//       跨分类兜底; 手动替换支持关键字检索候选
// ==========================================

use crate::domain::plan::{MonthPlan, PromoItem, UsedProductSet, WeekPlan};
use crate::domain::product::Product;
use thiserror::Error;

// ==========================================
// 错误定义
// ==========================================
#[derive(Error, Debug)]
pub enum ReplacementError {
    #[error("替换位置无效: {message}")]
    InvalidLocation { message: String },

    #[error("商品 {product_id} 已存在于当前计划中, 不能重复选入")]
    DuplicateProduct { product_id: String },
}

// ==========================================
// ReplacementResolver - 商品替换引擎
// ==========================================
pub struct ReplacementResolver {
    // 无状态引擎，不需要注入依赖
}

impl ReplacementResolver {
    /// 构造函数
    pub fn new() -> Self {
        Self {}
    }

    /// 自动替换候选列表
    ///
    /// # 参数
    /// - target: 被替换的商品
    /// - eligible: 合格商品列表
    /// - used: 当前计划已用商品集合
    ///
    /// # 返回
    /// - 同分类未用候选按人气降序; 同分类无候选时跨分类兜底
    pub fn candidates(
        &self,
        target: &Product,
        eligible: &[Product],
        used: &UsedProductSet,
    ) -> Vec<Product> {
        let mut same_category: Vec<Product> = eligible
            .iter()
            .filter(|p| {
                p.category == target.category
                    && p.product_id != target.product_id
                    && !used.is_used(&p.product_id)
            })
            .cloned()
            .collect();
        same_category.sort_by(|a, b| b.popularity.cmp(&a.popularity));
        if !same_category.is_empty() {
            return same_category;
        }

        // 同分类耗尽, 跨分类兜底
        let mut fallback: Vec<Product> = eligible
            .iter()
            .filter(|p| p.product_id != target.product_id && !used.is_used(&p.product_id))
            .cloned()
            .collect();
        fallback.sort_by(|a, b| b.popularity.cmp(&a.popularity));
        fallback
    }

    /// 自动替换: 取候选列表首位
    pub fn resolve_auto(
        &self,
        target: &Product,
        eligible: &[Product],
        used: &UsedProductSet,
    ) -> Option<Product> {
        self.candidates(target, eligible, used).into_iter().next()
    }

    /// 手动替换检索
    ///
    /// # 参数
    /// - query: 关键字, 对编号/名称/品牌/供应商做大小写不敏感子串匹配
    /// - exclude_id: 被替换商品自身的编号（始终排除）
    ///
    /// # 说明
    /// - 空关键字匹配全部可选商品; 结果按人气降序
    pub fn search(
        &self,
        query: &str,
        eligible: &[Product],
        used: &UsedProductSet,
        exclude_id: &str,
    ) -> Vec<Product> {
        let needle = query.trim().to_lowercase();
        let mut matches: Vec<Product> = eligible
            .iter()
            .filter(|p| p.product_id != exclude_id && !used.is_used(&p.product_id))
            .filter(|p| {
                if needle.is_empty() {
                    return true;
                }
                let hit_field = |field: &str| field.to_lowercase().contains(&needle);
                hit_field(&p.product_id)
                    || hit_field(&p.product_name)
                    || p.brand.as_deref().map(hit_field).unwrap_or(false)
                    || p.supplier.as_deref().map(hit_field).unwrap_or(false)
            })
            .cloned()
            .collect();
        matches.sort_by(|a, b| b.popularity.cmp(&a.popularity));
        matches
    }

    /// 替换周计划内的单个条目
    ///
    /// # 参数
    /// - day_index / item_index: 条目在周内的位置
    /// - replacement: 替入商品
    /// - reason: 分配原因（自动/手动替换）
    ///
    /// # 返回
    /// - 被替换下的原商品
    pub fn replace_in_week(
        &self,
        week: &mut WeekPlan,
        day_index: usize,
        item_index: usize,
        replacement: Product,
        reason: &str,
    ) -> Result<Product, ReplacementError> {
        // 排他校验要看替换前的整周状态, 先于取可变引用计算
        let used = UsedProductSet::from_week(week);

        let slot = week.days.get_mut(day_index).ok_or_else(|| {
            ReplacementError::InvalidLocation {
                message: format!("周内不存在第 {} 天", day_index),
            }
        })?;
        let item = slot.items.get_mut(item_index).ok_or_else(|| {
            ReplacementError::InvalidLocation {
                message: format!("第 {} 天不存在第 {} 个条目", day_index, item_index),
            }
        })?;

        // 同商品自替换视作无操作
        if item.product_id() == replacement.product_id {
            return Ok(replacement);
        }
        if used.is_used(&replacement.product_id) {
            return Err(ReplacementError::DuplicateProduct {
                product_id: replacement.product_id,
            });
        }

        let old = item.product.clone();
        *item = PromoItem::from_product(replacement, reason);
        Ok(old)
    }

    /// 替换月计划内的单个条目
    pub fn replace_in_month(
        &self,
        month: &mut MonthPlan,
        week_index: usize,
        day_index: usize,
        item_index: usize,
        replacement: Product,
        reason: &str,
    ) -> Result<Product, ReplacementError> {
        // 排他范围是整个月计划, 不能只看所在周
        let used = UsedProductSet::from_month(month);

        let week = month.weeks.get_mut(week_index).ok_or_else(|| {
            ReplacementError::InvalidLocation {
                message: format!("月内不存在第 {} 周", week_index),
            }
        })?;
        let slot = week.days.get_mut(day_index).ok_or_else(|| {
            ReplacementError::InvalidLocation {
                message: format!("第 {} 周不存在第 {} 天", week_index, day_index),
            }
        })?;
        let item = slot.items.get_mut(item_index).ok_or_else(|| {
            ReplacementError::InvalidLocation {
                message: format!("第 {} 天不存在第 {} 个条目", day_index, item_index),
            }
        })?;

        if item.product_id() == replacement.product_id {
            return Ok(replacement);
        }
        if used.is_used(&replacement.product_id) {
            return Err(ReplacementError::DuplicateProduct {
                product_id: replacement.product_id,
            });
        }

        let old = item.product.clone();
        *item = PromoItem::from_product(replacement, reason);
        Ok(old)
    }
}

impl Default for ReplacementResolver {
    fn default() -> Self {
        Self::new()
    }
}
