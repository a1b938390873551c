// ==========================================
// 零售促销排期系统 - 促销资格过滤引擎
// ==========================================
// 红线: 资格判定只看价格门槛; 库存状态不得排除商品
// ==========================================
// 职责: 价格门槛过滤 + 分类清单提取
// 输入: 商品目录
// 输出: 合格商品列表（稳定过滤, 保持目录顺序）
// ==========================================

use crate::domain::product::Product;
use std::collections::HashSet;

// ==========================================
// EligibilityFilter - 促销资格过滤引擎
// ==========================================
pub struct EligibilityFilter {
    // 无状态引擎，不需要注入依赖
}

impl EligibilityFilter {
    /// 构造函数
    pub fn new() -> Self {
        Self {}
    }

    /// 过滤合格商品
    ///
    /// # 参数
    /// - products: 商品目录
    /// - min_price: 门槛价（销售价不低于此值才可参与促销）
    ///
    /// # 返回
    /// - 合格商品副本列表, 保持目录顺序（稳定过滤）
    ///
    /// # 说明
    /// - 只检查销售价; 库存状态、热度均不影响资格
    ///   （缺货商品照常入选, 由展示层标记）
    pub fn filter_eligible(&self, products: &[Product], min_price: f64) -> Vec<Product> {
        products
            .iter()
            .filter(|p| p.regular_price >= min_price)
            .cloned()
            .collect()
    }

    /// 提取全部分类名
    ///
    /// # 返回
    /// - 去重后的分类名列表, 按不区分大小写的字母序排列
    ///
    /// # 说明
    /// - 去重按精确值（"Drinks" 与 "drinks" 视为两个分类,
    ///   与分配时的精确匹配语义保持一致）
    pub fn unique_categories(&self, products: &[Product]) -> Vec<String> {
        let mut seen: HashSet<&str> = HashSet::new();
        let mut names: Vec<String> = Vec::new();
        for p in products {
            if seen.insert(p.category.as_str()) {
                names.push(p.category.clone());
            }
        }
        names.sort_by(|a, b| a.to_lowercase().cmp(&b.to_lowercase()));
        names
    }
}

impl Default for EligibilityFilter {
    fn default() -> Self {
        Self::new()
    }
}
