// ==========================================
// 零售促销排期系统 - 分类可用性分析引擎
// ==========================================
// 红线: 需求核算覆盖整个待生成计划, 不按单槽位核算
//       （分配器全程不放回消耗, 局部核算会漏报短缺）
// ==========================================
// 职责: 按分类统计合格供给, 与全计划累计需求比对
// 输入: 合格商品 + 各槽位分类选择 + 单选择需求量
// 输出: 可用性报告（短缺以数据形式返回, 永不抛错）
// ==========================================

use crate::domain::product::Product;
use crate::domain::types::CategoryChoice;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ==========================================
// 可用性报告
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AvailabilityReport {
    /// 各分类合格商品数
    pub available_by_category: HashMap<String, usize>,
    /// 各分类累计需求数（仅统计出现在选择中的分类）
    pub required_by_category: HashMap<String, usize>,
    /// 有需求但无任何合格商品的分类
    pub empty_categories: Vec<String>,
    /// 有商品但不足以覆盖需求的分类
    pub insufficient_categories: Vec<String>,
}

impl AvailabilityReport {
    /// 是否可直接分配（两类短缺均为空）
    pub fn is_valid(&self) -> bool {
        self.empty_categories.is_empty() && self.insufficient_categories.is_empty()
    }

    /// 全部短缺分类（空缺 ∪ 不足, 排序后返回）
    pub fn failing_categories(&self) -> Vec<String> {
        let mut failing: Vec<String> = self
            .empty_categories
            .iter()
            .chain(self.insufficient_categories.iter())
            .cloned()
            .collect();
        failing.sort();
        failing.dedup();
        failing
    }
}

// ==========================================
// AvailabilityAnalyzer - 分类可用性分析引擎
// ==========================================
pub struct AvailabilityAnalyzer {
    // 无状态引擎，不需要注入依赖
}

impl AvailabilityAnalyzer {
    /// 构造函数
    pub fn new() -> Self {
        Self {}
    }

    /// 按分类统计合格商品数
    pub fn available_by_category(&self, eligible: &[Product]) -> HashMap<String, usize> {
        let mut available: HashMap<String, usize> = HashMap::new();
        for p in eligible {
            *available.entry(p.category.clone()).or_insert(0) += 1;
        }
        available
    }

    /// 可用性分析
    ///
    /// # 参数
    /// - eligible: 合格商品列表
    /// - selections: 各槽位的分类选择（同一分类可多次出现, 需求累加）
    /// - demand_per_choice: 单条选择的需求量
    ///   （日/周计划 = 配额; 月计划 = 配额 × 7, 周级选择覆盖整周每天）
    ///
    /// # 返回
    /// - 可用性报告; 随机选择不参与核算（随机从全池抽取, 不受分类约束）
    pub fn analyze(
        &self,
        eligible: &[Product],
        selections: &[Vec<CategoryChoice>],
        demand_per_choice: u32,
    ) -> AvailabilityReport {
        let available_by_category = self.available_by_category(eligible);

        // 累计需求: 每出现一次分类字面选择, 需求加 demand_per_choice
        let mut required_by_category: HashMap<String, usize> = HashMap::new();
        for slot in selections {
            for choice in slot {
                if let CategoryChoice::Literal(name) = choice {
                    *required_by_category.entry(name.clone()).or_insert(0) +=
                        demand_per_choice as usize;
                }
            }
        }

        let mut empty_categories = Vec::new();
        let mut insufficient_categories = Vec::new();
        for (category, required) in &required_by_category {
            let available = available_by_category.get(category).copied().unwrap_or(0);
            if available == 0 {
                empty_categories.push(category.clone());
            } else if available < *required {
                insufficient_categories.push(category.clone());
            }
        }
        // HashMap 遍历顺序不定, 排序保证报告稳定
        empty_categories.sort();
        insufficient_categories.sort();

        AvailabilityReport {
            available_by_category,
            required_by_category,
            empty_categories,
            insufficient_categories,
        }
    }
}

impl Default for AvailabilityAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::StockStatus;

    // ==========================================
    // 测试辅助函数
    // ==========================================
    fn create_test_product(id: &str, category: &str, popularity: i64) -> Product {
        Product {
            product_id: id.to_string(),
            product_name: format!("商品{}", id),
            category: category.to_string(),
            brand: None,
            supplier: None,
            popularity,
            regular_price: 299.0,
            purchase_cost: 150.0,
            stock_status: StockStatus::InStock,
        }
    }

    /// 4 个零食 + 6 个饮料的标准测试目录
    fn create_test_catalog() -> Vec<Product> {
        let mut products = vec![
            create_test_product("S1", "Snacks", 50),
            create_test_product("S2", "Snacks", 40),
            create_test_product("S3", "Snacks", 30),
            create_test_product("S4", "Snacks", 20),
        ];
        for i in 1..=6 {
            products.push(create_test_product(&format!("D{}", i), "Drinks", 10 * i));
        }
        products
    }

    #[test]
    fn test_analyze_insufficient_category() {
        // 单日选择 [Snacks, Snacks, Drinks], 配额 3:
        // Snacks 需求 6 > 供给 4 → 不足
        let catalog = create_test_catalog();
        let selections = vec![vec![
            CategoryChoice::literal("Snacks"),
            CategoryChoice::literal("Snacks"),
            CategoryChoice::literal("Drinks"),
        ]];

        let analyzer = AvailabilityAnalyzer::new();
        let report = analyzer.analyze(&catalog, &selections, 3);

        assert!(!report.is_valid());
        assert!(report.empty_categories.is_empty());
        assert_eq!(report.insufficient_categories, vec!["Snacks"]);
        assert_eq!(report.required_by_category["Snacks"], 6);
        assert_eq!(report.available_by_category["Snacks"], 4);
        // Drinks 需求 3 ≤ 供给 6, 不在短缺之列
        assert_eq!(report.required_by_category["Drinks"], 3);
    }

    #[test]
    fn test_analyze_empty_category() {
        let catalog = create_test_catalog();
        let selections = vec![vec![CategoryChoice::literal("Fruits")]];

        let analyzer = AvailabilityAnalyzer::new();
        let report = analyzer.analyze(&catalog, &selections, 3);

        assert_eq!(report.empty_categories, vec!["Fruits"]);
        assert!(report.insufficient_categories.is_empty());
        assert_eq!(report.failing_categories(), vec!["Fruits"]);
    }

    #[test]
    fn test_analyze_random_never_listed() {
        // 随机选择不参与分类核算
        let catalog = create_test_catalog();
        let selections = vec![vec![
            CategoryChoice::Random,
            CategoryChoice::Random,
            CategoryChoice::Random,
            CategoryChoice::Random,
        ]];

        let analyzer = AvailabilityAnalyzer::new();
        let report = analyzer.analyze(&catalog, &selections, 3);

        // 需求 12 > 总供给 10, 但随机不按分类核算, 报告有效
        assert!(report.is_valid());
        assert!(report.required_by_category.is_empty());
    }

    #[test]
    fn test_analyze_accumulates_across_slots() {
        // 跨槽位需求累加: 两个槽位各选一次 Drinks, 配额 3 → 需求 6
        let catalog = create_test_catalog();
        let selections = vec![
            vec![CategoryChoice::literal("Drinks")],
            vec![CategoryChoice::literal("Drinks")],
        ];

        let analyzer = AvailabilityAnalyzer::new();
        let report = analyzer.analyze(&catalog, &selections, 3);
        assert_eq!(report.required_by_category["Drinks"], 6);
        assert!(report.is_valid());

        // 第三个槽位再选一次 → 需求 9 > 供给 6
        let selections = vec![
            vec![CategoryChoice::literal("Drinks")],
            vec![CategoryChoice::literal("Drinks")],
            vec![CategoryChoice::literal("Drinks")],
        ];
        let report = analyzer.analyze(&catalog, &selections, 3);
        assert_eq!(report.insufficient_categories, vec!["Drinks"]);
    }

    #[test]
    fn test_analyze_monthly_demand_multiplier() {
        // 月计划按 配额×7 核算: 一条周级 Drinks 选择, 配额 1 → 需求 7 > 供给 6
        let catalog = create_test_catalog();
        let selections = vec![vec![CategoryChoice::literal("Drinks")]];

        let analyzer = AvailabilityAnalyzer::new();
        let report = analyzer.analyze(&catalog, &selections, 7);
        assert_eq!(report.insufficient_categories, vec!["Drinks"]);
        assert_eq!(report.required_by_category["Drinks"], 7);
    }

    #[test]
    fn test_failing_categories_merged_sorted() {
        let catalog = create_test_catalog();
        let selections = vec![vec![
            CategoryChoice::literal("Fruits"),
            CategoryChoice::literal("Snacks"),
            CategoryChoice::literal("Snacks"),
        ]];

        let analyzer = AvailabilityAnalyzer::new();
        let report = analyzer.analyze(&catalog, &selections, 3);
        // Fruits 空缺 + Snacks 不足, 合并排序
        assert_eq!(report.failing_categories(), vec!["Fruits", "Snacks"]);
    }
}
