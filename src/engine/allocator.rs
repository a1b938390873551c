// ==========================================
// 零售促销排期系统 - 槽位分配引擎
// ==========================================
// 红线: 已用商品集合贯穿整个计划范围, 任何候选在
//       标记已用后对后续所有选择不可见（不放回抽取）
// ==========================================
// 职责: 按槽位内选择的配置顺序逐条填充促销条目
// 策略: 分类字面选择 = 人气降序取前 N; 随机选择 = 全
//       未用池洗牌截断（不限定任何分类）
// 说明: 供给不足时静默少填, 短缺拦截由可用性分析负责
// ==========================================

use crate::domain::plan::{assign_reason, DaySlot, PromoItem, UsedProductSet};
use crate::domain::product::Product;
use crate::domain::types::CategoryChoice;
use rand::seq::SliceRandom;
use rand::Rng;
use tracing::debug;

// ==========================================
// SlotAllocator - 槽位分配引擎
// ==========================================
pub struct SlotAllocator {
    // 无状态引擎，不需要注入依赖
}

impl SlotAllocator {
    /// 构造函数
    pub fn new() -> Self {
        Self {}
    }

    /// 填充单个日槽位
    ///
    /// # 参数
    /// - eligible: 合格商品列表（已通过资格过滤）
    /// - slot: 待填充的日槽位（选择已就位, items 追加写入）
    /// - used: 计划范围内共享的已用商品集合
    /// - quota: 每条选择的商品配额
    /// - rng: 随机源（随机选择洗牌用）
    pub fn fill_slot<R: Rng>(
        &self,
        eligible: &[Product],
        slot: &mut DaySlot,
        used: &mut UsedProductSet,
        quota: u32,
        rng: &mut R,
    ) {
        let selections = slot.selections.clone();
        for choice in &selections {
            let picked = match choice {
                CategoryChoice::Random => self.pick_random(eligible, used, quota, rng),
                CategoryChoice::Literal(name) => {
                    self.pick_category_top(eligible, used, name, quota)
                }
            };
            let reason = match choice {
                CategoryChoice::Random => assign_reason::RANDOM_POOL,
                CategoryChoice::Literal(_) => assign_reason::CATEGORY_TOP,
            };
            for product in picked {
                used.mark_used(&product.product_id);
                slot.items.push(PromoItem::from_product(product, reason));
            }
        }
        debug!(
            date = %slot.slot_date,
            item_count = slot.items.len(),
            "日槽位填充完成"
        );
    }

    /// 依序填充一组日槽位（共享同一个已用集合）
    pub fn fill_schedule<R: Rng>(
        &self,
        eligible: &[Product],
        slots: &mut [DaySlot],
        used: &mut UsedProductSet,
        quota: u32,
        rng: &mut R,
    ) {
        for slot in slots.iter_mut() {
            self.fill_slot(eligible, slot, used, quota, rng);
        }
    }

    // ==========================================
    // 内部选取策略
    // ==========================================

    /// 分类字面选择: 未用 + 分类精确匹配, 人气降序取前 quota 个
    ///
    /// 排序为稳定排序, 人气相同保持目录原始顺序
    fn pick_category_top(
        &self,
        eligible: &[Product],
        used: &UsedProductSet,
        category: &str,
        quota: u32,
    ) -> Vec<Product> {
        let mut candidates: Vec<Product> = eligible
            .iter()
            .filter(|p| !used.is_used(&p.product_id) && p.category == category)
            .cloned()
            .collect();
        candidates.sort_by(|a, b| b.popularity.cmp(&a.popularity));
        candidates.truncate(quota as usize);
        candidates
    }

    /// 随机选择: 全部未用商品均匀洗牌后取前 quota 个
    ///
    /// 池大小恰为 quota 时整池入选; 不足 quota 时全数入选
    fn pick_random<R: Rng>(
        &self,
        eligible: &[Product],
        used: &UsedProductSet,
        quota: u32,
        rng: &mut R,
    ) -> Vec<Product> {
        let mut pool: Vec<Product> = eligible
            .iter()
            .filter(|p| !used.is_used(&p.product_id))
            .cloned()
            .collect();
        pool.shuffle(rng);
        pool.truncate(quota as usize);
        pool
    }
}

impl Default for SlotAllocator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::StockStatus;
    use chrono::NaiveDate;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

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

    fn create_test_slot(selections: Vec<CategoryChoice>) -> DaySlot {
        let date = NaiveDate::from_ymd_opt(2024, 7, 1).unwrap();
        DaySlot::new(date, "周一".to_string(), selections)
    }

    #[test]
    fn test_fill_slot_category_top_by_popularity() {
        // 分类选择取人气前 3: S1(50) S2(40) S3(30)
        let catalog = create_test_catalog();
        let mut slot = create_test_slot(vec![CategoryChoice::literal("Snacks")]);
        let mut used = UsedProductSet::new();
        let mut rng = StdRng::seed_from_u64(42);

        let allocator = SlotAllocator::new();
        allocator.fill_slot(&catalog, &mut slot, &mut used, 3, &mut rng);

        let ids: Vec<&str> = slot.items.iter().map(|i| i.product_id()).collect();
        assert_eq!(ids, vec!["S1", "S2", "S3"]);
        assert!(slot
            .items
            .iter()
            .all(|i| i.assign_reason == assign_reason::CATEGORY_TOP));
    }

    #[test]
    fn test_fill_slot_graceful_shortfall() {
        // Snacks 只剩 4 个, 配额 5 → 全取 4 个, 不报错
        let catalog = create_test_catalog();
        let mut slot = create_test_slot(vec![CategoryChoice::literal("Snacks")]);
        let mut used = UsedProductSet::new();
        let mut rng = StdRng::seed_from_u64(42);

        let allocator = SlotAllocator::new();
        allocator.fill_slot(&catalog, &mut slot, &mut used, 5, &mut rng);
        assert_eq!(slot.items.len(), 4);
    }

    #[test]
    fn test_fill_slot_choices_in_configured_order() {
        // 重排分配场景: [Snacks, Drinks, Drinks] 配额 3
        // Snacks 取前 3, Drinks 两条选择共消耗 6 个
        let catalog = create_test_catalog();
        let mut slot = create_test_slot(vec![
            CategoryChoice::literal("Snacks"),
            CategoryChoice::literal("Drinks"),
            CategoryChoice::literal("Drinks"),
        ]);
        let mut used = UsedProductSet::new();
        let mut rng = StdRng::seed_from_u64(42);

        let allocator = SlotAllocator::new();
        allocator.fill_slot(&catalog, &mut slot, &mut used, 3, &mut rng);

        let ids: Vec<&str> = slot.items.iter().map(|i| i.product_id()).collect();
        // 第一条 Drinks 取 D6(60) D5(50) D4(40), 第二条取剩余 D3 D2 D1
        assert_eq!(ids, vec!["S1", "S2", "S3", "D6", "D5", "D4", "D3", "D2", "D1"]);
    }

    #[test]
    fn test_fill_slot_random_whole_pool_when_exact() {
        // 未用池大小 == 配额 → 整池入选（顺序随机但成员确定）
        let catalog: Vec<Product> = (1..=3)
            .map(|i| create_test_product(&format!("P{}", i), "Snacks", i))
            .collect();
        let mut slot = create_test_slot(vec![CategoryChoice::Random]);
        let mut used = UsedProductSet::new();
        let mut rng = StdRng::seed_from_u64(7);

        let allocator = SlotAllocator::new();
        allocator.fill_slot(&catalog, &mut slot, &mut used, 3, &mut rng);

        let ids: HashSet<&str> = slot.items.iter().map(|i| i.product_id()).collect();
        assert_eq!(ids, HashSet::from(["P1", "P2", "P3"]));
        assert!(slot
            .items
            .iter()
            .all(|i| i.assign_reason == assign_reason::RANDOM_POOL));
    }

    #[test]
    fn test_fill_slot_random_draws_across_categories() {
        // 随机选择从全池抽取, 多种子下可观察到跨分类成员
        let catalog = create_test_catalog();
        let allocator = SlotAllocator::new();

        let mut seen_categories: HashSet<String> = HashSet::new();
        for seed in 0..20 {
            let mut slot = create_test_slot(vec![CategoryChoice::Random]);
            let mut used = UsedProductSet::new();
            let mut rng = StdRng::seed_from_u64(seed);
            allocator.fill_slot(&catalog, &mut slot, &mut used, 3, &mut rng);
            assert_eq!(slot.items.len(), 3);
            for item in &slot.items {
                seen_categories.insert(item.product.category.clone());
            }
        }
        assert!(seen_categories.contains("Snacks"));
        assert!(seen_categories.contains("Drinks"));
    }

    #[test]
    fn test_fill_schedule_no_product_repeats() {
        // 跨槽位排他: 同一商品整个计划只出现一次
        let catalog = create_test_catalog();
        let mut slots = vec![
            create_test_slot(vec![CategoryChoice::literal("Drinks")]),
            create_test_slot(vec![CategoryChoice::literal("Drinks")]),
        ];
        let mut used = UsedProductSet::new();
        let mut rng = StdRng::seed_from_u64(42);

        let allocator = SlotAllocator::new();
        allocator.fill_schedule(&catalog, &mut slots, &mut used, 3, &mut rng);

        // 第一天 D6 D5 D4, 第二天只剩 D3 D2 D1
        let day1: Vec<&str> = slots[0].items.iter().map(|i| i.product_id()).collect();
        let day2: Vec<&str> = slots[1].items.iter().map(|i| i.product_id()).collect();
        assert_eq!(day1, vec!["D6", "D5", "D4"]);
        assert_eq!(day2, vec!["D3", "D2", "D1"]);

        let mut all_ids: Vec<&str> = Vec::new();
        all_ids.extend(&day1);
        all_ids.extend(&day2);
        let unique: HashSet<&&str> = all_ids.iter().collect();
        assert_eq!(unique.len(), all_ids.len());
    }

    #[test]
    fn test_pick_category_top_stable_on_popularity_tie() {
        // 人气并列时保持目录原始顺序（稳定排序）
        let catalog = vec![
            create_test_product("A", "Snacks", 30),
            create_test_product("B", "Snacks", 30),
            create_test_product("C", "Snacks", 30),
        ];
        let mut slot = create_test_slot(vec![CategoryChoice::literal("Snacks")]);
        let mut used = UsedProductSet::new();
        let mut rng = StdRng::seed_from_u64(42);

        let allocator = SlotAllocator::new();
        allocator.fill_slot(&catalog, &mut slot, &mut used, 2, &mut rng);

        let ids: Vec<&str> = slot.items.iter().map(|i| i.product_id()).collect();
        assert_eq!(ids, vec!["A", "B"]);
    }

    #[test]
    fn test_fill_slot_random_excludes_used() {
        // 已用商品对随机池同样不可见
        let catalog = create_test_catalog();
        let mut used = UsedProductSet::new();
        for p in catalog.iter().filter(|p| p.category == "Snacks") {
            used.mark_used(&p.product_id);
        }
        let mut slot = create_test_slot(vec![CategoryChoice::Random]);
        let mut rng = StdRng::seed_from_u64(42);

        let allocator = SlotAllocator::new();
        allocator.fill_slot(&catalog, &mut slot, &mut used, 6, &mut rng);

        assert_eq!(slot.items.len(), 6);
        assert!(slot.items.iter().all(|i| i.product.category == "Drinks"));
    }
}
