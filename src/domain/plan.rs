// ==========================================
// 零售促销排期系统 - 计划实体
// ==========================================
// 职责: 日槽位/周计划/月计划结构 + 已用商品集合 + 计划快照
// 红线: 同一计划范围内任何商品编号最多出现一次,
//       由 UsedProductSet 在生成全程显式传递保证
// ==========================================

use crate::domain::product::Product;
use crate::domain::types::{CategoryChoice, PlanScope};
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

// ==========================================
// 入选原因
// ==========================================
// 说明: 每个入选商品必须落一个 reason, 供人工追溯
pub mod assign_reason {
    /// 分类内按热度取前 N
    pub const CATEGORY_TOP: &str = "CATEGORY_TOP";
    /// 随机选品（全池均匀抽取）
    pub const RANDOM_POOL: &str = "RANDOM_POOL";
    /// 自动推荐替换
    pub const AUTO_REPLACEMENT: &str = "AUTO_REPLACEMENT";
    /// 人工指定替换
    pub const MANUAL_REPLACEMENT: &str = "MANUAL_REPLACEMENT";
}

// ==========================================
// 已选商品（计划内副本）
// ==========================================
// 说明: 计划持有商品的独立副本, 促销价调整只改副本,
//       不回写商品目录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromoItem {
    pub product: Product,                   // 商品副本
    pub custom_price: Option<f64>,          // 促销价（人工调整后）
    pub custom_margin_percent: Option<f64>, // 调整后毛利率
    pub assign_reason: String,              // 入选原因
}

impl PromoItem {
    /// 从目录商品生成计划内副本
    pub fn from_product(product: Product, assign_reason: &str) -> Self {
        Self {
            product,
            custom_price: None,
            custom_margin_percent: None,
            assign_reason: assign_reason.to_string(),
        }
    }

    /// 商品编号
    pub fn product_id(&self) -> &str {
        &self.product.product_id
    }

    /// 当前生效价格（有促销价取促销价, 否则取目录价）
    pub fn effective_price(&self) -> f64 {
        self.custom_price.unwrap_or(self.product.regular_price)
    }

    /// 应用促销价调整, 同步重算毛利率
    ///
    /// # 说明
    /// - 采购成本缺失（非正）时毛利率记 None, 价格照常生效
    pub fn apply_price_override(&mut self, new_price: f64) {
        self.custom_price = Some(new_price);
        self.custom_margin_percent =
            if new_price > 0.0 && self.product.purchase_cost > 0.0 {
                Some((new_price - self.product.purchase_cost) / new_price * 100.0)
            } else {
                None
            };
    }

    /// 清除促销价调整
    pub fn clear_price_override(&mut self) {
        self.custom_price = None;
        self.custom_margin_percent = None;
    }
}

// ==========================================
// 日槽位
// ==========================================
// 说明: 计划的原子单元。创建时为空, 由分配器一次性填充,
//       之后仅允许替换单品或调价两种原地修改
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DaySlot {
    pub slot_date: NaiveDate,               // 日期
    pub day_name: String,                   // 星期名（周一..周日）
    pub selections: Vec<CategoryChoice>,    // 当日分类选择（有序, 允许重复）
    pub items: Vec<PromoItem>,              // 已选商品
}

impl DaySlot {
    /// 创建空槽位
    pub fn new(slot_date: NaiveDate, day_name: String, selections: Vec<CategoryChoice>) -> Self {
        Self {
            slot_date,
            day_name,
            selections,
            items: Vec::new(),
        }
    }

    /// 槽位内全部商品编号
    pub fn product_ids(&self) -> Vec<String> {
        self.items.iter().map(|i| i.product_id().to_string()).collect()
    }
}

// ==========================================
// 周计划
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeekPlan {
    pub week_number: u32,      // ISO 周号
    pub start_date: NaiveDate, // 周一
    pub end_date: NaiveDate,   // 周日
    pub days: Vec<DaySlot>,
}

impl WeekPlan {
    /// 全周商品编号（按槽位顺序）
    pub fn product_ids(&self) -> Vec<String> {
        self.days.iter().flat_map(|d| d.product_ids()).collect()
    }

    /// 全周已选商品数
    pub fn total_items(&self) -> usize {
        self.days.iter().map(|d| d.items.len()).sum()
    }
}

// ==========================================
// 月计划
// ==========================================
// 说明: 覆盖与该月相交的全部自然周; 边界周包含上/下月日期,
//       因此总天数可能超过该月日历天数
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthPlan {
    pub year: i32,
    pub month: u32,
    pub weeks: Vec<WeekPlan>,
}

impl MonthPlan {
    /// 计划内实际天数（所有周的天数之和, 可能大于日历天数）
    pub fn total_days(&self) -> usize {
        self.weeks.iter().map(|w| w.days.len()).sum()
    }

    /// 全月商品编号（按周、槽位顺序）
    pub fn product_ids(&self) -> Vec<String> {
        self.weeks.iter().flat_map(|w| w.product_ids()).collect()
    }

    /// 全月已选商品数
    pub fn total_items(&self) -> usize {
        self.weeks.iter().map(|w| w.total_items()).sum()
    }
}

// ==========================================
// 计划快照
// ==========================================
// 说明: 载荷为不透明 JSON, 仓储层不理解计划结构
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanSnapshot {
    pub snapshot_id: String,      // 快照ID (UUID)
    pub plan_scope: PlanScope,    // 计划范围
    pub plan_label: String,       // 人工命名
    pub payload_json: String,     // 计划序列化载荷
    pub created_at: NaiveDateTime, // 保存时间
}

// ==========================================
// 已用商品集合
// ==========================================
// 说明: 整个分配器的核心不变量载体。
//       一次计划生成持有唯一实例, 以 &mut 显式穿透
//       日→周→月的每一层分配调用; 计划定稿后丢弃,
//       替换操作通过扫描既有计划重建
#[derive(Debug, Clone, Default)]
pub struct UsedProductSet {
    ids: HashSet<String>,
}

impl UsedProductSet {
    /// 创建空集合
    pub fn new() -> Self {
        Self::default()
    }

    /// 标记商品已用
    ///
    /// # 返回
    /// - true: 首次标记
    /// - false: 此前已标记（调用方视为分配逻辑缺陷）
    pub fn mark_used(&mut self, product_id: &str) -> bool {
        self.ids.insert(product_id.to_string())
    }

    /// 是否已用
    pub fn is_used(&self, product_id: &str) -> bool {
        self.ids.contains(product_id)
    }

    /// 释放商品（替换流程移除旧商品时使用）
    pub fn release(&mut self, product_id: &str) -> bool {
        self.ids.remove(product_id)
    }

    /// 已用数量
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// 从既有槽位序列重建（替换前扫描）
    pub fn from_slots(slots: &[DaySlot]) -> Self {
        let mut set = Self::new();
        for slot in slots {
            for item in &slot.items {
                set.mark_used(item.product_id());
            }
        }
        set
    }

    /// 从周计划重建
    pub fn from_week(week: &WeekPlan) -> Self {
        Self::from_slots(&week.days)
    }

    /// 从月计划重建
    pub fn from_month(month: &MonthPlan) -> Self {
        let mut set = Self::new();
        for week in &month.weeks {
            for slot in &week.days {
                for item in &slot.items {
                    set.mark_used(item.product_id());
                }
            }
        }
        set
    }
}
