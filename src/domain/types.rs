// ==========================================
// 零售促销排期系统 - 核心类型定义
// ==========================================
// 职责: 定义库存状态、分类选择、计划范围等枚举类型
// 红线: 类型层不含业务规则, 只含取值与转换
// ==========================================

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

// ==========================================
// 库存状态
// ==========================================
// 说明: 库存状态不影响促销资格(缺货商品仍可入选),
//       仅用于展示层标记
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StockStatus {
    /// 有货
    InStock,
    /// 缺货
    OutOfStock,
    /// 低库存
    LowStock,
    /// 可预订
    BackOrder,
    /// 未知
    Unknown,
}

impl StockStatus {
    /// 从导入数据解析库存状态
    ///
    /// # 参数
    /// - s: 原始字符串（兼容电商导出格式与中文标注）
    ///
    /// # 返回
    /// - 无法识别时返回 Unknown（导入不因此失败）
    pub fn from_str(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "instock" | "in_stock" | "有货" | "现货" => StockStatus::InStock,
            "outofstock" | "out_of_stock" | "缺货" | "无货" => StockStatus::OutOfStock,
            "lowstock" | "low_stock" | "低库存" => StockStatus::LowStock,
            "onbackorder" | "backorder" | "back_order" | "可预订" | "预订" => {
                StockStatus::BackOrder
            }
            _ => StockStatus::Unknown,
        }
    }

    /// 转换为数据库存储字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            StockStatus::InStock => "IN_STOCK",
            StockStatus::OutOfStock => "OUT_OF_STOCK",
            StockStatus::LowStock => "LOW_STOCK",
            StockStatus::BackOrder => "BACK_ORDER",
            StockStatus::Unknown => "UNKNOWN",
        }
    }

    /// 从数据库字符串还原
    pub fn from_db_str(s: &str) -> Self {
        match s {
            "IN_STOCK" => StockStatus::InStock,
            "OUT_OF_STOCK" => StockStatus::OutOfStock,
            "LOW_STOCK" => StockStatus::LowStock,
            "BACK_ORDER" => StockStatus::BackOrder,
            _ => StockStatus::Unknown,
        }
    }

    /// 是否缺货（展示层用）
    pub fn is_out_of_stock(&self) -> bool {
        matches!(self, StockStatus::OutOfStock)
    }
}

impl Default for StockStatus {
    fn default() -> Self {
        StockStatus::Unknown
    }
}

impl fmt::Display for StockStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            StockStatus::InStock => "有货",
            StockStatus::OutOfStock => "缺货",
            StockStatus::LowStock => "低库存",
            StockStatus::BackOrder => "可预订",
            StockStatus::Unknown => "未知",
        };
        write!(f, "{}", label)
    }
}

// ==========================================
// 分类选择
// ==========================================
// 说明: 每个时段的一次选择要么指向具体分类,
//       要么是"随机"(从全部未用合格商品池抽取)。
//       随机不是分类名的特殊取值, 而是独立变体,
//       避免字符串哨兵值在比较时被误当作分类。
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CategoryChoice {
    /// 具体分类（按分类名精确匹配）
    Literal(String),
    /// 随机选品（忽略分类, 从全部未用合格商品抽取）
    Random,
}

impl CategoryChoice {
    /// 构造具体分类选择（去除首尾空白）
    pub fn literal(name: &str) -> Self {
        CategoryChoice::Literal(name.trim().to_string())
    }

    /// 从外部字符串解析
    ///
    /// # 说明
    /// - "Random"（忽略大小写）与"随机"解析为随机选品
    /// - 其余任何非空内容均视为具体分类名
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.eq_ignore_ascii_case("random") || trimmed == "随机" {
            CategoryChoice::Random
        } else {
            CategoryChoice::Literal(trimmed.to_string())
        }
    }

    /// 是否为随机选品
    pub fn is_random(&self) -> bool {
        matches!(self, CategoryChoice::Random)
    }

    /// 对外展示名（随机显示为 "Random"，与外部数据格式保持一致）
    pub fn display_name(&self) -> &str {
        match self {
            CategoryChoice::Literal(name) => name,
            CategoryChoice::Random => "Random",
        }
    }

    /// 判断某分类是否命中本选择（仅 Literal 按精确匹配; Random 永不命中）
    pub fn matches_category(&self, category: &str) -> bool {
        match self {
            CategoryChoice::Literal(name) => name == category,
            CategoryChoice::Random => false,
        }
    }
}

impl fmt::Display for CategoryChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

// 与外部数据格式（纯字符串）保持兼容: 序列化为展示名, 反序列化走 parse
impl Serialize for CategoryChoice {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.display_name())
    }
}

impl<'de> Deserialize<'de> for CategoryChoice {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(CategoryChoice::parse(&raw))
    }
}

// ==========================================
// 计划范围
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PlanScope {
    /// 单日计划
    Daily,
    /// 周计划
    Weekly,
    /// 月计划
    Monthly,
}

impl PlanScope {
    /// 转换为数据库存储字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            PlanScope::Daily => "DAILY",
            PlanScope::Weekly => "WEEKLY",
            PlanScope::Monthly => "MONTHLY",
        }
    }

    /// 从数据库字符串还原
    pub fn from_db_str(s: &str) -> Option<Self> {
        match s {
            "DAILY" => Some(PlanScope::Daily),
            "WEEKLY" => Some(PlanScope::Weekly),
            "MONTHLY" => Some(PlanScope::Monthly),
            _ => None,
        }
    }
}

impl fmt::Display for PlanScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            PlanScope::Daily => "日",
            PlanScope::Weekly => "周",
            PlanScope::Monthly => "月",
        };
        write!(f, "{}", label)
    }
}
