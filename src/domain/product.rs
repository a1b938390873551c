// ==========================================
// 零售促销排期系统 - 商品实体
// ==========================================
// 职责: 商品目录实体 + 导入中间结构 + 导入质量报告
// 红线: 商品目录一经导入不可变; 促销价调整只发生在
//       计划内的"已选副本"(PromoItem)上, 不回写目录
// ==========================================

use crate::domain::types::StockStatus;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// 促销底价的毛利率系数: 底价 = 采购成本 / 0.95（5% 毛利保护线）
pub const SALE_FLOOR_MARGIN: f64 = 0.95;

// ==========================================
// 商品目录实体
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub product_id: String,        // 商品编号（目录内唯一）
    pub product_name: String,      // 商品名称
    pub category: String,          // 商品分类（自由文本）
    pub brand: Option<String>,     // 品牌
    pub supplier: Option<String>,  // 供应商
    pub popularity: i64,           // 浏览量（热度排序依据, 非负）
    pub regular_price: f64,        // 销售价
    pub purchase_cost: f64,        // 采购成本
    pub stock_status: StockStatus, // 库存状态（不影响促销资格）
}

impl Product {
    /// 促销底价（5% 毛利保护线）
    ///
    /// # 返回
    /// - Some(底价): 销售价与采购成本均为正时
    /// - None: 任一为非正值（缺数据的商品不给出底价）
    pub fn sale_floor_price(&self) -> Option<f64> {
        if self.regular_price > 0.0 && self.purchase_cost > 0.0 {
            Some(self.purchase_cost / SALE_FLOOR_MARGIN)
        } else {
            None
        }
    }

    /// 当前毛利率（百分比）
    ///
    /// # 返回
    /// - Some(毛利率): 销售价与采购成本均为正时
    /// - None: 数据不全
    pub fn margin_percent(&self) -> Option<f64> {
        if self.regular_price > 0.0 && self.purchase_cost > 0.0 {
            Some((self.regular_price - self.purchase_cost) / self.regular_price * 100.0)
        } else {
            None
        }
    }
}

// ==========================================
// 导入中间结构
// ==========================================
// 用途: 字段映射后的原始行, 字段均为 Option,
//       缺失/非法值在清洗与校验阶段处理
#[derive(Debug, Clone, Default)]
pub struct RawProductRecord {
    // 主键
    pub product_id: Option<String>,

    // 基础信息
    pub product_name: Option<String>,
    pub category: Option<String>,
    pub brand: Option<String>,
    pub supplier: Option<String>,

    // 数值维度
    pub popularity: Option<i64>,
    pub regular_price: Option<f64>,
    pub purchase_cost: Option<f64>,

    // 库存
    pub stock_status: Option<String>,

    // 元信息
    pub row_number: usize,
}

// ==========================================
// 导入批次
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportBatch {
    pub batch_id: String,        // 批次ID (UUID)
    pub file_name: String,       // 源文件名
    pub total_rows: usize,       // 文件总行数
    pub imported_rows: usize,    // 成功入库行数
    pub skipped_rows: usize,     // 丢弃行数（缺主键/数值非法）
    pub imported_at: NaiveDateTime, // 导入时间
}

// ==========================================
// 导入质量报告
// ==========================================
/// 质量问题等级
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DqLevel {
    /// 行被丢弃（缺主键、数值无法解析）
    Error,
    /// 行已入库但数据被修正（负浏览量归零、重复主键后者覆盖前者）
    Warning,
}

/// 单条质量问题记录
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DqViolation {
    pub row_number: usize, // 源文件行号（1 起, 不含表头）
    pub field: String,     // 问题字段
    pub level: DqLevel,    // 等级
    pub message: String,   // 说明
}

/// 单次导入的完整结果: 批次统计 + 质量问题清单
///
/// # 说明
/// 坏行不会导致整批失败 —— 丢弃并计数, 由调用方决定展示方式
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogImportSummary {
    pub batch: ImportBatch,
    pub violations: Vec<DqViolation>,
}

impl CatalogImportSummary {
    /// 丢弃行级问题数
    pub fn error_count(&self) -> usize {
        self.violations
            .iter()
            .filter(|v| v.level == DqLevel::Error)
            .count()
    }

    /// 修正级问题数
    pub fn warning_count(&self) -> usize {
        self.violations
            .iter()
            .filter(|v| v.level == DqLevel::Warning)
            .count()
    }

    /// 是否存在丢弃行
    pub fn has_errors(&self) -> bool {
        self.error_count() > 0
    }
}
