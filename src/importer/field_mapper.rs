// ==========================================
// 零售促销排期系统 - 字段映射器实现
// ==========================================
// 职责: 源列名 → 标准字段映射 + 类型转换
// 说明: 中文表头为标准列名, 兼容常见英文导出列名;
//       数值解析失败按行报错, 由导入器计入质量违规
// ==========================================

use crate::domain::product::RawProductRecord;
use crate::importer::catalog_importer_trait::FieldMapper as FieldMapperTrait;
use crate::importer::error::{ImportError, ImportResult};
use std::collections::HashMap;

pub struct CatalogFieldMapper;

impl FieldMapperTrait for CatalogFieldMapper {
    fn map_to_raw_product(
        &self,
        row: HashMap<String, String>,
        row_number: usize,
    ) -> Result<RawProductRecord, Box<dyn std::error::Error>> {
        Ok(RawProductRecord {
            // 主键
            product_id: self.get_string(&row, "商品编号"),

            // 基础信息
            product_name: self.get_string(&row, "商品名称"),
            category: self.get_string(&row, "商品分类"),
            brand: self.get_string(&row, "品牌"),
            supplier: self.get_string(&row, "供应商"),

            // 数值维度
            popularity: self.parse_i64(&row, "浏览量", row_number)?,
            regular_price: self.parse_f64(&row, "销售价", row_number)?,
            purchase_cost: self.parse_f64(&row, "采购成本", row_number)?,

            // 库存状态（原文保留, 标准化由清洗阶段负责）
            stock_status: self.get_string(&row, "库存状态"),

            // 元信息
            row_number,
        })
    }
}

impl CatalogFieldMapper {
    /// 提取字符串字段（返回 Option）, 支持多个可能的列名（别名）
    fn get_string(&self, row: &HashMap<String, String>, key: &str) -> Option<String> {
        // 标准列名 → 别名表（含常见英文导出列名）
        let aliases: Vec<&str> = match key {
            "商品编号" => vec!["商品编号", "商品ID", "SKU", "sku", "product_id", "id"],
            "商品名称" => vec!["商品名称", "名称", "product_name", "name", "title"],
            "商品分类" => vec!["商品分类", "分类", "category", "product_category"],
            "品牌" => vec!["品牌", "brand"],
            "供应商" => vec!["供应商", "supplier", "vendor"],
            "浏览量" => vec!["浏览量", "人气", "popularity", "views", "view_count"],
            "销售价" => vec!["销售价", "原价", "售价", "regular_price", "price"],
            "采购成本" => vec!["采购成本", "成本", "purchase_cost", "cost"],
            "库存状态" => vec!["库存状态", "库存", "stock_status", "stock"],
            _ => vec![key],
        };

        for alias in aliases {
            if let Some(v) = row.get(alias) {
                let trimmed = v.trim();
                if !trimmed.is_empty() {
                    return Some(trimmed.to_string());
                }
            }
        }
        None
    }

    /// 解析浮点数
    fn parse_f64(
        &self,
        row: &HashMap<String, String>,
        key: &str,
        row_number: usize,
    ) -> ImportResult<Option<f64>> {
        match self.get_string(row, key) {
            None => Ok(None),
            Some(value) => value
                .parse::<f64>()
                .map(Some)
                .map_err(|_| ImportError::TypeConversionError {
                    row: row_number,
                    field: key.to_string(),
                    message: format!("无法解析为浮点数: {}", value),
                }),
        }
    }

    /// 解析整数
    fn parse_i64(
        &self,
        row: &HashMap<String, String>,
        key: &str,
        row_number: usize,
    ) -> ImportResult<Option<i64>> {
        match self.get_string(row, key) {
            None => Ok(None),
            Some(value) => value
                .parse::<i64>()
                .map(Some)
                .map_err(|_| ImportError::TypeConversionError {
                    row: row_number,
                    field: key.to_string(),
                    message: format!("无法解析为整数: {}", value),
                }),
        }
    }
}
