// ==========================================
// 零售促销排期系统 - 目录导入 Trait
// ==========================================
// 职责: 定义商品目录导入接口（不包含实现）
// ==========================================

use crate::domain::product::{CatalogImportSummary, RawProductRecord};
use async_trait::async_trait;
use std::collections::HashMap;
use std::error::Error;
use std::path::Path;

// ==========================================
// CatalogImporter Trait
// ==========================================
// 用途: 商品目录导入主接口
// 实现者: CatalogImporterImpl
#[async_trait]
pub trait CatalogImporter: Send + Sync {
    /// 从 Excel 文件导入商品目录
    ///
    /// # 参数
    /// - file_path: Excel 文件路径（.xlsx/.xls）
    ///
    /// # 返回
    /// - Ok(CatalogImportSummary): 导入汇总（批次统计 + 质量违规明细）
    /// - Err: 文件读取错误、数据库错误等
    ///
    /// # 导入流程
    /// 1. 文件读取与解析
    /// 2. 字段映射与类型转换
    /// 3. 基础清洗（TRIM / 浏览量钳制 / 库存状态标准化）
    /// 4. 校验（主键缺失丢弃、批内重复后行覆盖）
    /// 5. 落库（事务化 upsert）+ 批次记录
    async fn import_from_excel<P: AsRef<Path> + Send>(
        &self,
        file_path: P,
    ) -> Result<CatalogImportSummary, Box<dyn Error>>;

    /// 从 CSV 文件导入商品目录
    ///
    /// # 参数
    /// - file_path: CSV 文件路径（.csv）
    async fn import_from_csv<P: AsRef<Path> + Send>(
        &self,
        file_path: P,
    ) -> Result<CatalogImportSummary, Box<dyn Error>>;

    /// 批量导入多个文件（并发执行）
    ///
    /// # 说明
    /// - 每个文件的导入相互独立, 单个文件失败不影响其余文件
    /// - 返回顺序与入参文件顺序一致
    async fn batch_import<P: AsRef<Path> + Send + Sync>(
        &self,
        file_paths: Vec<P>,
    ) -> Result<Vec<Result<CatalogImportSummary, String>>, Box<dyn Error>>;
}

// ==========================================
// FileParser Trait
// ==========================================
// 用途: 文件解析接口
// 实现者: CsvParser, ExcelParser, UniversalFileParser
pub trait FileParser: Send + Sync {
    /// 解析文件为原始行记录（HashMap<列名, 值>）
    fn parse_to_raw_records(
        &self,
        file_path: &Path,
    ) -> Result<Vec<HashMap<String, String>>, Box<dyn Error>>;
}

// ==========================================
// FieldMapper Trait
// ==========================================
// 用途: 字段映射接口
// 实现者: CatalogFieldMapper
pub trait FieldMapper: Send + Sync {
    /// 将原始行记录映射为 RawProductRecord
    ///
    /// # 参数
    /// - row: 原始行记录（HashMap<列名, 值>）
    /// - row_number: 行号（1 起, 不含表头, 用于质量报告）
    fn map_to_raw_product(
        &self,
        row: HashMap<String, String>,
        row_number: usize,
    ) -> Result<RawProductRecord, Box<dyn Error>>;
}
