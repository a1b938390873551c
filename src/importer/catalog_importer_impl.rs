// ==========================================
// 零售促销排期系统 - 商品目录导入器实现
// ==========================================
// 职责: 整合导入流程, 从文件到数据库
// 流程: 解析 → 映射 → 清洗 → 校验 → 落库
// 红线: 单行数据问题降级为质量违规, 不中断整个批次;
//       只有文件级错误（不存在/格式不支持/解析失败）才整体失败
// ==========================================

use crate::domain::product::{
    CatalogImportSummary, DqLevel, DqViolation, ImportBatch, Product, RawProductRecord,
};
use crate::domain::types::StockStatus;
use crate::importer::catalog_importer_trait::{CatalogImporter, FieldMapper, FileParser};
use crate::importer::error::ImportError;
use crate::repository::ProductRepository;
use std::collections::HashMap;
use std::error::Error;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

/// 分类缺失时的兜底分类
const FALLBACK_CATEGORY: &str = "未分类";

// ==========================================
// CatalogImporterImpl - 商品目录导入器实现
// ==========================================
pub struct CatalogImporterImpl {
    // 数据访问层
    product_repo: Arc<ProductRepository>,

    // 导入组件
    file_parser: Box<dyn FileParser>,
    field_mapper: Box<dyn FieldMapper>,
}

impl CatalogImporterImpl {
    /// 创建新的 CatalogImporter 实例
    ///
    /// # 参数
    /// - product_repo: 商品目录仓储
    /// - file_parser: 文件解析器
    /// - field_mapper: 字段映射器
    pub fn new(
        product_repo: Arc<ProductRepository>,
        file_parser: Box<dyn FileParser>,
        field_mapper: Box<dyn FieldMapper>,
    ) -> Self {
        Self {
            product_repo,
            file_parser,
            field_mapper,
        }
    }

    /// 导入单个文件（CSV / Excel 共用管线）
    async fn import_file(&self, file_path: &Path) -> Result<CatalogImportSummary, Box<dyn Error>> {
        let batch_id = Uuid::new_v4().to_string();
        let file_name = file_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| file_path.display().to_string());
        info!(batch_id = %batch_id, file = %file_name, "开始导入商品目录");

        // === 步骤 1: 解析文件 ===
        debug!("步骤 1: 解析文件");
        let raw_rows = self
            .file_parser
            .parse_to_raw_records(file_path)
            .map_err(|e| {
                error!(error = %e, "文件解析失败");
                format!("文件解析失败: {}", e)
            })?;
        let total_rows = raw_rows.len();
        info!(total_rows = total_rows, "文件解析完成");

        // === 步骤 2: 字段映射 ===
        debug!("步骤 2: 字段映射");
        let mut violations: Vec<DqViolation> = Vec::new();
        let mut records = Vec::new();
        for (idx, row) in raw_rows.into_iter().enumerate() {
            let row_number = idx + 1;
            match self.field_mapper.map_to_raw_product(row, row_number) {
                Ok(record) => records.push(record),
                Err(e) => {
                    warn!(row_number = row_number, error = %e, "字段映射失败");
                    let field = e
                        .downcast_ref::<ImportError>()
                        .and_then(|ie| match ie {
                            ImportError::TypeConversionError { field, .. } => {
                                Some(field.clone())
                            }
                            _ => None,
                        })
                        .unwrap_or_else(|| "未知字段".to_string());
                    violations.push(DqViolation {
                        row_number,
                        field,
                        level: DqLevel::Error,
                        message: format!("字段映射失败: {}", e),
                    });
                }
            }
        }
        info!(
            success = records.len(),
            failed = total_rows - records.len(),
            "字段映射完成"
        );

        // === 步骤 3: 数据清洗 ===
        debug!("步骤 3: 数据清洗");
        for record in &mut records {
            self.clean_record(record, &mut violations);
        }

        // === 步骤 4: 校验（主键缺失 + 批内重复） ===
        debug!("步骤 4: 主键与重复校验");
        let valid_records = self.validate_and_dedup(records, &mut violations);

        // === 步骤 5: 落库 ===
        debug!("步骤 5: 落库");
        let products: Vec<Product> = valid_records
            .into_iter()
            .filter_map(|r| self.to_product(r))
            .collect();
        let imported_rows = self.product_repo.upsert_batch(&products, &batch_id)?;

        let batch = ImportBatch {
            batch_id,
            file_name,
            total_rows,
            imported_rows,
            skipped_rows: total_rows.saturating_sub(imported_rows),
            imported_at: chrono::Local::now().naive_local(),
        };
        self.product_repo.insert_import_batch(&batch)?;

        let summary = CatalogImportSummary { batch, violations };
        info!(
            imported = summary.batch.imported_rows,
            skipped = summary.batch.skipped_rows,
            errors = summary.error_count(),
            warnings = summary.warning_count(),
            "商品目录导入完成"
        );
        Ok(summary)
    }
}

#[async_trait::async_trait]
impl CatalogImporter for CatalogImporterImpl {
    #[instrument(skip(self, file_path))]
    async fn import_from_excel<P: AsRef<Path> + Send>(
        &self,
        file_path: P,
    ) -> Result<CatalogImportSummary, Box<dyn Error>> {
        let path = file_path.as_ref();
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();
        if ext != "xlsx" && ext != "xls" {
            return Err(Box::new(ImportError::UnsupportedFormat(ext)));
        }
        self.import_file(path).await
    }

    #[instrument(skip(self, file_path))]
    async fn import_from_csv<P: AsRef<Path> + Send>(
        &self,
        file_path: P,
    ) -> Result<CatalogImportSummary, Box<dyn Error>> {
        let path = file_path.as_ref();
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();
        if ext != "csv" {
            return Err(Box::new(ImportError::UnsupportedFormat(ext)));
        }
        self.import_file(path).await
    }

    async fn batch_import<P: AsRef<Path> + Send + Sync>(
        &self,
        file_paths: Vec<P>,
    ) -> Result<Vec<Result<CatalogImportSummary, String>>, Box<dyn Error>> {
        use futures::future::join_all;

        info!(count = file_paths.len(), "开始批量导入文件");

        // 错误在任务内部转为字符串, 单个文件失败不影响其余文件
        let import_tasks = file_paths.into_iter().map(|path| {
            let path_str = path.as_ref().display().to_string();
            async move {
                match self.import_file(path.as_ref()).await {
                    Ok(summary) => {
                        info!(
                            file = %path_str,
                            imported = summary.batch.imported_rows,
                            "文件导入成功"
                        );
                        Ok(summary)
                    }
                    Err(e) => {
                        error!(file = %path_str, error = %e, "文件导入失败");
                        Err(format!("文件 {} 导入失败: {}", path_str, e))
                    }
                }
            }
        });

        let results = join_all(import_tasks).await;
        info!(
            total = results.len(),
            success = results.iter().filter(|r| r.is_ok()).count(),
            failed = results.iter().filter(|r| r.is_err()).count(),
            "批量导入完成"
        );
        Ok(results)
    }
}

// 辅助方法
impl CatalogImporterImpl {
    /// 清洗单条记录（问题降级为 Warning, 不丢行）
    fn clean_record(&self, record: &mut RawProductRecord, violations: &mut Vec<DqViolation>) {
        // 浏览量为负 → 钳制为 0
        if let Some(popularity) = record.popularity {
            if popularity < 0 {
                violations.push(DqViolation {
                    row_number: record.row_number,
                    field: "浏览量".to_string(),
                    level: DqLevel::Warning,
                    message: format!("浏览量为负数 {}, 已按 0 处理", popularity),
                });
                record.popularity = Some(0);
            }
        }

        // 销售价缺失/为负 → 按 0 处理（该商品将始终不满足促销门槛）
        match record.regular_price {
            None => {
                violations.push(DqViolation {
                    row_number: record.row_number,
                    field: "销售价".to_string(),
                    level: DqLevel::Warning,
                    message: "销售价缺失, 按 0 处理, 该商品不会进入促销池".to_string(),
                });
                record.regular_price = Some(0.0);
            }
            Some(price) if price < 0.0 => {
                violations.push(DqViolation {
                    row_number: record.row_number,
                    field: "销售价".to_string(),
                    level: DqLevel::Warning,
                    message: format!("销售价为负数 {}, 已按 0 处理", price),
                });
                record.regular_price = Some(0.0);
            }
            Some(_) => {}
        }

        // 采购成本为负 → 按 0 处理（缺失时静默为 0, 仅影响底价计算）
        if let Some(cost) = record.purchase_cost {
            if cost < 0.0 {
                violations.push(DqViolation {
                    row_number: record.row_number,
                    field: "采购成本".to_string(),
                    level: DqLevel::Warning,
                    message: format!("采购成本为负数 {}, 已按 0 处理", cost),
                });
                record.purchase_cost = Some(0.0);
            }
        }

        // 分类缺失 → 归入兜底分类
        if record.category.is_none() {
            violations.push(DqViolation {
                row_number: record.row_number,
                field: "商品分类".to_string(),
                level: DqLevel::Warning,
                message: format!("商品分类缺失, 归入「{}」", FALLBACK_CATEGORY),
            });
            record.category = Some(FALLBACK_CATEGORY.to_string());
        }

        // 名称缺失 → 以编号兜底
        if record.product_name.is_none() {
            if let Some(id) = &record.product_id {
                violations.push(DqViolation {
                    row_number: record.row_number,
                    field: "商品名称".to_string(),
                    level: DqLevel::Warning,
                    message: "商品名称缺失, 以商品编号代替".to_string(),
                });
                record.product_name = Some(id.clone());
            }
        }

        // 库存状态无法识别 → 按未知处理（库存状态不影响促销资格）
        if let Some(raw) = &record.stock_status {
            if StockStatus::from_str(raw) == StockStatus::Unknown {
                violations.push(DqViolation {
                    row_number: record.row_number,
                    field: "库存状态".to_string(),
                    level: DqLevel::Warning,
                    message: format!("无法识别的库存状态: {}, 按未知处理", raw),
                });
            }
        }
    }

    /// 主键校验 + 批内去重（后行覆盖前行）
    fn validate_and_dedup(
        &self,
        records: Vec<RawProductRecord>,
        violations: &mut Vec<DqViolation>,
    ) -> Vec<RawProductRecord> {
        let mut keyed = Vec::new();
        for record in records {
            if record.product_id.is_none() {
                violations.push(DqViolation {
                    row_number: record.row_number,
                    field: "商品编号".to_string(),
                    level: DqLevel::Error,
                    message: "商品编号缺失, 该行丢弃".to_string(),
                });
                continue;
            }
            keyed.push(record);
        }

        let mut index_by_id: HashMap<String, usize> = HashMap::new();
        let mut kept: Vec<Option<RawProductRecord>> = Vec::new();
        for record in keyed {
            let id = record.product_id.clone().unwrap_or_default();
            if let Some(&prev_idx) = index_by_id.get(&id) {
                let prev_row = kept[prev_idx].as_ref().map(|r| r.row_number).unwrap_or(0);
                violations.push(DqViolation {
                    row_number: prev_row,
                    field: "商品编号".to_string(),
                    level: DqLevel::Warning,
                    message: format!("商品编号 {} 批内重复, 被行 {} 覆盖", id, record.row_number),
                });
                kept[prev_idx] = None;
            }
            index_by_id.insert(id, kept.len());
            kept.push(Some(record));
        }
        kept.into_iter().flatten().collect()
    }

    /// RawProductRecord → Product（清洗与校验已保证字段就位）
    fn to_product(&self, record: RawProductRecord) -> Option<Product> {
        let product_id = record.product_id?;
        Some(Product {
            product_name: record.product_name.unwrap_or_else(|| product_id.clone()),
            product_id,
            category: record
                .category
                .unwrap_or_else(|| FALLBACK_CATEGORY.to_string()),
            brand: record.brand,
            supplier: record.supplier,
            popularity: record.popularity.unwrap_or(0).max(0),
            regular_price: record.regular_price.unwrap_or(0.0).max(0.0),
            purchase_cost: record.purchase_cost.unwrap_or(0.0).max(0.0),
            stock_status: record
                .stock_status
                .as_deref()
                .map(StockStatus::from_str)
                .unwrap_or_default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::importer::field_mapper::CatalogFieldMapper;
    use crate::importer::file_parser::UniversalFileParser;
    use rusqlite::Connection;
    use std::io::Write;
    use std::path::PathBuf;
    use std::sync::Mutex;
    use tempfile::Builder;

    // ==========================================
    // 测试辅助函数
    // ==========================================
    fn create_test_importer() -> (CatalogImporterImpl, Arc<ProductRepository>) {
        let conn = Connection::open_in_memory().unwrap();
        crate::db::init_schema(&conn).unwrap();
        let repo = Arc::new(ProductRepository::from_connection(Arc::new(Mutex::new(
            conn,
        ))));
        let importer = CatalogImporterImpl::new(
            Arc::clone(&repo),
            Box::new(UniversalFileParser),
            Box::new(CatalogFieldMapper),
        );
        (importer, repo)
    }

    fn create_test_csv(content: &str) -> tempfile::NamedTempFile {
        let mut temp_file = Builder::new().suffix(".csv").tempfile().unwrap();
        temp_file.write_all(content.as_bytes()).unwrap();
        temp_file
    }

    #[tokio::test]
    async fn test_import_csv_happy_path() {
        let (importer, repo) = create_test_importer();
        let csv = create_test_csv(
            "商品编号,商品名称,商品分类,品牌,供应商,浏览量,销售价,采购成本,库存状态\n\
             SKU001,薯片大礼包,Snacks,乐事,华东供应商,320,299.00,150.00,instock\n\
             SKU002,气泡水,Drinks,元气森林,华东供应商,150,219.00,80.00,有货\n",
        );

        let summary = importer.import_from_csv(csv.path()).await.unwrap();
        assert_eq!(summary.batch.total_rows, 2);
        assert_eq!(summary.batch.imported_rows, 2);
        assert_eq!(summary.batch.skipped_rows, 0);
        assert!(summary.violations.is_empty());

        assert_eq!(repo.count().unwrap(), 2);
        let p = repo.find_by_id("SKU002").unwrap();
        assert_eq!(p.product_name, "气泡水");
        assert_eq!(p.stock_status, StockStatus::InStock);
        assert_eq!(p.regular_price, 219.0);
    }

    #[tokio::test]
    async fn test_import_csv_dirty_rows() {
        // 行2 缺编号丢弃; 行3 浏览量为负钳制;
        // 行4 与行1 编号重复后行覆盖; 行5 浏览量非数字丢弃
        let (importer, repo) = create_test_importer();
        let csv = create_test_csv(
            "商品编号,商品名称,商品分类,浏览量,销售价\n\
             SKU001,薯片,Snacks,100,299\n\
             ,无编号,Snacks,50,249\n\
             SKU003,可乐,Drinks,-5,219\n\
             SKU001,薯片升级装,Snacks,200,319\n\
             SKU004,坏数据,Snacks,abc,199\n",
        );

        let summary = importer.import_from_csv(csv.path()).await.unwrap();
        assert_eq!(summary.batch.total_rows, 5);
        assert_eq!(summary.batch.imported_rows, 2);
        assert_eq!(summary.batch.skipped_rows, 3);
        assert_eq!(summary.error_count(), 2);
        assert_eq!(summary.warning_count(), 2);
        assert!(summary.has_errors());

        // 重复编号后行覆盖
        let p1 = repo.find_by_id("SKU001").unwrap();
        assert_eq!(p1.product_name, "薯片升级装");
        assert_eq!(p1.popularity, 200);

        // 负浏览量钳制为 0
        let p3 = repo.find_by_id("SKU003").unwrap();
        assert_eq!(p3.popularity, 0);
    }

    #[tokio::test]
    async fn test_import_csv_missing_price_warned() {
        let (importer, repo) = create_test_importer();
        let csv = create_test_csv("商品编号,商品名称,商品分类,浏览量\nSKU001,薯片,Snacks,100\n");

        let summary = importer.import_from_csv(csv.path()).await.unwrap();
        assert_eq!(summary.batch.imported_rows, 1);
        assert_eq!(summary.warning_count(), 1);
        assert!(!summary.has_errors());

        let p = repo.find_by_id("SKU001").unwrap();
        assert_eq!(p.regular_price, 0.0);
    }

    #[tokio::test]
    async fn test_import_rejects_wrong_extension() {
        let (importer, _) = create_test_importer();
        let csv = create_test_csv("商品编号\nSKU001\n");
        // CSV 文件走 Excel 入口 → 格式不支持
        let result = importer.import_from_excel(csv.path()).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_batch_import_isolates_failures() {
        let (importer, repo) = create_test_importer();
        let good = create_test_csv("商品编号,商品名称,商品分类,浏览量,销售价\nSKU001,薯片,Snacks,100,299\n");

        let paths = vec![
            PathBuf::from(good.path()),
            PathBuf::from("missing_catalog.csv"),
        ];
        let results = importer.batch_import(paths).await.unwrap();

        assert_eq!(results.len(), 2);
        assert!(results[0].is_ok());
        assert!(results[1].is_err());
        // 失败文件不影响成功文件入库
        assert_eq!(repo.count().unwrap(), 1);
    }
}
