// ==========================================
// 零售促销排期系统 - 商品目录API
// ==========================================
// 职责: 封装商品目录导入与查询功能
// ==========================================

use std::path::Path;
use std::sync::Arc;

use tracing::info;

use crate::api::error::{ApiError, ApiResult};
use crate::domain::product::{CatalogImportSummary, ImportBatch};
use crate::domain::Product;
use crate::i18n;
use crate::importer::{CatalogFieldMapper, CatalogImporter, CatalogImporterImpl, UniversalFileParser};
use crate::perf::PerfGuard;
use crate::repository::ProductRepository;

/// 商品目录API
pub struct CatalogApi {
    product_repo: Arc<ProductRepository>,
    importer: CatalogImporterImpl,
}

impl CatalogApi {
    /// 创建新的 CatalogApi 实例
    ///
    /// # 说明
    /// 导入器使用默认组件（通用文件解析器 + 中文表头字段映射器）
    pub fn new(product_repo: Arc<ProductRepository>) -> Self {
        let importer = CatalogImporterImpl::new(
            product_repo.clone(),
            Box::new(UniversalFileParser),
            Box::new(CatalogFieldMapper),
        );
        Self {
            product_repo,
            importer,
        }
    }

    /// 导入商品目录文件（按扩展名分派 CSV / Excel）
    ///
    /// # 参数
    /// - file_path: 文件路径
    ///
    /// # 返回
    /// - Ok(CatalogImportSummary): 导入批次 + 质量违规明细
    /// - Err(ApiError): 错误信息
    pub async fn import_catalog_file(&self, file_path: &str) -> ApiResult<CatalogImportSummary> {
        let _perf = PerfGuard::new("import_catalog_file");

        let ext = Path::new(file_path)
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        let result = match ext.as_str() {
            "csv" => self.importer.import_from_csv(file_path).await,
            "xlsx" | "xls" => self.importer.import_from_excel(file_path).await,
            _ => {
                return Err(ApiError::InvalidInput(format!(
                    "文件格式不支持: {}（仅支持 .xlsx/.xls/.csv）",
                    file_path
                )))
            }
        };

        let summary = result.map_err(|e| ApiError::ImportFailed(format!("导入失败: {}", e)))?;
        info!(
            batch_id = %summary.batch.batch_id,
            skipped = summary.batch.skipped_rows,
            "{}",
            Self::import_completed_message(&summary)
        );
        Ok(summary)
    }

    /// 导入完成的本地化提示（随 i18n locale 切换）
    fn import_completed_message(summary: &CatalogImportSummary) -> String {
        let total = summary.batch.total_rows.to_string();
        let imported = summary.batch.imported_rows.to_string();
        i18n::t_with_args(
            "import.completed",
            &[("total", &total), ("imported", &imported)],
        )
    }

    /// 批量导入多个目录文件
    ///
    /// # 返回
    /// - 每个文件的独立结果（单个文件失败不影响其他文件）
    pub async fn batch_import_catalog_files(
        &self,
        file_paths: Vec<String>,
    ) -> ApiResult<Vec<Result<CatalogImportSummary, String>>> {
        let _perf = PerfGuard::new("batch_import_catalog_files");
        self.importer
            .batch_import(file_paths)
            .await
            .map_err(|e| ApiError::ImportFailed(format!("批量导入失败: {}", e)))
    }

    /// 列出全部商品（按浏览量降序）
    pub fn list_products(&self) -> ApiResult<Vec<Product>> {
        Ok(self.product_repo.list_all()?)
    }

    /// 按编号查询商品
    pub fn get_product(&self, product_id: &str) -> ApiResult<Product> {
        Ok(self.product_repo.find_by_id(product_id)?)
    }

    /// 商品总数
    pub fn product_count(&self) -> ApiResult<usize> {
        Ok(self.product_repo.count()?)
    }

    /// 目录中出现过的分类列表
    pub fn list_categories(&self) -> ApiResult<Vec<String>> {
        Ok(self.product_repo.list_categories()?)
    }

    /// 最近的导入批次
    pub fn recent_import_batches(&self, limit: usize) -> ApiResult<Vec<ImportBatch>> {
        Ok(self.product_repo.recent_import_batches(limit)?)
    }

    /// 清空商品目录（重新导入前使用）
    ///
    /// # 返回
    /// - 删除的商品数量
    pub fn clear_catalog(&self) -> ApiResult<usize> {
        let deleted = self.product_repo.delete_all()?;
        info!(deleted, "商品目录已清空");
        Ok(deleted)
    }
}
