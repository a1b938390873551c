// ==========================================
// 零售促销排期系统 - 商品目录仓储
// ==========================================
// 职责: product_catalog / import_batch 两表的数据访问
// 红线: Repository 不含业务规则, 只做数据 CRUD
// ==========================================

use crate::domain::product::{ImportBatch, Product};
use crate::domain::types::StockStatus;
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::NaiveDateTime;
use rusqlite::{params, Connection, Row};
use std::sync::{Arc, Mutex};

const TIMESTAMP_FMT: &str = "%Y-%m-%d %H:%M:%S";

// ==========================================
// ProductRepository
// ==========================================
pub struct ProductRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ProductRepository {
    /// 创建新的 Repository 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = Connection::open(db_path)
            .map_err(|e| RepositoryError::DatabaseConnectionError(e.to_string()))?;
        crate::db::init_schema(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 复用已有连接（建表由连接初始化方负责）
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 批量 upsert 商品（同一事务内完成）
    ///
    /// # 参数
    /// - products: 待写入商品
    /// - batch_id: 本次导入批次 ID
    ///
    /// # 说明
    /// - 已存在的商品按编号覆盖各字段, created_at 保留首次导入时间
    pub fn upsert_batch(
        &self,
        products: &[Product],
        batch_id: &str,
    ) -> RepositoryResult<usize> {
        let mut conn = self.get_conn()?;
        let tx = conn
            .transaction()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
        let now = chrono::Local::now().format(TIMESTAMP_FMT).to_string();

        let mut count = 0;
        {
            let mut stmt = tx.prepare(
                r#"
                INSERT INTO product_catalog (
                    product_id, product_name, category, brand, supplier,
                    popularity, regular_price, purchase_cost, stock_status,
                    import_batch_id, created_at, updated_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?11)
                ON CONFLICT(product_id) DO UPDATE SET
                    product_name = excluded.product_name,
                    category = excluded.category,
                    brand = excluded.brand,
                    supplier = excluded.supplier,
                    popularity = excluded.popularity,
                    regular_price = excluded.regular_price,
                    purchase_cost = excluded.purchase_cost,
                    stock_status = excluded.stock_status,
                    import_batch_id = excluded.import_batch_id,
                    updated_at = excluded.updated_at
                "#,
            )?;
            for product in products {
                stmt.execute(params![
                    product.product_id,
                    product.product_name,
                    product.category,
                    product.brand,
                    product.supplier,
                    product.popularity,
                    product.regular_price,
                    product.purchase_cost,
                    product.stock_status.to_db_str(),
                    batch_id,
                    now,
                ])?;
                count += 1;
            }
        }
        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
        Ok(count)
    }

    /// 按编号查询单个商品
    pub fn find_by_id(&self, product_id: &str) -> RepositoryResult<Product> {
        let conn = self.get_conn()?;
        conn.query_row(
            "SELECT product_id, product_name, category, brand, supplier,
                    popularity, regular_price, purchase_cost, stock_status
             FROM product_catalog WHERE product_id = ?1",
            params![product_id],
            Self::map_product_row,
        )
        .map_err(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => RepositoryError::NotFound {
                entity: "Product".to_string(),
                id: product_id.to_string(),
            },
            other => other.into(),
        })
    }

    /// 全量商品（浏览量降序, 同量按编号升序保证稳定）
    pub fn list_all(&self) -> RepositoryResult<Vec<Product>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            "SELECT product_id, product_name, category, brand, supplier,
                    popularity, regular_price, purchase_cost, stock_status
             FROM product_catalog
             ORDER BY popularity DESC, product_id ASC",
        )?;
        let rows = stmt.query_map([], Self::map_product_row)?;
        let mut products = Vec::new();
        for row in rows {
            products.push(row?);
        }
        Ok(products)
    }

    /// 商品总数
    pub fn count(&self) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let count: i64 =
            conn.query_row("SELECT COUNT(*) FROM product_catalog", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// 目录内出现过的分类（去重, 按名称排序）
    pub fn list_categories(&self) -> RepositoryResult<Vec<String>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            "SELECT DISTINCT category FROM product_catalog ORDER BY category ASC",
        )?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
        let mut categories = Vec::new();
        for row in rows {
            categories.push(row?);
        }
        Ok(categories)
    }

    /// 清空目录（重新导入前使用）
    pub fn delete_all(&self) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let count = conn.execute("DELETE FROM product_catalog", [])?;
        Ok(count)
    }

    /// 记录导入批次
    pub fn insert_import_batch(&self, batch: &ImportBatch) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO import_batch (
                batch_id, file_name, total_rows, imported_rows, skipped_rows, imported_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                batch.batch_id,
                batch.file_name,
                batch.total_rows as i64,
                batch.imported_rows as i64,
                batch.skipped_rows as i64,
                batch.imported_at.format(TIMESTAMP_FMT).to_string(),
            ],
        )?;
        Ok(())
    }

    /// 最近的导入批次（新到旧）
    pub fn recent_import_batches(&self, limit: usize) -> RepositoryResult<Vec<ImportBatch>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            "SELECT batch_id, file_name, total_rows, imported_rows, skipped_rows, imported_at
             FROM import_batch
             ORDER BY imported_at DESC, batch_id DESC
             LIMIT ?1",
        )?;
        let rows = stmt.query_map(params![limit as i64], |row| {
            let imported_at_raw: String = row.get(5)?;
            Ok(ImportBatch {
                batch_id: row.get(0)?,
                file_name: row.get(1)?,
                total_rows: row.get::<_, i64>(2)? as usize,
                imported_rows: row.get::<_, i64>(3)? as usize,
                skipped_rows: row.get::<_, i64>(4)? as usize,
                imported_at: NaiveDateTime::parse_from_str(&imported_at_raw, TIMESTAMP_FMT)
                    .unwrap_or_default(),
            })
        })?;
        let mut batches = Vec::new();
        for row in rows {
            batches.push(row?);
        }
        Ok(batches)
    }

    /// 行映射: product_catalog → Product
    fn map_product_row(row: &Row) -> rusqlite::Result<Product> {
        let stock_raw: String = row.get(8)?;
        Ok(Product {
            product_id: row.get(0)?,
            product_name: row.get(1)?,
            category: row.get(2)?,
            brand: row.get(3)?,
            supplier: row.get(4)?,
            popularity: row.get(5)?,
            regular_price: row.get(6)?,
            purchase_cost: row.get(7)?,
            stock_status: StockStatus::from_db_str(&stock_raw),
        })
    }
}
