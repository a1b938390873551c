// ==========================================
// 商品目录导入集成测试
// ==========================================
// 职责: 验证 CSV 文件 → 解析 → 清洗 → 校验 → SQLite 落库全链路
// 数据: tests/fixtures/test_catalog.csv（含脏行的标准测试目录）
// ==========================================


use promo_planner::domain::types::StockStatus;
use promo_planner::importer::{
    CatalogFieldMapper, CatalogImporter, CatalogImporterImpl, UniversalFileParser,
};
use promo_planner::logging;
use promo_planner::repository::ProductRepository;
use rusqlite::Connection;
use std::sync::Arc;
use test_helpers::create_test_db;

const FIXTURE_CSV: &str = "tests/fixtures/test_catalog.csv";

// ==========================================
// 测试辅助函数
// ==========================================

/// 在指定数据库上创建导入器
fn create_test_importer(db_path: &str) -> (CatalogImporterImpl, Arc<ProductRepository>) {
    let repo = Arc::new(ProductRepository::new(db_path).unwrap());
    let importer = CatalogImporterImpl::new(
        Arc::clone(&repo),
        Box::new(UniversalFileParser),
        Box::new(CatalogFieldMapper),
    );
    (importer, repo)
}

// ==========================================
// 集成测试
// ==========================================

#[tokio::test]
async fn test_import_fixture_csv_full_pipeline() {
    logging::init_test();
    let (_temp, db_path) = create_test_db().unwrap();
    let (importer, repo) = create_test_importer(&db_path);

    let summary = importer.import_from_csv(FIXTURE_CSV).await.unwrap();

    // 10 行: 7 入库, 缺编号 1 行 + 浏览量非数字 1 行丢弃, SKU002 批内重复合并
    assert_eq!(summary.batch.total_rows, 10, "文件总行数应为 10");
    assert_eq!(summary.batch.imported_rows, 7, "应成功入库 7 行: {:?}", summary);
    assert_eq!(summary.batch.skipped_rows, 3);
    assert_eq!(summary.error_count(), 2, "丢弃级问题应为 2 条");
    assert_eq!(summary.warning_count(), 2, "修正级问题应为 2 条");

    // 仓储计数与批次记录
    assert_eq!(repo.count().unwrap(), 7);
    let batches = repo.recent_import_batches(10).unwrap();
    assert_eq!(batches.len(), 1);
    assert_eq!(batches[0].file_name, "test_catalog.csv");
    assert_eq!(batches[0].imported_rows, 7);

    println!(
        "导入完成: 入库 {} / 丢弃 {} / 违规 {}",
        summary.batch.imported_rows,
        summary.batch.skipped_rows,
        summary.violations.len()
    );
}

#[tokio::test]
async fn test_import_fixture_field_level_semantics() {
    logging::init_test();
    let (_temp, db_path) = create_test_db().unwrap();
    let (importer, repo) = create_test_importer(&db_path);

    importer.import_from_csv(FIXTURE_CSV).await.unwrap();

    // 批内重复: 后行覆盖前行
    let sku002 = repo.find_by_id("SKU002").unwrap();
    assert_eq!(sku002.product_name, "每日坚果升级装");
    assert_eq!(sku002.popularity, 3100);
    assert_eq!(sku002.regular_price, 309.0);

    // 负浏览量钳制为 0
    let sku006 = repo.find_by_id("SKU006").unwrap();
    assert_eq!(sku006.popularity, 0, "负浏览量应钳制为 0");

    // 供应商为空 → None
    let sku007 = repo.find_by_id("SKU007").unwrap();
    assert!(sku007.supplier.is_none());
    assert_eq!(sku007.regular_price, 199.0);

    // 库存状态标准化: 中文标注与电商导出格式
    assert_eq!(
        repo.find_by_id("SKU003").unwrap().stock_status,
        StockStatus::LowStock
    );
    assert_eq!(
        repo.find_by_id("SKU005").unwrap().stock_status,
        StockStatus::OutOfStock
    );

    // 丢弃的行不应入库
    assert!(repo.find_by_id("SKU009").is_err(), "浏览量非数字的行应被丢弃");

    // 分类清单按名称排序
    let categories = repo.list_categories().unwrap();
    assert_eq!(categories, vec!["休闲零食".to_string(), "饮料".to_string()]);
}

#[tokio::test]
async fn test_reimport_upserts_without_duplicates() {
    logging::init_test();
    let (_temp, db_path) = create_test_db().unwrap();
    let (importer, repo) = create_test_importer(&db_path);

    let first = importer.import_from_csv(FIXTURE_CSV).await.unwrap();
    let second = importer.import_from_csv(FIXTURE_CSV).await.unwrap();

    // 重复导入按编号覆盖, 不产生重复行
    assert_eq!(first.batch.imported_rows, 7);
    assert_eq!(second.batch.imported_rows, 7);
    assert_eq!(repo.count().unwrap(), 7, "重复导入后目录数量不变");

    // 每次导入都留下独立批次记录
    let batches = repo.recent_import_batches(10).unwrap();
    assert_eq!(batches.len(), 2);
    assert_ne!(batches[0].batch_id, batches[1].batch_id);

    // 覆盖导入保留首次导入时间
    let conn = Connection::open(&db_path).unwrap();
    let distinct_created: i64 = conn
        .query_row(
            "SELECT COUNT(DISTINCT created_at) FROM product_catalog WHERE product_id = 'SKU001'",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(distinct_created, 1);

    println!("重复导入验证通过: 目录 {} 个商品, 批次 {} 条", 7, batches.len());
}

#[tokio::test]
async fn test_import_missing_file_fails_whole_batch() {
    logging::init_test();
    let (_temp, db_path) = create_test_db().unwrap();
    let (importer, repo) = create_test_importer(&db_path);

    // 文件级错误整体失败, 不产生批次记录
    let result = importer.import_from_csv("tests/fixtures/no_such_file.csv").await;
    assert!(result.is_err(), "不存在的文件应整体失败");
    assert_eq!(repo.count().unwrap(), 0);
    assert!(repo.recent_import_batches(10).unwrap().is_empty());
}
