// ==========================================
// 零售促销排期系统 - SQLite 连接初始化
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为，避免"部分模块外键开启/部分不开启"
// - 统一 busy_timeout，减少并发写入时的偶发 busy 错误
// - 建表语句全部幂等（IF NOT EXISTS），可在任意连接上重复执行
// ==========================================

use rusqlite::Connection;
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明：
/// - foreign_keys 需要"每个连接"单独开启
/// - busy_timeout 需要"每个连接"单独配置
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 初始化数据库结构
///
/// # 说明
/// - 商品目录、导入批次、计划快照、配置 KV 四张表
/// - 全部幂等，启动时执行一次即可
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        -- 商品目录（导入层写入，计划生成只读）
        CREATE TABLE IF NOT EXISTS product_catalog (
            product_id      TEXT PRIMARY KEY,
            product_name    TEXT NOT NULL,
            category        TEXT NOT NULL,
            brand           TEXT,
            supplier        TEXT,
            popularity      INTEGER NOT NULL DEFAULT 0,
            regular_price   REAL NOT NULL DEFAULT 0,
            purchase_cost   REAL NOT NULL DEFAULT 0,
            stock_status    TEXT NOT NULL DEFAULT 'UNKNOWN',
            import_batch_id TEXT,
            created_at      TEXT NOT NULL,
            updated_at      TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_catalog_category ON product_catalog(category);
        CREATE INDEX IF NOT EXISTS idx_catalog_popularity ON product_catalog(popularity);

        -- 导入批次记录
        CREATE TABLE IF NOT EXISTS import_batch (
            batch_id       TEXT PRIMARY KEY,
            file_name      TEXT NOT NULL,
            total_rows     INTEGER NOT NULL DEFAULT 0,
            imported_rows  INTEGER NOT NULL DEFAULT 0,
            skipped_rows   INTEGER NOT NULL DEFAULT 0,
            imported_at    TEXT NOT NULL
        );

        -- 计划快照（载荷为不透明 JSON）
        CREATE TABLE IF NOT EXISTS plan_snapshot (
            snapshot_id  TEXT PRIMARY KEY,
            plan_scope   TEXT NOT NULL,
            plan_label   TEXT NOT NULL,
            payload_json TEXT NOT NULL,
            created_at   TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_snapshot_created ON plan_snapshot(created_at);

        -- 配置 KV
        CREATE TABLE IF NOT EXISTS config_kv (
            scope_id     TEXT NOT NULL,
            config_key   TEXT NOT NULL,
            config_value TEXT NOT NULL,
            updated_at   TEXT NOT NULL,
            PRIMARY KEY (scope_id, config_key)
        );
        "#,
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_schema_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        configure_sqlite_connection(&conn).unwrap();
        init_schema(&conn).unwrap();
        // 重复执行不应报错
        init_schema(&conn).unwrap();

        let table_count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name IN ('product_catalog','import_batch','plan_snapshot','config_kv')",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(table_count, 4);
    }
}
