// ==========================================
// 零售促销排期系统 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value + scope)
// ==========================================

use crate::config::planner_config_trait::PlannerConfigReader;
use crate::db::open_sqlite_connection;
use async_trait::async_trait;
use rusqlite::{params, Connection};
use serde_json::json;
use std::collections::HashMap;
use std::error::Error;
use std::sync::{Arc, Mutex};

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> Result<Self, Box<dyn Error>> {
        let conn = open_sqlite_connection(db_path)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 说明: 为保证连接行为一致, 会对传入连接再次应用统一 PRAGMA（幂等）
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Result<Self, Box<dyn Error>> {
        {
            let conn_guard = conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
            crate::db::configure_sqlite_connection(&conn_guard)?;
        }
        Ok(Self { conn })
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    fn get_config_value(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
        let result = conn.query_row(
            "SELECT config_value FROM config_kv WHERE scope_id = 'global' AND config_key = ?1",
            params![key],
            |row| row.get::<_, String>(0),
        );
        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(Box::new(e)),
        }
    }

    /// 读取 global scope 的配置值（公开方法, 供其他模块复用）
    pub fn get_global_config_value(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        self.get_config_value(key)
    }

    /// 写入 global scope 的配置值（UPSERT）
    pub fn set_global_config_value(&self, key: &str, value: &str) -> Result<(), Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
        let now = chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
        conn.execute(
            "INSERT INTO config_kv (scope_id, config_key, config_value, updated_at)
             VALUES ('global', ?1, ?2, ?3)
             ON CONFLICT(scope_id, config_key) DO UPDATE SET
                 config_value = ?2, updated_at = ?3",
            params![key, value, now],
        )?;
        Ok(())
    }

    /// 从 config_kv 表读取配置值, 带默认值
    fn get_config_or_default(&self, key: &str, default: &str) -> Result<String, Box<dyn Error>> {
        Ok(self
            .get_config_value(key)?
            .unwrap_or_else(|| default.to_string()))
    }

    /// 获取所有配置的快照（JSON 格式）
    ///
    /// # 用途
    /// - 保存计划快照时附带当时的配置, 便于追溯生成参数
    pub fn get_config_snapshot(&self) -> Result<String, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
        let mut stmt = conn.prepare(
            "SELECT config_key, config_value FROM config_kv
             WHERE scope_id = 'global' ORDER BY config_key",
        )?;

        let mut config_map: HashMap<String, String> = HashMap::new();
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;
        for row in rows {
            let (key, value) = row?;
            config_map.insert(key, value);
        }

        Ok(serde_json::to_string(&json!(config_map))?)
    }
}

// ==========================================
// PlannerConfigReader 实现
// ==========================================
#[async_trait]
impl PlannerConfigReader for ConfigManager {
    async fn get_min_promo_price(&self) -> Result<f64, Box<dyn Error>> {
        let value = self.get_config_or_default(config_keys::MIN_PROMO_PRICE, "199.0")?;
        Ok(value.parse::<f64>().unwrap_or(199.0))
    }

    async fn get_default_quota(&self) -> Result<u32, Box<dyn Error>> {
        let value =
            self.get_config_or_default(config_keys::DEFAULT_PRODUCTS_PER_CHOICE, "3")?;
        Ok(value.parse::<u32>().unwrap_or(3))
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    /// 最低促销价（资格门槛）
    pub const MIN_PROMO_PRICE: &str = "min_promo_price";

    /// 每条分类选择的默认商品配额
    pub const DEFAULT_PRODUCTS_PER_CHOICE: &str = "default_products_per_choice";
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_manager() -> ConfigManager {
        let conn = Connection::open_in_memory().unwrap();
        crate::db::init_schema(&conn).unwrap();
        ConfigManager::from_connection(Arc::new(Mutex::new(conn))).unwrap()
    }

    #[tokio::test]
    async fn test_defaults_without_rows() {
        let manager = create_test_manager();
        assert_eq!(manager.get_min_promo_price().await.unwrap(), 199.0);
        assert_eq!(manager.get_default_quota().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_set_and_read_back() {
        let manager = create_test_manager();
        manager
            .set_global_config_value(config_keys::MIN_PROMO_PRICE, "259.0")
            .unwrap();
        manager
            .set_global_config_value(config_keys::DEFAULT_PRODUCTS_PER_CHOICE, "5")
            .unwrap();

        assert_eq!(manager.get_min_promo_price().await.unwrap(), 259.0);
        assert_eq!(manager.get_default_quota().await.unwrap(), 5);

        // 覆写生效
        manager
            .set_global_config_value(config_keys::MIN_PROMO_PRICE, "299.0")
            .unwrap();
        assert_eq!(manager.get_min_promo_price().await.unwrap(), 299.0);
    }

    #[tokio::test]
    async fn test_malformed_value_falls_back() {
        let manager = create_test_manager();
        manager
            .set_global_config_value(config_keys::DEFAULT_PRODUCTS_PER_CHOICE, "abc")
            .unwrap();
        assert_eq!(manager.get_default_quota().await.unwrap(), 3);
    }

    #[test]
    fn test_config_snapshot() {
        let manager = create_test_manager();
        manager
            .set_global_config_value(config_keys::MIN_PROMO_PRICE, "199.0")
            .unwrap();

        let snapshot = manager.get_config_snapshot().unwrap();
        let parsed: HashMap<String, String> = serde_json::from_str(&snapshot).unwrap();
        assert_eq!(parsed.get("min_promo_price"), Some(&"199.0".to_string()));
    }
}
