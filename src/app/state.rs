// ==========================================
// 零售促销排期系统 - 应用状态
// ==========================================
// 职责: 管理应用级别的共享状态和API实例
// 说明: 全部 API 共享同一个 SQLite 连接（Arc<Mutex<Connection>>）
// ==========================================

use std::sync::{Arc, Mutex};

use crate::api::{CatalogApi, PlanApi};
use crate::config::ConfigManager;
use crate::db::{init_schema, open_sqlite_connection};
use crate::repository::{PlanSnapshotRepository, ProductRepository};

/// 应用状态
///
/// 包含所有API实例和共享资源
pub struct AppState {
    /// 数据库路径
    pub db_path: String,

    /// 商品目录API
    pub catalog_api: Arc<CatalogApi>,

    /// 计划API
    pub plan_api: Arc<PlanApi>,

    /// 配置管理器（诊断与运维用, 常规配置读写走 PlanApi）
    pub config_manager: Arc<ConfigManager>,
}

impl AppState {
    /// 创建新的AppState实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    ///
    /// # 说明
    /// 该方法会：
    /// 1. 打开共享数据库连接并应用统一 PRAGMA
    /// 2. 初始化数据库结构（幂等建表）
    /// 3. 创建仓储、配置管理器与所有API实例
    pub fn new(db_path: String) -> Result<Self, String> {
        tracing::info!("初始化AppState, 数据库路径: {}", db_path);

        // 创建数据库连接（共享连接）
        let mut conn =
            open_sqlite_connection(&db_path).map_err(|e| format!("无法打开数据库: {}", e))?;
        crate::perf::install_sqlite_tracing(&mut conn);
        init_schema(&conn).map_err(|e| format!("数据库建表失败: {}", e))?;
        let conn = Arc::new(Mutex::new(conn));

        // 仓储层
        let product_repo = Arc::new(ProductRepository::from_connection(conn.clone()));
        let snapshot_repo = Arc::new(PlanSnapshotRepository::from_connection(conn.clone()));

        // 配置管理器
        let config_manager = Arc::new(
            ConfigManager::from_connection(conn)
                .map_err(|e| format!("无法创建ConfigManager: {}", e))?,
        );

        // API层
        let catalog_api = Arc::new(CatalogApi::new(product_repo.clone()));
        let plan_api = Arc::new(PlanApi::new(
            product_repo,
            snapshot_repo,
            config_manager.clone(),
        ));

        tracing::info!("AppState初始化完成");

        Ok(Self {
            db_path,
            catalog_api,
            plan_api,
            config_manager,
        })
    }

    /// 获取数据库路径
    pub fn get_db_path(&self) -> &str {
        &self.db_path
    }
}

// ==========================================
// 默认数据库路径辅助函数
// ==========================================

/// 获取默认数据库路径
///
/// # 返回
/// - 开发环境: 用户数据目录/promo-planner-dev/promo_planner.db
/// - 生产环境: 用户数据目录/promo-planner/promo_planner.db
pub fn get_default_db_path() -> String {
    use std::path::PathBuf;

    // 允许通过环境变量显式指定 DB 路径（便于调试/测试/CI）
    if let Ok(path) = std::env::var("PROMO_PLANNER_DB_PATH") {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    // 先给一个默认回退值, 后续如果能拿到 data_dir 再覆盖
    let mut path = PathBuf::from("./promo_planner.db");

    if let Some(data_dir) = dirs::data_dir() {
        // 开发环境使用独立目录, 避免污染生产数据
        #[cfg(debug_assertions)]
        {
            path = data_dir.join("promo-planner-dev");
        }

        #[cfg(not(debug_assertions))]
        {
            path = data_dir.join("promo-planner");
        }

        // 确保目录存在
        std::fs::create_dir_all(&path).ok();
        path = path.join("promo_planner.db");
    }

    path.to_string_lossy().to_string()
}
