// ==========================================
// 零售促销排期系统 - 主入口
// ==========================================
// 技术栈: Rust + SQLite
// 系统定位: 促销计划自动编排 (人工最终控制权)
// ==========================================

use promo_planner::app::{get_default_db_path, AppState};

fn main() {
    // 初始化日志系统
    promo_planner::logging::init();

    tracing::info!("==================================================");
    tracing::info!("{}", promo_planner::APP_NAME);
    tracing::info!("系统版本: {}", promo_planner::VERSION);
    tracing::info!("==================================================");

    // 获取数据库路径
    let db_path = get_default_db_path();
    tracing::info!("使用数据库: {}", db_path);

    // 创建AppState
    tracing::info!("正在初始化AppState...");
    let app_state = AppState::new(db_path).expect("无法初始化AppState");
    tracing::info!("AppState初始化成功");

    // 目录状态提示
    match app_state.catalog_api.product_count() {
        Ok(0) => {
            tracing::info!("商品目录为空, 请先导入目录文件（.csv/.xlsx/.xls）");
            tracing::info!("库模式用法: state.catalog_api.import_catalog_file(\"目录.csv\")");
        }
        Ok(count) => {
            tracing::info!("商品目录就绪: {} 个商品", count);
        }
        Err(e) => {
            tracing::warn!("读取商品目录失败: {}", e);
        }
    }

    tracing::info!("端到端演示: cargo run --bin plan_demo");
}
