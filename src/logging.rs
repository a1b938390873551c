// ==========================================
// 日志系统初始化
// ==========================================
// 使用 tracing 和 tracing-subscriber
// 支持环境变量配置日志级别
// ==========================================

use tracing_subscriber::{fmt, EnvFilter};

/// 默认过滤指令: 依赖库降噪到 warn, 本库与性能目标保持 info
const DEFAULT_DIRECTIVES: &str = "warn,promo_planner=info,plan_demo=info,perf=info";

/// 初始化日志系统
///
/// # 环境变量
/// - RUST_LOG: 日志级别过滤器（默认: 依赖库 warn, 本库 info）
///   例如: RUST_LOG=debug 或 RUST_LOG=promo_planner=trace
///
/// # 示例
/// ```no_run
/// use promo_planner::logging;
/// logging::init();
/// ```
pub fn init() {
    // RUST_LOG 显式设置时优先, 否则按本库作用域过滤
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVES));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_line_number(true)
        .init();
}

/// 初始化测试环境的日志系统
///
/// 本库放开到 debug, 便于观察生成与导入管线的步骤日志
pub fn init_test() {
    let _ = fmt()
        .with_env_filter(EnvFilter::new("warn,promo_planner=debug,perf=debug"))
        .with_test_writer()
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directives_parse() {
        assert!(EnvFilter::try_new(DEFAULT_DIRECTIVES).is_ok());
    }
}
