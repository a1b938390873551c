// ==========================================
// 零售促销排期系统 - 计划配置读取 Trait
// ==========================================
// 职责: 定义计划生成所需的配置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use async_trait::async_trait;
use std::error::Error;

// ==========================================
// PlannerConfigReader Trait
// ==========================================
// 用途: 计划生成引擎所需的配置读取接口
// 实现者: ConfigManager（从 config_kv 表读取）
#[async_trait]
pub trait PlannerConfigReader: Send + Sync {
    /// 获取最低促销价（资格门槛, 含等于）
    ///
    /// # 返回
    /// - f64: 销售价达到该值的商品才有促销资格
    ///
    /// # 默认值
    /// - 199.0
    async fn get_min_promo_price(&self) -> Result<f64, Box<dyn Error>>;

    /// 获取每条分类选择的默认商品配额
    ///
    /// # 返回
    /// - u32: 单条选择填充的商品数
    ///
    /// # 默认值
    /// - 3
    async fn get_default_quota(&self) -> Result<u32, Box<dyn Error>>;
}
