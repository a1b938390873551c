// ==========================================
// 零售促销排期系统 - 计划API
// ==========================================
// 职责: 封装计划生成、替代协商、人工替换、改价、快照与导出
// 红线: 人工保留最终控制权 — 替换与改价只校验排他性与基本合法性,
//       不强制推翻操作员决定（低于底价仅告警）
// ==========================================

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::api::error::{ApiError, ApiResult};
use crate::api::validator;
use crate::config::{config_keys, ConfigManager, PlannerConfigReader};
use crate::domain::plan::{assign_reason, DaySlot, MonthPlan, PromoItem, WeekPlan};
use crate::domain::types::{CategoryChoice, PlanScope};
use crate::domain::{PlanSnapshot, Product, UsedProductSet};
use crate::engine::{
    AlternativeSuggestion, AvailabilityReport, GenerationOutcome, PendingGeneration,
    PlanOrchestrator, ReplacementResolver,
};
use crate::export::PlanCsvExporter;
use crate::perf::PerfGuard;
use crate::repository::{PlanSnapshotRepository, ProductRepository};

/// 替换操作响应
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplacementResponse {
    /// 被替换下的原商品
    pub replaced: Product,
    /// 替入的新商品
    pub replacement: Product,
}

/// 计划API
pub struct PlanApi {
    product_repo: Arc<ProductRepository>,
    snapshot_repo: Arc<PlanSnapshotRepository>,
    config: Arc<ConfigManager>,
    orchestrator: PlanOrchestrator<ConfigManager>,
    replacement: ReplacementResolver,
    exporter: PlanCsvExporter,
}

impl PlanApi {
    /// 创建新的 PlanApi 实例
    pub fn new(
        product_repo: Arc<ProductRepository>,
        snapshot_repo: Arc<PlanSnapshotRepository>,
        config: Arc<ConfigManager>,
    ) -> Self {
        let orchestrator = PlanOrchestrator::new(config.clone());
        Self {
            product_repo,
            snapshot_repo,
            config,
            orchestrator,
            replacement: ReplacementResolver::new(),
            exporter: PlanCsvExporter::new(),
        }
    }

    // ==========================================
    // 预检与查询
    // ==========================================

    /// 合格商品列表（达到最低促销价的商品）
    pub async fn eligible_products(&self) -> ApiResult<Vec<Product>> {
        let products = self.product_repo.list_all()?;
        Ok(self.orchestrator.eligible_products(&products).await?)
    }

    /// 生成前的可用性预检
    ///
    /// # 参数
    /// - selections: 各时段的分类选择
    /// - scope: 计划范围（月计划按 配额×7 核算需求）
    pub async fn validate_availability(
        &self,
        selections: &[Vec<CategoryChoice>],
        scope: PlanScope,
        quota_override: Option<u32>,
    ) -> ApiResult<AvailabilityReport> {
        validator::validate_quota(quota_override)?;
        let products = self.product_repo.list_all()?;
        Ok(self
            .orchestrator
            .validate_availability(&products, selections, scope, quota_override)
            .await?)
    }

    /// 合格商品覆盖的分类清单（供排期界面下拉选择）
    pub async fn eligible_categories(&self) -> ApiResult<Vec<String>> {
        let eligible = self.eligible_products().await?;
        Ok(crate::engine::EligibilityFilter::new().unique_categories(&eligible))
    }

    /// 替代分类建议（排除已短缺分类, 末尾附随机选项）
    pub async fn get_alternatives(&self, exclude: &[String]) -> ApiResult<Vec<AlternativeSuggestion>> {
        let products = self.product_repo.list_all()?;
        Ok(self
            .orchestrator
            .propose_alternatives(&products, exclude)
            .await?)
    }

    // ==========================================
    // 日计划
    // ==========================================

    /// 生成日计划
    ///
    /// # 参数
    /// - date_str: 促销日期（YYYY-MM-DD）
    /// - selections: 当日分类选择（有序, 可重复）
    /// - quota_override: 配额覆盖（1~30）, None 取配置默认值
    ///
    /// # 返回
    /// - Ready(DaySlot): 生成成功
    /// - NeedsResolution(PendingGeneration): 分类短缺, 挂起待协商
    pub async fn generate_daily(
        &self,
        date_str: &str,
        selections: Vec<CategoryChoice>,
        quota_override: Option<u32>,
    ) -> ApiResult<GenerationOutcome<DaySlot>> {
        let _perf = PerfGuard::new("generate_daily");
        validator::validate_quota(quota_override)?;
        validator::validate_daily_selections(&selections)?;
        let date = validator::parse_plan_date(date_str)?;

        let products = self.load_catalog_for_generation()?;
        Ok(self
            .orchestrator
            .generate_daily(&products, date, selections, quota_override)
            .await?)
    }

    /// 恢复日计划生成（替代协商确认后）
    ///
    /// # 说明
    /// - replacement_map 必须覆盖全部短缺分类, 否则拒绝
    /// - 重新生成会完整重算可用性, 仍可能再次挂起
    pub async fn resume_daily(
        &self,
        pending: PendingGeneration,
        replacement_map: &HashMap<String, CategoryChoice>,
    ) -> ApiResult<GenerationOutcome<DaySlot>> {
        let _perf = PerfGuard::new("resume_daily");
        let products = self.load_catalog_for_generation()?;
        Ok(self
            .orchestrator
            .resume_daily(&products, pending, replacement_map)
            .await?)
    }

    // ==========================================
    // 周计划
    // ==========================================

    /// 生成周计划
    ///
    /// # 参数
    /// - week_of_str: 周内任意日期（YYYY-MM-DD）, 自动对齐到周一
    /// - daily_selections: 每天一组分类选择, 必须恰好 7 组（允许个别天为空）
    pub async fn generate_weekly(
        &self,
        week_of_str: &str,
        daily_selections: Vec<Vec<CategoryChoice>>,
        quota_override: Option<u32>,
    ) -> ApiResult<GenerationOutcome<WeekPlan>> {
        let _perf = PerfGuard::new("generate_weekly");
        validator::validate_quota(quota_override)?;
        validator::validate_selection_groups(&daily_selections)?;
        let week_of = validator::parse_plan_date(week_of_str)?;

        let products = self.load_catalog_for_generation()?;
        Ok(self
            .orchestrator
            .generate_weekly(&products, week_of, daily_selections, quota_override)
            .await?)
    }

    /// 恢复周计划生成
    pub async fn resume_weekly(
        &self,
        pending: PendingGeneration,
        replacement_map: &HashMap<String, CategoryChoice>,
    ) -> ApiResult<GenerationOutcome<WeekPlan>> {
        let _perf = PerfGuard::new("resume_weekly");
        let products = self.load_catalog_for_generation()?;
        Ok(self
            .orchestrator
            .resume_weekly(&products, pending, replacement_map)
            .await?)
    }

    // ==========================================
    // 月计划
    // ==========================================

    /// 指定月份的周起点列表（周一对齐, 边界周可落在邻月）
    pub fn month_week_starts(&self, year: i32, month: u32) -> ApiResult<Vec<NaiveDate>> {
        let starts = self.orchestrator.month_week_starts(year, month);
        if starts.is_empty() {
            return Err(ApiError::InvalidInput(format!(
                "无效的月份: {}年{}月",
                year, month
            )));
        }
        Ok(starts)
    }

    /// 生成月计划
    ///
    /// # 参数
    /// - weekly_selections: 每周一组分类选择, 组数必须等于该月周数
    pub async fn generate_monthly(
        &self,
        year: i32,
        month: u32,
        weekly_selections: Vec<Vec<CategoryChoice>>,
        quota_override: Option<u32>,
    ) -> ApiResult<GenerationOutcome<MonthPlan>> {
        let _perf = PerfGuard::new("generate_monthly");
        validator::validate_quota(quota_override)?;
        validator::validate_selection_groups(&weekly_selections)?;

        let products = self.load_catalog_for_generation()?;
        Ok(self
            .orchestrator
            .generate_monthly(&products, year, month, weekly_selections, quota_override)
            .await?)
    }

    /// 恢复月计划生成
    pub async fn resume_monthly(
        &self,
        pending: PendingGeneration,
        replacement_map: &HashMap<String, CategoryChoice>,
    ) -> ApiResult<GenerationOutcome<MonthPlan>> {
        let _perf = PerfGuard::new("resume_monthly");
        let products = self.load_catalog_for_generation()?;
        Ok(self
            .orchestrator
            .resume_monthly(&products, pending, replacement_map)
            .await?)
    }

    // ==========================================
    // 人工替换 - 周计划
    // ==========================================

    /// 周计划条目的替换候选（同分类优先, 耗尽后跨分类兜底）
    pub async fn week_replacement_candidates(
        &self,
        week: &WeekPlan,
        day_index: usize,
        item_index: usize,
    ) -> ApiResult<Vec<Product>> {
        let target = Self::week_item(week, day_index, item_index)?.product.clone();
        let eligible = self.eligible_products().await?;
        let used = UsedProductSet::from_week(week);
        Ok(self.replacement.candidates(&target, &eligible, &used))
    }

    /// 自动替换周计划条目（取候选首位）
    pub async fn auto_replace_in_week(
        &self,
        week: &mut WeekPlan,
        day_index: usize,
        item_index: usize,
    ) -> ApiResult<ReplacementResponse> {
        let _perf = PerfGuard::new("auto_replace_in_week");
        let target = Self::week_item(week, day_index, item_index)?.product.clone();
        let eligible = self.eligible_products().await?;
        let used = UsedProductSet::from_week(week);

        let replacement = self
            .replacement
            .resolve_auto(&target, &eligible, &used)
            .ok_or_else(|| ApiError::BusinessRuleViolation("没有可用的替换商品".to_string()))?;
        let replaced = self.replacement.replace_in_week(
            week,
            day_index,
            item_index,
            replacement.clone(),
            assign_reason::AUTO_REPLACEMENT,
        )?;

        info!(
            replaced = %replaced.product_id,
            replacement = %replacement.product_id,
            "周计划自动替换完成"
        );
        Ok(ReplacementResponse {
            replaced,
            replacement,
        })
    }

    /// 手动替换周计划条目（替入商品须在目录中且达到最低促销价）
    pub async fn manual_replace_in_week(
        &self,
        week: &mut WeekPlan,
        day_index: usize,
        item_index: usize,
        replacement_product_id: &str,
    ) -> ApiResult<ReplacementResponse> {
        let _perf = PerfGuard::new("manual_replace_in_week");
        let replacement = self.load_eligible_product(replacement_product_id).await?;
        let replaced = self.replacement.replace_in_week(
            week,
            day_index,
            item_index,
            replacement.clone(),
            assign_reason::MANUAL_REPLACEMENT,
        )?;
        Ok(ReplacementResponse {
            replaced,
            replacement,
        })
    }

    /// 周计划替换检索（编号/名称/品牌/供应商子串匹配, 空串匹配全部）
    pub async fn search_week_replacements(
        &self,
        week: &WeekPlan,
        day_index: usize,
        item_index: usize,
        query: &str,
    ) -> ApiResult<Vec<Product>> {
        let target_id = Self::week_item(week, day_index, item_index)?
            .product_id()
            .to_string();
        let eligible = self.eligible_products().await?;
        let used = UsedProductSet::from_week(week);
        Ok(self.replacement.search(query, &eligible, &used, &target_id))
    }

    // ==========================================
    // 人工替换 - 月计划
    // ==========================================

    /// 月计划条目的替换候选（排他范围为整月）
    pub async fn month_replacement_candidates(
        &self,
        month: &MonthPlan,
        week_index: usize,
        day_index: usize,
        item_index: usize,
    ) -> ApiResult<Vec<Product>> {
        let target = Self::month_item(month, week_index, day_index, item_index)?
            .product
            .clone();
        let eligible = self.eligible_products().await?;
        let used = UsedProductSet::from_month(month);
        Ok(self.replacement.candidates(&target, &eligible, &used))
    }

    /// 自动替换月计划条目
    pub async fn auto_replace_in_month(
        &self,
        month: &mut MonthPlan,
        week_index: usize,
        day_index: usize,
        item_index: usize,
    ) -> ApiResult<ReplacementResponse> {
        let _perf = PerfGuard::new("auto_replace_in_month");
        let target = Self::month_item(month, week_index, day_index, item_index)?
            .product
            .clone();
        let eligible = self.eligible_products().await?;
        let used = UsedProductSet::from_month(month);

        let replacement = self
            .replacement
            .resolve_auto(&target, &eligible, &used)
            .ok_or_else(|| ApiError::BusinessRuleViolation("没有可用的替换商品".to_string()))?;
        let replaced = self.replacement.replace_in_month(
            month,
            week_index,
            day_index,
            item_index,
            replacement.clone(),
            assign_reason::AUTO_REPLACEMENT,
        )?;
        Ok(ReplacementResponse {
            replaced,
            replacement,
        })
    }

    /// 手动替换月计划条目
    pub async fn manual_replace_in_month(
        &self,
        month: &mut MonthPlan,
        week_index: usize,
        day_index: usize,
        item_index: usize,
        replacement_product_id: &str,
    ) -> ApiResult<ReplacementResponse> {
        let _perf = PerfGuard::new("manual_replace_in_month");
        let replacement = self.load_eligible_product(replacement_product_id).await?;
        let replaced = self.replacement.replace_in_month(
            month,
            week_index,
            day_index,
            item_index,
            replacement.clone(),
            assign_reason::MANUAL_REPLACEMENT,
        )?;
        Ok(ReplacementResponse {
            replaced,
            replacement,
        })
    }

    /// 月计划替换检索
    pub async fn search_month_replacements(
        &self,
        month: &MonthPlan,
        week_index: usize,
        day_index: usize,
        item_index: usize,
        query: &str,
    ) -> ApiResult<Vec<Product>> {
        let target_id = Self::month_item(month, week_index, day_index, item_index)?
            .product_id()
            .to_string();
        let eligible = self.eligible_products().await?;
        let used = UsedProductSet::from_month(month);
        Ok(self.replacement.search(query, &eligible, &used, &target_id))
    }

    // ==========================================
    // 人工改价
    // ==========================================

    /// 覆写周计划条目的促销价
    ///
    /// # 说明
    /// - 低于促销底价（5% 毛利保护线）仅告警, 不拦截
    pub fn override_price_in_week(
        &self,
        week: &mut WeekPlan,
        day_index: usize,
        item_index: usize,
        new_price: f64,
    ) -> ApiResult<()> {
        validator::validate_promo_price(new_price)?;
        let item = Self::week_item_mut(week, day_index, item_index)?;
        Self::apply_override(item, new_price);
        Ok(())
    }

    /// 清除周计划条目的促销价覆写（恢复原价展示）
    pub fn clear_price_override_in_week(
        &self,
        week: &mut WeekPlan,
        day_index: usize,
        item_index: usize,
    ) -> ApiResult<()> {
        let item = Self::week_item_mut(week, day_index, item_index)?;
        item.clear_price_override();
        Ok(())
    }

    /// 覆写月计划条目的促销价
    pub fn override_price_in_month(
        &self,
        month: &mut MonthPlan,
        week_index: usize,
        day_index: usize,
        item_index: usize,
        new_price: f64,
    ) -> ApiResult<()> {
        validator::validate_promo_price(new_price)?;
        let item = Self::month_item_mut(month, week_index, day_index, item_index)?;
        Self::apply_override(item, new_price);
        Ok(())
    }

    /// 清除月计划条目的促销价覆写
    pub fn clear_price_override_in_month(
        &self,
        month: &mut MonthPlan,
        week_index: usize,
        day_index: usize,
        item_index: usize,
    ) -> ApiResult<()> {
        let item = Self::month_item_mut(month, week_index, day_index, item_index)?;
        item.clear_price_override();
        Ok(())
    }

    // ==========================================
    // 计划快照
    // ==========================================

    /// 保存日计划快照
    pub fn save_day_snapshot(&self, slot: &DaySlot, label: &str) -> ApiResult<PlanSnapshot> {
        validator::validate_snapshot_label(label)?;
        let payload = serde_json::to_string(slot)?;
        Ok(self.snapshot_repo.save(PlanScope::Daily, label, &payload)?)
    }

    /// 保存周计划快照
    pub fn save_week_snapshot(&self, week: &WeekPlan, label: &str) -> ApiResult<PlanSnapshot> {
        validator::validate_snapshot_label(label)?;
        let payload = serde_json::to_string(week)?;
        Ok(self.snapshot_repo.save(PlanScope::Weekly, label, &payload)?)
    }

    /// 保存月计划快照
    pub fn save_month_snapshot(&self, month: &MonthPlan, label: &str) -> ApiResult<PlanSnapshot> {
        validator::validate_snapshot_label(label)?;
        let payload = serde_json::to_string(month)?;
        Ok(self
            .snapshot_repo
            .save(PlanScope::Monthly, label, &payload)?)
    }

    /// 快照列表（可按范围过滤, 按保存时间倒序）
    pub fn list_snapshots(&self, scope: Option<PlanScope>) -> ApiResult<Vec<PlanSnapshot>> {
        Ok(self.snapshot_repo.list(scope)?)
    }

    /// 载入日计划快照
    pub fn load_day_snapshot(&self, snapshot_id: &str) -> ApiResult<DaySlot> {
        let snapshot = self.load_snapshot_of_scope(snapshot_id, PlanScope::Daily)?;
        Ok(serde_json::from_str(&snapshot.payload_json)?)
    }

    /// 载入周计划快照
    pub fn load_week_snapshot(&self, snapshot_id: &str) -> ApiResult<WeekPlan> {
        let snapshot = self.load_snapshot_of_scope(snapshot_id, PlanScope::Weekly)?;
        Ok(serde_json::from_str(&snapshot.payload_json)?)
    }

    /// 载入月计划快照
    pub fn load_month_snapshot(&self, snapshot_id: &str) -> ApiResult<MonthPlan> {
        let snapshot = self.load_snapshot_of_scope(snapshot_id, PlanScope::Monthly)?;
        Ok(serde_json::from_str(&snapshot.payload_json)?)
    }

    /// 删除快照
    pub fn delete_snapshot(&self, snapshot_id: &str) -> ApiResult<usize> {
        let deleted = self.snapshot_repo.delete(snapshot_id)?;
        if deleted == 0 {
            return Err(ApiError::NotFound(format!(
                "快照(id={})不存在",
                snapshot_id
            )));
        }
        Ok(deleted)
    }

    // ==========================================
    // 计划导出
    // ==========================================

    /// 导出日计划 CSV
    pub fn export_day_csv(&self, slot: &DaySlot, path: &str) -> ApiResult<usize> {
        let week_number = slot.slot_date.iso_week().week();
        Ok(self.exporter.export_day(slot, week_number, path)?)
    }

    /// 导出周计划 CSV
    pub fn export_week_csv(&self, week: &WeekPlan, path: &str) -> ApiResult<usize> {
        Ok(self.exporter.export_week(week, path)?)
    }

    /// 导出月计划 CSV
    pub fn export_month_csv(&self, month: &MonthPlan, path: &str) -> ApiResult<usize> {
        Ok(self.exporter.export_month(month, path)?)
    }

    // ==========================================
    // 计划配置
    // ==========================================

    /// 读取配置值
    pub fn get_config_value(&self, key: &str) -> ApiResult<Option<String>> {
        self.config
            .get_global_config_value(key)
            .map_err(|e| ApiError::ConfigError(e.to_string()))
    }

    /// 写入配置值（仅接受已知配置键, 并校验取值）
    pub fn set_config_value(&self, key: &str, value: &str) -> ApiResult<()> {
        match key {
            config_keys::MIN_PROMO_PRICE => {
                let price = value.trim().parse::<f64>().map_err(|_| {
                    ApiError::InvalidInput(format!("最低促销价必须为数值: {}", value))
                })?;
                validator::validate_promo_price(price)?;
            }
            config_keys::DEFAULT_PRODUCTS_PER_CHOICE => {
                let quota = value.trim().parse::<u32>().map_err(|_| {
                    ApiError::InvalidInput(format!("默认配额必须为正整数: {}", value))
                })?;
                validator::validate_quota(Some(quota))?;
            }
            other => {
                return Err(ApiError::InvalidInput(format!("未知的配置键: {}", other)));
            }
        }
        self.config
            .set_global_config_value(key, value.trim())
            .map_err(|e| ApiError::ConfigError(e.to_string()))
    }

    /// 全量配置快照（JSON）
    pub fn get_config_snapshot(&self) -> ApiResult<String> {
        self.config
            .get_config_snapshot()
            .map_err(|e| ApiError::ConfigError(e.to_string()))
    }

    // ==========================================
    // 内部工具
    // ==========================================

    /// 载入快照并校验计划范围一致
    fn load_snapshot_of_scope(
        &self,
        snapshot_id: &str,
        scope: PlanScope,
    ) -> ApiResult<PlanSnapshot> {
        let snapshot = self.snapshot_repo.find_by_id(snapshot_id)?;
        if snapshot.plan_scope != scope {
            return Err(ApiError::InvalidInput(format!(
                "快照 {} 属于{}计划, 无法按{}计划载入",
                snapshot_id, snapshot.plan_scope, scope
            )));
        }
        Ok(snapshot)
    }

    /// 生成用目录加载（空目录直接拒绝, 避免生成一份全短缺的挂起结果）
    fn load_catalog_for_generation(&self) -> ApiResult<Vec<Product>> {
        let products = self.product_repo.list_all()?;
        if products.is_empty() {
            return Err(ApiError::BusinessRuleViolation(
                "商品目录为空, 请先导入商品".to_string(),
            ));
        }
        Ok(products)
    }

    /// 按编号加载商品并校验促销资格
    async fn load_eligible_product(&self, product_id: &str) -> ApiResult<Product> {
        let product = self.product_repo.find_by_id(product_id)?;
        let min_price = self
            .config
            .get_min_promo_price()
            .await
            .map_err(|e| ApiError::ConfigError(e.to_string()))?;
        if product.regular_price < min_price {
            return Err(ApiError::BusinessRuleViolation(format!(
                "商品 {} 销售价 {:.2} 未达最低促销价 {:.2}",
                product_id, product.regular_price, min_price
            )));
        }
        Ok(product)
    }

    fn week_item<'a>(
        week: &'a WeekPlan,
        day_index: usize,
        item_index: usize,
    ) -> ApiResult<&'a PromoItem> {
        week.days
            .get(day_index)
            .and_then(|d| d.items.get(item_index))
            .ok_or_else(|| {
                ApiError::InvalidInput(format!(
                    "周计划内不存在条目: 第 {} 天第 {} 项",
                    day_index, item_index
                ))
            })
    }

    fn week_item_mut<'a>(
        week: &'a mut WeekPlan,
        day_index: usize,
        item_index: usize,
    ) -> ApiResult<&'a mut PromoItem> {
        week.days
            .get_mut(day_index)
            .and_then(|d| d.items.get_mut(item_index))
            .ok_or_else(|| {
                ApiError::InvalidInput(format!(
                    "周计划内不存在条目: 第 {} 天第 {} 项",
                    day_index, item_index
                ))
            })
    }

    fn month_item<'a>(
        month: &'a MonthPlan,
        week_index: usize,
        day_index: usize,
        item_index: usize,
    ) -> ApiResult<&'a PromoItem> {
        month
            .weeks
            .get(week_index)
            .and_then(|w| w.days.get(day_index))
            .and_then(|d| d.items.get(item_index))
            .ok_or_else(|| {
                ApiError::InvalidInput(format!(
                    "月计划内不存在条目: 第 {} 周第 {} 天第 {} 项",
                    week_index, day_index, item_index
                ))
            })
    }

    fn month_item_mut<'a>(
        month: &'a mut MonthPlan,
        week_index: usize,
        day_index: usize,
        item_index: usize,
    ) -> ApiResult<&'a mut PromoItem> {
        month
            .weeks
            .get_mut(week_index)
            .and_then(|w| w.days.get_mut(day_index))
            .and_then(|d| d.items.get_mut(item_index))
            .ok_or_else(|| {
                ApiError::InvalidInput(format!(
                    "月计划内不存在条目: 第 {} 周第 {} 天第 {} 项",
                    week_index, day_index, item_index
                ))
            })
    }

    /// 应用改价, 低于底价告警
    fn apply_override(item: &mut PromoItem, new_price: f64) {
        if let Some(floor) = item.product.sale_floor_price() {
            if new_price < floor {
                warn!(
                    product_id = %item.product_id(),
                    new_price,
                    floor,
                    "促销价低于 5% 毛利保护线"
                );
            }
        }
        item.apply_price_override(new_price);
    }
}
