// ==========================================
// 零售促销排期系统 - 计划生成编排器
// ==========================================
// 红线: 生成顺序固定为 资格过滤 → 可用性分析 → 分配 → 装配,
//       可用性不过关一律挂起, 绝不生成残缺计划;
//       恢复生成必须重新走完整校验（替代分类可能再次短缺）
// ==========================================
// 职责: 串联各引擎完成日/周/月计划生成与协商恢复
// 配置: 最低促销价与默认配额经配置读取接口注入
// ==========================================

use crate::config::PlannerConfigReader;
use crate::domain::plan::{DaySlot, MonthPlan, UsedProductSet, WeekPlan};
use crate::domain::product::Product;
use crate::domain::types::{CategoryChoice, PlanScope};
use crate::engine::allocator::SlotAllocator;
use crate::engine::assembler::{ScheduleAssembler, DAYS_PER_WEEK};
use crate::engine::availability::{AvailabilityAnalyzer, AvailabilityReport};
use crate::engine::eligibility::EligibilityFilter;
use crate::engine::resolution::{
    AlternativeResolver, AlternativeSuggestion, GenerationOutcome, PendingGeneration,
    ResolutionError,
};
use chrono::{Datelike, NaiveDate};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, instrument};

// ==========================================
// 错误定义
// ==========================================
#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("选择组数量不匹配: 期望 {expected} 组, 实际 {got} 组")]
    SelectionCountMismatch { expected: usize, got: usize },

    #[error("无效的月份: {year}年{month}月")]
    InvalidMonth { year: i32, month: u32 },

    #[error("读取计划配置失败: {0}")]
    Config(String),

    #[error(transparent)]
    Resolution(#[from] ResolutionError),
}

// ==========================================
// PlanOrchestrator - 计划生成编排器
// ==========================================
pub struct PlanOrchestrator<C: PlannerConfigReader> {
    config: Arc<C>,
    eligibility: EligibilityFilter,
    analyzer: AvailabilityAnalyzer,
    allocator: SlotAllocator,
    resolver: AlternativeResolver,
    assembler: ScheduleAssembler,
}

impl<C: PlannerConfigReader> PlanOrchestrator<C> {
    /// 构造函数
    pub fn new(config: Arc<C>) -> Self {
        Self {
            config,
            eligibility: EligibilityFilter::new(),
            analyzer: AvailabilityAnalyzer::new(),
            allocator: SlotAllocator::new(),
            resolver: AlternativeResolver::new(),
            assembler: ScheduleAssembler::new(),
        }
    }

    /// 读取生成参数: (最低促销价, 配额)
    async fn load_params(
        &self,
        quota_override: Option<u32>,
    ) -> Result<(f64, u32), GenerationError> {
        let min_price = self
            .config
            .get_min_promo_price()
            .await
            .map_err(|e| GenerationError::Config(e.to_string()))?;
        let quota = match quota_override {
            Some(q) => q,
            None => self
                .config
                .get_default_quota()
                .await
                .map_err(|e| GenerationError::Config(e.to_string()))?,
        };
        Ok((min_price, quota))
    }

    /// 合格商品列表（资格过滤结果, 顺序与目录一致）
    pub async fn eligible_products(
        &self,
        products: &[Product],
    ) -> Result<Vec<Product>, GenerationError> {
        let (min_price, _) = self.load_params(None).await?;
        Ok(self.eligibility.filter_eligible(products, min_price))
    }

    /// 独立的可用性预检（生成前给前置页面用）
    pub async fn validate_availability(
        &self,
        products: &[Product],
        selections: &[Vec<CategoryChoice>],
        scope: PlanScope,
        quota_override: Option<u32>,
    ) -> Result<AvailabilityReport, GenerationError> {
        let (min_price, quota) = self.load_params(quota_override).await?;
        let eligible = self.eligibility.filter_eligible(products, min_price);
        let demand = self.demand_per_choice(scope, quota);
        Ok(self.analyzer.analyze(&eligible, selections, demand))
    }

    /// 替代分类建议（短缺分类不纳入）
    pub async fn propose_alternatives(
        &self,
        products: &[Product],
        exclude: &[String],
    ) -> Result<Vec<AlternativeSuggestion>, GenerationError> {
        let eligible = self.eligible_products(products).await?;
        let available = self.analyzer.available_by_category(&eligible);
        Ok(self.resolver.propose_alternatives(&available, exclude))
    }

    // ==========================================
    // 日计划
    // ==========================================

    /// 生成单日计划
    ///
    /// # 参数
    /// - products: 商品目录全量
    /// - date: 促销日期
    /// - selections: 当日分类选择（按配置顺序分配）
    /// - quota_override: 配额覆盖, None 时取配置默认值
    #[instrument(skip(self, products), fields(date = %date, choice_count = selections.len()))]
    pub async fn generate_daily(
        &self,
        products: &[Product],
        date: NaiveDate,
        selections: Vec<CategoryChoice>,
        quota_override: Option<u32>,
    ) -> Result<GenerationOutcome<DaySlot>, GenerationError> {
        let (min_price, quota) = self.load_params(quota_override).await?;
        let eligible = self.eligibility.filter_eligible(products, min_price);

        let selection_groups = vec![selections.clone()];
        let report = self.analyzer.analyze(&eligible, &selection_groups, quota);
        if !report.is_valid() {
            return Ok(self.build_pending(
                PlanScope::Daily,
                date,
                selection_groups,
                quota,
                report,
                &eligible,
            ));
        }

        let mut slot = DaySlot::new(
            date,
            ScheduleAssembler::day_name(date.weekday()).to_string(),
            selections,
        );
        let mut used = UsedProductSet::new();
        let mut rng = StdRng::from_entropy();
        self.allocator
            .fill_slot(&eligible, &mut slot, &mut used, quota, &mut rng);

        info!(date = %date, item_count = slot.items.len(), "日计划生成完成");
        Ok(GenerationOutcome::Ready(slot))
    }

    /// 恢复日计划生成（应用替换映射后重新校验）
    pub async fn resume_daily(
        &self,
        products: &[Product],
        pending: PendingGeneration,
        replacement_map: &HashMap<String, CategoryChoice>,
    ) -> Result<GenerationOutcome<DaySlot>, GenerationError> {
        let failing = pending.report.failing_categories();
        let remapped =
            self.resolver
                .apply_replacements(&pending.selections, replacement_map, &failing)?;
        let selections = remapped.into_iter().next().unwrap_or_default();
        self.generate_daily(products, pending.anchor_date, selections, Some(pending.quota))
            .await
    }

    // ==========================================
    // 周计划
    // ==========================================

    /// 生成周计划
    ///
    /// # 参数
    /// - week_of: 周内任意日期, 自动对齐到周一
    /// - daily_selections: 每天一组选择, 必须恰好 7 组
    #[instrument(skip(self, products, daily_selections), fields(week_of = %week_of))]
    pub async fn generate_weekly(
        &self,
        products: &[Product],
        week_of: NaiveDate,
        daily_selections: Vec<Vec<CategoryChoice>>,
        quota_override: Option<u32>,
    ) -> Result<GenerationOutcome<WeekPlan>, GenerationError> {
        if daily_selections.len() != DAYS_PER_WEEK {
            return Err(GenerationError::SelectionCountMismatch {
                expected: DAYS_PER_WEEK,
                got: daily_selections.len(),
            });
        }

        let (min_price, quota) = self.load_params(quota_override).await?;
        let eligible = self.eligibility.filter_eligible(products, min_price);
        let week_start = ScheduleAssembler::align_to_monday(week_of);

        let report = self.analyzer.analyze(&eligible, &daily_selections, quota);
        if !report.is_valid() {
            return Ok(self.build_pending(
                PlanScope::Weekly,
                week_start,
                daily_selections,
                quota,
                report,
                &eligible,
            ));
        }

        let mut slots = self.assembler.week_slots(week_start, &daily_selections);
        let mut used = UsedProductSet::new();
        let mut rng = StdRng::from_entropy();
        self.allocator
            .fill_schedule(&eligible, &mut slots, &mut used, quota, &mut rng);
        let week = self.assembler.assemble_week(week_start, slots);

        info!(
            week_number = week.week_number,
            item_count = week.total_items(),
            "周计划生成完成"
        );
        Ok(GenerationOutcome::Ready(week))
    }

    /// 恢复周计划生成
    pub async fn resume_weekly(
        &self,
        products: &[Product],
        pending: PendingGeneration,
        replacement_map: &HashMap<String, CategoryChoice>,
    ) -> Result<GenerationOutcome<WeekPlan>, GenerationError> {
        let failing = pending.report.failing_categories();
        let remapped =
            self.resolver
                .apply_replacements(&pending.selections, replacement_map, &failing)?;
        self.generate_weekly(products, pending.anchor_date, remapped, Some(pending.quota))
            .await
    }

    // ==========================================
    // 月计划
    // ==========================================

    /// 指定月份的周起点列表（前置页面展示周布局用）
    pub fn month_week_starts(&self, year: i32, month: u32) -> Vec<NaiveDate> {
        self.assembler.month_week_starts(year, month)
    }

    /// 生成月计划
    ///
    /// # 参数
    /// - weekly_selections: 每周一组选择, 组数与该月周数一致;
    ///   一组选择覆盖该周 7 天, 需求按 配额×7 核算
    #[instrument(skip(self, products, weekly_selections), fields(year = year, month = month))]
    pub async fn generate_monthly(
        &self,
        products: &[Product],
        year: i32,
        month: u32,
        weekly_selections: Vec<Vec<CategoryChoice>>,
        quota_override: Option<u32>,
    ) -> Result<GenerationOutcome<MonthPlan>, GenerationError> {
        let anchor = NaiveDate::from_ymd_opt(year, month, 1)
            .ok_or(GenerationError::InvalidMonth { year, month })?;
        let week_starts = self.assembler.month_week_starts(year, month);
        if week_starts.is_empty() {
            return Err(GenerationError::InvalidMonth { year, month });
        }
        if weekly_selections.len() != week_starts.len() {
            return Err(GenerationError::SelectionCountMismatch {
                expected: week_starts.len(),
                got: weekly_selections.len(),
            });
        }

        let (min_price, quota) = self.load_params(quota_override).await?;
        let eligible = self.eligibility.filter_eligible(products, min_price);

        let demand = quota * DAYS_PER_WEEK as u32;
        let report = self.analyzer.analyze(&eligible, &weekly_selections, demand);
        if !report.is_valid() {
            return Ok(self.build_pending(
                PlanScope::Monthly,
                anchor,
                weekly_selections,
                quota,
                report,
                &eligible,
            ));
        }

        // 整月共享一个已用集合, 跨周不重复
        let mut used = UsedProductSet::new();
        let mut rng = StdRng::from_entropy();
        let mut weeks = Vec::with_capacity(week_starts.len());
        for (start, week_selection) in week_starts.iter().zip(weekly_selections.iter()) {
            let per_day: Vec<Vec<CategoryChoice>> =
                (0..DAYS_PER_WEEK).map(|_| week_selection.clone()).collect();
            let mut slots = self.assembler.week_slots(*start, &per_day);
            self.allocator
                .fill_schedule(&eligible, &mut slots, &mut used, quota, &mut rng);
            weeks.push(self.assembler.assemble_week(*start, slots));
        }
        let plan = self.assembler.assemble_month(year, month, weeks);

        info!(
            year = year,
            month = month,
            week_count = plan.weeks.len(),
            item_count = plan.total_items(),
            "月计划生成完成"
        );
        Ok(GenerationOutcome::Ready(plan))
    }

    /// 恢复月计划生成
    pub async fn resume_monthly(
        &self,
        products: &[Product],
        pending: PendingGeneration,
        replacement_map: &HashMap<String, CategoryChoice>,
    ) -> Result<GenerationOutcome<MonthPlan>, GenerationError> {
        let failing = pending.report.failing_categories();
        let remapped =
            self.resolver
                .apply_replacements(&pending.selections, replacement_map, &failing)?;
        self.generate_monthly(
            products,
            pending.anchor_date.year(),
            pending.anchor_date.month(),
            remapped,
            Some(pending.quota),
        )
        .await
    }

    // ==========================================
    // 内部工具
    // ==========================================

    /// 单条选择的需求量: 月计划的周级选择覆盖整周 7 天
    fn demand_per_choice(&self, scope: PlanScope, quota: u32) -> u32 {
        match scope {
            PlanScope::Monthly => quota * DAYS_PER_WEEK as u32,
            PlanScope::Daily | PlanScope::Weekly => quota,
        }
    }

    /// 构造挂起结果（短缺报告 + 替代建议）
    fn build_pending<P>(
        &self,
        scope: PlanScope,
        anchor_date: NaiveDate,
        selections: Vec<Vec<CategoryChoice>>,
        quota: u32,
        report: AvailabilityReport,
        eligible: &[Product],
    ) -> GenerationOutcome<P> {
        let failing = report.failing_categories();
        let available = self.analyzer.available_by_category(eligible);
        let suggestions = self.resolver.propose_alternatives(&available, &failing);
        info!(
            scope = %scope,
            anchor_date = %anchor_date,
            failing = ?failing,
            "分类可用性不足, 生成流程挂起待协商"
        );
        GenerationOutcome::NeedsResolution(PendingGeneration {
            scope,
            anchor_date,
            selections,
            quota,
            report,
            suggestions,
        })
    }
}
