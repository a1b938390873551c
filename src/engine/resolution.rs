// ==========================================
// 零售促销排期系统 - 替代分类协商协议
// ==========================================
// 红线: 挂起期间不落任何持久状态, 取消 = 丢弃挂起对象;
//       替换映射必须覆盖全部短缺分类, 部分映射直接拒绝
// ==========================================
// 职责: 短缺时挂起生成流程, 提出替代分类建议,
//       应用完整替换映射后交还编排器重新校验
// ==========================================

use crate::domain::types::{CategoryChoice, PlanScope};
use crate::engine::availability::AvailabilityReport;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

// ==========================================
// 错误定义
// ==========================================
#[derive(Error, Debug)]
pub enum ResolutionError {
    #[error("替换映射不完整, 缺少分类: {missing:?}")]
    IncompleteReplacementMap { missing: Vec<String> },
}

// ==========================================
// 替代分类建议
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlternativeSuggestion {
    /// 建议的选择（分类字面或随机）
    pub choice: CategoryChoice,
    /// 该选择下的合格商品数
    pub available_count: usize,
}

// ==========================================
// 挂起的生成请求
// ==========================================
// 调用方持有; 丢弃即取消, 无需任何清理动作
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingGeneration {
    /// 计划范围
    pub scope: PlanScope,
    /// 锚点日期: 日计划 = 当日; 周计划 = 周一; 月计划 = 月首日
    pub anchor_date: NaiveDate,
    /// 原始选择布局（日/周 = 单槽位组; 月 = 每周一组）
    pub selections: Vec<Vec<CategoryChoice>>,
    /// 生成请求携带的配额
    pub quota: u32,
    /// 触发挂起的可用性报告
    pub report: AvailabilityReport,
    /// 替代分类建议（按合格数降序）
    pub suggestions: Vec<AlternativeSuggestion>,
}

// ==========================================
// 生成结果
// ==========================================
/// 计划生成要么直接就绪, 要么因短缺挂起等待协商
#[derive(Debug, Clone)]
pub enum GenerationOutcome<P> {
    /// 可用性校验通过, 计划已生成
    Ready(P),
    /// 存在短缺分类, 流程挂起
    NeedsResolution(PendingGeneration),
}

impl<P> GenerationOutcome<P> {
    pub fn is_ready(&self) -> bool {
        matches!(self, GenerationOutcome::Ready(_))
    }

    /// 取出就绪计划
    pub fn ready(self) -> Option<P> {
        match self {
            GenerationOutcome::Ready(plan) => Some(plan),
            GenerationOutcome::NeedsResolution(_) => None,
        }
    }

    /// 取出挂起请求
    pub fn pending(self) -> Option<PendingGeneration> {
        match self {
            GenerationOutcome::Ready(_) => None,
            GenerationOutcome::NeedsResolution(pending) => Some(pending),
        }
    }
}

// ==========================================
// AlternativeResolver - 替代分类协商引擎
// ==========================================
pub struct AlternativeResolver {
    // 无状态引擎，不需要注入依赖
}

impl AlternativeResolver {
    /// 构造函数
    pub fn new() -> Self {
        Self {}
    }

    /// 提出替代分类建议
    ///
    /// # 参数
    /// - available_by_category: 各分类合格商品数
    /// - exclude: 不纳入建议的分类（即短缺分类本身）
    ///
    /// # 返回
    /// - 建议列表: 非短缺分类按合格数降序（同数按名称升序）,
    ///   末尾附随机选择, 计数为全部合格商品总数
    pub fn propose_alternatives(
        &self,
        available_by_category: &HashMap<String, usize>,
        exclude: &[String],
    ) -> Vec<AlternativeSuggestion> {
        let mut suggestions: Vec<AlternativeSuggestion> = available_by_category
            .iter()
            .filter(|(name, count)| !exclude.contains(name) && **count > 0)
            .map(|(name, count)| AlternativeSuggestion {
                choice: CategoryChoice::Literal(name.clone()),
                available_count: *count,
            })
            .collect();
        suggestions.sort_by(|a, b| {
            b.available_count
                .cmp(&a.available_count)
                .then_with(|| a.choice.display_name().cmp(b.choice.display_name()))
        });

        // 随机选择始终可作替代, 计数为全池规模
        let total: usize = available_by_category.values().sum();
        suggestions.push(AlternativeSuggestion {
            choice: CategoryChoice::Random,
            available_count: total,
        });
        suggestions
    }

    /// 应用替换映射, 产出重排后的选择布局
    ///
    /// # 参数
    /// - selections: 原始选择布局
    /// - replacement_map: 短缺分类 → 替代选择
    /// - failing: 全部短缺分类
    ///
    /// # 说明
    /// - 映射未覆盖全部短缺分类时整体拒绝, 不做部分替换
    /// - 短缺分类的每一次出现都被替换（包括同槽位多次出现）
    pub fn apply_replacements(
        &self,
        selections: &[Vec<CategoryChoice>],
        replacement_map: &HashMap<String, CategoryChoice>,
        failing: &[String],
    ) -> Result<Vec<Vec<CategoryChoice>>, ResolutionError> {
        let missing: Vec<String> = failing
            .iter()
            .filter(|name| !replacement_map.contains_key(*name))
            .cloned()
            .collect();
        if !missing.is_empty() {
            return Err(ResolutionError::IncompleteReplacementMap { missing });
        }

        let remapped = selections
            .iter()
            .map(|slot| {
                slot.iter()
                    .map(|choice| match choice {
                        CategoryChoice::Literal(name) if failing.contains(name) => {
                            replacement_map[name].clone()
                        }
                        other => other.clone(),
                    })
                    .collect()
            })
            .collect();
        Ok(remapped)
    }
}

impl Default for AlternativeResolver {
    fn default() -> Self {
        Self::new()
    }
}
