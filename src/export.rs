// ==========================================
// 零售促销排期系统 - 计划导出
// ==========================================
// 职责: 将已生成的促销计划导出为 CSV 文件
// 红线: 导出是只读操作, 不修改计划本身
// ==========================================

use crate::domain::plan::{assign_reason, DaySlot, MonthPlan, WeekPlan};
use crate::i18n;
use csv::Writer;
use std::fs::File;
use std::path::Path;
use thiserror::Error;
use tracing::info;

// CSV 表头（中文列名）
const EXPORT_HEADER: &[&str] = &[
    "周次",
    "日期",
    "星期",
    "商品编号",
    "商品名称",
    "商品分类",
    "品牌",
    "供应商",
    "浏览量",
    "原价",
    "促销价",
    "入选原因",
];

// ==========================================
// 错误类型
// ==========================================
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("导出文件创建失败: {0}")]
    FileCreateError(#[from] std::io::Error),

    #[error("CSV 写入失败: {0}")]
    CsvWriteError(#[from] csv::Error),
}

/// 入选原因的中文展示
fn reason_label(reason: &str) -> &str {
    match reason {
        assign_reason::CATEGORY_TOP => "分类热度",
        assign_reason::RANDOM_POOL => "随机补位",
        assign_reason::AUTO_REPLACEMENT => "自动替换",
        assign_reason::MANUAL_REPLACEMENT => "人工替换",
        other => other,
    }
}

// ==========================================
// PlanCsvExporter - 计划 CSV 导出器
// ==========================================
pub struct PlanCsvExporter;

impl PlanCsvExporter {
    pub fn new() -> Self {
        Self
    }

    /// 导出日计划
    ///
    /// # 返回
    /// - 写出的数据行数（不含表头）
    pub fn export_day<P: AsRef<Path>>(
        &self,
        slot: &DaySlot,
        week_number: u32,
        path: P,
    ) -> Result<usize, ExportError> {
        let file = File::create(path.as_ref())?;
        let mut wtr = Writer::from_writer(file);

        wtr.write_record(EXPORT_HEADER)?;
        let rows = Self::write_day_rows(&mut wtr, week_number, slot)?;
        wtr.flush()?;

        info!(
            slot_date = %slot.slot_date,
            rows,
            "{}",
            Self::export_completed_message(path.as_ref())
        );
        Ok(rows)
    }

    /// 导出周计划
    pub fn export_week<P: AsRef<Path>>(
        &self,
        week: &WeekPlan,
        path: P,
    ) -> Result<usize, ExportError> {
        let file = File::create(path.as_ref())?;
        let mut wtr = Writer::from_writer(file);

        wtr.write_record(EXPORT_HEADER)?;
        let mut rows = 0;
        for slot in &week.days {
            rows += Self::write_day_rows(&mut wtr, week.week_number, slot)?;
        }
        wtr.flush()?;

        info!(
            week_number = week.week_number,
            rows,
            "{}",
            Self::export_completed_message(path.as_ref())
        );
        Ok(rows)
    }

    /// 导出月计划
    pub fn export_month<P: AsRef<Path>>(
        &self,
        month: &MonthPlan,
        path: P,
    ) -> Result<usize, ExportError> {
        let file = File::create(path.as_ref())?;
        let mut wtr = Writer::from_writer(file);

        wtr.write_record(EXPORT_HEADER)?;
        let mut rows = 0;
        for week in &month.weeks {
            for slot in &week.days {
                rows += Self::write_day_rows(&mut wtr, week.week_number, slot)?;
            }
        }
        wtr.flush()?;

        info!(
            year = month.year,
            month = month.month,
            rows,
            "{}",
            Self::export_completed_message(path.as_ref())
        );
        Ok(rows)
    }

    /// 导出完成的本地化提示（随 i18n locale 切换）
    fn export_completed_message(path: &Path) -> String {
        let path_display = path.display().to_string();
        i18n::t_with_args("export.completed", &[("path", &path_display)])
    }

    /// 写出单日的所有商品行
    fn write_day_rows(
        wtr: &mut Writer<File>,
        week_number: u32,
        slot: &DaySlot,
    ) -> Result<usize, ExportError> {
        for item in &slot.items {
            let product = &item.product;
            wtr.write_record(&[
                week_number.to_string(),
                slot.slot_date.to_string(),
                slot.day_name.clone(),
                product.product_id.clone(),
                product.product_name.clone(),
                product.category.clone(),
                product.brand.clone().unwrap_or_default(),
                product.supplier.clone().unwrap_or_default(),
                product.popularity.to_string(),
                format!("{:.2}", product.regular_price),
                format!("{:.2}", item.effective_price()),
                reason_label(&item.assign_reason).to_string(),
            ])?;
        }
        Ok(slot.items.len())
    }
}

impl Default for PlanCsvExporter {
    fn default() -> Self {
        Self::new()
    }
}
