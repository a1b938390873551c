// ==========================================
// 零售促销排期系统 - 日历装配引擎
// ==========================================
// 红线: 周起点固定为周一; 月计划覆盖所有与该月相交的
//       完整周, 边界周可溢出到相邻月份
// ==========================================
// 职责: 日期对齐与日/周/月计划结构装配
// 说明: 月计划总天数 = 周数 × 7, 可大于该月日历天数
// ==========================================

use crate::domain::plan::{DaySlot, MonthPlan, WeekPlan};
use crate::domain::types::CategoryChoice;
use chrono::{Datelike, Duration, NaiveDate, Weekday};

/// 每周固定 7 天
pub const DAYS_PER_WEEK: usize = 7;

// ==========================================
// ScheduleAssembler - 日历装配引擎
// ==========================================
pub struct ScheduleAssembler {
    // 无状态引擎，不需要注入依赖
}

impl ScheduleAssembler {
    /// 构造函数
    pub fn new() -> Self {
        Self {}
    }

    /// 星期中文名
    pub fn day_name(weekday: Weekday) -> &'static str {
        match weekday {
            Weekday::Mon => "周一",
            Weekday::Tue => "周二",
            Weekday::Wed => "周三",
            Weekday::Thu => "周四",
            Weekday::Fri => "周五",
            Weekday::Sat => "周六",
            Weekday::Sun => "周日",
        }
    }

    /// 回退到所在周的周一（周一当天原样返回）
    pub fn align_to_monday(date: NaiveDate) -> NaiveDate {
        date - Duration::days(date.weekday().num_days_from_monday() as i64)
    }

    /// 构造一整周的空日槽位
    ///
    /// # 参数
    /// - week_start: 周一日期（调用方保证已对齐）
    /// - daily_selections: 每天的选择组, 不足 7 天时余下各天为空选择
    pub fn week_slots(
        &self,
        week_start: NaiveDate,
        daily_selections: &[Vec<CategoryChoice>],
    ) -> Vec<DaySlot> {
        (0..DAYS_PER_WEEK)
            .map(|offset| {
                let date = week_start + Duration::days(offset as i64);
                let selections = daily_selections.get(offset).cloned().unwrap_or_default();
                DaySlot::new(date, Self::day_name(date.weekday()).to_string(), selections)
            })
            .collect()
    }

    /// 装配周计划
    pub fn assemble_week(&self, week_start: NaiveDate, days: Vec<DaySlot>) -> WeekPlan {
        let end_date = days
            .last()
            .map(|slot| slot.slot_date)
            .unwrap_or(week_start);
        WeekPlan {
            week_number: week_start.iso_week().week(),
            start_date: week_start,
            end_date,
            days,
        }
    }

    /// 与指定月份相交的所有周的周一
    ///
    /// # 说明
    /// - 首周周一可能落在上月（月首日非周一时）
    /// - 末周可能延伸到下月; 非法年月返回空列表
    pub fn month_week_starts(&self, year: i32, month: u32) -> Vec<NaiveDate> {
        let first_day = match NaiveDate::from_ymd_opt(year, month, 1) {
            Some(d) => d,
            None => return Vec::new(),
        };
        let last_day = match Self::last_day_of_month(year, month) {
            Some(d) => d,
            None => return Vec::new(),
        };

        let mut starts = Vec::new();
        let mut cursor = Self::align_to_monday(first_day);
        while cursor <= last_day {
            starts.push(cursor);
            cursor += Duration::days(DAYS_PER_WEEK as i64);
        }
        starts
    }

    /// 装配月计划
    pub fn assemble_month(&self, year: i32, month: u32, weeks: Vec<WeekPlan>) -> MonthPlan {
        MonthPlan { year, month, weeks }
    }

    /// 月末日期（下月首日的前一天）
    fn last_day_of_month(year: i32, month: u32) -> Option<NaiveDate> {
        let (next_year, next_month) = if month == 12 {
            (year + 1, 1)
        } else {
            (year, month + 1)
        };
        NaiveDate::from_ymd_opt(next_year, next_month, 1).and_then(|d| d.pred_opt())
    }
}

impl Default for ScheduleAssembler {
    fn default() -> Self {
        Self::new()
    }
}
