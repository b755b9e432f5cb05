//! 日期與月份工具、時鐘抽象

use chrono::{Datelike, Local, NaiveDate, NaiveDateTime};

/// 取得當月 1 日
pub fn month_start(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// 前一天（用於關閉時態記錄：新記錄生效日的前一天）
///
/// `NaiveDate::MIN` 沒有前一天，回傳原日期。
pub fn day_before(date: NaiveDate) -> NaiveDate {
    date.pred_opt().unwrap_or(date)
}

/// 兩個月份之間相差的月數（`to` 在 `from` 之前時為負數）
pub fn months_between(from: NaiveDate, to: NaiveDate) -> i32 {
    (to.year() - from.year()) * 12 + (to.month() as i32 - from.month() as i32)
}

/// 時鐘（注入「今天」，方便測試）
pub trait Clock: Send + Sync {
    /// 今天
    fn today(&self) -> NaiveDate;

    /// 目前時間
    fn now(&self) -> NaiveDateTime;
}

/// 系統時鐘（本地時間）
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }

    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// 固定時鐘（測試用）
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    now: NaiveDateTime,
}

impl FixedClock {
    pub fn new(now: NaiveDateTime) -> Self {
        Self { now }
    }

    /// 固定在指定日期的 00:00
    pub fn on(date: NaiveDate) -> Self {
        Self {
            now: date.and_time(chrono::NaiveTime::MIN),
        }
    }
}

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.now.date()
    }

    fn now(&self) -> NaiveDateTime {
        self.now
    }
}
