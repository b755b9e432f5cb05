//! 時態記錄版本接續
//!
//! 物料區域價格與構件發布價格共用相同規則：
//! - 同一起始日只能有一筆
//! - 新記錄生效前一天關閉前一筆（前一筆為現行或其失效日跨過新生效日時）
//! - 回溯插入時，新記錄於下一筆生效前一天失效，否則為現行記錄

use chrono::NaiveDate;

use crate::period::day_before;
use crate::{MaterialPlantPrice, PiecePrice};

/// 具有效期間的時態記錄
pub trait Versioned {
    /// 生效日（含）
    fn starts(&self) -> NaiveDate;

    /// 失效日（含，None 表示現行）
    fn ends(&self) -> Option<NaiveDate>;
}

impl Versioned for MaterialPlantPrice {
    fn starts(&self) -> NaiveDate {
        self.valid_from
    }

    fn ends(&self) -> Option<NaiveDate> {
        self.valid_until
    }
}

impl Versioned for PiecePrice {
    fn starts(&self) -> NaiveDate {
        self.effective_date
    }

    fn ends(&self) -> Option<NaiveDate> {
        self.expiry_date
    }
}

/// 版本接續計畫
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Supersede {
    /// 起始日重複（既有記錄索引）
    Duplicate(usize),

    /// 可寫入
    Apply {
        /// 需關閉的既有記錄（索引, 新失效日）
        close: Option<(usize, NaiveDate)>,
        /// 新記錄的失效日
        new_end: Option<NaiveDate>,
    },
}

/// 計算新增一筆起始於 `new_start` 的記錄時需要的變更
pub fn plan_supersede<T: Versioned>(existing: &[T], new_start: NaiveDate) -> Supersede {
    if let Some(idx) = existing.iter().position(|r| r.starts() == new_start) {
        return Supersede::Duplicate(idx);
    }

    let close = existing
        .iter()
        .enumerate()
        .filter(|(_, r)| r.starts() < new_start)
        .max_by_key(|(_, r)| r.starts())
        .filter(|(_, r)| r.ends().map_or(true, |end| end >= new_start))
        .map(|(idx, _)| (idx, day_before(new_start)));

    let new_end = existing
        .iter()
        .map(|r| r.starts())
        .filter(|start| *start > new_start)
        .min()
        .map(day_before);

    Supersede::Apply { close, new_end }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Row(NaiveDate, Option<NaiveDate>);

    impl Versioned for Row {
        fn starts(&self) -> NaiveDate {
            self.0
        }

        fn ends(&self) -> Option<NaiveDate> {
            self.1
        }
    }

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_first_record_is_open() {
        let plan = plan_supersede::<Row>(&[], d(2024, 1, 1));
        assert_eq!(
            plan,
            Supersede::Apply {
                close: None,
                new_end: None
            }
        );
    }

    #[test]
    fn test_closes_current_record() {
        let rows = vec![Row(d(2023, 6, 1), Some(d(2023, 12, 31))), Row(d(2024, 1, 1), None)];
        let plan = plan_supersede(&rows, d(2024, 3, 1));

        assert_eq!(
            plan,
            Supersede::Apply {
                close: Some((1, d(2024, 2, 29))),
                new_end: None
            }
        );
    }

    #[test]
    fn test_duplicate_start() {
        let rows = vec![Row(d(2024, 1, 1), None)];
        assert_eq!(plan_supersede(&rows, d(2024, 1, 1)), Supersede::Duplicate(0));
    }

    #[test]
    fn test_backdated_insert_slots_between() {
        // 2024-01-01 已於 2024-02-29 關閉，2024-03-01 為現行
        let rows = vec![Row(d(2024, 1, 1), Some(d(2024, 2, 29))), Row(d(2024, 3, 1), None)];
        let plan = plan_supersede(&rows, d(2024, 2, 1));

        assert_eq!(
            plan,
            Supersede::Apply {
                close: Some((0, d(2024, 1, 31))),
                new_end: Some(d(2024, 2, 29))
            }
        );
    }

    #[test]
    fn test_previous_already_closed_before_new_start() {
        let rows = vec![Row(d(2024, 1, 1), Some(d(2024, 1, 15)))];
        let plan = plan_supersede(&rows, d(2024, 2, 1));

        assert_eq!(
            plan,
            Supersede::Apply {
                close: None,
                new_end: None
            }
        );
    }
}
