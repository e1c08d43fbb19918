//! Inclusive day-by-day date ranges.

use chrono::NaiveDate;

/// Every date from `from` to `to` inclusive, one day per step.
///
/// Ascends when `from <= to` and descends otherwise.
#[derive(Clone, Debug)]
pub struct DateRange {
    next: Option<NaiveDate>,
    last: NaiveDate,
    ascending: bool,
}

impl DateRange {
    /// The dates between `from` and `to`, both included.
    #[must_use]
    pub fn new(from: NaiveDate, to: NaiveDate) -> Self {
        Self {
            next: Some(from),
            last: to,
            ascending: from <= to,
        }
    }
}

impl Iterator for DateRange {
    type Item = NaiveDate;

    fn next(&mut self) -> Option<NaiveDate> {
        let current = self.next?;
        self.next = if current == self.last {
            None
        } else if self.ascending {
            current.succ_opt()
        } else {
            current.pred_opt()
        };
        Some(current)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2016, 2, d).unwrap()
    }

    #[test]
    fn ascending() {
        let dates: Vec<_> = DateRange::new(day(1), day(3)).collect();
        assert_eq!(dates, [day(1), day(2), day(3)]);
    }

    #[test]
    fn descending() {
        let dates: Vec<_> = DateRange::new(day(3), day(1)).collect();
        assert_eq!(dates, [day(3), day(2), day(1)]);
    }

    #[test]
    fn single_day() {
        let dates: Vec<_> = DateRange::new(day(2), day(2)).collect();
        assert_eq!(dates, [day(2)]);
    }

    #[test]
    fn crosses_month_and_leap_day() {
        let from = NaiveDate::from_ymd_opt(2016, 2, 28).unwrap();
        let to = NaiveDate::from_ymd_opt(2016, 3, 1).unwrap();
        assert_eq!(DateRange::new(from, to).count(), 3);
    }

    #[test]
    fn stops_at_the_calendar_edge() {
        assert_eq!(DateRange::new(NaiveDate::MAX, NaiveDate::MIN).take(2).count(), 2);
        let mut at_edge = DateRange::new(NaiveDate::MAX, NaiveDate::MAX);
        assert_eq!(at_edge.next(), Some(NaiveDate::MAX));
        assert_eq!(at_edge.next(), None);
    }
}
