//! Recurring-visit generation from client cadences.
//!
//! A week-of-month `w` is the 7-day block starting at day `(w-1)*7 + 1`. Within
//! the block the Monday is preferred; if the next Monday leaves the month the
//! block's first day is used instead.

use crate::domain::constants::{MAX_MONTHLY_COUNT, MAX_WEEK_OF_MONTH};
use crate::domain::models::{Client, Visit};
use crate::error::validation;
use chrono::{Datelike, Days, NaiveDate};
use std::collections::HashSet;

/// Inclusive calendar range; `start <= end` is enforced at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> anyhow::Result<Self> {
        if start > end {
            return Err(validation(format!(
                "invalid interval: {} is after {}",
                start, end
            )));
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn contains(&self, d: NaiveDate) -> bool {
        d >= self.start && d <= self.end
    }

    /// Every `(year, month)` overlapping the range, in chronological order.
    pub fn months(&self) -> Vec<(i32, u32)> {
        let mut out = Vec::new();
        let (mut y, mut m) = (self.start.year(), self.start.month());
        let (end_y, end_m) = (self.end.year(), self.end.month());
        while y < end_y || (y == end_y && m <= end_m) {
            out.push((y, m));
            m += 1;
            if m > 12 {
                m = 1;
                y += 1;
            }
        }
        out
    }
}

pub struct Generation {
    pub added: usize,
    pub visits: Vec<Visit>,
}

pub fn clamp_monthly_count(n: i64) -> u32 {
    n.clamp(0, MAX_MONTHLY_COUNT as i64) as u32
}

/// Sorted, deduplicated weeks in `1..=5`; anything else is dropped.
pub fn normalize_weeks(weeks: &[u8]) -> Vec<u8> {
    let mut out: Vec<u8> = weeks
        .iter()
        .copied()
        .filter(|w| (1..=MAX_WEEK_OF_MONTH).contains(w))
        .collect();
    out.sort_unstable();
    out.dedup();
    out
}

/// First day of week-of-month block `week`, or `None` when that day does not exist.
pub fn anchor_date(year: i32, month: u32, week: u8) -> Option<NaiveDate> {
    if week == 0 {
        return None;
    }
    let day = (u32::from(week) - 1) * 7 + 1;
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Visit date for week-of-month block `week`.
pub fn week_of_month_date(year: i32, month: u32, week: u8) -> Option<NaiveDate> {
    let anchor = anchor_date(year, month, week)?;
    let to_monday = (7 - anchor.weekday().num_days_from_monday()) % 7;
    let candidate = match anchor.checked_add_days(Days::new(u64::from(to_monday))) {
        Some(c) => c,
        None => return Some(anchor),
    };
    if candidate.month() != month {
        return Some(anchor);
    }
    if candidate.day() >= anchor.day() && candidate.day() <= anchor.day() + 6 {
        Some(candidate)
    } else {
        Some(anchor)
    }
}

/// Dates for one client in one month, after range filtering and count truncation.
pub fn client_month_dates(client: &Client, year: i32, month: u32, range: &DateRange) -> Vec<NaiveDate> {
    let want = clamp_monthly_count(i64::from(client.monthly_count)) as usize;
    normalize_weeks(&client.monthly_weeks)
        .into_iter()
        .filter_map(|w| week_of_month_date(year, month, w))
        .filter(|d| range.contains(*d))
        .take(want)
        .collect()
}

pub fn generate(clients: &[Client], existing: &[Visit], range: &DateRange) -> Generation {
    let mut seen: HashSet<(String, NaiveDate)> = existing
        .iter()
        .map(|v| (v.client_id.clone(), v.date))
        .collect();
    let months = range.months();
    let mut visits = Vec::new();

    for c in clients {
        for &(y, m) in &months {
            for date in client_month_dates(c, y, m, range) {
                if !seen.insert((c.id.clone(), date)) {
                    continue;
                }
                visits.push(Visit::skeleton(&c.id, date));
            }
        }
    }

    log::debug!(
        "generated {} visits for {} clients over {} month(s)",
        visits.len(),
        clients.len(),
        months.len()
    );
    Generation {
        added: visits.len(),
        visits,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn client(id: &str, count: u32, weeks: &[u8]) -> Client {
        let mut c = Client::new(id, "", "", "");
        c.id = id.to_string();
        c.monthly_count = count;
        c.monthly_weeks = weeks.to_vec();
        c
    }

    fn range(a: &str, b: &str) -> DateRange {
        DateRange::new(d(a), d(b)).unwrap()
    }

    #[test]
    fn reversed_range_is_rejected() {
        let err = DateRange::new(d("2025-10-31"), d("2025-10-01")).unwrap_err();
        assert_eq!(crate::error::error_code(&err), "VALIDATION");
    }

    #[test]
    fn months_cover_partial_edges_and_year_wrap() {
        let r = range("2025-11-20", "2026-02-03");
        assert_eq!(r.months(), vec![(2025, 11), (2025, 12), (2026, 1), (2026, 2)]);
        assert_eq!(range("2025-10-05", "2025-10-05").months(), vec![(2025, 10)]);
    }

    #[test]
    fn acme_gets_the_mondays_of_weeks_one_and_three() {
        // 2025-10-01 is a Wednesday.
        let acme = client("acme", 2, &[1, 3]);
        let g = generate(&[acme], &[], &range("2025-10-01", "2025-10-31"));
        let dates: Vec<_> = g.visits.iter().map(|v| v.date).collect();
        assert_eq!(g.added, 2);
        assert_eq!(dates, vec![d("2025-10-06"), d("2025-10-20")]);
        assert!(g.visits.iter().all(|v| v.agent_id.is_none()
            && v.route_id.is_none()
            && v.activity_ids.is_empty()
            && v.details.is_empty()));
    }

    #[test]
    fn anchor_on_monday_is_kept() {
        // 2025-09-29 is a Monday.
        assert_eq!(week_of_month_date(2025, 9, 5), Some(d("2025-09-29")));
    }

    #[test]
    fn week_five_missing_in_short_february() {
        assert_eq!(anchor_date(2026, 2, 5), None);
        assert_eq!(week_of_month_date(2026, 2, 5), None);
        let g = generate(&[client("c", 5, &[5])], &[], &range("2026-02-01", "2026-02-28"));
        assert_eq!(g.added, 0);
    }

    #[test]
    fn week_five_monday_past_month_end_falls_back_to_anchor() {
        // 2026-04-29 is a Wednesday; next Monday is 2026-05-04.
        assert_eq!(week_of_month_date(2026, 4, 5), Some(d("2026-04-29")));
        // 2026-03-29 is a Sunday; Monday the 30th is still in March.
        assert_eq!(week_of_month_date(2026, 3, 5), Some(d("2026-03-30")));
    }

    #[test]
    fn truncates_to_monthly_count_per_month() {
        let c = client("c", 2, &[4, 1, 2, 3]);
        let g = generate(&[c], &[], &range("2025-10-01", "2025-11-30"));
        assert_eq!(g.added, 4);
        let october: Vec<_> = g.visits.iter().filter(|v| v.date.month() == 10).collect();
        assert_eq!(october.len(), 2);
        assert_eq!(october[0].date, d("2025-10-06"));
        assert_eq!(october[1].date, d("2025-10-13"));
    }

    #[test]
    fn survivors_are_counted_after_range_filtering() {
        // Week 1 of October falls before the range start, so weeks 3 and 4 fill the cap.
        let c = client("c", 2, &[1, 3, 4]);
        let g = generate(&[c], &[], &range("2025-10-10", "2025-10-31"));
        let dates: Vec<_> = g.visits.iter().map(|v| v.date).collect();
        assert_eq!(dates, vec![d("2025-10-20"), d("2025-10-27")]);
    }

    #[test]
    fn zero_count_or_no_weeks_emit_nothing() {
        let clients = vec![client("zero", 0, &[1, 2, 3]), client("none", 4, &[])];
        let g = generate(&clients, &[], &range("2025-01-01", "2025-12-31"));
        assert_eq!(g.added, 0);
        assert!(g.visits.is_empty());
    }

    #[test]
    fn second_run_adds_nothing() {
        let clients = vec![client("a", 2, &[1, 3]), client("b", 3, &[2, 4, 5])];
        let r = range("2025-09-01", "2025-12-31");
        let first = generate(&clients, &[], &r);
        assert!(first.added > 0);
        let second = generate(&clients, &first.visits, &r);
        assert_eq!(second.added, 0);
    }

    #[test]
    fn existing_manual_visit_blocks_same_day_only() {
        let c = client("acme", 2, &[1, 3]);
        let manual = Visit::skeleton("acme", d("2025-10-06"));
        let g = generate(&[c], &[manual], &range("2025-10-01", "2025-10-31"));
        let dates: Vec<_> = g.visits.iter().map(|v| v.date).collect();
        assert_eq!(dates, vec![d("2025-10-20")]);
    }

    #[test]
    fn out_of_range_weeks_are_ignored() {
        assert_eq!(normalize_weeks(&[0, 3, 6, 1, 3]), vec![1, 3]);
    }

    #[test]
    fn count_is_clamped() {
        assert_eq!(clamp_monthly_count(-3), 0);
        assert_eq!(clamp_monthly_count(99), 50);
        assert_eq!(clamp_monthly_count(7), 7);
    }
}
