use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};

use crate::calculators::{BurndownCalculator, PointsCalculator};
use crate::dates::{date_range, end_of_day, today_utc};
use crate::project::Project;

/// Series computation over one project for a fixed sprint window.
pub struct ProjectStats {
    pub project: Project,
    start_date: DateTime<Utc>,
    end_date: DateTime<Utc>,
}

impl ProjectStats {
    pub fn new(project: Project, start_date: DateTime<Utc>, end_date: DateTime<Utc>) -> Self {
        ProjectStats {
            project,
            start_date,
            end_date,
        }
    }

    pub fn total_points(&self) -> f64 {
        self.project.total_points()
    }

    /// Maps each day of the sprint to the calculator's cumulative value at
    /// that day's 23:59:59.
    pub fn points_by_date(
        &self,
        calculator: &dyn PointsCalculator,
    ) -> BTreeMap<DateTime<Utc>, f64> {
        let mut points = BTreeMap::new();
        for date in date_range(self.start_date, self.end_date) {
            points.insert(date, calculator.points_as_of(end_of_day(date)));
        }
        points
    }

    /// The actual burndown (remaining = scope - completed). Future dates map
    /// to `None` so the chart stops at today.
    pub fn remaining_points_by_date(&self) -> BTreeMap<DateTime<Utc>, Option<f64>> {
        let burndown_calc = BurndownCalculator::new(self.project.cards());

        // Buffer past midnight so today's own entry stays plotted.
        let cutoff = today_utc() + Duration::hours(23) + Duration::minutes(59);

        let mut remaining = BTreeMap::new();
        for date in date_range(self.start_date, self.end_date) {
            if date <= cutoff {
                remaining.insert(date, Some(burndown_calc.points_as_of(end_of_day(date))));
            } else {
                remaining.insert(date, None);
            }
        }
        remaining
    }

    /// The straight line from the starting scope down to zero on the final
    /// day. A single-day sprint is already at day zero.
    pub fn ideal_burndown(&self) -> BTreeMap<DateTime<Utc>, f64> {
        let start_points =
            BurndownCalculator::new(self.project.cards()).points_as_of(self.start_date);
        let sprint_dates = date_range(self.start_date, self.end_date);
        let total_days = sprint_dates.len().saturating_sub(1);

        let mut ideal = BTreeMap::new();
        for (i, date) in sprint_dates.into_iter().enumerate() {
            let value = if total_days == 0 {
                start_points
            } else {
                (start_points - start_points * (i as f64 / total_days as f64)).max(0.0)
            };
            ideal.insert(date, value);
        }
        ideal
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::project::{Card, Column};
    use chrono::TimeZone;

    fn day(d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, d, 0, 0, 0).unwrap()
    }

    fn project_with(cards: Vec<Card>) -> Project {
        Project {
            name: "Test".to_owned(),
            columns: vec![Column { name: None, cards }],
        }
    }

    fn card(
        created: Option<DateTime<Utc>>,
        closed: Option<DateTime<Utc>>,
        points: f64,
    ) -> Card {
        Card {
            created,
            assigned: None,
            closed,
            points,
        }
    }

    #[test]
    fn points_by_date_covers_every_sprint_day() {
        let cards = vec![
            card(Some(day(1)), Some(day(3)), 3.0),
            card(Some(day(1)), None, 2.0),
        ];
        let stats = ProjectStats::new(project_with(cards.clone()), day(1), day(7));
        let calc = BurndownCalculator::new(cards);
        let series = stats.points_by_date(&calc);

        assert_eq!(series.len(), 7);
        assert_eq!(series[&day(1)], 5.0);
        assert_eq!(series[&day(2)], 5.0);
        assert_eq!(series[&day(3)], 2.0);
        assert_eq!(series[&day(7)], 2.0);
    }

    #[test]
    fn points_by_date_includes_same_day_closures() {
        // Closed mid-afternoon; the day's entry is computed at 23:59:59 so
        // it must already reflect the closure.
        let closed_at = Utc.with_ymd_and_hms(2026, 3, 2, 15, 30, 0).unwrap();
        let cards = vec![card(Some(day(1)), Some(closed_at), 4.0)];
        let stats = ProjectStats::new(project_with(cards.clone()), day(1), day(3));
        let calc = BurndownCalculator::new(cards);
        let series = stats.points_by_date(&calc);
        assert_eq!(series[&day(2)], 0.0);
    }

    #[test]
    fn remaining_points_are_none_after_today() {
        let start = today_utc() - Duration::days(3);
        let end = today_utc() + Duration::days(3);
        let cards = vec![card(Some(start), None, 5.0)];
        let stats = ProjectStats::new(project_with(cards), start, end);

        let series = stats.remaining_points_by_date();
        assert_eq!(series.len(), 7);
        for (date, value) in &series {
            if *date <= today_utc() {
                assert_eq!(*value, Some(5.0));
            } else {
                assert!(value.is_none(), "expected None for {}", date);
            }
        }
    }

    #[test]
    fn ideal_line_runs_from_scope_to_zero() {
        let cards = vec![card(Some(day(1)), None, 10.0)];
        let stats = ProjectStats::new(project_with(cards), day(1), day(6));
        let ideal = stats.ideal_burndown();

        assert_eq!(ideal.len(), 6);
        assert_eq!(ideal[&day(1)], 10.0);
        assert_eq!(ideal[&day(6)], 0.0);

        let values: Vec<f64> = ideal.values().copied().collect();
        for pair in values.windows(2) {
            assert!(pair[1] <= pair[0]);
        }
    }

    #[test]
    fn single_day_ideal_keeps_start_points() {
        let cards = vec![card(Some(day(1)), None, 8.0)];
        let stats = ProjectStats::new(project_with(cards), day(1), day(1));
        let ideal = stats.ideal_burndown();
        assert_eq!(ideal.len(), 1);
        assert_eq!(ideal[&day(1)], 8.0);
    }

    #[test]
    fn ideal_line_never_goes_negative() {
        let cards = vec![card(Some(day(1)), None, 1.0)];
        let stats = ProjectStats::new(project_with(cards), day(1), day(9));
        for value in stats.ideal_burndown().values() {
            assert!(*value >= 0.0);
        }
    }
}
