use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use thiserror::Error;

use crate::project::Card;

/// A points-accounting policy over a fixed set of cards. `points_as_of` is a
/// pure function of the cards and the date; callers may invoke it repeatedly
/// with dates in any order.
pub trait PointsCalculator {
    fn points_as_of(&self, date: DateTime<Utc>) -> f64;
}

fn closed_points(cards: &[Card], date: DateTime<Utc>) -> f64 {
    cards
        .iter()
        .filter(|card| card.closed.map_or(false, |t| t <= date))
        .map(|card| card.points)
        .sum()
}

fn created_points(cards: &[Card], date: DateTime<Utc>) -> f64 {
    cards
        .iter()
        .filter(|card| card.created.map_or(false, |t| t <= date))
        .map(|card| card.points)
        .sum()
}

pub struct ClosedPointsCalculator {
    cards: Vec<Card>,
}

impl ClosedPointsCalculator {
    pub fn new(cards: Vec<Card>) -> Self {
        ClosedPointsCalculator { cards }
    }
}

impl PointsCalculator for ClosedPointsCalculator {
    fn points_as_of(&self, date: DateTime<Utc>) -> f64 {
        closed_points(&self.cards, date)
    }
}

pub struct AssignedPointsCalculator {
    cards: Vec<Card>,
}

impl AssignedPointsCalculator {
    pub fn new(cards: Vec<Card>) -> Self {
        AssignedPointsCalculator { cards }
    }
}

impl PointsCalculator for AssignedPointsCalculator {
    fn points_as_of(&self, date: DateTime<Utc>) -> f64 {
        self.cards
            .iter()
            .filter(|card| card.assigned.map_or(false, |t| t <= date))
            .map(|card| card.points)
            .sum()
    }
}

pub struct CreatedPointsCalculator {
    cards: Vec<Card>,
}

impl CreatedPointsCalculator {
    pub fn new(cards: Vec<Card>) -> Self {
        CreatedPointsCalculator { cards }
    }
}

impl PointsCalculator for CreatedPointsCalculator {
    fn points_as_of(&self, date: DateTime<Utc>) -> f64 {
        created_points(&self.cards, date)
    }
}

/// Weighted accounting: full points for closed cards, half points for cards
/// assigned but not yet closed. Shows work-in-progress value.
pub struct TaigaPointsCalculator {
    cards: Vec<Card>,
}

impl TaigaPointsCalculator {
    pub fn new(cards: Vec<Card>) -> Self {
        TaigaPointsCalculator { cards }
    }
}

impl PointsCalculator for TaigaPointsCalculator {
    fn points_as_of(&self, date: DateTime<Utc>) -> f64 {
        let closed = closed_points(&self.cards, date);
        // A card closed by this date must not also count at half weight.
        let in_progress: f64 = self
            .cards
            .iter()
            .filter(|card| {
                card.assigned.map_or(false, |t| t <= date)
                    && !card.closed.map_or(false, |t| t <= date)
            })
            .map(|card| card.points / 2.0)
            .sum();
        closed + in_progress
    }
}

/// True remaining work: (scope created as of date) - (points closed as of
/// date).
pub struct BurndownCalculator {
    cards: Vec<Card>,
}

impl BurndownCalculator {
    pub fn new(cards: Vec<Card>) -> Self {
        BurndownCalculator { cards }
    }

    /// Average points closed per day over the trailing `window_days` ending
    /// now. Zero cards or a non-positive window yield 0.
    pub fn velocity(&self, window_days: i64) -> f64 {
        if self.cards.is_empty() || window_days <= 0 {
            return 0.0;
        }
        let now = Utc::now();
        let window_start = now - Duration::days(window_days);

        let points_at_start = closed_points(&self.cards, window_start);
        let points_now = closed_points(&self.cards, now);

        (points_now - points_at_start) / window_days as f64
    }

    /// Projected completion date from the 14-day trailing velocity. `None`
    /// when nothing is closing (infinite horizon).
    pub fn estimate_completion(&self) -> Option<DateTime<Utc>> {
        if self.cards.is_empty() {
            return None;
        }
        let now = Utc::now();
        let remaining = self.points_as_of(now);
        let velocity = self.velocity(14);

        if velocity <= 0.0 {
            return None;
        }
        let days_to_complete = remaining / velocity;
        Some(now + Duration::seconds((days_to_complete * 86_400.0) as i64))
    }
}

impl PointsCalculator for BurndownCalculator {
    fn points_as_of(&self, date: DateTime<Utc>) -> f64 {
        created_points(&self.cards, date) - closed_points(&self.cards, date)
    }
}

#[derive(Debug, Error)]
#[error("unknown calculator policy '{0}'")]
pub struct UnknownPolicy(pub String);

/// The closed set of points-accounting policies selectable from
/// configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Policy {
    Closed,
    Assigned,
    Created,
    Taiga,
    Burndown,
}

impl Policy {
    pub fn label(&self) -> &'static str {
        match self {
            Policy::Closed => "Closed",
            Policy::Assigned => "Assigned",
            Policy::Created => "Created",
            Policy::Taiga => "Taiga",
            Policy::Burndown => "Burndown",
        }
    }

    pub fn calculator(&self, cards: Vec<Card>) -> Box<dyn PointsCalculator> {
        match self {
            Policy::Closed => Box::new(ClosedPointsCalculator::new(cards)),
            Policy::Assigned => Box::new(AssignedPointsCalculator::new(cards)),
            Policy::Created => Box::new(CreatedPointsCalculator::new(cards)),
            Policy::Taiga => Box::new(TaigaPointsCalculator::new(cards)),
            Policy::Burndown => Box::new(BurndownCalculator::new(cards)),
        }
    }
}

impl FromStr for Policy {
    type Err = UnknownPolicy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "closed" => Ok(Policy::Closed),
            "assigned" => Ok(Policy::Assigned),
            "created" => Ok(Policy::Created),
            "taiga" => Ok(Policy::Taiga),
            "burndown" => Ok(Policy::Burndown),
            other => Err(UnknownPolicy(other.to_owned())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn day(d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, d, 0, 0, 0).unwrap()
    }

    fn card(
        created: Option<DateTime<Utc>>,
        assigned: Option<DateTime<Utc>>,
        closed: Option<DateTime<Utc>>,
        points: f64,
    ) -> Card {
        Card {
            created,
            assigned,
            closed,
            points,
        }
    }

    // Items = [{created: day1, closed: day6, points: 3},
    //          {created: day1, assigned: day2, points: 2}]
    fn sample_cards() -> Vec<Card> {
        vec![
            card(Some(day(1)), None, Some(day(6)), 3.0),
            card(Some(day(1)), Some(day(2)), None, 2.0),
        ]
    }

    #[test]
    fn burndown_is_scope_minus_completed() {
        let calc = BurndownCalculator::new(sample_cards());
        assert_eq!(calc.points_as_of(day(4)), 5.0);
        assert_eq!(calc.points_as_of(day(7)), 2.0);
    }

    #[test]
    fn closed_counts_only_closed_cards() {
        let calc = ClosedPointsCalculator::new(sample_cards());
        assert_eq!(calc.points_as_of(day(4)), 0.0);
        assert_eq!(calc.points_as_of(day(7)), 3.0);
    }

    #[test]
    fn assigned_counts_only_assigned_cards() {
        let calc = AssignedPointsCalculator::new(sample_cards());
        assert_eq!(calc.points_as_of(day(1)), 0.0);
        assert_eq!(calc.points_as_of(day(3)), 2.0);
    }

    #[test]
    fn created_accumulates_scope() {
        let calc = CreatedPointsCalculator::new(sample_cards());
        assert_eq!(calc.points_as_of(day(1)), 5.0);
    }

    #[test]
    fn taiga_weighs_in_progress_at_half() {
        let calc = TaigaPointsCalculator::new(sample_cards());
        // 3 closed + 2/2 assigned-but-open
        assert_eq!(calc.points_as_of(day(7)), 4.0);
    }

    #[test]
    fn taiga_never_double_counts_closed_cards() {
        // One card that was both assigned and closed before the date.
        let cards = vec![card(Some(day(1)), Some(day(2)), Some(day(3)), 4.0)];
        let calc = TaigaPointsCalculator::new(cards);
        assert_eq!(calc.points_as_of(day(5)), 4.0);
    }

    #[test]
    fn missing_timestamps_contribute_nothing() {
        let cards = vec![card(None, None, None, 8.0)];
        assert_eq!(
            ClosedPointsCalculator::new(cards.clone()).points_as_of(day(9)),
            0.0
        );
        assert_eq!(
            AssignedPointsCalculator::new(cards.clone()).points_as_of(day(9)),
            0.0
        );
        assert_eq!(
            CreatedPointsCalculator::new(cards.clone()).points_as_of(day(9)),
            0.0
        );
        assert_eq!(TaigaPointsCalculator::new(cards.clone()).points_as_of(day(9)), 0.0);
        assert_eq!(BurndownCalculator::new(cards).points_as_of(day(9)), 0.0);
    }

    #[test]
    fn burndown_is_non_increasing_once_scope_is_fixed() {
        let cards = vec![
            card(Some(day(1)), None, Some(day(3)), 3.0),
            card(Some(day(1)), None, Some(day(8)), 2.0),
            card(Some(day(1)), None, None, 4.0),
        ];
        let calc = BurndownCalculator::new(cards);
        let mut previous = calc.points_as_of(day(1));
        for d in 2..=12 {
            let current = calc.points_as_of(day(d));
            assert!(current <= previous, "rose from {} to {}", previous, current);
            previous = current;
        }
    }

    #[test]
    fn velocity_with_no_cards_is_zero() {
        let calc = BurndownCalculator::new(vec![]);
        assert_eq!(calc.velocity(7), 0.0);
    }

    #[test]
    fn velocity_counts_recent_closures() {
        let now = Utc::now();
        let cards = vec![card(
            Some(now - Duration::days(10)),
            None,
            Some(now - Duration::days(2)),
            7.0,
        )];
        let calc = BurndownCalculator::new(cards);
        assert!((calc.velocity(7) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn completion_is_none_without_velocity() {
        // Open card, nothing ever closed.
        let cards = vec![card(Some(day(1)), None, None, 5.0)];
        let calc = BurndownCalculator::new(cards);
        assert!(calc.estimate_completion().is_none());

        let empty = BurndownCalculator::new(vec![]);
        assert!(empty.estimate_completion().is_none());
    }

    #[test]
    fn completion_extrapolates_remaining_over_velocity() {
        let now = Utc::now();
        // 7 points closed over the last week, 7 still open: about a week out.
        let cards = vec![
            card(
                Some(now - Duration::days(20)),
                None,
                Some(now - Duration::days(3)),
                14.0,
            ),
            card(Some(now - Duration::days(20)), None, None, 14.0),
        ];
        let calc = BurndownCalculator::new(cards);
        let eta = calc.estimate_completion().unwrap();
        assert!(eta > now);
        assert!(eta < now + Duration::days(30));
    }

    #[test]
    fn policy_parses_known_names() {
        assert_eq!("burndown".parse::<Policy>().unwrap(), Policy::Burndown);
        assert_eq!("taiga".parse::<Policy>().unwrap(), Policy::Taiga);
        assert_eq!(Policy::Closed.label(), "Closed");
    }

    #[test]
    fn policy_rejects_unknown_names() {
        let err = "velocity".parse::<Policy>().unwrap_err();
        assert_eq!(err.0, "velocity");
    }
}
