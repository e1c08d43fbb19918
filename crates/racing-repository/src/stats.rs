//! Form statistics over a list of performances.

use racing_core::{Entity, Performance, fields};

/// Performances ordered newest first, with summary statistics.
///
/// Percentages are fractions in `0.0..=1.0`. Every average and ratio is
/// `0.0` for an empty list.
#[derive(Clone, Debug, Default)]
pub struct PerformanceList {
    performances: Vec<Entity<Performance>>,
}

impl PerformanceList {
    /// Wrap `performances`, sorting them by date, newest first. Undated
    /// performances go last.
    #[must_use]
    pub fn new(mut performances: Vec<Entity<Performance>>) -> Self {
        performances.sort_by(|a, b| b.get_str(fields::DATE).cmp(&a.get_str(fields::DATE)));
        Self { performances }
    }

    /// Performances, newest first.
    pub fn iter(&self) -> impl Iterator<Item = &Entity<Performance>> {
        self.performances.iter()
    }

    /// Number of performances in the list.
    pub fn len(&self) -> usize {
        self.performances.len()
    }

    /// Whether the list holds no performances.
    pub fn is_empty(&self) -> bool {
        self.performances.is_empty()
    }

    /// Number of starts.
    pub fn starts(&self) -> usize {
        self.len()
    }

    /// Starts finishing first.
    pub fn wins(&self) -> usize {
        self.finished(1)
    }

    /// Starts finishing second.
    pub fn seconds(&self) -> usize {
        self.finished(2)
    }

    /// Starts finishing third.
    pub fn thirds(&self) -> usize {
        self.finished(3)
    }

    /// Starts finishing fourth.
    pub fn fourths(&self) -> usize {
        self.finished(4)
    }

    /// Starts finishing first, second or third.
    pub fn places(&self) -> usize {
        self.results().filter(|r| (1..=3).contains(r)).count()
    }

    /// Fraction of starts won.
    pub fn win_pct(&self) -> f64 {
        self.per_start(self.wins() as f64)
    }

    /// Fraction of starts finishing second.
    pub fn second_pct(&self) -> f64 {
        self.per_start(self.seconds() as f64)
    }

    /// Fraction of starts finishing third.
    pub fn third_pct(&self) -> f64 {
        self.per_start(self.thirds() as f64)
    }

    /// Fraction of starts finishing fourth.
    pub fn fourth_pct(&self) -> f64 {
        self.per_start(self.fourths() as f64)
    }

    /// Fraction of starts placed.
    pub fn place_pct(&self) -> f64 {
        self.per_start(self.places() as f64)
    }

    /// Sum of `runner_prize_money`. Missing amounts count as zero.
    pub fn total_prize_money(&self) -> f64 {
        self.iter()
            .filter_map(|p| p.get_f64(fields::RUNNER_PRIZE_MONEY))
            .sum()
    }

    /// Prize money per start.
    pub fn average_prize_money(&self) -> f64 {
        self.per_start(self.total_prize_money())
    }

    /// Mean starting price over the starts that have one.
    pub fn average_starting_price(&self) -> f64 {
        let prices: Vec<f64> = self
            .iter()
            .filter_map(|p| p.get_f64(fields::STARTING_PRICE))
            .collect();
        if prices.is_empty() {
            return 0.0;
        }
        prices.iter().sum::<f64>() / prices.len() as f64
    }

    /// Return on a one-unit stake at starting price on every start.
    pub fn roi(&self) -> f64 {
        let returns: f64 = self
            .iter()
            .filter(|p| p.get_i64(fields::RESULT) == Some(1))
            .filter_map(|p| p.get_f64(fields::STARTING_PRICE))
            .sum();
        self.per_start(returns - self.starts() as f64)
    }

    fn results(&self) -> impl Iterator<Item = i64> + '_ {
        self.iter().filter_map(|p| p.get_i64(fields::RESULT))
    }

    fn finished(&self, position: i64) -> usize {
        self.results().filter(|r| *r == position).count()
    }

    fn per_start(&self, value: f64) -> f64 {
        match self.starts() {
            0 => 0.0,
            starts => value / starts as f64,
        }
    }
}

impl<'a> IntoIterator for &'a PerformanceList {
    type Item = &'a Entity<Performance>;
    type IntoIter = std::slice::Iter<'a, Entity<Performance>>;

    fn into_iter(self) -> Self::IntoIter {
        self.performances.iter()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
