use log::warn;
use serde::{Deserialize, Serialize};

use crate::game::judgment::{GradeTable, JudgeGrade};

// --- Rank Definitions ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Rank {
    F,
    E,
    D,
    C,
    B,
    A,
    S,
    SS,
}

// Inclusive lower bounds, scanned from the top.
const RANK_THRESHOLDS: [(Rank, i64); 8] = [
    (Rank::SS, 250),
    (Rank::S, 200),
    (Rank::A, 170),
    (Rank::B, 140),
    (Rank::C, 110),
    (Rank::D, 80),
    (Rank::E, 50),
    (Rank::F, 0),
];

impl Rank {
    pub fn from_total(total: i64) -> Self {
        RANK_THRESHOLDS
            .iter()
            .find(|(_, min)| total >= *min)
            .map_or(Rank::F, |(rank, _)| *rank)
    }

    pub fn min_score(self) -> i64 {
        RANK_THRESHOLDS
            .iter()
            .find(|(r, _)| *r == self)
            .map_or(0, |(_, min)| *min)
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Rank::SS => "SS",
            Rank::S => "S",
            Rank::A => "A",
            Rank::B => "B",
            Rank::C => "C",
            Rank::D => "D",
            Rank::E => "E",
            Rank::F => "F",
        }
    }
}

impl std::fmt::Display for Rank {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable end-of-run aggregate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreSnapshot {
    pub counts: GradeTable<u32>,
    pub scores: GradeTable<i64>,
    pub base_score: i64,
    pub health_bonus: i64,
    pub combo_bonus: i64,
    pub total_score: i64,
    pub rank: Rank,
    pub max_combo: u32,
    pub total_symbol_events: u32,
}

impl ScoreSnapshot {
    #[inline(always)]
    pub fn count(&self, grade: JudgeGrade) -> u32 {
        self.counts.get(grade)
    }

    #[inline(always)]
    pub fn score(&self, grade: JudgeGrade) -> i64 {
        self.scores.get(grade)
    }

    pub fn judged_zones(&self) -> u32 {
        self.counts.iter().map(|(_, c)| c).sum()
    }
}

/// `round(current / max * 100)`, or 0 when `max` cannot form a ratio.
pub fn health_bonus(current_health: f32, max_health: f32) -> i64 {
    if !(max_health.is_finite() && max_health > 0.0) {
        warn!("Max health {max_health} cannot form a ratio; health bonus is 0.");
        return 0;
    }
    let ratio = f64::from(current_health) / f64::from(max_health);
    if !ratio.is_finite() {
        return 0;
    }
    (ratio * 100.0).round() as i64
}

/// Per-grade counts and accumulated scores for one run in progress.
#[derive(Debug, Clone, Default)]
pub struct ScoreAggregator {
    counts: GradeTable<u32>,
    scores: GradeTable<i64>,
}

impl ScoreAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, grade: JudgeGrade, score: i32) {
        *self.counts.slot_mut(grade) += 1;
        *self.scores.slot_mut(grade) += i64::from(score);
    }

    #[inline(always)]
    pub fn count(&self, grade: JudgeGrade) -> u32 {
        self.counts.get(grade)
    }

    #[inline(always)]
    pub fn score(&self, grade: JudgeGrade) -> i64 {
        self.scores.get(grade)
    }

    pub fn base_score(&self) -> i64 {
        self.scores.iter().map(|(_, s)| s).sum()
    }

    /// Pure over the aggregator state; calling it twice yields equal
    /// snapshots.
    pub fn snapshot(
        &self,
        current_health: f32,
        max_health: f32,
        max_combo: u32,
        total_symbol_events: u32,
    ) -> ScoreSnapshot {
        let base_score = self.base_score();
        let health_bonus = health_bonus(current_health, max_health);
        let combo_bonus = i64::from(max_combo);
        let total_score = (base_score + health_bonus + combo_bonus).max(0);
        ScoreSnapshot {
            counts: self.counts,
            scores: self.scores,
            base_score,
            health_bonus,
            combo_bonus,
            total_score,
            rank: Rank::from_total(total_score),
            max_combo,
            total_symbol_events,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Rank, ScoreAggregator, health_bonus};
    use crate::game::judgment::JudgeGrade;

    #[test]
    fn rank_bounds_are_inclusive() {
        assert_eq!(Rank::from_total(199), Rank::A);
        assert_eq!(Rank::from_total(200), Rank::S);
        assert_eq!(Rank::from_total(250), Rank::SS);
        assert_eq!(Rank::from_total(10_000), Rank::SS);
        assert_eq!(Rank::from_total(49), Rank::F);
        assert_eq!(Rank::from_total(50), Rank::E);
        assert_eq!(Rank::from_total(0), Rank::F);
        assert_eq!(Rank::from_total(-5), Rank::F);
        assert_eq!(Rank::B.min_score(), 140);
    }

    #[test]
    fn empty_run_reports_zero_for_every_grade() {
        let agg = ScoreAggregator::new();
        let snap = agg.snapshot(100.0, 100.0, 0, 0);
        for g in JudgeGrade::ALL {
            assert_eq!(snap.count(g), 0, "count for {g} should be present and zero");
            assert_eq!(snap.score(g), 0);
        }
        assert_eq!(snap.base_score, 0);
        assert_eq!(snap.health_bonus, 100);
        assert_eq!(snap.total_score, 100);
        assert_eq!(snap.rank, Rank::D);
    }

    #[test]
    fn snapshot_sums_bonuses() {
        let mut agg = ScoreAggregator::new();
        for _ in 0..20 {
            agg.record(JudgeGrade::Perfect, 6);
        }
        agg.record(JudgeGrade::Good, 1);
        agg.record(JudgeGrade::Miss, -1);
        let snap = agg.snapshot(37.4, 100.0, 20, 44);
        assert_eq!(snap.base_score, 120);
        assert_eq!(snap.health_bonus, 37);
        assert_eq!(snap.combo_bonus, 20);
        assert_eq!(snap.total_score, 177);
        assert_eq!(snap.rank, Rank::A);
        assert_eq!(snap.count(JudgeGrade::Perfect), 20);
        assert_eq!(snap.judged_zones(), 22);
        assert_eq!(snap.total_symbol_events, 44);
    }

    #[test]
    fn total_never_negative() {
        let mut agg = ScoreAggregator::new();
        for _ in 0..50 {
            agg.record(JudgeGrade::Miss, -1);
        }
        let snap = agg.snapshot(0.0, 100.0, 0, 0);
        assert_eq!(snap.base_score, -50);
        assert_eq!(snap.total_score, 0);
        assert_eq!(snap.rank, Rank::F);
    }

    #[test]
    fn snapshot_is_idempotent() {
        let mut agg = ScoreAggregator::new();
        agg.record(JudgeGrade::Great, 3);
        agg.record(JudgeGrade::Bad, 0);
        let a = agg.snapshot(55.5, 100.0, 3, 4);
        let b = agg.snapshot(55.5, 100.0, 3, 4);
        assert_eq!(a, b);
    }

    #[test]
    fn health_bonus_rounds_and_guards_zero_max() {
        assert_eq!(health_bonus(49.6, 100.0), 50);
        assert_eq!(health_bonus(49.4, 100.0), 49);
        assert_eq!(health_bonus(10.0, 0.0), 0);
        assert_eq!(health_bonus(10.0, -5.0), 0);
        assert_eq!(health_bonus(75.0, 150.0), 50);
    }
}
