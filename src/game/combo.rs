use log::warn;
use serde::{Deserialize, Serialize};

use crate::game::judgment::JudgeGrade;

/// Inclusive combo range mapped to a percentage bonus.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComboBand {
    pub min: u32,
    pub max: u32,
    pub rate: u32,
}

impl ComboBand {
    pub const fn new(min: u32, max: u32, rate: u32) -> Self {
        Self { min, max, rate }
    }

    #[inline(always)]
    pub const fn contains(&self, combo: u32) -> bool {
        combo >= self.min && combo <= self.max
    }

    /// Parses an INI-style `min-max` key with a percentage value.
    pub fn parse(range: &str, rate: &str) -> Option<Self> {
        let (lo, hi) = range.trim().split_once('-')?;
        let min = lo.trim().parse::<u32>().ok()?;
        let max = hi.trim().parse::<u32>().ok()?;
        let rate = rate.trim().trim_end_matches('%').trim().parse::<u32>().ok()?;
        (min <= max).then_some(Self { min, max, rate })
    }
}

/// Ordered band table. Lookup scans in order and the first containing band
/// wins; a combo outside every band gets 0%.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ComboTable {
    bands: Vec<ComboBand>,
}

const DEFAULT_SCORE_BANDS: [ComboBand; 6] = [
    ComboBand::new(1, 9, 0),
    ComboBand::new(10, 19, 20),
    ComboBand::new(20, 49, 40),
    ComboBand::new(50, 99, 60),
    ComboBand::new(100, 199, 80),
    ComboBand::new(200, 299, 100),
];

const DEFAULT_SPEED_BANDS: [ComboBand; 6] = [
    ComboBand::new(1, 9, 0),
    ComboBand::new(10, 19, 50),
    ComboBand::new(20, 49, 60),
    ComboBand::new(50, 99, 70),
    ComboBand::new(100, 199, 80),
    ComboBand::new(200, 299, 100),
];

impl ComboTable {
    pub fn new(bands: Vec<ComboBand>) -> Self {
        for (i, band) in bands.iter().enumerate() {
            if let Some(prev) = bands[..i]
                .iter()
                .find(|b| b.min <= band.max && band.min <= b.max)
            {
                warn!(
                    "Combo band {}-{} overlaps {}-{}; the earlier band wins.",
                    band.min, band.max, prev.min, prev.max
                );
            }
        }
        Self { bands }
    }

    pub fn default_score() -> Self {
        Self::new(DEFAULT_SCORE_BANDS.to_vec())
    }

    pub fn default_speed() -> Self {
        Self::new(DEFAULT_SPEED_BANDS.to_vec())
    }

    #[inline(always)]
    pub fn bands(&self) -> &[ComboBand] {
        &self.bands
    }

    #[inline(always)]
    pub fn rate_for(&self, combo: u32) -> u32 {
        self.bands
            .iter()
            .find(|b| b.contains(combo))
            .map_or(0, |b| b.rate)
    }
}

/// `floor(base + base * rate / 100)`.
#[inline(always)]
pub fn apply_score_rate(base: i32, rate: u32) -> i32 {
    let base = f64::from(base);
    (base + base * f64::from(rate) / 100.0).floor() as i32
}

/// `base + base * rate / 100`, unrounded.
#[inline(always)]
pub fn apply_speed_rate(base: f32, rate: u32) -> f32 {
    base + base * rate as f32 / 100.0
}

/// Consecutive GOOD-or-better streak plus its high-water mark.
#[derive(Clone, Debug)]
pub struct ComboEngine {
    combo: u32,
    max_combo: u32,
    score_table: ComboTable,
    speed_table: ComboTable,
}

impl Default for ComboEngine {
    fn default() -> Self {
        Self::new(ComboTable::default_score(), ComboTable::default_speed())
    }
}

impl ComboEngine {
    pub fn new(score_table: ComboTable, speed_table: ComboTable) -> Self {
        Self {
            combo: 0,
            max_combo: 0,
            score_table,
            speed_table,
        }
    }

    #[inline(always)]
    pub const fn combo(&self) -> u32 {
        self.combo
    }

    /// Updated only when a streak breaks or is frozen at run end.
    #[inline(always)]
    pub const fn max_combo(&self) -> u32 {
        self.max_combo
    }

    /// Applies one judgment and returns the new combo value.
    pub fn on_judgment(&mut self, grade: JudgeGrade) -> u32 {
        if grade.extends_combo() {
            self.combo = self.combo.saturating_add(1);
        } else {
            self.max_combo = self.max_combo.max(self.combo);
            self.combo = 0;
        }
        self.combo
    }

    /// Flushes the running streak into the high-water mark.
    pub fn freeze(&mut self) {
        self.max_combo = self.max_combo.max(self.combo);
    }

    #[inline(always)]
    pub fn score_multiplier(&self, combo: u32) -> u32 {
        self.score_table.rate_for(combo)
    }

    #[inline(always)]
    pub fn speed_multiplier(&self, combo: u32) -> u32 {
        self.speed_table.rate_for(combo)
    }

    /// Final score for a grade at the current combo. Only GREAT and PERFECT
    /// are scaled; every other grade scores its table base.
    pub fn score_for(&self, grade: JudgeGrade, base: i32) -> i32 {
        if grade.takes_score_multiplier() {
            apply_score_rate(base, self.score_multiplier(self.combo))
        } else {
            base
        }
    }

    pub fn speed_for(&self, base_speed: f32) -> f32 {
        apply_speed_rate(base_speed, self.speed_multiplier(self.combo))
    }
}
