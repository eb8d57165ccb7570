use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::core::input::{Symbol, SymbolSet};
use crate::game::timing_windows;
use crate::game::zone::ZoneId;

/// Ordered worst to best, so `grade >= JudgeGrade::Good` reads naturally.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum JudgeGrade {
    Miss,
    Bad,
    Good,
    Great,
    Perfect,
}

impl JudgeGrade {
    pub const COUNT: usize = 5;
    pub const ALL: [Self; Self::COUNT] = [
        Self::Miss,
        Self::Bad,
        Self::Good,
        Self::Great,
        Self::Perfect,
    ];

    #[inline(always)]
    pub const fn index(self) -> usize {
        self as usize
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Miss => "Miss",
            Self::Bad => "Bad",
            Self::Good => "Good",
            Self::Great => "Great",
            Self::Perfect => "Perfect",
        }
    }

    /// GOOD or better keeps the combo alive.
    #[inline(always)]
    pub fn extends_combo(self) -> bool {
        self >= Self::Good
    }

    /// Only GREAT and PERFECT receive the combo score multiplier.
    #[inline(always)]
    pub fn takes_score_multiplier(self) -> bool {
        self >= Self::Great
    }
}

impl std::fmt::Display for JudgeGrade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One value per grade, indexed by `JudgeGrade`. Every slot always exists,
/// so "no judgments of this grade" reads as the default value.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GradeTable<T>([T; JudgeGrade::COUNT]);

impl<T: Copy> GradeTable<T> {
    pub const fn new(values: [T; JudgeGrade::COUNT]) -> Self {
        Self(values)
    }

    #[inline(always)]
    pub fn get(&self, grade: JudgeGrade) -> T {
        self.0[grade.index()]
    }

    #[inline(always)]
    pub fn set(&mut self, grade: JudgeGrade, value: T) {
        self.0[grade.index()] = value;
    }

    #[inline(always)]
    pub fn slot_mut(&mut self, grade: JudgeGrade) -> &mut T {
        &mut self.0[grade.index()]
    }

    pub fn iter(&self) -> impl Iterator<Item = (JudgeGrade, T)> + '_ {
        JudgeGrade::ALL.into_iter().map(|g| (g, self.get(g)))
    }
}

/// Grades a distance from a zone center. A non-positive radius always
/// yields MISS.
pub fn grade(distance: f32, radius: f32) -> JudgeGrade {
    let Some(n) = timing_windows::normalized_distance(distance, radius) else {
        return JudgeGrade::Miss;
    };
    if n <= timing_windows::PERFECT_MAX {
        JudgeGrade::Perfect
    } else if n <= timing_windows::GREAT_MAX {
        JudgeGrade::Great
    } else if n <= timing_windows::GOOD_MAX {
        JudgeGrade::Good
    } else if n <= timing_windows::BAD_MAX {
        JudgeGrade::Bad
    } else {
        JudgeGrade::Miss
    }
}

pub type PressedSymbols = SmallVec<[Symbol; Symbol::COUNT]>;

/// The single outcome of one zone visit.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Judgment {
    pub zone_id: ZoneId,
    pub grade: JudgeGrade,
    pub pressed: PressedSymbols,
    // Player-to-center distance at resolution time.
    pub distance: f32,
    // False when the window was forced to MISS by a wrong symbol set.
    pub full_match: bool,
}

impl Judgment {
    pub fn from_window(
        zone_id: ZoneId,
        grade: JudgeGrade,
        pressed: SymbolSet,
        distance: f32,
        full_match: bool,
    ) -> Self {
        Self {
            zone_id,
            grade,
            pressed: pressed.symbols().collect(),
            distance,
            full_match,
        }
    }
}
