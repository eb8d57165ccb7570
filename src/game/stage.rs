use ini::Ini;
use log::{info, warn};
use std::path::Path;

use crate::game::combo::{ComboBand, ComboTable};
use crate::game::judgment::{GradeTable, JudgeGrade};
use crate::game::life::DEFAULT_MAX_HEALTH;

const SECTION_STAGE: &str = "Stage";
const SECTION_HEALTH_DELTA: &str = "HealthDelta";
const SECTION_GRADE_SCORE: &str = "GradeScore";
const SECTION_SCORE_COMBO: &str = "ScoreCombo";
const SECTION_SPEED_COMBO: &str = "SpeedCombo";

// Indexed Miss, Bad, Good, Great, Perfect.
const DEFAULT_HEALTH_DELTAS: [f32; JudgeGrade::COUNT] = [-10.0, -5.0, 0.0, 1.0, 2.0];
const DEFAULT_GRADE_SCORES: [i32; JudgeGrade::COUNT] = [-1, 0, 1, 3, 5];

/// Read-only tuning for one run.
#[derive(Clone, Debug, PartialEq)]
pub struct StageConfig {
    pub speed_multiplier: f32,
    /// Path units per second before any multiplier.
    pub base_speed: f32,
    pub max_health: f32,
    pub start_health: f32,
    pub decay_per_second: f32,
    /// Host-side cooldown per symbol used in a judgment.
    pub symbol_cooldown_s: f32,
    pub health_deltas: GradeTable<f32>,
    pub grade_scores: GradeTable<i32>,
    pub score_combo: ComboTable,
    pub speed_combo: ComboTable,
}

impl Default for StageConfig {
    fn default() -> Self {
        Self {
            speed_multiplier: 1.0,
            base_speed: 5.0,
            max_health: DEFAULT_MAX_HEALTH,
            start_health: DEFAULT_MAX_HEALTH,
            decay_per_second: 1.0,
            symbol_cooldown_s: 0.25,
            health_deltas: GradeTable::new(DEFAULT_HEALTH_DELTAS),
            grade_scores: GradeTable::new(DEFAULT_GRADE_SCORES),
            score_combo: ComboTable::default_score(),
            speed_combo: ComboTable::default_speed(),
        }
    }
}

impl StageConfig {
    #[inline(always)]
    pub fn health_delta(&self, grade: JudgeGrade) -> f32 {
        self.health_deltas.get(grade)
    }

    #[inline(always)]
    pub fn grade_score(&self, grade: JudgeGrade) -> i32 {
        self.grade_scores.get(grade)
    }

    /// Movement speed with the stage multiplier, before combo bonuses.
    #[inline(always)]
    pub fn stage_speed(&self) -> f32 {
        self.base_speed * self.speed_multiplier
    }

    /// Builds a stage from INI sections, keeping defaults for anything
    /// missing or invalid.
    pub fn from_ini(conf: &Ini) -> Self {
        let default = Self::default();

        // A non-positive max is kept as written: play falls back to the
        // default max, and the health bonus comes out as 0.
        let max_health = finite_f32(conf, "MaxHealth", default.max_health);
        if max_health <= 0.0 {
            warn!("[{SECTION_STAGE}] MaxHealth={max_health} is not positive; health bonus will be 0.");
        }
        let playable_max = if max_health > 0.0 {
            max_health
        } else {
            DEFAULT_MAX_HEALTH
        };
        let start_health = positive_f32(conf, "StartHealth", playable_max).min(playable_max);

        let mut health_deltas = default.health_deltas;
        let mut grade_scores = default.grade_scores;
        for grade in JudgeGrade::ALL {
            if let Some(raw) = conf.get_from(Some(SECTION_HEALTH_DELTA), grade.as_str()) {
                match raw.trim().parse::<f32>() {
                    Ok(v) if v.is_finite() => health_deltas.set(grade, v),
                    _ => warn!("[{SECTION_HEALTH_DELTA}] {grade}='{raw}' is not a number; keeping default."),
                }
            }
            if let Some(raw) = conf.get_from(Some(SECTION_GRADE_SCORE), grade.as_str()) {
                match raw.trim().parse::<i32>() {
                    Ok(v) => grade_scores.set(grade, v),
                    Err(_) => warn!("[{SECTION_GRADE_SCORE}] {grade}='{raw}' is not an integer; keeping default."),
                }
            }
        }

        Self {
            speed_multiplier: positive_f32(conf, "SpeedMultiplier", default.speed_multiplier),
            base_speed: positive_f32(conf, "BaseSpeed", default.base_speed),
            max_health,
            start_health,
            decay_per_second: non_negative_f32(conf, "DecayPerSecond", default.decay_per_second),
            symbol_cooldown_s: non_negative_f32(
                conf,
                "SymbolCooldownSeconds",
                default.symbol_cooldown_s,
            ),
            health_deltas,
            grade_scores,
            score_combo: combo_table(conf, SECTION_SCORE_COMBO).unwrap_or(default.score_combo),
            speed_combo: combo_table(conf, SECTION_SPEED_COMBO).unwrap_or(default.speed_combo),
        }
    }

    pub fn to_ini_string(&self) -> String {
        let mut content = String::new();
        content.push_str(&format!("[{SECTION_STAGE}]\n"));
        content.push_str(&format!("BaseSpeed={}\n", self.base_speed));
        content.push_str(&format!("DecayPerSecond={}\n", self.decay_per_second));
        content.push_str(&format!("MaxHealth={}\n", self.max_health));
        content.push_str(&format!("SpeedMultiplier={}\n", self.speed_multiplier));
        content.push_str(&format!("StartHealth={}\n", self.start_health));
        content.push_str(&format!("SymbolCooldownSeconds={}\n", self.symbol_cooldown_s));
        content.push('\n');

        content.push_str(&format!("[{SECTION_HEALTH_DELTA}]\n"));
        for (grade, v) in self.health_deltas.iter() {
            content.push_str(&format!("{grade}={v}\n"));
        }
        content.push('\n');

        content.push_str(&format!("[{SECTION_GRADE_SCORE}]\n"));
        for (grade, v) in self.grade_scores.iter() {
            content.push_str(&format!("{grade}={v}\n"));
        }

        for (section, table) in [
            (SECTION_SCORE_COMBO, &self.score_combo),
            (SECTION_SPEED_COMBO, &self.speed_combo),
        ] {
            content.push('\n');
            content.push_str(&format!("[{section}]\n"));
            for band in table.bands() {
                content.push_str(&format!("{}-{}={}\n", band.min, band.max, band.rate));
            }
        }
        content
    }
}

fn stage_value<'a>(conf: &'a Ini, key: &str) -> Option<&'a str> {
    conf.get_from(Some(SECTION_STAGE), key)
}

fn finite_f32(conf: &Ini, key: &str, default: f32) -> f32 {
    let Some(raw) = stage_value(conf, key) else {
        return default;
    };
    match raw.trim().parse::<f32>() {
        Ok(v) if v.is_finite() => v,
        _ => {
            warn!("[{SECTION_STAGE}] {key}='{raw}' is not a number; using {default}.");
            default
        }
    }
}

fn positive_f32(conf: &Ini, key: &str, default: f32) -> f32 {
    let Some(raw) = stage_value(conf, key) else {
        return default;
    };
    match raw.trim().parse::<f32>() {
        Ok(v) if v.is_finite() && v > 0.0 => v,
        _ => {
            warn!("[{SECTION_STAGE}] {key}='{raw}' must be a positive number; using {default}.");
            default
        }
    }
}

fn non_negative_f32(conf: &Ini, key: &str, default: f32) -> f32 {
    let Some(raw) = stage_value(conf, key) else {
        return default;
    };
    match raw.trim().parse::<f32>() {
        Ok(v) if v.is_finite() && v >= 0.0 => v,
        _ => {
            warn!("[{SECTION_STAGE}] {key}='{raw}' must be zero or positive; using {default}.");
            default
        }
    }
}

/// Bands in file order. `None` when the section is absent or has no valid
/// entries.
fn combo_table(conf: &Ini, section: &str) -> Option<ComboTable> {
    let props = conf.section(Some(section))?;
    let mut bands = Vec::new();
    for (range, rate) in props.iter() {
        match ComboBand::parse(range, rate) {
            Some(band) => bands.push(band),
            None => warn!("[{section}] ignoring malformed band '{range}={rate}'."),
        }
    }
    if bands.is_empty() {
        warn!("[{section}] has no valid bands; keeping defaults.");
        return None;
    }
    Some(ComboTable::new(bands))
}

pub fn write_default_stage_file<P: AsRef<Path>>(path: P) -> Result<(), std::io::Error> {
    let path = path.as_ref();
    info!("'{}' not found, creating with default stage values.", path.display());
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, StageConfig::default().to_ini_string())
}

/// Loads a stage file. A missing file is created with defaults first.
pub fn load_stage<P: AsRef<Path>>(path: P) -> Result<StageConfig, Box<dyn std::error::Error>> {
    let path = path.as_ref();
    if !path.exists()
        && let Err(e) = write_default_stage_file(path)
    {
        warn!("Failed to create default stage file: {e}");
        return Ok(StageConfig::default());
    }
    let conf = Ini::load_from_file(path)?;
    let stage = StageConfig::from_ini(&conf);
    info!("Stage configuration loaded from '{}'.", path.display());
    Ok(stage)
}

#[cfg(test)]
mod tests {
    use super::{StageConfig, load_stage};
    use crate::game::combo::ComboBand;
    use crate::game::judgment::JudgeGrade;
    use ini::Ini;

    #[test]
    fn defaults_cover_every_grade() {
        let s = StageConfig::default();
        assert_eq!(s.grade_score(JudgeGrade::Perfect), 5);
        assert_eq!(s.grade_score(JudgeGrade::Miss), -1);
        assert_eq!(s.health_delta(JudgeGrade::Miss), -10.0);
        assert_eq!(s.health_delta(JudgeGrade::Good), 0.0);
        assert!((s.stage_speed() - 5.0).abs() <= 1e-6);
    }

    #[test]
    fn parses_sections_and_keeps_defaults_for_gaps() {
        let conf = Ini::load_from_str(
            "[Stage]\n\
             MaxHealth=80\n\
             SpeedMultiplier=1.5\n\
             DecayPerSecond=abc\n\
             [HealthDelta]\n\
             Miss=-20\n\
             Perfect=3.5\n\
             [GradeScore]\n\
             Great=4\n\
             [ScoreCombo]\n\
             10-19=20\n\
             bogus=1\n\
             20-29=25\n",
        )
        .expect("test ini should parse");
        let s = StageConfig::from_ini(&conf);
        assert_eq!(s.max_health, 80.0);
        assert_eq!(s.start_health, 80.0, "start health follows max when unset");
        assert!((s.stage_speed() - 7.5).abs() <= 1e-6);
        assert_eq!(s.decay_per_second, StageConfig::default().decay_per_second);
        assert_eq!(s.health_delta(JudgeGrade::Miss), -20.0);
        assert_eq!(s.health_delta(JudgeGrade::Perfect), 3.5);
        assert_eq!(s.health_delta(JudgeGrade::Bad), -5.0);
        assert_eq!(s.grade_score(JudgeGrade::Great), 4);
        assert_eq!(
            s.score_combo.bands(),
            &[ComboBand::new(10, 19, 20), ComboBand::new(20, 29, 25)]
        );
        assert_eq!(s.speed_combo, StageConfig::default().speed_combo);
    }

    #[test]
    fn non_positive_max_health_is_kept_for_scoring() {
        let conf = Ini::load_from_str("[Stage]\nMaxHealth=0\nStartHealth=500\n").unwrap();
        let s = StageConfig::from_ini(&conf);
        assert_eq!(s.max_health, 0.0);
        assert_eq!(s.start_health, 100.0, "start clamps to the playable fallback max");

        let conf = Ini::load_from_str("[Stage]\nMaxHealth=lots\n").unwrap();
        assert_eq!(StageConfig::from_ini(&conf).max_health, 100.0);
    }

    #[test]
    fn default_file_round_trips_through_disk() {
        let dir = std::env::temp_dir().join(format!("rhythmrun-stage-{}", std::process::id()));
        let path = dir.join("stage.ini");
        let _ = std::fs::remove_file(&path);
        let loaded = load_stage(&path).expect("missing stage file should be created");
        assert!(path.exists());
        assert_eq!(loaded, StageConfig::default());
        let _ = std::fs::remove_dir_all(&dir);
    }
}
