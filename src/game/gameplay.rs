use glam::Vec2;
use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::core::input::Symbol;
use crate::game::combo::ComboEngine;
use crate::game::judgment::Judgment;
use crate::game::life::HealthModel;
use crate::game::scores::{ScoreAggregator, ScoreSnapshot};
use crate::game::stage::StageConfig;
use crate::game::window::InputWindowMatcher;
use crate::game::zone::{ZoneId, ZonePath};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunPhase {
    Idle,
    Running,
    Completed,
    Failed,
}

impl RunPhase {
    #[inline(always)]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunOutcome {
    Completed,
    Failed,
}

/// Outbound notifications, queued during a tick and drained by the host.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub enum RunEvent {
    Judged {
        judgment: Judgment,
        score: i32,
        combo: u32,
    },
    ComboChanged {
        combo: u32,
    },
    HealthChanged {
        health: f32,
        max: f32,
    },
    SpeedChanged {
        speed: f32,
    },
    Finished {
        outcome: RunOutcome,
        snapshot: ScoreSnapshot,
    },
}

/// One run along a path. Single-threaded and tick-driven: within a tick,
/// health decay is applied first, then window resolution, then the
/// termination check.
pub struct Run {
    phase: RunPhase,
    stage: StageConfig,
    path: ZonePath,
    matcher: InputWindowMatcher,
    combo: ComboEngine,
    health: HealthModel,
    scores: ScoreAggregator,
    symbol_events: u32,
    elapsed: f32,
    speed: f32,
    path_end_reached: bool,
    snapshot: Option<ScoreSnapshot>,
    events: Vec<RunEvent>,
    log_timer: f32,
}

impl Run {
    pub fn new(stage: StageConfig, path: ZonePath) -> Self {
        let combo = ComboEngine::new(stage.score_combo.clone(), stage.speed_combo.clone());
        let health = HealthModel::new(stage.max_health, stage.start_health);
        let speed = combo.speed_for(stage.stage_speed());
        Self {
            phase: RunPhase::Idle,
            stage,
            path,
            matcher: InputWindowMatcher::new(),
            combo,
            health,
            scores: ScoreAggregator::new(),
            symbol_events: 0,
            elapsed: 0.0,
            speed,
            path_end_reached: false,
            snapshot: None,
            events: Vec::new(),
            log_timer: 0.0,
        }
    }

    pub fn start(&mut self) {
        if self.phase != RunPhase::Idle {
            debug!("Ignoring start while {:?}.", self.phase);
            return;
        }
        info!(
            "Run started: {} zones, health {}/{}, speed {:.2}.",
            self.path.len(),
            self.health.value(),
            self.health.max(),
            self.speed
        );
        self.phase = RunPhase::Running;
    }

    #[inline(always)]
    pub const fn phase(&self) -> RunPhase {
        self.phase
    }

    #[inline(always)]
    pub const fn stage(&self) -> &StageConfig {
        &self.stage
    }

    #[inline(always)]
    pub const fn path(&self) -> &ZonePath {
        &self.path
    }

    #[inline(always)]
    pub const fn matcher(&self) -> &InputWindowMatcher {
        &self.matcher
    }

    #[inline(always)]
    pub fn combo(&self) -> u32 {
        self.combo.combo()
    }

    #[inline(always)]
    pub fn max_combo(&self) -> u32 {
        self.combo.max_combo()
    }

    #[inline(always)]
    pub fn health(&self) -> f32 {
        self.health.value()
    }

    #[inline(always)]
    pub const fn elapsed(&self) -> f32 {
        self.elapsed
    }

    /// Movement speed after the stage multiplier and the current combo bonus.
    #[inline(always)]
    pub const fn current_speed(&self) -> f32 {
        self.speed
    }

    #[inline(always)]
    pub fn scores(&self) -> &ScoreAggregator {
        &self.scores
    }

    /// Set exactly once, when the run reaches a terminal phase.
    #[inline(always)]
    pub fn snapshot(&self) -> Option<&ScoreSnapshot> {
        self.snapshot.as_ref()
    }

    pub fn drain_events(&mut self) -> Vec<RunEvent> {
        std::mem::take(&mut self.events)
    }

    /* ------------------------ Collaborator inputs ------------------------ */

    /// The player crossed into zone `id`. Returns whether a window opened.
    pub fn enter_zone(&mut self, id: ZoneId) -> bool {
        if self.phase != RunPhase::Running {
            return false;
        }
        if !self.matcher.is_idle() {
            debug!("Ignoring enter of zone {id}: another zone is active.");
            return false;
        }
        let Some(zone) = self.path.take(id) else {
            debug!("Ignoring enter of unknown or consumed zone {id}.");
            return false;
        };
        self.matcher.on_zone_enter(zone).is_ok()
    }

    pub fn exit_zone(&mut self) {
        if self.phase != RunPhase::Running {
            return;
        }
        self.matcher.on_zone_exit();
    }

    pub fn press(&mut self, symbol: Symbol) -> bool {
        if self.phase != RunPhase::Running {
            return false;
        }
        self.matcher.on_symbol_pressed(symbol)
    }

    /// Latched; the run completes at the end of the next tick unless health
    /// runs out first.
    pub fn signal_path_end(&mut self) {
        if self.phase == RunPhase::Running {
            self.path_end_reached = true;
        }
    }

    /* ------------------------ Tick ------------------------ */

    pub fn tick(&mut self, delta_time: f32, player_pos: Vec2) -> RunPhase {
        if self.phase != RunPhase::Running {
            return self.phase;
        }
        self.elapsed += delta_time;

        let decay = self
            .health
            .apply_continuous_decay(delta_time, self.stage.decay_per_second);
        if decay.changed() {
            self.push_health();
        }

        if let Some(judgment) = self.matcher.tick(player_pos) {
            self.apply_judgment(judgment);
        }

        if self.health.is_exhausted() {
            self.finish(RunOutcome::Failed);
        } else if self.path_end_reached {
            self.finish(RunOutcome::Completed);
        }

        self.log_timer += delta_time;
        if self.phase == RunPhase::Running && self.log_timer >= 1.0 {
            info!(
                "Time: {:.2}, Combo: {}, Health: {:.1}, Speed: {:.2}, Zones left: {}",
                self.elapsed,
                self.combo.combo(),
                self.health.value(),
                self.speed,
                self.path.len()
            );
            self.log_timer -= 1.0;
        }
        self.phase
    }

    fn apply_judgment(&mut self, judgment: Judgment) {
        let grade = judgment.grade;
        let prev_combo = self.combo.combo();
        let combo = self.combo.on_judgment(grade);
        let score = self.combo.score_for(grade, self.stage.grade_score(grade));
        self.scores.record(grade, score);
        self.symbol_events = self
            .symbol_events
            .saturating_add(judgment.pressed.len() as u32);

        let life = self
            .health
            .apply_judgment_delta(grade, self.stage.health_delta(grade));

        self.events.push(RunEvent::Judged {
            judgment,
            score,
            combo,
        });
        if combo != prev_combo {
            self.events.push(RunEvent::ComboChanged { combo });
        }
        if life.changed() {
            self.push_health();
        }
        let speed = self.combo.speed_for(self.stage.stage_speed());
        if speed != self.speed {
            self.speed = speed;
            self.events.push(RunEvent::SpeedChanged { speed });
        }
    }

    fn push_health(&mut self) {
        self.events.push(RunEvent::HealthChanged {
            health: self.health.value(),
            max: self.health.max(),
        });
    }

    fn finish(&mut self, outcome: RunOutcome) {
        self.combo.freeze();
        // The bonus ratio uses the configured max, not the model's fallback.
        let snapshot = self.scores.snapshot(
            self.health.value(),
            self.stage.max_health,
            self.combo.max_combo(),
            self.symbol_events,
        );
        self.phase = match outcome {
            RunOutcome::Completed => RunPhase::Completed,
            RunOutcome::Failed => RunPhase::Failed,
        };
        info!(
            "Run {:?} at {:.2}s: total {} ({}), max combo {}.",
            outcome, self.elapsed, snapshot.total_score, snapshot.rank, snapshot.max_combo
        );
        self.events.push(RunEvent::Finished {
            outcome,
            snapshot: snapshot.clone(),
        });
        self.snapshot = Some(snapshot);
    }
}
