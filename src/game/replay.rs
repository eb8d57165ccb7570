use glam::Vec2;
use log::{debug, warn};
use serde::Deserialize;
use std::path::Path;

use crate::core::input::{Keymap, SymbolCooldowns};
use crate::game::gameplay::{Run, RunEvent};
use crate::game::stage::StageConfig;
use crate::game::stage_stats::RunSummary;
use crate::game::zone::{Zone, ZoneId, ZonePath};

pub const DEFAULT_TICK_S: f32 = 1.0 / 60.0;
// Hard stop for scripts whose path end is unreachable (e.g. zero speed).
const MAX_REPLAY_SECONDS: f32 = 3600.0;

#[derive(Clone, Debug, Deserialize)]
pub struct ScriptedPress {
    pub t: f32,
    pub key: String,
}

/// A level plus a timeline of device key presses. The player runs along the
/// +x axis from the origin.
#[derive(Clone, Debug, Deserialize)]
pub struct ReplayScript {
    pub path_length: f32,
    pub zones: Vec<Zone>,
    #[serde(default)]
    pub presses: Vec<ScriptedPress>,
}

impl ReplayScript {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn std::error::Error>> {
        let bytes = std::fs::read(path)?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

pub struct ReplayResult {
    pub summary: Option<RunSummary>,
    pub events: Vec<RunEvent>,
}

/// Headless host: plays the roles of the collision, input and cooldown
/// collaborators around a `Run`.
pub struct ReplayHost {
    run: Run,
    keymap: Keymap,
    cooldowns: SymbolCooldowns,
    cooldown_s: f32,
    presses: Vec<ScriptedPress>,
    next_press: usize,
    clock: f32,
    player_x: f32,
    path_length: f32,
    in_zone: Option<ZoneId>,
    events: Vec<RunEvent>,
}

impl ReplayHost {
    pub fn new(script: ReplayScript, stage: StageConfig, keymap: Keymap) -> Self {
        let mut presses = script.presses;
        presses.sort_by(|a, b| a.t.total_cmp(&b.t));
        let cooldown_s = stage.symbol_cooldown_s;
        let run = Run::new(stage, ZonePath::from_zones(script.zones));
        Self {
            run,
            keymap,
            cooldowns: SymbolCooldowns::default(),
            cooldown_s,
            presses,
            next_press: 0,
            clock: 0.0,
            player_x: 0.0,
            path_length: script.path_length,
            in_zone: None,
            events: Vec::new(),
        }
    }

    #[inline(always)]
    pub fn run(&self) -> &Run {
        &self.run
    }

    pub fn play(mut self, tick_s: f32) -> ReplayResult {
        let tick_s = if tick_s.is_finite() && tick_s > 0.0 {
            tick_s
        } else {
            warn!("Tick length {tick_s} is not positive; using {DEFAULT_TICK_S}.");
            DEFAULT_TICK_S
        };
        self.run.start();
        while !self.run.phase().is_terminal() {
            if self.clock >= MAX_REPLAY_SECONDS {
                warn!("Replay exceeded {MAX_REPLAY_SECONDS}s; ending the path.");
                self.run.signal_path_end();
            }
            self.step(tick_s);
        }
        ReplayResult {
            summary: RunSummary::from_run(&self.run),
            events: self.events,
        }
    }

    fn step(&mut self, dt: f32) {
        self.player_x += self.run.current_speed() * dt;
        let pos = Vec2::new(self.player_x, 0.0);

        self.update_collision(pos);
        self.deliver_presses(dt);
        if self.player_x >= self.path_length {
            self.run.signal_path_end();
        }

        self.run.tick(dt, pos);
        for event in self.run.drain_events() {
            if let RunEvent::Judged { judgment, .. } = &event {
                self.cooldowns
                    .start(judgment.pressed.iter().copied(), self.cooldown_s);
            }
            self.events.push(event);
        }
        self.cooldowns.tick(dt);
        self.clock += dt;
    }

    fn update_collision(&mut self, pos: Vec2) {
        if self.in_zone.is_some() {
            let still_inside = self
                .run
                .matcher()
                .active_zone()
                .is_some_and(|z| z.contains(pos));
            if still_inside {
                return;
            }
            self.run.exit_zone();
            self.in_zone = None;
        }
        if let Some(id) = self.run.path().zone_at(pos)
            && self.run.enter_zone(id)
        {
            self.in_zone = Some(id);
        }
    }

    fn deliver_presses(&mut self, dt: f32) {
        let horizon = self.clock + dt;
        while let Some(press) = self.presses.get(self.next_press) {
            if press.t >= horizon {
                break;
            }
            self.next_press += 1;
            let Some(symbol) = self.keymap.symbol_for_key(&press.key) else {
                continue;
            };
            if self.cooldowns.is_cooling(symbol) {
                debug!("Dropping {symbol} press at {:.3}s: cooling down.", press.t);
                continue;
            }
            self.run.press(symbol);
        }
    }
}
