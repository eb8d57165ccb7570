use glam::Vec2;
use log::{debug, trace, warn};

use crate::core::input::{Symbol, SymbolSet};
use crate::game::judgment::{self, JudgeGrade, Judgment};
use crate::game::zone::{Zone, ZoneId};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum WindowState {
    /// Not inside any zone.
    Idle,
    /// Inside a zone, collecting pressed symbols.
    Accumulating,
    /// Judgment already emitted (or zone skipped); waiting for exit.
    Resolved,
}

/// Per-visit input accumulation for a single zone.
///
/// A window resolves once as many distinct symbols have been pressed as the
/// zone requires. The pressed set must then equal the required set exactly:
/// pressing an unlisted symbol turns an otherwise valid hit into a MISS.
#[derive(Debug)]
pub struct InputWindowMatcher {
    state: WindowState,
    zone: Option<Zone>,
    pressed: SymbolSet,
}

impl Default for InputWindowMatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl InputWindowMatcher {
    pub const fn new() -> Self {
        Self {
            state: WindowState::Idle,
            zone: None,
            pressed: SymbolSet::empty(),
        }
    }

    #[inline(always)]
    pub const fn state(&self) -> WindowState {
        self.state
    }

    #[inline(always)]
    pub fn is_idle(&self) -> bool {
        self.state == WindowState::Idle
    }

    #[inline(always)]
    pub fn active_zone(&self) -> Option<&Zone> {
        self.zone.as_ref()
    }

    #[inline(always)]
    pub const fn pressed(&self) -> SymbolSet {
        self.pressed
    }

    /// Opens a window for `zone`. Only accepted from `Idle`; otherwise the
    /// zone is handed back untouched.
    pub fn on_zone_enter(&mut self, zone: Zone) -> Result<(), Zone> {
        if self.state != WindowState::Idle {
            debug!(
                "Ignoring enter of zone {} while zone {:?} is still active.",
                zone.id,
                self.zone.as_ref().map(|z| z.id)
            );
            return Err(zone);
        }
        self.pressed = SymbolSet::empty();
        self.state = if zone.is_playable() {
            WindowState::Accumulating
        } else {
            warn!("Zone {} has no required symbols; skipping its window.", zone.id);
            WindowState::Resolved
        };
        trace!("Entered zone {} ({:?}).", zone.id, self.state);
        self.zone = Some(zone);
        Ok(())
    }

    /// Returns whether the press was accepted into the window.
    pub fn on_symbol_pressed(&mut self, symbol: Symbol) -> bool {
        if self.state != WindowState::Accumulating {
            debug!("Ignoring {symbol} press outside an open window ({:?}).", self.state);
            return false;
        }
        self.pressed.add(symbol);
        true
    }

    /// Resolves the window when enough symbols have been pressed. Emits at
    /// most one judgment per zone visit.
    pub fn tick(&mut self, player_pos: Vec2) -> Option<Judgment> {
        if self.state != WindowState::Accumulating {
            return None;
        }
        let zone = self.zone.as_ref()?;
        let required = zone.required();
        if self.pressed.len() < required.len() {
            return None;
        }

        let distance = zone.distance_to(player_pos);
        let full_match = self.pressed == required;
        let grade = if full_match {
            judgment::grade(distance, zone.radius)
        } else {
            JudgeGrade::Miss
        };
        let result = Judgment::from_window(zone.id, grade, self.pressed, distance, full_match);
        debug!(
            "Zone {} resolved: {} (pressed {:?}, required {:?}, d={:.3}).",
            zone.id, grade, self.pressed, required, distance
        );

        self.pressed = SymbolSet::empty();
        self.state = WindowState::Resolved;
        Some(result)
    }

    /// Consumes the active zone. Returns the id of a zone whose window closed
    /// without a judgment.
    pub fn on_zone_exit(&mut self) -> Option<ZoneId> {
        let was = self.state;
        let zone = self.zone.take();
        self.pressed = SymbolSet::empty();
        self.state = WindowState::Idle;
        match (was, zone) {
            (WindowState::Accumulating, Some(z)) => {
                debug!("Left zone {} before resolving; no judgment.", z.id);
                Some(z.id)
            }
            (WindowState::Idle, _) => {
                debug!("Ignoring zone exit while idle.");
                None
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{InputWindowMatcher, WindowState};
    use crate::core::input::Symbol;
    use crate::game::judgment::JudgeGrade;
    use crate::game::zone::Zone;
    use glam::Vec2;

    fn zone_rd() -> Zone {
        // span = 1.0, so the distance is the normalized distance
        Zone::new(7, Vec2::ZERO, 2.0, &[Symbol::Red, Symbol::Yellow])
    }

    #[test]
    fn exact_set_is_graded_by_distance() {
        let mut m = InputWindowMatcher::new();
        m.on_zone_enter(zone_rd()).unwrap();
        assert!(m.on_symbol_pressed(Symbol::Red));
        assert!(m.on_symbol_pressed(Symbol::Yellow));
        let j = m.tick(Vec2::new(0.5, 0.0)).expect("full set should resolve");
        assert_eq!(j.grade, JudgeGrade::Good);
        assert!(j.full_match);
        assert_eq!(j.zone_id, 7);
        assert_eq!(j.pressed.as_slice(), &[Symbol::Red, Symbol::Yellow]);
        assert_eq!(m.state(), WindowState::Resolved);
        assert!(m.pressed().is_empty());
    }

    #[test]
    fn extra_symbol_forces_miss() {
        let mut m = InputWindowMatcher::new();
        m.on_zone_enter(zone_rd()).unwrap();
        m.on_symbol_pressed(Symbol::Red);
        m.on_symbol_pressed(Symbol::Yellow);
        m.on_symbol_pressed(Symbol::Green);
        let j = m.tick(Vec2::ZERO).expect("over-pressed set still resolves");
        assert_eq!(j.grade, JudgeGrade::Miss, "extra symbols must not be ignored");
        assert!(!j.full_match);
        assert_eq!(j.pressed.len(), 3);
    }

    #[test]
    fn wrong_pair_forces_miss_even_at_center() {
        let mut m = InputWindowMatcher::new();
        m.on_zone_enter(zone_rd()).unwrap();
        m.on_symbol_pressed(Symbol::Red);
        m.on_symbol_pressed(Symbol::Blue);
        let j = m.tick(Vec2::ZERO).unwrap();
        assert_eq!(j.grade, JudgeGrade::Miss);
    }

    #[test]
    fn partial_set_never_resolves_and_exit_cancels() {
        let mut m = InputWindowMatcher::new();
        m.on_zone_enter(zone_rd()).unwrap();
        m.on_symbol_pressed(Symbol::Red);
        m.on_symbol_pressed(Symbol::Red);
        for _ in 0..10 {
            assert!(m.tick(Vec2::ZERO).is_none());
        }
        assert_eq!(m.on_zone_exit(), Some(7));
        assert_eq!(m.state(), WindowState::Idle);
        assert!(m.active_zone().is_none());
    }

    #[test]
    fn only_one_judgment_per_visit() {
        let mut m = InputWindowMatcher::new();
        m.on_zone_enter(zone_rd()).unwrap();
        m.on_symbol_pressed(Symbol::Red);
        m.on_symbol_pressed(Symbol::Yellow);
        assert!(m.tick(Vec2::ZERO).is_some());
        assert!(!m.on_symbol_pressed(Symbol::Red), "presses after resolution are ignored");
        assert!(m.tick(Vec2::ZERO).is_none());
        assert_eq!(m.on_zone_exit(), None);
    }

    #[test]
    fn presses_outside_a_window_are_ignored() {
        let mut m = InputWindowMatcher::new();
        assert!(!m.on_symbol_pressed(Symbol::Red));
        assert!(m.tick(Vec2::ZERO).is_none());
        assert_eq!(m.on_zone_exit(), None);
    }

    #[test]
    fn second_enter_is_rejected_while_active() {
        let mut m = InputWindowMatcher::new();
        m.on_zone_enter(zone_rd()).unwrap();
        let other = Zone::new(8, Vec2::ONE, 1.0, &[Symbol::Blue]);
        let back = m.on_zone_enter(other).expect_err("second zone must be rejected");
        assert_eq!(back.id, 8);
        assert_eq!(m.active_zone().map(|z| z.id), Some(7));
    }

    #[test]
    fn empty_zone_is_skipped_without_judgment() {
        let mut m = InputWindowMatcher::new();
        m.on_zone_enter(Zone::new(9, Vec2::ZERO, 2.0, &[])).unwrap();
        assert_eq!(m.state(), WindowState::Resolved);
        assert!(!m.on_symbol_pressed(Symbol::Red));
        assert!(m.tick(Vec2::ZERO).is_none());
        assert_eq!(m.on_zone_exit(), None);
    }

    #[test]
    fn zero_radius_zone_grades_miss_on_full_match() {
        let mut m = InputWindowMatcher::new();
        m.on_zone_enter(Zone::new(3, Vec2::ZERO, 0.0, &[Symbol::Purple])).unwrap();
        m.on_symbol_pressed(Symbol::Purple);
        let j = m.tick(Vec2::ZERO).unwrap();
        assert!(j.full_match);
        assert_eq!(j.grade, JudgeGrade::Miss);
    }
}
