use glam::Vec2;
use log::warn;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::core::input::{Symbol, SymbolSet};

pub type ZoneId = u32;

/// A one-shot trigger region on the path. The required symbols may repeat a
/// kind; matching only looks at which kinds are present.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Zone {
    pub id: ZoneId,
    pub center: Vec2,
    pub radius: f32,
    pub symbols: Vec<Symbol>,
}

impl Zone {
    pub fn new(id: ZoneId, center: Vec2, radius: f32, symbols: &[Symbol]) -> Self {
        Self {
            id,
            center,
            radius,
            symbols: symbols.to_vec(),
        }
    }

    #[inline(always)]
    pub fn required(&self) -> SymbolSet {
        SymbolSet::from_symbols(&self.symbols)
    }

    #[inline(always)]
    pub fn distance_to(&self, pos: Vec2) -> f32 {
        self.center.distance(pos)
    }

    /// Collision test used by hosts without their own physics.
    #[inline(always)]
    pub fn contains(&self, pos: Vec2) -> bool {
        self.radius > 0.0 && self.center.distance_squared(pos) <= self.radius * self.radius
    }

    #[inline(always)]
    pub fn is_playable(&self) -> bool {
        !self.symbols.is_empty()
    }
}

/// Level-owned zones not yet consumed. A zone leaves the path when the
/// player enters it and is never handed out again.
#[derive(Clone, Debug, Default)]
pub struct ZonePath {
    zones: FxHashMap<ZoneId, Zone>,
    // Ids in insertion order, for deterministic lookups.
    order: Vec<ZoneId>,
}

impl ZonePath {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_zones<I>(zones: I) -> Self
    where
        I: IntoIterator<Item = Zone>,
    {
        let mut path = Self::new();
        for zone in zones {
            path.insert(zone);
        }
        path
    }

    /// Adds a zone, replacing any zone with the same id. Zones without a
    /// positive finite radius are rejected.
    pub fn insert(&mut self, zone: Zone) -> bool {
        if zone.radius <= 0.0 || !zone.radius.is_finite() {
            warn!("Zone {} has non-positive radius {}; dropping it.", zone.id, zone.radius);
            return false;
        }
        if !zone.is_playable() {
            warn!("Zone {} has no required symbols and will be skipped.", zone.id);
        }
        let id = zone.id;
        if self.zones.insert(id, zone).is_some() {
            warn!("Zone {id} was spawned twice; keeping the newer one.");
        } else {
            self.order.push(id);
        }
        true
    }

    pub fn get(&self, id: ZoneId) -> Option<&Zone> {
        self.zones.get(&id)
    }

    /// Hands ownership of a zone to the caller, removing it from the path.
    pub fn take(&mut self, id: ZoneId) -> Option<Zone> {
        let zone = self.zones.remove(&id)?;
        self.order.retain(|&z| z != id);
        Some(zone)
    }

    /// First unconsumed zone containing `pos`.
    pub fn zone_at(&self, pos: Vec2) -> Option<ZoneId> {
        self.order
            .iter()
            .copied()
            .find(|id| self.zones.get(id).is_some_and(|z| z.contains(pos)))
    }

    #[inline(always)]
    pub fn len(&self) -> usize {
        self.zones.len()
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::{Zone, ZonePath};
    use crate::core::input::{Symbol, SymbolSet};
    use glam::Vec2;

    #[test]
    fn required_set_collapses_repeated_kinds() {
        let z = Zone::new(1, Vec2::ZERO, 2.0, &[Symbol::Red, Symbol::Red, Symbol::Blue]);
        assert_eq!(
            z.required(),
            SymbolSet::from_symbols(&[Symbol::Blue, Symbol::Red])
        );
        assert_eq!(z.required().len(), 2);
    }

    #[test]
    fn contains_uses_radius() {
        let z = Zone::new(1, Vec2::new(10.0, 0.0), 2.0, &[Symbol::Red]);
        assert!(z.contains(Vec2::new(8.0, 0.0)));
        assert!(z.contains(Vec2::new(11.5, 0.0)));
        assert!(!z.contains(Vec2::new(7.9, 0.0)));
        assert!((z.distance_to(Vec2::new(10.0, 1.5)) - 1.5).abs() <= 1e-6);
        let degenerate = Zone::new(2, Vec2::ZERO, 0.0, &[Symbol::Red]);
        assert!(!degenerate.contains(Vec2::ZERO));
    }

    #[test]
    fn take_consumes_zone_once() {
        let mut path = ZonePath::from_zones([
            Zone::new(1, Vec2::new(0.0, 0.0), 1.0, &[Symbol::Red]),
            Zone::new(2, Vec2::new(5.0, 0.0), 1.0, &[Symbol::Green]),
        ]);
        assert_eq!(path.len(), 2);
        assert_eq!(path.zone_at(Vec2::new(5.5, 0.0)), Some(2));
        assert!(path.take(2).is_some());
        assert!(path.take(2).is_none());
        assert_eq!(path.zone_at(Vec2::new(5.5, 0.0)), None);
        assert_eq!(path.len(), 1);
    }

    #[test]
    fn degenerate_radius_is_rejected() {
        let mut path = ZonePath::from_zones([
            Zone::new(1, Vec2::ZERO, 0.0, &[Symbol::Red]),
            Zone::new(2, Vec2::new(5.0, 0.0), f32::NAN, &[Symbol::Red]),
            Zone::new(3, Vec2::new(9.0, 0.0), -1.0, &[Symbol::Red]),
        ]);
        assert!(path.is_empty());
        assert!(path.get(1).is_none());
        assert!(!path.insert(Zone::new(4, Vec2::ZERO, f32::INFINITY, &[Symbol::Blue])));
        assert!(path.insert(Zone::new(5, Vec2::ZERO, 1.0, &[Symbol::Blue])));
        assert_eq!(path.len(), 1);
    }
}
