use bitflags::bitflags;
use log::debug;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Abstract color-key the player presses. Device codes never reach the core;
/// the keymap translates them into one of these first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Symbol {
    Red = 0,
    Yellow = 1,
    Green = 2,
    Blue = 3,
    Purple = 4,
}

impl Symbol {
    pub const COUNT: usize = 5;
    pub const ALL: [Self; Self::COUNT] = [
        Self::Red,
        Self::Yellow,
        Self::Green,
        Self::Blue,
        Self::Purple,
    ];

    #[inline(always)]
    pub const fn index(self) -> usize {
        self as usize
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Red => "Red",
            Self::Yellow => "Yellow",
            Self::Green => "Green",
            Self::Blue => "Blue",
            Self::Purple => "Purple",
        }
    }
}

impl FromStr for Symbol {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "red" => Ok(Self::Red),
            "yellow" => Ok(Self::Yellow),
            "green" => Ok(Self::Green),
            "blue" => Ok(Self::Blue),
            "purple" => Ok(Self::Purple),
            _ => Err(()),
        }
    }
}

impl std::fmt::Display for Symbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

bitflags! {
    /// Unordered set of symbols. Inserting a symbol twice is a no-op.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct SymbolSet: u8 {
        const RED = 1 << 0;
        const YELLOW = 1 << 1;
        const GREEN = 1 << 2;
        const BLUE = 1 << 3;
        const PURPLE = 1 << 4;
    }
}

impl SymbolSet {
    #[inline(always)]
    pub const fn of(symbol: Symbol) -> Self {
        Self::from_bits_truncate(1 << symbol as u8)
    }

    pub fn from_symbols<'a, I>(symbols: I) -> Self
    where
        I: IntoIterator<Item = &'a Symbol>,
    {
        symbols
            .into_iter()
            .fold(Self::empty(), |acc, &s| acc | Self::of(s))
    }

    #[inline(always)]
    pub fn add(&mut self, symbol: Symbol) {
        self.insert(Self::of(symbol));
    }

    #[inline(always)]
    pub const fn has(self, symbol: Symbol) -> bool {
        self.bits() & (1 << symbol as u8) != 0
    }

    #[inline(always)]
    pub const fn len(self) -> usize {
        self.bits().count_ones() as usize
    }

    /// Members in `Symbol::ALL` order.
    pub fn symbols(self) -> impl Iterator<Item = Symbol> {
        Symbol::ALL.into_iter().filter(move |&s| self.has(s))
    }
}

/* ------------------------ Keymap ------------------------ */

/// Device key name -> symbol lookup. Key names are compared case-insensitively.
#[derive(Clone, Debug)]
pub struct Keymap {
    map: FxHashMap<Symbol, Vec<String>>,
}

impl Default for Keymap {
    fn default() -> Self {
        let mut km = Self::empty();
        km.bind(Symbol::Red, &["S"]);
        km.bind(Symbol::Yellow, &["D"]);
        km.bind(Symbol::Green, &["F"]);
        km.bind(Symbol::Blue, &["J"]);
        km.bind(Symbol::Purple, &["K"]);
        km
    }
}

impl Keymap {
    pub fn empty() -> Self {
        Self {
            map: FxHashMap::default(),
        }
    }

    /// Replaces the bindings of `symbol`. A key already bound to another
    /// symbol is moved, so one key never yields two symbols.
    pub fn bind(&mut self, symbol: Symbol, keys: &[&str]) {
        let keys: Vec<String> = keys
            .iter()
            .map(|k| k.trim().to_ascii_uppercase())
            .filter(|k| !k.is_empty())
            .collect();
        for (other, bound) in &mut self.map {
            if *other != symbol {
                bound.retain(|k| !keys.contains(k));
            }
        }
        self.map.insert(symbol, keys);
    }

    pub fn keys_for(&self, symbol: Symbol) -> &[String] {
        self.map.get(&symbol).map_or(&[][..], Vec::as_slice)
    }

    pub fn symbol_for_key(&self, key: &str) -> Option<Symbol> {
        let key = key.trim();
        let found = Symbol::ALL.into_iter().find(|s| {
            self.keys_for(*s)
                .iter()
                .any(|k| k.eq_ignore_ascii_case(key))
        });
        if found.is_none() {
            debug!("Key '{key}' is not bound to any symbol.");
        }
        found
    }
}

/* ------------------------ Cooldowns ------------------------ */

/// Host-side per-symbol countdowns started from a judgment's pressed symbols.
/// The scoring core never reads these.
#[derive(Clone, Copy, Debug, Default)]
pub struct SymbolCooldowns {
    remaining: [f32; Symbol::COUNT],
}

impl SymbolCooldowns {
    pub fn start<I>(&mut self, symbols: I, duration_s: f32)
    where
        I: IntoIterator<Item = Symbol>,
    {
        let duration_s = duration_s.max(0.0);
        for s in symbols {
            self.remaining[s.index()] = duration_s;
        }
    }

    pub fn tick(&mut self, delta_time: f32) {
        for r in &mut self.remaining {
            *r = (*r - delta_time).max(0.0);
        }
    }

    #[inline(always)]
    pub fn is_cooling(&self, symbol: Symbol) -> bool {
        self.remaining[symbol.index()] > 0.0
    }

    #[inline(always)]
    pub fn remaining(&self, symbol: Symbol) -> f32 {
        self.remaining[symbol.index()]
    }
}
