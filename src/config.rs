use crate::core::input::{Keymap, Symbol};
use ini::Ini;
use log::{info, warn};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::{Mutex, PoisonError};

const CONFIG_PATH: &str = "rhythmrun.ini";
const SECTION_OPTIONS: &str = "Options";
const SECTION_KEYMAP: &str = "Keymap";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    const fn as_str(&self) -> &'static str {
        match self {
            Self::Off => "Off",
            Self::Error => "Error",
            Self::Warn => "Warn",
            Self::Info => "Info",
            Self::Debug => "Debug",
            Self::Trace => "Trace",
        }
    }

    pub const fn as_level_filter(&self) -> log::LevelFilter {
        match self {
            Self::Off => log::LevelFilter::Off,
            Self::Error => log::LevelFilter::Error,
            Self::Warn => log::LevelFilter::Warn,
            Self::Info => log::LevelFilter::Info,
            Self::Debug => log::LevelFilter::Debug,
            Self::Trace => log::LevelFilter::Trace,
        }
    }
}

impl FromStr for LogLevel {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "off" => Ok(Self::Off),
            "error" => Ok(Self::Error),
            "warn" | "warning" => Ok(Self::Warn),
            "info" => Ok(Self::Info),
            "debug" => Ok(Self::Debug),
            "trace" => Ok(Self::Trace),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub log_level: LogLevel,
    /// Stage tuning INI read at run start.
    pub stage_file: PathBuf,
    pub results_dir: PathBuf,
    pub save_results: bool,
    /// Simulation ticks per second for headless replays.
    pub tick_rate_hz: u32,
    pub keymap: Keymap,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: LogLevel::Info,
            stage_file: PathBuf::from("stage.ini"),
            results_dir: PathBuf::from("save/results"),
            save_results: true,
            tick_rate_hz: 60,
            keymap: Keymap::default(),
        }
    }
}

impl Config {
    #[inline(always)]
    pub fn tick_seconds(&self) -> f32 {
        1.0 / self.tick_rate_hz.max(1) as f32
    }

    /// Populates from an INI, using default values for any missing keys.
    pub fn from_ini(conf: &Ini) -> Self {
        let default = Self::default();
        let opt = |key: &str| conf.get_from(Some(SECTION_OPTIONS), key);

        let log_level = match opt("LogLevel") {
            None => default.log_level,
            Some(v) => LogLevel::from_str(v).unwrap_or_else(|()| {
                warn!("Unknown LogLevel '{v}'; using {}.", default.log_level.as_str());
                default.log_level
            }),
        };
        let stage_file = opt("StageFile")
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map_or(default.stage_file, PathBuf::from);
        let results_dir = opt("ResultsDir")
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map_or(default.results_dir, PathBuf::from);
        let save_results = opt("SaveResults")
            .and_then(parse_bool)
            .unwrap_or(default.save_results);
        let tick_rate_hz = opt("TickRateHz")
            .and_then(|v| v.trim().parse::<u32>().ok())
            .map_or(default.tick_rate_hz, |v| v.clamp(1, 1000));

        Self {
            log_level,
            stage_file,
            results_dir,
            save_results,
            tick_rate_hz,
            keymap: load_keymap_from_ini(conf),
        }
    }

    pub fn to_ini_string(&self) -> String {
        let mut content = String::new();

        // [Options] (alphabetical order)
        content.push_str(&format!("[{SECTION_OPTIONS}]\n"));
        content.push_str(&format!("LogLevel={}\n", self.log_level.as_str()));
        content.push_str(&format!("ResultsDir={}\n", self.results_dir.display()));
        content.push_str(&format!(
            "SaveResults={}\n",
            if self.save_results { "1" } else { "0" }
        ));
        content.push_str(&format!("StageFile={}\n", self.stage_file.display()));
        content.push_str(&format!("TickRateHz={}\n", self.tick_rate_hz));
        content.push('\n');

        content.push_str(&format!("[{SECTION_KEYMAP}]\n"));
        for symbol in Symbol::ALL {
            content.push_str(&format!(
                "{}={}\n",
                symbol.as_str(),
                self.keymap.keys_for(symbol).join(",")
            ));
        }
        content
    }
}

fn parse_bool(v: &str) -> Option<bool> {
    let v = v.trim();
    if v.is_empty() {
        None
    } else if v.eq_ignore_ascii_case("true")
        || v.eq_ignore_ascii_case("yes")
        || v.eq_ignore_ascii_case("on")
    {
        Some(true)
    } else if v.eq_ignore_ascii_case("false")
        || v.eq_ignore_ascii_case("no")
        || v.eq_ignore_ascii_case("off")
    {
        Some(false)
    } else {
        v.parse::<u8>().ok().map(|n| n != 0)
    }
}

/// `[Keymap]` lines look like `Red=S,ArrowLeft`. Symbols without a line keep
/// their default binding.
fn load_keymap_from_ini(conf: &Ini) -> Keymap {
    let mut km = Keymap::default();
    let Some(section) = conf.section(Some(SECTION_KEYMAP)) else {
        return km;
    };
    for (name, keys) in section.iter() {
        let Ok(symbol) = Symbol::from_str(name) else {
            warn!("[{SECTION_KEYMAP}] unknown symbol '{name}'; ignoring.");
            continue;
        };
        let keys: Vec<&str> = keys
            .split(',')
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .collect();
        km.bind(symbol, &keys);
    }
    km
}

// Global, mutable configuration instance.
static CONFIG: std::sync::LazyLock<Mutex<Config>> =
    std::sync::LazyLock::new(|| Mutex::new(Config::default()));

// --- File I/O ---

fn create_default_config_file(path: &Path) -> Result<(), std::io::Error> {
    info!("'{}' not found, creating with default values.", path.display());
    std::fs::write(path, Config::default().to_ini_string())
}

/// Reads `path`, creating it with defaults when missing. Falls back to
/// defaults on any read or parse failure.
pub fn load_from<P: AsRef<Path>>(path: P) -> Config {
    let path = path.as_ref();
    if !path.exists()
        && let Err(e) = create_default_config_file(path)
    {
        warn!("Failed to create default config file: {e}");
    }
    match Ini::load_from_file(path) {
        Ok(conf) => {
            let cfg = Config::from_ini(&conf);
            info!("Configuration loaded from '{}'.", path.display());
            cfg
        }
        Err(e) => {
            warn!("Failed to load '{}': {e}. Using default settings.", path.display());
            Config::default()
        }
    }
}

pub fn load() {
    let cfg = load_from(CONFIG_PATH);
    *CONFIG.lock().unwrap_or_else(PoisonError::into_inner) = cfg;
}

pub fn get() -> Config {
    CONFIG
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .clone()
}
