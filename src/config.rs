/// External configuration loader.
///
/// Reads `config.toml` from the executable's directory (or CWD) and the
/// word dictionary from the configured words file. Missing files, missing
/// keys, and parse errors all fall back to built-in defaults with a
/// stderr warning; configuration can degrade but never aborts the host.

use std::path::PathBuf;

use serde::Deserialize;

use crate::host::object::{ObjectKind, WorldObject};
use crate::sim::session::SessionConfig;

/// Phosphor green, the default terminal tint.
const DEFAULT_COLOR: (u8, u8, u8) = (0x33, 0xff, 0x66);

// ── Public Config Struct ──

#[derive(Clone, Debug)]
pub struct HostConfig {
    pub session: SessionConfig,
    pub terminal_color: (u8, u8, u8),
    pub dictionary: Vec<String>,
    pub objects: Vec<WorldObject>,
    pub enabled_packages: Vec<String>,
    pub default_door: String,
    pub default_actor: String,
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    puzzle: TomlPuzzle,
    #[serde(default)]
    dictionary: TomlDictionary,
    #[serde(default)]
    packages: TomlPackages,
    #[serde(default)]
    objects: Vec<TomlObject>,
}

#[derive(Deserialize, Debug)]
struct TomlPuzzle {
    #[serde(default = "default_word_length")]
    word_length: usize,
    #[serde(default = "default_attempts")]
    attempts: u32,
    #[serde(default = "default_timer_seconds")]
    timer_seconds: u64,
    #[serde(default)]
    max_resets: Option<u32>,
    #[serde(default = "default_terminal_color")]
    terminal_color: String,
}

#[derive(Deserialize, Debug)]
struct TomlDictionary {
    #[serde(default = "default_words_file")]
    words_file: String,
}

#[derive(Deserialize, Debug)]
struct TomlPackages {
    #[serde(default = "default_enabled_packages")]
    enabled: Vec<String>,
    #[serde(default = "default_puzzle_type")]
    default_door: String,
    #[serde(default = "default_puzzle_type")]
    default_actor: String,
}

#[derive(Deserialize, Debug)]
struct TomlObject {
    name: String,
    #[serde(default = "default_object_kind")]
    kind: String,
    #[serde(default)]
    puzzle: String,
    #[serde(default = "default_true")]
    enabled: bool,
    #[serde(default = "default_true")]
    locked: bool,
}

// ── Defaults ──

fn default_word_length() -> usize { 7 }
fn default_attempts() -> u32 { 4 }
fn default_timer_seconds() -> u64 { 0 }
fn default_terminal_color() -> String { "#33ff66".into() }
fn default_words_file() -> String { "words.txt".into() }
fn default_enabled_packages() -> Vec<String> { vec!["hackterm".into()] }
fn default_puzzle_type() -> String { "hackterm".into() }
fn default_object_kind() -> String { "door".into() }
fn default_true() -> bool { true }

impl Default for TomlPuzzle {
    fn default() -> Self {
        TomlPuzzle {
            word_length: default_word_length(),
            attempts: default_attempts(),
            timer_seconds: default_timer_seconds(),
            max_resets: None,
            terminal_color: default_terminal_color(),
        }
    }
}

impl Default for TomlDictionary {
    fn default() -> Self {
        TomlDictionary { words_file: default_words_file() }
    }
}

impl Default for TomlPackages {
    fn default() -> Self {
        TomlPackages {
            enabled: default_enabled_packages(),
            default_door: default_puzzle_type(),
            default_actor: default_puzzle_type(),
        }
    }
}

// ── Loading ──

impl HostConfig {
    /// Load config from `config.toml`, searching the exe directory and the
    /// current working directory. Every failure degrades to defaults.
    pub fn load() -> Self {
        let search_dirs = candidate_dirs();
        let toml_cfg = load_toml(&search_dirs);

        let dictionary = load_words(&search_dirs, &toml_cfg.dictionary.words_file);

        let objects = if toml_cfg.objects.is_empty() {
            WorldObject::demo_facility()
        } else {
            toml_cfg.objects.iter().filter_map(convert_object).collect()
        };

        HostConfig {
            session: session_settings(&toml_cfg.puzzle),
            terminal_color: parse_color(&toml_cfg.puzzle.terminal_color).unwrap_or_else(|| {
                eprintln!(
                    "Warning: unrecognized terminal_color '{}'; using default.",
                    toml_cfg.puzzle.terminal_color
                );
                DEFAULT_COLOR
            }),
            dictionary,
            objects,
            enabled_packages: toml_cfg.packages.enabled,
            default_door: toml_cfg.packages.default_door,
            default_actor: toml_cfg.packages.default_actor,
        }
    }
}

/// Clamp the raw puzzle table into valid session settings.
fn session_settings(raw: &TomlPuzzle) -> SessionConfig {
    let word_length = raw.word_length.clamp(3, 12);
    if word_length != raw.word_length {
        eprintln!(
            "Warning: word_length {} out of range [3,12]; clamped to {word_length}.",
            raw.word_length
        );
    }
    let attempts = raw.attempts.max(1);
    if attempts != raw.attempts {
        eprintln!("Warning: attempts must be at least 1; using 1.");
    }
    SessionConfig {
        word_length,
        attempts,
        timer_seconds: raw.timer_seconds,
        max_resets: raw.max_resets,
    }
}

fn convert_object(raw: &TomlObject) -> Option<WorldObject> {
    let kind = match ObjectKind::parse(&raw.kind) {
        Some(kind) => kind,
        None => {
            eprintln!(
                "Warning: object '{}' has unknown kind '{}'; skipped.",
                raw.name, raw.kind
            );
            return None;
        }
    };
    Some(WorldObject {
        name: raw.name.clone(),
        kind,
        locked: raw.locked,
        puzzle_enabled: raw.enabled,
        puzzle_type: raw.puzzle.clone(),
    })
}

/// `#rrggbb` hex or one of a few terminal-friendly names.
fn parse_color(s: &str) -> Option<(u8, u8, u8)> {
    match s.to_ascii_lowercase().as_str() {
        "green" => return Some(DEFAULT_COLOR),
        "amber" => return Some((0xff, 0xb0, 0x00)),
        "blue" => return Some((0x4d, 0xb8, 0xff)),
        "white" => return Some((0xe8, 0xe8, 0xe8)),
        "red" => return Some((0xff, 0x4d, 0x4d)),
        _ => {}
    }
    let hex = s.strip_prefix('#')?;
    if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
    Some((r, g, b))
}

/// Candidate directories to search: exe dir + CWD (deduplicated).
fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![];

    if let Ok(exe) = std::env::current_exe() {
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            dirs.push(parent.to_path_buf());
        }
    }

    if let Ok(cwd) = std::env::current_dir() {
        if !dirs.iter().any(|d| d == &cwd) {
            dirs.push(cwd);
        }
    }

    if dirs.is_empty() {
        dirs.push(PathBuf::from("."));
    }

    dirs
}

/// Search for config.toml in candidate directories.
fn load_toml(search_dirs: &[PathBuf]) -> TomlConfig {
    for dir in search_dirs {
        let path = dir.join("config.toml");
        if path.exists() {
            match std::fs::read_to_string(&path) {
                Ok(text) => match toml::from_str::<TomlConfig>(&text) {
                    Ok(cfg) => return cfg,
                    Err(e) => {
                        eprintln!("Warning: config.toml parse error: {e}");
                        eprintln!("Using default settings.");
                        return TomlConfig::default();
                    }
                },
                Err(e) => {
                    eprintln!("Warning: could not read {}: {e}", path.display());
                }
            }
        }
    }
    TomlConfig::default()
}

/// Load the dictionary document, falling back to the built-in word list.
/// One word per line; blank lines and `#` comments are skipped.
fn load_words(search_dirs: &[PathBuf], words_file: &str) -> Vec<String> {
    let path = if PathBuf::from(words_file).is_absolute() {
        Some(PathBuf::from(words_file))
    } else {
        search_dirs
            .iter()
            .map(|d| d.join(words_file))
            .find(|p| p.is_file())
    };

    if let Some(path) = path {
        match std::fs::read_to_string(&path) {
            Ok(text) => {
                let words: Vec<String> = text
                    .lines()
                    .map(str::trim)
                    .filter(|l| !l.is_empty() && !l.starts_with('#'))
                    .map(str::to_string)
                    .collect();
                if !words.is_empty() {
                    return words;
                }
                eprintln!("Warning: {} has no usable words; using built-ins.", path.display());
            }
            Err(e) => {
                eprintln!("Warning: could not read {}: {e}; using built-ins.", path.display());
            }
        }
    }
    builtin_words()
}

fn builtin_words() -> Vec<String> {
    DEFAULT_WORDS.iter().map(|w| w.to_string()).collect()
}

/// Built-in dictionary, length 3 through 12.
const DEFAULT_WORDS: &[&str] = &[
    // 3
    "KEY", "ROD", "FAN", "BUS", "LAB", "HUB", "VAT", "PIN", "LOG", "RAM", "MAP", "BOX",
    // 4
    "DOOR", "LOCK", "CODE", "GRID", "DUCT", "PUMP", "WIRE", "BOLT", "CELL", "TANK",
    "COIL", "FUSE", "GEAR", "VENT",
    // 5
    "VAULT", "STEAM", "PIPES", "CARGO", "ALARM", "GUARD", "POWER", "RELAY", "SIREN",
    "CRANE", "TRACK", "LEVER", "PANEL", "VALVE", "MOTOR", "FENCE",
    // 6
    "ACCESS", "SYSTEM", "TUNNEL", "SENSOR", "SWITCH", "CIPHER", "ROUTER", "SOCKET",
    "BUNKER", "TURRET", "HANGAR", "LOCKER", "BEACON", "FILTER",
    // 7
    "CONNECT", "PROTECT", "MONITOR", "SESSION", "GATEWAY", "ARCHIVE", "TURBINE",
    "REACTOR", "AIRLOCK", "CONTROL", "CONSOLE", "NETWORK", "CASCADE", "DESCENT",
    "FREIGHT", "HALLWAY", "KEYCARD", "LOCKOUT", "OUTPOST", "PAYLOAD",
    // 8
    "OVERRIDE", "TERMINAL", "PASSWORD", "PROTOCOL", "SECURITY", "ELEVATOR",
    "FIREWALL", "DATABASE", "MAINLINE", "BULKHEAD", "CORRIDOR", "REGISTRY",
    "CAPACITY", "PRESSURE",
    // 9
    "GENERATOR", "HYDRAULIC", "MECHANISM", "PERIMETER", "INTERLOCK", "DETONATOR",
    "SUBSYSTEM", "WAREHOUSE",
    // 10
    "FOUNDATION", "GENERATORS", "COMPRESSOR", "WATCHTOWER",
    // 11
    "MAINTENANCE", "SWITCHBOARD", "ELECTRICITY",
    // 12
    "SUBSTRUCTURE", "TRANSFORMERS",
];

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn color_parses_hex_and_names() {
        assert_eq!(parse_color("#33ff66"), Some((0x33, 0xff, 0x66)));
        assert_eq!(parse_color("AMBER"), Some((0xff, 0xb0, 0x00)));
        assert_eq!(parse_color("#33ff6"), None);
        assert_eq!(parse_color("#33ff6g"), None);
        assert_eq!(parse_color("chartreuse"), None);
    }

    #[test]
    fn out_of_range_settings_are_clamped() {
        let raw = TomlPuzzle {
            word_length: 20,
            attempts: 0,
            timer_seconds: 0,
            max_resets: None,
            terminal_color: default_terminal_color(),
        };
        let s = session_settings(&raw);
        assert_eq!(s.word_length, 12);
        assert_eq!(s.attempts, 1);
    }

    #[test]
    fn builtin_dictionary_covers_the_default_length() {
        let n = DEFAULT_WORDS
            .iter()
            .filter(|w| w.chars().count() == default_word_length())
            .count();
        assert!(n >= 12, "only {n} built-in words of the default length");
    }

    #[test]
    fn builtin_dictionary_covers_every_legal_length() {
        for len in 3..=12 {
            assert!(
                DEFAULT_WORDS.iter().any(|w| w.chars().count() == len),
                "no built-in words of length {len}"
            );
        }
    }

    #[test]
    fn unknown_object_kind_is_skipped() {
        let raw = TomlObject {
            name: "Thing".into(),
            kind: "window".into(),
            puzzle: String::new(),
            enabled: true,
            locked: true,
        };
        assert!(convert_object(&raw).is_none());
    }

    #[test]
    fn objects_deserialize_with_defaults() {
        let cfg: TomlConfig = toml::from_str(
            r#"
            [[objects]]
            name = "Reactor Door"

            [[objects]]
            name = "Overseer"
            kind = "actor"
            enabled = false
            "#,
        )
        .unwrap();
        let objects: Vec<WorldObject> = cfg.objects.iter().filter_map(convert_object).collect();
        assert_eq!(objects.len(), 2);
        assert_eq!(objects[0].kind, ObjectKind::Door);
        assert!(objects[0].locked && objects[0].puzzle_enabled);
        assert_eq!(objects[1].kind, ObjectKind::Actor);
        assert!(!objects[1].puzzle_enabled);
    }
}
