use std::{collections::HashMap, fs, path::Path, time::Duration};

use anyhow::{bail, Context};
use serde::{de::Visitor, Deserialize};
use winit::keyboard::{self, NamedKey};

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub window: WindowConfig,
    #[serde(default)]
    pub sync: SyncConfig,
    #[serde(default = "default_bindings")]
    pub bind: HashMap<Key, CommandVerb>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            window: WindowConfig::default(),
            sync: SyncConfig::default(),
            bind: default_bindings(),
        }
    }
}

impl Config {
    pub fn load<A: AsRef<Path>>(path: A) -> anyhow::Result<Self> {
        Self::load_impl(path.as_ref())
    }

    fn load_impl(path: &Path) -> anyhow::Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read config from `{}`", path.display()))?;
        let config = Self::parse(&contents)?;
        log::info!("loaded config from `{}`", path.display());
        Ok(config)
    }

    fn parse(contents: &str) -> anyhow::Result<Self> {
        let config: Self = toml::from_str(contents)?;

        // Validate configuration.
        // - The initial canvas can't be empty.
        // - Flushing with no delay would spin the event loop.

        let WindowConfig { width, height, .. } = config.window;
        if width == 0 || height == 0 {
            bail!("window size must be non-zero (got {width}x{height})");
        }
        if config.sync.interval_ms == 0 {
            bail!("`sync.interval_ms` must be non-zero");
        }

        Ok(config)
    }
}

#[derive(Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "wasm draw".into(),
            width: 800,
            height: 600,
        }
    }
}

#[derive(Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SyncConfig {
    /// How often newly drawn commands are handed to the transport.
    pub interval_ms: u64,
}

impl SyncConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self { interval_ms: 50 }
    }
}

fn default_bindings() -> HashMap<Key, CommandVerb> {
    HashMap::from([
        (Key::Char('l'), CommandVerb::ToolLine),
        (Key::Char('c'), CommandVerb::ToolCircle),
        (Key::Char('s'), CommandVerb::ToolSquare),
        (Key::Named(NamedKey::Delete), CommandVerb::Clear),
    ])
}

/// A key that can be bound to an action: a single character (case-insensitive) or one of a few
/// named keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Key {
    Char(char),
    Named(NamedKey),
}

impl Key {
    /// Converts a key reported by winit, if it is one that can be bound.
    pub fn from_winit(key: &keyboard::Key) -> Option<Self> {
        match key {
            keyboard::Key::Named(named) => Some(Key::Named(*named)),
            keyboard::Key::Character(s) => {
                let mut chars = s.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Some(Key::Char(c.to_ascii_lowercase())),
                    _ => None,
                }
            }
            _ => None,
        }
    }

    fn parse(s: &str) -> Option<Self> {
        let mut chars = s.chars();
        if let (Some(c), None) = (chars.next(), chars.next()) {
            return Some(Key::Char(c.to_ascii_lowercase()));
        }
        let named = match s {
            "Escape" => NamedKey::Escape,
            "Delete" => NamedKey::Delete,
            "Backspace" => NamedKey::Backspace,
            "Space" => NamedKey::Space,
            "Enter" => NamedKey::Enter,
            "Tab" => NamedKey::Tab,
            _ => return None,
        };
        Some(Key::Named(named))
    }
}

impl<'a> Deserialize<'a> for Key {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'a>,
    {
        struct FromStrVisitor;

        impl<'de> Visitor<'de> for FromStrVisitor {
            type Value = Key;

            fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
                formatter.write_str("a single character or a key name")
            }

            fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                Key::parse(v).ok_or_else(|| E::custom(format_args!("invalid key name '{v}'")))
            }
        }

        deserializer.deserialize_str(FromStrVisitor)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum CommandVerb {
    #[serde(rename = "TOOL_LINE")]
    ToolLine,
    #[serde(rename = "TOOL_CIRCLE")]
    ToolCircle,
    #[serde(rename = "TOOL_SQUARE")]
    ToolSquare,
    #[serde(rename = "CLEAR")]
    Clear,
}
