use std::path::{Path, PathBuf};
use std::str::FromStr;

use indexmap::IndexMap;
use log::LevelFilter;
use serde::{Deserialize, Serialize};

use crate::resolve::OverrideTarget;
use crate::sources::SourceFlags;

/// Embedded default configuration.
const DEFAULT_CONFIG: &str = include_str!("../config.default.toml");

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("config parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("unknown log level {0:?}")]
    LogLevel(String),
}

// ── Final (merged) config types ──

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub settings: Settings,
    #[serde(default)]
    pub trigger: TriggerConfig,
    #[serde(default)]
    pub resolver: ResolverConfig,
    /// `signature -> project -> target` table for the static resolver.
    #[serde(default)]
    pub overrides: IndexMap<String, IndexMap<String, OverrideTarget>>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Settings {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Append match records to the match log.
    #[serde(default = "default_true")]
    pub log_matches: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_matches: true,
        }
    }
}

impl Settings {
    /// Parsed `log_level`.
    pub fn level_filter(&self) -> Result<LevelFilter, ConfigError> {
        LevelFilter::from_str(&self.log_level)
            .map_err(|_| ConfigError::LogLevel(self.log_level.clone()))
    }
}

/// Per-trigger policy and source selection.
///
/// `None` lists place no constraint. `Some(vec![])` is a configured, empty
/// list: an empty exclude list flags every signature or branch.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct TriggerConfig {
    #[serde(default)]
    pub include_branches: Option<Vec<String>>,
    #[serde(default)]
    pub exclude_branches: Option<Vec<String>>,
    #[serde(default)]
    pub include_signatures: Option<Vec<String>>,
    #[serde(default)]
    pub exclude_signatures: Option<Vec<String>>,
    #[serde(default = "default_true")]
    pub match_messages: bool,
    #[serde(default)]
    pub match_embeds: bool,
    #[serde(default)]
    pub match_visible_names: bool,
    #[serde(default)]
    pub match_usernames: bool,
    #[serde(default)]
    pub match_nicknames: bool,
    #[serde(default)]
    pub match_custom_status: bool,
}

impl Default for TriggerConfig {
    fn default() -> Self {
        Self {
            include_branches: None,
            exclude_branches: None,
            include_signatures: None,
            exclude_signatures: None,
            match_messages: true,
            match_embeds: false,
            match_visible_names: false,
            match_usernames: false,
            match_nicknames: false,
            match_custom_status: false,
        }
    }
}

impl TriggerConfig {
    pub fn source_flags(&self) -> SourceFlags {
        SourceFlags {
            messages: self.match_messages,
            embeds: self.match_embeds,
            visible_names: self.match_visible_names,
            usernames: self.match_usernames,
            nicknames: self.match_nicknames,
            custom_status: self.match_custom_status,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ResolverConfig {
    /// Metadata endpoint. Empty selects the static `[overrides]` table.
    #[serde(default)]
    pub endpoint: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "info".into()
}

fn default_timeout_secs() -> u64 {
    10
}

// ── Overlay types (user config that merges with defaults) ──

#[derive(Debug, Deserialize, Default)]
struct ConfigOverlay {
    #[serde(default)]
    settings: SettingsOverlay,
    #[serde(default)]
    trigger: TriggerOverlay,
    #[serde(default)]
    resolver: ResolverOverlay,
    #[serde(default)]
    overrides: IndexMap<String, IndexMap<String, OverrideTarget>>,
}

#[derive(Debug, Deserialize, Default)]
struct SettingsOverlay {
    log_level: Option<String>,
    log_matches: Option<bool>,
}

#[derive(Debug, Deserialize, Default)]
struct TriggerOverlay {
    #[serde(default)]
    replace: bool,
    include_branches: Option<Vec<String>>,
    exclude_branches: Option<Vec<String>>,
    include_signatures: Option<Vec<String>>,
    exclude_signatures: Option<Vec<String>>,
    #[serde(default)]
    remove_include_branches: Vec<String>,
    #[serde(default)]
    remove_exclude_branches: Vec<String>,
    #[serde(default)]
    remove_include_signatures: Vec<String>,
    #[serde(default)]
    remove_exclude_signatures: Vec<String>,
    match_messages: Option<bool>,
    match_embeds: Option<bool>,
    match_visible_names: Option<bool>,
    match_usernames: Option<bool>,
    match_nicknames: Option<bool>,
    match_custom_status: Option<bool>,
}

#[derive(Debug, Deserialize, Default)]
struct ResolverOverlay {
    endpoint: Option<String>,
    timeout_secs: Option<u64>,
}

// ── Merge logic ──

/// Merge a user list into an optional default list.
/// In replace mode: user list replaces the default entirely (absent clears it).
/// In merge mode: remove items first, then extend with additions (deduped).
/// Additions to an unset list make it a configured list.
fn merge_list(
    base: &mut Option<Vec<String>>,
    add: Option<Vec<String>>,
    remove: &[String],
    replace: bool,
) {
    if replace {
        *base = add;
        return;
    }
    if let Some(list) = base.as_mut() {
        list.retain(|item| !remove.contains(item));
    }
    if let Some(add) = add {
        let list = base.get_or_insert_with(Vec::new);
        for item in add {
            if !list.contains(&item) {
                list.push(item);
            }
        }
    }
}

fn override_flag(base: &mut bool, value: Option<bool>) {
    if let Some(v) = value {
        *base = v;
    }
}

impl Config {
    /// Load the default embedded configuration.
    pub fn default_config() -> Self {
        toml::from_str(DEFAULT_CONFIG).expect("embedded default config must parse")
    }

    /// Defaults with the given TOML overlay merged on top.
    pub fn from_toml_str(overlay: &str) -> Result<Self, ConfigError> {
        let overlay: ConfigOverlay = toml::from_str(overlay)?;
        let mut config = Self::default_config();
        config.apply_overlay(overlay);
        Ok(config)
    }

    /// Defaults with the overlay file at `path` merged on top.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Load configuration with resolution order:
    /// 1. Start with embedded defaults
    /// 2. Merge user overlay from ~/.config/override-trigger/config.toml (if exists)
    ///
    /// A broken user file is reported on stderr and ignored. Called before
    /// the logger is installed.
    pub fn load() -> Self {
        let Some(home) = std::env::var_os("HOME") else {
            return Self::default_config();
        };
        match Self::load_from(Path::new(&home)) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("override-trigger: ignoring user config: {e}");
                Self::default_config()
            }
        }
    }

    /// Defaults merged with `<home>/.config/override-trigger/config.toml`.
    /// A missing file is not an error.
    pub fn load_from(home: &Path) -> Result<Self, ConfigError> {
        let path = home.join(".config/override-trigger/config.toml");
        if !path.exists() {
            return Ok(Self::default_config());
        }
        Self::from_path(&path)
    }

    /// Apply an overlay on top of this config (merge semantics).
    fn apply_overlay(&mut self, overlay: ConfigOverlay) {
        let s = overlay.settings;
        if let Some(v) = s.log_level {
            self.settings.log_level = v;
        }
        override_flag(&mut self.settings.log_matches, s.log_matches);

        let t = overlay.trigger;
        let trigger = &mut self.trigger;
        merge_list(
            &mut trigger.include_branches,
            t.include_branches,
            &t.remove_include_branches,
            t.replace,
        );
        merge_list(
            &mut trigger.exclude_branches,
            t.exclude_branches,
            &t.remove_exclude_branches,
            t.replace,
        );
        merge_list(
            &mut trigger.include_signatures,
            t.include_signatures,
            &t.remove_include_signatures,
            t.replace,
        );
        merge_list(
            &mut trigger.exclude_signatures,
            t.exclude_signatures,
            &t.remove_exclude_signatures,
            t.replace,
        );
        override_flag(&mut trigger.match_messages, t.match_messages);
        override_flag(&mut trigger.match_embeds, t.match_embeds);
        override_flag(&mut trigger.match_visible_names, t.match_visible_names);
        override_flag(&mut trigger.match_usernames, t.match_usernames);
        override_flag(&mut trigger.match_nicknames, t.match_nicknames);
        override_flag(&mut trigger.match_custom_status, t.match_custom_status);

        let r = overlay.resolver;
        if let Some(v) = r.endpoint {
            self.resolver.endpoint = v;
        }
        if let Some(v) = r.timeout_secs {
            self.resolver.timeout_secs = v;
        }

        // Per-signature tables replace whole entries
        self.overrides.extend(overlay.overrides);
    }
}
