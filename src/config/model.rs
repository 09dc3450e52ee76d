// src/config/model.rs

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Deserialize;

use crate::types::BatchFailurePolicy;

/// Configuration exactly as deserialized from TOML, before validation.
///
/// ```toml
/// [config]
/// on_error = "fail_fast"
/// debounce_ms = 0
///
/// [watch]
/// ignore = "build/**"
///
/// [[loader]]
/// name = "fonts"
/// kind = "font"
/// source = "assets/fonts/*"
/// output = "build/_fonts.scss"
/// ```
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawConfigFile {
    #[serde(default)]
    pub config: ConfigSection,

    #[serde(default)]
    pub watch: WatchSection,

    /// `[[loader]]` entries, in declaration order.
    #[serde(default, rename = "loader")]
    pub loaders: Vec<LoaderConfig>,
}

/// Validated configuration. Obtain one with `ConfigFile::try_from(raw)`.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub config: ConfigSection,
    pub watch: WatchSection,
    pub loaders: Vec<LoaderConfig>,
}

impl ConfigFile {
    /// Wrap already-validated parts.
    pub(crate) fn new_unchecked(
        config: ConfigSection,
        watch: WatchSection,
        loaders: Vec<LoaderConfig>,
    ) -> Self {
        Self {
            config,
            watch,
            loaders,
        }
    }

    pub fn loader(&self, name: &str) -> Option<&LoaderConfig> {
        self.loaders.iter().find(|l| l.name == name)
    }

    pub fn top_level(&self) -> impl Iterator<Item = &LoaderConfig> {
        self.loaders.iter().filter(|l| l.top_level)
    }
}

/// `[config]` section.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ConfigSection {
    /// `"fail_fast"` (default) or `"continue"`.
    #[serde(default)]
    pub on_error: BatchFailurePolicy,

    /// Coalescing window for watch events; `0` runs one pass per event.
    #[serde(default)]
    pub debounce_ms: u64,
}

/// `[watch]` section.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct WatchSection {
    /// Globs to observe. When absent, every loader's input paths are watched.
    #[serde(default)]
    pub patterns: Option<Vec<String>>,

    /// Events for paths matching this glob are dropped.
    #[serde(default)]
    pub ignore: Option<String>,
}

fn default_top_level() -> bool {
    true
}

/// One `[[loader]]` entry.
#[derive(Debug, Clone, Deserialize)]
pub struct LoaderConfig {
    pub name: String,

    /// Top-level loaders run on every pass; others only through composition.
    #[serde(default = "default_top_level")]
    pub top_level: bool,

    #[serde(flatten)]
    pub kind: LoaderKindConfig,

    /// Every remaining key of the entry. Validation rejects the ones `kind`
    /// does not define, such as `data` on a font loader.
    #[serde(flatten)]
    pub rest: BTreeMap<String, toml::Value>,
}

impl LoaderConfig {
    /// Names of the loaders this entry composes, in slot order.
    pub fn references(&self) -> Vec<&str> {
        match &self.kind {
            LoaderKindConfig::Template { data, .. } => data
                .values()
                .filter_map(|v| match v {
                    DataValue::Ref(r) => Some(r.target.as_str()),
                    _ => None,
                })
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Keys of this entry that its kind does not define, sorted.
    pub fn unknown_settings(&self) -> Vec<&str> {
        let known = self.kind.setting_names();
        self.rest
            .keys()
            .map(String::as_str)
            .filter(|key| *key != "kind" && !known.contains(key))
            .collect()
    }

    /// Source globs and entry paths named in this entry.
    pub fn patterns(&self) -> Vec<&str> {
        match &self.kind {
            LoaderKindConfig::Font { source, .. } | LoaderKindConfig::Image { source, .. } => {
                vec![source.as_str()]
            }
            LoaderKindConfig::Style { entry, .. } | LoaderKindConfig::Template { entry, .. } => {
                vec![entry.as_str()]
            }
        }
    }
}

fn default_map_name() -> String {
    "images".to_string()
}

/// Loader variant, selected by the `kind` key.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum LoaderKindConfig {
    Font {
        source: String,
        #[serde(default)]
        output: Option<PathBuf>,
    },
    Image {
        source: String,
        #[serde(default)]
        scss_output: Option<PathBuf>,
        #[serde(default)]
        json_output: Option<PathBuf>,
        /// Name of the stylesheet map holding every image.
        #[serde(default = "default_map_name")]
        map_name: String,
    },
    Style {
        entry: String,
        #[serde(default)]
        output: Option<PathBuf>,
        /// Program and arguments; `{entry}` is replaced with the entry path.
        /// Absent means the entry is copied through unchanged.
        #[serde(default)]
        compiler: Option<Vec<String>>,
        #[serde(default)]
        extensions: Vec<String>,
    },
    Template {
        entry: String,
        #[serde(default)]
        output: Option<PathBuf>,
        #[serde(default)]
        data: BTreeMap<String, DataValue>,
    },
}

impl LoaderKindConfig {
    /// Value of the `kind` key.
    pub fn kind_name(&self) -> &'static str {
        match self {
            LoaderKindConfig::Font { .. } => "font",
            LoaderKindConfig::Image { .. } => "image",
            LoaderKindConfig::Style { .. } => "style",
            LoaderKindConfig::Template { .. } => "template",
        }
    }

    /// Keys this kind accepts besides `name`, `kind` and `top_level`.
    pub fn setting_names(&self) -> &'static [&'static str] {
        match self {
            LoaderKindConfig::Font { .. } => &["source", "output"],
            LoaderKindConfig::Image { .. } => {
                &["source", "scss_output", "json_output", "map_name"]
            }
            LoaderKindConfig::Style { .. } => &["entry", "output", "compiler", "extensions"],
            LoaderKindConfig::Template { .. } => &["entry", "output", "data"],
        }
    }
}

/// A template slot value: `{ ref = "name" }`, a string, or a table of strings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum DataValue {
    Ref(LoaderRef),
    Text(String),
    Map(BTreeMap<String, String>),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoaderRef {
    #[serde(rename = "ref")]
    pub target: String,
}
