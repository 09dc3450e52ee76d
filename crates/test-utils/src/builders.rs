#![allow(dead_code)]

use std::collections::BTreeMap;
use std::path::PathBuf;

use assetwatch::config::{
    ConfigFile, ConfigSection, DataValue, LoaderConfig, LoaderKindConfig, LoaderRef,
    RawConfigFile, WatchSection,
};
use assetwatch::types::BatchFailurePolicy;

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile {
                config: ConfigSection::default(),
                watch: WatchSection::default(),
                loaders: Vec::new(),
            },
        }
    }

    pub fn with_loader(mut self, loader: LoaderConfig) -> Self {
        self.config.loaders.push(loader);
        self
    }

    pub fn on_error(mut self, policy: BatchFailurePolicy) -> Self {
        self.config.config.on_error = policy;
        self
    }

    pub fn debounce_ms(mut self, ms: u64) -> Self {
        self.config.config.debounce_ms = ms;
        self
    }

    pub fn watch_pattern(mut self, pattern: &str) -> Self {
        self.config
            .watch
            .patterns
            .get_or_insert_with(Vec::new)
            .push(pattern.to_string());
        self
    }

    pub fn ignore(mut self, pattern: &str) -> Self {
        self.config.watch.ignore = Some(pattern.to_string());
        self
    }

    /// The unvalidated config, for tests that expect validation to fail.
    pub fn build_raw(self) -> RawConfigFile {
        self.config
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for one `[[loader]]` entry.
pub struct LoaderConfigBuilder {
    loader: LoaderConfig,
}

impl LoaderConfigBuilder {
    fn with_kind(name: &str, kind: LoaderKindConfig) -> Self {
        Self {
            loader: LoaderConfig {
                name: name.to_string(),
                top_level: true,
                kind,
                rest: BTreeMap::new(),
            },
        }
    }

    pub fn font(name: &str, source: &str) -> Self {
        Self::with_kind(
            name,
            LoaderKindConfig::Font {
                source: source.to_string(),
                output: None,
            },
        )
    }

    pub fn image(name: &str, source: &str) -> Self {
        Self::with_kind(
            name,
            LoaderKindConfig::Image {
                source: source.to_string(),
                scss_output: None,
                json_output: None,
                map_name: "images".to_string(),
            },
        )
    }

    pub fn style(name: &str, entry: &str) -> Self {
        Self::with_kind(
            name,
            LoaderKindConfig::Style {
                entry: entry.to_string(),
                output: None,
                compiler: None,
                extensions: Vec::new(),
            },
        )
    }

    pub fn template(name: &str, entry: &str) -> Self {
        Self::with_kind(
            name,
            LoaderKindConfig::Template {
                entry: entry.to_string(),
                output: None,
                data: Default::default(),
            },
        )
    }

    /// Only reachable through composition.
    pub fn composed_only(mut self) -> Self {
        self.loader.top_level = false;
        self
    }

    /// Main output; for image loaders this is the SCSS manifest.
    pub fn output(mut self, path: &str) -> Self {
        let path = Some(PathBuf::from(path));
        match &mut self.loader.kind {
            LoaderKindConfig::Font { output, .. }
            | LoaderKindConfig::Style { output, .. }
            | LoaderKindConfig::Template { output, .. } => *output = path,
            LoaderKindConfig::Image { scss_output, .. } => *scss_output = path,
        }
        self
    }

    pub fn json_output(mut self, path: &str) -> Self {
        if let LoaderKindConfig::Image { json_output, .. } = &mut self.loader.kind {
            *json_output = Some(PathBuf::from(path));
        }
        self
    }

    pub fn compiler(mut self, command: &[&str]) -> Self {
        if let LoaderKindConfig::Style { compiler, .. } = &mut self.loader.kind {
            *compiler = Some(command.iter().map(|s| s.to_string()).collect());
        }
        self
    }

    pub fn data_text(self, key: &str, value: &str) -> Self {
        self.data(key, DataValue::Text(value.to_string()))
    }

    pub fn data_ref(self, key: &str, target: &str) -> Self {
        self.data(
            key,
            DataValue::Ref(LoaderRef {
                target: target.to_string(),
            }),
        )
    }

    fn data(mut self, key: &str, value: DataValue) -> Self {
        if let LoaderKindConfig::Template { data, .. } = &mut self.loader.kind {
            data.insert(key.to_string(), value);
        }
        self
    }

    pub fn build(self) -> LoaderConfig {
        self.loader
    }
}
