// src/config/validate.rs

use std::collections::HashSet;

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;

use crate::config::model::{ConfigFile, LoaderKindConfig, RawConfigFile};
use crate::errors::{AssetwatchError, Result};
use crate::loader::pattern::compile_glob;

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = AssetwatchError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw.config, raw.watch, raw.loaders))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    ensure_has_loaders(cfg)?;
    validate_names(cfg)?;
    validate_references(cfg)?;
    validate_composition(cfg)?;
    validate_loader_settings(cfg)?;
    validate_watch(cfg)?;
    Ok(())
}

fn ensure_has_loaders(cfg: &RawConfigFile) -> Result<()> {
    if cfg.loaders.is_empty() {
        return Err(AssetwatchError::ConfigError(
            "config must contain at least one [[loader]] entry".to_string(),
        ));
    }
    if !cfg.loaders.iter().any(|l| l.top_level) {
        return Err(AssetwatchError::ConfigError(
            "at least one loader must be top-level (top_level = true)".to_string(),
        ));
    }
    Ok(())
}

fn validate_names(cfg: &RawConfigFile) -> Result<()> {
    let mut seen = HashSet::new();
    for loader in &cfg.loaders {
        if loader.name.trim().is_empty() {
            return Err(AssetwatchError::ConfigError(
                "loader names must not be empty".to_string(),
            ));
        }
        if !seen.insert(loader.name.as_str()) {
            return Err(AssetwatchError::ConfigError(format!(
                "duplicate loader name '{}'",
                loader.name
            )));
        }
    }
    Ok(())
}

fn validate_references(cfg: &RawConfigFile) -> Result<()> {
    for loader in &cfg.loaders {
        for target in loader.references() {
            if !cfg.loaders.iter().any(|l| l.name == target) {
                return Err(AssetwatchError::UnknownLoader(format!(
                    "'{target}' (referenced by loader '{}')",
                    loader.name
                )));
            }
            if target == loader.name {
                return Err(AssetwatchError::CompositionCycle(format!(
                    "loader '{}' cannot compose itself",
                    loader.name
                )));
            }
        }
    }
    Ok(())
}

fn validate_composition(cfg: &RawConfigFile) -> Result<()> {
    // Edge direction: composing loader -> composed loader.
    let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();

    for loader in &cfg.loaders {
        graph.add_node(loader.name.as_str());
    }
    for loader in &cfg.loaders {
        for target in loader.references() {
            graph.add_edge(loader.name.as_str(), target, ());
        }
    }

    match toposort(&graph, None) {
        Ok(_order) => Ok(()),
        Err(cycle) => Err(AssetwatchError::CompositionCycle(format!(
            "cycle detected in loader composition involving '{}'",
            cycle.node_id()
        ))),
    }
}

fn validate_loader_settings(cfg: &RawConfigFile) -> Result<()> {
    for loader in &cfg.loaders {
        let unknown = loader.unknown_settings();
        if unknown.contains(&"data") {
            return Err(AssetwatchError::ConfigError(format!(
                "loader '{}': data is only allowed on template loaders (kind = \"{}\")",
                loader.name,
                loader.kind.kind_name()
            )));
        }
        if !unknown.is_empty() {
            return Err(AssetwatchError::ConfigError(format!(
                "loader '{}': unknown setting(s) {} for kind \"{}\"",
                loader.name,
                unknown.join(", "),
                loader.kind.kind_name()
            )));
        }
        for pattern in loader.patterns() {
            compile_glob(pattern)?;
        }
        match &loader.kind {
            LoaderKindConfig::Style {
                compiler: Some(cmd),
                ..
            } if cmd.is_empty() => {
                return Err(AssetwatchError::ConfigError(format!(
                    "loader '{}': compiler must name a program",
                    loader.name
                )));
            }
            LoaderKindConfig::Image { map_name, .. } if map_name.trim().is_empty() => {
                return Err(AssetwatchError::ConfigError(format!(
                    "loader '{}': map_name must not be empty",
                    loader.name
                )));
            }
            _ => {}
        }
    }
    Ok(())
}

fn validate_watch(cfg: &RawConfigFile) -> Result<()> {
    if let Some(patterns) = &cfg.watch.patterns {
        if patterns.is_empty() {
            return Err(AssetwatchError::ConfigError(
                "[watch].patterns must not be empty when given".to_string(),
            ));
        }
        for pattern in patterns {
            compile_glob(pattern)?;
        }
    }
    if let Some(ignore) = &cfg.watch.ignore {
        compile_glob(ignore)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::loader::load_from_str;

    fn validate(toml: &str) -> Result<ConfigFile> {
        ConfigFile::try_from(load_from_str(toml)?)
    }

    const TWO_TEMPLATES: &str = r#"
        [[loader]]
        name = "a"
        kind = "template"
        entry = "a.html"
        data = { b = { ref = "b" } }

        [[loader]]
        name = "b"
        kind = "template"
        entry = "b.html"
        top_level = false
        data = { a = { ref = "a" } }
    "#;

    #[test]
    fn composition_cycle_is_rejected() {
        let err = validate(TWO_TEMPLATES).unwrap_err();
        assert!(matches!(err, AssetwatchError::CompositionCycle(_)), "{err:?}");
    }

    #[test]
    fn unknown_reference_is_rejected() {
        let err = validate(
            r#"
            [[loader]]
            name = "page"
            kind = "template"
            entry = "index.html"
            data = { css = { ref = "styles" } }
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, AssetwatchError::UnknownLoader(_)), "{err:?}");
    }

    #[test]
    fn empty_config_and_no_top_level_are_rejected() {
        assert!(matches!(
            validate(""),
            Err(AssetwatchError::ConfigError(_))
        ));
        assert!(matches!(
            validate(
                r#"
                [[loader]]
                name = "fonts"
                kind = "font"
                source = "fonts/*"
                top_level = false
                "#
            ),
            Err(AssetwatchError::ConfigError(_))
        ));
    }

    #[test]
    fn duplicate_names_and_bad_globs_are_rejected() {
        assert!(matches!(
            validate(
                r#"
                [[loader]]
                name = "x"
                kind = "font"
                source = "fonts/*"
                [[loader]]
                name = "x"
                kind = "image"
                source = "img/*"
                "#
            ),
            Err(AssetwatchError::ConfigError(_))
        ));
        assert!(matches!(
            validate(
                r#"
                [[loader]]
                name = "x"
                kind = "font"
                source = "fonts/[*"
                "#
            ),
            Err(AssetwatchError::Pattern { .. })
        ));
    }

    #[test]
    fn data_on_a_font_loader_is_rejected() {
        let err = validate(
            r#"
            [[loader]]
            name = "fonts"
            kind = "font"
            source = "fonts/*"
            data = { title = "x" }
            "#,
        )
        .unwrap_err();
        match err {
            AssetwatchError::ConfigError(msg) => {
                assert!(msg.contains("only allowed on template loaders"), "{msg}")
            }
            other => panic!("expected ConfigError, got {other:?}"),
        }
    }

    #[test]
    fn misspelled_settings_are_rejected() {
        let err = validate(
            r#"
            [[loader]]
            name = "css"
            kind = "style"
            entry = "main.css"
            ouput = "build/main.css"
            "#,
        )
        .unwrap_err();
        assert!(matches!(&err, AssetwatchError::ConfigError(m) if m.contains("ouput")), "{err:?}");
    }

    #[test]
    fn dot_slash_and_absolute_globs() {
        assert!(validate(
            r#"
            [watch]
            ignore = "./build/**"

            [[loader]]
            name = "fonts"
            kind = "font"
            source = "./fonts/*"
            "#,
        )
        .is_ok());
        assert!(matches!(
            validate(
                r#"
                [[loader]]
                name = "fonts"
                kind = "font"
                source = "/abs/fonts/*"
                "#,
            ),
            Err(AssetwatchError::ConfigError(_))
        ));
    }

    #[test]
    fn empty_compiler_is_rejected() {
        assert!(matches!(
            validate(
                r#"
                [[loader]]
                name = "css"
                kind = "style"
                entry = "main.scss"
                compiler = []
                "#
            ),
            Err(AssetwatchError::ConfigError(_))
        ));
    }
}
