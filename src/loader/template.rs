// src/loader/template.rs

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock};

use anyhow::{anyhow, bail};
use regex::{Captures, Regex};
use tracing::debug;

use crate::change::ResultCache;
use crate::errors::{AssetwatchError, Result};
use crate::loader::graph::Slot;
use crate::loader::pattern::SourcePattern;
use crate::loader::{LoadContext, Output};

/// Renders a template string against resolved slot values.
pub trait TemplateEngine: Send + Sync + fmt::Debug {
    fn render(&self, template: &str, context: &BTreeMap<String, Output>) -> anyhow::Result<String>;
}

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{\s*([A-Za-z0-9_]+)(?:\.([A-Za-z0-9_]+))?\s*\}\}")
        .expect("placeholder regex is valid")
});

/// Minimal `{{ key }}` / `{{ key.field }}` substitution.
///
/// - text values are inserted verbatim, empty values as nothing;
/// - `{{ key.field }}` looks up one entry of a map value;
/// - a bare map value is inserted as a JSON object;
/// - unknown keys or fields fail the render.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlaceholderEngine;

impl TemplateEngine for PlaceholderEngine {
    fn render(&self, template: &str, context: &BTreeMap<String, Output>) -> anyhow::Result<String> {
        let mut failure = None;
        let rendered = PLACEHOLDER.replace_all(template, |caps: &Captures<'_>| {
            match substitute(caps, context) {
                Ok(s) => s,
                Err(e) => {
                    failure.get_or_insert(e);
                    String::new()
                }
            }
        });
        match failure {
            Some(e) => Err(e),
            None => Ok(rendered.into_owned()),
        }
    }
}

fn substitute(caps: &Captures<'_>, context: &BTreeMap<String, Output>) -> anyhow::Result<String> {
    let key = &caps[1];
    let value = context
        .get(key)
        .ok_or_else(|| anyhow!("unknown template variable '{key}'"))?;

    match (value, caps.get(2).map(|m| m.as_str())) {
        (Output::Empty, None) => Ok(String::new()),
        (Output::Text(s), None) => Ok(s.clone()),
        (Output::Map(map), None) => Ok(serde_json::to_string(map)?),
        (Output::Map(map), Some(field)) => map
            .get(field)
            .cloned()
            .ok_or_else(|| anyhow!("'{key}' has no entry '{field}'")),
        (_, Some(field)) => bail!("'{key}' is not a map; cannot read '{field}'"),
    }
}

/// Renders one template file with named slots.
///
/// Slots are either literal values or other loaders; loader slots are
/// resolved by the graph before every render, with the same change
/// descriptor. The render itself is never cached.
pub struct TemplateLoader {
    entry: SourcePattern,
    output: Option<PathBuf>,
    slots: BTreeMap<String, Slot>,
    engine: Arc<dyn TemplateEngine>,
}

impl fmt::Debug for TemplateLoader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TemplateLoader")
            .field("entry", &self.entry)
            .field("output", &self.output)
            .field("slots", &self.slots)
            .finish_non_exhaustive()
    }
}

impl TemplateLoader {
    pub fn new(entry: SourcePattern, output: Option<PathBuf>, engine: Arc<dyn TemplateEngine>) -> Self {
        Self {
            entry,
            output,
            slots: BTreeMap::new(),
            engine,
        }
    }

    pub fn entry(&self) -> &SourcePattern {
        &self.entry
    }

    pub fn output(&self) -> Option<&PathBuf> {
        self.output.as_ref()
    }

    pub fn slots(&self) -> &BTreeMap<String, Slot> {
        &self.slots
    }

    pub(crate) fn set_slot(&mut self, key: String, slot: Slot) -> Option<Slot> {
        self.slots.insert(key, slot)
    }

    /// Slot values when every slot is a literal; `None` if any slot is a loader.
    pub(crate) fn literal_slots(&self) -> Option<BTreeMap<String, Output>> {
        self.slots
            .iter()
            .map(|(key, slot)| match slot {
                Slot::Literal(value) => Some((key.clone(), value.clone())),
                Slot::Loader(_) => None,
            })
            .collect()
    }

    pub(crate) fn recompute(
        &self,
        loader: &str,
        ctx: &LoadContext,
        cache: &mut ResultCache,
        slots: &BTreeMap<String, Output>,
    ) -> Result<Output> {
        let entry_path = ctx.resolve(Path::new(self.entry.as_str()));
        if !ctx.fs().is_file(&entry_path) {
            debug!(entry = self.entry.as_str(), "template entry not found");
            return Ok(Output::Empty);
        }

        let bytes = ctx.read_input(cache, &entry_path)?;
        let template = String::from_utf8(bytes)
            .map_err(|e| AssetwatchError::compile(loader, format!("template is not UTF-8: {e}")))?;

        let html = self
            .engine
            .render(&template, slots)
            .map_err(|e| AssetwatchError::compile(loader, format!("{e:#}")))?;

        if let Some(target) = &self.output {
            ctx.write_output(target, html.as_bytes())?;
        }
        Ok(Output::Text(html))
    }
}
