// src/loader/graph.rs

use std::collections::{BTreeMap, HashSet};

use petgraph::algo::has_path_connecting;
use petgraph::graphmap::DiGraphMap;
use tracing::{debug, debug_span};

use crate::change::ChangeDescriptor;
use crate::errors::{AssetwatchError, Result};
use crate::loader::{LoadContext, Loader, LoaderKind, Output};

/// Handle to a loader stored in a [`LoaderGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LoaderId(usize);

impl LoaderId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Value bound to a template slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Slot {
    Literal(Output),
    /// Another loader in the same graph; loaded with the parent's descriptor.
    Loader(LoaderId),
}

/// All loaders of a build plus their composition edges.
///
/// The graph owns every loader; composition only stores ids, so one child can
/// be shared by several templates. Edges point from the composing loader to
/// the composed one and are kept acyclic at bind time.
#[derive(Debug, Default)]
pub struct LoaderGraph {
    loaders: Vec<Loader>,
    edges: DiGraphMap<usize, ()>,
}

impl LoaderGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.loaders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.loaders.is_empty()
    }

    /// Add a loader; names must be unique within a graph.
    pub fn add(&mut self, loader: Loader) -> Result<LoaderId> {
        if self.id_of(loader.name()).is_some() {
            return Err(AssetwatchError::ConfigError(format!(
                "duplicate loader name '{}'",
                loader.name()
            )));
        }
        let id = self.loaders.len();
        self.edges.add_node(id);
        self.loaders.push(loader);
        Ok(LoaderId(id))
    }

    pub fn get(&self, id: LoaderId) -> Option<&Loader> {
        self.loaders.get(id.0)
    }

    pub fn id_of(&self, name: &str) -> Option<LoaderId> {
        self.loaders
            .iter()
            .position(|l| l.name() == name)
            .map(LoaderId)
    }

    pub fn iter(&self) -> impl Iterator<Item = (LoaderId, &Loader)> {
        self.loaders.iter().enumerate().map(|(i, l)| (LoaderId(i), l))
    }

    /// Loaders directly composed by `id`.
    pub fn children_of(&self, id: LoaderId) -> Vec<LoaderId> {
        let mut children: Vec<LoaderId> = self
            .edges
            .neighbors(id.0)
            .map(LoaderId)
            .collect();
        children.sort();
        children
    }

    /// Bind `key` on template loader `parent`.
    ///
    /// Binding a loader that (transitively) composes `parent` is rejected as a
    /// cycle. Rebinding a key replaces its previous value.
    pub fn bind(&mut self, parent: LoaderId, key: impl Into<String>, slot: Slot) -> Result<()> {
        let key = key.into();
        let parent_name = self.name_of(parent)?.to_string();

        if let Slot::Loader(child) = slot {
            let child_name = self.name_of(child)?.to_string();
            if child == parent || has_path_connecting(&self.edges, child.0, parent.0, None) {
                return Err(AssetwatchError::CompositionCycle(format!(
                    "binding '{child_name}' into '{parent_name}' (slot '{key}') closes a cycle"
                )));
            }
        }

        let LoaderKind::Template(template) = self.loaders[parent.0].kind_mut() else {
            return Err(AssetwatchError::ConfigError(format!(
                "loader '{parent_name}' is not a template; only templates have slots"
            )));
        };
        let previous = template.set_slot(key.clone(), slot.clone());

        if let Some(Slot::Loader(old)) = previous {
            let still_used = template
                .slots()
                .values()
                .any(|s| *s == Slot::Loader(old));
            if !still_used {
                self.edges.remove_edge(parent.0, old.0);
            }
        }
        if let Slot::Loader(child) = slot {
            self.edges.add_edge(parent.0, child.0, ());
        }

        debug!(loader = %parent_name, slot = %key, "bound template slot");
        Ok(())
    }

    /// Load `id`, resolving composed loaders depth-first with the same descriptor.
    pub fn load(
        &mut self,
        ctx: &LoadContext,
        id: LoaderId,
        descriptor: Option<&ChangeDescriptor>,
    ) -> Result<Output> {
        let name = self.name_of(id)?.to_string();
        let _span = debug_span!("load", loader = %name).entered();

        let slots = match self.loaders[id.0].kind() {
            LoaderKind::Template(t) => t.slots().clone(),
            _ => BTreeMap::new(),
        };

        let mut resolved = BTreeMap::new();
        for (key, slot) in slots {
            let value = match slot {
                Slot::Literal(value) => value,
                Slot::Loader(child) => self.load(ctx, child, descriptor)?,
            };
            resolved.insert(key, value);
        }

        self.loaders[id.0].load_with(ctx, descriptor, &resolved)
    }

    /// Patterns `id` depends on, including every composed loader's, without
    /// duplicates and in first-seen order.
    pub fn input_paths(&self, id: LoaderId) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        self.collect_input_paths(id, &mut seen, &mut out);
        out
    }

    fn collect_input_paths(&self, id: LoaderId, seen: &mut HashSet<String>, out: &mut Vec<String>) {
        let Some(loader) = self.get(id) else {
            return;
        };
        for path in loader.kind().own_input_paths() {
            if seen.insert(path.clone()) {
                out.push(path);
            }
        }
        if let LoaderKind::Template(t) = loader.kind() {
            for slot in t.slots().values() {
                if let Slot::Loader(child) = slot {
                    self.collect_input_paths(*child, seen, out);
                }
            }
        }
    }

    fn name_of(&self, id: LoaderId) -> Result<&str> {
        self.get(id)
            .map(Loader::name)
            .ok_or_else(|| AssetwatchError::UnknownLoader(format!("#{}", id.0)))
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::sync::Arc;

    use super::*;
    use crate::change::Blake3Fingerprinter;
    use crate::fs::mock::MockFileSystem;
    use crate::loader::{FontLoader, PlaceholderEngine, SourcePattern, TemplateLoader};

    fn template(name: &str, entry: &str) -> Loader {
        Loader::new(
            name,
            LoaderKind::Template(TemplateLoader::new(
                SourcePattern::new(entry).unwrap(),
                None,
                Arc::new(PlaceholderEngine),
            )),
        )
    }

    fn font(name: &str) -> Loader {
        Loader::new(
            name,
            LoaderKind::Font(FontLoader::new(SourcePattern::new("fonts/*").unwrap(), None)),
        )
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let mut graph = LoaderGraph::new();
        graph.add(font("fonts")).unwrap();
        assert!(matches!(
            graph.add(font("fonts")),
            Err(AssetwatchError::ConfigError(_))
        ));
    }

    #[test]
    fn cycles_are_rejected_at_bind_time() {
        let mut graph = LoaderGraph::new();
        let a = graph.add(template("a", "a.html")).unwrap();
        let b = graph.add(template("b", "b.html")).unwrap();
        let c = graph.add(template("c", "c.html")).unwrap();

        graph.bind(a, "b", Slot::Loader(b)).unwrap();
        graph.bind(b, "c", Slot::Loader(c)).unwrap();

        let err = graph.bind(c, "a", Slot::Loader(a)).unwrap_err();
        assert!(matches!(err, AssetwatchError::CompositionCycle(_)));
        assert!(matches!(
            graph.bind(a, "me", Slot::Loader(a)),
            Err(AssetwatchError::CompositionCycle(_))
        ));
    }

    #[test]
    fn only_templates_take_slots() {
        let mut graph = LoaderGraph::new();
        let f = graph.add(font("fonts")).unwrap();
        let err = graph
            .bind(f, "x", Slot::Literal(Output::Text("y".into())))
            .unwrap_err();
        assert!(matches!(err, AssetwatchError::ConfigError(_)));
    }

    #[test]
    fn shared_children_and_transitive_input_paths() {
        let mut graph = LoaderGraph::new();
        let fonts = graph.add(font("fonts")).unwrap();
        let inner = graph.add(template("inner", "inner.html")).unwrap();
        let outer = graph.add(template("outer", "outer.html")).unwrap();

        graph.bind(inner, "fonts", Slot::Loader(fonts)).unwrap();
        graph.bind(outer, "inner", Slot::Loader(inner)).unwrap();
        graph.bind(outer, "fonts", Slot::Loader(fonts)).unwrap();

        assert_eq!(
            graph.input_paths(outer),
            vec!["outer.html", "fonts/*", "inner.html"]
        );
        assert_eq!(graph.children_of(outer), vec![fonts, inner]);
    }

    #[test]
    fn rebinding_drops_the_old_edge() {
        let mut graph = LoaderGraph::new();
        let a = graph.add(template("a", "a.html")).unwrap();
        let b = graph.add(template("b", "b.html")).unwrap();

        graph.bind(a, "x", Slot::Loader(b)).unwrap();
        graph
            .bind(a, "x", Slot::Literal(Output::Text("lit".into())))
            .unwrap();
        // a no longer composes b, so b may compose a
        graph.bind(b, "a", Slot::Loader(a)).unwrap();
        assert!(graph.children_of(a).is_empty());
    }

    #[test]
    fn load_resolves_children_before_rendering() {
        let fs = MockFileSystem::new();
        fs.add_file("proj/fonts/A.woff", "w");
        fs.add_file("proj/page.html", "<style>{{ fonts }}</style>{{ title }}");
        let ctx = LoadContext::new("proj", Arc::new(fs.clone()), Arc::new(Blake3Fingerprinter));

        let mut graph = LoaderGraph::new();
        let fonts = graph.add(font("fonts")).unwrap();
        let page = graph.add(template("page", "page.html")).unwrap();
        graph.bind(page, "fonts", Slot::Loader(fonts)).unwrap();
        graph
            .bind(page, "title", Slot::Literal(Output::Text("Hi".into())))
            .unwrap();

        let out = graph.load(&ctx, page, None).unwrap();
        let html = out.as_text().unwrap();
        assert!(html.starts_with("<style>@mixin font-A {"));
        assert!(html.ends_with("</style>Hi"));
        assert_eq!(
            graph.get(fonts).unwrap().cache().inputs()[0].0,
            PathBuf::from("proj/fonts/A.woff")
        );
    }
}
