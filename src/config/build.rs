// src/config/build.rs

//! Validated config -> loader graph + orchestrator.

use std::path::Path;
use std::sync::Arc;

use tracing::debug;

use crate::change::{Blake3Fingerprinter, Fingerprinter};
use crate::config::model::{ConfigFile, DataValue, LoaderConfig, LoaderKindConfig};
use crate::errors::{AssetwatchError, Result};
use crate::fs::{FileSystem, RealFileSystem};
use crate::loader::{
    CommandCompiler, FontLoader, ImageLoader, LoadContext, Loader, LoaderGraph, LoaderKind,
    Output, PassthroughCompiler, PlaceholderEngine, Slot, SourcePattern, StyleCompiler,
    StyleLoader, TemplateEngine, TemplateLoader,
};
use crate::orchestrator::Orchestrator;

/// Injected capabilities used by every loader built from a config.
#[derive(Debug, Clone)]
pub struct Collaborators {
    pub fs: Arc<dyn FileSystem>,
    pub hasher: Arc<dyn Fingerprinter>,
    pub engine: Arc<dyn TemplateEngine>,
    /// Overrides the per-loader `compiler` setting for every style loader.
    pub style_compiler: Option<Arc<dyn StyleCompiler>>,
}

impl Default for Collaborators {
    fn default() -> Self {
        Self {
            fs: Arc::new(RealFileSystem),
            hasher: Arc::new(Blake3Fingerprinter),
            engine: Arc::new(PlaceholderEngine),
            style_compiler: None,
        }
    }
}

impl Collaborators {
    pub fn with_fs(mut self, fs: Arc<dyn FileSystem>) -> Self {
        self.fs = fs;
        self
    }

    pub fn with_style_compiler(mut self, compiler: Arc<dyn StyleCompiler>) -> Self {
        self.style_compiler = Some(compiler);
        self
    }
}

/// Build an [`Orchestrator`] whose paths are relative to `root`.
///
/// Loaders are added in config order; `top_level` ones form the pass sequence
/// in that same order. Template `data` entries become slots.
pub fn build_orchestrator(
    cfg: &ConfigFile,
    root: &Path,
    collab: &Collaborators,
) -> Result<Orchestrator> {
    let mut graph = LoaderGraph::new();
    for entry in &cfg.loaders {
        graph.add(build_loader(entry, collab)?)?;
    }

    for entry in &cfg.loaders {
        let LoaderKindConfig::Template { data, .. } = &entry.kind else {
            continue;
        };
        let parent = graph
            .id_of(&entry.name)
            .ok_or_else(|| AssetwatchError::UnknownLoader(entry.name.clone()))?;
        for (key, value) in data {
            let slot = match value {
                DataValue::Text(s) => Slot::Literal(Output::Text(s.clone())),
                DataValue::Map(m) => Slot::Literal(Output::Map(m.clone())),
                DataValue::Ref(r) => Slot::Loader(
                    graph
                        .id_of(&r.target)
                        .ok_or_else(|| AssetwatchError::UnknownLoader(r.target.clone()))?,
                ),
            };
            graph.bind(parent, key.clone(), slot)?;
        }
    }

    let ctx = LoadContext::new(root, collab.fs.clone(), collab.hasher.clone());
    let mut orchestrator = Orchestrator::new(ctx, graph, cfg.config.on_error);
    for entry in cfg.top_level() {
        if let Some(id) = orchestrator.graph().id_of(&entry.name) {
            orchestrator.add_top_level(id);
        }
    }

    debug!(
        loaders = orchestrator.graph().len(),
        top_level = orchestrator.top_level().len(),
        "orchestrator built from config"
    );
    Ok(orchestrator)
}

fn build_loader(entry: &LoaderConfig, collab: &Collaborators) -> Result<Loader> {
    let kind = match &entry.kind {
        LoaderKindConfig::Font { source, output } => {
            LoaderKind::Font(FontLoader::new(SourcePattern::new(source.as_str())?, output.clone()))
        }
        LoaderKindConfig::Image {
            source,
            scss_output,
            json_output,
            map_name,
        } => {
            let mut loader = ImageLoader::new(SourcePattern::new(source.as_str())?, map_name.as_str());
            if let Some(path) = scss_output {
                loader = loader.with_scss_output(path);
            }
            if let Some(path) = json_output {
                loader = loader.with_json_output(path);
            }
            LoaderKind::Image(loader)
        }
        LoaderKindConfig::Style {
            entry: style_entry,
            output,
            compiler,
            extensions,
        } => {
            let compiler = style_compiler(&entry.name, compiler.as_deref(), collab)?;
            LoaderKind::Style(StyleLoader::new(
                style_entry,
                extensions,
                output.clone(),
                compiler,
            )?)
        }
        LoaderKindConfig::Template {
            entry: template_entry,
            output,
            ..
        } => LoaderKind::Template(TemplateLoader::new(
            SourcePattern::new(template_entry.as_str())?,
            output.clone(),
            collab.engine.clone(),
        )),
    };
    Ok(Loader::new(entry.name.clone(), kind))
}

fn style_compiler(
    loader: &str,
    command: Option<&[String]>,
    collab: &Collaborators,
) -> Result<Arc<dyn StyleCompiler>> {
    if let Some(overridden) = &collab.style_compiler {
        return Ok(overridden.clone());
    }
    match command {
        None => Ok(Arc::new(PassthroughCompiler)),
        Some([program, args @ ..]) => Ok(Arc::new(CommandCompiler::new(
            program.as_str(),
            args.to_vec(),
        ))),
        Some([]) => Err(AssetwatchError::ConfigError(format!(
            "loader '{loader}': compiler must name a program"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::loader::load_from_str;
    use crate::fs::mock::MockFileSystem;

    const SITE: &str = r#"
        [[loader]]
        name = "images"
        kind = "image"
        source = "img/*"
        top_level = false

        [[loader]]
        name = "page"
        kind = "template"
        entry = "index.html"
        output = "build/index.html"
        data = { title = "Home", images = { ref = "images" } }

        [[loader]]
        name = "fonts"
        kind = "font"
        source = "fonts/*"
    "#;

    #[test]
    fn builds_graph_slots_and_top_level_order() {
        let cfg = ConfigFile::try_from(load_from_str(SITE).unwrap()).unwrap();
        let fs = MockFileSystem::new();
        let collab = Collaborators::default().with_fs(Arc::new(fs));

        let orch = build_orchestrator(&cfg, Path::new("/site"), &collab).unwrap();
        let names: Vec<&str> = orch
            .top_level()
            .iter()
            .filter_map(|id| orch.graph().get(*id))
            .map(Loader::name)
            .collect();
        assert_eq!(names, vec!["page", "fonts"]);

        let page = orch.loader("page").unwrap();
        let LoaderKind::Template(t) = page.kind() else {
            panic!("page should be a template");
        };
        assert_eq!(t.slots()["title"], Slot::Literal(Output::Text("Home".into())));
        assert_eq!(
            t.slots()["images"],
            Slot::Loader(orch.graph().id_of("images").unwrap())
        );
        assert_eq!(orch.input_paths(), vec!["index.html", "img/*", "fonts/*"]);
    }

    #[test]
    fn end_to_end_build_on_mock_fs() {
        let cfg = ConfigFile::try_from(load_from_str(SITE).unwrap()).unwrap();
        let fs = MockFileSystem::new();
        fs.add_file("/site/index.html", "<h1>{{ title }}</h1>{{ images.logo_png }}");
        fs.add_file("/site/img/logo.png", "P");
        let collab = Collaborators::default().with_fs(Arc::new(fs.clone()));

        let mut orch = build_orchestrator(&cfg, Path::new("/site"), &collab).unwrap();
        let report = orch.build();
        assert!(report.is_success(), "{report:?}");

        let html = String::from_utf8(fs.contents("/site/build/index.html").unwrap()).unwrap();
        assert_eq!(
            html,
            format!("<h1>Home</h1>{}", crate::loader::inline::data_uri("image/png", b"P"))
        );
    }
}
