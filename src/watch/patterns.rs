// src/watch/patterns.rs

use std::fmt;

use globset::GlobSet;

use crate::config::ConfigFile;
use crate::errors::Result;
use crate::loader::pattern::build_globset;
use crate::orchestrator::Orchestrator;

/// Decides which root-relative paths are worth turning into change events.
///
/// A path passes when it matches one of the watch globs and does not match
/// the ignore glob.
#[derive(Clone)]
pub struct WatchFilter {
    patterns: Vec<String>,
    watch_set: GlobSet,
    ignore: Option<String>,
    ignore_set: Option<GlobSet>,
}

impl fmt::Debug for WatchFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WatchFilter")
            .field("patterns", &self.patterns)
            .field("ignore", &self.ignore)
            .finish_non_exhaustive()
    }
}

impl WatchFilter {
    pub fn new(patterns: Vec<String>, ignore: Option<String>) -> Result<Self> {
        let watch_set = build_globset(&patterns)?;
        let ignore_set = match &ignore {
            Some(pattern) => Some(build_globset(std::slice::from_ref(pattern))?),
            None => None,
        };
        Ok(Self {
            patterns,
            watch_set,
            ignore,
            ignore_set,
        })
    }

    /// `[watch]` settings, falling back to every input path the orchestrator's
    /// loaders depend on.
    pub fn from_config(cfg: &ConfigFile, orchestrator: &Orchestrator) -> Result<Self> {
        let patterns = cfg
            .watch
            .patterns
            .clone()
            .unwrap_or_else(|| orchestrator.input_paths());
        Self::new(patterns, cfg.watch.ignore.clone())
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    pub fn ignore(&self) -> Option<&str> {
        self.ignore.as_deref()
    }

    /// `rel_path` is relative to the project root, with forward slashes.
    pub fn matches(&self, rel_path: &str) -> bool {
        if !self.watch_set.is_match(rel_path) {
            return false;
        }
        if let Some(ignore) = &self.ignore_set {
            if ignore.is_match(rel_path) {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn watch_and_ignore() {
        let filter = WatchFilter::new(
            vec!["assets/**/*".to_string(), "index.html".to_string()],
            Some("assets/tmp/**".to_string()),
        )
        .unwrap();

        assert!(filter.matches("assets/img/a.png"));
        assert!(filter.matches("index.html"));
        assert!(!filter.matches("assets/tmp/scratch.png"));
        assert!(!filter.matches("build/index.html"));
    }

    #[test]
    fn single_star_stays_in_its_directory() {
        let filter = WatchFilter::new(vec!["fonts/*".to_string()], None).unwrap();
        assert!(filter.matches("fonts/A.woff"));
        assert!(!filter.matches("fonts/old/A.woff"));
    }

    #[test]
    fn invalid_ignore_is_an_error() {
        assert!(WatchFilter::new(vec!["*".into()], Some("[".into())).is_err());
    }
}
