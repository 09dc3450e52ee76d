// src/loader/pattern.rs

use std::fmt;
use std::path::{Component, Path, PathBuf};

use globset::{Glob, GlobBuilder, GlobMatcher, GlobSet, GlobSetBuilder};

use crate::errors::{AssetwatchError, Result};
use crate::fs::{walk_files, FileSystem};

/// A compiled glob (or literal path) relative to the project root.
///
/// `*` does not cross `/`; use `**` for recursive matches. A leading `./` is
/// dropped; absolute patterns are rejected.
#[derive(Clone)]
pub struct SourcePattern {
    raw: String,
    matcher: GlobMatcher,
    /// Longest leading run of components without glob metacharacters.
    base: PathBuf,
}

impl fmt::Debug for SourcePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SourcePattern").field(&self.raw).finish()
    }
}

impl SourcePattern {
    pub fn new(pattern: impl Into<String>) -> Result<Self> {
        let raw = normalize_pattern(&pattern.into())?;
        let matcher = compile_glob(&raw)?.compile_matcher();
        let base = literal_base(&raw);
        Ok(Self { raw, matcher, base })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Match a root-relative, forward-slash path such as `"img/a.png"`.
    pub fn matches_rel(&self, rel_path: &str) -> bool {
        self.matcher.is_match(rel_path)
    }

    /// Every file under `root` matching this pattern, sorted by path.
    pub fn expand(&self, fs: &dyn FileSystem, root: &Path) -> Result<Vec<PathBuf>> {
        let start = if self.base.as_os_str().is_empty() {
            root.to_path_buf()
        } else {
            root.join(&self.base)
        };
        let candidates =
            walk_files(fs, &start).map_err(|e| AssetwatchError::file_access(&start, e))?;

        Ok(candidates
            .into_iter()
            .filter(|path| {
                path.strip_prefix(root)
                    .map(|rel| self.matches_rel(&to_slash(rel)))
                    .unwrap_or(false)
            })
            .collect())
    }
}

/// Root-relative form of a configured pattern: `./fonts/*` becomes `fonts/*`.
pub(crate) fn normalize_pattern(pattern: &str) -> Result<String> {
    let mut rest = pattern.trim();
    while let Some(stripped) = rest.strip_prefix("./") {
        rest = stripped.trim_start_matches('/');
    }
    if rest.starts_with('\\') || Path::new(rest).has_root() || Path::new(rest).is_absolute() {
        return Err(AssetwatchError::ConfigError(format!(
            "pattern '{pattern}' must be relative to the project root"
        )));
    }
    if rest.is_empty() || rest == "." {
        return Err(AssetwatchError::ConfigError(format!(
            "pattern '{pattern}' does not name any path"
        )));
    }
    Ok(rest.to_string())
}

pub(crate) fn compile_glob(pattern: &str) -> Result<Glob> {
    let pattern = normalize_pattern(pattern)?;
    GlobBuilder::new(&pattern)
        .literal_separator(true)
        .build()
        .map_err(|source| AssetwatchError::Pattern {
            pattern: pattern.to_string(),
            source,
        })
}

/// Build a GlobSet from simple string patterns.
pub(crate) fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pat in patterns {
        builder.add(compile_glob(pat)?);
    }
    builder.build().map_err(|source| AssetwatchError::Pattern {
        pattern: patterns.join(", "),
        source,
    })
}

fn literal_base(pattern: &str) -> PathBuf {
    let mut base = PathBuf::new();
    for component in Path::new(pattern).components() {
        match component {
            Component::Normal(part) => {
                let part = part.to_string_lossy();
                if part.contains(['*', '?', '[', '{']) {
                    break;
                }
                base.push(part.as_ref());
            }
            Component::CurDir => {}
            other => base.push(other.as_os_str()),
        }
    }
    base
}

fn to_slash(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

/// Convert a path into a string relative to `root`, with forward slashes.
///
/// - First we try a direct `strip_prefix(root)`.
/// - If that fails (e.g. due to symlinks or different absolute prefixes),
///   we canonicalize both paths and try again.
///
/// Returns `None` if the path cannot be reasonably related to `root`.
pub fn relative_str(fs: &dyn FileSystem, root: &Path, path: &Path) -> Option<String> {
    if let Ok(rel) = path.strip_prefix(root) {
        return Some(to_slash(rel));
    }

    if let (Ok(root_canon), Ok(path_canon)) = (fs.canonicalize(root), fs.canonicalize(path)) {
        if let Ok(rel) = path_canon.strip_prefix(&root_canon) {
            return Some(to_slash(rel));
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::mock::MockFileSystem;

    #[test]
    fn literal_base_stops_at_first_glob_component() {
        assert_eq!(literal_base("assets/img/**/*.png"), PathBuf::from("assets/img"));
        assert_eq!(literal_base("styles/main.scss"), PathBuf::from("styles/main.scss"));
        assert_eq!(literal_base("./fonts/*.{ttf,woff2}"), PathBuf::from("fonts"));
        assert_eq!(literal_base("*.css"), PathBuf::new());
    }

    #[test]
    fn single_star_does_not_cross_directories() {
        let p = SourcePattern::new("img/*").unwrap();
        assert!(p.matches_rel("img/a.png"));
        assert!(!p.matches_rel("img/sub/b.png"));

        let p = SourcePattern::new("img/**/*").unwrap();
        assert!(p.matches_rel("img/sub/b.png"));
    }

    #[test]
    fn expand_is_sorted_and_filtered() {
        let fs = MockFileSystem::new();
        fs.add_file("proj/img/sub/b.png", "b");
        fs.add_file("proj/img/a.png", "a");
        fs.add_file("proj/img/notes.txt", "n");
        fs.add_file("proj/other/c.png", "c");

        let p = SourcePattern::new("img/**/*.png").unwrap();
        let files = p.expand(&fs, Path::new("proj")).unwrap();
        assert_eq!(
            files,
            vec![PathBuf::from("proj/img/a.png"), PathBuf::from("proj/img/sub/b.png")]
        );
    }

    #[test]
    fn literal_path_expands_to_itself() {
        let fs = MockFileSystem::new();
        fs.add_file("proj/styles/main.scss", "body {}");
        let p = SourcePattern::new("styles/main.scss").unwrap();
        assert_eq!(
            p.expand(&fs, Path::new("proj")).unwrap(),
            vec![PathBuf::from("proj/styles/main.scss")]
        );
    }

    #[test]
    fn invalid_glob_is_a_pattern_error() {
        let err = SourcePattern::new("img/[").unwrap_err();
        assert!(matches!(err, AssetwatchError::Pattern { .. }));
    }

    #[test]
    fn dot_slash_prefix_is_dropped() {
        let fs = MockFileSystem::new();
        fs.add_file("/p/fonts/A.woff2", "w");

        let p = SourcePattern::new("./fonts/*").unwrap();
        assert_eq!(p.as_str(), "fonts/*");
        assert!(p.matches_rel("fonts/A.woff2"));
        assert_eq!(
            p.expand(&fs, Path::new("/p")).unwrap(),
            vec![PathBuf::from("/p/fonts/A.woff2")]
        );
        assert_eq!(SourcePattern::new(".//./img/*").unwrap().as_str(), "img/*");
    }

    #[test]
    fn absolute_and_empty_patterns_are_config_errors() {
        for bad in ["/p/fonts/*", "./", "."] {
            assert!(
                matches!(SourcePattern::new(bad), Err(AssetwatchError::ConfigError(_))),
                "{bad}"
            );
        }
        assert!(matches!(compile_glob("/build/**"), Err(AssetwatchError::ConfigError(_))));
    }

    #[test]
    fn globsets_accept_dot_slash_patterns() {
        let set = build_globset(&["./build/**".to_string()]).unwrap();
        assert!(set.is_match("build/main.css"));
    }
}
