// src/loader/naming.rs

//! Identifier normalization shared by the font and image loaders.

use std::path::{Path, PathBuf};

/// Separator substituted for every character that is not valid in stylesheet
/// variable names or code identifiers.
pub const NAME_SEPARATOR: char = '_';

/// Replace path separators, spaces, dots, hyphens and parentheses with `_`.
///
/// Each offending character is replaced individually; runs are not collapsed.
pub fn normalize_name(raw: &str) -> String {
    raw.chars()
        .map(|c| match c {
            '/' | '\\' | ' ' | '.' | '-' | '(' | ')' => NAME_SEPARATOR,
            other => other,
        })
        .collect()
}

/// Longest directory that contains every path in `paths`.
///
/// For a single file this is its parent directory.
pub fn common_ancestor(paths: &[PathBuf]) -> PathBuf {
    let mut iter = paths.iter();
    let Some(first) = iter.next() else {
        return PathBuf::new();
    };

    let mut ancestor = first.parent().map(Path::to_path_buf).unwrap_or_default();
    for path in iter {
        while !path.starts_with(&ancestor) {
            if !ancestor.pop() {
                break;
            }
        }
    }
    ancestor
}
