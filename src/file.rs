//! Loading config files into one document.
//!
//! Each entry of the file list is a pattern. Patterns go through three
//! expansions before anything is read:
//!
//! - A leading `~` or `~/` becomes the user's home directory.
//! - `{a,b}` alternatives are spelled out (`app.{yaml,json}` → two patterns).
//! - Glob wildcards (`*`, `?`, `[..]`, `**`) are matched, in sorted order.
//!
//! A pattern that matches nothing is not an error. Files that disappear or
//! cannot be read are skipped too, so listing a path is a suggestion rather
//! than a requirement. A file that exists but does not parse is fatal.
//!
//! Every file is parsed by extension (`.toml`, `.yaml`/`.yml`, `.json`, with
//! anything else tried as YAML) and the results are unified in load order. See
//! [`merge::unify`](crate::merge::unify) for what counts as a conflict.

use std::path::{MAIN_SEPARATOR, Path, PathBuf};

use toml::Table;

use crate::error::ClapcueError;
use crate::merge;

/// Load every file matched by `patterns` and unify them.
///
/// Returns an empty table when nothing matched.
pub fn load_and_unify<S: AsRef<str>>(patterns: &[S]) -> Result<Table, ClapcueError> {
    let mut merged = Table::new();
    let mut first: Option<PathBuf> = None;

    for pattern in patterns {
        let pattern = pattern.as_ref();
        let expanded = match expand_home(pattern) {
            Ok(path) => path,
            Err(e) => {
                tracing::debug!(event = "clapcue.config.skipped", pattern, reason = %e);
                continue;
            }
        };

        for path in matching_files(&expanded.to_string_lossy()) {
            let Some(table) = read_document(&path)? else {
                continue;
            };
            tracing::info!(event = "clapcue.config.loaded", path = %path.display());

            merged = merge::unify(merged, table).map_err(|conflict| ClapcueError::ConfigConflict {
                first: first.clone().unwrap_or_else(|| path.clone()),
                second: path.clone(),
                key: conflict.key,
                reason: conflict.reason,
            })?;
            first.get_or_insert(path);
        }
    }
    Ok(merged)
}

/// Expand a leading `~` to the home directory.
///
/// `~user` forms and a `~` anywhere else are left alone.
pub fn expand_home(path: &str) -> Result<PathBuf, ClapcueError> {
    let rest = match path.strip_prefix('~') {
        Some(rest) if rest.is_empty() || rest.starts_with(['/', MAIN_SEPARATOR]) => rest,
        _ => return Ok(PathBuf::from(path)),
    };
    let dirs = directories::UserDirs::new().ok_or(ClapcueError::HomeDirUnavailable)?;
    let home = dirs.home_dir().to_path_buf();
    let rest = rest.trim_start_matches(['/', MAIN_SEPARATOR]);
    Ok(if rest.is_empty() { home } else { home.join(rest) })
}

/// Spell out `{a,b}` alternatives. Groups don't nest; several groups in one
/// pattern multiply out left to right.
pub fn expand_braces(pattern: &str) -> Vec<String> {
    let Some(open) = pattern.find('{') else {
        return vec![pattern.to_string()];
    };
    let Some(len) = pattern[open..].find('}') else {
        return vec![pattern.to_string()];
    };
    let close = open + len;
    let inner = &pattern[open + 1..close];
    if !inner.contains(',') {
        // Not an alternation; keep the braces and look further right.
        let (head, tail) = pattern.split_at(close + 1);
        return expand_braces(tail)
            .into_iter()
            .map(|rest| format!("{head}{rest}"))
            .collect();
    }

    let head = &pattern[..open];
    let tails = expand_braces(&pattern[close + 1..]);
    inner
        .split(',')
        .flat_map(|alt| tails.iter().map(move |tail| format!("{head}{alt}{tail}")))
        .collect()
}

/// Files matched by one (home-expanded) pattern, brace groups included.
fn matching_files(pattern: &str) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for alternative in expand_braces(pattern) {
        let mut matched: Vec<PathBuf> = match glob::glob(&alternative) {
            Ok(paths) => paths.filter_map(Result::ok).filter(|p| p.is_file()).collect(),
            Err(e) => {
                tracing::debug!(event = "clapcue.config.skipped", pattern = %alternative, reason = %e);
                continue;
            }
        };
        matched.sort();
        if matched.is_empty() {
            // Literal names containing glob metacharacters.
            let literal = PathBuf::from(&alternative);
            if literal.is_file() {
                matched.push(literal);
            } else {
                tracing::debug!(event = "clapcue.config.skipped", pattern = %alternative, reason = "no match");
            }
        }
        for path in matched {
            if !files.contains(&path) {
                files.push(path);
            }
        }
    }
    files
}

/// Read and parse one file. `Ok(None)` means it could not be read.
fn read_document(path: &Path) -> Result<Option<Table>, ClapcueError> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            tracing::debug!(event = "clapcue.config.skipped", path = %path.display(), reason = %e);
            return Ok(None);
        }
    };
    parse_document(path, &content).map(Some)
}

/// Parse `content` according to `path`'s extension.
pub fn parse_document(path: &Path, content: &str) -> Result<Table, ClapcueError> {
    let parse_error = |reason: String| ClapcueError::ParseError {
        path: path.to_path_buf(),
        reason,
    };
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "toml" => toml::from_str(content).map_err(|e| parse_error(e.message().to_string())),
        "json" => serde_json::from_str(content).map_err(|e| parse_error(e.to_string())),
        _ if content.trim().is_empty() => Ok(Table::new()),
        _ => serde_yaml::from_str(content).map_err(|e| parse_error(e.to_string())),
    }
}
