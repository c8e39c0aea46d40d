//! Finds the source files a failing test run points at.
//!
//! The first parseable stack frame gives the primary candidate; a looser
//! `at|in|from <path>.<ext>` scan adds further mentions. Test files and
//! vendored directories are never candidates, and every candidate must exist.

use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;

use crate::domain::models::CiConfig;
use crate::domain::ports::FileStore;

const SOURCE_EXTENSIONS: &str =
    "js|jsx|ts|tsx|mjs|cjs|py|rb|go|rs|java|kt|php|c|cc|cpp|h|hpp|cs|swift";

fn frame_patterns() -> &'static [Regex] {
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        [
            // Node / V8: "at fn (path:line:col)" or "at path:line:col"
            r"\bat\s+(?:[^()\n]*\()?(?:file://)?(?P<path>[^\s():]+\.[A-Za-z0-9]+):\d+",
            // Python: File "path", line N
            r#"File "(?P<path>[^"]+\.[A-Za-z0-9]+)", line \d+"#,
            // Compiler / panic style: path:line:col
            r"(?:^|\s)(?:-->\s*)?(?P<path>[\w./\\-]+\.[A-Za-z0-9]+):\d+:\d+",
        ]
        .iter()
        .filter_map(|p| Regex::new(p).ok())
        .collect()
    })
}

fn mention_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| {
            Regex::new(&format!(
                r#"\b(?:at|in|from)\s+['"(]?(?:file://)?(?P<path>[\w./\\-]+\.(?:{SOURCE_EXTENSIONS}))\b"#
            ))
            .ok()
        })
        .as_ref()
}

/// Filters applied to every candidate path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocatorRules {
    /// Directory segments treated as vendored code.
    pub excluded_dirs: Vec<String>,
    /// Used when no stack frame names an acceptable file.
    pub default_file: Option<String>,
}

impl From<&CiConfig> for LocatorRules {
    fn from(config: &CiConfig) -> Self {
        Self {
            excluded_dirs: config.excluded_dirs.clone(),
            default_file: config.default_file.clone(),
        }
    }
}

impl LocatorRules {
    /// Neither a test file nor under an excluded directory.
    pub fn accepts(&self, path: &str) -> bool {
        !is_test_file(path) && !self.is_excluded(path)
    }

    fn is_excluded(&self, path: &str) -> bool {
        path_segments(path)
            .iter()
            .any(|segment| self.excluded_dirs.iter().any(|dir| dir == segment))
    }
}

/// Heuristic test-file detection across common ecosystems.
pub fn is_test_file(path: &str) -> bool {
    let segments = path_segments(path);
    let Some((file_name, dirs)) = segments.split_last() else {
        return false;
    };
    let file_name = file_name.to_lowercase();

    let named_like_test = file_name.contains(".test.")
        || file_name.contains(".spec.")
        || file_name.contains("_test.")
        || file_name.contains("_spec.")
        || file_name.starts_with("test_");
    let in_test_dir = dirs
        .iter()
        .any(|d| matches!(*d, "test" | "tests" | "__tests__" | "spec" | "__mocks__"));

    named_like_test || in_test_dir
}

fn path_segments(path: &str) -> Vec<&str> {
    path.split(['/', '\\'])
        .filter(|s| !s.is_empty() && *s != ".")
        .collect()
}

/// Spelling-independent identity of a path: `./src/a.js`, `src/a.js` and
/// `src\a.js` collide, while `/src/a.js` stays distinct.
pub fn path_key(path: &str) -> String {
    let joined = path_segments(path).join("/");
    if path.starts_with(['/', '\\']) {
        format!("/{joined}")
    } else {
        joined
    }
}

/// Stack-frame and mention parsing over test output.
#[derive(Debug, Clone)]
pub struct FailureLocator {
    rules: LocatorRules,
}

impl FailureLocator {
    pub const fn new(rules: LocatorRules) -> Self {
        Self { rules }
    }

    pub const fn rules(&self) -> &LocatorRules {
        &self.rules
    }

    /// First acceptable stack-frame path, else the configured default file.
    pub fn primary_candidate(&self, output: &str) -> Option<String> {
        output
            .lines()
            .find_map(|line| {
                frame_patterns().iter().find_map(|re| {
                    re.captures_iter(line)
                        .filter_map(|c| c.name("path").map(|m| m.as_str().to_string()))
                        .find(|path| self.rules.accepts(path))
                })
            })
            .or_else(|| self.rules.default_file.clone())
    }

    /// Every acceptable `at|in|from <path>.<ext>` mention, in order, with repeats.
    pub fn mentioned_files(&self, output: &str) -> Vec<String> {
        let Some(re) = mention_pattern() else {
            return Vec::new();
        };
        re.captures_iter(output)
            .filter_map(|c| c.name("path").map(|m| m.as_str().to_string()))
            .filter(|path| self.rules.accepts(path))
            .collect()
    }

    /// Candidates that exist in `files`, deduplicated, in discovery order.
    #[tracing::instrument(skip_all, fields(output_len = output.len()))]
    pub async fn identify_files_to_fix(&self, output: &str, files: &dyn FileStore) -> Vec<String> {
        let candidates = self
            .primary_candidate(output)
            .into_iter()
            .chain(self.mentioned_files(output));

        let mut seen = HashSet::new();
        let mut found = Vec::new();
        for path in candidates {
            if !seen.insert(path_key(&path)) {
                continue;
            }
            if files.exists(&path).await {
                found.push(path);
            } else {
                tracing::debug!(path = %path, "candidate does not exist, skipping");
            }
        }

        tracing::debug!(count = found.len(), files = ?found, "identified files to fix");
        found
    }
}
