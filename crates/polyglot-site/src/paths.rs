//! Localized output paths and placeholder substitution.
//!
//! Every source page gets one output path per language: the source root is
//! replaced by the language code and every further segment is looked up in
//! the site-name table. Rendered pages may refer to these paths through
//! placeholders:
//!
//! | Placeholder | Value for `pl` and `site/sub/page.html` with `sub → pod` |
//! |---|---|
//! | `$LANG$` | `pl` |
//! | `$PATH$` | `pl/pod` |
//! | `$PARENTPATH$` | `pl` |
//! | `$PATHEND$` | `pod` |
//! | `$PATH[en]$` | `en/sub` |

use std::collections::{BTreeMap, HashMap};
use std::path::{Component, Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;

use crate::error::SiteError;

static LANGUAGE_PATH_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$PATH\[([^\[\]$]*)\]\$").expect("invalid language path regex")
});

/// Per-language names for path segments.
///
/// Keyed by the segment as it appears under the source directory, then by
/// language code. Segments without an entry keep their name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SiteNames {
    names: HashMap<String, HashMap<String, String>>,
}

impl SiteNames {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `name` as the `lang` name of `segment`.
    pub fn insert(
        &mut self,
        segment: impl Into<String>,
        lang: impl Into<String>,
        name: impl Into<String>,
    ) {
        self.names
            .entry(segment.into())
            .or_default()
            .insert(lang.into(), name.into());
    }

    /// Name of `segment` in `lang`.
    pub fn localize<'a>(&'a self, segment: &'a str, lang: &str) -> &'a str {
        self.names
            .get(segment)
            .and_then(|by_lang| by_lang.get(lang))
            .map_or(segment, String::as_str)
    }
}

impl From<HashMap<String, HashMap<String, String>>> for SiteNames {
    fn from(names: HashMap<String, HashMap<String, String>>) -> Self {
        Self { names }
    }
}

/// Output location of one page in one language, as `/`-separated segments.
///
/// The first segment is the language code and the last one the file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PagePath {
    segments: Vec<String>,
}

impl PagePath {
    /// Localize a page path given relative to the source directory.
    ///
    /// Fails when the language code or a localized name is not a single
    /// plain path segment, so output never leaves the output directory.
    pub fn localize(relative: &Path, lang: &str, names: &SiteNames) -> Result<Self, SiteError> {
        let mut segments = vec![checked_segment(lang, lang)?];
        for component in relative.components() {
            if let Component::Normal(segment) = component {
                let segment = segment.to_string_lossy();
                segments.push(checked_segment(names.localize(&segment, lang), lang)?);
            }
        }
        Ok(Self { segments })
    }

    /// Localized segments, language code first.
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Directory holding the page (`$PATH$`).
    pub fn dir(&self) -> String {
        self.join_prefix(1)
    }

    /// Parent of [`dir`](Self::dir) (`$PARENTPATH$`). Empty at the top level.
    pub fn parent_dir(&self) -> String {
        self.join_prefix(2)
    }

    /// Last segment of [`dir`](Self::dir) (`$PATHEND$`).
    pub fn dir_name(&self) -> &str {
        let index = self.segments.len().saturating_sub(2);
        &self.segments[index]
    }

    /// Path of the output file relative to the output directory.
    pub fn relative_path(&self) -> PathBuf {
        self.segments.iter().collect()
    }

    fn join_prefix(&self, dropped: usize) -> String {
        let end = self.segments.len().saturating_sub(dropped);
        self.segments[..end].join("/")
    }
}

fn checked_segment(segment: &str, lang: &str) -> Result<String, SiteError> {
    if segment.is_empty() || matches!(segment, "." | "..") || segment.contains(['/', '\\']) {
        return Err(SiteError::InvalidPathSegment {
            segment: segment.to_owned(),
            lang: lang.to_owned(),
        });
    }
    Ok(segment.to_owned())
}

/// Replace path placeholders in a page rendered for `lang`.
///
/// `paths` holds the page's location in every configured language.
/// `$PATH[<lang>]$` naming an unknown language is left as is.
pub fn substitute_placeholders(html: &str, lang: &str, paths: &BTreeMap<String, PagePath>) -> String {
    let Some(own) = paths.get(lang) else {
        return html.to_owned();
    };

    let html = html
        .replace("$LANG$", lang)
        .replace("$PATH$", &own.dir())
        .replace("$PARENTPATH$", &own.parent_dir())
        .replace("$PATHEND$", own.dir_name());

    LANGUAGE_PATH_PATTERN
        .replace_all(&html, |caps: &regex::Captures| {
            paths
                .get(&caps[1])
                .map_or_else(|| caps[0].to_owned(), PagePath::dir)
        })
        .into_owned()
}
