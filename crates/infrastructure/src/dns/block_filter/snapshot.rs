use super::parser::ParsedPattern;
use chrono::{DateTime, Utc};
use compact_str::CompactString;
use fancy_regex::Regex;
use rustc_hash::FxHashMap;
use std::sync::Arc;
use tracing::warn;

/// A pattern hit: what matched and which source contributed it.
#[derive(Debug, Clone)]
pub struct ListMatch {
    pub pattern: Arc<str>,
    pub source: Arc<str>,
}

struct SuffixPattern {
    /// `".ads.com"` for `*.ads.com`.
    suffix: CompactString,
    /// Bare stem; `*.ads.com` also matches `ads.com` itself.
    stem: CompactString,
    pattern: Arc<str>,
    source: Arc<str>,
}

struct PrefixPattern {
    /// `"ads."` for `ads.*`.
    prefix: CompactString,
    pattern: Arc<str>,
    source: Arc<str>,
}

struct RegexPattern {
    regex: Regex,
    pattern: Arc<str>,
    source: Arc<str>,
}

/// Immutable compiled list. Built by [`ListSnapshotBuilder`], published via
/// `ArcSwap`; readers capture the pointer once per query.
pub struct ListSnapshot {
    exact: FxHashMap<CompactString, (Arc<str>, Arc<str>)>,
    suffixes: Vec<SuffixPattern>,
    prefixes: Vec<PrefixPattern>,
    regexes: Vec<RegexPattern>,
    built_at: DateTime<Utc>,
    source_count: usize,
}

impl ListSnapshot {
    pub fn empty() -> Self {
        ListSnapshotBuilder::new().build()
    }

    /// First match wins, in decreasing expected frequency:
    /// exact → suffix wildcards → prefix wildcards → regex list.
    /// `name` must already be normalized.
    pub fn find(&self, name: &str) -> Option<ListMatch> {
        if let Some((pattern, source)) = self.exact.get(name) {
            return Some(ListMatch {
                pattern: Arc::clone(pattern),
                source: Arc::clone(source),
            });
        }

        for entry in &self.suffixes {
            if name.ends_with(entry.suffix.as_str()) || name == entry.stem.as_str() {
                return Some(ListMatch {
                    pattern: Arc::clone(&entry.pattern),
                    source: Arc::clone(&entry.source),
                });
            }
        }

        for entry in &self.prefixes {
            if name.starts_with(entry.prefix.as_str()) {
                return Some(ListMatch {
                    pattern: Arc::clone(&entry.pattern),
                    source: Arc::clone(&entry.source),
                });
            }
        }

        for entry in &self.regexes {
            if entry.regex.is_match(name).unwrap_or(false) {
                return Some(ListMatch {
                    pattern: Arc::clone(&entry.pattern),
                    source: Arc::clone(&entry.source),
                });
            }
        }

        None
    }

    pub fn matches(&self, name: &str) -> bool {
        self.find(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.exact.len() + self.suffixes.len() + self.prefixes.len() + self.regexes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn exact_len(&self) -> usize {
        self.exact.len()
    }

    pub fn wildcard_len(&self) -> usize {
        self.suffixes.len() + self.prefixes.len()
    }

    pub fn regex_len(&self) -> usize {
        self.regexes.len()
    }

    pub fn built_at(&self) -> DateTime<Utc> {
        self.built_at
    }

    pub fn source_count(&self) -> usize {
        self.source_count
    }
}

pub struct ListSnapshotBuilder {
    exact: FxHashMap<CompactString, (Arc<str>, Arc<str>)>,
    suffixes: Vec<SuffixPattern>,
    prefixes: Vec<PrefixPattern>,
    regexes: Vec<RegexPattern>,
    source_count: usize,
}

impl ListSnapshotBuilder {
    pub fn new() -> Self {
        Self {
            exact: FxHashMap::default(),
            suffixes: Vec::new(),
            prefixes: Vec::new(),
            regexes: Vec::new(),
            source_count: 0,
        }
    }

    /// Fold one source's parsed patterns in. A regex that fails to compile
    /// is logged and skipped; it never poisons the rest of the source.
    pub fn add_source(&mut self, source: &Arc<str>, patterns: Vec<ParsedPattern>) -> &mut Self {
        self.source_count += 1;

        for parsed in patterns {
            match parsed {
                ParsedPattern::Exact(name) => {
                    let pattern: Arc<str> = Arc::from(name.as_str());
                    self.exact
                        .entry(CompactString::new(&name))
                        .or_insert_with(|| (pattern, Arc::clone(source)));
                }
                ParsedPattern::SuffixWildcard(stem) => {
                    self.suffixes.push(SuffixPattern {
                        suffix: CompactString::new(format!(".{}", stem)),
                        stem: CompactString::new(&stem),
                        pattern: Arc::from(format!("*.{}", stem).as_str()),
                        source: Arc::clone(source),
                    });
                }
                ParsedPattern::PrefixWildcard(stem) => {
                    self.prefixes.push(PrefixPattern {
                        prefix: CompactString::new(format!("{}.", stem)),
                        pattern: Arc::from(format!("{}.*", stem).as_str()),
                        source: Arc::clone(source),
                    });
                }
                ParsedPattern::Regex(body) => match Regex::new(&body) {
                    Ok(regex) => self.regexes.push(RegexPattern {
                        regex,
                        pattern: Arc::from(format!("/{}/", body).as_str()),
                        source: Arc::clone(source),
                    }),
                    Err(e) => {
                        warn!(source = %source, pattern = %body, error = %e, "Skipping invalid regex pattern");
                    }
                },
            }
        }
        self
    }

    pub fn build(&mut self) -> ListSnapshot {
        ListSnapshot {
            exact: std::mem::take(&mut self.exact),
            suffixes: std::mem::take(&mut self.suffixes),
            prefixes: std::mem::take(&mut self.prefixes),
            regexes: std::mem::take(&mut self.regexes),
            built_at: Utc::now(),
            source_count: self.source_count,
        }
    }
}

impl Default for ListSnapshotBuilder {
    fn default() -> Self {
        Self::new()
    }
}
