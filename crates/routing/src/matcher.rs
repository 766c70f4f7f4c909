use std::fmt;
use std::sync::Arc;

use regex::{Regex, RegexBuilder};

use crate::error::{InvalidPatternSnafu, RoutingResult};

/// Content filter contract the router depends on.
///
/// Implementations must be deterministic and accept every input, including the
/// empty string. `try_matches` may report a broken rule; `matches` turns that
/// into a non-match so one bad tab never breaks routing for the others.
pub trait TabMatcher: fmt::Debug {
    fn try_matches(&self, text: &str) -> RoutingResult<bool>;

    fn matches(&self, text: &str) -> bool {
        match self.try_matches(text) {
            Ok(matched) => matched,
            Err(error) => {
                tracing::debug!("tab rule failed, treating as non-match: {}", error);
                false
            }
        }
    }
}

/// Matching rule stored on a tab.
#[derive(Debug, Clone)]
pub enum TabRule {
    /// Matches every message.
    Any,
    /// Regex search anywhere in the message.
    Pattern(PatternRule),
    /// Plain substring search. An empty needle matches everything.
    Substring { needle: String, case_sensitive: bool },
    /// Matches when any keyword appears as a whole word or phrase.
    Keywords(KeywordRule),
    /// Host-supplied rule.
    Custom(Arc<dyn TabMatcher + Send + Sync>),
}

impl TabRule {
    pub fn pattern(source: impl Into<String>, case_sensitive: bool) -> Self {
        Self::Pattern(PatternRule::compile(source, case_sensitive))
    }

    pub fn substring(needle: impl Into<String>, case_sensitive: bool) -> Self {
        Self::Substring {
            needle: needle.into(),
            case_sensitive,
        }
    }

    pub fn keywords<I, S>(keywords: I, case_sensitive: bool) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Keywords(KeywordRule::compile(keywords, case_sensitive))
    }

    /// Why the rule failed to build, if it did.
    pub fn build_error(&self) -> Option<&str> {
        match self {
            Self::Pattern(rule) => rule.compiled.as_ref().err().map(String::as_str),
            Self::Keywords(rule) => rule.compiled.as_ref().err().map(String::as_str),
            Self::Any | Self::Substring { .. } | Self::Custom(_) => None,
        }
    }

    /// Returns false when the rule can never match because it failed to build.
    pub fn is_valid(&self) -> bool {
        self.build_error().is_none()
    }
}

impl TabMatcher for TabRule {
    fn try_matches(&self, text: &str) -> RoutingResult<bool> {
        match self {
            Self::Any => Ok(true),
            Self::Pattern(rule) => rule.try_matches(text),
            Self::Substring {
                needle,
                case_sensitive: true,
            } => Ok(text.contains(needle.as_str())),
            Self::Substring {
                needle,
                case_sensitive: false,
            } => Ok(text.to_lowercase().contains(&needle.to_lowercase())),
            Self::Keywords(rule) => rule.try_matches(text),
            Self::Custom(rule) => rule.try_matches(text),
        }
    }
}

/// Regex rule compiled once; a compile failure is kept and reported on use.
#[derive(Debug, Clone)]
pub struct PatternRule {
    source: String,
    compiled: Result<Regex, String>,
}

impl PatternRule {
    pub fn compile(source: impl Into<String>, case_sensitive: bool) -> Self {
        let source = source.into();
        let compiled = RegexBuilder::new(&source)
            .case_insensitive(!case_sensitive)
            .build()
            .map_err(|error| {
                tracing::warn!(
                    "invalid tab pattern '{}', the tab will never match: {}",
                    source,
                    error
                );
                error.to_string()
            });

        Self { source, compiled }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    fn try_matches(&self, text: &str) -> RoutingResult<bool> {
        match &self.compiled {
            Ok(regex) => Ok(regex.is_match(text)),
            Err(reason) => InvalidPatternSnafu {
                stage: "match-tab-pattern",
                pattern: self.source.clone(),
                reason: reason.clone(),
            }
            .fail(),
        }
    }
}

/// Keyword list compiled into one alternation.
///
/// A keyword edge that is a word character must sit on a word boundary, so
/// `trade` does not match `trader` while `[Party]` and `want to buy` still
/// match as written.
#[derive(Debug, Clone)]
pub struct KeywordRule {
    keywords: Vec<String>,
    compiled: Result<Regex, String>,
}

impl KeywordRule {
    pub fn compile<I, S>(keywords: I, case_sensitive: bool) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let keywords = keywords
            .into_iter()
            .map(Into::into)
            .map(|keyword: String| keyword.trim().to_string())
            .filter(|keyword| !keyword.is_empty())
            .collect::<Vec<_>>();

        let compiled = if keywords.is_empty() {
            tracing::warn!("keyword tab rule has no keywords, the tab will never match");
            Err("no keywords".to_string())
        } else {
            let alternation = keywords
                .iter()
                .map(|keyword| keyword_pattern(keyword.as_str()))
                .collect::<Vec<_>>()
                .join("|");
            RegexBuilder::new(&alternation)
                .case_insensitive(!case_sensitive)
                .build()
                .map_err(|error| {
                    tracing::warn!(
                        "invalid tab keywords {:?}, the tab will never match: {}",
                        keywords,
                        error
                    );
                    error.to_string()
                })
        };

        Self { keywords, compiled }
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    fn try_matches(&self, text: &str) -> RoutingResult<bool> {
        match &self.compiled {
            Ok(regex) => Ok(regex.is_match(text)),
            Err(reason) => InvalidPatternSnafu {
                stage: "match-tab-keywords",
                pattern: self.keywords.join(","),
                reason: reason.clone(),
            }
            .fail(),
        }
    }
}

fn keyword_pattern(keyword: &str) -> String {
    let is_word = |ch: char| ch.is_alphanumeric() || ch == '_';
    let mut pattern = String::new();
    if keyword.starts_with(is_word) {
        pattern.push_str(r"\b");
    }
    pattern.push_str(&regex::escape(keyword));
    if keyword.ends_with(is_word) {
        pattern.push_str(r"\b");
    }
    pattern
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn any_matches_empty_text() {
        assert!(TabRule::Any.matches(""));
    }

    #[test]
    fn empty_pattern_matches_everything() {
        let rule = TabRule::pattern("", true);
        assert!(rule.matches(""));
        assert!(rule.matches("anything at all"));
    }

    #[test]
    fn pattern_searches_anywhere_in_text() {
        let rule = TabRule::pattern(r"^\[Guild\]", true);
        assert!(rule.matches("[Guild] hello"));
        assert!(!rule.matches("hello [Guild]"));

        let rule = TabRule::pattern("party", false);
        assert!(rule.matches("Join the PARTY now"));
    }

    #[test]
    fn invalid_pattern_fails_open() {
        let rule = TabRule::pattern("([unclosed", true);

        assert!(!rule.is_valid());
        assert!(rule.try_matches("([unclosed").is_err());
        assert!(!rule.matches("([unclosed"));
        assert!(!rule.matches(""));
    }

    #[test]
    fn substring_respects_case_setting() {
        assert!(TabRule::substring("Hello", true).matches("Hello world"));
        assert!(!TabRule::substring("hello", true).matches("Hello world"));
        assert!(TabRule::substring("hello", false).matches("HELLO world"));
        assert!(TabRule::substring("", true).matches(""));
    }

    #[test]
    fn keywords_match_whole_words_only() {
        let rule = TabRule::keywords(["trade", " wts "], false);

        assert!(rule.matches("WTS diamond sword"));
        assert!(rule.matches("anyone want to trade?"));
        assert!(!rule.matches("trader joe"));
        assert!(!rule.matches(""));
    }

    #[test]
    fn keywords_match_phrases_and_punctuation() {
        let rule = TabRule::keywords(["[Party]", "want to buy"], false);

        assert!(rule.is_valid());
        assert!(rule.matches("[Party] hi"));
        assert!(rule.matches("I WANT TO BUY x"));
        assert!(!rule.matches("I want to buyer x"));
        assert!(!rule.matches("Party hi"));
    }

    #[test]
    fn keywords_respect_case_setting() {
        let rule = TabRule::keywords(["WTS"], true);

        assert!(rule.matches("WTS sword"));
        assert!(!rule.matches("wts sword"));
    }

    #[test]
    fn blank_keywords_are_reported_and_never_match() {
        let rule = TabRule::keywords(["", "  "], true);

        assert_eq!(rule.build_error(), Some("no keywords"));
        assert!(rule.try_matches("anything").is_err());
        assert!(!rule.matches("anything"));
    }
}
