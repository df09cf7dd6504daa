use anyhow::{Context, Result};
use regex::{Regex, RegexBuilder};
use std::collections::HashSet;

/// Whole-word, case-insensitive matcher over a banned keyword list
#[derive(Debug, Clone, Default)]
pub struct KeywordClassifier {
    pattern: Option<Regex>,
}

impl KeywordClassifier {
    /// Compile the keyword set. Blank entries are ignored; an empty set
    /// excludes nothing.
    pub fn new<I, S>(banned_keywords: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut keywords: Vec<String> = banned_keywords
            .into_iter()
            .map(|kw| kw.as_ref().trim().to_string())
            .filter(|kw| !kw.is_empty())
            .collect();

        if keywords.is_empty() {
            return Ok(Self { pattern: None });
        }

        // Longest first so "studio apartman" wins over "studio" in the alternation
        keywords.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
        keywords.dedup();

        let alternatives: Vec<String> = keywords.iter().map(|kw| whole_word(kw)).collect();
        let source = alternatives.join("|");
        let pattern = RegexBuilder::new(&source)
            .case_insensitive(true)
            .unicode(true)
            .build()
            .context("Failed to compile banned keyword pattern")?;

        Ok(Self {
            pattern: Some(pattern),
        })
    }

    /// True when `title` contains any banned keyword as a separate word
    pub fn is_excluded(&self, title: &str) -> bool {
        self.pattern
            .as_ref()
            .map(|re| re.is_match(title))
            .unwrap_or(false)
    }

    /// First banned keyword found in `title`, as written in the title
    pub fn matched<'t>(&self, title: &'t str) -> Option<&'t str> {
        let caps = self.pattern.as_ref()?.captures(title)?;
        caps.iter().skip(1).flatten().next().map(|m| m.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.pattern.is_none()
    }
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Pattern for `keyword` standing on its own: the keyword is captured, and
/// neither neighbour may be a word character. `\b` only works on edges that
/// are word characters themselves, so symbol edges ("C++") get an explicit
/// non-word-or-end check instead.
fn whole_word(keyword: &str) -> String {
    let starts_with_word = keyword.chars().next().map_or(false, is_word_char);
    let ends_with_word = keyword.chars().last().map_or(false, is_word_char);

    let left = if starts_with_word { r"\b" } else { r"(?:^|\W)" };
    let right = if ends_with_word { r"\b" } else { r"(?:\W|$)" };
    format!("{}({}){}", left, regex::escape(keyword), right)
}

/// One-shot check without keeping a compiled classifier around
pub fn is_excluded(title: &str, banned_keywords: &HashSet<String>) -> bool {
    KeywordClassifier::new(banned_keywords)
        .map(|classifier| classifier.is_excluded(title))
        .unwrap_or(false)
}
