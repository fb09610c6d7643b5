//! Alternation matcher
//!
//! A pattern bucket is exported as one joined alternation, but it is not
//! evaluated as one. Alternatives without lookaround or back-references go
//! into a single linear-time `regex::Regex`. The wildcard alternatives need
//! `fancy_regex`, which counts backtracking steps per evaluation (roughly
//! text length times alternatives), so they are split into small chunks
//! with their capture indices renumbered.

use fancy_regex::RegexBuilder as FancyRegexBuilder;
use regex::RegexBuilder;

use crate::rulebase::RuleBaseError;

/// Alternatives per backtracking chunk.
const FANCY_CHUNK_SIZE: usize = 32;

/// Backtracking steps one chunk may take on one text.
const FANCY_BACKTRACK_LIMIT: usize = 10_000_000;

/// Compiled program size allowed for the linear part.
const PLAIN_SIZE_LIMIT: usize = 256 * (1 << 20);

// =============================================================================
// Scanning
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token {
    /// `\` and the byte after it
    Escape(u8),
    Open,
    Close,
    Bar,
}

/// Structural bytes of a regex source, skipping character classes.
struct Tokens<'a> {
    bytes: &'a [u8],
    pos: usize,
    in_class: bool,
}

fn tokens(source: &str) -> Tokens<'_> {
    Tokens {
        bytes: source.as_bytes(),
        pos: 0,
        in_class: false,
    }
}

impl Iterator for Tokens<'_> {
    type Item = (usize, Token);

    fn next(&mut self) -> Option<Self::Item> {
        while self.pos < self.bytes.len() {
            let at = self.pos;
            let byte = self.bytes[at];
            self.pos += 1;

            if byte == b'\\' {
                let escaped = self.bytes.get(self.pos).copied().unwrap_or(b'\\');
                self.pos += 1;
                if self.in_class {
                    continue;
                }
                return Some((at, Token::Escape(escaped)));
            }

            if self.in_class {
                if byte == b']' {
                    self.in_class = false;
                }
                continue;
            }

            match byte {
                b'[' => {
                    self.in_class = true;
                    if self.bytes.get(self.pos) == Some(&b'^') {
                        self.pos += 1;
                    }
                    // A leading `]` is a literal
                    if self.bytes.get(self.pos) == Some(&b']') {
                        self.pos += 1;
                    }
                }
                b'(' => return Some((at, Token::Open)),
                b')' => return Some((at, Token::Close)),
                b'|' => return Some((at, Token::Bar)),
                _ => {}
            }
        }
        None
    }
}

/// Split an alternation body at its top-level `|`.
pub(crate) fn split_alternatives(body: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;

    for (at, token) in tokens(body) {
        match token {
            Token::Open => depth += 1,
            Token::Close => depth = depth.saturating_sub(1),
            Token::Bar if depth == 0 => {
                parts.push(&body[start..at]);
                start = at + 1;
            }
            _ => {}
        }
    }
    parts.push(&body[start..]);
    parts
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Shape {
    /// Capture groups opened by the alternative
    groups: usize,
    /// Uses lookaround or back-references
    backtracking: bool,
}

fn shape(fragment: &str) -> Shape {
    const BACKTRACKING_GROUPS: &[&str] = &["?=", "?!", "?<=", "?<!", "?>", "?("];

    let mut shape = Shape::default();
    for (at, token) in tokens(fragment) {
        match token {
            Token::Escape(b'1'..=b'9' | b'k') => shape.backtracking = true,
            Token::Open => {
                let rest = &fragment[at + 1..];
                if BACKTRACKING_GROUPS.iter().any(|p| rest.starts_with(p)) {
                    shape.backtracking = true;
                } else if !rest.starts_with('?')
                    || rest.starts_with("?P<")
                    || rest.starts_with("?<")
                {
                    shape.groups += 1;
                }
            }
            _ => {}
        }
    }
    shape
}

/// Lower every numbered back-reference in `fragment` by `shift`.
fn renumber(fragment: &str, shift: usize) -> String {
    if shift == 0 {
        return fragment.to_string();
    }

    let mut out = String::with_capacity(fragment.len());
    let mut copied = 0;
    for (at, token) in tokens(fragment) {
        let Token::Escape(b'1'..=b'9') = token else {
            continue;
        };
        let digits = fragment[at + 1..]
            .bytes()
            .take_while(u8::is_ascii_digit)
            .count();
        let end = at + 1 + digits;
        if let Ok(n) = fragment[at + 1..end].parse::<usize>() {
            out.push_str(&fragment[copied..at + 1]);
            out.push_str(&n.saturating_sub(shift).to_string());
            copied = end;
        }
    }
    out.push_str(&fragment[copied..]);
    out
}

// =============================================================================
// Matcher
// =============================================================================

/// One alternative and its capture-group position in the joined regex.
#[derive(Debug, Clone, Copy)]
struct Alternative<'a> {
    fragment: &'a str,
    groups_before: usize,
    groups: usize,
}

/// Evaluates the alternatives of one bucket; matches when any does.
#[derive(Debug, Clone)]
pub(crate) struct SplitMatcher {
    plain: Option<regex::Regex>,
    fancy: Vec<fancy_regex::Regex>,
}

impl SplitMatcher {
    pub(crate) fn build(fragments: &[&str]) -> Result<Self, RuleBaseError> {
        let mut plain = Vec::new();
        let mut fancy = Vec::new();
        let mut groups_before = 0;

        for &fragment in fragments {
            let shape = shape(fragment);
            let alternative = Alternative {
                fragment,
                groups_before,
                groups: shape.groups,
            };
            groups_before += shape.groups;

            if shape.backtracking {
                fancy.push(alternative);
            } else {
                plain.push(alternative);
            }
        }

        let plain = match build_plain(&plain) {
            Some(regex) => Some(regex),
            None => {
                // Alternatives the linear engine rejects move to the chunks
                let (accepted, rejected): (Vec<_>, Vec<_>) = plain
                    .into_iter()
                    .partition(|alt| build_plain(&[*alt]).is_some());
                fancy.extend(rejected);
                build_plain(&accepted)
            }
        };

        let fancy = fancy
            .chunks(FANCY_CHUNK_SIZE)
            .map(build_fancy)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { plain, fancy })
    }

    pub(crate) fn is_match(&self, text: &str) -> bool {
        if self.plain.as_ref().is_some_and(|regex| regex.is_match(text)) {
            return true;
        }

        self.fancy.iter().any(|regex| match regex.is_match(text) {
            Ok(matched) => matched,
            Err(e) => {
                log::warn!("Alternation evaluation failed on {:?}: {}", text, e);
                false
            }
        })
    }

    /// Backtracking chunks, for tests.
    #[cfg(test)]
    fn fancy_chunks(&self) -> usize {
        self.fancy.len()
    }
}

fn build_plain(alternatives: &[Alternative<'_>]) -> Option<regex::Regex> {
    if alternatives.is_empty() {
        return None;
    }
    let joined: Vec<&str> = alternatives.iter().map(|alt| alt.fragment).collect();
    RegexBuilder::new(&joined.join("|"))
        .case_insensitive(true)
        .size_limit(PLAIN_SIZE_LIMIT)
        .build()
        .ok()
}

fn build_fancy(chunk: &[Alternative<'_>]) -> Result<fancy_regex::Regex, RuleBaseError> {
    let mut chunk_groups = 0;
    let mut renumbered = Vec::with_capacity(chunk.len());
    for alt in chunk {
        renumbered.push(renumber(alt.fragment, alt.groups_before - chunk_groups));
        chunk_groups += alt.groups;
    }

    FancyRegexBuilder::new(&format!("(?i)(?:{})", renumbered.join("|")))
        .backtrack_limit(FANCY_BACKTRACK_LIMIT)
        .build()
        .map_err(|e| RuleBaseError::InvalidPattern(Box::new(e)))
}
