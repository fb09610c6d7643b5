//! Pattern Compiler
//!
//! Translates a classified rule into a regex fragment that can be joined
//! with thousands of others into one alternation.
//!
//! A wildcard becomes `(?=([\s\S]*?rest))\N`: the lookahead captures the
//! shortest run up to the following literal span and the back-reference
//! consumes it. The engine never backtracks into the run, so the cost of
//! each wildcard stays linear no matter how many alternatives share the
//! regex. Every wildcard in one alternation needs its own capture index;
//! [`WildcardIndex`] hands them out.

use pf_core::Category;

use crate::report::DropReason;

/// Separator `^`: a character that is not a word character, dot, percent
/// sign or hyphen, or the end of the string.
const SEPARATOR: &str = r"(?:[^\w.%-]|$)";

/// Characters escaped in literal spans.
const REGEX_SPECIAL: &[char] = &[
    '\\', '.', '+', '*', '?', '(', ')', '[', ']', '{', '}', '$',
];

/// Back-reference index allocator, one per compiled alternation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WildcardIndex {
    next: usize,
}

impl WildcardIndex {
    pub fn new() -> Self {
        Self { next: 1 }
    }

    /// Take the next index.
    pub fn advance(&mut self) -> usize {
        let index = self.next;
        self.next += 1;
        index
    }

    /// Indices handed out so far.
    pub fn used(&self) -> usize {
        self.next - 1
    }
}

impl Default for WildcardIndex {
    fn default() -> Self {
        Self::new()
    }
}

/// Compile one bucket rule into an alternation fragment.
pub fn compile_rule(category: Category, pattern: &str, index: &mut WildcardIndex) -> String {
    if category == Category::RawPattern {
        compile_raw(pattern)
    } else {
        compile_pattern(pattern, category.is_domain_anchored(), index)
    }
}

/// Compile an EasyList-style pattern (`*`, `^`, `|`) into a regex fragment.
pub fn compile_pattern(pattern: &str, domain_anchored: bool, index: &mut WildcardIndex) -> String {
    let mut out = String::with_capacity(pattern.len() * 2);
    if domain_anchored {
        out.push('^');
    }

    let last = pattern.len().saturating_sub(1);
    let mut offset = 0;

    for (i, span) in pattern.split('*').enumerate() {
        let start = offset;
        offset += span.len() + 1;
        if span.is_empty() {
            continue;
        }

        if i == 0 {
            translate_span(&mut out, span, start, last);
        } else {
            let n = index.advance();
            out.push_str(r"(?=([\s\S]*?");
            translate_span(&mut out, span, start, last);
            out.push_str("))\\");
            out.push_str(&n.to_string());
        }
    }

    out
}

/// Number of back-reference indices [`compile_pattern`] will consume.
pub fn count_wildcards(category: Category, pattern: &str) -> usize {
    if category == Category::RawPattern {
        return 0;
    }
    pattern
        .split('*')
        .skip(1)
        .filter(|span| !span.is_empty())
        .count()
}

/// Raw patterns keep their own syntax.
pub fn compile_raw(raw: &str) -> String {
    format!("(?:{raw})")
}

/// Check that a raw pattern can sit inside an alternation on its own.
pub fn validate_raw(raw: &str) -> Result<(), DropReason> {
    if has_backreference(raw) {
        return Err(DropReason::RawBackreference);
    }
    fancy_regex::Regex::new(&format!("(?i){}", compile_raw(raw)))
        .map(|_| ())
        .map_err(|_| DropReason::InvalidRawPattern)
}

/// `\1`..`\9` or `\k<name>` outside an escaped backslash.
fn has_backreference(raw: &str) -> bool {
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            continue;
        }
        match chars.next() {
            Some('1'..='9') | Some('k') => return true,
            _ => {}
        }
    }
    false
}

/// Translate one literal span. `start` is its offset in the whole pattern,
/// `last` the offset of the pattern's final character.
fn translate_span(out: &mut String, span: &str, start: usize, last: usize) {
    for (i, c) in span.char_indices() {
        let pos = start + i;
        match c {
            '|' if pos == 0 => out.push('^'),
            '|' if pos == last => out.push('$'),
            '|' => out.push_str(r"\|"),
            '^' => out.push_str(SEPARATOR),
            c if REGEX_SPECIAL.contains(&c) => {
                out.push('\\');
                out.push(c);
            }
            c => out.push(c),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compile(pattern: &str, anchored: bool) -> String {
        compile_pattern(pattern, anchored, &mut WildcardIndex::new())
    }

    #[test]
    fn escapes_literals() {
        assert_eq!(compile("a.b/c?d=(1)", false), r"a\.b/c\?d=\(1\)");
        assert_eq!(compile("x$y+z", true), r"^x\$y\+z");
        assert_eq!(compile(r"a\b", false), r"a\\b");
    }

    #[test]
    fn translates_anchors_and_separators() {
        assert_eq!(compile("|http:", false), "^http:");
        assert_eq!(compile("ad.js|", false), r"ad\.js$");
        assert_eq!(compile("a|b", false), r"a\|b");
        assert_eq!(compile("/ads^", false), r"/ads(?:[^\w.%-]|$)");
    }

    #[test]
    fn wildcards_take_consecutive_indices() {
        let mut index = WildcardIndex::new();
        let first = compile_pattern("a.*.com", true, &mut index);
        let second = compile_pattern("x*y*z", false, &mut index);

        assert_eq!(first, r"^a\.(?=([\s\S]*?\.com))\1");
        assert_eq!(second, r"x(?=([\s\S]*?y))\2(?=([\s\S]*?z))\3");
        assert_eq!(index.used(), 3);
    }

    #[test]
    fn wildcard_runs_collapse() {
        let mut index = WildcardIndex::new();
        assert_eq!(
            compile_pattern("a**b*", false, &mut index),
            r"a(?=([\s\S]*?b))\1"
        );
        assert_eq!(index.used(), 1);
        assert_eq!(count_wildcards(Category::UrlFragment, "a**b*"), 1);
        assert_eq!(count_wildcards(Category::UrlFragment, "*a*b"), 2);
    }

    #[test]
    fn end_anchor_inside_wildcard_span() {
        assert_eq!(
            compile("example.com/*.js|", true),
            r"^example\.com/(?=([\s\S]*?\.js$))\1"
        );
    }

    #[test]
    fn compiled_wildcards_match_like_globs() {
        let mut index = WildcardIndex::new();
        let fragment = compile_pattern("a.*.com", true, &mut index);
        let re = fancy_regex::Regex::new(&format!("(?i)(?:{fragment})")).unwrap();

        assert!(re.is_match("a.foo.com").unwrap());
        assert!(re.is_match("A.Foo.COM").unwrap());
        assert!(!re.is_match("a.com").unwrap());
        assert!(!re.is_match("xa.foo.com").unwrap());
    }

    #[test]
    fn raw_patterns_are_validated() {
        assert_eq!(compile_raw(r"banner\d+"), r"(?:banner\d+)");
        assert_eq!(validate_raw(r"banner\d+\.gif"), Ok(()));
        assert_eq!(validate_raw(r"ads(\d+"), Err(DropReason::InvalidRawPattern));
        assert_eq!(validate_raw(r"(a)\1"), Err(DropReason::RawBackreference));
        assert_eq!(validate_raw(r"(?<x>a)\k<x>"), Err(DropReason::RawBackreference));
        assert_eq!(validate_raw(r"a\\1"), Ok(()));
        assert_eq!(count_wildcards(Category::RawPattern, "a.*b"), 0);
    }
}
