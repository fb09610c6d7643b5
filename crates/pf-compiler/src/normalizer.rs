//! Rule Normalizer
//!
//! Turns one raw line into a [`NormalizedRule`]: comments, config lines,
//! element hiding rules and blank lines go away, `@@` and the `$options`
//! suffix are stripped off. Commented-out sections are tracked across the
//! lines of one source.

use pf_core::OptionFlags;

use crate::config::Policy;
use crate::report::{DropReason, DropStats};

/// One line of a rule source and its position in it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawRule<'a> {
    pub text: &'a str,
    pub ordinal: usize,
}

/// Iterate the lines of a rule source.
pub fn raw_rules(source: &str) -> impl Iterator<Item = RawRule<'_>> {
    source
        .lines()
        .enumerate()
        .map(|(ordinal, text)| RawRule { text, ordinal })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedRule {
    pub pattern: String,
    pub options: OptionFlags,
    pub is_exception: bool,
    pub ordinal: usize,
}

/// Commented-out section tracking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SectionState {
    #[default]
    Scanning,
    Ignoring {
        count: usize,
    },
}

pub struct Normalizer<'p> {
    policy: &'p Policy,
    state: SectionState,
    stats: DropStats,
}

impl<'p> Normalizer<'p> {
    pub fn new(policy: &'p Policy) -> Self {
        Self {
            policy,
            state: SectionState::Scanning,
            stats: DropStats::default(),
        }
    }

    pub fn state(&self) -> SectionState {
        self.state
    }

    pub fn stats(&self) -> &DropStats {
        &self.stats
    }

    /// Normalize one line; `None` when the line is dropped.
    pub fn normalize(&mut self, raw: RawRule<'_>) -> Option<NormalizedRule> {
        self.stats.lines += 1;
        match self.process(raw) {
            Ok(rule) => {
                self.stats.accepted += 1;
                Some(rule)
            }
            Err(reason) => {
                if !matches!(reason, DropReason::Comment | DropReason::Blank) {
                    log::debug!("Dropped line {} ({}): {}", raw.ordinal + 1, reason, raw.text);
                }
                self.stats.record(reason);
                None
            }
        }
    }

    /// Close the current source, reporting an open ignored section.
    pub fn finish_source(&mut self) {
        if let SectionState::Ignoring { count } = self.state {
            log::info!("{} rules ignored", count);
        }
        self.state = SectionState::Scanning;
    }

    fn process(&mut self, raw: RawRule<'_>) -> Result<NormalizedRule, DropReason> {
        let line = raw.text.trim_end();

        if is_config_line(line) {
            return Err(DropReason::ConfigLine);
        }
        if is_selector(line) {
            return Err(DropReason::Selector);
        }

        let (is_exception, body) = match line.strip_prefix("@@") {
            Some(rest) => (true, rest),
            None => (false, line),
        };

        let (pattern, options) = split_options(body);

        if let Some(comment) = pattern.trim_start().strip_prefix('!') {
            self.enter_comment(comment.trim());
            return Err(DropReason::Comment);
        }

        if pattern.trim_matches('*').is_empty() {
            return Err(DropReason::Blank);
        }

        if let SectionState::Ignoring { count } = &mut self.state {
            *count += 1;
            return Err(DropReason::IgnoredSection);
        }

        let options = match options {
            Some(text) => parse_options(text)?,
            None => OptionFlags::empty(),
        };

        if is_empty_url(pattern) {
            return Err(DropReason::EmptyUrl);
        }

        if is_exception && !self.policy.include_exceptions {
            return Err(DropReason::ExceptionExcluded);
        }

        if options.intersects(self.policy.ignored_options) {
            return Err(DropReason::IgnoredOption);
        }

        Ok(NormalizedRule {
            pattern: pattern.to_string(),
            options,
            is_exception,
            ordinal: raw.ordinal,
        })
    }

    fn enter_comment(&mut self, comment: &str) {
        let opens_section = self
            .policy
            .ignored_sections
            .as_ref()
            .is_some_and(|re| re.is_match(comment));

        match (opens_section, self.state) {
            (true, SectionState::Scanning) => {
                log::info!("Ignoring rules following comment \"{}\"", comment);
                self.state = SectionState::Ignoring { count: 0 };
            }
            (true, SectionState::Ignoring { .. }) => {
                log::debug!("Still ignoring at comment \"{}\"", comment);
            }
            (false, SectionState::Ignoring { count }) => {
                log::info!("{} rules ignored", count);
                self.state = SectionState::Scanning;
            }
            (false, SectionState::Scanning) => {}
        }
    }
}

// =============================================================================
// Line Shapes
// =============================================================================

fn is_config_line(line: &str) -> bool {
    let line = line.trim_start();
    line.starts_with('[') && line.contains(']')
}

fn is_selector(line: &str) -> bool {
    ["##", "#@#", "#?#", "#$#"].iter().any(|marker| line.contains(marker))
}

/// `/.../` with something between the slashes.
pub fn is_raw_pattern(pattern: &str) -> bool {
    pattern.len() > 2 && pattern.starts_with('/') && pattern.ends_with('/')
}

/// `http://` or `https://` alone, bare or behind `|` / `||`.
fn is_empty_url(pattern: &str) -> bool {
    let rest = pattern
        .strip_prefix("||")
        .or_else(|| pattern.strip_prefix('|'))
        .unwrap_or(pattern);
    rest == "http://" || rest == "https://"
}

/// Split the `$options` suffix off at the first `$` followed by a known
/// option. Any other `$` is part of the pattern; a trailing `$` is an empty
/// suffix. Raw patterns keep their `$` anchors.
fn split_options(body: &str) -> (&str, Option<&str>) {
    if is_raw_pattern(body) {
        return (body, None);
    }
    if let Some(pattern) = body.strip_suffix('$') {
        return (pattern, None);
    }
    let start = body
        .match_indices('$')
        .map(|(pos, _)| pos)
        .find(|&pos| starts_with_option(&body[pos + 1..]));
    match start {
        Some(pos) => (&body[..pos], Some(&body[pos + 1..])),
        None => (body, None),
    }
}

fn starts_with_option(suffix: &str) -> bool {
    let token = suffix.split(',').next().unwrap_or_default();
    option_name(token).is_some_and(|name| OptionFlags::parse_option(name).is_some())
}

/// Option name of one token, without `~` negation or `=value`.
fn option_name(token: &str) -> Option<&str> {
    let token = token.trim();
    let name = token.strip_prefix('~').unwrap_or(token);
    let name = match name.find('=') {
        Some(pos) => &name[..pos],
        None => name,
    };
    (!name.is_empty()).then_some(name)
}

fn parse_options(text: &str) -> Result<OptionFlags, DropReason> {
    let mut flags = OptionFlags::empty();

    for name in text.split(',').filter_map(option_name) {
        flags |= OptionFlags::parse_option(name).ok_or(DropReason::UnsupportedOption)?;
    }

    Ok(flags)
}
