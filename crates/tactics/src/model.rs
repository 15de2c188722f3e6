//! Structured forms of the tactics that appear in level solutions.
//!
//! Every supported tactic has a canonical text form. Parsing then printing a
//! canonical command gives the same text back, and printing then parsing a
//! [`Tactic`] gives the same value back.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Text after this marker is an inline comment and is dropped before parsing.
const COMMENT_MARKER: &str = "--";

/// Prefix marking a right-to-left rewrite rule.
const BACKWARD_MARKER: char = '←';

/// Errors produced while turning tactic text into a [`Tactic`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TacticParseError {
    /// Nothing left after stripping whitespace and comments.
    #[error("empty tactic command")]
    Empty,

    /// Leading keyword is not in the keyword table.
    #[error("unsupported tactic keyword: '{0}'")]
    UnknownKeyword(String),

    /// Keyword is known but the rest of the command has the wrong shape.
    #[error("unable to parse {keyword} command: '{command}'")]
    Malformed {
        keyword: &'static str,
        command: String,
    },

    /// A bracketed rule list with nothing usable in it.
    #[error("`{keyword}` requires at least one rewrite rule")]
    MissingRules { keyword: &'static str },

    /// `nth_rewrite` with more or fewer than one rule.
    #[error("`nth_rewrite` supports exactly one rewrite rule, found {0}")]
    RuleCount(usize),

    /// `nth_rewrite` without the occurrence index.
    #[error("`nth_rewrite` requires a numeric index: '{0}'")]
    MissingIndex(String),

    /// A rule or `apply` target that is blank.
    #[error("`{keyword}` requires a non-empty expression")]
    EmptyExpression { keyword: &'static str },

    /// Arguments given to a tactic that takes none.
    #[error("`{keyword}` takes no arguments: '{command}'")]
    UnexpectedArguments {
        keyword: &'static str,
        command: String,
    },
}

impl TacticParseError {
    /// The keyword this error refers to, when parsing got as far as the keyword.
    pub fn keyword(&self) -> Option<&str> {
        match self {
            Self::Empty => None,
            Self::UnknownKeyword(keyword) => Some(keyword.as_str()),
            Self::Malformed { keyword, .. }
            | Self::MissingRules { keyword }
            | Self::EmptyExpression { keyword }
            | Self::UnexpectedArguments { keyword, .. } => Some(*keyword),
            Self::RuleCount(_) | Self::MissingIndex(_) => Some(NTH_REWRITE),
        }
    }
}

const REWRITE: &str = "rw";
const APPLY: &str = "apply";
const NTH_REWRITE: &str = "nth_rewrite";
const RFL: &str = "rfl";

type ParseFn = fn(&str, &str) -> Result<Tactic, TacticParseError>;

/// Keyword to parser lookup. Anything not listed here is rejected.
const KEYWORDS: &[(&str, ParseFn)] = &[
    (REWRITE, parse_rewrite),
    (APPLY, parse_apply),
    (NTH_REWRITE, parse_nth_rewrite),
    (RFL, parse_rfl),
];

/// Keywords with a structured model, in table order.
pub fn supported_keywords() -> impl Iterator<Item = &'static str> {
    KEYWORDS.iter().map(|(keyword, _)| *keyword)
}

/// Whether `keyword` has a structured model.
pub fn is_supported_keyword(keyword: &str) -> bool {
    KEYWORDS.iter().any(|(k, _)| *k == keyword)
}

/// First whitespace-separated token of a command, after comment stripping.
pub fn leading_keyword(command: &str) -> Option<&str> {
    strip_inline_comment(command).split_whitespace().next()
}

/// Rewrite direction of a single rule.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[default]
    Forward,
    Backward,
}

/// One entry of a `rw [...]` or `nth_rewrite k [...]` rule list.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RuleRecord")]
pub struct RewriteRule {
    /// Lean expression used as the rewrite equation.
    pub expression: String,
    /// Left-to-right unless marked with `←`.
    pub direction: Direction,
}

/// Unchecked serde form of [`RewriteRule`].
#[derive(Deserialize)]
struct RuleRecord {
    expression: String,
    #[serde(default)]
    direction: Direction,
}

impl TryFrom<RuleRecord> for RewriteRule {
    type Error = TacticParseError;

    fn try_from(record: RuleRecord) -> Result<Self, Self::Error> {
        Self::new(record.expression, record.direction)
    }
}

impl RewriteRule {
    /// Checked constructor: trims the expression and rejects blank ones or
    /// ones carrying their own `←`.
    pub fn new(expression: impl Into<String>, direction: Direction) -> Result<Self, TacticParseError> {
        let rule = Self {
            expression: expression.into().trim().to_string(),
            direction,
        };
        if rule.expression.is_empty() {
            return Err(TacticParseError::EmptyExpression { keyword: REWRITE });
        }
        if rule.expression.starts_with(BACKWARD_MARKER) {
            return Err(TacticParseError::Malformed {
                keyword: REWRITE,
                command: rule.expression,
            });
        }
        Ok(rule)
    }

    /// Left-to-right rule. The expression is trimmed; blank ones are caught
    /// by [`Tactic::validate`].
    pub fn forward(expression: impl Into<String>) -> Self {
        Self {
            expression: expression.into().trim().to_string(),
            direction: Direction::Forward,
        }
    }

    pub fn backward(expression: impl Into<String>) -> Self {
        Self {
            expression: expression.into().trim().to_string(),
            direction: Direction::Backward,
        }
    }

    /// Parse `←? expression`.
    fn parse(keyword: &'static str, token: &str) -> Result<Self, TacticParseError> {
        let trimmed = token.trim();
        let (direction, expression) = match trimmed.strip_prefix(BACKWARD_MARKER) {
            Some(rest) => (Direction::Backward, rest.trim_start()),
            None => (Direction::Forward, trimmed),
        };
        if expression.is_empty() {
            return Err(TacticParseError::EmptyExpression { keyword });
        }
        Ok(Self {
            expression: expression.to_string(),
            direction,
        })
    }
}

impl fmt::Display for RewriteRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.direction {
            Direction::Forward => write!(f, "{}", self.expression),
            Direction::Backward => write!(f, "{BACKWARD_MARKER} {}", self.expression),
        }
    }
}

/// A tactic command with a structured model.
///
/// The serde tag is the tactic keyword, so JSON looks like
/// `{"tactic": "rw", "rules": [...], "location": "h"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "tactic", try_from = "TacticRecord")]
pub enum Tactic {
    /// `rw [r1, r2, ...] (at loc)?`
    #[serde(rename = "rw")]
    Rewrite {
        rules: Vec<RewriteRule>,
        #[serde(default)]
        location: Option<String>,
    },
    /// `apply expr (at loc)?`
    #[serde(rename = "apply")]
    Apply {
        expression: String,
        #[serde(default)]
        location: Option<String>,
    },
    /// `nth_rewrite k [rule] (at loc)?`
    #[serde(rename = "nth_rewrite")]
    NthRewrite {
        index: u32,
        rule: RewriteRule,
        #[serde(default)]
        location: Option<String>,
    },
    /// `rfl`
    #[serde(rename = "rfl")]
    Rfl,
}

impl Tactic {
    /// The keyword this tactic is written with.
    pub fn keyword(&self) -> &'static str {
        match self {
            Self::Rewrite { .. } => REWRITE,
            Self::Apply { .. } => APPLY,
            Self::NthRewrite { .. } => NTH_REWRITE,
            Self::Rfl => RFL,
        }
    }

    /// Single-rule rewrite with no location.
    pub fn rewrite(rule: RewriteRule) -> Self {
        Self::Rewrite {
            rules: vec![rule],
            location: None,
        }
    }

    /// `nth_rewrite` with no location.
    pub fn nth_rewrite(index: u32, rule: RewriteRule) -> Self {
        Self::NthRewrite {
            index,
            rule,
            location: None,
        }
    }

    /// Trim every text field and check that the value prints to a command
    /// that parses back to itself.
    ///
    /// Rejects empty rule lists, blank expressions and fields whose text
    /// would be read differently (an `apply` target containing ` at `, a rule
    /// containing a top-level comma, a comment marker).
    pub fn validate(self) -> Result<Self, TacticParseError> {
        let keyword = self.keyword();
        let trimmed = self.trimmed();
        match &trimmed {
            Self::Rewrite { rules, .. } if rules.is_empty() => {
                return Err(TacticParseError::MissingRules { keyword });
            }
            Self::Rewrite { rules, .. } if rules.iter().any(|r| r.expression.is_empty()) => {
                return Err(TacticParseError::EmptyExpression { keyword });
            }
            Self::NthRewrite { rule, .. } if rule.expression.is_empty() => {
                return Err(TacticParseError::EmptyExpression { keyword });
            }
            Self::Apply { expression, .. } if expression.is_empty() => {
                return Err(TacticParseError::EmptyExpression { keyword });
            }
            _ => {}
        }

        let text = trimmed.to_string();
        if parse_tactic(&text)? != trimmed {
            return Err(TacticParseError::Malformed {
                keyword,
                command: text,
            });
        }
        Ok(trimmed)
    }

    fn trimmed(self) -> Self {
        fn clean(location: Option<String>) -> Option<String> {
            location
                .map(|l| l.trim().to_string())
                .filter(|l| !l.is_empty())
        }
        fn clean_rule(rule: RewriteRule) -> RewriteRule {
            RewriteRule {
                expression: rule.expression.trim().to_string(),
                direction: rule.direction,
            }
        }
        match self {
            Self::Rewrite { rules, location } => Self::Rewrite {
                rules: rules.into_iter().map(clean_rule).collect(),
                location: clean(location),
            },
            Self::Apply {
                expression,
                location,
            } => Self::Apply {
                expression: expression.trim().to_string(),
                location: clean(location),
            },
            Self::NthRewrite {
                index,
                rule,
                location,
            } => Self::NthRewrite {
                index,
                rule: clean_rule(rule),
                location: clean(location),
            },
            Self::Rfl => Self::Rfl,
        }
    }
}

/// Unchecked serde form of [`Tactic`]; deserialized values go through
/// [`Tactic::validate`].
#[derive(Deserialize)]
#[serde(tag = "tactic")]
enum TacticRecord {
    #[serde(rename = "rw")]
    Rewrite {
        rules: Vec<RewriteRule>,
        #[serde(default)]
        location: Option<String>,
    },
    #[serde(rename = "apply")]
    Apply {
        expression: String,
        #[serde(default)]
        location: Option<String>,
    },
    #[serde(rename = "nth_rewrite")]
    NthRewrite {
        index: u32,
        rule: RewriteRule,
        #[serde(default)]
        location: Option<String>,
    },
    #[serde(rename = "rfl")]
    Rfl,
}

impl TryFrom<TacticRecord> for Tactic {
    type Error = TacticParseError;

    fn try_from(record: TacticRecord) -> Result<Self, Self::Error> {
        let tactic = match record {
            TacticRecord::Rewrite { rules, location } => Self::Rewrite { rules, location },
            TacticRecord::Apply {
                expression,
                location,
            } => Self::Apply {
                expression,
                location,
            },
            TacticRecord::NthRewrite {
                index,
                rule,
                location,
            } => Self::NthRewrite {
                index,
                rule,
                location,
            },
            TacticRecord::Rfl => Self::Rfl,
        };
        tactic.validate()
    }
}

impl fmt::Display for Tactic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let location = match self {
            Self::Rewrite { rules, location } => {
                write!(f, "{REWRITE} [")?;
                for (i, rule) in rules.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{rule}")?;
                }
                f.write_str("]")?;
                location
            }
            Self::Apply {
                expression,
                location,
            } => {
                write!(f, "{APPLY} {expression}")?;
                location
            }
            Self::NthRewrite {
                index,
                rule,
                location,
            } => {
                write!(f, "{NTH_REWRITE} {index} [{rule}]")?;
                location
            }
            Self::Rfl => return f.write_str(RFL),
        };
        if let Some(location) = location {
            write!(f, " at {location}")?;
        }
        Ok(())
    }
}

impl FromStr for Tactic {
    type Err = TacticParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_tactic(s)
    }
}

/// Parse a tactic command, dispatching on its leading keyword.
pub fn parse_tactic(command: &str) -> Result<Tactic, TacticParseError> {
    let cleaned = strip_inline_comment(command);
    let keyword = cleaned
        .split_whitespace()
        .next()
        .ok_or(TacticParseError::Empty)?;
    let (_, parse) = KEYWORDS
        .iter()
        .find(|(k, _)| *k == keyword)
        .ok_or_else(|| TacticParseError::UnknownKeyword(keyword.to_string()))?;
    parse(cleaned, &cleaned[keyword.len()..])
}

/// Parse and print a command, giving its canonical spelling.
pub fn normalize(command: &str) -> Result<String, TacticParseError> {
    parse_tactic(command).map(|tactic| tactic.to_string())
}

fn strip_inline_comment(command: &str) -> &str {
    match command.find(COMMENT_MARKER) {
        Some(pos) => command[..pos].trim(),
        None => command.trim(),
    }
}

fn parse_rewrite(command: &str, rest: &str) -> Result<Tactic, TacticParseError> {
    let malformed = || TacticParseError::Malformed {
        keyword: REWRITE,
        command: command.to_string(),
    };
    let (body, tail) = bracketed(rest.trim_start()).ok_or_else(malformed)?;
    let location = location_suffix(tail).ok_or_else(malformed)?;
    let tokens = split_arguments(body);
    if tokens.is_empty() {
        return Err(TacticParseError::MissingRules { keyword: REWRITE });
    }
    let rules = tokens
        .into_iter()
        .map(|token| RewriteRule::parse(REWRITE, token))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Tactic::Rewrite { rules, location })
}

fn parse_apply(_command: &str, rest: &str) -> Result<Tactic, TacticParseError> {
    let rest = rest.trim();
    if rest.is_empty() {
        return Err(TacticParseError::EmptyExpression { keyword: APPLY });
    }
    let (expression, location) = split_location(rest);
    Ok(Tactic::Apply {
        expression: expression.to_string(),
        location: location.map(str::to_string),
    })
}

fn parse_nth_rewrite(command: &str, rest: &str) -> Result<Tactic, TacticParseError> {
    let malformed = || TacticParseError::Malformed {
        keyword: NTH_REWRITE,
        command: command.to_string(),
    };
    let rest = rest.trim_start();
    let digits = rest.len() - rest.trim_start_matches(|c: char| c.is_ascii_digit()).len();
    if digits == 0 {
        return Err(TacticParseError::MissingIndex(command.to_string()));
    }
    // Present but out of range for u32.
    let index: u32 = rest[..digits].parse().map_err(|_| malformed())?;

    let after_index = &rest[digits..];
    if !after_index.starts_with(char::is_whitespace) {
        return Err(malformed());
    }
    let (body, tail) = bracketed(after_index.trim_start()).ok_or_else(malformed)?;
    let location = location_suffix(tail).ok_or_else(malformed)?;
    let tokens = split_arguments(body);
    if tokens.len() != 1 {
        return Err(TacticParseError::RuleCount(tokens.len()));
    }
    let rule = RewriteRule::parse(NTH_REWRITE, tokens[0])?;
    Ok(Tactic::NthRewrite {
        index,
        rule,
        location,
    })
}

fn parse_rfl(command: &str, rest: &str) -> Result<Tactic, TacticParseError> {
    if rest.trim().is_empty() {
        Ok(Tactic::Rfl)
    } else {
        Err(TacticParseError::UnexpectedArguments {
            keyword: RFL,
            command: command.to_string(),
        })
    }
}

/// Split `[body] tail` at the bracket that closes the opening one.
fn bracketed(text: &str) -> Option<(&str, &str)> {
    let inner = text.strip_prefix('[')?;
    let mut depth = 0usize;
    for (i, c) in inner.char_indices() {
        match c {
            '(' | '[' | '{' => depth += 1,
            ')' | '}' => depth = depth.saturating_sub(1),
            ']' if depth == 0 => return Some((&inner[..i], &inner[i + 1..])),
            ']' => depth -= 1,
            _ => {}
        }
    }
    None
}

/// Parse what follows a closing bracket: nothing, or ` at <location>`.
///
/// `None` means the tail is not a valid location clause.
fn location_suffix(tail: &str) -> Option<Option<String>> {
    if tail.trim().is_empty() {
        return Some(None);
    }
    if !tail.starts_with(char::is_whitespace) {
        return None;
    }
    let location = tail
        .trim_start()
        .strip_prefix("at")
        .filter(|rest| rest.starts_with(char::is_whitespace))
        .map(str::trim)
        .filter(|rest| !rest.is_empty())?;
    Some(Some(location.to_string()))
}

/// Split `expr at loc` at the first top-level `at` keyword.
fn split_location(text: &str) -> (&str, Option<&str>) {
    let mut depth = 0usize;
    for (i, c) in text.char_indices() {
        match c {
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => depth = depth.saturating_sub(1),
            c if depth == 0 && c.is_whitespace() => {
                let after = text[i..].trim_start();
                if let Some(location) = after.strip_prefix("at") {
                    if location.starts_with(char::is_whitespace) && !location.trim().is_empty() {
                        return (text[..i].trim_end(), Some(location.trim()));
                    }
                }
            }
            _ => {}
        }
    }
    (text, None)
}

/// Split a comma separated list, ignoring commas inside nested brackets.
pub(crate) fn split_arguments(block: &str) -> Vec<&str> {
    let mut entries = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, c) in block.char_indices() {
        match c {
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                let entry = block[start..i].trim();
                if !entry.is_empty() {
                    entries.push(entry);
                }
                start = i + 1;
            }
            _ => {}
        }
    }
    let tail = block[start..].trim();
    if !tail.is_empty() {
        entries.push(tail);
    }
    entries
}
