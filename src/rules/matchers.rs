//! Match operators and their compiled form.
//!
//! A rule's operator is resolved once into a [`Matcher`], which carries the
//! case-folded match value and, for the regex operators, the compiled
//! pattern. Matching against many messages then reuses the same compiled
//! predicate without touching the rule record again.

use std::borrow::Cow;
use std::cmp::Ordering;

use regex_lite::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{RuleError, RuleResult};

/// Comparison operator applied between a header value and the match value.
///
/// Every operator has a negated counterpart returning the exact
/// complement. The serde tokens are the persisted rule vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum MatchType {
    #[default]
    #[serde(rename = "contains")]
    Contains,
    #[serde(rename = "ncontains")]
    NotContains,
    #[serde(rename = "starts")]
    Starts,
    #[serde(rename = "nstarts")]
    NotStarts,
    #[serde(rename = "ends")]
    Ends,
    #[serde(rename = "nends")]
    NotEnds,
    #[serde(rename = "equals")]
    Equals,
    #[serde(rename = "nequals")]
    NotEquals,
    #[serde(rename = "greater")]
    Greater,
    #[serde(rename = "greatereq")]
    GreaterEq,
    #[serde(rename = "lower")]
    Lower,
    #[serde(rename = "lowereq")]
    LowerEq,
    #[serde(rename = "ngreater")]
    NotGreater,
    #[serde(rename = "ngreatereq")]
    NotGreaterEq,
    #[serde(rename = "nlower")]
    NotLower,
    #[serde(rename = "nlowereq")]
    NotLowerEq,
    #[serde(rename = "re_match")]
    RegexMatch,
    #[serde(rename = "nre_match")]
    NotRegexMatch,
}

impl MatchType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchType::Contains => "contains",
            MatchType::NotContains => "ncontains",
            MatchType::Starts => "starts",
            MatchType::NotStarts => "nstarts",
            MatchType::Ends => "ends",
            MatchType::NotEnds => "nends",
            MatchType::Equals => "equals",
            MatchType::NotEquals => "nequals",
            MatchType::Greater => "greater",
            MatchType::GreaterEq => "greatereq",
            MatchType::Lower => "lower",
            MatchType::LowerEq => "lowereq",
            MatchType::NotGreater => "ngreater",
            MatchType::NotGreaterEq => "ngreatereq",
            MatchType::NotLower => "nlower",
            MatchType::NotLowerEq => "nlowereq",
            MatchType::RegexMatch => "re_match",
            MatchType::NotRegexMatch => "nre_match",
        }
    }

    /// Whether this operator interprets the match value as a regular
    /// expression.
    pub fn is_regex(&self) -> bool {
        matches!(self, MatchType::RegexMatch | MatchType::NotRegexMatch)
    }

    pub fn is_negated(&self) -> bool {
        matches!(
            self,
            MatchType::NotContains
                | MatchType::NotStarts
                | MatchType::NotEnds
                | MatchType::NotEquals
                | MatchType::NotGreater
                | MatchType::NotGreaterEq
                | MatchType::NotLower
                | MatchType::NotLowerEq
                | MatchType::NotRegexMatch
        )
    }

    /// The positive operator this one is based on.
    fn positive(&self) -> MatchType {
        match self {
            MatchType::NotContains => MatchType::Contains,
            MatchType::NotStarts => MatchType::Starts,
            MatchType::NotEnds => MatchType::Ends,
            MatchType::NotEquals => MatchType::Equals,
            MatchType::NotGreater => MatchType::Greater,
            MatchType::NotGreaterEq => MatchType::GreaterEq,
            MatchType::NotLower => MatchType::Lower,
            MatchType::NotLowerEq => MatchType::LowerEq,
            MatchType::NotRegexMatch => MatchType::RegexMatch,
            positive => *positive,
        }
    }
}

/// Compiled predicate of one rule.
///
/// Built once per rule from `(match_type, match_value, match_case)`; pure
/// and reusable across any number of messages. Case-insensitive matching
/// folds the match value here and the header value at call time; for the
/// regex operators the pattern itself is folded before compilation and the
/// match value operand is otherwise ignored.
#[derive(Debug, Clone)]
pub struct Matcher {
    match_type: MatchType,
    match_case: bool,
    needle: String,
    regex: Option<Regex>,
}

impl Matcher {
    /// Compile the predicate. Fails only for an uncompilable regex.
    pub fn compile(match_type: MatchType, match_value: &str, match_case: bool) -> RuleResult<Self> {
        let needle = if match_case {
            match_value.to_string()
        } else {
            match_value.to_lowercase()
        };

        let regex = if match_type.is_regex() {
            Some(
                Regex::new(&needle).map_err(|source| RuleError::InvalidRegex {
                    pattern: match_value.to_string(),
                    source,
                })?,
            )
        } else {
            None
        };

        Ok(Self {
            match_type,
            match_case,
            needle,
            regex,
        })
    }

    pub fn match_type(&self) -> MatchType {
        self.match_type
    }

    /// Apply the predicate to one header value.
    pub fn matches(&self, haystack: &str) -> bool {
        let haystack: Cow<'_, str> = if self.match_case {
            Cow::Borrowed(haystack)
        } else {
            Cow::Owned(haystack.to_lowercase())
        };

        let hit = match self.match_type.positive() {
            MatchType::Contains => haystack.contains(&self.needle),
            MatchType::Starts => haystack.starts_with(&self.needle),
            MatchType::Ends => haystack.ends_with(&self.needle),
            MatchType::Equals => haystack.as_ref() == self.needle,
            MatchType::Greater => compare(&haystack, &self.needle) == Ordering::Greater,
            MatchType::GreaterEq => compare(&haystack, &self.needle) != Ordering::Less,
            MatchType::Lower => compare(&haystack, &self.needle) == Ordering::Less,
            MatchType::LowerEq => compare(&haystack, &self.needle) != Ordering::Greater,
            MatchType::RegexMatch => self
                .regex
                .as_ref()
                .and_then(|regex| regex.find(&haystack))
                .map_or(false, |found| found.start() == 0),
            // positive() only returns positive variants
            _ => false,
        };

        hit != self.match_type.is_negated()
    }
}

/// Ordering used by the greater/lower operator family: numeric when both
/// sides parse as numbers, lexicographic otherwise.
fn compare(haystack: &str, needle: &str) -> Ordering {
    if let (Ok(a), Ok(b)) = (
        haystack.trim().parse::<f64>(),
        needle.trim().parse::<f64>(),
    ) {
        if let Some(ordering) = a.partial_cmp(&b) {
            return ordering;
        }
    }

    haystack.cmp(needle)
}
