//! Mail feed rules
//!
//! A feed owns an ordered list of rules; each rule matches one header
//! field against a value with a chosen operator and decides what happens
//! to the message. Rules can be grouped, with an any/all combinator per
//! group and another across the whole feed.

pub mod actions;
pub mod engine;
pub mod matchers;

#[cfg(test)]
mod tests;

pub use actions::{FeedConfig, FinishAction, MatchAction};
pub use engine::{CompiledRule, MatchOutcome, RuleEngine, RuleSet};
pub use matchers::{MatchType, Matcher};

use std::fmt;

use regex_lite::Regex;
use serde::{Deserialize, Serialize};

use crate::error::RuleError;
use crate::headers::{HeaderCatalog, HeaderField};

/// Combinator between several rules or the members of a rule group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RulesOperation {
    /// Any rule matches.
    #[default]
    Any,
    /// All rules must match.
    All,
}

impl RulesOperation {
    pub fn as_str(&self) -> &'static str {
        match self {
            RulesOperation::Any => "any",
            RulesOperation::All => "all",
        }
    }
}

/// One mail feed rule.
///
/// Belongs to a feed; `account_id` optionally narrows it to a single mail
/// account (none means all accounts). `is_valid` / `check_error` cache the
/// result of the last validity check and are recomputed whenever a
/// matching-relevant field changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MailRule {
    pub id: i64,
    pub feed_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_id: Option<i64>,

    /// Rules sharing a group are combined with `group_operation`.
    #[serde(default)]
    pub group: Option<i32>,
    #[serde(default)]
    pub group_operation: RulesOperation,

    #[serde(default)]
    pub header_field: HeaderField,
    /// Header name used when `header_field` is `Other`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub other_header: Option<String>,

    #[serde(default)]
    pub match_type: MatchType,
    #[serde(default)]
    pub match_case: bool,
    pub match_value: String,

    /// None inherits the feed default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub match_action: Option<MatchAction>,
    /// None inherits the feed default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_action: Option<FinishAction>,

    /// Evaluation and display order within the feed.
    #[serde(default)]
    pub position: i32,

    #[serde(default = "default_true")]
    pub is_valid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub check_error: Option<String>,
}

fn default_true() -> bool {
    true
}

impl Default for MailRule {
    fn default() -> Self {
        Self {
            id: 0,
            feed_id: 0,
            account_id: None,
            group: None,
            group_operation: RulesOperation::default(),
            header_field: HeaderField::default(),
            other_header: None,
            match_type: MatchType::default(),
            match_case: false,
            match_value: String::new(),
            match_action: None,
            finish_action: None,
            position: 0,
            is_valid: true,
            check_error: None,
        }
    }
}

impl fmt::Display for MailRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let field = match (&self.header_field, &self.other_header) {
            (HeaderField::Other, Some(name)) => name.as_str(),
            (field, _) => field.as_str(),
        };
        write!(
            f,
            "Rule #{}: {} {} \"{}\"",
            self.id,
            field,
            self.match_type.as_str(),
            self.match_value
        )
    }
}

impl MailRule {
    /// Recompute and cache the rule's validity.
    ///
    /// Checks that an `Other` rule names a recognized header (trimmed,
    /// one trailing colon stripped, the normalized name written back) and
    /// that a regex rule's match value compiles. Returns whether
    /// `is_valid` or `check_error` actually changed, so callers can skip
    /// redundant writes; re-checking an untouched valid rule changes
    /// nothing.
    pub fn check_is_valid(&mut self, catalog: &HeaderCatalog) -> bool {
        let mut is_valid = true;
        let mut check_error = None;

        if self.header_field == HeaderField::Other {
            let normalized = self.other_header.as_ref().map(|raw| {
                let trimmed = raw.trim();
                trimmed.strip_suffix(':').unwrap_or(trimmed).to_string()
            });

            match normalized {
                None => {
                    is_valid = false;
                    check_error = Some(RuleError::MissingOtherHeader.to_string());
                }
                Some(name) if name.is_empty() => {
                    is_valid = false;
                    check_error = Some(RuleError::MissingOtherHeader.to_string());
                    self.other_header = Some(name);
                }
                Some(name) => {
                    if !catalog.is_recognized(&name) {
                        is_valid = false;
                        check_error = Some(RuleError::UnrecognizedHeader(name.clone()).to_string());
                    }
                    self.other_header = Some(name);
                }
            }
        }

        if self.match_type.is_regex() {
            if let Err(source) = Regex::new(&self.match_value) {
                is_valid = false;
                check_error = Some(
                    RuleError::InvalidRegex {
                        pattern: self.match_value.clone(),
                        source,
                    }
                    .to_string(),
                );
            }
        }

        let changed = is_valid != self.is_valid || check_error != self.check_error;

        self.is_valid = is_valid;
        self.check_error = check_error;

        changed
    }

    /// Match action, falling back to the feed default.
    pub fn resolved_match_action(&self, feed: &FeedConfig) -> MatchAction {
        self.match_action.unwrap_or(feed.match_action)
    }

    /// Finish action, falling back to the feed default.
    pub fn resolved_finish_action(&self, feed: &FeedConfig) -> FinishAction {
        self.finish_action.unwrap_or(feed.finish_action)
    }

    /// Compact JSON description, recorded with match outcomes.
    pub fn summary_json(&self) -> serde_json::Value {
        serde_json::json!({
            "id": self.id,
            "group": self.group,
            "group_operation": self.group_operation.as_str(),
            "position": self.position,
            "header_field": self.header_field.as_str(),
            "other_header": self.other_header,
            "match_type": self.match_type.as_str(),
            "match_value": self.match_value,
        })
    }
}
