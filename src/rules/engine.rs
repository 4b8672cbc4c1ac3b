//! Rule engine - compiles rules and applies them to messages.

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use super::actions::{FeedConfig, FinishAction, MatchAction};
use super::matchers::Matcher;
use super::{MailRule, RulesOperation};
use crate::error::{RuleError, RuleResult};
use crate::headers::{HeaderCatalog, HeaderField};
use crate::message::MessageHeaders;

/// Immutable compiled form of one rule.
///
/// Carries the rule itself, its compiled predicate and the concrete
/// header names its field expands to. Building this once per rule keeps
/// evaluation against many messages free of any per-call setup, and a
/// compiled rule can never fail at match time.
#[derive(Debug, Clone)]
pub struct CompiledRule {
    rule: MailRule,
    matcher: Matcher,
    header_names: Vec<String>,
}

impl CompiledRule {
    pub fn rule(&self) -> &MailRule {
        &self.rule
    }

    /// True if the message satisfies this rule, group membership aside.
    ///
    /// Short-circuiting OR over every (header name, candidate value)
    /// pair of the rule's field; an absent header compares as the empty
    /// string, which deliberately lets negated operators match messages
    /// lacking the header.
    pub fn matches(&self, message: &MessageHeaders) -> bool {
        for name in &self.header_names {
            match message.get(name) {
                Some(value) => {
                    for candidate in value.candidates() {
                        if self.matcher.matches(&candidate) {
                            return true;
                        }
                    }
                }
                None => {
                    if self.matcher.matches("") {
                        return true;
                    }
                }
            }
        }

        false
    }
}

/// Compiles rules against a header catalogue.
#[derive(Debug, Clone, Default)]
pub struct RuleEngine {
    catalog: HeaderCatalog,
}

impl RuleEngine {
    /// Engine over the standard header catalogue.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_catalog(catalog: HeaderCatalog) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &HeaderCatalog {
        &self.catalog
    }

    /// Compile one rule into its immutable evaluated form.
    ///
    /// Re-checks well-formedness regardless of the cached `is_valid`
    /// flag, and refuses rules already flagged invalid instead of
    /// evaluating them.
    pub fn compile(&self, rule: &MailRule) -> RuleResult<CompiledRule> {
        if !rule.is_valid {
            return Err(RuleError::RuleNotValid {
                id: rule.id,
                reason: rule.check_error.clone().unwrap_or_default(),
            });
        }

        let header_names = if rule.header_field == HeaderField::Other {
            let raw = rule
                .other_header
                .as_deref()
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .ok_or(RuleError::MissingOtherHeader)?;
            let name = raw.strip_suffix(':').unwrap_or(raw);

            if !self.catalog.is_recognized(name) {
                return Err(RuleError::UnrecognizedHeader(name.to_string()));
            }

            vec![name.to_string()]
        } else {
            self.catalog.headers_for(rule.header_field).to_vec()
        };

        let matcher = Matcher::compile(rule.match_type, &rule.match_value, rule.match_case)?;

        Ok(CompiledRule {
            rule: rule.clone(),
            matcher,
            header_names,
        })
    }

    /// Compile a feed's rules into an evaluation-ready set.
    ///
    /// Rules flagged invalid or failing compilation are skipped with a
    /// warning, and the survivors ordered by (group, position) the way
    /// the feed presents them.
    pub fn compile_set(&self, feed: FeedConfig, rules: &[MailRule]) -> RuleSet {
        let mut compiled = Vec::with_capacity(rules.len());

        for rule in rules {
            match self.compile(rule) {
                Ok(rule) => compiled.push(rule),
                Err(err) => warn!("Skipping rule on feed {}: {}", feed.id, err),
            }
        }

        compiled.sort_by_key(|c| (c.rule.group, c.rule.position));

        RuleSet {
            feed,
            rules: compiled,
        }
    }
}

/// Verdict of a rule set over one message, for the dispatcher.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchOutcome {
    /// Compact descriptions of the rules that produced the verdict.
    pub matched_rules: Vec<serde_json::Value>,
    pub match_action: MatchAction,
    pub finish_action: FinishAction,
}

/// A feed's compiled rules, ordered by (group, position).
#[derive(Debug, Clone)]
pub struct RuleSet {
    feed: FeedConfig,
    rules: Vec<CompiledRule>,
}

impl RuleSet {
    pub fn feed(&self) -> &FeedConfig {
        &self.feed
    }

    pub fn rules(&self) -> &[CompiledRule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// True if the message matches this rule, or the rule's whole group
    /// when it belongs to one (combined under the rule's own
    /// `group_operation`).
    pub fn match_rule(&self, rule: &CompiledRule, message: &MessageHeaders) -> bool {
        match rule.rule().group {
            Some(group) => self.match_group_with(group, rule.rule().group_operation, message),
            None => rule.matches(message),
        }
    }

    /// True if the group's members, combined under the group's own
    /// combinator, match the message.
    pub fn match_group(&self, group: i32, message: &MessageHeaders) -> bool {
        let operation = self
            .rules
            .iter()
            .find(|c| c.rule().group == Some(group))
            .map(|c| c.rule().group_operation)
            .unwrap_or_default();

        self.match_group_with(group, operation, message)
    }

    fn match_group_with(
        &self,
        group: i32,
        operation: RulesOperation,
        message: &MessageHeaders,
    ) -> bool {
        let any = operation == RulesOperation::Any;

        for member in self.rules.iter().filter(|c| c.rule().group == Some(group)) {
            if member.matches(message) {
                if any {
                    // First match makes the group be true.
                    return true;
                }
            } else if !any {
                // First non-match kills the group.
                return false;
            }
        }

        !any
    }

    /// Evaluate the whole set against one message.
    ///
    /// Rules are taken in order, each group answering once for all of
    /// its members, and combined under the feed's `rules_operation`:
    /// `Any` yields an outcome for the first hit, `All` requires every
    /// rule or group to match and then yields an outcome naming all of
    /// them. `None` means the message is left alone.
    pub fn evaluate(&self, message: &MessageHeaders) -> Option<MatchOutcome> {
        if self.rules.is_empty() {
            return None;
        }

        let any_mode = self.feed.rules_operation == RulesOperation::Any;
        let mut seen_groups: Vec<i32> = Vec::new();

        for compiled in &self.rules {
            if let Some(group) = compiled.rule().group {
                if seen_groups.contains(&group) {
                    // The first member already answered for the group.
                    continue;
                }
                seen_groups.push(group);
            }

            if self.match_rule(compiled, message) {
                if any_mode {
                    debug!("{} matched on feed {}", compiled.rule(), self.feed.id);
                    return Some(self.outcome(std::slice::from_ref(compiled)));
                }
            } else if !any_mode {
                return None;
            }
        }

        if any_mode {
            None
        } else {
            debug!("All rules matched on feed {}", self.feed.id);
            Some(self.outcome(&self.rules))
        }
    }

    /// Resolve actions for the matched rules: a single matching rule may
    /// override the feed defaults, a collective verdict uses them as-is.
    fn outcome(&self, matched: &[CompiledRule]) -> MatchOutcome {
        let (match_action, finish_action) = match matched {
            [only] => (
                only.rule().resolved_match_action(&self.feed),
                only.rule().resolved_finish_action(&self.feed),
            ),
            _ => (self.feed.match_action, self.feed.finish_action),
        };

        MatchOutcome {
            matched_rules: matched.iter().map(|c| c.rule().summary_json()).collect(),
            match_action,
            finish_action,
        }
    }
}
