//! Actions applied when a rule matches, and the feed-level defaults.

use serde::{Deserialize, Serialize};

use super::RulesOperation;

/// What happens to a message once a rule matched it.
///
/// `StoreAndScrape` keeps the historical `scroarpe` wire token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MatchAction {
    /// Store the email as a feed item.
    Store,
    /// Extract links from the email and fetch the articles.
    #[default]
    Scrape,
    /// Do both.
    #[serde(rename = "scroarpe")]
    StoreAndScrape,
}

impl MatchAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchAction::Store => "store",
            MatchAction::Scrape => "scrape",
            MatchAction::StoreAndScrape => "scroarpe",
        }
    }

    pub fn stores(&self) -> bool {
        matches!(self, MatchAction::Store | MatchAction::StoreAndScrape)
    }

    pub fn scrapes(&self) -> bool {
        matches!(self, MatchAction::Scrape | MatchAction::StoreAndScrape)
    }
}

/// What happens to the message in its mailbox afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FinishAction {
    /// Leave the e-mail untouched.
    Nothing,
    /// Mark the e-mail read.
    #[default]
    MarkRead,
    /// Delete the e-mail.
    Delete,
}

impl FinishAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            FinishAction::Nothing => "nothing",
            FinishAction::MarkRead => "markread",
            FinishAction::Delete => "delete",
        }
    }
}

/// Feed-level configuration a rule set evaluates under.
///
/// Rules inherit the feed's actions unless they override them, and the
/// feed's `rules_operation` decides how its rules combine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedConfig {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub match_action: MatchAction,
    #[serde(default)]
    pub finish_action: FinishAction,
    #[serde(default)]
    pub rules_operation: RulesOperation,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            id: 0,
            name: String::new(),
            match_action: MatchAction::default(),
            finish_action: FinishAction::default(),
            rules_operation: RulesOperation::default(),
        }
    }
}

impl FeedConfig {
    pub fn new(id: i64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            ..Default::default()
        }
    }
}
