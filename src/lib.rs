//! # Mailfeed Rules
//!
//! Rule engine for mail-based feeds: declarative rules match message
//! headers and decide whether an email is turned into feed content, and
//! what happens to it afterwards.
//!
//! The crate is a pure decision library. Rules are compiled once into an
//! immutable form ([`CompiledRule`]) and then applied to any number of
//! messages; a feed's rules evaluate together as a [`RuleSet`] with
//! per-group and feed-level any/all combinators. Fetching mail, storing
//! rules and executing the resulting actions belong to the callers.

pub mod error;
pub mod headers;
pub mod message;
pub mod rules;

pub use error::{RuleError, RuleResult};
pub use headers::{HeaderCatalog, HeaderField};
pub use message::{HeaderPart, HeaderValue, MessageHeaders};
pub use rules::actions::{FeedConfig, FinishAction, MatchAction};
pub use rules::engine::{CompiledRule, MatchOutcome, RuleEngine, RuleSet};
pub use rules::matchers::{MatchType, Matcher};
pub use rules::{MailRule, RulesOperation};
