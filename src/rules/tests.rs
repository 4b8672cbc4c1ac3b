//! Integration tests for the rule engine
//!
//! End-to-end coverage of the matching semantics:
//! - case folding and operator complements
//! - recipient-list decomposition
//! - validity checking round trips
//! - group and feed-level combinators
//! - parsed-message interop

use crate::error::RuleError;
use crate::headers::{HeaderCatalog, HeaderField};
use crate::message::{HeaderPart, HeaderValue, MessageHeaders};
use crate::rules::actions::{FeedConfig, FinishAction, MatchAction};
use crate::rules::engine::RuleEngine;
use crate::rules::matchers::MatchType;
use crate::rules::{MailRule, RulesOperation};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn subject_rule(id: i64, match_type: MatchType, value: &str) -> MailRule {
    MailRule {
        id,
        feed_id: 1,
        header_field: HeaderField::Subject,
        match_type,
        match_value: value.to_string(),
        ..Default::default()
    }
}

fn subject_message(subject: &str) -> MessageHeaders {
    let mut headers = MessageHeaders::new();
    headers.insert_text("Subject", subject);
    headers
}

// ============================================================================
// Case folding
// ============================================================================

#[test]
fn test_case_insensitive_rules_ignore_header_case() {
    init_logging();
    let engine = RuleEngine::new();

    for match_type in [
        MatchType::Contains,
        MatchType::Starts,
        MatchType::Ends,
        MatchType::Equals,
    ] {
        let compiled = engine
            .compile(&subject_rule(1, match_type, "google alert: rust"))
            .unwrap();

        assert_eq!(
            compiled.matches(&subject_message("Google Alert: Rust")),
            compiled.matches(&subject_message("google alert: rust")),
            "{:?} should not distinguish case",
            match_type,
        );
        assert!(compiled.matches(&subject_message("GOOGLE ALERT: RUST")));
    }
}

#[test]
fn test_case_sensitive_rules_do_not() {
    let engine = RuleEngine::new();
    let mut rule = subject_rule(1, MatchType::Contains, "Alert");
    rule.match_case = true;

    let compiled = engine.compile(&rule).unwrap();
    assert!(compiled.matches(&subject_message("Google Alert")));
    assert!(!compiled.matches(&subject_message("google alert")));
}

// ============================================================================
// Operator complements at the engine level
// ============================================================================

#[test]
fn test_negated_rule_is_the_complement() {
    let engine = RuleEngine::new();
    let messages = [
        subject_message("Google Alert: rust"),
        subject_message("Weekly digest"),
        subject_message(""),
    ];

    let pairs = [
        (MatchType::Contains, MatchType::NotContains),
        (MatchType::Starts, MatchType::NotStarts),
        (MatchType::Ends, MatchType::NotEnds),
        (MatchType::Equals, MatchType::NotEquals),
        (MatchType::RegexMatch, MatchType::NotRegexMatch),
    ];

    for (positive, negated) in pairs {
        let pos = engine.compile(&subject_rule(1, positive, "alert")).unwrap();
        let neg = engine.compile(&subject_rule(2, negated, "alert")).unwrap();

        for message in &messages {
            assert_eq!(
                pos.matches(message),
                !neg.matches(message),
                "{:?}/{:?} must be complementary",
                positive,
                negated,
            );
        }
    }
}

// ============================================================================
// Regex semantics
// ============================================================================

#[test]
fn test_regex_anchored_at_start() {
    let engine = RuleEngine::new();

    let compiled = engine
        .compile(&subject_rule(1, MatchType::RegexMatch, "^foo"))
        .unwrap();
    assert!(compiled.matches(&subject_message("foobar")));
    assert!(!compiled.matches(&subject_message("barfoo")));

    let negated = engine
        .compile(&subject_rule(2, MatchType::NotRegexMatch, "^foo"))
        .unwrap();
    assert!(!negated.matches(&subject_message("foobar")));
    assert!(negated.matches(&subject_message("barfoo")));
}

// ============================================================================
// Recipient decomposition
// ============================================================================

#[test]
fn test_second_recipient_matches() {
    let engine = RuleEngine::new();
    let rule = MailRule {
        id: 1,
        feed_id: 1,
        header_field: HeaderField::To,
        match_type: MatchType::Contains,
        match_value: "b@x.com".to_string(),
        ..Default::default()
    };
    let compiled = engine.compile(&rule).unwrap();

    let mut headers = MessageHeaders::new();
    headers.insert(
        "To",
        HeaderValue::Many(vec![
            HeaderPart::Pair("Alice".to_string(), "<a@x.com>".to_string()),
            HeaderPart::Pair("Bob".to_string(), "<b@x.com>".to_string()),
        ]),
    );

    assert!(compiled.matches(&headers));
}

#[test]
fn test_single_mailbox_pair_is_one_string() {
    let engine = RuleEngine::new();

    let mut headers = MessageHeaders::new();
    headers.insert(
        "To",
        HeaderValue::Pair("Alice".to_string(), "<a@x.com>".to_string()),
    );

    // Equality against either half alone fails: the pair is compared as
    // the single joined string "Alice <a@x.com>".
    let half = MailRule {
        id: 1,
        feed_id: 1,
        header_field: HeaderField::To,
        match_type: MatchType::Equals,
        match_value: "alice".to_string(),
        ..Default::default()
    };
    assert!(!engine.compile(&half).unwrap().matches(&headers));

    let joined = MailRule {
        match_value: "alice <a@x.com>".to_string(),
        ..half.clone()
    };
    assert!(engine.compile(&joined).unwrap().matches(&headers));
}

// ============================================================================
// Validity checking
// ============================================================================

#[test]
fn test_unrecognized_other_header_round_trip() {
    let catalog = HeaderCatalog::default();
    let mut rule = MailRule {
        header_field: HeaderField::Other,
        other_header: Some("X-Bogus-Header".to_string()),
        match_value: "anything".to_string(),
        ..Default::default()
    };

    assert!(rule.check_is_valid(&catalog));
    assert!(!rule.is_valid);
    assert!(rule
        .check_error
        .as_deref()
        .unwrap()
        .contains("X-Bogus-Header"));

    rule.other_header = Some("X-Mailer".to_string());
    assert!(rule.check_is_valid(&catalog));
    assert!(rule.is_valid);
    assert!(rule.check_error.is_none());
}

#[test]
fn test_trailing_colon_is_normalized() {
    let catalog = HeaderCatalog::default();
    let mut rule = MailRule {
        header_field: HeaderField::Other,
        other_header: Some(" List-ID: ".to_string()),
        match_value: "x".to_string(),
        ..Default::default()
    };

    rule.check_is_valid(&catalog);
    assert!(rule.is_valid);
    assert_eq!(rule.other_header.as_deref(), Some("List-ID"));
}

#[test]
fn test_missing_other_header_is_invalid() {
    let catalog = HeaderCatalog::default();
    let mut rule = MailRule {
        header_field: HeaderField::Other,
        match_value: "x".to_string(),
        ..Default::default()
    };

    rule.check_is_valid(&catalog);
    assert!(!rule.is_valid);
    assert_eq!(
        rule.check_error.as_deref(),
        Some(RuleError::MissingOtherHeader.to_string().as_str())
    );
}

#[test]
fn test_bad_regex_round_trip() {
    let catalog = HeaderCatalog::default();
    let mut rule = MailRule {
        match_type: MatchType::RegexMatch,
        match_value: "[unterminated".to_string(),
        ..Default::default()
    };

    assert!(rule.check_is_valid(&catalog));
    assert!(!rule.is_valid);
    let error = rule.check_error.clone().unwrap();
    assert!(error.contains("[unterminated"));
    assert!(error.len() > "Invalid regular expression \"[unterminated\": ".len());

    rule.match_value = "^foo".to_string();
    assert!(rule.check_is_valid(&catalog));
    assert!(rule.is_valid);
    assert!(rule.check_error.is_none());
}

#[test]
fn test_revalidation_is_idempotent() {
    let catalog = HeaderCatalog::default();
    let mut rule = subject_rule(1, MatchType::Contains, "alert");

    assert!(!rule.check_is_valid(&catalog));
    assert!(rule.is_valid);

    let mut invalid = MailRule {
        match_type: MatchType::RegexMatch,
        match_value: "[oops".to_string(),
        ..Default::default()
    };
    assert!(invalid.check_is_valid(&catalog));
    // Same broken fields again: nothing changes, no write needed.
    assert!(!invalid.check_is_valid(&catalog));
    assert!(!invalid.is_valid);
}

// ============================================================================
// Rule serialization
// ============================================================================

#[test]
fn test_rule_wire_format_round_trip() {
    let json = r#"{
        "id": 42,
        "feed_id": 7,
        "group": 1,
        "group_operation": "all",
        "header_field": "other",
        "other_header": "List-ID",
        "match_type": "nre_match",
        "match_case": true,
        "match_value": "^rust-",
        "match_action": "scroarpe",
        "finish_action": "markread",
        "position": 3
    }"#;

    let rule: MailRule = serde_json::from_str(json).unwrap();
    assert_eq!(rule.id, 42);
    assert_eq!(rule.group_operation, RulesOperation::All);
    assert_eq!(rule.header_field, HeaderField::Other);
    assert_eq!(rule.match_type, MatchType::NotRegexMatch);
    assert_eq!(rule.match_action, Some(MatchAction::StoreAndScrape));
    assert_eq!(rule.finish_action, Some(FinishAction::MarkRead));
    assert!(rule.is_valid);

    let back: MailRule =
        serde_json::from_str(&serde_json::to_string(&rule).unwrap()).unwrap();
    assert_eq!(back, rule);
}

// ============================================================================
// Groups and feed-level combination
// ============================================================================

fn grouped_rule(id: i64, group: i32, operation: RulesOperation, value: &str) -> MailRule {
    MailRule {
        group: Some(group),
        group_operation: operation,
        ..subject_rule(id, MatchType::Contains, value)
    }
}

#[test]
fn test_group_any_and_all() {
    init_logging();
    let engine = RuleEngine::new();
    let message = subject_message("Google Alert: rust");

    let any_set = engine.compile_set(
        FeedConfig::new(1, "any group"),
        &[
            grouped_rule(1, 1, RulesOperation::Any, "alert"),
            grouped_rule(2, 1, RulesOperation::Any, "no-such-text"),
        ],
    );
    assert!(any_set.match_group(1, &message));

    let all_set = engine.compile_set(
        FeedConfig::new(1, "all group"),
        &[
            grouped_rule(1, 1, RulesOperation::All, "alert"),
            grouped_rule(2, 1, RulesOperation::All, "no-such-text"),
        ],
    );
    assert!(!all_set.match_group(1, &message));

    let all_hit = engine.compile_set(
        FeedConfig::new(1, "all group"),
        &[
            grouped_rule(1, 1, RulesOperation::All, "alert"),
            grouped_rule(2, 1, RulesOperation::All, "rust"),
        ],
    );
    assert!(all_hit.match_group(1, &message));
}

#[test]
fn test_feed_any_takes_first_hit() {
    let engine = RuleEngine::new();
    let set = engine.compile_set(
        FeedConfig::new(1, "feed"),
        &[
            subject_rule(1, MatchType::Contains, "digest"),
            subject_rule(2, MatchType::Contains, "alert"),
        ],
    );

    let outcome = set.evaluate(&subject_message("Google Alert: rust")).unwrap();
    assert_eq!(outcome.matched_rules.len(), 1);
    assert_eq!(outcome.matched_rules[0]["id"], 2);

    assert!(set.evaluate(&subject_message("nothing relevant")).is_none());
}

#[test]
fn test_feed_all_requires_every_rule() {
    let engine = RuleEngine::new();
    let mut feed = FeedConfig::new(1, "feed");
    feed.rules_operation = RulesOperation::All;

    let set = engine.compile_set(
        feed,
        &[
            subject_rule(1, MatchType::Contains, "alert"),
            subject_rule(2, MatchType::Contains, "rust"),
        ],
    );

    let outcome = set.evaluate(&subject_message("Google Alert: rust")).unwrap();
    assert_eq!(outcome.matched_rules.len(), 2);

    assert!(set.evaluate(&subject_message("Google Alert: go")).is_none());
}

#[test]
fn test_grouped_rules_answer_once() {
    let engine = RuleEngine::new();
    let mut feed = FeedConfig::new(1, "feed");
    feed.rules_operation = RulesOperation::All;

    // Group 1 matches as a whole (any member), so the feed-level ALL
    // sees one verdict for the group plus one for the lone rule.
    let set = engine.compile_set(
        feed,
        &[
            grouped_rule(1, 1, RulesOperation::Any, "no-such-text"),
            grouped_rule(2, 1, RulesOperation::Any, "alert"),
            subject_rule(3, MatchType::Contains, "rust"),
        ],
    );

    assert!(set.evaluate(&subject_message("Google Alert: rust")).is_some());
    assert!(set.evaluate(&subject_message("Google Alert: go")).is_none());
}

#[test]
fn test_empty_set_never_matches() {
    let engine = RuleEngine::new();
    let set = engine.compile_set(FeedConfig::new(1, "feed"), &[]);
    assert!(set.is_empty());
    assert!(set.evaluate(&subject_message("anything")).is_none());
}

// ============================================================================
// Action resolution
// ============================================================================

#[test]
fn test_matched_rule_overrides_feed_actions() {
    let engine = RuleEngine::new();
    let mut rule = subject_rule(1, MatchType::Contains, "alert");
    rule.match_action = Some(MatchAction::Store);
    rule.finish_action = Some(FinishAction::Delete);

    let set = engine.compile_set(FeedConfig::new(1, "feed"), &[rule]);
    let outcome = set.evaluate(&subject_message("Google Alert")).unwrap();

    assert_eq!(outcome.match_action, MatchAction::Store);
    assert_eq!(outcome.finish_action, FinishAction::Delete);
}

#[test]
fn test_unset_actions_inherit_feed_defaults() {
    let engine = RuleEngine::new();
    let mut feed = FeedConfig::new(1, "feed");
    feed.match_action = MatchAction::StoreAndScrape;
    feed.finish_action = FinishAction::Nothing;

    let set = engine.compile_set(feed, &[subject_rule(1, MatchType::Contains, "alert")]);
    let outcome = set.evaluate(&subject_message("Google Alert")).unwrap();

    assert_eq!(outcome.match_action, MatchAction::StoreAndScrape);
    assert_eq!(outcome.finish_action, FinishAction::Nothing);
}

// ============================================================================
// Parsed-message interop
// ============================================================================

#[test]
fn test_rule_against_parsed_message() {
    init_logging();
    let raw = b"From: Updates <updates@news.example>\r\n\
To: Alice <alice@corp.example>, Bob <bob@corp.example>\r\n\
Subject: Google Alert: rust\r\n\
\r\n\
Fresh articles inside.\r\n";

    let parsed = mail_parser::MessageParser::default()
        .parse(raw.as_slice())
        .unwrap();
    let headers = MessageHeaders::from_message(&parsed);

    let engine = RuleEngine::new();

    let to_rule = MailRule {
        header_field: HeaderField::To,
        match_type: MatchType::Contains,
        match_value: "bob@corp.example".to_string(),
        ..Default::default()
    };
    assert!(engine.compile(&to_rule).unwrap().matches(&headers));

    let from_rule = MailRule {
        header_field: HeaderField::From,
        match_type: MatchType::Starts,
        match_value: "updates".to_string(),
        ..Default::default()
    };
    assert!(engine.compile(&from_rule).unwrap().matches(&headers));

    let set = engine.compile_set(
        FeedConfig::new(1, "alerts"),
        &[subject_rule(1, MatchType::Starts, "google alert")],
    );
    let outcome = set.evaluate(&headers).unwrap();
    assert_eq!(outcome.match_action, MatchAction::Scrape);
    assert_eq!(outcome.finish_action, FinishAction::MarkRead);
}
