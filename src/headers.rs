//! Header-name catalogue
//!
//! Maps the symbolic header fields a rule can target to the concrete
//! RFC-5322 header names looked up in a message, and holds the set of
//! recognized header names a rule may select through its "other header"
//! escape hatch. The catalogue is injected into the engine so deployments
//! can extend or restrict it without touching the matching code.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

/// Symbolic message field a rule matches against.
///
/// Every field except `Other` expands to one or more concrete header
/// names; `Common` is the catch-all union of subject, recipient and
/// sender headers. `Other` uses the rule's own header name instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum HeaderField {
    Subject,
    From,
    To,
    List,
    #[default]
    Common,
    Other,
}

impl HeaderField {
    pub fn as_str(&self) -> &'static str {
        match self {
            HeaderField::Subject => "subject",
            HeaderField::From => "from",
            HeaderField::To => "to",
            HeaderField::List => "list",
            HeaderField::Common => "common",
            HeaderField::Other => "other",
        }
    }
}

const SUBJECT_HEADERS: &[&str] = &["Subject"];

const FROM_HEADERS: &[&str] = &[
    "From",
    "Sender",
    "X-Envelope-From",
    "X-Sender",
    "X-X-Sender",
    "Reply-To",
    "Mail-Reply-To",
    "Mail-Followup-To",
    "Resent-From",
];

const TO_HEADERS: &[&str] = &[
    "To",
    "Cc",
    "Bcc",
    "Delivered-To",
    "X-Loop",
    "Resent-To",
    "Resent-Cc",
    "Resent-Bcc",
];

const LIST_HEADERS: &[&str] = &["Mailing-list", "List-ID", "X-Mailing-List", "List-URL"];

// No fear. See http://bit.ly/smtp-headers
const OTHER_VALID_HEADERS: &[&str] = &[
    "DL-Expansion-History",
    "Path",
    "Received",
    "Return-Path",
    "NNTP-Posting-Host",
    "Also-Control",
    "Alternate-Recipient",
    "Content-Disposition",
    "Message-Context",
    "Control",
    "Disclose-Recipients",
    "MIME-Version",
    "Apparently-To",
    "Approved",
    "Approved-By",
    "bcc",
    "cc",
    "Distribution",
    "Fax",
    "Telefax",
    "For-Approval",
    "For-Comment",
    "For-Handling",
    "Newsgroups",
    "Originator",
    "Originator-Info",
    "Phone",
    "Sender",
    "To",
    "X-Envelope-From",
    "X-Envelope-To",
    "Envelope-To",
    "X-Face",
    "X-RCPT-TO",
    "X-Sender",
    "X-X-Sender",
    "X-Mailer",
    "Posted-To",
    "X-Admin",
    "Content-Return",
    "Disposition-Notification-Options",
    "Disposition-Notification-To",
    "Errors-To",
    "Return-Receipt-To",
    "Read-Receipt-To",
    "X-Confirm-reading-to",
    "Return-Receipt-Requested",
    "Registered-Mail-Reply-Requested-By",
    "Followup-To",
    "Generate-Delivery-Report",
    "Original-Recipient",
    "Prevent-NonDelivery-Report",
    "Reply-To",
    "Mail-Followup-To",
    "Mail-Reply-To",
    "Abuse-Reports-To",
    "X-Complaints-To",
    "X-Report-Abuse-To",
    "Mail-Copies-To",
    "X400-Content-Return",
    "Article-Names",
    "Article-Updates",
    "Content-Alias",
    "Content-Base",
    "Content-ID",
    "Content-Location",
    "Delivered-To",
    "X-Loop",
    "In-Reply-To",
    "Message-ID",
    "Obsoletes",
    "References",
    "Replaces",
    "See-Also",
    "Supersedes",
    "Translated-By",
    "Translation-Of",
    "X-UIDL",
    "X-URI",
    "X-URL",
    "X-IMAP",
    "Comments",
    "Content-Description",
    "Content-Identifier",
    "Keywords",
    "Organisation",
    "Organization",
    "Subject",
    "Summary",
    "Date",
    "Delivery-Date",
    "Expires",
    "Expiry-Date",
    "Reply-By",
    "X-OriginalArrivalTime",
    "Importance",
    "Incomplete-Copy",
    "PICS-Label",
    "Precedence",
    "Priority",
    "Sensitivity",
    "X-MSMail-Priority",
    "X-Priority",
    "Content-Language",
    "Language",
    "Content-Length",
    "Lines",
    "Content-Alternative",
    "Content-Conversion",
    "Conversion",
    "Conversion-With-Loss",
    "Content-Class",
    "Content-Features",
    "Content-SGML-Entity",
    "Content-Transfer-Encoding",
    "Content-Type",
    "Encoding",
    "Message-Type",
    "X-MIME-Autoconverted",
    "Resent-Reply-To",
    "Resent-From",
    "Resent-Sender",
    "Resent-Date",
    "Resent-To",
    "Resent-Cc",
    "Resent-Bcc",
    "Resent-Message-ID",
    "Content-MD5",
    "Xref",
    "Cancel-Lock",
    "Cancel-Key",
    "List-Archive",
    "List-Digest",
    "List-Help",
    "List-ID",
    "Mailing-List",
    "X-Mailing-List",
    "List-Owner",
    "List-Post",
    "List-Software",
    "List-Subscribe",
    "List-Unsubscribe",
    "List-URL",
    "X-Listserver",
    "X-List-Host",
    "Autoforwarded",
    "Discarded-X400-IPMS-Extensions",
    "Discarded-X400-MTS-Extensions",
    "Fcc",
    "Speech-Act",
    "Status",
    "X-No-Archive",
];

lazy_static::lazy_static! {
    static ref DEFAULT_FIELDS: HashMap<HeaderField, Vec<String>> = {
        let owned = |names: &[&str]| names.iter().map(|n| n.to_string()).collect::<Vec<_>>();

        let mut fields = HashMap::new();
        fields.insert(HeaderField::Subject, owned(SUBJECT_HEADERS));
        fields.insert(HeaderField::From, owned(FROM_HEADERS));
        fields.insert(HeaderField::To, owned(TO_HEADERS));
        fields.insert(HeaderField::List, owned(LIST_HEADERS));

        let mut common = owned(SUBJECT_HEADERS);
        common.extend(owned(TO_HEADERS));
        common.extend(owned(FROM_HEADERS));
        fields.insert(HeaderField::Common, common);

        fields
    };

    static ref RECOGNIZED_LOWER: HashSet<String> = OTHER_VALID_HEADERS
        .iter()
        .map(|name| name.to_ascii_lowercase())
        .collect();
}

/// Catalogue of concrete header names, per symbolic field, plus the
/// recognized names accepted for "other header" rules.
#[derive(Debug, Clone)]
pub struct HeaderCatalog {
    fields: HashMap<HeaderField, Vec<String>>,
    recognized: HashSet<String>,
}

impl Default for HeaderCatalog {
    fn default() -> Self {
        Self {
            fields: DEFAULT_FIELDS.clone(),
            recognized: RECOGNIZED_LOWER.clone(),
        }
    }
}

impl HeaderCatalog {
    /// An empty catalogue, to be populated with `with_field` / `with_recognized`.
    pub fn empty() -> Self {
        Self {
            fields: HashMap::new(),
            recognized: HashSet::new(),
        }
    }

    /// Set the concrete header names for a symbolic field.
    pub fn with_field(mut self, field: HeaderField, names: &[&str]) -> Self {
        self.fields
            .insert(field, names.iter().map(|n| n.to_string()).collect());
        self
    }

    /// Add names to the recognized set used for "other header" validation.
    pub fn with_recognized(mut self, names: &[&str]) -> Self {
        self.recognized
            .extend(names.iter().map(|n| n.to_ascii_lowercase()));
        self
    }

    /// Concrete header names for a symbolic field.
    ///
    /// `Other` has no catalogue entry; the rule supplies its own name.
    pub fn headers_for(&self, field: HeaderField) -> &[String] {
        self.fields.get(&field).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Whether a header name (trimmed, colon already stripped) is a
    /// recognized choice for an "other header" rule. Case-insensitive.
    pub fn is_recognized(&self, name: &str) -> bool {
        self.recognized.contains(&name.to_ascii_lowercase())
    }
}
