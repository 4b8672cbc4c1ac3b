//! Message header representation
//!
//! The engine only ever reads message headers, but the values it receives
//! come in several physical shapes: a plain string, a display-name/address
//! pair, or a list of recipients. Instead of sniffing shapes at match time,
//! everything is normalized into [`HeaderValue`] up front and decomposed
//! into candidate strings for comparison.

use std::borrow::Cow;
use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// One element of a multi-valued header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum HeaderPart {
    Text(String),
    /// Display name and address of a single mailbox.
    Pair(String, String),
}

impl HeaderPart {
    fn candidate(&self) -> Cow<'_, str> {
        match self {
            HeaderPart::Text(text) => Cow::Borrowed(text.as_str()),
            HeaderPart::Pair(name, address) => Cow::Owned(format!("{} {}", name, address)),
        }
    }
}

/// A header value as read from a message.
///
/// The untagged serde form matches the wire shapes produced by the mail
/// fetching side: a bare string, a two-element list, or a longer list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum HeaderValue {
    Text(String),
    Pair(String, String),
    Many(Vec<HeaderPart>),
}

impl HeaderValue {
    /// Decompose the value into the strings a rule is compared against.
    ///
    /// A `Pair` whose second half starts with `<` is one mailbox
    /// (`"Alice" / "<a@x.com>"`) and yields the single joined string;
    /// otherwise the two halves are independent values and each is a
    /// candidate of its own. `Many` yields one candidate per part, with
    /// mailbox pairs joined the same way.
    pub fn candidates(&self) -> Vec<Cow<'_, str>> {
        match self {
            HeaderValue::Text(text) => vec![Cow::Borrowed(text.as_str())],
            HeaderValue::Pair(name, address) => {
                if address.starts_with('<') {
                    vec![Cow::Owned(format!("{} {}", name, address))]
                } else {
                    vec![Cow::Borrowed(name.as_str()), Cow::Borrowed(address.as_str())]
                }
            }
            HeaderValue::Many(parts) => parts.iter().map(HeaderPart::candidate).collect(),
        }
    }
}

impl From<&str> for HeaderValue {
    fn from(text: &str) -> Self {
        HeaderValue::Text(text.to_string())
    }
}

impl From<String> for HeaderValue {
    fn from(text: String) -> Self {
        HeaderValue::Text(text)
    }
}

/// Header map of one message, with case-insensitive name lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageHeaders {
    headers: HashMap<String, HeaderValue>,
}

impl MessageHeaders {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a header value; replaces any previous value of that name.
    pub fn insert(&mut self, name: &str, value: HeaderValue) {
        self.headers.insert(name.to_ascii_lowercase(), value);
    }

    /// Insert a plain-text header value.
    pub fn insert_text(&mut self, name: &str, value: impl Into<String>) {
        self.insert(name, HeaderValue::Text(value.into()));
    }

    pub fn get(&self, name: &str) -> Option<&HeaderValue> {
        self.headers.get(&name.to_ascii_lowercase())
    }

    pub fn len(&self) -> usize {
        self.headers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }

    /// Build a header map from a parsed RFC-5322 message.
    ///
    /// Address headers become mailbox pairs so the rule candidates read
    /// `"Display Name <address>"`; repeated headers keep the first
    /// occurrence. Structured values the engine has no use for
    /// (content types, received chains) are skipped.
    pub fn from_message(message: &mail_parser::Message<'_>) -> Self {
        let mut headers = Self::new();

        for header in message.headers() {
            let name = header.name.as_str();

            if headers.get(name).is_some() {
                continue;
            }

            match &header.value {
                mail_parser::HeaderValue::Text(text) => {
                    headers.insert(name, HeaderValue::Text(text.to_string()));
                }
                mail_parser::HeaderValue::TextList(list) => {
                    headers.insert(
                        name,
                        HeaderValue::Many(
                            list.iter()
                                .map(|text| HeaderPart::Text(text.to_string()))
                                .collect(),
                        ),
                    );
                }
                mail_parser::HeaderValue::Address(address) => {
                    if let Some(value) = convert_address(address) {
                        headers.insert(name, value);
                    }
                }
                mail_parser::HeaderValue::DateTime(datetime) => {
                    headers.insert(name, HeaderValue::Text(datetime.to_rfc3339()));
                }
                _ => {}
            }
        }

        headers
    }
}

fn convert_address(address: &mail_parser::Address<'_>) -> Option<HeaderValue> {
    let mailboxes: Vec<&mail_parser::Addr<'_>> = match address {
        mail_parser::Address::List(list) => list.iter().collect(),
        mail_parser::Address::Group(groups) => {
            groups.iter().flat_map(|group| group.addresses.iter()).collect()
        }
    };

    let mut parts = Vec::with_capacity(mailboxes.len());

    for mailbox in mailboxes {
        let address = match &mailbox.address {
            Some(address) => address.to_string(),
            None => continue,
        };

        match &mailbox.name {
            Some(name) => parts.push(HeaderPart::Pair(name.to_string(), format!("<{}>", address))),
            None => parts.push(HeaderPart::Text(address)),
        }
    }

    match parts.len() {
        0 => None,
        1 => Some(match parts.remove(0) {
            HeaderPart::Text(text) => HeaderValue::Text(text),
            HeaderPart::Pair(name, address) => HeaderValue::Pair(name, address),
        }),
        _ => Some(HeaderValue::Many(parts)),
    }
}
