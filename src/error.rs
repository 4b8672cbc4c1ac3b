//! Error types for rule compilation and validity checking.

use thiserror::Error;

/// Rule configuration error types.
///
/// Validity checking renders these through `Display` into a rule's
/// `check_error` diagnostic instead of failing the caller; compilation
/// returns them as proper errors.
#[derive(Error, Debug)]
pub enum RuleError {
    #[error("Invalid regular expression \"{pattern}\": {source}")]
    InvalidRegex {
        pattern: String,
        #[source]
        source: regex_lite::Error,
    },

    #[error("Unrecognized header name \"{0}\". Perhaps just a typo?")]
    UnrecognizedHeader(String),

    #[error("Header field is \"other\" but no header name was given")]
    MissingOtherHeader,

    #[error("Rule #{id} is flagged invalid: {reason}")]
    RuleNotValid { id: i64, reason: String },
}

pub type RuleResult<T> = Result<T, RuleError>;
