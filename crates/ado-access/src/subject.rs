//! Subject token classification.
//!
//! Operators name subjects in several shapes:
//! - `S-1-9-1551374245-...` → security identifier (SID)
//! - `Microsoft.TeamFoundation.Identity;S-1-9-...` → SID with identity-type prefix
//! - `aad.ZjQxN2Y...` → graph subject descriptor
//! - anything else (`jane@contoso.com`, `CONTOSO\jane`, `Project Readers`) → free text
//!
//! [`classify`] is the single place that decides which shape a token has. The SID check
//! runs before the descriptor check, so a token matching both is always a SID.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// `S-` followed by three or more integer groups, optionally behind `<type>;`.
    static ref SID: Regex = Regex::new(r"^(?:[A-Za-z0-9.]+;)?[Ss](?:-[0-9]+){3,}$").unwrap();
    /// `<type>.<base64url body>`.
    static ref DESCRIPTOR: Regex = Regex::new(r"^[A-Za-z0-9]+\.[A-Za-z0-9_-]+$").unwrap();
}

/// Shape of a raw subject token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenShape {
    /// Blank after trimming.
    Empty,
    SecurityIdentifier,
    Descriptor,
    /// Email, principal name, alias or display name.
    FreeText,
}

/// Classify a raw token. Check order: empty, SID, descriptor, free text.
pub fn classify(token: &str) -> TokenShape {
    let token = token.trim();
    if token.is_empty() {
        TokenShape::Empty
    } else if SID.is_match(token) {
        TokenShape::SecurityIdentifier
    } else if DESCRIPTOR.is_match(token) {
        TokenShape::Descriptor
    } else {
        TokenShape::FreeText
    }
}

/// True iff the trimmed token has SID shape.
pub fn is_security_identifier(token: &str) -> bool {
    let token = token.trim();
    !token.is_empty() && SID.is_match(token)
}

/// True iff the trimmed token has descriptor shape.
///
/// Independent of [`is_security_identifier`]; use [`classify`] when both could apply.
pub fn is_descriptor(token: &str) -> bool {
    let token = token.trim();
    !token.is_empty() && DESCRIPTOR.is_match(token)
}
