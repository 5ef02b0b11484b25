//! Permission bitmask encoding and decoding against a namespace's action catalogue.
//!
//! Accepted permission tokens:
//! - `0x10` / `0X10` → hexadecimal bit value
//! - `16` → decimal bit value
//! - `Read`, `View repository`, `Bit 16` → action name, display name or bit alias
//!   (case-insensitive)
//!
//! Every value must be non-zero and, when the catalogue defines any bits, lie entirely
//! inside the union of the catalogue's bits. One bad token fails the whole call.

use std::collections::HashMap;

use tracing::warn;

use crate::error::{AccessError, AccessResult};
use crate::types::{ActionDefinition, PermissionBits};

/// Label for an empty mask.
pub const NO_PERMISSIONS: &str = "None";

/// Union of every action bit in the catalogue. Zero for an empty catalogue.
pub fn allowed_mask(actions: &[ActionDefinition]) -> PermissionBits {
    actions.iter().fold(0, |mask, action| mask | action.bit)
}

/// Split a comma-separated permission expression into trimmed, non-empty tokens.
pub fn split_permission_tokens(raw: &str) -> Vec<&str> {
    raw.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect()
}

/// Encode permission tokens into a bitmask.
pub fn encode<S: AsRef<str>>(
    actions: &[ActionDefinition],
    tokens: &[S],
) -> AccessResult<PermissionBits> {
    let names = name_table(actions);
    let allowed = allowed_mask(actions);

    let mut mask: PermissionBits = 0;
    for token in tokens {
        let token = token.as_ref().trim();
        if token.is_empty() {
            continue;
        }

        let value = match parse_numeric(token) {
            Some(value) => value,
            None => match names.get(&token.to_lowercase()) {
                Some(bit) => i64::from(*bit),
                None => {
                    return Err(AccessError::UnrecognizedPermissionToken {
                        token: token.to_string(),
                    })
                }
            },
        };

        mask |= validate_bits(token, value, allowed)?;
    }
    Ok(mask)
}

/// Decode a bitmask into a sorted, comma-joined label list.
///
/// Bits the catalogue does not define are reported once as `Unknown (0x..)`. An empty
/// catalogue, or a mask sharing no bits with it, decodes to the hex literal.
pub fn decode(actions: &[ActionDefinition], mask: PermissionBits) -> String {
    if mask == 0 {
        return NO_PERMISSIONS.to_string();
    }
    if actions.is_empty() {
        return hex_literal(mask);
    }

    let mut labels = Vec::new();
    let mut matched: PermissionBits = 0;
    for action in actions {
        if action.bit != 0 && mask & action.bit == action.bit {
            labels.push(action.label());
            matched |= action.bit;
        }
    }

    if matched == 0 {
        return hex_literal(mask);
    }
    if matched != mask {
        labels.push(format!("Unknown ({})", hex_literal(mask & !matched)));
    }

    labels.sort();
    labels.join(", ")
}

/// `0x`-prefixed lowercase hex.
pub fn hex_literal(mask: PermissionBits) -> String {
    format!("{:#x}", mask)
}

/// Case-folded Name / DisplayName / `Bit <n>` → bit. The first action to claim a key wins.
fn name_table(actions: &[ActionDefinition]) -> HashMap<String, PermissionBits> {
    let mut table: HashMap<String, PermissionBits> = HashMap::new();
    for action in actions {
        let alias = action.bit_alias();
        for key in [
            action.name.as_str(),
            action.display_name.as_str(),
            alias.as_str(),
        ] {
            if key.is_empty() {
                continue;
            }
            let folded = key.to_lowercase();
            match table.get(&folded) {
                Some(&bit) if bit != action.bit => warn!(
                    key = %key,
                    kept = %hex_literal(bit),
                    ignored = %hex_literal(action.bit),
                    "permission name claimed by two actions; keeping the first"
                ),
                Some(_) => {}
                None => {
                    table.insert(folded, action.bit);
                }
            }
        }
    }
    table
}

/// Unsigned hex (`0x`/`0X`) or decimal. Signed numerals are not numbers here.
fn parse_numeric(token: &str) -> Option<i64> {
    let unsigned = |digits: &str| !digits.starts_with(['+', '-']);

    if let Some(hex) = token
        .strip_prefix("0x")
        .or_else(|| token.strip_prefix("0X"))
    {
        if unsigned(hex) {
            if let Ok(value) = i64::from_str_radix(hex, 16) {
                return Some(value);
            }
        }
    }
    if !unsigned(token) {
        return None;
    }
    token.parse::<i64>().ok()
}

fn validate_bits(token: &str, value: i64, allowed: PermissionBits) -> AccessResult<PermissionBits> {
    let undefined = || AccessError::UndefinedPermissionBit {
        token: token.to_string(),
        value,
        allowed,
    };

    // Values up to u32::MAX are accepted so the top bit can be written in hex.
    let bits = if let Ok(bits) = PermissionBits::try_from(value) {
        bits
    } else if let Ok(unsigned) = u32::try_from(value) {
        unsigned as PermissionBits
    } else {
        return Err(undefined());
    };

    if bits == 0 || (allowed != 0 && bits & !allowed != 0) {
        return Err(undefined());
    }
    Ok(bits)
}
