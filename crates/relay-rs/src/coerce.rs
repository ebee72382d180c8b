//! Loose-parameter coercion: numeric strings, missing optionals, truthiness.
//!
//! Inbound envelopes carry call parameters as raw JSON values so that hosts
//! which serialize everything as strings keep working. Coercion follows the
//! wire behavior existing flows depend on:
//!
//! - Numeric parameters parse **as integers**, even the nominally fractional
//!   ones — `temperature: "0.7"` coerces to `0`. This truncation is preserved
//!   deliberately for compatibility with existing flows; do not "fix" it.
//! - String parsing takes the longest leading digit run after optional
//!   whitespace and sign (`"12px"` → 12, `"x7"` → unparseable).
//! - A parameter that is absent or unparseable gets its documented default.
//!   A parsed `0` stays `0`.
//! - `stream` / `echo` are evaluated for JS-style truthiness (`false`, `0`,
//!   `""`, `null`, absent → `false`).
//!
//! | field | default |
//! |-------|---------|
//! | `n`, `temperature`, `top_p`, `best_of` | 1 |
//! | `max_tokens` | 4000 |
//! | `presence_penalty`, `frequency_penalty` | 0 |
//! | `stream`, `echo` | false |
//! | `stop`, `suffix`, `logprobs` | null |
//! | `size` (image) | `"256x256"` |
//! | `response_format` (image) | `"b64_json"` |

use serde_json::Value;

pub const DEFAULT_N: i64 = 1;
pub const DEFAULT_TEMPERATURE: i64 = 1;
pub const DEFAULT_TOP_P: i64 = 1;
pub const DEFAULT_MAX_TOKENS: i64 = 4000;
pub const DEFAULT_PRESENCE_PENALTY: i64 = 0;
pub const DEFAULT_FREQUENCY_PENALTY: i64 = 0;
pub const DEFAULT_BEST_OF: i64 = 1;
pub const DEFAULT_IMAGE_SIZE: &str = "256x256";
pub const DEFAULT_IMAGE_FORMAT: &str = "b64_json";

/// Coerce a loose value to an integer, falling back to `default` when the
/// value is absent or unparseable.
pub fn int_or(value: Option<&Value>, default: i64) -> i64 {
    int_opt(value).unwrap_or(default)
}

/// Coerce a loose value to an integer, or `None` when absent/unparseable.
/// Used for parameters whose default is null (`logprobs`).
pub fn int_opt(value: Option<&Value>) -> Option<i64> {
    match value? {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f.trunc() as i64)),
        Value::String(s) => parse_int_prefix(s),
        _ => None,
    }
}

/// JS-style truthiness for boolean-like parameters.
pub fn truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Some(Value::String(s)) => !s.is_empty(),
        Some(_) => true,
    }
}

/// `parseInt`-shaped string parsing: leading whitespace, optional sign, then
/// the longest run of ASCII digits. No digits means unparseable.
fn parse_int_prefix(s: &str) -> Option<i64> {
    let trimmed = s.trim_start();
    let (sign, rest) = match trimmed.strip_prefix('-') {
        Some(rest) => (-1, rest),
        None => (1, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };
    let digits: &str = {
        let end = rest
            .char_indices()
            .find(|(_, c)| !c.is_ascii_digit())
            .map_or(rest.len(), |(i, _)| i);
        &rest[..end]
    };
    if digits.is_empty() {
        return None;
    }
    digits.parse::<i64>().ok().map(|v| sign * v)
}
