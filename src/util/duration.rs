use std::time::Duration;
use thiserror::Error;

/// The input did not match the interval grammar.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid interval {input:?}: expected forms like \"30s\", \"5m\", \"1h\"")]
pub struct ParseIntervalError {
    input: String,
}

impl ParseIntervalError {
    fn new(input: &str) -> Self {
        Self {
            input: input.to_owned(),
        }
    }
}

/// Parses an interval string like `"30s"`, `"5m"`, or `"1m30s"`.
///
/// Each segment is an unsigned integer followed by a unit: `ms`, `s`,
/// `m`, or `h`. Segments are summed, so `"1h30m"` is ninety minutes.
/// Overflow saturates rather than wrapping. A bare number has no unit
/// and is rejected; `"0s"` parses to zero and is left for the caller
/// to judge.
pub fn parse_interval(input: &str) -> Result<Duration, ParseIntervalError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(ParseIntervalError::new(input));
    }

    let mut total = Duration::ZERO;
    let mut chars = trimmed.chars().peekable();

    while chars.peek().is_some() {
        let mut digits = String::new();
        while let Some(c) = chars.peek().copied() {
            if !c.is_ascii_digit() {
                break;
            }
            digits.push(c);
            chars.next();
        }

        let mut unit = String::new();
        while let Some(c) = chars.peek().copied() {
            if !c.is_ascii_alphabetic() {
                break;
            }
            unit.push(c);
            chars.next();
        }

        if digits.is_empty() || unit.is_empty() {
            return Err(ParseIntervalError::new(input));
        }

        let value: u64 = digits
            .parse()
            .map_err(|_| ParseIntervalError::new(input))?;
        let segment = match unit.as_str() {
            "ms" => Duration::from_millis(value),
            "s" => Duration::from_secs(value),
            "m" => Duration::from_secs(value.saturating_mul(60)),
            "h" => Duration::from_secs(value.saturating_mul(3600)),
            _ => return Err(ParseIntervalError::new(input)),
        };
        total = total.saturating_add(segment);
    }

    Ok(total)
}
