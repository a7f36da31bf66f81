//! Target value extraction and display formatting.
//!
//! The magnitude is one contiguous run of ASCII digits; which run is chosen by
//! [`DigitRun`]. Suffix flags are detected anywhere in the text and written back
//! as `+` then `%`.

use serde::{Deserialize, Serialize};

use crate::config::DigitRun;
use crate::error::CounterError;

/// Largest target whose every frame value is exact in f64 arithmetic.
pub const MAX_TARGET: u64 = 1 << 53;

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayFormat {
    pub has_percent_suffix: bool,
    pub has_plus_suffix: bool,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedCounter {
    pub value: u64,
    pub format: DisplayFormat,
}

/// Parse counter text such as `"85%"`, `"50+"` or `"Over 1200 clients"`.
pub fn parse_counter_text(text: &str, run: DigitRun) -> Result<ParsedCounter, CounterError> {
    let (start, end) = select_digit_run(text, run).ok_or_else(|| CounterError::NoDigits {
        text: text.to_string(),
    })?;

    if text[..start].ends_with('-') {
        return Err(CounterError::Negative {
            text: text.to_string(),
        });
    }

    let digits = &text[start..end];
    let value = match digits.parse::<u64>() {
        Ok(v) if v <= MAX_TARGET => v,
        _ => {
            return Err(CounterError::Overflow {
                digits: digits.to_string(),
                max: MAX_TARGET,
            })
        }
    };

    Ok(ParsedCounter {
        value,
        format: DisplayFormat {
            has_percent_suffix: text.contains('%'),
            has_plus_suffix: text.contains('+'),
        },
    })
}

/// Byte range of the selected digit run.
fn select_digit_run(text: &str, run: DigitRun) -> Option<(usize, usize)> {
    let bytes = text.as_bytes();
    let mut runs = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i].is_ascii_digit() {
            let start = i;
            while i < bytes.len() && bytes[i].is_ascii_digit() {
                i += 1;
            }
            runs.push((start, i));
            if run == DigitRun::First {
                break;
            }
        } else {
            i += 1;
        }
    }
    runs.last().copied()
}

/// Render a frame value with the preserved suffixes.
pub fn format_display(value: u64, format: DisplayFormat) -> String {
    let mut out = value.to_string();
    if format.has_plus_suffix {
        out.push('+');
    }
    if format.has_percent_suffix {
        out.push('%');
    }
    out
}
