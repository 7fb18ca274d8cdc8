//! Text helpers used by the renderer: escaping, flag emoji, counts, timestamps.

use time::format_description::well_known::Iso8601;
use time::{OffsetDateTime, PrimitiveDateTime};

use crate::config::FLAG_IMAGE_BASE;

const REGIONAL_INDICATORS: std::ops::RangeInclusive<u32> = 0x1F1E6..=0x1F1FF;

pub fn escape(text: &str) -> String {
    html_escape::encode_quoted_attribute(text).into_owned()
}

fn is_regional_indicator(c: char) -> bool {
    REGIONAL_INDICATORS.contains(&(c as u32))
}

/// Escape `text`, replacing each pair of regional indicators with a flag
/// image keyed by both code points. Operates on scalar values, so surrogate
/// pairs are never split; an unpaired indicator stays as text.
pub fn render_text_with_emoji(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if is_regional_indicator(c) {
            if let Some(&next) = chars.peek().filter(|n| is_regional_indicator(**n)) {
                chars.next();
                let emoji: String = [c, next].iter().collect();
                out.push_str(&format!(
                    "<img src=\"{FLAG_IMAGE_BASE}{:x}-{:x}.svg\" alt=\"{}\" draggable=\"false\" style=\"height:1em;width:1em;vertical-align:-0.12em;\"/>",
                    c as u32,
                    next as u32,
                    escape(&emoji)
                ));
                continue;
            }
        }
        let mut buf = [0u8; 4];
        out.push_str(&escape(c.encode_utf8(&mut buf)));
    }
    out
}

/// Round `n / unit` to one decimal (half up) and drop a trailing `.0`.
fn one_decimal(n: u64, unit: u64) -> String {
    let tenths = (n * 10 + unit / 2) / unit;
    if tenths % 10 == 0 {
        format!("{}", tenths / 10)
    } else {
        format!("{}.{}", tenths / 10, tenths % 10)
    }
}

pub fn format_count(n: i64) -> String {
    if n < 0 {
        return format!("-{}", format_count(n.checked_neg().unwrap_or(i64::MAX)));
    }
    let n = n as u64;
    match n {
        0..=999 => n.to_string(),
        1_000..=9_999 => format!("{}K", one_decimal(n, 1_000)),
        10_000..=999_999 => {
            let thousands = (n + 500) / 1_000;
            if thousands < 1_000 {
                format!("{thousands}K")
            } else {
                format!("{}M", one_decimal(n, 1_000_000))
            }
        }
        1_000_000..=9_999_999 => format!("{}M", one_decimal(n, 1_000_000)),
        _ => format!("{}M", (n + 500_000) / 1_000_000),
    }
}

/// Default timestamp rendering: `YYYY-MM-DD HH:MM`, or the raw value when it
/// does not parse.
pub fn format_timestamp(raw: &str) -> String {
    let parsed = PrimitiveDateTime::parse(raw, &Iso8601::DEFAULT).or_else(|_| {
        OffsetDateTime::parse(raw, &Iso8601::DEFAULT).map(|dt| PrimitiveDateTime::new(dt.date(), dt.time()))
    });
    let Ok(dt) = parsed else { return raw.to_string() };
    match time::format_description::parse("[year]-[month]-[day] [hour]:[minute]") {
        Ok(fmt) => dt.format(&fmt).unwrap_or_else(|_| raw.to_string()),
        Err(_) => raw.to_string(),
    }
}
