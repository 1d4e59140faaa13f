//! Splitting display titles into a primary and a secondary part.

use crate::weight::is_wide;
use once_cell::sync::Lazy;
use regex::Regex;

#[allow(clippy::expect_used)]
static BRACKET_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(.+?)\s*\(([^)]+)\)\s*$").expect("valid bracket title regex"));

/// Minimum characters each side of a bilingual split must keep
const MIN_PART_CHARS: usize = 2;

/// A title split for two-row display
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedTitle {
    pub primary: String,
    /// Empty when the title has no secondary part
    pub secondary: String,
}

impl ParsedTitle {
    fn single(title: &str) -> Self {
        Self {
            primary: title.trim().to_string(),
            secondary: String::new(),
        }
    }
}

/// Split `title` at a trailing parenthesized part, or else at the first
/// switch from CJK to non-CJK script.
///
/// `晴天 (Sunny Day)` gives `("晴天", "Sunny Day")`; `晴天 Sunny Day` gives the
/// same. Titles with neither shape are returned whole as the primary part.
#[must_use]
pub fn parse_title(title: &str) -> ParsedTitle {
    if let Some(caps) = BRACKET_RE.captures(title) {
        return ParsedTitle {
            primary: caps[1].trim().to_string(),
            secondary: caps[2].trim().to_string(),
        };
    }

    split_bilingual(title).unwrap_or_else(|| ParsedTitle::single(title))
}

fn split_bilingual(title: &str) -> Option<ParsedTitle> {
    let chars: Vec<char> = title.chars().collect();

    let mut previous_wide = None;
    let mut boundary = None;
    for (i, &c) in chars.iter().enumerate() {
        if c.is_whitespace() {
            continue;
        }
        let wide = is_wide(c);
        if previous_wide == Some(true) && !wide {
            boundary = Some(i);
            break;
        }
        previous_wide = Some(wide);
    }

    let boundary = boundary?;
    if boundary == 0 || boundary >= chars.len() - 1 {
        return None;
    }

    let primary: String = chars[..boundary].iter().collect::<String>().trim().to_string();
    let secondary: String = chars[boundary..].iter().collect::<String>().trim().to_string();
    if primary.chars().count() < MIN_PART_CHARS || secondary.chars().count() < MIN_PART_CHARS {
        return None;
    }

    Some(ParsedTitle { primary, secondary })
}
