//! Visual weight of lyric text on a fixed-width display.
//!
//! CJK ideographs, kana and Hangul syllables occupy roughly two Latin columns,
//! so they weigh 2; every other character weighs 1.

/// Weight of a single character
#[must_use]
pub const fn char_weight(c: char) -> usize {
    match c as u32 {
        // CJK Unified Ideographs, Extension A, Extension B
        0x4E00..=0x9FFF | 0x3400..=0x4DBF | 0x2_0000..=0x2_A6DF
        // CJK Compatibility Ideographs
        | 0xF900..=0xFAFF
        // Hiragana, Katakana
        | 0x3040..=0x30FF
        // Hangul Syllables
        | 0xAC00..=0xD7AF => 2,
        _ => 1,
    }
}

#[must_use]
pub const fn is_wide(c: char) -> bool {
    char_weight(c) == 2
}

/// Total weight of `text`
#[must_use]
pub fn visual_weight(text: &str) -> usize {
    text.chars().map(char_weight).sum()
}

/// Cut a window of at most `max_weight` units out of `text`, starting at the
/// first character whose preceding weight reaches `start_weight`.
///
/// When the cut would split a Latin word the window backs up to the last
/// whitespace inside it; a single word wider than the window is split anyway.
/// Trailing whitespace is trimmed. A start at or past the end yields an empty
/// string.
#[must_use]
pub fn extract_by_weight(text: &str, start_weight: usize, max_weight: usize) -> String {
    let chars: Vec<char> = text.chars().collect();

    let mut consumed = 0;
    let mut start = None;
    for (i, &c) in chars.iter().enumerate() {
        if consumed >= start_weight {
            start = Some(i);
            break;
        }
        consumed += char_weight(c);
    }
    let Some(start) = start else {
        return String::new();
    };

    let mut end = start;
    let mut window = 0;
    for (i, &c) in chars.iter().enumerate().skip(start) {
        window += char_weight(c);
        if window > max_weight {
            break;
        }
        end = i + 1;
    }

    if end <= start {
        return String::new();
    }

    if end < chars.len() && splits_word(chars[end - 1], chars[end]) {
        if let Some(space) = chars[start..end].iter().rposition(|c| c.is_whitespace()) {
            if space > 0 {
                end = start + space;
            }
        }
    }

    let window: String = chars[start..end].iter().collect();
    window.trim_end().to_string()
}

fn splits_word(before: char, at: char) -> bool {
    !is_wide(before) && !is_wide(at) && before.is_alphanumeric() && at.is_alphanumeric()
}

/// How far the scroll window should move from `offset`.
///
/// Looks ahead 10 units. Mostly-CJK text moves by its next two characters
/// (4 units for two ideographs). Latin text moves to a space found at
/// character index 2 to 4, otherwise by three characters.
#[must_use]
pub fn smart_shift_weight(text: &str, offset: usize) -> usize {
    let segment: Vec<char> = extract_by_weight(text, offset, 10).chars().collect();
    if segment.is_empty() {
        return 4;
    }

    let wide = segment.iter().filter(|&&c| is_wide(c)).count();
    if wide > segment.len() / 2 {
        return match segment.as_slice() {
            [a, b, ..] => char_weight(*a) + char_weight(*b),
            _ => 4,
        };
    }

    let space = segment
        .iter()
        .skip(2)
        .position(|&c| c == ' ')
        .map(|i| i + 2);

    match space {
        Some(i) if i <= 4 => segment[..=i].iter().copied().map(char_weight).sum(),
        _ if segment.len() >= 3 => segment[..3].iter().copied().map(char_weight).sum(),
        _ => 3,
    }
}
