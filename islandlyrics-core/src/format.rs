//! Choosing between the LRC and KRC parsers for a lyric body.

use crate::krc::parse_krc;
use crate::lrc::parse_lrc;
use crate::lyrics::Timeline;

/// Wire format of a lyric body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LyricFormat {
    /// Line-timed `[mm:ss.xx]text`
    Lrc,
    /// Syllable-timed `[start,duration]<offset,duration,id>text`
    Krc,
}

impl LyricFormat {
    /// Guess the format of `body`.
    ///
    /// Any body containing both `<` and `>` is treated as KRC. This is a
    /// heuristic, not a grammar check; the KRC parser simply finds no lines
    /// when the guess is wrong.
    #[must_use]
    pub fn detect(body: &str) -> Self {
        if body.contains('<') && body.contains('>') {
            Self::Krc
        } else {
            Self::Lrc
        }
    }

    /// Parse `body` with this format's parser
    #[must_use]
    pub fn parse(self, body: &str) -> Timeline {
        match self {
            Self::Lrc => parse_lrc(body),
            Self::Krc => parse_krc(body),
        }
    }
}
