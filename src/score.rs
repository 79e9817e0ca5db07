//! Score parsing: pull an "obtained/total" pair out of a free-form report.
//!
//! The grading service is asked to state the overall marks, but nothing
//! forces it to put them first. [`parse_score`] takes the leftmost
//! `<digits>/<digits>` in the text, so a report that opens with a per-question
//! line such as `Q1: 3/5` yields `3/5`, not the total. That is the defined
//! behaviour; callers that need something smarter must parse the report
//! themselves.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

// ASCII digits only: `\d` would also match other Unicode decimal digits.
static RE_SCORE: Lazy<Regex> = Lazy::new(|| Regex::new(r"([0-9]+)/([0-9]+)").unwrap());

/// A numeric result stated in a report as `obtained/total`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Score {
    pub obtained: u64,
    pub total: u64,
}

impl Score {
    /// `obtained` as a percentage of `total`, or `None` when `total` is 0.
    ///
    /// Not clamped: a report claiming `12/10` gives 120 %.
    pub fn percentage(&self) -> Option<f64> {
        if self.total == 0 {
            None
        } else {
            Some(self.obtained as f64 / self.total as f64 * 100.0)
        }
    }

    /// Banner band for this score, or `None` when `total` is 0.
    pub fn band(&self) -> Option<ScoreBand> {
        self.percentage().map(ScoreBand::from_percentage)
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.obtained, self.total)
    }
}

/// Scan `text` left to right and return the first `obtained/total` pair.
///
/// Returns `None` when the text contains no such pattern. An absent score is
/// a normal outcome, not an error. Neither `obtained <= total` nor the
/// context around the match is checked. A first match whose digits do not
/// fit in a `u64` also yields `None`.
pub fn parse_score(text: &str) -> Option<Score> {
    let caps = RE_SCORE.captures(text)?;
    let obtained = caps[1].parse().ok()?;
    let total = caps[2].parse().ok()?;
    Some(Score { obtained, total })
}

/// Performance band used for the score banner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScoreBand {
    /// 80 % and above.
    Excellent,
    /// 60 % up to 80 %.
    Good,
    /// 40 % up to 60 %.
    KeepImproving,
    /// Below 40 %.
    NeedsPractice,
}

impl ScoreBand {
    pub fn from_percentage(pct: f64) -> Self {
        if pct >= 80.0 {
            ScoreBand::Excellent
        } else if pct >= 60.0 {
            ScoreBand::Good
        } else if pct >= 40.0 {
            ScoreBand::KeepImproving
        } else {
            ScoreBand::NeedsPractice
        }
    }

    /// Encouragement line shown under the score.
    pub fn label(&self) -> &'static str {
        match self {
            ScoreBand::Excellent => "🌟 Excellent!",
            ScoreBand::Good => "👍 Good Job!",
            ScoreBand::KeepImproving => "💪 Keep Improving!",
            ScoreBand::NeedsPractice => "📚 Need More Practice",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overall_marks_are_found() {
        assert_eq!(
            parse_score("Overall marks: 42/50 ..."),
            Some(Score {
                obtained: 42,
                total: 50
            })
        );
    }

    #[test]
    fn no_pattern_is_none() {
        assert_eq!(parse_score("No numeric pattern here"), None);
    }

    #[test]
    fn empty_text_is_none() {
        assert_eq!(parse_score(""), None);
    }

    #[test]
    fn first_match_wins() {
        assert_eq!(
            parse_score("Q1: 3/5, Overall: 18/20"),
            Some(Score {
                obtained: 3,
                total: 5
            })
        );
    }

    #[test]
    fn adjacent_characters_do_not_matter() {
        assert_eq!(
            parse_score("**Total:**87/100pts"),
            Some(Score {
                obtained: 87,
                total: 100
            })
        );
    }

    #[test]
    fn obtained_above_total_is_not_rejected() {
        let s = parse_score("12/10").unwrap();
        assert_eq!(s.obtained, 12);
        assert_eq!(s.band(), Some(ScoreBand::Excellent));
    }

    #[test]
    fn sign_and_spaces_break_the_pattern() {
        assert_eq!(parse_score("-3 / 5"), None);
        assert_eq!(
            parse_score("-3/5"),
            Some(Score {
                obtained: 3,
                total: 5
            })
        );
    }

    #[test]
    fn non_ascii_digits_are_ignored() {
        // Devanagari ४२/५० is not a base-10 ASCII score.
        assert_eq!(parse_score("अंक: ४२/५०"), None);
    }

    #[test]
    fn overflowing_digits_give_none() {
        assert_eq!(parse_score("99999999999999999999999/5"), None);
    }

    #[test]
    fn zero_total_has_no_band() {
        let s = parse_score("0/0").unwrap();
        assert_eq!(s.percentage(), None);
        assert_eq!(s.band(), None);
    }

    #[test]
    fn band_thresholds() {
        assert_eq!(ScoreBand::from_percentage(80.0), ScoreBand::Excellent);
        assert_eq!(ScoreBand::from_percentage(79.9), ScoreBand::Good);
        assert_eq!(ScoreBand::from_percentage(60.0), ScoreBand::Good);
        assert_eq!(ScoreBand::from_percentage(40.0), ScoreBand::KeepImproving);
        assert_eq!(ScoreBand::from_percentage(39.0), ScoreBand::NeedsPractice);
        assert_eq!(ScoreBand::NeedsPractice.label(), "📚 Need More Practice");
    }

    #[test]
    fn display_matches_report_notation() {
        let s = Score {
            obtained: 18,
            total: 20,
        };
        assert_eq!(s.to_string(), "18/20");
        assert_eq!(s.percentage(), Some(90.0));
    }
}
