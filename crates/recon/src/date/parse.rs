//! Lenient date reader for label dates.
//!
//! Accepts the forms that show up on specimen labels and in model output:
//! ISO dates with or without a time, `3 March 1998`, `March 3, 1998`,
//! `Mar 1998`, `1998`, `19980312`, `3/12/1998`, `25/12/98`. Anything with a
//! word that is not a month, a weekday, or a filler word is rejected rather
//! than guessed at.

use std::sync::OnceLock;

use chrono::NaiveDate;
use regex::Regex;

const MONTHS: [&str; 12] = [
    "january", "february", "march", "april", "may", "june", "july", "august",
    "september", "october", "november", "december",
];

const WEEKDAYS: [&str; 7] = [
    "monday", "tuesday", "wednesday", "thursday", "friday", "saturday", "sunday",
];

const FILLERS: &[&str] = &[
    "at", "on", "and", "ad", "m", "t", "of", "st", "nd", "rd", "th", "the",
];

/// Words shorter than this never abbreviate a month or weekday.
const MIN_ABBREV: usize = 3;

/// Two-digit years up to this value are in the 2000s.
const CENTURY_PIVOT: u32 = 30;

#[derive(Debug, Clone, Copy)]
struct Num {
    value: u32,
    digits: usize,
}

impl Num {
    fn year_like(&self) -> bool {
        self.digits >= 3 || self.value > 31
    }

    fn year(&self) -> i32 {
        let year = match self.digits {
            0..=2 if self.value <= CENTURY_PIVOT => 2000 + self.value,
            0..=2 => 1900 + self.value,
            _ => self.value,
        };
        year as i32
    }
}

fn month_number(word: &str) -> Option<u32> {
    if word.chars().count() < MIN_ABBREV {
        return None;
    }
    MONTHS
        .iter()
        .position(|m| m.starts_with(word))
        .map(|i| i as u32 + 1)
}

fn is_weekday(word: &str) -> bool {
    word.chars().count() >= MIN_ABBREV && WEEKDAYS.iter().any(|d| d.starts_with(word))
}

/// Read a calendar date out of `text`; `None` when it is not one.
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    static TIME: OnceLock<Regex> = OnceLock::new();
    static TOKEN: OnceLock<Regex> = OnceLock::new();
    let time = TIME.get_or_init(|| {
        Regex::new(
            r"(?i)T?\d{1,2}:\d{2}(?::\d{2}(?:\.\d+)?)?(?:\s*(?:Z|[ap]\.?m\.?|[+-]\d{2}:?\d{2}))?",
        )
        .expect("valid regex")
    });
    let token = TOKEN.get_or_init(|| Regex::new(r"\d+|[^\W\d_]+").expect("valid regex"));

    let text = time.replace_all(text, " ");

    let mut month = None;
    let mut nums: Vec<Num> = Vec::new();
    for tok in token.find_iter(&text) {
        let tok = tok.as_str();
        if tok.starts_with(|c: char| c.is_ascii_digit()) {
            nums.push(Num {
                value: tok.parse().ok()?,
                digits: tok.len(),
            });
            continue;
        }
        let word = tok.to_lowercase();
        if let Some(m) = month_number(&word) {
            if month.replace(m).is_some() {
                return None;
            }
        } else if !is_weekday(&word) && !FILLERS.contains(&word.as_str()) {
            return None;
        }
    }

    let (year, month, day) = match month {
        Some(month) => with_month(month, &nums)?,
        None => without_month(&nums)?,
    };
    NaiveDate::from_ymd_opt(year, month, day)
}

fn with_month(month: u32, nums: &[Num]) -> Option<(i32, u32, u32)> {
    match nums {
        [y] if y.year_like() => Some((y.year(), month, 1)),
        [a, b] if a.year_like() && !b.year_like() => Some((a.year(), month, b.value)),
        [d, y] => Some((y.year(), month, d.value)),
        _ => None,
    }
}

fn without_month(nums: &[Num]) -> Option<(i32, u32, u32)> {
    match nums {
        [n] if n.digits == 8 => Some((
            (n.value / 10_000) as i32,
            (n.value / 100) % 100,
            n.value % 100,
        )),
        [y] if y.year_like() => Some((y.year(), 1, 1)),
        [y, m] if y.year_like() => Some((y.year(), m.value, 1)),
        [m, y] if y.year_like() => Some((y.year(), m.value, 1)),
        [y, m, d] if y.year_like() => Some((y.year(), m.value, d.value)),
        [d, m, y] if d.value > 12 => Some((y.year(), m.value, d.value)),
        [m, d, y] => Some((y.year(), m.value, d.value)),
        _ => None,
    }
}
