//! Roman-numeral month tokens ("3 III 1998").

use std::borrow::Cow;
use std::sync::OnceLock;

use regex::{Captures, Regex};

const MONTH_NAMES: [&str; 12] = [
    "January", "February", "March", "April", "May", "June", "July", "August",
    "September", "October", "November", "December",
];

const NUMERALS: [&str; 12] = [
    "i", "ii", "iii", "iv", "v", "vi", "vii", "viii", "ix", "x", "xi", "xii",
];

fn numeral_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // longest alternatives first so "xii" is not read as "x"
    RE.get_or_init(|| {
        Regex::new(r"(?i)\b(xii|xi|x|ix|viii|vii|vi|v|iv|iii|ii|i)\b").expect("valid regex")
    })
}

/// Whether the text holds a whole-word Roman numeral from i to xii.
pub fn has_roman(text: &str) -> bool {
    numeral_re().is_match(text)
}

/// Replace each whole-word Roman numeral i–xii with its English month name.
pub fn replace_roman(text: &str) -> Cow<'_, str> {
    numeral_re().replace_all(text, |caps: &Captures| {
        let token = caps[1].to_lowercase();
        NUMERALS
            .iter()
            .position(|n| *n == token)
            .map_or_else(|| caps[0].to_string(), |i| MONTH_NAMES[i].to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replaces_whole_words_only() {
        assert_eq!(replace_roman("12 iii 1998"), "12 March 1998");
        assert_eq!(replace_roman("3.XII.1987"), "3.December.1987");
        assert_eq!(replace_roman("Vienna 1998"), "Vienna 1998");
        assert_eq!(replace_roman("IV-V 2001"), "April-May 2001");
    }

    #[test]
    fn detects_tokens() {
        assert!(has_roman("3 III 1998"));
        assert!(has_roman("viii.1950"));
        assert!(!has_roman("3 March 1998"));
        assert!(!has_roman("xiii 1998"));
    }
}
