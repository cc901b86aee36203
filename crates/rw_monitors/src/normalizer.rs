use lazy_static::lazy_static;
use regex::Regex;

/// Repeats shorter than this are left alone ("Go Go", "aa").
const MIN_REPEAT_CHARS: usize = 4;

lazy_static! {
    static ref WHITESPACE: Regex = Regex::new(r"\s+").expect("whitespace pattern");

    /// "Options - 3 hours ago Fed signals..."
    static ref CATEGORY_WITH_TIME: Regex = Regex::new(
        r"(?i)^[\p{L}&/ ]{1,40}?\s*[-–—|•:]\s*\d+\s+(?:second|sec|minute|min|hour|hr|day|week|month|year)s?\s+ago\b\s*[-–—|•:]?\s*"
    )
    .expect("category/time pattern");

    /// "3 hours ago Fed signals..."
    static ref RELATIVE_TIME: Regex = Regex::new(
        r"(?i)^\d+\s+(?:second|sec|minute|min|hour|hr|day|week|month|year)s?\s+ago\b\s*[-–—|•:]?\s*"
    )
    .expect("relative time pattern");

    /// "Quick Take: Fed signals..."
    static ref CATEGORY_TAG: Regex = Regex::new(
        r"(?i)^(?:market quick take|quick take|options|macro|equities|commodities|fx|crypto|fixed income|podcast)\s*[-–—|•:]\s*"
    )
    .expect("category tag pattern");
}

pub fn collapse_whitespace(text: &str) -> String {
    WHITESPACE.replace_all(text.trim(), " ").into_owned()
}

/// Truncates `text` to one occurrence when it consists of a head repeated back to back.
pub fn collapse_repeat(text: &str) -> String {
    let ends: Vec<usize> = text.char_indices().map(|(i, _)| i).skip(1).collect();
    for &end in ends.iter().rev() {
        let head = text[..end].trim_end();
        if head.chars().count() < MIN_REPEAT_CHARS {
            break;
        }
        let mut tail = text[end..].trim_start();
        while let Some(rest) = tail.strip_prefix(head) {
            tail = rest.trim_start();
            if tail.is_empty() {
                return head.to_string();
            }
        }
    }
    text.to_string()
}

fn strip_prefixes(text: &str) -> String {
    let mut current = text.to_string();
    loop {
        let stripped = [&*CATEGORY_WITH_TIME, &*RELATIVE_TIME, &*CATEGORY_TAG]
            .iter()
            .find_map(|pattern| {
                pattern
                    .find(&current)
                    .filter(|m| m.end() > 0)
                    .map(|m| current[m.end()..].trim().to_string())
            });
        match stripped {
            Some(next) if !next.is_empty() && next != current => current = next,
            _ => return current,
        }
    }
}

/// Cleans scraped titles of boilerplate prefixes and doubled text.
#[derive(Debug, Clone, Copy, Default)]
pub struct TitleNormalizer;

impl TitleNormalizer {
    pub fn new() -> Self {
        Self
    }

    pub fn normalize(&self, raw: &str) -> String {
        let collapsed = collapse_whitespace(raw);
        let title = collapse_repeat(&collapsed);
        let title = strip_prefixes(&title);
        let title = collapse_repeat(&title);

        if !title.is_empty() {
            title
        } else if !collapsed.is_empty() {
            collapsed
        } else {
            raw.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normalize(raw: &str) -> String {
        TitleNormalizer::new().normalize(raw)
    }

    #[test]
    fn test_prefix_and_duplication() {
        assert_eq!(
            normalize("Options - 3 hours ago Fed signals rate pause. Fed signals rate pause."),
            "Fed signals rate pause."
        );
    }

    #[test]
    fn test_duplicated_prefix_and_title() {
        assert_eq!(
            normalize("Macro - 1 day ago Oil slides Macro - 1 day ago Oil slides"),
            "Oil slides"
        );
    }

    #[test]
    fn test_relative_time_only() {
        assert_eq!(normalize("45 minutes ago  Gold   extends rally"), "Gold extends rally");
        assert_eq!(normalize("2 weeks ago | Yen weakens"), "Yen weakens");
    }

    #[test]
    fn test_category_tag() {
        assert_eq!(normalize("Quick Take: Equities close higher"), "Equities close higher");
        assert_eq!(normalize("Market Quick Take - 14 March 2025"), "14 March 2025");
    }

    #[test]
    fn test_clean_title_unchanged() {
        assert_eq!(normalize("Weekly Grain Outlook"), "Weekly Grain Outlook");
        assert_eq!(normalize("Go Go"), "Go Go");
    }

    #[test]
    fn test_triple_repeat() {
        assert_eq!(normalize("Corn rallies Corn rallies Corn rallies"), "Corn rallies");
    }

    #[test]
    fn test_prefix_only_keeps_original() {
        assert_eq!(normalize("Options - 3 hours ago"), "Options - 3 hours ago");
        assert_eq!(normalize("3 hours ago"), "3 hours ago");
    }

    #[test]
    fn test_never_empty() {
        let inputs = [
            "x", " ", "\n\t", "-", "ago", "1 day ago", "Options:", "aaaa aaaa",
            "Options - 3 hours ago Options - 3 hours ago", "FX | ", "ééé ééé",
        ];
        for input in inputs {
            let out = normalize(input);
            assert!(!out.is_empty(), "empty output for {:?}", input);
            assert_eq!(out, normalize(input), "not deterministic for {:?}", input);
        }
    }

    #[test]
    fn test_collapse_repeat_respects_char_boundaries() {
        assert_eq!(collapse_repeat("Économie Économie"), "Économie");
        assert_eq!(collapse_repeat("abc"), "abc");
        assert_eq!(collapse_repeat(""), "");
    }
}
