//! Language, topic and category classification for incoming items.
//!
//! Pure functions over immutable keyword tables: no I/O, no shared state.
//! The tables default to the static catalog but can be swapped out, which
//! keeps the classifier deterministic and easy to exercise in tests.

use crate::catalog;
use crate::utils::truncate_chars;

/// How many characters of the description participate in location
/// matching, together with the title.
const LOCATION_SNIPPET_CHARS: usize = 200;

/// Immutable classification tables, built once at startup.
#[derive(Debug, Clone)]
pub struct ClassifierConfig {
    /// Absolute floor of target-script characters.
    pub min_script_chars: usize,
    /// Minimum ratio of target-script characters to total characters.
    pub min_script_ratio: f64,
    pub allowed_keywords: Vec<String>,
    pub blocked_keywords: Vec<String>,
    pub location_categories: Vec<(String, Vec<String>)>,
    pub topic_categories: Vec<(String, Vec<String>)>,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        let table = |keys: &[&str]| {
            keys.iter()
                .map(|k| {
                    (
                        k.to_string(),
                        catalog::keywords_for(k)
                            .iter()
                            .map(|s| s.to_string())
                            .collect(),
                    )
                })
                .collect()
        };

        Self {
            min_script_chars: 10,
            min_script_ratio: 0.3,
            allowed_keywords: catalog::ALLOWED_KEYWORDS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            blocked_keywords: catalog::BLOCKED_KEYWORDS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            location_categories: table(catalog::LOCATION_CATEGORIES),
            topic_categories: table(catalog::TOPIC_CATEGORIES),
        }
    }
}

/// Result of classifying one item.
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub is_target_language: bool,
    /// Detected category keys; never empty, defaults to `general`.
    pub categories: Vec<String>,
    /// Advisory block signal; only the strict ingest path enforces it.
    pub blocked: bool,
    /// At least one allow-listed keyword present (strict ingest path).
    pub on_topic: bool,
}

pub struct ContentClassifier {
    config: ClassifierConfig,
}

impl ContentClassifier {
    pub fn new(config: ClassifierConfig) -> Self {
        Self { config }
    }

    pub fn classify(&self, title: &str, description: &str) -> Classification {
        let combined = format!("{} {}", title, description);

        Classification {
            is_target_language: self.is_target_language(&combined),
            categories: self.detect_categories(title, description),
            blocked: self.is_blocked(&combined),
            on_topic: self
                .config
                .allowed_keywords
                .iter()
                .any(|k| combined.contains(k.as_str())),
        }
    }

    /// Both conditions are required independently: the absolute floor
    /// rejects near-empty strings that happen to be mostly Devanagari, the
    /// ratio rejects long English text with a stray Marathi word. The ratio
    /// is deliberately low because headlines often prefix Latin-script
    /// brand names.
    pub fn is_target_language(&self, text: &str) -> bool {
        let total = text.chars().count();
        if total == 0 {
            return false;
        }
        let script = text.chars().filter(|c| is_devanagari(*c)).count();
        script >= self.config.min_script_chars
            && script as f64 / total as f64 >= self.config.min_script_ratio
    }

    /// Multi-label category detection. Location tables match against the
    /// title plus the leading description snippet; topic tables match
    /// against the title only. All matches are kept, so iteration order
    /// never changes the result set.
    pub fn detect_categories(&self, title: &str, description: &str) -> Vec<String> {
        if title.is_empty() && description.is_empty() {
            return vec![catalog::GENERAL_CATEGORY.to_string()];
        }

        let title_lower = title.to_lowercase();
        let snippet_lower = format!(
            "{} {}",
            title,
            truncate_chars(description, LOCATION_SNIPPET_CHARS)
        )
        .to_lowercase();

        let mut matched = Vec::new();

        for (key, keywords) in &self.config.location_categories {
            if keywords
                .iter()
                .any(|kw| snippet_lower.contains(&kw.to_lowercase()))
            {
                matched.push(key.clone());
            }
        }

        for (key, keywords) in &self.config.topic_categories {
            if keywords
                .iter()
                .any(|kw| title_lower.contains(&kw.to_lowercase()))
            {
                matched.push(key.clone());
            }
        }

        if matched.is_empty() {
            matched.push(catalog::GENERAL_CATEGORY.to_string());
        }
        matched
    }

    /// Requires two or more distinct blocked keywords. One occurrence is
    /// not enough: legitimate coverage routinely references a sensitive
    /// topic once.
    pub fn is_blocked(&self, text: &str) -> bool {
        self.config
            .blocked_keywords
            .iter()
            .filter(|k| text.contains(k.as_str()))
            .count()
            >= 2
    }
}

impl Default for ContentClassifier {
    fn default() -> Self {
        Self::new(ClassifierConfig::default())
    }
}

fn is_devanagari(c: char) -> bool {
    ('\u{0900}'..='\u{097F}').contains(&c)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn devanagari(n: usize) -> String {
        std::iter::repeat('\u{0915}').take(n).collect()
    }

    #[test]
    fn language_needs_absolute_floor_and_ratio() {
        let classifier = ContentClassifier::default();

        // 12 chars, 4 Devanagari: ratio 0.33 passes but the floor fails.
        let short = format!("{}abcdefgh", devanagari(4));
        assert_eq!(short.chars().count(), 12);
        assert!(!classifier.is_target_language(&short));

        // 40 chars, 15 Devanagari: both conditions pass.
        let long = format!("{}{}", devanagari(15), "a".repeat(25));
        assert_eq!(long.chars().count(), 40);
        assert!(classifier.is_target_language(&long));

        // Plenty of Devanagari but drowned in Latin text: ratio fails.
        let diluted = format!("{}{}", devanagari(12), "a".repeat(100));
        assert!(!classifier.is_target_language(&diluted));
    }

    #[test]
    fn blocklist_requires_two_distinct_keywords() {
        let classifier = ContentClassifier::default();
        let one = catalog::BLOCKED_KEYWORDS[0];
        let two = catalog::BLOCKED_KEYWORDS[1];

        assert!(!classifier.is_blocked(&format!("text {} text", one)));
        // Repeating the same keyword still counts as one.
        assert!(!classifier.is_blocked(&format!("{} {} {}", one, one, one)));
        assert!(classifier.is_blocked(&format!("{} text {}", one, two)));
    }

    #[test]
    fn detects_location_from_description_snippet() {
        let classifier = ContentClassifier::default();
        let pune_kw = catalog::keywords_for("pune")[0];

        let cats = classifier.detect_categories("some headline", &format!("news from {}", pune_kw));
        assert!(cats.contains(&"pune".to_string()));
    }

    #[test]
    fn topic_match_ignores_description() {
        let classifier = ContentClassifier::default();
        let sports_kw = catalog::keywords_for("sports")[0];

        // Topic keyword only in the description: no match.
        let cats = classifier.detect_categories("headline", &format!("about {}", sports_kw));
        assert!(!cats.contains(&"sports".to_string()));

        let cats = classifier.detect_categories(&format!("breaking {}", sports_kw), "");
        assert!(cats.contains(&"sports".to_string()));
    }

    #[test]
    fn unmatched_items_fall_back_to_general() {
        let classifier = ContentClassifier::default();
        let cats = classifier.detect_categories("plain headline", "nothing notable");
        assert_eq!(cats, vec!["general".to_string()]);
        assert_eq!(
            classifier.detect_categories("", ""),
            vec!["general".to_string()]
        );
    }

    #[test]
    fn multiple_categories_are_all_kept() {
        let classifier = ContentClassifier::default();
        let pune_kw = catalog::keywords_for("pune")[0];
        let sports_kw = catalog::keywords_for("sports")[0];

        let title = format!("{} {}", pune_kw, sports_kw);
        let cats = classifier.detect_categories(&title, "");
        assert!(cats.contains(&"pune".to_string()));
        assert!(cats.contains(&"sports".to_string()));
    }
}
