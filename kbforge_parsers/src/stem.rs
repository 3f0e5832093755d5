//! English plural to singular stemming for class names.

const IRREGULAR: [(&str, &str); 16] = [
    ("children", "child"),
    ("men", "man"),
    ("women", "woman"),
    ("people", "person"),
    ("mice", "mouse"),
    ("geese", "goose"),
    ("feet", "foot"),
    ("teeth", "tooth"),
    ("oxen", "ox"),
    ("lice", "louse"),
    ("dice", "die"),
    ("criteria", "criterion"),
    ("phenomena", "phenomenon"),
    ("bacteria", "bacterium"),
    ("alumni", "alumnus"),
    ("cacti", "cactus"),
];

const UNINFLECTED: [&str; 12] = [
    "sheep", "fish", "deer", "series", "species", "news", "aircraft", "moose", "swine", "bison",
    "means", "offspring",
];

const F_PLURALS: [(&str, &str); 10] = [
    ("wolves", "wolf"),
    ("knives", "knife"),
    ("leaves", "leaf"),
    ("lives", "life"),
    ("wives", "wife"),
    ("halves", "half"),
    ("shelves", "shelf"),
    ("thieves", "thief"),
    ("calves", "calf"),
    ("loaves", "loaf"),
];

const O_PLURALS: [&str; 5] = ["heroes", "potatoes", "tomatoes", "echoes", "volcanoes"];

fn with_case(original: &str, replacement: &str) -> String {
    if original.chars().next().is_some_and(char::is_uppercase) {
        let mut chars = replacement.chars();
        chars.next().map_or_else(String::new, |first| {
            first.to_uppercase().chain(chars).collect()
        })
    } else {
        replacement.to_string()
    }
}

/// Reduces an English plural noun to its singular. Words that do not look
/// plural are returned unchanged. Only the final word of a phrase is stemmed
/// and the case of the remaining text is preserved.
#[must_use]
pub fn stem(phrase: &str) -> String {
    let split = phrase.rfind(' ').map_or(0, |i| i + 1);
    let (head, word) = phrase.split_at(split);
    format!("{head}{}", stem_word(word))
}

fn stem_word(word: &str) -> String {
    let lower = word.to_lowercase();
    if lower.len() < 3 || UNINFLECTED.contains(&lower.as_str()) {
        return word.to_string();
    }
    for (plural, singular) in IRREGULAR.iter().chain(F_PLURALS.iter()) {
        if lower == *plural {
            return with_case(word, singular);
        }
    }
    let strip = |n: usize| {
        word.get(..word.len().saturating_sub(n))
            .unwrap_or(word)
            .to_string()
    };
    if O_PLURALS.contains(&lower.as_str()) {
        return strip(2);
    }
    if lower.ends_with("ies") && lower.len() > 4 {
        return format!("{}y", strip(3));
    }
    if ["sses", "ches", "shes", "xes", "zzes"]
        .iter()
        .any(|suffix| lower.ends_with(suffix))
    {
        return strip(2);
    }
    if lower.ends_with("ss") || lower.ends_with("us") || lower.ends_with("is") {
        return word.to_string();
    }
    if lower.ends_with('s') {
        return strip(1);
    }
    word.to_string()
}
