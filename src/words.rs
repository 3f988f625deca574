use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Which characters make up a word.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Script {
    /// Precomposed Hangul syllables, `가` through `힣`.
    #[default]
    Hangul,
    /// Any Unicode alphabetic character.
    Alphabetic,
}

impl Script {
    fn is_word_char(self, c: char) -> bool {
        match self {
            Script::Hangul => ('\u{AC00}'..='\u{D7A3}').contains(&c),
            Script::Alphabetic => c.is_alphabetic(),
        }
    }
}

/// Splits `text` into maximal runs of word characters.
pub fn tokenize(text: &str, script: Script) -> impl Iterator<Item = &str> + '_ {
    text.split(move |c: char| !script.is_word_char(c))
        .filter(|token| !token.is_empty())
}

/// Counts every word across the non-empty texts. Case-sensitive, no stemming.
pub fn extract_word_frequencies<I, S>(texts: I, script: Script) -> BTreeMap<String, usize>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let joined = texts
        .into_iter()
        .filter(|text| !text.as_ref().trim().is_empty())
        .map(|text| text.as_ref().to_string())
        .collect::<Vec<_>>()
        .join(" ");

    let mut counts = BTreeMap::new();
    for token in tokenize(&joined, script) {
        *counts.entry(token.to_string()).or_insert(0) += 1;
    }
    counts
}

/// The `limit` most frequent words; ties go to the lexically smaller word.
pub fn top_words(frequencies: &BTreeMap<String, usize>, limit: usize) -> Vec<(String, usize)> {
    let mut words: Vec<(String, usize)> = frequencies
        .iter()
        .map(|(word, count)| (word.clone(), *count))
        .collect();
    words.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    words.truncate(limit);
    words
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_repeated_hangul_words() {
        let freqs = extract_word_frequencies(["가나 가나 다라"], Script::Hangul);
        assert_eq!(freqs.len(), 2);
        assert_eq!(freqs["가나"], 2);
        assert_eq!(freqs["다라"], 1);
    }

    #[test]
    fn empty_input_gives_empty_map() {
        assert!(extract_word_frequencies([""], Script::Hangul).is_empty());
        assert!(extract_word_frequencies(Vec::<String>::new(), Script::Hangul).is_empty());
    }

    #[test]
    fn punctuation_digits_and_latin_split_hangul_runs() {
        let freqs = extract_word_frequencies(["시어의 함축적 의미가 2번,어려웠어요!abc시어의"], Script::Hangul);
        assert_eq!(freqs["시어의"], 2);
        assert_eq!(freqs["어려웠어요"], 1);
        assert!(!freqs.contains_key("abc"));
    }

    #[test]
    fn words_are_not_merged_across_responses() {
        let freqs = extract_word_frequencies(["끝", "시작"], Script::Hangul);
        assert_eq!(freqs.get("끝시작"), None);
        assert_eq!(freqs["끝"], 1);
    }

    #[test]
    fn alphabetic_script_is_case_sensitive() {
        let freqs = extract_word_frequencies(["Loop loop loop."], Script::Alphabetic);
        assert_eq!(freqs["loop"], 2);
        assert_eq!(freqs["Loop"], 1);
    }

    #[test]
    fn top_words_orders_by_count_then_word() {
        let freqs = extract_word_frequencies(["나 가 가 다 다"], Script::Hangul);
        let top = top_words(&freqs, 2);
        assert_eq!(top, vec![("가".to_string(), 2), ("다".to_string(), 2)]);
    }
}
