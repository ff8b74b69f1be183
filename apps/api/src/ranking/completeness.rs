//! Completeness scorer: the share of meaningful tokens in a resume's visible text.
//!
//! A token is meaningful when it is fully alphanumeric and not a stop word.
//! Punctuation tokens count toward the total, so boilerplate-heavy pages score lower.

use std::collections::HashSet;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};
use unicode_segmentation::UnicodeSegmentation;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Language {
    #[default]
    English,
    Ukrainian,
}

impl std::str::FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "en" | "english" => Ok(Language::English),
            "uk" | "ua" | "ukrainian" => Ok(Language::Ukrainian),
            other => Err(format!("unsupported language '{other}'")),
        }
    }
}

const ENGLISH_STOP_WORDS: &[&str] = &[
    "i", "me", "my", "myself", "we", "our", "ours", "ourselves", "you", "you're", "you've",
    "you'll", "you'd", "your", "yours", "yourself", "yourselves", "he", "him", "his",
    "himself", "she", "she's", "her", "hers", "herself", "it", "it's", "its", "itself",
    "they", "them", "their", "theirs", "themselves", "what", "which", "who", "whom", "this",
    "that", "that'll", "these", "those", "am", "is", "are", "was", "were", "be", "been",
    "being", "have", "has", "had", "having", "do", "does", "did", "doing", "a", "an", "the",
    "and", "but", "if", "or", "because", "as", "until", "while", "of", "at", "by", "for",
    "with", "about", "against", "between", "into", "through", "during", "before", "after",
    "above", "below", "to", "from", "up", "down", "in", "out", "on", "off", "over", "under",
    "again", "further", "then", "once", "here", "there", "when", "where", "why", "how",
    "all", "any", "both", "each", "few", "more", "most", "other", "some", "such", "no",
    "nor", "not", "only", "own", "same", "so", "than", "too", "very", "s", "t", "can",
    "will", "just", "don", "don't", "should", "should've", "now", "d", "ll", "m", "o", "re",
    "ve", "y", "ain", "aren", "aren't", "couldn", "couldn't", "didn", "didn't", "doesn",
    "doesn't", "hadn", "hadn't", "hasn", "hasn't", "haven", "haven't", "isn", "isn't", "ma",
    "mightn", "mightn't", "mustn", "mustn't", "needn", "needn't", "shan", "shan't",
    "shouldn", "shouldn't", "wasn", "wasn't", "weren", "weren't", "won", "won't", "wouldn",
    "wouldn't",
];

const UKRAINIAN_STOP_WORDS: &[&str] = &[
    "а", "але", "або", "б", "би", "без", "бо", "був", "була", "були", "було", "бути", "в",
    "вам", "вас", "весь", "вже", "ви", "від", "він", "вона", "вони", "воно", "все", "всі",
    "де", "для", "до", "є", "ж", "же", "з", "за", "зі", "із", "і", "й", "її", "їй", "їх",
    "його", "йому", "коли", "котрий", "лише", "між", "мене", "мені", "ми", "мій", "мною",
    "на", "навіть", "над", "нам", "нас", "наш", "не", "неї", "немає", "ним", "них", "ні",
    "ну", "о", "об", "однак", "по", "під", "після", "при", "про", "себе", "собі", "свій",
    "та", "так", "також", "там", "те", "тебе", "теж", "ти", "тим", "тільки", "то", "той",
    "тому", "ту", "у", "усі", "це", "цей", "ці", "цього", "ця", "чи", "що", "щоб", "як",
    "яка", "який", "які", "якщо",
];

/// A fixed stop-word set for one language.
#[derive(Debug, Clone)]
pub struct StopWords {
    words: HashSet<&'static str>,
}

impl StopWords {
    pub fn for_language(language: Language) -> &'static StopWords {
        static ENGLISH: OnceLock<StopWords> = OnceLock::new();
        static UKRAINIAN: OnceLock<StopWords> = OnceLock::new();

        match language {
            Language::English => ENGLISH.get_or_init(|| StopWords::from_list(ENGLISH_STOP_WORDS)),
            Language::Ukrainian => {
                UKRAINIAN.get_or_init(|| StopWords::from_list(UKRAINIAN_STOP_WORDS))
            }
        }
    }

    fn from_list(list: &'static [&'static str]) -> Self {
        Self {
            words: list.iter().copied().collect(),
        }
    }

    pub fn contains(&self, token: &str) -> bool {
        self.words.contains(token)
    }
}

/// Scores text against the English stop-word set.
pub fn score(raw_text: &str) -> u8 {
    score_with(raw_text, StopWords::for_language(Language::English))
}

/// `round(100 * meaningful / total)`; `0` for text without tokens.
pub fn score_with(raw_text: &str, stop_words: &StopWords) -> u8 {
    let lowered = raw_text.to_lowercase();

    let mut total = 0usize;
    let mut meaningful = 0usize;
    for token in tokenize(&lowered) {
        total += 1;
        if is_meaningful(token, stop_words) {
            meaningful += 1;
        }
    }

    if total == 0 {
        return 0;
    }
    (100.0 * meaningful as f64 / total as f64).round() as u8
}

/// Word-level tokens: Unicode word-boundary segments, whitespace dropped.
fn tokenize(text: &str) -> impl Iterator<Item = &str> {
    text.split_word_bounds()
        .filter(|segment| !segment.chars().all(char::is_whitespace))
}

fn is_meaningful(token: &str, stop_words: &StopWords) -> bool {
    token.chars().all(char::is_alphanumeric) && !stop_words.contains(token)
}
