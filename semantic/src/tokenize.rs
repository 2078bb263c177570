use std::collections::BTreeSet;

const STOP_WORDS: &[&str] = &[
    "a", "about", "above", "after", "again", "against", "all", "also", "am", "an", "and", "any",
    "are", "as", "at", "be", "because", "been", "before", "being", "below", "between", "both",
    "but", "by", "can", "could", "did", "do", "does", "doing", "down", "during", "each", "else",
    "etc", "few", "for", "from", "further", "get", "got", "had", "has", "have", "having", "he",
    "her", "here", "hers", "herself", "him", "himself", "his", "how", "however", "i", "if", "in",
    "into", "is", "it", "its", "itself", "just", "may", "me", "might", "more", "most", "must",
    "my", "myself", "no", "nor", "not", "now", "of", "off", "on", "once", "only", "or", "other",
    "our", "ours", "ourselves", "out", "over", "own", "same", "shall", "she", "should", "so",
    "some", "such", "than", "that", "the", "their", "theirs", "them", "themselves", "then",
    "there", "these", "they", "this", "those", "through", "to", "too", "under", "until", "up",
    "us", "very", "was", "we", "were", "what", "when", "where", "which", "while", "who", "whom",
    "why", "will", "with", "would", "you", "your", "yours", "yourself", "yourselves",
];

pub fn is_stop_word(token: &str) -> bool {
    STOP_WORDS.contains(&token)
}

/// Lowercased alphanumeric runs of two or more characters, stop words
/// removed, in text order with repeats. Non-ASCII runs also yield their
/// character bigrams so unsegmented scripts still share terms.
pub fn tokenize(text: &str) -> Vec<String> {
    let mut raw = Vec::new();
    let mut buf = String::new();

    for ch in text.chars().flat_map(char::to_lowercase) {
        if ch.is_alphanumeric() {
            buf.push(ch);
        } else if !buf.is_empty() {
            raw.push(std::mem::take(&mut buf));
        }
    }
    if !buf.is_empty() {
        raw.push(buf);
    }

    let mut tokens = Vec::with_capacity(raw.len());
    for token in raw {
        if !token.is_ascii() {
            let chars: Vec<char> = token.chars().collect();
            for window in chars.windows(2) {
                tokens.push(window.iter().collect());
            }
        }
        if token.chars().count() >= 2 && !is_stop_word(&token) {
            tokens.push(token);
        }
    }
    tokens
}

pub fn token_set(text: &str) -> BTreeSet<String> {
    tokenize(text).into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_lowercases_and_drops_stop_words() {
        assert_eq!(
            tokenize("How do I set up International Shipping?"),
            vec!["set", "international", "shipping"]
        );
    }

    #[test]
    fn test_tokenize_keeps_repeats_and_digits() {
        assert_eq!(tokenize("EU-27 zones, zones"), vec!["eu", "27", "zones", "zones"]);
    }

    #[test]
    fn test_tokenize_adds_bigrams_for_non_ascii_runs() {
        let tokens = tokenize("配送料金");
        assert!(tokens.contains(&"配送".to_string()));
        assert!(tokens.contains(&"料金".to_string()));
    }

    #[test]
    fn test_token_set_dedups() {
        assert_eq!(token_set("rates rates zones").len(), 2);
    }
}
