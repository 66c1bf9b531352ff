//! Text tokenization for phrase matching
//!
//! Field text and phrase literals are tokenized the same way so that an
//! equality clause like `name: "osiloke"` matches the stored value
//! `"osiloke emoekpere"`: lowercase, split on non-alphanumeric
//! characters, drop empty fragments.

/// Tokenize text into searchable terms
///
/// # Example
///
/// ```
/// use docstore_search::tokenizer::tokenize;
///
/// let tokens = tokenize("Hello, World!");
/// assert_eq!(tokens, vec!["hello", "world"]);
/// ```
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// Count occurrences of `phrase` as a consecutive token run in `tokens`
pub fn phrase_occurrences(tokens: &[String], phrase: &[String]) -> usize {
    if phrase.is_empty() || phrase.len() > tokens.len() {
        return 0;
    }
    tokens
        .windows(phrase.len())
        .filter(|w| *w == phrase)
        .count()
}
