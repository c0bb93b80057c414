use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Sentence end: terminal punctuation plus one whitespace character
    static ref SENTENCE_END: Regex = Regex::new(r"[.!?][ \t\n\x0B\x0C\r]").unwrap();
}

/// Splits `text` into sentences, each keeping its trailing punctuation and
/// the whitespace character that follows it.
fn sentences(text: &str) -> Vec<&str> {
    let mut pieces = Vec::new();
    let mut start = 0;
    for m in SENTENCE_END.find_iter(text) {
        pieces.push(&text[start..m.end()]);
        start = m.end();
    }
    if start < text.len() {
        pieces.push(&text[start..]);
    }
    pieces
}

/// Packs whole sentences greedily into segments of at most `max_size`
/// characters. A sentence longer than `max_size` becomes its own segment
/// rather than being cut. Segments are trimmed.
pub fn chunk(text: &str, max_size: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for sentence in sentences(text) {
        let sentence_len = sentence.chars().count();
        if current_len + sentence_len > max_size && !current.is_empty() {
            chunks.push(current.trim().to_string());
            current.clear();
            current_len = 0;
        }
        current.push_str(sentence);
        current_len += sentence_len;
    }

    if !current.is_empty() {
        chunks.push(current.trim().to_string());
    }

    chunks
}
