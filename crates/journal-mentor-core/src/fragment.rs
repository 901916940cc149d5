//! Fixed-length text fragmenter.
//!
//! Rich-text blocks in the store carry a per-block content limit, so long
//! feedback is written as consecutive paragraphs. Splitting is purely
//! positional: fragments are `size` characters long (the last may be
//! shorter) and may cut through a word. Concatenating the fragments in
//! order yields the original text.
//!
//! # Example
//!
//! ```rust
//! use journal_mentor_core::fragment::split_fragments;
//!
//! let parts = split_fragments("abcdefg", 3);
//! assert_eq!(parts, vec!["abc", "def", "g"]);
//! assert_eq!(parts.concat(), "abcdefg");
//! ```

/// Default fragment length in characters.
pub const DEFAULT_FRAGMENT_SIZE: usize = 1800;

/// Split `text` into fragments of at most `size` characters.
///
/// Counts Unicode scalar values, not bytes, so Cyrillic text is never cut
/// inside a character. Empty text yields no fragments. A `size` of zero is
/// treated as one.
pub fn split_fragments(text: &str, size: usize) -> Vec<String> {
    let size = size.max(1);
    let mut fragments = Vec::with_capacity(text.len() / size + 1);
    let mut current = String::new();
    let mut count = 0;

    for ch in text.chars() {
        current.push(ch);
        count += 1;
        if count == size {
            fragments.push(std::mem::take(&mut current));
            count = 0;
        }
    }
    if !current.is_empty() {
        fragments.push(current);
    }
    fragments
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_4000_chars_into_three() {
        let text: String = (0..4000).map(|i| (b'a' + (i % 26) as u8) as char).collect();
        let parts = split_fragments(&text, DEFAULT_FRAGMENT_SIZE);
        let lengths: Vec<usize> = parts.iter().map(|p| p.chars().count()).collect();
        assert_eq!(lengths, vec![1800, 1800, 400]);
        assert_eq!(parts.concat(), text);
    }

    #[test]
    fn test_exact_multiple_has_no_empty_tail() {
        let parts = split_fragments("abcdef", 3);
        assert_eq!(parts, vec!["abc", "def"]);
    }

    #[test]
    fn test_cyrillic_counts_characters() {
        let text = "Привіт, світе";
        let parts = split_fragments(text, 4);
        assert_eq!(parts[0], "Прив");
        assert_eq!(parts.concat(), text);
    }

    #[test]
    fn test_empty_text() {
        assert!(split_fragments("", 10).is_empty());
    }

    #[test]
    fn test_zero_size_is_one() {
        assert_eq!(split_fragments("ab", 0), vec!["a", "b"]);
    }
}
