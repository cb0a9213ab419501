//! Recursive character text splitter.
//!
//! Splits a memory corpus into overlapping chunks for embedding, preferring
//! paragraph breaks, then line breaks, then sentence boundaries, then word
//! boundaries, before falling back to hard character cuts. Greedy merge:
//! pieces are packed into chunks up to the size limit, and each new chunk is
//! seeded with the tail of the previous one for overlap.

/// Separator preference order, coarsest first.
const SEPARATORS: [&str; 4] = ["\n\n", "\n", ". ", " "];

/// Split `text` into chunks of roughly `chunk_size` characters with
/// `overlap` characters carried between adjacent chunks.
///
/// Chunks may exceed `chunk_size` by at most the overlap carry. Empty or
/// whitespace-only input yields no chunks.
pub fn split_text(text: &str, chunk_size: usize, overlap: usize) -> Vec<String> {
    let text = text.trim();
    if text.is_empty() || chunk_size == 0 {
        return Vec::new();
    }
    if char_len(text) <= chunk_size {
        return vec![text.to_string()];
    }

    let overlap = overlap.min(chunk_size.saturating_sub(1));
    let pieces = decompose(text, chunk_size, 0);
    merge(pieces, chunk_size, overlap)
}

/// Recursively break text into pieces no longer than `size`, trying each
/// separator in preference order before hard cuts.
fn decompose(text: &str, size: usize, sep_idx: usize) -> Vec<String> {
    if char_len(text) <= size {
        return vec![text.to_string()];
    }
    let Some(sep) = SEPARATORS.get(sep_idx) else {
        return hard_cut(text, size);
    };
    if !text.contains(sep) {
        return decompose(text, size, sep_idx + 1);
    }

    let mut out = Vec::new();
    for part in split_keep_separator(text, sep) {
        if char_len(&part) <= size {
            out.push(part);
        } else {
            out.extend(decompose(&part, size, sep_idx + 1));
        }
    }
    out
}

/// Split on `sep`, keeping the separator attached to the preceding piece so
/// no characters are lost on reassembly.
fn split_keep_separator(text: &str, sep: &str) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut rest = text;
    while let Some(pos) = rest.find(sep) {
        let end = pos + sep.len();
        pieces.push(rest[..end].to_string());
        rest = &rest[end..];
    }
    if !rest.is_empty() {
        pieces.push(rest.to_string());
    }
    pieces
}

/// Fixed-size character windows for text with no usable separators; the
/// merge pass adds the overlap carry.
fn hard_cut(text: &str, size: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    let mut out = Vec::new();
    let mut start = 0;
    while start < chars.len() {
        let end = (start + size).min(chars.len());
        out.push(chars[start..end].iter().collect());
        if end == chars.len() {
            break;
        }
        start = end;
    }
    out
}

/// Greedily pack pieces into chunks, carrying an overlap tail forward.
fn merge(pieces: Vec<String>, size: usize, overlap: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_is_carry = true;

    for piece in pieces {
        if !current_is_carry && char_len(&current) + char_len(&piece) > size {
            push_chunk(&mut chunks, &current);
            current = char_tail(&current, overlap);
            current_is_carry = true;
        }
        current.push_str(&piece);
        current_is_carry = false;
    }
    push_chunk(&mut chunks, &current);
    chunks
}

fn push_chunk(chunks: &mut Vec<String>, chunk: &str) {
    let trimmed = chunk.trim();
    if !trimmed.is_empty() {
        chunks.push(trimmed.to_string());
    }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Last `n` characters of `s`.
fn char_tail(s: &str, n: usize) -> String {
    let len = char_len(s);
    if n == 0 || len == 0 {
        return String::new();
    }
    s.chars().skip(len.saturating_sub(n)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_is_one_chunk() {
        let chunks = split_text("a short note", 500, 50);
        assert_eq!(chunks, vec!["a short note"]);
    }

    #[test]
    fn empty_text_yields_nothing() {
        assert!(split_text("", 500, 50).is_empty());
        assert!(split_text("   \n  ", 500, 50).is_empty());
    }

    #[test]
    fn prefers_paragraph_boundaries() {
        let text = format!("{}\n\n{}", "a".repeat(60), "b".repeat(60));
        let chunks = split_text(&text, 80, 10);

        // Paragraphs do not fit together, so each lands in its own chunk
        assert_eq!(chunks.len(), 2);
        assert!(chunks[0].starts_with('a'));
        assert!(chunks[1].ends_with('b'));
    }

    #[test]
    fn falls_back_to_sentences_then_words() {
        let text = "First sentence here. Second sentence follows. Third one too.";
        let chunks = split_text(text, 30, 5);
        assert!(chunks.len() >= 2);
        for chunk in &chunks {
            assert!(chunk.chars().count() <= 30 + 5, "oversized chunk: {chunk:?}");
        }
    }

    #[test]
    fn hard_cuts_unbroken_text() {
        let text = "x".repeat(120);
        let chunks = split_text(&text, 50, 10);
        assert!(chunks.len() >= 3);
        for chunk in &chunks {
            assert!(chunk.chars().count() <= 50 + 10);
        }
        // No characters lost
        let total: usize = chunks.iter().map(|c| c.chars().count()).sum();
        assert!(total >= 120);
    }

    #[test]
    fn adjacent_chunks_overlap() {
        let words: Vec<String> = (0..40).map(|i| format!("word{i}")).collect();
        let text = words.join(" ");
        let chunks = split_text(&text, 80, 20);
        assert!(chunks.len() >= 2);

        // The tail of each chunk reappears at the head of the next
        for pair in chunks.windows(2) {
            let tail: String = pair[0]
                .chars()
                .skip(pair[0].chars().count().saturating_sub(10))
                .collect();
            assert!(
                pair[1].contains(tail.trim()),
                "no overlap between {:?} and {:?}",
                pair[0],
                pair[1]
            );
        }
    }

    #[test]
    fn multibyte_text_splits_on_char_boundaries() {
        let text = "é".repeat(120);
        let chunks = split_text(&text, 50, 10);
        assert!(chunks.len() >= 2);
        for chunk in &chunks {
            assert!(chunk.chars().all(|c| c == 'é'));
        }
    }
}
