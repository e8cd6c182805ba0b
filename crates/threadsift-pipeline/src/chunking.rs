//! Overlapping text chunking for embedding.
//!
//! Splits text into bounded-size windows that share a configurable overlap
//! with their neighbor, preferring paragraph, sentence, then word boundaries.

/// A single chunk of text with its position in the sequence.
#[derive(Debug, Clone)]
pub struct TextChunk {
    pub text: String,
    pub chunk_index: usize,
    pub total_chunks: usize,
}

/// Recursive splitter producing overlapping windows of at most `chunk_size`
/// characters with roughly `chunk_overlap` characters carried between
/// adjacent windows.
pub struct OverlapChunker {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    separators: Vec<&'static str>,
}

impl OverlapChunker {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        Self {
            chunk_size,
            chunk_overlap: chunk_overlap.min(chunk_size.saturating_sub(1)),
            separators: vec!["\n\n", "\n", ". ", " "],
        }
    }

    /// Split `text` into overlapping chunks.
    pub fn chunk(&self, text: &str) -> Vec<TextChunk> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Vec::new();
        }
        if trimmed.len() <= self.chunk_size {
            return vec![TextChunk {
                text: trimmed.to_string(),
                chunk_index: 0,
                total_chunks: 1,
            }];
        }

        let pieces = self.split_pieces(trimmed, &self.separators);
        let merged = self.merge_with_overlap(&pieces);
        let total = merged.len();
        merged
            .into_iter()
            .enumerate()
            .map(|(i, text)| TextChunk {
                text,
                chunk_index: i,
                total_chunks: total,
            })
            .collect()
    }

    /// Recursively break text into pieces no longer than `chunk_size`.
    fn split_pieces(&self, text: &str, separators: &[&'static str]) -> Vec<String> {
        if text.len() <= self.chunk_size {
            return vec![text.to_string()];
        }

        let Some((separator, remaining)) = separators.split_first() else {
            return hard_split(text, self.chunk_size);
        };

        if !text.contains(separator) {
            return self.split_pieces(text, remaining);
        }

        let mut pieces = Vec::new();
        for part in text.split(separator) {
            let part = part.trim();
            if part.is_empty() {
                continue;
            }
            if part.len() > self.chunk_size {
                pieces.extend(self.split_pieces(part, remaining));
            } else {
                pieces.push(part.to_string());
            }
        }
        pieces
    }

    /// Greedily pack pieces into windows, carrying a tail of the previous
    /// window into the next one as overlap.
    fn merge_with_overlap(&self, pieces: &[String]) -> Vec<String> {
        let mut chunks = Vec::new();
        let mut window: Vec<&str> = Vec::new();
        let mut window_len = 0usize;

        for piece in pieces {
            let added = piece.len() + if window.is_empty() { 0 } else { 1 };
            if window_len + added > self.chunk_size && !window.is_empty() {
                chunks.push(window.join(" "));

                // Retain the tail of the window as overlap for the next chunk.
                while window_len > self.chunk_overlap
                    || (window_len + added > self.chunk_size && !window.is_empty())
                {
                    let removed = window.remove(0);
                    window_len -= removed.len() + if window.is_empty() { 0 } else { 1 };
                }
            }
            window_len += piece.len() + if window.is_empty() { 0 } else { 1 };
            window.push(piece.as_str());
        }

        // The trailing window always holds at least the final piece, which no
        // emitted chunk contains yet.
        if !window.is_empty() {
            chunks.push(window.join(" "));
        }
        chunks
    }
}

/// Last-resort split at character boundaries for a single oversized token.
fn hard_split(text: &str, chunk_size: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    chars
        .chunks(chunk_size)
        .map(|c| c.iter().collect())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_text_single_chunk() {
        let chunker = OverlapChunker::new(300, 80);
        let chunks = chunker.chunk("a short remark about procore");
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, "a short remark about procore");
        assert_eq!(chunks[0].total_chunks, 1);
    }

    #[test]
    fn test_chunks_respect_size_bound() {
        let chunker = OverlapChunker::new(300, 80);
        let word = "word ";
        let text = word.repeat(400);
        let chunks = chunker.chunk(&text);
        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.text.len() <= 300, "chunk too long: {}", chunk.text.len());
        }
    }

    #[test]
    fn test_adjacent_chunks_overlap() {
        let chunker = OverlapChunker::new(100, 40);
        let text = (0..60).map(|i| format!("tok{}", i)).collect::<Vec<_>>().join(" ");
        let chunks = chunker.chunk(&text);
        assert!(chunks.len() > 1);

        for pair in chunks.windows(2) {
            let first_words: Vec<&str> = pair[0].text.split(' ').collect();
            let overlap_tail = first_words[first_words.len().saturating_sub(2)..].join(" ");
            assert!(
                pair[1].text.starts_with(first_words[first_words.len() - 1])
                    || pair[1].text.contains(&overlap_tail),
                "no overlap between {:?} and {:?}",
                pair[0].text,
                pair[1].text
            );
        }
    }

    #[test]
    fn test_all_content_preserved() {
        let chunker = OverlapChunker::new(120, 30);
        let text = (0..50).map(|i| format!("item{}", i)).collect::<Vec<_>>().join(" ");
        let chunks = chunker.chunk(&text);
        let joined = chunks.iter().map(|c| c.text.as_str()).collect::<Vec<_>>().join(" ");
        for i in 0..50 {
            assert!(joined.contains(&format!("item{}", i)));
        }
    }

    #[test]
    fn test_oversized_token_hard_split() {
        let chunker = OverlapChunker::new(50, 10);
        let text = "x".repeat(140);
        let chunks = chunker.chunk(&text);
        assert!(chunks.len() >= 3);
        assert!(chunks.iter().all(|c| c.text.len() <= 50));
    }

    #[test]
    fn test_empty_input() {
        let chunker = OverlapChunker::new(300, 80);
        assert!(chunker.chunk("").is_empty());
        assert!(chunker.chunk("   ").is_empty());
    }
}
