//! Sentence-aware text chunking with overlap

use unicode_segmentation::UnicodeSegmentation;

/// Text chunker with configurable size and overlap (both in characters)
pub struct TextChunker {
    /// Target chunk size
    chunk_size: usize,
    /// Overlap carried from one chunk into the next
    overlap: usize,
}

impl TextChunker {
    /// Create a new chunker
    pub fn new(chunk_size: usize, overlap: usize) -> Self {
        Self {
            chunk_size: chunk_size.max(1),
            overlap: overlap.min(chunk_size.saturating_sub(1)),
        }
    }

    /// Split `text` into chunks of at most roughly `chunk_size` characters
    ///
    /// Breaks fall on sentence boundaries when possible. A single sentence
    /// longer than the chunk size is hard-split on character boundaries.
    pub fn chunk(&self, text: &str) -> Vec<String> {
        let mut chunks = Vec::new();
        let mut current = String::new();
        let mut current_chars = 0usize;

        for sentence in text.split_sentence_bounds() {
            for piece in self.split_oversized(sentence) {
                let piece_chars = piece.chars().count();

                if current_chars > 0 && current_chars + piece_chars > self.chunk_size {
                    push_chunk(&mut chunks, &current);

                    current = self.overlap_text(&current);
                    current_chars = current.chars().count();
                }

                current.push_str(piece);
                current_chars += piece_chars;
            }
        }

        push_chunk(&mut chunks, &current);
        chunks
    }

    /// Hard-split a sentence that alone exceeds the chunk size
    fn split_oversized<'a>(&self, sentence: &'a str) -> Vec<&'a str> {
        if sentence.chars().count() <= self.chunk_size {
            return vec![sentence];
        }

        let step = self.chunk_size - self.overlap;
        let boundaries: Vec<usize> = sentence
            .char_indices()
            .map(|(i, _)| i)
            .chain(std::iter::once(sentence.len()))
            .collect();

        let mut pieces = Vec::new();
        let mut start = 0;
        while start < boundaries.len() - 1 {
            let end = (start + step).min(boundaries.len() - 1);
            pieces.push(&sentence[boundaries[start]..boundaries[end]]);
            start = end;
        }
        pieces
    }

    /// Tail of a finished chunk to carry into the next one
    fn overlap_text(&self, text: &str) -> String {
        if self.overlap == 0 {
            return String::new();
        }

        let total = text.chars().count();
        if total <= self.overlap {
            return text.to_string();
        }

        let tail: String = text.chars().skip(total - self.overlap).collect();

        // Prefer starting at a word boundary
        match tail.find(' ') {
            Some(pos) if pos + 1 < tail.len() => tail[pos + 1..].to_string(),
            _ => tail,
        }
    }
}

fn push_chunk(chunks: &mut Vec<String>, text: &str) {
    let trimmed = text.trim();
    if !trimmed.is_empty() {
        chunks.push(trimmed.to_string());
    }
}
