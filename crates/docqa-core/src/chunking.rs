//! Recursive text splitting.
//!
//! Text is split on the coarsest separator that occurs in it (paragraphs,
//! then lines, sentences, words). Pieces are merged back into chunks of at
//! most `chunk_size` characters, carrying up to `chunk_overlap` characters of
//! trailing pieces into the next chunk. Pieces still too long are split with
//! the next separator, and finally by characters.
//!
//! Sizes are counted in `char`s, never bytes, so multi-byte text is never
//! cut inside a character.

use std::collections::VecDeque;

/// Separators tried in order before falling back to characters.
pub const DEFAULT_SEPARATORS: &[&str] = &["\n\n", "\n", ". ", " "];

#[derive(Debug, Clone)]
pub struct RecursiveSplitter {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl RecursiveSplitter {
    /// `chunk_size` is clamped to at least 1 and `chunk_overlap` to less
    /// than `chunk_size`.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        let chunk_size = chunk_size.max(1);
        Self {
            chunk_size,
            chunk_overlap: chunk_overlap.min(chunk_size - 1),
        }
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn chunk_overlap(&self) -> usize {
        self.chunk_overlap
    }

    /// Split `text` into trimmed, non-empty chunks.
    pub fn split(&self, text: &str) -> Vec<String> {
        if text.trim().is_empty() {
            return Vec::new();
        }
        self.split_recursive(text, DEFAULT_SEPARATORS)
            .into_iter()
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .collect()
    }

    fn split_recursive(&self, text: &str, separators: &[&str]) -> Vec<String> {
        if char_len(text) <= self.chunk_size {
            return vec![text.to_string()];
        }

        let Some(pos) = separators
            .iter()
            .position(|s| !s.is_empty() && text.contains(s))
        else {
            return self.split_chars(text);
        };
        let separator = separators[pos];
        let finer = &separators[pos + 1..];

        let mut chunks = Vec::new();
        let mut fitting: Vec<&str> = Vec::new();
        for piece in split_keeping_separator(text, separator) {
            if char_len(piece) <= self.chunk_size {
                fitting.push(piece);
            } else {
                chunks.extend(self.merge(&fitting));
                fitting.clear();
                chunks.extend(self.split_recursive(piece, finer));
            }
        }
        chunks.extend(self.merge(&fitting));
        chunks
    }

    /// Greedily pack pieces (each within `chunk_size`) into chunks.
    fn merge(&self, pieces: &[&str]) -> Vec<String> {
        let mut chunks = Vec::new();
        let mut window: VecDeque<(&str, usize)> = VecDeque::new();
        let mut total = 0usize;

        for piece in pieces {
            let len = char_len(piece);
            if total + len > self.chunk_size && !window.is_empty() {
                chunks.push(window.iter().map(|(p, _)| *p).collect::<String>());
                // Keep a tail of at most `chunk_overlap` chars that still
                // leaves room for the incoming piece.
                while let Some(&(_, front)) = window.front() {
                    if total > self.chunk_overlap || total + len > self.chunk_size {
                        total -= front;
                        window.pop_front();
                    } else {
                        break;
                    }
                }
            }
            window.push_back((piece, len));
            total += len;
        }

        if !window.is_empty() {
            chunks.push(window.iter().map(|(p, _)| *p).collect::<String>());
        }
        chunks
    }

    fn split_chars(&self, text: &str) -> Vec<String> {
        let chars: Vec<char> = text.chars().collect();
        let step = self.chunk_size - self.chunk_overlap;
        let mut chunks = Vec::new();
        let mut start = 0;
        while start < chars.len() {
            let end = (start + self.chunk_size).min(chars.len());
            chunks.push(chars[start..end].iter().collect());
            if end == chars.len() {
                break;
            }
            start += step;
        }
        chunks
    }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Split at `separator`, keeping it attached to the preceding piece.
fn split_keeping_separator<'a>(text: &'a str, separator: &str) -> Vec<&'a str> {
    let mut pieces = Vec::new();
    let mut start = 0;
    while let Some(pos) = text[start..].find(separator) {
        let end = start + pos + separator.len();
        pieces.push(&text[start..end]);
        start = end;
    }
    if start < text.len() {
        pieces.push(&text[start..]);
    }
    pieces
}
