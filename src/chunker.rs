//! Overlapping word-window chunker for extracted résumé text.

use crate::types::RetrievalError;

/// Window geometry for [`chunk_text`].
///
/// Windows are measured in whitespace-separated words. Each window starts
/// `window_size - overlap` words after the previous one, so consecutive
/// chunks share `overlap` words of context.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChunkerConfig {
    pub window_size: usize,
    pub overlap: usize,
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self {
            window_size: 800,
            overlap: 120,
        }
    }
}

impl ChunkerConfig {
    pub fn new(window_size: usize, overlap: usize) -> Result<Self, RetrievalError> {
        let config = Self {
            window_size,
            overlap,
        };
        config.validate()?;
        Ok(config)
    }

    /// Rejects geometries that would stall the window advance.
    pub fn validate(&self) -> Result<(), RetrievalError> {
        if self.window_size == 0 {
            return Err(RetrievalError::Validation(
                "window_size must be positive".into(),
            ));
        }
        if self.overlap >= self.window_size {
            return Err(RetrievalError::Validation(format!(
                "overlap ({}) must be smaller than window_size ({})",
                self.overlap, self.window_size
            )));
        }
        Ok(())
    }

    fn stride(&self) -> usize {
        self.window_size - self.overlap
    }
}

/// Splits `text` into overlapping word windows.
///
/// Tokenizes on Unicode whitespace, emits successive windows of
/// `config.window_size` words advancing by `window_size - overlap`, and
/// rejoins each window with single spaces. The final window may be shorter
/// than `window_size`; iteration stops with the window that reaches the end
/// of the text, so a document of exactly `window_size` words yields exactly
/// one chunk. Empty or whitespace-only input yields an empty vec.
///
/// Deterministic: identical input and config always produce the same chunks.
pub fn chunk_text(text: &str, config: &ChunkerConfig) -> Result<Vec<String>, RetrievalError> {
    config.validate()?;

    let words: Vec<&str> = text.split_whitespace().collect();
    if words.is_empty() {
        return Ok(Vec::new());
    }

    let mut chunks = Vec::new();
    let mut start = 0usize;
    loop {
        let end = usize::min(start + config.window_size, words.len());
        chunks.push(words[start..end].join(" "));
        if end == words.len() {
            break;
        }
        start += config.stride();
    }

    Ok(chunks)
}
