//! Encoded chunk buffer

/// Append-only buffer of encoded recording chunks
///
/// Chunks stay in arrival order until the buffer is taken for upload.
#[derive(Debug, Default)]
pub struct ChunkBuffer {
    chunks: Vec<Vec<u8>>,
    total_bytes: usize,
}

impl ChunkBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk; empty chunks are dropped
    pub fn push(&mut self, chunk: Vec<u8>) {
        if chunk.is_empty() {
            return;
        }
        self.total_bytes += chunk.len();
        self.chunks.push(chunk);
    }

    /// Number of chunks currently buffered
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Bytes currently buffered
    pub fn total_bytes(&self) -> usize {
        self.total_bytes
    }

    /// Concatenate and empty the buffer; `None` when nothing was buffered
    pub fn take(&mut self) -> Option<Vec<u8>> {
        if self.chunks.is_empty() {
            return None;
        }
        let file = self.chunks.concat();
        self.clear();
        Some(file)
    }

    pub fn clear(&mut self) {
        self.chunks.clear();
        self.total_bytes = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_take_concatenates_in_order() {
        let mut buffer = ChunkBuffer::new();
        buffer.push(vec![1, 2]);
        buffer.push(Vec::new());
        buffer.push(vec![3]);

        assert_eq!(buffer.len(), 2);
        assert_eq!(buffer.total_bytes(), 3);
        assert_eq!(buffer.take(), Some(vec![1, 2, 3]));
        assert!(buffer.is_empty());
        assert_eq!(buffer.total_bytes(), 0);
    }

    #[test]
    fn test_take_empty() {
        assert_eq!(ChunkBuffer::new().take(), None);
    }
}
