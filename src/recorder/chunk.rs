use super::backend::Chunk;

/// In-memory buffer of the chunks of one recording
#[derive(Debug, Default)]
pub struct ChunkBuffer {
    chunks: Vec<Chunk>,
    total_bytes: u64,
}

impl ChunkBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk, dropping empty ones
    ///
    /// Returns whether the chunk was kept.
    pub fn push(&mut self, chunk: Chunk) -> bool {
        if chunk.is_empty() {
            return false;
        }
        self.total_bytes += chunk.len() as u64;
        self.chunks.push(chunk);
        true
    }

    pub fn clear(&mut self) {
        self.chunks.clear();
        self.total_bytes = 0;
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Sum of all chunk sizes
    pub fn total_bytes(&self) -> u64 {
        self.total_bytes
    }

    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    /// Concatenate the chunks, in arrival order, into a single payload
    pub fn assemble(&self) -> Vec<u8> {
        let mut payload = Vec::with_capacity(self.total_bytes as usize);
        for chunk in &self.chunks {
            payload.extend_from_slice(&chunk.data);
        }
        payload
    }
}
