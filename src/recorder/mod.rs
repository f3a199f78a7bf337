pub mod backend;
pub mod chunk;
pub mod stream;

pub use backend::{Chunk, Recorder, RecorderConfig};
pub use chunk::ChunkBuffer;
pub use stream::StreamRecorder;
