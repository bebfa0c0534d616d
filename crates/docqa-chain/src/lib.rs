//! docqa-chain
//!
//! The retrieval-augmented answering chain: load the corpus, fetch or build
//! the index, retrieve the nearest chunks and ask a chat model to answer from
//! them.

pub mod openai;
pub mod pipeline;
pub mod prompt;

pub use openai::OpenAiChat;
pub use pipeline::{PipelineConfig, RagPipeline};
