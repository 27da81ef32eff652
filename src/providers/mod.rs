mod embeddings;
mod error;
mod openai_compatible;

pub use embeddings::HttpEmbedder;
pub use error::{ProviderError, ProviderErrorKind};
pub use openai_compatible::OpenAiCompatibleProvider;
