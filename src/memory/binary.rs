//! Binary encoding/decoding for f32 embedding vectors.
//!
//! Embeddings are stored as flat little-endian f32 bytes (4 bytes per
//! dimension) instead of JSON text, cutting blob size to roughly a third.

use anyhow::{bail, Result};

/// Encode an f32 embedding vector as flat little-endian bytes.
pub fn encode_embedding(vec: &[f32]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(vec.len() * 4);
    for &val in vec {
        buf.extend_from_slice(&val.to_le_bytes());
    }
    buf
}

/// Decode an embedding blob of the expected dimension.
pub fn decode_embedding(blob: &[u8], dim: usize) -> Result<Vec<f32>> {
    if blob.len() != dim * 4 {
        bail!(
            "Unexpected embedding blob: {} bytes for dimension {} (want {})",
            blob.len(),
            dim,
            dim * 4
        );
    }

    let mut vec = Vec::with_capacity(dim);
    for chunk in blob.chunks_exact(4) {
        vec.push(f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]));
    }
    Ok(vec)
}
