use std::fs;
use std::path::PathBuf;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::{Deserialize, Serialize};

use crate::api::{ContentBlock, ImageSource};
use crate::errors::ToolError;

/// One extracted frame on disk. Immutable once extracted; the core only
/// reads its bytes, lazily, when a request that includes it is built.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Frame {
    pub source_path: PathBuf,
    pub timestamp_seconds: f64,
    pub frame_index: u32,
}

/// Reduce an ordered frame sequence to at most `max` frames, preserving
/// order and (when truncating) both endpoints, with the rest chosen by even
/// stride. Deterministic and idempotent: a sequence already within the cap
/// comes back unchanged.
pub fn sample_frames(frames: &[Frame], max: usize) -> Vec<Frame> {
    let n = frames.len();
    if n <= max {
        return frames.to_vec();
    }
    if max == 0 {
        return Vec::new();
    }
    if max == 1 {
        return vec![frames[0].clone()];
    }

    let mut indices: Vec<usize> = Vec::with_capacity(max);
    for i in 0..max {
        let idx = ((i as f64) * ((n - 1) as f64) / ((max - 1) as f64)).round() as usize;
        let idx = idx.min(n - 1);
        if indices.last() != Some(&idx) {
            indices.push(idx);
        }
    }

    indices.into_iter().map(|i| frames[i].clone()).collect()
}

/// Read and encode one frame into an image content block. Performed once
/// per frame per request; frames sent in multiple requests are re-read each
/// time (no caching layer in the core).
pub fn frame_to_block(frame: &Frame) -> Result<ContentBlock, ToolError> {
    let media_type = match frame
        .source_path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        other => {
            return Err(ToolError::UnsupportedFormat(
                other.unwrap_or("(none)").to_string(),
            ))
        }
    };

    let bytes = fs::read(&frame.source_path)
        .map_err(|_| ToolError::FileNotFound(frame.source_path.display().to_string()))?;

    Ok(ContentBlock::Image {
        source: ImageSource::base64(media_type, BASE64.encode(bytes)),
    })
}
