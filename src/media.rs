use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::frames::Frame;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoMetadata {
    pub path: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_seconds: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    pub fps: f64,
}

/// Extract frames from the recording at the requested rate into
/// `.screeneval/frames/<video-stem>/`. Shells out to ffmpeg; any previous
/// extraction for the same video is replaced.
pub fn extract_frames(video: &Path, fps: f64) -> Result<Vec<Frame>> {
    if !video.exists() {
        return Err(anyhow!("Video not found: {}", video.display()));
    }

    let stem = video
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("video");
    let out_dir = PathBuf::from(".screeneval/frames").join(stem);
    if out_dir.exists() {
        fs::remove_dir_all(&out_dir)
            .with_context(|| format!("clearing {}", out_dir.display()))?;
    }
    fs::create_dir_all(&out_dir).with_context(|| format!("creating {}", out_dir.display()))?;

    let pattern = out_dir.join("frame_%05d.jpg");
    let output = Command::new("ffmpeg")
        .arg("-hide_banner")
        .arg("-loglevel")
        .arg("error")
        .arg("-i")
        .arg(video)
        .arg("-vf")
        .arg(format!("fps={fps}"))
        .arg(&pattern)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .context("running ffmpeg (is it installed?)")?;

    if !output.status.success() {
        return Err(anyhow!(
            "ffmpeg failed (exit {}): {}",
            output.status.code().unwrap_or(-1),
            String::from_utf8_lossy(&output.stderr).trim()
        ));
    }

    collect_frames(&out_dir, fps)
}

/// List an extraction directory as ordered frames. Timestamps follow from
/// the extraction rate: frame i sits at i / fps seconds.
pub fn collect_frames(dir: &Path, fps: f64) -> Result<Vec<Frame>> {
    let mut paths: Vec<PathBuf> = fs::read_dir(dir)
        .with_context(|| format!("reading {}", dir.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| {
            matches!(
                p.extension().and_then(|e| e.to_str()),
                Some("jpg") | Some("jpeg") | Some("png")
            )
        })
        .collect();
    paths.sort();

    Ok(paths
        .into_iter()
        .enumerate()
        .map(|(i, path)| Frame {
            source_path: path,
            timestamp_seconds: i as f64 / fps,
            frame_index: i as u32,
        })
        .collect())
}

/// Ask ffprobe for duration and resolution. Failures here are soft: the
/// report simply carries less metadata.
pub fn probe_metadata(video: &Path, fps: f64) -> VideoMetadata {
    let mut meta = VideoMetadata {
        path: video.to_path_buf(),
        duration_seconds: None,
        width: None,
        height: None,
        fps,
    };

    let output = Command::new("ffprobe")
        .arg("-v")
        .arg("error")
        .arg("-print_format")
        .arg("json")
        .arg("-show_format")
        .arg("-show_streams")
        .arg(video)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output();

    let Ok(output) = output else {
        log::warn!("ffprobe unavailable; video metadata will be sparse");
        return meta;
    };
    if !output.status.success() {
        log::warn!(
            "ffprobe failed: {}",
            String::from_utf8_lossy(&output.stderr).trim()
        );
        return meta;
    }
    let Ok(probed) = serde_json::from_slice::<Value>(&output.stdout) else {
        return meta;
    };

    meta.duration_seconds = probed
        .pointer("/format/duration")
        .and_then(|v| v.as_str())
        .and_then(|s| s.parse().ok());

    if let Some(streams) = probed.get("streams").and_then(|v| v.as_array()) {
        if let Some(video_stream) = streams
            .iter()
            .find(|s| s.get("codec_type").and_then(|v| v.as_str()) == Some("video"))
        {
            meta.width = video_stream
                .get("width")
                .and_then(|v| v.as_u64())
                .map(|w| w as u32);
            meta.height = video_stream
                .get("height")
                .and_then(|v| v.as_u64())
                .map(|h| h as u32);
        }
    }

    meta
}
