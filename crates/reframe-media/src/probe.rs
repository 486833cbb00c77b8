//! Media file probing to get metadata without a full decode.

use reframe_core::{FrameRate, ReframeError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::process::Command;
use tracing::{debug, warn};

/// Information about a media file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaProbe {
    /// File path
    pub path: String,
    /// Container duration in seconds, when reported
    pub duration_secs: Option<f64>,
    /// Video streams
    pub video_streams: Vec<VideoStreamInfo>,
    /// Container format
    pub format: String,
}

/// Information about a video stream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoStreamInfo {
    pub index: usize,
    pub codec: String,
    pub width: u32,
    pub height: u32,
    pub frame_rate: FrameRate,
    /// Total frame count; `None` when neither the container nor the
    /// duration allow it to be determined.
    pub frame_count: Option<u64>,
}

#[derive(Deserialize)]
struct FfprobeOutput {
    #[serde(default)]
    streams: Vec<FfprobeStream>,
    format: Option<FfprobeFormat>,
}

#[derive(Deserialize)]
struct FfprobeStream {
    index: usize,
    codec_type: Option<String>,
    codec_name: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    r_frame_rate: Option<String>,
    avg_frame_rate: Option<String>,
    nb_frames: Option<String>,
    duration: Option<String>,
}

#[derive(Deserialize)]
struct FfprobeFormat {
    format_name: Option<String>,
    duration: Option<String>,
}

impl MediaProbe {
    /// Probe a media file with ffprobe.
    pub fn probe<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let path_str = path.to_string_lossy().to_string();

        if !path.exists() {
            return Err(ReframeError::NotFound(format!(
                "File not found: {}",
                path_str
            )));
        }

        let output = Command::new(ffmpeg_sidecar::ffprobe::ffprobe_path())
            .args([
                "-v",
                "error",
                "-print_format",
                "json",
                "-show_format",
                "-show_streams",
            ])
            .arg(path)
            .output()?;

        if !output.status.success() {
            return Err(ReframeError::Media(format!(
                "ffprobe failed on {}: {}",
                path_str,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        let json = String::from_utf8_lossy(&output.stdout);
        Self::from_ffprobe_json(path_str, &json)
    }

    /// Build a probe from ffprobe's `-print_format json` output.
    pub fn from_ffprobe_json(path: impl Into<String>, json: &str) -> Result<Self> {
        let parsed: FfprobeOutput = serde_json::from_str(json)
            .map_err(|e| ReframeError::Serialization(format!("Unreadable ffprobe output: {e}")))?;

        let container_duration = parsed
            .format
            .as_ref()
            .and_then(|f| f.duration.as_deref())
            .and_then(|d| d.parse::<f64>().ok());

        let video_streams = parsed
            .streams
            .iter()
            .filter(|s| s.codec_type.as_deref() == Some("video"))
            .filter_map(|s| video_stream_info(s, container_duration))
            .collect::<Vec<_>>();

        Ok(Self {
            path: path.into(),
            duration_secs: container_duration,
            video_streams,
            format: parsed
                .format
                .and_then(|f| f.format_name)
                .unwrap_or_default(),
        })
    }

    /// Check if the file has video.
    pub fn has_video(&self) -> bool {
        !self.video_streams.is_empty()
    }

    /// Get the primary video stream info.
    pub fn primary_video(&self) -> Option<&VideoStreamInfo> {
        self.video_streams.first()
    }

    /// Primary video stream, or an error for audio-only/unrecognised files.
    pub fn require_video(&self) -> Result<&VideoStreamInfo> {
        self.primary_video().ok_or_else(|| {
            ReframeError::UnsupportedFormat(format!("No video stream found in {}", self.path))
        })
    }
}

fn video_stream_info(stream: &FfprobeStream, container_duration: Option<f64>) -> Option<VideoStreamInfo> {
    let (width, height) = match (stream.width, stream.height) {
        (Some(w), Some(h)) if w > 0 && h > 0 => (w, h),
        _ => {
            warn!(stream = stream.index, "Skipping video stream without dimensions");
            return None;
        }
    };

    // avg_frame_rate is what frame-accurate readers report; r_frame_rate is
    // the fallback for streams where ffprobe leaves it as 0/0.
    let frame_rate = [stream.avg_frame_rate.as_deref(), stream.r_frame_rate.as_deref()]
        .into_iter()
        .flatten()
        .find_map(|r| r.parse::<FrameRate>().ok())?;

    let frame_count = stream
        .nb_frames
        .as_deref()
        .and_then(|n| n.parse::<u64>().ok())
        .filter(|&n| n > 0)
        .or_else(|| {
            let duration = stream
                .duration
                .as_deref()
                .and_then(|d| d.parse::<f64>().ok())
                .or(container_duration)?;
            debug!(stream = stream.index, duration, "Estimating frame count from duration");
            Some(frame_rate.seconds_to_frames(duration)).filter(|&n| n > 0)
        });

    Some(VideoStreamInfo {
        index: stream.index,
        codec: stream.codec_name.clone().unwrap_or_default(),
        width,
        height,
        frame_rate,
        frame_count,
    })
}
