//! Concatenation of per-combination sources.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::audio::ComposedAudio;
use crate::error::{MediaError, MediaResult};
use crate::probe::MediaInfo;

/// Tolerance when matching the soundtrack length to the clip length.
const DURATION_TOLERANCE_SECS: f64 = 0.001;

/// One probed input of a composed clip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClipSource {
    pub path: PathBuf,
    pub duration: f64,
    pub width: u32,
    pub height: u32,
}

/// Sources joined end to end with hard cuts, plus an optional soundtrack.
///
/// Sources of different sizes are scaled to fit and centered on a canvas as
/// large as the largest source. Embedded source audio is never used.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComposedClip {
    sources: Vec<ClipSource>,
    width: u32,
    height: u32,
    duration: f64,
    audio: Option<ComposedAudio>,
}

impl ComposedClip {
    /// Build a clip from probed sources, in playback order.
    pub fn from_sources<I, P>(sources: I) -> MediaResult<Self>
    where
        I: IntoIterator<Item = (P, MediaInfo)>,
        P: AsRef<Path>,
    {
        let sources: Vec<ClipSource> = sources
            .into_iter()
            .map(|(path, info)| {
                let path = path.as_ref();
                if !info.is_video() {
                    return Err(MediaError::invalid_media(format!(
                        "{} has no video stream",
                        path.display()
                    )));
                }
                if info.duration <= 0.0 {
                    return Err(MediaError::invalid_media(format!(
                        "{} has no measurable duration",
                        path.display()
                    )));
                }
                Ok(ClipSource {
                    path: path.to_path_buf(),
                    duration: info.duration,
                    width: info.width,
                    height: info.height,
                })
            })
            .collect::<MediaResult<_>>()?;

        if sources.is_empty() {
            return Err(MediaError::composition("no sources to concatenate"));
        }

        // yuv420p needs even dimensions
        let width = even(sources.iter().map(|s| s.width).max().unwrap_or(0));
        let height = even(sources.iter().map(|s| s.height).max().unwrap_or(0));
        let duration = sources.iter().map(|s| s.duration).sum();

        Ok(Self {
            sources,
            width,
            height,
            duration,
            audio: None,
        })
    }

    /// Replace the soundtrack. The audio must last as long as the clip.
    pub fn attach_audio(mut self, audio: ComposedAudio) -> MediaResult<Self> {
        if (audio.duration() - self.duration).abs() > DURATION_TOLERANCE_SECS {
            return Err(MediaError::composition(format!(
                "audio lasts {:.3}s but the clip lasts {:.3}s",
                audio.duration(),
                self.duration
            )));
        }
        self.audio = Some(audio);
        Ok(self)
    }

    pub fn sources(&self) -> &[ClipSource] {
        &self.sources
    }

    /// Total duration in seconds (sum of the sources).
    pub fn duration(&self) -> f64 {
        self.duration
    }

    /// Canvas size `(width, height)`.
    pub fn canvas(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn audio(&self) -> Option<&ComposedAudio> {
        self.audio.as_ref()
    }

    /// Filter graph concatenating the sources into `[out_label]`.
    ///
    /// Source `i` is read from FFmpeg input `i`.
    pub fn video_filter_graph(&self, frame_rate: u32, out_label: &str) -> String {
        let (w, h) = (self.width, self.height);

        let mut chains: Vec<String> = (0..self.sources.len())
            .map(|i| {
                format!(
                    "[{i}:v]scale={w}:{h}:force_original_aspect_ratio=decrease,\
                     pad={w}:{h}:(ow-iw)/2:(oh-ih)/2,setsar=1,fps={frame_rate},format=yuv420p[v{i}]"
                )
            })
            .collect();

        let inputs: String = (0..self.sources.len()).map(|i| format!("[v{}]", i)).collect();
        chains.push(format!(
            "{}concat=n={}:v=1:a=0[{}]",
            inputs,
            self.sources.len(),
            out_label
        ));

        chains.join(";")
    }
}

fn even(value: u32) -> u32 {
    value + (value % 2)
}
