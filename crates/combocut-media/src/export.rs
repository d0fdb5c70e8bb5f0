//! Rendering a composed clip to an encoded file.

use std::path::Path;

use combocut_models::EncodingConfig;
use tokio::sync::watch;
use tracing::{debug, info};

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::compose::ComposedClip;
use crate::error::{MediaError, MediaResult};
use crate::fs_utils::{ensure_dir, remove_file_quietly};

/// Default export timeout (30 minutes).
pub const DEFAULT_EXPORT_TIMEOUT_SECS: u64 = 1800;

/// Options for one export.
#[derive(Debug, Clone)]
pub struct ExportOptions {
    pub encoding: EncodingConfig,
    /// Kill FFmpeg after this many seconds
    pub timeout_secs: Option<u64>,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            encoding: EncodingConfig::default(),
            timeout_secs: Some(DEFAULT_EXPORT_TIMEOUT_SECS),
        }
    }
}

impl ExportOptions {
    pub fn new(encoding: EncodingConfig) -> Self {
        Self {
            encoding,
            ..Default::default()
        }
    }

    pub fn with_timeout(mut self, secs: Option<u64>) -> Self {
        self.timeout_secs = secs;
        self
    }
}

/// Build the FFmpeg command for a clip with its soundtrack attached.
///
/// Inputs are the video sources in order, followed by the audio layers.
pub fn build_export_command(
    clip: &ComposedClip,
    output: impl AsRef<Path>,
    encoding: &EncodingConfig,
) -> MediaResult<FfmpegCommand> {
    let audio = clip
        .audio()
        .ok_or_else(|| MediaError::composition("clip has no soundtrack attached"))?;

    let mut cmd = FfmpegCommand::new(output);
    for source in clip.sources() {
        cmd = cmd.input(&source.path);
    }
    for layer in audio.layers() {
        cmd = cmd.input_with_args(layer.input_args(), &layer.path);
    }

    let graph = format!(
        "{};{}",
        clip.video_filter_graph(encoding.frame_rate, "vout"),
        audio.filter_graph(clip.sources().len(), "aout")
    );

    Ok(cmd
        .filter_complex(graph)
        .map("[vout]")
        .map("[aout]")
        .output_args(encoding.to_ffmpeg_args())
        .output_args(["-movflags", "+faststart"])
        .duration(clip.duration()))
}

/// Render `clip` to `output`. A failed render leaves no file behind.
pub async fn export_clip(
    clip: &ComposedClip,
    output: &Path,
    options: &ExportOptions,
    cancel: Option<watch::Receiver<bool>>,
) -> MediaResult<()> {
    if let Some(parent) = output.parent() {
        ensure_dir(parent).await?;
    }

    let cmd = build_export_command(clip, output, &options.encoding)?;

    let mut runner = FfmpegRunner::new();
    if let Some(secs) = options.timeout_secs {
        runner = runner.with_timeout(secs);
    }
    if let Some(cancel) = cancel {
        runner = runner.with_cancel(cancel);
    }

    let total = clip.duration();
    let target = output.display().to_string();
    let result = runner
        .run_with_progress(&cmd, move |progress| {
            debug!(
                output = %target,
                "Export progress: {:.1}% ({:.1}x)",
                progress.percentage(total),
                progress.speed
            );
        })
        .await;

    match result {
        Ok(()) => {
            info!("Exported {} ({:.2}s)", output.display(), total);
            Ok(())
        }
        Err(e) => {
            remove_file_quietly(output).await;
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::ComposedAudio;
    use crate::probe::MediaInfo;

    fn clip() -> ComposedClip {
        let info = MediaInfo {
            duration: 6.0,
            width: 1080,
            height: 1920,
            fps: 30.0,
            has_video: true,
            has_audio: false,
        };
        ComposedClip::from_sources(vec![("a.mp4", info.clone()), ("b.mp4", info)]).unwrap()
    }

    #[test]
    fn test_export_requires_audio() {
        let err = build_export_command(&clip(), "out.mp4", &EncodingConfig::default()).unwrap_err();
        assert!(matches!(err, MediaError::Composition(_)));
    }

    #[test]
    fn test_export_command_layout() {
        let audio = ComposedAudio::with_background(12.0, "bg.mp3", 5.0, 0.2)
            .unwrap()
            .add_voice("tts.mp3");
        let clip = clip().attach_audio(audio).unwrap();

        let cmd = build_export_command(&clip, "out.mp4", &EncodingConfig::default()).unwrap();
        let args = cmd.build_args();
        assert_eq!(cmd.input_count(), 4);

        // Audio layers follow the video sources
        let graph_at = args.iter().position(|a| a == "-filter_complex").unwrap();
        let graph = &args[graph_at + 1];
        assert!(graph.contains("concat=n=2:v=1:a=0[vout]"));
        assert!(graph.contains("[2:a]apad"));
        assert!(graph.contains("[3:a]apad"));

        let maps: Vec<_> = args
            .iter()
            .enumerate()
            .filter(|(_, a)| *a == "-map")
            .map(|(i, _)| args[i + 1].as_str())
            .collect();
        assert_eq!(maps, vec!["[vout]", "[aout]"]);

        let rate = args.iter().position(|a| a == "-r").unwrap();
        assert_eq!(args[rate + 1], "24");
        assert!(args.contains(&"libx264".to_string()));
        assert!(args.contains(&"aac".to_string()));

        let t = args.iter().position(|a| a == "-t").unwrap();
        assert_eq!(args[t + 1], "12.000");
    }
}
