//! Media capability seam used by the render pipeline.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::watch;

use crate::compose::ComposedClip;
use crate::error::MediaResult;
use crate::export::{export_clip, ExportOptions};
use crate::probe::{probe_media, MediaInfo};

/// Probing and rendering operations.
#[async_trait]
pub trait MediaToolkit: Send + Sync {
    /// Inspect a local media file.
    async fn probe(&self, path: &Path) -> MediaResult<MediaInfo>;

    /// Render a clip with its soundtrack to `output`.
    async fn export(
        &self,
        clip: &ComposedClip,
        output: &Path,
        options: &ExportOptions,
        cancel: Option<watch::Receiver<bool>>,
    ) -> MediaResult<()>;

    /// Probe `sources` and join them in the given order.
    async fn concatenate(&self, sources: &[PathBuf]) -> MediaResult<ComposedClip> {
        let mut probed = Vec::with_capacity(sources.len());
        for path in sources {
            let info = self.probe(path).await?;
            probed.push((path.clone(), info));
        }
        ComposedClip::from_sources(probed)
    }

    /// Duration of a local media file in seconds.
    async fn duration(&self, path: &Path) -> MediaResult<f64> {
        Ok(self.probe(path).await?.duration)
    }
}

/// [`MediaToolkit`] backed by the FFmpeg and FFprobe binaries.
#[derive(Debug, Clone, Copy, Default)]
pub struct FfmpegToolkit;

impl FfmpegToolkit {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl MediaToolkit for FfmpegToolkit {
    async fn probe(&self, path: &Path) -> MediaResult<MediaInfo> {
        probe_media(path).await
    }

    async fn export(
        &self,
        clip: &ComposedClip,
        output: &Path,
        options: &ExportOptions,
        cancel: Option<watch::Receiver<bool>>,
    ) -> MediaResult<()> {
        export_clip(clip, output, options, cancel).await
    }
}
