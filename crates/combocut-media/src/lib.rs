//! FFmpeg CLI wrapper for combination renders.
//!
//! This crate provides:
//! - Type-safe FFmpeg command building with multiple inputs
//! - Progress parsing from `-progress pipe:2`
//! - Cancellation and timeouts via tokio
//! - Streaming HTTP download of remote assets
//! - Audio layer planning, concatenation and export

pub mod audio;
pub mod command;
pub mod compose;
pub mod download;
pub mod error;
pub mod export;
pub mod fs_utils;
pub mod probe;
pub mod progress;
pub mod toolkit;

pub use audio::{AudioLayer, BackgroundFit, ComposedAudio, LayerRole, DEFAULT_BACKGROUND_VOLUME};
pub use command::{check_ffmpeg, check_ffprobe, FfmpegCommand, FfmpegRunner};
pub use compose::{ClipSource, ComposedClip};
pub use download::{derive_file_name, HttpFetcher, RemoteFetcher};
pub use error::{MediaError, MediaResult};
pub use export::{build_export_command, export_clip, ExportOptions, DEFAULT_EXPORT_TIMEOUT_SECS};
pub use probe::{probe_media, MediaInfo};
pub use progress::FfmpegProgress;
pub use toolkit::{FfmpegToolkit, MediaToolkit};
