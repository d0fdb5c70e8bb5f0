//! Audio layer planning.
//!
//! A [`ComposedAudio`] is a declarative description of the soundtrack for one
//! render: a background layer fitted to the target duration plus an optional
//! voice layer starting at t=0. It is turned into FFmpeg inputs and a filter
//! graph at export time, and every layer is padded and trimmed so the mixed
//! output lasts exactly the target duration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{MediaError, MediaResult};

/// Default background attenuation (20% amplitude).
pub const DEFAULT_BACKGROUND_VOLUME: f64 = 0.2;

/// How a background track is fitted to the target duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "mode")]
pub enum BackgroundFit {
    /// Play the track `repeats` times back to back, then cut at the target.
    Loop { repeats: u32 },
    /// Cut the track at the target, starting from offset 0.
    Trim,
}

impl BackgroundFit {
    /// Decide the fit for a track of `natural` seconds against `target` seconds.
    pub fn plan(natural: f64, target: f64) -> MediaResult<Self> {
        if !target.is_finite() || target <= 0.0 {
            return Err(MediaError::composition(format!(
                "target duration must be positive, got {target}"
            )));
        }
        if !natural.is_finite() || natural <= 0.0 {
            return Err(MediaError::composition(
                "background track has no measurable duration",
            ));
        }

        if natural < target {
            let repeats = (target / natural).ceil();
            if repeats > u32::MAX as f64 {
                return Err(MediaError::composition(format!(
                    "background of {natural}s is too short to cover {target}s"
                )));
            }
            Ok(Self::Loop {
                repeats: repeats as u32,
            })
        } else {
            Ok(Self::Trim)
        }
    }

    /// Extra passes to request with `-stream_loop`.
    pub fn extra_loops(&self) -> u32 {
        match self {
            Self::Loop { repeats } => repeats.saturating_sub(1),
            Self::Trim => 0,
        }
    }
}

/// Role of a layer in the mix.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayerRole {
    Background(BackgroundFit),
    Voice,
}

/// One audio source in the mix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioLayer {
    pub path: PathBuf,
    pub role: LayerRole,
    /// Linear gain applied to the layer
    pub volume: f64,
}

impl AudioLayer {
    /// FFmpeg input options for this layer.
    pub fn input_args(&self) -> Vec<String> {
        match self.role {
            LayerRole::Background(fit) if fit.extra_loops() > 0 => {
                vec!["-stream_loop".to_string(), fit.extra_loops().to_string()]
            }
            _ => Vec::new(),
        }
    }
}

/// Duration-matched soundtrack for one render.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComposedAudio {
    duration: f64,
    layers: Vec<AudioLayer>,
}

impl ComposedAudio {
    /// Start a soundtrack with its background layer.
    ///
    /// `natural_duration` is the background's own length in seconds.
    pub fn with_background(
        target_duration: f64,
        background: impl AsRef<Path>,
        natural_duration: f64,
        volume: f64,
    ) -> MediaResult<Self> {
        let fit = BackgroundFit::plan(natural_duration, target_duration)?;
        if !volume.is_finite() || volume < 0.0 {
            return Err(MediaError::composition(format!(
                "invalid background volume {volume}"
            )));
        }

        Ok(Self {
            duration: target_duration,
            layers: vec![AudioLayer {
                path: background.as_ref().to_path_buf(),
                role: LayerRole::Background(fit),
                volume,
            }],
        })
    }

    /// Add a voice layer at full volume starting at t=0.
    pub fn add_voice(mut self, voice: impl AsRef<Path>) -> Self {
        self.layers.push(AudioLayer {
            path: voice.as_ref().to_path_buf(),
            role: LayerRole::Voice,
            volume: 1.0,
        });
        self
    }

    /// Output duration in seconds.
    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn layers(&self) -> &[AudioLayer] {
        &self.layers
    }

    /// Fit chosen for the background layer.
    pub fn background_fit(&self) -> Option<BackgroundFit> {
        self.layers.iter().find_map(|layer| match layer.role {
            LayerRole::Background(fit) => Some(fit),
            LayerRole::Voice => None,
        })
    }

    pub fn has_voice(&self) -> bool {
        self.layers.iter().any(|l| l.role == LayerRole::Voice)
    }

    /// Filter graph mixing all layers into `[out_label]`.
    ///
    /// Layer `i` is read from FFmpeg input `first_input + i`.
    pub fn filter_graph(&self, first_input: usize, out_label: &str) -> String {
        let d = format!("{:.3}", self.duration);
        let single = self.layers.len() == 1;

        let mut chains: Vec<String> = self
            .layers
            .iter()
            .enumerate()
            .map(|(i, layer)| {
                let mut chain = format!(
                    "[{}:a]apad,atrim=0:{},asetpts=PTS-STARTPTS",
                    first_input + i,
                    d
                );
                if (layer.volume - 1.0).abs() > f64::EPSILON {
                    chain.push_str(&format!(",volume={}", layer.volume));
                }
                let label = if single {
                    out_label.to_string()
                } else {
                    format!("a{}", i)
                };
                chain.push_str(&format!("[{}]", label));
                chain
            })
            .collect();

        if !single {
            let inputs: String = (0..self.layers.len()).map(|i| format!("[a{}]", i)).collect();
            // Additive mix; the first layer (background) fixes the length
            chains.push(format!(
                "{}amix=inputs={}:duration=first:dropout_transition=0:normalize=0[{}]",
                inputs,
                self.layers.len(),
                out_label
            ));
        }

        chains.join(";")
    }
}
