//! Audio cue executor with a synthesized-tone fallback
//!
//! Cue playback is an ordered list of strategies tried in sequence, each
//! catching its own failure:
//! 1. play the pre-recorded cue asset through a system audio player
//! 2. synthesize a short decaying tone through the default output device
//!
//! Both paths are best-effort. All strategies failing is logged and never
//! surfaced to the user. Playback runs on a spawned thread so the pipeline
//! is never blocked.

use anyhow::Result;
use std::path::PathBuf;
use std::process::Command;
use std::sync::Arc;
use std::time::Duration;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use tracing::{debug, warn};

use crate::notification::dispatcher::{EffectResult, SideEffectExecutor};
use crate::notification::event::Notification;
use crate::notification::policy::NotificationPolicy;

/// Fallback tone parameters: short, quiet, decaying.
const TONE_FREQUENCY_HZ: f32 = 800.0;
const TONE_DURATION: Duration = Duration::from_millis(500);
const TONE_GAIN: f32 = 0.2;
/// Exponential decay rate (per second) of the tone envelope.
const TONE_DECAY_RATE: f32 = 8.0;

/// Command-line players probed for asset playback, in preference order.
const PLAYER_CANDIDATES: [&str; 4] = ["paplay", "afplay", "aplay", "play"];

/// Errors that can occur while playing a notification cue.
#[derive(Debug, thiserror::Error)]
pub enum CueError {
    /// No cue asset is configured for this session.
    #[error("no cue asset configured")]
    NoAsset,
    /// The configured cue asset does not exist on disk.
    #[error("cue asset missing: {0}")]
    AssetMissing(PathBuf),
    /// No system audio player binary could be found on PATH.
    #[error("no system audio player available")]
    NoPlayer,
    /// The system player ran but reported failure.
    #[error("audio player exited with status {0}")]
    PlayerFailed(std::process::ExitStatus),
    /// The system player could not be spawned at all.
    #[error("failed to spawn audio player: {0}")]
    SpawnFailed(#[from] std::io::Error),
    /// No output audio device is available on this host.
    #[error("no default output audio device")]
    NoOutputDevice,
    /// Failed to obtain the device's default output configuration.
    #[error("failed to read output config: {0}")]
    DefaultConfig(#[from] cpal::DefaultStreamConfigError),
    /// The audio backend rejected the requested output stream.
    #[error("failed to build output stream: {0}")]
    BuildStream(#[from] cpal::BuildStreamError),
    /// Failed to start playback on the output stream.
    #[error("failed to start playback: {0}")]
    Play(#[from] cpal::PlayStreamError),
    /// The device's sample format has no conversion from f32.
    #[error("unsupported output sample format: {0:?}")]
    UnsupportedSampleFormat(cpal::SampleFormat),
}

/// One way of producing the audible cue.
pub trait CueStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    /// Play the cue to completion. Blocking; callers run this off the
    /// pipeline thread.
    fn play(&self) -> Result<(), CueError>;
}

/// Strategy 1: play the pre-recorded cue asset through a system player.
pub struct AssetCue {
    asset: Option<PathBuf>,
    player: Option<PathBuf>,
}

impl AssetCue {
    pub fn new(asset: Option<PathBuf>) -> Self {
        let player = PLAYER_CANDIDATES
            .iter()
            .find_map(|candidate| which::which(candidate).ok());
        Self { asset, player }
    }
}

impl CueStrategy for AssetCue {
    fn name(&self) -> &'static str {
        "asset"
    }

    fn play(&self) -> Result<(), CueError> {
        let asset = self.asset.as_ref().ok_or(CueError::NoAsset)?;
        if !asset.exists() {
            return Err(CueError::AssetMissing(asset.clone()));
        }
        let player = self.player.as_ref().ok_or(CueError::NoPlayer)?;

        let status = Command::new(player).arg(asset).status()?;
        if !status.success() {
            return Err(CueError::PlayerFailed(status));
        }
        Ok(())
    }
}

/// Strategy 2: synthesize a short decaying sine tone programmatically.
pub struct SynthToneCue {
    frequency_hz: f32,
    duration: Duration,
}

impl SynthToneCue {
    pub fn new() -> Self {
        Self {
            frequency_hz: TONE_FREQUENCY_HZ,
            duration: TONE_DURATION,
        }
    }

    fn run_stream<T>(
        &self,
        device: &cpal::Device,
        config: &cpal::StreamConfig,
    ) -> Result<(), CueError>
    where
        T: cpal::SizedSample + cpal::FromSample<f32>,
    {
        let sample_rate = config.sample_rate as f32;
        let channels = config.channels as usize;
        let total_frames = (sample_rate * self.duration.as_secs_f32()) as u64;
        let frequency = self.frequency_hz;
        let mut frame_index = 0u64;
        let (done_tx, done_rx) = std::sync::mpsc::channel::<()>();

        // The callback runs on the real-time audio thread: no allocation,
        // no locks, no I/O.
        let stream = device.build_output_stream(
            config,
            move |data: &mut [T], _| {
                for frame in data.chunks_mut(channels) {
                    let value = if frame_index < total_frames {
                        let t = frame_index as f32 / sample_rate;
                        let envelope = (-TONE_DECAY_RATE * t).exp();
                        (t * frequency * std::f32::consts::TAU).sin() * TONE_GAIN * envelope
                    } else {
                        let _ = done_tx.send(());
                        0.0
                    };
                    let sample = T::from_sample(value);
                    for out in frame.iter_mut() {
                        *out = sample;
                    }
                    frame_index += 1;
                }
            },
            |err| warn!(error = %err, "Audio output stream error"),
            None,
        )?;

        stream.play()?;
        // Hold the stream alive until the tone has been emitted.
        let _ = done_rx.recv_timeout(self.duration + Duration::from_millis(250));
        Ok(())
    }
}

impl Default for SynthToneCue {
    fn default() -> Self {
        Self::new()
    }
}

impl CueStrategy for SynthToneCue {
    fn name(&self) -> &'static str {
        "synth-tone"
    }

    fn play(&self) -> Result<(), CueError> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or(CueError::NoOutputDevice)?;
        let supported = device.default_output_config()?;
        let sample_format = supported.sample_format();
        let config: cpal::StreamConfig = supported.into();

        match sample_format {
            cpal::SampleFormat::F32 => self.run_stream::<f32>(&device, &config),
            cpal::SampleFormat::I16 => self.run_stream::<i16>(&device, &config),
            cpal::SampleFormat::U16 => self.run_stream::<u16>(&device, &config),
            other => Err(CueError::UnsupportedSampleFormat(other)),
        }
    }
}

/// Audio cue executor.
///
/// Gated on the policy's `play_sound` AND the session-level sound
/// preference. Playback is fire-and-forget on a spawned thread.
pub struct AudioCuePlayer {
    sound_enabled: bool,
    strategies: Arc<Vec<Box<dyn CueStrategy>>>,
}

impl AudioCuePlayer {
    pub fn new(sound_enabled: bool, cue_asset: Option<PathBuf>) -> Self {
        let strategies: Vec<Box<dyn CueStrategy>> = vec![
            Box::new(AssetCue::new(cue_asset)),
            Box::new(SynthToneCue::new()),
        ];
        Self {
            sound_enabled,
            strategies: Arc::new(strategies),
        }
    }

    /// Build with a custom strategy chain.
    pub fn with_strategies(sound_enabled: bool, strategies: Vec<Box<dyn CueStrategy>>) -> Self {
        Self {
            sound_enabled,
            strategies: Arc::new(strategies),
        }
    }
}

impl SideEffectExecutor for AudioCuePlayer {
    fn name(&self) -> &str {
        "audio"
    }

    fn execute(
        &self,
        _notification: &Notification,
        policy: &NotificationPolicy,
    ) -> Result<EffectResult> {
        if !policy.play_sound {
            return Ok(EffectResult::Skipped("policy disables sound".to_string()));
        }
        if !self.sound_enabled {
            return Ok(EffectResult::Skipped(
                "sound preference disabled".to_string(),
            ));
        }

        let strategies = Arc::clone(&self.strategies);
        std::thread::spawn(move || {
            for strategy in strategies.iter() {
                match strategy.play() {
                    Ok(()) => {
                        debug!(strategy = strategy.name(), "Cue played");
                        return;
                    }
                    Err(e) => {
                        debug!(
                            strategy = strategy.name(),
                            error = %e,
                            "Cue strategy failed, trying next"
                        );
                    }
                }
            }
            warn!("All cue strategies failed, notification stays silent");
        });

        Ok(EffectResult::Executed)
    }
}
