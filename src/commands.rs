// CLI Commands
// Wire configuration, the generator, and the session source into the pipelines

use std::fs;
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;

use crate::config::Config;
use crate::generator::CommandGenerator;
use crate::pipeline::{self, ProgressionRequest, RegenOutcome, Regenerator};
use crate::session::{JsonFileSession, ObservationMap, WatchLoop};

#[derive(Debug)]
pub struct CommandError {
    message: String,
}

impl<E: std::fmt::Display> From<E> for CommandError {
    fn from(error: E) -> Self {
        CommandError {
            message: error.to_string(),
        }
    }
}

impl CommandError {
    pub fn message(&self) -> &str {
        &self.message
    }
}

pub type CommandResult<T> = Result<T, CommandError>;

/// Generator configured from `config`
pub fn build_generator(config: &Config) -> CommandGenerator {
    CommandGenerator::new(&config.generator_program, &config.model)
        .with_timeout(config.generator_timeout())
}

// ==================== WATCH ====================

/// Watch the configured session until `cancel` is set
///
/// Only setup problems (e.g. an unusable output directory) return an error;
/// everything that goes wrong inside the loop is logged and survived.
pub fn watch(config: &Config, cancel: &AtomicBool) -> CommandResult<()> {
    fs::create_dir_all(&config.output_dir)?;

    log::info!(
        "Reference MIDI: {} (kept for compatibility, not read)",
        config.reference_midi.display()
    );
    log::info!(
        "Using model {} via {}, writing to {}",
        config.model,
        config.generator_program,
        config.output_dir.display()
    );

    let regenerator = Regenerator::new(build_generator(config), &config.output_dir)
        .with_ticks_per_beat(config.ticks_per_beat);
    let source = JsonFileSession::new(&config.session_path);

    let mut observations = ObservationMap::new();
    WatchLoop::new(source, regenerator, config.poll_interval()).run(&mut observations, cancel);

    Ok(())
}

// ==================== PROGRESSION ====================

/// Generate one progression file, returning its path
pub fn progression(config: &Config, request: &ProgressionRequest) -> CommandResult<PathBuf> {
    fs::create_dir_all(&config.output_dir)?;

    let generator = build_generator(config);
    let path = pipeline::generate_progression(
        request,
        &generator,
        &config.output_dir,
        config.ticks_per_beat,
    )?;
    Ok(path)
}

// ==================== REGENERATE ====================

/// Regenerate a sketch for one clip name without watching a session
///
/// Returns `None` when the generator produced no chords.
pub fn regenerate(config: &Config, clip_name: &str) -> CommandResult<Option<PathBuf>> {
    fs::create_dir_all(&config.output_dir)?;

    let regenerator = Regenerator::new(build_generator(config), &config.output_dir)
        .with_ticks_per_beat(config.ticks_per_beat);

    match regenerator.regenerate(clip_name)? {
        RegenOutcome::Written(path) => Ok(Some(path)),
        RegenOutcome::NoChords => {
            log::warn!("No valid chords returned for '{}'", clip_name);
            Ok(None)
        }
    }
}
