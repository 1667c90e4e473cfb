// Pipeline - End-to-end generation flows
// Clip-rename regeneration and the standalone progression generator

pub mod naming;
pub mod progression;
pub mod regenerate;

pub use naming::{progression_filename, regen_filename, sanitize_for_filename, slugify};
pub use progression::{generate_progression, ProgressionError, ProgressionRequest};
pub use regenerate::{RegenError, RegenOutcome, Regenerator};
