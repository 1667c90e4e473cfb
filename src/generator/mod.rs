// Generator - External text model invocation and prompt construction

pub mod backend;
pub mod prompt;

pub use backend::{CommandGenerator, GenerationError, Generator};
pub use prompt::{request_nonce, sanitize_for_prompt, sketch_prompt, voicing_prompt};
