// Generator backend abstraction
// Runs the external text model as a blocking subprocess, with an optional timeout

use std::io::{self, Read};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use thiserror::Error;

/// How often a running generator is checked against its deadline
const WAIT_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Errors that can occur while invoking the generator
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("Failed to launch generator `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("Generator exited with {status}: {stderr}")]
    Exit { status: String, stderr: String },

    #[error("Generator did not finish within {0:?}")]
    Timeout(Duration),

    #[error("Generator output is not valid UTF-8")]
    InvalidOutput,

    #[error("IO error while running generator: {0}")]
    Io(#[from] io::Error),
}

/// Something that turns a prompt into generated text
pub trait Generator {
    fn generate(&self, prompt: &str) -> Result<String, GenerationError>;
}

impl<G: Generator + ?Sized> Generator for &G {
    fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        (**self).generate(prompt)
    }
}

impl<G: Generator + ?Sized> Generator for Box<G> {
    fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        (**self).generate(prompt)
    }
}

/// Invokes `<program> run <model> <prompt>` and captures stdout
///
/// With the defaults this is `ollama run llama3:latest "<prompt>"`.
#[derive(Debug, Clone)]
pub struct CommandGenerator {
    program: String,
    model: String,
    timeout: Option<Duration>,
}

impl CommandGenerator {
    pub fn new(program: impl Into<String>, model: impl Into<String>) -> Self {
        CommandGenerator {
            program: program.into(),
            model: model.into(),
            timeout: None,
        }
    }

    /// Kill the generator if it runs longer than `timeout`
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn spawn(&self, prompt: &str) -> Result<Child, GenerationError> {
        Command::new(&self.program)
            .arg("run")
            .arg(&self.model)
            .arg(prompt)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| GenerationError::Spawn {
                program: self.program.clone(),
                source,
            })
    }
}

impl Generator for CommandGenerator {
    fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        log::debug!("Running {} with model {}", self.program, self.model);
        let mut child = self.spawn(prompt)?;

        // Drain both pipes on their own threads so a chatty child cannot
        // block on a full pipe while we wait on it
        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());

        let status = match self.timeout {
            Some(limit) => wait_with_deadline(&mut child, limit)?,
            None => child.wait()?,
        };

        let stdout = join_drain(stdout)?;
        let stderr = join_drain(stderr)?;

        if !status.success() {
            return Err(GenerationError::Exit {
                status: status.to_string(),
                stderr: String::from_utf8_lossy(&stderr).trim().to_string(),
            });
        }

        let text = String::from_utf8(stdout).map_err(|_| GenerationError::InvalidOutput)?;
        Ok(text.trim().to_string())
    }
}

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> thread::JoinHandle<io::Result<Vec<u8>>> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut pipe) = pipe {
            pipe.read_to_end(&mut buf)?;
        }
        Ok(buf)
    })
}

fn join_drain(handle: thread::JoinHandle<io::Result<Vec<u8>>>) -> Result<Vec<u8>, GenerationError> {
    handle
        .join()
        .map_err(|_| io::Error::other("generator output reader panicked"))?
        .map_err(GenerationError::from)
}

fn wait_with_deadline(child: &mut Child, limit: Duration) -> Result<ExitStatus, GenerationError> {
    let deadline = Instant::now() + limit;
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(status);
        }
        if Instant::now() >= deadline {
            log::warn!("Generator exceeded {:?}, killing it", limit);
            let _ = child.kill();
            let _ = child.wait();
            return Err(GenerationError::Timeout(limit));
        }
        thread::sleep(WAIT_POLL_INTERVAL);
    }
}
