use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use chordwatch_lib::arranger::TimeSignature;
use chordwatch_lib::commands::{self, CommandResult};
use chordwatch_lib::config::Config;
use chordwatch_lib::pipeline::ProgressionRequest;
use tokio::task::JoinError;

/// Turn chord sketches into MIDI files, regenerating whenever a clip is renamed.
#[derive(Parser, Debug)]
#[command(name = "chordwatch")]
#[command(about = "Chord sketch to MIDI generator")]
struct Args {
    /// Config file (default: per-user config.json, if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Model identifier passed to the generator
    #[arg(long, global = true)]
    model: Option<String>,

    /// Generator executable
    #[arg(long, global = true)]
    generator: Option<String>,

    /// Directory for generated MIDI files
    #[arg(long, global = true)]
    output_dir: Option<PathBuf>,

    /// Kill the generator after this many seconds
    #[arg(long, global = true)]
    timeout_secs: Option<u64>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Poll the live session and regenerate a sketch for each renamed clip (default)
    Watch {
        /// JSON session dump to poll
        #[arg(long)]
        session: Option<PathBuf>,

        /// Delay between polls in milliseconds
        #[arg(long)]
        poll_interval_ms: Option<u64>,
    },

    /// Generate a fixed-grid chord progression from roots and a vibe
    Progression {
        /// Time signature, e.g. 3/4
        #[arg(long, default_value = "4/4", value_parser = parse_time_signature)]
        time_signature: TimeSignature,

        /// Chord length as a note value (1, 2, 4, 8, 16)
        #[arg(long, default_value = "4")]
        subdivision: u32,

        /// Number of bars
        #[arg(long, default_value = "4")]
        bars: u32,

        /// Comma-separated chord roots, e.g. C,G,A,F
        #[arg(long, value_delimiter = ',', required = true)]
        roots: Vec<String>,

        /// Free-text style description
        #[arg(long)]
        vibe: String,

        /// Output file (default: derived from the parameters)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Generate one sketch for a clip name and exit
    Regenerate {
        /// Clip name to compose for
        clip_name: String,
    },
}

fn parse_time_signature(s: &str) -> Result<TimeSignature, String> {
    s.parse().map_err(|e| format!("Invalid time signature: {}", e))
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();
}

fn load_config(args: &Args) -> Result<Config, anyhow::Error> {
    let mut config = Config::load(args.config.as_deref())?;

    if let Some(model) = &args.model {
        config.model = model.clone();
    }
    if let Some(program) = &args.generator {
        config.generator_program = program.clone();
    }
    if let Some(output_dir) = &args.output_dir {
        config.output_dir = output_dir.clone();
    }
    if let Some(timeout_secs) = args.timeout_secs {
        config.generator_timeout_secs = Some(timeout_secs);
    }

    Ok(config)
}

fn finish<T>(joined: Result<CommandResult<T>, JoinError>) -> Result<T, anyhow::Error> {
    joined?.map_err(|e| anyhow::anyhow!("{}", e.message()))
}

/// Exit status for a second Ctrl+C (128 + SIGINT)
const FORCED_EXIT_CODE: i32 = 130;

async fn run_watch(config: Config) -> Result<(), anyhow::Error> {
    let cancel = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&cancel);
    let mut worker = tokio::task::spawn_blocking(move || commands::watch(&config, &flag));

    tokio::select! {
        joined = &mut worker => return finish(joined),
        signal = tokio::signal::ctrl_c() => match signal {
            Ok(()) => {
                log::info!("Stopped by user, finishing the current generation (Ctrl+C again to quit now)");
                cancel.store(true, Ordering::SeqCst);
            }
            Err(e) => {
                log::error!("Could not listen for Ctrl+C: {}", e);
                return finish(worker.await);
            }
        },
    }

    tokio::select! {
        joined = &mut worker => finish(joined),
        _ = tokio::signal::ctrl_c() => {
            log::warn!("Interrupted again, exiting without waiting for the generator");
            std::process::exit(FORCED_EXIT_CODE);
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let args = Args::parse();
    init_logging(args.verbose);

    let mut config = load_config(&args)?;
    let command = args.command.unwrap_or(Command::Watch {
        session: None,
        poll_interval_ms: None,
    });

    match command {
        Command::Watch {
            session,
            poll_interval_ms,
        } => {
            if let Some(session) = session {
                config.session_path = session;
            }
            if let Some(poll_interval_ms) = poll_interval_ms {
                config.poll_interval_ms = poll_interval_ms;
            }
            config.validate()?;

            log::info!(
                "Watching {} every {} ms (Ctrl+C to stop)",
                config.session_path.display(),
                config.poll_interval_ms
            );
            run_watch(config).await
        }

        Command::Progression {
            time_signature,
            subdivision,
            bars,
            roots,
            vibe,
            output,
        } => {
            config.validate()?;

            let request = ProgressionRequest {
                time_signature,
                subdivision,
                roots: roots.iter().map(|r| r.trim().to_string()).collect(),
                vibe,
                bars,
                filename: output,
            };
            let joined =
                tokio::task::spawn_blocking(move || commands::progression(&config, &request)).await;
            let path = finish(joined)?;
            println!("{}", path.display());
            Ok(())
        }

        Command::Regenerate { clip_name } => {
            config.validate()?;

            let joined =
                tokio::task::spawn_blocking(move || commands::regenerate(&config, &clip_name)).await;
            match finish(joined)? {
                Some(path) => println!("{}", path.display()),
                None => log::warn!("Nothing written"),
            }
            Ok(())
        }
    }
}
