use std::{
    fs,
    net::SocketAddr,
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::{Context, bail};
use clap::{Args, CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use colored::Colorize;
use serde_json::json;
use tracing_subscriber::EnvFilter;

use clipsight::{
    FetchOptions, Fetcher, FfmpegLogLevel, Pipeline, RequestWorkspace, SampleOptions,
    ServiceOptions, configuration, sampler,
};

const CLI_AFTER_HELP: &str = "Examples:\n  clipsight serve --bind 0.0.0.0:5000\n  clipsight sample https://example.com/clip.mp4 --out frames --json\n  clipsight sample input.mp4 --out frames --frames 8\n  clipsight completions zsh > _clipsight";

#[derive(Debug, Parser)]
#[command(
    name = "clipsight",
    version,
    about = "Sample preview frames from remote videos and serve them over HTTP",
    after_help = CLI_AFTER_HELP
)]
struct Cli {
    #[command(flatten)]
    global: GlobalOptions,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Args, Clone)]
struct GlobalOptions {
    /// Show debug logging output.
    #[arg(long, global = true)]
    verbose: bool,

    /// FFmpeg log level (quiet, panic, fatal, error, warning, info, verbose, debug, trace).
    #[arg(long, global = true, env = "CLIPSIGHT_FFMPEG_LOG_LEVEL", default_value = "error")]
    ffmpeg_log_level: FfmpegLogLevel,

    /// Maximum accepted video size in bytes.
    #[arg(long, global = true, env = "CLIPSIGHT_MAX_VIDEO_BYTES", default_value_t = configuration::DEFAULT_MAX_VIDEO_BYTES)]
    max_video_bytes: u64,

    /// Bytes buffered before each write of a download to disk.
    #[arg(long, global = true, env = "CLIPSIGHT_CHUNK_SIZE", default_value_t = configuration::DEFAULT_CHUNK_SIZE)]
    chunk_size: usize,

    /// Maximum number of frames sampled per video.
    #[arg(long = "frames", global = true, env = "CLIPSIGHT_MAX_FRAMES", default_value_t = configuration::DEFAULT_MAX_FRAMES)]
    max_frames: usize,
}

impl GlobalOptions {
    fn fetch_options(&self) -> FetchOptions {
        FetchOptions::new()
            .with_max_bytes(self.max_video_bytes)
            .with_chunk_size(self.chunk_size)
    }

    fn sample_options(&self) -> SampleOptions {
        SampleOptions::new().with_max_frames(self.max_frames)
    }
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run the analysis HTTP service.
    #[command(
        about = "Run the HTTP service",
        after_help = "Examples:\n  clipsight serve\n  CLIPSIGHT_BIND=0.0.0.0:8080 clipsight serve --frames 8"
    )]
    Serve {
        /// Address to listen on.
        #[arg(long, env = "CLIPSIGHT_BIND", default_value = "127.0.0.1:5000")]
        bind: SocketAddr,

        /// Directory for per-request scratch space (defaults to the system temp dir).
        #[arg(long, env = "CLIPSIGHT_SCRATCH_DIR")]
        scratch_dir: Option<PathBuf>,
    },

    /// Sample frames from a local file or URL into a directory.
    #[command(
        about = "Sample frames from a video",
        after_help = "Examples:\n  clipsight sample input.mp4 --out frames\n  clipsight sample https://example.com/clip.mp4 --out frames --json"
    )]
    Sample {
        /// Input path or http(s) URL.
        input: String,

        /// Output directory for the encoded frames.
        #[arg(long)]
        out: PathBuf,

        /// Allow writing into an existing directory.
        #[arg(long)]
        overwrite: bool,

        /// Print the result as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Generate shell completion scripts.
    #[command(about = "Generate shell completions")]
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose {
        "clipsight=debug,tower_http=debug"
    } else {
        "clipsight=info,tower_http=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .init();
}

fn is_remote(input: &str) -> bool {
    let lower = input.to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

async fn run() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    init_logging(cli.global.verbose);
    clipsight::set_ffmpeg_log_level(cli.global.ffmpeg_log_level);

    match cli.command {
        Commands::Completions { shell } => {
            let mut command = Cli::command();
            clap_complete::generate(shell, &mut command, "clipsight", &mut std::io::stdout());
        }
        Commands::Serve { bind, scratch_dir } => {
            let mut options = ServiceOptions::new()
                .with_fetch(cli.global.fetch_options())
                .with_sample(cli.global.sample_options());
            if let Some(directory) = scratch_dir {
                fs::create_dir_all(&directory).with_context(|| {
                    format!("cannot create scratch directory {}", directory.display())
                })?;
                options = options.with_scratch_directory(directory);
            }

            let listener = tokio::net::TcpListener::bind(bind)
                .await
                .with_context(|| format!("cannot bind {bind}"))?;
            tracing::info!("clipsight listening on http://{}", listener.local_addr()?);

            clipsight::serve(listener, Arc::new(Pipeline::new(options))).await?;
        }
        Commands::Sample {
            input,
            out,
            overwrite,
            json,
        } => {
            if out.exists() {
                if !overwrite {
                    bail!(
                        "output directory already exists: {} (use --overwrite)",
                        out.display()
                    );
                }
                eprintln!(
                    "{} {}",
                    "warning:".yellow().bold(),
                    format!("writing into existing directory {}", out.display()).yellow()
                );
            }
            fs::create_dir_all(&out)?;

            // Remote inputs are downloaded into a workspace that is removed
            // once sampling is done; the frames stay in `out`.
            let workspace = RequestWorkspace::create(None)?;
            let source = if is_remote(&input) {
                let handle = Fetcher::new(cli.global.fetch_options())
                    .download(&input, workspace.path())
                    .await?;
                eprintln!(
                    "{} {} bytes from {input}",
                    "downloaded".cyan().bold(),
                    handle.byte_size
                );
                handle.path
            } else {
                PathBuf::from(&input)
            };

            let sample_options = cli.global.sample_options();
            let output_directory = out.clone();
            let result = tokio::task::spawn_blocking(move || {
                sampler::sample(&source, &output_directory, &sample_options)
            })
            .await??;
            workspace.close();

            print_sample(&result, &out, json)?;
        }
    }

    Ok(())
}

fn print_sample(result: &clipsight::SampleResult, out: &Path, json: bool) -> anyhow::Result<()> {
    if json {
        let payload = json!({
            "duration": result.duration_seconds,
            "frames": result.frames.iter().map(|frame| json!({
                "path": frame.path,
                "frame_index": frame.frame_index,
                "timestamp": frame.timestamp,
            })).collect::<Vec<_>>(),
        });
        println!("{}", serde_json::to_string_pretty(&payload)?);
        return Ok(());
    }

    for frame in &result.frames {
        println!(
            "{} {} (frame {}) -> {}",
            "saved".green().bold(),
            frame.timestamp,
            frame.frame_index,
            frame.path.display()
        );
    }
    println!(
        "{} {}",
        "success:".green().bold(),
        format!(
            "Sampled {} frame(s) to {} (duration {:.2}s)",
            result.frames.len(),
            out.display(),
            result.duration_seconds
        )
        .green()
    );
    Ok(())
}

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("{} {error:#}", "error:".red().bold());
        std::process::exit(1);
    }
}
