use std::{io::IsTerminal as _, path::PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "reelcut", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a pipeline, save the result and optionally play it.
    Run(RunArgs),
    /// Resolve a pipeline file and print its steps without running it.
    Check(CheckArgs),
}

#[derive(Parser, Debug)]
struct RunArgs {
    /// Pipeline JSON.
    #[arg(long)]
    pipeline: PathBuf,

    /// Directory sources are read from (overrides `input_dir`).
    #[arg(long)]
    input_dir: Option<PathBuf>,

    /// Output MP4 path (overrides `output.path`).
    #[arg(long)]
    out: Option<PathBuf>,

    /// Output frame rate (overrides `output.fps`).
    #[arg(long)]
    fps: Option<u32>,

    /// Fail instead of replacing an existing output file.
    #[arg(long)]
    no_overwrite: bool,

    /// Skip writing the output video.
    #[arg(long)]
    no_save: bool,

    /// Open the interactive viewer after the run (requires the `viewer` feature).
    #[arg(long)]
    play: bool,
}

#[derive(Parser, Debug)]
struct CheckArgs {
    /// Pipeline JSON.
    #[arg(long)]
    pipeline: PathBuf,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Run(args) => cmd_run(args),
        Command::Check(args) => cmd_check(args),
    }
}

fn load_config(path: &std::path::Path) -> anyhow::Result<reelcut::PipelineConfig> {
    reelcut::PipelineConfig::load(path)
        .with_context(|| format!("load pipeline '{}'", path.display()))
}

fn cmd_check(args: CheckArgs) -> anyhow::Result<()> {
    let cfg = load_config(&args.pipeline)?;
    let pipeline = cfg.pipeline().context("resolve pipeline steps")?;

    println!("input_dir: {}", cfg.input_dir.display());
    println!(
        "output:    {} @ {} fps",
        cfg.output.path.display(),
        cfg.output.fps
    );
    for (i, step) in pipeline.steps().iter().enumerate() {
        println!("  {i:>3}: {step}");
    }
    Ok(())
}

fn cmd_run(args: RunArgs) -> anyhow::Result<()> {
    let mut cfg = load_config(&args.pipeline)?;
    if let Some(dir) = args.input_dir {
        cfg.input_dir = dir;
    }
    if let Some(out) = args.out {
        cfg.output.path = out;
    }
    if let Some(fps) = args.fps {
        cfg.output.fps = fps;
    }

    let pipeline = cfg.pipeline().context("resolve pipeline steps")?;
    let mut source = reelcut::FsSource::new(&cfg.input_dir);

    let run = pipeline
        .run(reelcut::FrameSequence::new(), &mut source)
        .context("pipeline run failed")?;
    if !run.source_failures.is_empty() {
        tracing::warn!(
            skipped = run.source_failures.len(),
            "some sources could not be opened"
        );
    }
    tracing::info!(frames = run.sequence.len(), "pipeline finished");

    if !args.no_save {
        let enc = reelcut::EncodeConfig::new(&cfg.output.path, cfg.output.fps)
            .with_overwrite(!args.no_overwrite);
        match reelcut::encode_video(&run.sequence, &enc) {
            Ok(stats) => eprintln!(
                "wrote {} ({} frames, {}x{})",
                cfg.output.path.display(),
                stats.frames,
                stats.width,
                stats.height
            ),
            Err(reelcut::ReelError::EmptySequence) => {
                tracing::warn!("no frames to save");
            }
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("encode '{}'", cfg.output.path.display()));
            }
        }
    }

    if args.play {
        eprintln!("{}", reelcut::player::CONTROLS_HELP);
        reelcut::play(&run.sequence, cfg.player.delay_ms).context("player failed")?;
    }

    Ok(())
}
