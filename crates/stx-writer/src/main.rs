use std::path::PathBuf;
use std::process::ExitCode;

use clap::error::ErrorKind;
use clap::Parser;
use stx_convert::guess::{guess_pattern, write_pattern_file};
use stx_convert::info::dataset_info;
use stx_convert::{run_conversion, RunOptions};
use stx_core::errors::{StxError, UsageError};
use stx_core::naming::resolve_naming;
use stx_formats::registry::open_reader;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "stx-writer",
    about = "Convert imaging datasets into SpaceTx FOV filesets"
)]
struct Cli {
    /// Dataset entry files; related files are grouped by the backend.
    #[arg(value_name = "INPUT", required = true)]
    inputs: Vec<PathBuf>,

    /// Output directory (must not pre-exist), or the pattern file path
    /// with --guess.
    #[arg(short = 'o', long = "output", value_name = "OUTPUT")]
    out: Option<PathBuf>,

    /// Base field-of-view index offset.
    #[arg(short = 'f', value_name = "FOV", default_value_t = 0, allow_hyphen_values = true)]
    fov: i64,

    /// Series selector for non-plate, single-input runs.
    #[arg(short = 's', value_name = "SERIES")]
    series: Option<usize>,

    /// Worker pool size; 1 converts sequentially.
    #[arg(short = 'j', value_name = "JOBS", default_value_t = 1)]
    jobs: usize,

    /// Naming scheme identifier ('standard').
    #[arg(short = 'n', value_name = "NAMING", default_value = "standard")]
    naming: String,

    /// Codebook file copied into the fileset as codebook.json.
    #[arg(short = 'c', value_name = "CODEBOOK")]
    codebook: Option<PathBuf>,

    /// Skip writing tile and companion files; JSON only.
    #[arg(long)]
    no_tiles: bool,

    /// Derive an input grouping pattern and exit.
    #[arg(long)]
    guess: bool,

    /// Print dataset metadata and exit.
    #[arg(long)]
    info: bool,

    /// Force a specific backend format implementation.
    #[arg(long, value_name = "FORMAT")]
    format: Option<String>,
}

fn main() -> ExitCode {
    init_logging();
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let code = match err.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => 0,
                _ => 2,
            };
            let _ = err.print();
            return ExitCode::from(code);
        }
    };
    ExitCode::from(run(cli).clamp(0, u8::MAX as i32) as u8)
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> i32 {
    match execute(cli) {
        Ok(code) => code,
        Err(err) => {
            let code = err.exit_code();
            eprintln!("================================================================");
            eprintln!("stx-writer: error [{code}]: {err}");
            code
        }
    }
}

fn execute(cli: Cli) -> Result<i32, StxError> {
    for input in &cli.inputs {
        if !input.is_file() {
            return Err(UsageError::InputDoesNotExist(input.display().to_string()).into());
        }
    }
    if cli.fov < 0 {
        return Err(UsageError::NegativeFov(cli.fov).into());
    }
    if cli.series.is_some() && cli.inputs.len() > 1 {
        return Err(UsageError::Invalid(
            "-s supports a single input only".to_string(),
        )
        .into());
    }

    if cli.guess {
        run_guess(&cli)
    } else if cli.info {
        run_info(&cli)
    } else if cli.out.is_some() {
        run_convert(cli)
    } else {
        Err(UsageError::NeedAction.into())
    }
}

fn run_guess(cli: &Cli) -> Result<i32, StxError> {
    if cli.inputs.len() != 1 {
        return Err(UsageError::Invalid(
            "--guess supports exactly one input".to_string(),
        )
        .into());
    }
    let pattern = guess_pattern(&cli.inputs[0])?;
    match &cli.out {
        Some(out) => write_pattern_file(&pattern, out)?,
        None => println!("{pattern}"),
    }
    Ok(0)
}

fn run_info(cli: &Cli) -> Result<i32, StxError> {
    let mut documents = Vec::with_capacity(cli.inputs.len());
    for input in &cli.inputs {
        let mut reader = open_reader(input, cli.format.as_deref())?;
        documents.push(dataset_info(reader.as_mut())?);
    }
    let value = if documents.len() == 1 {
        documents.into_iter().next().expect("one document")
    } else {
        serde_json::Value::Array(documents)
    };
    let rendered =
        serde_json::to_string_pretty(&value).map_err(|err| StxError::Serde(err.to_string()))?;
    println!("{rendered}");
    Ok(0)
}

fn run_convert(cli: Cli) -> Result<i32, StxError> {
    let naming = resolve_naming(&cli.naming)?;
    let opts = RunOptions {
        inputs: cli.inputs,
        out: cli.out.expect("validated by execute"),
        fov_offset: cli.fov as usize,
        series: cli.series,
        jobs: cli.jobs,
        naming,
        codebook: cli.codebook,
        no_tiles: cli.no_tiles,
        format: cli.format,
    };
    run_conversion(&opts)
}
