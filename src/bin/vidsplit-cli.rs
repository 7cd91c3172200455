use std::env;
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use vidsplit::{FfmpegEngine, SplitRequest, Splitter, TranscodeEngine};

const DEFAULT_SEGMENT_SECS: u32 = 30;

const USAGE: &str = "Usage: vidsplit-cli <input-video> [--segment-secs N] [--output PATH]

Splits the input into fixed-duration segments (stream copy, no re-encode)
and writes them as a single zip archive. Default segment length: 30s.";

struct CliArgs {
    input: PathBuf,
    segment_secs: u32,
    output: Option<PathBuf>,
}

fn parse_args(mut args: impl Iterator<Item = String>) -> Result<CliArgs, String> {
    let mut input = None;
    let mut segment_secs = DEFAULT_SEGMENT_SECS;
    let mut output = None;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--segment-secs" => {
                let value = args
                    .next()
                    .ok_or_else(|| "--segment-secs requires a value".to_string())?;
                segment_secs = value
                    .parse()
                    .map_err(|_| format!("invalid segment length: {}", value))?;
            }
            "--output" => {
                let value = args
                    .next()
                    .ok_or_else(|| "--output requires a value".to_string())?;
                output = Some(PathBuf::from(value));
            }
            "--help" | "-h" => return Err(USAGE.to_string()),
            other if other.starts_with('-') => {
                return Err(format!("unknown option: {}", other));
            }
            other => {
                if input.is_some() {
                    return Err("only one input file is supported".to_string());
                }
                input = Some(PathBuf::from(other));
            }
        }
    }

    let input = input.ok_or_else(|| "missing input file".to_string())?;
    Ok(CliArgs {
        input,
        segment_secs,
        output,
    })
}

fn default_output_path(input: &PathBuf) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "video".to_string());
    input.with_file_name(format!("{}_segments.zip", stem))
}

fn run(args: CliArgs) -> Result<(), String> {
    let data = fs::read(&args.input)
        .map_err(|e| format!("failed to read {}: {}", args.input.display(), e))?;
    let file_name = args
        .input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| format!("not a file: {}", args.input.display()))?;

    let mut engine = FfmpegEngine::new();
    engine.load().map_err(|e| e.to_string())?;

    let request = SplitRequest {
        file_name,
        data,
        segment_secs: args.segment_secs,
    };
    let mut splitter = Splitter::new(engine);

    let mut last_percent = None;
    let outcome = splitter
        .run(&request, |p| {
            if last_percent != Some(p.percent) {
                last_percent = Some(p.percent);
                println!(
                    "{:>3}% {:?} ({}/{})",
                    p.percent, p.status, p.processed_segments, p.total_segments
                );
            }
        })
        .map_err(|e| e.to_string())?;

    for warning in &outcome.warnings {
        eprintln!(
            "warning: segment {} ({}) failed: {}",
            warning.index, warning.name, warning.reason
        );
    }

    let output_path = args
        .output
        .unwrap_or_else(|| default_output_path(&args.input));
    fs::write(&output_path, &outcome.archive)
        .map_err(|e| format!("failed to write {}: {}", output_path.display(), e))?;
    println!(
        "Wrote {} segments to {}",
        outcome.segment_count,
        output_path.display()
    );
    Ok(())
}

fn main() -> ExitCode {
    env_logger::init();

    let args = match parse_args(env::args().skip(1)) {
        Ok(args) => args,
        Err(message) => {
            eprintln!("{}", message);
            if message != USAGE {
                eprintln!("\n{}", USAGE);
            }
            return ExitCode::from(2);
        }
    };

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("error: {}", message);
            ExitCode::FAILURE
        }
    }
}
