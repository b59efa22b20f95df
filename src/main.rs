use anyhow::Result;
use clap::Parser;
use coinami_decompressor::config::{
    MATE1_FILE_NAME, MATE2_FILE_NAME, METADATA_FILE_NAME, REFERENCE_MAX_LINE_LENGTH,
    REFERENCE_MAX_METADATA_LENGTH,
};
use coinami_decompressor::{run, DemuxConfig, DemuxError, OutputNames};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::info;

#[derive(Parser)]
#[command(name = "coinami-decompressor")]
#[command(version)]
#[command(about = "Split a gzipped coinami job into job metadata and paired FASTQ files")]
struct Args {
    #[arg(value_name = "INPUT", help = "gzip-compressed job archive")]
    input: PathBuf,

    #[arg(value_name = "DIR", help = "Directory for the outputs (default: current directory)")]
    output_dir: Option<PathBuf>,

    #[arg(long, default_value = METADATA_FILE_NAME, help = "Name of the job metadata output")]
    metadata_name: String,

    #[arg(long, default_value = MATE1_FILE_NAME, help = "Name of the mate 1 FASTQ output")]
    mate1_name: String,

    #[arg(long, default_value = MATE2_FILE_NAME, help = "Name of the mate 2 FASTQ output")]
    mate2_name: String,

    #[arg(long, value_name = "N", help = "Fail on read lines longer than N bytes")]
    max_line_length: Option<usize>,

    #[arg(long, value_name = "N", help = "Fail if the metadata line is longer than N bytes")]
    max_metadata_length: Option<usize>,

    #[arg(
        long,
        default_value = "false",
        conflicts_with_all = ["max_line_length", "max_metadata_length"],
        help = "Apply the historic 148/998 byte line limits"
    )]
    reference_limits: bool,

    #[arg(short = 'c', long, default_value = "false", help = "Compress read outputs with gzip")]
    compress: bool,

    #[arg(short = 'v', long, default_value = "false", help = "Verbose output showing progress")]
    verbose: bool,
}

impl Args {
    fn into_config(self) -> DemuxConfig {
        let (max_line_length, max_metadata_length) = if self.reference_limits {
            (
                Some(REFERENCE_MAX_LINE_LENGTH),
                Some(REFERENCE_MAX_METADATA_LENGTH),
            )
        } else {
            (self.max_line_length, self.max_metadata_length)
        };

        DemuxConfig {
            input: self.input,
            output_dir: self.output_dir,
            names: OutputNames {
                metadata: self.metadata_name,
                mate1: self.mate1_name,
                mate2: self.mate2_name,
            },
            max_line_length,
            max_metadata_length,
            compress: self.compress,
        }
    }
}

fn main() -> ExitCode {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .init();

    match process(args.into_config()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {:#}", err);
            let code = err
                .downcast_ref::<DemuxError>()
                .map(DemuxError::exit_code)
                .unwrap_or(1);
            ExitCode::from(code)
        }
    }
}

fn process(config: DemuxConfig) -> Result<()> {
    let summary = run(&config)?;

    info!("Output files:");
    info!("  job: {}", summary.metadata_path.display());
    info!("  R1:  {} ({} records)", summary.mate1_path.display(), summary.mate1_records());
    info!("  R2:  {} ({} records)", summary.mate2_path.display(), summary.mate2_records());

    Ok(())
}
