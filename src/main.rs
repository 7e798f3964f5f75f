use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use ddd_codec::{
    anonymize, authenticate_in_place, detector, marshal, parse, unmarshal, AnonymizeOptions,
    AuthenticateOptions, CancelToken, MarshalOptions, ParseOptions, UnmarshalOptions,
};
use flexi_logger::Logger;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = env!("CARGO_PKG_NAME"),
    version = env!("CARGO_PKG_VERSION"),
    about = env!("CARGO_PKG_DESCRIPTION")
)]
struct Cli {
    /// Enable verbose logging (repeat for more detail)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Parse download files and print their JSON rendering to stdout
    Parse {
        /// Input .DDD files
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Emit the framed (raw) view instead of the semantic model
        #[arg(long)]
        raw: bool,
        /// Verify certificate chains and record signatures
        #[arg(long)]
        authenticate: bool,
        /// Fail on unknown record tags instead of carrying them
        #[arg(long)]
        strict: bool,
        /// Keep original EF windows for byte-perfect re-emission
        #[arg(long)]
        preserve_raw_data: bool,
    },
    /// Scrub personal data and write an anonymized copy next to the input
    Anonymize {
        file: PathBuf,
        /// Output path (defaults to `<input>.anonymized.ddd`)
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(long)]
        preserve_timestamps: bool,
        #[arg(long)]
        preserve_distance_and_trips: bool,
    },
    /// Print the detected file type of each input
    Detect {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    Logger::try_with_env_or_str(log_level)?
        .start()
        .context("Failed to start logger")?;

    match cli.command {
        Command::Parse {
            files,
            raw,
            authenticate,
            strict,
            preserve_raw_data,
        } => {
            let unmarshal_options = UnmarshalOptions {
                strict,
                preserve_raw_data,
            };
            let parse_options = ParseOptions { preserve_raw_data };
            for path in files {
                let bytes = std::fs::read(&path)
                    .with_context(|| format!("Failed to read {}", path.display()))?;
                let mut raw_file = unmarshal(&bytes, &unmarshal_options)
                    .with_context(|| format!("Failed to unmarshal {}", path.display()))?;

                let mut auth_result = Ok(());
                if authenticate {
                    let summary = authenticate_in_place(
                        &mut raw_file,
                        &AuthenticateOptions::default(),
                        &CancelToken::new(),
                    )?;
                    auth_result = summary.into_result();
                }

                let json = if raw {
                    serde_json::to_string_pretty(&raw_file)?
                } else {
                    let file = parse(&raw_file, &parse_options)
                        .with_context(|| format!("Failed to parse {}", path.display()))?;
                    serde_json::to_string_pretty(&file)?
                };
                println!("{}", json);

                auth_result
                    .with_context(|| format!("Authentication failed for {}", path.display()))?;
            }
        }
        Command::Anonymize {
            file,
            output,
            preserve_timestamps,
            preserve_distance_and_trips,
        } => {
            let bytes = std::fs::read(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let raw_file = unmarshal(&bytes, &UnmarshalOptions::default())?;
            let parsed = parse(
                &raw_file,
                &ParseOptions {
                    preserve_raw_data: true,
                },
            )?;
            let scrubbed = anonymize(
                &parsed,
                &AnonymizeOptions {
                    preserve_timestamps,
                    preserve_distance_and_trips,
                },
            );
            let out_bytes = marshal(&scrubbed, &MarshalOptions::default())?;
            let out_path = output.unwrap_or_else(|| file.with_extension("anonymized.ddd"));
            std::fs::write(&out_path, out_bytes)
                .with_context(|| format!("Failed to write {}", out_path.display()))?;
            println!("Anonymized file written to {}", out_path.display());
        }
        Command::Detect { files } => {
            for path in files {
                let detected = detector::detect_from_file(
                    path.to_str().context("non-UTF-8 path")?,
                )
                .with_context(|| format!("Failed to detect {}", path.display()))?;
                println!("{}: {}", path.display(), detected);
            }
        }
    }

    Ok(())
}
