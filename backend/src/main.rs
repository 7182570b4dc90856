//! BOI CLI - turn state registry exports into the mailing spreadsheet
//!
//! ```bash
//! boi florida cordata.txt --date 08/15/2024 -o Florida_Output.csv
//! boi washington corps.csv --filing-date 01/15/2025
//! boi west-virginia orgs.csv --json
//! boi combine Florida_Output.xlsx="first 100" WV_Output.csv --xlsx -o Combined_States.xlsx
//! boi serve --port 3000
//! boi user add ana --days 30
//! ```

use chrono::Utc;
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use boi::auth::{register, CredentialStore, FileCredentialStore};
use boi::config::AppConfig;
use boi::export::{self, OutputFormat};
use boi::models::Tabular;
use boi::transform::{
    combine_files, process_florida, process_washington, process_west_virginia, FloridaOptions,
    FloridaOutput, NamedUpload,
};

#[derive(Parser)]
#[command(name = "boi")]
#[command(about = "Convert state business-registry exports into a common mailing table", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Decode a Florida fixed-width corporate file
    Florida {
        /// Input text file
        input: PathBuf,

        /// Keep only this filing date (MM/DD/YYYY)
        #[arg(short, long)]
        date: Option<String>,

        /// Keep principal and mailing addresses (10 columns)
        #[arg(long)]
        full: bool,

        #[command(flatten)]
        out: OutputArgs,
    },

    /// Transform a Washington corporations CSV
    Washington {
        /// Input CSV file
        input: PathBuf,

        /// Filing date stamped on every row (MM/DD/YYYY)
        #[arg(short, long)]
        filing_date: String,

        #[command(flatten)]
        out: OutputArgs,
    },

    /// Transform a West Virginia business organizations CSV
    WestVirginia {
        /// Input CSV file
        input: PathBuf,

        #[command(flatten)]
        out: OutputArgs,
    },

    /// Merge processed CSV or xlsx files: FILE or FILE=SELECTION (ALL, "first N", "last N", A-B)
    Combine {
        #[arg(required = true)]
        files: Vec<String>,

        #[command(flatten)]
        out: OutputArgs,
    },

    /// Start HTTP server
    Serve {
        /// Port to listen on (default: BOI_PORT or 3000)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Manage login accounts
    User {
        #[command(subcommand)]
        action: UserAction,
    },
}

#[derive(clap::Args)]
struct OutputArgs {
    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Write JSON instead of CSV
    #[arg(long, conflicts_with = "xlsx")]
    json: bool,

    /// Write an xlsx workbook instead of CSV
    #[arg(long)]
    xlsx: bool,
}

impl OutputArgs {
    fn format(&self) -> OutputFormat {
        if self.json {
            OutputFormat::Json
        } else if self.xlsx {
            OutputFormat::Xlsx
        } else {
            OutputFormat::Csv
        }
    }
}

#[derive(Subcommand)]
enum UserAction {
    /// Create an account
    Add {
        username: String,

        /// Password (default: BOI_PASSWORD)
        #[arg(long)]
        password: Option<String>,

        /// Days until the account expires (default: never)
        #[arg(long)]
        days: Option<i64>,
    },

    /// Show an account
    Show { username: String },
}

#[tokio::main]
async fn main() {
    // Load .env file (if present)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Florida {
            input,
            date,
            full,
            out,
        } => cmd_florida(&input, date, full, &out),

        Commands::Washington {
            input,
            filing_date,
            out,
        } => cmd_washington(&input, &filing_date, &out),

        Commands::WestVirginia { input, out } => cmd_west_virginia(&input, &out),

        Commands::Combine { files, out } => cmd_combine(&files, &out),

        Commands::Serve { port } => cmd_serve(port).await,

        Commands::User { action } => cmd_user(action),
    };

    if let Err(e) = result {
        eprintln!("❌ Error: {}", e);
        std::process::exit(1);
    }
}

fn cmd_florida(
    input: &Path,
    date: Option<String>,
    full: bool,
    out: &OutputArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("📄 Processing: {}", input.display());
    let bytes = fs::read(input)?;
    let options = FloridaOptions {
        date_filter: date,
        mailing_only: !full,
    };

    let run = process_florida(&bytes, &options);
    match &run.output {
        FloridaOutput::Mailing(records) => write_records(records, out),
        FloridaOutput::Full(records) => write_records(records, out),
    }
}

fn cmd_washington(
    input: &Path,
    filing_date: &str,
    out: &OutputArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("📄 Processing: {}", input.display());
    let bytes = fs::read(input)?;
    let run = process_washington(&bytes, filing_date)?;
    write_records(&run.records, out)
}

fn cmd_west_virginia(input: &Path, out: &OutputArgs) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("📄 Processing: {}", input.display());
    let bytes = fs::read(input)?;
    let run = process_west_virginia(&bytes)?;
    write_records(&run.records, out)
}

fn cmd_combine(files: &[String], out: &OutputArgs) -> Result<(), Box<dyn std::error::Error>> {
    let mut uploads = Vec::with_capacity(files.len());
    for arg in files {
        let (path, selection) = split_file_arg(arg);
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| arg.clone());
        let bytes = fs::read(&path).map_err(|e| format!("{}: {}", path.display(), e))?;
        let upload = NamedUpload::new(name, bytes);
        uploads.push(match selection {
            Some(selection) => upload.with_selection(selection),
            None => upload,
        });
    }

    let report = combine_files(uploads)?;
    for file in &report.included {
        eprintln!(
            "   {}: {} of {} rows ({})",
            file.name, file.selected, file.available, file.selection
        );
    }
    write_records(&report.records, out)
}

/// `path=selection` -> (path, Some(selection)); a bare path has no selection.
fn split_file_arg(arg: &str) -> (PathBuf, Option<&str>) {
    match arg.rsplit_once('=') {
        Some((path, selection)) if !path.is_empty() => (PathBuf::from(path), Some(selection)),
        _ => (PathBuf::from(arg), None),
    }
}

async fn cmd_serve(port: Option<u16>) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = AppConfig::from_env();
    if let Some(port) = port {
        config.port = port;
    }
    boi::api::start_server(config).await
}

fn cmd_user(action: UserAction) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::from_env();
    let store = FileCredentialStore::open(&config.credentials_path)?;

    match action {
        UserAction::Add {
            username,
            password,
            days,
        } => {
            let password = password
                .or_else(|| std::env::var("BOI_PASSWORD").ok())
                .ok_or("no password given (use --password or BOI_PASSWORD)")?;

            let credential = register(&store, &username, &password, days, Utc::now())?;
            eprintln!(
                "✅ User '{}' saved to {}",
                credential.username,
                store.path().display()
            );
            match credential.expires_at {
                Some(at) => eprintln!("   Expires: {}", at.format("%Y-%m-%d %H:%M UTC")),
                None => eprintln!("   Expires: never"),
            }
        }

        UserAction::Show { username } => {
            let credential = store
                .lookup(&username)?
                .ok_or_else(|| format!("User not found: {}", username))?;

            println!("👤 {}", credential.username);
            println!("   Created: {}", credential.created_at.format("%Y-%m-%d %H:%M UTC"));
            match credential.expires_at {
                Some(at) if credential.is_expired(Utc::now()) => {
                    println!("   Expired: {}", at.format("%Y-%m-%d %H:%M UTC"))
                }
                Some(at) => println!("   Expires: {}", at.format("%Y-%m-%d %H:%M UTC")),
                None => println!("   Expires: never"),
            }
        }
    }

    Ok(())
}

fn write_records<T: Tabular + Serialize>(
    records: &[T],
    out: &OutputArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let format = out.format();
    match &out.output {
        Some(path) => {
            export::write_file(path, records, format)?;
            eprintln!("💾 {} rows written to: {}", records.len(), path.display());
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(&export::render(records, format)?)?;
            if format == OutputFormat::Json {
                writeln!(stdout)?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_file_arg() {
        assert_eq!(
            split_file_arg("out/fl.csv=first 10"),
            (PathBuf::from("out/fl.csv"), Some("first 10"))
        );
        assert_eq!(split_file_arg("wv.csv"), (PathBuf::from("wv.csv"), None));
        assert_eq!(split_file_arg("wv.csv="), (PathBuf::from("wv.csv"), Some("")));
    }

    #[test]
    fn test_cli_parses() {
        let cli = Cli::try_parse_from(["boi", "washington", "wa.csv", "--filing-date", "01/15/2025", "--json"])
            .unwrap();
        match cli.command {
            Commands::Washington { filing_date, out, .. } => {
                assert_eq!(filing_date, "01/15/2025");
                assert!(out.json);
                assert!(out.output.is_none());
            }
            _ => panic!("wrong command"),
        }

        assert!(Cli::try_parse_from(["boi", "washington", "wa.csv"]).is_err());
        assert!(Cli::try_parse_from(["boi", "west-virginia", "wv.csv", "--json", "--xlsx"]).is_err());

        let cli = Cli::try_parse_from(["boi", "combine", "a.xlsx", "b.csv=last 5", "--xlsx"]).unwrap();
        match cli.command {
            Commands::Combine { files, out } => {
                assert_eq!(files.len(), 2);
                assert_eq!(out.format(), OutputFormat::Xlsx);
            }
            _ => panic!("wrong command"),
        }
        assert!(Cli::try_parse_from(["boi", "combine"]).is_err());
    }
}
