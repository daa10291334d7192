//! Command-line entry point for the ATM core.
//!
//! Opens (and migrates) a SQLite database, then imports CSV files,
//! manages ATM types or prints the field schema.

use anyhow::{bail, Context, Result};
use atm_core::access::permission::PERMISSION_ADMINISTER;
use atm_core::service::listing::{build_atm_listing, build_atm_type_listing, Listing};
use atm_core::{
    atm_schema_shared, core_version, default_log_level, init_logging, open_db, Account,
    AtmImporter, AtmListQuery, AtmRepository, AtmType, AtmTypeRepository, ImportOptions,
    ImportUpload, SqliteAtmRepository, SqliteAtmTypeRepository, UserId,
};
use clap::{Parser, Subcommand};
use log::info;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "atm")]
#[command(about = "Manage ATM records stored in SQLite")]
struct Args {
    /// SQLite database file, created when missing
    #[arg(long, default_value = "atm.db")]
    db: PathBuf,

    /// Absolute directory for rolling log files; logging is off when unset
    #[arg(long)]
    log_dir: Option<PathBuf>,

    /// trace, debug, info, warn or error
    #[arg(long)]
    log_level: Option<String>,

    /// Acting user id; the CLI acts with full ATM permissions
    #[arg(long, default_value_t = 1)]
    user: UserId,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Import ATM records from a CSV file
    Import {
        /// ATM type the records belong to
        #[arg(long)]
        bundle: String,
        file: PathBuf,
    },
    /// Create an ATM type
    AddType { id: String, label: String },
    /// List ATM types
    Types,
    /// List ATM records
    List {
        #[arg(long)]
        bundle: Option<String>,
        #[arg(long)]
        limit: Option<u32>,
    },
    /// Print the ATM field schema as JSON
    Schema,
    /// Print the core version
    Version,
}

fn main() -> Result<()> {
    let args = Args::parse();

    if let Some(log_dir) = &args.log_dir {
        let level = args.log_level.as_deref().unwrap_or(default_log_level());
        init_logging(level, log_dir).context("failed to initialize logging")?;
    } else if args.log_level.is_some() {
        bail!("--log-level requires --log-dir");
    }

    match &args.command {
        Command::Schema => {
            let schema = atm_schema_shared()?;
            println!("{}", serde_json::to_string_pretty(schema)?);
            return Ok(());
        }
        Command::Version => {
            println!("atm_core {}", core_version());
            return Ok(());
        }
        _ => {}
    }

    let conn = open_db(&args.db)
        .with_context(|| format!("failed to open database {}", args.db.display()))?;
    let account = Account::new(args.user, [PERMISSION_ADMINISTER]);

    match args.command {
        Command::Import { bundle, file } => {
            let bytes =
                std::fs::read(&file).with_context(|| format!("failed to read {}", file.display()))?;
            let file_name = file
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default();
            let importer = AtmImporter::new(
                SqliteAtmRepository::try_new(&conn)?,
                SqliteAtmTypeRepository::try_new(&conn)?,
                atm_schema_shared()?,
            );
            let report = importer.import(
                &account,
                &ImportUpload::from_file_name(file_name, bytes),
                &ImportOptions { bundle },
            )?;

            for outcome in &report.outcomes {
                if let Err(errors) = &outcome.result {
                    for error in errors {
                        eprintln!("line {}: {error}", outcome.line);
                    }
                }
            }
            println!("created={} failed={}", report.created(), report.failed());
            info!(
                "event=cli_import module=cli status=ok created={} failed={}",
                report.created(),
                report.failed()
            );
        }
        Command::AddType { id, label } => {
            let atm_type = AtmType::new(id, label);
            SqliteAtmTypeRepository::try_new(&conn)?.create_atm_type(&atm_type)?;
            println!("created atm type {}", atm_type.id);
        }
        Command::Types => {
            let types = SqliteAtmTypeRepository::try_new(&conn)?.list_atm_types()?;
            print_listing(&build_atm_type_listing(&types));
        }
        Command::List { bundle, limit } => {
            let atms = SqliteAtmRepository::try_new(&conn)?.list_atms(&AtmListQuery {
                bundle,
                limit,
                offset: 0,
            })?;
            print_listing(&build_atm_listing(&atms));
        }
        Command::Schema | Command::Version => {}
    }

    Ok(())
}

fn print_listing(listing: &Listing) {
    if listing.is_empty() {
        println!("{}", listing.empty_text);
        return;
    }
    println!("id\t{}", listing.header.join("\t"));
    for row in &listing.rows {
        println!("{}\t{}", row.id, row.cells.join("\t"));
    }
}
