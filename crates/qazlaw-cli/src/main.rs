mod display;

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, bail};
use clap::{Args, Parser, Subcommand};
use qazlaw_client::http::DEFAULT_BASE_URL;
use qazlaw_client::{ClientConfig, ZanClient};
use qazlaw_core::ActTypeCode;
use qazlaw_ingest::{Coordinator, IngestConfig, RunStatus, TROUBLED_CODES, link_causes};
use qazlaw_store::DuckStore;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "qazlaw", version, about = "Kazakhstan legislation corpus builder")]
struct Cli {
    /// DuckDB database file.
    #[arg(long, env = "QAZLAW_DB", default_value = "qazlaw.duckdb", global = true)]
    db: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Walk the zan.gov.kz catalog and ingest every act not yet stored.
    Ingest(IngestArgs),
    /// Point version causes at ingested acts.
    LinkCauses,
    /// Show corpus row counts.
    Stats,
    /// Show one act and its versions.
    Show {
        /// Registry code, e.g. Z1500000375.
        code: String,
    },
}

#[derive(Args)]
struct IngestArgs {
    /// Drop and recreate all tables first.
    #[arg(long)]
    recreate: bool,

    /// Catalog page to start from.
    #[arg(long, default_value_t = 1)]
    start_page: u32,

    /// Acts processed at once.
    #[arg(long, default_value_t = 2)]
    concurrency: usize,

    #[arg(long, default_value_t = 20)]
    page_size: u32,

    /// Pause after each catalog page, in milliseconds.
    #[arg(long, default_value_t = 100)]
    page_delay_ms: u64,

    /// Restrict the walk to these act types (e.g. ЗАК). Defaults to normative act types.
    #[arg(long = "act-type", value_name = "CODE")]
    act_types: Vec<ActTypeCode>,

    /// Skip this act code in addition to the built-in exclusions.
    #[arg(long = "exclude", value_name = "CODE")]
    exclude: Vec<String>,

    /// Keep submitting acts after network failures.
    #[arg(long)]
    keep_going: bool,

    /// Run cause linking after the walk.
    #[arg(long)]
    link_causes: bool,

    #[arg(long, env = "QAZLAW_API_URL", default_value = DEFAULT_BASE_URL)]
    api_url: String,

    /// Per-request timeout in seconds.
    #[arg(long, default_value_t = 60)]
    timeout_secs: u64,

    /// Accept invalid TLS certificates from the API.
    #[arg(long)]
    insecure: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    info!("qazlaw v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Command::Ingest(args) => cmd_ingest(&cli.db, args).await,
        Command::LinkCauses => cmd_link_causes(&cli.db),
        Command::Stats => cmd_stats(&cli.db),
        Command::Show { code } => cmd_show(&cli.db, &code),
    }
}

fn open_store(db: &Path) -> anyhow::Result<DuckStore> {
    DuckStore::open_persistent(db).with_context(|| format!("opening {}", db.display()))
}

fn open_existing(db: &Path) -> anyhow::Result<DuckStore> {
    let store = open_store(db)?;
    if !store.has_tables() {
        bail!("no corpus in {}; run `qazlaw ingest` first", db.display());
    }
    Ok(store)
}

async fn cmd_ingest(db: &Path, args: IngestArgs) -> anyhow::Result<ExitCode> {
    let store = open_store(db)?;
    store
        .init_schema(args.recreate)
        .context("creating corpus tables")?;

    let client = ZanClient::new(ClientConfig {
        base_url: args.api_url,
        timeout: Duration::from_secs(args.timeout_secs),
        accept_invalid_certs: args.insecure,
        ..ClientConfig::default()
    })
    .context("building HTTP client")?;

    let mut excluded_codes: Vec<String> = TROUBLED_CODES.iter().map(|c| c.to_string()).collect();
    excluded_codes.extend(args.exclude);
    let act_types = if args.act_types.is_empty() {
        ActTypeCode::INGESTED.to_vec()
    } else {
        args.act_types
    };
    let config = IngestConfig {
        start_page: args.start_page,
        page_size: args.page_size,
        concurrency: args.concurrency,
        page_delay: Duration::from_millis(args.page_delay_ms),
        act_types,
        excluded_codes,
        keep_going: args.keep_going,
    };

    let coordinator = Coordinator::new(Arc::new(client), config);
    let cancel = coordinator.cancellation();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received; finishing in-flight acts");
            cancel.cancel();
        }
    });

    let report = coordinator.run(&store).await.context("ingestion run")?;
    display::print_run_report(&report);
    if let Some(page) = report.resume_page {
        eprintln!("  Resume with: qazlaw ingest --start-page {page}");
    }

    if args.link_causes && report.status != RunStatus::Interrupted {
        let links = link_causes(&store).context("linking causes")?;
        display::print_link_report(&links);
    }

    Ok(ExitCode::from(report.status.exit_code()))
}

fn cmd_link_causes(db: &Path) -> anyhow::Result<ExitCode> {
    let store = open_existing(db)?;
    let report = link_causes(&store).context("linking causes")?;
    display::print_link_report(&report);
    Ok(ExitCode::SUCCESS)
}

fn cmd_stats(db: &Path) -> anyhow::Result<ExitCode> {
    let store = open_existing(db)?;
    let stats = store.stats().context("counting rows")?;
    display::print_stats(&stats);
    Ok(ExitCode::SUCCESS)
}

fn cmd_show(db: &Path, code: &str) -> anyhow::Result<ExitCode> {
    let store = open_existing(db)?;
    let Some(stored) = store.find_act(code).context("reading act")? else {
        bail!("act {code} not found in {}", db.display());
    };
    let versions = store
        .versions_for_act(stored.id)
        .context("reading versions")?;
    display::print_act_card(&stored, &versions);
    Ok(ExitCode::SUCCESS)
}
