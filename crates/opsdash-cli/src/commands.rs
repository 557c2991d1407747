use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{debug, info, info_span, trace};

use opsdash_cli::cli::{Cli, InitArgs, MappingSource, MappingsArgs, SalesArgs, ServeArgs};
use opsdash_cli::logging::redact_value;
use opsdash_cli::summary::{jobs_table, mappings_table, sales_tables};
use opsdash_model::{MappingSet, SageConfig, SetupConfig};
use opsdash_report::{sales_report_rows, summarize, write_sales_csv};
use opsdash_scheduler::{JobRegistry, Scheduler, SchedulerConfig};
use opsdash_source::OdbcConnector;
use opsdash_store::{LocalStore, Passphrase};
use opsdash_sync::{SyncRun, run_sage_sync, sage_mappings};

fn passphrase(cli: &Cli) -> Result<Passphrase> {
    Passphrase::from_env(&cli.passphrase_env).context("read database passphrase")
}

fn open_store(cli: &Cli) -> Result<LocalStore> {
    let passphrase = passphrase(cli)?;
    LocalStore::open(&cli.database, &passphrase)
        .with_context(|| format!("open {}", cli.database.display()))
}

fn load_mappings(source: &MappingSource) -> Result<MappingSet> {
    match source.mappings.as_deref() {
        Some(path) => MappingSet::from_json_file(path)
            .with_context(|| format!("load mappings from {}", path.display())),
        None => sage_mappings().context("build Sage mappings"),
    }
}

pub fn run_init(cli: &Cli, args: &InitArgs) -> Result<()> {
    let passphrase = passphrase(cli)?;
    let password = std::env::var(&args.sage_password_env)
        .with_context(|| format!("read Sage password from ${}", args.sage_password_env))?;
    debug!(
        server = redact_value(&args.server),
        user = redact_value(&args.sage_user),
        dsn = %args.dsn,
        "creating store"
    );
    let setup = SetupConfig {
        sage: SageConfig {
            dsn: args.dsn.clone(),
            company_code: args.company.clone(),
            server: args.server.clone(),
            database: args.sage_database.clone(),
            username: args.sage_user.clone(),
            password,
        },
        sieve_defaults: args.sieves.clone(),
        samples: args.samples.clone(),
    };
    let store = LocalStore::create(&cli.database, &passphrase, &setup)
        .with_context(|| format!("create {}", cli.database.display()))?;
    let jobs = store.jobs().context("list jobs")?;
    store.close().context("close store")?;
    println!(
        "Created {} with {} scheduled job(s)",
        cli.database.display(),
        jobs.len()
    );
    Ok(())
}

pub fn run_sync(cli: &Cli, source: &MappingSource) -> Result<SyncRun> {
    let passphrase = passphrase(cli)?;
    let mappings = load_mappings(source)?;
    let connector = OdbcConnector::default();
    run_sage_sync(&cli.database, &passphrase, &connector, &mappings).context("sync")
}

pub fn run_serve(cli: &Cli, args: &ServeArgs) -> Result<()> {
    let passphrase = Arc::new(passphrase(cli)?);
    let mappings = load_mappings(&args.source)?;
    let registry = {
        let store = LocalStore::open(&cli.database, &passphrase)
            .with_context(|| format!("open {}", cli.database.display()))?;
        let registry = JobRegistry::from_store(&store).context("load scheduled jobs")?;
        store.close().context("close store")?;
        registry
    };

    let config = SchedulerConfig {
        job_timeout: Duration::from_secs(args.job_timeout),
        first_run_delay: Duration::from_secs(args.first_run_delay),
        ..SchedulerConfig::new(&cli.database)
    };
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("start async runtime")?;

    runtime.block_on(async move {
        let mut scheduler = Scheduler::new(
            config,
            registry,
            Arc::new(OdbcConnector::default()),
            mappings,
            passphrase,
        );
        let started = scheduler.start();
        if started == 0 {
            info!("no enabled jobs; waiting for a shutdown signal anyway");
        }
        println!("Scheduler running {started} job(s); press Ctrl-C to stop");
        let signal = wait_for_shutdown_signal().await;
        scheduler.stop().await;
        signal
    })
}

async fn wait_for_shutdown_signal() -> Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};
        let mut sigterm = signal(SignalKind::terminate()).context("register SIGTERM")?;
        let mut sigint = signal(SignalKind::interrupt()).context("register SIGINT")?;
        tokio::select! {
            _ = sigterm.recv() => info!("SIGTERM received"),
            _ = sigint.recv() => info!("SIGINT received"),
        }
    }
    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await.context("wait for Ctrl-C")?;
        info!("Ctrl-C received");
    }
    Ok(())
}

pub fn run_jobs(cli: &Cli) -> Result<()> {
    let store = open_store(cli)?;
    let jobs = store.jobs().context("list jobs")?;
    println!("{}", jobs_table(&jobs));
    Ok(())
}

pub fn run_mappings(args: &MappingsArgs) -> Result<()> {
    let mappings = load_mappings(&args.source)?;
    if args.json {
        let json = serde_json::to_string_pretty(&mappings).context("serialize mappings")?;
        println!("{json}");
    } else {
        println!("{}", mappings_table(&mappings));
    }
    Ok(())
}

pub fn run_sales_report(cli: &Cli, args: &SalesArgs) -> Result<()> {
    let span = info_span!("sales_report", start = %args.start, end = %args.end);
    let _guard = span.enter();
    let store = open_store(cli)?;
    let rows = sales_report_rows(&store, args.start, args.end).context("query sales lines")?;
    info!(lines = rows.len(), "sales lines loaded");
    for row in &rows {
        trace!(
            order = %row.sales_order_no,
            customer = redact_value(row.customer_name.as_deref().unwrap_or_default()),
            item = redact_value(row.item_code_desc.as_deref().unwrap_or_default()),
            "sales line"
        );
    }

    if let Some(path) = &args.csv {
        export_csv(path, &rows)?;
        println!("Wrote {} line(s) to {}", rows.len(), path.display());
    }

    let summary = summarize(&rows);
    let (items, years) = sales_tables(&summary);
    println!(
        "Sales {} to {}: {} line(s)",
        args.start,
        args.end,
        rows.len()
    );
    println!("{items}");
    println!("{years}");
    Ok(())
}

fn export_csv(path: &Path, rows: &[opsdash_report::SalesReportRow]) -> Result<()> {
    let file = File::create(path).with_context(|| format!("create {}", path.display()))?;
    write_sales_csv(rows, BufWriter::new(file))
        .with_context(|| format!("write {}", path.display()))
}
