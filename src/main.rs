use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use hcctl::config::Config;
use hcctl::hypercore::{
    nodes, snapshot, tags, task, vms, Credentials, HyperCoreClient, ResourceKind, Session,
    SnapshotTarget, TagMethod, TaskTag, TokioClock, VmSelector,
};
use hcctl::hypercore::snapshot::SnapshotOutcome;
use hcctl::report;
use std::path::PathBuf;
use std::time::Duration;
use tracing::Level;
use tracing_subscriber::fmt::writer::MakeWriterExt;

/// Helpers for the HyperCore REST API
#[derive(Parser, Debug)]
#[command(name = "hcctl", version = hcctl::VERSION, about, long_about = None)]
struct Args {
    /// Cluster node address (any node in the cluster), or a full base URL
    #[arg(short, long, env = "HCCTL_ENDPOINT")]
    endpoint: Option<String>,

    /// Cluster username
    #[arg(short, long, env = "HCCTL_USERNAME")]
    username: Option<String>,

    /// Cluster password
    #[arg(long, env = "HCCTL_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Skip TLS certificate validation (lab clusters with self-signed certificates)
    #[arg(long)]
    insecure: bool,

    /// Remember the endpoint and username in the config file
    #[arg(long)]
    save: bool,

    /// Log level for debugging
    #[arg(long, value_enum, default_value = "off")]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List virtual machines and their state
    Vms,
    /// Show one virtual machine as JSON (name or uuid)
    Vm { selector: String },
    /// List nodes
    Nodes,
    /// Resolve a VM name or node LAN IP to a uuid
    Resolve {
        /// vm or node
        kind: String,
        identifier: String,
    },
    /// List VMs carrying a tag
    FindTag { tag: String },
    /// Change a VM's tags
    Tags {
        /// VM name or uuid
        selector: String,
        /// add, remove, group or manual
        method: String,
        value: String,
        /// Wait for the update task to finish
        #[arg(long)]
        wait: bool,
        /// Seconds to wait for the task
        #[arg(long, default_value_t = 300)]
        timeout: u64,
    },
    /// Snapshot VMs selected by uuid, name or tag
    Snapshot {
        /// uuid, name or tag
        kind: String,
        value: String,
        label: String,
        /// Wait for every snapshot task to finish
        #[arg(long)]
        wait: bool,
        /// Seconds to wait for each task
        #[arg(long, default_value_t = 300)]
        timeout: u64,
    },
    /// Wait for a task to finish
    Wait {
        tag: String,
        /// Seconds to wait
        #[arg(long, default_value_t = 300)]
        timeout: u64,
    },
    /// Write vmOverview.csv and nodeOverview.csv
    Inventory {
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Sample performance counters into vmPerf.csv and nodePerf.csv
    Perf {
        /// How long to sample, in hours
        #[arg(long, default_value_t = 6.0)]
        hours: f64,
        /// Seconds between samples (defaults to the config value)
        #[arg(long)]
        interval: Option<u64>,
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn to_tracing_level(self) -> Option<Level> {
        match self {
            LogLevel::Off => None,
            LogLevel::Error => Some(Level::ERROR),
            LogLevel::Warn => Some(Level::WARN),
            LogLevel::Info => Some(Level::INFO),
            LogLevel::Debug => Some(Level::DEBUG),
            LogLevel::Trace => Some(Level::TRACE),
        }
    }
}

fn setup_logging(level: LogLevel) -> Result<Option<tracing_appender::non_blocking::WorkerGuard>> {
    let Some(tracing_level) = level.to_tracing_level() else {
        return Ok(None);
    };

    let log_path = get_log_path();

    if let Some(parent) = log_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("Failed to open log file {}", log_path.display()))?;

    let (non_blocking, guard) = tracing_appender::non_blocking(file);

    tracing_subscriber::fmt()
        .with_max_level(tracing_level)
        .with_writer(non_blocking.with_max_level(tracing_level))
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!("hcctl started with log level: {:?}", level);
    tracing::info!("Log file: {:?}", log_path);

    Ok(Some(guard))
}

fn get_log_path() -> PathBuf {
    if let Some(config_dir) = dirs::config_dir() {
        return config_dir.join("hcctl").join("hcctl.log");
    }
    if let Some(home) = dirs::home_dir() {
        return home.join(".hcctl").join("hcctl.log");
    }
    PathBuf::from("hcctl.log")
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let _log_guard = setup_logging(args.log_level)?;

    let mut config = Config::load();
    let client_config = config.client_config(args.endpoint.as_deref(), args.insecure)?;
    let username = args
        .username
        .clone()
        .or_else(|| config.username.clone())
        .context("No username given. Use --username or set HCCTL_USERNAME")?;
    let password = args
        .password
        .clone()
        .context("No password given. Use --password or set HCCTL_PASSWORD")?;

    if args.save {
        config.set_defaults(&client_config.endpoint, &username)?;
    }

    let client = HyperCoreClient::new(client_config).context("Failed to create client")?;
    let session = client
        .login(&Credentials::new(&username, &password))
        .await
        .context("Login failed")?;

    let result = run(&client, &session, &config, args.command).await;

    // Sessions live for ~100 days unless closed, so always log out
    match client.logout(&session).await {
        Ok(true) => {}
        Ok(false) => eprintln!("Warning: logout was not accepted by the cluster"),
        Err(e) => eprintln!("Warning: logout failed: {e}"),
    }

    result
}

async fn run(
    client: &HyperCoreClient,
    session: &Session,
    config: &Config,
    command: Command,
) -> Result<()> {
    match command {
        Command::Vms => {
            for vm in vms::list_vms(client, session).await? {
                println!("{}\t{}", vm.name, vm.state);
            }
        }
        Command::Vm { selector } => {
            let vm = vms::get_vm(client, session, &VmSelector::detect(&selector)).await?;
            println!("{}", serde_json::to_string_pretty(&vm)?);
        }
        Command::Nodes => {
            for node in nodes::list_nodes(client, session).await? {
                println!("{}\t{}\t{}", node.lan_ip, node.uuid, node.backplane_ip);
            }
        }
        Command::Resolve { kind, identifier } => {
            let kind: ResourceKind = kind.parse()?;
            println!("{}", nodes::resolve_uuid(client, session, kind, &identifier).await?);
        }
        Command::FindTag { tag } => {
            for (name, uuid) in tags::find_by_tag(client, session, &tag).await? {
                println!("{}\t{}", name, uuid);
            }
        }
        Command::Tags {
            selector,
            method,
            value,
            wait,
            timeout,
        } => {
            let method: TagMethod = method.parse()?;
            let selector = VmSelector::detect(&selector);
            let task_tag = tags::change_tags(client, session, &selector, method, &value).await?;
            if wait {
                await_task(client, session, task_tag, timeout).await?;
            }
        }
        Command::Snapshot {
            kind,
            value,
            label,
            wait,
            timeout,
        } => {
            let target = SnapshotTarget::parse(&kind, &value)?;
            let outcomes = snapshot::snapshot(client, session, &target, &label).await?;
            let failed = report_snapshots(client, session, outcomes, wait.then_some(timeout)).await;
            if failed > 0 {
                tracing::warn!("{} snapshot(s) failed or did not complete", failed);
            }
        }
        Command::Wait { tag, timeout } => {
            await_task(client, session, Some(TaskTag(tag)), timeout).await?;
        }
        Command::Inventory { out } => {
            let out_dir = config.effective_output_dir(out.as_deref());
            report::write_inventory(client, session, &out_dir).await?;
            println!("Inventory written to {}", out_dir.display());
        }
        Command::Perf {
            hours,
            interval,
            out,
        } => {
            let out_dir = config.effective_output_dir(out.as_deref());
            let duration = hours_to_duration(hours)?;
            let interval = interval
                .map(|s| Duration::from_secs(s.max(1)))
                .unwrap_or_else(|| config.sample_interval());
            let samples = report::record_performance(
                client,
                session,
                &out_dir,
                duration,
                interval,
                &TokioClock,
            )
            .await?;
            println!("Recorded {} samples in {}", samples, out_dir.display());
        }
    }

    Ok(())
}

/// Print one line per snapshot and optionally wait on each task in turn
///
/// A failed snapshot or wait is reported and the remaining VMs are still
/// processed. Returns how many VMs failed.
async fn report_snapshots(
    client: &HyperCoreClient,
    session: &Session,
    outcomes: Vec<SnapshotOutcome>,
    wait_timeout: Option<u64>,
) -> usize {
    let mut failed = 0;
    for outcome in outcomes {
        let name = outcome.name.unwrap_or_else(|| outcome.uuid.clone());
        match outcome.result {
            Ok(task_tag) => {
                println!("{}\tsnapshot requested", name);
                if let Some(timeout) = wait_timeout {
                    if let Err(e) = await_task(client, session, task_tag, timeout).await {
                        eprintln!("{}\twait failed: {:#}", name, e);
                        failed += 1;
                    }
                }
            }
            Err(e) => {
                eprintln!("{}\tsnapshot failed: {}", name, e);
                failed += 1;
            }
        }
    }
    failed
}

/// Convert `--hours` into a sampling duration, rejecting negative and non-finite values
fn hours_to_duration(hours: f64) -> Result<Duration> {
    Duration::try_from_secs_f64(hours * 3600.0)
        .with_context(|| format!("Invalid --hours value: {}", hours))
}

async fn await_task(
    client: &HyperCoreClient,
    session: &Session,
    task_tag: Option<TaskTag>,
    timeout: u64,
) -> Result<()> {
    let Some(task_tag) = task_tag else {
        println!("No task was reported, nothing to wait for");
        return Ok(());
    };

    if task::wait_for_task(client, session, &task_tag, Duration::from_secs(timeout)).await? {
        println!("Task {} complete", task_tag);
        Ok(())
    } else {
        anyhow::bail!("Task {} finished with an error", task_tag)
    }
}
