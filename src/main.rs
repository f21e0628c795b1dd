use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use workvisor::{
    current_entry, App, CenterConfig, CliControl, ControlCenter, Hostname, InitConfig, Nodes,
    PersistPolicy, RunConfig, ENTRY_ENV,
};

#[derive(Parser, Debug)]
#[command(name = "workvisor")]
#[command(about = "Control plane for task-queue worker processes", long_about = None)]
struct Cli {
    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Text, global = true)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Start the persisted workers and supervise them until interrupted
    Run(RunArgs),
    /// Print the command a worker would be launched with
    Command(CommandArgs),
}

#[derive(Args, Debug)]
struct AppArgs {
    /// Application selector passed as `-A`
    #[arg(long)]
    app_name: String,

    /// Program (and leading arguments) launching the framework CLI
    #[arg(long, default_value = "celery")]
    entrypoint: String,
}

impl AppArgs {
    fn entrypoint(&self) -> Vec<String> {
        self.entrypoint.split_whitespace().map(str::to_string).collect()
    }
}

#[derive(Args, Debug)]
struct RunArgs {
    #[command(flatten)]
    app: AppArgs,

    /// Initial configuration, used when the state file is absent
    #[arg(long)]
    init_cfg: Option<PathBuf>,

    /// State file the working configuration is loaded from and saved to
    #[arg(long)]
    cfg_path: Option<PathBuf>,

    /// Seconds a new worker gets to answer a ping (0 waits forever)
    #[arg(long, default_value = "0")]
    ready_timeout: u64,

    /// When the working configuration is written to the state file
    #[arg(long, value_enum, default_value_t = Persist::OnTerminate)]
    persist: Persist,

    /// Seconds nodes are given to answer control requests
    #[arg(long, default_value = "1")]
    control_timeout: u64,
}

#[derive(Args, Debug)]
struct CommandArgs {
    #[command(flatten)]
    app: AppArgs,

    /// Node name or `node@host`
    #[arg(long)]
    node: String,

    /// Worker options as a JSON object
    #[arg(long, default_value = "{}")]
    config: String,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum LogFormat {
    Text,
    Json,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Persist {
    OnTerminate,
    OnChange,
}

impl From<Persist> for PersistPolicy {
    fn from(p: Persist) -> Self {
        match p {
            Persist::OnTerminate => PersistPolicy::OnTerminate,
            Persist::OnChange => PersistPolicy::OnChange,
        }
    }
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into());
    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Text => registry
            .with(tracing_subscriber::fmt::layer().with_target(false))
            .init(),
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
    }
}

fn build_app(args: &AppArgs, reply_timeout: Duration) -> App {
    let entrypoint = args.entrypoint();
    let control = CliControl::new(entrypoint.clone(), args.app_name.as_str())
        .with_reply_timeout(reply_timeout);
    App::new(args.app_name.as_str(), Arc::new(control)).with_entrypoint(entrypoint)
}

async fn run(args: RunArgs) -> anyhow::Result<()> {
    let app = build_app(&args.app, Duration::from_secs(args.control_timeout));
    let cfg = CenterConfig {
        init_cfg: args.init_cfg.map(InitConfig::Path),
        cfg_path: args.cfg_path,
        persist: args.persist.into(),
        ready_timeout: Duration::from_secs(args.ready_timeout),
        ..CenterConfig::default()
    };

    let mut center = ControlCenter::builder(app, cfg)
        .build()
        .context("loading worker configuration")?;
    if let Err(err) = center.start(true).await {
        tracing::error!(error = %err, label = err.as_label(), "run aborted; killing launched workers");
        center.kill(Nodes::All).await.context("killing launched workers")?;
        return Err(err.into());
    }
    tracing::info!("all workers stopped");
    Ok(())
}

/// This binary has no branch entry points; a child launched for one must not
/// fall through to the normal commands.
fn reject_branch_entry(entry: Option<String>) -> anyhow::Result<()> {
    match entry {
        Some(entry) => anyhow::bail!("{ENTRY_ENV}={entry:?} names no entry point of workvisor"),
        None => Ok(()),
    }
}

fn print_command(args: CommandArgs) -> anyhow::Result<()> {
    let app = build_app(&args.app, workvisor::DEFAULT_REPLY_TIMEOUT);
    let config: RunConfig =
        serde_json::from_str(&args.config).context("--config must be a JSON object")?;
    let hostname = Hostname::canonical(&args.node);
    println!("{}", app.full_command(&config.worker_command(&hostname)).join(" "));
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    reject_branch_entry(current_entry())?;
    let cli = Cli::parse();
    init_tracing(cli.log_format);

    match cli.command {
        Cmd::Run(args) => run(args).await,
        Cmd::Command(args) => print_command(args),
    }
}
