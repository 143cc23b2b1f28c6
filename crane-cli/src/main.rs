use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;

mod commands;
mod render;

#[derive(Parser)]
#[command(name = "crane")]
#[command(about = "Profile-aware front end for Docker Swarm", long_about = None)]
struct Cli {
    /// Path to the project configuration file
    #[arg(long, global = true, default_value = crane_core::config::DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Profile to use (falls back to $CRANE_PROFILE, then the configured default)
    #[arg(short, long, global = true)]
    profile: Option<String>,

    /// Print the invocation plan without executing it
    #[arg(long, global = true)]
    dry_run: bool,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage the swarm itself
    #[command(subcommand)]
    Swarm(SwarmCommands),

    /// Manage swarm services
    #[command(subcommand)]
    Service(ServiceCommands),

    /// Manage swarm stacks
    #[command(subcommand)]
    Stack(StackCommands),

    /// Manage swarm nodes
    #[command(subcommand)]
    Node(NodeCommands),
}

/// Selector pair shared by the service commands.
#[derive(Args)]
struct SelectorOpts {
    /// Services separated by comma
    #[arg(long)]
    services: Option<String>,

    /// Target every service declared by the profile
    #[arg(long)]
    all: bool,
}

/// Raw options forwarded to the docker CLI verbatim.
#[derive(Args)]
struct PassthroughOpt {
    /// Options for the backend command, e.g. `--options "--advertise-addr 192.168.1.1"`
    #[arg(long, default_value = "", allow_hyphen_values = true)]
    options: String,
}

#[derive(Subcommand)]
enum SwarmCommands {
    /// Initialize a swarm on the current engine
    Init {
        #[command(flatten)]
        passthrough: PassthroughOpt,
    },

    /// Join a swarm as a node and/or manager
    Join {
        #[command(flatten)]
        passthrough: PassthroughOpt,
    },
}

#[derive(Args)]
struct LogsOpts {
    /// Stack whose name prefixes the services
    #[arg(long)]
    stack: Option<String>,

    /// Show extra details provided to logs
    #[arg(long)]
    details: bool,

    /// Follow log output
    #[arg(long)]
    follow: bool,

    /// Do not map IDs to names in output
    #[arg(long)]
    no_resolve: bool,

    /// Do not include task IDs in output
    #[arg(long)]
    no_task_ids: bool,

    /// Do not truncate output
    #[arg(long)]
    no_trunc: bool,

    /// Do not neatly format logs
    #[arg(long)]
    raw: bool,

    /// Show logs since timestamp or relative time (e.g. 42m)
    #[arg(long)]
    since: Option<String>,

    /// Number of lines to show from the end of the logs
    #[arg(long)]
    tail: Option<String>,

    /// Show timestamps
    #[arg(long)]
    timestamps: bool,
}

#[derive(Args)]
struct UpdateOpts {
    /// Exit immediately instead of waiting for the service to converge
    #[arg(long)]
    detach: bool,

    /// Suppress progress output
    #[arg(long)]
    quiet: bool,

    /// Force update even if no changes require it
    #[arg(long)]
    force: bool,

    /// Roll back to the previous specification
    #[arg(long)]
    rollback: bool,

    /// Service image tag
    #[arg(long)]
    image: Option<String>,

    /// Number of tasks
    #[arg(long)]
    replicas: Option<String>,

    /// Add/update env vars (comma-separated NAME=VALUE list)
    #[arg(long)]
    env_add: Option<String>,

    /// Add/update service labels (comma-separated key=value list)
    #[arg(long)]
    label_add: Option<String>,
}

#[derive(Subcommand)]
enum ServiceCommands {
    /// Create a new service (all parameters via --options)
    Create {
        #[command(flatten)]
        passthrough: PassthroughOpt,
    },

    /// Display detailed information on one or more services
    Inspect {
        #[command(flatten)]
        selector: SelectorOpts,
        #[command(flatten)]
        passthrough: PassthroughOpt,
    },

    /// Fetch the logs of services
    Logs {
        #[command(flatten)]
        selector: SelectorOpts,
        #[command(flatten)]
        opts: LogsOpts,
        #[command(flatten)]
        passthrough: PassthroughOpt,
    },

    /// List services
    Ls {
        #[command(flatten)]
        passthrough: PassthroughOpt,
    },

    /// List the tasks of services
    Ps {
        #[command(flatten)]
        selector: SelectorOpts,
        #[command(flatten)]
        passthrough: PassthroughOpt,
    },

    /// Remove services
    Rm {
        #[command(flatten)]
        selector: SelectorOpts,
        #[command(flatten)]
        passthrough: PassthroughOpt,
    },

    /// Revert services to their previous configuration
    Rollback {
        #[command(flatten)]
        selector: SelectorOpts,

        /// Stack whose deployed services are targeted
        #[arg(long)]
        stack: Option<String>,

        /// Exit immediately instead of waiting for the service to converge
        #[arg(long)]
        detach: bool,

        /// Suppress progress output
        #[arg(long)]
        quiet: bool,

        #[command(flatten)]
        passthrough: PassthroughOpt,
    },

    /// Scale replicated services
    Scale {
        #[command(flatten)]
        selector: SelectorOpts,

        /// Stack whose name prefixes the services
        #[arg(long)]
        stack: Option<String>,

        /// Replicas per service (comma-separated service=replicas pairs)
        #[arg(long)]
        replicas: String,

        /// Exit immediately instead of waiting for the services to converge
        #[arg(long)]
        detach: bool,

        #[command(flatten)]
        passthrough: PassthroughOpt,
    },

    /// Update services
    Update {
        #[command(flatten)]
        selector: SelectorOpts,
        #[command(flatten)]
        opts: UpdateOpts,
        #[command(flatten)]
        passthrough: PassthroughOpt,
    },
}

#[derive(Subcommand)]
enum StackCommands {
    /// Deploy a stack from a compose file
    Deploy {
        /// Stack name
        stack: String,

        /// Compose file (overrides the one from the profile)
        #[arg(short, long)]
        file: Option<PathBuf>,

        #[command(flatten)]
        passthrough: PassthroughOpt,
    },

    /// List the tasks in the stack
    Ls {
        /// Stack name
        stack: String,

        /// Only display IDs
        #[arg(long)]
        quiet: bool,

        #[command(flatten)]
        passthrough: PassthroughOpt,
    },

    /// List the tasks in the stack
    Ps {
        /// Stack name
        stack: String,

        /// Only display IDs
        #[arg(long)]
        quiet: bool,

        #[command(flatten)]
        passthrough: PassthroughOpt,
    },

    /// Remove the stack from the swarm
    Rm {
        /// Stack name
        stack: String,

        #[command(flatten)]
        passthrough: PassthroughOpt,
    },
}

#[derive(Args)]
struct NodeSelectorOpt {
    /// Nodes separated by comma
    #[arg(long)]
    nodes: Option<String>,
}

#[derive(Subcommand)]
enum NodeCommands {
    /// Demote one or more nodes from manager in the swarm
    Demote {
        #[command(flatten)]
        selector: NodeSelectorOpt,
        #[command(flatten)]
        passthrough: PassthroughOpt,
    },

    /// Display detailed information on one or more nodes
    Inspect {
        #[command(flatten)]
        selector: NodeSelectorOpt,
        #[command(flatten)]
        passthrough: PassthroughOpt,
    },

    /// List nodes in the swarm
    Ls {
        #[command(flatten)]
        passthrough: PassthroughOpt,
    },

    /// Promote one or more nodes to manager in the swarm
    Promote {
        #[command(flatten)]
        selector: NodeSelectorOpt,
        #[command(flatten)]
        passthrough: PassthroughOpt,
    },

    /// List tasks running on one or more nodes
    Ps {
        #[command(flatten)]
        selector: NodeSelectorOpt,
        #[command(flatten)]
        passthrough: PassthroughOpt,
    },

    /// Remove one or more nodes from the swarm
    Rm {
        #[command(flatten)]
        selector: NodeSelectorOpt,
        #[command(flatten)]
        passthrough: PassthroughOpt,
    },

    /// Update a node
    Update {
        #[command(flatten)]
        selector: NodeSelectorOpt,
        #[command(flatten)]
        passthrough: PassthroughOpt,
    },
}

fn init_tracing(verbose: bool) {
    use tracing_subscriber::EnvFilter;
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let ctx = commands::Context {
        config_path: cli.config,
        profile: cli.profile,
        dry_run: cli.dry_run,
    };

    let code = match dispatch(cli.command, &ctx).await {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{} {:#}", "✗".red().bold(), err);
            // Validation and environment failures, distinct from the
            // partial-failure codes 1 and 2.
            3
        }
    };
    std::process::exit(code);
}

async fn dispatch(command: Commands, ctx: &commands::Context) -> Result<i32> {
    use crane_core::Verb;

    match command {
        Commands::Swarm(cmd) => match cmd {
            SwarmCommands::Init { passthrough } => {
                commands::swarm::run(ctx, Verb::Init, &passthrough.options).await
            }
            SwarmCommands::Join { passthrough } => {
                commands::swarm::run(ctx, Verb::Join, &passthrough.options).await
            }
        },

        Commands::Service(cmd) => match cmd {
            ServiceCommands::Create { passthrough } => {
                commands::service::create(ctx, &passthrough.options).await
            }
            ServiceCommands::Inspect { selector, passthrough } => {
                commands::service::targeted(ctx, Verb::Inspect, &selector, &passthrough.options)
                    .await
            }
            ServiceCommands::Logs { selector, opts, passthrough } => {
                commands::service::logs(ctx, &selector, &opts, &passthrough.options).await
            }
            ServiceCommands::Ls { passthrough } => {
                commands::service::ls(ctx, &passthrough.options).await
            }
            ServiceCommands::Ps { selector, passthrough } => {
                commands::service::targeted(ctx, Verb::Ps, &selector, &passthrough.options).await
            }
            ServiceCommands::Rm { selector, passthrough } => {
                commands::service::targeted(ctx, Verb::Rm, &selector, &passthrough.options).await
            }
            ServiceCommands::Rollback { selector, stack, detach, quiet, passthrough } => {
                commands::service::rollback(
                    ctx,
                    &selector,
                    stack.as_deref(),
                    detach,
                    quiet,
                    &passthrough.options,
                )
                .await
            }
            ServiceCommands::Scale { selector, stack, replicas, detach, passthrough } => {
                commands::service::scale(
                    ctx,
                    &selector,
                    stack.as_deref(),
                    &replicas,
                    detach,
                    &passthrough.options,
                )
                .await
            }
            ServiceCommands::Update { selector, opts, passthrough } => {
                commands::service::update(ctx, &selector, &opts, &passthrough.options).await
            }
        },

        Commands::Stack(cmd) => match cmd {
            StackCommands::Deploy { stack, file, passthrough } => {
                commands::stack::deploy(ctx, &stack, file, &passthrough.options).await
            }
            StackCommands::Ls { stack, quiet, passthrough }
            | StackCommands::Ps { stack, quiet, passthrough } => {
                commands::stack::tasks(ctx, &stack, quiet, &passthrough.options).await
            }
            StackCommands::Rm { stack, passthrough } => {
                commands::stack::rm(ctx, &stack, &passthrough.options).await
            }
        },

        Commands::Node(cmd) => match cmd {
            NodeCommands::Demote { selector, passthrough } => {
                commands::node::targeted(ctx, Verb::Demote, &selector, &passthrough.options).await
            }
            NodeCommands::Inspect { selector, passthrough } => {
                commands::node::targeted(ctx, Verb::Inspect, &selector, &passthrough.options).await
            }
            NodeCommands::Ls { passthrough } => {
                commands::node::ls(ctx, &passthrough.options).await
            }
            NodeCommands::Promote { selector, passthrough } => {
                commands::node::targeted(ctx, Verb::Promote, &selector, &passthrough.options).await
            }
            NodeCommands::Ps { selector, passthrough } => {
                commands::node::targeted(ctx, Verb::Ps, &selector, &passthrough.options).await
            }
            NodeCommands::Rm { selector, passthrough } => {
                commands::node::targeted(ctx, Verb::Rm, &selector, &passthrough.options).await
            }
            NodeCommands::Update { selector, passthrough } => {
                commands::node::targeted(ctx, Verb::Update, &selector, &passthrough.options).await
            }
        },
    }
}
