mod commands;

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use commands::{
    EXIT_FAILURE, EXIT_NODE_FILE_ERROR, EXIT_RUNTIME_ERROR, NODE_FILE_PREFIX, RUNTIME_PREFIX,
};
use std::path::PathBuf;
use std::process::ExitCode;
use vrlab_core::install_signal_handler;
use vrlab_runtime::CancelToken;

#[derive(Debug, Parser)]
#[command(
    name = "vrlab",
    version,
    about = "Deploy and tear down VM-based network OS nodes in containers"
)]
struct Cli {
    /// Output results as structured JSON.
    #[arg(long, default_value_t = false, global = true)]
    json: bool,

    /// Enable verbose (debug) logging output.
    #[arg(short, long, default_value_t = false, global = true)]
    verbose: bool,

    /// Enable trace-level logging (more detailed than --verbose).
    #[arg(long, default_value_t = false, global = true)]
    trace: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Stage the startup config, then create and start the node container.
    Deploy {
        /// Path to the node TOML file.
        #[arg(default_value = "node.toml")]
        node_file: PathBuf,
        /// Container runtime backend (docker or mock).
        #[arg(long, default_value = "docker")]
        runtime: String,
        /// Give up on runtime calls after this many seconds.
        #[arg(long)]
        timeout: Option<u64>,
        /// Fail the deploy if the startup config cannot be rendered.
        #[arg(long, default_value_t = false)]
        strict_render: bool,
    },
    /// Remove the node container.
    Destroy {
        /// Path to the node TOML file.
        #[arg(default_value = "node.toml")]
        node_file: PathBuf,
        /// Container runtime backend (docker or mock).
        #[arg(long, default_value = "docker")]
        runtime: String,
    },
    /// Show the prepared node spec without deploying.
    Inspect {
        /// Path to the node TOML file.
        #[arg(default_value = "node.toml")]
        node_file: PathBuf,
        /// Also query this runtime (docker or mock) for the container state.
        #[arg(long)]
        runtime: Option<String>,
    },
    /// List the images a node needs.
    Images {
        /// Path to the node TOML file.
        #[arg(default_value = "node.toml")]
        node_file: PathBuf,
    },
    /// List registered node kinds and their default credentials.
    Kinds,
    /// Run diagnostic checks on the host.
    Doctor {
        /// Container runtime backend to check.
        #[arg(long, default_value = "docker")]
        runtime: String,
    },
    /// Generate shell completions for bash, zsh, fish, elvish, or powershell.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}

fn main() -> ExitCode {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let msg = info.to_string();
        if msg.contains("Broken pipe")
            || msg.contains("broken pipe")
            || msg.contains("os error 32")
            || msg.contains("failed printing to stdout")
        {
            std::process::exit(0);
        }
        default_hook(info);
    }));

    let cli = Cli::parse();

    let default_level = if cli.trace {
        "trace"
    } else if cli.verbose {
        "debug"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_env("VRLAB_LOG")
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    let cancel = CancelToken::new();
    install_signal_handler(cancel.clone());

    let json_output = cli.json;
    let skip_prereqs = std::env::var("VRLAB_SKIP_PREREQS").as_deref() == Ok("1");

    if let Commands::Deploy { runtime, .. } | Commands::Destroy { runtime, .. } = &cli.command {
        if !skip_prereqs {
            let missing = vrlab_runtime::check_runtime_prereqs(runtime);
            if !missing.is_empty() {
                eprintln!("error: {}", vrlab_runtime::format_missing(&missing));
                return ExitCode::from(EXIT_FAILURE);
            }
        }
    }

    let result = match cli.command {
        Commands::Deploy {
            node_file,
            runtime,
            timeout,
            strict_render,
        } => commands::deploy::run(
            &commands::deploy::DeployArgs {
                node_file: &node_file,
                runtime: &runtime,
                timeout,
                strict_render,
                skip_prereqs,
            },
            &cancel,
            json_output,
        ),
        Commands::Destroy { node_file, runtime } => {
            commands::destroy::run(&node_file, &runtime, &cancel, json_output)
        }
        Commands::Inspect { node_file, runtime } => commands::inspect::run(
            &node_file,
            runtime.as_deref(),
            &cancel,
            json_output,
        ),
        Commands::Images { node_file } => commands::images::run(&node_file, json_output),
        Commands::Kinds => commands::kinds::run(json_output),
        Commands::Doctor { runtime } => commands::doctor::run(&runtime, json_output),
        Commands::Completions { shell } => commands::completions::run::<Cli>(shell),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(msg) => {
            eprintln!("error: {msg}");
            let code = if msg.starts_with(NODE_FILE_PREFIX) {
                EXIT_NODE_FILE_ERROR
            } else if msg.starts_with(RUNTIME_PREFIX) {
                EXIT_RUNTIME_ERROR
            } else {
                EXIT_FAILURE
            };
            ExitCode::from(code)
        }
    }
}
