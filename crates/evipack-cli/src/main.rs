//! Evipack CLI - container verification, inspection, and packing.

use clap::{Parser, Subcommand};

mod commands;
mod output;

use commands::{inspect, keygen, list, pack, verify};

#[derive(Parser)]
#[command(name = "evipack")]
#[command(about = "Evidence container verification and inspection CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Verify containers under a path and report trust status
    Verify {
        /// Container file or directory to scan recursively
        path: String,
        /// Verify against this hex public key instead of the embedded one
        #[arg(long)]
        public_key: Option<String>,
        /// Fail (exit non-zero) when unsigned containers are found
        #[arg(long)]
        fail_on_unsigned: bool,
        /// Do not fail on tampered containers (advisory output only)
        #[arg(long)]
        no_fail_on_tampered: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show a container's members and manifest summary
    Inspect {
        /// Path to container file
        container: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List step records in a container
    List {
        /// Path to container file
        container: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
        /// Stop after printing N steps (default: unlimited)
        #[arg(long)]
        max_steps: Option<usize>,
    },
    /// Pack a steps.jsonl file into a container
    Pack {
        /// Input step log (one JSON step record per line)
        steps: String,
        /// Output container path
        #[arg(long)]
        out: String,
        /// Session/correlation id for the manifest
        #[arg(long, default_value = "manual")]
        session: String,
        /// Workflow name for the manifest
        #[arg(long, default_value = "manual-pack")]
        workflow: String,
        /// Hex-encoded Ed25519 signing key; omit to write unsigned
        #[arg(long)]
        sign_key: Option<String>,
    },
    /// Generate an Ed25519 keypair as hex files
    Keygen {
        /// Output path for the secret key (public key gets a .pub suffix)
        #[arg(long, default_value = "evipack.key")]
        out: String,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Verify {
            path,
            public_key,
            fail_on_unsigned,
            no_fail_on_tampered,
            json,
        } => verify::run(path, public_key, fail_on_unsigned, no_fail_on_tampered, json),
        Commands::Inspect { container, json } => inspect::run(container, json),
        Commands::List {
            container,
            json,
            max_steps,
        } => list::run(container, json, max_steps),
        Commands::Pack {
            steps,
            out,
            session,
            workflow,
            sign_key,
        } => pack::run(steps, out, session, workflow, sign_key),
        Commands::Keygen { out } => keygen::run(out),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
