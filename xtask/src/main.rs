use anyhow::Result;
use clap::{Parser, Subcommand};
use std::process::Command;

#[derive(Parser)]
#[command(name = "xtask", about = "Workspace automation for backdrop")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run fmt, clippy, tests, docs and the headless smoke run
    Check,
    /// Run cargo fmt --check on all crates
    Fmt,
    /// Run clippy on all crates
    Clippy,
    /// Run all tests
    Test,
    /// Build rustdoc for the workspace
    Doc,
    /// Mount and unmount both scenes headlessly through backdrop-cli
    Smoke,
}

/// One cargo invocation and the message shown when it fails.
struct Step {
    banner: &'static str,
    args: &'static [&'static str],
}

const FMT: Step = Step {
    banner: "cargo fmt --check",
    args: &["fmt", "--all", "--", "--check"],
};
const CLIPPY: Step = Step {
    banner: "cargo clippy",
    args: &["clippy", "--workspace", "--all-targets", "--", "-D", "warnings"],
};
const TEST: Step = Step {
    banner: "cargo test",
    args: &["test", "--workspace"],
};
const DOC: Step = Step {
    banner: "cargo doc",
    args: &["doc", "--workspace", "--no-deps"],
};
const SMOKE: &[Step] = &[
    Step {
        banner: "simulate particles",
        args: &[
            "run", "-q", "-p", "backdrop-cli", "--", "simulate", "--scene", "particles",
            "--frames", "30", "--seed", "1",
        ],
    },
    Step {
        banner: "simulate cubes",
        args: &[
            "run", "-q", "-p", "backdrop-cli", "--", "simulate", "--scene", "cubes",
            "--frames", "30", "--seed", "1", "--pointer", "1160,440",
        ],
    },
];

fn run(step: &Step) -> Result<()> {
    println!("==> Running {}", step.banner);
    let status = Command::new("cargo").args(step.args).status()?;
    if !status.success() {
        anyhow::bail!("{} failed", step.banner);
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Check => {
            for step in [&FMT, &CLIPPY, &TEST, &DOC].into_iter().chain(SMOKE) {
                run(step)?;
            }
        }
        Commands::Fmt => run(&FMT)?,
        Commands::Clippy => run(&CLIPPY)?,
        Commands::Test => run(&TEST)?,
        Commands::Doc => run(&DOC)?,
        Commands::Smoke => SMOKE.iter().try_for_each(run)?,
    }

    Ok(())
}
