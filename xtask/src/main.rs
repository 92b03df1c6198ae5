use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::process::{Command, Stdio};

#[derive(Parser)]
#[command(name = "xtask")]
#[command(about = "Hardware-wallet relay task runner", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the extension wasm bundle
    Build {
        /// Build without optimizations
        #[arg(long)]
        dev: bool,

        /// wasm-pack output directory (relative to extension/)
        #[arg(short, long, default_value = "pkg")]
        out_dir: String,
    },

    /// Run tests
    Test {
        #[command(subcommand)]
        test_type: Option<TestType>,
    },

    /// Run clippy linter
    Clippy,

    /// Remove build output
    Clean,
}

#[derive(Subcommand)]
enum TestType {
    /// Relay core only
    Core,

    /// Run all Rust tests
    Unit,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Build { dev, out_dir } => build(dev, &out_dir),
        Commands::Test { test_type } => test(test_type),
        Commands::Clippy => clippy(),
        Commands::Clean => clean(),
    }
}

fn build(dev: bool, out_dir: &str) -> Result<()> {
    println!("🔨 Building extension wasm bundle...");
    let profile = if dev { "--dev" } else { "--release" };
    run_cmd(
        "wasm-pack",
        &[
            "build",
            "extension",
            profile,
            "--target",
            "no-modules",
            "--out-dir",
            out_dir,
        ],
    )?;
    println!("✅ Bundle written to extension/{}", out_dir);
    Ok(())
}

fn test(test_type: Option<TestType>) -> Result<()> {
    match test_type {
        Some(TestType::Core) => {
            println!("🧪 Testing relay core...");
            run_cmd("cargo", &["test", "-p", "hw-relay-core"])?;
        }
        Some(TestType::Unit) | None => {
            println!("🧪 Running all tests...");
            run_cmd("cargo", &["test", "--workspace"])?;
        }
    }
    Ok(())
}

fn clippy() -> Result<()> {
    println!("🔍 Running clippy on workspace (warnings as errors)...");
    run_cmd(
        "cargo",
        &[
            "clippy",
            "--workspace",
            "--all-targets",
            "--",
            "-D",
            "warnings",
        ],
    )?;
    Ok(())
}

fn clean() -> Result<()> {
    println!("🧹 Removing build output...");
    run_cmd("cargo", &["clean"])?;

    // Ignore error if the bundle was never built
    let _ = std::fs::remove_dir_all("extension/pkg");

    Ok(())
}

fn run_cmd(program: &str, args: &[&str]) -> Result<()> {
    let status = Command::new(program)
        .args(args)
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .status()
        .with_context(|| format!("Failed to run: {} {}", program, args.join(" ")))?;

    if !status.success() {
        anyhow::bail!("Command failed: {} {}", program, args.join(" "));
    }

    Ok(())
}
