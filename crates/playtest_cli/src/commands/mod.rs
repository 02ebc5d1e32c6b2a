//! CLI command definitions.
//!
//! This module defines the command structure for the playtest CLI.

use clap::{Parser, Subcommand};

pub mod run;

/// playtest - run named LLM function tests and report a suite verdict
#[derive(Parser)]
#[command(name = "playtest")]
#[command(version, about = "playtest - run named LLM function tests and report a suite verdict")]
#[command(long_about = r#"
playtest runs a set of named tests for one function against one runtime,
streams every test transition as it happens and folds the outcomes into a
single suite verdict (unknown, pass, warn or fail).

Tests are executed by a harness program. Each test spawns the harness with
the test name as its last argument; the harness reports partial responses
and the final status as JSON lines on stdout.

EXIT CODES:
  0 - Suite passed or warned
  1 - General error (including a rejected run)
  2 - Invalid arguments
  3 - Suite failed
"#)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Default log filter for the chosen verbosity.
    pub fn log_directive(&self) -> &'static str {
        if self.verbose {
            "playtest=debug"
        } else if self.quiet {
            "playtest=warn"
        } else {
            "playtest=info"
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run tests for a function and report the suite verdict
    Run(run::RunArgs),
}
