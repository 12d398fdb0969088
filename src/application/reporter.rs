//! User-facing progress reporting.
//!
//! Services report through the [`Reporter`] trait instead of printing, so
//! the CLI decides how messages look and tests can capture them.

use colored::Colorize;

/// Width of the banner rule printed above outcome messages.
const RULE_WIDTH: usize = 80;

/// Sink for progress and outcome messages.
pub trait Reporter {
    /// A step is about to run.
    fn step(&self, message: &str);
    /// The operation succeeded.
    fn success(&self, message: &str);
    /// The operation failed.
    fn failure(&self, message: &str);
    /// One entry of a listing.
    fn item(&self, message: &str);
    /// Follow-up advice.
    fn hint(&self, message: &str);
}

/// Coloured terminal output.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleReporter;

impl Reporter for ConsoleReporter {
    fn step(&self, message: &str) {
        println!("{}", message.yellow().bold());
    }

    fn success(&self, message: &str) {
        println!();
        println!("{}", "=".repeat(RULE_WIDTH).green().bold());
        println!("{}", message.green().bold());
    }

    fn failure(&self, message: &str) {
        eprintln!();
        eprintln!("{}", "=".repeat(RULE_WIDTH).red().bold());
        eprintln!("{}", message.red().bold());
    }

    fn item(&self, message: &str) {
        println!("  {}", message.cyan());
    }

    fn hint(&self, message: &str) {
        println!("{}", message.white().bold());
    }
}
