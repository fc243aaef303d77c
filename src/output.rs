//! Console formatting for the `check` command and fatal errors.
//!
//! Log output goes through `tracing`; this module is only for the
//! human-facing report printed by the readiness check.

use colored::*;

/// Prints report lines with consistent styling.
///
/// - Success messages (green with ✓)
/// - Error messages (red with ✗)
/// - Warning messages (yellow with ⚠)
/// - Info messages (cyan)
pub struct OutputFormatter;

impl OutputFormatter {
    /// Prints a success message in green with a checkmark.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use tidywatch::output::OutputFormatter;
    /// OutputFormatter::success("Folder exists: Images");
    /// ```
    pub fn success(message: &str) {
        println!("{} {}", "✓".green(), message);
    }

    /// Prints an error message in red with an X mark.
    pub fn error(message: &str) {
        eprintln!("{} {}", "✗".red(), message);
    }

    /// Prints a warning message in yellow with a warning symbol.
    pub fn warning(message: &str) {
        println!("{} {}", "⚠".yellow(), message);
    }

    /// Prints an info message in cyan.
    pub fn info(message: &str) {
        println!("{}", message.cyan());
    }

    /// Prints a section header.
    pub fn header(header: &str) {
        println!("\n{}", header.bold());
    }

    /// Prints the final tally of a check run.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use tidywatch::output::OutputFormatter;
    /// OutputFormatter::check_summary(4, 4);
    /// ```
    pub fn check_summary(passed: usize, total: usize) {
        println!("{}", "=".repeat(50));
        let tally = format!("{}/{}", passed, total);
        let tally = if passed == total {
            tally.green().bold()
        } else {
            tally.red().bold()
        };
        println!("Check results: {} checks passed", tally);

        if passed == total {
            Self::success("Ready. Run `tidywatch` to start organizing.");
        } else {
            Self::error("Some checks failed. Fix the issues above and run the check again.");
        }
    }
}
