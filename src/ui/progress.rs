//! Spinner with a plain-text fallback

use super::context::UiContext;
use console::style;

/// A spinner for a multi-step task.
///
/// Interactive terminals get a cliclack spinner whose message follows
/// each step; elsewhere every step prints one line.
pub struct TaskSpinner {
    spinner: Option<cliclack::ProgressBar>,
    interactive: bool,
}

impl TaskSpinner {
    pub fn new(ctx: &UiContext) -> Self {
        Self {
            spinner: None,
            interactive: ctx.use_fancy_output(),
        }
    }

    /// Show `message` as the current step
    pub fn step(&mut self, message: &str) {
        if !self.interactive {
            println!("{} {}", style("...").dim(), message);
            return;
        }
        let spinner = self.spinner.get_or_insert_with(cliclack::spinner);
        spinner.start(message);
    }

    /// Stop with success message
    pub fn stop(&mut self, message: &str) {
        match self.spinner.take() {
            Some(spinner) => spinner.stop(message),
            None if self.interactive => println!("{} {}", style("✓").green(), message),
            None => println!("{} {}", style("[OK]").green(), message),
        }
    }

    /// Stop with error message
    pub fn stop_error(&mut self, message: &str) {
        match self.spinner.take() {
            Some(spinner) => spinner.error(message),
            None if self.interactive => println!("{} {}", style("✗").red(), message),
            None => println!("{} {}", style("[FAIL]").red(), message),
        }
    }
}
