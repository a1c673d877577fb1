//! Terminal output for interactive commands
//!
//! Uses `cliclack` framing and spinners on a terminal and falls back to
//! plain lines in CI or when output is piped.
//!
//! ```rust,ignore
//! use cs::ui::{self, TaskSpinner, UiContext};
//!
//! let ctx = UiContext::detect();
//! ui::intro(&ctx, "cs update");
//!
//! let mut spinner = TaskSpinner::new(&ctx);
//! spinner.step("Checking for updates...");
//! spinner.stop("Updated to cs 1.5.0");
//!
//! ui::outro_success(&ctx, "Done");
//! ```

mod context;
mod output;
mod progress;

pub use context::UiContext;
pub use output::{intro, outro_success, remark};
pub use progress::TaskSpinner;
