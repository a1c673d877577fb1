//! Update command - replace this binary with the latest release

use crate::config::Config;
use crate::error::CsResult;
use crate::process::ProcessRunner;
use crate::ui::{self, TaskSpinner, UiContext};
use crate::update::{
    current_self_path, Fetcher, Platform, ReleaseSource, RetryPolicy, UpdateOutcome,
    UpdateRequest, UpdateStage, Updater,
};
use std::env;

/// Build the update request from config, environment and the running binary
pub fn request(config: &Config) -> CsResult<UpdateRequest> {
    let source = ReleaseSource::resolve(
        &config.update,
        env::var("CS_REPO_OWNER").ok(),
        env::var("CS_REPO_NAME").ok(),
    )?;

    Ok(UpdateRequest {
        current_version: env!("CARGO_PKG_VERSION").to_string(),
        source,
        platform: Platform::detect(),
        target: current_self_path(),
        digest: config.update.digest,
        retry: RetryPolicy::new(config.update.max_attempts),
    })
}

/// Execute the update command
pub fn execute(
    config: &Config,
    fetcher: &dyn Fetcher,
    runner: &dyn ProcessRunner,
) -> CsResult<()> {
    let request = request(config)?;
    let ctx = UiContext::detect();

    ui::intro(&ctx, "cs update");
    let mut spinner = TaskSpinner::new(&ctx);
    let mut last_stage = None;
    let result = Updater::new(fetcher, runner).run(&request, &mut |stage| {
        last_stage = Some(stage);
        spinner.step(&stage.to_string())
    });

    match result {
        Ok(UpdateOutcome::UpToDate { current, .. }) => {
            spinner.stop(&format!("cs {} already up to date", current));
            ui::outro_success(&ctx, "Nothing to do");
            Ok(())
        }
        Ok(UpdateOutcome::Updated { to, path, method, .. }) => {
            spinner.stop(&format!("Updated to cs {}", to));
            ui::remark(&ctx, &format!("{} ({:?})", path.display(), method));
            ui::outro_success(&ctx, "Update complete");
            Ok(())
        }
        // main prints the error itself
        Err(e) => {
            spinner.stop_error(&failure_line(last_stage));
            Err(e)
        }
    }
}

/// Spinner summary for a failed update, naming the stage it stopped in
fn failure_line(stage: Option<UpdateStage>) -> String {
    match stage {
        Some(stage) => format!(
            "Update failed ({})",
            stage.to_string().trim_end_matches('.')
        ),
        None => "Update failed".to_string(),
    }
}
