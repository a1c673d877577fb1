//! Terminal detection for choosing fancy or plain output

use std::io::IsTerminal;

/// Environment variables that mark a CI run
const CI_VARS: &[&str] = &[
    "CI",
    "GITHUB_ACTIONS",
    "GITLAB_CI",
    "CIRCLECI",
    "TRAVIS",
    "JENKINS_URL",
    "BUILDKITE",
    "TEAMCITY_VERSION",
    "TF_BUILD",
];

/// Decides whether output may use spinners and cliclack framing
#[derive(Debug, Clone, Copy)]
pub struct UiContext {
    interactive: bool,
}

impl UiContext {
    /// Detect from the real terminal and environment
    pub fn detect() -> Self {
        let tty = std::io::stdout().is_terminal() && std::io::stderr().is_terminal();
        Self::from_parts(tty, |var| std::env::var_os(var).is_some())
    }

    /// Plain output regardless of the terminal
    pub fn non_interactive() -> Self {
        Self { interactive: false }
    }

    fn from_parts(tty: bool, is_set: impl Fn(&str) -> bool) -> Self {
        let interactive = tty && !CI_VARS.iter().any(|var| is_set(var));
        Self { interactive }
    }

    /// Whether spinners and cliclack framing are allowed
    pub fn use_fancy_output(&self) -> bool {
        self.interactive
    }
}
