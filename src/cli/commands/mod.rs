//! CLI command implementations

pub mod run;
pub mod update;

pub use run::execute as run;
pub use update::execute as update;
