//! CLI command handlers.
//!
//! Each submodule handles a specific CLI command:
//! - `run` - full lifecycle pass: select, build, rotate, regenerate menu
//! - `menu` - regenerate the boot menu from the retained set only
//! - `show` - display information
//! - `preflight` - check host tools and preconditions

pub mod menu;
pub mod preflight;
pub mod run;
pub mod show;

pub use menu::cmd_menu;
pub use preflight::cmd_preflight;
pub use run::cmd_run;
pub use show::cmd_show;
