mod build;
mod doctor;
mod eject;
mod init;

/// Directory holding the config and ejected templates when not kept at the
/// project root.
pub(crate) const CONFIG_DIR: &str = "pyappimage";

pub use build::build;
pub use doctor::doctor;
pub use eject::eject;
pub use init::init_project;
