#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("failed to run {program}; is it installed?")]
    NotFound {
        program: String,
        source: std::io::Error,
    },

    #[error("failed to collect output of {program}")]
    Wait {
        program: String,
        source: std::io::Error,
    },
}
