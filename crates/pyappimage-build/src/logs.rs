use pyappimage_tools::ToolOutput;
use std::path::{Path, PathBuf};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

pub const PIP_LOG: &str = "PIP.log";
pub const PIP_REQ_LOG: &str = "PIP_REQ.log";
pub const PYINSTALLER_LOG: &str = "PYINSTALLER.log";
pub const DIST_LOG: &str = "DIST.log";

const SEPARATOR: &str =
    "--------------------------------------------------------------------------------\n";

/// One tool run as written to a build log.
#[derive(Debug, Clone)]
pub struct BuildLogRecord<'a> {
    pub title: &'a str,
    pub started_at: Option<&'a str>,
    pub output: &'a ToolOutput,
}

impl<'a> BuildLogRecord<'a> {
    pub fn new(title: &'a str, output: &'a ToolOutput) -> Self {
        Self {
            title,
            started_at: None,
            output,
        }
    }

    pub fn started_at(mut self, at: &'a str) -> Self {
        self.started_at = Some(at);
        self
    }

    pub fn render(&self) -> String {
        let mut log = format!("PyAppImage v{}\n", env!("CARGO_PKG_VERSION"));
        if let Some(at) = self.started_at {
            log.push_str(&format!("Build started at {at}\n"));
        }
        log.push_str(SEPARATOR);
        log.push_str(self.title);
        log.push('\n');
        log.push_str(&self.output.stdout);
        log.push_str("\n\n");
        log.push_str(SEPARATOR);
        log.push_str(&self.output.stderr);
        log.push_str(&format!("Build exited with {}\n", self.output.exit_code()));
        log
    }

    /// Overwrites `path` with the rendered record.
    pub fn write(&self, path: &Path) -> Result<PathBuf, LogError> {
        std::fs::write(path, self.render()).map_err(|e| LogError {
            path: path.to_path_buf(),
            source: e,
        })?;
        Ok(path.to_path_buf())
    }
}

/// Current UTC time, RFC 3339.
pub fn timestamp() -> String {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_else(|_| OffsetDateTime::now_utc().unix_timestamp().to_string())
}

#[derive(Debug, thiserror::Error)]
#[error("failed to write build log {path}")]
pub struct LogError {
    pub path: PathBuf,
    pub source: std::io::Error,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn output() -> ToolOutput {
        ToolOutput {
            stdout: "Successfully installed demo-1.0\n".to_owned(),
            stderr: "WARNING: running as root\n".to_owned(),
            code: Some(0),
        }
    }

    #[test]
    fn layout_without_start_time() {
        let out = output();
        let log = BuildLogRecord::new("PIP LOGS:", &out).render();
        let expected = format!(
            "PyAppImage v{v}\n{SEPARATOR}PIP LOGS:\nSuccessfully installed demo-1.0\n\n\n{SEPARATOR}WARNING: running as root\nBuild exited with 0\n",
            v = env!("CARGO_PKG_VERSION")
        );
        assert_eq!(log, expected);
    }

    #[test]
    fn start_time_follows_banner() {
        let out = output();
        let log = BuildLogRecord::new("BUILD LOGS", &out)
            .started_at("2024-01-01T00:00:00Z")
            .render();
        let mut lines = log.lines();
        assert!(lines.next().unwrap().starts_with("PyAppImage v"));
        assert_eq!(lines.next().unwrap(), "Build started at 2024-01-01T00:00:00Z");
    }

    #[test]
    fn killed_process_reports_minus_one() {
        let out = ToolOutput {
            stdout: String::new(),
            stderr: String::new(),
            code: None,
        };
        assert!(BuildLogRecord::new("X", &out).render().ends_with("Build exited with -1\n"));
    }

    #[test]
    fn write_overwrites() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join(DIST_LOG);
        std::fs::write(&path, "stale").unwrap();

        let out = output();
        BuildLogRecord::new("BUILD LOGS", &out).write(&path).unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        assert!(!written.contains("stale"));
        assert!(written.contains("Build exited with 0"));
    }

    #[test]
    fn timestamp_is_rfc3339() {
        let ts = timestamp();
        assert!(ts.contains('T') && ts.ends_with('Z'), "got: {ts}");
    }
}
