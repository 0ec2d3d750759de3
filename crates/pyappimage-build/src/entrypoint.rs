use pyappimage_core::EntryPoint;

/// Argument that makes a packed app print how it was built and exit.
pub const INFO_FLAG: &str = "--pyappimage-info";

/// Where and with what a bundle was built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Provenance {
    pub tool_version: String,
    pub platform: String,
    pub python_runtime: String,
}

impl Provenance {
    /// Provenance of a build running on this host.
    pub fn host(python_runtime: impl Into<String>) -> Self {
        Self {
            tool_version: env!("CARGO_PKG_VERSION").to_owned(),
            platform: host_platform(),
            python_runtime: python_runtime.into(),
        }
    }
}

/// e.g. `linux-x86_64`
pub fn host_platform() -> String {
    format!(
        "{os}-{arch}",
        os = std::env::consts::OS,
        arch = std::env::consts::ARCH
    )
}

/// Generates the Python shim PyInstaller freezes in place of the user's script.
pub struct EntrypointGenerator<'a> {
    entrypoint: &'a EntryPoint,
    provenance: &'a Provenance,
}

impl<'a> EntrypointGenerator<'a> {
    pub fn new(entrypoint: &'a EntryPoint, provenance: &'a Provenance) -> Self {
        Self {
            entrypoint,
            provenance,
        }
    }

    pub fn render(&self) -> String {
        format!(
            r#"#!/usr/bin/env python3
# Generated by PyAppImage v{tool_version}. Rebuild instead of editing.
import sys

PYAPPIMAGE_VERSION = {version}
BUILD_PLATFORM = {platform}
BUILD_PYTHON = {python}


def _pyappimage_info():
    import platform
    print("PyAppImage", PYAPPIMAGE_VERSION)
    print("Built on", BUILD_PLATFORM, "with Python", BUILD_PYTHON)
    print("Running on", platform.platform(), "with Python", sys.version.splitlines()[0])


if __name__ == "__main__":
    if len(sys.argv) > 1 and sys.argv[1] == "{info_flag}":
        _pyappimage_info()
        sys.exit(0)
    {call}
"#,
            version = python_literal(&self.provenance.tool_version),
            platform = python_literal(&self.provenance.platform),
            python = python_literal(&self.provenance.python_runtime),
            tool_version = self.provenance.tool_version,
            info_flag = INFO_FLAG,
            call = self.entrypoint.call_statement(),
        )
    }
}

/// Double-quoted Python string literal; control characters use `\xNN` or
/// `\uNNNN` escapes.
fn python_literal(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() && u32::from(c) <= 0xff => {
                out.push_str(&format!("\\x{:02x}", u32::from(c)));
            }
            c if c.is_control() => out.push_str(&format!("\\u{:04x}", u32::from(c))),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}
