//! Host and tool settings, resolved once from the environment.

use std::path::{Path, PathBuf};

/// Set by the AppImage runtime when pyappimage itself runs from an AppImage.
pub const ENV_APPIMAGE: &str = "APPIMAGE";
/// pip command to use when running from an AppImage.
pub const ENV_PIP: &str = "PYAPPIMAGE_PIP";
pub const ENV_PYINSTALLER: &str = "PYAPPIMAGE_PYINSTALLER";
/// Use this appimagetool instead of downloading one.
pub const ENV_APPIMAGETOOL: &str = "PYAPPIMAGE_APPIMAGETOOL";
pub const ENV_APPDIR: &str = "APPDIR";

const PYTHON: &str = "python3";

/// A program plus the arguments that always precede the per-call ones,
/// e.g. `python3 -m pip`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl ToolCommand {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// `<python> -m <module>`
    pub fn python_module(python: &Path, module: &str) -> Self {
        Self {
            program: python.display().to_string(),
            args: vec!["-m".to_owned(), module.to_owned()],
        }
    }

    /// Split a command line with POSIX shell quoting, so
    /// `"/opt/my python/bin/python3" -m pip` keeps the path whole.
    ///
    /// `None` when blank or when a quote is left open.
    pub fn parse(line: &str) -> Option<Self> {
        let Some(words) = split_words(line) else {
            tracing::warn!(line, "unterminated quote in tool command; using the default");
            return None;
        };
        let mut parts = words.into_iter();
        let program = parts.next()?;
        Some(Self {
            program,
            args: parts.collect(),
        })
    }

    /// Leading arguments followed by `extra`.
    pub fn argv(&self, extra: impl IntoIterator<Item = String>) -> Vec<String> {
        self.args.iter().cloned().chain(extra).collect()
    }
}

/// Where the external tools live and what the host supports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolSettings {
    pub python: PathBuf,
    pub pip: ToolCommand,
    pub pyinstaller: ToolCommand,
    /// Explicit appimagetool; `None` means provision the release build.
    pub appimagetool: Option<PathBuf>,
    /// Value substituted for `$APPDIR`.
    pub appdir: String,
    /// Without FUSE the packed tool must extract itself to run.
    pub has_fuse: bool,
}

impl ToolSettings {
    /// Read the process environment and `PATH`.
    ///
    /// # Errors
    ///
    /// [`Error::ExecutableNotFound`](crate::Error::ExecutableNotFound) when `python3` is not on `PATH`.
    pub fn from_env() -> crate::Result<Self> {
        let python = which::which(PYTHON).map_err(|e| crate::Error::ExecutableNotFound {
            name: PYTHON.to_owned(),
            source: e,
        })?;
        let has_fuse = detect_fuse(
            Path::new("/.dockerenv").exists(),
            which::which("fusermount").is_ok(),
        );
        Ok(Self::resolve(
            python,
            // arch-lint: allow(no-silent-result-drop) reason="an unset or non-UTF-8 variable means the default applies"
            |key| std::env::var(key).ok(),
            has_fuse,
        ))
    }

    /// Resolve from an explicit python path and variable lookup.
    pub fn resolve(
        python: PathBuf,
        env: impl Fn(&str) -> Option<String>,
        has_fuse: bool,
    ) -> Self {
        let in_appimage = env(ENV_APPIMAGE).is_some_and(|v| !v.is_empty());
        let pip = in_appimage
            .then(|| env(ENV_PIP))
            .flatten()
            .and_then(|line| ToolCommand::parse(&line))
            .unwrap_or_else(|| ToolCommand::python_module(&python, "pip"));
        let pyinstaller = env(ENV_PYINSTALLER)
            .and_then(|line| ToolCommand::parse(&line))
            .unwrap_or_else(|| ToolCommand::python_module(&python, "PyInstaller"));
        let appimagetool = env(ENV_APPIMAGETOOL)
            .filter(|v| !v.is_empty())
            .map(PathBuf::from);

        let settings = Self {
            pip,
            pyinstaller,
            appimagetool,
            appdir: env(ENV_APPDIR).unwrap_or_default(),
            has_fuse,
            python,
        };
        tracing::debug!(?settings, "tool settings resolved");
        settings
    }
}

/// POSIX-style word splitting. Inside double quotes a backslash only escapes
/// `"`, `\`, `$` and `` ` ``; outside quotes it escapes any character.
fn split_words(line: &str) -> Option<Vec<String>> {
    let mut words = Vec::new();
    let mut word: Option<String> = None;
    let mut chars = line.chars();

    while let Some(c) = chars.next() {
        match c {
            c if c.is_whitespace() => {
                if let Some(done) = word.take() {
                    words.push(done);
                }
            }
            '\'' => {
                let current = word.get_or_insert_with(String::new);
                loop {
                    match chars.next()? {
                        '\'' => break,
                        c => current.push(c),
                    }
                }
            }
            '"' => {
                let current = word.get_or_insert_with(String::new);
                loop {
                    match chars.next()? {
                        '"' => break,
                        '\\' => match chars.next()? {
                            c @ ('"' | '\\' | '$' | '`') => current.push(c),
                            '\n' => {}
                            c => {
                                current.push('\\');
                                current.push(c);
                            }
                        },
                        c => current.push(c),
                    }
                }
            }
            '\\' => {
                if let Some(next) = chars.next() {
                    if next != '\n' {
                        word.get_or_insert_with(String::new).push(next);
                    }
                }
            }
            c => word.get_or_insert_with(String::new).push(c),
        }
    }
    words.extend(word);
    Some(words)
}

/// Docker containers never get FUSE; elsewhere `fusermount` is taken as proof.
fn detect_fuse(in_docker: bool, has_fusermount: bool) -> bool {
    if in_docker {
        tracing::info!("detected Docker container; assuming no FUSE");
        return false;
    }
    has_fusermount
}
