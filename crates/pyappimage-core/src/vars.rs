use std::path::Path;

use crate::paths::BuildPaths;

/// Named placeholders (`$BUILD`, `$APPIMAGE`, ...) and their resolved values.
///
/// Substitution is a literal find/replace of `$NAME` for every known name.
/// Unknown `$TOKENS` are left as-is and there is no escape syntax, so a
/// literal `$BUILD` in a value is always replaced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VariableContext {
    // longest name first, so `$APPDIR` can never eat the head of `$APPDIRS`
    vars: Vec<(String, String)>,
}

impl VariableContext {
    pub fn new<I, K, V>(vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut vars: Vec<(String, String)> = vars
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        vars.sort_by(|a, b| b.0.len().cmp(&a.0.len()));
        Self { vars }
    }

    /// The context of one build.
    ///
    /// `appdir` is the value of the `APPDIR` environment variable at
    /// startup (empty when unset).
    pub fn for_build(paths: &BuildPaths, cwd: &Path, appdir: &str) -> Self {
        Self::new([
            ("APPDIR", appdir.to_owned()),
            ("BUILD", paths.build_dir.display().to_string()),
            ("CWD", cwd.display().to_string()),
            ("ROOT", "/".to_owned()),
            ("APPIMAGE", paths.dist_dir.display().to_string()),
        ])
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Whether `s` holds `$NAME` for at least one known name.
    pub fn contains_placeholder(&self, s: &str) -> bool {
        s.contains('$') && self.vars.iter().any(|(k, _)| s.contains(&format!("${k}")))
    }

    pub fn substitute(&self, s: &str) -> String {
        if !self.contains_placeholder(s) {
            return s.to_owned();
        }
        self.vars.iter().fold(s.to_owned(), |acc, (k, v)| {
            acc.replace(&format!("${k}"), v)
        })
    }
}
