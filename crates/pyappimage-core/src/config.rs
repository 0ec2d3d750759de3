use std::path::{Path, PathBuf};

use serde_json::{Map, Value};

use crate::value::{ConfigValue, PassThrough};

/// File names searched, in order, inside each config directory.
pub const CONFIG_FILES: &[&str] = &["pyappimage.json", "pyappimage.toml"];

/// Directories (relative to the project root) searched for a config file.
pub const CONFIG_DIRS: &[&str] = &[".", "pyappimage"];

const DEFAULT_NAME: &str = "Python";
const DEFAULT_DESCRIPTION: &str = "Python app generated using PyAppImage";

/// Keys consumed by the orchestrator. None of them is forwarded to the
/// freezing tool.
pub const OWNED_KEYS: &[&str] = &[
    "entrypoint",
    "name",
    "generic-name",
    "description",
    "ignore-binaries",
    "categories",
    "requirements",
    "data",
    "environment",
    "updateinformation",
    "halt-on-freeze-failure",
];

/// `pyappimage.json` as written by the user, keys in file order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BuildConfig {
    entries: Map<String, Value>,
}

/// A config file together with the directory it was found in.
///
/// Icons, appdata, and ejected templates are looked up next to the config.
#[derive(Debug, Clone)]
pub struct LocatedConfig {
    pub config: BuildConfig,
    pub path: PathBuf,
    pub dir: PathBuf,
}

impl BuildConfig {
    /// Build from a JSON object literal. Non-object values yield an empty config.
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(entries) => Self { entries },
            _ => Self::default(),
        }
    }

    /// Load a config file, choosing the parser by extension.
    pub fn load(path: &Path) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| crate::Error::ConfigLoad {
            path: path.to_path_buf(),
            source: e,
        })?;

        let value: Value = if path.extension().is_some_and(|ext| ext == "toml") {
            toml::from_str(&content).map_err(|e| crate::Error::ConfigParseToml {
                path: path.to_path_buf(),
                source: e,
            })?
        } else {
            serde_json::from_str(&content).map_err(|e| crate::Error::ConfigParse {
                path: path.to_path_buf(),
                source: e,
            })?
        };

        match value {
            Value::Object(entries) => Ok(Self { entries }),
            _ => Err(crate::Error::ConfigNotMapping {
                path: path.to_path_buf(),
            }),
        }
    }

    /// Find and load the config under `project_dir`.
    ///
    /// Searches `./` then `./pyappimage/`, JSON before TOML.
    pub fn discover(project_dir: &Path) -> crate::Result<LocatedConfig> {
        let mut searched = Vec::new();
        for dir in CONFIG_DIRS {
            let dir = project_dir.join(dir);
            if !dir.is_dir() {
                continue;
            }
            for file in CONFIG_FILES {
                let path = dir.join(file);
                if path.is_file() {
                    tracing::debug!(path = %path.display(), "loading config");
                    let config = Self::load(&path)?;
                    return Ok(LocatedConfig { config, path, dir });
                }
                searched.push(path);
            }
        }
        Err(crate::Error::ConfigNotFound { searched })
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    /// Split into orchestrator-owned fields and the pass-through residue.
    ///
    /// `self` is left untouched; owned keys never appear in the residue.
    pub fn split(&self) -> crate::Result<(AppConfig, PassThrough)> {
        let entrypoint = match self.entries.get("entrypoint") {
            None | Some(Value::Null) => return Err(crate::Error::MissingEntrypoint),
            Some(Value::String(s)) => EntryPoint::parse(s)?,
            Some(_) => return Err(crate::Error::invalid("entrypoint", "expected a string")),
        };

        let name = self.string_or("name", DEFAULT_NAME)?;
        let generic_name = self.string_or("generic-name", &name)?;
        let app = AppConfig {
            entrypoint,
            description: self.string_or("description", DEFAULT_DESCRIPTION)?,
            ignore_binaries: self.list("ignore-binaries")?,
            categories: self.list("categories")?,
            requirements: self.list("requirements")?,
            data: self.mapping("data")?,
            environment: self.mapping("environment")?,
            update_information: self.optional_string("updateinformation")?,
            halt_on_freeze_failure: self.flag("halt-on-freeze-failure")?,
            name,
            generic_name,
        };

        let residue = self
            .entries
            .iter()
            .filter(|(k, _)| !OWNED_KEYS.contains(&k.as_str()))
            .map(|(k, v)| ConfigValue::from_json(k, v).map(|cv| (k.clone(), cv)))
            .collect::<crate::Result<PassThrough>>()?;

        Ok((app, residue))
    }

    fn optional_string(&self, key: &str) -> crate::Result<Option<String>> {
        match self.entries.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(s)) if s.is_empty() => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.clone())),
            Some(_) => Err(crate::Error::invalid(key, "expected a string")),
        }
    }

    fn string_or(&self, key: &str, default: &str) -> crate::Result<String> {
        Ok(self
            .optional_string(key)?
            .unwrap_or_else(|| default.to_owned()))
    }

    fn list(&self, key: &str) -> crate::Result<Vec<String>> {
        match self.entries.get(key) {
            None | Some(Value::Null) => Ok(Vec::new()),
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| {
                    item.as_str()
                        .map(str::to_owned)
                        .ok_or_else(|| crate::Error::invalid(key, "list items must be strings"))
                })
                .collect(),
            Some(_) => Err(crate::Error::invalid(key, "expected a list of strings")),
        }
    }

    fn mapping(&self, key: &str) -> crate::Result<Vec<(String, String)>> {
        match self.entries.get(key) {
            None | Some(Value::Null) => Ok(Vec::new()),
            Some(Value::Object(map)) => map
                .iter()
                .map(|(k, v)| match v {
                    Value::String(s) => Ok((k.clone(), s.clone())),
                    Value::Number(n) => Ok((k.clone(), n.to_string())),
                    Value::Bool(b) => Ok((k.clone(), b.to_string())),
                    _ => Err(crate::Error::invalid(key, format!("value of {k:?} must be a string"))),
                })
                .collect(),
            Some(_) => Err(crate::Error::invalid(key, "expected a mapping")),
        }
    }

    fn flag(&self, key: &str) -> crate::Result<bool> {
        match self.entries.get(key) {
            None => Ok(false),
            Some(Value::Bool(b)) => Ok(*b),
            Some(Value::Null) => Err(crate::Error::invalid(key, "null")),
            Some(_) => Err(crate::Error::invalid(key, "expected true or false")),
        }
    }
}

/// Orchestrator-owned settings extracted from a [`BuildConfig`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub entrypoint: EntryPoint,
    /// Product name; names the AppDir, the frozen binary, and the image.
    pub name: String,
    pub generic_name: String,
    pub description: String,
    /// Glob patterns of bundled libraries to delete after freezing.
    pub ignore_binaries: Vec<String>,
    pub categories: Vec<String>,
    /// Extra requirements installed next to the project.
    pub requirements: Vec<String>,
    /// Extra data, source → destination. Both sides may hold placeholders.
    pub data: Vec<(String, String)>,
    /// Variables exported by `AppRun`.
    pub environment: Vec<(String, String)>,
    pub update_information: Option<String>,
    /// Stop the build when the frozen binary is missing instead of
    /// packing whatever was produced.
    pub halt_on_freeze_failure: bool,
}

/// A `module:function` reference to the application's entry function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryPoint {
    pub module: String,
    pub function: String,
}

impl EntryPoint {
    pub fn parse(value: &str) -> crate::Result<Self> {
        let invalid = || crate::Error::InvalidEntrypoint {
            value: value.to_owned(),
        };
        let (module, function) = value.split_once(':').ok_or_else(invalid)?;
        let (module, function) = (module.trim(), function.trim());
        if module.is_empty() || function.is_empty() || function.contains(':') {
            return Err(invalid());
        }
        Ok(Self {
            module: module.to_owned(),
            function: function.to_owned(),
        })
    }

    /// The Python statement that imports and calls the entry function.
    pub fn call_statement(&self) -> String {
        format!(
            "from {module} import {func}; {func}()",
            module = self.module,
            func = self.function
        )
    }
}
