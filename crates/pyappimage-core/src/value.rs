use serde_json::Value;

/// A pass-through option value, as handed to the flag translator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigValue {
    /// Explicit `null`. Rejected by the translator.
    Null,
    Bool(bool),
    List(Vec<String>),
    Scalar(String),
}

impl ConfigValue {
    /// Convert a JSON value found under `key`.
    ///
    /// Numbers become scalars. Mappings and nested lists are rejected:
    /// only `data` and `environment` may hold mappings, and those are
    /// consumed before pass-through conversion.
    pub fn from_json(key: &str, value: &Value) -> crate::Result<Self> {
        match value {
            Value::Null => Ok(Self::Null),
            Value::Bool(b) => Ok(Self::Bool(*b)),
            Value::String(s) => Ok(Self::Scalar(s.clone())),
            Value::Number(n) => Ok(Self::Scalar(n.to_string())),
            Value::Array(items) => items
                .iter()
                .map(|item| scalar_item(key, item))
                .collect::<crate::Result<Vec<_>>>()
                .map(Self::List),
            Value::Object(_) => Err(crate::Error::invalid(
                key,
                "mappings are only accepted for `data` and `environment`",
            )),
        }
    }
}

fn scalar_item(key: &str, item: &Value) -> crate::Result<String> {
    match item {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Null => Err(crate::Error::invalid(key, "null")),
        _ => Err(crate::Error::invalid(key, "list items must be strings")),
    }
}

/// Options not owned by the orchestrator, in config file order.
///
/// These are forwarded to the freezing tool as command-line flags.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PassThrough {
    entries: Vec<(String, ConfigValue)>,
}

impl PassThrough {
    pub fn get(&self, key: &str) -> Option<&ConfigValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ConfigValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, ConfigValue)> for PassThrough {
    fn from_iter<I: IntoIterator<Item = (K, ConfigValue)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}
