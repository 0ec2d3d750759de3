//! Translation of pass-through options into PyInstaller flags.

use crate::value::{ConfigValue, PassThrough};
use crate::vars::VariableContext;

/// Output directory option. The orchestrator decides where the bundle
/// goes, so this key is dropped whatever its value.
pub const RESERVED_DIST_KEY: &str = "distpath";

/// Turn pass-through options into command-line flags, in config order.
///
/// | value          | flags                      |
/// |----------------|----------------------------|
/// | `true`         | `--key`                    |
/// | `false`        | none                       |
/// | `null`         | error                      |
/// | `[a, b]`       | `--key=a`, `--key=b`       |
/// | `"v"`          | `--key=v`                  |
///
/// String values have their `$NAME` placeholders substituted.
pub fn translate(options: &PassThrough, vars: &VariableContext) -> crate::Result<Vec<String>> {
    let mut flags = Vec::with_capacity(options.len());

    for (key, value) in options.iter() {
        if key == RESERVED_DIST_KEY {
            tracing::debug!(key, "ignoring reserved option");
            continue;
        }
        match value {
            ConfigValue::Bool(true) => flags.push(format!("--{key}")),
            ConfigValue::Bool(false) => {}
            ConfigValue::Null => return Err(crate::Error::invalid(key, "null")),
            ConfigValue::List(items) => flags.extend(
                items
                    .iter()
                    .map(|item| format!("--{key}={}", vars.substitute(item))),
            ),
            ConfigValue::Scalar(s) => flags.push(format!("--{key}={}", vars.substitute(s))),
        }
    }

    Ok(flags)
}
