/// File name of the launcher at the AppDir root.
pub const APPRUN_FILE: &str = "AppRun";

const HEADER: &str = r#"#! /bin/bash

# Export APPRUN if running from an extracted image
self="$(readlink -f -- $0)"
here="${self%/*}"
APPDIR="${APPDIR:-${here}}"

export LD_LIBRARY_PATH="$APPDIR:${APPDIR}/usr/lib:${APPDIR}/usr/local/lib:${LD_LIBRARY_PATH}"
export PYAPPIMAGE="TRUE"

if [ -z "$LC_ALL" ]
then
        export LC_ALL=C.UTF-8
fi

if [ -z "$LANG" ]
then
        export LANG=C.UTF-8
fi
"#;

/// Generates the `AppRun` launcher that sets up the environment and execs
/// the frozen binary.
pub struct AppRunGenerator<'a> {
    binary: &'a str,
    environment: &'a [(String, String)],
}

impl<'a> AppRunGenerator<'a> {
    /// `binary` is the product name; the frozen binary lives at
    /// `$APPDIR/<binary>/<binary>`.
    pub fn new(binary: &'a str, environment: &'a [(String, String)]) -> Self {
        Self {
            binary,
            environment,
        }
    }

    pub fn render(&self) -> String {
        let mut script = HEADER.to_owned();

        if !self.environment.is_empty() {
            script.push('\n');
            for (key, value) in self.environment {
                // double quotes keep `$APPDIR` references expandable
                script.push_str(&format!("export {key}=\"{}\"\n", value.replace('"', "\\\"")));
            }
        }

        script.push_str(&format!(
            "\nexec \"${{APPDIR}}/{bin}/{bin}\" \"$@\"\n",
            bin = self.binary
        ));
        script
    }
}
