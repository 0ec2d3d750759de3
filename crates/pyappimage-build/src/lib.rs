//! AppDir templates, staging, and the build pipeline for pyappimage.
//!
//! # Build pipeline
//!
//! ```text
//! pyappimage build
//!   1. Init        ── split pyappimage.json, translate PyInstaller options
//!   2. Entrypoint  ── EntrypointGenerator::render() → <name>.AppDir.BUILD/entrypoint.py
//!   3. Install     ── pip install --prefix=<build> <project> [+ requirements]
//!   4. Freeze      ── PyInstaller --onedir → <name>.AppDir/<name>/<name>
//!   5. Stage       ── icon, appdata, desktop entry, extra data, AppRun
//!   6. Prune       ── drop libz.so.1 and ignore-binaries matches
//!   7. Pack        ── appimagetool <name>.AppDir <name>-<arch>.AppImage
//! ```
//!
//! Every tool run is recorded in a log file inside the build directory:
//! `PIP.log`, `PIP_REQ.log`, `PYINSTALLER.log`, `DIST.log`.
//!
//! # Ejected templates
//!
//! `pyappimage eject` writes the desktop entry and `AppRun` into
//! `pyappimage/`. When present they are copied into the AppDir verbatim.

pub mod apprun;
pub mod desktop;
pub mod eject;
pub mod entrypoint;
pub mod logs;
pub mod pipeline;
pub mod stage;

pub use apprun::AppRunGenerator;
pub use desktop::DesktopEntryGenerator;
pub use entrypoint::EntrypointGenerator;
pub use pipeline::{BuildError, BuildOutcome, BuildRequest, BuildStatus, Pipeline};
