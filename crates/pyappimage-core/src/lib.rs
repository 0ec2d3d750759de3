//! Core types and configuration for pyappimage.
//!
//! This crate defines the `pyappimage.json` schema ([`BuildConfig`] and its
//! split into [`AppConfig`] + [`PassThrough`]), `$NAME` substitution
//! ([`VariableContext`]), the PyInstaller flag translator
//! ([`params::translate`]), build directory layout, and shared error types.

pub mod config;
pub mod error;
pub mod params;
pub mod paths;
pub mod project;
pub mod settings;
pub mod value;
pub mod vars;

pub use config::{AppConfig, BuildConfig, EntryPoint, LocatedConfig};
pub use error::{Error, Result};
pub use paths::BuildPaths;
pub use project::{DescriptorKind, PythonProject};
pub use settings::{ToolCommand, ToolSettings};
pub use value::{ConfigValue, PassThrough};
pub use vars::VariableContext;
