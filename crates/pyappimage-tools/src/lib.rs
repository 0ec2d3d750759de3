//! External tool invocation for pyappimage.
//!
//! Every subprocess goes through [`ToolExecutor`], so the build pipeline can
//! be driven by mocks in tests. [`ToolClient`] knows the argument layout of
//! each tool; [`Provisioner`] supplies the packing tool.

pub mod client;
pub mod executor;
pub mod provision;
pub mod tool;

pub use client::{
    CheckResult, DoctorReport, EXTRACT_AND_RUN_FLAG, FreezeRequest, PackRequest, PipTarget,
    ToolClient,
};
pub use executor::{RealExecutor, ToolExecutor, ToolOutput};
pub use provision::{APPIMAGETOOL, CONTINUOUS_TAG, ProvisionError, Provisioner, ReleaseProvisioner};
pub use tool::ToolError;
