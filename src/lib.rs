//! # AmApi Bridge
//!
//! Diagnostic bridge for the AutoMapa native API module (`tpcAmApi`).
//!
//! ## Features
//!
//! - **Dynamic binding**: load/unload the native module at runtime with graceful fallback
//! - **Struct marshaling**: byte-exact `CVersionInfo` / `ApiInitOptions` layouts
//! - **Call gating**: every entry point fails fast with `NotBound` until a module is loaded
//! - **Diagnostics**: a probe sweep that exercises each entry point and reports the results
//!
//! ### Example
//!
//! ```ignore
//! use amapi_bridge::harness::Harness;
//!
//! let harness = Harness::new();
//! let result = harness.select_module("tpcAmApi.dll");
//! if result.ok {
//!     println!("{}", harness.query_api_version()?);
//! }
//! ```
//!
//! ## Modules
//!
//! - [`abi`]: binary struct descriptors
//! - [`binding`]: native binding manager
//! - [`harness`]: command interface and diagnostic sweep
//! - [`config`]: configuration

/// Binary struct descriptors exchanged with the native module
pub mod abi;
/// Native module lifecycle and typed call wrappers
pub mod binding;
/// Configuration system
pub mod config;
/// Error types
pub mod error;
/// Command interface used by the presentation layer
pub mod harness;
/// Logging setup
pub mod logging;

pub use abi::{InitOptions, LayoutError, VersionRecord};
pub use binding::{BindingManager, DEFAULT_MODULE_PATH};
pub use config::HarnessConfig;
pub use error::{BindingError, BindingResult};
pub use harness::{DiagnosticReport, Harness, LoadResult};
