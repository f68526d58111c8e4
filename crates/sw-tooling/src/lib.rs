//! Stackwright Tooling
//!
//! Collaborators that drive the configuration-management toolchain:
//!
//! - **BerksPackager**: `berks vendor` plus tar/gzip archiving
//! - **ChefWorkstation**: knife/berks sessions against a server
//!
//! # Example
//!
//! ```rust,ignore
//! use sw_tooling::{BerksPackager, ChefWorkstation, ToolPaths};
//!
//! let paths = ToolPaths::default().with_berks("/opt/chefdk/bin/berks");
//! let packager = BerksPackager::new(paths.clone());
//! let workstation = ChefWorkstation::new(paths);
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

// Core modules
pub mod archive;
pub mod berks;
pub mod command;
pub mod error;
pub mod workstation;

// Re-exports for convenience
pub use archive::gzip_directory;
pub use berks::BerksPackager;
pub use command::{CommandOutput, ToolPaths};
pub use error::{ToolingError, ToolingResult};
pub use workstation::{ChefWorkstation, WorkstationSession};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
