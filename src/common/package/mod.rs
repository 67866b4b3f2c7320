//! Package backend resolution and install dispatch.
//!
//! # Architecture
//!
//! - [`BackendKind`]: which tool supplies an app, with its command template
//! - [`SystemProbe`]: seam over `which` and package manager queries
//! - [`resolver`]: availability and install-state checks
//! - [`InstallPlan`]: apps grouped into one [`InstallJob`] per backend
//! - [`Dispatcher`]: launches each job in a terminal
//!
//! # Priority
//!
//! The official repositories are always asked first. The AUR helper is only
//! consulted when it is installed and the official repositories said no.

mod batch;
mod install;
mod manager;
mod probe;
pub mod resolver;

pub use batch::{InstallJob, InstallPlan};
pub use install::{DispatchReport, Dispatcher, LaunchedJob};
pub use manager::{BackendKind, CommandTemplate, Mode, is_valid_package_name};
pub use probe::{HostProbe, SystemProbe};
