//!
//! hostdbi-core - Database Interface Runtime Glue
//!
//! The pieces a scripting host needs to talk to native database drivers:
//!
//! - `Registry` and `Handle` for referencing connections, statements and
//!   result sets by small stable integers
//! - `Column`, `Table` and the `materialize` functions for turning query
//!   results into typed, column-major tables
//! - `Missing` and the `na` constants for in-band missing values
//! - `strings` for staging backend byte spans as owned text
//! - `report` for severity-tagged driver messages and the pending host error
//! - `DbiConfig` for registry capacities and fetch sizing
//!
//! Everything here is single-threaded and synchronous.
//!

pub mod column;
pub mod config;
pub mod error;
pub mod materialize;
pub mod na;
pub mod registry;
pub mod report;
pub mod strings;
pub mod table;

pub use column::{Column, ElementType};
pub use config::{load_config, parse_config_str, DbiConfig, FetchConfig, Limits};
pub use error::DbiError;
pub use materialize::{Field, Schema};
pub use na::Missing;
pub use registry::{Handle, Registry};
pub use report::{error_message, raise, take_pending_error, Severity};
pub use table::{Table, TableParts, FRAME_CLASS};
