///
/// hostdbi SQLite Driver
///
/// SQLite access for a scripting host, built on the hostdbi-core registry and
/// materializer. Uses rusqlite with bundled SQLite for zero system
/// dependency.
///
/// Architecture:
/// - `Driver` owns connection, statement and result-set registries; every
///   operation takes and returns the raw `i64` handles the host holds.
/// - Query rows are buffered when the statement runs and handed out by
///   `fetch` as framed, column-major tables.
/// - `ffi` exposes a C ABI over a thread-local `Driver`. Failures return -1
///   and park a message for `hostdbi_sqlite_last_error`.
///
/// Functions:
/// - Connection: connect, connect_in_memory, disconnect, connection_info,
///   list_connections, close_all
/// - Execute: exec, changes, last_insert_id, begin, commit, rollback
/// - Prepared statements: prepare, bind, execute, finalize
/// - Results: send_query, fetch, result_info, list_results, clear_result,
///   get_query
/// - Utility: escape_strings, library_versions
///

mod convert;
pub mod driver;
pub mod ffi;

pub use driver::{field_types, ConnectionInfo, Driver, Param, ResultInfo};
