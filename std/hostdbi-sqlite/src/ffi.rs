///
/// C ABI over a thread-local driver.
///
/// Handles are the raw registry handles. Tables are not marshalled here;
/// hosts that read rows embed the crate and call `Driver::fetch`. On
/// failure a function returns -1 and the formatted error waits in the
/// thread's pending-error slot until `hostdbi_sqlite_last_error` collects
/// it. The driver reads its limits from the `HOSTDBI_*` environment
/// variables on first use.
///

use std::cell::RefCell;
use std::ffi::{c_char, CStr};

use hostdbi_core::report::{raise, take_pending_error};
use hostdbi_core::{DbiConfig, DbiError};

use crate::driver::Driver;

thread_local! {
    static DRIVER: RefCell<Driver> = RefCell::new(Driver::new(DbiConfig::from_env()));
}

fn with_driver<R>(f: impl FnOnce(&mut Driver) -> Result<R, DbiError>) -> Option<R> {
    DRIVER.with(|cell| {
        let mut driver = cell.borrow_mut();
        match f(&mut driver) {
            Ok(value) => Some(value),
            Err(e) => {
                raise(&driver.config().driver_name, &e);
                None
            }
        }
    })
}

/// # Safety
/// `s` must be null or point to a NUL-terminated string.
unsafe fn string_from_c(s: *const c_char) -> String {
    if s.is_null() {
        return String::new();
    }
    unsafe { CStr::from_ptr(s) }.to_string_lossy().into_owned()
}

fn status(result: Option<()>) -> i64 {
    result.map_or(-1, |_| 0)
}

/// # Safety
/// `path` must be null or point to a NUL-terminated string.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn hostdbi_sqlite_open(path: *const c_char) -> i64 {
    let path = unsafe { string_from_c(path) };
    with_driver(|d| d.connect(&path)).unwrap_or(-1)
}

#[unsafe(no_mangle)]
pub extern "C" fn hostdbi_sqlite_open_memory() -> i64 {
    with_driver(|d| d.connect_in_memory()).unwrap_or(-1)
}

#[unsafe(no_mangle)]
pub extern "C" fn hostdbi_sqlite_close(conn: i64) -> i64 {
    status(with_driver(|d| d.disconnect(conn)))
}

/// # Safety
/// `sql` must be null or point to a NUL-terminated string.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn hostdbi_sqlite_exec(conn: i64, sql: *const c_char) -> i64 {
    let sql = unsafe { string_from_c(sql) };
    with_driver(|d| d.exec(conn, &sql)).unwrap_or(-1)
}

/// Run a query and return its result-set handle.
///
/// # Safety
/// `sql` must be null or point to a NUL-terminated string.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn hostdbi_sqlite_query(conn: i64, sql: *const c_char) -> i64 {
    let sql = unsafe { string_from_c(sql) };
    with_driver(|d| d.send_query(conn, &sql)).unwrap_or(-1)
}

#[unsafe(no_mangle)]
pub extern "C" fn hostdbi_sqlite_field_count(res: i64) -> i64 {
    with_driver(|d| d.result_info(res))
        .map_or(-1, |info| info.fields.len() as i64)
}

#[unsafe(no_mangle)]
pub extern "C" fn hostdbi_sqlite_clear(res: i64) -> i64 {
    status(with_driver(|d| d.clear_result(res)))
}

#[unsafe(no_mangle)]
pub extern "C" fn hostdbi_sqlite_connection_count() -> i64 {
    with_driver(|d| Ok(d.list_connections().len() as i64)).unwrap_or(-1)
}

#[unsafe(no_mangle)]
pub extern "C" fn hostdbi_sqlite_close_all() -> i64 {
    with_driver(|d| Ok(d.close_all() as i64)).unwrap_or(-1)
}

/// Move the pending error into `buf`, truncated to `cap - 1` bytes and
/// NUL-terminated. Returns the full message length, or 0 when nothing is
/// pending.
///
/// # Safety
/// `buf` must be null or valid for writes of `cap` bytes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn hostdbi_sqlite_last_error(buf: *mut u8, cap: usize) -> i64 {
    let Some(message) = take_pending_error() else {
        return 0;
    };
    if !buf.is_null() && cap > 0 {
        let n = message.len().min(cap - 1);
        unsafe {
            std::ptr::copy_nonoverlapping(message.as_ptr(), buf, n);
            *buf.add(n) = 0;
        }
    }
    message.len() as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::CString;

    fn last_error() -> Option<String> {
        let mut buf = [0u8; 256];
        let len = unsafe { hostdbi_sqlite_last_error(buf.as_mut_ptr(), buf.len()) };
        if len == 0 {
            return None;
        }
        let end = buf.iter().position(|&b| b == 0).unwrap_or(buf.len());
        Some(String::from_utf8_lossy(&buf[..end]).into_owned())
    }

    #[test]
    fn test_round_trip_through_c_abi() {
        let conn = hostdbi_sqlite_open_memory();
        assert!(conn >= 0);

        let ddl = CString::new("CREATE TABLE t (x INTEGER); INSERT INTO t VALUES (1), (2);").unwrap();
        assert_eq!(unsafe { hostdbi_sqlite_exec(conn, ddl.as_ptr()) }, 2);

        let sql = CString::new("SELECT x, x * 2 AS y FROM t").unwrap();
        let res = unsafe { hostdbi_sqlite_query(conn, sql.as_ptr()) };
        assert!(res >= 0);
        assert_eq!(hostdbi_sqlite_field_count(res), 2);

        assert_eq!(hostdbi_sqlite_clear(res), 0);
        assert_eq!(hostdbi_sqlite_close(conn), 0);
        assert!(last_error().is_none());
    }

    #[test]
    fn test_failures_return_minus_one_and_park_message() {
        assert_eq!(hostdbi_sqlite_close(999), -1);
        let message = last_error().expect("error should be pending");
        assert!(message.starts_with("hostdbi driver: ("));
        assert!(message.contains("connection handle 999"));
        assert!(last_error().is_none());

        let conn = hostdbi_sqlite_open_memory();
        let bad = CString::new("SELECT * FROM missing_table").unwrap();
        assert_eq!(unsafe { hostdbi_sqlite_query(conn, bad.as_ptr()) }, -1);
        assert!(last_error().unwrap().contains("no such table"));
        assert_eq!(hostdbi_sqlite_close(conn), 0);
    }

    #[test]
    fn test_last_error_truncates_to_buffer() {
        assert_eq!(hostdbi_sqlite_clear(12345), -1);
        let mut buf = [0xFFu8; 8];
        let len = unsafe { hostdbi_sqlite_last_error(buf.as_mut_ptr(), buf.len()) };
        assert!(len > 8);
        assert_eq!(&buf[..7], b"hostdbi");
        assert_eq!(buf[7], 0);
    }

    #[test]
    fn test_close_all_counts_connections() {
        hostdbi_sqlite_close_all();
        hostdbi_sqlite_open_memory();
        hostdbi_sqlite_open_memory();
        assert_eq!(hostdbi_sqlite_connection_count(), 2);
        assert_eq!(hostdbi_sqlite_close_all(), 2);
        assert_eq!(hostdbi_sqlite_connection_count(), 0);
    }
}
