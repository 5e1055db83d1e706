//!
//! Driver Message Channel
//!
//! Drivers report to the host through one channel with four severities.
//! Every message is logged; errors additionally become the thread's pending
//! host error, which the host boundary picks up with `take_pending_error`
//! once the native call returns. The latest error replaces an older one.
//!
//! Formats:
//! - Message:   `<driver> driver message: (<msg>)`
//! - Warning:   `<driver> driver warning: (<msg>)`
//! - Error:     `<driver> driver: (<msg>)`
//! - Terminate: `<driver> driver fatal: (<msg>)`
//!

use std::cell::RefCell;

use tracing::{error, info, warn};

use crate::error::DbiError;

thread_local! {
    static PENDING_ERROR: RefCell<Option<String>> = const { RefCell::new(None) };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Message,
    Warning,
    Error,
    Terminate,
}

pub fn format_message(driver: &str, msg: &str, severity: Severity) -> String {
    match severity {
        Severity::Message => format!("{} driver message: ({})", driver, msg),
        Severity::Warning => format!("{} driver warning: ({})", driver, msg),
        Severity::Error => format!("{} driver: ({})", driver, msg),
        Severity::Terminate => format!("{} driver fatal: ({})", driver, msg),
    }
}

/// Log `msg` and, for errors, park it for the host. Returns the formatted text.
pub fn error_message(driver: &str, msg: &str, severity: Severity) -> String {
    let text = format_message(driver, msg, severity);
    match severity {
        Severity::Message => info!("{}", text),
        Severity::Warning => warn!("{}", text),
        Severity::Error | Severity::Terminate => {
            error!("{}", text);
            PENDING_ERROR.with(|p| *p.borrow_mut() = Some(text.clone()));
        }
    }
    text
}

/// Report a failed call as a host error. Failures that abort the call
/// outright are reported as fatal.
pub fn raise(driver: &str, err: &DbiError) -> String {
    let severity = if err.is_fatal() {
        Severity::Terminate
    } else {
        Severity::Error
    };
    error_message(driver, &err.to_string(), severity)
}

pub fn take_pending_error() -> Option<String> {
    PENDING_ERROR.with(|p| p.borrow_mut().take())
}

pub fn has_pending_error() -> bool {
    PENDING_ERROR.with(|p| p.borrow().is_some())
}

pub fn clear_pending_error() {
    PENDING_ERROR.with(|p| *p.borrow_mut() = None);
}
