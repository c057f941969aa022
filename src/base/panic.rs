//! Panic capture.
//!
//! Payloads travel through `catch_unwind`, stack traces do not: by then the
//! stack has unwound. [`install_backtrace_hook`] records a backtrace on the
//! panicking thread so the catcher can pick it up with [`take_backtrace`].

use std::any::Any;
use std::backtrace::Backtrace;
use std::cell::RefCell;
use std::fmt;
use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Once;

use crate::lifecycle::BoxError;
use crate::web::HttpError;

thread_local! {
    static LAST_BACKTRACE: RefCell<Option<Backtrace>> = const { RefCell::new(None) };
}

static BACKTRACE_HOOK: Once = Once::new();

/// Record a backtrace for every panic, then defer to the previous hook.
/// Installing more than once has no further effect.
pub fn install_backtrace_hook() {
    BACKTRACE_HOOK.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            let _ = LAST_BACKTRACE.try_with(|slot| *slot.borrow_mut() = Some(Backtrace::force_capture()));
            previous(info);
        }));
    });
}

/// Take the backtrace recorded for the latest panic on this thread.
pub fn take_backtrace() -> Option<Backtrace> {
    LAST_BACKTRACE.try_with(|slot| slot.borrow_mut().take()).ok().flatten()
}

/// A panic caught by [`try_run`].
pub struct Panicked {
    payload: Box<dyn Any + Send>,
    backtrace: Option<Backtrace>,
}

impl Panicked {
    /// Where the panic was raised.
    pub fn backtrace(&self) -> Option<&Backtrace> {
        self.backtrace.as_ref()
    }

    /// Human-readable rendering of the payload.
    pub fn message(&self) -> String {
        panic_message(&*self.payload)
    }

    pub fn payload(&self) -> &(dyn Any + Send) {
        &*self.payload
    }

    /// Take the payload, e.g. to resume unwinding with it.
    pub fn into_payload(self) -> Box<dyn Any + Send> {
        self.payload
    }
}

impl fmt::Debug for Panicked {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Panicked").field("message", &self.message()).finish()
    }
}

impl fmt::Display for Panicked {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message())
    }
}

/// Run `attempt`, returning its value or the panic it raised.
///
/// Only unwinding panics can be caught; with `panic = "abort"` the process
/// still aborts.
pub fn try_run<T>(attempt: impl FnOnce() -> T) -> Result<T, Panicked> {
    install_backtrace_hook();
    take_backtrace();
    panic::catch_unwind(AssertUnwindSafe(attempt)).map_err(|payload| Panicked {
        payload,
        backtrace: take_backtrace(),
    })
}

/// Render a panic payload: strings as they are, errors through `Display`.
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else if let Some(err) = payload.downcast_ref::<HttpError>() {
        err.to_string()
    } else if let Some(err) = payload.downcast_ref::<BoxError>() {
        err.to_string()
    } else if let Some(err) = payload.downcast_ref::<io::Error>() {
        err.to_string()
    } else {
        "Box<dyn Any>".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn returns_value_without_panic() {
        assert_eq!(try_run(|| 41 + 1).unwrap(), 42);
    }

    #[test]
    fn captures_str_and_string_payloads() {
        let caught = try_run(|| panic!("static message")).unwrap_err();
        assert_eq!(caught.message(), "static message");

        let code = 7;
        let caught = try_run(|| panic!("formatted {}", code)).unwrap_err();
        assert_eq!(caught.message(), "formatted 7");
    }

    #[test]
    fn captures_http_error_payload() {
        let caught = try_run(|| {
            std::panic::panic_any(HttpError::new(StatusCode::NOT_FOUND, "Not here", "row 9 missing"))
        })
        .unwrap_err();
        assert_eq!(caught.message(), "row 9 missing");
        assert!(caught.payload().downcast_ref::<HttpError>().is_some());
    }

    #[test]
    fn captures_error_payloads() {
        let caught = try_run(|| std::panic::panic_any::<BoxError>("pool exhausted".into())).unwrap_err();
        assert_eq!(caught.message(), "pool exhausted");

        let caught = try_run(|| std::panic::panic_any(io::Error::other("disk gone"))).unwrap_err();
        assert_eq!(caught.message(), "disk gone");
    }

    #[test]
    fn records_backtrace_of_the_panic() {
        let caught = try_run(|| panic!("traced")).unwrap_err();
        assert!(caught.backtrace().is_some());
        // The slot is consumed.
        assert!(take_backtrace().is_none());
        assert!(try_run(|| 1).is_ok());
    }

    #[test]
    fn unknown_payload_has_placeholder() {
        let caught = try_run(|| std::panic::panic_any(17u8)).unwrap_err();
        assert_eq!(caught.message(), "Box<dyn Any>");
        assert_eq!(*caught.into_payload().downcast::<u8>().unwrap(), 17);
    }
}
