//! Fault boundary for job bodies.
//!
//! A panic raised while a job body is being polled is caught here instead of
//! tearing down the scheduler task. The process-wide panic hook is chained
//! once: inside a boundary it records the panic location and a backtrace for
//! the current thread, outside of one it defers to the previous hook.

use std::any::Any;
use std::backtrace::Backtrace;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Once;

use futures::FutureExt;

thread_local! {
    static BOUNDARY_DEPTH: Cell<usize> = const { Cell::new(0) };
    static LAST_PANIC: RefCell<Option<(Option<String>, String)>> = const { RefCell::new(None) };
}

static HOOK: Once = Once::new();

/// A recovered panic.
#[derive(Debug, Clone)]
pub struct Fault {
    pub message: String,
    pub location: Option<String>,
    pub backtrace: String,
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.location {
            Some(location) => write!(f, "{} at {}", self.message, location),
            None => write!(f, "{}", self.message),
        }
    }
}

struct BoundaryGuard;

impl BoundaryGuard {
    fn enter() -> Self {
        BOUNDARY_DEPTH.with(|depth| depth.set(depth.get() + 1));
        BoundaryGuard
    }
}

impl Drop for BoundaryGuard {
    fn drop(&mut self) {
        BOUNDARY_DEPTH.with(|depth| depth.set(depth.get().saturating_sub(1)));
    }
}

fn install_hook() {
    HOOK.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            if BOUNDARY_DEPTH.with(|depth| depth.get()) == 0 {
                previous(info);
                return;
            }
            let location = info.location().map(|l| l.to_string());
            let backtrace = Backtrace::force_capture().to_string();
            LAST_PANIC.with(|slot| *slot.borrow_mut() = Some((location, backtrace)));
        }));
    });
}

fn take_fault(payload: Box<dyn Any + Send>) -> Fault {
    let (location, backtrace) = LAST_PANIC
        .with(|slot| slot.borrow_mut().take())
        .unwrap_or_else(|| (None, "<backtrace unavailable>".to_string()));

    Fault {
        message: panic_message(payload.as_ref()),
        location,
        backtrace,
    }
}

/// Extracts the human readable message from a panic payload.
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "Box<dyn Any>".to_string()
    }
}

/// Polls `future` to completion, converting a panic into a [`Fault`].
///
/// Every poll runs with the boundary marker set on the polling thread, so a
/// task that migrates between worker threads is still covered.
pub async fn isolate<F>(future: F) -> Result<F::Output, Fault>
where
    F: Future,
{
    install_hook();

    let mut future = Box::pin(future);
    let guarded = futures::future::poll_fn(move |cx| {
        let _boundary = BoundaryGuard::enter();
        future.as_mut().poll(cx)
    });

    AssertUnwindSafe(guarded).catch_unwind().await.map_err(take_fault)
}

/// Synchronous counterpart of [`isolate`], used on blocking-pool threads.
pub fn isolate_blocking<R>(f: impl FnOnce() -> R) -> Result<R, Fault> {
    install_hook();

    let _boundary = BoundaryGuard::enter();
    panic::catch_unwind(AssertUnwindSafe(f)).map_err(take_fault)
}
