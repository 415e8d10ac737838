/*!
 * Active Call Path
 * Thread-local stack of the code units currently executing, innermost last
 *
 * Frames are pushed only by the sandbox when it invokes a unit and popped by
 * the returned guard on every exit path, unwinding included. Unit code never
 * receives a guard, so it cannot drop its own frame to shed restrictions.
 */

use crate::core::errors::{ExecError, ExecResult};
use crate::core::id::UnitId;
use crate::core::limits::CALL_PATH_INITIAL_CAPACITY;
use crate::security::AccessDenied;
use std::cell::RefCell;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::{debug, trace};

thread_local! {
    static CALL_PATH: RefCell<Vec<Frame>> =
        RefCell::new(Vec::with_capacity(CALL_PATH_INITIAL_CAPACITY));
}

/// One executing code unit on the current thread
#[derive(Debug, Clone)]
pub struct Frame {
    pub unit: UnitId,
    pub name: Arc<str>,
    /// First denial raised while this frame (or a callee) was executing
    denial: Option<AccessDenied>,
}

impl Frame {
    pub(crate) fn new(unit: UnitId, name: Arc<str>) -> Self {
        Self {
            unit,
            name,
            denial: None,
        }
    }

    /// Denial latched on this frame, if any
    pub fn denial(&self) -> Option<&AccessDenied> {
        self.denial.as_ref()
    }
}

/// Scoped membership of a unit on the current thread's call path
///
/// Not `Send`: the frame belongs to the thread that pushed it.
#[must_use = "dropping the guard immediately pops the frame"]
pub struct FrameGuard {
    /// Index of our frame in the thread's path
    index: usize,
    unit: UnitId,
    released: bool,
    _not_send: PhantomData<*const ()>,
}

impl FrameGuard {
    /// Push `unit` onto the current thread's call path
    pub(crate) fn enter(unit: UnitId, name: Arc<str>, max_depth: usize) -> ExecResult<Self> {
        CALL_PATH.with(|path| {
            let mut path = path.borrow_mut();
            if path.len() >= max_depth {
                return Err(ExecError::DepthExceeded(max_depth));
            }

            let index = path.len();
            trace!(unit = %unit, name = %name, depth = index + 1, "frame enter");
            path.push(Frame::new(unit, name));

            Ok(Self {
                index,
                unit,
                released: false,
                _not_send: PhantomData,
            })
        })
    }

    /// Unit this guard keeps on the path
    pub fn unit(&self) -> UnitId {
        self.unit
    }

    /// Pop the frame and return any denial latched while it was executing
    ///
    /// A latched denial is handed on to the parent frame, so every enclosing
    /// invocation observes it as well.
    pub(crate) fn exit(mut self) -> Option<AccessDenied> {
        self.released = true;
        pop_frame(self.index)
    }
}

impl Drop for FrameGuard {
    fn drop(&mut self) {
        if !self.released {
            // Unwinding or early return without `exit`; the path must not keep our frame.
            pop_frame(self.index);
        }
    }
}

fn pop_frame(index: usize) -> Option<AccessDenied> {
    CALL_PATH
        .try_with(|path| {
            let mut path = path.borrow_mut();

            // Frames above ours only survive if an inner guard was leaked.
            if path.len() > index + 1 {
                debug!(
                    stale = path.len() - index - 1,
                    "discarding frames left by leaked guards"
                );
                let stale: Vec<Frame> = path.drain(index + 1..).collect();
                if let Some(denial) = stale.into_iter().rev().find_map(|f| f.denial) {
                    if let Some(ours) = path.get_mut(index) {
                        ours.denial.get_or_insert(denial);
                    }
                }
            }

            let frame = path.pop()?;
            trace!(unit = %frame.unit, depth = index + 1, "frame exit");

            if let (Some(denial), Some(parent)) = (&frame.denial, path.last_mut()) {
                parent.denial.get_or_insert_with(|| denial.clone());
            }
            frame.denial
        })
        .ok()
        .flatten()
}

/// Record a denial on the innermost frame
///
/// Keeps the first denial if one is already latched. No-op on an empty path,
/// where nothing is confined and nothing can be denied.
pub(crate) fn latch(denial: &AccessDenied) {
    CALL_PATH.with(|path| {
        if let Some(frame) = path.borrow_mut().last_mut() {
            frame.denial.get_or_insert_with(|| denial.clone());
        }
    });
}

/// Run `f` over the current path, outermost first
pub(crate) fn with_path<R>(f: impl FnOnce(&[Frame]) -> R) -> R {
    CALL_PATH.with(|path| f(&path.borrow()))
}

/// Number of frames on the current thread's path
pub fn depth() -> usize {
    with_path(<[Frame]>::len)
}

/// Innermost executing unit, if any
pub fn current_unit() -> Option<UnitId> {
    with_path(|frames| frames.last().map(|f| f.unit))
}

/// Unit identities on the current path, innermost first
pub fn units() -> Vec<UnitId> {
    with_path(|frames| frames.iter().rev().map(|f| f.unit).collect())
}
