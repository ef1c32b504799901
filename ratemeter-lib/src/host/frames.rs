//! Dispatch frames announced by running host loops.
//!
//! Rust offers no way to inspect another thread's call stack, so host toolkits that want
//! reliable detection announce their dispatch loop here: the loop's entry function holds a
//! [`DispatchFrame`] for as long as it runs. The registry spans every thread in the
//! process, so a meter created on one thread still sees a loop running on another.

use core::marker::PhantomData;
use std::collections::HashMap;
use std::sync::{LazyLock, Mutex};
use std::thread::{self, ThreadId};

static FRAMES: LazyLock<Mutex<HashMap<ThreadId, Vec<&'static str>>>> = LazyLock::new(|| Mutex::new(HashMap::new()));

/// Marks a dispatch entry point as active on the current thread until dropped.
#[derive(Debug)]
#[must_use = "the frame is popped as soon as the guard is dropped"]
pub struct DispatchFrame {
    thread: ThreadId,
    entry_point: &'static str,

    // frames belong to the thread that pushed them
    _not_send: PhantomData<*const ()>,
}

/// Announce that `entry_point` is now dispatching events on the current thread.
pub fn enter_dispatch(entry_point: &'static str) -> DispatchFrame {
    let thread = thread::current().id();
    FRAMES.lock().expect("lock poisoned").entry(thread).or_default().push(entry_point);

    DispatchFrame {
        thread,
        entry_point,
        _not_send: PhantomData,
    }
}

impl Drop for DispatchFrame {
    fn drop(&mut self) {
        let mut frames = FRAMES.lock().expect("lock poisoned");
        if let Some(stack) = frames.get_mut(&self.thread) {
            if let Some(pos) = stack.iter().rposition(|e| *e == self.entry_point) {
                let _ = stack.remove(pos);
            }
            if stack.is_empty() {
                let _ = frames.remove(&self.thread);
            }
        }
    }
}

/// Whether any thread currently has a frame for one of `entry_points`.
#[must_use]
pub fn any_context_dispatching(entry_points: &[&str]) -> bool {
    FRAMES
        .lock()
        .expect("lock poisoned")
        .values()
        .flatten()
        .any(|frame| entry_points.contains(frame))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_visible_while_held() {
        const ENTRY: &str = "frames_test::visible_while_held";
        assert!(!any_context_dispatching(&[ENTRY]));

        let frame = enter_dispatch(ENTRY);
        assert!(any_context_dispatching(&[ENTRY]));

        drop(frame);
        assert!(!any_context_dispatching(&[ENTRY]));
    }

    #[test]
    fn test_frame_visible_from_other_thread() {
        const ENTRY: &str = "frames_test::other_thread";
        let _frame = enter_dispatch(ENTRY);

        let seen = thread::spawn(|| any_context_dispatching(&[ENTRY])).join().unwrap();
        assert!(seen);
    }

    #[test]
    fn test_nested_frames() {
        const ENTRY: &str = "frames_test::nested";
        let outer = enter_dispatch(ENTRY);
        let inner = enter_dispatch(ENTRY);

        drop(inner);
        assert!(any_context_dispatching(&[ENTRY]));
        drop(outer);
        assert!(!any_context_dispatching(&[ENTRY]));
    }
}
