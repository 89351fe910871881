#![forbid(unsafe_code)]

//! Readable signals with change notification and version tracking.
//!
//! # Design
//!
//! [`Signal<T>`] wraps a value in shared, reference-counted storage
//! (`Rc<RefCell<..>>`). When the value changes (by `PartialEq`), live
//! subscribers are notified in registration order. The owner keeps the
//! writable [`Signal`]; consumers get a [`ReadSignal`] that can observe but
//! never mutate.
//!
//! # Invariants
//!
//! 1. `version` increments by exactly 1 on each value-changing `set`.
//! 2. `set(v)` where `v == current` is a no-op.
//! 3. Subscribers are notified in registration order.
//! 4. Dropping a [`SignalGuard`] stops its callback from running.
//!
//! # Failure Modes
//!
//! - **Re-entrant set from a callback**: allowed. Callbacks run after the
//!   internal borrow is released and receive a snapshot of the value.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

type CallbackRc<T> = Rc<dyn Fn(&T)>;
type CallbackWeak<T> = Weak<dyn Fn(&T)>;

struct SignalInner<T> {
    value: T,
    version: u64,
    subscribers: Vec<CallbackWeak<T>>,
}

/// A writable, version-tracked value.
///
/// Cloning a `Signal` creates another writable handle to the same state.
/// Hand out [`Signal::reader`] to code that must only observe.
pub struct Signal<T> {
    inner: Rc<RefCell<SignalInner<T>>>,
}

impl<T> Clone for Signal<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Signal<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("Signal")
            .field("value", &inner.value)
            .field("version", &inner.version)
            .finish()
    }
}

impl<T: Clone + PartialEq + 'static> Signal<T> {
    #[must_use]
    pub fn new(value: T) -> Self {
        Self {
            inner: Rc::new(RefCell::new(SignalInner {
                value,
                version: 0,
                subscribers: Vec::new(),
            })),
        }
    }

    /// Clone of the current value.
    #[must_use]
    pub fn get(&self) -> T {
        self.inner.borrow().value.clone()
    }

    /// Borrow the current value for the duration of `f`.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.inner.borrow().value)
    }

    /// Replace the value. Returns `true` if it changed.
    pub fn set(&self, value: T) -> bool {
        {
            let mut inner = self.inner.borrow_mut();
            if inner.value == value {
                return false;
            }
            inner.value = value;
            inner.version += 1;
        }
        self.notify();
        true
    }

    /// Current version. Useful for dirty-checking in paint loops.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.inner.borrow().version
    }

    /// Register a change callback; it runs until the guard is dropped.
    pub fn subscribe(&self, callback: impl Fn(&T) + 'static) -> SignalGuard {
        let strong: CallbackRc<T> = Rc::new(callback);
        self.inner
            .borrow_mut()
            .subscribers
            .push(Rc::downgrade(&strong));
        SignalGuard {
            _guard: Box::new(strong),
        }
    }

    /// Read-only handle to the same state.
    #[must_use]
    pub fn reader(&self) -> ReadSignal<T> {
        ReadSignal {
            signal: self.clone(),
        }
    }

    /// Drop every subscriber without notifying it.
    pub fn clear_subscribers(&self) {
        self.inner.borrow_mut().subscribers.clear();
    }

    fn notify(&self) {
        let (callbacks, value) = {
            let mut inner = self.inner.borrow_mut();
            inner.subscribers.retain(|w| w.strong_count() > 0);
            let callbacks: Vec<CallbackRc<T>> =
                inner.subscribers.iter().filter_map(Weak::upgrade).collect();
            (callbacks, inner.value.clone())
        };
        for cb in &callbacks {
            cb(&value);
        }
    }
}

/// Read-only view of a [`Signal`].
pub struct ReadSignal<T> {
    signal: Signal<T>,
}

impl<T> Clone for ReadSignal<T> {
    fn clone(&self) -> Self {
        Self {
            signal: self.signal.clone(),
        }
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for ReadSignal<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("ReadSignal").field(&self.signal).finish()
    }
}

impl<T: Clone + PartialEq + 'static> ReadSignal<T> {
    #[must_use]
    pub fn get(&self) -> T {
        self.signal.get()
    }

    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        self.signal.with(f)
    }

    #[must_use]
    pub fn version(&self) -> u64 {
        self.signal.version()
    }

    pub fn subscribe(&self, callback: impl Fn(&T) + 'static) -> SignalGuard {
        self.signal.subscribe(callback)
    }
}

/// RAII guard for a subscriber callback.
pub struct SignalGuard {
    _guard: Box<dyn std::any::Any>,
}

impl std::fmt::Debug for SignalGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignalGuard").finish_non_exhaustive()
    }
}
