//! The signal runtime and the `Signal<T>` cell handle.
//!
//! All reactive state lives in a thread-local [`Runtime`]: a slotmap arena of
//! signal slots plus an arena of effect slots. Handles are `Copy` slotmap
//! keys, so disposing a slot genuinely frees it and a stale handle can never
//! alias a reused slot.
//!
//! Reading a signal inside a running effect records a dependency edge in both
//! directions (signal -> subscriber, effect -> dependency). Writing a signal
//! notifies its subscribers through the re-entrancy-guarded loop in
//! [`super::effect`].

use std::any::Any;
use std::cell::RefCell;
use std::collections::HashSet;
use std::fmt;
use std::marker::PhantomData;

use slotmap::{new_key_type, SlotMap};

new_key_type! {
    /// Identifies a signal slot inside the runtime. Copy, lightweight.
    pub struct SignalId;
}

new_key_type! {
    /// Identifies an effect slot inside the runtime. Copy, lightweight.
    pub struct EffectId;
}

// ---------------------------------------------------------------------------
// Runtime internals
// ---------------------------------------------------------------------------

pub(crate) struct SignalSlot {
    pub(crate) value: Box<dyn Any>,
    pub(crate) subscribers: HashSet<EffectId>,
}

pub(crate) struct EffectSlot {
    /// The effect closure. Wrapped in `Option` so it can be taken out while
    /// running (avoids holding a borrow on the runtime across user code).
    pub(crate) callback: Option<Box<dyn FnMut()>>,
    pub(crate) dependencies: HashSet<SignalId>,
}

pub(crate) struct Runtime {
    pub(crate) signals: SlotMap<SignalId, SignalSlot>,
    pub(crate) effects: SlotMap<EffectId, EffectSlot>,
    /// The effect currently executing, for auto-tracking.
    pub(crate) tracking: Option<EffectId>,
    /// When > 0 we are inside a `batch()` call and notifications are deferred.
    pub(crate) batch_depth: usize,
    /// Effects queued to re-run once the current batch / flush cycle ends.
    pub(crate) pending: Vec<EffectId>,
    /// Guard against recursive notification (a `set` inside an effect that is
    /// itself being run by the notification loop queues instead of recursing).
    pub(crate) flushing: bool,
}

impl Runtime {
    fn new() -> Self {
        Self {
            signals: SlotMap::with_key(),
            effects: SlotMap::with_key(),
            tracking: None,
            batch_depth: 0,
            pending: Vec::new(),
            flushing: false,
        }
    }
}

thread_local! {
    pub(crate) static RUNTIME: RefCell<Runtime> = RefCell::new(Runtime::new());
}

// ---------------------------------------------------------------------------
// Signal
// ---------------------------------------------------------------------------

/// A reactive mutable cell. `Copy` — only stores a slotmap key.
///
/// Reads inside a running effect subscribe that effect; writes notify all
/// subscribers synchronously (or at batch end inside [`super::effect::batch`]).
pub struct Signal<T: 'static> {
    id: SignalId,
    _marker: PhantomData<T>,
}

// Manual impls so T itself is not required to be Copy/Clone.
impl<T: 'static> Copy for Signal<T> {}
impl<T: 'static> Clone for Signal<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: 'static> fmt::Debug for Signal<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signal").field("id", &self.id).finish()
    }
}

/// Create a reactive signal with the given initial value.
pub fn create_signal<T: 'static>(initial: T) -> Signal<T> {
    let id = RUNTIME.with(|rt| {
        rt.borrow_mut().signals.insert(SignalSlot {
            value: Box::new(initial),
            subscribers: HashSet::new(),
        })
    });
    Signal {
        id,
        _marker: PhantomData,
    }
}

/// Free a signal slot and drop its subscriber edges.
///
/// Pending writes through stale handles become no-ops; reads through stale
/// handles panic (reading a disposed cell is an engine bug). Idempotent.
pub fn dispose_signal(id: SignalId) {
    RUNTIME.with(|rt| {
        let mut rt = rt.borrow_mut();
        if let Some(slot) = rt.signals.remove(id) {
            for eid in slot.subscribers {
                if let Some(effect) = rt.effects.get_mut(eid) {
                    effect.dependencies.remove(&id);
                }
            }
        }
    });
}

impl<T: 'static> Signal<T> {
    /// The raw slot key, used for disposal bookkeeping.
    pub fn id(&self) -> SignalId {
        self.id
    }

    /// Read the current value, subscribing the running effect (if any).
    pub fn get(&self) -> T
    where
        T: Clone,
    {
        self.with(T::clone)
    }

    /// Read by reference without cloning. Still subscribes the running effect.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        RUNTIME.with(|rt| {
            {
                let mut rt = rt.borrow_mut();
                if let Some(eid) = rt.tracking {
                    if let Some(slot) = rt.signals.get_mut(self.id) {
                        slot.subscribers.insert(eid);
                    }
                    if let Some(effect) = rt.effects.get_mut(eid) {
                        effect.dependencies.insert(self.id);
                    }
                }
            }
            let rt = rt.borrow();
            let slot = rt.signals.get(self.id).expect("signal read after dispose");
            f(slot.value.downcast_ref::<T>().expect("signal type mismatch"))
        })
    }

    /// Read without tracking — will not subscribe any running effect.
    pub fn get_untracked(&self) -> T
    where
        T: Clone,
    {
        self.with_untracked(T::clone)
    }

    /// Read by reference without tracking.
    pub fn with_untracked<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        RUNTIME.with(|rt| {
            let rt = rt.borrow();
            let slot = rt.signals.get(self.id).expect("signal read after dispose");
            f(slot.value.downcast_ref::<T>().expect("signal type mismatch"))
        })
    }

    /// Overwrite the value and notify subscribers.
    ///
    /// Writing through a disposed handle is a silent no-op, so teardown order
    /// between containers and in-flight async work stays forgiving.
    pub fn set(&self, value: T) {
        let subs = RUNTIME.with(|rt| {
            let mut rt = rt.borrow_mut();
            match rt.signals.get_mut(self.id) {
                Some(slot) => {
                    slot.value = Box::new(value);
                    Some(slot.subscribers.iter().copied().collect::<Vec<_>>())
                }
                None => None,
            }
        });
        if let Some(subs) = subs {
            super::effect::notify(subs);
        }
    }

    /// Mutate the value in place and notify subscribers.
    pub fn update(&self, f: impl FnOnce(&mut T)) {
        let subs = RUNTIME.with(|rt| {
            let mut rt = rt.borrow_mut();
            match rt.signals.get_mut(self.id) {
                Some(slot) => {
                    let value = slot
                        .value
                        .downcast_mut::<T>()
                        .expect("signal type mismatch");
                    f(value);
                    Some(slot.subscribers.iter().copied().collect::<Vec<_>>())
                }
                None => None,
            }
        });
        if let Some(subs) = subs {
            super::effect::notify(subs);
        }
    }
}

// ---------------------------------------------------------------------------
// Test helper: reset the thread-local runtime between tests
// ---------------------------------------------------------------------------

#[cfg(test)]
pub(crate) fn reset_runtime() {
    RUNTIME.with(|rt| {
        *rt.borrow_mut() = Runtime::new();
    });
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
