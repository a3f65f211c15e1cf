//! Auto-tracking effects, memos, batching, and untracked execution.
//!
//! An effect is a closure that re-runs whenever any signal it read during its
//! previous run changes. Dependency edges are cleared and re-established on
//! every run, so conditional reads re-track correctly.
//!
//! A [`Memo`] is a cached derived computation: a backing signal kept current
//! by an effect, which only writes (and therefore only notifies downstream)
//! when the computed value changes by `PartialEq`.

use std::collections::HashSet;

use super::signal::{create_signal, dispose_signal, EffectId, EffectSlot, Signal, SignalId, RUNTIME};

// ---------------------------------------------------------------------------
// Effects
// ---------------------------------------------------------------------------

/// Create a side-effect that auto-tracks signal reads.
///
/// The closure runs immediately once (establishing initial subscriptions),
/// then re-runs whenever any tracked signal changes.
pub fn create_effect(f: impl FnMut() + 'static) {
    let _ = create_effect_with_id(f);
}

/// Like [`create_effect`], but returns the [`EffectId`] for later disposal.
pub fn create_effect_with_id(f: impl FnMut() + 'static) -> EffectId {
    let eid = RUNTIME.with(|rt| {
        rt.borrow_mut().effects.insert(EffectSlot {
            callback: Some(Box::new(f)),
            dependencies: HashSet::new(),
        })
    });
    run_effect(eid);
    eid
}

/// Remove an effect so it no longer re-runs. Idempotent.
pub fn dispose_effect(eid: EffectId) {
    RUNTIME.with(|rt| {
        let mut rt = rt.borrow_mut();
        if let Some(slot) = rt.effects.remove(eid) {
            for sid in slot.dependencies {
                if let Some(signal) = rt.signals.get_mut(sid) {
                    signal.subscribers.remove(&eid);
                }
            }
        }
    });
}

/// Run `f` with dependency tracking suspended.
///
/// Signal reads inside `f` do not subscribe the currently running effect.
pub fn untrack<R>(f: impl FnOnce() -> R) -> R {
    let prev = RUNTIME.with(|rt| rt.borrow_mut().tracking.take());
    let out = f();
    RUNTIME.with(|rt| rt.borrow_mut().tracking = prev);
    out
}

// ---------------------------------------------------------------------------
// Memo
// ---------------------------------------------------------------------------

/// A cached derived computation. `Copy` — stores the backing signal handle
/// plus the id of the effect keeping it current.
pub struct Memo<T: 'static> {
    signal: Signal<T>,
    effect: EffectId,
}

impl<T: 'static> Copy for Memo<T> {}
impl<T: 'static> Clone for Memo<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: 'static> std::fmt::Debug for Memo<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Memo").field("id", &self.signal.id()).finish()
    }
}

impl<T: 'static> Memo<T> {
    /// Read the memoised value, subscribing the running effect (if any).
    pub fn get(&self) -> T
    where
        T: Clone,
    {
        self.signal.get()
    }

    /// Read by reference without cloning.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        self.signal.with(f)
    }

    /// Read without subscribing.
    pub fn get_untracked(&self) -> T
    where
        T: Clone,
    {
        self.signal.get_untracked()
    }

    /// Tear down the memo: its update effect and its backing slot.
    pub fn dispose(self) {
        dispose_effect(self.effect);
        dispose_signal(self.signal.id());
    }
}

/// Create a memoised derived computation.
///
/// `f` runs immediately (untracked, so a parent effect is not subscribed to
/// the memo's inputs) and again whenever its dependencies change; downstream
/// subscribers are only notified when the output actually differs.
pub fn create_memo<T: Clone + PartialEq + 'static>(mut f: impl FnMut() -> T + 'static) -> Memo<T> {
    let first = untrack(&mut f);
    let signal = create_signal(first);
    let effect = create_effect_with_id(move || {
        let next = f();
        if signal.with_untracked(|old| old != &next) {
            signal.set(next);
        }
    });
    Memo { signal, effect }
}

// ---------------------------------------------------------------------------
// Batch
// ---------------------------------------------------------------------------

/// Group multiple signal writes so dependent effects run only once, at the
/// end of the outermost batch.
pub fn batch(f: impl FnOnce()) {
    RUNTIME.with(|rt| rt.borrow_mut().batch_depth += 1);

    f();

    let pending = RUNTIME.with(|rt| {
        let mut rt = rt.borrow_mut();
        rt.batch_depth -= 1;
        if rt.batch_depth == 0 {
            let mut seen = HashSet::new();
            rt.pending
                .drain(..)
                .filter(|id| seen.insert(*id))
                .collect()
        } else {
            Vec::new()
        }
    });

    flush(pending);
}

// ---------------------------------------------------------------------------
// Notification loop (crate-internal)
// ---------------------------------------------------------------------------

/// Notify a list of subscriber effects that a signal changed.
///
/// Inside a batch, or while the loop is already flushing, subscribers are
/// queued instead of run — this is what guarantees a change reaches all
/// direct dependents before any of their dependents recompute.
pub(crate) fn notify(subs: Vec<EffectId>) {
    if subs.is_empty() {
        return;
    }

    let deferred = RUNTIME.with(|rt| {
        let mut rt = rt.borrow_mut();
        if rt.batch_depth > 0 || rt.flushing {
            rt.pending.extend(subs.iter().copied());
            true
        } else {
            false
        }
    });

    if !deferred {
        flush(subs);
    }
}

fn flush(initial: Vec<EffectId>) {
    if initial.is_empty() {
        return;
    }

    RUNTIME.with(|rt| rt.borrow_mut().flushing = true);

    let mut queue = initial;
    while !queue.is_empty() {
        for eid in std::mem::take(&mut queue) {
            run_effect(eid);
        }
        // Effects may have queued further work through nested writes.
        RUNTIME.with(|rt| queue.append(&mut rt.borrow_mut().pending));
    }

    RUNTIME.with(|rt| rt.borrow_mut().flushing = false);
}

/// Run a single effect: drop its old dependency edges, install it as the
/// tracking context, execute the callback, restore the previous context.
fn run_effect(eid: EffectId) {
    let maybe_cb = RUNTIME.with(|rt| {
        let mut rt = rt.borrow_mut();
        let Some(slot) = rt.effects.get_mut(eid) else {
            return None;
        };
        let old_deps: Vec<SignalId> = slot.dependencies.drain().collect();
        let cb = slot.callback.take();
        for sid in old_deps {
            if let Some(signal) = rt.signals.get_mut(sid) {
                signal.subscribers.remove(&eid);
            }
        }
        cb
    });

    let Some(mut cb) = maybe_cb else {
        return;
    };

    let prev = RUNTIME.with(|rt| {
        let mut rt = rt.borrow_mut();
        let prev = rt.tracking.take();
        rt.tracking = Some(eid);
        prev
    });

    cb();

    RUNTIME.with(|rt| {
        let mut rt = rt.borrow_mut();
        rt.tracking = prev;
        // Put the callback back unless the effect disposed itself mid-run.
        if let Some(slot) = rt.effects.get_mut(eid) {
            slot.callback = Some(cb);
        }
    });
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
