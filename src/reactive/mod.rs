//! Fine-grained reactive primitives: signals, effects, memos.
//!
//! The engine's state lives in reactive cells. A [`Signal`] stores a value and
//! notifies dependents on change; an effect auto-tracks every signal it reads
//! and re-runs when any of them changes; a [`Memo`] caches a derived
//! computation and only notifies downstream when its output actually changes
//! (by `PartialEq`).
//!
//! The runtime is single-threaded and thread-local (Leptos-style): all
//! mutation happens synchronously on the calling context, and a change is
//! observed by all direct dependents before any of *their* dependents run.

pub mod effect;
pub mod signal;

pub use effect::{
    batch, create_effect, create_effect_with_id, create_memo, dispose_effect, untrack, Memo,
};
pub use signal::{create_signal, dispose_signal, EffectId, Signal, SignalId};
