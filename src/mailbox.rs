//! Single-slot, lossy handoff of key transitions between two threads.
//!
//! The poller publishes, the audio callback drains. The slot holds at most one
//! transition: a publish that lands before the previous value was drained
//! replaces it, so a burst of edges inside one audio block collapses to the
//! most recent one. Both sides are wait-free and allocation-free.

use std::sync::{
    atomic::{AtomicU32, AtomicU64, Ordering},
    Arc,
};

use crate::input::{KeyKind, KeyTransition};

/*
Slot Encoding
=============

The pending transition and its freshness flag share one 32-bit word so that
a reader can never observe a code from one publish paired with the kind of
another:

    31        17  16  15                0
    ┌──┬──────────┬──┬──────────────────┐
    │F │ reserved │K │       code       │
    └──┴──────────┴──┴──────────────────┘

    F  fresh: a transition is waiting to be drained
    K  kind:  1 = pressed, 0 = released

publish: swap(word | F, AcqRel), count a collapse if F was already set
drain:   swap(0, Acquire), decode if F was set
*/

const FRESH: u32 = 1 << 31;
const PRESSED: u32 = 1 << 16;
const CODE_MASK: u32 = 0xFFFF;
const EMPTY: u32 = 0;

fn pack(transition: KeyTransition) -> u32 {
    let kind = match transition.kind {
        KeyKind::Pressed => PRESSED,
        KeyKind::Released => 0,
    };
    FRESH | kind | u32::from(transition.code)
}

fn unpack(word: u32) -> Option<KeyTransition> {
    if word & FRESH == 0 {
        return None;
    }

    let kind = if word & PRESSED != 0 {
        KeyKind::Pressed
    } else {
        KeyKind::Released
    };

    Some(KeyTransition {
        code: (word & CODE_MASK) as u16,
        kind,
    })
}

/// Shared single-slot cell.
#[derive(Debug, Default)]
pub struct Mailbox {
    slot: AtomicU32,
    collapsed: AtomicU64,
}

impl Mailbox {
    pub fn new() -> Self {
        Self {
            slot: AtomicU32::new(EMPTY),
            collapsed: AtomicU64::new(0),
        }
    }

    /// Split into a writer for the poller and a reader for the audio thread.
    pub fn split(self) -> (Publisher, Receiver) {
        let shared = Arc::new(self);
        (
            Publisher {
                mailbox: Arc::clone(&shared),
            },
            Receiver { mailbox: shared },
        )
    }

    /// Store `transition`, replacing anything not yet drained.
    ///
    /// Returns `true` if an undrained transition was overwritten.
    pub fn publish(&self, transition: KeyTransition) -> bool {
        let previous = self.slot.swap(pack(transition), Ordering::AcqRel);
        let overwrote = previous & FRESH != 0;
        if overwrote {
            self.collapsed.fetch_add(1, Ordering::Relaxed);
        }
        overwrote
    }

    /// Take the pending transition, if any, and clear the slot.
    pub fn drain(&self) -> Option<KeyTransition> {
        // Cheap check first so an idle block never performs a write.
        if self.slot.load(Ordering::Relaxed) & FRESH == 0 {
            return None;
        }
        unpack(self.slot.swap(EMPTY, Ordering::Acquire))
    }

    pub fn has_new(&self) -> bool {
        self.slot.load(Ordering::Acquire) & FRESH != 0
    }

    /// Number of transitions overwritten before anyone drained them.
    pub fn collapsed(&self) -> u64 {
        self.collapsed.load(Ordering::Relaxed)
    }
}

/// Poller-side half of a split [`Mailbox`].
#[derive(Debug)]
pub struct Publisher {
    mailbox: Arc<Mailbox>,
}

impl Publisher {
    pub fn publish(&mut self, transition: KeyTransition) -> bool {
        self.mailbox.publish(transition)
    }

    pub fn collapsed(&self) -> u64 {
        self.mailbox.collapsed()
    }
}

/// Realtime-side half of a split [`Mailbox`].
#[derive(Debug)]
pub struct Receiver {
    mailbox: Arc<Mailbox>,
}

impl Receiver {
    pub fn drain(&mut self) -> Option<KeyTransition> {
        self.mailbox.drain()
    }

    pub fn has_new(&self) -> bool {
        self.mailbox.has_new()
    }

    pub fn collapsed(&self) -> u64 {
        self.mailbox.collapsed()
    }
}
