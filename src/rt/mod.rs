//! The realtime side of the bridge.
//!
//! Everything reachable from [`KeyConsumer::process`] is wait-free and
//! allocation-free: one atomic swap on the mailbox, a scan over a key map
//! built at startup, handler calls, and (in cooperative mode) one atomic
//! store plus an unpark.

pub mod gates;
pub mod keymap;

pub use gates::GateBank;
pub use keymap::KeyMap;

use crate::{
    input::{poller::Rearm, KeyKind, KeyTransition},
    mailbox::Receiver,
};

/// Downstream state that reacts to mapped key edges.
pub trait KeyHandler<A> {
    fn on_key(&mut self, action: &A, kind: KeyKind);
}

impl<A, F> KeyHandler<A> for F
where
    F: FnMut(&A, KeyKind),
{
    fn on_key(&mut self, action: &A, kind: KeyKind) {
        self(action, kind)
    }
}

/// Where the consumer takes transitions from.
pub trait TransitionSource {
    fn drain(&mut self) -> Option<KeyTransition>;
}

impl TransitionSource for Receiver {
    fn drain(&mut self) -> Option<KeyTransition> {
        Receiver::drain(self)
    }
}

/// Drains the mailbox once per audio block and dispatches through a key map.
pub struct KeyConsumer<A, S: TransitionSource = Receiver> {
    source: S,
    map: KeyMap<A>,
    rearm: Option<Rearm>,
}

impl<A, S: TransitionSource> KeyConsumer<A, S> {
    pub fn new(source: S, map: KeyMap<A>, rearm: Option<Rearm>) -> Self {
        Self { source, map, rearm }
    }

    /// Call exactly once per audio block.
    ///
    /// Takes at most one transition, forwards it to `handler` for every
    /// matching binding, and re-arms a cooperative poller whether or not
    /// anything arrived. Returns the transition that was taken.
    pub fn process<H: KeyHandler<A>>(&mut self, handler: &mut H) -> Option<KeyTransition> {
        let transition = self.source.drain();

        if let Some(transition) = transition {
            for action in self.map.actions(transition.code) {
                handler.on_key(action, transition.kind);
            }
        }

        if let Some(rearm) = &self.rearm {
            rearm.rearm();
        }

        transition
    }

    pub fn key_map(&self) -> &KeyMap<A> {
        &self.map
    }

    pub fn is_cooperative(&self) -> bool {
        self.rearm.is_some()
    }
}
