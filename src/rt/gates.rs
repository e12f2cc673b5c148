use crate::{input::KeyKind, rt::KeyHandler};

/// One open/closed gate per channel, driven by key edges.
///
/// Press opens the mapped channel, release closes it. Channels outside the
/// bank are ignored so a stale key map can never index out of bounds.
#[derive(Debug, Clone)]
pub struct GateBank {
    gates: Vec<bool>,
}

impl GateBank {
    pub fn new(channels: usize) -> Self {
        Self {
            gates: vec![false; channels],
        }
    }

    pub fn is_open(&self, channel: usize) -> bool {
        self.gates.get(channel).copied().unwrap_or(false)
    }

    pub fn set(&mut self, channel: usize, open: bool) {
        if let Some(gate) = self.gates.get_mut(channel) {
            *gate = open;
        }
    }

    pub fn close_all(&mut self) {
        self.gates.fill(false);
    }

    pub fn open_count(&self) -> usize {
        self.gates.iter().filter(|&&open| open).count()
    }

    pub fn len(&self) -> usize {
        self.gates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.gates.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = bool> + '_ {
        self.gates.iter().copied()
    }
}

impl KeyHandler<usize> for GateBank {
    fn on_key(&mut self, channel: &usize, kind: KeyKind) {
        self.set(*channel, kind == KeyKind::Pressed);
    }
}
