/// Static key code → action table, built before the audio stream starts.
///
/// A code may be bound to several actions (each receives the edge). The
/// catch-all action, if set, fires only for codes with no explicit binding.
#[derive(Debug, Clone)]
pub struct KeyMap<A> {
    bindings: Vec<(u16, A)>,
    fallback: Option<A>,
}

impl<A> KeyMap<A> {
    pub fn new() -> Self {
        Self {
            bindings: Vec::new(),
            fallback: None,
        }
    }

    /// Map that sends every key to the same action.
    pub fn any(action: A) -> Self {
        Self::new().bind_any(action)
    }

    pub fn bind(mut self, code: u16, action: A) -> Self {
        self.bindings.push((code, action));
        self
    }

    pub fn bind_any(mut self, action: A) -> Self {
        self.fallback = Some(action);
        self
    }

    pub fn is_bound(&self, code: u16) -> bool {
        self.bindings.iter().any(|(bound, _)| *bound == code)
    }

    /// Actions for `code`. Allocation-free; safe on the audio thread.
    pub fn actions(&self, code: u16) -> impl Iterator<Item = &A> + '_ {
        let explicit = self.is_bound(code);
        let bound = self
            .bindings
            .iter()
            .filter(move |(bound, _)| *bound == code)
            .map(|(_, action)| action);
        let fallback = self.fallback.iter().filter(move |_| !explicit);

        bound.chain(fallback)
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty() && self.fallback.is_none()
    }
}

impl<A> Default for KeyMap<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A> FromIterator<(u16, A)> for KeyMap<A> {
    fn from_iter<I: IntoIterator<Item = (u16, A)>>(iter: I) -> Self {
        Self {
            bindings: iter.into_iter().collect(),
            fallback: None,
        }
    }
}
