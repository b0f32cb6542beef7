//! Ordered focusable targets with a single active index.
//!
//! Directional movement clamps at both ends and never wraps. Every
//! activation records a reveal request that the view layer drains with
//! [`FocusRing::take_reveal`] and honours on a best-effort basis.

/// Direction of a focus move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Next,
    Prev,
}

#[derive(Debug, Clone)]
pub struct FocusRing<T> {
    targets: Vec<T>,
    active: Option<usize>,
    reveal: Option<usize>,
}

impl<T> Default for FocusRing<T> {
    fn default() -> Self {
        Self {
            targets: Vec::new(),
            active: None,
            reveal: None,
        }
    }
}

impl<T: PartialEq> FocusRing<T> {
    pub fn new(targets: Vec<T>) -> Self {
        let mut ring = Self::default();
        ring.set_targets(targets);
        ring
    }

    /// Replace the ring; the first target becomes active.
    pub fn set_targets(&mut self, targets: Vec<T>) {
        self.targets = targets;
        self.active = None;
        self.reveal = None;
        if !self.targets.is_empty() {
            self.activate(0);
        }
    }

    /// Move one step, clamped to the ring. Returns whether the index changed.
    pub fn step(&mut self, step: Step) -> bool {
        let Some(current) = self.active else {
            return false;
        };
        let next = match step {
            Step::Next => (current + 1).min(self.targets.len() - 1),
            Step::Prev => current.saturating_sub(1),
        };
        if next == current {
            return false;
        }
        self.activate(next);
        true
    }

    /// Activate the target at `index`; out-of-range indices are ignored.
    pub fn focus(&mut self, index: usize) -> bool {
        if index >= self.targets.len() {
            return false;
        }
        self.activate(index);
        true
    }

    /// Pointer hover: activate the position holding `target`.
    pub fn activate_by_handle(&mut self, target: &T) -> bool {
        match self.targets.iter().position(|t| t == target) {
            Some(index) => {
                self.activate(index);
                true
            }
            None => false,
        }
    }

    fn activate(&mut self, index: usize) {
        self.active = Some(index);
        self.reveal = Some(index);
    }

    pub fn active_index(&self) -> Option<usize> {
        self.active
    }

    pub fn active(&self) -> Option<&T> {
        self.active.and_then(|i| self.targets.get(i))
    }

    pub fn is_active(&self, index: usize) -> bool {
        self.active == Some(index)
    }

    /// Targets paired with their "is currently active" flag.
    pub fn entries(&self) -> impl Iterator<Item = (&T, bool)> {
        self.targets
            .iter()
            .enumerate()
            .map(move |(i, t)| (t, self.is_active(i)))
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Take the pending scroll-into-view request, if any.
    pub fn take_reveal(&mut self) -> Option<usize> {
        self.reveal.take()
    }
}
