//! Visibility change reporting.

/// Receives the entities that came into or went out of interest range during
/// a single tracking call.
///
/// Within one call every entity is reported at most once as entered and at
/// most once as exited. Nothing is promised across calls, so a
/// register/unregister pair can produce a redundant enter/exit pair.
///
/// Implementations run while the index is borrowed (or locked, behind
/// [`Synchronized`](crate::Synchronized)) and must not call back into the same
/// index.
pub trait InterestUpdate<E> {
    /// `entity` is now within range.
    fn on_entered(&mut self, entity: &E);

    /// `entity` is no longer within range.
    fn on_exited(&mut self, entity: &E);
}

/// Collects reported entities in call order.
#[derive(Debug, Clone)]
pub struct VisibilityChanges<E> {
    /// Entities reported through [`InterestUpdate::on_entered`].
    pub entered: Vec<E>,
    /// Entities reported through [`InterestUpdate::on_exited`].
    pub exited: Vec<E>,
}

impl<E> VisibilityChanges<E> {
    /// Creates an empty collector.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entered: Vec::new(),
            exited: Vec::new(),
        }
    }

    /// True if nothing was reported.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entered.is_empty() && self.exited.is_empty()
    }

    /// Empties both lists, keeping their allocations.
    pub fn clear(&mut self) {
        self.entered.clear();
        self.exited.clear();
    }
}

impl<E> Default for VisibilityChanges<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Clone> InterestUpdate<E> for VisibilityChanges<E> {
    fn on_entered(&mut self, entity: &E) {
        self.entered.push(entity.clone());
    }

    fn on_exited(&mut self, entity: &E) {
        self.exited.push(entity.clone());
    }
}
