/// Two-phase value for optimistic UI updates.
///
/// A mutation stages a tentative value immediately; the server outcome
/// either confirms it or rolls it back. Rollback runs an explicit callback
/// so the caller can undo whatever side effects the tentative value drove,
/// independent of any UI-binding mechanism.
#[derive(Debug, Clone)]
pub struct Optimistic<T> {
    confirmed: T,
    tentative: Option<T>,
}

impl<T> Optimistic<T> {
    pub fn new(confirmed: T) -> Self {
        Self {
            confirmed,
            tentative: None,
        }
    }

    /// Value to display: the tentative one while a mutation is pending.
    pub fn get(&self) -> &T {
        self.tentative.as_ref().unwrap_or(&self.confirmed)
    }

    pub fn confirmed(&self) -> &T {
        &self.confirmed
    }

    pub fn is_pending(&self) -> bool {
        self.tentative.is_some()
    }

    /// Stage a tentative value.
    pub fn stage(&mut self, value: T) {
        self.tentative = Some(value);
    }

    /// Stage a tentative value derived from the currently displayed one.
    pub fn stage_with(&mut self, f: impl FnOnce(&T) -> T) {
        self.tentative = Some(f(self.get()));
    }

    /// Apply the server outcome. Success promotes the server value to
    /// confirmed; rejection discards the tentative value and invokes
    /// `on_rollback` with it.
    pub fn settle<E>(&mut self, result: Result<T, E>, on_rollback: impl FnOnce(&T)) {
        match result {
            Ok(value) => {
                self.confirmed = value;
                self.tentative = None;
            }
            Err(_) => {
                if let Some(tentative) = self.tentative.take() {
                    on_rollback(&tentative);
                }
            }
        }
    }
}
