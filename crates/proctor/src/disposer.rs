//! Scoped teardown: every registration is paired with a disposer that is
//! guaranteed to run on stop or drop.

use tracing::debug;

/// Deregistration callback
pub type Disposer = Box<dyn FnOnce() + Send>;

/// Disposers run in reverse registration order
#[derive(Default)]
pub struct Disposers {
    items: Vec<(&'static str, Disposer)>,
}

impl Disposers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push<F>(&mut self, name: &'static str, dispose: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.items.push((name, Box::new(dispose)));
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Run and drop every disposer. Safe to call repeatedly.
    pub fn dispose_all(&mut self) {
        while let Some((name, dispose)) = self.items.pop() {
            debug!("Disposing {}", name);
            dispose();
        }
    }
}

impl Drop for Disposers {
    fn drop(&mut self) {
        self.dispose_all();
    }
}

impl std::fmt::Debug for Disposers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<_> = self.items.iter().map(|(name, _)| *name).collect();
        f.debug_struct("Disposers").field("items", &names).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_reverse_order_and_idempotent() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut disposers = Disposers::new();
        for name in ["visibility", "keyboard", "camera"] {
            let log = log.clone();
            disposers.push(name, move || log.lock().unwrap().push(name));
        }

        disposers.dispose_all();
        disposers.dispose_all();
        assert_eq!(*log.lock().unwrap(), vec!["camera", "keyboard", "visibility"]);
        assert!(disposers.is_empty());
    }

    #[test]
    fn test_drop_disposes() {
        let count = Arc::new(Mutex::new(0));
        {
            let mut disposers = Disposers::new();
            let count = count.clone();
            disposers.push("listener", move || *count.lock().unwrap() += 1);
        }
        assert_eq!(*count.lock().unwrap(), 1);
    }
}
