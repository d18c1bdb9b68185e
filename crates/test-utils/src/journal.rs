use std::sync::{Arc, Mutex};

use anyhow::bail;
use stagedag::dag::{Callback, callback};

/// Shared, ordered log that callbacks append to.
#[derive(Debug, Clone, Default)]
pub struct Journal {
    entries: Arc<Mutex<Vec<String>>>,
}

impl Journal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, entry: &str) {
        self.entries.lock().unwrap().push(entry.to_string());
    }

    /// Callback that appends `entry` and succeeds.
    pub fn record(&self, entry: &str) -> Callback {
        let journal = self.clone();
        let entry = entry.to_string();
        callback(move |_token| {
            let journal = journal.clone();
            let entry = entry.clone();
            async move {
                journal.push(&entry);
                Ok(())
            }
        })
    }

    /// Callback that appends `entry` and then fails with `msg`.
    pub fn record_then_fail(&self, entry: &str, msg: &str) -> Callback {
        let journal = self.clone();
        let entry = entry.to_string();
        let msg = msg.to_string();
        callback(move |_token| {
            let journal = journal.clone();
            let entry = entry.clone();
            let msg = msg.clone();
            async move {
                journal.push(&entry);
                bail!("{msg}")
            }
        })
    }

    pub fn entries(&self) -> Vec<String> {
        self.entries.lock().unwrap().clone()
    }

    pub fn joined(&self) -> String {
        self.entries().concat()
    }

    pub fn contains(&self, entry: &str) -> bool {
        self.entries().iter().any(|e| e == entry)
    }
}

/// Callback that fails immediately with `msg`.
pub fn failing(msg: &str) -> Callback {
    let msg = msg.to_string();
    callback(move |_token| {
        let msg = msg.clone();
        async move { bail!("{msg}") }
    })
}

/// Callback that does nothing and succeeds.
pub fn succeeding() -> Callback {
    callback(|_token| async { Ok(()) })
}
