use std::collections::HashSet;
use std::sync::{Arc, Mutex};

/// Process groups of every subprocess still running in this run.
#[derive(Clone, Default)]
pub struct ProcessTracker {
    state: Arc<Mutex<TrackerState>>,
}

#[derive(Default)]
struct TrackerState {
    groups: HashSet<u32>,
    /// Set by [`ProcessTracker::kill_all`]; later registrations are killed on sight.
    closed: bool,
}

impl ProcessTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a freshly spawned process group. The returned guard kills the
    /// group when dropped unless [`ProcessGuard::disarm`] was called first.
    pub fn track(&self, pgid: u32) -> ProcessGuard {
        let mut state = self.lock();
        if state.closed {
            tracing::warn!("Run is shutting down, killing late process group {}", pgid);
            kill_group(pgid);
        } else {
            state.groups.insert(pgid);
        }
        drop(state);
        ProcessGuard {
            pgid,
            tracker: self.clone(),
            armed: true,
        }
    }

    #[cfg(test)]
    pub fn active(&self) -> usize {
        self.lock().groups.len()
    }

    /// Kills every tracked group and refuses any registered afterwards.
    /// Returns how many were signalled.
    pub fn kill_all(&self) -> usize {
        let groups: Vec<u32> = {
            let mut state = self.lock();
            state.closed = true;
            state.groups.drain().collect()
        };
        for pgid in &groups {
            tracing::warn!("Terminating process group {}", pgid);
            kill_group(*pgid);
        }
        groups.len()
    }

    fn release(&self, pgid: u32) {
        self.lock().groups.remove(&pgid);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, TrackerState> {
        // A poisoned set is still a valid set of pids.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

pub struct ProcessGuard {
    pgid: u32,
    tracker: ProcessTracker,
    armed: bool,
}

impl ProcessGuard {
    /// The process exited and was reaped; nothing left to kill.
    pub fn disarm(mut self) {
        self.armed = false;
    }

    pub fn kill(&self) {
        kill_group(self.pgid);
    }
}

impl Drop for ProcessGuard {
    fn drop(&mut self) {
        if self.armed {
            kill_group(self.pgid);
        }
        self.tracker.release(self.pgid);
    }
}

#[cfg(unix)]
pub fn kill_group(pgid: u32) {
    let Ok(pgid) = libc::pid_t::try_from(pgid) else {
        return;
    };
    // SAFETY: killpg only sends a signal; an already-gone group yields ESRCH.
    unsafe {
        libc::killpg(pgid, libc::SIGKILL);
    }
}

#[cfg(not(unix))]
pub fn kill_group(_pgid: u32) {
    // Children are spawned with kill_on_drop; there is no group to signal here.
}
