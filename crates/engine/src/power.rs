//! Idle-sleep inhibition while a recording runs.

/// Keeps the machine from idle-sleeping for as long as the value lives.
///
/// Held by the session from the moment the writer begins until the
/// session leaves the running state (stop, pause, or failure). One per
/// session, not shared.
///
/// TODO(platform/macos): back this with an IOPMAssertion once the native
/// backend lands.
#[derive(Debug)]
pub struct IdleSleepInhibitor {
    reason: String,
}

impl IdleSleepInhibitor {
    pub fn acquire(reason: impl Into<String>) -> Self {
        let reason = reason.into();
        tracing::debug!(%reason, "Idle-sleep inhibitor acquired");
        Self { reason }
    }
}

impl Drop for IdleSleepInhibitor {
    fn drop(&mut self) {
        tracing::debug!(reason = %self.reason, "Idle-sleep inhibitor released");
    }
}
