//! Per-screen session plumbing: busy/active flags and transient notices.
//!
//! # Invariants
//! - At most one gateway call is in flight per session; the busy flag is
//!   released when the guard drops, including when the call future is
//!   dropped mid-flight.
//! - A closed session never becomes active again.

use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::time::Duration;
use tokio::time::Instant;

/// Default lifetime of toasts and scanner error banners.
pub const NOTICE_TTL: Duration = Duration::from_secs(3);

const IDLE: u8 = 0;

/// Gateway call currently holding a session's busy flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Activity {
    Enriching = 1,
    Asking = 2,
    Identifying = 3,
    Searching = 4,
}

impl Activity {
    fn from_raw(raw: u8) -> Option<Self> {
        match raw {
            1 => Some(Self::Enriching),
            2 => Some(Self::Asking),
            3 => Some(Self::Identifying),
            4 => Some(Self::Searching),
            _ => None,
        }
    }
}

/// Busy and mounted state of one screen session.
#[derive(Debug)]
pub(crate) struct SessionFlags {
    busy: AtomicU8,
    active: AtomicBool,
}

impl SessionFlags {
    pub(crate) fn new() -> Self {
        Self {
            busy: AtomicU8::new(IDLE),
            active: AtomicBool::new(true),
        }
    }

    /// Claims the busy flag; `None` when a call is already in flight.
    pub(crate) fn try_begin(&self, activity: Activity) -> Option<BusyGuard<'_>> {
        self.busy
            .compare_exchange(IDLE, activity as u8, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| BusyGuard { flag: &self.busy })
    }

    pub(crate) fn activity(&self) -> Option<Activity> {
        Activity::from_raw(self.busy.load(Ordering::Acquire))
    }

    pub(crate) fn is_busy(&self) -> bool {
        self.activity().is_some()
    }

    pub(crate) fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    pub(crate) fn close(&self) {
        self.active.store(false, Ordering::Release);
    }
}

/// Releases the busy flag on drop.
pub(crate) struct BusyGuard<'a> {
    flag: &'a AtomicU8,
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(IDLE, Ordering::Release);
    }
}

/// Auto-dismissing user-facing message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransientNotice {
    pub text: String,
    shown_at: Instant,
    ttl: Duration,
}

impl TransientNotice {
    pub fn new(text: impl Into<String>, ttl: Duration) -> Self {
        Self {
            text: text.into(),
            shown_at: Instant::now(),
            ttl,
        }
    }

    pub fn is_visible_at(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.shown_at) < self.ttl
    }
}

/// Returns the notice text while visible, dropping it once expired.
pub(crate) fn visible_notice(slot: &mut Option<TransientNotice>) -> Option<String> {
    let now = Instant::now();
    match slot {
        Some(notice) if notice.is_visible_at(now) => Some(notice.text.clone()),
        Some(_) => {
            *slot = None;
            None
        }
        None => None,
    }
}

#[cfg(test)]
mod tests {
    use super::{visible_notice, Activity, SessionFlags, TransientNotice};
    use std::time::Duration;

    #[test]
    fn busy_flag_is_exclusive_and_released_on_drop() {
        let flags = SessionFlags::new();
        let guard = flags
            .try_begin(Activity::Enriching)
            .expect("first claim succeeds");
        assert_eq!(flags.activity(), Some(Activity::Enriching));
        assert!(flags.try_begin(Activity::Asking).is_none());
        drop(guard);
        assert!(!flags.is_busy());
        assert!(flags.try_begin(Activity::Asking).is_some());
    }

    #[test]
    fn closing_is_permanent() {
        let flags = SessionFlags::new();
        assert!(flags.is_active());
        flags.close();
        assert!(!flags.is_active());
    }

    #[tokio::test(start_paused = true)]
    async fn notice_expires_after_ttl() {
        let mut slot = Some(TransientNotice::new("saved", Duration::from_secs(3)));
        assert_eq!(visible_notice(&mut slot).as_deref(), Some("saved"));

        tokio::time::advance(Duration::from_secs(3)).await;
        assert!(visible_notice(&mut slot).is_none());
        assert!(slot.is_none());
    }
}
