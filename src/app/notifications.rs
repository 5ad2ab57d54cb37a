// SPDX-License-Identifier: GPL-3.0-only

//! Transient status banner
//!
//! A notification is visible for a fixed time, fades, then hides. Showing a
//! new one aborts the timers of the previous one, so at most one message is
//! on screen and the latest call always wins.

use crate::constants::{colors, timing};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Banner colour class
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Success,
    Error,
    Info,
    Muted,
}

impl Severity {
    /// CSS hex colour of the banner
    pub fn color(self) -> &'static str {
        match self {
            Severity::Success => colors::SUCCESS,
            Severity::Error => colors::ERROR,
            Severity::Info => colors::INFO,
            Severity::Muted => colors::MUTED,
        }
    }

    /// Colour as RGB components
    pub fn rgb(self) -> (u8, u8, u8) {
        let hex = self.color().trim_start_matches('#');
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).unwrap_or(0);
        (channel(0), channel(2), channel(4))
    }
}

/// Display phase of the current banner
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Visible,
    Fading,
}

/// A message shown to the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// Monotonic sequence number, unique per notifier
    pub seq: u64,
    pub message: String,
    pub severity: Severity,
}

impl Notification {
    pub fn is_failure(&self) -> bool {
        self.severity == Severity::Error
    }
}

/// What the banner currently shows
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Banner {
    pub notification: Notification,
    pub phase: Phase,
}

/// Banner durations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotificationTiming {
    pub visible: Duration,
    pub fade: Duration,
}

impl Default for NotificationTiming {
    fn default() -> Self {
        Self {
            visible: Duration::from_millis(timing::NOTIFICATION_VISIBLE_MS),
            fade: Duration::from_millis(timing::NOTIFICATION_FADE_MS),
        }
    }
}

struct NotifierState {
    next_seq: u64,
    hide_task: Option<JoinHandle<()>>,
    history: VecDeque<Notification>,
}

/// Notification helper
///
/// Cheap to clone; clones share the banner. `notify` must be called from
/// within a tokio runtime (it spawns the hide timer).
#[derive(Clone)]
pub struct Notifier {
    banner: Arc<watch::Sender<Option<Banner>>>,
    state: Arc<Mutex<NotifierState>>,
    timing: NotificationTiming,
}

impl Notifier {
    pub fn new(timing: NotificationTiming) -> Self {
        let (banner, _) = watch::channel(None);
        Self {
            banner: Arc::new(banner),
            state: Arc::new(Mutex::new(NotifierState {
                next_seq: 0,
                hide_task: None,
                history: VecDeque::with_capacity(timing::NOTIFICATION_HISTORY),
            })),
            timing,
        }
    }

    /// Show `message`, replacing whatever is on screen
    pub fn notify(&self, message: impl Into<String>, severity: Severity) -> Notification {
        let message = message.into();
        match severity {
            Severity::Error => warn!(message = %message, "Notification"),
            _ => info!(message = %message, severity = ?severity, "Notification"),
        }

        let Ok(mut state) = self.state.lock() else {
            error!("Notifier state poisoned");
            return Notification {
                seq: 0,
                message,
                severity,
            };
        };

        if let Some(previous) = state.hide_task.take() {
            previous.abort();
        }

        state.next_seq += 1;
        let notification = Notification {
            seq: state.next_seq,
            message,
            severity,
        };

        if state.history.len() == timing::NOTIFICATION_HISTORY {
            state.history.pop_front();
        }
        state.history.push_back(notification.clone());

        self.banner.send_replace(Some(Banner {
            notification: notification.clone(),
            phase: Phase::Visible,
        }));

        let banner = Arc::clone(&self.banner);
        let timing = self.timing;
        let seq = notification.seq;
        state.hide_task = Some(tokio::spawn(async move {
            tokio::time::sleep(timing.visible).await;
            banner.send_if_modified(|current| match current {
                Some(b) if b.notification.seq == seq => {
                    b.phase = Phase::Fading;
                    true
                }
                _ => false,
            });

            tokio::time::sleep(timing.fade).await;
            banner.send_if_modified(|current| match current {
                Some(b) if b.notification.seq == seq => {
                    *current = None;
                    true
                }
                _ => false,
            });
            debug!(seq, "Notification hidden");
        }));

        notification
    }

    /// Banner currently on screen
    pub fn current(&self) -> Option<Banner> {
        self.banner.borrow().clone()
    }

    /// Receiver that wakes on every banner change
    pub fn subscribe(&self) -> watch::Receiver<Option<Banner>> {
        self.banner.subscribe()
    }

    /// Recent notifications, oldest first
    pub fn history(&self) -> Vec<Notification> {
        self.state
            .lock()
            .map(|state| state.history.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Most recent notification, even if already hidden
    pub fn last(&self) -> Option<Notification> {
        self.state
            .lock()
            .ok()
            .and_then(|state| state.history.back().cloned())
    }
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new(NotificationTiming::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn advance(ms: u64) {
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_banner_lifecycle() {
        let notifier = Notifier::default();
        notifier.notify("Photo saved", Severity::Success);
        assert_eq!(notifier.current().unwrap().phase, Phase::Visible);

        advance(1_599).await;
        assert_eq!(notifier.current().unwrap().phase, Phase::Visible);

        advance(2).await;
        assert_eq!(notifier.current().unwrap().phase, Phase::Fading);

        advance(250).await;
        assert!(notifier.current().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_new_notification_resets_timers() {
        let notifier = Notifier::default();
        notifier.notify("first", Severity::Info);
        advance(1_500).await;

        notifier.notify("second", Severity::Error);
        advance(200).await;

        // The first call's timer would have started fading by now
        let banner = notifier.current().unwrap();
        assert_eq!(banner.notification.message, "second");
        assert_eq!(banner.phase, Phase::Visible);

        advance(1_700).await;
        assert!(notifier.current().is_none());
        assert_eq!(notifier.history().len(), 2);
    }

    #[test]
    fn test_severity_colors() {
        assert_eq!(Severity::Success.rgb(), (0x28, 0xa7, 0x45));
        assert_eq!(Severity::Error.color(), "#dc3545");
    }
}
