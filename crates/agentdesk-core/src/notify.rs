// Transient notifications
//
// Titled, typed messages that auto-dismiss after a duration. Time is passed
// in explicitly so visibility can be checked deterministically.

use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// Default time a notification stays visible
pub const DEFAULT_NOTIFICATION_DURATION: Duration = Duration::from_millis(4000);

/// Kind of notification, driving its styling
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    #[default]
    Info,
    Success,
    Warning,
    Alert,
}

/// A titled message shown to the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub title: String,
    pub message: String,
    pub kind: NotificationKind,
    /// `None` uses the center's default. Zero keeps the notification until replaced
    #[serde(skip)]
    pub duration: Option<Duration>,
}

impl Notification {
    pub fn new(kind: NotificationKind, title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
            kind,
            duration: None,
        }
    }

    pub fn info(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(NotificationKind::Info, title, message)
    }

    pub fn success(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(NotificationKind::Success, title, message)
    }

    pub fn warning(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(NotificationKind::Warning, title, message)
    }

    pub fn alert(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(NotificationKind::Alert, title, message)
    }

    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = Some(duration);
        self
    }
}

/// Holds the notification currently on screen
#[derive(Debug, Clone)]
pub struct NotificationCenter {
    current: Option<(Notification, Instant)>,
    default_duration: Duration,
}

impl Default for NotificationCenter {
    fn default() -> Self {
        Self::new(DEFAULT_NOTIFICATION_DURATION)
    }
}

impl NotificationCenter {
    /// `default_duration` applies to notifications shown without their own duration
    pub fn new(default_duration: Duration) -> Self {
        Self {
            current: None,
            default_duration,
        }
    }

    /// Show a notification, replacing the current one and restarting the timer
    pub fn show(&mut self, mut notification: Notification, now: Instant) {
        notification.duration.get_or_insert(self.default_duration);
        self.current = Some((notification, now));
    }

    /// The latest notification, whether or not it has expired
    pub fn latest(&self) -> Option<&Notification> {
        self.current.as_ref().map(|(n, _)| n)
    }

    /// The notification still visible at `now`
    pub fn visible(&self, now: Instant) -> Option<&Notification> {
        let (notification, shown_at) = self.current.as_ref()?;
        let duration = notification.duration.unwrap_or(self.default_duration);
        let expired =
            !duration.is_zero() && now.saturating_duration_since(*shown_at) >= duration;
        (!expired).then_some(notification)
    }

    pub fn dismiss(&mut self) {
        self.current = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auto_dismiss_after_duration() {
        let mut center = NotificationCenter::default();
        let t0 = Instant::now();
        center.show(Notification::success("Agente eliminado", "Listo"), t0);

        assert!(center.visible(t0 + Duration::from_millis(3999)).is_some());
        assert!(center.visible(t0 + Duration::from_millis(4000)).is_none());
        assert!(center.latest().is_some());
    }

    #[test]
    fn test_zero_duration_never_expires() {
        let mut center = NotificationCenter::default();
        let t0 = Instant::now();
        center.show(
            Notification::alert("Error", "Sin conexión").with_duration(Duration::ZERO),
            t0,
        );
        assert!(center.visible(t0 + Duration::from_secs(3600)).is_some());
    }

    #[test]
    fn test_show_replaces_and_restarts() {
        let mut center = NotificationCenter::default();
        let t0 = Instant::now();
        center.show(Notification::info("Uno", "primero"), t0);
        let t1 = t0 + Duration::from_millis(3000);
        center.show(Notification::warning("Dos", "segundo"), t1);

        let visible = center.visible(t0 + Duration::from_millis(5000)).unwrap();
        assert_eq!(visible.title, "Dos");
        assert_eq!(visible.kind, NotificationKind::Warning);
    }

    #[test]
    fn test_configured_default_duration() {
        let mut center = NotificationCenter::new(Duration::from_millis(500));
        let t0 = Instant::now();
        center.show(Notification::info("Hola", "mundo"), t0);
        assert!(center.visible(t0 + Duration::from_millis(600)).is_none());
    }

    #[test]
    fn test_explicit_duration_wins_over_configured_default() {
        let mut center = NotificationCenter::new(Duration::from_millis(500));
        let t0 = Instant::now();
        center.show(
            Notification::info("Hola", "mundo").with_duration(DEFAULT_NOTIFICATION_DURATION),
            t0,
        );

        assert!(center.visible(t0 + Duration::from_millis(600)).is_some());
        assert!(center.visible(t0 + Duration::from_millis(4000)).is_none());
        assert_eq!(
            center.latest().and_then(|n| n.duration),
            Some(DEFAULT_NOTIFICATION_DURATION)
        );
    }
}
