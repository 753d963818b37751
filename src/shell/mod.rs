//! External collaborator boundaries
//!
//! The windowing surface, status-bar icon, notification delivery, the
//! privileged helper, and the global key hook all live outside this core.
//! These traits are the seams they plug into; the headless implementations
//! below are what the bare binary runs with and what tests replace.

use anyhow::Result;
use log::{debug, info};

/// Windowing surface: settings window, pinned popups, user alerts.
pub trait Shell: Send + Sync {
    /// Make the settings window visible without stealing focus.
    fn show_settings(&self);

    /// Bring the settings window to the front.
    fn focus_settings(&self);

    /// Whether any pinned popup is currently visible.
    fn has_visible_pinned_popup(&self) -> bool;

    /// Re-front pinned popups after the app becomes active.
    fn front_pinned_popups(&self);

    /// Blocking, user-facing error alert.
    fn alert(&self, title: &str, message: &str);
}

/// Status-bar icon setup.
pub trait StatusIndicator: Send + Sync {
    fn setup(&self) -> Result<()>;
}

/// Delivers user notifications, optionally carrying a URL the click handler
/// receives back.
pub trait Notifier: Send + Sync {
    fn notify(&self, title: &str, body: &str, url: Option<&str>) -> Result<()>;
}

/// Privileged helper process maintenance.
pub trait HelperClient: Send + Sync {
    fn check_for_update(&self) -> Result<()>;
}

/// A key event as delivered by the global hook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyEvent {
    /// Normalized chord description, e.g. "ctrl+shift+p".
    pub chord: String,
}

pub type KeyHandler = Box<dyn Fn(&KeyEvent) + Send + Sync>;

/// Registration point for the global key-event hook.
pub trait KeyEventSource: Send + Sync {
    fn register(&self, handler: KeyHandler) -> Result<()>;
}

/// Shell implementation for running without a window server: every surface
/// interaction becomes a log line.
pub struct HeadlessShell;

impl Shell for HeadlessShell {
    fn show_settings(&self) {
        debug!("settings window made visible");
    }

    fn focus_settings(&self) {
        debug!("settings window brought to front");
    }

    fn has_visible_pinned_popup(&self) -> bool {
        false
    }

    fn front_pinned_popups(&self) {}

    fn alert(&self, title: &str, message: &str) {
        log::error!("{title}: {message}");
    }
}

/// Logs notifications instead of delivering them.
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, title: &str, body: &str, url: Option<&str>) -> Result<()> {
        match url {
            Some(url) => info!("notification: {title}: {body} ({url})"),
            None => info!("notification: {title}: {body}"),
        }
        Ok(())
    }
}

/// Status indicator that only records that setup happened.
pub struct LogStatusIndicator;

impl StatusIndicator for LogStatusIndicator {
    fn setup(&self) -> Result<()> {
        debug!("status indicator initialized");
        Ok(())
    }
}

/// Helper client for systems with no privileged helper installed.
pub struct NoHelper;

impl HelperClient for NoHelper {
    fn check_for_update(&self) -> Result<()> {
        debug!("no privileged helper installed, skipping update check");
        Ok(())
    }
}

/// Key-event source that never delivers events.
pub struct NullKeySource;

impl KeyEventSource for NullKeySource {
    fn register(&self, _handler: KeyHandler) -> Result<()> {
        Ok(())
    }
}
