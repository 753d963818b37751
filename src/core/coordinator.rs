//! Application coordinator
//!
//! Owns the startup pipeline, the global pause toggle, the reopen policy,
//! the two background activities, and shutdown. Every startup step is
//! best-effort: a failing step is logged and the pipeline moves on.

use super::events::{AppEvent, EventBus, Subscription};
use super::registry::ModuleRegistry;
use super::scheduler::{ActivityConfig, BackgroundActivity};
use crate::config::store::Store;
use crate::config::version;
use crate::shell::{HelperClient, KeyEvent, KeyEventSource, Notifier, Shell, StatusIndicator};
use crate::updater::Updater;
use log::{debug, info, warn};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Store keys the coordinator owns.
pub const PAUSE_KEY: &str = "pause";
pub const PAUSE_HOTKEY_KEY: &str = "pause_hotkey";
pub const UPDATE_CHECK_KEY: &str = "update_check_enabled";
pub const SUPPORT_OPTOUT_KEY: &str = "support_optout";
pub const SUPPORT_LAST_KEY: &str = "support_last_reminder";

const DEFAULT_PAUSE_HOTKEY: &str = "ctrl+shift+p";

/// Reopen requests inside this window after startup are races, not intent.
pub const REOPEN_GRACE: Duration = Duration::from_secs(2);

const UPDATE_CHECK_INTERVAL: Duration = Duration::from_secs(6 * 60 * 60);
const UPDATE_CHECK_TOLERANCE: Duration = Duration::from_secs(60 * 60);
const SUPPORT_INTERVAL: Duration = Duration::from_secs(60 * 60);
const SUPPORT_TOLERANCE: Duration = Duration::from_secs(10 * 60);
const SUPPORT_REMINDER_SECS: i64 = 30 * 24 * 60 * 60;

/// Pre-parsed process arguments; parsing itself lives with the CLI.
#[derive(Debug, Clone, Default)]
pub struct LaunchArgs {
    /// Wipe the persisted store before anything reads it.
    pub reset: bool,
}

/// External collaborators the coordinator drives.
pub struct Collaborators {
    pub shell: Arc<dyn Shell>,
    pub status: Arc<dyn StatusIndicator>,
    pub notifier: Arc<dyn Notifier>,
    pub helper: Arc<dyn HelperClient>,
    pub keys: Arc<dyn KeyEventSource>,
}

pub struct Coordinator {
    store: Arc<Store>,
    registry: Arc<ModuleRegistry>,
    events: Arc<EventBus>,
    updater: Arc<Updater>,
    shell: Arc<dyn Shell>,
    status: Arc<dyn StatusIndicator>,
    notifier: Arc<dyn Notifier>,
    helper: Arc<dyn HelperClient>,
    keys: Arc<dyn KeyEventSource>,
    reopen_grace: Duration,
    started_at: Mutex<Option<Instant>>,
    click_in_notification: Arc<AtomicBool>,
    activities: Mutex<Vec<BackgroundActivity>>,
    subscriptions: Mutex<Vec<Subscription>>,
}

impl Coordinator {
    pub fn new(
        store: Arc<Store>,
        registry: Arc<ModuleRegistry>,
        updater: Arc<Updater>,
        collaborators: Collaborators,
    ) -> Self {
        Self {
            store,
            registry,
            events: Arc::new(EventBus::new()),
            updater,
            shell: collaborators.shell,
            status: collaborators.status,
            notifier: collaborators.notifier,
            helper: collaborators.helper,
            keys: collaborators.keys,
            reopen_grace: REOPEN_GRACE,
            started_at: Mutex::new(None),
            click_in_notification: Arc::new(AtomicBool::new(false)),
            activities: Mutex::new(Vec::new()),
            subscriptions: Mutex::new(Vec::new()),
        }
    }

    /// Override the reopen grace window (the default is [`REOPEN_GRACE`]).
    pub fn with_reopen_grace(mut self, grace: Duration) -> Self {
        self.reopen_grace = grace;
        self
    }

    pub fn store(&self) -> &Arc<Store> {
        &self.store
    }

    pub fn registry(&self) -> &Arc<ModuleRegistry> {
        &self.registry
    }

    /// Run the startup pipeline. Must be called on the runtime that will
    /// host the background activities.
    pub fn startup(&self, args: &LaunchArgs) {
        let starting_point = Instant::now();

        self.apply_launch_args(args);
        version::check_version(&self.store);

        if let Err(e) = self.helper.check_for_update() {
            warn!("Privileged helper update check failed: {e:#}");
        }

        self.registry.mount_all();
        self.seed_defaults();

        if let Err(e) = self.status.setup() {
            warn!("Status indicator setup failed: {e:#}");
        }

        self.register_listeners();
        self.start_activities();

        // Honor a pause that was persisted in a previous session.
        if self.store.bool(PAUSE_KEY, false) {
            self.registry.apply_pause(true);
        }

        info!(
            "Started in {:.4} seconds",
            starting_point.elapsed().as_secs_f64()
        );
        if let Ok(mut started) = self.started_at.lock() {
            *started = Some(Instant::now());
        }
    }

    /// Terminate all modules in registration order. Observer removal
    /// happens when the coordinator is dropped.
    pub fn shutdown(&self) {
        info!("Shutting down");
        self.registry.terminate_all();
    }

    /// Flip the persisted pause flag and broadcast the change.
    pub fn toggle_pause(&self) {
        toggle_pause(&self.store, &self.events);
    }

    /// Decide a reopen request (dock click, second launch).
    ///
    /// `has_visible_windows` reflects the activation context: with windows
    /// already visible the settings window is brought to the front,
    /// otherwise it is merely made visible.
    pub fn should_handle_reopen(&self, has_visible_windows: bool) -> bool {
        // A notification click is always explicit intent; consume the flag.
        if self.click_in_notification.swap(false, Ordering::SeqCst) {
            return true;
        }

        let started = match self.started_at.lock() {
            Ok(guard) => *guard,
            Err(_) => None,
        };
        match started {
            Some(at) if at.elapsed() >= self.reopen_grace => {}
            _ => return false,
        }

        // The user is already engaged with a widget detail view.
        if self.shell.has_visible_pinned_popup() {
            return false;
        }

        if has_visible_windows {
            self.shell.focus_settings();
        } else {
            self.shell.show_settings();
        }
        true
    }

    /// Called by the notification center when the user clicks a delivered
    /// notification.
    pub fn notification_clicked(&self, url: Option<String>) {
        self.events.emit(&AppEvent::NotificationClick { url });
    }

    /// Re-front pinned popups when the app becomes active.
    pub fn did_become_active(&self) {
        self.shell.front_pinned_popups();
    }

    fn apply_launch_args(&self, args: &LaunchArgs) {
        if args.reset {
            warn!("Resetting persisted settings");
            self.store.reset();
        }
    }

    fn seed_defaults(&self) {
        self.store.set_default(PAUSE_KEY, serde_json::Value::from(false));
        self.store
            .set_default(UPDATE_CHECK_KEY, serde_json::Value::from(true));
        self.store
            .set_default(SUPPORT_OPTOUT_KEY, serde_json::Value::from(false));
        self.store.set_default(
            PAUSE_HOTKEY_KEY,
            serde_json::Value::from(DEFAULT_PAUSE_HOTKEY),
        );
    }

    fn register_listeners(&self) {
        let mut subscriptions = match self.subscriptions.lock() {
            Ok(s) => s,
            Err(e) => e.into_inner(),
        };

        // Pause fan-out: read current truth from the store at listen-time,
        // so a burst of toggles resolves to the final value.
        let store = Arc::clone(&self.store);
        let registry = Arc::clone(&self.registry);
        subscriptions.push(self.events.subscribe(move |event| {
            if *event == AppEvent::PauseChanged {
                registry.apply_pause(store.bool(PAUSE_KEY, false));
            }
        }));

        // Notification clicks: remember the click for the reopen policy and
        // run the update flow when a download URL is attached.
        let clicked = Arc::clone(&self.click_in_notification);
        let updater = Arc::clone(&self.updater);
        let shell = Arc::clone(&self.shell);
        subscriptions.push(self.events.subscribe(move |event| {
            if let AppEvent::NotificationClick { url } = event {
                clicked.store(true, Ordering::SeqCst);
                if let Some(url) = url.clone() {
                    spawn_update_install(Arc::clone(&updater), Arc::clone(&shell), url);
                }
            }
        }));

        // Global hotkey toggles the pause flag.
        let store = Arc::clone(&self.store);
        let events = Arc::clone(&self.events);
        let result = self.keys.register(Box::new(move |event: &KeyEvent| {
            let hotkey = store
                .string(PAUSE_HOTKEY_KEY)
                .unwrap_or_else(|| DEFAULT_PAUSE_HOTKEY.to_string());
            if event.chord == hotkey {
                toggle_pause(&store, &events);
            }
        }));
        if let Err(e) = result {
            warn!("Failed to register key-event hook: {e:#}");
        }
    }

    fn start_activities(&self) {
        let mut activities = match self.activities.lock() {
            Ok(a) => a,
            Err(e) => e.into_inner(),
        };
        if !activities.is_empty() {
            return;
        }

        let store = Arc::clone(&self.store);
        let notifier = Arc::clone(&self.notifier);
        let updater = Arc::clone(&self.updater);
        activities.push(BackgroundActivity::spawn(
            ActivityConfig::new("update-check", UPDATE_CHECK_INTERVAL, UPDATE_CHECK_TOLERANCE),
            move || {
                let store = Arc::clone(&store);
                let notifier = Arc::clone(&notifier);
                let updater = Arc::clone(&updater);
                async move { run_update_check(&store, &updater, notifier.as_ref()).await }
            },
        ));

        let store = Arc::clone(&self.store);
        let notifier = Arc::clone(&self.notifier);
        activities.push(BackgroundActivity::spawn(
            ActivityConfig::new("support", SUPPORT_INTERVAL, SUPPORT_TOLERANCE),
            move || {
                let store = Arc::clone(&store);
                let notifier = Arc::clone(&notifier);
                async move { run_support_reminder(&store, notifier.as_ref()) }
            },
        ));
    }
}

/// Flip the persisted pause flag, then broadcast. The write completes
/// before the event fires so listeners never read a stale value.
pub(crate) fn toggle_pause(store: &Store, events: &EventBus) {
    let paused = !store.bool(PAUSE_KEY, false);
    store.set_bool(PAUSE_KEY, paused);
    debug!("Pause flag now {paused}");
    events.emit(&AppEvent::PauseChanged);
}

fn spawn_update_install(updater: Arc<Updater>, shell: Arc<dyn Shell>, url: String) {
    debug!("Downloading new version of the app...");
    tokio::spawn(async move {
        let result = async {
            let path = updater.download(&url).await?;
            updater.install(&path).await
        }
        .await;
        if let Err(e) = result {
            shell.alert("Error updating sentra", &e.to_string());
        }
    });
}

async fn run_update_check(
    store: &Store,
    updater: &Updater,
    notifier: &dyn Notifier,
) -> anyhow::Result<()> {
    if !store.bool(UPDATE_CHECK_KEY, true) {
        return Ok(());
    }

    if let Some(release) = updater.check().await? {
        let url = release
            .platform_asset()
            .map(|a| a.browser_download_url.clone())
            .ok();
        notifier.notify(
            "New version available",
            &format!("v{} can be installed", release.version()),
            url.as_deref(),
        )?;
    }
    Ok(())
}

fn run_support_reminder(store: &Store, notifier: &dyn Notifier) -> anyhow::Result<()> {
    if store.bool(SUPPORT_OPTOUT_KEY, false) {
        return Ok(());
    }

    let now = chrono::Utc::now().timestamp();
    let last = store.i64(SUPPORT_LAST_KEY, 0);
    if now - last < SUPPORT_REMINDER_SECS {
        return Ok(());
    }

    notifier.notify(
        "Enjoying sentra?",
        "Consider supporting continued development",
        None,
    )?;
    store.set_i64(SUPPORT_LAST_KEY, now);
    Ok(())
}
