//! Ordered module registry
//!
//! Holds the process's module list in registration order. Mount walks the
//! list in reverse, terminate walks it forward; the asymmetry mirrors the
//! status-bar layout contract and is part of the registry's interface, not
//! an accident.

use super::module::{BoxedModule, Module, ModuleState};
use log::{info, warn};

/// Insertion-ordered collection of modules, fixed at process start.
pub struct ModuleRegistry {
    modules: Vec<BoxedModule>,
}

impl ModuleRegistry {
    pub fn new(modules: Vec<BoxedModule>) -> Self {
        Self { modules }
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Registration-order module names.
    pub fn names(&self) -> Vec<&str> {
        self.modules.iter().map(|m| m.name()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &BoxedModule> {
        self.modules.iter()
    }

    /// Mount every module, last registered first.
    ///
    /// A failing module is logged and left inert; it never blocks the rest
    /// of the list. Returns the number of modules that mounted.
    pub fn mount_all(&self) -> usize {
        let mut mounted = 0;
        for module in self.modules.iter().rev() {
            match module.mount() {
                Ok(()) => mounted += 1,
                Err(e) => warn!("Failed to mount {}: {e:#}", module.name()),
            }
        }
        info!("Mounted {}/{} modules", mounted, self.modules.len());
        mounted
    }

    /// Terminate every module in registration order. Safe to call more than
    /// once; already-terminated modules are no-ops.
    pub fn terminate_all(&self) {
        for module in &self.modules {
            if let Err(e) = module.terminate() {
                warn!("Failed to terminate {}: {e:#}", module.name());
            }
        }
    }

    /// Fan the current pause flag out to every module.
    ///
    /// Each module applies the transition itself; unmounted and failed
    /// modules ignore it.
    pub fn apply_pause(&self, paused: bool) {
        for module in &self.modules {
            let result = if paused {
                module.pause()
            } else {
                module.resume()
            };
            if let Err(e) = result {
                warn!(
                    "Failed to {} {}: {e:#}",
                    if paused { "pause" } else { "resume" },
                    module.name()
                );
            }
        }
    }

    /// True when every module left the Unmounted state (mounted, paused, or
    /// logged as failed).
    pub fn all_settled(&self) -> bool {
        self.modules
            .iter()
            .all(|m| m.state() != ModuleState::Unmounted)
    }
}
