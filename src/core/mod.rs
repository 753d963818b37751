//! Core coordination types for sentra

mod coordinator;
mod events;
mod module;
mod registry;
mod scheduler;
mod timer;

pub use coordinator::{Collaborators, Coordinator, LaunchArgs, PAUSE_KEY, REOPEN_GRACE};
pub use events::{AppEvent, EventBus, Subscription};
pub use module::{BoxedModule, BoxedSampler, Module, ModuleState, MonitorModule, Reading, Sampler};
pub use registry::ModuleRegistry;
pub use scheduler::{ActivityConfig, BackgroundActivity};
pub use timer::SamplingTimer;
