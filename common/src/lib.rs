// Common library for the page watcher: models, configuration, and the
// fetch/diff/notify engine used by the watcher binary

pub mod batch;
pub mod config;
pub mod diff;
pub mod endpoints;
pub mod errors;
pub mod jitter;
pub mod models;
pub mod notifier;
pub mod renderer;
pub mod scheduler;
pub mod telemetry;
pub mod throttle;
pub mod validation;
