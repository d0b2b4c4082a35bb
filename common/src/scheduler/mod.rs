// Scheduler module driving the fetch → diff → notify → wait cycle

pub mod engine;

pub use engine::{StopHandle, WatchEngine};
