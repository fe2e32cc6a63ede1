pub mod notifier;
pub mod observer;
pub mod sink;
pub mod snapshot;

// Convenient re-exports
pub use notifier::ProgressNotifier;
pub use observer::ProgressObserver;
pub use sink::{project, ProgressView};
pub use snapshot::ProgressSnapshot;
