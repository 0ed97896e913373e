pub mod keep_alive;
pub mod reconciler;

pub use keep_alive::{HealthPinger, KeepAlive, KeepAliveSettings, KeepAliveStatus};
pub use reconciler::MetadataReconciler;
