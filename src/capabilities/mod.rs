mod haptics;
mod store;
mod timer;

pub use self::haptics::{HapticIntensity, HapticOperation, Haptics};
pub use self::store::{Store, StoreError, StoreOperation, StoreOutput, StoreResult};
pub use self::timer::{Timer, TimerOperation, TimerOutput};

// Crux's built-in Render capability is used directly; it provides all we
// need for triggering view updates.
pub use crux_core::render::Render;
