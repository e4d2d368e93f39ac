//! Haptic feedback capability. Fire-and-forget: pulses accompany recognized
//! gestures and save outcomes, and never gate any logic.

use crux_core::capability::{Capability, CapabilityContext, Operation};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum HapticIntensity {
    Light,
    Medium,
    Heavy,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum HapticOperation {
    Pulse { intensity: HapticIntensity },
}

impl Operation for HapticOperation {
    type Output = ();
}

pub struct Haptics<Ev> {
    context: CapabilityContext<HapticOperation, Ev>,
}

impl<Ev> Capability<Ev> for Haptics<Ev> {
    type Operation = HapticOperation;
    type MappedSelf<MappedEv> = Haptics<MappedEv>;

    fn map_event<F, NewEv>(&self, f: F) -> Self::MappedSelf<NewEv>
    where
        F: Fn(NewEv) -> Ev + Send + Sync + 'static,
        Ev: 'static,
        NewEv: 'static,
    {
        Haptics::new(self.context.map_event(f))
    }
}

impl<Ev> Haptics<Ev>
where
    Ev: 'static,
{
    #[must_use]
    pub fn new(context: CapabilityContext<HapticOperation, Ev>) -> Self {
        Self { context }
    }

    pub fn pulse(&self, intensity: HapticIntensity) {
        let ctx = self.context.clone();
        self.context.spawn(async move {
            ctx.notify_shell(HapticOperation::Pulse { intensity }).await;
        });
    }
}
