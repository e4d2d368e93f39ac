//! Sheet motion controller: vertical offset and opacity for the detail
//! sheet.
//!
//! The core owns the scalar values and the motion phase; the shell performs
//! the actual animation. For animated motions the view model publishes a
//! [`MotionCue`] carrying the target values and a [`MotionProfile`], and the
//! shell reports settlement back as events. During a live drag the offset is
//! set directly for 1:1 finger tracking, with no animation at all.

use serde::{Deserialize, Serialize};

use crate::SHEET_OFFSCREEN_PX;

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Easing {
    Linear,
    EaseIn,
    EaseOut,
}

/// An animation profile, as data. Open must read gentler than close: the
/// entrance is a spring, the dismiss a brisk timing curve.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MotionProfile {
    Spring { stiffness: f64, damping: f64 },
    Timing { duration_ms: u64, easing: Easing },
}

/// Fast attack, low overshoot: the sheet appears gently.
pub const OPEN_SPRING: MotionProfile = MotionProfile::Spring {
    stiffness: 170.0,
    damping: 24.0,
};

/// Stiffer than the open spring; a snap-back is a correction, not an
/// entrance, and should settle faster.
pub const SNAP_BACK_SPRING: MotionProfile = MotionProfile::Spring {
    stiffness: 320.0,
    damping: 30.0,
};

/// Brisk, non-spring dismiss.
pub const CLOSE_TIMING: MotionProfile = MotionProfile::Timing {
    duration_ms: 180,
    easing: Easing::EaseIn,
};

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct MotionConfig {
    /// Resting offset of a hidden sheet; at least the viewport height.
    pub offscreen_px: f64,
    pub open: MotionProfile,
    pub snap_back: MotionProfile,
    pub close: MotionProfile,
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            offscreen_px: SHEET_OFFSCREEN_PX,
            open: OPEN_SPRING,
            snap_back: SNAP_BACK_SPRING,
            close: CLOSE_TIMING,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum MotionPhase {
    /// Sheet unmounted.
    #[default]
    Hidden,
    /// Animating in from offscreen.
    Opening,
    /// Open and at rest (offset 0, opacity 1).
    Resting,
    /// Finger-tracked; values set directly, not animated.
    Tracking,
    /// Correcting back to rest after an uncommitted drag.
    SnappingBack,
    /// Animating out; still mounted until the shell reports settlement.
    Closing,
}

/// What the shell should do with the published offset/opacity this frame.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MotionCue {
    /// Values are at rest; draw as-is.
    Hold,
    /// Values are finger-driven; apply without animation.
    Live,
    /// Animate from the current values to the targets with the profile.
    Animate {
        profile: MotionProfile,
        target_offset: f64,
        target_opacity: f64,
    },
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct SheetMotion {
    pub phase: MotionPhase,
    pub offset: f64,
    pub opacity: f64,
}

impl Default for SheetMotion {
    fn default() -> Self {
        Self {
            phase: MotionPhase::Hidden,
            offset: SHEET_OFFSCREEN_PX,
            opacity: 0.0,
        }
    }
}

impl SheetMotion {
    /// Sheet is mounted (visible or animating out).
    #[must_use]
    pub const fn mounted(&self) -> bool {
        !matches!(self.phase, MotionPhase::Hidden)
    }

    pub fn begin_open(&mut self, config: &MotionConfig) {
        self.phase = MotionPhase::Opening;
        self.offset = config.offscreen_px;
        self.opacity = 0.0;
    }

    pub fn open_settled(&mut self) {
        if self.phase == MotionPhase::Opening {
            self.rest();
        }
    }

    /// 1:1 finger tracking. Upward drags clamp to the resting offset;
    /// opacity fades proportionally to displacement, floored at zero.
    pub fn track(&mut self, config: &MotionConfig, delta_y: f64) {
        if !matches!(self.phase, MotionPhase::Resting | MotionPhase::Tracking) {
            return;
        }
        let delta = delta_y.max(0.0);
        self.phase = MotionPhase::Tracking;
        self.offset = delta;
        self.opacity = (1.0 - delta / config.offscreen_px).max(0.0);
    }

    pub fn snap_back(&mut self) {
        if matches!(self.phase, MotionPhase::Resting | MotionPhase::Tracking) {
            self.phase = MotionPhase::SnappingBack;
        }
    }

    pub fn snap_settled(&mut self) {
        if self.phase == MotionPhase::SnappingBack {
            self.rest();
        }
    }

    pub fn begin_close(&mut self) {
        if self.mounted() {
            self.phase = MotionPhase::Closing;
        }
    }

    pub fn close_settled(&mut self, config: &MotionConfig) {
        if self.phase == MotionPhase::Closing {
            self.phase = MotionPhase::Hidden;
            self.offset = config.offscreen_px;
            self.opacity = 0.0;
        }
    }

    /// The cue the shell should act on for the current phase.
    #[must_use]
    pub fn cue(&self, config: &MotionConfig) -> MotionCue {
        match self.phase {
            MotionPhase::Hidden | MotionPhase::Resting => MotionCue::Hold,
            MotionPhase::Tracking => MotionCue::Live,
            MotionPhase::Opening => MotionCue::Animate {
                profile: config.open,
                target_offset: 0.0,
                target_opacity: 1.0,
            },
            MotionPhase::SnappingBack => MotionCue::Animate {
                profile: config.snap_back,
                target_offset: 0.0,
                target_opacity: 1.0,
            },
            MotionPhase::Closing => MotionCue::Animate {
                profile: config.close,
                target_offset: config.offscreen_px,
                target_opacity: 0.0,
            },
        }
    }

    fn rest(&mut self) {
        self.phase = MotionPhase::Resting;
        self.offset = 0.0;
        self.opacity = 1.0;
    }
}
