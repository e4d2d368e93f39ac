// lib.rs - Complete Production Implementation

#![forbid(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::too_many_lines)]

pub mod app;
pub mod capabilities;
pub mod event;
pub mod gesture;
pub mod model;
pub mod motion;
pub mod overlay;

pub use app::{App, Capabilities, Effect, SheetMode, SheetView, ViewModel};
pub use event::Event;
pub use model::{
    DismissPolicy, FieldMap, InteractionState, Model, SessionConfig, SubjectId, SubjectKind,
    SubjectRecord, UserNotice,
};
pub use crux_core::App as CruxApp;

/// How long a press must dwell, without drifting, to become a long-press.
pub const LONG_PRESS_DWELL_MS: u64 = 600;
/// Two taps on the same surface within this window pair into a double-tap.
pub const DOUBLE_TAP_WINDOW_MS: u64 = 300;
/// Vertical drift below this is finger noise, not a drag.
pub const DRAG_START_PX: f64 = 5.0;
/// Releasing a drag past this displacement dismisses the sheet.
pub const DISMISS_DISTANCE_PX: f64 = 100.0;
/// Releasing a drag faster than this (px/ms downward) dismisses the sheet.
pub const DISMISS_VELOCITY_PX_PER_MS: f64 = 0.5;
/// Resting offset of a fully hidden sheet.
pub const SHEET_OFFSCREEN_PX: f64 = 900.0;
