//! Gesture classifier: turns a raw touch stream into discrete, mutually
//! exclusive intents.
//!
//! The decoder is a small finite-state machine with two named timeouts
//! injected as configuration: the long-press dwell (a real timer, owned by
//! the shell and referenced here by [`TimerId`]) and the double-tap window
//! (a rolling timestamp comparison, no timer at all). Timestamps come from
//! the shell inside touch events, so the decoder is deterministic and
//! testable without any rendering or clock.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{DOUBLE_TAP_WINDOW_MS, DRAG_START_PX, LONG_PRESS_DWELL_MS};

/// Identifies one shell-side dwell timer. A fired timer whose id no longer
/// matches the decoder's pending id is stale and ignored.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TimerId(pub Uuid);

impl TimerId {
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

/// Where a touch landed.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Surface {
    Card,
    Sheet,
    Backdrop,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct GestureConfig {
    /// Minimum hold before a press becomes a long-press.
    pub dwell_ms: u64,
    /// Maximum interval between two taps read as one double-tap.
    pub double_tap_window_ms: u64,
    /// Vertical displacement below which a press is not yet a drag.
    pub drag_start_px: f64,
    /// Release displacement past which a drag commits to dismiss.
    pub dismiss_distance_px: f64,
    /// Release velocity (px/ms) past which a drag commits to dismiss.
    pub dismiss_velocity: f64,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            dwell_ms: LONG_PRESS_DWELL_MS,
            double_tap_window_ms: DOUBLE_TAP_WINDOW_MS,
            drag_start_px: DRAG_START_PX,
            dismiss_distance_px: crate::DISMISS_DISTANCE_PX,
            dismiss_velocity: crate::DISMISS_VELOCITY_PX_PER_MS,
        }
    }
}

/// A classified gesture. Variants are mutually exclusive for any one touch
/// sequence: a press that fired its dwell never also produces a tap, and a
/// press that became a drag produces neither.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum GestureIntent {
    Tap { surface: Surface },
    DoubleTap { surface: Surface },
    LongPress { surface: Surface },
    DragMove { surface: Surface, delta_y: f64 },
    DragRelease { surface: Surface, displacement: f64, velocity: f64 },
}

/// Timer work the caller must forward to the timer capability.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TimerDirective {
    Start { id: TimerId, duration_ms: u64 },
    Cancel { id: TimerId },
}

/// A tracked velocity older than this at release time is stale: the finger
/// stopped and held, so the release velocity is recomputed over the gap
/// instead of reusing the last move-to-move figure.
const VELOCITY_FRESH_MS: u64 = 80;

/// Result of feeding one touch event into the decoder.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Classified {
    pub intent: Option<GestureIntent>,
    pub timer: Option<TimerDirective>,
}

impl Classified {
    const NONE: Self = Self {
        intent: None,
        timer: None,
    };
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Default)]
enum Pointer {
    #[default]
    Idle,
    Pressed {
        surface: Surface,
        origin_y: f64,
        dwell: TimerId,
        /// The dwell fired while held; the eventual release is inert.
        dwell_fired: bool,
    },
    Dragging {
        surface: Surface,
        origin_y: f64,
        last_y: f64,
        last_at_ms: u64,
        velocity: f64,
    },
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default)]
pub struct GestureDecoder {
    config: GestureConfig,
    pointer: Pointer,
    /// Rolling memory for double-tap matching: surface and release time of
    /// the previous tap. Cleared on a successful match so a third tap is
    /// not misread as starting a new pair.
    last_tap: Option<(Surface, u64)>,
}

impl GestureDecoder {
    #[must_use]
    pub fn new(config: GestureConfig) -> Self {
        Self {
            config,
            pointer: Pointer::Idle,
            last_tap: None,
        }
    }

    #[must_use]
    pub const fn config(&self) -> &GestureConfig {
        &self.config
    }

    pub fn touch_down(&mut self, surface: Surface, y: f64, _at_ms: u64) -> Classified {
        // A down while already tracking means the shell dropped an up event;
        // start over. Any previous dwell timer goes stale and its id will no
        // longer match when it fires.
        let id = TimerId::generate();
        self.pointer = Pointer::Pressed {
            surface,
            origin_y: y,
            dwell: id,
            dwell_fired: false,
        };
        Classified {
            intent: None,
            timer: Some(TimerDirective::Start {
                id,
                duration_ms: self.config.dwell_ms,
            }),
        }
    }

    pub fn touch_move(&mut self, y: f64, at_ms: u64) -> Classified {
        match self.pointer {
            Pointer::Pressed {
                surface,
                origin_y,
                dwell,
                dwell_fired,
            } => {
                let delta = y - origin_y;
                if delta.abs() <= self.config.drag_start_px {
                    // Below tolerance: not a drag, dwell keeps running.
                    return Classified::NONE;
                }
                self.pointer = Pointer::Dragging {
                    surface,
                    origin_y,
                    last_y: y,
                    last_at_ms: at_ms,
                    velocity: 0.0,
                };
                Classified {
                    intent: Some(GestureIntent::DragMove { surface, delta_y: delta }),
                    timer: (!dwell_fired).then_some(TimerDirective::Cancel { id: dwell }),
                }
            }
            Pointer::Dragging {
                surface,
                origin_y,
                last_y,
                last_at_ms,
                ..
            } => {
                let dt_ms = at_ms.saturating_sub(last_at_ms).max(1) as f64;
                let velocity = (y - last_y) / dt_ms;
                self.pointer = Pointer::Dragging {
                    surface,
                    origin_y,
                    last_y: y,
                    last_at_ms: at_ms,
                    velocity,
                };
                Classified {
                    intent: Some(GestureIntent::DragMove {
                        surface,
                        delta_y: y - origin_y,
                    }),
                    timer: None,
                }
            }
            Pointer::Idle => Classified::NONE,
        }
    }

    pub fn touch_up(&mut self, y: f64, at_ms: u64) -> Classified {
        match self.pointer {
            Pointer::Pressed {
                surface,
                dwell,
                dwell_fired,
                ..
            } => {
                self.pointer = Pointer::Idle;
                if dwell_fired {
                    // The long-press already happened; releasing is inert.
                    return Classified::NONE;
                }
                let intent = match self.last_tap {
                    Some((prev_surface, prev_at))
                        if prev_surface == surface
                            && at_ms.saturating_sub(prev_at)
                                <= self.config.double_tap_window_ms =>
                    {
                        self.last_tap = None;
                        GestureIntent::DoubleTap { surface }
                    }
                    _ => {
                        self.last_tap = Some((surface, at_ms));
                        GestureIntent::Tap { surface }
                    }
                };
                Classified {
                    intent: Some(intent),
                    timer: Some(TimerDirective::Cancel { id: dwell }),
                }
            }
            Pointer::Dragging {
                surface,
                origin_y,
                last_y,
                last_at_ms,
                velocity,
            } => {
                self.pointer = Pointer::Idle;
                let gap_ms = at_ms.saturating_sub(last_at_ms);
                // A flick followed by holding still must not release with
                // the flick's velocity.
                let velocity = if gap_ms <= VELOCITY_FRESH_MS {
                    velocity
                } else {
                    (y - last_y) / gap_ms.max(1) as f64
                };
                Classified {
                    intent: Some(GestureIntent::DragRelease {
                        surface,
                        displacement: y - origin_y,
                        velocity,
                    }),
                    timer: None,
                }
            }
            Pointer::Idle => Classified::NONE,
        }
    }

    /// A shell dwell timer elapsed. Stale ids (released, dragged away, or
    /// reset) are ignored without effect.
    pub fn dwell_elapsed(&mut self, id: TimerId) -> Classified {
        match self.pointer {
            Pointer::Pressed {
                surface,
                origin_y,
                dwell,
                dwell_fired: false,
            } if dwell == id => {
                self.pointer = Pointer::Pressed {
                    surface,
                    origin_y,
                    dwell,
                    dwell_fired: true,
                };
                Classified {
                    intent: Some(GestureIntent::LongPress { surface }),
                    timer: None,
                }
            }
            _ => Classified::NONE,
        }
    }

    /// Drop all in-progress gesture state, returning a cancel for any dwell
    /// timer still pending. Called when the sheet closes and on entry into
    /// `Saving`, which must never race a long-press.
    pub fn reset(&mut self) -> Option<TimerDirective> {
        let cancel = self.pending_dwell().map(|id| TimerDirective::Cancel { id });
        self.pointer = Pointer::Idle;
        self.last_tap = None;
        cancel
    }

    fn pending_dwell(&self) -> Option<TimerId> {
        match self.pointer {
            Pointer::Pressed {
                dwell,
                dwell_fired: false,
                ..
            } => Some(dwell),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decoder() -> GestureDecoder {
        GestureDecoder::new(GestureConfig::default())
    }

    fn dwell_id(c: &Classified) -> TimerId {
        match c.timer {
            Some(TimerDirective::Start { id, .. }) => id,
            other => panic!("expected dwell start, got {other:?}"),
        }
    }

    #[test]
    fn press_release_is_a_tap() {
        let mut d = decoder();
        let down = d.touch_down(Surface::Card, 10.0, 1_000);
        assert!(down.intent.is_none());
        assert!(matches!(
            down.timer,
            Some(TimerDirective::Start { duration_ms: 600, .. })
        ));

        let up = d.touch_up(10.0, 1_100);
        assert_eq!(up.intent, Some(GestureIntent::Tap { surface: Surface::Card }));
        assert!(matches!(up.timer, Some(TimerDirective::Cancel { .. })));
    }

    #[test]
    fn hold_past_dwell_is_a_long_press_and_release_is_inert() {
        let mut d = decoder();
        let id = dwell_id(&d.touch_down(Surface::Sheet, 0.0, 0));

        let fired = d.dwell_elapsed(id);
        assert_eq!(
            fired.intent,
            Some(GestureIntent::LongPress { surface: Surface::Sheet })
        );

        let up = d.touch_up(0.0, 700);
        assert!(up.intent.is_none(), "release after dwell must not be a tap");
    }

    #[test]
    fn release_before_dwell_cancels_without_long_press() {
        let mut d = decoder();
        let id = dwell_id(&d.touch_down(Surface::Card, 0.0, 0));

        // Held 500 ms then released: under the 600 ms dwell.
        let up = d.touch_up(0.0, 500);
        assert_eq!(up.intent, Some(GestureIntent::Tap { surface: Surface::Card }));

        // The (now stale) timer firing later must do nothing.
        assert_eq!(d.dwell_elapsed(id), Classified::NONE);
    }

    #[test]
    fn two_taps_within_window_are_a_double_tap() {
        let mut d = decoder();
        d.touch_down(Surface::Sheet, 0.0, 0);
        d.touch_up(0.0, 50);
        d.touch_down(Surface::Sheet, 0.0, 250);
        let up = d.touch_up(0.0, 300);
        assert_eq!(
            up.intent,
            Some(GestureIntent::DoubleTap { surface: Surface::Sheet })
        );
    }

    #[test]
    fn taps_outside_window_stay_independent() {
        let mut d = decoder();
        d.touch_down(Surface::Sheet, 0.0, 0);
        d.touch_up(0.0, 0);
        d.touch_down(Surface::Sheet, 0.0, 400);
        let up = d.touch_up(0.0, 400);
        assert_eq!(up.intent, Some(GestureIntent::Tap { surface: Surface::Sheet }));
    }

    #[test]
    fn third_tap_does_not_chain_onto_a_matched_pair() {
        let mut d = decoder();
        d.touch_down(Surface::Sheet, 0.0, 0);
        d.touch_up(0.0, 0);
        d.touch_down(Surface::Sheet, 0.0, 100);
        assert!(matches!(
            d.touch_up(0.0, 100).intent,
            Some(GestureIntent::DoubleTap { .. })
        ));
        // Tap memory was reset: this third tap starts a new pair.
        d.touch_down(Surface::Sheet, 0.0, 200);
        assert!(matches!(
            d.touch_up(0.0, 200).intent,
            Some(GestureIntent::Tap { .. })
        ));
    }

    #[test]
    fn taps_on_different_surfaces_do_not_pair() {
        let mut d = decoder();
        d.touch_down(Surface::Card, 0.0, 0);
        d.touch_up(0.0, 0);
        d.touch_down(Surface::Sheet, 0.0, 100);
        assert!(matches!(
            d.touch_up(0.0, 100).intent,
            Some(GestureIntent::Tap { .. })
        ));
    }

    #[test]
    fn sub_threshold_move_is_not_a_drag() {
        let mut d = decoder();
        d.touch_down(Surface::Sheet, 100.0, 0);
        assert_eq!(d.touch_move(104.0, 16), Classified::NONE);
        // Still a tap on release.
        assert!(matches!(
            d.touch_up(104.0, 120).intent,
            Some(GestureIntent::Tap { .. })
        ));
    }

    #[test]
    fn crossing_threshold_starts_a_drag_and_cancels_the_dwell() {
        let mut d = decoder();
        let id = dwell_id(&d.touch_down(Surface::Sheet, 100.0, 0));

        let mv = d.touch_move(110.0, 16);
        assert_eq!(
            mv.intent,
            Some(GestureIntent::DragMove { surface: Surface::Sheet, delta_y: 10.0 })
        );
        assert_eq!(mv.timer, Some(TimerDirective::Cancel { id }));
        assert_eq!(d.dwell_elapsed(id), Classified::NONE);
    }

    #[test]
    fn drag_release_reports_displacement_and_velocity() {
        let mut d = decoder();
        d.touch_down(Surface::Sheet, 0.0, 0);
        d.touch_move(20.0, 16);
        d.touch_move(80.0, 116); // 60 px over 100 ms -> 0.6 px/ms
        let up = d.touch_up(80.0, 120);
        match up.intent {
            Some(GestureIntent::DragRelease {
                displacement,
                velocity,
                ..
            }) => {
                assert!((displacement - 80.0).abs() < f64::EPSILON);
                assert!((velocity - 0.6).abs() < 1e-9);
            }
            other => panic!("expected drag release, got {other:?}"),
        }
    }

    #[test]
    fn flick_then_hold_releases_with_decayed_velocity() {
        let mut d = decoder();
        d.touch_down(Surface::Sheet, 0.0, 0);
        d.touch_move(20.0, 16);
        d.touch_move(90.0, 116); // 0.7 px/ms at the last move
        // Finger stops and holds for 300 ms before letting go; the flick
        // velocity is stale by then.
        let up = d.touch_up(90.0, 416);
        match up.intent {
            Some(GestureIntent::DragRelease { velocity, .. }) => {
                assert!(
                    velocity.abs() < 0.01,
                    "stale flick velocity must decay, got {velocity}"
                );
            }
            other => panic!("expected drag release, got {other:?}"),
        }
    }

    #[test]
    fn drag_does_not_produce_a_tap() {
        let mut d = decoder();
        d.touch_down(Surface::Sheet, 0.0, 0);
        d.touch_move(50.0, 50);
        d.touch_up(50.0, 80);
        // Next press/release must be a plain tap, not a double-tap paired
        // with the drag.
        d.touch_down(Surface::Sheet, 0.0, 100);
        assert!(matches!(
            d.touch_up(0.0, 150).intent,
            Some(GestureIntent::Tap { .. })
        ));
    }

    #[test]
    fn reset_cancels_a_pending_dwell() {
        let mut d = decoder();
        let id = dwell_id(&d.touch_down(Surface::Sheet, 0.0, 0));
        assert_eq!(d.reset(), Some(TimerDirective::Cancel { id }));
        assert_eq!(d.reset(), None);
        assert_eq!(d.dwell_elapsed(id), Classified::NONE);
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        #[derive(Clone, Debug)]
        enum Step {
            Down(Surface, f64),
            Move(f64),
            Up(f64),
        }

        fn surface() -> impl Strategy<Value = Surface> {
            prop_oneof![
                Just(Surface::Card),
                Just(Surface::Sheet),
                Just(Surface::Backdrop)
            ]
        }

        fn step() -> impl Strategy<Value = Step> {
            prop_oneof![
                (surface(), -200.0..200.0f64).prop_map(|(s, y)| Step::Down(s, y)),
                (-200.0..200.0f64).prop_map(Step::Move),
                (-200.0..200.0f64).prop_map(Step::Up),
            ]
        }

        proptest! {
            // Without any dwell timer firing, no sequence of touches can
            // ever produce a long-press.
            #[test]
            fn no_long_press_without_dwell(steps in proptest::collection::vec(step(), 0..60)) {
                let mut d = decoder();
                let mut t = 0u64;
                for s in steps {
                    t += 17;
                    let out = match s {
                        Step::Down(surface, y) => d.touch_down(surface, y, t),
                        Step::Move(y) => d.touch_move(y, t),
                        Step::Up(y) => d.touch_up(y, t),
                    };
                    let long_press = matches!(out.intent, Some(GestureIntent::LongPress { .. }));
                    prop_assert!(!long_press, "long-press without a dwell fire");
                }
            }

            // Every started dwell timer is eventually cancelled or fires at
            // most once; a stale fire never classifies.
            #[test]
            fn stale_dwell_never_fires(steps in proptest::collection::vec(step(), 1..60)) {
                let mut d = decoder();
                let mut t = 0u64;
                let mut stale: Vec<TimerId> = Vec::new();
                for s in steps {
                    t += 17;
                    let out = match s {
                        Step::Down(surface, y) => d.touch_down(surface, y, t),
                        Step::Move(y) => d.touch_move(y, t),
                        Step::Up(y) => d.touch_up(y, t),
                    };
                    if let Some(TimerDirective::Cancel { id }) = out.timer {
                        stale.push(id);
                    }
                    for id in &stale {
                        prop_assert_eq!(d.dwell_elapsed(*id), Classified::NONE);
                    }
                }
            }
        }
    }
}
