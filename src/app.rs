//! The card/sheet interaction state machine.
//!
//! One touchable surface serves as both a summary card and, on demand, a
//! full editable detail sheet. All transitions are driven by classified
//! gestures (see `gesture`), animation settlement reports from the shell,
//! and store results. The machine is: Collapsed, Viewing, Editing, Saving.

use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use crate::capabilities::{
    HapticIntensity, Haptics, Render, Store, StoreOutput, Timer, TimerOutput,
};
use crate::event::Event;
use crate::gesture::{Classified, GestureIntent, Surface, TimerDirective};
use crate::model::{
    DismissPolicy, FieldMap, InteractionState, Model, SubjectKind, UserNotice,
};
use crate::motion::{MotionCue, MotionPhase};

#[derive(Default)]
pub struct App;

#[derive(crux_core::macros::Effect)]
#[effect(app = "App")]
pub struct Capabilities {
    pub render: Render<Event>,
    pub store: Store<Event>,
    pub haptics: Haptics<Event>,
    pub timer: Timer<Event>,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SheetMode {
    Viewing,
    Editing,
    Saving,
    /// Dismiss animation still playing; fields are frozen.
    Closing,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct SheetView {
    pub mode: SheetMode,
    /// Fields resolved through the optimistic overlay.
    pub fields: FieldMap,
    pub has_changes: bool,
    /// Render the save affordance (editing with unsaved changes).
    pub show_save_affordance: bool,
    /// False while a write is in flight.
    pub inputs_enabled: bool,
    pub detail_loaded: bool,
    pub offset: f64,
    pub opacity: f64,
    pub motion: MotionCue,
    /// The shell should ask before discarding unsaved edits.
    pub confirm_discard: bool,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
pub struct ViewModel {
    pub subject_id: Option<String>,
    pub subject_kind: Option<SubjectKind>,
    /// Summary values for the collapsed card (saved snapshot over baseline).
    pub card_fields: FieldMap,
    pub sheet: Option<SheetView>,
    pub notice: Option<UserNotice>,
}

impl App {
    fn dispatch_timer(directive: TimerDirective, caps: &Capabilities) {
        match directive {
            TimerDirective::Start { id, duration_ms } => {
                caps.timer.start(id, duration_ms, |output| match output {
                    TimerOutput::Elapsed { id } => Event::DwellElapsed { id },
                    TimerOutput::Cancelled { .. } => Event::Noop,
                });
            }
            TimerDirective::Cancel { id } => caps.timer.cancel(id),
        }
    }

    fn apply(&self, classified: Classified, model: &mut Model, caps: &Capabilities) {
        if let Some(directive) = classified.timer {
            Self::dispatch_timer(directive, caps);
        }
        if let Some(intent) = classified.intent {
            self.on_intent(intent, model, caps);
            caps.render.render();
        }
    }

    fn on_intent(&self, intent: GestureIntent, model: &mut Model, caps: &Capabilities) {
        if model.state == InteractionState::Saving {
            // A write is in flight: nothing may re-enter editing or queue a
            // second write until it resolves.
            debug!(?intent, "gesture ignored while saving");
            return;
        }
        // One pulse per discrete gesture. Drag frames arrive continuously
        // while the finger moves; the release gets its own pulse.
        if !matches!(intent, GestureIntent::DragMove { .. }) {
            caps.haptics.pulse(HapticIntensity::Light);
        }

        match intent {
            GestureIntent::Tap { surface: Surface::Card } => {
                if Self::can_open(model) {
                    Self::open_sheet(model, InteractionState::Viewing);
                }
            }
            GestureIntent::LongPress { surface: Surface::Card } => {
                // Shortcut: open the sheet directly into edit mode.
                if Self::can_open(model) {
                    Self::open_sheet(model, InteractionState::Editing);
                    model.overlay.begin_edit();
                }
            }
            GestureIntent::Tap { surface: Surface::Backdrop } => {
                if model.state.is_open() {
                    self.request_dismiss(model, caps);
                }
            }
            GestureIntent::Tap { surface: Surface::Sheet } => {
                // A lone tap in the sheet does nothing; it only matters as
                // half of a potential double-tap.
            }
            GestureIntent::DoubleTap { surface: Surface::Sheet } => {
                self.on_sheet_double_tap(model, caps);
            }
            GestureIntent::DoubleTap { surface: Surface::Card | Surface::Backdrop } => {}
            GestureIntent::LongPress { surface: Surface::Sheet } => {
                // No-op when already editing; never restarts a save.
                if model.state == InteractionState::Viewing {
                    model.overlay.begin_edit();
                    model.state = InteractionState::Editing;
                    debug!("viewing -> editing (long-press)");
                }
            }
            GestureIntent::LongPress { surface: Surface::Backdrop } => {}
            GestureIntent::DragMove { surface: Surface::Sheet, delta_y } => {
                if model.state.is_open() {
                    let cfg = model.config.motion;
                    model.motion.track(&cfg, delta_y);
                }
            }
            GestureIntent::DragRelease {
                surface: Surface::Sheet,
                displacement,
                velocity,
            } => {
                if model.state.is_open() && model.motion.phase == MotionPhase::Tracking {
                    let g = model.config.gesture;
                    if displacement > g.dismiss_distance_px || velocity > g.dismiss_velocity {
                        self.request_dismiss(model, caps);
                    } else {
                        model.motion.snap_back();
                    }
                }
            }
            GestureIntent::DragMove { surface: Surface::Card | Surface::Backdrop, .. }
            | GestureIntent::DragRelease { surface: Surface::Card | Surface::Backdrop, .. } => {}
        }
    }

    fn can_open(model: &Model) -> bool {
        model.subject.is_some()
            && model.state == InteractionState::Collapsed
            && model.motion.phase == MotionPhase::Hidden
    }

    fn open_sheet(model: &mut Model, target: InteractionState) {
        let cfg = model.config.motion;
        model.motion.begin_open(&cfg);
        model.state = target;
        model.notice = None;
        debug!(state = %model.state, "sheet opening");
    }

    /// Any close request funnels through here so the confirmation policy is
    /// applied uniformly to tap-outside, double-tap, and drag-dismiss.
    fn request_dismiss(&self, model: &mut Model, caps: &Capabilities) {
        let unsaved = model.state == InteractionState::Editing && model.overlay.has_changes();
        if unsaved && model.config.dismiss_policy == DismissPolicy::Confirm {
            model.pending_discard = true;
            model.motion.snap_back();
            return;
        }
        Self::begin_close(model, caps);
    }

    fn begin_close(model: &mut Model, caps: &Capabilities) {
        if let Some(cancel) = model.decoder.reset() {
            Self::dispatch_timer(cancel, caps);
        }
        if model.state == InteractionState::Editing {
            // Unsaved edits are discarded silently; the Confirm policy has
            // already had its say by the time we get here.
            model.overlay.discard_edit();
        }
        model.state = InteractionState::Collapsed;
        model.pending_discard = false;
        model.motion.begin_close();
        debug!("sheet closing");
    }

    fn on_sheet_double_tap(&self, model: &mut Model, caps: &Capabilities) {
        match model.state {
            InteractionState::Editing => {
                if model.overlay.has_changes() {
                    Self::begin_save(model, caps);
                } else {
                    model.overlay.discard_edit();
                    model.state = InteractionState::Viewing;
                    debug!("editing -> viewing (no changes, buffer discarded)");
                }
            }
            InteractionState::Viewing => Self::begin_close(model, caps),
            InteractionState::Collapsed | InteractionState::Saving => {}
        }
    }

    fn begin_save(model: &mut Model, caps: &Capabilities) {
        let Some(subject) = &model.subject else {
            return;
        };
        let diff = model.overlay.changed_fields();
        if diff.is_empty() {
            model.overlay.discard_edit();
            model.state = InteractionState::Viewing;
            return;
        }
        // Entering Saving must first invalidate any pending long-press
        // timer; the two are never honored concurrently.
        if let Some(cancel) = model.decoder.reset() {
            Self::dispatch_timer(cancel, caps);
        }
        model.pending_write = Some(diff.clone());
        model.state = InteractionState::Saving;
        debug!(fields = diff.len(), "editing -> saving");
        caps.store
            .write(subject.kind, subject.id.clone(), diff, |result| {
                Event::WriteCompleted {
                    result: Box::new(result),
                }
            });
    }

    fn finish_save(model: &mut Model, caps: &Capabilities, written: FieldMap) {
        model.overlay.commit_saved(written);
        model.pending_write = None;
        model.state = InteractionState::Viewing;
        model.saved_this_session = true;
        caps.haptics.pulse(HapticIntensity::Medium);
        debug!("saving -> viewing (write succeeded)");
    }
}

impl crux_core::App for App {
    type Event = Event;
    type Model = Model;
    type ViewModel = ViewModel;
    type Capabilities = Capabilities;

    fn update(&self, event: Event, model: &mut Model, caps: &Capabilities) {
        debug!(event = event.name(), "update");

        match event {
            Event::Noop => {}

            Event::CardMounted { record } => {
                model.mount(record);
                caps.render.render();
            }

            Event::BaselineRefreshed { fields } => {
                // Authoritative refresh from the owning collaborator. Never
                // touches the edit buffer or the saved snapshot.
                model.overlay.set_baseline(fields);
                caps.render.render();
            }

            Event::ExternalSelected { id } => {
                if model.is_subject(&id) && Self::can_open(model) {
                    Self::open_sheet(model, InteractionState::Viewing);
                    caps.render.render();
                }
            }

            Event::TouchDown { surface, y, at_ms } => {
                let classified = model.decoder.touch_down(surface, y, at_ms);
                self.apply(classified, model, caps);
            }
            Event::TouchMove { y, at_ms, .. } => {
                let classified = model.decoder.touch_move(y, at_ms);
                self.apply(classified, model, caps);
            }
            Event::TouchUp { y, at_ms, .. } => {
                let classified = model.decoder.touch_up(y, at_ms);
                self.apply(classified, model, caps);
            }
            Event::DwellElapsed { id } => {
                let classified = model.decoder.dwell_elapsed(id);
                self.apply(classified, model, caps);
            }

            Event::FieldEdited { field, value } => {
                if model.state == InteractionState::Editing
                    && model.overlay.edit_field(&field, value)
                {
                    caps.render.render();
                }
            }

            Event::DismissConfirmed => {
                if model.pending_discard {
                    Self::begin_close(model, caps);
                    caps.render.render();
                }
            }
            Event::DismissCancelled => {
                if model.pending_discard {
                    model.pending_discard = false;
                    caps.render.render();
                }
            }
            Event::NoticeDismissed => {
                model.notice = None;
                caps.render.render();
            }

            Event::SheetOpenSettled => {
                model.motion.open_settled();
                // Fetch the full record only now, after the entrance
                // animation, so decode work never contends with it.
                if model.state.is_open() && !model.detail_loaded && !model.detail_inflight {
                    if let Some(subject) = &model.subject {
                        model.detail_inflight = true;
                        caps.store
                            .fetch_detail(subject.kind, subject.id.clone(), |result| {
                                Event::DetailFetched {
                                    result: Box::new(result),
                                }
                            });
                    }
                }
                caps.render.render();
            }

            Event::SheetSnapSettled => {
                model.motion.snap_settled();
                caps.render.render();
            }

            Event::SheetCloseSettled => {
                if model.motion.phase != MotionPhase::Closing {
                    return;
                }
                let cfg = model.config.motion;
                model.motion.close_settled(&cfg);
                // Session state is cleared only now, after the close
                // animation, so nothing reading it mid-dismiss sees a blank.
                if model.saved_this_session {
                    if let Some(subject) = &model.subject {
                        caps.store.notify_refresh(subject.id.clone());
                    }
                }
                model.overlay.clear_session();
                model.detail_loaded = false;
                model.detail_inflight = false;
                model.pending_write = None;
                model.saved_this_session = false;
                model.pending_discard = false;
                caps.render.render();
            }

            Event::DetailFetched { result } => {
                model.detail_inflight = false;
                match *result {
                    Ok(StoreOutput::Detail { fields }) => {
                        model.overlay.merge_baseline(fields);
                        model.detail_loaded = true;
                    }
                    Ok(other) => {
                        warn!(output = ?other, "unexpected detail fetch output");
                    }
                    Err(e) => {
                        // Sheet stays usable in degraded read-only form; a
                        // log is all this failure gets.
                        warn!(error = %e, "detail fetch failed");
                    }
                }
                caps.render.render();
            }

            Event::WriteCompleted { result } => {
                if model.state != InteractionState::Saving {
                    debug!("stray write completion ignored");
                    return;
                }
                match *result {
                    Ok(StoreOutput::Written { fields }) => {
                        Self::finish_save(model, caps, fields);
                    }
                    Ok(_) => {
                        // Store acknowledged without echoing fields; fall
                        // back to the diff we sent.
                        let fields = model.pending_write.take().unwrap_or_default();
                        Self::finish_save(model, caps, fields);
                    }
                    Err(e) => {
                        error!(error = %e, "write failed; returning to editing");
                        model.state = InteractionState::Editing;
                        model.pending_write = None;
                        model.notice = Some(UserNotice {
                            message: e.user_facing_message(),
                            retryable: true,
                        });
                        caps.haptics.pulse(HapticIntensity::Heavy);
                    }
                }
                caps.render.render();
            }
        }
    }

    fn view(&self, model: &Model) -> ViewModel {
        // While a write is in flight the sheet keeps showing the buffer the
        // user just committed, with inputs disabled.
        let show_buffer = matches!(
            model.state,
            InteractionState::Editing | InteractionState::Saving
        );

        let sheet = model.motion.mounted().then(|| {
            let mode = match model.state {
                InteractionState::Viewing => SheetMode::Viewing,
                InteractionState::Editing => SheetMode::Editing,
                InteractionState::Saving => SheetMode::Saving,
                InteractionState::Collapsed => SheetMode::Closing,
            };
            let has_changes = model.overlay.has_changes();
            SheetView {
                mode,
                fields: model.overlay.display_fields(show_buffer),
                has_changes,
                show_save_affordance: model.state == InteractionState::Editing && has_changes,
                inputs_enabled: model.state == InteractionState::Editing,
                detail_loaded: model.detail_loaded,
                offset: model.motion.offset,
                opacity: model.motion.opacity,
                motion: model.motion.cue(&model.config.motion),
                confirm_discard: model.pending_discard,
            }
        });

        ViewModel {
            subject_id: model.subject.as_ref().map(|s| s.id.0.clone()),
            subject_kind: model.subject.as_ref().map(|s| s.kind),
            card_fields: model.overlay.display_fields(false),
            sheet,
            notice: model.notice.clone(),
        }
    }
}
