use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

use crate::gesture::{GestureConfig, GestureDecoder};
use crate::motion::{MotionConfig, SheetMotion};
use crate::overlay::EditOverlay;

/// Opaque field mapping for a subject record. The core never interprets
/// values; it only compares, clones, and forwards them.
pub type FieldMap = BTreeMap<String, Value>;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash)]
pub struct SubjectId(pub String);

impl SubjectId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SubjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Which remote table the card fronts. The shell routes store operations
/// accordingly; the core treats both identically.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SubjectKind {
    Order,
    Product,
}

impl SubjectKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Order => "order",
            Self::Product => "product",
        }
    }
}

impl fmt::Display for SubjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The remote-owned entity a card represents. `fields` is the baseline:
/// last known server values, read-only to this core.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct SubjectRecord {
    pub id: SubjectId,
    pub kind: SubjectKind,
    pub fields: FieldMap,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum InteractionState {
    /// Card only, no sheet mounted.
    #[default]
    Collapsed,
    /// Sheet open, read-only.
    Viewing,
    /// Sheet open, fields mutable.
    Editing,
    /// Write in flight, inputs disabled.
    Saving,
}

impl InteractionState {
    #[must_use]
    pub const fn is_open(self) -> bool {
        matches!(self, Self::Viewing | Self::Editing | Self::Saving)
    }
}

impl fmt::Display for InteractionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// What to do when a dismiss gesture lands while the sheet is in `Editing`
/// with unsaved changes. The confirmation UX belongs to the shell; the core
/// only withholds the close until `DismissConfirmed` arrives.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum DismissPolicy {
    #[default]
    DiscardSilently,
    Confirm,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Default)]
pub struct SessionConfig {
    pub gesture: GestureConfig,
    pub motion: MotionConfig,
    pub dismiss_policy: DismissPolicy,
}

/// A user-facing notice. Only write failures produce one; everything else
/// degrades silently (see the error policy in `app`).
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct UserNotice {
    pub message: String,
    pub retryable: bool,
}

/// State for one card/sheet pair. One subject, one core instance; two cards
/// for the same subject id hold fully independent edit state.
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct Model {
    pub config: SessionConfig,
    pub subject: Option<SubjectRecord>,

    pub state: InteractionState,
    pub overlay: EditOverlay,
    pub motion: SheetMotion,
    pub decoder: GestureDecoder,

    /// Detail fields have been merged into the baseline this session.
    pub detail_loaded: bool,
    /// A detail fetch is in flight; used to issue at most one per open.
    pub detail_inflight: bool,
    /// Minimal diff sent with the in-flight write, kept until it resolves.
    pub pending_write: Option<FieldMap>,
    /// At least one write succeeded this session; drives the close-time
    /// refresh notification.
    pub saved_this_session: bool,
    /// Waiting on the shell to confirm discarding unsaved edits.
    pub pending_discard: bool,

    pub notice: Option<UserNotice>,
}

impl Model {
    #[must_use]
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            decoder: GestureDecoder::new(config.gesture),
            ..Self::default()
        }
    }

    /// Seed the card with its subject record. Resets any previous session.
    pub fn mount(&mut self, record: SubjectRecord) {
        self.overlay = EditOverlay::new(record.fields.clone());
        self.subject = Some(record);
        self.state = InteractionState::Collapsed;
        self.motion = SheetMotion::default();
        self.decoder = GestureDecoder::new(self.config.gesture);
        self.detail_loaded = false;
        self.detail_inflight = false;
        self.pending_write = None;
        self.saved_this_session = false;
        self.pending_discard = false;
        self.notice = None;
    }

    #[must_use]
    pub fn is_subject(&self, id: &SubjectId) -> bool {
        self.subject.as_ref().map(|s| &s.id == id).unwrap_or(false)
    }
}
