use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::capabilities::StoreResult;
use crate::gesture::{Surface, TimerId};
use crate::model::{FieldMap, SubjectId, SubjectRecord};

/// Everything that can happen to one card/sheet core: shell-originated
/// touches and edits, animation settlement reports, inbound collaborator
/// signals, and capability responses (boxed to keep the enum small).
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub enum Event {
    Noop,

    // Lifecycle
    CardMounted { record: SubjectRecord },
    BaselineRefreshed { fields: FieldMap },
    ExternalSelected { id: SubjectId },

    // Raw touch stream; timestamps are shell-provided milliseconds
    TouchDown { surface: Surface, y: f64, at_ms: u64 },
    TouchMove { surface: Surface, y: f64, at_ms: u64 },
    TouchUp { surface: Surface, y: f64, at_ms: u64 },
    DwellElapsed { id: TimerId },

    // Edit session
    FieldEdited { field: String, value: Value },
    DismissConfirmed,
    DismissCancelled,
    NoticeDismissed,

    // Animation settlement reports from the shell
    SheetOpenSettled,
    SheetSnapSettled,
    SheetCloseSettled,

    // Capability responses
    DetailFetched { result: Box<StoreResult> },
    WriteCompleted { result: Box<StoreResult> },
}

impl Event {
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Noop => "noop",
            Self::CardMounted { .. } => "card_mounted",
            Self::BaselineRefreshed { .. } => "baseline_refreshed",
            Self::ExternalSelected { .. } => "external_selected",
            Self::TouchDown { .. } => "touch_down",
            Self::TouchMove { .. } => "touch_move",
            Self::TouchUp { .. } => "touch_up",
            Self::DwellElapsed { .. } => "dwell_elapsed",
            Self::FieldEdited { .. } => "field_edited",
            Self::DismissConfirmed => "dismiss_confirmed",
            Self::DismissCancelled => "dismiss_cancelled",
            Self::NoticeDismissed => "notice_dismissed",
            Self::SheetOpenSettled => "sheet_open_settled",
            Self::SheetSnapSettled => "sheet_snap_settled",
            Self::SheetCloseSettled => "sheet_close_settled",
            Self::DetailFetched { .. } => "detail_fetched",
            Self::WriteCompleted { .. } => "write_completed",
        }
    }

    /// True for events that originate from a finger on the screen.
    #[must_use]
    pub const fn is_user_initiated(&self) -> bool {
        matches!(
            self,
            Self::TouchDown { .. }
                | Self::TouchMove { .. }
                | Self::TouchUp { .. }
                | Self::FieldEdited { .. }
                | Self::DismissConfirmed
                | Self::DismissCancelled
                | Self::NoticeDismissed
        )
    }
}
