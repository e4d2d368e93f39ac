//! Remote store capability: the only persistence surface the core knows.
//!
//! The shell owns the actual database/RPC plumbing; the core speaks this
//! interface and nothing else. Fetch happens once per sheet-open (after the
//! open animation settles), writes carry a minimal field diff, and the
//! refresh notification is fire-and-forget.

use crux_core::capability::{Capability, CapabilityContext, Operation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{FieldMap, SubjectId, SubjectKind};

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub enum StoreOperation {
    /// Full-record fetch for a subject; resolves to `Detail`.
    FetchDetail { kind: SubjectKind, id: SubjectId },
    /// Persist changed fields only; resolves to `Written` with the fields
    /// the store acknowledged.
    Write {
        kind: SubjectKind,
        id: SubjectId,
        fields: FieldMap,
    },
    /// The baseline for this id is stale; whoever owns the list should
    /// re-fetch. Never awaited.
    NotifyRefresh { id: SubjectId },
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub enum StoreOutput {
    Detail { fields: FieldMap },
    Written { fields: FieldMap },
    Ack,
}

#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
pub enum StoreError {
    #[error("network error: {message}")]
    Network { message: String },

    #[error("request timed out")]
    Timeout,

    #[error("store rejected the operation: {message}")]
    Rejected { message: String },

    #[error("record not found")]
    NotFound,
}

impl StoreError {
    #[must_use]
    pub fn user_facing_message(&self) -> String {
        match self {
            Self::Network { .. } => {
                "Couldn't save. Check your connection and try again.".into()
            }
            Self::Timeout => "Saving timed out. Please try again.".into(),
            Self::Rejected { message } => message.clone(),
            Self::NotFound => "This item no longer exists.".into(),
        }
    }
}

pub type StoreResult = Result<StoreOutput, StoreError>;

impl Operation for StoreOperation {
    type Output = StoreResult;
}

pub struct Store<Ev> {
    context: CapabilityContext<StoreOperation, Ev>,
}

impl<Ev> Capability<Ev> for Store<Ev> {
    type Operation = StoreOperation;
    type MappedSelf<MappedEv> = Store<MappedEv>;

    fn map_event<F, NewEv>(&self, f: F) -> Self::MappedSelf<NewEv>
    where
        F: Fn(NewEv) -> Ev + Send + Sync + 'static,
        Ev: 'static,
        NewEv: 'static,
    {
        Store::new(self.context.map_event(f))
    }
}

impl<Ev> Store<Ev>
where
    Ev: 'static,
{
    #[must_use]
    pub fn new(context: CapabilityContext<StoreOperation, Ev>) -> Self {
        Self { context }
    }

    pub fn fetch_detail<F>(&self, kind: SubjectKind, id: SubjectId, make_event: F)
    where
        F: FnOnce(StoreResult) -> Ev + Send + 'static,
    {
        let ctx = self.context.clone();
        self.context.spawn(async move {
            let response = ctx
                .request_from_shell(StoreOperation::FetchDetail { kind, id })
                .await;
            ctx.update_app(make_event(response));
        });
    }

    pub fn write<F>(&self, kind: SubjectKind, id: SubjectId, fields: FieldMap, make_event: F)
    where
        F: FnOnce(StoreResult) -> Ev + Send + 'static,
    {
        let ctx = self.context.clone();
        self.context.spawn(async move {
            let response = ctx
                .request_from_shell(StoreOperation::Write { kind, id, fields })
                .await;
            ctx.update_app(make_event(response));
        });
    }

    pub fn notify_refresh(&self, id: SubjectId) {
        let ctx = self.context.clone();
        self.context.spawn(async move {
            ctx.notify_shell(StoreOperation::NotifyRefresh { id }).await;
        });
    }
}
