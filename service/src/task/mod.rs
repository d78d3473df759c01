//! Background [`Task`]s definitions.

pub mod apply_scheduled_statuses;
mod background;
pub mod escalate_overdue_entries;
pub mod expire_proposals;
pub mod sync_overdue_remediations;

pub use common::Handler as Task;

pub use self::{
    apply_scheduled_statuses::ApplyScheduledStatuses,
    background::{Background, Stopped},
    escalate_overdue_entries::EscalateOverdueEntries,
    expire_proposals::ExpireProposals,
    sync_overdue_remediations::SyncOverdueRemediations,
};
