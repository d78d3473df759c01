//! [`Command`] definition.

pub mod advance_negotiation;
pub mod apply_scheduled_statuses;
pub mod attach_negotiation;
pub mod cancel_financial_entry;
pub mod close_maintenance;
pub mod create_negotiation;
pub mod create_property;
pub mod escalate_overdue_entries;
pub mod handle_move_out_notice;
pub mod open_maintenance;
pub mod open_remediation;
pub mod raise_pending_block;
pub mod register_financial_entry;
pub mod register_payment;
pub mod release_negotiation;
pub mod resolve_remediation;
pub mod sweep_expired_proposals;
pub mod sync_overdue_remediations;
pub mod sync_pending_status;

/// [`Command`] of the [`Service`].
///
/// [`Service`]: crate::Service
pub use common::Handler as Command;

pub use self::{
    advance_negotiation::AdvanceNegotiation,
    apply_scheduled_statuses::ApplyScheduledStatuses,
    attach_negotiation::AttachNegotiation,
    cancel_financial_entry::CancelFinancialEntry,
    close_maintenance::CloseMaintenance,
    create_negotiation::CreateNegotiation, create_property::CreateProperty,
    escalate_overdue_entries::EscalateOverdueEntries,
    handle_move_out_notice::HandleMoveOutNotice,
    open_maintenance::OpenMaintenance, open_remediation::OpenRemediation,
    raise_pending_block::RaisePendingBlock,
    register_financial_entry::RegisterFinancialEntry,
    register_payment::RegisterPayment,
    release_negotiation::ReleaseNegotiation,
    resolve_remediation::ResolveRemediation,
    sweep_expired_proposals::SweepExpiredProposals,
    sync_overdue_remediations::SyncOverdueRemediations,
    sync_pending_status::SyncPendingStatus,
};

/// Outcome of a sweep [`Command`] processing a batch of items one by one.
///
/// A failed item never stops the sweep.
#[derive(Debug)]
pub struct SweepReport<Id, E> {
    /// IDs of the successfully processed items.
    pub processed: Vec<Id>,

    /// IDs of the failed items along with their errors.
    pub failed: Vec<(Id, E)>,
}

impl<Id, E> Default for SweepReport<Id, E> {
    fn default() -> Self {
        Self {
            processed: Vec::new(),
            failed: Vec::new(),
        }
    }
}

impl<Id, E> SweepReport<Id, E> {
    /// Indicates whether no item has failed.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}
