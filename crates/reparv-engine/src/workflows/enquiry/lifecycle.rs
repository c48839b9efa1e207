use super::domain::{EnquiryStatus, FollowUpKind};

/// Transition guard failures. Terminal states accept no further action.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum LifecycleError {
    #[error("enquiry is already finalized as '{terminal}'")]
    EnquiryAlreadyFinalized { terminal: &'static str },
}

pub(crate) fn ensure_open(status: EnquiryStatus) -> Result<(), LifecycleError> {
    if status.is_terminal() {
        return Err(LifecycleError::EnquiryAlreadyFinalized {
            terminal: status.label(),
        });
    }
    Ok(())
}

/// Salesperson assignment moves New leads into Assigned. A reassignment on
/// an enquiry that already progressed keeps the current pipeline stage.
pub(crate) fn status_after_assign(current: EnquiryStatus) -> Result<EnquiryStatus, LifecycleError> {
    ensure_open(current)?;
    match current {
        EnquiryStatus::New | EnquiryStatus::Assigned => Ok(EnquiryStatus::Assigned),
        other => Ok(other),
    }
}

/// Status reached by appending a timeline event of the given kind.
pub(crate) fn status_after_event(
    current: EnquiryStatus,
    kind: FollowUpKind,
) -> Result<EnquiryStatus, LifecycleError> {
    ensure_open(current)?;
    Ok(match kind {
        FollowUpKind::VisitScheduled => EnquiryStatus::VisitScheduled,
        FollowUpKind::FollowUp => EnquiryStatus::FollowUp,
        FollowUpKind::Cancelled => EnquiryStatus::Cancelled,
        FollowUpKind::Token => EnquiryStatus::Token,
    })
}
