//! Enquiry lifecycle and commission allocation.
//!
//! An enquiry moves New -> Assigned -> {VisitScheduled <-> FollowUp} ->
//! {Token | Cancelled}; every transition except salesperson assignment
//! appends exactly one immutable timeline entry, and the Token transition
//! carries the computed commission breakdown. The modules here follow the
//! pipeline: `intake` validates what comes in, `lifecycle` guards the
//! state machine, `commission` resolves and computes the split, `service`
//! runs each action as one atomic transition against the repository port.

pub mod commission;
pub(crate) mod codes;
pub mod domain;
pub mod intake;
pub(crate) mod lifecycle;
pub mod repository;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use codes::CodeError;
pub use commission::{breakdown_for, compute, resolve_policy, CommissionError, SplitPolicy};
pub use domain::{
    parse_visit_date, BrokerChain, BrokerChainError, BrokerTier, CommissionBreakdown,
    CommissionPlan, Enquiry, EnquiryId, EnquirySource, EnquiryStatus, FollowUpEvent, FollowUpId,
    FollowUpKind, PartnerId, PropertyId, SalesPersonId, TokenDetails,
};
pub use intake::{import_enquiries, ImportOutcome, ImportRejection, NewEnquiry, ValidationError};
pub use lifecycle::LifecycleError;
pub use repository::{
    CatalogError, DirectoryError, EnquiryNotice, EnquiryRecord, EnquiryRepository,
    EnquiryStatusView, NotificationError, NotificationPublisher, PartnerDirectory,
    PropertyCatalog, RepositoryError,
};
pub use router::enquiry_router;
pub use service::{
    BookingRequest, CancelRequest, EnquiryService, EnquiryServiceError, FollowUpRequest,
    VisitRequest,
};
