use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::domain::{
    BrokerTier, CommissionPlan, Enquiry, EnquiryId, FollowUpEvent, FollowUpKind, PartnerId,
    PropertyId, SalesPersonId,
};

/// Repository record: the enquiry row plus its append-only timeline and the
/// optimistic-concurrency version used to serialize transitions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnquiryRecord {
    pub enquiry: Enquiry,
    pub events: Vec<FollowUpEvent>,
    pub version: u64,
}

impl EnquiryRecord {
    /// Booking is inferred from the timeline, not from `enquiry.status`,
    /// since the status field can be overwritten independently.
    pub fn is_booked(&self) -> bool {
        self.events
            .last()
            .map(|event| event.kind == FollowUpKind::Token)
            .unwrap_or(false)
    }

    pub fn booking(&self) -> Option<&FollowUpEvent> {
        self.events
            .iter()
            .rev()
            .find(|event| event.kind == FollowUpKind::Token)
    }

    pub fn status_view(&self) -> EnquiryStatusView {
        EnquiryStatusView {
            enquiry_id: self.enquiry.enquiry_id.clone(),
            reference_code: self.enquiry.reference_code.clone(),
            status: self.enquiry.status.label(),
            booked: self.is_booked(),
            broker_tier: self.enquiry.broker_chain.tier().map(BrokerTier::label),
            sales_person_id: self.enquiry.sales_person_id.clone(),
        }
    }
}

/// Storage abstraction so the service module can be exercised in isolation.
///
/// `update` is a compare-and-swap on `version`: implementations must reject
/// a record whose version no longer matches the stored row and bump the
/// version on success.
pub trait EnquiryRepository: Send + Sync {
    fn insert(&self, record: EnquiryRecord) -> Result<EnquiryRecord, RepositoryError>;
    fn update(&self, record: EnquiryRecord) -> Result<EnquiryRecord, RepositoryError>;
    fn fetch(&self, id: &EnquiryId) -> Result<Option<EnquiryRecord>, RepositoryError>;
    fn open(&self, limit: usize) -> Result<Vec<EnquiryRecord>, RepositoryError>;
    /// Reserve a customer-facing reference code, returning false when the
    /// code is already taken. The uniqueness constraint lives here, not in
    /// the caller's retry loop.
    fn reserve_code(&self, code: &str) -> Result<bool, RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("stale version: stored {stored}, submitted {submitted}")]
    StaleVersion { stored: u64, submitted: u64 },
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Read-only lookup into the external property catalog.
pub trait PropertyCatalog: Send + Sync {
    fn commission_plan(&self, property: &PropertyId)
        -> Result<Option<CommissionPlan>, CatalogError>;
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("property catalog unavailable: {0}")]
    Unavailable(String),
}

/// Read-only identity checks against the external partner directory.
pub trait PartnerDirectory: Send + Sync {
    fn partner_exists(&self, tier: BrokerTier, partner: &PartnerId)
        -> Result<bool, DirectoryError>;
}

#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    #[error("partner directory unavailable: {0}")]
    Unavailable(String),
}

/// Outbound email/SMS seam. Delivery is fire-and-forget: a failure here
/// never rolls back the lifecycle transition that triggered it.
pub trait NotificationPublisher: Send + Sync {
    fn publish(&self, notice: EnquiryNotice) -> Result<(), NotificationError>;
}

/// Notification payload so routes/tests can assert integration boundaries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnquiryNotice {
    pub template: String,
    pub enquiry_id: EnquiryId,
    pub details: BTreeMap<String, String>,
}

#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    #[error("notification transport unavailable: {0}")]
    Transport(String),
}

/// Sanitized representation of an enquiry's exposed status.
#[derive(Debug, Clone, Serialize)]
pub struct EnquiryStatusView {
    pub enquiry_id: EnquiryId,
    pub reference_code: String,
    pub status: &'static str,
    pub booked: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub broker_tier: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sales_person_id: Option<SalesPersonId>,
}
