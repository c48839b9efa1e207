use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::codes::{self, CodeError};
use super::commission::{self, CommissionError};
use super::domain::{
    parse_visit_date, BrokerChain, BrokerTier, Enquiry, EnquiryId, EnquiryStatus, FollowUpEvent,
    FollowUpId, FollowUpKind, PartnerId, PropertyId, SalesPersonId, TokenDetails,
};
use super::intake::{self, NewEnquiry, ValidationError};
use super::lifecycle::{self, LifecycleError};
use super::repository::{
    CatalogError, DirectoryError, EnquiryNotice, EnquiryRecord, EnquiryRepository,
    NotificationPublisher, PartnerDirectory, PropertyCatalog, RepositoryError,
};

/// Service composing the lifecycle guards, commission engine, and the
/// storage/catalog/directory/notification ports.
pub struct EnquiryService<R, P, D, N> {
    repository: Arc<R>,
    properties: Arc<P>,
    directory: Arc<D>,
    notifications: Arc<N>,
}

static ENQUIRY_SEQUENCE: AtomicU64 = AtomicU64::new(1);
static FOLLOW_UP_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_enquiry_id() -> EnquiryId {
    let id = ENQUIRY_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    EnquiryId(format!("enq-{id:06}"))
}

fn next_follow_up_id() -> FollowUpId {
    let id = FOLLOW_UP_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    FollowUpId(format!("fup-{id:06}"))
}

// A transition loses the compare-and-swap only to a concurrent writer on
// the same enquiry; re-reading immediately re-runs the guards against the
// winner's state.
const TRANSITION_ATTEMPTS: usize = 3;

/// Visit scheduling input. The visit date is mandatory here, unlike on
/// follow-up notes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisitRequest {
    pub visit_date: NaiveDate,
    pub remark: String,
    #[serde(default)]
    pub status_label: Option<String>,
}

/// Follow-up note input. `visit_date` is free text from the caller and is
/// dropped when it does not parse as a calendar date.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FollowUpRequest {
    pub remark: String,
    #[serde(default)]
    pub visit_date: Option<String>,
    #[serde(default)]
    pub status_label: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancelRequest {
    pub remark: String,
    #[serde(default)]
    pub status_label: Option<String>,
}

/// Booking input: all five business fields are mandatory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingRequest {
    pub payment_type: String,
    pub token_amount: Decimal,
    pub deal_amount: Decimal,
    pub remark: String,
    pub payment_proof_url: String,
    #[serde(default)]
    pub status_label: Option<String>,
}

impl<R, P, D, N> EnquiryService<R, P, D, N>
where
    R: EnquiryRepository + 'static,
    P: PropertyCatalog + 'static,
    D: PartnerDirectory + 'static,
    N: NotificationPublisher + 'static,
{
    pub fn new(
        repository: Arc<R>,
        properties: Arc<P>,
        directory: Arc<D>,
        notifications: Arc<N>,
    ) -> Self {
        Self {
            repository,
            properties,
            directory,
            notifications,
        }
    }

    /// Record a new enquiry, returning the repository-backed record.
    pub fn create(&self, new: NewEnquiry) -> Result<EnquiryRecord, EnquiryServiceError> {
        let chain = intake::validate_new_enquiry(&new)?;
        if let (Some(tier), Some(partner)) = (chain.tier(), chain.partner()) {
            self.ensure_partner_known(tier, partner)?;
        }

        let reference_code = codes::generate_reference_code(self.repository.as_ref())?;
        let now = Utc::now();
        let enquiry = Enquiry {
            enquiry_id: next_enquiry_id(),
            reference_code,
            customer_name: new.customer_name,
            contact: new.contact,
            category: new.category,
            state: new.state,
            city: new.city,
            min_budget: new.min_budget,
            max_budget: new.max_budget,
            source: new.source,
            property_id: new.property_id,
            status: EnquiryStatus::New,
            broker_chain: chain,
            sales_person_id: None,
            created_at: now,
            updated_at: now,
        };

        let stored = self.repository.insert(EnquiryRecord {
            enquiry,
            events: Vec::new(),
            version: 0,
        })?;
        info!(enquiry = %stored.enquiry.enquiry_id, source = stored.enquiry.source.label(), "enquiry recorded");
        Ok(stored)
    }

    /// Route the enquiry to an internal salesperson. Updates the enquiry
    /// record only; no timeline entry is appended.
    pub fn assign(
        &self,
        id: &EnquiryId,
        sales_person: SalesPersonId,
    ) -> Result<EnquiryRecord, EnquiryServiceError> {
        let record = self.transition(id, |record| {
            record.enquiry.status = lifecycle::status_after_assign(record.enquiry.status)?;
            record.enquiry.sales_person_id = Some(sales_person.clone());
            record.enquiry.updated_at = Utc::now();
            Ok(())
        })?;

        let mut details = BTreeMap::new();
        details.insert("sales_person".to_string(), sales_person.0.clone());
        self.notify("enquiry_assigned", &record.enquiry.enquiry_id, details);
        Ok(record)
    }

    pub fn schedule_visit(
        &self,
        id: &EnquiryId,
        request: VisitRequest,
    ) -> Result<FollowUpEvent, EnquiryServiceError> {
        if request.remark.trim().is_empty() {
            return Err(ValidationError::MissingRemark.into());
        }

        let record = self.transition(id, |record| {
            self.append_event(
                record,
                FollowUpKind::VisitScheduled,
                request.remark.clone(),
                Some(request.visit_date),
                request.status_label.clone(),
                None,
            )
        })?;
        latest_event(&record)
    }

    pub fn add_follow_up(
        &self,
        id: &EnquiryId,
        request: FollowUpRequest,
    ) -> Result<FollowUpEvent, EnquiryServiceError> {
        if request.remark.trim().is_empty() {
            return Err(ValidationError::MissingRemark.into());
        }
        let visit_date = request
            .visit_date
            .as_deref()
            .and_then(parse_visit_date);

        let record = self.transition(id, |record| {
            self.append_event(
                record,
                FollowUpKind::FollowUp,
                request.remark.clone(),
                visit_date,
                request.status_label.clone(),
                None,
            )
        })?;
        latest_event(&record)
    }

    pub fn cancel(
        &self,
        id: &EnquiryId,
        request: CancelRequest,
    ) -> Result<FollowUpEvent, EnquiryServiceError> {
        if request.remark.trim().is_empty() {
            return Err(ValidationError::MissingRemark.into());
        }

        let record = self.transition(id, |record| {
            self.append_event(
                record,
                FollowUpKind::Cancelled,
                request.remark.clone(),
                None,
                request.status_label.clone(),
                None,
            )
        })?;
        latest_event(&record)
    }

    /// Book the enquiry: resolve the split policy from the broker chain,
    /// compute the exact breakdown, and persist it on the Token event in
    /// the same transition.
    pub fn book(
        &self,
        id: &EnquiryId,
        request: BookingRequest,
    ) -> Result<FollowUpEvent, EnquiryServiceError> {
        validate_booking(&request)?;

        let record = self.transition(id, |record| {
            lifecycle::ensure_open(record.enquiry.status)?;

            let property_id = record
                .enquiry
                .property_id
                .clone()
                .ok_or(ValidationError::MissingProperty)?;
            let plan = self
                .properties
                .commission_plan(&property_id)?
                .ok_or_else(|| EnquiryServiceError::PropertyNotFound(property_id.clone()))?;
            let breakdown =
                commission::breakdown_for(&record.enquiry.broker_chain, &plan, request.deal_amount)?;

            self.append_event(
                record,
                FollowUpKind::Token,
                request.remark.clone(),
                None,
                request.status_label.clone(),
                Some(TokenDetails {
                    payment_type: request.payment_type.clone(),
                    token_amount: request.token_amount,
                    deal_amount: request.deal_amount,
                    payment_proof_url: request.payment_proof_url.clone(),
                    breakdown,
                }),
            )
        })?;

        info!(enquiry = %record.enquiry.enquiry_id, "enquiry booked");
        latest_event(&record)
    }

    /// Move the enquiry to a different broker tier. Setting one tier clears
    /// the other two; the chain is frozen once a commission exists.
    pub fn assign_broker(
        &self,
        id: &EnquiryId,
        tier: BrokerTier,
        partner: PartnerId,
    ) -> Result<EnquiryRecord, EnquiryServiceError> {
        self.ensure_partner_known(tier, &partner)?;

        let record = self.transition(id, |record| {
            if record.is_booked() || record.enquiry.status == EnquiryStatus::Token {
                return Err(EnquiryServiceError::ConflictingBrokerAssignment);
            }
            record.enquiry.broker_chain = BrokerChain::with_tier(tier, partner.clone());
            record.enquiry.updated_at = Utc::now();
            Ok(())
        })?;

        let mut details = BTreeMap::new();
        details.insert("tier".to_string(), tier.label().to_string());
        details.insert("partner".to_string(), partner.0.clone());
        self.notify("broker_chain_updated", &record.enquiry.enquiry_id, details);
        Ok(record)
    }

    pub fn get(&self, id: &EnquiryId) -> Result<EnquiryRecord, EnquiryServiceError> {
        let record = self
            .repository
            .fetch(id)?
            .ok_or(RepositoryError::NotFound)?;
        Ok(record)
    }

    /// The enquiry's timeline, oldest first. Repeated calls return the same
    /// sequence absent new events.
    pub fn timeline(&self, id: &EnquiryId) -> Result<Vec<FollowUpEvent>, EnquiryServiceError> {
        Ok(self.get(id)?.events)
    }

    pub fn open(&self, limit: usize) -> Result<Vec<EnquiryRecord>, EnquiryServiceError> {
        Ok(self.repository.open(limit)?)
    }

    /// Fetch-guard-write loop. The repository's version check serializes
    /// concurrent transitions on the same enquiry: the loser re-reads and
    /// re-validates against the winner's state, so a finalized enquiry
    /// surfaces `EnquiryAlreadyFinalized` rather than a second write.
    fn transition<F>(&self, id: &EnquiryId, mutate: F) -> Result<EnquiryRecord, EnquiryServiceError>
    where
        F: Fn(&mut EnquiryRecord) -> Result<(), EnquiryServiceError>,
    {
        for _ in 0..TRANSITION_ATTEMPTS {
            let mut record = self
                .repository
                .fetch(id)?
                .ok_or(RepositoryError::NotFound)?;
            mutate(&mut record)?;
            match self.repository.update(record) {
                Ok(stored) => return Ok(stored),
                Err(RepositoryError::StaleVersion { .. }) => continue,
                Err(other) => return Err(other.into()),
            }
        }
        Err(EnquiryServiceError::Repository(RepositoryError::Unavailable(
            format!("transition on {id} contended past {TRANSITION_ATTEMPTS} attempts"),
        )))
    }

    fn append_event(
        &self,
        record: &mut EnquiryRecord,
        kind: FollowUpKind,
        remark: String,
        visit_date: Option<NaiveDate>,
        status_label: Option<String>,
        token: Option<TokenDetails>,
    ) -> Result<(), EnquiryServiceError> {
        record.enquiry.status = lifecycle::status_after_event(record.enquiry.status, kind)?;
        let now = Utc::now();
        record.enquiry.updated_at = now;
        record.events.push(FollowUpEvent {
            follow_up_id: next_follow_up_id(),
            enquiry_id: record.enquiry.enquiry_id.clone(),
            kind,
            remark,
            visit_date,
            status_at_event: status_label,
            token,
            recorded_at: now,
        });
        Ok(())
    }

    fn ensure_partner_known(
        &self,
        tier: BrokerTier,
        partner: &PartnerId,
    ) -> Result<(), EnquiryServiceError> {
        if self.directory.partner_exists(tier, partner)? {
            Ok(())
        } else {
            Err(ValidationError::UnknownPartner {
                tier: tier.label(),
                partner: partner.0.clone(),
            }
            .into())
        }
    }

    fn notify(&self, template: &str, enquiry_id: &EnquiryId, details: BTreeMap<String, String>) {
        let notice = EnquiryNotice {
            template: template.to_string(),
            enquiry_id: enquiry_id.clone(),
            details,
        };
        if let Err(err) = self.notifications.publish(notice) {
            warn!(enquiry = %enquiry_id, error = %err, "notification dropped");
        }
    }
}

fn latest_event(record: &EnquiryRecord) -> Result<FollowUpEvent, EnquiryServiceError> {
    record
        .events
        .last()
        .cloned()
        .ok_or_else(|| {
            EnquiryServiceError::Repository(RepositoryError::Unavailable(
                "timeline entry missing after transition".to_string(),
            ))
        })
}

fn validate_booking(request: &BookingRequest) -> Result<(), ValidationError> {
    if request.payment_type.trim().is_empty() {
        return Err(ValidationError::MissingPaymentType);
    }
    if request.token_amount <= Decimal::ZERO {
        return Err(ValidationError::NonPositiveTokenAmount(request.token_amount));
    }
    if request.deal_amount <= Decimal::ZERO {
        return Err(ValidationError::NonPositiveDealAmount(request.deal_amount));
    }
    if request.remark.trim().is_empty() {
        return Err(ValidationError::MissingRemark);
    }
    if request.payment_proof_url.trim().is_empty() {
        return Err(ValidationError::MissingPaymentProof);
    }
    Ok(())
}

/// Error raised by the enquiry service.
#[derive(Debug, thiserror::Error)]
pub enum EnquiryServiceError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),
    #[error(transparent)]
    Commission(#[from] CommissionError),
    #[error("broker chain is locked once the enquiry is booked")]
    ConflictingBrokerAssignment,
    #[error("unknown property '{0}'")]
    PropertyNotFound(PropertyId),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error(transparent)]
    Directory(#[from] DirectoryError),
    #[error(transparent)]
    Code(#[from] CodeError),
}
