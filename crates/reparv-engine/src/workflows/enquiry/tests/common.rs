use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use rust_decimal::Decimal;
use serde_json::Value;

use crate::workflows::enquiry::domain::{
    BrokerTier, CommissionPlan, EnquiryId, EnquirySource, PartnerId, PropertyId,
};
use crate::workflows::enquiry::intake::NewEnquiry;
use crate::workflows::enquiry::repository::{
    CatalogError, DirectoryError, EnquiryNotice, EnquiryRecord, EnquiryRepository,
    NotificationError, NotificationPublisher, PartnerDirectory, PropertyCatalog, RepositoryError,
};
use crate::workflows::enquiry::service::{BookingRequest, EnquiryService};

pub(super) type MemoryService =
    EnquiryService<MemoryRepository, MemoryCatalog, MemoryDirectory, MemoryNotifications>;

pub(super) fn build_service() -> (
    Arc<MemoryService>,
    Arc<MemoryRepository>,
    Arc<MemoryNotifications>,
) {
    let repository = Arc::new(MemoryRepository::default());
    let notifications = Arc::new(MemoryNotifications::default());
    let service = Arc::new(EnquiryService::new(
        repository.clone(),
        Arc::new(MemoryCatalog::seeded()),
        Arc::new(MemoryDirectory::seeded()),
        notifications.clone(),
    ));
    (service, repository, notifications)
}

pub(super) fn sales_lead() -> NewEnquiry {
    NewEnquiry {
        customer_name: "Asha Kulkarni".to_string(),
        contact: "+91-98220-11223".to_string(),
        category: "2BHK".to_string(),
        state: "Maharashtra".to_string(),
        city: "Nagpur".to_string(),
        min_budget: Decimal::from(3_500_000u32),
        max_budget: Decimal::from(5_000_000u32),
        source: EnquirySource::Onsite,
        property_id: Some(PropertyId("P-1001".to_string())),
        sales_broker: Some(PartnerId("SP-100".to_string())),
        territory_broker: None,
        project_broker: None,
    }
}

pub(super) fn house_lead() -> NewEnquiry {
    NewEnquiry {
        sales_broker: None,
        source: EnquirySource::LandingPage,
        ..sales_lead()
    }
}

pub(super) fn booking_request() -> BookingRequest {
    BookingRequest {
        payment_type: "UPI".to_string(),
        token_amount: Decimal::from(50_000u32),
        deal_amount: Decimal::from(1_000_000u32),
        remark: "Token received at site office".to_string(),
        payment_proof_url: "https://storage.reparv.in/proofs/upi-88271.jpg".to_string(),
        status_label: Some("Token".to_string()),
    }
}

pub(super) async fn read_json_body(response: axum::response::Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

#[derive(Default)]
pub(super) struct MemoryRepository {
    records: Mutex<HashMap<EnquiryId, EnquiryRecord>>,
    codes: Mutex<HashSet<String>>,
}

impl EnquiryRepository for MemoryRepository {
    fn insert(&self, record: EnquiryRecord) -> Result<EnquiryRecord, RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        if guard.contains_key(&record.enquiry.enquiry_id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(record.enquiry.enquiry_id.clone(), record.clone());
        Ok(record)
    }

    fn update(&self, mut record: EnquiryRecord) -> Result<EnquiryRecord, RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        let stored = guard
            .get(&record.enquiry.enquiry_id)
            .ok_or(RepositoryError::NotFound)?;
        if stored.version != record.version {
            return Err(RepositoryError::StaleVersion {
                stored: stored.version,
                submitted: record.version,
            });
        }
        record.version += 1;
        guard.insert(record.enquiry.enquiry_id.clone(), record.clone());
        Ok(record)
    }

    fn fetch(&self, id: &EnquiryId) -> Result<Option<EnquiryRecord>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn open(&self, limit: usize) -> Result<Vec<EnquiryRecord>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        let mut records: Vec<_> = guard
            .values()
            .filter(|record| !record.enquiry.status.is_terminal())
            .cloned()
            .collect();
        records.sort_by(|a, b| a.enquiry.created_at.cmp(&b.enquiry.created_at));
        records.truncate(limit);
        Ok(records)
    }

    fn reserve_code(&self, code: &str) -> Result<bool, RepositoryError> {
        let mut guard = self.codes.lock().expect("code mutex poisoned");
        Ok(guard.insert(code.to_string()))
    }
}

/// Repository whose code reservations always collide, to exercise the
/// bounded retry.
#[derive(Default)]
pub(super) struct SaturatedCodesRepository {
    inner: MemoryRepository,
}

impl EnquiryRepository for SaturatedCodesRepository {
    fn insert(&self, record: EnquiryRecord) -> Result<EnquiryRecord, RepositoryError> {
        self.inner.insert(record)
    }

    fn update(&self, record: EnquiryRecord) -> Result<EnquiryRecord, RepositoryError> {
        self.inner.update(record)
    }

    fn fetch(&self, id: &EnquiryId) -> Result<Option<EnquiryRecord>, RepositoryError> {
        self.inner.fetch(id)
    }

    fn open(&self, limit: usize) -> Result<Vec<EnquiryRecord>, RepositoryError> {
        self.inner.open(limit)
    }

    fn reserve_code(&self, _code: &str) -> Result<bool, RepositoryError> {
        Ok(false)
    }
}

pub(super) struct UnavailableRepository;

impl EnquiryRepository for UnavailableRepository {
    fn insert(&self, _record: EnquiryRecord) -> Result<EnquiryRecord, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn update(&self, _record: EnquiryRecord) -> Result<EnquiryRecord, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn fetch(&self, _id: &EnquiryId) -> Result<Option<EnquiryRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn open(&self, _limit: usize) -> Result<Vec<EnquiryRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn reserve_code(&self, _code: &str) -> Result<bool, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

pub(super) struct MemoryCatalog {
    plans: HashMap<PropertyId, CommissionPlan>,
}

impl MemoryCatalog {
    pub(super) fn seeded() -> Self {
        let mut plans = HashMap::new();
        plans.insert(
            PropertyId("P-1001".to_string()),
            CommissionPlan::Percentage {
                percent: Decimal::from(2u32),
            },
        );
        plans.insert(
            PropertyId("P-2002".to_string()),
            CommissionPlan::Flat {
                amount: Decimal::from(150_000u32),
            },
        );
        Self { plans }
    }
}

impl PropertyCatalog for MemoryCatalog {
    fn commission_plan(
        &self,
        property: &PropertyId,
    ) -> Result<Option<CommissionPlan>, CatalogError> {
        Ok(self.plans.get(property).cloned())
    }
}

pub(super) struct MemoryDirectory {
    sales: HashSet<String>,
    territory: HashSet<String>,
    project: HashSet<String>,
}

impl MemoryDirectory {
    pub(super) fn seeded() -> Self {
        Self {
            sales: HashSet::from(["SP-100".to_string()]),
            territory: HashSet::from(["TP-200".to_string()]),
            project: HashSet::from(["PP-300".to_string()]),
        }
    }
}

impl PartnerDirectory for MemoryDirectory {
    fn partner_exists(
        &self,
        tier: BrokerTier,
        partner: &PartnerId,
    ) -> Result<bool, DirectoryError> {
        let known = match tier {
            BrokerTier::Sales => &self.sales,
            BrokerTier::Territory => &self.territory,
            BrokerTier::Project => &self.project,
        };
        Ok(known.contains(&partner.0))
    }
}

#[derive(Default)]
pub(super) struct MemoryNotifications {
    events: Mutex<Vec<EnquiryNotice>>,
}

impl MemoryNotifications {
    pub(super) fn events(&self) -> Vec<EnquiryNotice> {
        self.events.lock().expect("notice mutex poisoned").clone()
    }
}

impl NotificationPublisher for MemoryNotifications {
    fn publish(&self, notice: EnquiryNotice) -> Result<(), NotificationError> {
        self.events
            .lock()
            .expect("notice mutex poisoned")
            .push(notice);
        Ok(())
    }
}

pub(super) struct FailingNotifications;

impl NotificationPublisher for FailingNotifications {
    fn publish(&self, _notice: EnquiryNotice) -> Result<(), NotificationError> {
        Err(NotificationError::Transport("smtp relay down".to_string()))
    }
}
