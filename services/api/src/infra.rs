use std::collections::{HashMap, HashSet};
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

use metrics_exporter_prometheus::PrometheusHandle;
use rust_decimal::Decimal;
use tracing::info;

use reparv_engine::workflows::enquiry::{
    BrokerTier, CatalogError, CommissionPlan, DirectoryError, EnquiryId, EnquiryNotice,
    EnquiryRecord, EnquiryRepository, NotificationError, NotificationPublisher, PartnerDirectory,
    PartnerId, PropertyCatalog, PropertyId, RepositoryError,
};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

#[derive(Default)]
pub(crate) struct InMemoryEnquiryRepository {
    records: Mutex<HashMap<EnquiryId, EnquiryRecord>>,
    codes: Mutex<HashSet<String>>,
}

impl EnquiryRepository for InMemoryEnquiryRepository {
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

/// Commission plans for the demo catalog. The production deployment reads
/// these from the property service instead.
pub(crate) struct SeedPropertyCatalog {
    plans: HashMap<PropertyId, CommissionPlan>,
}

impl Default for SeedPropertyCatalog {
    fn default() -> Self {
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

impl PropertyCatalog for SeedPropertyCatalog {
    fn commission_plan(
        &self,
        property: &PropertyId,
    ) -> Result<Option<CommissionPlan>, CatalogError> {
        Ok(self.plans.get(property).cloned())
    }
}

/// Stand-in for the partner directory service: every id is accepted, since
/// partner identity is owned by the external directory.
#[derive(Default)]
pub(crate) struct TrustingPartnerDirectory;

impl PartnerDirectory for TrustingPartnerDirectory {
    fn partner_exists(
        &self,
        _tier: BrokerTier,
        _partner: &PartnerId,
    ) -> Result<bool, DirectoryError> {
        Ok(true)
    }
}

/// Notification adapter that logs instead of sending email/SMS.
#[derive(Default)]
pub(crate) struct LoggingNotificationPublisher;

impl NotificationPublisher for LoggingNotificationPublisher {
    fn publish(&self, notice: EnquiryNotice) -> Result<(), NotificationError> {
        info!(
            enquiry = %notice.enquiry_id,
            template = %notice.template,
            "notification queued"
        );
        Ok(())
    }
}
