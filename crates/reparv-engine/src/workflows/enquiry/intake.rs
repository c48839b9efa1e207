use std::io::Read;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};

use super::domain::{BrokerChain, BrokerChainError, EnquirySource, PartnerId, PropertyId};
use super::repository::{
    EnquiryRepository, NotificationPublisher, PartnerDirectory, PropertyCatalog,
};
use super::service::EnquiryService;

/// Inbound enquiry payload from the web form, a partner app, or a CSV row.
/// Broker tiers arrive as three nullable columns and are collapsed into a
/// [`BrokerChain`] during validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewEnquiry {
    pub customer_name: String,
    pub contact: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub min_budget: Decimal,
    #[serde(default)]
    pub max_budget: Decimal,
    pub source: EnquirySource,
    #[serde(default)]
    pub property_id: Option<PropertyId>,
    #[serde(default)]
    pub sales_broker: Option<PartnerId>,
    #[serde(default)]
    pub territory_broker: Option<PartnerId>,
    #[serde(default)]
    pub project_broker: Option<PartnerId>,
}

/// Missing or malformed required fields, surfaced before anything is stored.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("customer name is required")]
    MissingCustomerName,
    #[error("contact is required")]
    MissingContact,
    #[error("budget range is invalid (min {min}, max {max})")]
    InvalidBudgetRange { min: Decimal, max: Decimal },
    #[error("remark is required")]
    MissingRemark,
    #[error("payment type is required")]
    MissingPaymentType,
    #[error("token amount must be positive, got {0}")]
    NonPositiveTokenAmount(Decimal),
    #[error("deal amount must be positive, got {0}")]
    NonPositiveDealAmount(Decimal),
    #[error("payment proof is required")]
    MissingPaymentProof,
    #[error("enquiry has no property attached")]
    MissingProperty,
    #[error(transparent)]
    BrokerChain(#[from] BrokerChainError),
    #[error("unknown {tier} partner '{partner}'")]
    UnknownPartner { tier: &'static str, partner: String },
}

pub(crate) fn validate_new_enquiry(new: &NewEnquiry) -> Result<BrokerChain, ValidationError> {
    if new.customer_name.trim().is_empty() {
        return Err(ValidationError::MissingCustomerName);
    }
    if new.contact.trim().is_empty() {
        return Err(ValidationError::MissingContact);
    }
    if new.min_budget < Decimal::ZERO || new.max_budget < new.min_budget {
        return Err(ValidationError::InvalidBudgetRange {
            min: new.min_budget,
            max: new.max_budget,
        });
    }

    let chain = BrokerChain::from_fields(
        new.sales_broker.clone(),
        new.territory_broker.clone(),
        new.project_broker.clone(),
    )?;
    Ok(chain)
}

/// Outcome of a CSV batch: stored enquiry ids plus per-row rejections.
/// A bad row never aborts the batch.
#[derive(Debug, Default)]
pub struct ImportOutcome {
    pub created: Vec<super::domain::EnquiryId>,
    pub rejected: Vec<ImportRejection>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportRejection {
    pub line: usize,
    pub reason: String,
}

/// Import enquiries from a CSV export. Rows are parsed leniently: empty
/// cells become absent values and budgets default to zero.
pub fn import_enquiries<Rd, R, P, D, N>(
    reader: Rd,
    service: &EnquiryService<R, P, D, N>,
) -> Result<ImportOutcome, csv::Error>
where
    Rd: Read,
    R: EnquiryRepository + 'static,
    P: PropertyCatalog + 'static,
    D: PartnerDirectory + 'static,
    N: NotificationPublisher + 'static,
{
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut outcome = ImportOutcome::default();
    for (index, record) in csv_reader.deserialize::<EnquiryRow>().enumerate() {
        // Header occupies line 1.
        let line = index + 2;
        let row = match record {
            Ok(row) => row,
            Err(err) => {
                outcome.rejected.push(ImportRejection {
                    line,
                    reason: err.to_string(),
                });
                continue;
            }
        };

        let new = match row.into_new_enquiry() {
            Ok(new) => new,
            Err(reason) => {
                outcome.rejected.push(ImportRejection { line, reason });
                continue;
            }
        };

        match service.create(new) {
            Ok(record) => outcome.created.push(record.enquiry.enquiry_id),
            Err(err) => outcome.rejected.push(ImportRejection {
                line,
                reason: err.to_string(),
            }),
        }
    }

    Ok(outcome)
}

#[derive(Debug, Deserialize)]
struct EnquiryRow {
    #[serde(rename = "Customer Name")]
    customer_name: String,
    #[serde(rename = "Contact")]
    contact: String,
    #[serde(rename = "Category", default)]
    category: String,
    #[serde(rename = "State", default)]
    state: String,
    #[serde(rename = "City", default)]
    city: String,
    #[serde(rename = "Min Budget", default, deserialize_with = "empty_string_as_none")]
    min_budget: Option<String>,
    #[serde(rename = "Max Budget", default, deserialize_with = "empty_string_as_none")]
    max_budget: Option<String>,
    #[serde(rename = "Property", default, deserialize_with = "empty_string_as_none")]
    property: Option<String>,
    #[serde(rename = "Sales Broker", default, deserialize_with = "empty_string_as_none")]
    sales_broker: Option<String>,
    #[serde(
        rename = "Territory Broker",
        default,
        deserialize_with = "empty_string_as_none"
    )]
    territory_broker: Option<String>,
    #[serde(
        rename = "Project Broker",
        default,
        deserialize_with = "empty_string_as_none"
    )]
    project_broker: Option<String>,
}

impl EnquiryRow {
    fn into_new_enquiry(self) -> Result<NewEnquiry, String> {
        let min_budget = parse_budget(self.min_budget.as_deref(), "Min Budget")?;
        let max_budget = parse_budget(self.max_budget.as_deref(), "Max Budget")?;

        Ok(NewEnquiry {
            customer_name: self.customer_name,
            contact: self.contact,
            category: self.category,
            state: self.state,
            city: self.city,
            min_budget,
            max_budget,
            source: EnquirySource::CsvFile,
            property_id: self.property.map(PropertyId),
            sales_broker: self.sales_broker.map(PartnerId),
            territory_broker: self.territory_broker.map(PartnerId),
            project_broker: self.project_broker.map(PartnerId),
        })
    }
}

fn parse_budget(raw: Option<&str>, column: &str) -> Result<Decimal, String> {
    match raw {
        None => Ok(Decimal::ZERO),
        Some(value) => Decimal::from_str(value)
            .map_err(|_| format!("{column} '{value}' is not a number")),
    }
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}
