use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Identifier wrapper for enquiries.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EnquiryId(pub String);

/// Identifier wrapper for timeline entries.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FollowUpId(pub String);

/// Identifier for a referring partner in any tier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PartnerId(pub String);

/// Identifier for an internal salesperson, independent of the broker chain.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SalesPersonId(pub String);

/// Identifier for a property in the external catalog.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PropertyId(pub String);

impl fmt::Display for EnquiryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for FollowUpId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for PartnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for SalesPersonId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for PropertyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Where the enquiry entered the funnel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnquirySource {
    Onsite,
    Direct,
    CsvFile,
    Ads,
    LandingPage,
}

impl EnquirySource {
    pub const fn label(self) -> &'static str {
        match self {
            EnquirySource::Onsite => "onsite",
            EnquirySource::Direct => "direct",
            EnquirySource::CsvFile => "csv_file",
            EnquirySource::Ads => "ads",
            EnquirySource::LandingPage => "landing_page",
        }
    }
}

/// Machine-governed lifecycle state. The caller-supplied status label on a
/// timeline entry is descriptive metadata and never consulted by guards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnquiryStatus {
    New,
    Assigned,
    VisitScheduled,
    FollowUp,
    Token,
    Cancelled,
}

impl EnquiryStatus {
    pub const fn label(self) -> &'static str {
        match self {
            EnquiryStatus::New => "new",
            EnquiryStatus::Assigned => "assigned",
            EnquiryStatus::VisitScheduled => "visit_scheduled",
            EnquiryStatus::FollowUp => "follow_up",
            EnquiryStatus::Token => "token",
            EnquiryStatus::Cancelled => "cancelled",
        }
    }

    pub const fn is_terminal(self) -> bool {
        matches!(self, EnquiryStatus::Token | EnquiryStatus::Cancelled)
    }
}

/// The partner tiers that can originate or own a lead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BrokerTier {
    Sales,
    Territory,
    Project,
}

impl BrokerTier {
    pub const fn label(self) -> &'static str {
        match self {
            BrokerTier::Sales => "sales",
            BrokerTier::Territory => "territory",
            BrokerTier::Project => "project",
        }
    }
}

/// The single partner tier credited with an enquiry. Exclusivity is
/// guaranteed by construction; raw column triples must pass through
/// [`BrokerChain::from_fields`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BrokerChain {
    House,
    Sales(PartnerId),
    Territory(PartnerId),
    Project(PartnerId),
}

impl BrokerChain {
    /// Build a chain from the three nullable broker columns, rejecting rows
    /// that populate more than one tier.
    pub fn from_fields(
        sales: Option<PartnerId>,
        territory: Option<PartnerId>,
        project: Option<PartnerId>,
    ) -> Result<Self, BrokerChainError> {
        let populated =
            usize::from(sales.is_some()) + usize::from(territory.is_some()) + usize::from(project.is_some());
        if populated > 1 {
            return Err(BrokerChainError::InvalidBrokerChain { populated });
        }

        if let Some(id) = sales {
            return Ok(BrokerChain::Sales(id));
        }
        if let Some(id) = territory {
            return Ok(BrokerChain::Territory(id));
        }
        if let Some(id) = project {
            return Ok(BrokerChain::Project(id));
        }
        Ok(BrokerChain::House)
    }

    pub fn with_tier(tier: BrokerTier, partner: PartnerId) -> Self {
        match tier {
            BrokerTier::Sales => BrokerChain::Sales(partner),
            BrokerTier::Territory => BrokerChain::Territory(partner),
            BrokerTier::Project => BrokerChain::Project(partner),
        }
    }

    pub fn tier(&self) -> Option<BrokerTier> {
        match self {
            BrokerChain::House => None,
            BrokerChain::Sales(_) => Some(BrokerTier::Sales),
            BrokerChain::Territory(_) => Some(BrokerTier::Territory),
            BrokerChain::Project(_) => Some(BrokerTier::Project),
        }
    }

    pub fn partner(&self) -> Option<&PartnerId> {
        match self {
            BrokerChain::House => None,
            BrokerChain::Sales(id) | BrokerChain::Territory(id) | BrokerChain::Project(id) => {
                Some(id)
            }
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum BrokerChainError {
    #[error("broker chain must name at most one partner tier, found {populated}")]
    InvalidBrokerChain { populated: usize },
}

/// A prospective customer's recorded interest in a property.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Enquiry {
    pub enquiry_id: EnquiryId,
    pub reference_code: String,
    pub customer_name: String,
    pub contact: String,
    pub category: String,
    pub state: String,
    pub city: String,
    pub min_budget: Decimal,
    pub max_budget: Decimal,
    pub source: EnquirySource,
    pub property_id: Option<PropertyId>,
    pub status: EnquiryStatus,
    pub broker_chain: BrokerChain,
    pub sales_person_id: Option<SalesPersonId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Timeline entry kinds. `Token` carries the monetary payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FollowUpKind {
    VisitScheduled,
    FollowUp,
    Cancelled,
    Token,
}

impl FollowUpKind {
    pub const fn label(self) -> &'static str {
        match self {
            FollowUpKind::VisitScheduled => "visit_scheduled",
            FollowUpKind::FollowUp => "follow_up",
            FollowUpKind::Cancelled => "cancelled",
            FollowUpKind::Token => "token",
        }
    }
}

/// One immutable entry in an enquiry's timeline. Entries are the audit
/// trail: created once per action, never mutated or deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FollowUpEvent {
    pub follow_up_id: FollowUpId,
    pub enquiry_id: EnquiryId,
    pub kind: FollowUpKind,
    pub remark: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visit_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_at_event: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<TokenDetails>,
    pub recorded_at: DateTime<Utc>,
}

/// Payment and commission payload attached to a `Token` event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenDetails {
    pub payment_type: String,
    pub token_amount: Decimal,
    pub deal_amount: Decimal,
    pub payment_proof_url: String,
    pub breakdown: CommissionBreakdown,
}

/// Exact split of the brokerage commission, persisted with the Token event.
///
/// The taxed partner shares are stored net of TDS; the withheld tax is
/// aggregated in `tds`, so the five components always reconstruct
/// `total_commission`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommissionBreakdown {
    pub total_commission: Decimal,
    pub reparv_commission: Decimal,
    pub sales_commission: Decimal,
    pub territory_commission: Decimal,
    pub project_commission: Decimal,
    pub tds: Decimal,
}

impl CommissionBreakdown {
    /// True when the persisted components sum back to the total exactly.
    pub fn balanced(&self) -> bool {
        self.reparv_commission
            + self.sales_commission
            + self.territory_commission
            + self.project_commission
            + self.tds
            == self.total_commission
    }
}

/// Commission configuration supplied by the external property catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "commission_type", rename_all = "snake_case")]
pub enum CommissionPlan {
    Flat { amount: Decimal },
    Percentage { percent: Decimal },
}

/// Lenient calendar-date parsing for caller-supplied visit dates. Values
/// that fail every known format are treated as absent, never stored as an
/// invalid sentinel.
pub fn parse_visit_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.date_naive());
    }

    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Some(date);
    }

    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%d/%m/%Y") {
        return Some(date);
    }

    None
}
