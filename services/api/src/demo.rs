use std::fs::File;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;
use rust_decimal::Decimal;

use crate::infra::{
    InMemoryEnquiryRepository, LoggingNotificationPublisher, SeedPropertyCatalog,
    TrustingPartnerDirectory,
};
use reparv_engine::error::AppError;
use reparv_engine::workflows::enquiry::{
    import_enquiries, BookingRequest, EnquiryService, EnquirySource, FollowUpRequest, NewEnquiry,
    PartnerId, PropertyId, SalesPersonId, VisitRequest,
};

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Deal amount used for the booking step
    #[arg(long, default_value = "1000000")]
    pub(crate) deal_amount: Decimal,
}

#[derive(Args, Debug)]
pub(crate) struct ImportArgs {
    /// CSV file with one enquiry per row
    #[arg(long)]
    pub(crate) file: PathBuf,
}

type DemoService = EnquiryService<
    InMemoryEnquiryRepository,
    SeedPropertyCatalog,
    TrustingPartnerDirectory,
    LoggingNotificationPublisher,
>;

fn build_service() -> Arc<DemoService> {
    Arc::new(EnquiryService::new(
        Arc::new(InMemoryEnquiryRepository::default()),
        Arc::new(SeedPropertyCatalog::default()),
        Arc::new(TrustingPartnerDirectory),
        Arc::new(LoggingNotificationPublisher),
    ))
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let service = build_service();

    let record = service.create(NewEnquiry {
        customer_name: "Sunita Verma".to_string(),
        contact: "+91-91234-56789".to_string(),
        category: "2BHK".to_string(),
        state: "Maharashtra".to_string(),
        city: "Nagpur".to_string(),
        min_budget: Decimal::from(3_000_000u32),
        max_budget: Decimal::from(4_500_000u32),
        source: EnquirySource::Direct,
        property_id: Some(PropertyId("P-1001".to_string())),
        sales_broker: Some(PartnerId("SP-100".to_string())),
        territory_broker: None,
        project_broker: None,
    })?;
    let id = record.enquiry.enquiry_id.clone();
    println!(
        "created enquiry {} (reference {})",
        id, record.enquiry.reference_code
    );

    service.assign(&id, SalesPersonId("emp-12".to_string()))?;
    println!("assigned to emp-12");

    service.schedule_visit(
        &id,
        VisitRequest {
            visit_date: chrono::Utc::now().date_naive(),
            remark: "Site visit booked over phone".to_string(),
            status_label: Some("Visit Scheduled".to_string()),
        },
    )?;
    service.add_follow_up(
        &id,
        FollowUpRequest {
            remark: "Asked for allotment letter draft".to_string(),
            visit_date: None,
            status_label: Some("Negotiating".to_string()),
        },
    )?;

    let token = service.book(
        &id,
        BookingRequest {
            payment_type: "UPI".to_string(),
            token_amount: Decimal::from(50_000u32),
            deal_amount: args.deal_amount,
            remark: "Token received".to_string(),
            payment_proof_url: "https://storage.reparv.in/proofs/demo.jpg".to_string(),
            status_label: Some("Token".to_string()),
        },
    )?;

    println!("\ntimeline:");
    for event in service.timeline(&id)? {
        let date = event
            .visit_date
            .map(|d| format!(" on {d}"))
            .unwrap_or_default();
        println!("  [{}] {}{}", event.kind.label(), event.remark, date);
    }

    if let Some(details) = token.token {
        let b = details.breakdown;
        println!("\ncommission breakdown for deal {}:", details.deal_amount);
        println!("  total     {}", b.total_commission);
        println!("  reparv    {}", b.reparv_commission);
        println!("  sales     {}", b.sales_commission);
        println!("  territory {}", b.territory_commission);
        println!("  project   {}", b.project_commission);
        println!("  tds       {}", b.tds);
    }

    Ok(())
}

pub(crate) fn run_import(args: ImportArgs) -> Result<(), AppError> {
    let service = build_service();
    let file = File::open(&args.file)?;

    let outcome = import_enquiries(file, service.as_ref())?;

    println!("imported {} enquiries", outcome.created.len());
    for id in &outcome.created {
        println!("  {id}");
    }
    if !outcome.rejected.is_empty() {
        println!("rejected {} rows:", outcome.rejected.len());
        for rejection in &outcome.rejected {
            println!("  line {}: {}", rejection.line, rejection.reason);
        }
    }

    Ok(())
}
