use crate::commands::{print_json, Context};
use crate::error::not_found;
use anyhow::{Context as _, Result};
use checkguard_core::domain::{BlockedRecord, PhoneNumber};
use checkguard_core::dto::{BlockedRecordDto, BlockedSummaryDto};
use checkguard_core::rules::{validate_block_request, BlockRequest};
use checkguard_core::time::{format_date, format_timestamp_datetime, now_utc};
use clap::Args;
use serde::Serialize;
use tracing::debug;

#[derive(Debug, Args)]
pub struct BlockArgs {
    /// Phone number in any common notation, e.g. "(415) 555-0100"
    pub phone: String,
    #[arg(long)]
    pub reason: String,
    /// Store where the bad check was presented
    #[arg(long = "location")]
    pub store_location: String,
    /// Check amount in dollars, e.g. 125.40
    #[arg(long, allow_hyphen_values = true)]
    pub amount: String,
    #[arg(long)]
    pub notes: Option<String>,
}

#[derive(Debug, Args)]
pub struct LookupArgs {
    pub phone: String,
}

#[derive(Debug, Args)]
pub struct UnblockArgs {
    pub phone: String,
}

#[derive(Debug, Args)]
pub struct ListArgs {}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct UnblockedDto {
    phone_number: String,
    removed: bool,
}

pub fn block_number(ctx: &Context<'_>, args: BlockArgs) -> Result<()> {
    let request = BlockRequest {
        phone_number: &args.phone,
        reason: &args.reason,
        store_location: &args.store_location,
        check_amount: &args.amount,
        notes: args.notes.as_deref(),
    };
    let report = validate_block_request(&request)?;
    debug!(phone = %report.phone_number, location = %report.store_location, "blocking number");

    let record = ctx
        .store
        .blocked_numbers()
        .create_or_merge(now_utc(), &report)
        .with_context(|| format!("block {}", report.phone_number))?;
    debug!(id = %record.id, "blocked record stored");

    if ctx.json {
        return print_json(&BlockedRecordDto::from(&record));
    }
    println!("blocked {}", record.phone_number);
    print_record(&record);
    Ok(())
}

pub fn lookup_number(ctx: &Context<'_>, args: LookupArgs) -> Result<()> {
    let phone = PhoneNumber::parse(&args.phone)?;
    debug!(phone = %phone, "looking up number");

    let record = ctx
        .store
        .blocked_numbers()
        .find(&phone)
        .with_context(|| format!("look up {}", phone))?;
    let Some(record) = record else {
        return Err(not_found(format!("{} is not blocked", phone)));
    };

    if ctx.json {
        return print_json(&BlockedRecordDto::from(&record));
    }
    print_record(&record);
    Ok(())
}

pub fn unblock_number(ctx: &Context<'_>, args: UnblockArgs) -> Result<()> {
    let phone = PhoneNumber::parse(&args.phone)?;
    debug!(phone = %phone, "unblocking number");

    ctx.store
        .blocked_numbers()
        .delete(&phone)
        .with_context(|| format!("unblock {}", phone))?;

    if ctx.json {
        return print_json(&UnblockedDto {
            phone_number: phone.to_string(),
            removed: true,
        });
    }
    println!("unblocked {}", phone);
    Ok(())
}

pub fn list_numbers(ctx: &Context<'_>, _args: ListArgs) -> Result<()> {
    let summaries = ctx.store.blocked_numbers().list_summaries()?;
    debug!(count = summaries.len(), "listed blocked numbers");

    if ctx.json {
        let dtos: Vec<BlockedSummaryDto> = summaries.iter().map(BlockedSummaryDto::from).collect();
        return print_json(&dtos);
    }

    if summaries.is_empty() {
        println!("no blocked numbers");
        return Ok(());
    }
    for summary in summaries {
        println!(
            "{:>6}  {:<16}  {}",
            summary.id,
            summary.phone_number,
            format_timestamp_datetime(summary.created_at)
        );
    }
    let total = ctx.store.blocked_numbers().count()?;
    println!("total: {}", total);
    Ok(())
}

fn print_record(record: &BlockedRecord) {
    println!("id: {}", record.id);
    println!("phone: {}", record.phone_number);
    println!("reason: {}", record.reason);
    println!("location: {}", record.store_location);
    println!("incident_date: {}", format_date(record.incident_date));
    if let Some(amount) = record.check_amount {
        println!("check_amount: {}", amount);
    }
    let notes = record.note_entries();
    if notes.is_empty() {
        println!("notes: none");
    } else {
        println!("notes:");
        for note in notes {
            println!("  {}", note);
        }
    }
    println!("created_at: {}", format_timestamp_datetime(record.created_at));
    println!("updated_at: {}", format_timestamp_datetime(record.updated_at));
}
