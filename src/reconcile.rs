use std::fmt;

use log::{error, info};

use crate::error::Result;
use crate::provider::{DnsApi, DnsRecord};

/// A record is managed when it lives under `domain` and the operator
/// selected it.
pub fn is_managed(record: &DnsRecord, domain: &str, selected: &[String]) -> bool {
    record.name.ends_with(&format!(".{}", domain)) && selected.contains(&record.name)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordStatus {
    InSync,
    Drifted,
}

impl fmt::Display for RecordStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordStatus::InSync => write!(f, "OK!"),
            RecordStatus::Drifted => write!(f, "UPDATE!"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordReport {
    pub name: String,
    pub content: String,
    pub status: RecordStatus,
}

impl fmt::Display for RecordReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "- {} -> {} ({})", self.name, self.content, self.status)
    }
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct UpdateSummary {
    pub updated: Vec<String>,
    pub unchanged: usize,
    pub failed: Vec<String>,
}

/// Reports drift for every managed record without changing anything.
/// Records keep the provider's order.
pub async fn check_domain<A: DnsApi + ?Sized>(
    api: &A,
    zone_id: &str,
    domain: &str,
    selected: &[String],
    current_ip: &str,
) -> Result<Vec<RecordReport>> {
    let records = api.list_address_records(zone_id).await?;

    Ok(records
        .into_iter()
        .filter(|record| is_managed(record, domain, selected))
        .map(|record| {
            let status = if record.content == current_ip {
                RecordStatus::InSync
            } else {
                RecordStatus::Drifted
            };
            RecordReport {
                name: record.name,
                content: record.content,
                status,
            }
        })
        .collect())
}

/// Points every drifted managed record at `new_ip`. A failed update is
/// logged and the remaining records are still processed.
pub async fn update_domain<A: DnsApi + ?Sized>(
    api: &A,
    zone_id: &str,
    domain: &str,
    selected: &[String],
    new_ip: &str,
) -> Result<UpdateSummary> {
    let records = api.list_address_records(zone_id).await?;
    let mut summary = UpdateSummary::default();

    for record in records.iter().filter(|r| is_managed(r, domain, selected)) {
        if record.content == new_ip {
            summary.unchanged += 1;
            continue;
        }

        match api.update_record(zone_id, record, new_ip).await {
            Ok(()) => {
                info!("Updated {} in {} to IP {}", record.name, domain, new_ip);
                summary.updated.push(record.name.clone());
            }
            Err(e) => {
                error!("Failed to update {} in {}: {}", record.name, domain, e);
                summary.failed.push(record.name.clone());
            }
        }
    }

    Ok(summary)
}
