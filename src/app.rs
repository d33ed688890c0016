use std::io::{BufRead, Write};
use std::path::Path;

use log::{error, info, warn};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::prompt::Prompter;
use crate::provider::DnsApi;
use crate::public_ip::PublicIpSource;
use crate::reconcile;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Pick which records of each domain to manage
    Select,
    /// Report drift without writing
    Test,
    /// Rewrite drifted records
    Update,
}

impl Mode {
    pub fn from_flags(select: bool, test: bool) -> Self {
        if select {
            Mode::Select
        } else if test {
            Mode::Test
        } else {
            Mode::Update
        }
    }
}

/// Domains that could not be processed during a run.
#[derive(Debug, Default)]
pub struct RunOutcome {
    pub failed_domains: Vec<String>,
    pub failed_records: usize,
}

impl RunOutcome {
    pub fn is_clean(&self) -> bool {
        self.failed_domains.is_empty() && self.failed_records == 0
    }

    fn domain_failed(&mut self, domain: &str, err: &Error) {
        error!("Skipping {}: {}", domain, err);
        self.failed_domains.push(domain.to_string());
    }
}

pub async fn select_subdomains<A, R, W>(
    config: &mut Config,
    config_path: &Path,
    api: &A,
    prompter: &mut Prompter<R, W>,
) -> Result<RunOutcome>
where
    A: DnsApi + ?Sized,
    R: BufRead,
    W: Write,
{
    let mut outcome = RunOutcome::default();

    for domain in config.domains.clone() {
        let names = match list_record_names(api, &domain).await {
            Ok(names) => names,
            Err(e) => {
                outcome.domain_failed(&domain, &e);
                continue;
            }
        };

        let chosen = prompter.choose(
            &format!("Available subdomains for {}:", domain),
            &names,
            "Enter the numbers of the subdomains to update (comma-separated): ",
        )?;

        let added = config.add_subdomains(&domain, chosen.into_iter().cloned());
        config.persist(config_path);
        info!("Updated selected subdomains for domain: {} ({} new)", domain, added);
    }

    Ok(outcome)
}

async fn list_record_names<A: DnsApi + ?Sized>(api: &A, domain: &str) -> Result<Vec<String>> {
    let zone_id = api.zone_id(domain).await?;
    let records = api.list_address_records(&zone_id).await?;
    Ok(records.into_iter().map(|r| r.name).collect())
}

/// Dry run: prints one line per managed record to `out`.
pub async fn check_records<A, I, W>(
    config: &Config,
    api: &A,
    ip_source: &I,
    out: &mut W,
) -> Result<RunOutcome>
where
    A: DnsApi + ?Sized,
    I: PublicIpSource + ?Sized,
    W: Write,
{
    let current_ip = ip_source.current().await?.to_string();
    info!("Public IP retrieved successfully: {}", current_ip);

    let mut outcome = RunOutcome::default();
    for domain in &config.domains {
        let selected = config.subdomains(domain);
        if selected.is_empty() {
            warn!("No subdomains selected for {}, run with --select", domain);
        }

        let reports = match api.zone_id(domain).await {
            Ok(zone_id) => {
                reconcile::check_domain(api, &zone_id, domain, selected, &current_ip).await
            }
            Err(e) => Err(e),
        };

        match reports {
            Ok(reports) => {
                for report in reports {
                    writeln!(out, "{}", report)
                        .map_err(|e| Error::input(format!("Failed to write report: {}", e)))?;
                }
            }
            Err(e) => outcome.domain_failed(domain, &e),
        }
    }

    Ok(outcome)
}

pub async fn update_records<A, I>(config: &Config, api: &A, ip_source: &I) -> Result<RunOutcome>
where
    A: DnsApi + ?Sized,
    I: PublicIpSource + ?Sized,
{
    let new_ip = ip_source.current().await?.to_string();
    info!("Retrieved public IP: {}", new_ip);

    let mut outcome = RunOutcome::default();
    for domain in &config.domains {
        let selected = config.subdomains(domain);

        let summary = match api.zone_id(domain).await {
            Ok(zone_id) => {
                reconcile::update_domain(api, &zone_id, domain, selected, &new_ip).await
            }
            Err(e) => Err(e),
        };

        match summary {
            Ok(summary) => {
                info!(
                    "{}: {} updated, {} already current, {} failed",
                    domain,
                    summary.updated.len(),
                    summary.unchanged,
                    summary.failed.len()
                );
                outcome.failed_records += summary.failed.len();
            }
            Err(e) => outcome.domain_failed(domain, &e),
        }
    }

    Ok(outcome)
}
