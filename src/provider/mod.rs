pub mod cloudflare;

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Zone {
    pub id: String,
    pub name: String,
}

/// An address record as returned by the provider. Everything except
/// `content` is written back unchanged on update.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DnsRecord {
    pub id: String,
    pub name: String,
    pub content: String,
    #[serde(default = "default_ttl")]
    pub ttl: u32,
    #[serde(default)]
    pub proxied: bool,
}

/// Cloudflare's "automatic" TTL.
fn default_ttl() -> u32 {
    1
}

/// Operations the updater needs from a DNS provider.
#[async_trait]
pub trait DnsApi: Send + Sync {
    async fn list_zones(&self) -> Result<Vec<Zone>>;

    /// Fails with `Error::ZoneNotFound` when no zone has exactly this name.
    async fn zone_id(&self, domain: &str) -> Result<String>;

    async fn list_address_records(&self, zone_id: &str) -> Result<Vec<DnsRecord>>;

    /// Replaces `record` with a copy whose content is `content`.
    async fn update_record(&self, zone_id: &str, record: &DnsRecord, content: &str) -> Result<()>;
}

#[cfg(test)]
pub mod fake {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use super::*;
    use crate::error::Error;

    /// In-memory provider. Updates are applied to the stored records so a
    /// second run sees the new content.
    #[derive(Default)]
    pub struct FakeDnsApi {
        zones: Vec<Zone>,
        records: Mutex<HashMap<String, Vec<DnsRecord>>>,
        failing_records: Vec<String>,
        updates: Mutex<Vec<(String, String, String)>>,
    }

    impl FakeDnsApi {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_zone(mut self, id: &str, name: &str, records: Vec<DnsRecord>) -> Self {
            self.zones.push(Zone {
                id: id.to_string(),
                name: name.to_string(),
            });
            self.records.get_mut().unwrap().insert(id.to_string(), records);
            self
        }

        /// Updates of the named record are rejected.
        pub fn failing_on(mut self, record_name: &str) -> Self {
            self.failing_records.push(record_name.to_string());
            self
        }

        /// `(zone id, record name, new content)` per update call, in order.
        pub fn updates(&self) -> Vec<(String, String, String)> {
            self.updates.lock().unwrap().clone()
        }

        pub fn clear_updates(&self) {
            self.updates.lock().unwrap().clear();
        }
    }

    pub fn record(id: &str, name: &str, content: &str) -> DnsRecord {
        DnsRecord {
            id: id.to_string(),
            name: name.to_string(),
            content: content.to_string(),
            ttl: 300,
            proxied: false,
        }
    }

    #[async_trait]
    impl DnsApi for FakeDnsApi {
        async fn list_zones(&self) -> Result<Vec<Zone>> {
            Ok(self.zones.clone())
        }

        async fn zone_id(&self, domain: &str) -> Result<String> {
            self.zones
                .iter()
                .find(|z| z.name == domain)
                .map(|z| z.id.clone())
                .ok_or_else(|| Error::ZoneNotFound(domain.to_string()))
        }

        async fn list_address_records(&self, zone_id: &str) -> Result<Vec<DnsRecord>> {
            self.records
                .lock()
                .unwrap()
                .get(zone_id)
                .cloned()
                .ok_or_else(|| Error::provider(format!("unknown zone {}", zone_id)))
        }

        async fn update_record(
            &self,
            zone_id: &str,
            record: &DnsRecord,
            content: &str,
        ) -> Result<()> {
            self.updates.lock().unwrap().push((
                zone_id.to_string(),
                record.name.clone(),
                content.to_string(),
            ));

            if self.failing_records.contains(&record.name) {
                return Err(Error::provider(format!("rejected {}", record.name)));
            }

            let mut records = self.records.lock().unwrap();
            if let Some(stored) = records
                .get_mut(zone_id)
                .and_then(|rs| rs.iter_mut().find(|r| r.id == record.id))
            {
                stored.content = content.to_string();
            }
            Ok(())
        }
    }
}
