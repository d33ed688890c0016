use async_trait::async_trait;
use log::debug;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::{DnsApi, DnsRecord, Zone};
use crate::error::{Error, Result};

pub const CLOUDFLARE_API_BASE: &str = "https://api.cloudflare.com/client/v4";

const PER_PAGE: u32 = 50;

pub struct CloudflareClient {
    client: Client,
    base_url: String,
    api_token: String,
}

impl CloudflareClient {
    pub fn new(client: Client, base_url: &str, api_token: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_token: api_token.to_string(),
        }
    }

    fn zones_url(&self) -> String {
        format!("{}/zones", self.base_url)
    }

    fn records_url(&self, zone_id: &str) -> String {
        format!("{}/zones/{}/dns_records", self.base_url, zone_id)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("Authorization", format!("Bearer {}", self.api_token))
            .header("Content-Type", "application/json")
    }

    /// Fetches every page of a list endpoint.
    async fn get_all<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, &str)],
        what: &str,
    ) -> Result<Vec<T>> {
        let mut items = Vec::new();
        let mut page = 1;

        loop {
            let page_param = page.to_string();
            let per_page = PER_PAGE.to_string();
            let request = self
                .authorized(self.client.get(url))
                .query(query)
                .query(&[("page", page_param.as_str()), ("per_page", per_page.as_str())]);

            let response: CloudflareResponse<Vec<T>> = send(request, what).await?;
            items.extend(response.result.unwrap_or_default());

            let total_pages = response.result_info.map(|info| info.total_pages).unwrap_or(1);
            if page >= total_pages {
                break;
            }
            page += 1;
        }

        debug!("Fetched {} {}", items.len(), what);
        Ok(items)
    }
}

async fn send<T: DeserializeOwned>(request: RequestBuilder, what: &str) -> Result<CloudflareResponse<T>> {
    let response = request
        .send()
        .await
        .map_err(|e| Error::provider(format!("Failed to request {}: {}", what, e)))?;
    decode(response, what).await
}

async fn decode<T: DeserializeOwned>(response: Response, what: &str) -> Result<CloudflareResponse<T>> {
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| Error::provider(format!("Failed to read {} response: {}", what, e)))?;

    parse_response(status.as_u16(), &body, what)
}

/// Interprets a response body, treating a non-2xx status or `success: false`
/// as failure.
fn parse_response<T: DeserializeOwned>(status: u16, body: &str, what: &str) -> Result<CloudflareResponse<T>> {
    let parsed: std::result::Result<CloudflareResponse<T>, _> = serde_json::from_str(body);

    match parsed {
        Ok(response) if (200..300).contains(&status) && response.success => Ok(response),
        Ok(response) => Err(Error::provider(format!(
            "Failed to retrieve {} (HTTP {}): {}",
            what,
            status,
            response.error_summary()
        ))),
        Err(_) if !(200..300).contains(&status) => Err(Error::provider(format!(
            "Failed to retrieve {} (HTTP {})",
            what, status
        ))),
        Err(e) => Err(Error::provider(format!(
            "Failed to parse {} response: {}",
            what, e
        ))),
    }
}

#[async_trait]
impl DnsApi for CloudflareClient {
    async fn list_zones(&self) -> Result<Vec<Zone>> {
        self.get_all(&self.zones_url(), &[], "zones").await
    }

    async fn zone_id(&self, domain: &str) -> Result<String> {
        let request = self
            .authorized(self.client.get(self.zones_url()))
            .query(&[("name", domain)]);

        let response: CloudflareResponse<Vec<Zone>> =
            send(request, &format!("zone ID for domain {}", domain)).await?;

        response
            .result
            .unwrap_or_default()
            .into_iter()
            .find(|zone| zone.name == domain)
            .map(|zone| zone.id)
            .ok_or_else(|| Error::ZoneNotFound(domain.to_string()))
    }

    async fn list_address_records(&self, zone_id: &str) -> Result<Vec<DnsRecord>> {
        self.get_all(
            &self.records_url(zone_id),
            &[("type", "A")],
            &format!("DNS records for zone {}", zone_id),
        )
        .await
    }

    async fn update_record(&self, zone_id: &str, record: &DnsRecord, content: &str) -> Result<()> {
        let url = format!("{}/{}", self.records_url(zone_id), record.id);
        let body = UpdateRecordRequest::replacing(record, content);

        let request = self.authorized(self.client.put(&url)).json(&body);
        let _: CloudflareResponse<serde_json::Value> =
            send(request, &format!("update of {}", record.name)).await?;

        Ok(())
    }
}

// Cloudflare API types

#[derive(Debug, Serialize)]
struct UpdateRecordRequest<'a> {
    #[serde(rename = "type")]
    record_type: &'static str,
    name: &'a str,
    content: &'a str,
    ttl: u32,
    proxied: bool,
}

impl<'a> UpdateRecordRequest<'a> {
    fn replacing(record: &'a DnsRecord, content: &'a str) -> Self {
        Self {
            record_type: "A",
            name: &record.name,
            content,
            ttl: record.ttl,
            proxied: record.proxied,
        }
    }
}

#[derive(Debug, Deserialize)]
struct CloudflareResponse<T> {
    success: bool,
    #[serde(default)]
    errors: Vec<CloudflareError>,
    result: Option<T>,
    #[serde(default)]
    result_info: Option<ResultInfo>,
}

impl<T> CloudflareResponse<T> {
    fn error_summary(&self) -> String {
        if self.errors.is_empty() {
            return "no error details".to_string();
        }
        self.errors
            .iter()
            .map(|e| format!("{}: {}", e.code, e.message))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[derive(Debug, Deserialize)]
struct CloudflareError {
    code: i32,
    message: String,
}

#[derive(Debug, Deserialize)]
struct ResultInfo {
    #[serde(default = "first_page")]
    total_pages: u32,
}

fn first_page() -> u32 {
    1
}
