use std::net::Ipv4Addr;

use async_trait::async_trait;
use log::debug;
use reqwest::Client;

use crate::error::{Error, Result};

pub const DEFAULT_IP_SERVICE: &str = "https://ifconfig.co/ip";

#[async_trait]
pub trait PublicIpSource: Send + Sync {
    async fn current(&self) -> Result<Ipv4Addr>;
}

/// Asks a plain-text IP echo service for the caller's address.
pub struct HttpIpSource {
    client: Client,
    url: String,
}

impl HttpIpSource {
    pub fn new(client: Client, url: &str) -> Self {
        Self {
            client,
            url: url.to_string(),
        }
    }
}

#[async_trait]
impl PublicIpSource for HttpIpSource {
    async fn current(&self) -> Result<Ipv4Addr> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| Error::network(format!("Failed to retrieve public IP: {}", e)))?;

        if !response.status().is_success() {
            return Err(Error::network(format!(
                "Failed to retrieve public IP: {} returned {}",
                self.url,
                response.status()
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| Error::network(format!("Failed to read public IP: {}", e)))?;
        debug!("IP service answered {:?}", body);

        parse_ipv4(&body)
    }
}

fn parse_ipv4(body: &str) -> Result<Ipv4Addr> {
    let text = body.trim();
    text.parse::<Ipv4Addr>().map_err(|_| {
        Error::network(format!("IP service did not return an IPv4 address: {:?}", text))
    })
}
