use crate::config::settings::AppConfig;
use thiserror::Error;
use url::{Host, Url};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RewriteError {
    #[error("URL {0} points at a loopback host but no internal storage endpoint is configured")]
    NotConfigured(String),
}

/// Routes loopback download URLs to the storage endpoint reachable from
/// inside the cluster. Every other URL passes through untouched.
#[derive(Clone, Debug, Default)]
pub struct InternalHostRewriter {
    external_host: Option<String>,
    internal_endpoint: Option<String>,
}

impl InternalHostRewriter {
    pub fn new(external_host: Option<String>, internal_endpoint: Option<String>) -> Self {
        Self {
            external_host,
            internal_endpoint,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            config.live_external_host.clone(),
            config.live_endpoint_url.clone(),
        )
    }

    pub fn rewrite(&self, raw: &str) -> Result<String, RewriteError> {
        if !is_loopback(raw) {
            return Ok(raw.to_string());
        }

        match (&self.external_host, &self.internal_endpoint) {
            (Some(external), Some(internal)) => Ok(raw.replace(external.as_str(), internal)),
            _ => Err(RewriteError::NotConfigured(raw.to_string())),
        }
    }
}

fn is_loopback(raw: &str) -> bool {
    let Ok(url) = Url::parse(raw) else {
        return false;
    };
    match url.host() {
        Some(Host::Domain(domain)) => domain.eq_ignore_ascii_case("localhost"),
        Some(Host::Ipv4(ip)) => ip.is_loopback(),
        Some(Host::Ipv6(ip)) => ip.is_loopback(),
        None => false,
    }
}
