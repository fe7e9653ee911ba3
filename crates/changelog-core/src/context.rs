//! Actor context for audit records
//!
//! The acting user, client IP and user agent travel with every `log` call
//! instead of living in process-wide state, so concurrent requests cannot
//! leak identities into each other's records.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// IP recorded when no header or peer address is available
pub const UNKNOWN_IP: &str = "UNKNOWN";

/// Actor recorded when none was set
pub const DEFAULT_ACTOR_ID: &str = "0";

/// Headers consulted for the client IP, highest priority first
pub const CLIENT_IP_HEADERS: [&str; 6] = [
    "client-ip",
    "x-forwarded-for",
    "x-forwarded",
    "x-cluster-client-ip",
    "forwarded-for",
    "forwarded",
];

/// Who made the change and from where
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditContext {
    pub user_id: String,
    pub ip: String,
    pub user_agent: String,
}

impl AuditContext {
    /// Context for a non-HTTP caller: unknown IP, empty user agent
    pub fn new(actor: impl ToString) -> Self {
        Self {
            user_id: actor.to_string(),
            ip: UNKNOWN_IP.to_string(),
            user_agent: String::new(),
        }
    }

    pub fn with_ip(mut self, ip: impl Into<String>) -> Self {
        self.ip = ip.into();
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}

impl Default for AuditContext {
    fn default() -> Self {
        Self::new(DEFAULT_ACTOR_ID)
    }
}

/// Supplies the actor context for the current operation
pub trait ContextProvider {
    fn audit_context(&self) -> AuditContext;
}

impl ContextProvider for AuditContext {
    fn audit_context(&self) -> AuditContext {
        self.clone()
    }
}

/// Context resolved from an incoming HTTP request
///
/// Header names are matched case-insensitively. The client IP follows
/// [`CLIENT_IP_HEADERS`], then the direct peer address, then
/// [`UNKNOWN_IP`].
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    headers: HashMap<String, String>,
    remote_addr: Option<String>,
    actor: Option<String>,
}

impl RequestContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from any iterator of header name/value pairs
    pub fn from_headers<I, K, V>(headers: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        headers
            .into_iter()
            .fold(Self::new(), |ctx, (name, value)| ctx.with_header(name.as_ref(), value))
    }

    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    /// Set the direct connection address
    pub fn with_remote_addr(mut self, addr: impl Into<String>) -> Self {
        self.remote_addr = Some(addr.into());
        self
    }

    /// Set the acting user
    pub fn with_actor(mut self, actor: impl ToString) -> Self {
        self.actor = Some(actor.to_string());
        self
    }

    fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(name)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    pub fn client_ip(&self) -> String {
        CLIENT_IP_HEADERS
            .iter()
            .find_map(|name| self.header(name))
            .or_else(|| {
                self.remote_addr
                    .as_deref()
                    .map(str::trim)
                    .filter(|addr| !addr.is_empty())
            })
            .unwrap_or(UNKNOWN_IP)
            .to_string()
    }

    pub fn user_agent(&self) -> String {
        self.header("user-agent").unwrap_or_default().to_string()
    }
}

impl ContextProvider for RequestContext {
    fn audit_context(&self) -> AuditContext {
        AuditContext {
            user_id: self
                .actor
                .clone()
                .unwrap_or_else(|| DEFAULT_ACTOR_ID.to_string()),
            ip: self.client_ip(),
            user_agent: self.user_agent(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_client_ip_prefers_client_ip_header() {
        let ctx = RequestContext::new()
            .with_header("X-Forwarded-For", "10.0.0.2")
            .with_header("Client-IP", "10.0.0.1")
            .with_remote_addr("192.168.1.1");
        assert_eq!(ctx.client_ip(), "10.0.0.1");
    }

    #[test]
    fn test_client_ip_walks_header_chain() {
        let ctx = RequestContext::new()
            .with_header("Forwarded", "for=10.0.0.9")
            .with_header("X-Cluster-Client-IP", "10.0.0.4");
        assert_eq!(ctx.client_ip(), "10.0.0.4");

        let ctx = RequestContext::new().with_header("forwarded", "for=10.0.0.9");
        assert_eq!(ctx.client_ip(), "for=10.0.0.9");
    }

    #[test]
    fn test_client_ip_falls_back_to_peer_then_unknown() {
        let ctx = RequestContext::new().with_remote_addr("192.168.1.1");
        assert_eq!(ctx.client_ip(), "192.168.1.1");

        let ctx = RequestContext::new().with_header("x-forwarded-for", "  ");
        assert_eq!(ctx.client_ip(), UNKNOWN_IP);
    }

    #[test]
    fn test_request_context_resolution() {
        let ctx = RequestContext::from_headers([("User-Agent", "curl/8.0")])
            .with_actor(42)
            .with_remote_addr("127.0.0.1");

        let resolved = ctx.audit_context();
        assert_eq!(resolved.user_id, "42");
        assert_eq!(resolved.ip, "127.0.0.1");
        assert_eq!(resolved.user_agent, "curl/8.0");
    }

    #[test]
    fn test_default_actor() {
        let resolved = RequestContext::new().audit_context();
        assert_eq!(resolved.user_id, DEFAULT_ACTOR_ID);
        assert_eq!(resolved.user_agent, "");
        assert_eq!(AuditContext::default().user_id, "0");
    }
}
