// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Entitlement server adapter.
//!
//! The network registration is a black box to the service: one call that
//! takes credentials or activation keys and returns the consumer record.

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, info};

use super::AdapterError;

pub const DEFAULT_HOST: &str = "subscription.rhsm.redhat.com";
pub const DEFAULT_PORT: u16 = 443;
pub const DEFAULT_HANDLER: &str = "/subscription";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// How to reach the entitlement server.
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionOptions {
    pub host: String,
    pub port: u16,
    pub handler: String,
    pub insecure: bool,
    pub proxy_hostname: Option<String>,
    pub proxy_port: Option<u16>,
    pub proxy_user: Option<String>,
    pub proxy_password: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl Default for ConnectionOptions {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            handler: DEFAULT_HANDLER.to_string(),
            insecure: false,
            proxy_hostname: None,
            proxy_port: None,
            proxy_user: None,
            proxy_password: None,
            username: None,
            password: None,
        }
    }
}

impl fmt::Debug for ConnectionOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mask = |p: &Option<String>| p.as_ref().map(|_| "********");
        f.debug_struct("ConnectionOptions")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("handler", &self.handler)
            .field("insecure", &self.insecure)
            .field("proxy_hostname", &self.proxy_hostname)
            .field("proxy_port", &self.proxy_port)
            .field("proxy_user", &self.proxy_user)
            .field("proxy_password", &mask(&self.proxy_password))
            .field("username", &self.username)
            .field("password", &mask(&self.password))
            .finish()
    }
}

impl ConnectionOptions {
    /// Base URL of the REST API, e.g. `https://host:443/subscription`.
    pub fn base_url(&self) -> String {
        let handler = self.handler.trim_end_matches('/');
        let handler = if handler.starts_with('/') || handler.is_empty() {
            handler.to_string()
        } else {
            format!("/{handler}")
        };
        format!("https://{}:{}{}", self.host, self.port, handler)
    }

    fn proxy_url(&self) -> Option<String> {
        let host = self.proxy_hostname.as_deref().filter(|h| !h.is_empty())?;
        Some(match self.proxy_port {
            Some(port) => format!("http://{host}:{port}"),
            None => format!("http://{host}"),
        })
    }
}

/// The consumer to create.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ConsumerRequest {
    pub name: String,
    #[serde(skip)]
    pub owner: Option<String>,
    #[serde(skip)]
    pub activation_keys: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub environment: Option<String>,
    pub facts: BTreeMap<String, String>,
}

impl ConsumerRequest {
    /// Query string carrying owner and activation keys.
    pub fn query(&self) -> Vec<(&'static str, String)> {
        let mut query = Vec::new();
        if let Some(owner) = &self.owner {
            query.push(("owner", owner.clone()));
        }
        if !self.activation_keys.is_empty() {
            query.push(("activation_keys", self.activation_keys.join(",")));
        }
        query
    }
}

/// Remote registration service.
pub trait EntitlementServer: Send + Sync + 'static {
    /// Create a consumer. Blocking; only ever called from a worker thread.
    fn register_consumer(
        &self,
        conn: &ConnectionOptions,
        request: &ConsumerRequest,
    ) -> Result<serde_json::Value, AdapterError>;
}

/// Talks to a real entitlement server over HTTPS.
#[derive(Debug, Clone, Default)]
pub struct HttpEntitlementServer;

impl HttpEntitlementServer {
    pub fn new() -> Self {
        Self
    }

    fn client(conn: &ConnectionOptions) -> Result<reqwest::blocking::Client, AdapterError> {
        let mut builder = reqwest::blocking::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .danger_accept_invalid_certs(conn.insecure);
        if let Some(url) = conn.proxy_url() {
            let mut proxy = reqwest::Proxy::all(&url)?;
            if let Some(user) = &conn.proxy_user {
                proxy = proxy.basic_auth(user, conn.proxy_password.as_deref().unwrap_or_default());
            }
            builder = builder.proxy(proxy);
        }
        Ok(builder.build()?)
    }
}

impl EntitlementServer for HttpEntitlementServer {
    fn register_consumer(
        &self,
        conn: &ConnectionOptions,
        request: &ConsumerRequest,
    ) -> Result<serde_json::Value, AdapterError> {
        let url = format!("{}/consumers", conn.base_url());
        debug!(%url, consumer = %request.name, "registering consumer");

        let client = Self::client(conn)?;
        let mut http = client.post(&url).query(&request.query()).json(request);
        if let Some(username) = &conn.username {
            http = http.basic_auth(username, conn.password.as_deref());
        }

        let response = http.send()?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(AdapterError::Status { status: status.as_u16(), body });
        }
        let consumer: serde_json::Value = response.json()?;
        if !consumer.is_object() {
            return Err(AdapterError::InvalidResponse("consumer is not an object".to_string()));
        }
        info!(consumer = %request.name, "consumer registered");
        Ok(consumer)
    }
}

#[cfg(any(test, feature = "test-support"))]
mod fake {
    use std::sync::Arc;

    use parking_lot::Mutex;

    use super::{AdapterError, ConnectionOptions, ConsumerRequest, EntitlementServer};

    /// Recorded registration call
    #[derive(Debug, Clone)]
    pub struct RegisterCall {
        pub conn: ConnectionOptions,
        pub request: ConsumerRequest,
    }

    struct FakeState {
        calls: Vec<RegisterCall>,
        reply: Result<serde_json::Value, (u16, String)>,
    }

    /// Entitlement server that answers from memory
    #[derive(Clone)]
    pub struct FakeEntitlementServer {
        inner: Arc<Mutex<FakeState>>,
    }

    impl Default for FakeEntitlementServer {
        fn default() -> Self {
            Self::new()
        }
    }

    impl FakeEntitlementServer {
        /// Replies with a minimal consumer carrying an identity certificate.
        pub fn new() -> Self {
            Self::replying(serde_json::json!({
                "uuid": "fake-uuid",
                "name": "fake-consumer",
                "idCert": { "cert": "FAKE CERT", "key": "FAKE KEY", "serial": { "serial": 1 } },
            }))
        }

        pub fn replying(consumer: serde_json::Value) -> Self {
            Self { inner: Arc::new(Mutex::new(FakeState { calls: Vec::new(), reply: Ok(consumer) })) }
        }

        pub fn failing(status: u16, body: &str) -> Self {
            Self {
                inner: Arc::new(Mutex::new(FakeState {
                    calls: Vec::new(),
                    reply: Err((status, body.to_string())),
                })),
            }
        }

        pub fn calls(&self) -> Vec<RegisterCall> {
            self.inner.lock().calls.clone()
        }
    }

    impl EntitlementServer for FakeEntitlementServer {
        fn register_consumer(
            &self,
            conn: &ConnectionOptions,
            request: &ConsumerRequest,
        ) -> Result<serde_json::Value, AdapterError> {
            let mut inner = self.inner.lock();
            inner.calls.push(RegisterCall { conn: conn.clone(), request: request.clone() });
            match &inner.reply {
                Ok(consumer) => Ok(consumer.clone()),
                Err((status, body)) => Err(AdapterError::Status { status: *status, body: body.clone() }),
            }
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeEntitlementServer, RegisterCall};

#[cfg(test)]
#[path = "uep_tests.rs"]
mod tests;
