// tests/common/mod.rs
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use thiserror::Error;

use crate::auth::TokenProvider;
use crate::session::{Credentials, Session};
use crate::signer::{AuthTokenIssuer, TokenRequest};

pub const HOST: &str = "test-db.xxxxx.us-west-2.rds.amazonaws.com";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("issuer unavailable: {0}")]
pub struct IssuerFailure(pub String);

/// Owned copy of a `TokenRequest` seen by the issuer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeenRequest {
    pub hostname: String,
    pub port: u16,
    pub username: String,
    pub region: String,
}

impl SeenRequest {
    pub fn new(hostname: &str, port: u16, username: &str, region: &str) -> Self {
        Self {
            hostname: hostname.into(),
            port,
            username: username.into(),
            region: region.into(),
        }
    }
}

/// Issuer double: hands out scripted tokens (or `token-N` once the script is
/// exhausted), counts calls and records every request.
#[derive(Debug, Default)]
pub struct CountingIssuer {
    calls: AtomicUsize,
    script: Mutex<VecDeque<Result<String, IssuerFailure>>>,
    seen: Mutex<Vec<SeenRequest>>,
}

impl CountingIssuer {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn scripted<I, S>(tokens: I) -> Arc<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let issuer = Self::default();
        issuer
            .script
            .lock()
            .extend(tokens.into_iter().map(|t| Ok(t.into())));
        Arc::new(issuer)
    }

    pub fn fail_next(&self, reason: &str) {
        self.script
            .lock()
            .push_front(Err(IssuerFailure(reason.to_owned())));
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn seen(&self) -> Vec<SeenRequest> {
        self.seen.lock().clone()
    }
}

impl AuthTokenIssuer for CountingIssuer {
    type Error = IssuerFailure;

    fn generate_db_auth_token(&self, request: &TokenRequest<'_>) -> Result<String, Self::Error> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().push(SeenRequest::new(
            request.hostname,
            request.port,
            request.username,
            request.region,
        ));
        self.script
            .lock()
            .pop_front()
            .unwrap_or_else(|| Ok(format!("token-{}", n + 1)))
    }
}

pub fn session(region: Option<&str>) -> Session {
    Session::new(
        region.map(str::to_owned),
        Arc::new(Credentials::new("AKIDEXAMPLE", "secret", None)),
    )
}

/// Provider with a us-west-2 default region and the given cache timeout
pub fn provider(
    issuer: &Arc<CountingIssuer>,
    cache_timeout: i64,
) -> TokenProvider<Arc<CountingIssuer>> {
    TokenProvider::builder()
        .region_name("us-west-2")
        .session(session(None))
        .cache_timeout(cache_timeout)
        .build_with_issuer(issuer.clone())
        .unwrap()
}
