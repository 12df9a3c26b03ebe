use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};
use tracing::trace;

use super::{AuthTokenIssuer, SigningError, TokenRequest};
use crate::session::{Credentials, ProvideCredentials, Session};
use crate::utils::constants::MAX_TOKEN_EXPIRES_IN_SECS;

type HmacSha256 = Hmac<Sha256>;

const ALGORITHM: &str = "AWS4-HMAC-SHA256";
const SERVICE: &str = "rds-db";
const TERMINATOR: &str = "aws4_request";

/// Issues RDS IAM tokens by presigning a `connect` action with SigV4.
///
/// No network call is made; the token is valid for `expires_in` from the
/// moment it is signed.
#[derive(Debug, Clone)]
pub struct RdsTokenIssuer {
    credentials: Arc<dyn ProvideCredentials>,
    expires_in: Duration,
}

impl RdsTokenIssuer {
    pub fn new(credentials: Arc<dyn ProvideCredentials>) -> Self {
        Self {
            credentials,
            expires_in: Duration::from_secs(MAX_TOKEN_EXPIRES_IN_SECS),
        }
    }

    pub fn from_session(session: &Session) -> Self {
        Self::new(session.credentials().clone())
    }

    /// Sets how long issued tokens stay valid, at most 15 minutes
    pub fn with_expires_in(mut self, expires_in: Duration) -> Result<Self, SigningError> {
        let secs = expires_in.as_secs();
        if secs == 0 || secs > MAX_TOKEN_EXPIRES_IN_SECS {
            return Err(SigningError::InvalidExpiry {
                got: secs,
                max: MAX_TOKEN_EXPIRES_IN_SECS,
            });
        }
        self.expires_in = Duration::from_secs(secs);
        Ok(self)
    }

    pub fn expires_in(&self) -> Duration {
        self.expires_in
    }

    /// Presign the request with the given credentials as of `at`
    pub fn presign_at(
        &self,
        request: &TokenRequest<'_>,
        credentials: &Credentials,
        at: DateTime<Utc>,
    ) -> String {
        let host = format!("{}:{}", request.hostname, request.port);
        let amz_date = at.format("%Y%m%dT%H%M%SZ").to_string();
        let date = at.format("%Y%m%d").to_string();
        let scope = format!("{}/{}/{}/{}", date, request.region, SERVICE, TERMINATOR);

        let mut params: BTreeMap<&str, String> = BTreeMap::new();
        params.insert("Action", "connect".to_owned());
        params.insert("DBUser", request.username.to_owned());
        params.insert("X-Amz-Algorithm", ALGORITHM.to_owned());
        params.insert(
            "X-Amz-Credential",
            format!("{}/{}", credentials.access_key_id(), scope),
        );
        params.insert("X-Amz-Date", amz_date.clone());
        params.insert("X-Amz-Expires", self.expires_in.as_secs().to_string());
        params.insert("X-Amz-SignedHeaders", "host".to_owned());
        if let Some(token) = credentials.session_token() {
            params.insert("X-Amz-Security-Token", token.to_owned());
        }

        let query = canonical_query(&params);
        let canonical_request = format!(
            "GET\n/\n{}\nhost:{}\n\nhost\n{}",
            query,
            host,
            hex::encode(sha256(b""))
        );
        let string_to_sign = format!(
            "{}\n{}\n{}\n{}",
            ALGORITHM,
            amz_date,
            scope,
            hex::encode(sha256(canonical_request.as_bytes()))
        );

        let key = signing_key(credentials.secret_access_key(), &date, request.region);
        let signature = hex::encode(hmac_sha256(&key, string_to_sign.as_bytes()));

        format!("{}/?{}&X-Amz-Signature={}", host, query, signature)
    }
}

impl AuthTokenIssuer for RdsTokenIssuer {
    type Error = SigningError;

    fn generate_db_auth_token(&self, request: &TokenRequest<'_>) -> Result<String, Self::Error> {
        let credentials = self.credentials.provide_credentials()?;
        trace!(
            host = request.hostname,
            port = request.port,
            region = request.region,
            "presigning rds-db connect request"
        );
        Ok(self.presign_at(request, &credentials, Utc::now()))
    }
}

/// `k=v` pairs joined by `&`, keys sorted, both sides percent-encoded
fn canonical_query(params: &BTreeMap<&str, String>) -> String {
    params
        .iter()
        .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}

fn signing_key(secret: &str, date: &str, region: &str) -> [u8; 32] {
    let k_date = hmac_sha256(format!("AWS4{}", secret).as_bytes(), date.as_bytes());
    let k_region = hmac_sha256(&k_date, region.as_bytes());
    let k_service = hmac_sha256(&k_region, SERVICE.as_bytes());
    hmac_sha256(&k_service, TERMINATOR.as_bytes())
}

fn hmac_sha256(key: &[u8], data: &[u8]) -> [u8; 32] {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC accepts any key length");
    mac.update(data);
    mac.finalize().into_bytes().into()
}

fn sha256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}
