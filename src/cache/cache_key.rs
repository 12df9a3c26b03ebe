use std::fmt;

/// Identity of a cached token: two tokens are interchangeable only when
/// all four fields are equal.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CacheKey {
    user: String,
    host: String,
    port: u16,
    region: String,
}

impl CacheKey {
    pub fn new(
        user: impl Into<String>,
        host: impl Into<String>,
        port: u16,
        region: impl Into<String>,
    ) -> Self {
        Self {
            user: user.into(),
            host: host.into(),
            port,
            region: region.into(),
        }
    }

    pub fn user(&self) -> &str {
        &self.user
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn region(&self) -> &str {
        &self.region
    }
}

// user@host:port/region, used in log fields
impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}:{}/{}", self.user, self.host, self.port, self.region)
    }
}
