//! Connection lifecycle hooks.
//!
//! A connection framework owns a [`ConnectHooks`] and calls
//! [`ConnectHooks::dispatch`] right before each physical connection attempt.
//! Listeners may rewrite the [`ConnectParams`]; a [`TokenProvider`] writes
//! the IAM token into `password`.
//!
//! [`TokenProvider`]: crate::auth::TokenProvider

use std::collections::BTreeMap;
use std::error;
use std::fmt;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::auth::TokenProvider;
use crate::signer::AuthTokenIssuer;

pub type BoxError = Box<dyn error::Error + Send + Sync + 'static>;

/// Parameters of a connection that is about to be opened
#[derive(Clone, PartialEq, Eq, Default)]
pub struct ConnectParams {
    pub user: String,
    pub host: String,
    pub port: u16,
    pub database: Option<String>,
    pub password: Option<String>,
    /// driver-specific options, passed through untouched
    pub options: BTreeMap<String, String>,
}

impl ConnectParams {
    pub fn new(user: impl Into<String>, host: impl Into<String>, port: u16) -> Self {
        Self {
            user: user.into(),
            host: host.into(),
            port,
            ..Default::default()
        }
    }

    pub fn with_database(mut self, database: impl Into<String>) -> Self {
        self.database = Some(database.into());
        self
    }

    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }
}

impl fmt::Debug for ConnectParams {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("ConnectParams")
            .field("user", &self.user)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("password", &self.password.as_ref().map(|_| "** redacted **"))
            .field("options", &self.options)
            .finish()
    }
}

/// Listener for the "about to connect" event
pub trait ConnectListener: Send + Sync {
    fn before_connect(&self, params: &mut ConnectParams) -> Result<(), BoxError>;
}

impl<I> ConnectListener for TokenProvider<I>
where
    I: AuthTokenIssuer,
{
    fn before_connect(&self, params: &mut ConnectParams) -> Result<(), BoxError> {
        self.provide_token(params).map_err(|e| Box::new(e) as BoxError)
    }
}

/// Listeners subscribed to the "about to connect" event of one connection
/// source, called in registration order.
#[derive(Default, Clone)]
pub struct ConnectHooks {
    before_connect: Vec<Arc<dyn ConnectListener>>,
}

impl ConnectHooks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn listen(&mut self, listener: Arc<dyn ConnectListener>) {
        self.before_connect.push(listener);
    }

    /// Whether this exact listener instance is subscribed
    pub fn contains(&self, listener: &Arc<dyn ConnectListener>) -> bool {
        self.before_connect
            .iter()
            .any(|registered| Arc::ptr_eq(registered, listener))
    }

    pub fn len(&self) -> usize {
        self.before_connect.len()
    }

    pub fn is_empty(&self) -> bool {
        self.before_connect.is_empty()
    }

    /// Runs every listener against `params`. The first failure stops the
    /// dispatch and must fail the connection attempt.
    pub fn dispatch(&self, params: &mut ConnectParams) -> Result<(), BoxError> {
        debug!(listeners = self.before_connect.len(), host = %params.host, "dispatching before_connect");
        for listener in &self.before_connect {
            listener.before_connect(params).inspect_err(|e| {
                warn!(host = %params.host, error = %e, "before_connect listener failed");
            })?;
        }
        Ok(())
    }
}

impl fmt::Debug for ConnectHooks {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("ConnectHooks")
            .field("before_connect", &self.before_connect.len())
            .finish()
    }
}

impl<I> TokenProvider<I>
where
    I: AuthTokenIssuer + 'static,
{
    /// Subscribes this provider to `hooks`, returning the registered handle
    pub fn register_for(self: &Arc<Self>, hooks: &mut ConnectHooks) -> Arc<dyn ConnectListener> {
        let listener: Arc<dyn ConnectListener> = self.clone();
        hooks.listen(listener.clone());
        listener
    }
}
