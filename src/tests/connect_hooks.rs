#[cfg(test)]
mod test {

    use std::sync::Arc;

    use crate::auth::TokenProvider;
    use crate::connect::{BoxError, ConnectHooks, ConnectListener, ConnectParams};
    use crate::tests::common::{provider, session, CountingIssuer, HOST};

    /// Listener that records the password it saw
    struct PasswordProbe(parking_lot::Mutex<Option<String>>);

    impl ConnectListener for PasswordProbe {
        fn before_connect(&self, params: &mut ConnectParams) -> Result<(), BoxError> {
            *self.0.lock() = params.password.clone();
            Ok(())
        }
    }

    struct Reject;

    impl ConnectListener for Reject {
        fn before_connect(&self, _: &mut ConnectParams) -> Result<(), BoxError> {
            Err("connection vetoed".into())
        }
    }

    #[test]
    fn provide_token_sets_only_the_password() {
        let issuer = CountingIssuer::scripted(["tok-A"]);
        let auth = provider(&issuer, 600);

        let mut params = ConnectParams::new("u", "h", 5432)
            .with_database("app")
            .with_option("sslmode", "require");
        let before = params.clone();

        auth.provide_token(&mut params).unwrap();

        assert_eq!(params.password.as_deref(), Some("tok-A"));
        assert_eq!(
            ConnectParams {
                password: None,
                ..params.clone()
            },
            before
        );
        // same token generate_auth_token would return now
        assert_eq!(auth.generate_auth_token("u", "h", 5432, None).unwrap(), "tok-A");
        assert_eq!(issuer.calls(), 1);
    }

    #[test]
    fn provide_token_resolves_region_without_call_override() {
        let issuer = CountingIssuer::new();
        let auth = TokenProvider::builder()
            .session(session(Some("us-east-1")))
            .build_with_issuer(issuer.clone())
            .unwrap();

        let mut params = ConnectParams::new("u", HOST, 5432);
        auth.provide_token(&mut params).unwrap();
        assert_eq!(issuer.seen()[0].region, "us-east-1");

        let configured = provider(&issuer, 600);
        configured.provide_token(&mut params).unwrap();
        assert_eq!(issuer.seen()[1].region, "us-west-2");
    }

    #[test]
    fn failed_provide_leaves_password_untouched() {
        let issuer = CountingIssuer::new();
        issuer.fail_next("access denied");
        let auth = provider(&issuer, 600);

        let mut params = ConnectParams::new("u", HOST, 5432);
        params.password = Some("stale".into());
        let err = auth.provide_token(&mut params).unwrap_err();

        assert_eq!(err.to_string(), "issuer unavailable: access denied");
        assert_eq!(params.password.as_deref(), Some("stale"));
    }

    #[test]
    fn registered_provider_fills_password_on_dispatch() {
        let issuer = CountingIssuer::scripted(["hooked-token"]);
        let auth = Arc::new(provider(&issuer, 600));
        let probe = Arc::new(PasswordProbe(parking_lot::Mutex::new(None)));

        let mut hooks = ConnectHooks::new();
        let handle = auth.register_for(&mut hooks);
        hooks.listen(probe.clone());

        assert!(hooks.contains(&handle));
        assert_eq!(hooks.len(), 2);

        let mut params = ConnectParams::new("test_user", HOST, 5432);
        hooks.dispatch(&mut params).unwrap();

        assert_eq!(params.password.as_deref(), Some("hooked-token"));
        // listeners run in registration order
        assert_eq!(probe.0.lock().as_deref(), Some("hooked-token"));
    }

    #[test]
    fn failing_listener_aborts_dispatch() {
        let issuer = CountingIssuer::new();
        let auth = Arc::new(provider(&issuer, 600));

        let mut hooks = ConnectHooks::new();
        hooks.listen(Arc::new(Reject));
        auth.register_for(&mut hooks);

        let mut params = ConnectParams::new("u", HOST, 5432);
        let err = hooks.dispatch(&mut params).unwrap_err();

        assert_eq!(err.to_string(), "connection vetoed");
        assert_eq!(params.password, None);
        assert_eq!(issuer.calls(), 0);
    }

    #[test]
    fn unregistered_listener_is_not_contained() {
        let issuer = CountingIssuer::new();
        let auth = Arc::new(provider(&issuer, 600));
        let hooks = ConnectHooks::new();

        let listener: Arc<dyn ConnectListener> = auth;
        assert!(!hooks.contains(&listener));
        assert!(hooks.is_empty());
    }

    #[test]
    fn debug_output_redacts_password() {
        let mut params = ConnectParams::new("u", HOST, 5432);
        params.password = Some("super-secret-token".into());
        let printed = format!("{:?}", params);
        assert!(!printed.contains("super-secret-token"));
        assert!(printed.contains("redacted"));
    }
}
