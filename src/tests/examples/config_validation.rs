#[cfg(test)]
mod tests {

    use std::io::Write;
    use std::path::Path;
    use std::sync::Arc;
    use std::time::Duration;

    use serial_test::serial;

    use crate::config::loader::{expand_env_vars, file_to_config, parse_config};
    use crate::config::provider::build_provider;
    use crate::config::settings::{LogFormat, ServiceConfig};
    use crate::config::validator::validate_service_config;
    use crate::session::{Credentials, Session};

    fn session() -> Session {
        Session::new(None, Arc::new(Credentials::new("AKIDEXAMPLE", "secret", None)))
    }

    #[tokio::test]
    #[serial]
    async fn validate_demo_config_is_valid() {
        std::env::remove_var("RDS_REGION");
        let path = Path::new("demos/rds-iam-auth.yaml");
        let service_config: ServiceConfig = file_to_config(path)
            .await
            .expect("demos/rds-iam-auth.yaml must exist in repo root for tests");
        validate_service_config(&service_config).unwrap();

        let settings = &service_config.settings;
        assert_eq!(settings.region(), Some("us-west-2"));
        assert_eq!(settings.cache_timeout(), 600);
        assert_eq!(settings.expires_in, Some(900));
    }

    #[tokio::test]
    async fn config_file_from_tempdir_loads() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "settings:\n  region: eu-north-1\n  cache_timeout: 0").unwrap();

        let cfg = file_to_config(file.path()).await.unwrap();
        assert_eq!(cfg.settings.region(), Some("eu-north-1"));
        assert_eq!(cfg.settings.cache_timeout(), 0);
    }

    #[tokio::test]
    async fn missing_config_file_is_an_error() {
        let err = file_to_config(Path::new("does/not/exist.yaml")).await.unwrap_err();
        assert!(err.to_string().contains("does/not/exist.yaml"));
    }

    #[test]
    #[serial]
    fn defaults_are_applied() {
        std::env::remove_var("LOG_FORMAT");
        let cfg = parse_config("settings:\n  region: us-east-2\n").unwrap();
        assert_eq!(cfg.settings.cache_timeout, Some(600));
        let logging = cfg.settings.logging.unwrap();
        assert_eq!(logging.level, "info");
        assert_eq!(logging.format, LogFormat::Compact);
    }

    #[test]
    #[serial]
    fn env_vars_are_expanded_with_defaults() {
        std::env::set_var("RDS_IAM_TEST_REGION", "sa-east-1");
        assert_eq!(
            expand_env_vars("region: ${RDS_IAM_TEST_REGION}\nother: ${RDS_IAM_TEST_UNSET:fallback}"),
            "region: sa-east-1\nother: fallback"
        );
        std::env::remove_var("RDS_IAM_TEST_REGION");
    }

    #[test]
    fn invalid_config_reports_all_errors() {
        // negative timeout, out-of-range expiry and unknown log level at once
        let invalid_yaml = r#"
settings:
  region: us-west-2
  cache_timeout: -1
  expires_in: 3600
  logging:
    level: verbose
    format: json
"#;
        let err = parse_config(invalid_yaml).unwrap_err().to_string();
        assert!(err.contains("config is not valid"));
        assert!(err.contains("cache_timeout must be 0 or positive"), "{}", err);
        assert!(err.contains("expires_in must be between 1 and 900"), "{}", err);
        assert!(err.contains("logging.level 'verbose'"), "{}", err);
    }

    #[test]
    fn cache_timeout_longer_than_token_validity_is_rejected() {
        let err = parse_config("settings:\n  region: us-west-2\n  cache_timeout: 3600\n  expires_in: 300\n")
            .unwrap_err()
            .to_string();
        assert!(
            err.contains("settings.cache_timeout (3600s) must not exceed the token validity of 300s"),
            "{}",
            err
        );

        // without expires_in the signer default of 900s applies
        let err = parse_config("settings:\n  cache_timeout: 901\n").unwrap_err().to_string();
        assert!(err.contains("token validity of 900s"), "{}", err);

        let cfg = parse_config("settings:\n  cache_timeout: 300\n  expires_in: 300\n").unwrap();
        assert_eq!(cfg.settings.cache_timeout(), 300);
        parse_config("settings:\n  cache_timeout: 900\n").unwrap();
    }

    #[test]
    fn malformed_yaml_is_rejected() {
        assert!(parse_config("settings: [not, a, map]").is_err());
    }

    #[test]
    fn settings_build_a_provider() {
        let cfg = parse_config("settings:\n  region: us-west-2\n  cache_timeout: 120\n  expires_in: 300\n")
            .unwrap();
        let provider = build_provider(&cfg.settings, session()).unwrap();

        assert_eq!(provider.region_name(), Some("us-west-2"));
        assert_eq!(provider.cache_timeout(), Duration::from_secs(120));
        assert_eq!(provider.issuer().expires_in(), Duration::from_secs(300));

        let token = provider
            .generate_auth_token("iam_user", "db.example.com", 5432, None)
            .unwrap();
        assert!(token.starts_with("db.example.com:5432/?Action=connect&DBUser=iam_user&"));
        assert!(token.contains("&X-Amz-Expires=300&"));
    }

    #[test]
    fn negative_timeout_fails_provider_construction() {
        let cfg = ServiceConfig::default();
        let mut settings = cfg.settings;
        settings.cache_timeout = Some(-10);
        let err = build_provider(&settings, session()).unwrap_err();
        assert!(format!("{:#}", err).contains("cache_timeout must be 0 or positive, got -10"));
    }
}
