use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;

use rollcall_domain::config::{
    AppConfig, AppConfigInner, DatabaseConfig, DatabaseCredentials, SecurityConfig, ServerConfig,
};

#[test]
fn config_defaults_are_sane() {
    let server = ServerConfig::default();
    assert_eq!(server.host, IpAddr::V4(Ipv4Addr::UNSPECIFIED));
    assert_eq!(server.port, 3001);
    assert_eq!(server.docs_prefix, "/docs");
    assert_eq!(server.request_timeout, Duration::from_secs(30));

    let security = SecurityConfig::default();
    assert!(security.secret.is_none());
    assert_eq!(security.token_ttl_minutes, 60);

    let db = DatabaseConfig::new("mem://");
    assert_eq!(db.namespace, "rollcall");
    assert_eq!(db.database, "attendance");
    assert!(db.credentials.is_none());
    assert_eq!(db.probe_timeout, Duration::from_secs(2));
}

#[test]
fn app_config_is_cheap_to_share_and_copy_on_write() {
    let shared = AppConfig::new(AppConfigInner::default());
    let mut edited = shared.clone();
    edited.server.port = 8080;

    assert_eq!(shared.server.port, 3001);
    assert_eq!(edited.server.port, 8080);
    assert!(shared.database.is_none());
}

#[test]
fn debug_output_redacts_secrets() {
    let security = SecurityConfig { secret: Some("hunter2".to_owned()), ..SecurityConfig::default() };
    let credentials =
        DatabaseCredentials { username: "root".to_owned(), password: "hunter2".to_owned() };

    let rendered = format!("{security:?} {credentials:?}");
    assert!(!rendered.contains("hunter2"));
    assert!(rendered.contains("root"));
}
