use std::time::{Duration, Instant};

use rollcall_domain::availability::{DatabaseAvailability, UnavailableReason};
use rollcall_domain::config::DatabaseConfig;
use rollcall_kernel::server::DatabaseGate;

#[tokio::test]
async fn not_configured_answers_immediately() {
    let gate = DatabaseGate::new(None);
    assert!(!gate.is_configured());
    assert_eq!(
        gate.check().await,
        DatabaseAvailability::Unavailable(UnavailableReason::NotConfigured)
    );
    assert_eq!(gate.acquire().await.unwrap_err(), UnavailableReason::NotConfigured);
}

#[tokio::test]
async fn in_memory_engine_is_available() {
    let mut config = DatabaseConfig::new("mem://");
    config.probe_timeout = Duration::from_secs(10);
    let gate = DatabaseGate::new(Some(config));

    assert_eq!(gate.check().await, DatabaseAvailability::Available);
    let db = gate.acquire().await.unwrap();
    assert_eq!(db.namespace(), "rollcall");

    // Clones share the connection.
    let again = gate.clone().acquire().await.unwrap();
    assert_eq!(again.database(), db.database());
}

#[tokio::test]
async fn unreachable_database_is_reported_within_the_probe_timeout() {
    let mut config = DatabaseConfig::new("ws://127.0.0.1:1");
    config.probe_timeout = Duration::from_millis(500);
    config.availability_ttl = Duration::ZERO;
    let gate = DatabaseGate::new(Some(config));

    let started = Instant::now();
    assert_eq!(
        gate.check().await,
        DatabaseAvailability::Unavailable(UnavailableReason::ConnectionError)
    );
    assert!(started.elapsed() < Duration::from_secs(3));
    assert_eq!(gate.acquire().await.unwrap_err(), UnavailableReason::ConnectionError);
}

#[tokio::test]
async fn concurrent_checks_agree() {
    let mut config = DatabaseConfig::new("ws://127.0.0.1:1");
    config.probe_timeout = Duration::from_millis(300);
    let gate = DatabaseGate::new(Some(config));

    let (a, b, c) = tokio::join!(gate.check(), gate.check(), gate.check());
    assert_eq!(a, b);
    assert_eq!(b, c);
    assert!(!a.is_available());
}
