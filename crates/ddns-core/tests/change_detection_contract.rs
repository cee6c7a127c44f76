//! Contract Test: Change Detection & Last-Known Address
//!
//! Constraints verified:
//! - An update call is issued iff the resolved address differs from the last pushed one
//! - The first cycle always updates (last-known starts empty)
//! - The last-known address advances only after the provider accepted the update
//! - IPv4 is always checked and updated before IPv6
//!
//! If this test fails, the engine either spams the provider or loses updates.

mod common;

use common::*;
use ddns_core::config::Schedule;
use ddns_core::engine::FamilyOutcome;
use ddns_core::traits::AddressFamily;
use ddns_core::Error;
use tokio_test::{assert_err, assert_ok};

#[tokio::test]
async fn first_cycle_always_updates() {
    let source = ScriptedAddressSource::new("203.0.113.7", "2001:db8::7");
    let provider = MockDnsProvider::new();
    let mut engine = engine_with(&source, &provider, minimal_config(Schedule::Once, true, false));

    let report = assert_ok!(engine.run_cycle().await);

    assert_eq!(
        report.outcomes,
        vec![FamilyOutcome::Updated {
            family: AddressFamily::V4,
            previous: String::new(),
            address: "203.0.113.7".to_string(),
        }]
    );
    assert_eq!(
        provider.updates(),
        vec![(AddressFamily::V4, "203.0.113.7".to_string())]
    );
    assert_eq!(engine.last_known(AddressFamily::V4), "203.0.113.7");
}

#[tokio::test]
async fn same_address_does_not_trigger_update() {
    let source = ScriptedAddressSource::new("203.0.113.7", "2001:db8::7");
    let provider = MockDnsProvider::new();
    let mut engine = engine_with(&source, &provider, minimal_config(Schedule::Once, true, false));

    assert_ok!(engine.run_cycle().await);
    let report = assert_ok!(engine.run_cycle().await);

    assert_eq!(report.updated_count(), 0);
    assert_eq!(
        provider.update_call_count(),
        1,
        "Expected 1 update for 2 identical addresses"
    );
}

#[tokio::test]
async fn changed_address_triggers_exactly_one_update() {
    let source = ScriptedAddressSource::new("203.0.113.7", "2001:db8::7");
    let provider = MockDnsProvider::new();
    let mut engine = engine_with(&source, &provider, minimal_config(Schedule::Once, true, false));

    assert_ok!(engine.run_cycle().await);
    source.set_address(AddressFamily::V4, "198.51.100.23");
    let report = assert_ok!(engine.run_cycle().await);

    assert_eq!(
        report.outcomes,
        vec![FamilyOutcome::Updated {
            family: AddressFamily::V4,
            previous: "203.0.113.7".to_string(),
            address: "198.51.100.23".to_string(),
        }]
    );
    assert_eq!(provider.update_call_count(), 2);
    assert_eq!(engine.last_known(AddressFamily::V4), "198.51.100.23");
}

#[tokio::test]
async fn failed_update_does_not_advance_last_known() {
    let source = ScriptedAddressSource::new("203.0.113.7", "2001:db8::7");
    let provider = MockDnsProvider::new();
    let mut engine = engine_with(&source, &provider, minimal_config(Schedule::Once, true, false));

    assert_ok!(engine.run_cycle().await);

    // New address, but the provider rejects it
    source.set_address(AddressFamily::V4, "198.51.100.23");
    provider.fail_next(1);
    let err = assert_err!(engine.run_cycle().await);

    assert!(
        matches!(err, Error::Provider { ref provider, .. } if provider == "mock"),
        "provider failures surface as Error::Provider, got {err:?}"
    );
    assert_eq!(engine.last_known(AddressFamily::V4), "203.0.113.7");

    // The next cycle retries the same address
    assert_ok!(engine.run_cycle().await);
    assert_eq!(
        provider.updates(),
        vec![
            (AddressFamily::V4, "203.0.113.7".to_string()),
            (AddressFamily::V4, "198.51.100.23".to_string()),
            (AddressFamily::V4, "198.51.100.23".to_string()),
        ]
    );
    assert_eq!(engine.last_known(AddressFamily::V4), "198.51.100.23");
}

#[tokio::test]
async fn failed_first_update_is_retried_next_cycle() {
    let source = ScriptedAddressSource::new("203.0.113.7", "2001:db8::7");
    let provider = MockDnsProvider::new();
    let mut engine = engine_with(&source, &provider, minimal_config(Schedule::Once, true, false));

    provider.fail_next(1);
    assert_err!(engine.run_cycle().await);
    assert_eq!(engine.last_known(AddressFamily::V4), "");

    let report = assert_ok!(engine.run_cycle().await);
    assert_eq!(report.updated_count(), 1);
    assert_eq!(provider.update_call_count(), 2);
}

#[tokio::test]
async fn ipv4_is_processed_before_ipv6() {
    let source = ScriptedAddressSource::new("203.0.113.7", "2001:db8::7");
    let provider = MockDnsProvider::new();
    let mut engine = engine_with(&source, &provider, minimal_config(Schedule::Once, true, true));

    assert_ok!(engine.run_cycle().await);

    let families: Vec<AddressFamily> = source.calls().into_iter().map(|(f, _)| f).collect();
    assert_eq!(families, vec![AddressFamily::V4, AddressFamily::V6]);
    assert_eq!(
        provider.updates(),
        vec![
            (AddressFamily::V4, "203.0.113.7".to_string()),
            (AddressFamily::V6, "2001:db8::7".to_string()),
        ]
    );
}

#[tokio::test]
async fn ipv4_failure_stops_the_cycle_before_ipv6() {
    let source = ScriptedAddressSource::new("203.0.113.7", "2001:db8::7");
    let provider = MockDnsProvider::new();
    let mut engine = engine_with(&source, &provider, minimal_config(Schedule::Once, true, true));

    provider.fail_next(1);
    assert_err!(engine.run_cycle().await);

    assert_eq!(source.call_count(), 1, "IPv6 must not be looked up");
    assert_eq!(engine.last_known(AddressFamily::V6), "");
}

#[tokio::test]
async fn ipv6_only_uses_update_record6() {
    let source = ScriptedAddressSource::new("203.0.113.7", "2001:db8::7");
    let provider = MockDnsProvider::new();
    let mut engine = engine_with(&source, &provider, minimal_config(Schedule::Once, false, true));

    assert_ok!(engine.run_cycle().await);

    assert_eq!(
        provider.updates(),
        vec![(AddressFamily::V6, "2001:db8::7".to_string())]
    );
    assert_eq!(engine.last_known(AddressFamily::V4), "");
}

#[tokio::test]
async fn malformed_answer_is_forwarded_verbatim() {
    let source = ScriptedAddressSource::new("not-an-ip", "2001:db8::7");
    let provider = MockDnsProvider::new();
    let mut engine = engine_with(&source, &provider, minimal_config(Schedule::Once, true, false));

    assert_ok!(engine.run_cycle().await);

    assert_eq!(
        provider.updates(),
        vec![(AddressFamily::V4, "not-an-ip".to_string())]
    );
}

#[tokio::test]
async fn provider_is_created_once_per_cycle() {
    let source = ScriptedAddressSource::new("203.0.113.7", "2001:db8::7");
    let provider = MockDnsProvider::new();
    let mut engine = engine_with(&source, &provider, minimal_config(Schedule::Once, true, true));

    assert_ok!(engine.run_cycle().await);
    assert_ok!(engine.run_cycle().await);

    assert_eq!(provider.created_count(), 2);
}
