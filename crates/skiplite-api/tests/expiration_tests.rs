mod common;

use common::EngineTestFixture;
use skiplite::{Engine, Expiry, Ttl};

#[test]
fn test_alive_before_ttl_expired_at_ttl() {
    let fixture = EngineTestFixture::new();
    let engine: Engine<String, String> = fixture.engine();
    let key = "session".to_string();
    engine.insert(key.clone(), "token".into()).unwrap();
    assert_eq!(engine.expiry(&key).unwrap(), Expiry::Unknown);

    assert!(engine.set_ttl(&key, 30).unwrap());
    fixture.clock.advance(29);
    assert_eq!(engine.expiry(&key).unwrap(), Expiry::Alive);
    assert_eq!(engine.ttl(&key).unwrap(), Ttl::Remaining(1));

    fixture.clock.advance(1);
    assert_eq!(engine.expiry(&key).unwrap(), Expiry::Expired);
    assert_eq!(engine.search(&key).unwrap(), None);
    assert_eq!(engine.ttl(&key).unwrap(), Ttl::NotFound);
}

#[test]
fn test_set_ttl_on_expired_key_fails() {
    let fixture = EngineTestFixture::new();
    let engine: Engine<u32, String> = fixture.engine();
    engine.insert(1, "a".into()).unwrap();
    engine.set_ttl(&1, 1).unwrap();
    fixture.clock.advance(1);
    assert!(!engine.set_ttl(&1, 100).unwrap());
}

#[test]
fn test_sweep_reclaims_heavily_expired_workload() {
    let fixture = EngineTestFixture::new();
    let engine: Engine<u32, String> = fixture.engine();
    for key in 0..1_000u32 {
        engine.insert(key, key.to_string()).unwrap();
        engine.set_ttl(&key, 5).unwrap();
    }
    fixture.clock.advance(5);

    // Every sampled round is fully expired, so one call drains them all
    assert_eq!(engine.cycle_delete().unwrap(), 1_000);
    let stats = engine.stats().unwrap();
    assert_eq!(stats.len, 0);
    assert_eq!(stats.tracked_ttls, 0);
    assert_eq!(stats.cache_len, 0);
}

#[test]
fn test_sweep_stops_when_mostly_alive() {
    let fixture = EngineTestFixture::new();
    let engine: Engine<u32, String> = fixture.engine();
    for key in 0..100u32 {
        engine.insert(key, key.to_string()).unwrap();
        let ttl = if key < 5 { 1 } else { 1_000 };
        engine.set_ttl(&key, ttl).unwrap();
    }
    fixture.clock.advance(2);

    let purged = engine.cycle_delete().unwrap();
    assert!(purged <= 5);
    // Whatever the sweep missed is still purged lazily
    for key in 0..5u32 {
        assert_eq!(engine.search(&key).unwrap(), None);
    }
    assert_eq!(engine.len().unwrap(), 95);
}

#[test]
fn test_expired_cached_key_is_not_served() {
    let fixture = EngineTestFixture::new();
    let engine: Engine<u32, String> = fixture.engine();
    engine.insert(1, "hot".into()).unwrap();
    assert_eq!(engine.search(&1).unwrap().as_deref(), Some("hot"));
    assert!(engine.is_cached(&1).unwrap());

    engine.set_ttl(&1, 2).unwrap();
    fixture.clock.advance(3);
    assert_eq!(engine.search(&1).unwrap(), None);
    assert!(!engine.is_cached(&1).unwrap());
}
