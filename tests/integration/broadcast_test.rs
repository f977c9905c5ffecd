//! Integration tests for the operator broadcast.

mod helpers;

use helpers::World;
use vestibulare_core::error::ErrorKind;
use vestibulare_core::types::ExamEventId;
use vestibulare_entity::event::EventCategory;
use vestibulare_entity::subscription::Channel;

#[tokio::test]
async fn test_broadcast_bypasses_offset_gate() {
    let world = World::new();
    let enem = world.program("ENEM");
    let user = world.user("basic", "Otavio");
    world.subscribe(&user, &enem, &[Channel::Email, Channel::Whatsapp]);
    let event = world.event(&enem, EventCategory::Other, "Mudança de local", 12, &[1, 3, 7]);

    let sweep = world.engine.run_sweep(None).await.expect("sweep");
    assert_eq!(sweep.sent, 0);

    let report = world.engine.broadcast(event.id).await.expect("broadcast");
    assert_eq!(report.events, 1);
    assert_eq!(report.sent, 2);
    assert_eq!(world.email.deliveries()[0].1.urgency_text, "em 12 dias");
}

#[tokio::test]
async fn test_broadcast_rerun_does_not_renotify() {
    let world = World::new();
    let enem = world.program("ENEM");
    let user = world.user("premium", "Paula");
    world.subscribe(&user, &enem, &[Channel::Sms]);
    let event = world.event(&enem, EventCategory::WaitlistCall, "Lista de espera", 20, &[]);

    world.engine.broadcast(event.id).await.expect("broadcast");
    let again = world.engine.broadcast(event.id).await.expect("broadcast");

    assert_eq!(again.sent, 0);
    assert_eq!(again.skip_reasons.get("already-sent"), Some(&1));
    assert_eq!(world.sms.count(), 1);
}

#[tokio::test]
async fn test_broadcast_and_sweep_share_the_dedup_key() {
    let world = World::new();
    let enem = world.program("ENEM");
    let user = world.user("basic", "Rui");
    world.subscribe(&user, &enem, &[Channel::Email]);
    let event = world.event(&enem, EventCategory::ExamSitting, "Prova", 3, &[3]);

    world.engine.broadcast(event.id).await.expect("broadcast");
    let sweep = world.engine.run_sweep(None).await.expect("sweep");

    assert_eq!(sweep.sent, 0);
    assert_eq!(sweep.skip_reasons.get("already-sent"), Some(&1));
    assert_eq!(world.email.count(), 1);
    assert_eq!(world.sent_attempts().len(), 1);
}

#[tokio::test]
async fn test_broadcast_still_applies_entitlements() {
    let world = World::new();
    let enem = world.program("ENEM");
    let free = world.user("free", "Sara");
    world.subscribe(&free, &enem, &[Channel::Email, Channel::Whatsapp]);
    let filtered = world.user("premium", "Tiago");
    world.subscribe_filtered(
        &filtered,
        &enem,
        &[Channel::Email],
        Some(vec![EventCategory::Results]),
    );
    let event = world.event(&enem, EventCategory::ExamSitting, "Prova", 15, &[]);

    let report = world.engine.broadcast(event.id).await.expect("broadcast");

    assert_eq!(report.sent, 1);
    assert_eq!(world.whatsapp.count(), 1);
    assert_eq!(world.email.count(), 0);
    assert_eq!(
        report.skip_reasons.get("entitlement:tier-restricted-channel"),
        Some(&1)
    );
    assert_eq!(
        report.skip_reasons.get("entitlement:subscription-restricted-category"),
        Some(&1)
    );
}

#[tokio::test]
async fn test_broadcast_skips_other_programs() {
    let world = World::new();
    let enem = world.program("ENEM");
    let fuvest = world.program("FUVEST");
    let user = world.user("basic", "Ursula");
    world.subscribe(&user, &fuvest, &[Channel::Email]);
    let event = world.event(&enem, EventCategory::Results, "Notas", 2, &[]);

    let report = world.engine.broadcast(event.id).await.expect("broadcast");

    assert_eq!(report.sent, 0);
    assert_eq!(report.skipped, 0);
    assert_eq!(world.email.count(), 0);
}

#[tokio::test]
async fn test_broadcast_unknown_event_is_not_found() {
    let world = World::new();

    let err = world.engine.broadcast(ExamEventId::new()).await.unwrap_err();

    assert_eq!(err.kind, ErrorKind::NotFound);
}
