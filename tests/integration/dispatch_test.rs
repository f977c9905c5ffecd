//! Integration tests for the scheduled sweep.

mod helpers;

use std::collections::BTreeSet;

use helpers::World;
use vestibulare_entity::attempt::AttemptOutcome;
use vestibulare_entity::event::EventCategory;
use vestibulare_entity::subscription::Channel;

#[tokio::test]
async fn test_basic_user_gets_both_channels_once() {
    let world = World::new();
    let enem = world.program("ENEM");
    let user = world.user("basic", "Beatriz");
    world.subscribe(&user, &enem, &[Channel::Whatsapp, Channel::Email]);
    world.event(&enem, EventCategory::ExamSitting, "Primeiro dia de prova", 7, &[1, 3, 7]);

    let first = world.engine.run_sweep(None).await.expect("sweep");
    assert_eq!(first.sent, 2);
    assert_eq!(first.failed, 0);
    assert_eq!(world.whatsapp.count(), 1);
    assert_eq!(world.email.count(), 1);

    let second = world.engine.run_sweep(None).await.expect("sweep");
    assert_eq!(second.sent, 0);
    assert_eq!(second.skip_reasons.get("already-sent"), Some(&2));
    assert_eq!(world.whatsapp.count(), 1);
    assert_eq!(world.email.count(), 1);
    assert_eq!(world.sent_attempts().len(), 2);
}

#[tokio::test]
async fn test_template_context_is_fully_populated() {
    let world = World::new();
    let enem = world.program("ENEM");
    let user = world.user("basic", "Beatriz");
    world.subscribe(&user, &enem, &[Channel::Email]);
    world.event(&enem, EventCategory::ExamSitting, "Primeiro dia de prova", 7, &[7]);

    world.engine.run_sweep(None).await.expect("sweep");

    let deliveries = world.email.deliveries();
    assert_eq!(deliveries.len(), 1);
    let (recipient, context) = &deliveries[0];
    assert_eq!(recipient.email, "beatriz@example.com");
    assert_eq!(context.user_name, "Beatriz");
    assert_eq!(context.program_name, "ENEM");
    assert_eq!(context.event_label, "Primeiro dia de prova");
    assert_eq!(context.formatted_date, "24 de outubro de 2026");
    assert_eq!(context.urgency_text, "em 7 dias");
    assert_eq!(context.official_url.as_deref(), Some("https://enem.example.br"));
}

#[tokio::test]
async fn test_free_tier_only_gets_whatsapp() {
    let world = World::new();
    let enem = world.program("ENEM");
    let user = world.user("free", "Caio");
    world.subscribe(&user, &enem, &[Channel::Whatsapp, Channel::Email, Channel::Sms]);
    world.event(&enem, EventCategory::ExamSitting, "Prova", 7, &[1, 3, 7]);

    let report = world.engine.run_sweep(None).await.expect("sweep");

    assert_eq!(report.sent, 1);
    assert_eq!(world.whatsapp.count(), 1);
    assert_eq!(world.email.count(), 0);
    assert_eq!(world.sms.count(), 0);
    assert_eq!(
        report.skip_reasons.get("entitlement:tier-restricted-channel"),
        Some(&2)
    );
    assert!(world.attempts().iter().all(|a| a.channel == Channel::Whatsapp));
}

#[tokio::test]
async fn test_free_tier_category_restriction() {
    let world = World::new();
    let enem = world.program("ENEM");
    let user = world.user("free", "Caio");
    world.subscribe(&user, &enem, &[Channel::Whatsapp]);
    world.event(&enem, EventCategory::Results, "Resultado final", 3, &[3]);

    let report = world.engine.run_sweep(None).await.expect("sweep");

    assert_eq!(report.sent, 0);
    assert_eq!(
        report.skip_reasons.get("entitlement:tier-restricted-category"),
        Some(&1)
    );
    assert!(world.attempts().is_empty());
}

#[tokio::test]
async fn test_subscription_category_filter() {
    let world = World::new();
    let fuvest = world.program("FUVEST");
    let user = world.user("premium", "Dora");
    world.subscribe_filtered(
        &user,
        &fuvest,
        &[Channel::Email],
        Some(vec![EventCategory::RegistrationOpen]),
    );
    world.event(&fuvest, EventCategory::ExamSitting, "Primeira fase", 1, &[1]);
    world.event(&fuvest, EventCategory::RegistrationOpen, "Inscrições", 3, &[3]);

    let report = world.engine.run_sweep(None).await.expect("sweep");

    assert_eq!(report.sent, 1);
    assert_eq!(
        report.skip_reasons.get("entitlement:subscription-restricted-category"),
        Some(&1)
    );
    assert_eq!(world.email.deliveries()[0].1.event_label, "Inscrições");
}

#[tokio::test]
async fn test_offset_gating_follows_the_calendar() {
    let world = World::new();
    let enem = world.program("ENEM");
    let user = world.user("basic", "Elisa");
    world.subscribe(&user, &enem, &[Channel::Email]);
    world.event(&enem, EventCategory::ExamSitting, "Prova", 10, &[1, 3, 7]);

    let report = world.engine.run_sweep(None).await.expect("sweep");
    assert_eq!(report.events, 1);
    assert_eq!(report.sent, 0);
    assert_eq!(report.skipped, 0);
    assert_eq!(world.email.count(), 0);

    world.advance_days(3);
    let report = world.engine.run_sweep(None).await.expect("sweep");
    assert_eq!(report.sent, 1);
    assert_eq!(world.email.deliveries()[0].1.urgency_text, "em 7 dias");
}

#[tokio::test]
async fn test_empty_offsets_fall_back_to_defaults() {
    let world = World::new();
    let enem = world.program("ENEM");
    let user = world.user("basic", "Elisa");
    world.subscribe(&user, &enem, &[Channel::Email]);
    world.event(&enem, EventCategory::Enrollment, "Matrícula", 3, &[]);
    world.event(&enem, EventCategory::Enrollment, "Matrícula tardia", 5, &[]);

    let report = world.engine.run_sweep(None).await.expect("sweep");

    assert_eq!(report.events, 2);
    assert_eq!(report.sent, 1);
    assert_eq!(world.email.deliveries()[0].1.event_label, "Matrícula");
}

#[tokio::test]
async fn test_quota_of_one_blocks_further_events() {
    let world = World::with_quota("basic", 1);
    let enem = world.program("ENEM");
    let user = world.user("basic", "Fabio");
    let sub = world.subscribe(&user, &enem, &[Channel::Email]);

    let earlier = world.event(&enem, EventCategory::RegistrationOpen, "Inscrições", 40, &[]);
    world.prior_send(&sub, &earlier, Channel::Email);

    world.event(&enem, EventCategory::ExamSitting, "Dia 1", 1, &[1]);
    world.event(&enem, EventCategory::ExamSitting, "Dia 2", 3, &[3]);
    world.event(&enem, EventCategory::Results, "Gabarito", 7, &[7]);

    let report = world.engine.run_sweep(None).await.expect("sweep");

    assert_eq!(report.sent, 0);
    assert_eq!(report.skip_reasons.get("entitlement:quota-exceeded"), Some(&3));
    assert_eq!(world.email.count(), 0);
    assert_eq!(world.sent_attempts().len(), 1);
}

#[tokio::test]
async fn test_quota_is_not_overrun_within_one_event() {
    let world = World::with_quota("premium", 1);
    let enem = world.program("ENEM");
    let user = world.user("premium", "Gil");
    world.subscribe(&user, &enem, &[Channel::Email, Channel::Sms, Channel::Whatsapp]);
    world.event(&enem, EventCategory::ExamSitting, "Prova", 1, &[1]);

    let report = world.engine.run_sweep(None).await.expect("sweep");

    assert_eq!(report.sent, 1);
    assert_eq!(report.skip_reasons.get("entitlement:quota-exceeded"), Some(&2));
}

#[tokio::test]
async fn test_failure_is_recorded_and_retried_next_sweep() {
    let world = World::new();
    let enem = world.program("ENEM");
    let user = world.user("basic", "Helena");
    world.subscribe(&user, &enem, &[Channel::Email, Channel::Whatsapp]);
    world.event(&enem, EventCategory::ExamSitting, "Prova", 7, &[7]);

    world.email.fail_with("mailbox full");
    let report = world.engine.run_sweep(None).await.expect("sweep");
    assert_eq!(report.sent, 1);
    assert_eq!(report.failed, 1);
    assert_eq!(report.errors, vec!["email/helena@example.com: rejected: mailbox full"]);

    let failed: Vec<_> = world
        .attempts()
        .into_iter()
        .filter(|a| a.outcome == AttemptOutcome::Failed)
        .collect();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].channel, Channel::Email);
    assert_eq!(failed[0].error_message.as_deref(), Some("rejected: mailbox full"));

    world.email.recover();
    let report = world.engine.run_sweep(None).await.expect("sweep");
    assert_eq!(report.sent, 1);
    assert_eq!(report.failed, 0);
    assert_eq!(world.email.count(), 1);
    assert_eq!(world.whatsapp.count(), 1);
}

#[tokio::test]
async fn test_at_most_one_sent_per_triple() {
    let world = World::new();
    let enem = world.program("ENEM");
    let fuvest = world.program("FUVEST");
    for name in ["Ines", "Joao", "Katia"] {
        let user = world.user("premium", name);
        world.subscribe(&user, &enem, &[Channel::Email, Channel::Sms]);
        world.subscribe(&user, &fuvest, &[Channel::Whatsapp]);
    }
    world.event(&enem, EventCategory::ExamSitting, "Prova", 1, &[1, 3]);
    world.event(&fuvest, EventCategory::Appeal, "Recursos", 3, &[3]);

    let (a, b) = tokio::join!(world.engine.run_sweep(None), world.engine.run_sweep(None));
    a.expect("sweep");
    b.expect("sweep");
    world.engine.run_sweep(None).await.expect("sweep");

    let sent = world.sent_attempts();
    let triples: BTreeSet<_> = sent
        .iter()
        .map(|a| (a.subscription_id, a.event_id, a.channel))
        .collect();
    assert_eq!(sent.len(), triples.len());
    assert_eq!(sent.len(), 9);
}

#[tokio::test]
async fn test_missing_user_is_skipped_without_aborting() {
    let world = World::new();
    let enem = world.program("ENEM");
    let present = world.user("basic", "Lara");
    world.subscribe(&present, &enem, &[Channel::Email]);

    let mut ghost = world.user("basic", "Mauro");
    ghost.id = vestibulare_core::types::UserId::new();
    world.subscribe(&ghost, &enem, &[Channel::Email]);

    world.event(&enem, EventCategory::ExamSitting, "Prova", 7, &[7]);

    let report = world.engine.run_sweep(None).await.expect("sweep");

    assert_eq!(report.sent, 1);
    assert_eq!(report.skip_reasons.get("missing-user"), Some(&1));
}

#[tokio::test]
async fn test_event_load_failure_aborts_sweep() {
    let world = World::new();
    world.store.set_fail_event_loads(true);

    let err = world.engine.run_sweep(None).await.unwrap_err();
    assert_eq!(err.kind, vestibulare_core::error::ErrorKind::Database);
}

#[tokio::test]
async fn test_window_override_limits_events() {
    let world = World::new();
    let enem = world.program("ENEM");
    let user = world.user("basic", "Nina");
    world.subscribe(&user, &enem, &[Channel::Email]);
    world.event(&enem, EventCategory::ExamSitting, "Perto", 1, &[1]);
    world.event(&enem, EventCategory::ExamSitting, "Longe", 7, &[7]);

    let report = world.engine.run_sweep(Some(3)).await.expect("sweep");

    assert_eq!(report.events, 1);
    assert_eq!(report.sent, 1);
    assert_eq!(world.email.deliveries()[0].1.event_label, "Perto");
}
