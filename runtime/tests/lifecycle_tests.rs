//! End-to-end behavior of the edition and guest lifecycle managers over the in-memory
//! store.

#![allow(clippy::unwrap_used)]

use chrono::{DateTime, Duration, Utc};
use guestlist_core::environment::Clock;
use guestlist_core::invite::InviteLinkBuilder;
use guestlist_core::types::{
    EventEdition, GuestLookup, GuestStatus, GuestUpdate, PreselectionStatus,
};
use guestlist_core::{Enrichment, LifecycleError, WebhookKind};
use guestlist_runtime::{EditionLifecycle, GuestLifecycle, LifecycleEnvironment};
use guestlist_testing::fixtures::{ana, carla, guest_profile, preselection_profile};
use guestlist_testing::{test_clock, FixedClock, InMemoryStore, RecordingNotifier};
use std::sync::Arc;

struct Harness {
    clock: FixedClock,
    store: InMemoryStore,
    notifier: RecordingNotifier,
    editions: EditionLifecycle,
    guests: GuestLifecycle,
}

impl Harness {
    fn new() -> Self {
        let clock = test_clock();
        let store = InMemoryStore::new();
        let notifier = RecordingNotifier::new();
        let env = LifecycleEnvironment::new(
            Arc::new(clock.clone()),
            Arc::new(store.clone()),
            Arc::new(store.clone()),
            Arc::new(notifier.clone()),
            InviteLinkBuilder::new("http://localhost:3000/confirmar"),
        );
        Self {
            clock,
            store,
            notifier,
            editions: EditionLifecycle::new(env.clone()),
            guests: GuestLifecycle::new(env),
        }
    }

    async fn active(&self) -> EventEdition {
        self.editions.get_or_create_active().await.unwrap()
    }
}

fn at(rfc3339: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(rfc3339).unwrap().with_timezone(&Utc)
}

// ============================================================================
// Editions
// ============================================================================

#[tokio::test]
async fn test_implicit_edition_is_named_after_the_month() {
    let h = Harness::new();
    let edition = h.active().await;
    assert_eq!(edition.name, "Março 2025");
    assert!(edition.active && !edition.archived);

    let again = h.active().await;
    assert_eq!(again.id, edition.id);
    assert_eq!(h.store.all_editions().len(), 1);
}

#[tokio::test]
async fn test_concurrent_get_or_create_yields_one_edition() {
    let h = Harness::new();
    let (a, b, c) = tokio::join!(
        h.editions.get_or_create_active(),
        h.editions.get_or_create_active(),
        h.editions.get_or_create_active()
    );
    let ids = [a.unwrap().id, b.unwrap().id, c.unwrap().id];
    assert!(ids.iter().all(|id| *id == ids[0]));
    assert_eq!(h.store.active_count(), 1);
}

#[tokio::test]
async fn test_create_requires_a_name_and_takes_over_as_active() {
    let h = Harness::new();
    let first = h.active().await;

    let err = h.editions.create("   ", None).await.unwrap_err();
    assert!(matches!(err, LifecycleError::Validation(_)));

    let special = h
        .editions
        .create(" Edição Especial ", Some("  ".to_string()))
        .await
        .unwrap();
    assert_eq!(special.name, "Edição Especial");
    assert_eq!(special.description, None);
    assert_eq!(h.active().await.id, special.id);
    assert!(!h.editions.get(first.id).await.unwrap().active);
    assert_eq!(h.store.active_count(), 1);
}

#[tokio::test]
async fn test_archive_exports_and_rotates_to_the_next_month() {
    let h = Harness::new();
    let march = h.active().await;
    for n in 0..3 {
        h.guests.invite(guest_profile(n)).await.unwrap();
    }
    for n in 0..2 {
        h.guests.preselect(preselection_profile(n)).await.unwrap();
    }

    let result = h.editions.archive(march.id).await.unwrap();

    assert_eq!(result.export.guests_csv.lines().count(), 4);
    assert_eq!(result.export.preselections_csv.lines().count(), 3);
    assert!(result.archived.archived);
    assert!(!result.archived.active);
    assert_eq!(result.archived.ended_at, Some(h.clock.now()));
    assert!(result.active.active && !result.active.archived);
    assert_eq!(result.active.name, "Abril 2025");
    assert_eq!(result.active.started_at, at("2025-04-01T00:00:00Z"));
    assert_eq!(h.store.active_count(), 1);
    assert_eq!(h.store.all_editions().len(), 2);
}

#[tokio::test]
async fn test_archive_twice_conflicts_and_changes_nothing() {
    let h = Harness::new();
    let march = h.active().await;
    h.editions.archive(march.id).await.unwrap();

    let err = h.editions.archive(march.id).await.unwrap_err();
    assert!(matches!(err, LifecycleError::Conflict(ref msg) if msg.contains("already archived")));
    assert_eq!(h.store.all_editions().len(), 2);
}

#[tokio::test]
async fn test_archive_unknown_edition_is_not_found() {
    let h = Harness::new();
    let err = h
        .editions
        .archive(guestlist_core::EditionId::new())
        .await
        .unwrap_err();
    assert!(matches!(err, LifecycleError::NotFound { entity: "edition", .. }));
}

#[tokio::test]
async fn test_switch_toggles_active_only() {
    let h = Harness::new();
    let march = h.active().await;
    let special = h.editions.create("Especial", None).await.unwrap();

    let switched = h.editions.switch_to(march.id).await.unwrap();
    assert!(switched.active);
    assert!(!switched.archived);
    assert!(!h.editions.get(special.id).await.unwrap().active);
    assert_eq!(h.store.active_count(), 1);

    let err = h
        .editions
        .switch_to(guestlist_core::EditionId::new())
        .await
        .unwrap_err();
    assert!(matches!(err, LifecycleError::NotFound { .. }));
}

#[tokio::test]
async fn test_archived_edition_cannot_be_switched_to() {
    let h = Harness::new();
    let march = h.active().await;
    let result = h.editions.archive(march.id).await.unwrap();

    let err = h.editions.switch_to(march.id).await.unwrap_err();
    assert!(matches!(err, LifecycleError::Conflict(_)));
    assert_eq!(h.active().await.id, result.active.id);
}

#[tokio::test]
async fn test_list_is_newest_first_with_counts() {
    let h = Harness::new();
    let march = h.active().await;
    h.guests.invite(ana()).await.unwrap();
    h.editions.archive(march.id).await.unwrap();

    let editions = h.editions.list().await.unwrap();
    assert_eq!(editions.len(), 2);
    assert_eq!(editions[0].edition.name, "Abril 2025");
    assert_eq!(editions[1].edition.id, march.id);
    assert_eq!(editions[1].guest_count, 1);
    assert_eq!(editions[0].guest_count, 0);
}

// ============================================================================
// Guests
// ============================================================================

#[tokio::test]
async fn test_invite_confirm_check_in_scenario() {
    let h = Harness::new();
    let march = h.active().await;

    let guest = h.guests.invite(ana()).await.unwrap();
    assert_eq!(guest.status, GuestStatus::Invited);
    assert_eq!(guest.edition_id, march.id);
    assert!(guest.invite_url.contains("emailconf=ana@x.com&utm_source=Bruno"));
    assert_eq!(h.notifier.kinds(), vec![WebhookKind::GuestAdded]);

    h.clock.advance(Duration::minutes(1));
    let confirmed = h.guests.confirm(GuestLookup::Id(guest.id)).await.unwrap();
    assert_eq!(confirmed.status, GuestStatus::Confirmed);
    assert_eq!(confirmed.confirmed_at, Some(h.clock.now()));
    assert_eq!(h.notifier.count(WebhookKind::GuestConfirmed), 1);

    let checked_in = h.guests.check_in(guest.id, "staff1").await.unwrap();
    assert!(checked_in.checked_in_at.is_some());
    assert_eq!(checked_in.checked_in_by.as_deref(), Some("staff1"));
    assert_eq!(h.notifier.count(WebhookKind::GuestCheckedIn), 1);

    let err = h.guests.check_in(guest.id, "staff2").await.unwrap_err();
    assert!(matches!(err, LifecycleError::Conflict(ref msg) if msg.contains("already checked in")));
    let stored = h.guests.get(guest.id).await.unwrap();
    assert_eq!(stored, checked_in);
    assert_eq!(h.notifier.count(WebhookKind::GuestCheckedIn), 1);
}

#[tokio::test]
async fn test_invite_validates_and_rejects_duplicates() {
    let h = Harness::new();
    let mut blank = ana();
    blank.referrer = String::new();
    let err = h.guests.invite(blank).await.unwrap_err();
    assert!(matches!(err, LifecycleError::Validation(ref msg) if msg.contains("referrer")));

    h.guests.invite(ana()).await.unwrap();
    let mut masked = guest_profile(1);
    masked.phone = "(11) 99999-0000".to_string();
    let err = h.guests.invite(masked).await.unwrap_err();
    assert!(matches!(err, LifecycleError::Conflict(ref msg) if msg.contains("phone")));
    assert_eq!(h.store.all_guests().len(), 1);
    assert_eq!(h.notifier.count(WebhookKind::GuestAdded), 1);
}

#[tokio::test]
async fn test_confirm_twice_is_a_silent_no_op() {
    let h = Harness::new();
    let guest = h.guests.invite(ana()).await.unwrap();
    let first = h.guests.confirm(GuestLookup::Id(guest.id)).await.unwrap();

    h.clock.advance(Duration::hours(1));
    let second = h
        .guests
        .confirm(GuestLookup::Phone("(11) 99999-0000".to_string()))
        .await
        .unwrap();

    assert_eq!(first, second);
    assert_eq!(h.notifier.count(WebhookKind::GuestConfirmed), 1);
}

#[tokio::test]
async fn test_confirm_unknown_guest_is_not_found() {
    let h = Harness::new();
    let err = h
        .guests
        .confirm(GuestLookup::Phone("11900000000".to_string()))
        .await
        .unwrap_err();
    assert!(matches!(err, LifecycleError::NotFound { .. }));
    assert!(h.notifier.notifications().is_empty());
}

#[tokio::test]
async fn test_check_in_before_confirmation_is_a_precondition_failure() {
    let h = Harness::new();
    let guest = h.guests.invite(ana()).await.unwrap();

    let err = h.guests.check_in(guest.id, "staff1").await.unwrap_err();
    assert!(matches!(err, LifecycleError::Precondition(ref msg) if msg.contains("has not confirmed")));
    let stored = h.guests.get(guest.id).await.unwrap();
    assert!(stored.checked_in_at.is_none());
    assert!(stored.checked_in_by.is_none());
    assert_eq!(h.notifier.count(WebhookKind::GuestCheckedIn), 0);
}

#[tokio::test]
async fn test_check_in_requires_staff_and_honors_intended_time() {
    let h = Harness::new();
    let guest = h.guests.invite(ana()).await.unwrap();
    h.guests.confirm(GuestLookup::Id(guest.id)).await.unwrap();

    let err = h.guests.check_in(guest.id, " ").await.unwrap_err();
    assert!(matches!(err, LifecycleError::Validation(_)));

    let captured = h.clock.now() - Duration::minutes(30);
    let checked_in = h
        .guests
        .check_in_at(guest.id, "door-tablet", Some(captured))
        .await
        .unwrap();
    assert_eq!(checked_in.checked_in_at, Some(captured));
}

#[tokio::test]
async fn test_racing_check_ins_have_exactly_one_winner() {
    let h = Harness::new();
    let guest = h.guests.invite(ana()).await.unwrap();
    h.guests.confirm(GuestLookup::Id(guest.id)).await.unwrap();

    let (a, b) = tokio::join!(
        h.guests.check_in(guest.id, "staff1"),
        h.guests.check_in(guest.id, "staff2")
    );
    let results = [a, b];
    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(results
        .iter()
        .any(|r| matches!(r, Err(LifecycleError::Conflict(_)))));
    assert_eq!(h.notifier.count(WebhookKind::GuestCheckedIn), 1);
}

#[tokio::test]
async fn test_undo_check_in_returns_to_confirmed_without_webhook() {
    let h = Harness::new();
    let guest = h.guests.invite(ana()).await.unwrap();
    h.guests.confirm(GuestLookup::Id(guest.id)).await.unwrap();

    let err = h
        .guests
        .undo_check_in(guest.id, "staff1", None)
        .await
        .unwrap_err();
    assert!(matches!(err, LifecycleError::Precondition(_)));

    h.guests.check_in(guest.id, "staff1").await.unwrap();
    h.notifier.clear();
    let reverted = h
        .guests
        .undo_check_in(guest.id, "staff2", Some("wrong person"))
        .await
        .unwrap();
    assert!(reverted.checked_in_at.is_none());
    assert!(reverted.checked_in_by.is_none());
    assert!(reverted.is_confirmed());
    assert!(h.notifier.notifications().is_empty());

    h.guests.check_in(guest.id, "staff2").await.unwrap();
}

#[tokio::test]
async fn test_enrichment_overlays_given_fields_and_rebuilds_the_link() {
    let h = Harness::new();
    let other = h.guests.invite(guest_profile(1)).await.unwrap();
    let guest = h.guests.invite(ana()).await.unwrap();

    let enriched = h
        .guests
        .enrich_on_confirm(
            guest.id,
            GuestUpdate {
                email: Some("Ana.Lima@X.com".to_string()),
                enrichment: Enrichment {
                    industry: Some("Retail".to_string()),
                    ..Enrichment::default()
                },
                ..GuestUpdate::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(enriched.email, "ana.lima@x.com");
    assert_eq!(enriched.name, "Ana");
    assert_eq!(enriched.enrichment.industry.as_deref(), Some("Retail"));
    assert!(enriched.invite_url.contains("emailconf=ana.lima@x.com"));

    let enriched = h
        .guests
        .enrich_on_confirm(
            guest.id,
            GuestUpdate {
                enrichment: Enrichment {
                    revenue_band: Some("1-10M".to_string()),
                    ..Enrichment::default()
                },
                ..GuestUpdate::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(enriched.enrichment.industry.as_deref(), Some("Retail"));

    let err = h
        .guests
        .enrich_on_confirm(
            guest.id,
            GuestUpdate {
                email: Some(other.email.clone()),
                ..GuestUpdate::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, LifecycleError::Conflict(_)));
}

#[tokio::test]
async fn test_list_confirmed_filters_and_orders() {
    let h = Harness::new();
    let names = ["bruna", "Carlos", "Alice", "Davi"];
    let mut ids = Vec::new();
    for (n, name) in (0u32..).zip(names) {
        let mut profile = guest_profile(n);
        profile.name = name.to_string();
        ids.push(h.guests.invite(profile).await.unwrap().id);
    }
    for id in &ids[..3] {
        h.guests.confirm(GuestLookup::Id(*id)).await.unwrap();
    }
    h.guests.check_in(ids[2], "staff1").await.unwrap();

    let listed: Vec<String> = h
        .guests
        .list_confirmed(None)
        .await
        .unwrap()
        .into_iter()
        .map(|g| g.name)
        .collect();
    assert_eq!(listed, ["bruna", "Carlos", "Alice"]);

    let found = h.guests.list_confirmed(Some("CARL")).await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id, ids[1]);
}

#[tokio::test]
async fn test_checkin_stats_count_the_active_edition() {
    let h = Harness::new();
    for n in 0..3 {
        let guest = h.guests.invite(guest_profile(n)).await.unwrap();
        if n > 0 {
            h.guests.confirm(GuestLookup::Id(guest.id)).await.unwrap();
        }
        if n > 1 {
            h.guests.check_in(guest.id, "staff1").await.unwrap();
        }
    }
    let stats = h.guests.checkin_stats().await.unwrap();
    assert_eq!((stats.invited, stats.confirmed, stats.checked_in), (3, 2, 1));
}

// ============================================================================
// Preselections
// ============================================================================

#[tokio::test]
async fn test_promotion_creates_an_invited_guest_and_notifies_twice() {
    let h = Harness::new();
    let preselection = h.guests.preselect(carla()).await.unwrap();
    assert_eq!(preselection.phone, "11988887777");

    let promotion = h.guests.promote(preselection.id, "Bruno").await.unwrap();
    assert_eq!(promotion.guest.status, GuestStatus::Invited);
    assert_eq!(promotion.guest.phone, "11988887777");
    assert!(promotion.guest.invite_url.contains("emailconf=11988887777&utm_source=Bruno"));
    assert_eq!(promotion.preselection.status, PreselectionStatus::Promoted);
    assert_eq!(
        h.notifier.kinds(),
        vec![WebhookKind::GuestAdded, WebhookKind::PreselectionPromoted]
    );

    let err = h.guests.promote(preselection.id, "Bruno").await.unwrap_err();
    assert!(matches!(err, LifecycleError::Conflict(ref msg) if msg.contains("already promoted")));
}

#[tokio::test]
async fn test_promotion_conflicts_with_an_existing_guest_phone() {
    let h = Harness::new();
    let mut existing = guest_profile(1);
    existing.phone = "11988887777".to_string();
    h.guests.invite(existing).await.unwrap();
    let preselection = h.guests.preselect(carla()).await.unwrap();
    h.notifier.clear();

    let err = h.guests.promote(preselection.id, "Bruno").await.unwrap_err();
    assert!(matches!(err, LifecycleError::Conflict(_)));

    let pending = h.guests.list_preselections().await.unwrap();
    assert_eq!(pending[0].status, PreselectionStatus::Pending);
    assert_eq!(h.store.all_guests().len(), 1);
    assert!(h.notifier.notifications().is_empty());
}

#[tokio::test]
async fn test_promotion_validates_referrer_and_existence() {
    let h = Harness::new();
    let preselection = h.guests.preselect(carla()).await.unwrap();
    assert!(matches!(
        h.guests.promote(preselection.id, "  ").await,
        Err(LifecycleError::Validation(_))
    ));
    assert!(matches!(
        h.guests
            .promote(guestlist_core::PreselectionId::new(), "Bruno")
            .await,
        Err(LifecycleError::NotFound { .. })
    ));
}

#[tokio::test]
async fn test_preselect_rejects_duplicate_phone_and_lists_pending_first() {
    let h = Harness::new();
    h.guests.preselect(preselection_profile(2)).await.unwrap();
    let first = h.guests.preselect(preselection_profile(1)).await.unwrap();
    let carla = h.guests.preselect(carla()).await.unwrap();

    let err = h.guests.preselect(preselection_profile(1)).await.unwrap_err();
    assert!(matches!(err, LifecycleError::Conflict(_)));

    h.guests.promote(first.id, "Bruno").await.unwrap();
    let listed: Vec<String> = h
        .guests
        .list_preselections()
        .await
        .unwrap()
        .into_iter()
        .map(|p| p.name)
        .collect();
    assert_eq!(listed, ["Candidate 002", carla.name.as_str(), "Candidate 001"]);
}

#[tokio::test]
async fn test_storage_failures_surface_as_storage_errors() {
    let h = Harness::new();
    h.store.set_unavailable(true);
    let err = h.guests.invite(ana()).await.unwrap_err();
    assert!(matches!(err, LifecycleError::Storage(_)));
    assert!(h.notifier.notifications().is_empty());
}
