//! Integration tests for `SqliteStore`, driven through the `Herd` service
//! against an in-memory database.

use chrono::{NaiveDate, Utc};
use herd_core::{
  Context, Error as CoreError, Herd,
  animal::{AnimalCorrection, Category, NewAnimal, ServiceLink, ServiceMode, Sex, Status},
  bulk::{BulkAction, BulkRequest},
  engine::{Action, RecordRequest},
  event::{Event, EventAmendment, EventKind, PregnancyOutcome},
  herd::AnimalView,
  lot::{CropState, LaborActivity, NewLabor, NewLot},
  store::{AnimalQuery, Changeset, EventQuery, HerdStore},
};
use uuid::Uuid;

use crate::SqliteStore;

async fn herd() -> (Herd<SqliteStore>, Context) {
  let store = SqliteStore::open_in_memory()
    .await
    .expect("in-memory store");
  let herd = Herd::new(store);
  let est = herd.create_establishment("La Esperanza").await.unwrap();
  (herd, Context::new(est.establishment_id).with_actor("tester"))
}

fn day(n: u32) -> NaiveDate { NaiveDate::from_ymd_opt(2024, 3, n).unwrap() }

fn intake(tag: &str, category: Category, sex: Option<Sex>) -> NewAnimal {
  NewAnimal {
    tag: tag.to_owned(),
    category,
    sex,
    birth_date: None,
    intake_date: Some(day(1)),
    lot_id: None,
    detail: String::new(),
  }
}

async fn event_count(herd: &Herd<SqliteStore>, ctx: &Context) -> usize {
  herd
    .store()
    .list_events(EventQuery::establishment(ctx.establishment_id))
    .await
    .unwrap()
    .len()
}

async fn stored_event(herd: &Herd<SqliteStore>, ctx: &Context, animal: Uuid, id: Uuid) -> Event {
  herd
    .animal_history(ctx, animal)
    .await
    .unwrap()
    .into_iter()
    .find(|e| e.event_id == id)
    .unwrap()
}

// ─── Establishments ──────────────────────────────────────────────────────────

#[tokio::test]
async fn establishment_lifecycle() {
  let (herd, ctx) = herd().await;

  let renamed = herd
    .rename_establishment(ctx.establishment_id, "  El Ombú ")
    .await
    .unwrap();
  assert_eq!(renamed.name, "El Ombú");
  assert_eq!(herd.list_establishments().await.unwrap().len(), 1);

  herd.create_lot(&ctx, NewLot { name: "North".into(), area_ha: 4.0 }).await.unwrap();
  let err = herd
    .delete_establishment(ctx.establishment_id, false)
    .await
    .unwrap_err();
  assert!(matches!(err, CoreError::ConfirmationRequired(_)));
  let err = herd
    .delete_establishment(ctx.establishment_id, true)
    .await
    .unwrap_err();
  assert!(matches!(err, CoreError::EstablishmentNotEmpty(_)));

  let empty = herd.create_establishment("Empty").await.unwrap();
  herd.delete_establishment(empty.establishment_id, true).await.unwrap();
  assert!(matches!(
    herd.establishment(empty.establishment_id).await.unwrap_err(),
    CoreError::EstablishmentNotFound(_)
  ));
}

#[tokio::test]
async fn blank_establishment_name_is_rejected() {
  let (herd, _) = herd().await;
  let err = herd.create_establishment("   ").await.unwrap_err();
  assert!(matches!(err, CoreError::InvalidValue { field: "name", .. }));
}

// ─── Intake and listings ─────────────────────────────────────────────────────

#[tokio::test]
async fn intake_persists_animal_and_opening_event() {
  let (herd, ctx) = herd().await;
  let cow = herd
    .register_animal(&ctx, intake("V-1", Category::Cow, None))
    .await
    .unwrap();

  let stored = herd.animal(&ctx, cow.animal_id).await.unwrap();
  assert_eq!(stored.tag, cow.tag);
  assert_eq!(stored.sex, Sex::Female);
  assert_eq!(stored.status, Status::Active);
  assert_eq!(stored.intake_date, Some(day(1)));

  let history = herd.animal_history(&ctx, cow.animal_id).await.unwrap();
  assert_eq!(history.len(), 1);
  assert_eq!(history[0].kind, EventKind::Intake);
  assert_eq!(history[0].recorded_by.as_deref(), Some("tester"));
}

#[tokio::test]
async fn duplicate_tag_leaves_no_trace() {
  let (herd, ctx) = herd().await;
  herd
    .register_animal(&ctx, intake("A-7", Category::Heifer, None))
    .await
    .unwrap();
  let before = event_count(&herd, &ctx).await;

  let err = herd
    .register_animal(&ctx, intake("a-7", Category::Cow, None))
    .await
    .unwrap_err();
  assert!(matches!(err, CoreError::DuplicateTag(_)));
  assert_eq!(event_count(&herd, &ctx).await, before);
  assert_eq!(herd.list_animals(&ctx, AnimalView::All).await.unwrap().len(), 1);
}

#[tokio::test]
async fn listings_sort_numerically_and_split_exits() {
  let (herd, ctx) = herd().await;
  for tag in ["T-10", "T-2", "T-1"] {
    herd
      .register_animal(&ctx, intake(tag, Category::Cow, None))
      .await
      .unwrap();
  }
  let tags: Vec<_> = herd
    .list_animals(&ctx, AnimalView::Herd)
    .await
    .unwrap()
    .into_iter()
    .map(|a| a.tag)
    .collect();
  assert_eq!(tags, ["T-1", "T-2", "T-10"]);

  let sold = herd.list_animals(&ctx, AnimalView::Herd).await.unwrap()[0].clone();
  herd
    .record(
      &ctx,
      RecordRequest::new(sold.animal_id, day(5), Action::Sale {
        price:       Some(900.0),
        destination: None,
      })
      .confirmed(),
    )
    .await
    .unwrap();

  assert_eq!(herd.list_animals(&ctx, AnimalView::Herd).await.unwrap().len(), 2);
  let exits = herd.list_animals(&ctx, AnimalView::Exits).await.unwrap();
  assert_eq!(exits.len(), 1);
  assert_eq!(exits[0].disposition.as_deref(), Some("$900.00"));
}

#[tokio::test]
async fn deleted_animals_free_their_tag_but_stay_auditable() {
  let (herd, ctx) = herd().await;
  let first = herd
    .register_animal(&ctx, intake("X-1", Category::Bull, None))
    .await
    .unwrap();
  herd
    .record(&ctx, RecordRequest::new(first.animal_id, day(2), Action::Deletion).confirmed())
    .await
    .unwrap();

  assert!(herd.list_animals(&ctx, AnimalView::All).await.unwrap().is_empty());
  assert_eq!(
    herd.animal(&ctx, first.animal_id).await.unwrap().status,
    Status::Deleted
  );

  herd
    .register_animal(&ctx, intake("x-1", Category::Bull, None))
    .await
    .unwrap();
  let err = herd
    .record(&ctx, RecordRequest::new(first.animal_id, day(3), Action::Restore).confirmed())
    .await
    .unwrap_err();
  assert!(matches!(err, CoreError::DuplicateTag(_)));
}

#[tokio::test]
async fn correction_rechecks_tag_uniqueness() {
  let (herd, ctx) = herd().await;
  let a = herd.register_animal(&ctx, intake("A", Category::Cow, None)).await.unwrap();
  herd.register_animal(&ctx, intake("B", Category::Cow, None)).await.unwrap();

  let err = herd
    .correct_animal(&ctx, a.animal_id, AnimalCorrection {
      tag: Some("b".into()),
      ..Default::default()
    })
    .await
    .unwrap_err();
  assert!(matches!(err, CoreError::DuplicateTag(_)));

  let fixed = herd
    .correct_animal(&ctx, a.animal_id, AnimalCorrection {
      birth_date: Some(day(1)),
      ..Default::default()
    })
    .await
    .unwrap();
  assert_eq!(fixed.birth_date, Some(day(1)));
  assert_eq!(herd.animal(&ctx, a.animal_id).await.unwrap().birth_date, Some(day(1)));
}

// ─── Lifecycle through the store ─────────────────────────────────────────────

#[tokio::test]
async fn birth_persists_calf_mother_and_lineage() {
  let (herd, ctx) = herd().await;
  let lot = herd.create_lot(&ctx, NewLot { name: "Creek".into(), area_ha: 20.0 }).await.unwrap();
  let bull = herd.register_animal(&ctx, intake("B-1", Category::Bull, None)).await.unwrap();
  let heifer = herd
    .register_animal(&ctx, NewAnimal {
      lot_id: Some(lot.lot_id),
      ..intake("H-1", Category::Heifer, None)
    })
    .await
    .unwrap();

  herd
    .record(
      &ctx,
      RecordRequest::new(heifer.animal_id, day(2), Action::Service {
        mode:  Some(ServiceMode::Natural),
        sires: vec![bull.animal_id],
      }),
    )
    .await
    .unwrap();
  assert_eq!(herd.animal(&ctx, bull.animal_id).await.unwrap().status, Status::InService);

  let recorded = herd
    .record(
      &ctx,
      RecordRequest::new(heifer.animal_id, day(20), Action::Birth {
        calf_tag:     "C-1".into(),
        calf_sex:     Some(Sex::Male),
        birth_weight: Some("35".into()),
      }),
    )
    .await
    .unwrap();
  assert_eq!(recorded.animals.len(), 2);
  assert_eq!(recorded.follow_ups.len(), 1);

  let mother = herd.animal(&ctx, heifer.animal_id).await.unwrap();
  assert_eq!(mother.category, Category::Cow);
  assert_eq!(mother.status, Status::Open);
  assert!(mother.service_link.is_none());

  let lineage = herd.lineage(&ctx, heifer.animal_id).await.unwrap();
  assert_eq!(lineage.children.len(), 1);
  let calf = herd.animal(&ctx, lineage.children[0].animal_id).await.unwrap();
  assert_eq!(calf.lot_id, Some(lot.lot_id));
  assert_eq!(calf.birth_date, Some(day(20)));
  assert_eq!(herd.lineage(&ctx, calf.animal_id).await.unwrap().parent_tag, "H-1");

  let perf = herd.performance(&ctx, calf.animal_id).await.unwrap();
  assert_eq!(perf.latest.map(|r| r.weight), Some(35.0));
  assert_eq!(herd.lot_occupancy(&ctx, lot.lot_id).await.unwrap().count, 2);
}

#[tokio::test]
async fn weigh_ins_report_daily_gain() {
  let (herd, ctx) = herd().await;
  let steer = herd
    .register_animal(&ctx, intake("S-1", Category::YoungBull, None))
    .await
    .unwrap();
  let weigh = |d: u32, w: &str| {
    RecordRequest::new(steer.animal_id, day(d), Action::WeighIn { weight: w.into() })
  };

  let first = herd.record(&ctx, weigh(1, "300")).await.unwrap();
  assert_eq!(first.daily_gain, None);
  let second = herd.record(&ctx, weigh(11, "320 kg")).await.unwrap();
  assert_eq!(second.daily_gain, Some(2.0));
  let same_day = herd.record(&ctx, weigh(11, "321")).await.unwrap();
  assert_eq!(same_day.daily_gain, None);

  let err = herd.record(&ctx, weigh(12, "")).await.unwrap_err();
  assert!(matches!(err, CoreError::MissingField { field: "weight", .. }));
}

#[tokio::test]
async fn amended_weigh_in_result_rewrites_the_weight() {
  let (herd, ctx) = herd().await;
  let steer = herd
    .register_animal(&ctx, intake("S-1", Category::YoungBull, None))
    .await
    .unwrap();
  let weigh = |d: u32, w: &str| {
    RecordRequest::new(steer.animal_id, day(d), Action::WeighIn { weight: w.into() })
  };
  herd.record(&ctx, weigh(1, "300")).await.unwrap();
  let second = herd.record(&ctx, weigh(11, "320")).await.unwrap();
  let id = second.event.event_id;

  herd
    .amend_event(&ctx, id, EventAmendment {
      result: Some("340".into()),
      ..Default::default()
    })
    .await
    .unwrap();

  let perf = herd.performance(&ctx, steer.animal_id).await.unwrap();
  assert_eq!(perf.latest.map(|r| r.weight), Some(340.0));
  assert_eq!(perf.daily_gain, Some(4.0));
  let stored = stored_event(&herd, &ctx, steer.animal_id, id).await;
  assert_eq!(stored.result, "340");
  assert!(matches!(stored.kind, EventKind::WeighIn(ref v) if v.weight == 340.0));

  let err = herd
    .amend_event(&ctx, id, EventAmendment {
      result: Some("heavy".into()),
      ..Default::default()
    })
    .await
    .unwrap_err();
  assert!(matches!(err, CoreError::InvalidValue { field: "weight", .. }));
  let stored = stored_event(&herd, &ctx, steer.animal_id, id).await;
  assert_eq!(stored.result, "340");
}

#[tokio::test]
async fn set_aside_unlinks_persisted_females() {
  let (herd, ctx) = herd().await;
  let b1 = herd.register_animal(&ctx, intake("B-1", Category::Bull, None)).await.unwrap();
  let b2 = herd.register_animal(&ctx, intake("B-2", Category::Bull, None)).await.unwrap();
  let f1 = herd.register_animal(&ctx, intake("F-1", Category::Cow, None)).await.unwrap();
  let f2 = herd.register_animal(&ctx, intake("F-2", Category::Cow, None)).await.unwrap();

  let service = |female: Uuid, sires: Vec<Uuid>| {
    RecordRequest::new(female, day(3), Action::Service {
      mode: Some(ServiceMode::Natural),
      sires,
    })
  };
  herd.record(&ctx, service(f1.animal_id, vec![b1.animal_id])).await.unwrap();
  herd
    .record(&ctx, service(f2.animal_id, vec![b1.animal_id, b2.animal_id]))
    .await
    .unwrap();

  herd
    .record(&ctx, RecordRequest::new(b1.animal_id, day(4), Action::SetAside))
    .await
    .unwrap();

  assert_eq!(herd.animal(&ctx, b1.animal_id).await.unwrap().status, Status::SetAside);
  assert!(herd.animal(&ctx, f1.animal_id).await.unwrap().service_link.is_none());
  assert_eq!(
    herd.animal(&ctx, f2.animal_id).await.unwrap().service_link,
    Some(ServiceLink::Natural { sires: vec![b2.animal_id] })
  );

  let summary = herd.summary(&ctx).await.unwrap();
  assert_eq!(summary.sires_set_aside, 1);
  assert_eq!(summary.sires_in_service, 1);
}

#[tokio::test]
async fn restore_clears_disposition() {
  let (herd, ctx) = herd().await;
  let cow = herd.register_animal(&ctx, intake("V-1", Category::Cow, None)).await.unwrap();

  let err = herd
    .record(
      &ctx,
      RecordRequest::new(cow.animal_id, day(2), Action::Death { cause: "bloat".into() }),
    )
    .await
    .unwrap_err();
  assert!(matches!(err, CoreError::ConfirmationRequired(_)));

  herd
    .record(
      &ctx,
      RecordRequest::new(cow.animal_id, day(2), Action::Death { cause: "bloat".into() })
        .confirmed(),
    )
    .await
    .unwrap();
  assert_eq!(
    herd.animal(&ctx, cow.animal_id).await.unwrap().disposition.as_deref(),
    Some("bloat")
  );

  herd
    .record(&ctx, RecordRequest::new(cow.animal_id, day(3), Action::Restore).confirmed())
    .await
    .unwrap();
  let restored = herd.animal(&ctx, cow.animal_id).await.unwrap();
  assert_eq!(restored.status, Status::Active);
  assert!(restored.disposition.is_none());
  assert!(
    herd
      .available_actions(&ctx, cow.animal_id)
      .await
      .unwrap()
      .contains(&herd_core::engine::ActionKind::PregnancyCheck)
  );
}

// ─── Bulk ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn bulk_castration_writes_one_event_per_male() {
  let (herd, ctx) = herd().await;
  let mut ids = Vec::new();
  for (tag, sex) in [("C-1", Sex::Male), ("C-2", Sex::Female), ("C-3", Sex::Male)] {
    let calf = herd
      .register_animal(&ctx, intake(tag, Category::Calf, Some(sex)))
      .await
      .unwrap();
    ids.push(calf.animal_id);
  }
  let before = event_count(&herd, &ctx).await;

  let mut request = BulkRequest {
    animal_ids:        ids.clone(),
    occurred_on:       day(5),
    action:            BulkAction::Castration,
    detail:            String::new(),
    cost:              Some(12.0),
    confirmed:         true,
    accept_exclusions: false,
  };
  let preview = herd.bulk_preview(&ctx, &request).await.unwrap();
  assert_eq!(preview.eligible.len(), 2);
  assert_eq!(preview.excluded.len(), 1);

  let err = herd.bulk(&ctx, request.clone()).await.unwrap_err();
  assert!(matches!(err, CoreError::PartialEligibility { eligible: 2, excluded: 1 }));
  assert_eq!(event_count(&herd, &ctx).await, before);

  request.accept_exclusions = true;
  let outcome = herd.bulk(&ctx, request).await.unwrap();
  assert_eq!(outcome.results.len(), 2);
  assert_eq!(event_count(&herd, &ctx).await, before + 2);
  assert!(herd.animal(&ctx, ids[0]).await.unwrap().castrated);
  assert!(!herd.animal(&ctx, ids[1]).await.unwrap().castrated);
}

#[tokio::test]
async fn bulk_move_relocates_selection() {
  let (herd, ctx) = herd().await;
  let lot = herd.create_lot(&ctx, NewLot { name: "Hill".into(), area_ha: 8.5 }).await.unwrap();
  let a = herd.register_animal(&ctx, intake("A", Category::Cow, None)).await.unwrap();
  let b = herd.register_animal(&ctx, intake("B", Category::Heifer, None)).await.unwrap();

  herd
    .bulk(&ctx, BulkRequest {
      animal_ids:        vec![a.animal_id, b.animal_id],
      occurred_on:       day(6),
      action:            BulkAction::Move { lot_id: Some(lot.lot_id) },
      detail:            String::new(),
      cost:              None,
      confirmed:         true,
      accept_exclusions: false,
    })
    .await
    .unwrap();

  let occupancy = herd.occupancy(&ctx).await.unwrap();
  assert_eq!(occupancy.lots[0].count, 2);
  assert_eq!(occupancy.unassigned, 0);
}

// ─── Ledger correction ───────────────────────────────────────────────────────

#[tokio::test]
async fn amending_an_event_does_not_replay_state() {
  let (herd, ctx) = herd().await;
  let cow = herd.register_animal(&ctx, intake("V-1", Category::Cow, None)).await.unwrap();
  let check = herd
    .record(
      &ctx,
      RecordRequest::new(cow.animal_id, day(4), Action::PregnancyCheck {
        outcome: Some(PregnancyOutcome::Pregnant),
      }),
    )
    .await
    .unwrap();

  let amended = herd
    .amend_event(&ctx, check.event.event_id, EventAmendment {
      occurred_on: Some(day(5)),
      result:      Some("open".into()),
      detail:      Some("rechecked".into()),
    })
    .await
    .unwrap();
  assert_eq!(amended.occurred_on, day(5));
  assert_eq!(
    herd.animal(&ctx, cow.animal_id).await.unwrap().status,
    Status::Pregnant
  );

  let err = herd.delete_event(&ctx, amended.event_id, false).await.unwrap_err();
  assert!(matches!(err, CoreError::ConfirmationRequired(_)));
  herd.delete_event(&ctx, amended.event_id, true).await.unwrap();
  assert_eq!(herd.animal_history(&ctx, cow.animal_id).await.unwrap().len(), 1);
  assert_eq!(
    herd.animal(&ctx, cow.animal_id).await.unwrap().status,
    Status::Pregnant
  );
}

#[tokio::test]
async fn recent_events_filter_and_limit() {
  let (herd, ctx) = herd().await;
  let cow = herd.register_animal(&ctx, intake("V-1", Category::Cow, None)).await.unwrap();
  for d in 2..6 {
    herd
      .record(&ctx, RecordRequest::new(cow.animal_id, day(d), Action::Illness))
      .await
      .unwrap();
  }

  let feed = herd.recent_events(&ctx, vec![], Some(3)).await.unwrap();
  assert_eq!(feed.len(), 3);
  assert_eq!(feed[0].occurred_on, day(5));

  let intakes = herd
    .recent_events(&ctx, vec!["intake".into()], None)
    .await
    .unwrap();
  assert_eq!(intakes.len(), 1);

  let err = herd
    .recent_events(&ctx, vec!["shearing".into()], None)
    .await
    .unwrap_err();
  assert!(matches!(err, CoreError::UnknownEventType(_)));
}

// ─── Atomicity ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn failed_commit_applies_nothing() {
  let (herd, ctx) = herd().await;
  let cow = herd.register_animal(&ctx, intake("V-1", Category::Cow, None)).await.unwrap();
  let before = event_count(&herd, &ctx).await;

  let mut changed = cow.clone();
  changed.status = Status::Pregnant;
  let orphan = Event {
    event_id:         Uuid::new_v4(),
    establishment_id: ctx.establishment_id,
    animal_id:        Uuid::new_v4(),
    occurred_on:      day(9),
    recorded_at:      Utc::now(),
    kind:             EventKind::Illness,
    result:           String::new(),
    detail:           String::new(),
    cost:             None,
    recorded_by:      None,
  };
  let result = herd
    .store()
    .commit(Changeset {
      inserted: vec![],
      updated:  vec![changed],
      events:   vec![orphan],
    })
    .await;
  assert!(result.is_err());

  assert_eq!(herd.animal(&ctx, cow.animal_id).await.unwrap().status, Status::Active);
  assert_eq!(event_count(&herd, &ctx).await, before);
}

// ─── Lots and labor ──────────────────────────────────────────────────────────

#[tokio::test]
async fn labor_drives_crop_state() {
  let (herd, ctx) = herd().await;
  let lot = herd.create_lot(&ctx, NewLot { name: "South".into(), area_ha: 30.0 }).await.unwrap();
  let labor = |activity, crop: Option<&str>| NewLabor {
    activity,
    crop: crop.map(str::to_owned),
    detail: String::new(),
    cost: Some(100.0),
    performed_on: Some(day(1)),
  };

  let (_, planted) = herd
    .record_labor(&ctx, lot.lot_id, labor(LaborActivity::Planting, Some("oats")))
    .await
    .unwrap();
  assert_eq!(planted.state, CropState::Planted);

  herd
    .record_labor(&ctx, lot.lot_id, labor(LaborActivity::Desiccation, None))
    .await
    .unwrap();
  let (_, harvested) = herd
    .record_labor(&ctx, lot.lot_id, labor(LaborActivity::Harvest, None))
    .await
    .unwrap();
  assert_eq!(harvested.state, CropState::Fallow);
  assert!(harvested.crop.is_none());
  let stored = herd.lot(&ctx, lot.lot_id).await.unwrap();
  assert_eq!(stored.state, CropState::Fallow);
  assert!(stored.crop.is_none());
  assert_eq!(herd.labors(&ctx, lot.lot_id).await.unwrap().len(), 3);

  let err = herd
    .record_labor(&ctx, lot.lot_id, labor(LaborActivity::Planting, None))
    .await
    .unwrap_err();
  assert!(matches!(err, CoreError::InvalidValue { field: "crop", .. }));
}

#[tokio::test]
async fn deleting_a_lot_unassigns_its_animals() {
  let (herd, ctx) = herd().await;
  let lot = herd.create_lot(&ctx, NewLot { name: "East".into(), area_ha: 2.0 }).await.unwrap();
  let cow = herd
    .register_animal(&ctx, NewAnimal {
      lot_id: Some(lot.lot_id),
      ..intake("V-1", Category::Cow, None)
    })
    .await
    .unwrap();
  let (labor, _) = herd
    .record_labor(&ctx, lot.lot_id, NewLabor {
      activity:     LaborActivity::Fertilizing,
      crop:         None,
      detail:       "urea".into(),
      cost:         None,
      performed_on: None,
    })
    .await
    .unwrap();

  let err = herd.delete_labor(&ctx, labor.labor_id, false).await.unwrap_err();
  assert!(matches!(err, CoreError::ConfirmationRequired(_)));

  herd.delete_lot(&ctx, lot.lot_id, true).await.unwrap();
  assert!(herd.animal(&ctx, cow.animal_id).await.unwrap().lot_id.is_none());
  assert!(herd.store().get_labor(labor.labor_id).await.unwrap().is_none());
  assert!(herd.lots(&ctx).await.unwrap().is_empty());
}

#[tokio::test]
async fn negative_area_is_rejected() {
  let (herd, ctx) = herd().await;
  let err = herd
    .create_lot(&ctx, NewLot { name: "Bad".into(), area_ha: -1.0 })
    .await
    .unwrap_err();
  assert!(matches!(err, CoreError::InvalidValue { field: "area_ha", .. }));
}

// ─── Scoping ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn records_of_other_establishments_are_rejected() {
  let (herd, ctx) = herd().await;
  let cow = herd.register_animal(&ctx, intake("V-1", Category::Cow, None)).await.unwrap();

  let other = herd.create_establishment("Neighbour").await.unwrap();
  let other_ctx = Context::new(other.establishment_id);

  let err = herd.animal(&other_ctx, cow.animal_id).await.unwrap_err();
  assert!(matches!(err, CoreError::WrongEstablishment { .. }));

  let err = herd
    .record(&other_ctx, RecordRequest::new(cow.animal_id, day(2), Action::Illness))
    .await
    .unwrap_err();
  assert!(matches!(err, CoreError::AnimalNotFound(_)));

  let foreign = herd
    .store()
    .list_animals(AnimalQuery::establishment(other.establishment_id))
    .await
    .unwrap();
  assert!(foreign.is_empty());
}
