use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tale_engine as te;
use te::entity::behaviours::{
    ActionContext, BumpCounter, Consumable, Container, KeyedLock, Lockable, Openable, ReactsOnUse, Usable,
};
use te::entity::verbs;
use te::event::{ContainerOpened, QuestCompleted, QuestFailed};
use te::quest::{CriteriaBuilder, QuestInfo};
use te::*;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn sample_data() -> std::path::PathBuf {
    std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("data")
}

fn lever(symbol: &str) -> Entity {
    let mut lever = Entity::new(symbol, "iron lever");
    let id = lever.id();
    lever
        .add_behaviour::<dyn Usable>(Box::new(Consumable::new(id, Some(1))))
        .unwrap();
    lever
        .add_behaviour::<dyn ReactsOnUse>(Box::new(BumpCounter {
            counter: "levers_pulled".into(),
            amount: 1,
        }))
        .unwrap();
    lever
}

#[test]
fn sample_content_loads() {
    init_logging();
    let session = load_session(sample_data()).unwrap();
    assert_eq!(session.quests.len(), 2);
    assert_eq!(session.state.labels.try_get("weather"), Some("overcast"));
    assert_eq!(session.turn(), 0);
}

#[test]
fn actions_drive_quests_through_the_bus() {
    init_logging();
    let mut session = load_session(sample_data()).unwrap();
    let announced = Arc::new(Mutex::new(Vec::new()));
    let log = Arc::clone(&announced);
    let _done = session.bus.subscribe(move |e: &QuestCompleted| {
        log.lock().unwrap().push(e.quest.to_string());
        Ok(())
    });

    let opened = Arc::new(AtomicUsize::new(0));
    let opened_seen = Arc::clone(&opened);
    let _gate = session.bus.subscribe(move |_: &ContainerOpened| {
        opened_seen.fetch_add(1, Ordering::SeqCst);
        Ok(())
    });

    let player = EntityId::from_symbol("player");
    let mut left = lever("left_lever");
    let mut right = lever("right_lever");
    let mut gate = Entity::new("gate", "portcullis");
    let gate_id = gate.id();
    gate.add_behaviour::<dyn Openable>(Box::new(Container::new(gate_id, false)))
        .unwrap();

    {
        let mut ctx = ActionContext::new(player, &mut session.state, &session.bus);
        verbs::use_entity(&mut left, &mut ctx).unwrap();
    }
    assert!(session.advance(Duration::from_secs(10)).is_empty());

    {
        let mut ctx = ActionContext::new(player, &mut session.state, &session.bus);
        verbs::use_entity(&mut right, &mut ctx).unwrap();
        verbs::open(&mut gate, &mut ctx).unwrap();
        ctx.state.flags.set("gate_open", true);
        ctx.state.flags.set("lamp_lit", true);
    }
    let transitions = session.advance(Duration::from_secs(10));
    assert_eq!(transitions.len(), 2);
    assert!(transitions.iter().all(|t| t.status == QuestStatus::Completed));
    assert_eq!(opened.load(Ordering::SeqCst), 1);

    let mut names = announced.lock().unwrap().clone();
    names.sort();
    assert_eq!(names, vec!["light_the_lamp".to_string(), "open_the_gate".to_string()]);
}

#[test]
fn timed_failure_beats_late_completion() {
    let mut session = load_session(sample_data()).unwrap();
    let failed = Arc::new(AtomicUsize::new(0));
    let seen = Arc::clone(&failed);
    let _t = session.bus.subscribe(move |_: &QuestFailed| {
        seen.fetch_add(1, Ordering::SeqCst);
        Ok(())
    });

    session.advance(Duration::from_secs(119));
    session.state.counters.set("levers_pulled", 2);
    session.state.flags.set("gate_open", true);
    // completion and the 120s failure both hold on this tick
    session.advance(Duration::from_secs(1));

    let gate = session.quests.get(&"open_the_gate".into()).unwrap();
    assert_eq!(gate.status(), QuestStatus::Failed);
    assert_eq!(failed.load(Ordering::SeqCst), 1);
}

#[test]
fn prerequisites_gate_attachment() {
    let mut chest = Entity::new("chest", "chest");
    let id = chest.id();
    let key = EntityId::from_symbol("key");
    let err = chest
        .add_behaviour::<dyn Lockable>(Box::new(KeyedLock::new(id, key, true)))
        .unwrap_err();
    assert!(matches!(err, BehaviourError::MissingPrerequisite { .. }));

    chest
        .add_behaviour::<dyn Openable>(Box::new(Container::new(id, false)))
        .unwrap();
    chest
        .add_behaviour::<dyn Lockable>(Box::new(KeyedLock::new(id, key, true)))
        .unwrap();
    assert!(chest.has_behaviours::<dyn Lockable>());
}

#[test]
fn composite_token_retires_a_trigger_group() {
    let bus = EventBus::new();
    let group = CompositeToken::new();
    group.add(bus.subscribe(|_: &ContainerOpened| Ok(())));
    group.add(bus.subscribe(|_: &ContainerOpened| Ok(())));
    assert_eq!(bus.subscriber_count::<ContainerOpened>(), 2);

    group.dispose();
    assert_eq!(bus.subscriber_count::<ContainerOpened>(), 0);

    let late = bus.subscribe(|_: &ContainerOpened| Ok(()));
    let late_id = late.id();
    group.add(late);
    assert_eq!(bus.subscriber_count::<ContainerOpened>(), 0, "{late_id} should be disposed on add");
}

#[test]
fn time_only_criteria_on_a_live_quest() {
    let mut session = Session::new();
    let criteria = CriteriaBuilder::new()
        .if_time_has_passed(Duration::from_secs(5))
        .unwrap()
        .then_progress_this_quest()
        .unwrap();
    let quest = QuestFactory::new()
        .build(
            QuestInfo::new("wait", "Wait", ""),
            vec![criteria],
            Vec::new(),
            Box::new(|_: &QuestInfo| {}),
            None,
        )
        .unwrap();
    session.quests.add(quest).unwrap();

    session.advance(Duration::from_secs(3));
    assert_eq!(
        session.quests.get(&"wait".into()).map(Quest::status),
        Some(QuestStatus::InProgress)
    );
    session.advance(Duration::from_secs(2));
    assert_eq!(
        session.quests.get(&"wait".into()).map(Quest::status),
        Some(QuestStatus::Completed)
    );
}
