//! End-to-end timing scenarios on a simulated clock

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use kinetic_core::{Color, Point, PropertyMap, Rect, Size, Value, ValueKind};

use crate::{
    Animation, AnimationError, AnimationEvent, AnimationGroup, AnimationScheduler,
    AnimationState, Clock, Direction, GroupEvent, ManualClock,
};

type Timeline<E> = Rc<RefCell<Vec<(u64, E)>>>;

struct Rig {
    clock: ManualClock,
    scheduler: AnimationScheduler,
    target: Rc<RefCell<PropertyMap>>,
}

impl Rig {
    fn new() -> Self {
        let clock = ManualClock::new();
        let scheduler = AnimationScheduler::with_clock(clock.clone());
        let target = PropertyMap::new()
            .with_property("x", 0)
            .with_property("y", 0)
            .with_property("z", 0)
            .with_property("opacity", 0.0)
            .with_property("origin", Point::ZERO)
            .with_property("size", Size::ZERO)
            .with_property("bounds", Rect::ZERO)
            .with_property("tint", Color::BLACK)
            .into_shared();
        Self {
            clock,
            scheduler,
            target,
        }
    }

    fn animation(
        &self,
        property: &str,
        start: impl Into<Value>,
        end: impl Into<Value>,
        duration: u32,
    ) -> Animation {
        let anim = Animation::new(&self.scheduler.handle());
        anim.set_target(&self.target);
        anim.set_property_name(property);
        anim.set_start_value(start);
        anim.set_end_value(end);
        anim.set_duration(duration);
        anim
    }

    fn run_for(&self, ms: u64) {
        for _ in 0..ms {
            self.clock.advance_ms(1);
            self.scheduler.tick();
        }
    }

    fn run_until_idle(&self, limit_ms: u64) {
        for _ in 0..limit_ms {
            if !self.scheduler.has_active_timers() {
                return;
            }
            self.clock.advance_ms(1);
            self.scheduler.tick();
        }
    }

    fn now_ms(&self) -> u64 {
        self.clock.now().as_millis() as u64
    }

    fn get(&self, property: &str) -> Option<Value> {
        self.target.borrow().get(property)
    }
}

fn timeline(anim: &Animation, clock: &ManualClock) -> Timeline<AnimationEvent> {
    let events = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&events);
    let clock = clock.clone();
    anim.subscribe(move |event| {
        let at = clock.now().as_millis() as u64;
        sink.borrow_mut().push((at, event.clone()));
    });
    events
}

fn group_timeline(group: &AnimationGroup, clock: &ManualClock) -> Timeline<GroupEvent> {
    let events = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&events);
    let clock = clock.clone();
    group.subscribe(move |event| {
        let at = clock.now().as_millis() as u64;
        sink.borrow_mut().push((at, *event));
    });
    events
}

fn values(events: &Timeline<AnimationEvent>) -> Vec<Value> {
    events
        .borrow()
        .iter()
        .filter_map(|(_, event)| match event {
            AnimationEvent::ValueChanged(value) => Some(*value),
            _ => None,
        })
        .collect()
}

fn times_of<E: PartialEq>(events: &Timeline<E>, wanted: &E) -> Vec<u64> {
    events
        .borrow()
        .iter()
        .filter(|(_, event)| event == wanted)
        .map(|(at, _)| *at)
        .collect()
}

fn components(value: &Value) -> Vec<f64> {
    match value {
        Value::Int(v) => vec![f64::from(*v)],
        Value::Float(v) => vec![*v],
        Value::Point(p) => vec![f64::from(p.x), f64::from(p.y)],
        Value::Size(s) => vec![f64::from(s.width), f64::from(s.height)],
        Value::Rect(r) => vec![
            f64::from(r.x()),
            f64::from(r.y()),
            f64::from(r.width()),
            f64::from(r.height()),
        ],
        Value::Color(c) => vec![
            f64::from(c.r),
            f64::from(c.g),
            f64::from(c.b),
            f64::from(c.a),
        ],
    }
}

// ============================================================================
// Scenarios
// ============================================================================

#[test]
fn scenario_linear_int_run() {
    let rig = Rig::new();
    let anim = rig.animation("x", 0, 100, 1000);
    let events = timeline(&anim, &rig.clock);

    anim.start(false).unwrap();
    assert_eq!(anim.state(), AnimationState::Running);

    rig.run_for(500);
    let halfway = rig.get("x").and_then(|v| v.as_int()).unwrap_or_default();
    assert!((halfway - 50).abs() <= 1, "halfway value {halfway}");

    rig.run_for(500);
    assert_eq!(rig.get("x"), Some(Value::Int(100)));
    rig.run_for(200);
    assert_eq!(times_of(&events, &AnimationEvent::Finished), vec![1000]);
    assert_eq!(anim.state(), AnimationState::Stopped);
    assert!(!rig.scheduler.has_active_timers());
}

#[test]
fn scenario_mismatched_kinds_do_not_start() {
    let rig = Rig::new();
    let anim = rig.animation("x", 0, Color::RED, 1000);
    let events = timeline(&anim, &rig.clock);

    assert_eq!(
        anim.start(false),
        Err(AnimationError::KindMismatch {
            start: ValueKind::Int,
            end: ValueKind::Color,
        })
    );
    assert_eq!(anim.state(), AnimationState::Stopped);
    assert_eq!(rig.scheduler.timer_count(), 0);

    rig.run_for(100);
    assert!(events.borrow().is_empty());
    assert_eq!(rig.get("x"), Some(Value::Int(0)));
}

#[test]
fn scenario_slowest_member_gates_stage() {
    let rig = Rig::new();
    let group = AnimationGroup::new();
    let fast = rig.animation("x", 0, 100, 200);
    let slow = rig.animation("y", 0, 100, 400);
    let next = rig.animation("z", 0, 100, 100);
    group.add_animation(0, fast.clone());
    group.add_animation(0, slow.clone());
    group.add_animation(1, next.clone());
    let events = group_timeline(&group, &rig.clock);

    group.start();
    rig.run_for(300);
    assert_eq!(fast.state(), AnimationState::Stopped);
    assert!(slow.is_running());
    assert_eq!(next.state(), AnimationState::Stopped);
    assert_eq!(group.pending_in_stage(), 1);

    rig.run_until_idle(1000);
    let stage_done = times_of(&events, &GroupEvent::StageFinished(0));
    assert_eq!(stage_done.len(), 1);
    assert!(stage_done[0] >= 400);
    assert_eq!(times_of(&events, &GroupEvent::StageStarted(1)), vec![stage_done[0]]);
    assert_eq!(times_of(&events, &GroupEvent::Finished), vec![500]);
}

#[test]
fn scenario_equal_endpoints_finish_on_first_tick() {
    let rig = Rig::new();
    let anim = rig.animation("x", 5, 5, 1000);
    let events = timeline(&anim, &rig.clock);

    anim.start(false).unwrap();
    assert_eq!(anim.tick_interval_ms(), Some(16));

    rig.run_for(15);
    assert_eq!(rig.get("x"), Some(Value::Int(0)));

    rig.run_for(1);
    assert_eq!(rig.get("x"), Some(Value::Int(5)));
    assert_eq!(values(&events), vec![Value::Int(5)]);
    assert_eq!(times_of(&events, &AnimationEvent::Finished), vec![16]);
    assert_eq!(anim.state(), AnimationState::Stopped);
}

// ============================================================================
// Properties
// ============================================================================

#[test]
fn forward_values_are_monotonic_and_end_exactly() {
    let cases: Vec<(&str, Value, Value)> = vec![
        ("x", Value::Int(-40), Value::Int(260)),
        ("opacity", Value::Float(0.05), Value::Float(0.95)),
        ("origin", Point::new(-10.0, 3.0).into(), Point::new(90.0, 7.5).into()),
        ("size", Size::new(10.0, 20.0).into(), Size::new(300.0, 21.0).into()),
        (
            "bounds",
            Rect::new(0.0, 0.0, 10.0, 10.0).into(),
            Rect::new(33.0, 1.0, 400.0, 17.0).into(),
        ),
        (
            "tint",
            Color::rgba(0.0, 0.2, 0.4, 0.5).into(),
            Color::rgba(1.0, 0.8, 0.9, 1.0).into(),
        ),
    ];

    for (property, start, end) in cases {
        let rig = Rig::new();
        let anim = rig.animation(property, start, end, 777);
        let events = timeline(&anim, &rig.clock);

        anim.start(false).unwrap();
        rig.run_until_idle(2000);

        let written = values(&events);
        assert!(written.len() > 2, "{property}: too few updates");
        for pair in written.windows(2) {
            let (before, after) = (components(&pair[0]), components(&pair[1]));
            for (b, a) in before.iter().zip(&after) {
                assert!(a + 1e-6 >= *b, "{property}: {:?} -> {:?}", pair[0], pair[1]);
            }
        }
        assert_eq!(written.last(), Some(&end), "{property}");
        assert_eq!(rig.get(property), Some(end), "{property}");
    }
}

#[test]
fn backward_run_ends_exactly_on_start() {
    let rig = Rig::new();
    let anim = rig.animation("opacity", 0.1, 0.9, 333);
    anim.set_direction(Direction::Backward);
    let events = timeline(&anim, &rig.clock);

    anim.start(false).unwrap();
    rig.run_until_idle(1000);

    let written = values(&events);
    assert!(written.len() > 2);
    assert_eq!(written.last(), Some(&Value::Float(0.1)));
    assert_eq!(rig.get("opacity"), Some(Value::Float(0.1)));
}

#[test]
fn reversal_mid_flight_does_not_jump() {
    let rig = Rig::new();
    let anim = rig.animation("x", 0, 100, 1000);
    let events = timeline(&anim, &rig.clock);

    anim.start(false).unwrap();
    rig.run_for(400);
    assert_eq!(rig.get("x"), Some(Value::Int(40)));

    anim.set_direction(Direction::Backward);
    rig.run_for(10);
    assert_eq!(rig.get("x"), Some(Value::Int(39)));

    rig.run_until_idle(2000);
    assert_eq!(rig.get("x"), Some(Value::Int(0)));
    assert_eq!(times_of(&events, &AnimationEvent::Finished), vec![800]);

    let written: Vec<i32> = values(&events).iter().filter_map(Value::as_int).collect();
    for pair in written.windows(2) {
        assert!((pair[1] - pair[0]).abs() <= 1, "jump {} -> {}", pair[0], pair[1]);
    }
}

#[test]
fn paused_time_does_not_count() {
    let baseline = {
        let rig = Rig::new();
        let anim = rig.animation("x", 0, 100, 1000);
        let events = timeline(&anim, &rig.clock);
        anim.start(false).unwrap();
        rig.run_until_idle(3000);
        times_of(&events, &AnimationEvent::Finished)
    };
    assert_eq!(baseline, vec![1000]);

    let rig = Rig::new();
    let anim = rig.animation("x", 0, 100, 1000);
    let events = timeline(&anim, &rig.clock);

    anim.start(false).unwrap();
    rig.run_for(300);
    anim.pause();
    rig.run_for(200);
    assert_eq!(rig.get("x"), Some(Value::Int(30)));
    assert_eq!(rig.scheduler.timer_count(), 0);

    anim.resume();
    rig.run_until_idle(3000);
    assert_eq!(times_of(&events, &AnimationEvent::Finished), vec![baseline[0] + 200]);
    assert_eq!(rig.now_ms(), 1200);
}

#[test]
fn group_waits_for_every_member() {
    let rig = Rig::new();
    let group = AnimationGroup::new();
    let a = rig.animation("x", 0, 100, 100);
    let b = rig.animation("y", 0, 100, 300);
    let c = rig.animation("z", 0, 100, 100);
    group.add_animation(0, a.clone());
    group.add_animation(0, b.clone());
    group.add_animation(1, c.clone());

    let a_events = timeline(&a, &rig.clock);
    let b_events = timeline(&b, &rig.clock);
    let c_events = timeline(&c, &rig.clock);

    group.start();
    rig.run_for(200);
    assert_eq!(c.state(), AnimationState::Stopped);

    rig.run_until_idle(1000);
    let a_done = times_of(&a_events, &AnimationEvent::Finished);
    let b_done = times_of(&b_events, &AnimationEvent::Finished);
    let c_started = times_of(&c_events, &AnimationEvent::Started);
    assert_eq!(a_done, vec![100]);
    assert_eq!(b_done, vec![300]);
    assert_eq!(c_started.len(), 1);
    assert!(c_started[0] >= a_done[0].max(b_done[0]));
    assert_eq!(times_of(&c_events, &AnimationEvent::Finished), vec![400]);
}

#[test]
fn group_reversal_mid_flight_replays_earlier_stage() {
    let rig = Rig::new();
    let group = AnimationGroup::new();
    let first = rig.animation("x", 0, 100, 100);
    let second = rig.animation("y", 0, 100, 100);
    let third = rig.animation("z", 0, 100, 100);
    group.add_animation(0, first.clone());
    group.add_animation(1, second.clone());
    group.add_animation(2, third.clone());
    let events = group_timeline(&group, &rig.clock);

    group.start();
    rig.run_for(150);
    assert_eq!(group.current_stage(), Some(1));
    assert_eq!(rig.get("y"), Some(Value::Int(50)));

    group.set_group_direction(Direction::Backward);
    assert_eq!(group.execution_order(), vec![2, 1, 0]);
    assert_eq!(group.current_stage(), Some(1));
    assert!(second.is_running());
    assert_eq!(third.direction(), Direction::Backward);

    rig.run_for(1);
    assert_eq!(rig.get("y"), Some(Value::Int(49)));

    rig.run_until_idle(1000);
    let started: Vec<GroupEvent> = events
        .borrow()
        .iter()
        .map(|(_, event)| *event)
        .filter(|event| matches!(event, GroupEvent::StageStarted(_)))
        .collect();
    assert_eq!(
        started,
        vec![
            GroupEvent::StageStarted(0),
            GroupEvent::StageStarted(1),
            GroupEvent::StageStarted(0),
        ]
    );
    assert_eq!(times_of(&events, &GroupEvent::StageFinished(1)), vec![200]);
    assert_eq!(times_of(&events, &GroupEvent::Finished), vec![300]);
    assert_eq!(rig.get("x"), Some(Value::Int(0)));
    assert_eq!(rig.get("y"), Some(Value::Int(0)));
    assert_eq!(rig.get("z"), Some(Value::Int(0)));
    assert_eq!(third.current_value(), None);
}

#[test]
fn reversed_group_plays_stages_descending() {
    let rig = Rig::new();
    let group = AnimationGroup::new();
    group.add_animation(0, rig.animation("x", 0, 100, 100));
    group.add_animation(1, rig.animation("y", 0, 100, 100));
    group.set_group_direction(Direction::Backward);
    let events = group_timeline(&group, &rig.clock);

    group.start();
    assert_eq!(group.current_stage(), Some(1));
    rig.run_until_idle(1000);

    assert_eq!(times_of(&events, &GroupEvent::StageFinished(1)), vec![100]);
    assert_eq!(times_of(&events, &GroupEvent::StageFinished(0)), vec![200]);
    assert_eq!(rig.get("x"), Some(Value::Int(0)));
}

#[test]
fn many_animations_share_one_scheduler() {
    let rig = Rig::new();
    let animations: Vec<Animation> = (0..3)
        .map(|i| rig.animation(["x", "y", "z"][i], 0, 10, 100 * (i as u32 + 1)))
        .collect();
    for anim in &animations {
        anim.start(false).unwrap();
    }
    assert_eq!(rig.scheduler.timer_count(), 3);

    rig.run_for(150);
    assert_eq!(rig.scheduler.timer_count(), 2);
    assert_eq!(rig.scheduler.next_deadline(), Some(Duration::from_millis(160)));

    rig.run_until_idle(1000);
    // 16ms ticks for the 300ms animation: 288 is short, 304 finishes
    assert_eq!(rig.now_ms(), 304);
    for property in ["x", "y", "z"] {
        assert_eq!(rig.get(property), Some(Value::Int(10)));
    }
}
