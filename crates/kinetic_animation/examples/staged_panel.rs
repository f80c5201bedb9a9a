//! Staged Panel Demo
//!
//! Animates a panel in three stages on the real-time scheduler:
//! - fade in and grow together
//! - slide into place
//! - tint to the accent color
//!
//! then plays the whole sequence backwards.
//!
//! Set `KINETIC_CONFIG` to a TOML file to override the engine tuning.
//!
//! Run with: RUST_LOG=debug cargo run -p kinetic_animation --example staged_panel

use std::cell::RefCell;
use std::rc::Rc;

use anyhow::Result;
use kinetic_animation::{
    Animation, AnimationGroup, AnimationScheduler, Color, Direction, EngineConfig, GroupEvent,
    PropertyMap, Rect, Size, SystemClock, Value,
};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let config = match std::env::var("KINETIC_CONFIG") {
        Ok(path) => EngineConfig::load(path)?,
        Err(_) => EngineConfig::standard(),
    };
    let scheduler = AnimationScheduler::with_config(config, SystemClock::new());

    let panel = PropertyMap::new()
        .with_property("opacity", 0.0)
        .with_property("size", Size::new(40.0, 40.0))
        .with_property("bounds", Rect::new(-200.0, 80.0, 240.0, 160.0))
        .with_property("tint", Color::from_hex(0x2E3440))
        .with_read_only("id", 7)
        .into_shared();

    let group = build_group(&scheduler, &panel);
    group.subscribe(|event| match event {
        GroupEvent::Started => tracing::info!("sequence started"),
        GroupEvent::StageStarted(key) => tracing::info!("stage {} started", key),
        GroupEvent::StageFinished(key) => tracing::info!("stage {} finished", key),
        GroupEvent::Finished => tracing::info!("sequence finished"),
    });

    group.start();
    scheduler.run_until_idle();
    report(&panel);

    group.set_group_direction(Direction::Backward);
    group.start();
    scheduler.run_until_idle();
    report(&panel);

    Ok(())
}

fn build_group(scheduler: &AnimationScheduler, panel: &Rc<RefCell<PropertyMap>>) -> AnimationGroup {
    let handle = scheduler.handle();
    let animate = |property: &str, start: Value, end: Value, duration: u32| {
        let anim = Animation::new(&handle);
        anim.set_target(panel);
        anim.set_property_name(property);
        anim.set_start_value(start);
        anim.set_end_value(end);
        anim.set_duration(duration);
        anim
    };

    let group = AnimationGroup::new();
    group.add_animation(0, animate("opacity", Value::Float(0.0), Value::Float(1.0), 300));
    group.add_animation(
        0,
        animate(
            "size",
            Size::new(40.0, 40.0).into(),
            Size::new(240.0, 160.0).into(),
            450,
        ),
    );
    group.add_animation(
        1,
        animate(
            "bounds",
            Rect::new(-200.0, 80.0, 240.0, 160.0).into(),
            Rect::new(64.0, 80.0, 240.0, 160.0).into(),
            400,
        ),
    );
    group.add_animation(
        2,
        animate(
            "tint",
            Color::from_hex(0x2E3440).into(),
            Color::from_hex(0x88C0D0).into(),
            250,
        ),
    );
    group
}

fn report(panel: &Rc<RefCell<PropertyMap>>) {
    let panel = panel.borrow();
    for property in ["opacity", "size", "bounds", "tint"] {
        tracing::info!(
            "{:>8} = {:?} ({} writes)",
            property,
            panel.get(property),
            panel.write_count(property)
        );
    }
}
