//! Staged animation groups
//!
//! An [`AnimationGroup`] runs batches of animations one after another. Every
//! animation added under the same stage key starts together; the group moves
//! on to the next key only once each of them has finished naturally.
//!
//! ```ignore
//! let group = AnimationGroup::new();
//! group.add_animation(0, fade_in);
//! group.add_animation(0, grow);
//! group.add_animation(1, slide);   // starts after fade_in and grow finish
//! group.start();
//! ```

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use smallvec::SmallVec;

use crate::animation::Animation;
use crate::events::{AnimationEvent, Direction, GroupEvent, ListenerId, Listeners};

type Batch = SmallVec<[Animation; 4]>;

/// How stage keys are traversed
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum StageOrder {
    /// Ascending keys when `Forward`, descending when `Backward`
    #[default]
    FollowDirection,
    /// Ascending keys regardless of direction
    Ascending,
}

fn ordered_keys(
    keys: impl Iterator<Item = i32>,
    direction: Direction,
    stage_order: StageOrder,
) -> Vec<i32> {
    let mut keys: Vec<i32> = keys.collect();
    if stage_order == StageOrder::FollowDirection && direction == Direction::Backward {
        keys.reverse();
    }
    keys
}

/// State of one pass through the stages
struct GroupRun {
    /// Stages as they were when the run started
    batches: BTreeMap<i32, Batch>,
    order: Vec<i32>,
    /// Position in `order` of the active stage, `None` before the first
    index: Option<usize>,
    /// Members of the active stage that have not finished yet
    pending: usize,
    subscriptions: Vec<(Animation, ListenerId)>,
}

impl GroupRun {
    fn active_key(&self) -> Option<i32> {
        self.index.and_then(|index| self.order.get(index).copied())
    }

    fn active_members(&self) -> Batch {
        self.active_key()
            .and_then(|key| self.batches.get(&key))
            .cloned()
            .unwrap_or_default()
    }
}

struct GroupCore {
    stages: BTreeMap<i32, Batch>,
    direction: Direction,
    stage_order: StageOrder,
    run: Option<GroupRun>,
    /// Bumped on every start and stop so stale stage launches can bail out
    generation: u64,
}

struct GroupShared {
    core: RefCell<GroupCore>,
    listeners: Listeners<GroupEvent>,
}

impl Drop for GroupShared {
    fn drop(&mut self) {
        if let Some(run) = self.core.get_mut().run.take() {
            for (animation, id) in run.subscriptions {
                animation.unsubscribe(id);
            }
        }
    }
}

/// Sequence of concurrently running animation batches
///
/// Cloning yields another handle to the same group.
#[derive(Clone)]
pub struct AnimationGroup {
    shared: Rc<GroupShared>,
}

impl AnimationGroup {
    pub fn new() -> Self {
        Self {
            shared: Rc::new(GroupShared {
                core: RefCell::new(GroupCore {
                    stages: BTreeMap::new(),
                    direction: Direction::Forward,
                    stage_order: StageOrder::default(),
                    run: None,
                    generation: 0,
                }),
                listeners: Listeners::new(),
            }),
        }
    }

    /// Add an animation to a stage
    ///
    /// The animation takes the group's direction. Animations added while the
    /// group is running join the next run, not the current one.
    pub fn add_animation(&self, stage_key: i32, animation: Animation) {
        let direction = {
            let mut core = self.shared.core.borrow_mut();
            core.stages.entry(stage_key).or_default().push(animation.clone());
            core.direction
        };
        animation.set_direction(direction);
    }

    /// Remove every stage. Ignored while running.
    pub fn clear_animations(&self) {
        let mut core = self.shared.core.borrow_mut();
        if core.run.is_some() {
            tracing::debug!("AnimationGroup: clear ignored while running");
            return;
        }
        core.stages.clear();
    }

    /// Choose how stage keys are traversed. Takes effect on the next start.
    pub fn set_stage_order(&self, stage_order: StageOrder) {
        self.shared.core.borrow_mut().stage_order = stage_order;
    }

    // =========================================================================
    // Playback
    // =========================================================================

    /// Start the first stage. Does nothing while already running.
    pub fn start(&self) {
        {
            let mut guard = self.shared.core.borrow_mut();
            let core = &mut *guard;
            if core.run.is_some() {
                return;
            }

            let batches = core.stages.clone();
            let order = ordered_keys(batches.keys().copied(), core.direction, core.stage_order);
            tracing::debug!("AnimationGroup: starting, stage order {:?}", order);

            core.generation += 1;
            core.run = Some(GroupRun {
                batches,
                order,
                index: None,
                pending: 0,
                subscriptions: Vec::new(),
            });
        }

        self.shared.listeners.emit(&[GroupEvent::Started]);
        self.process_next_stage();
    }

    /// Pause the animations of the active stage
    pub fn pause(&self) {
        for animation in self.active_members() {
            animation.pause();
        }
    }

    /// Resume the animations of the active stage
    pub fn resume(&self) {
        for animation in self.active_members() {
            animation.resume();
        }
    }

    /// Stop the active stage and end the run
    ///
    /// Later stages are never started and no `Finished` event is sent.
    pub fn stop(&self) {
        let (members, subscriptions) = {
            let mut core = self.shared.core.borrow_mut();
            let Some(run) = core.run.take() else {
                return;
            };
            core.generation += 1;
            tracing::debug!("AnimationGroup: stopped at stage {:?}", run.active_key());
            (run.active_members(), run.subscriptions)
        };

        for (animation, id) in subscriptions {
            animation.unsubscribe(id);
        }
        for animation in members {
            animation.stop();
        }
    }

    /// Set the direction of every animation in the group
    ///
    /// While running, the stage order is rebuilt for the new direction around
    /// the active stage. That stage keeps playing (now reversed) and the run
    /// continues with whatever follows it in the new order.
    pub fn set_group_direction(&self, direction: Direction) {
        let members: Vec<Animation> = {
            let mut guard = self.shared.core.borrow_mut();
            let core = &mut *guard;
            if core.direction == direction {
                return;
            }
            core.direction = direction;

            if let Some(run) = core.run.as_mut() {
                let active = run.active_key();
                run.order = ordered_keys(run.batches.keys().copied(), direction, core.stage_order);
                run.index = active.and_then(|key| run.order.iter().position(|k| *k == key));
                tracing::debug!(
                    "AnimationGroup: direction {:?}, stage order {:?} at {:?}",
                    direction,
                    run.order,
                    run.index
                );
            }

            let running = core.run.iter().flat_map(|run| run.batches.values());
            core.stages
                .values()
                .chain(running)
                .flatten()
                .cloned()
                .collect()
        };

        for animation in members {
            animation.set_direction(direction);
        }
    }

    // =========================================================================
    // Observers
    // =========================================================================

    pub fn subscribe<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&GroupEvent) + 'static,
    {
        self.shared.listeners.add(Rc::new(listener))
    }

    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        self.shared.listeners.remove(id)
    }

    // =========================================================================
    // Queries
    // =========================================================================

    pub fn is_running(&self) -> bool {
        self.shared.core.borrow().run.is_some()
    }

    pub fn direction(&self) -> Direction {
        self.shared.core.borrow().direction
    }

    pub fn stage_order(&self) -> StageOrder {
        self.shared.core.borrow().stage_order
    }

    /// Key of the stage in flight
    pub fn current_stage(&self) -> Option<i32> {
        self.shared
            .core
            .borrow()
            .run
            .as_ref()
            .and_then(GroupRun::active_key)
    }

    /// Stage keys in traversal order
    ///
    /// While running this is the order of the current run, otherwise the
    /// order the next start would use.
    pub fn execution_order(&self) -> Vec<i32> {
        let core = self.shared.core.borrow();
        match &core.run {
            Some(run) => run.order.clone(),
            None => ordered_keys(core.stages.keys().copied(), core.direction, core.stage_order),
        }
    }

    /// Members of the active stage still playing
    pub fn pending_in_stage(&self) -> usize {
        self.shared
            .core
            .borrow()
            .run
            .as_ref()
            .map_or(0, |run| run.pending)
    }

    pub fn stage_count(&self) -> usize {
        self.shared.core.borrow().stages.len()
    }

    pub fn animation_count(&self) -> usize {
        self.shared.core.borrow().stages.values().map(|batch| batch.len()).sum()
    }

    // =========================================================================
    // Stage processing
    // =========================================================================

    fn active_members(&self) -> Batch {
        self.shared
            .core
            .borrow()
            .run
            .as_ref()
            .map(GroupRun::active_members)
            .unwrap_or_default()
    }

    /// Advance to the next stage, or finish the run
    fn process_next_stage(&self) {
        let (key, members, generation) = {
            let mut guard = self.shared.core.borrow_mut();
            let core = &mut *guard;
            let Some(run) = core.run.as_mut() else {
                return;
            };

            let next = run.index.map_or(0, |index| index + 1);
            run.index = Some(next);
            let stage = run
                .order
                .get(next)
                .and_then(|key| Some((*key, run.batches.get(key)?.clone())));

            match stage {
                Some((key, members)) => {
                    run.pending = members.len();
                    (key, members, core.generation)
                }
                None => {
                    core.run = None;
                    tracing::debug!("AnimationGroup: finished");
                    drop(guard);
                    self.shared.listeners.emit(&[GroupEvent::Finished]);
                    return;
                }
            }
        };

        self.launch_stage(key, members, generation);
    }

    fn launch_stage(&self, key: i32, members: Batch, generation: u64) {
        let subscriptions: Vec<(Animation, ListenerId)> = members
            .iter()
            .map(|animation| {
                let group = Rc::downgrade(&self.shared);
                let id = animation.subscribe(move |event| {
                    if *event == AnimationEvent::Finished {
                        if let Some(shared) = group.upgrade() {
                            AnimationGroup { shared }.complete_members(1);
                        }
                    }
                });
                (animation.clone(), id)
            })
            .collect();

        if let Some(run) = self.shared.core.borrow_mut().run.as_mut() {
            run.subscriptions = subscriptions;
        }

        tracing::debug!("AnimationGroup: stage {} ({} animations)", key, members.len());
        let mut failed = 0;
        for animation in &members {
            if let Err(err) = animation.start(false) {
                tracing::warn!(
                    "AnimationGroup: stage {} member '{}' did not start: {}",
                    key,
                    animation.property_name(),
                    err
                );
                failed += 1;
            }
            if self.shared.core.borrow().generation != generation {
                return;
            }
        }

        self.shared.listeners.emit(&[GroupEvent::StageStarted(key)]);

        // A listener may have stopped or restarted the group
        if self.shared.core.borrow().generation != generation {
            return;
        }
        if failed > 0 {
            self.complete_members(failed);
        }
    }

    /// Count finished members of the active stage, closing it at zero
    fn complete_members(&self, count: usize) {
        let (key, subscriptions) = {
            let mut core = self.shared.core.borrow_mut();
            let Some(run) = core.run.as_mut() else {
                return;
            };
            if run.pending == 0 {
                return;
            }
            run.pending = run.pending.saturating_sub(count);
            if run.pending > 0 {
                return;
            }
            (run.active_key(), std::mem::take(&mut run.subscriptions))
        };

        for (animation, id) in subscriptions {
            animation.unsubscribe(id);
        }
        if let Some(key) = key {
            tracing::debug!("AnimationGroup: stage {} finished", key);
            self.shared.listeners.emit(&[GroupEvent::StageFinished(key)]);
        }
        self.process_next_stage();
    }
}

impl Default for AnimationGroup {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for AnimationGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let core = self.shared.core.borrow();
        f.debug_struct("AnimationGroup")
            .field("stages", &core.stages.keys().collect::<Vec<_>>())
            .field("direction", &core.direction)
            .field("stage_order", &core.stage_order)
            .field("current_stage", &core.run.as_ref().and_then(GroupRun::active_key))
            .finish()
    }
}
