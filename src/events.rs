//! Navigation event queue
//!
//! Followers report what happened to them through fire-and-forget events;
//! the scripting/notification layer drains them once per tick. The queue is
//! double-buffered so consumers always see a frame-consistent batch no
//! matter where in the tick an event was pushed.

use std::collections::VecDeque;

use hecs::Entity;

/// Notifications emitted by navigation components. No return value is ever
/// consumed; handlers react or ignore as they please.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum NavEvent {
    /// The agent arrived within tolerance of its destination (for a planned
    /// path: the final node).
    ReachedDestination { agent: Entity },
    /// The agent moved less than its stuck tolerance in a tick and has no
    /// owned path to replan.
    MoveStuck { agent: Entity },
    /// The planner could not connect the agent to its requested goal, or no
    /// mesh supports the agent.
    PathFailed { agent: Entity },
    /// The aimed-at entity became visible from the agent's eye.
    TargetEnteredSight { agent: Entity, target: Entity },
    /// The aimed-at entity was lost from the agent's line of sight.
    TargetLeftSight { agent: Entity, target: Entity },
}

/// Double-buffered event queue.
///
/// Events pushed during tick N become visible to `iter`/`drain` after the
/// `swap` at the start of tick N + 1.
#[derive(Debug, Default)]
pub struct NavEventQueue {
    pending: VecDeque<NavEvent>,
    ready: VecDeque<NavEvent>,
}

impl NavEventQueue {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an event for the next tick's consumers.
    #[inline]
    pub fn push(&mut self, event: NavEvent) {
        self.pending.push_back(event);
    }

    /// Rotate buffers at the tick boundary: pending events become readable,
    /// and the write side starts empty.
    pub fn swap(&mut self) {
        std::mem::swap(&mut self.pending, &mut self.ready);
        self.pending.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &NavEvent> {
        self.ready.iter()
    }

    pub fn drain(&mut self) -> impl Iterator<Item = NavEvent> + '_ {
        self.ready.drain(..)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ready.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.ready.len()
    }

    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Drop everything on both sides, e.g. on level teardown.
    pub fn clear(&mut self) {
        self.pending.clear();
        self.ready.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn agent() -> Entity {
        let mut world = hecs::World::new();
        world.spawn(())
    }

    #[test]
    fn test_events_invisible_until_swap() {
        let mut queue = NavEventQueue::new();
        let a = agent();

        queue.push(NavEvent::ReachedDestination { agent: a });
        assert!(queue.is_empty());
        assert_eq!(queue.pending_count(), 1);

        queue.swap();
        assert_eq!(queue.len(), 1);
        assert_eq!(
            queue.iter().next(),
            Some(&NavEvent::ReachedDestination { agent: a })
        );
    }

    #[test]
    fn test_buffers_stay_isolated() {
        let mut queue = NavEventQueue::new();
        let a = agent();

        queue.push(NavEvent::MoveStuck { agent: a });
        queue.swap();
        queue.push(NavEvent::PathFailed { agent: a });

        let seen: Vec<_> = queue.iter().copied().collect();
        assert_eq!(seen, vec![NavEvent::MoveStuck { agent: a }]);

        queue.swap();
        let seen: Vec<_> = queue.iter().copied().collect();
        assert_eq!(seen, vec![NavEvent::PathFailed { agent: a }]);
    }

    #[test]
    fn test_drain_consumes() {
        let mut queue = NavEventQueue::new();
        let a = agent();

        queue.push(NavEvent::MoveStuck { agent: a });
        queue.push(NavEvent::ReachedDestination { agent: a });
        queue.swap();

        assert_eq!(queue.drain().count(), 2);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_clear_drops_both_sides() {
        let mut queue = NavEventQueue::new();
        let a = agent();

        queue.push(NavEvent::MoveStuck { agent: a });
        queue.swap();
        queue.push(NavEvent::PathFailed { agent: a });
        queue.clear();

        assert!(queue.is_empty());
        assert_eq!(queue.pending_count(), 0);
    }
}
