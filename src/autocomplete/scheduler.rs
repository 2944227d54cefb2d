use std::time::{Duration, Instant};

use tracing::trace;

#[derive(Debug)]
struct Scheduled<T> {
    due: Instant,
    generation: u64,
    task: T,
}

/// Deferred tasks stamped with the generation they were scheduled in.
/// Bumping the generation cancels everything scheduled before: such tasks are
/// dropped instead of run when they come due.
#[derive(Debug)]
pub struct DeferredQueue<T> {
    generation: u64,
    tasks: Vec<Scheduled<T>>,
}

impl<T: std::fmt::Debug> DeferredQueue<T> {
    pub fn new() -> Self {
        Self {
            generation: 0,
            tasks: Vec::new(),
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Starts a new generation and returns it.
    pub fn invalidate(&mut self) -> u64 {
        self.generation = self.generation.wrapping_add(1);
        self.generation
    }

    pub fn schedule(&mut self, now: Instant, delay: Duration, task: T) {
        self.tasks.push(Scheduled {
            due: now + delay,
            generation: self.generation,
            task,
        });
    }

    pub fn next_due(&self) -> Option<Instant> {
        self.tasks.iter().map(|scheduled| scheduled.due).min()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Removes every task due at `now`, returning the live ones in due order.
    pub fn take_due(&mut self, now: Instant) -> Vec<T> {
        let (mut due, pending): (Vec<_>, Vec<_>) = self
            .tasks
            .drain(..)
            .partition(|scheduled| scheduled.due <= now);
        self.tasks = pending;
        due.sort_by_key(|scheduled| scheduled.due);

        let generation = self.generation;
        due.into_iter()
            .filter_map(|scheduled| {
                if scheduled.generation == generation {
                    Some(scheduled.task)
                } else {
                    trace!(task = ?scheduled.task, "dropping stale deferred task");
                    None
                }
            })
            .collect()
    }
}

impl<T: std::fmt::Debug> Default for DeferredQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tasks_run_only_once_due() {
        let start = Instant::now();
        let mut queue = DeferredQueue::new();
        queue.schedule(start, Duration::from_millis(100), "blur");

        assert!(queue.take_due(start).is_empty());
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.next_due(), Some(start + Duration::from_millis(100)));

        assert_eq!(
            queue.take_due(start + Duration::from_millis(100)),
            vec!["blur"]
        );
        assert!(queue.is_empty());
    }

    #[test]
    fn due_tasks_come_back_in_due_order() {
        let start = Instant::now();
        let mut queue = DeferredQueue::new();
        queue.schedule(start, Duration::from_millis(50), "late");
        queue.schedule(start, Duration::ZERO, "early");

        assert_eq!(
            queue.take_due(start + Duration::from_millis(60)),
            vec!["early", "late"]
        );
    }

    #[test]
    fn invalidated_tasks_are_dropped() {
        let start = Instant::now();
        let mut queue = DeferredQueue::new();
        queue.schedule(start, Duration::ZERO, "stale");
        let generation = queue.invalidate();
        assert_eq!(queue.generation(), generation);
        queue.schedule(start, Duration::ZERO, "fresh");

        assert_eq!(queue.take_due(start), vec!["fresh"]);
        assert!(queue.is_empty());
    }
}
