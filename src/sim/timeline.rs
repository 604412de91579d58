//! Cancellable timers on a virtual clock
//!
//! The shell advances the clock; nothing here reads wall time, so pacing is
//! deterministic and replayable in tests.

/// Handle to a scheduled task, used to cancel it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskHandle(u64);

#[derive(Debug)]
struct Scheduled<T> {
    handle: TaskHandle,
    due_ms: f64,
    period_ms: Option<f64>,
    /// Tie-break for tasks due at the same instant
    order: u64,
    task: T,
}

/// Deterministic one-shot and repeating timers
#[derive(Debug)]
pub struct Timeline<T> {
    now_ms: f64,
    next_order: u64,
    tasks: Vec<Scheduled<T>>,
}

impl<T> Default for Timeline<T> {
    fn default() -> Self {
        Self {
            now_ms: 0.0,
            next_order: 0,
            tasks: Vec::new(),
        }
    }
}

impl<T: Clone> Timeline<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now_ms(&self) -> f64 {
        self.now_ms
    }

    fn next_order(&mut self) -> u64 {
        let order = self.next_order;
        self.next_order = self.next_order.wrapping_add(1);
        order
    }

    /// Run `task` once, `delay_ms` from now
    pub fn schedule(&mut self, delay_ms: f64, task: T) -> TaskHandle {
        self.insert(delay_ms, None, task)
    }

    /// Run `task` every `period_ms`, first after one period
    pub fn schedule_every(&mut self, period_ms: f64, task: T) -> TaskHandle {
        // A zero period would never let the clock move past the task
        let period_ms = period_ms.max(f64::EPSILON);
        self.insert(period_ms, Some(period_ms), task)
    }

    fn insert(&mut self, delay_ms: f64, period_ms: Option<f64>, task: T) -> TaskHandle {
        let order = self.next_order();
        let handle = TaskHandle(order);
        self.tasks.push(Scheduled {
            handle,
            due_ms: self.now_ms + delay_ms.max(0.0),
            period_ms,
            order,
            task,
        });
        handle
    }

    /// Cancel a pending task; returns false if it already ran or was cancelled
    pub fn cancel(&mut self, handle: TaskHandle) -> bool {
        let before = self.tasks.len();
        self.tasks.retain(|t| t.handle != handle);
        before != self.tasks.len()
    }

    pub fn cancel_all(&mut self) {
        self.tasks.clear();
    }

    pub fn is_scheduled(&self, handle: TaskHandle) -> bool {
        self.tasks.iter().any(|t| t.handle == handle)
    }

    /// Number of tasks still waiting to run
    pub fn active_count(&self) -> usize {
        self.tasks.len()
    }

    /// Pop the earliest task due at or before `until_ms`
    ///
    /// The clock moves to the task's due time. Repeating tasks are re-armed
    /// one period later and a copy of the payload is returned. Callers loop
    /// until `None`, then call [`settle`](Self::settle), so tasks scheduled
    /// while handling earlier ones still run inside the same window.
    pub fn pop_due(&mut self, until_ms: f64) -> Option<(TaskHandle, T)> {
        let index = self
            .tasks
            .iter()
            .enumerate()
            .filter(|(_, t)| t.due_ms <= until_ms)
            .min_by(|(_, a), (_, b)| {
                a.due_ms
                    .partial_cmp(&b.due_ms)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then_with(|| a.order.cmp(&b.order))
            })
            .map(|(i, _)| i)?;

        self.now_ms = self.now_ms.max(self.tasks[index].due_ms);
        match self.tasks[index].period_ms {
            Some(period) => {
                let order = self.next_order();
                let entry = &mut self.tasks[index];
                entry.due_ms += period;
                entry.order = order;
                Some((entry.handle, entry.task.clone()))
            }
            None => {
                let entry = self.tasks.swap_remove(index);
                Some((entry.handle, entry.task))
            }
        }
    }

    /// Move the clock to `until_ms` after all due tasks were popped
    pub fn settle(&mut self, until_ms: f64) {
        self.now_ms = self.now_ms.max(until_ms);
    }

    /// Advance by `dt_ms`, collecting every task that came due, in order
    pub fn advance(&mut self, dt_ms: f64) -> Vec<(TaskHandle, T)> {
        let until = self.now_ms + dt_ms.max(0.0);
        let mut due = Vec::new();
        while let Some(task) = self.pop_due(until) {
            due.push(task);
        }
        self.settle(until);
        due
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tasks_fire_in_due_order() {
        let mut timeline = Timeline::new();
        timeline.schedule(300.0, "late");
        timeline.schedule(100.0, "early");
        timeline.schedule(100.0, "early-second");

        assert!(timeline.advance(50.0).is_empty());
        let fired: Vec<_> = timeline.advance(300.0).into_iter().map(|(_, t)| t).collect();
        assert_eq!(fired, vec!["early", "early-second", "late"]);
        assert_eq!(timeline.active_count(), 0);
        assert_eq!(timeline.now_ms(), 350.0);
    }

    #[test]
    fn test_cancel_prevents_firing() {
        let mut timeline = Timeline::new();
        let a = timeline.schedule(10.0, 'a');
        timeline.schedule(10.0, 'b');
        assert!(timeline.cancel(a));
        assert!(!timeline.cancel(a));
        let fired: Vec<_> = timeline.advance(20.0).into_iter().map(|(_, t)| t).collect();
        assert_eq!(fired, vec!['b']);
    }

    #[test]
    fn test_repeating_task_until_cancelled() {
        let mut timeline = Timeline::new();
        let tick = timeline.schedule_every(10.0, ());
        assert_eq!(timeline.advance(35.0).len(), 3);
        assert!(timeline.is_scheduled(tick));
        timeline.cancel(tick);
        assert!(timeline.advance(100.0).is_empty());
    }

    #[test]
    fn test_pop_due_sees_tasks_scheduled_mid_window() {
        let mut timeline = Timeline::new();
        timeline.schedule(10.0, 1);
        let mut fired = Vec::new();
        while let Some((_, task)) = timeline.pop_due(100.0) {
            fired.push(task);
            if task == 1 {
                // scheduled relative to the task's own due time (10 ms)
                timeline.schedule(20.0, 2);
                timeline.schedule(200.0, 3);
            }
        }
        timeline.settle(100.0);
        assert_eq!(fired, vec![1, 2]);
        assert_eq!(timeline.active_count(), 1);
    }

    #[test]
    fn test_cancel_all() {
        let mut timeline = Timeline::new();
        timeline.schedule(1.0, 0);
        timeline.schedule_every(1.0, 1);
        timeline.cancel_all();
        assert_eq!(timeline.active_count(), 0);
        assert!(timeline.advance(10.0).is_empty());
    }
}
