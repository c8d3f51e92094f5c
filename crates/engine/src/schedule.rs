use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TaskId(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Cadence {
    Once,
    Every(Duration),
}

#[derive(Debug, Clone)]
struct ScheduledTask<K> {
    id: TaskId,
    due_at: Duration,
    cadence: Cadence,
    kind: K,
}

/// A task whose due time was reached during an `advance` call.
#[derive(Debug, Clone, PartialEq)]
pub struct DueTask<K> {
    pub id: TaskId,
    pub due_at: Duration,
    pub kind: K,
}

/// Cooperative single-threaded timer registry.
///
/// Tasks are plain records; the owner decides what each `kind` means and must
/// re-check liveness of whatever the kind refers to before acting on it.
#[derive(Debug)]
pub struct ScheduledTaskQueue<K> {
    now: Duration,
    next_task_id: u64,
    tasks: Vec<ScheduledTask<K>>,
}

impl<K> Default for ScheduledTaskQueue<K> {
    fn default() -> Self {
        Self {
            now: Duration::ZERO,
            next_task_id: 0,
            tasks: Vec::new(),
        }
    }
}

impl<K: Clone> ScheduledTaskQueue<K> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now(&self) -> Duration {
        self.now
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn schedule_once(&mut self, delay: Duration, kind: K) -> TaskId {
        self.push(delay, Cadence::Once, kind)
    }

    /// Zero intervals are bumped to one millisecond so a periodic task can
    /// never fire unboundedly within one advance.
    pub fn schedule_every(&mut self, interval: Duration, kind: K) -> TaskId {
        let interval = interval.max(Duration::from_millis(1));
        self.push(interval, Cadence::Every(interval), kind)
    }

    pub fn cancel(&mut self, id: TaskId) -> bool {
        let before = self.tasks.len();
        self.tasks.retain(|task| task.id != id);
        self.tasks.len() != before
    }

    pub fn cancel_where(&mut self, mut predicate: impl FnMut(&K) -> bool) -> usize {
        let before = self.tasks.len();
        self.tasks.retain(|task| !predicate(&task.kind));
        before - self.tasks.len()
    }

    pub fn clear(&mut self) {
        self.tasks.clear();
    }

    pub fn contains(&self, id: TaskId) -> bool {
        self.tasks.iter().any(|task| task.id == id)
    }

    pub fn time_until(&self, id: TaskId) -> Option<Duration> {
        self.tasks
            .iter()
            .find(|task| task.id == id)
            .map(|task| task.due_at.saturating_sub(self.now))
    }

    /// Moves the clock forward by `dt` and returns every occurrence that came
    /// due, ordered by due time and then by registration order. Periodic
    /// tasks that span several intervals yield one occurrence per interval.
    pub fn advance(&mut self, dt: Duration) -> Vec<DueTask<K>> {
        self.now = self.now.saturating_add(dt);
        let now = self.now;
        let mut due = Vec::new();

        self.tasks.retain_mut(|task| {
            while task.due_at <= now {
                due.push(DueTask {
                    id: task.id,
                    due_at: task.due_at,
                    kind: task.kind.clone(),
                });
                match task.cadence {
                    Cadence::Once => return false,
                    Cadence::Every(interval) => task.due_at = task.due_at.saturating_add(interval),
                }
            }
            true
        });

        due.sort_by_key(|task| (task.due_at, task.id));
        due
    }

    fn push(&mut self, delay: Duration, cadence: Cadence, kind: K) -> TaskId {
        let id = TaskId(self.next_task_id);
        self.next_task_id = self.next_task_id.saturating_add(1);
        self.tasks.push(ScheduledTask {
            id,
            due_at: self.now.saturating_add(delay),
            cadence,
            kind,
        });
        id
    }
}
