//! Outstanding extraction work.
//!
//! Each extraction registers a [`TaskGuard`] before it is spawned. A load
//! takes a [`PendingTasks::snapshot`] and waits for exactly those tasks, so
//! edits received before the load are reflected and later ones are not
//! waited on.

use tokio::sync::watch;

/// Completion signal held by a running extraction.
///
/// Dropping the guard settles the task, so a panicking extraction does not
/// wedge the responder.
#[derive(Debug)]
pub struct TaskGuard {
    tx: watch::Sender<bool>,
}

impl TaskGuard {
    pub fn finish(self) {
        drop(self);
    }
}

impl Drop for TaskGuard {
    fn drop(&mut self) {
        self.tx.send_replace(true);
    }
}

/// Waiter for one extraction.
#[derive(Debug, Clone)]
pub struct TaskWaiter {
    rx: watch::Receiver<bool>,
}

impl TaskWaiter {
    pub fn is_settled(&self) -> bool {
        *self.rx.borrow()
    }

    pub async fn settled(mut self) {
        // A closed channel means the guard is gone, which is settled too.
        let _ = self.rx.wait_for(|done| *done).await;
    }
}

/// Ordered list of extractions that may still be running.
#[derive(Debug, Default)]
pub struct PendingTasks {
    tasks: Vec<TaskWaiter>,
}

impl PendingTasks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new task and return the guard the task must hold.
    pub fn register(&mut self) -> TaskGuard {
        self.tasks.retain(|task| !task.is_settled());
        let (tx, rx) = watch::channel(false);
        self.tasks.push(TaskWaiter { rx });
        TaskGuard { tx }
    }

    /// Waiters for every task still outstanding right now.
    pub fn snapshot(&self) -> Vec<TaskWaiter> {
        self.tasks
            .iter()
            .filter(|task| !task.is_settled())
            .cloned()
            .collect()
    }

    pub fn outstanding(&self) -> usize {
        self.tasks.iter().filter(|task| !task.is_settled()).count()
    }
}

/// Wait for every waiter in order.
pub async fn settle_all(waiters: Vec<TaskWaiter>) {
    for waiter in waiters {
        waiter.settled().await;
    }
}
