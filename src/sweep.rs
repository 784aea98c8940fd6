use std::{sync::Arc, time::Duration};

use rocket::tokio::{
    select, spawn,
    sync::oneshot,
    task::JoinHandle,
    time::{interval_at, Instant, MissedTickBehavior},
};

use crate::storage::SessionStore;

/// Handle to the periodic garbage collection task. The task stops when [`stop`](Self::stop)
/// is called or when the handle is dropped.
pub(crate) struct Sweeper {
    shutdown_tx: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

impl Sweeper {
    /// Spawn a task that runs `store.gc()` every `period`, starting one period from now
    pub(crate) fn start(store: Arc<dyn SessionStore>, period: Duration) -> Self {
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel::<()>();
        let task = spawn(async move {
            rocket::info!("Starting session GC every {}s", period.as_secs());
            let mut interval = interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                select! {
                    _ = interval.tick() => {
                        match store.gc().await {
                            Ok((from, to)) => rocket::info!("sessions GC from {from} to {to}"),
                            Err(e) => rocket::error!("Error during session GC: {e}"),
                        }
                    }
                    _ = &mut shutdown_rx => {
                        rocket::info!("Session GC shutdown");
                        break;
                    }
                }
            }
        });

        Self { shutdown_tx, task }
    }

    /// Signal the task to stop and wait for it to finish. A sweep that's already running
    /// completes first.
    pub(crate) async fn stop(self) {
        let _ = self.shutdown_tx.send(());
        if let Err(e) = self.task.await {
            rocket::warn!("Session GC task failed: {e}");
        }
    }
}
