//! Background threads: the periodic expiry sweeper and the promotion worker.

use std::any::Any;
use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{select, tick, Receiver, Sender};
use tracing::{debug, error, trace};

/// Message consumed by the promotion worker
pub(crate) enum Task<K> {
    /// Move this key to the head of the recency list
    Promote(K),
    /// Acknowledge once every earlier task has been applied
    Flush(Sender<()>),
    /// Exit after the tasks queued ahead of this one
    Stop,
}

/// Periodic sweep thread; first pass runs as soon as it starts
pub(crate) struct Sweeper {
    stop: Sender<()>,
    handle: JoinHandle<()>,
}

impl Sweeper {
    pub(crate) fn spawn<F>(interval: Duration, mut sweep: F) -> io::Result<Self>
    where
        F: FnMut() -> usize + Send + 'static,
    {
        let (stop, stopped) = crossbeam_channel::bounded::<()>(0);

        let handle = thread::Builder::new()
            .name("ttlcache-sweeper".into())
            .spawn(move || {
                debug!(?interval, "expiry sweeper started");
                let ticker = tick(interval);
                run_guarded(&mut sweep);
                loop {
                    select! {
                        recv(ticker) -> _ => {
                            run_guarded(&mut sweep);
                        }
                        recv(stopped) -> _ => break,
                    }
                }
                debug!("expiry sweeper stopped");
            })?;

        Ok(Self { stop, handle })
    }

    /// Signal the thread and wait for it to exit
    pub(crate) fn stop(self) {
        drop(self.stop);
        if self.handle.join().is_err() {
            error!("expiry sweeper thread panicked");
        }
    }
}

/// Single consumer of the promotion queue
pub(crate) struct Promoter {
    handle: JoinHandle<()>,
}

impl Promoter {
    pub(crate) fn spawn<K, F>(tasks: Receiver<Task<K>>, mut promote: F) -> io::Result<Self>
    where
        K: Send + 'static,
        F: FnMut(K) + Send + 'static,
    {
        let handle = thread::Builder::new()
            .name("ttlcache-promoter".into())
            .spawn(move || {
                debug!("promotion worker started");
                for task in tasks.iter() {
                    match task {
                        Task::Promote(key) => promote(key),
                        Task::Flush(ack) => {
                            let _ = ack.send(());
                        }
                        Task::Stop => break,
                    }
                }
                debug!(pending = tasks.len(), "promotion worker stopped");
            })?;

        Ok(Self { handle })
    }

    /// Wait for the worker to exit. Callers must have queued [`Task::Stop`]
    /// or dropped every sender.
    pub(crate) fn join(self) {
        if self.handle.join().is_err() {
            error!("promotion worker thread panicked");
        }
    }
}

/// Run one sweep, containing any panic so the next tick still fires
fn run_guarded<F>(sweep: &mut F) -> Option<usize>
where
    F: FnMut() -> usize,
{
    match panic::catch_unwind(AssertUnwindSafe(|| sweep())) {
        Ok(removed) => {
            if removed > 0 {
                trace!(removed, "expired entries swept");
            }
            Some(removed)
        }
        Err(payload) => {
            error!(
                reason = panic_message(payload.as_ref()),
                "expiry sweep panicked; continuing on next tick"
            );
            None
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        msg
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.as_str()
    } else {
        "unknown panic"
    }
}
