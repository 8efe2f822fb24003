//! Where blocking collaborator calls run, and how their results come back.
//!
//! Jobs report over a channel; each message carries the session epoch that
//! was current when the job was started so stale answers can be dropped.

use std::sync::mpsc::Sender;

pub type Job = Box<dyn FnOnce() + Send + 'static>;

pub trait Spawner {
    fn spawn(&self, name: &str, job: Job);
}

/// Runs every job immediately on the caller's thread.
#[derive(Default, Clone, Copy)]
pub struct InlineSpawner;

impl Spawner for InlineSpawner {
    fn spawn(&self, _name: &str, job: Job) {
        job()
    }
}

/// One short-lived OS thread per job.
#[cfg(not(target_arch = "wasm32"))]
#[derive(Default, Clone, Copy)]
pub struct ThreadSpawner;

#[cfg(not(target_arch = "wasm32"))]
impl Spawner for ThreadSpawner {
    fn spawn(&self, name: &str, job: Job) {
        let spawned = std::thread::Builder::new().name(format!("discogsnake-{name}")).spawn(job);
        if let Err(err) = spawned {
            // The job is gone; the caller's deadline turns this into a fallback.
            tracing::error!(%name, %err, "failed to spawn worker thread");
        }
    }
}

/// The spawner suited to the current target.
pub fn default_spawner() -> Box<dyn Spawner> {
    #[cfg(not(target_arch = "wasm32"))]
    {
        Box::new(ThreadSpawner)
    }
    #[cfg(target_arch = "wasm32")]
    {
        Box::new(InlineSpawner)
    }
}

#[derive(Debug)]
pub struct Envelope<T> {
    pub epoch: u64,
    pub payload: T,
}

/// Sending half handed to jobs. A closed receiver means the session is gone,
/// which is fine to ignore.
pub struct Reply<T> {
    epoch: u64,
    tx: Sender<Envelope<T>>,
}

impl<T> Reply<T> {
    pub fn new(epoch: u64, tx: Sender<Envelope<T>>) -> Self {
        Self { epoch, tx }
    }

    pub fn send(self, payload: T) {
        let _ = self.tx.send(Envelope { epoch: self.epoch, payload });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc::channel;

    #[test]
    fn inline_jobs_reply_before_spawn_returns() {
        let (tx, rx) = channel();
        let reply = Reply::new(3, tx);
        InlineSpawner.spawn("test", Box::new(move || reply.send("done")));
        let env = rx.try_recv().unwrap();
        assert_eq!((env.epoch, env.payload), (3, "done"));
    }

    #[cfg(not(target_arch = "wasm32"))]
    #[test]
    fn thread_jobs_reply_eventually() {
        let (tx, rx) = channel();
        let reply = Reply::new(1, tx);
        ThreadSpawner.spawn("test", Box::new(move || reply.send(42)));
        let env = rx.recv_timeout(std::time::Duration::from_secs(5)).unwrap();
        assert_eq!(env.payload, 42);
    }
}
