//! Background maintenance thread
//!
//! Every tick runs an active expiration sweep and, if configured, dumps a
//! snapshot. Stopping sets a flag and unparks the thread so it exits
//! without waiting out the rest of its interval.

use crate::config::SweepConfig;
use crate::engine::Engine;
use skiplite_core::{Result, StoreKey, StoreValue};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;

/// Handle to a running sweeper. Dropping it stops the thread.
pub struct Sweeper {
    stop_flag: Arc<AtomicBool>,
    ticks: Arc<AtomicU64>,
    handle: Option<JoinHandle<()>>,
}

impl Sweeper {
    /// Starts sweeping `engine` on a named background thread
    pub fn spawn<K: StoreKey, V: StoreValue>(
        engine: Engine<K, V>,
        config: SweepConfig,
    ) -> Result<Self> {
        let stop_flag = Arc::new(AtomicBool::new(false));
        let ticks = Arc::new(AtomicU64::new(0));

        let stop = Arc::clone(&stop_flag);
        let counter = Arc::clone(&ticks);
        let handle = thread::Builder::new()
            .name("skiplite-sweeper".into())
            .spawn(move || {
                tracing::debug!(interval = ?config.interval, dump = config.dump, "sweeper started");
                while wait(&stop, config) {
                    tick(&engine, config);
                    counter.fetch_add(1, Ordering::Relaxed);
                }
                tracing::debug!("sweeper stopped");
            })?;

        Ok(Self {
            stop_flag,
            ticks,
            handle: Some(handle),
        })
    }

    /// Completed ticks so far
    pub fn ticks(&self) -> u64 {
        self.ticks.load(Ordering::Relaxed)
    }

    /// Returns true until the sweeper has been stopped
    pub fn is_running(&self) -> bool {
        self.handle.is_some() && !self.stop_flag.load(Ordering::SeqCst)
    }

    /// Stops the thread and waits for it to exit
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        self.stop_flag.store(true, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            handle.thread().unpark();
            if handle.join().is_err() {
                tracing::warn!("sweeper thread panicked");
            }
        }
    }
}

impl Drop for Sweeper {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Parks until the next tick is due. Returns false once stopped.
fn wait(stop: &AtomicBool, config: SweepConfig) -> bool {
    let deadline = Instant::now() + config.interval;
    loop {
        if stop.load(Ordering::SeqCst) {
            return false;
        }
        let now = Instant::now();
        if now >= deadline {
            return true;
        }
        // Spurious wakeups fall through to the deadline check
        thread::park_timeout(deadline - now);
    }
}

fn tick<K: StoreKey, V: StoreValue>(engine: &Engine<K, V>, config: SweepConfig) {
    if let Err(e) = engine.cycle_delete() {
        tracing::warn!(error = %e, "sweep failed");
    }
    if config.dump {
        if let Err(e) = engine.dump() {
            tracing::warn!(error = %e, "periodic dump failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_stop_does_not_wait_for_interval() {
        let engine: Engine<u32, String> = Engine::new().unwrap();
        let sweeper = Sweeper::spawn(
            engine,
            SweepConfig {
                interval: Duration::from_secs(3600),
                dump: false,
            },
        )
        .unwrap();
        assert!(sweeper.is_running());

        let started = Instant::now();
        sweeper.stop();
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn test_ticks_advance() {
        let engine: Engine<u32, String> = Engine::new().unwrap();
        let sweeper = Sweeper::spawn(
            engine,
            SweepConfig {
                interval: Duration::from_millis(5),
                dump: false,
            },
        )
        .unwrap();

        let deadline = Instant::now() + Duration::from_secs(5);
        while sweeper.ticks() < 3 && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(5));
        }
        assert!(sweeper.ticks() >= 3);
    }
}
