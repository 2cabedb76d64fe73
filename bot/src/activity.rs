//! Periodic activities.
//!
//! Each activity is a named thread calling its body at a fixed period until
//! the shared stop flag is raised.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use thread_priority::{
    RealtimeThreadSchedulePolicy, ScheduleParams, ThreadBuilder, ThreadPriority, ThreadSchedulePolicy,
};

/// Spawns a periodic activity with a realtime FIFO priority.
///
/// If the process is not allowed to use realtime scheduling the thread still
/// runs with the default policy.
pub fn spawn<F>(name: &str, period: Duration, priority: u8, stop: Arc<AtomicBool>, body: F) -> Result<JoinHandle<()>>
where
    F: FnMut() -> Result<()> + Send + 'static,
{
    let thread_name = name.to_owned();
    ThreadBuilder::default()
        .name(name)
        .policy(ThreadSchedulePolicy::Realtime(RealtimeThreadSchedulePolicy::Fifo))
        .priority(ThreadPriority::from_posix(ScheduleParams {
            sched_priority: i32::from(priority),
        }))
        .spawn_careless(move || run(&thread_name, period, &stop, body))
        .with_context(|| format!("Spawning {} activity", name))
}

/// Calls `body` every `period` until `stop` is raised.
///
/// Errors are logged and do not end the activity. A late iteration does not
/// trigger catch up calls.
pub fn run<F>(name: &str, period: Duration, stop: &AtomicBool, mut body: F)
where
    F: FnMut() -> Result<()>,
{
    log::info!("Starting {} activity ({:?})", name, period);
    let mut deadline = Instant::now();
    while !stop.load(Ordering::Relaxed) {
        if let Err(e) = body() {
            log::error!("{}: {:#}", name, e);
        }
        deadline += period;
        let now = Instant::now();
        if deadline > now {
            thread::sleep(deadline - now);
        } else {
            deadline = now;
        }
    }
    log::info!("{} activity stopped", name);
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn test_stopped_before_start() {
        let stop = AtomicBool::new(true);
        let mut calls = 0;
        run("test", Duration::from_millis(1), &stop, || {
            calls += 1;
            Ok(())
        });
        assert_eq!(calls, 0);
    }

    #[test]
    fn test_runs_until_stopped() {
        let stop = Arc::new(AtomicBool::new(false));
        let calls = Arc::new(AtomicUsize::new(0));

        let worker = {
            let stop = Arc::clone(&stop);
            let calls = Arc::clone(&calls);
            thread::spawn(move || {
                run("test", Duration::from_millis(1), &stop, || {
                    // Errors do not end the activity
                    if calls.fetch_add(1, Ordering::Relaxed) % 2 == 0 {
                        Err(anyhow!("odd call"))
                    } else {
                        Ok(())
                    }
                })
            })
        };

        while calls.load(Ordering::Relaxed) < 5 {
            thread::sleep(Duration::from_millis(1));
        }
        stop.store(true, Ordering::Relaxed);
        worker.join().unwrap();
        assert!(calls.load(Ordering::Relaxed) >= 5);
    }
}
