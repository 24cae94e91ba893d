use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use crate::config::{ConfigError, MAX_INTERVAL_MINUTES};
use crate::models::CycleOutcome;

/// Runs a cycle on a fixed cadence until shutdown is signalled.
///
/// Ticks are anchored to the moment `run` starts, so slow cycles never shift
/// later ticks. A cycle that overruns its slot is followed by one immediate
/// catch-up tick, then the cadence realigns. Cycles never overlap.
pub struct Scheduler {
    period: Duration,
    immediate_run: bool,
}

impl Scheduler {
    pub fn new(period: Duration, immediate_run: bool) -> Result<Self, ConfigError> {
        if period.is_zero() {
            return Err(ConfigError::InvalidInterval(0));
        }
        let minutes = i64::try_from(period.as_secs() / 60).unwrap_or(i64::MAX);
        if minutes > MAX_INTERVAL_MINUTES {
            return Err(ConfigError::IntervalTooLarge(minutes));
        }
        Ok(Self {
            period,
            immediate_run,
        })
    }

    /// Drives `cycle` until `shutdown` flips to `true`. Returns the number of cycles run.
    ///
    /// Shutdown is honored between cycles; a cycle in flight always finishes first.
    pub async fn run<F>(&self, cycle: F, mut shutdown: watch::Receiver<bool>) -> usize
    where
        F: Fn() -> anyhow::Result<CycleOutcome> + Send + Sync + 'static,
    {
        let cycle = Arc::new(cycle);
        let origin = Instant::now();
        let mut cycles = 0usize;

        if self.immediate_run {
            run_once(&cycle).await;
            cycles += 1;
        }

        let mut ticker = interval_at(origin + self.period, self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        // Once every sender is gone no shutdown can arrive; keep ticking.
        let mut listening = true;

        loop {
            if *shutdown.borrow() {
                break;
            }

            tokio::select! {
                biased;

                changed = shutdown.changed(), if listening => {
                    if changed.is_err() {
                        log::warn!("Shutdown channel closed, scheduler will run until killed");
                        listening = false;
                    }
                }
                _ = ticker.tick() => {
                    run_once(&cycle).await;
                    cycles += 1;
                }
            }
        }

        log::info!("Scheduler stopped after {} cycles", cycles);
        cycles
    }
}

/// Runs one cycle on the blocking pool and folds every fault into an outcome.
async fn run_once<F>(cycle: &Arc<F>) -> CycleOutcome
where
    F: Fn() -> anyhow::Result<CycleOutcome> + Send + Sync + 'static,
{
    let cycle = Arc::clone(cycle);
    let outcome = match tokio::task::spawn_blocking(move || cycle()).await {
        Ok(Ok(outcome)) => outcome,
        Ok(Err(e)) => CycleOutcome::Failed(format!("{:#}", e)),
        Err(e) => CycleOutcome::Failed(format!("cycle aborted: {}", e)),
    };

    match &outcome {
        CycleOutcome::Completed(delivery) if delivery.is_failure() => {
            log::warn!("Cycle finished, delivery {}", delivery)
        }
        CycleOutcome::Completed(delivery) => log::info!("✅ Cycle finished, delivery {}", delivery),
        CycleOutcome::Failed(reason) => log::error!("❌ Cycle failed: {}", reason),
    }

    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DeliveryOutcome;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Mutex;

    const MINUTE: Duration = Duration::from_secs(60);

    fn counting(
        counter: Arc<AtomicUsize>,
        result: fn() -> anyhow::Result<CycleOutcome>,
    ) -> impl Fn() -> anyhow::Result<CycleOutcome> + Send + Sync + 'static {
        move || {
            counter.fetch_add(1, Ordering::SeqCst);
            result()
        }
    }

    fn delivered() -> anyhow::Result<CycleOutcome> {
        Ok(CycleOutcome::Completed(DeliveryOutcome::Delivered))
    }

    fn auth_failure() -> anyhow::Result<CycleOutcome> {
        Ok(CycleOutcome::Completed(DeliveryOutcome::AuthFailure))
    }

    fn disk_full() -> anyhow::Result<CycleOutcome> {
        anyhow::bail!("No space left on device")
    }

    fn panics() -> anyhow::Result<CycleOutcome> {
        panic!("boom")
    }

    #[test]
    fn test_zero_period_rejected() {
        assert!(matches!(
            Scheduler::new(Duration::ZERO, true),
            Err(ConfigError::InvalidInterval(0))
        ));
        assert!(Scheduler::new(MINUTE, true).is_ok());
        assert!(matches!(
            Scheduler::new(Duration::from_secs(u64::MAX), true),
            Err(ConfigError::IntervalTooLarge(_))
        ));
    }

    #[tokio::test]
    async fn test_overrun_catches_up_then_realigns_to_origin() {
        let period = Duration::from_millis(200);
        let starts = Arc::new(Mutex::new(Vec::<std::time::Instant>::new()));

        let job = {
            let starts = starts.clone();
            move || {
                let first = {
                    let mut starts = starts.lock().unwrap();
                    starts.push(std::time::Instant::now());
                    starts.len() == 1
                };
                if first {
                    std::thread::sleep(Duration::from_millis(300));
                }
                delivered()
            }
        };

        let (tx, rx) = watch::channel(false);
        let scheduler = Scheduler::new(period, true).unwrap();
        let handle = tokio::spawn(async move { scheduler.run(job, rx).await });

        while starts.lock().unwrap().len() < 5 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        tx.send(true).unwrap();
        handle.await.unwrap();

        let starts = starts.lock().unwrap();
        let offsets: Vec<u128> = starts
            .iter()
            .map(|t| t.duration_since(starts[0]).as_millis())
            .collect();

        // 0: immediate run (takes 300ms, misses the 200ms tick)
        // 1: catch-up right after it finishes
        // 2..: back on the 200ms grid, not shifted by the overrun
        let expected = [0u128, 300, 400, 600, 800];
        for (i, (got, want)) in offsets.iter().zip(expected).take(5).enumerate() {
            assert!(
                *got + 20 >= want && *got < want + 80,
                "cycle {} started at {}ms, expected ~{}ms (all: {:?})",
                i,
                got,
                want,
                offsets
            );
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_immediate_run_then_fixed_ticks() {
        let counter = Arc::new(AtomicUsize::new(0));
        let (tx, rx) = watch::channel(false);
        let scheduler = Scheduler::new(MINUTE, true).unwrap();
        let job = counting(counter.clone(), delivered);
        let handle = tokio::spawn(async move { scheduler.run(job, rx).await });

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 1);

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 2);

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 3);

        tx.send(true).unwrap();
        assert_eq!(handle.await.unwrap(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_without_immediate_run_waits_for_first_tick() {
        let counter = Arc::new(AtomicUsize::new(0));
        let (tx, rx) = watch::channel(false);
        let scheduler = Scheduler::new(MINUTE, false).unwrap();
        let job = counting(counter.clone(), delivered);
        let handle = tokio::spawn(async move { scheduler.run(job, rx).await });

        tokio::time::sleep(Duration::from_secs(59)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 1);

        tx.send(true).unwrap();
        assert_eq!(handle.await.unwrap(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failing_cycles_do_not_stop_the_loop() {
        let jobs: [fn() -> anyhow::Result<CycleOutcome>; 3] = [auth_failure, disk_full, panics];
        for job_result in jobs {
            let counter = Arc::new(AtomicUsize::new(0));
            let (tx, rx) = watch::channel(false);
            let scheduler = Scheduler::new(MINUTE, true).unwrap();
            let job = counting(counter.clone(), job_result);
            let handle = tokio::spawn(async move { scheduler.run(job, rx).await });

            tokio::time::sleep(Duration::from_secs(150)).await;
            assert_eq!(counter.load(Ordering::SeqCst), 3);

            tx.send(true).unwrap();
            assert_eq!(handle.await.unwrap(), 3);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_closed_shutdown_channel_keeps_ticking() {
        let counter = Arc::new(AtomicUsize::new(0));
        let (tx, rx) = watch::channel(false);
        drop(tx);
        let scheduler = Scheduler::new(MINUTE, false).unwrap();
        let job = counting(counter.clone(), delivered);
        let handle = tokio::spawn(async move { scheduler.run(job, rx).await });

        tokio::time::sleep(Duration::from_secs(130)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 2);
        handle.abort();
    }

    #[tokio::test]
    async fn test_in_flight_cycle_finishes_before_shutdown() {
        let started = Arc::new(AtomicBool::new(false));
        let finished = Arc::new(AtomicBool::new(false));
        let (release_tx, release_rx) = std::sync::mpsc::channel::<()>();
        let release_rx = Mutex::new(release_rx);

        let job = {
            let started = started.clone();
            let finished = finished.clone();
            move || {
                started.store(true, Ordering::SeqCst);
                let _ = release_rx.lock().unwrap().recv();
                finished.store(true, Ordering::SeqCst);
                delivered()
            }
        };

        let (tx, rx) = watch::channel(false);
        let scheduler = Scheduler::new(MINUTE, true).unwrap();
        let handle = tokio::spawn(async move { scheduler.run(job, rx).await });

        while !started.load(Ordering::SeqCst) {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        tx.send(true).unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!handle.is_finished());

        release_tx.send(()).unwrap();
        assert_eq!(handle.await.unwrap(), 1);
        assert!(finished.load(Ordering::SeqCst));
    }
}
