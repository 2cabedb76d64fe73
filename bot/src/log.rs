use std::sync::mpsc::{sync_channel, Receiver, SyncSender};
use std::time::Instant;

use log::{Level, LevelFilter, Log, Metadata, Record};

#[cfg(feature = "profiling")]
use metrics_util::debugging::{DebugValue, DebuggingRecorder, Snapshotter};
#[cfg(feature = "profiling")]
use rstats::Stats;

/// Records waiting to be printed; extra records are dropped
const LOG_CAPACITY: usize = 64;

struct SyncRecord {
    timestamp: Instant,
    level: Level,
    target: String,
    content: String,
}

/// Prints the records pushed by the [`Logger`] from the thread that owns it.
pub struct LogSink {
    receiver: Receiver<SyncRecord>,
    #[cfg(feature = "profiling")]
    snapshotter: Snapshotter,
    start: Instant,
    #[cfg(feature = "profiling")]
    previous: Instant,
}

/// Logger usable from realtime activities: logging never blocks.
pub struct Logger {
    sender: SyncSender<SyncRecord>,
    level: LevelFilter,
}

impl Logger {
    pub fn init(level: LevelFilter) -> LogSink {
        let (sender, receiver) = sync_channel(LOG_CAPACITY);
        let start = Instant::now();
        let logger = Box::new(Self {
            sender,
            level,
        });
        let _ = log::set_logger(Box::leak(logger)).map(|()| log::set_max_level(level));

        #[cfg(feature = "profiling")]
        let snapshotter = {
            let recorder = DebuggingRecorder::new();
            let snapshotter = recorder.snapshotter();
            let _ = recorder.install();
            snapshotter
        };
        LogSink {
            receiver,
            #[cfg(feature = "profiling")]
            snapshotter,
            start,
            #[cfg(feature = "profiling")]
            previous: start,
        }
    }
}

impl Log for Logger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let _ = self.sender.try_send(SyncRecord {
                timestamp: Instant::now(),
                level: record.level(),
                target: record.target().to_owned(),
                content: std::fmt::format(*record.args()),
            });
        }
    }

    fn flush(&self) {}
}

impl LogSink {
    fn format(&self, record: &SyncRecord) -> String {
        format!(
            "[{:<9.5}] {:<5} {}: {}",
            record.timestamp.duration_since(self.start).as_secs_f32(),
            record.level,
            record.target,
            record.content
        )
    }

    pub fn handle_logs(&mut self) {
        for record in self.receiver.try_iter() {
            println!("{}", self.format(&record));
        }
        #[cfg(feature = "profiling")]
        {
            let delta = self.previous.elapsed().as_secs_f32();
            if delta > 0.5 {
                let snapshot = self.snapshotter.snapshot();
                for (key, _, _, metric) in snapshot.into_vec().iter() {
                    if let DebugValue::Histogram(histogram) = metric {
                        let Ok(stats) = histogram.ameanstd() else {
                            continue;
                        };
                        let max = histogram.iter().max().map(|x| x.into_inner()).unwrap_or(0.0);
                        let freq = histogram.len() as f32 / delta;
                        let name = key.key().labels().next().map(|label| label.value().to_owned()).unwrap_or_default();
                        println!(
                            "[{:<9.5}] {:<5} {} frequency: {:>6.2}Hz, max: {:>6.2e}s, mean {:>6.2e}s ± {:>4.2e}s",
                            self.start.elapsed().as_secs_f32(),
                            Level::Trace,
                            name,
                            freq,
                            max,
                            stats.centre,
                            stats.spread
                        );
                    }
                }
                self.previous = Instant::now();
            }
        }
    }
}
