//! Background loop that turns device records into mailbox transitions.
//!
//! The poller owns its [`EventSource`] outright and is the only writer of the
//! mailbox. It never touches the audio thread: in cooperative mode the audio
//! side only flips an atomic and unparks this thread.

use std::{
    sync::{
        atomic::{AtomicBool, AtomicU8, Ordering},
        Arc,
    },
    thread::{self, JoinHandle, Thread},
    time::{Duration, Instant},
};

use tracing::{debug, error, info, trace, warn};

use crate::{
    config::{BridgeConfig, RetryPolicy, ScheduleMode},
    error::InputError,
    input::{
        device::{EventSource, SourceFactory},
        event::{self, RECORD_SIZE},
    },
    mailbox::Publisher,
    shutdown::ShutdownToken,
};

/// Upper bound on records handled per cycle. A key stroke is typically three
/// records (scan, key, sync), so this covers a burst of ~20 strokes.
pub const MAX_RECORDS_PER_CYCLE: usize = 64;

/// Backoff sleeps are sliced so shutdown is still noticed promptly.
const SLEEP_SLICE: Duration = Duration::from_millis(10);

/// Observable state of the input side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum DeviceStatus {
    /// Opening the device for the first time.
    Opening = 0,
    /// Device open, transitions flowing.
    Ready = 1,
    /// A read failed; the device is being reopened.
    Degraded = 2,
    /// The device could not be opened; key input is disabled.
    Unavailable = 3,
    /// The poller observed shutdown and released the device.
    Stopped = 4,
}

impl DeviceStatus {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Opening,
            1 => Self::Ready,
            2 => Self::Degraded,
            3 => Self::Unavailable,
            _ => Self::Stopped,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Opening => "opening",
            Self::Ready => "ready",
            Self::Degraded => "degraded",
            Self::Unavailable => "unavailable",
            Self::Stopped => "stopped",
        }
    }
}

/// Status shared between the poller thread and any observer.
#[derive(Debug)]
pub struct StatusCell(AtomicU8);

impl StatusCell {
    fn new() -> Self {
        Self(AtomicU8::new(DeviceStatus::Opening as u8))
    }

    fn set(&self, status: DeviceStatus) {
        self.0.store(status as u8, Ordering::Release);
    }

    pub fn get(&self) -> DeviceStatus {
        DeviceStatus::from_u8(self.0.load(Ordering::Acquire))
    }
}

/// Handed to the realtime consumer in cooperative mode.
///
/// `rearm` never blocks: it sets a flag and unparks the poller thread.
#[derive(Debug, Clone)]
pub struct Rearm {
    armed: Arc<AtomicBool>,
    thread: Thread,
}

impl Rearm {
    pub fn rearm(&self) {
        self.armed.store(true, Ordering::Release);
        self.thread.unpark();
    }
}

pub struct Poller<F: SourceFactory> {
    factory: F,
    publisher: Publisher,
    poll_timeout: Duration,
    retry: RetryPolicy,
    shutdown: ShutdownToken,
    status: Arc<StatusCell>,
    buf: [u8; RECORD_SIZE],
}

impl<F: SourceFactory> Poller<F> {
    pub fn new(
        factory: F,
        publisher: Publisher,
        config: &BridgeConfig,
        shutdown: ShutdownToken,
    ) -> Self {
        Self {
            factory,
            publisher,
            poll_timeout: config.poll_timeout,
            retry: config.retry,
            shutdown,
            status: Arc::new(StatusCell::new()),
            buf: [0; RECORD_SIZE],
        }
    }

    pub fn status(&self) -> DeviceStatus {
        self.status.get()
    }

    /// Open the source, retrying per the policy. `None` means give up (or
    /// shutdown was requested while waiting).
    pub fn open(&mut self) -> Option<F::Source> {
        let attempts = self.retry.max_attempts();

        for attempt in 1..=attempts {
            if self.shutdown.is_cancelled() {
                self.status.set(DeviceStatus::Stopped);
                return None;
            }

            match self.factory.open_source() {
                Ok(source) => {
                    info!(attempt, "key input ready");
                    self.status.set(DeviceStatus::Ready);
                    return Some(source);
                }
                Err(err) if attempt < attempts => {
                    let delay = self.retry.backoff(attempt);
                    warn!(%err, attempt, attempts, ?delay, "opening input device failed, retrying");
                    if !self.sleep(delay) {
                        self.status.set(DeviceStatus::Stopped);
                        return None;
                    }
                }
                Err(err) => {
                    error!(%err, attempts, "input device unavailable, key input disabled");
                    self.status.set(DeviceStatus::Unavailable);
                    return None;
                }
            }
        }

        None
    }

    /// Wait up to the poll timeout for data, then read everything already
    /// queued (bounded). Returns how many transitions were published.
    ///
    /// A readable source that yields no bytes (end of a regular file) ends
    /// the cycle after the rest of the poll timeout, so a free-running loop
    /// never spins on it.
    pub fn cycle(&mut self, source: &mut F::Source) -> Result<usize, InputError> {
        let started = Instant::now();
        let mut published = 0;
        let mut timeout = self.poll_timeout;

        for _ in 0..MAX_RECORDS_PER_CYCLE {
            if !source.wait_readable(timeout)? {
                break;
            }
            timeout = Duration::ZERO;

            let n = source.read_record(&mut self.buf)?;
            if n == 0 {
                let remaining = self.poll_timeout.saturating_sub(started.elapsed());
                if !remaining.is_zero() {
                    thread::sleep(remaining);
                }
                break;
            }

            match event::try_decode(&self.buf[..n]) {
                Ok(transition) => {
                    if self.publisher.publish(transition) {
                        debug!(
                            code = transition.code,
                            collapsed = self.publisher.collapsed(),
                            "undrained transition replaced"
                        );
                    }
                    trace!(?transition, "published");
                    published += 1;
                }
                Err(discard) => trace!(%discard, "record discarded"),
            }
        }

        Ok(published)
    }

    /// Run until shutdown or until the device is lost for good.
    ///
    /// With `armed` set, one cycle runs per arming and the thread parks in
    /// between; otherwise cycles run back to back.
    pub fn run(mut self, armed: Option<Arc<AtomicBool>>) -> DeviceStatus {
        let Some(mut source) = self.open() else {
            return self.status.get();
        };

        while !self.shutdown.is_cancelled() {
            if let Some(armed) = &armed {
                if !armed.swap(false, Ordering::AcqRel) {
                    thread::park_timeout(self.poll_timeout);
                    continue;
                }
            }

            if let Err(err) = self.cycle(&mut source) {
                warn!(%err, "input device read failed, reopening");
                self.status.set(DeviceStatus::Degraded);
                drop(source);

                match self.open() {
                    Some(reopened) => source = reopened,
                    None => return self.status.get(),
                }
            }
        }

        self.status.set(DeviceStatus::Stopped);
        info!("key input stopped");
        DeviceStatus::Stopped
    }

    /// Sleep for `delay` unless shutdown arrives first.
    fn sleep(&self, delay: Duration) -> bool {
        let deadline = Instant::now() + delay;
        loop {
            if self.shutdown.is_cancelled() {
                return false;
            }
            let now = Instant::now();
            if now >= deadline {
                return true;
            }
            thread::sleep((deadline - now).min(SLEEP_SLICE));
        }
    }
}

impl<F> Poller<F>
where
    F: SourceFactory + 'static,
{
    /// Start the loop on its own thread.
    ///
    /// In cooperative mode the returned [`Rearm`] must be called after every
    /// audio block, otherwise the poller stalls after its first cycle.
    pub fn spawn(
        self,
        mode: ScheduleMode,
        thread_name: &str,
    ) -> Result<(PollerHandle, Option<Rearm>), InputError> {
        let shutdown = self.shutdown.clone();
        let status = Arc::clone(&self.status);
        let armed = match mode {
            ScheduleMode::Cooperative => Some(Arc::new(AtomicBool::new(true))),
            ScheduleMode::FreeRunning => None,
        };

        let thread = thread::Builder::new()
            .name(thread_name.to_string())
            .spawn({
                let armed = armed.clone();
                move || self.run(armed)
            })
            .map_err(InputError::Spawn)?;

        let rearm = armed.map(|armed| Rearm {
            armed,
            thread: thread.thread().clone(),
        });

        debug!(?mode, thread_name, "poller started");

        Ok((
            PollerHandle {
                thread: Some(thread),
                shutdown,
                status,
            },
            rearm,
        ))
    }
}

/// Owner-side handle of a running poller. Dropping it shuts the poller down.
#[derive(Debug)]
pub struct PollerHandle {
    thread: Option<JoinHandle<DeviceStatus>>,
    shutdown: ShutdownToken,
    status: Arc<StatusCell>,
}

impl PollerHandle {
    pub fn status(&self) -> DeviceStatus {
        self.status.get()
    }

    pub fn is_running(&self) -> bool {
        self.thread
            .as_ref()
            .is_some_and(|thread| !thread.is_finished())
    }

    pub fn shutdown_token(&self) -> ShutdownToken {
        self.shutdown.clone()
    }

    /// Signal shutdown and wait for the poller to release the device.
    pub fn shutdown(mut self) -> DeviceStatus {
        self.stop()
    }

    fn stop(&mut self) -> DeviceStatus {
        self.shutdown.cancel();

        let Some(thread) = self.thread.take() else {
            return self.status.get();
        };
        thread.thread().unpark();

        match thread.join() {
            Ok(status) => status,
            Err(_) => {
                error!("input poller thread panicked");
                self.status.get()
            }
        }
    }
}

impl Drop for PollerHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        input::{event::RawEvent, KeyTransition},
        mailbox::Mailbox,
    };
    use std::{collections::VecDeque, io};

    /// Hands out queued records, then reports nothing readable.
    struct Script {
        records: VecDeque<Vec<u8>>,
        fail_when_empty: bool,
    }

    impl Script {
        fn new(records: impl IntoIterator<Item = Vec<u8>>) -> Self {
            Self {
                records: records.into_iter().collect(),
                fail_when_empty: false,
            }
        }
    }

    impl EventSource for Script {
        fn wait_readable(&mut self, _timeout: Duration) -> io::Result<bool> {
            if self.records.is_empty() && self.fail_when_empty {
                return Err(io::Error::new(io::ErrorKind::BrokenPipe, "unplugged"));
            }
            Ok(!self.records.is_empty())
        }

        fn read_record(&mut self, buf: &mut [u8; RECORD_SIZE]) -> io::Result<usize> {
            let record = self.records.pop_front().unwrap_or_default();
            buf[..record.len()].copy_from_slice(&record);
            Ok(record.len())
        }
    }

    fn key(code: u16, value: i32) -> Vec<u8> {
        RawEvent::key(code, value).to_bytes().to_vec()
    }

    fn config() -> BridgeConfig {
        BridgeConfig::default().poll_timeout(Duration::from_millis(1))
    }

    #[test]
    fn cycle_publishes_only_key_edges() {
        let (tx, mut rx) = Mailbox::new().split();
        let mut poller = Poller::new(
            || -> Result<Script, InputError> { unreachable!() },
            tx,
            &config(),
            ShutdownToken::new(),
        );

        let sync = RawEvent {
            ev_type: event::EV_SYN,
            code: 0,
            value: 0,
        };
        let mut partial = key(30, 0);
        partial.truncate(RECORD_SIZE - 1);

        let mut source = Script::new([
            key(30, 1),
            sync.to_bytes().to_vec(),
            key(30, 2),
            partial,
        ]);

        assert_eq!(poller.cycle(&mut source).unwrap(), 1);
        assert_eq!(rx.drain(), Some(KeyTransition::pressed(30)));
        assert_eq!(rx.drain(), None);
    }

    #[test]
    fn burst_in_one_cycle_collapses_to_last_edge() {
        let (tx, mut rx) = Mailbox::new().split();
        let mut poller = Poller::new(
            || -> Result<Script, InputError> { unreachable!() },
            tx,
            &config(),
            ShutdownToken::new(),
        );
        let mut source = Script::new([key(30, 1), key(31, 0)]);

        assert_eq!(poller.cycle(&mut source).unwrap(), 2);
        assert_eq!(rx.drain(), Some(KeyTransition::released(31)));
        assert_eq!(rx.collapsed(), 1);
    }

    #[test]
    fn empty_read_waits_out_the_poll_timeout() {
        /// Always readable, never any data: a regular file at its end.
        struct AtEnd {
            waits: usize,
        }
        impl EventSource for AtEnd {
            fn wait_readable(&mut self, _timeout: Duration) -> io::Result<bool> {
                self.waits += 1;
                Ok(true)
            }
            fn read_record(&mut self, _buf: &mut [u8; RECORD_SIZE]) -> io::Result<usize> {
                Ok(0)
            }
        }

        let (tx, mut rx) = Mailbox::new().split();
        let mut poller = Poller::new(
            || -> Result<AtEnd, InputError> { unreachable!() },
            tx,
            &config().poll_timeout(Duration::from_millis(5)),
            ShutdownToken::new(),
        );
        let mut source = AtEnd { waits: 0 };

        let started = Instant::now();
        for _ in 0..4 {
            assert_eq!(poller.cycle(&mut source).unwrap(), 0);
        }

        assert!(started.elapsed() >= Duration::from_millis(20));
        assert_eq!(source.waits, 4);
        assert_eq!(rx.drain(), None);
    }

    #[test]
    fn open_failure_without_retry_marks_unavailable() {
        let (tx, rx) = Mailbox::new().split();
        let mut opens = 0;
        let mut poller = Poller::new(
            || -> Result<Script, InputError> {
                opens += 1;
                Err(InputError::Io(io::Error::from(io::ErrorKind::NotFound)))
            },
            tx,
            &config(),
            ShutdownToken::new(),
        );

        assert!(poller.open().is_none());
        assert_eq!(poller.status(), DeviceStatus::Unavailable);
        drop(poller);
        assert_eq!(opens, 1);
        assert!(!rx.has_new());
    }

    #[test]
    fn retries_until_device_appears() {
        let (tx, _rx) = Mailbox::new().split();
        let mut failures_left = 2;
        let retry = RetryPolicy {
            attempts: 3,
            initial_backoff: Duration::from_millis(1),
            max_backoff: Duration::from_millis(2),
        };
        let mut poller = Poller::new(
            move || {
                if failures_left > 0 {
                    failures_left -= 1;
                    return Err(InputError::Io(io::Error::from(io::ErrorKind::NotFound)));
                }
                Ok(Script::new([]))
            },
            tx,
            &config().retry(retry),
            ShutdownToken::new(),
        );

        assert!(poller.open().is_some());
        assert_eq!(poller.status(), DeviceStatus::Ready);
    }

    #[test]
    fn lost_device_is_reopened() {
        let (tx, mut rx) = Mailbox::new().split();
        let mut opened = 0;
        let retry = RetryPolicy::once();
        let poller = Poller::new(
            move || {
                opened += 1;
                match opened {
                    1 => Ok(Script {
                        records: [key(30, 1)].into(),
                        fail_when_empty: true,
                    }),
                    2 => Ok(Script {
                        records: [key(31, 0)].into(),
                        fail_when_empty: true,
                    }),
                    _ => Err(InputError::Io(io::Error::from(io::ErrorKind::NotFound))),
                }
            },
            tx,
            &config().retry(retry),
            ShutdownToken::new(),
        );

        // Third open fails, so the loop ends on its own.
        assert_eq!(poller.run(None), DeviceStatus::Unavailable);
        assert_eq!(rx.drain(), Some(KeyTransition::released(31)));
    }

    #[test]
    fn cooperative_poller_waits_for_arming() {
        let (tx, mut rx) = Mailbox::new().split();
        let (feed_tx, feed_rx) = std::sync::mpsc::channel::<Vec<u8>>();
        let mut feed_rx = Some(feed_rx);

        struct Channel(std::sync::mpsc::Receiver<Vec<u8>>, Option<Vec<u8>>);
        impl EventSource for Channel {
            fn wait_readable(&mut self, timeout: Duration) -> io::Result<bool> {
                if self.1.is_none() {
                    self.1 = self.0.recv_timeout(timeout).ok();
                }
                Ok(self.1.is_some())
            }
            fn read_record(&mut self, buf: &mut [u8; RECORD_SIZE]) -> io::Result<usize> {
                let record = self.1.take().unwrap_or_default();
                buf[..record.len()].copy_from_slice(&record);
                Ok(record.len())
            }
        }

        let poller = Poller::new(
            move || {
                let rx = feed_rx.take().expect("opened once");
                Ok(Channel(rx, None))
            },
            tx,
            &config(),
            ShutdownToken::new(),
        );
        let (handle, rearm) = poller
            .spawn(ScheduleMode::Cooperative, "test-input")
            .unwrap();
        let rearm = rearm.expect("cooperative mode hands out a rearm handle");

        // Let the initial armed cycle elapse, then queue a record.
        std::thread::sleep(Duration::from_millis(50));
        feed_tx.send(key(30, 1)).unwrap();
        std::thread::sleep(Duration::from_millis(50));
        assert_eq!(rx.drain(), None, "disarmed poller must not read");

        let deadline = Instant::now() + Duration::from_secs(2);
        let mut seen = None;
        while seen.is_none() && Instant::now() < deadline {
            rearm.rearm();
            std::thread::sleep(Duration::from_millis(2));
            seen = rx.drain();
        }
        assert_eq!(seen, Some(KeyTransition::pressed(30)));

        assert_eq!(handle.shutdown(), DeviceStatus::Stopped);
    }
}
