use std::{
    fs::File,
    io::{self, Read},
    os::fd::AsRawFd,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::{error::InputError, input::event::RECORD_SIZE};

/// Something the poller can wait on and pull raw records from.
///
/// Implemented by [`DeviceHandle`] for real evdev nodes; tests drive the
/// poller with scripted sources.
pub trait EventSource: Send {
    /// Wait up to `timeout` for data. `Ok(false)` means nothing arrived.
    fn wait_readable(&mut self, timeout: Duration) -> io::Result<bool>;

    /// Read at most one record into `buf`, returning the byte count.
    fn read_record(&mut self, buf: &mut [u8; RECORD_SIZE]) -> io::Result<usize>;
}

/// Opens event sources for the poller, on start and again after a failure.
pub trait SourceFactory: Send {
    type Source: EventSource;

    fn open_source(&mut self) -> Result<Self::Source, InputError>;
}

impl<F, S> SourceFactory for F
where
    F: FnMut() -> Result<S, InputError> + Send,
    S: EventSource,
{
    type Source = S;

    fn open_source(&mut self) -> Result<Self::Source, InputError> {
        self()
    }
}

/// Factory for a device node on disk.
#[derive(Debug, Clone)]
pub struct DevicePath(pub PathBuf);

impl SourceFactory for DevicePath {
    type Source = DeviceHandle;

    fn open_source(&mut self) -> Result<DeviceHandle, InputError> {
        DeviceHandle::open(&self.0)
    }
}

/// Exclusive owner of an open input device. Closed on drop.
#[derive(Debug)]
pub struct DeviceHandle {
    file: File,
    path: PathBuf,
}

impl DeviceHandle {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, InputError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| InputError::DeviceUnavailable {
            path: path.to_path_buf(),
            source,
        })?;

        Ok(Self {
            file,
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// `poll(2)` takes whole milliseconds. Round up so a sub-millisecond timeout
/// still sleeps instead of spinning.
fn timeout_millis(timeout: Duration) -> libc::c_int {
    let millis = timeout.as_micros().div_ceil(1000);
    millis.min(libc::c_int::MAX as u128) as libc::c_int
}

impl EventSource for DeviceHandle {
    fn wait_readable(&mut self, timeout: Duration) -> io::Result<bool> {
        let mut fds = libc::pollfd {
            fd: self.file.as_raw_fd(),
            events: libc::POLLIN,
            revents: 0,
        };

        // SAFETY: `fds` is a single valid pollfd that outlives the call, and
        // the descriptor stays open for as long as `self.file` does.
        let ready = unsafe { libc::poll(&mut fds, 1, timeout_millis(timeout)) };

        if ready < 0 {
            let err = io::Error::last_os_error();
            return match err.kind() {
                io::ErrorKind::Interrupted => Ok(false),
                _ => Err(err),
            };
        }
        if ready == 0 {
            return Ok(false);
        }

        if fds.revents & libc::POLLIN != 0 {
            return Ok(true);
        }
        if fds.revents & (libc::POLLERR | libc::POLLHUP | libc::POLLNVAL) != 0 {
            return Err(io::Error::new(
                io::ErrorKind::BrokenPipe,
                format!("{} hung up", self.path.display()),
            ));
        }

        Ok(false)
    }

    fn read_record(&mut self, buf: &mut [u8; RECORD_SIZE]) -> io::Result<usize> {
        match self.file.read(buf) {
            Err(err)
                if matches!(
                    err.kind(),
                    io::ErrorKind::Interrupted | io::ErrorKind::WouldBlock
                ) =>
            {
                Ok(0)
            }
            other => other,
        }
    }
}
