use std::time::{Duration, Instant};

use tracing::debug;

use crate::constants::BULK_READ_SIZE;
use crate::error::{EepError, EepResult};
use crate::interface::DeviceInterface;
use crate::observer::Observer;

/// Collect exactly `size` bytes. Every non empty read restarts the
/// inactivity window; a gap longer than `inactivity` fails the whole read.
pub(crate) fn read_bytes(
    device: &mut dyn DeviceInterface,
    size: usize,
    inactivity: Duration,
    observer: &dyn Observer,
) -> EepResult<Vec<u8>> {
    let mut out = vec![0u8; size];
    let mut buffer = [0u8; BULK_READ_SIZE];
    let mut pos = 0;
    let mut last_read = Instant::now();

    observer.on_progress(0.0);
    while pos < size {
        if last_read.elapsed() > inactivity {
            return Err(EepError::ReadTimeout {
                received: pos,
                expected: size,
            });
        }

        let n = device.receive(&mut buffer)?;
        if n == 0 {
            continue;
        }
        last_read = Instant::now();

        let take = n.min(size - pos);
        out[pos..pos + take].copy_from_slice(&buffer[..take]);
        pos += take;
        observer.on_progress(pos as f64 / size as f64);
    }

    debug!("Read {} bytes", size);
    observer.on_progress(1.0);
    Ok(out)
}
