use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{Receiver, Sender, TryRecvError, bounded, select, unbounded};
use tracing::{debug, error, trace, warn};

use crate::constants::{ACK, NAK};
use crate::error::{EepError, EepResult};
use crate::interface::DeviceInterface;
use crate::observer::Observer;

/// The adapter buffers a single chunk. A permit sits in the capacity 1
/// channel for every chunk written but not yet acknowledged, so the
/// foreground blocks on the next chunk until the listener takes it out.
pub(crate) fn write_bytes(
    device: &mut dyn DeviceInterface,
    data: &[u8],
    chunk_size: usize,
    chunk_timeout: Duration,
    drain_delay: Duration,
    observer: Arc<dyn Observer>,
) -> EepResult<()> {
    if chunk_size == 0 || data.len() % chunk_size != 0 {
        return Err(EepError::InvalidPayload {
            len: data.len(),
            chunk: chunk_size,
        });
    }

    let (permit_tx, permit_rx) = bounded::<()>(1);
    let (fault_tx, fault_rx) = unbounded::<EepError>();
    let done = Arc::new(AtomicBool::new(false));

    let listener = spawn_listener(
        device.try_clone()?,
        permit_rx,
        fault_tx,
        Arc::clone(&done),
        Arc::clone(&observer),
    );

    let mut result = send_chunks(
        device,
        data,
        chunk_size,
        chunk_timeout,
        &permit_tx,
        &fault_rx,
        observer.as_ref(),
    );

    if result.is_ok() {
        // One more permit only fits once the last chunk is acknowledged
        result = acquire_permit(&permit_tx, &fault_rx, chunk_timeout)
            .inspect_err(|_| warn!("Last chunk of {} bytes never acknowledged", data.len()));
    }

    if result.is_ok() {
        thread::sleep(drain_delay);
        if let Ok(fault) = fault_rx.try_recv() {
            result = Err(fault);
        }
    }

    done.store(true, Ordering::Release);
    if listener.join().is_err() {
        error!("Write listener panicked");
    }

    result
}

fn send_chunks(
    device: &mut dyn DeviceInterface,
    data: &[u8],
    chunk_size: usize,
    chunk_timeout: Duration,
    permits: &Sender<()>,
    faults: &Receiver<EepError>,
    observer: &dyn Observer,
) -> EepResult<()> {
    let total = data.len();
    let mut sent = 0;

    observer.on_progress(0.0);
    for chunk in data.chunks(chunk_size) {
        match faults.try_recv() {
            Ok(fault) => return Err(fault),
            Err(TryRecvError::Empty) => {}
            Err(TryRecvError::Disconnected) => return Err(listener_gone()),
        }

        acquire_permit(permits, faults, chunk_timeout)
            .inspect_err(|_| warn!("Write stopped after {} of {} bytes", sent, total))?;

        let written = device.send(chunk)?;
        if written != chunk.len() {
            return Err(EepError::ShortWrite {
                written,
                expected: chunk.len(),
            });
        }

        sent += written;
        observer.on_progress(sent as f64 / total as f64);
    }

    debug!("Sent {} bytes in {} byte chunks", total, chunk_size);
    observer.on_progress(1.0);
    Ok(())
}

/// Blocks until the adapter has room for another chunk
fn acquire_permit(
    permits: &Sender<()>,
    faults: &Receiver<EepError>,
    timeout: Duration,
) -> EepResult<()> {
    select! {
        send(permits, ()) -> res => res.map_err(|_| pending_fault(faults)),
        recv(faults) -> fault => Err(fault.unwrap_or_else(|_| listener_gone())),
        default(timeout) => Err(EepError::WriteAckTimeout),
    }
}

/// A listener that stopped on a read error leaves its fault behind
fn pending_fault(faults: &Receiver<EepError>) -> EepError {
    faults.try_recv().unwrap_or_else(|_| listener_gone())
}

fn listener_gone() -> EepError {
    EepError::TransportIo("Write listener stopped".into())
}

fn spawn_listener(
    mut reader: Box<dyn DeviceInterface>,
    permits: Receiver<()>,
    faults: Sender<EepError>,
    done: Arc<AtomicBool>,
    observer: Arc<dyn Observer>,
) -> JoinHandle<()> {
    thread::spawn(move || {
        let mut buffer = [0u8; 1];
        while !done.load(Ordering::Acquire) {
            let n = match reader.receive(&mut buffer) {
                Ok(n) => n,
                Err(e) => {
                    let _ = faults.send(EepError::TransportIo(format!(
                        "Failed to read from port: {}",
                        e
                    )));
                    break;
                }
            };
            if n == 0 {
                continue;
            }

            match buffer[0] {
                ACK => {
                    if permits.try_recv().is_ok() {
                        trace!("Chunk acknowledged");
                    } else {
                        warn!("Ack without a chunk in flight");
                        observer.on_error(&EepError::UnexpectedAck);
                    }
                }
                NAK => {
                    let _ = faults.send(EepError::NegativeAck);
                }
                other => trace!("Ignoring byte {:#04x} during write", other),
            }
        }

        debug!("Write listener terminated");
    })
}
