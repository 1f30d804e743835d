//! Request/reply worker threads.
//!
//! Each endpoint is served by one dedicated thread for the life of the
//! process. A worker blocks only in [`ReplySocket::receive`]; everything a
//! handler does is synchronous. Every request received is answered with
//! exactly one reply before the next receive or the shutdown check.

use ledmatrix_protocol::ReplySocket;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Pause after a socket error before trying again.
const ERROR_BACKOFF: Duration = Duration::from_millis(100);

/// Turns one request into one reply.
pub trait Handler: Send {
    /// Name used for the thread and in log lines.
    fn name(&self) -> &'static str;

    /// Handles a request. Must not fail: bad input gets a neutral reply.
    fn handle(&mut self, request: &[u8]) -> Vec<u8>;
}

/// Spawns a named thread serving `socket` with `handler` until `shutdown`
/// is set.
pub fn spawn<H>(
    socket: ReplySocket,
    handler: H,
    shutdown: Arc<AtomicBool>,
) -> std::io::Result<JoinHandle<()>>
where
    H: Handler + 'static,
{
    std::thread::Builder::new()
        .name(handler.name().to_string())
        .spawn(move || serve(socket, handler, &shutdown))
}

/// Receive, handle, reply; until shutdown.
pub fn serve<H: Handler>(mut socket: ReplySocket, mut handler: H, shutdown: &AtomicBool) {
    let name = handler.name();
    let mut consecutive_errors: u32 = 0;
    let mut last_error_log = Instant::now();

    info!("Serving {} requests on {}", name, socket.endpoint());

    while !shutdown.load(Ordering::Acquire) {
        let request = match socket.receive() {
            Ok(Some(request)) => request,
            Ok(None) => continue,
            Err(e) => {
                consecutive_errors += 1;
                // Only log errors once per minute or on first error
                let elapsed = last_error_log.elapsed();
                if consecutive_errors == 1 || elapsed >= Duration::from_secs(60) {
                    if consecutive_errors > 1 {
                        warn!(
                            "{} socket error (repeated {} times in {:?}): {}",
                            name, consecutive_errors, elapsed, e
                        );
                    } else {
                        warn!("{} socket error: {}", name, e);
                    }
                    last_error_log = Instant::now();
                    consecutive_errors = 0;
                }
                std::thread::sleep(ERROR_BACKOFF);
                continue;
            }
        };
        consecutive_errors = 0;

        debug!("{} request of {} bytes", name, request.len());
        let reply = handler.handle(&request);
        if let Err(e) = socket.send(&reply) {
            warn!("Failed to send {} reply: {}", name, e);
        }
    }

    info!("{} worker stopped", name);
}
