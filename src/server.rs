//! Control socket server.
//!
//! Bootstrap glue between the management-plane transport and the dispatcher.
//! Commands arrive as JSON messages prefixed with a 4-byte big-endian length
//! header over a Unix socket; each produces exactly one framed answer.
//!
//! ```text
//! +----------------+-------------------+
//! | Length (4 BE)  | JSON payload      |
//! +----------------+-------------------+
//! ```
//!
//! One thread per connection; dispatches on different connections run
//! concurrently against the shared dispatcher and host context.

use crate::answer::Answer;
use crate::command::Command;
use crate::dispatch::Dispatcher;
use crate::host::HostContext;
use std::io::{Read, Write};
use std::os::unix::net::{UnixListener, UnixStream};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Initial buffer size for reading commands from the socket.
const COMMAND_BUFFER_SIZE: usize = 64 * 1024;

/// Maximum allowed message size to prevent memory exhaustion.
const MAX_MESSAGE_SIZE: usize = 16 * 1024 * 1024;

/// Bind the control socket, replacing a stale one if present.
pub fn bind(socket_path: &Path) -> std::io::Result<UnixListener> {
    if socket_path.exists() {
        std::fs::remove_file(socket_path)?;
    }
    UnixListener::bind(socket_path)
}

/// Accept loop. Each connection gets its own thread sharing the dispatcher
/// and host context.
pub fn serve(
    listener: UnixListener,
    dispatcher: Arc<Dispatcher>,
    host: Arc<HostContext>,
) -> std::io::Result<()> {
    info!("entering accept loop");

    loop {
        match listener.accept() {
            Ok((stream, _addr)) => {
                debug!("accepted connection");
                let dispatcher = Arc::clone(&dispatcher);
                let host = Arc::clone(&host);
                std::thread::spawn(move || {
                    if let Err(e) = handle_connection(stream, &dispatcher, &host) {
                        warn!(error = %e, "connection error");
                    }
                });
            }
            Err(e) => {
                warn!(error = %e, "accept error");
            }
        }
    }
}

/// Handle a single connection: read framed commands until EOF, answering each.
fn handle_connection(
    mut stream: UnixStream,
    dispatcher: &Dispatcher,
    host: &HostContext,
) -> std::io::Result<()> {
    let mut buf = vec![0u8; COMMAND_BUFFER_SIZE];

    loop {
        // Read length header
        let mut header = [0u8; 4];
        match stream.read_exact(&mut header) {
            Ok(_) => {}
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                debug!("connection closed");
                return Ok(());
            }
            Err(e) => return Err(e),
        }

        let len = u32::from_be_bytes(header) as usize;
        if len > MAX_MESSAGE_SIZE {
            warn!(len, max = MAX_MESSAGE_SIZE, "message too large, rejecting");
            send_answer(
                &mut stream,
                &Answer::failure(format!(
                    "message size {} exceeds maximum {}",
                    len, MAX_MESSAGE_SIZE
                )),
            )?;
            return Ok(());
        }

        if len > buf.len() {
            buf.resize(len, 0);
        }
        stream.read_exact(&mut buf[..len])?;

        let command: Command = match serde_json::from_slice(&buf[..len]) {
            Ok(cmd) => cmd,
            Err(e) => {
                warn!(error = %e, "invalid command");
                send_answer(&mut stream, &Answer::failure(format!("invalid command: {}", e)))?;
                continue;
            }
        };

        debug!(kind = %command.kind(), "received command");
        let answer = dispatcher.dispatch(&command, host);
        send_answer(&mut stream, &answer)?;
    }
}

/// Write one framed answer.
fn send_answer(stream: &mut UnixStream, answer: &Answer) -> std::io::Result<()> {
    let payload = serde_json::to_vec(answer)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
    let header = (payload.len() as u32).to_be_bytes();
    stream.write_all(&header)?;
    stream.write_all(&payload)?;
    stream.flush()
}
