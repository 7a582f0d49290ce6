//! A small TCP server that streams monitor status to connected clients.
//!
//! On connect, a client receives a single compact JSON line describing the
//! current status of every monitor. After that, it receives one compact
//! JSON line per verdict as monitors decide, until either it disconnects or
//! the bus shuts down.
//!
//! The bus runs on a dedicated background thread with its own
//! current-thread tokio runtime, so it can be driven from ordinary
//! synchronous code (the same [`monitor_manager::VerdictSink`] callback
//! wiring used for any other verdict consumer).

use std::{
    io,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    thread::{self, JoinHandle},
    time::Duration,
};

use hpl_config::BusConfig;
use monitor_manager::{MonitorStatus, VerdictEvent};
use tokio::{
    io::AsyncWriteExt,
    net::{TcpListener, TcpStream},
    select,
    sync::{
        Mutex as AsyncMutex,
        mpsc::{self, UnboundedReceiver, UnboundedSender},
    },
    time::sleep,
};
use tracing::{debug, trace, warn};

use crate::error::{Error, Result};

/// An item queued for delivery to a single connected client.
enum QueueItem {
    /// A decided verdict, rendered as one JSON line.
    Verdict(VerdictEvent),
    /// The bus is shutting down; close the connection.
    Shutdown,
}

/// The set of clients currently connected, so verdicts can be fanned out.
type ClientRegistry = Arc<AsyncMutex<Vec<UnboundedSender<QueueItem>>>>;

/// A live monitoring bus, not yet started.
///
/// Construct with [`LiveBus::new`], then [`LiveBus::spawn`] it with the
/// initial monitor status to obtain a [`LiveBusHandle`].
pub struct LiveBus {
    host: String,
    port: u16,
}

impl LiveBus {
    /// Build a bus that will listen on the host and port named in `config`.
    pub fn new(config: &BusConfig) -> Self {
        Self {
            host: config.host.clone(),
            port: config.port,
        }
    }

    /// Start the bus on a background thread, reporting `initial_status` to
    /// every client that connects before the first verdict arrives.
    pub fn spawn(self, initial_status: Vec<MonitorStatus>) -> Result<LiveBusHandle> {
        let shutdown = Arc::new(AtomicBool::new(false));
        let (post_tx, post_rx) = mpsc::unbounded_channel::<VerdictEvent>();

        let host = self.host;
        let port = self.port;
        let host_for_error = host.clone();
        let shutdown_for_thread = Arc::clone(&shutdown);

        let (ready_tx, ready_rx) = std::sync::mpsc::channel::<io::Result<std::net::SocketAddr>>();

        let thread = thread::spawn(move || {
            let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
                Ok(rt) => rt,
                Err(e) => {
                    let _ = ready_tx.send(Err(e));
                    return;
                }
            };
            runtime.block_on(run(host, port, initial_status, post_rx, shutdown_for_thread, ready_tx));
        });

        match ready_rx.recv() {
            Ok(Ok(local_addr)) => Ok(LiveBusHandle {
                shutdown,
                post_tx,
                thread: std::sync::Mutex::new(Some(thread)),
                local_addr,
            }),
            Ok(Err(source)) => Err(Error::Bind {
                host: host_for_error,
                port,
                source,
            }),
            Err(_) => Err(Error::Join),
        }
    }
}

/// A handle to a running bus. Dropping it does not stop the bus; call
/// [`LiveBusHandle::shutdown`] explicitly.
///
/// Shares cheaply behind an `Arc` so the same handle can be used both as a
/// [`monitor_manager::VerdictSink`] (posting from inside a monitor's
/// dispatch callback) and, later, to shut the bus down from `main`.
pub struct LiveBusHandle {
    shutdown: Arc<AtomicBool>,
    post_tx: UnboundedSender<VerdictEvent>,
    thread: std::sync::Mutex<Option<JoinHandle<()>>>,
    local_addr: std::net::SocketAddr,
}

impl LiveBusHandle {
    /// The address the bus actually bound to. Useful in tests that bind to
    /// port 0 and need to connect back.
    pub fn local_addr(&self) -> std::net::SocketAddr {
        self.local_addr
    }

    /// Publish a decided verdict to every connected client.
    ///
    /// Safe to call from any thread, including from inside a
    /// [`monitor_manager::VerdictSink`] callback fired synchronously by a
    /// monitor transition.
    pub fn post(&self, event: VerdictEvent) {
        if self.post_tx.send(event).is_err() {
            warn!("live bus broadcast loop is gone; dropping verdict");
        }
    }

    /// Request shutdown and wait for the background thread to exit. Safe to
    /// call more than once, or concurrently from other clones of an `Arc`.
    pub fn shutdown(&self) -> Result<()> {
        self.shutdown.store(true, Ordering::SeqCst);
        let mut guard = self.thread.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        match guard.take() {
            Some(thread) => thread.join().map_err(|_| Error::Join),
            None => Ok(()),
        }
    }
}

impl Drop for LiveBusHandle {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::SeqCst);
    }
}

/// The bus's async body: bind, accept clients, and fan verdicts out to them
/// until `shutdown` is set.
async fn run(
    host: String,
    port: u16,
    initial_status: Vec<MonitorStatus>,
    mut post_rx: UnboundedReceiver<VerdictEvent>,
    shutdown: Arc<AtomicBool>,
    ready_tx: std::sync::mpsc::Sender<io::Result<std::net::SocketAddr>>,
) {
    let listener = match TcpListener::bind((host.as_str(), port)).await {
        Ok(listener) => match listener.local_addr() {
            Ok(addr) => {
                let _ = ready_tx.send(Ok(addr));
                listener
            }
            Err(e) => {
                let _ = ready_tx.send(Err(e));
                return;
            }
        },
        Err(e) => {
            let _ = ready_tx.send(Err(e));
            return;
        }
    };
    debug!(%host, port, "live bus listening");

    let clients: ClientRegistry = Arc::new(AsyncMutex::new(Vec::new()));
    let status = Arc::new(AsyncMutex::new(initial_status));

    let broadcast_clients = Arc::clone(&clients);
    let broadcast_status = Arc::clone(&status);
    let broadcast = async move {
        while let Some(event) = post_rx.recv().await {
            {
                let mut status = broadcast_status.lock().await;
                if let Some(entry) = status.get_mut(event.index) {
                    entry.verdict = Some(event.verdict);
                }
            }
            let mut clients = broadcast_clients.lock().await;
            clients.retain(|tx| tx.send(QueueItem::Verdict(event.clone())).is_ok());
        }
    };

    let accept = async {
        loop {
            match listener.accept().await {
                Ok((stream, addr)) => {
                    trace!(%addr, "live bus client connected");
                    let (tx, rx) = mpsc::unbounded_channel();
                    clients.lock().await.push(tx);
                    let report = status.lock().await.clone();
                    tokio::spawn(serve_client(stream, report, rx));
                }
                Err(e) => {
                    warn!(error = %e, "live bus accept failed");
                }
            }
        }
    };

    select! {
        () = broadcast => {}
        () = accept => {}
        () = poll_shutdown(&shutdown) => {
            debug!("live bus shutdown requested");
        }
    }

    let mut clients = clients.lock().await;
    for tx in clients.drain(..) {
        let _ = tx.send(QueueItem::Shutdown);
    }
}

/// Poll `shutdown` until it is set.
async fn poll_shutdown(shutdown: &AtomicBool) {
    while !shutdown.load(Ordering::SeqCst) {
        sleep(Duration::from_millis(50)).await;
    }
}

/// Send the initial status report, then relay queued verdicts until the
/// client disconnects or a shutdown poison pill arrives.
async fn serve_client(mut stream: TcpStream, report: Vec<MonitorStatus>, mut queue: UnboundedReceiver<QueueItem>) {
    if write_line(&mut stream, &report).await.is_err() {
        return;
    }
    while let Some(item) = queue.recv().await {
        match item {
            QueueItem::Verdict(event) => {
                if write_line(&mut stream, &event).await.is_err() {
                    return;
                }
            }
            QueueItem::Shutdown => return,
        }
    }
}

/// Serialize `value` compactly and write it as one newline-terminated line.
async fn write_line<T: serde::Serialize>(stream: &mut TcpStream, value: &T) -> io::Result<()> {
    let mut line = serde_json::to_string(value).unwrap_or_default();
    line.push('\n');
    stream.write_all(line.as_bytes()).await
}

#[cfg(test)]
mod tests {
    use std::io::{BufRead, BufReader};

    use serde_json::{Value, json};

    use super::*;

    fn test_bus() -> BusConfig {
        BusConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
        }
    }

    fn read_line(stream: &std::net::TcpStream) -> Value {
        let mut reader = BufReader::new(stream.try_clone().unwrap());
        let mut line = String::new();
        reader.read_line(&mut line).unwrap();
        serde_json::from_str(&line).unwrap()
    }

    #[test]
    fn client_receives_initial_status_report_on_connect() {
        let initial = vec![MonitorStatus {
            id: "p0".to_string(),
            title: "no negative balance".to_string(),
            property: String::new(),
            verdict: None,
            witness: None,
        }];
        let handle = LiveBus::new(&test_bus()).spawn(initial).unwrap();

        let stream = std::net::TcpStream::connect(handle.local_addr()).unwrap();
        let report = read_line(&stream);
        assert_eq!(
            report,
            json!([{"id": "p0", "title": "no negative balance", "property": "", "verdict": null}])
        );

        handle.shutdown().unwrap();
    }

    #[test]
    fn client_receives_a_posted_verdict() {
        let initial = vec![MonitorStatus {
            id: "p0".to_string(),
            title: String::new(),
            property: String::new(),
            verdict: None,
            witness: None,
        }];
        let handle = LiveBus::new(&test_bus()).spawn(initial).unwrap();
        let stream = std::net::TcpStream::connect(handle.local_addr()).unwrap();
        let _report = read_line(&stream);

        handle.post(VerdictEvent {
            index: 0,
            id: "p0".to_string(),
            verdict: false,
            timestamp: 3.5,
            witness: Vec::new(),
        });

        let event = read_line(&stream);
        assert_eq!(event["id"], "p0");
        assert_eq!(event["monitor"], 0);
        assert_eq!(event["value"], false);
        assert_eq!(event["timestamp"], 3.5);

        handle.shutdown().unwrap();
    }

    #[test]
    fn shutdown_closes_the_client_connection() {
        let handle = LiveBus::new(&test_bus()).spawn(Vec::new()).unwrap();
        let stream = std::net::TcpStream::connect(handle.local_addr()).unwrap();
        let _report = read_line(&stream);

        handle.shutdown().unwrap();

        let mut reader = BufReader::new(stream);
        let mut line = String::new();
        let n = reader.read_line(&mut line).unwrap();
        assert_eq!(n, 0, "expected EOF after shutdown");
    }
}
