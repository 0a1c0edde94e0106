use std::io;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::mpsc::{self, RecvTimeoutError, SyncSender};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::net::{TcpListener, TcpSocket};
use tokio::runtime::Runtime;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use url::Url;

use crate::assets::ResourceRoot;
use crate::config::ServerConfig;
use crate::error::ServerError;
use crate::http::connection::{Connection, ReadLimits};
use crate::launch::launch_url;
use crate::server::registry::ConnectionRegistry;
use crate::server::state::ServerState;

const LISTEN_BACKLOG: u32 = 1024;

/// Pause after a failed accept so a persistent error does not spin.
const ACCEPT_BACKOFF: Duration = Duration::from_millis(10);

/// An embedded HTTP server for a directory of static assets.
///
/// The server owns a small private tokio runtime; the accept loop and all
/// connection I/O run there, so `start()` and `stop()` are plain blocking
/// calls usable from any thread.
///
/// ```no_run
/// # fn main() -> Result<(), localserve::ServerError> {
/// let server = localserve::LocalServer::new("web")?;
/// let port = server.start()?;
/// println!("serving on http://127.0.0.1:{port}/");
/// server.stop();
/// # Ok(())
/// # }
/// ```
pub struct LocalServer {
    root: Arc<ResourceRoot>,
    config: ServerConfig,
    inner: Mutex<Inner>,
    runtime: Option<Runtime>,
}

struct Inner {
    state: ServerState,
    running: Option<Running>,
}

/// The live binding of a started server.
struct Running {
    port: u16,
    accept_task: JoinHandle<()>,
    registry: Arc<ConnectionRegistry>,
    released: mpsc::Receiver<()>,
}

/// What the accept task reports back to `start()`.
type Handshake = io::Result<u16>;

impl LocalServer {
    pub fn new(root: impl AsRef<Path>) -> Result<Self, ServerError> {
        Self::with_config(root, ServerConfig::default())
    }

    pub fn with_config(root: impl AsRef<Path>, config: ServerConfig) -> Result<Self, ServerError> {
        config.validate()?;
        let root = ResourceRoot::new(root)?;

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(config.worker_threads)
            .thread_name("localserve-worker")
            .enable_all()
            .build()
            .map_err(ServerError::Runtime)?;

        Ok(Self {
            root: Arc::new(root),
            config,
            inner: Mutex::new(Inner {
                state: ServerState::NotStarted,
                running: None,
            }),
            runtime: Some(runtime),
        })
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Binds an OS-assigned port and starts accepting connections.
    ///
    /// Returns the existing port without binding again if the server is
    /// already running. Waits at most `startup_timeout` for the listener
    /// to report its port.
    pub fn start(&self) -> Result<u16, ServerError> {
        let mut inner = self.lock();
        if let ServerState::Ready(port) = inner.state {
            return Ok(port);
        }

        let Some(runtime) = self.runtime.as_ref() else {
            return Err(ServerError::Runtime(io::Error::other("runtime already shut down")));
        };

        inner.state = ServerState::Starting;

        let registry = Arc::new(ConnectionRegistry::new());
        let (ready_tx, ready_rx) = mpsc::sync_channel::<Handshake>(1);
        let (released_tx, released_rx) = mpsc::sync_channel::<()>(1);
        let limits = ReadLimits {
            max_request_bytes: self.config.max_request_bytes,
            read_timeout: self.config.read_timeout(),
        };

        let accept_task = runtime.spawn(serve(
            self.config.listen_addr(),
            Arc::clone(&self.root),
            limits,
            Arc::clone(&registry),
            ready_tx,
            released_tx,
        ));

        let timeout = self.config.startup_timeout();
        let result = match ready_rx.recv_timeout(timeout) {
            Ok(Ok(port)) => Ok(port),
            Ok(Err(e)) => Err(ServerError::Bind(e)),
            Err(RecvTimeoutError::Timeout) => Err(ServerError::StartupTimeout(timeout)),
            Err(RecvTimeoutError::Disconnected) => Err(ServerError::Bind(io::Error::other(
                "listener task exited before reporting a port",
            ))),
        };

        match result {
            Ok(port) => {
                info!(port, root = %self.root.path().display(), "Listening");
                inner.state = ServerState::Ready(port);
                inner.running = Some(Running {
                    port,
                    accept_task,
                    registry,
                    released: released_rx,
                });
                Ok(port)
            }
            Err(e) => {
                error!(error = %e, "Failed to start server");
                accept_task.abort();
                registry.close_all();
                // a bind that lands after the timeout must be gone before
                // the caller retries
                self.wait_released(&released_rx, None);
                inner.state = ServerState::Failed(e.to_string());
                Err(e)
            }
        }
    }

    /// Waits (bounded by `startup_timeout`) until an aborted accept task has
    /// dropped its listener. A task that never bound drops the sender
    /// instead, which ends the wait at once.
    fn wait_released(&self, released: &mpsc::Receiver<()>, port: Option<u16>) {
        match released.recv_timeout(self.config.startup_timeout()) {
            Ok(()) | Err(RecvTimeoutError::Disconnected) => {}
            Err(RecvTimeoutError::Timeout) => {
                warn!(?port, "Listener was not released in time");
            }
        }
    }

    /// Stops accepting, cancels every live connection and releases the port.
    ///
    /// Safe to call in any state, any number of times.
    pub fn stop(&self) {
        let mut inner = self.lock();

        if let Some(running) = inner.running.take() {
            running.accept_task.abort();
            let cancelled = running.registry.close_all();

            // the listener is dropped with the task; wait so a following
            // start() never overlaps the old binding
            self.wait_released(&running.released, Some(running.port));

            info!(port = running.port, cancelled, "Server stopped");
        }

        if inner.state != ServerState::NotStarted {
            inner.state = ServerState::Stopped;
        }
    }

    /// The bound port, or 0 when not running.
    pub fn port(&self) -> u16 {
        self.lock().state.port()
    }

    pub fn is_running(&self) -> bool {
        self.lock().state.is_ready()
    }

    pub fn state(&self) -> ServerState {
        self.lock().state.clone()
    }

    pub fn resource_root(&self) -> &ResourceRoot {
        &self.root
    }

    /// Number of connections currently being handled.
    pub fn active_connections(&self) -> usize {
        self.lock()
            .running
            .as_ref()
            .map(|running| running.registry.len())
            .unwrap_or(0)
    }

    /// Loopback URL for `path` with an opaque `query`, or `None` when the
    /// server is not running.
    pub fn url_for(&self, path: &str, query: &str) -> Option<Url> {
        match self.port() {
            0 => None,
            port => launch_url(port, path, query).ok(),
        }
    }
}

impl Drop for LocalServer {
    fn drop(&mut self) {
        self.stop();
        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_background();
        }
    }
}

/// Owns the bound listener and signals when it has been dropped.
struct BoundListener {
    listener: Option<TcpListener>,
    released: SyncSender<()>,
}

impl Drop for BoundListener {
    fn drop(&mut self) {
        drop(self.listener.take());
        let _ = self.released.try_send(());
    }
}

fn bind(addr: SocketAddr) -> io::Result<TcpListener> {
    let socket = if addr.is_ipv4() {
        TcpSocket::new_v4()?
    } else {
        TcpSocket::new_v6()?
    };
    socket.set_reuseaddr(true)?;
    socket.bind(addr)?;
    socket.listen(LISTEN_BACKLOG)
}

async fn serve(
    addr: SocketAddr,
    root: Arc<ResourceRoot>,
    limits: ReadLimits,
    registry: Arc<ConnectionRegistry>,
    ready: SyncSender<Handshake>,
    released: SyncSender<()>,
) {
    let bound = match bind(addr).and_then(|l| l.local_addr().map(|local| (l, local))) {
        Ok((listener, local)) => {
            let guard = BoundListener {
                listener: Some(listener),
                released,
            };
            // start() gave up waiting; release the port
            if ready.try_send(Ok(local.port())).is_err() {
                return;
            }
            guard
        }
        Err(e) => {
            let _ = ready.try_send(Err(e));
            return;
        }
    };

    let Some(listener) = bound.listener.as_ref() else {
        return;
    };

    loop {
        let (stream, peer) = match listener.accept().await {
            Ok(pair) => pair,
            Err(e) => {
                warn!(error = %e, "Failed to accept connection");
                tokio::time::sleep(ACCEPT_BACKOFF).await;
                continue;
            }
        };

        let Some(mut registration) = registry.register() else {
            debug!(%peer, "Server stopping, dropping connection");
            break;
        };

        let root = Arc::clone(&root);
        tokio::spawn(async move {
            let id = registration.id();
            debug!(connection = id, %peer, "Accepted connection");

            let mut conn = Connection::new(stream, root, limits);
            tokio::select! {
                res = conn.run() => {
                    if let Err(e) = res {
                        debug!(connection = id, %peer, error = %e, "Connection error");
                    }
                }
                _ = registration.cancelled() => {
                    debug!(connection = id, %peer, "Connection cancelled");
                }
            }
        });
    }
}
