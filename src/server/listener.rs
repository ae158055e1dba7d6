use std::net::{SocketAddr, ToSocketAddrs};
use std::sync::Arc;

use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{error, info};

use crate::config::{Config, SessionSettings};
use crate::http::connection::Connection;
use crate::http::router::{Router, SharedRoutes};

#[derive(Debug, Error)]
pub enum ServerError {
    /// Returned by [`Server::serve`] after [`Server::shutdown`].
    #[error("server closed")]
    Closed,

    #[error("cannot resolve {addr}: {source}")]
    Resolve {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("accept failed: {0}")]
    Accept(#[source] std::io::Error),
}

/// Stops a running [`Server`] from another task.
#[derive(Debug, Clone)]
pub struct ShutdownHandle {
    tx: Arc<watch::Sender<bool>>,
}

impl ShutdownHandle {
    /// Closes the listener. Connections already being served run on until
    /// their peers leave.
    pub fn shutdown(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_shutdown(&self) -> bool {
        *self.tx.borrow()
    }
}

/// Owns the listen address and the route table; spawns one task per
/// accepted connection.
pub struct Server {
    addr: SocketAddr,
    routes: SharedRoutes,
    settings: SessionSettings,
    shutdown: ShutdownHandle,
}

impl Server {
    /// Resolves `addr` up front; an unresolvable address is an error here,
    /// not at serve time.
    pub fn new(addr: &str, router: Router) -> Result<Self, ServerError> {
        let resolved = addr
            .to_socket_addrs()
            .and_then(|mut addrs| {
                addrs.next().ok_or_else(|| {
                    std::io::Error::new(std::io::ErrorKind::NotFound, "no addresses found")
                })
            })
            .map_err(|source| ServerError::Resolve {
                addr: addr.to_string(),
                source,
            })?;

        let (tx, _) = watch::channel(false);
        Ok(Self {
            addr: resolved,
            routes: router.build().into_shared(),
            settings: SessionSettings::default(),
            shutdown: ShutdownHandle { tx: Arc::new(tx) },
        })
    }

    pub fn from_config(cfg: &Config, router: Router) -> Result<Self, ServerError> {
        let mut server = Self::new(&cfg.listen_addr, router)?;
        server.settings = cfg.session_settings();
        Ok(server)
    }

    pub fn with_settings(mut self, settings: SessionSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Atomically installs a new route table. Requests already dispatched
    /// finish on the old one.
    pub fn replace_routes(&self, router: Router) {
        self.routes.store(Arc::new(router.build()));
        info!("route table replaced");
    }

    pub fn shutdown(&self) {
        info!("shutdown requested");
        self.shutdown.shutdown();
    }

    pub fn shutdown_handle(&self) -> ShutdownHandle {
        self.shutdown.clone()
    }

    /// Binds the resolved address and serves until shut down.
    pub async fn listen_and_serve(&self) -> Result<(), ServerError> {
        let listener = TcpListener::bind(self.addr)
            .await
            .map_err(|source| ServerError::Bind {
                addr: self.addr,
                source,
            })?;
        self.serve(listener).await
    }

    /// Accepts connections on `listener` until shutdown or an accept error.
    ///
    /// Never returns `Ok`: after [`Server::shutdown`] the result is
    /// [`ServerError::Closed`]. The listener is dropped, and so closed, on
    /// return.
    pub async fn serve(&self, listener: TcpListener) -> Result<(), ServerError> {
        let mut done = self.shutdown.tx.subscribe();
        if *done.borrow_and_update() {
            return Err(ServerError::Closed);
        }

        match listener.local_addr() {
            Ok(local) => info!("Listening on {}", local),
            Err(_) => info!("Listening on {}", self.addr),
        }

        loop {
            tokio::select! {
                accepted = listener.accept() => {
                    let (socket, peer) = match accepted {
                        Ok(pair) => pair,
                        Err(e) if *done.borrow() => {
                            info!("listener closed after shutdown: {}", e);
                            return Err(ServerError::Closed);
                        }
                        Err(e) => {
                            error!("accept failed: {}", e);
                            return Err(ServerError::Accept(e));
                        }
                    };
                    info!("Accepted connection from {}", peer);

                    let routes = Arc::clone(&self.routes);
                    let settings = self.settings;
                    tokio::spawn(async move {
                        let conn = Connection::new(socket, routes, settings);
                        if let Err(e) = conn.run().await {
                            tracing::warn!("Connection error from {}: {}", peer, e);
                        }
                    });
                }

                _ = done.changed() => {
                    info!("listener closed");
                    return Err(ServerError::Closed);
                }
            }
        }
    }
}
