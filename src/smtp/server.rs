//! SMTP server implementation

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use crate::smtp::config::Configuration;
use crate::smtp::error::SmtpError;
use crate::smtp::logging::{self, Logger};
use crate::smtp::message::Message;
use crate::smtp::message_list::{MessageList, MessageSink};
use crate::smtp::session::Session;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Status {
    Stopped,
    Starting,
    Running,
    Stopping,
}

#[derive(Debug)]
struct ServerState {
    status: Status,
    port_number: u16,
    shutdown: CancellationToken,
    tracker: TaskTracker,
    sink: Option<MessageSink>,
}

impl ServerState {
    fn stopped(port_number: u16) -> Self {
        Self {
            status: Status::Stopped,
            port_number,
            shutdown: CancellationToken::new(),
            tracker: TaskTracker::new(),
            sink: None,
        }
    }
}

/// Mock SMTP server that records every client dialogue.
///
/// ```rust,no_run
/// use smtp_mock::{Configuration, Server};
///
/// # async fn run() -> Result<(), smtp_mock::SmtpError> {
/// let server = Server::new(Configuration::default());
/// server.start().await?;
///
/// // Point the code under test at 127.0.0.1:{server.port_number()}
///
/// server.stop().await?;
/// for message in server.messages() {
///     println!("{:?}", message.helo_domain());
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Server {
    config: Arc<Configuration>,
    messages: MessageList,
    logger: Logger,
    state: Mutex<ServerState>,
}

impl Server {
    /// Create a server. Installs the stdout subscriber when
    /// `log_to_stdout` is set.
    pub fn new(config: Configuration) -> Self {
        if config.log_to_stdout {
            logging::init();
        }

        Self {
            logger: Logger::new(config.log_server_activity),
            config: Arc::new(config),
            messages: MessageList::new(),
            state: Mutex::new(ServerState::stopped(0)),
        }
    }

    /// Bind the listener and start accepting connections in the background.
    /// Must be called from within a tokio runtime.
    pub async fn start(&self) -> Result<(), SmtpError> {
        {
            let mut state = self.lock();
            if state.status != Status::Stopped {
                return Err(SmtpError::AlreadyStarted);
            }
            state.status = Status::Starting;
        }

        let (listener, port_number) = match self.bind().await {
            Ok(bound) => bound,
            Err(err) => {
                self.logger.error(&format!("Failed to start server: {err}"));
                self.lock().status = Status::Stopped;
                return Err(err);
            }
        };

        let shutdown = CancellationToken::new();
        let tracker = TaskTracker::new();
        let sink = self.messages.spawn_writer();

        tracker.spawn(accept_loop(
            listener,
            Arc::clone(&self.config),
            sink.clone(),
            shutdown.clone(),
            tracker.clone(),
            self.logger,
        ));

        *self.lock() = ServerState {
            status: Status::Running,
            port_number,
            shutdown,
            tracker,
            sink: Some(sink),
        };

        self.logger
            .info_activity(&format!("SMTP mock server started on port {port_number}"));
        Ok(())
    }

    async fn bind(&self) -> Result<(TcpListener, u16), SmtpError> {
        let address = self.config.bind_address();
        let listener = TcpListener::bind(&address)
            .await
            .map_err(|source| SmtpError::Bind {
                address: address.clone(),
                source,
            })?;
        let port_number = listener.local_addr()?.port();

        Ok((listener, port_number))
    }

    /// Stop accepting connections and wait for running sessions, at most
    /// `shutdown_timeout`. Sessions still running after that are abandoned.
    pub async fn stop(&self) -> Result<(), SmtpError> {
        let tracker = {
            let mut state = self.lock();
            if state.status != Status::Running {
                return Err(SmtpError::NotStarted);
            }
            state.status = Status::Stopping;

            if let Some(sink) = state.sink.take() {
                sink.stop();
            }
            state.shutdown.cancel();
            state.tracker.close();
            state.tracker.clone()
        };

        let graceful = tokio::time::timeout(self.config.shutdown_timeout, tracker.wait())
            .await
            .is_ok();

        let port_number = {
            let mut state = self.lock();
            state.status = Status::Stopped;
            state.port_number
        };

        if graceful {
            self.logger
                .info_activity(&format!("SMTP mock server stopped on port {port_number}"));
        } else {
            self.logger.info_activity(&format!(
                "SMTP mock server forced to stop on port {port_number}"
            ));
        }

        Ok(())
    }

    /// Port the server listens on (the last one after a stop), `0` before the
    /// first start
    pub fn port_number(&self) -> u16 {
        self.lock().port_number
    }

    pub fn is_started(&self) -> bool {
        self.lock().status == Status::Running
    }

    /// Snapshot of every record appended so far, in arrival order
    pub fn messages(&self) -> Vec<Message> {
        self.messages.messages()
    }

    pub fn configuration(&self) -> &Configuration {
        &self.config
    }

    fn lock(&self) -> MutexGuard<'_, ServerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for Server {
    fn drop(&mut self) {
        let state = self.state.get_mut().unwrap_or_else(PoisonError::into_inner);

        if let Some(sink) = state.sink.take() {
            sink.stop();
        }
        state.shutdown.cancel();
    }
}

async fn accept_loop(
    listener: TcpListener,
    config: Arc<Configuration>,
    sink: MessageSink,
    shutdown: CancellationToken,
    tracker: TaskTracker,
    logger: Logger,
) {
    while !shutdown.is_cancelled() {
        let accepted = tokio::select! {
            () = shutdown.cancelled() => break,
            accepted = listener.accept() => accepted,
        };

        let (stream, peer) = match accepted {
            Ok(connection) => connection,
            Err(err) => {
                if !shutdown.is_cancelled() {
                    logger.warning(&format!("Unable to accept new connections: {err}"));
                }
                break;
            }
        };

        logger.info_activity(&format!("{peer}: session start"));

        let session = Session::new(stream, peer.to_string(), Arc::clone(&config), logger);
        let sink = sink.clone();
        let shutdown = shutdown.clone();
        tracker.spawn(async move {
            session.run(&sink, &shutdown).await;
        });
    }
}
