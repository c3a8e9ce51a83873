//! Process supervisor.
//!
//! Owns the listen socket, watches termination signals and the fault channel, and walks the
//! process through `Running → Draining → Stopped`. Supervised tasks that panic stop the process
//! at once; tasks that fail with an error drain it and exit with a failure code.

use anyhow::Context;
use axum::Router;
use log::{error, info, warn};
use std::future::Future;
use std::process::ExitCode;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::signal;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{Instant, sleep_until};

/// How long in-flight requests may run after shutdown starts.
pub const GRACE_PERIOD: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fault {
    /// A supervised task panicked. Fatal, no draining.
    Panic(String),
    /// A supervised task returned an error. The process drains and exits with failure.
    Rejected(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exit {
    Success,
    Failure,
}

impl From<Exit> for ExitCode {
    fn from(exit: Exit) -> Self {
        match exit {
            Exit::Success => ExitCode::SUCCESS,
            Exit::Failure => ExitCode::FAILURE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Signal(&'static str),
    Fault(Fault),
    /// The server stopped and every connection closed.
    Drained,
    GraceExpired,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Running,
    /// Not accepting connections; holds the exit the process will report once drained.
    Draining(Exit),
    Stopped(Exit),
}

impl Phase {
    pub fn next(self, event: &Event) -> Phase {
        match (self, event) {
            (Phase::Stopped(exit), _) => Phase::Stopped(exit),
            (_, Event::Fault(Fault::Panic(_))) => Phase::Stopped(Exit::Failure),

            (Phase::Running, Event::Signal(_)) => Phase::Draining(Exit::Success),
            (Phase::Running, Event::Fault(Fault::Rejected(_))) => Phase::Draining(Exit::Failure),
            // the server is not supposed to stop on its own
            (Phase::Running, Event::Drained) => Phase::Stopped(Exit::Failure),
            (Phase::Running, Event::GraceExpired) => Phase::Running,

            (Phase::Draining(_), Event::Fault(Fault::Rejected(_))) => {
                Phase::Draining(Exit::Failure)
            }
            (Phase::Draining(exit), Event::Signal(_)) => Phase::Draining(exit),
            (Phase::Draining(exit), Event::Drained) => Phase::Stopped(exit),
            (Phase::Draining(_), Event::GraceExpired) => Phase::Stopped(Exit::Failure),
        }
    }
}

pub struct Supervisor {
    faults_tx: mpsc::UnboundedSender<Fault>,
    faults_rx: mpsc::UnboundedReceiver<Fault>,
    grace_period: Duration,
}

impl Default for Supervisor {
    fn default() -> Self {
        Self::new()
    }
}

impl Supervisor {
    pub fn new() -> Supervisor {
        let (faults_tx, faults_rx) = mpsc::unbounded_channel();
        Supervisor {
            faults_tx,
            faults_rx,
            grace_period: GRACE_PERIOD,
        }
    }

    pub fn with_grace_period(mut self, grace_period: Duration) -> Supervisor {
        self.grace_period = grace_period;
        self
    }

    /// Channel for reporting faults from outside supervised tasks.
    pub fn faults(&self) -> mpsc::UnboundedSender<Fault> {
        self.faults_tx.clone()
    }

    /// Spawns `task` and reports its panic or error on the fault channel.
    ///
    /// The returned handle completes after the outcome has been reported.
    pub fn spawn_supervised<F>(&self, name: &'static str, task: F) -> JoinHandle<()>
    where
        F: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        let faults = self.faults_tx.clone();
        let inner = tokio::spawn(task);

        tokio::spawn(async move {
            let fault = match inner.await {
                Ok(Ok(())) => return,
                Ok(Err(e)) => Fault::Rejected(format!("{name}: {e:#}")),
                Err(e) if e.is_panic() => {
                    Fault::Panic(format!("{name}: {}", panic_message(e.into_panic())))
                }
                Err(_) => return,
            };
            // the receiver lives as long as the supervisor
            let _ = faults.send(fault);
        })
    }

    /// Serves `app` on `listener` until `shutdown` resolves or a fault arrives.
    pub async fn run<S>(self, listener: TcpListener, app: Router, shutdown: S) -> Exit
    where
        S: Future<Output = &'static str>,
    {
        let (stop_tx, stop_rx) = oneshot::channel::<()>();
        let mut stop_tx = Some(stop_tx);

        let serve = axum::serve(listener, app).with_graceful_shutdown(async move {
            let _ = stop_rx.await;
        });
        let mut server = self.spawn_supervised("http server", async move {
            serve.await.context("http server failed")
        });

        let Supervisor {
            faults_tx: _faults_tx,
            mut faults_rx,
            grace_period,
        } = self;

        tokio::pin!(shutdown);
        let mut phase = Phase::Running;
        let mut deadline: Option<Instant> = None;
        let mut signalled = false;
        let mut server_done = false;

        loop {
            let event = tokio::select! {
                biased;
                Some(fault) = faults_rx.recv() => Event::Fault(fault),
                name = &mut shutdown, if !signalled => {
                    signalled = true;
                    Event::Signal(name)
                }
                _ = &mut server, if !server_done => {
                    server_done = true;
                    Event::Drained
                }
                _ = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                    Event::GraceExpired
                }
            };

            log_event(&event);

            let mut next = phase.next(&event);
            if server_done && matches!(next, Phase::Draining(_)) {
                next = next.next(&Event::Drained);
            }

            if phase == Phase::Running && matches!(next, Phase::Draining(_)) {
                info!("Shutting down gracefully...");
                if let Some(stop) = stop_tx.take() {
                    let _ = stop.send(());
                }
                deadline = Some(Instant::now() + grace_period);
            }

            phase = next;

            if let Phase::Stopped(exit) = phase {
                if event == Event::GraceExpired {
                    error!("Could not close connections in time, forcefully shutting down");
                } else if server_done {
                    info!("HTTP server closed.");
                }
                if !server_done {
                    server.abort();
                }
                return exit;
            }
        }
    }
}

fn log_event(event: &Event) {
    match event {
        Event::Signal(name) => info!("{name} received."),
        Event::Fault(Fault::Panic(msg)) => error!("UNCAUGHT PANIC! Shutting down... {msg}"),
        Event::Fault(Fault::Rejected(msg)) => error!("UNHANDLED REJECTION! Draining... {msg}"),
        Event::Drained => {}
        Event::GraceExpired => warn!("grace period expired"),
    }
}

fn panic_message(payload: Box<dyn std::any::Any + Send + 'static>) -> String {
    if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_owned()
    } else {
        "unknown panic payload".to_owned()
    }
}

/// Resolves with the signal name on Ctrl+C or (on unix) SIGTERM.
pub async fn shutdown_signal() -> &'static str {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("failed to listen for Ctrl+C: {e}");
            std::future::pending::<()>().await;
        }
        "SIGINT"
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
        "SIGTERM"
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<&'static str>();

    tokio::select! {
        name = ctrl_c => name,
        name = terminate => name,
    }
}
