/// Background timer service and the host clients bind through
///
/// The service is a tokio task that owns a `Stopwatch`, ticks it every
/// 100 ms while running and publishes elapsed time and the running flag on
/// watch channels. Clients never own the task: they bind to the
/// `ServiceHost`, receive a `TimerHandle` (commands in, state out) and unbind
/// when done. The task outlives its clients while a session is running or
/// paused, and shuts down once it has been stopped and nobody is bound.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures::future::OptionFuture;
use tokio::sync::{mpsc, watch};
use tokio::time::{Instant, Interval, MissedTickBehavior};
use tracing::{debug, info};

use crate::timer::format_elapsed;
use crate::timer::indicator::{Indicator, Notification, NOTIFICATION_ID, TIMER_CHANNEL};
use crate::timer::session::{SessionState, Stopwatch};

/// How often a running session republishes its elapsed time
pub const TICK_PERIOD: Duration = Duration::from_millis(100);

/// Label used when a session is started without one
pub const DEFAULT_SESSION_LABEL: &str = "Habit";

/// Messages a client can send to the service
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimerCommand {
    Start { label: String },
    Pause,
    Stop,
    Reset,
    /// The last binding was released
    Unbound,
}

/// A client's view of one running service instance
#[derive(Debug, Clone)]
pub struct TimerHandle {
    commands: mpsc::UnboundedSender<TimerCommand>,
    elapsed: watch::Receiver<u64>,
    running: watch::Receiver<bool>,
    bindings: Arc<AtomicUsize>,
}

impl TimerHandle {
    fn send(&self, command: TimerCommand) -> bool {
        self.commands.send(command).is_ok()
    }

    /// Start or resume; ignored by the service when already running
    pub fn start(&self, label: &str) -> bool {
        self.send(TimerCommand::Start { label: label.to_string() })
    }

    pub fn pause(&self) -> bool {
        self.send(TimerCommand::Pause)
    }

    pub fn stop(&self) -> bool {
        self.send(TimerCommand::Stop)
    }

    pub fn reset(&self) -> bool {
        self.send(TimerCommand::Reset)
    }

    /// Latest published elapsed time in milliseconds
    pub fn elapsed_ms(&self) -> u64 {
        *self.elapsed.borrow()
    }

    pub fn is_running(&self) -> bool {
        *self.running.borrow()
    }

    pub fn subscribe_elapsed(&self) -> watch::Receiver<u64> {
        self.elapsed.clone()
    }

    pub fn subscribe_running(&self) -> watch::Receiver<bool> {
        self.running.clone()
    }

    /// Whether the service task behind this handle has exited
    pub fn is_closed(&self) -> bool {
        self.commands.is_closed()
    }
}

/// A client's claim on the service
///
/// Released by `unbind` or on drop. Releasing never stops a session.
#[derive(Debug)]
pub struct Binding {
    handle: TimerHandle,
    released: bool,
}

impl Binding {
    pub fn handle(&self) -> &TimerHandle {
        &self.handle
    }

    pub fn unbind(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        if self.handle.bindings.fetch_sub(1, Ordering::SeqCst) == 1 {
            let _ = self.handle.commands.send(TimerCommand::Unbound);
        }
    }
}

impl Drop for Binding {
    fn drop(&mut self) {
        self.release();
    }
}

/// Owner of the (at most one) live timer service
pub struct ServiceHost {
    indicator: Arc<dyn Indicator>,
    current: Mutex<Option<TimerHandle>>,
}

impl ServiceHost {
    pub fn new(indicator: Arc<dyn Indicator>) -> Self {
        Self {
            indicator,
            current: Mutex::new(None),
        }
    }

    /// Bind to the live service
    ///
    /// With `auto_create` a new service is spawned when none is alive;
    /// without it `None` is returned instead. Must be called from within a
    /// tokio runtime.
    pub fn bind(&self, auto_create: bool) -> Option<Binding> {
        let mut current = self.current.lock().ok()?;

        let alive = current.as_ref().filter(|handle| !handle.is_closed()).cloned();
        let handle = match alive {
            Some(handle) => handle,
            None if auto_create => {
                let handle = spawn_service(self.indicator.clone());
                *current = Some(handle.clone());
                handle
            }
            None => return None,
        };

        handle.bindings.fetch_add(1, Ordering::SeqCst);
        debug!("Bound to timer service ({} bindings)", handle.bindings.load(Ordering::SeqCst));
        Some(Binding {
            handle,
            released: false,
        })
    }

    /// Whether a service task is currently alive
    pub fn is_alive(&self) -> bool {
        self.current
            .lock()
            .map(|current| current.as_ref().map_or(false, |h| !h.is_closed()))
            .unwrap_or(false)
    }
}

fn spawn_service(indicator: Arc<dyn Indicator>) -> TimerHandle {
    let (commands, command_rx) = mpsc::unbounded_channel();
    let (elapsed_tx, elapsed) = watch::channel(0u64);
    let (running_tx, running) = watch::channel(false);
    let bindings = Arc::new(AtomicUsize::new(0));

    indicator.ensure_channel(&TIMER_CHANNEL);

    let service = TimerService {
        stopwatch: Stopwatch::new(),
        indicator,
        elapsed: elapsed_tx,
        running: running_tx,
        bindings: bindings.clone(),
        foreground: false,
    };
    tokio::spawn(service.run(command_rx));
    info!("Timer service created");

    TimerHandle {
        commands,
        elapsed,
        running,
        bindings,
    }
}

enum Event {
    Command(Option<TimerCommand>),
    Tick,
}

enum Flow {
    Continue,
    Exit,
}

struct TimerService {
    stopwatch: Stopwatch,
    indicator: Arc<dyn Indicator>,
    elapsed: watch::Sender<u64>,
    running: watch::Sender<bool>,
    bindings: Arc<AtomicUsize>,
    /// Whether the ongoing notification is posted
    foreground: bool,
}

impl TimerService {
    async fn run(mut self, mut commands: mpsc::UnboundedReceiver<TimerCommand>) {
        let mut ticker: Option<Interval> = None;

        loop {
            let event = tokio::select! {
                command = commands.recv() => Event::Command(command),
                Some(_) = OptionFuture::from(ticker.as_mut().map(|t| t.tick())) => Event::Tick,
            };

            match event {
                Event::Tick => self.on_tick(),
                Event::Command(None) => break,
                Event::Command(Some(command)) => {
                    if let Flow::Exit = self.on_command(command, &mut ticker) {
                        break;
                    }
                }
            }
        }

        if self.foreground {
            self.indicator.cancel(NOTIFICATION_ID);
        }
        info!("Timer service destroyed");
    }

    fn on_tick(&mut self) {
        let elapsed = self.stopwatch.tick(Instant::now());
        let millis = elapsed.as_millis() as u64;
        self.elapsed.send_replace(millis);
        self.indicator
            .post(&Notification::timer(format!("Elapsed: {}", format_elapsed(millis))));
    }

    fn on_command(&mut self, command: TimerCommand, ticker: &mut Option<Interval>) -> Flow {
        match command {
            TimerCommand::Start { label } => {
                if !self.stopwatch.start(Instant::now()) {
                    debug!("Start ignored, session already running");
                    return Flow::Continue;
                }
                self.running.send_replace(true);
                self.foreground = true;
                self.indicator.post(&Notification::timer(format!("Timing: {}", label)));

                let mut interval = tokio::time::interval(TICK_PERIOD);
                interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
                *ticker = Some(interval);
                info!("Session started: {}", label);
            }
            TimerCommand::Pause => {
                if self.stopwatch.pause() {
                    *ticker = None;
                    self.running.send_replace(false);
                    self.indicator.post(&Notification::timer("Paused"));
                    info!("Session paused at {}", format_elapsed(self.stopwatch.elapsed_ms()));
                }
            }
            TimerCommand::Stop => {
                *ticker = None;
                self.stopwatch.stop();
                self.running.send_replace(false);
                if self.foreground {
                    self.indicator.cancel(NOTIFICATION_ID);
                    self.foreground = false;
                }
                info!("Session stopped at {}", format_elapsed(self.stopwatch.elapsed_ms()));
                if self.bindings.load(Ordering::SeqCst) == 0 {
                    return Flow::Exit;
                }
            }
            TimerCommand::Reset => {
                self.stopwatch.reset(Instant::now());
                self.elapsed.send_replace(0);
                debug!("Session reset");
            }
            TimerCommand::Unbound => {
                if self.bindings.load(Ordering::SeqCst) == 0 && !self.stopwatch.is_active() {
                    return Flow::Exit;
                }
                if self.stopwatch.state() != SessionState::Idle {
                    debug!("Last client left, session continues headless");
                }
            }
        }
        Flow::Continue
    }
}
