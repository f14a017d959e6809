//! Background polling thread and its channel protocol.
//!
//! The render loop never performs I/O: a single worker thread owns the
//! [`FleetBackend`], ticks the snapshot endpoint at a fixed period, and
//! executes one-shot commands (history, tasks, admin calls) in between. All
//! results flow back as [`PollEvent`]s drained by the UI loop each frame.
//!
//! Ticks are scheduled against a deadline, so a burst of commands does not
//! starve the snapshot feed, and a tick that outlives the period simply
//! delays the next one — state application upstream is last-write-wins.
//!
//! History and task responses carry the viewing `generation` they were
//! requested under. The app compares it against the current viewing context
//! before committing, which is what makes an in-flight fetch for a
//! previously viewed vehicle harmless.

use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use crossbeam_channel::{bounded, unbounded, Receiver, RecvTimeoutError, Sender, TryRecvError};

use fleetpulse_core::{PositionSample, VehicleSnapshot};

use crate::api::{AdminUser, FleetBackend, VehicleTask};

/// Default snapshot poll period.
pub const DEFAULT_POLL_PERIOD: Duration = Duration::from_secs(2);

// ─── Protocol ───────────────────────────────────────────────────────────────

/// Commands the UI sends to the poller thread.
#[derive(Debug, Clone)]
pub enum PollCommand {
    /// Fetch the fleet snapshot immediately, resetting the tick deadline.
    FetchNow,
    /// Fetch a vehicle's backend history window.
    FetchHistory {
        /// Vehicle identifier.
        door_code: String,
        /// Viewing generation the request belongs to.
        generation: u64,
        /// Window size in minutes.
        minutes: u32,
    },
    /// Fetch a vehicle's duty list.
    FetchTasks {
        /// Vehicle identifier.
        door_code: String,
        /// Viewing generation the request belongs to.
        generation: u64,
    },
    /// List console users.
    ListUsers,
    /// Create a console user.
    AddUser {
        /// Login name.
        username: String,
        /// Initial password.
        password: String,
    },
    /// Change a user's password.
    SetPassword {
        /// Backend user id.
        id: String,
        /// New password.
        password: String,
    },
    /// Rename a user.
    Rename {
        /// Backend user id.
        id: String,
        /// New login name.
        username: String,
    },
    /// Delete a user.
    DeleteUser {
        /// Backend user id.
        id: String,
    },
    /// Stop the thread.
    Shutdown,
}

/// Results the poller thread sends back to the UI.
#[derive(Debug, Clone)]
pub enum PollEvent {
    /// A snapshot tick succeeded (possibly with an empty fleet).
    Fleet(Vec<VehicleSnapshot>),
    /// A snapshot tick failed; the next tick retries automatically.
    FleetFailed(String),
    /// A history window arrived. Commit only if `generation` still matches.
    History {
        /// Vehicle the window belongs to.
        door_code: String,
        /// Viewing generation of the originating request.
        generation: u64,
        /// Backend samples, oldest first (empty on fetch failure).
        points: Vec<PositionSample>,
    },
    /// A duty list arrived. Commit only if `generation` still matches.
    Tasks {
        /// Vehicle the list belongs to.
        door_code: String,
        /// Viewing generation of the originating request.
        generation: u64,
        /// Duties (empty when none or on failure).
        tasks: Vec<VehicleTask>,
        /// Whether the fetch failed (distinguishes "no duties" from error).
        failed: bool,
    },
    /// User list result, or an error message for the inline failure row.
    Users(Result<Vec<AdminUser>, String>),
    /// An admin mutation finished.
    AdminDone {
        /// Human-readable action label.
        action: &'static str,
        /// Backend rejection or transport error, if any.
        error: Option<String>,
    },
}

// ─── Poller ─────────────────────────────────────────────────────────────────

/// Handle owned by the UI loop. Dropping it shuts the thread down.
pub struct Poller {
    commands: Sender<PollCommand>,
    events: Receiver<PollEvent>,
    thread: Option<JoinHandle<()>>,
}

impl Poller {
    /// Spawn the polling thread over the given backend.
    #[must_use]
    pub fn spawn(backend: Box<dyn FleetBackend>, poll_period: Duration) -> Self {
        let (command_tx, command_rx) = unbounded::<PollCommand>();
        let (event_tx, event_rx) = bounded::<PollEvent>(256);

        let thread =
            std::thread::spawn(move || run_loop(&*backend, &command_rx, &event_tx, poll_period));

        Self {
            commands: command_tx,
            events: event_rx,
            thread: Some(thread),
        }
    }

    /// Queue a command. Silently ignored after shutdown.
    pub fn send(&self, command: PollCommand) {
        let _ = self.commands.send(command);
    }

    /// Drain one pending event, if any.
    #[must_use]
    pub fn try_recv(&self) -> Option<PollEvent> {
        match self.events.try_recv() {
            Ok(event) => Some(event),
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => None,
        }
    }
}

impl Drop for Poller {
    fn drop(&mut self) {
        let _ = self.commands.send(PollCommand::Shutdown);
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

fn fetch_fleet_into(
    backend: &dyn FleetBackend,
    events: &Sender<PollEvent>,
) {
    let event = match backend.fetch_fleet() {
        Ok(vehicles) => {
            tracing::debug!(target: "fleetpulse.poller", count = vehicles.len(), "fleet tick ok");
            PollEvent::Fleet(vehicles)
        }
        Err(e) => {
            tracing::warn!(target: "fleetpulse.poller", error = %e, "fleet tick failed");
            PollEvent::FleetFailed(e.to_string())
        }
    };
    let _ = events.send(event);
}

fn run_loop(
    backend: &dyn FleetBackend,
    commands: &Receiver<PollCommand>,
    events: &Sender<PollEvent>,
    poll_period: Duration,
) {
    // First tick immediately so the console is not blank for a full period.
    fetch_fleet_into(backend, events);
    let mut next_tick = Instant::now() + poll_period;

    loop {
        let timeout = next_tick.saturating_duration_since(Instant::now());
        match commands.recv_timeout(timeout) {
            Err(RecvTimeoutError::Timeout) => {
                fetch_fleet_into(backend, events);
                next_tick = Instant::now() + poll_period;
            }
            Err(RecvTimeoutError::Disconnected) | Ok(PollCommand::Shutdown) => return,
            Ok(PollCommand::FetchNow) => {
                fetch_fleet_into(backend, events);
                next_tick = Instant::now() + poll_period;
            }
            Ok(PollCommand::FetchHistory { door_code, generation, minutes }) => {
                let points = backend.fetch_history(&door_code, minutes);
                let _ = events.send(PollEvent::History { door_code, generation, points });
            }
            Ok(PollCommand::FetchTasks { door_code, generation }) => {
                let (tasks, failed) = match backend.fetch_tasks(&door_code) {
                    Ok(tasks) => (tasks, false),
                    Err(e) => {
                        tracing::warn!(target: "fleetpulse.poller", door_code, error = %e, "task fetch failed");
                        (Vec::new(), true)
                    }
                };
                let _ = events.send(PollEvent::Tasks { door_code, generation, tasks, failed });
            }
            Ok(PollCommand::ListUsers) => {
                let result = backend.list_users().map_err(|e| e.to_string());
                let _ = events.send(PollEvent::Users(result));
            }
            Ok(PollCommand::AddUser { username, password }) => {
                let error = backend.add_user(&username, &password).err().map(|e| e.to_string());
                let _ = events.send(PollEvent::AdminDone { action: "add user", error });
            }
            Ok(PollCommand::SetPassword { id, password }) => {
                let error = backend.update_password(&id, &password).err().map(|e| e.to_string());
                let _ = events.send(PollEvent::AdminDone { action: "change password", error });
            }
            Ok(PollCommand::Rename { id, username }) => {
                let error = backend.update_username(&id, &username).err().map(|e| e.to_string());
                let _ = events.send(PollEvent::AdminDone { action: "change username", error });
            }
            Ok(PollCommand::DeleteUser { id }) => {
                let error = backend.delete_user(&id).err().map(|e| e.to_string());
                let _ = events.send(PollEvent::AdminDone { action: "delete user", error });
            }
        }
    }
}
