//! Idle detection for wheel zooming.
//!
//! Wheel events have no "end" event, so the renderer schedules a timeout
//! after each one and settles when it fires. Each schedule cancels the
//! previous one. Timeouts are posted to the session's control channel and
//! tagged with a generation number; a timeout whose generation is no longer
//! current is ignored by the receiver.

use std::io;
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::{unbounded, RecvTimeoutError, Sender};
use log::debug;

use crate::session::ControlEvent;

enum TimerCommand {
    Schedule { generation: u64, deadline: Instant },
    Cancel,
}

/// Cancellable one-shot timer running on its own thread.
///
/// The thread exits when the timer is dropped.
#[derive(Debug)]
pub struct IdleTimer {
    delay: Duration,
    commands: Sender<TimerCommand>,
    generation: u64,
}

impl IdleTimer {
    /// Start the timer thread. Timeouts are sent to `events`.
    pub fn new(delay: Duration, events: Sender<ControlEvent>) -> io::Result<Self> {
        let (commands, rx) = unbounded::<TimerCommand>();

        thread::Builder::new()
            .name("idle-timer".to_string())
            .spawn(move || {
                let mut pending: Option<(u64, Instant)> = None;
                loop {
                    let command = match pending {
                        Some((generation, deadline)) => match rx.recv_deadline(deadline) {
                            Ok(command) => command,
                            Err(RecvTimeoutError::Timeout) => {
                                pending = None;
                                if events.send(ControlEvent::IdleTimeout { generation }).is_err() {
                                    break;
                                }
                                continue;
                            }
                            Err(RecvTimeoutError::Disconnected) => break,
                        },
                        None => match rx.recv() {
                            Ok(command) => command,
                            Err(_) => break,
                        },
                    };
                    pending = match command {
                        TimerCommand::Schedule {
                            generation,
                            deadline,
                        } => Some((generation, deadline)),
                        TimerCommand::Cancel => None,
                    };
                }
                debug!("Idle timer stopped");
            })?;

        Ok(Self {
            delay,
            commands,
            generation: 0,
        })
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Generation of the most recent schedule.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Replace any pending timeout with a new one `delay` from now.
    pub fn schedule(&mut self) -> u64 {
        self.generation += 1;
        let command = TimerCommand::Schedule {
            generation: self.generation,
            deadline: Instant::now() + self.delay,
        };
        if self.commands.send(command).is_err() {
            debug!("Idle timer thread is gone; timeout {} dropped", self.generation);
        }
        self.generation
    }

    /// Drop any pending timeout.
    pub fn cancel(&mut self) {
        self.generation += 1;
        let _ = self.commands.send(TimerCommand::Cancel);
    }

    /// True if `generation` belongs to the latest schedule.
    pub fn is_current(&self, generation: u64) -> bool {
        generation == self.generation
    }
}
