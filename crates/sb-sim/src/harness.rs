//! Driving loop pairing a controller with simulated hardware.
//!
//! Time advances in fixed physics steps (100 ms by default). A message
//! exchange happens on the very first step and then once per controller
//! cycle period, whichever driving call is running: the hardware transmits,
//! the controller clocks once, the hardware acts on the answer. Physics
//! always runs before the exchange of the same step.

use serde::{Deserialize, Serialize};

use sb_control::SteamBoilerController;
use sb_core::{ControllerConfig, PhysicalCharacteristics, s};
use sb_protocol::{Mailbox, Message};

use crate::error::{SimError, SimResult};
use crate::peer::HardwarePeer;
use crate::units::PhysicalUnits;

/// Exchange schedule, in whole milliseconds to keep long runs drift-free.
///
/// Between samples the controller's commands are held (zero-order hold).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SampleClock {
    pub period_ms: u64,
    /// Time of next scheduled sample.
    pub next_sample_ms: u64,
}

impl SampleClock {
    /// Clock whose first sample is due at `initial_ms`.
    pub fn new(period_ms: u64, initial_ms: u64) -> SimResult<Self> {
        if period_ms == 0 {
            return Err(SimError::InvalidArg {
                what: "sample period must be positive",
            });
        }
        Ok(Self {
            period_ms,
            next_sample_ms: initial_ms,
        })
    }

    pub fn should_sample(&self, now_ms: u64) -> bool {
        now_ms >= self.next_sample_ms
    }

    /// Call after a sample has been taken.
    pub fn advance(&mut self) {
        self.next_sample_ms += self.period_ms;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessOptions {
    pub step_ms: u64,
    /// Capacity of both mailboxes of an exchange.
    pub mailbox_capacity: usize,
    pub record_transcript: bool,
}

impl Default for HarnessOptions {
    fn default() -> Self {
        Self {
            step_ms: 100,
            mailbox_capacity: 100,
            record_transcript: false,
        }
    }
}

/// One recorded exchange.
#[derive(Debug, Clone, PartialEq)]
pub struct Exchange {
    /// Simulated time of the exchange, after that step's physics.
    pub at_s: f64,
    /// Hardware to controller.
    pub received: Mailbox,
    /// Controller to hardware.
    pub sent: Mailbox,
}

pub struct Harness<P = PhysicalUnits> {
    controller: SteamBoilerController,
    peer: P,
    options: HarnessOptions,
    clock: SampleClock,
    elapsed_ms: u64,
    exchanges: u64,
    transcript: Vec<Exchange>,
}

impl Harness<PhysicalUnits> {
    /// A default-configured controller wired to fresh physical units.
    pub fn with_units(chars: PhysicalCharacteristics, config: ControllerConfig) -> SimResult<Self> {
        let units = PhysicalUnits::new(&chars)?;
        let controller = SteamBoilerController::new(chars, config)?;
        Self::new(controller, units, HarnessOptions::default())
    }
}

impl<P: HardwarePeer> Harness<P> {
    pub fn new(controller: SteamBoilerController, peer: P, options: HarnessOptions) -> SimResult<Self> {
        let period_ms = to_ms(controller.config().cycle_period_s)?;
        if options.step_ms == 0 || period_ms == 0 {
            return Err(SimError::InvalidArg {
                what: "step and cycle period must be positive",
            });
        }
        if options.mailbox_capacity == 0 {
            return Err(SimError::InvalidArg {
                what: "mailbox capacity must be positive",
            });
        }
        Ok(Self {
            controller,
            peer,
            options,
            clock: SampleClock::new(period_ms, 0)?,
            elapsed_ms: 0,
            exchanges: 0,
            transcript: Vec::new(),
        })
    }

    pub fn controller(&self) -> &SteamBoilerController {
        &self.controller
    }

    pub fn peer(&self) -> &P {
        &self.peer
    }

    pub fn peer_mut(&mut self) -> &mut P {
        &mut self.peer
    }

    pub fn options(&self) -> &HarnessOptions {
        &self.options
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.elapsed_ms
    }

    pub fn elapsed_s(&self) -> f64 {
        self.elapsed_ms as f64 / 1000.0
    }

    pub fn exchanges(&self) -> u64 {
        self.exchanges
    }

    pub fn transcript(&self) -> &[Exchange] {
        &self.transcript
    }

    pub fn take_transcript(&mut self) -> Vec<Exchange> {
        std::mem::take(&mut self.transcript)
    }

    pub fn sample_clock(&self) -> &SampleClock {
        &self.clock
    }

    /// Exchange messages once without advancing physics. The regular
    /// schedule is not affected.
    pub fn exchange_once(&mut self) -> SimResult<Mailbox> {
        let capacity = self.options.mailbox_capacity;
        let mut received = Mailbox::bounded(capacity);
        self.peer.transmit(&mut received)?;
        let mut sent = Mailbox::bounded(capacity);
        self.controller.clock(&received, &mut sent);
        self.peer.receive(&sent);
        self.exchanges += 1;

        tracing::trace!(
            target: "steamboiler.sim",
            t = self.elapsed_s(),
            received = %received,
            sent = %sent,
            "exchange"
        );
        if self.options.record_transcript {
            self.transcript.push(Exchange {
                at_s: self.elapsed_s(),
                received,
                sent: sent.clone(),
            });
        }
        Ok(sent)
    }

    /// Advance one physics step and exchange if one is due.
    pub fn tick(&mut self) -> SimResult<Option<Mailbox>> {
        let now = self.elapsed_ms;
        self.peer.advance(s(self.options.step_ms as f64 / 1000.0))?;
        self.elapsed_ms += self.options.step_ms;
        if self.clock.should_sample(now) {
            self.clock.advance();
            return self.exchange_once().map(Some);
        }
        Ok(None)
    }

    /// Run until an answer satisfies `matches`, failing after `timeout_s`.
    pub fn clock_until<F>(&mut self, timeout_s: f64, mut matches: F) -> SimResult<Mailbox>
    where
        F: FnMut(&Mailbox) -> bool,
    {
        let limit = self.elapsed_ms + to_ms(timeout_s)?;
        while self.elapsed_ms < limit {
            if let Some(sent) = self.tick()? {
                if matches(&sent) {
                    return Ok(sent);
                }
            }
        }
        Err(SimError::Timeout {
            what: "expected controller answer".to_string(),
            after_s: timeout_s,
        })
    }

    /// Run for `duration_s`, failing as soon as an answer satisfies `matches`.
    pub fn clock_for_without<F>(&mut self, duration_s: f64, mut matches: F) -> SimResult<()>
    where
        F: FnMut(&Mailbox) -> bool,
    {
        let limit = self.elapsed_ms + to_ms(duration_s)?;
        while self.elapsed_ms < limit {
            if let Some(sent) = self.tick()? {
                if matches(&sent) {
                    return Err(SimError::UnexpectedEvent {
                        at_s: self.elapsed_s(),
                        mailbox: sent.to_string(),
                    });
                }
            }
        }
        Ok(())
    }

    pub fn clock_for(&mut self, duration_s: f64) -> SimResult<()> {
        self.clock_for_without(duration_s, |_| false)
    }
}

/// Matches answers that contain every message in `expected`.
pub fn atleast(expected: &[Message]) -> impl Fn(&Mailbox) -> bool + '_ {
    move |mb: &Mailbox| expected.iter().all(|m| mb.contains(m))
}

/// Matches answers made of exactly `expected`, in any order.
pub fn exactly(expected: &[Message]) -> impl Fn(&Mailbox) -> bool + '_ {
    move |mb: &Mailbox| mb.len() == expected.len() && expected.iter().all(|m| mb.contains(m))
}

pub(crate) fn to_ms(seconds: f64) -> SimResult<u64> {
    if !(seconds.is_finite() && seconds >= 0.0) {
        return Err(SimError::InvalidArg {
            what: "duration must be finite and non-negative",
        });
    }
    Ok((seconds * 1000.0).round() as u64)
}
