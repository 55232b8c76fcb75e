//! R-Time 8 real-time clock cartridge.
//!
//! The clock sits at $D5B8/$D5B9 and talks four bits at a time. A write
//! selects a register, then two more writes store its high and low
//! nibbles. Reads return 0 while idle, then the high and low nibbles of
//! the selected register.

use std::time::{SystemTime, UNIX_EPOCH};

use log::trace;
use serde::{Deserialize, Serialize};

/// Calendar time as the clock chip stores it.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ClockTime {
    pub second: u8,
    pub minute: u8,
    pub hour: u8,
    /// 1-31.
    pub day: u8,
    /// 1-12.
    pub month: u8,
    pub year: u32,
    /// 0 = Sunday.
    pub weekday: u8,
}

/// Where the clock gets the time from.
pub trait ClockSource {
    fn now(&self) -> ClockTime;
}

/// The host clock, in UTC.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl ClockSource for SystemClock {
    fn now(&self) -> ClockTime {
        let secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();
        clock_time_from_unix(secs)
    }
}

/// Break seconds since 1970-01-01T00:00Z into calendar fields.
#[must_use]
pub fn clock_time_from_unix(secs: u64) -> ClockTime {
    let days = secs / 86_400;
    let rem = secs % 86_400;
    // Civil-from-days over 400-year eras starting 0000-03-01.
    let z = days as i64 + 719_468;
    let era = z.div_euclid(146_097);
    let doe = z.rem_euclid(146_097);
    let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = doy - (153 * mp + 2) / 5 + 1;
    let month = if mp < 10 { mp + 3 } else { mp - 9 };
    let year = yoe + era * 400 + i64::from(month <= 2);
    ClockTime {
        second: (rem % 60) as u8,
        minute: (rem / 60 % 60) as u8,
        hour: (rem / 3600) as u8,
        day: day as u8,
        month: month as u8,
        year: year as u32,
        // 1970-01-01 was a Thursday.
        weekday: ((days + 4) % 7) as u8,
    }
}

fn bcd(value: u32) -> u8 {
    let value = value % 100;
    ((value / 10) << 4 | value % 10) as u8
}

/// Protocol state, saved with the cartridge.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RTimeState {
    pub regs: [u8; 16],
    pub phase: u8,
    pub select: u8,
    pub latch: u8,
}

pub struct RTime8 {
    state: RTimeState,
    clock: Box<dyn ClockSource>,
}

impl std::fmt::Debug for RTime8 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RTime8").field("state", &self.state).finish_non_exhaustive()
    }
}

impl Default for RTime8 {
    fn default() -> Self {
        Self::new(Box::new(SystemClock))
    }
}

impl RTime8 {
    #[must_use]
    pub fn new(clock: Box<dyn ClockSource>) -> Self {
        Self {
            state: RTimeState::default(),
            clock,
        }
    }

    /// Reload registers 0-6 from the clock source.
    fn refresh(&mut self) {
        let now = self.clock.now();
        let regs = &mut self.state.regs;
        regs[0] = bcd(u32::from(now.second));
        regs[1] = bcd(u32::from(now.minute));
        regs[2] = bcd(u32::from(now.hour));
        regs[3] = bcd(u32::from(now.day));
        regs[4] = bcd(u32::from(now.month));
        regs[5] = bcd(now.year);
        regs[6] = bcd(u32::from((now.weekday + 2) % 7 + 1));
    }

    pub fn read(&mut self) -> u8 {
        self.refresh();
        let reg = self.state.regs[usize::from(self.state.select)];
        match self.state.phase {
            1 => {
                self.state.phase = 2;
                reg >> 4
            }
            2 => {
                self.state.phase = 0;
                reg & 0x0F
            }
            _ => 0,
        }
    }

    pub fn write(&mut self, value: u8) {
        match self.state.phase {
            0 => {
                self.state.select = value & 0x0F;
                self.state.phase = 1;
            }
            1 => {
                self.state.latch = value << 4;
                self.state.phase = 2;
            }
            _ => {
                let reg = self.state.latch | value;
                trace!("R-Time 8 register {} = ${reg:02X}", self.state.select);
                self.state.regs[usize::from(self.state.select)] = reg;
                self.state.phase = 0;
            }
        }
    }

    #[must_use]
    pub fn state(&self) -> RTimeState {
        self.state
    }

    pub fn restore(&mut self, state: RTimeState) {
        self.state = RTimeState {
            select: state.select & 0x0F,
            phase: state.phase.min(2),
            ..state
        };
    }
}
