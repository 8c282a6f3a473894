//! Scheduler configuration
//!
//! Table capacities, MLFQ level parameters and stride constants. The defaults
//! reproduce the classic teaching-kernel setup: three levels with 5/10/20 tick
//! quanta, a 100-ticket budget of which at most 80 can be handed out as fixed
//! shares.

use super::core::error::{SchedulerError, SchedulerResult};

/// Discrete time unit used for every elapsed-time computation
pub type Tick = u64;

/// Upper bound on the number of MLFQ levels a configuration may declare
pub const MAX_LEVELS: usize = 8;

/// Fixed-point scale of stride pass values (virtual-time units per tick).
///
/// Strides are `budget * PASS_SCALE / tickets`, so shares that do not divide
/// the budget still advance at the right relative speed.
pub const PASS_SCALE: i64 = 1 << 16;

/// Default ceiling above which pass values are rebased
pub const DEFAULT_MAX_PASS: i64 = 1 << 40;

/// Default value the charged participant lands near after a rebase
pub const DEFAULT_REBASE_FLOOR: i64 = 1 << 24;

/// Scheduler configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedConfig {
    /// Process table capacity (also the capacity of every MLFQ level and of
    /// the stride table)
    pub nproc: usize,
    /// Thread slots per process
    pub nthread: usize,
    /// Number of CPUs running a driver loop
    pub ncpu: usize,
    /// Number of MLFQ levels in use (`<= MAX_LEVELS`)
    pub levels: usize,
    /// Round-robin quantum per level, in ticks
    pub quantum: [Tick; MAX_LEVELS],
    /// Cumulative ticks at a level before promotion to the next one
    pub expire: [Tick; MAX_LEVELS],
    /// Total stride tickets, including the MLFQ's residual share
    pub ticket_budget: u32,
    /// Largest total share that may be handed out to stride processes
    pub max_share: u32,
    /// Quantum of a stride-owned process, in ticks
    pub stride_quantum: Tick,
    /// Pass ceiling that triggers a rebase
    pub max_pass: i64,
    /// Where the charged participant lands after a rebase
    pub rebase_floor: i64,
}

impl SchedConfig {
    pub const DEFAULT: Self = Self {
        nproc: 64,
        nthread: 8,
        ncpu: 8,
        levels: 3,
        quantum: [5, 10, 20, 0, 0, 0, 0, 0],
        expire: [20, 40, 200, 0, 0, 0, 0, 0],
        ticket_budget: 100,
        max_share: 80,
        stride_quantum: 5,
        max_pass: DEFAULT_MAX_PASS,
        rebase_floor: DEFAULT_REBASE_FLOOR,
    };

    /// Replace the level table.
    ///
    /// `quantum` and `expire` must have the same, non-zero length of at most
    /// `MAX_LEVELS`.
    pub fn with_levels(mut self, quantum: &[Tick], expire: &[Tick]) -> SchedulerResult<Self> {
        if quantum.len() != expire.len() {
            return Err(SchedulerError::InvalidConfig {
                reason: "quantum and expire tables differ in length",
            });
        }
        if quantum.is_empty() || quantum.len() > MAX_LEVELS {
            return Err(SchedulerError::InvalidConfig {
                reason: "level count out of range",
            });
        }

        self.levels = quantum.len();
        self.quantum = [0; MAX_LEVELS];
        self.expire = [0; MAX_LEVELS];
        self.quantum[..quantum.len()].copy_from_slice(quantum);
        self.expire[..expire.len()].copy_from_slice(expire);
        self.validate()?;
        Ok(self)
    }

    /// Quantum slice of the levels in use
    pub fn quanta(&self) -> &[Tick] {
        &self.quantum[..self.levels]
    }

    /// Expire slice of the levels in use
    pub fn expires(&self) -> &[Tick] {
        &self.expire[..self.levels]
    }

    /// Ticks between two priority boosts (the lowest level's expire time)
    pub fn boost_interval(&self) -> Tick {
        self.expire[self.levels - 1]
    }

    /// Stride of a single-ticket share, the largest a charge can add
    pub fn max_stride(&self) -> i64 {
        self.ticket_budget as i64 * PASS_SCALE
    }

    /// Check the configuration for values the tables cannot work with.
    pub fn validate(&self) -> SchedulerResult<()> {
        let reason = if self.nproc == 0 {
            "nproc must be positive"
        } else if self.nthread == 0 {
            "nthread must be positive"
        } else if self.ncpu == 0 {
            "ncpu must be positive"
        } else if self.levels == 0 || self.levels > MAX_LEVELS {
            "level count out of range"
        } else if self.quanta().iter().any(|&q| q == 0) {
            "every level needs a non-zero quantum"
        } else if self.boost_interval() == 0 {
            "lowest level needs a non-zero expire time"
        } else if self.ticket_budget == 0 {
            "ticket budget must be positive"
        } else if self.max_share >= self.ticket_budget {
            "max_share must leave tickets for the MLFQ"
        } else if self.rebase_floor < 0 || self.rebase_floor >= self.max_pass {
            "rebase floor must lie below the pass ceiling"
        } else if self.max_pass > i64::MAX - self.max_stride() {
            "pass ceiling leaves no room for one stride"
        } else {
            return Ok(());
        };

        Err(SchedulerError::InvalidConfig { reason })
    }
}

impl Default for SchedConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use static_assertions::const_assert;

    const_assert!(DEFAULT_REBASE_FLOOR < DEFAULT_MAX_PASS);
    const_assert!(SchedConfig::DEFAULT.max_share < SchedConfig::DEFAULT.ticket_budget);
    const_assert!(SchedConfig::DEFAULT.levels <= MAX_LEVELS);

    #[test]
    fn test_default_is_valid() {
        let config = SchedConfig::default();
        assert_eq!(config.validate(), Ok(()));
        assert_eq!(config.quanta(), &[5, 10, 20]);
        assert_eq!(config.expires(), &[20, 40, 200]);
        assert_eq!(config.boost_interval(), 200);
    }

    #[test]
    fn test_with_levels() {
        let config = SchedConfig::DEFAULT.with_levels(&[1, 2], &[5, 50]).unwrap();
        assert_eq!(config.levels, 2);
        assert_eq!(config.boost_interval(), 50);
        assert_eq!(config.quantum[2], 0);
    }

    #[test]
    fn test_with_levels_rejects_mismatch() {
        assert!(matches!(
            SchedConfig::DEFAULT.with_levels(&[1, 2], &[5]),
            Err(SchedulerError::InvalidConfig { .. })
        ));
        assert!(SchedConfig::DEFAULT.with_levels(&[], &[]).is_err());
    }

    #[test]
    fn test_share_must_leave_mlfq_tickets() {
        let config = SchedConfig {
            max_share: 100,
            ..SchedConfig::DEFAULT
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_pass_ceiling_leaves_room_for_a_charge() {
        let room = SchedConfig::DEFAULT.max_stride();
        assert_eq!(room, 100 * PASS_SCALE);

        let highest = SchedConfig {
            max_pass: i64::MAX - room,
            ..SchedConfig::DEFAULT
        };
        assert_eq!(highest.validate(), Ok(()));

        let too_high = SchedConfig {
            max_pass: i64::MAX - room + 1,
            ..SchedConfig::DEFAULT
        };
        assert_eq!(
            too_high.validate(),
            Err(SchedulerError::InvalidConfig {
                reason: "pass ceiling leaves no room for one stride"
            })
        );
    }
}
