//! Per-step synchronization protocol.
//!
//! Every sliding-window step of a warp walks the same phases:
//!
//! ```text
//!   Prefetch -> Barrier -> Compute -> Writeback -> Advance -> Prefetch ...
//!                            |
//!                            +-- east/west/south/north reconvergence
//! ```
//!
//! Shared-memory writes happen only in `Prefetch`, shared-memory reads only
//! in `Compute`, and the block barrier separates the two. `Compute` must
//! pass one reconvergence point per direction, in order, before the result
//! may be written back.

use std::fmt;

use tilestencil_core::{Result, StencilError};
use tracing::trace;

use crate::halo::Direction;

/// Phase of a sliding-window step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StepPhase {
    /// Before the first step.
    Idle,
    /// Tile refresh and leading-edge prefetch.
    Prefetch,
    /// Block-wide barrier.
    Barrier,
    /// Neighbour gathering with per-direction reconvergence.
    Compute,
    /// Result store to the output grid.
    Writeback,
    /// Window origin moves one lane-width to the right.
    Advance,
}

impl StepPhase {
    /// Phase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            StepPhase::Idle => "Idle",
            StepPhase::Prefetch => "Prefetch",
            StepPhase::Barrier => "Barrier",
            StepPhase::Compute => "Compute",
            StepPhase::Writeback => "Writeback",
            StepPhase::Advance => "Advance",
        }
    }

    /// The only phase allowed to follow this one.
    pub fn successor(&self) -> StepPhase {
        match self {
            StepPhase::Idle | StepPhase::Advance => StepPhase::Prefetch,
            StepPhase::Prefetch => StepPhase::Barrier,
            StepPhase::Barrier => StepPhase::Compute,
            StepPhase::Compute => StepPhase::Writeback,
            StepPhase::Writeback => StepPhase::Advance,
        }
    }
}

impl fmt::Display for StepPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tracks one warp's position in the step state machine.
#[derive(Debug, Clone)]
pub struct StepProtocol {
    phase: StepPhase,
    reconverged: usize,
    steps: usize,
}

impl Default for StepProtocol {
    fn default() -> Self {
        Self::new()
    }
}

impl StepProtocol {
    /// Start in [`StepPhase::Idle`].
    pub fn new() -> Self {
        Self {
            phase: StepPhase::Idle,
            reconverged: 0,
            steps: 0,
        }
    }

    /// Current phase.
    pub fn phase(&self) -> StepPhase {
        self.phase
    }

    /// Steps started so far.
    pub fn steps(&self) -> usize {
        self.steps
    }

    /// Move to `next`, which must be the successor of the current phase.
    /// Leaving `Compute` additionally requires all four reconvergence points.
    pub fn enter(&mut self, next: StepPhase) -> Result<()> {
        let legal = self.phase.successor() == next
            && (self.phase != StepPhase::Compute || self.reconverged == Direction::ALL.len());
        if !legal {
            return Err(self.violation(next.as_str()));
        }
        if next == StepPhase::Prefetch {
            self.steps += 1;
        }
        if next == StepPhase::Compute {
            self.reconverged = 0;
        }
        trace!(step = self.steps, from = %self.phase, to = %next, "step phase");
        self.phase = next;
        Ok(())
    }

    /// Record the reconvergence point after the branch for `dir`.
    pub fn reconverged(&mut self, dir: Direction) -> Result<()> {
        let expected = Direction::ALL.get(self.reconverged).copied();
        if self.phase != StepPhase::Compute || expected != Some(dir) {
            return Err(self.violation(dir.as_str()));
        }
        self.reconverged += 1;
        Ok(())
    }

    /// Check that the warp stopped at a step boundary.
    pub fn finish(&self) -> Result<()> {
        match self.phase {
            StepPhase::Advance => Ok(()),
            _ => Err(self.violation("Done")),
        }
    }

    fn violation(&self, to: &'static str) -> StencilError {
        StencilError::ProtocolViolation {
            from: self.phase.as_str(),
            to,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_step(protocol: &mut StepProtocol) -> Result<()> {
        protocol.enter(StepPhase::Prefetch)?;
        protocol.enter(StepPhase::Barrier)?;
        protocol.enter(StepPhase::Compute)?;
        for dir in Direction::ALL {
            protocol.reconverged(dir)?;
        }
        protocol.enter(StepPhase::Writeback)?;
        protocol.enter(StepPhase::Advance)
    }

    #[test]
    fn test_full_steps() {
        let mut protocol = StepProtocol::new();
        for _ in 0..3 {
            run_step(&mut protocol).unwrap();
        }
        assert_eq!(protocol.steps(), 3);
        assert!(protocol.finish().is_ok());
    }

    #[test]
    fn test_compute_before_barrier_rejected() {
        let mut protocol = StepProtocol::new();
        protocol.enter(StepPhase::Prefetch).unwrap();
        assert_eq!(
            protocol.enter(StepPhase::Compute),
            Err(StencilError::ProtocolViolation {
                from: "Prefetch",
                to: "Compute"
            })
        );
    }

    #[test]
    fn test_writeback_needs_all_reconvergence_points() {
        let mut protocol = StepProtocol::new();
        protocol.enter(StepPhase::Prefetch).unwrap();
        protocol.enter(StepPhase::Barrier).unwrap();
        protocol.enter(StepPhase::Compute).unwrap();
        protocol.reconverged(Direction::East).unwrap();
        protocol.reconverged(Direction::West).unwrap();
        protocol.reconverged(Direction::South).unwrap();
        assert!(protocol.enter(StepPhase::Writeback).is_err());
        protocol.reconverged(Direction::North).unwrap();
        assert!(protocol.enter(StepPhase::Writeback).is_ok());
    }

    #[test]
    fn test_reconvergence_order_enforced() {
        let mut protocol = StepProtocol::new();
        assert!(protocol.reconverged(Direction::East).is_err());

        protocol.enter(StepPhase::Prefetch).unwrap();
        protocol.enter(StepPhase::Barrier).unwrap();
        protocol.enter(StepPhase::Compute).unwrap();
        assert_eq!(
            protocol.reconverged(Direction::North),
            Err(StencilError::ProtocolViolation {
                from: "Compute",
                to: "north"
            })
        );
    }

    #[test]
    fn test_unfinished_step_detected() {
        let mut protocol = StepProtocol::new();
        assert!(protocol.finish().is_err());
        protocol.enter(StepPhase::Prefetch).unwrap();
        assert!(protocol.finish().is_err());
    }
}
