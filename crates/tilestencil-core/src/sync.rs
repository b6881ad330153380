//! Block-wide barrier.
//!
//! Unlike `std::sync::Barrier`, a [`BlockBarrier`] can be poisoned: when one
//! warp of a block fails, the others are released with
//! [`StencilError::BarrierPoisoned`] instead of waiting forever for an
//! arrival that will never come.

use parking_lot::{Condvar, Mutex};

use crate::error::{Result, StencilError};

#[derive(Debug, Default)]
struct BarrierState {
    arrived: usize,
    generation: u64,
    poisoned: bool,
}

/// Reusable barrier for the warps of one block.
#[derive(Debug)]
pub struct BlockBarrier {
    parties: usize,
    state: Mutex<BarrierState>,
    cvar: Condvar,
}

impl BlockBarrier {
    /// Create a barrier for `parties` warps.
    ///
    /// # Panics
    ///
    /// Panics if `parties` is zero.
    pub fn new(parties: usize) -> Self {
        assert!(parties > 0, "barrier needs at least one party");
        Self {
            parties,
            state: Mutex::new(BarrierState::default()),
            cvar: Condvar::new(),
        }
    }

    /// Number of warps the barrier waits for.
    pub fn parties(&self) -> usize {
        self.parties
    }

    /// Block until every party has arrived for the current generation.
    pub fn wait(&self) -> Result<()> {
        let mut state = self.state.lock();
        if state.poisoned {
            return Err(StencilError::BarrierPoisoned);
        }

        state.arrived += 1;
        if state.arrived == self.parties {
            state.arrived = 0;
            state.generation = state.generation.wrapping_add(1);
            self.cvar.notify_all();
            return Ok(());
        }

        let generation = state.generation;
        while state.generation == generation && !state.poisoned {
            self.cvar.wait(&mut state);
        }
        if state.generation == generation {
            Err(StencilError::BarrierPoisoned)
        } else {
            Ok(())
        }
    }

    /// Release all current and future waiters with an error.
    pub fn poison(&self) {
        let mut state = self.state.lock();
        state.poisoned = true;
        self.cvar.notify_all();
    }

    /// Whether [`poison`](Self::poison) has been called.
    pub fn is_poisoned(&self) -> bool {
        self.state.lock().poisoned
    }

    /// Completed barrier generations.
    pub fn generation(&self) -> u64 {
        self.state.lock().generation
    }
}
