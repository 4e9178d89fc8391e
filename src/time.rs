// src/time.rs
//! Fixed/variable timestep reconciliation for the physics step.
//!
//! Frame time is accumulated and consumed in fixed slices. The number of slices
//! per frame is capped, and whatever the cap cuts off is dropped instead of
//! carried over, so one long frame (tab regaining focus) cannot start a
//! spiral of death.

/// Sub-step plan for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepPlan {
    /// Number of simulation steps to run.
    pub substeps: u32,
    /// Duration of each step, in seconds.
    pub dt: f32,
}

#[derive(Debug, Clone)]
pub struct FixedTimestep {
    fixed_dt: f32,
    accumulator: f32,
    dropped: f32,
}

impl FixedTimestep {
    pub fn new(fixed_dt: f32) -> Self {
        Self { fixed_dt, accumulator: 0.0, dropped: 0.0 }
    }

    #[inline(always)]
    pub fn fixed_dt(&self) -> f32 {
        self.fixed_dt
    }

    /// Time banked but not yet simulated.
    #[inline(always)]
    pub fn accumulator(&self) -> f32 {
        self.accumulator
    }

    /// Total time discarded by the sub-step cap so far.
    #[inline(always)]
    pub fn dropped(&self) -> f32 {
        self.dropped
    }

    pub fn reset(&mut self) {
        self.accumulator = 0.0;
        self.dropped = 0.0;
    }

    /// Plan the steps for a frame of length `frame_dt`.
    ///
    /// `max_sub_steps == 0` selects variable stepping: one step of exactly
    /// `frame_dt`. Negative or non-finite frame times count as zero.
    pub fn advance(&mut self, frame_dt: f32, max_sub_steps: u32) -> StepPlan {
        let frame_dt = if frame_dt.is_finite() { frame_dt.max(0.0) } else { 0.0 };

        if max_sub_steps == 0 {
            return StepPlan {
                substeps: u32::from(frame_dt > 0.0),
                dt: frame_dt,
            };
        }

        self.accumulator += frame_dt;
        let wanted = (self.accumulator / self.fixed_dt).floor() as u32;
        let substeps = wanted.min(max_sub_steps);
        self.accumulator -= substeps as f32 * self.fixed_dt;

        if wanted > max_sub_steps {
            // Keep only the sub-step remainder.
            let excess = self.accumulator - self.accumulator % self.fixed_dt;
            self.dropped += excess;
            self.accumulator -= excess;
            log::debug!("dropping {excess:.4}s of simulation time ({wanted} sub-steps requested)");
        }

        StepPlan { substeps, dt: self.fixed_dt }
    }
}
