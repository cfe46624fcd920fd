//! Decay schedules for the learning rate and neighbourhood radius.

/// Learning rate at step 0.
pub const INITIAL_LEARNING_RATE: f64 = 0.1;

/// Exponential decay schedules driven by the step index within a pass.
///
/// Both schedules share the time constant `halflife = n_teacher / 4`, so they
/// decay by a factor of `e⁴` over one full pass regardless of its length.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Schedule {
    halflife: f64,
    initial_radius: f64,
}

impl Schedule {
    /// Creates the schedule for `n_teacher` teachers on a `dimension`-wide lattice.
    pub fn new(n_teacher: usize, dimension: usize) -> Self {
        Self {
            halflife: n_teacher as f64 / 4.0,
            initial_radius: dimension as f64 / 2.0,
        }
    }

    /// Returns the decay time constant.
    #[inline]
    pub fn halflife(&self) -> f64 {
        self.halflife
    }

    #[inline]
    fn decay(&self, t: usize) -> f64 {
        (-(t as f64) / self.halflife).exp()
    }

    /// Computes the neighbourhood radius σ at step `t`.
    #[inline]
    pub fn radius(&self, t: usize) -> f64 {
        self.initial_radius * self.decay(t)
    }

    /// Computes the learning rate at step `t`.
    #[inline]
    pub fn learning_rate(&self, t: usize) -> f64 {
        INITIAL_LEARNING_RATE * self.decay(t)
    }

    /// Computes the Gaussian neighbourhood weight for grid distance `d` at step `t`.
    ///
    /// When σ has collapsed to zero (or is not finite) the kernel degenerates
    /// to an indicator of the BMU itself: weight 1 at `d == 0`, 0 elsewhere.
    #[inline]
    pub fn neighbourhood(&self, t: usize, d: f64) -> f64 {
        gaussian(d, self.radius(t))
    }
}

/// Gaussian kernel `exp(-d² / (2σ²))`, guarded against a vanishing σ.
#[inline]
pub fn gaussian(d: f64, sigma: f64) -> f64 {
    let two_sigma_sq = 2.0 * sigma * sigma;
    if two_sigma_sq > 0.0 && two_sigma_sq.is_finite() {
        (-d * d / two_sigma_sq).exp()
    } else if d == 0.0 {
        1.0
    } else {
        0.0
    }
}
