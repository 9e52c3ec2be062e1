use rand::Rng;

/// Lap time delta while the safety car is out, in seconds. Applied on top
/// of the base lap, bypassing every other lap-time term.
pub const SAFETY_CAR_DELTA_S: f64 = 30.0;

/// Stochastic safety-car period. A deployment check only happens while no
/// period is active; once triggered, the period runs for a uniformly drawn
/// 3-6 laps. Transitions happen at lap boundaries only.
#[derive(Debug, Clone, Default)]
pub struct SafetyCarState {
    active: bool,
    laps_remaining: u32,
}

impl SafetyCarState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Start-of-lap update: possibly deploy, then decrement an active
    /// period and clear the flag when it runs out.
    ///
    /// # Arguments
    /// * `lap` - Current lap number
    /// * `total_laps` - Total laps in the race
    pub fn check<R: Rng + ?Sized>(&mut self, rng: &mut R, lap: u32, total_laps: u32) {
        if !self.active && rng.gen::<f64>() < deployment_probability(lap, total_laps) {
            self.active = true;
            self.laps_remaining = rng.gen_range(3..7);
        }

        if self.active {
            self.laps_remaining -= 1;
            if self.laps_remaining == 0 {
                self.active = false;
            }
        }
    }
}

/// Per-lap deployment probability. Incident rates are higher in the
/// opening laps (start chaos) and over the final five laps.
fn deployment_probability(lap: u32, total_laps: u32) -> f64 {
    if lap <= 3 {
        0.035
    } else if lap + 5 >= total_laps {
        0.020
    } else {
        0.012
    }
}
