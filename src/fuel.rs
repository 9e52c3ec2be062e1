/// Fuel consumption per lap in kg. Roughly what a modern F1 car burns.
pub const DEFAULT_BURN_RATE_KG: f64 = 2.1;

/// Lap time cost per kg of fuel carried.
const TIME_COST_PER_KG: f64 = 0.03;

/// Lap time penalty from the fuel still on board.
///
/// Remaining fuel floors at zero once the load is notionally exhausted;
/// the penalty is monotonically non-increasing over the race and never
/// negative.
///
/// # Arguments
/// * `lap` - Current lap number
/// * `fuel_load_kg` - Starting fuel load in kg
/// * `burn_rate_kg` - Fuel consumption per lap in kg
///
/// # Returns
/// Lap time penalty in seconds
pub fn fuel_penalty(lap: u32, fuel_load_kg: f64, burn_rate_kg: f64) -> f64 {
    let remaining = (fuel_load_kg - lap as f64 * burn_rate_kg).max(0.0);
    remaining * TIME_COST_PER_KG
}
