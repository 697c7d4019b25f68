use std::f64::consts::PI;

use rand::Rng;
use rand_distr::{Distribution, Normal};
use serde_json::json;

use growsync_api::models::RECIPE_START;

use crate::settings::{Curve, Simulation, Variable};
use crate::store::DataStore;

const SECONDS_PER_DAY: f64 = 86400.0;

/// Position of `timestamp` (seconds) within its day, in `[0, 1)`.
pub fn day_fraction(timestamp: f64) -> f64 {
    timestamp.rem_euclid(SECONDS_PER_DAY) / SECONDS_PER_DAY
}

pub fn simulation_lux(day_fraction: f64) -> f64 {
    const MAX_SUNLIGHT_LUX: f64 = 500.0;
    const MAX_MOONLIGHT_LUX: f64 = 5.0;

    const SUNRISE_START: f64 = 0.23;
    const SUNRISE_END: f64 = 0.25;
    const SUNSET_START: f64 = 0.73;
    const SUNSET_END: f64 = 0.75;

    if (SUNRISE_START..=SUNSET_END).contains(&day_fraction) {
        if day_fraction <= SUNRISE_END {
            let progress = (day_fraction - SUNRISE_START) / (SUNRISE_END - SUNRISE_START);
            (progress * PI / 2.0).sin() * MAX_SUNLIGHT_LUX
        } else if day_fraction >= SUNSET_START {
            let progress = (day_fraction - SUNSET_START) / (SUNSET_END - SUNSET_START);
            (progress * PI / 2.0).cos() * MAX_SUNLIGHT_LUX
        } else {
            MAX_SUNLIGHT_LUX
        }
    } else {
        // Moonlight peaks at midnight
        let radians = day_fraction * 2.0 * PI;
        radians.cos().max(0.0) * (MAX_MOONLIGHT_LUX - 0.01) + 0.01
    }
}

pub fn simulated_humidity(day_fraction: f64) -> f64 {
    let radians = day_fraction * 2.0 * PI;

    if (0.3..=0.7).contains(&day_fraction) {
        radians.sin().max(0.0) * 25.0 + 65.0
    } else {
        radians.cos().max(0.0) * 30.0 + 60.0
    }
}

pub fn simulated_temperature(day_fraction: f64) -> f64 {
    let radians = day_fraction * 2.0 * PI;

    radians.sin().max(0.0) * 8.0 + 18.0
}

/// One measured value of `variable`, rounded to two decimals.
pub fn sample<R: Rng>(variable: &Variable, day_fraction: f64, rng: &mut R) -> f64 {
    let noise = Normal::new(0.0, 0.3).map(|normal| normal.sample(rng)).unwrap_or_default();

    let value = match variable.curve {
        Curve::Light => simulation_lux(day_fraction),
        Curve::Humidity => (simulated_humidity(day_fraction) + noise).clamp(0.0, 100.0),
        Curve::Temperature => simulated_temperature(day_fraction) + noise,
        Curve::Flat => variable.base + noise * 0.1,
    };

    (value * 100.0).round() / 100.0
}

/// Measured readings of every variable in every environment at `timestamp`.
pub fn record_readings(store: &mut DataStore, simulation: &Simulation, timestamp: f64) {
    let mut rng = rand::rng();
    let fraction = day_fraction(timestamp);

    for environment in &simulation.environments {
        for variable in &simulation.variables {
            let value = sample(variable, fraction, &mut rng);
            store.insert(environment.as_str(), variable.name.as_str(), false, timestamp, json!(value));
        }
    }
}

/// Recipe-start marker plus the recipe's desired values for every environment.
pub fn start_recipe(store: &mut DataStore, simulation: &Simulation, timestamp: f64) {
    for environment in &simulation.environments {
        let marker = store.insert(
            environment.as_str(),
            RECIPE_START,
            false,
            timestamp,
            json!(simulation.recipe_id),
        );

        tracing::info!("recipe {} started in {} as {}", simulation.recipe_id, environment, marker.id);

        for variable in &simulation.variables {
            if let Some(desired) = variable.desired {
                store.insert(environment.as_str(), variable.name.as_str(), true, timestamp, json!(desired));
            }
        }
    }
}

/// Backfill `history_points` readings ending just before `now`.
pub fn seed(store: &mut DataStore, simulation: &Simulation, now: f64) {
    let step = simulation.interval_ms as f64 / 1000.0;
    let start = now - simulation.history_points as f64 * step;

    start_recipe(store, simulation, start - step);

    for index in 0..simulation.history_points {
        record_readings(store, simulation, start + index as f64 * step);
    }
}
