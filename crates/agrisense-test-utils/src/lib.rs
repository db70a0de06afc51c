//! Fixtures shared by the ranker and web test suites.

use agrisense_common::{SoilReading, TrainingExample};
use rand::{rngs::StdRng, Rng, SeedableRng};

pub use pretty_assertions;

pub const TOMATO_SOIL: SoilReading = SoilReading {
    temperature: 20.0,
    humidity: 50.0,
    soil_moisture: 40.0,
    soil_ph: 6.0,
};

pub const CORN_SOIL: SoilReading = SoilReading {
    temperature: 35.0,
    humidity: 30.0,
    soil_moisture: 20.0,
    soil_ph: 7.5,
};

pub fn soil(temperature: f64, humidity: f64, soil_moisture: f64, soil_ph: f64) -> SoilReading {
    SoilReading::new(temperature, humidity, soil_moisture, soil_ph)
}

pub fn example(reading: SoilReading, crop: &str) -> TrainingExample {
    TrainingExample::new(reading, crop)
}

/// `n` identical copies of `reading` labelled `crop`.
pub fn repeated(reading: SoilReading, crop: &str, n: usize) -> Vec<TrainingExample> {
    (0..n).map(|_| example(reading, crop)).collect()
}

/// Ten Tomato rows at (20, 50, 40, 6.0) and ten Corn rows at (35, 30, 20, 7.5).
pub fn tomato_corn_examples() -> Vec<TrainingExample> {
    let mut examples = repeated(TOMATO_SOIL, "Tomato", 10);
    examples.extend(repeated(CORN_SOIL, "Corn", 10));
    examples
}

/// Noisy clusters around four distinct soil profiles, reproducible from `seed`.
pub fn four_crop_examples(seed: u64) -> Vec<TrainingExample> {
    let centres = [
        (soil(20.0, 50.0, 40.0, 6.0), "Tomato"),
        (soil(35.0, 30.0, 20.0, 7.5), "Corn"),
        (soil(28.0, 85.0, 75.0, 5.5), "Rice"),
        (soil(15.0, 45.0, 30.0, 7.0), "Wheat"),
    ];
    let mut rng = StdRng::seed_from_u64(seed);
    centres
        .iter()
        .flat_map(|(c, crop)| {
            (0..15)
                .map(|_| {
                    let r = soil(
                        c.temperature + rng.gen_range(-1.5..1.5),
                        c.humidity + rng.gen_range(-3.0..3.0),
                        c.soil_moisture + rng.gen_range(-3.0..3.0),
                        c.soil_ph + rng.gen_range(-0.2..0.2),
                    );
                    example(r, crop)
                })
                .collect::<Vec<_>>()
        })
        .collect()
}

/// Rows with a single label; never trainable.
pub fn single_crop_examples() -> Vec<TrainingExample> {
    vec![
        example(soil(20.0, 50.0, 40.0, 6.0), "Tomato"),
        example(soil(25.0, 55.0, 45.0, 6.5), "Tomato"),
        example(soil(22.0, 60.0, 35.0, 6.2), "Tomato"),
    ]
}

/// Training payload in the shape `POST /api/model/train` accepts.
pub fn train_request_body(examples: &[TrainingExample]) -> String {
    serde_json::json!({ "examples": examples }).to_string()
}
