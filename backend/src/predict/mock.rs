use rand::Rng;
use shared::ClassificationResult;

pub const MOCK_CLASSES: [&str; 3] = ["recyclable", "biodegradable", "hazardous"];

/// Synthetic result served when no upstream classifier is configured.
/// The latency is simulated, not measured; no I/O happens here.
pub fn mock_result() -> ClassificationResult {
    let mut rng = rand::rng();

    let class = MOCK_CLASSES[rng.random_range(0..MOCK_CLASSES.len())];
    let confidence = (rng.random_range(0.80..=1.00_f64) * 100.0).round() / 100.0;
    let processing_time = rng.random_range(100..300_u64);

    ClassificationResult {
        class: class.to_string(),
        confidence,
        processing_time: Some(processing_time),
    }
}
