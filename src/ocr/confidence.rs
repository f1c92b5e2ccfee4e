/// Scale for engines reporting confidence as a percentage (Tesseract).
pub const PERCENT_SCALE: f32 = 100.0;

/// Scale for engines that already report 0..=1 (PaddleOCR).
pub const UNIT_SCALE: f32 = 1.0;

/// Mean of the defined token confidences, divided by `scale` and clamped
/// to `0.0..=1.0`.
///
/// Negative and non-finite scores are Tesseract's "no confidence" sentinel
/// (`-1`) or garbage and are left out of the average. When no token has a
/// defined confidence the result is exactly `0.0`.
pub fn mean_confidence<I>(scores: I, scale: f32) -> f32
where
    I: IntoIterator<Item = f32>,
{
    let (sum, count) = scores
        .into_iter()
        .filter(|score| score.is_finite() && *score >= 0.0)
        .fold((0.0f64, 0usize), |(sum, count), score| {
            (sum + score as f64, count + 1)
        });

    if count == 0 || !(scale > 0.0) {
        return 0.0;
    }

    let mean = (sum / count as f64) / scale as f64;
    (mean as f32).clamp(0.0, 1.0)
}
