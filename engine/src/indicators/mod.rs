// Indicators derived from the windowed series
pub mod fear_greed;
pub mod price_change;

pub use fear_greed::FearGreedIndex;
pub use price_change::PriceChange;

use crate::error::EngineError;
use serde_json::Value;

// Common trait for all indicators. Each reduces a whole window to one value.
pub trait IndicatorCalculator<T>: Send + Sync {
    fn name(&self) -> &str;
    fn parameters(&self) -> Value; // Parameters used for this indicator instance
    fn calculate(&self, data: &[T]) -> Result<f64, EngineError>;
}
