// Percentage change between the first and last record of the price window
use super::IndicatorCalculator;
use crate::error::EngineError;
use serde_json::Value;
use shared::models::PriceRecord;
use shared::utils::round2;

pub struct PriceChange;

impl IndicatorCalculator<PriceRecord> for PriceChange {
    fn name(&self) -> &str {
        "PriceChange"
    }

    fn parameters(&self) -> Value {
        serde_json::json!({ "from": "first", "to": "last", "unit": "percent" })
    }

    fn calculate(&self, data: &[PriceRecord]) -> Result<f64, EngineError> {
        let (first, last) = match (data.first(), data.last()) {
            (Some(first), Some(last)) => (first, last),
            _ => return Err(EngineError::InsufficientData("Price series is empty".to_string())),
        };
        if first.price == 0.0 {
            return Err(EngineError::IndicatorError(format!(
                "Cannot compute change from a zero opening price at {}",
                first.timestamp
            )));
        }
        Ok(round2((last.price - first.price) / first.price * 100.0))
    }
}
