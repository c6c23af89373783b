// Helper functions shared by the dashboard handlers
use shared::models::{ChartPoint, Timestamped};

pub fn to_chart_points<T, F>(records: &[T], value: F) -> Vec<ChartPoint>
where
    T: Timestamped,
    F: Fn(&T) -> f64,
{
    records
        .iter()
        .map(|r| ChartPoint { x: r.timestamp(), y: value(r) })
        .collect()
}

// Min-max scaling to [0, 1]. A flat series maps to 0.5 so it stays visible.
pub fn min_max_normalize(points: &[ChartPoint]) -> Vec<ChartPoint> {
    let (min, max) = points
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| (lo.min(p.y), hi.max(p.y)));
    let span = max - min;
    points
        .iter()
        .map(|p| ChartPoint {
            x: p.x,
            y: if span > 0.0 { (p.y - min) / span } else { 0.5 },
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn points(values: &[f64]) -> Vec<ChartPoint> {
        let start = Utc.with_ymd_and_hms(2024, 11, 20, 0, 0, 0).unwrap();
        values
            .iter()
            .enumerate()
            .map(|(i, &y)| ChartPoint { x: start + Duration::minutes(i as i64), y })
            .collect()
    }

    #[test]
    fn test_min_max_normalize() {
        let ys: Vec<f64> = min_max_normalize(&points(&[100.0, 150.0, 200.0])).iter().map(|p| p.y).collect();
        assert_eq!(ys, vec![0.0, 0.5, 1.0]);
    }

    #[test]
    fn test_min_max_normalize_flat_and_empty() {
        let ys: Vec<f64> = min_max_normalize(&points(&[3.0, 3.0])).iter().map(|p| p.y).collect();
        assert_eq!(ys, vec![0.5, 0.5]);
        assert!(min_max_normalize(&[]).is_empty());
    }
}
