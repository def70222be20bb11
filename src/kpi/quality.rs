//! Quality and effectiveness KPIs

/// First-time quality (%). 100 when nothing has left the line yet.
pub fn ftq(shipment_count: u64, waste_count: u64) -> f64 {
    let total = shipment_count + waste_count;
    if total == 0 {
        100.0
    } else {
        shipment_count as f64 / total as f64 * 100.0
    }
}

/// Scrap rate (%). 0 when nothing has left the line yet.
pub fn scrap(shipment_count: u64, waste_count: u64) -> f64 {
    let total = shipment_count + waste_count;
    if total == 0 {
        0.0
    } else {
        waste_count as f64 / total as f64 * 100.0
    }
}

/// Overall equipment effectiveness (%), capped at 100
pub fn oee(speed: f64, design_speed: f64, availability: f64, ftq: f64) -> f64 {
    let performance = if design_speed > 0.0 {
        (speed / design_speed).min(1.0)
    } else {
        0.0
    };
    let quality = ftq / 100.0;
    (availability * performance * quality * 100.0).min(100.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_empty_line() {
        assert_eq!(ftq(0, 0), 100.0);
        assert_eq!(scrap(0, 0), 0.0);
    }

    #[test]
    fn test_mixed_output() {
        assert!((ftq(19, 1) - 95.0).abs() < 1e-12);
        assert!((scrap(19, 1) - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_oee() {
        // 0.96 availability, half design speed, perfect quality
        assert!((oee(1.0, 2.0, 0.96, 100.0) - 48.0).abs() < 1e-9);
        // Performance capped at 1
        assert!((oee(3.0, 2.0, 0.96, 100.0) - 96.0).abs() < 1e-9);
        assert!(oee(5.0, 2.0, 1.5, 100.0) <= 100.0);
        assert_eq!(oee(1.0, 0.0, 0.96, 100.0), 0.0);
    }

    proptest! {
        #[test]
        fn prop_ftq_scrap_complement(ship in 0u64..100_000, waste in 0u64..100_000) {
            prop_assume!(ship + waste > 0);
            prop_assert!((ftq(ship, waste) + scrap(ship, waste) - 100.0).abs() < 1e-9);
        }
    }
}
