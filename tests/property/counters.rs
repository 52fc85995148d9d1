//! Counter properties: the capped running average stays within the input
//! range, whatever the cap/floor configuration does to the sample count.

use eventide_meters::Meters;
use proptest::prelude::*;

proptest! {
    #[test]
    fn running_average_stays_within_input_bounds(
        samples in prop::collection::vec(10.0f64..100.0, 1..200),
        cap in 4u64..64,
        floor in 1u64..4,
    ) {
        let meters = Meters::new();
        let mut avg = 0.0;
        for &x in &samples {
            avg = meters.count_avg("prop", x, cap, floor);
        }
        // The wrap makes the average non-stationary, so only bounded error
        // is asserted: it can never leave the convex hull of the inputs.
        prop_assert!((10.0..=100.0).contains(&avg), "avg {avg} out of range");
        prop_assert_eq!(meters.get("prop"), avg);
    }

    #[test]
    fn constant_input_is_a_fixed_point(
        x in -1000.0f64..1000.0,
        n in 1usize..100,
        cap in 4u64..32,
    ) {
        let meters = Meters::new();
        let mut avg = 0.0;
        for _ in 0..n {
            avg = meters.count_avg("constant", x, cap, 2);
        }
        prop_assert!((avg - x).abs() <= x.abs() * 1e-9 + 1e-9);
    }

    #[test]
    fn add_accumulates_exactly(deltas in prop::collection::vec(-1000i64..1000, 0..100)) {
        let meters = Meters::new();
        for &d in &deltas {
            meters.add("sum", d as f64);
        }
        prop_assert_eq!(meters.get("sum"), deltas.iter().sum::<i64>() as f64);
    }
}
