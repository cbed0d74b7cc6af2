//! Room loads never decrease as a room grows.

use proptest::prelude::*;
use quadro_core::calculations::room_load::{compute_room_load, RoomCategory};

fn category_strategy() -> impl Strategy<Value = RoomCategory> {
    prop::sample::select(RoomCategory::ALL.to_vec())
}

proptest! {
    #[test]
    fn lighting_is_monotonic_in_area(
        area in 0.0f64..500.0,
        growth in 0.0f64..100.0,
        perimeter in 0.0f64..200.0,
        category in category_strategy(),
    ) {
        let small = compute_room_load(area, perimeter, category, 0.0).unwrap();
        let large = compute_room_load(area + growth, perimeter, category, 0.0).unwrap();
        prop_assert!(small.lighting_va <= large.lighting_va);
        prop_assert!(small.total_va <= large.total_va);
    }

    #[test]
    fn outlets_are_monotonic_in_perimeter(
        area in 0.0f64..500.0,
        perimeter in 0.0f64..200.0,
        growth in 0.0f64..50.0,
        category in category_strategy(),
    ) {
        let small = compute_room_load(area, perimeter, category, 0.0).unwrap();
        let large = compute_room_load(area, perimeter + growth, category, 0.0).unwrap();
        prop_assert!(small.outlet_points <= large.outlet_points);
        prop_assert!(small.outlet_va <= large.outlet_va);
    }

    #[test]
    fn total_is_the_sum_of_its_parts(
        area in 0.0f64..500.0,
        perimeter in 0.0f64..200.0,
        appliance in 0.0f64..20_000.0,
        category in category_strategy(),
    ) {
        let load = compute_room_load(area, perimeter, category, appliance).unwrap();
        prop_assert_eq!(load.total_va, load.lighting_va + load.outlet_va + appliance);
        prop_assert_eq!(load.lighting_points, 1);
    }
}
