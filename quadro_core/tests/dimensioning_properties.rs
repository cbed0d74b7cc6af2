//! Selection invariants over randomized circuits, plus a deterministic grid
//! sweep across every voltage, method and conductor count.

use proptest::prelude::*;
use quadro_core::calculations::dimensioning::{
    dimension_circuit, CircuitInput, DesignPolicy, ALLOWED_LOADED_CONDUCTORS, ALLOWED_VOLTAGES_V,
};
use quadro_core::tables::{select_breaker, InstallationMethod, STANDARD_BREAKER_RATINGS_A};
use quadro_core::CalcError;

const POWERS_W: [f64; 9] = [60.0, 450.0, 1_500.0, 2_750.0, 4_400.0, 7_500.0, 12_000.0, 30_000.0, 90_000.0];
const TEMPERATURES_C: [f64; 9] = [8.0, 10.0, 27.5, 30.0, 41.0, 60.0, 63.0, 67.0, 70.0];
const GROUPINGS: [u32; 5] = [1, 2, 4, 9, 20];

fn is_table_exhaustion(err: &CalcError) -> bool {
    matches!(
        err,
        CalcError::NoSuitableBreaker { .. } | CalcError::NoSuitableConductor { .. }
    )
}

fn circuit_strategy() -> impl Strategy<Value = CircuitInput> {
    (
        1.0f64..60_000.0,
        prop::sample::select(ALLOWED_VOLTAGES_V.to_vec()),
        prop::sample::select(InstallationMethod::ALL.to_vec()),
        prop::sample::select(ALLOWED_LOADED_CONDUCTORS.to_vec()),
        7.5f64..=72.5,
        1u32..=20,
    )
        .prop_map(|(power, voltage, method, loaded, temperature, grouped)| {
            CircuitInput::new(power, voltage)
                .with_installation(method, loaded)
                .with_environment(temperature, grouped)
        })
}

fn policy_strategy() -> impl Strategy<Value = DesignPolicy> {
    prop_oneof![
        Just(DesignPolicy::default()),
        Just(DesignPolicy::conservative()),
        (0.5f64..=1.0, 1.0f64..2.0).prop_map(|(pf, margin)| DesignPolicy::default()
            .with_power_factor(pf)
            .with_design_margin(margin)),
    ]
}

proptest! {
    #[test]
    fn random_circuits_satisfy_protection_inequalities(
        input in circuit_strategy(),
        policy in policy_strategy(),
    ) {
        match dimension_circuit(&input, &policy) {
            Ok(r) => {
                prop_assert!(r.operating_current_a <= r.design_current_a);
                prop_assert!(r.design_current_a <= r.corrected_capacity_a);
                prop_assert!(r.breaker_rating_a >= r.design_current_a);
                prop_assert!(r.corrected_capacity_a >= r.breaker_rating_a);
            }
            Err(err) => prop_assert!(is_table_exhaustion(&err), "unexpected {:?}", err),
        }
    }

    #[test]
    fn random_circuits_dimension_identically_twice(
        input in circuit_strategy(),
        policy in policy_strategy(),
    ) {
        prop_assert_eq!(dimension_circuit(&input, &policy), dimension_circuit(&input, &policy));
    }

    #[test]
    fn more_power_never_shrinks_the_selection(
        input in circuit_strategy(),
        extra in 0.0f64..20_000.0,
    ) {
        let policy = DesignPolicy::default();
        let mut heavier = input.clone();
        heavier.power_w += extra;
        if let (Ok(light), Ok(heavy)) = (dimension_circuit(&input, &policy), dimension_circuit(&heavier, &policy)) {
            prop_assert!(light.breaker_rating_a <= heavy.breaker_rating_a);
            prop_assert!(light.conductor_section_mm2 <= heavy.conductor_section_mm2);
        }
    }
}

fn policies() -> Vec<DesignPolicy> {
    vec![
        DesignPolicy::default(),
        DesignPolicy::conservative(),
        DesignPolicy::default().with_design_margin(1.5).with_power_factor(0.8),
    ]
}

fn grid() -> impl Iterator<Item = CircuitInput> {
    POWERS_W.into_iter().flat_map(|power| {
        ALLOWED_VOLTAGES_V.into_iter().flat_map(move |voltage| {
            InstallationMethod::ALL.into_iter().flat_map(move |method| {
                ALLOWED_LOADED_CONDUCTORS.into_iter().flat_map(move |loaded| {
                    TEMPERATURES_C.into_iter().flat_map(move |temperature| {
                        GROUPINGS.into_iter().map(move |grouped| {
                            CircuitInput::new(power, voltage)
                                .with_installation(method, loaded)
                                .with_environment(temperature, grouped)
                        })
                    })
                })
            })
        })
    })
}

#[test]
fn successful_results_satisfy_protection_inequalities() {
    let mut successes = 0;
    let mut failures = 0;

    for policy in policies() {
        for input in grid() {
            match dimension_circuit(&input, &policy) {
                Ok(r) => {
                    successes += 1;
                    assert!(r.operating_current_a <= r.design_current_a, "{input:?}");
                    assert!(r.design_current_a <= r.corrected_capacity_a, "{input:?}");
                    assert!(r.breaker_rating_a >= r.design_current_a, "{input:?}");
                    assert!(r.corrected_capacity_a >= r.breaker_rating_a, "{input:?}");
                    assert!(STANDARD_BREAKER_RATINGS_A.contains(&r.breaker_rating_a));
                    if policy.enforce_minimum_sections {
                        assert!(r.conductor_section_mm2 >= input.category.minimum_section_mm2());
                    }
                }
                Err(err) => {
                    failures += 1;
                    // Large loads run off the tables; nothing else may fail here
                    assert!(is_table_exhaustion(&err), "unexpected {err:?} for {input:?}");
                }
            }
        }
    }

    assert!(successes > 0);
    assert!(failures > 0);
}

#[test]
fn dimensioning_is_idempotent() {
    let policy = DesignPolicy::conservative();
    for input in grid().step_by(7) {
        let first = dimension_circuit(&input, &policy);
        let second = dimension_circuit(&input, &policy);
        assert_eq!(first, second);
    }
}

#[test]
fn selected_section_is_the_smallest_that_fits() {
    let policy = DesignPolicy::default();
    for input in grid().step_by(5) {
        let Ok(r) = dimension_circuit(&input, &policy) else { continue };
        let factor = r.temperature.factor * r.grouping.factor;
        let required = r.design_current_a.max(r.breaker_rating_a);
        for (section, base) in input.installation_method.capacities(input.loaded_conductors) {
            if section >= r.conductor_section_mm2 {
                break;
            }
            assert!(base * factor < required, "{section} mm² would have fit {input:?}");
        }
    }
}

#[test]
fn breaker_selection_is_smallest_rating_not_below_current() {
    let mut current = 0.01;
    while current < 700.0 {
        match select_breaker(current) {
            Some(rating) => {
                assert!(rating >= current);
                assert!(STANDARD_BREAKER_RATINGS_A
                    .iter()
                    .filter(|&&r| r >= current)
                    .all(|&r| r >= rating));
            }
            None => assert!(STANDARD_BREAKER_RATINGS_A.iter().all(|&r| r < current)),
        }
        current *= 1.07;
    }
}
