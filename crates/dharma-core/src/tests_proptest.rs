//! Property-based checks of the numeric invariants.

use proptest::prelude::*;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::{Capability, CapabilitySystem};
    use crate::catalog::FactorCatalog;
    use crate::config::{ManifestConfig, SeedBankConfig};
    use crate::manifestation::{sigmoid, ActivationInputs, StrengthMap};
    use crate::seed_bank::TraitStore;
    use std::collections::HashMap;
    use std::sync::Arc;

    fn catalog() -> Arc<FactorCatalog> {
        Arc::new(FactorCatalog::builtin())
    }

    #[derive(Debug, Clone)]
    enum Op {
        Update(usize, f64, f64),
        Counter(usize, usize, f64),
        Tick,
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            (0usize..51, -5.0f64..5.0, -2.0f64..3.0).prop_map(|(i, d, n)| Op::Update(i, d, n)),
            (0usize..51, 0usize..51, 0.0f64..2.0).prop_map(|(a, b, s)| Op::Counter(a, b, s)),
            Just(Op::Tick),
        ]
    }

    // =========================================================================
    // Seed ranges survive any sequence of mutations
    // =========================================================================
    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn test_seed_values_stay_in_range(ops in prop::collection::vec(op(), 1..200)) {
            let cat = catalog();
            let ids: Vec<String> = cat.iter().map(|f| f.id.clone()).collect();
            let mut store = TraitStore::new(Arc::clone(&cat), &HashMap::new(), SeedBankConfig::default());

            for op in ops {
                match op {
                    Op::Update(i, d, n) => store.update(&ids[i], d, n),
                    Op::Counter(a, b, s) => store.apply_counterforce(&ids[a], &ids[b], s),
                    Op::Tick => store.tick(),
                }
            }
            for seed in store.iter() {
                prop_assert!((0.0..=1.0).contains(&seed.weight));
                prop_assert!((-1.0..=1.0).contains(&seed.momentum));
            }
        }
    }

    // =========================================================================
    // Momentum decays geometrically
    // =========================================================================
    proptest! {
        #[test]
        fn test_momentum_geometric_decay(delta in -1.0f64..1.0, n in 0u32..60) {
            let mut store = TraitStore::with_defaults(catalog());
            store.update("virya", delta, 1.0);
            let m0 = store.seed("virya").unwrap().momentum;
            for _ in 0..n {
                store.tick();
            }
            let mn = store.seed("virya").unwrap().momentum;
            prop_assert!((mn - m0 * 0.95f64.powi(n as i32)).abs() < 1e-12);
        }
    }

    // =========================================================================
    // Sigmoid and activation monotonicity
    // =========================================================================
    proptest! {
        #[test]
        fn test_sigmoid_open_interval(x in -1e9f64..1e9) {
            let y = sigmoid(x);
            prop_assert!(y > 0.0 && y < 1.0);
        }

        #[test]
        fn test_probability_monotonic(
            seed in 0.0f64..1.0,
            cond in -1.0f64..1.0,
            counter in 0.0f64..1.0,
            bump in 0.001f64..0.5,
        ) {
            let cfg = ManifestConfig::default();
            let base = ActivationInputs { seed_weight: seed, condition: cond, particular: 0.0, counterforce: counter };
            let p = base.probability(&cfg);

            let more_seed = ActivationInputs { seed_weight: seed + bump, ..base };
            let more_cond = ActivationInputs { condition: cond + bump, ..base };
            let more_counter = ActivationInputs { counterforce: counter + bump, ..base };

            prop_assert!(more_seed.probability(&cfg) >= p);
            prop_assert!(more_cond.probability(&cfg) >= p);
            prop_assert!(more_counter.probability(&cfg) <= p);
        }
    }

    // =========================================================================
    // Disruption is a pure function of its inputs
    // =========================================================================
    proptest! {
        #[test]
        fn test_disruption_is_pure(
            levels in prop::collection::vec(0.0f64..1.0, 7),
            noise in prop::collection::vec(0.0f64..1.0, 7),
        ) {
            let names = ["kausidya", "styana", "vicikitsa", "musitasmritita", "viksepa", "auddhatya", "moha"];
            let active: StrengthMap = names.iter().zip(&levels).map(|(k, v)| (k.to_string(), *v)).collect();
            let other: StrengthMap = names.iter().zip(&noise).map(|(k, v)| (k.to_string(), *v)).collect();

            let mut fresh = CapabilitySystem::with_defaults(catalog());
            fresh.check_disruption(&active);

            let mut aged = CapabilitySystem::with_defaults(catalog());
            aged.check_disruption(&other);
            aged.check_disruption(&StrengthMap::new());
            aged.check_disruption(&active);

            for cap in Capability::ALL {
                prop_assert_eq!(fresh.gauge(cap).disrupted, aged.gauge(cap).disrupted);
                prop_assert_eq!(&fresh.gauge(cap).disruption_source, &aged.gauge(cap).disruption_source);
            }
        }
    }
}
