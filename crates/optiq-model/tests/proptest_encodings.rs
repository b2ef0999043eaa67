//! Property tests for the encoders.

use optiq_model::{Hamiltonian, Penalty, Polynomial, Qubo, SetPartition};
use proptest::prelude::*;

fn bits(mask: u32, n: usize) -> Vec<f64> {
    (0..n).map(|j| f64::from((mask >> j) & 1)).collect()
}

fn qubo_terms() -> impl Strategy<Value = (usize, Vec<(usize, usize, f64)>)> {
    (1usize..7).prop_flat_map(|n| {
        let term = (0..n, 0..n, -10.0f64..10.0);
        (Just(n), prop::collection::vec(term, 0..20))
    })
}

fn set_partition() -> impl Strategy<Value = SetPartition> {
    (1usize..5).prop_flat_map(|m| {
        let subset = prop::collection::vec(0..m, 1..=m);
        let subsets = prop::collection::vec(subset, 1..7);
        (Just(m), subsets).prop_flat_map(|(m, subsets)| {
            let k = subsets.len();
            (
                Just(m),
                Just(subsets),
                prop::collection::vec(0.0f64..10.0, k),
            )
        })
    })
    .prop_map(|(m, subsets, costs)| {
        SetPartition::new(m, subsets)
            .and_then(|p| p.with_costs(costs))
            .expect("generated instance is valid")
    })
}

proptest! {
    #[test]
    fn qubo_energy_matches_term_sum((n, terms) in qubo_terms(), mask in 0u32..128) {
        let q = Qubo::from_terms(n, terms.clone()).unwrap();
        let x = bits(mask, n);
        let direct: f64 = terms.iter().map(|&(i, j, v)| v * x[i] * x[j]).sum();
        prop_assert!((q.energy(&x).unwrap() - direct).abs() < 1e-9);
        prop_assert!(q.is_symmetric(1e-12));
    }

    #[test]
    fn qubo_polynomial_agree_on_binary((n, terms) in qubo_terms(), mask in 0u32..128) {
        let q = Qubo::from_terms(n, terms).unwrap().with_offset(1.5);
        let p = Polynomial::from_qubo(&q);
        let x = bits(mask, n);
        prop_assert!((q.energy(&x).unwrap() - p.evaluate(&x).unwrap()).abs() < 1e-9);
    }

    #[test]
    fn hamiltonian_forms_agree(
        (n, terms) in qubo_terms(),
        x in prop::collection::vec(0.0f64..3.0, 6),
    ) {
        let mut h = Hamiltonian::new(n);
        for (i, j, v) in terms {
            if i == j {
                h.add_linear(i, v).unwrap();
            }
            h.add_quadratic(i, j, v).unwrap();
        }
        let x = &x[..n];
        let e = h.energy(x).unwrap();
        let from_matrix = Hamiltonian::from_coefficient_matrix(&h.to_coefficient_matrix()).unwrap();
        prop_assert!((from_matrix.energy(x).unwrap() - e).abs() < 1e-9);
        prop_assert!((h.to_polynomial().evaluate(x).unwrap() - e).abs() < 1e-9);
    }

    #[test]
    fn partition_energy_is_cost_plus_violation(p in set_partition(), weight in 0.5f64..20.0, mask in 0u32..64) {
        let q = p.to_qubo(Penalty::Fixed(weight)).unwrap();
        let k = p.num_subsets();
        let x = bits(mask, k);
        let assignment: Vec<u8> = x.iter().map(|&v| v as u8).collect();
        let report = p.check(&assignment).unwrap();
        let expected = report.cost + weight * report.violation;
        prop_assert!((q.energy(&x).unwrap() - expected).abs() < 1e-6);
    }

    #[test]
    fn auto_penalty_ground_state_is_optimal_cover(p in set_partition()) {
        let k = p.num_subsets();
        let q = p.to_qubo(Penalty::Auto).unwrap();
        let ground = (0..(1u32 << k))
            .map(|m| q.energy(&bits(m, k)).unwrap())
            .fold(f64::INFINITY, f64::min);
        if let Some((_, cost)) = p.brute_force_optimum() {
            prop_assert!((ground - cost).abs() < 1e-6);
        }
    }
}
