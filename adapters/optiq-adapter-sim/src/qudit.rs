//! Samplers for qudit problems over continuous or integer variables.

use optiq_model::{ModelResult, Objective, Sample};
use rand::Rng;

/// Improvement passes allowed per step size.
const MAX_PASSES_PER_STEP: usize = 200;

/// Relative improvement below which a move is not taken.
const IMPROVEMENT_EPS: f64 = 1e-12;

/// Local search on the scaled simplex `{x ≥ 0, Σx = total}`.
///
/// Each restart starts from a random point and repeatedly moves mass
/// between pairs of variables, halving the step when no pair improves.
/// With a `precision`, the final point is snapped to multiples of it.
pub fn simplex_search<R: Rng>(
    objective: &dyn Objective,
    total: f64,
    precision: Option<f64>,
    restarts: usize,
    rng: &mut R,
) -> ModelResult<Vec<Sample>> {
    let n = objective.num_variables();
    let min_step = precision.map_or(total * 1e-6, |p| p / 4.0);

    let mut samples = Vec::with_capacity(restarts);
    for _ in 0..restarts {
        let weights: Vec<f64> = (0..n).map(|_| rng.r#gen::<f64>() + 1e-9).collect();
        let norm: f64 = weights.iter().sum();
        let mut x: Vec<f64> = weights.iter().map(|w| w / norm * total).collect();
        let mut energy = objective.evaluate(&x)?;

        let mut step = total / 2.0;
        while step >= min_step {
            let mut passes = 0;
            loop {
                let mut improved = false;
                for i in 0..n {
                    for j in 0..n {
                        if i == j || x[i] <= 0.0 {
                            continue;
                        }
                        let d = step.min(x[i]);
                        let (xi, xj) = (x[i], x[j]);
                        x[i] = xi - d;
                        x[j] = xj + d;
                        let candidate = objective.evaluate(&x)?;
                        if candidate < energy - IMPROVEMENT_EPS * energy.abs().max(1.0) {
                            energy = candidate;
                            improved = true;
                        } else {
                            x[i] = xi;
                            x[j] = xj;
                        }
                    }
                }
                passes += 1;
                if !improved || passes >= MAX_PASSES_PER_STEP {
                    break;
                }
            }
            step /= 2.0;
        }

        if let Some(p) = precision {
            x = snap_to_grid(&x, total, p);
        }
        let energy = objective.evaluate(&x)?;
        samples.push(Sample::new(x, energy));
    }
    Ok(samples)
}

/// Round `x` to multiples of `precision` keeping `Σx = round(total / precision)·precision`.
///
/// Units left over after flooring go to the largest fractional parts.
pub fn snap_to_grid(x: &[f64], total: f64, precision: f64) -> Vec<f64> {
    let n = x.len();
    if n == 0 {
        return Vec::new();
    }
    let target = (total / precision).round() as i64;
    let scaled: Vec<f64> = x.iter().map(|v| v.max(0.0) / precision).collect();
    let mut units: Vec<i64> = scaled.iter().map(|v| v.floor() as i64).collect();

    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| {
        let fa = scaled[a] - scaled[a].floor();
        let fb = scaled[b] - scaled[b].floor();
        fb.total_cmp(&fa)
    });

    let mut remainder = target - units.iter().sum::<i64>();
    let mut cursor = 0;
    while remainder > 0 {
        units[order[cursor % n]] += 1;
        remainder -= 1;
        cursor += 1;
    }
    // Flooring never overshoots, but guard rounding of the target.
    let mut cursor = n;
    while remainder < 0 && cursor > 0 {
        cursor -= 1;
        let i = order[cursor];
        if units[i] > 0 {
            units[i] -= 1;
            remainder += 1;
            cursor += 1;
        }
    }

    units.iter().map(|&u| u as f64 * precision).collect()
}

/// Simulated annealing over integer levels `x_i ∈ 0..levels[i]`.
///
/// Moves step a single variable up or down by one level.
pub fn anneal_levels<R: Rng>(
    objective: &dyn Objective,
    levels: &[u32],
    num_reads: usize,
    sweeps: usize,
    rng: &mut R,
) -> ModelResult<Vec<Sample>> {
    let n = objective.num_variables();
    let sweeps = sweeps.max(1);
    let (hot, cold) = estimate_temperatures(objective, levels, rng)?;
    let ratio = cold / hot;

    let mut samples = Vec::with_capacity(num_reads);
    for _ in 0..num_reads {
        let mut x = random_levels(levels, rng);
        let mut energy = objective.evaluate(&x)?;

        for sweep in 0..sweeps {
            let frac = if sweeps == 1 {
                1.0
            } else {
                sweep as f64 / (sweeps - 1) as f64
            };
            let t = hot * ratio.powf(frac);
            for i in 0..n {
                let top = f64::from(levels[i].saturating_sub(1));
                let current = x[i];
                let proposed = if rng.gen_bool(0.5) {
                    current + 1.0
                } else {
                    current - 1.0
                };
                if proposed < 0.0 || proposed > top {
                    continue;
                }
                x[i] = proposed;
                let candidate = objective.evaluate(&x)?;
                let delta = candidate - energy;
                if delta <= 0.0 || rng.r#gen::<f64>() < (-delta / t).exp() {
                    energy = candidate;
                } else {
                    x[i] = current;
                }
            }
        }

        samples.push(Sample::new(x, energy));
    }
    Ok(samples)
}

fn random_levels<R: Rng>(levels: &[u32], rng: &mut R) -> Vec<f64> {
    levels
        .iter()
        .map(|&l| f64::from(rng.gen_range(0..l.max(1))))
        .collect()
}

/// Spread of the objective over a few random points.
fn estimate_temperatures<R: Rng>(
    objective: &dyn Objective,
    levels: &[u32],
    rng: &mut R,
) -> ModelResult<(f64, f64)> {
    let mut lo = f64::INFINITY;
    let mut hi = f64::NEG_INFINITY;
    for _ in 0..32 {
        let e = objective.evaluate(&random_levels(levels, rng))?;
        lo = lo.min(e);
        hi = hi.max(e);
    }
    let hot = (hi - lo).max(1e-9);
    Ok((hot, hot * 1e-3))
}

#[cfg(test)]
mod tests {
    use super::*;
    use optiq_model::{Hamiltonian, Polynomial};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_simplex_balanced_quadratic() {
        // E = x0² + x1², minimum on Σx = 1 at (0.5, 0.5)
        let mut h = Hamiltonian::new(2);
        h.add_quadratic(0, 0, 1.0).unwrap();
        h.add_quadratic(1, 1, 1.0).unwrap();

        let mut rng = StdRng::seed_from_u64(3);
        let samples = simplex_search(&h, 1.0, Some(0.01), 4, &mut rng).unwrap();
        for s in &samples {
            assert!((s.sum() - 1.0).abs() < 1e-9);
            assert!((s.energy - 0.5).abs() < 1e-3);
        }
    }

    #[test]
    fn test_simplex_linear_vertex() {
        // E = x0 - x1 on Σx = 2 is minimised at (0, 2)
        let mut h = Hamiltonian::new(2);
        h.add_linear(0, 1.0).unwrap();
        h.add_linear(1, -1.0).unwrap();

        let mut rng = StdRng::seed_from_u64(11);
        let samples = simplex_search(&h, 2.0, None, 3, &mut rng).unwrap();
        for s in &samples {
            assert!(s.values[0].abs() < 1e-9);
            assert!((s.energy + 2.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_snap_to_grid_preserves_sum() {
        let snapped = snap_to_grid(&[0.333, 0.333, 0.334], 1.0, 0.1);
        let sum: f64 = snapped.iter().sum();
        assert!((sum - 1.0).abs() < 1e-9);
        for v in &snapped {
            let units = v / 0.1;
            assert!((units - units.round()).abs() < 1e-9);
        }
    }

    #[test]
    fn test_snap_to_grid_largest_remainder() {
        let snapped = snap_to_grid(&[1.26, 0.74], 2.0, 0.5);
        assert_eq!(snapped, vec![1.0, 1.0]);
        let snapped = snap_to_grid(&[1.4, 0.6], 2.0, 0.5);
        assert_eq!(snapped, vec![1.5, 0.5]);
    }

    #[test]
    fn test_anneal_levels_finds_integer_minimum() {
        // E = x0² - 4x0 + x1² - 2x1, minimum at (2, 1) with E = -5
        let mut p = Polynomial::new(2);
        p.add_term(&[0, 0], 1.0).unwrap();
        p.add_term(&[0], -4.0).unwrap();
        p.add_term(&[1, 1], 1.0).unwrap();
        p.add_term(&[1], -2.0).unwrap();

        let mut rng = StdRng::seed_from_u64(5);
        let samples = anneal_levels(&p, &[4, 4], 10, 200, &mut rng).unwrap();
        let best = samples
            .iter()
            .min_by(|a, b| a.energy.total_cmp(&b.energy))
            .unwrap();
        assert_eq!(best.values, vec![2.0, 1.0]);
        assert_eq!(best.energy, -5.0);
        for s in &samples {
            assert!(s.values.iter().all(|v| *v >= 0.0 && *v <= 3.0));
        }
    }
}
