//! Samplers for binary QUBOs.
//!
//! Both samplers track the local field `g_k = Σ_{j≠k} Q_kj x_j`, so the
//! energy change of flipping `x_k` is `s·(2·g_k + Q_kk)` with `s = +1`
//! for `0 → 1` and `-1` for `1 → 0`.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use ndarray::Array2;
use optiq_model::{ModelResult, Qubo, Sample};
use rand::Rng;
use tracing::debug;

/// Largest QUBO enumerated exhaustively.
pub const EXHAUSTIVE_LIMIT: usize = 20;

#[derive(Debug, Clone, Copy)]
struct Scored {
    energy: f64,
    state: u64,
}

impl PartialEq for Scored {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Scored {}

impl PartialOrd for Scored {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Scored {
    fn cmp(&self, other: &Self) -> Ordering {
        self.energy
            .total_cmp(&other.energy)
            .then(self.state.cmp(&other.state))
    }
}

fn flip_delta(q: &Array2<f64>, g: &[f64], x: &[u8], k: usize) -> f64 {
    let s = if x[k] == 0 { 1.0 } else { -1.0 };
    s * (2.0 * g[k] + q[[k, k]])
}

fn flip(q: &Array2<f64>, g: &mut [f64], x: &mut [u8], k: usize) {
    let s = if x[k] == 0 { 1.0 } else { -1.0 };
    x[k] ^= 1;
    for (j, gj) in g.iter_mut().enumerate() {
        if j != k {
            *gj += s * q[[j, k]];
        }
    }
}

fn local_fields(q: &Array2<f64>, x: &[u8]) -> Vec<f64> {
    let n = x.len();
    (0..n)
        .map(|k| {
            (0..n)
                .filter(|&j| j != k && x[j] == 1)
                .map(|j| q[[k, j]])
                .sum()
        })
        .collect()
}

fn to_values(x: &[u8]) -> Vec<f64> {
    x.iter().map(|&b| f64::from(b)).collect()
}

/// Enumerate all `2ⁿ` assignments in Gray-code order and keep the `keep`
/// lowest-energy ones, ascending.
///
/// Callers must keep `n ≤ EXHAUSTIVE_LIMIT`.
pub fn exhaustive(qubo: &Qubo, keep: usize) -> ModelResult<Vec<Sample>> {
    let n = qubo.num_variables();
    let q = qubo.matrix();
    let keep = keep.max(1);

    let mut x = vec![0u8; n];
    let mut g = vec![0.0; n];
    let mut energy = qubo.offset();
    let mut state: u64 = 0;

    let mut heap = BinaryHeap::with_capacity(keep + 1);
    heap.push(Scored { energy, state });

    for step in 1..(1u64 << n) {
        let k = step.trailing_zeros() as usize;
        energy += flip_delta(q, &g, &x, k);
        flip(q, &mut g, &mut x, k);
        state ^= 1 << k;

        heap.push(Scored { energy, state });
        if heap.len() > keep {
            heap.pop();
        }
    }
    debug!("Enumerated {} states of {} variables", 1u64 << n, n);

    heap.into_sorted_vec()
        .into_iter()
        .map(|s| {
            let values: Vec<f64> = (0..n).map(|i| ((s.state >> i) & 1) as f64).collect();
            // Recompute to drop drift from the incremental updates.
            let energy = qubo.energy(&values)?;
            Ok(Sample::new(values, energy))
        })
        .collect()
}

/// Hottest and coldest annealing temperatures for a QUBO.
fn temperature_range(q: &Array2<f64>) -> (f64, f64) {
    let n = q.nrows();
    let max_delta = (0..n)
        .map(|k| {
            q[[k, k]].abs()
                + 2.0
                    * (0..n)
                        .filter(|&j| j != k)
                        .map(|j| q[[k, j]].abs())
                        .sum::<f64>()
        })
        .fold(0.0_f64, f64::max)
        .max(1e-9);
    let hot = max_delta / std::f64::consts::LN_2;
    (hot, hot * 1e-3)
}

/// Simulated annealing with a geometric schedule, one read per sample.
pub fn anneal<R: Rng>(
    qubo: &Qubo,
    num_reads: usize,
    sweeps: usize,
    rng: &mut R,
) -> ModelResult<Vec<Sample>> {
    let n = qubo.num_variables();
    let q = qubo.matrix();
    let (hot, cold) = temperature_range(q);
    let sweeps = sweeps.max(1);
    let ratio = cold / hot;

    let mut samples = Vec::with_capacity(num_reads);
    for _ in 0..num_reads {
        let mut x: Vec<u8> = (0..n).map(|_| u8::from(rng.gen_bool(0.5))).collect();
        let mut g = local_fields(q, &x);

        for sweep in 0..sweeps {
            let frac = if sweeps == 1 {
                1.0
            } else {
                sweep as f64 / (sweeps - 1) as f64
            };
            let t = hot * ratio.powf(frac);
            for k in 0..n {
                let delta = flip_delta(q, &g, &x, k);
                if delta <= 0.0 || rng.r#gen::<f64>() < (-delta / t).exp() {
                    flip(q, &mut g, &mut x, k);
                }
            }
        }

        let values = to_values(&x);
        let energy = qubo.energy(&values)?;
        samples.push(Sample::new(values, energy));
    }
    Ok(samples)
}
