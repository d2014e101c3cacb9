//! Euler forward models for the inverse solvers.

/// Integrate `dOD/dt = mu(t) * OD` forward from `od0`.
///
/// `mu` is sampled at uniform steps of width `dt`; the trajectory is
/// recorded before each step, so `out[0] == od0` and `out` has `mu.len()`
/// points.
pub fn simulate_growth(mu: &[f64], od0: f64, dt: f64) -> Vec<f64> {
    let mut out = Vec::with_capacity(mu.len());
    let mut od = od0;
    for &m in mu {
        out.push(od);
        od += m * od * dt;
    }
    out
}

/// Integrate reporter accumulation `dP/dt = OD(t)*profile(t) - gamma*P`
/// forward from `p0` over the same uniform grid as `od`.
pub fn simulate_synthesis(profile: &[f64], od: &[f64], p0: f64, gamma: f64, dt: f64) -> Vec<f64> {
    debug_assert_eq!(profile.len(), od.len());
    let mut out = Vec::with_capacity(profile.len());
    let mut p = p0;
    for (&rate, &density) in profile.iter().zip(od.iter()) {
        out.push(p);
        p += (density * rate - gamma * p) * dt;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_growth_constant_rate_is_geometric() {
        let mu = vec![0.5; 10];
        let od = simulate_growth(&mu, 1.0, 0.1);
        assert_eq!(od[0], 1.0);
        // Each step multiplies by (1 + mu*dt).
        for i in 1..od.len() {
            assert!((od[i] / od[i - 1] - 1.05).abs() < 1e-12);
        }
    }

    #[test]
    fn test_synthesis_without_decay_accumulates() {
        let profile = vec![2.0; 5];
        let od = vec![1.0; 5];
        let p = simulate_synthesis(&profile, &od, 0.0, 0.0, 0.5);
        assert_eq!(p, vec![0.0, 1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_synthesis_decay_reaches_steady_state() {
        // Steady state at od*rate/gamma = 4.
        let n = 2000;
        let profile = vec![2.0; n];
        let od = vec![1.0; n];
        let p = simulate_synthesis(&profile, &od, 0.0, 0.5, 0.01);
        assert!((p[n - 1] - 4.0).abs() < 0.05);
    }
}
