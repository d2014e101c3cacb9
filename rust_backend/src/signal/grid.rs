//! Time-grid construction helpers.

/// `n` evenly spaced points over `[start, stop]`, endpoints included.
pub fn linspace(start: f64, stop: f64, n: usize) -> Vec<f64> {
    match n {
        0 => vec![],
        1 => vec![start],
        _ => {
            let step = (stop - start) / (n - 1) as f64;
            (0..n).map(|i| start + step * i as f64).collect()
        }
    }
}

/// Points from `start` up to (excluding) `stop` in increments of `step`.
pub fn arange(start: f64, stop: f64, step: f64) -> Vec<f64> {
    if step <= 0.0 || stop <= start {
        return vec![];
    }
    let n = ((stop - start) / step).ceil() as usize;
    (0..n)
        .map(|i| start + step * i as f64)
        .filter(|&x| x < stop)
        .collect()
}
