use factorfolio_primitives::{Date, ReturnMatrix, Symbol};
use ndarray::Array2;
use rand::{SeedableRng, rngs::StdRng};
use rand_distr::{Distribution, Normal};

/// Daily returns from one market factor plus idiosyncratic noise.
pub(crate) fn synthetic_returns(rows: usize, assets: usize, drift: f64, seed: u64) -> ReturnMatrix {
    let mut rng = StdRng::seed_from_u64(seed);
    let market = Normal::new(0.0, 0.008).unwrap();
    let noise = Normal::new(0.0, 0.012).unwrap();

    let mut values = Array2::zeros((rows, assets));
    for mut row in values.rows_mut() {
        let m = market.sample(&mut rng);
        for (j, v) in row.iter_mut().enumerate() {
            let beta = 0.6 + 0.2 * j as f64;
            *v = drift + beta * m + noise.sample(&mut rng);
        }
    }

    let start = Date::from_ymd_opt(2020, 1, 1).unwrap();
    let dates = (0..rows).map(|i| start + chrono::Days::new(i as u64)).collect();
    let tickers = (0..assets).map(|j| Symbol::new(format!("A{j}"))).collect();
    ReturnMatrix::new(dates, tickers, values).unwrap()
}
