//! # Example: Amplifier DAE (index-1)
//!
//! Transistor amplifier from Hairer & Wanner, Solving ODEs II, in the
//! mass-matrix formulation `M y' = f(x, y)` with a singular M. Prints the
//! input and output voltages from the continuous output.

use odekit::prelude::*;
use odekit::problems::Amplifier;

fn main() {
    let amp = Amplifier::new();
    let config = Config::builder()
        .method(Method::Radau5)
        .rtol(1e-5)
        .atol(1e-11)
        .h0(1e-6)
        .storage(Storage::Sparse)
        .nmax_steps(10_000)
        .dense_output(true)
        .build();
    let mut y = amp.y0();
    let mut solver = Solver::new(amp.ndim(), config).expect("valid configuration");
    if let Err(f) = solver.solve(&amp, &mut y, 0.0, amp.xf()) {
        eprintln!("amplifier failed: {f}");
        return;
    }
    println!("{}", solver.stats());
    for (istep, x, yi) in solver.output().sample(2.5e-3) {
        println!("step = {istep:>4}, x = {x:.4}, u_in = {:>8.5}, u_out = {:>8.5}", yi[7], yi[0]);
    }
}
