//! # Example: Robertson's chemical reaction
//!
//! Three species with rate constants spanning nine orders of magnitude.
//! The run is repeated with dense and sparse linear algebra.

use odekit::prelude::*;
use odekit::problems::Robertson;

fn main() {
    let rober = Robertson;
    for storage in [Storage::Dense, Storage::Sparse] {
        let config = Config::builder()
            .method(Method::Radau5)
            .rtol(1e-2)
            .atol(1e-8)
            .h0(1e-6)
            .storage(storage)
            .build();
        let mut y = rober.y0();
        let mut solver = Solver::new(rober.ndim(), config).expect("valid configuration");
        match solver.solve(&rober, &mut y, 0.0, rober.xf()) {
            Ok(_) => {
                println!("{storage:?}: y({}) = {y:?}", rober.xf());
                println!("{}", solver.stats());
                let out = solver.output();
                for (x, h) in out.step_x().iter().zip(out.step_h()) {
                    println!("x = {x:>10.3e}, h = {h:>10.3e}");
                }
            }
            Err(f) => eprintln!("{storage:?}: {f}"),
        }
    }
}
