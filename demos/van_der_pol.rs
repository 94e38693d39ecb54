//! # Example: Van der Pol oscillator
//!
//! Stiff Van der Pol equation in singular-perturbation form, integrated
//! with Radau5 and sampled every 0.2 by dense output.
//!
//! Equations:
//! dy0/dx = y1
//! eps * dy1/dx = (1 - y0^2) * y1 - y0
//!
//! Initial conditions: y0(0) = 2.0, y1(0) = -0.66

use odekit::prelude::*;
use odekit::problems::VanDerPol;

struct Printer;

impl SolOut for Printer {
    fn dense(&mut self, istep: usize, _h: f64, _x: f64, _y: &[f64], xout: f64, yout: &[f64]) -> ControlFlag {
        println!("step = {istep:>4}, x = {xout:>4.1}, y = [{:>9.6}, {:>9.6}]", yout[0], yout[1]);
        ControlFlag::Continue
    }
}

fn main() {
    env_logger::init();

    let vdp = VanDerPol::new(1e-6);
    let config = Config::builder()
        .method(Method::Radau5)
        .h0(1e-6)
        .dense_dx(0.2)
        .build();
    let mut y = vec![2.0, -0.66];

    let mut solver = match Solver::new(vdp.ndim(), config) {
        Ok(s) => s,
        Err(e) => return eprintln!("invalid configuration: {e}"),
    };
    match solver.solve_with(&vdp, &mut y, 0.0, vdp.xf(), &mut Printer) {
        Ok(status) => {
            println!("Finished status: {status:?}");
            println!("Final state: y = {y:?}");
            println!("{}", solver.stats());
        }
        Err(f) => eprintln!("Radau5 failed: {f}"),
    }
}
