//! Radau5 on the stiff reference problems.

use approx::{assert_abs_diff_eq, assert_relative_eq};
use odekit::prelude::*;
use odekit::problems::{Amplifier, HwEq11, Robertson, VanDerPol};

mod common;
use common::{assert_stats, run};

fn robertson_config(storage: Storage) -> Config {
    Config::builder()
        .method(Method::Radau5)
        .rtol(1e-2)
        .atol(1e-8)
        .h0(1e-6)
        .storage(storage)
        .build()
}

#[test_log::test]
fn robertson() {
    let p = Robertson;
    let (solver, y) = run(&p, p.y0(), p.xf(), robertson_config(Storage::Dense));
    let stats = solver.stats();
    assert_stats(stats, [87, 8, 17, 15, 1, 15, 24, 2]);
    assert_eq!(stats.nrejected, 1);
    assert!(stats.naccepted + stats.nrejected <= stats.nsteps);
    assert!(solver.output().step_x().windows(2).all(|w| w[1] > w[0]));
    assert_relative_eq!(y[0], 0.988_674_013_849_988_3, max_relative = 1e-8);
    assert_relative_eq!(y[1], 3.447_720_471_782_07e-5, max_relative = 1e-6);
    assert_relative_eq!(y[2], 0.011_291_508_945_293_908, max_relative = 1e-6);
    // mass is conserved
    assert_abs_diff_eq!(y.iter().sum::<f64>(), 1.0, epsilon = 1e-12);
}

#[test]
fn robertson_with_sparse_storage() {
    let p = Robertson;
    let (_, dense) = run(&p, p.y0(), p.xf(), robertson_config(Storage::Dense));
    let (solver, sparse) = run(&p, p.y0(), p.xf(), robertson_config(Storage::Sparse));
    for (a, b) in dense.iter().zip(&sparse) {
        assert_relative_eq!(*a, *b, max_relative = 1e-4);
    }
    assert!(solver.stats().ndecomp > 0);
}

#[test_log::test]
fn van_der_pol() {
    let p = VanDerPol::new(1e-6);
    let config = Config::builder().method(Method::Radau5).build();
    let (solver, _) = run(&p, p.y0(), p.xf(), config);
    assert_stats(solver.stats(), [2233, 160, 280, 241, 7, 251, 663, 6]);
}

#[derive(Default)]
struct Samples {
    s: Vec<usize>,
    x: Vec<f64>,
    y: Vec<[f64; 2]>,
}

impl SolOut for Samples {
    fn dense(&mut self, istep: usize, _h: f64, _x: f64, _y: &[f64], xout: f64, yout: &[f64]) -> ControlFlag {
        self.s.push(istep);
        self.x.push(xout);
        self.y.push([yout[0], yout[1]]);
        ControlFlag::Continue
    }
}

const DR1_S: [usize; 11] = [0, 10, 11, 13, 22, 123, 124, 126, 133, 237, 238];
const DR1_Y: [[f64; 2]; 11] = [
    [2.0, -0.66],
    [1.858_198_963_529_373_9, -0.757_479_103_445_948_71],
    [1.693_205_231_356_641_2, -0.906_902_161_688_390_88],
    [1.484_565_763_233_086_2, -1.233_096_964_774_279_8],
    [1.083_912_894_828_038_1, -6.196_077_501_342_454_5],
    [-1.863_645_642_467_325_1, 0.753_532_376_654_729_72],
    [-1.699_724_325_407_351_7, 0.899_769_274_732_402_31],
    [-1.493_375_073_281_547_6, 1.213_880_891_197_883_3],
    [-1.120_780_440_545_219_3, 4.374_794_948_978_695_3],
    [1.869_050_586_421_524_1, -0.749_575_307_231_945_43],
    [1.706_161_100_558_772, -0.892_807_477_684_488_54],
];

#[test_log::test]
fn van_der_pol_dense_output() {
    let p = VanDerPol::new(1e-6);
    let config = Config::builder()
        .method(Method::Radau5)
        .h0(1e-6)
        .dense_dx(0.2)
        .build();
    let mut samples = Samples::default();
    let mut y = vec![2.0, -0.66];
    let mut solver = Solver::new(2, config).unwrap();
    let status = solver.solve_with(&p, &mut y, 0.0, p.xf(), &mut samples).unwrap();
    assert_eq!(status, Status::Success);
    assert_stats(solver.stats(), [2218, 161, 275, 238, 8, 248, 660, 6]);

    assert_eq!(samples.s, DR1_S);
    for (k, x) in samples.x.iter().enumerate() {
        assert_abs_diff_eq!(*x, 0.2 * k as f64, epsilon = 1e-14);
        assert_abs_diff_eq!(samples.y[k][0], DR1_Y[k][0], epsilon = 1e-8);
        assert_abs_diff_eq!(samples.y[k][1], DR1_Y[k][1], epsilon = 1e-7);
    }

    // the same samples are recorded in the output
    let out = solver.output();
    assert_eq!(out.dense_s(), DR1_S);
    assert_eq!(out.dense_x(), samples.x);
    assert_eq!(out.dense_y(1), samples.y.iter().map(|y| y[1]).collect::<Vec<_>>());
}

#[test]
fn stored_dense_output_can_be_resampled() {
    let p = VanDerPol::new(1e-6);
    let config = Config::builder()
        .method(Method::Radau5)
        .h0(1e-6)
        .dense_dx(0.2)
        .dense_output(true)
        .build();
    let (solver, _) = run(&p, vec![2.0, -0.66], p.xf(), config);
    let out = solver.output();
    let walk = out.sample(0.2);
    assert_eq!(walk.len(), 11);
    for (k, (s, x, y)) in walk.iter().enumerate().skip(1) {
        assert_eq!(*s, out.dense_s()[k]);
        assert_eq!(*x, out.dense_x()[k]);
        assert_abs_diff_eq!(y[0], out.dense_y(0)[k], epsilon = 1e-12);
    }
}

#[test_log::test]
fn amplifier_with_mass_matrix() {
    let p = Amplifier::new();
    let config = Config::builder()
        .method(Method::Radau5)
        .rtol(1e-5)
        .atol(1e-11)
        .h0(1e-6)
        .storage(Storage::Sparse)
        .nmax_steps(10_000)
        .build();
    let (solver, y) = run(&p, p.y0(), p.xf(), config);
    let stats = solver.stats();
    // Newton divergence is retried with h/2 and only counted in nsteps
    assert_eq!(stats.nfeval, 2622, "{stats}");
    assert_eq!(stats.njeval, 216, "{stats}");
    assert_eq!(stats.nsteps, 283, "{stats}");
    assert_eq!(stats.naccepted, 223, "{stats}");
    assert_eq!(stats.nrejected, 18, "{stats}");
    assert_eq!(stats.ndecomp, 281, "{stats}");
    assert_eq!(stats.nlinsol, 799, "{stats}");
    assert!(stats.naccepted + stats.nrejected < stats.nsteps);
    assert!(solver.output().step_x().windows(2).all(|w| w[1] > w[0]));
    assert!(y.iter().all(|v| v.is_finite() && v.abs() < 10.0), "{y:?}");
}

#[test]
fn constant_jacobian_is_evaluated_once() {
    // y' = -y², y(0) = 1, so y = 1/(1 + x)
    struct Quadratic;
    impl ODE for Quadratic {
        fn ode(&self, _x: f64, y: &[f64], f: &mut [f64]) {
            f[0] = -y[0] * y[0];
        }
        fn jac(&self, _x: f64, y: &[f64], jac: &mut SystemMatrix) -> bool {
            jac.put(0, 0, -2.0 * y[0]);
            true
        }
    }
    let config = Config::builder().method(Method::Radau5).cte_jac(true).build();
    let (solver, y) = run(&Quadratic, vec![1.0], 1.0, config);
    assert_eq!(solver.stats().njeval, 1);
    assert_abs_diff_eq!(y[0], 0.5, epsilon = 1e-3);
}

#[test]
fn zero_starting_values() {
    let p = HwEq11;
    let config = Config::builder().method(Method::Radau5).zero_trial(true).build();
    let (_, y) = run(&p, p.y0(), p.xf(), config);
    assert!((y[0] - p.solution(p.xf())).abs() < 3.5e-5);
}

#[test]
fn backward_euler_with_mass_matrix() {
    // M·y' = f with M = 2·I is y' = f/2
    struct Scaled;
    impl ODE for Scaled {
        fn ode(&self, _x: f64, y: &[f64], f: &mut [f64]) {
            f[0] = -2.0 * y[0];
        }
        fn mass(&self, m: &mut SystemMatrix) -> bool {
            m.put(0, 0, 2.0);
            true
        }
    }
    let (_, y) = run(&Scaled, vec![1.0], 1.0, Config::fixed_step(Method::BwEuler, 2e-3));
    assert_abs_diff_eq!(y[0], (-1.0f64).exp(), epsilon = 1e-3);
}
