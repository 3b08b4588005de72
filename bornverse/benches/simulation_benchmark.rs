use criterion::{criterion_group, criterion_main, Criterion};

use bornverse::{
    simulate, Boundary, Circuit, Gate, Geometry, InitSpec, Outcome, ProductSpec, RecordWhen,
    SimulationState, StreamName,
};

fn monitored_circuit(length: usize, p_meas: f64) -> Circuit {
    Circuit::build(
        length,
        Boundary::Open,
        length,
        [("p_meas".to_string(), p_meas)],
        |c| {
            c.apply(Gate::HaarRandom, Geometry::staircase_right(1))?;
            let p = c.param("p_meas").unwrap_or(0.0);
            for site in 1..=length {
                c.apply_with_prob(
                    StreamName::Ctrl,
                    vec![Outcome::new(
                        p,
                        Gate::Measurement(bornverse::MeasureBasis::Z),
                        Geometry::SingleSite(site),
                    )],
                )?;
            }
            Ok(())
        },
    )
    .unwrap()
}

fn bench_monitored_trajectory(criterion: &mut Criterion) {
    let length = 12;
    let circuit = monitored_circuit(length, 0.15);
    criterion.bench_function("monitored_trajectory_n12", |b| {
        b.iter(|| {
            let mut state = SimulationState::new(length, Boundary::Open)
                .unwrap()
                .with_max_bond(32)
                .unwrap()
                .with_seed(42);
            state
                .initialize(InitSpec::Product(ProductSpec::BinaryInt(0)))
                .unwrap();
            simulate(&circuit, &mut state, 2, &RecordWhen::FinalOnly).unwrap();
        });
    });
}

fn bench_expansion(criterion: &mut Criterion) {
    let circuit = monitored_circuit(16, 0.25);
    criterion.bench_function("expand_circuit_n16", |b| {
        b.iter(|| bornverse::expand_circuit(&circuit, 7).unwrap());
    });
}

criterion_group!(benches, bench_monitored_trajectory, bench_expansion);
criterion_main!(benches);
