use std::time::Instant;

use graded_cpg::{
    engine,
    params::{NetworkParams, NeuronParams, SynapseParams, SynapseSpec, TechnicalParams},
    time_series::TimeSeries,
};
use rand::{distributions::Uniform, prelude::Distribution, rngs::StdRng, SeedableRng};
use statrs::distribution::Poisson;

const NUM_NEURONS: usize = 400;
const NUM_SYNAPSES_PER_NEURON: usize = 4;
const TF: f64 = 0.25;
const DT: f64 = 1e-4;
const PULSE_DURATION: f64 = 10e-3;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut rng = StdRng::seed_from_u64(0);
    let nid_dist = Uniform::new(0, NUM_NEURONS);
    let e_syn_dist = Uniform::new(-100e-3, 0.0);
    let gmax_dist = Uniform::new(0.0, 0.5e-6);

    let neuron_params = NeuronParams::default();
    let e_lo = neuron_params.er;
    let e_hi = neuron_params.er + neuron_params.voltage_range;

    let synapses = (0..NUM_NEURONS * NUM_SYNAPSES_PER_NEURON)
        .map(|syn_idx| {
            SynapseSpec::new(
                nid_dist.sample(&mut rng),
                syn_idx / NUM_SYNAPSES_PER_NEURON,
                SynapseParams {
                    gmax: gmax_dist.sample(&mut rng),
                    e_syn: e_syn_dist.sample(&mut rng),
                    e_hi,
                    e_lo,
                },
            )
        })
        .collect();

    let params = NetworkParams {
        neurons: vec![neuron_params.clone(); NUM_NEURONS],
        synapses,
        technical_params: TechnicalParams {
            num_threads: None,
            pin_threads: false,
        },
    };

    let mut engine = engine::create_engine(params).unwrap();
    engine.set_simulation_properties(TF, DT, None).unwrap();

    let num_timesteps = engine.get_num_timesteps();
    let pulse_len = (PULSE_DURATION / DT) as usize;
    let pulse_amplitude = neuron_params.gm * neuron_params.voltage_range;
    let num_pulses_dist = Poisson::new(3.0).unwrap();
    let onset_dist = Uniform::new(0, num_timesteps);

    let mut applied_currents = TimeSeries::zeros(num_timesteps, NUM_NEURONS);
    let mut pulse_count = 0;

    for nid in 0..NUM_NEURONS {
        let num_pulses = num_pulses_dist.sample(&mut rng) as usize;
        pulse_count += num_pulses;

        for _ in 0..num_pulses {
            let onset = onset_dist.sample(&mut rng);
            for k in onset..(onset + pulse_len).min(num_timesteps) {
                applied_currents.row_mut(k)[nid] += pulse_amplitude;
            }
        }
    }

    engine.set_applied_currents(applied_currents).unwrap();

    let wall_start = Instant::now();
    engine.simulate().unwrap();
    let wall_time = wall_start.elapsed();

    let neuron_step_throughput =
        (num_timesteps * NUM_NEURONS) as f64 / wall_time.as_secs_f64();
    let checksum: f64 = engine.record().vs.as_slice().iter().sum();

    eprintln!("Stimulus pulses: {}", pulse_count);
    eprintln!(
        "Neuron update throughput: {:.3e} ({:.3} ns per neuron update)",
        neuron_step_throughput,
        1e9 / neuron_step_throughput
    );
    eprintln!("Diverged: {:?}", engine.find_divergence());
    eprintln!("Checksum: {}", checksum);
}
