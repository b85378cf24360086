use graded_cpg::{engine, time_series::TimeSeries};
use itertools::Itertools;
use serde::Serialize;

#[path = "../scenario_params.rs"]
mod scenario_params;

#[derive(Serialize)]
struct Summary {
    num_timesteps: usize,
    voltage_checksums: Vec<f64>,
    gate_checksums: Vec<f64>,
    synaptic_current_checksums: Vec<f64>,
    conductance_checksum: f64,
    upward_crossings: Vec<usize>,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let params = scenario_params::get_scenario_params();
    let pulse_amplitude = params.neurons[scenario_params::PULSE_NID].gm
        * params.neurons[scenario_params::PULSE_NID].voltage_range;
    let num_neurons = params.neurons.len();
    let midpoints: Vec<f64> = params
        .neurons
        .iter()
        .map(|neuron_params| neuron_params.er + 0.5 * neuron_params.voltage_range)
        .collect();

    let mut engine = engine::create_engine(params).unwrap();
    engine
        .set_simulation_properties(scenario_params::TF, scenario_params::DT, None)
        .unwrap();

    let ts = engine.record().ts.clone();
    let applied_currents = TimeSeries::from_fn(ts.len(), num_neurons, |k, nid| {
        let t = ts[k];
        let in_pulse = t >= scenario_params::PULSE_START
            && t < scenario_params::PULSE_START + scenario_params::PULSE_DURATION;

        if nid == scenario_params::PULSE_NID && in_pulse {
            pulse_amplitude
        } else {
            0.0
        }
    });

    engine.set_applied_currents(applied_currents).unwrap();
    engine.simulate().unwrap();

    let record = engine.record();
    let column_sums = |trace: &TimeSeries| -> Vec<f64> {
        (0..trace.num_cols())
            .map(|col| trace.column(col).sum())
            .collect()
    };

    let upward_crossings = (0..num_neurons)
        .map(|nid| {
            let midpoint = midpoints[nid];
            record
                .vs
                .column(nid)
                .tuple_windows::<(f64, f64)>()
                .filter(|&(previous, current)| previous < midpoint && current >= midpoint)
                .count()
        })
        .collect();

    let summary = Summary {
        num_timesteps: record.num_timesteps(),
        voltage_checksums: column_sums(&record.vs),
        gate_checksums: column_sums(&record.hs),
        synaptic_current_checksums: column_sums(&record.isyns),
        conductance_checksum: record.gsyns.as_slice().iter().sum(),
        upward_crossings,
    };

    println!("result:");
    println!("...timesteps: {}", summary.num_timesteps);
    println!("...voltage checksums: {:?}", summary.voltage_checksums);
    println!("...gate checksums: {:?}", summary.gate_checksums);
    println!(
        "...synaptic current checksums: {:?}",
        summary.synaptic_current_checksums
    );
    println!("...conductance checksum: {}", summary.conductance_checksum);
    println!("...upward crossings: {:?}", summary.upward_crossings);

    if std::env::args().any(|arg| arg == "--json") {
        println!("{}", serde_json::to_string_pretty(&summary).unwrap());
    }
}
