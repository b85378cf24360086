use serde::Serialize;

use crate::network::StepResult;
use crate::time_series::TimeSeries;

#[derive(Debug, Clone, Serialize)]
pub struct SimulationRecord {
    pub ts: Vec<f64>,
    pub vs: TimeSeries,
    pub hs: TimeSeries,
    pub dvs: TimeSeries,
    pub dhs: TimeSeries,
    pub gsyns: TimeSeries,
    pub ileaks: TimeSeries,
    pub isyns: TimeSeries,
    pub inas: TimeSeries,
    pub itotals: TimeSeries,
    pub minfs: TimeSeries,
    pub hinfs: TimeSeries,
    pub tauhs: TimeSeries,
}

impl SimulationRecord {
    pub fn new(ts: Vec<f64>, num_neurons: usize, num_synapses: usize) -> Self {
        let num_timesteps = ts.len();
        let neuron_trace = || TimeSeries::zeros(num_timesteps, num_neurons);

        Self {
            ts,
            vs: neuron_trace(),
            hs: neuron_trace(),
            dvs: neuron_trace(),
            dhs: neuron_trace(),
            gsyns: TimeSeries::zeros(num_timesteps, num_synapses),
            ileaks: neuron_trace(),
            isyns: neuron_trace(),
            inas: neuron_trace(),
            itotals: neuron_trace(),
            minfs: neuron_trace(),
            hinfs: neuron_trace(),
            tauhs: neuron_trace(),
        }
    }

    pub fn num_timesteps(&self) -> usize {
        self.ts.len()
    }

    pub fn store(&mut self, k: usize, v: &[f64], h: &[f64], step_result: &StepResult) {
        self.vs.row_mut(k).copy_from_slice(v);
        self.hs.row_mut(k).copy_from_slice(h);
        self.dvs.row_mut(k).copy_from_slice(&step_result.dv);
        self.dhs.row_mut(k).copy_from_slice(&step_result.dh);
        self.gsyns.row_mut(k).copy_from_slice(&step_result.gsyn);
        self.ileaks.row_mut(k).copy_from_slice(&step_result.ileak);
        self.isyns.row_mut(k).copy_from_slice(&step_result.isyn);
        self.inas.row_mut(k).copy_from_slice(&step_result.ina);
        self.itotals.row_mut(k).copy_from_slice(&step_result.itotal);
        self.minfs.row_mut(k).copy_from_slice(&step_result.minf);
        self.hinfs.row_mut(k).copy_from_slice(&step_result.hinf);
        self.tauhs.row_mut(k).copy_from_slice(&step_result.tauh);
    }

    pub fn neuron_traces(&self) -> [(&'static str, &TimeSeries); 11] {
        [
            ("vs", &self.vs),
            ("hs", &self.hs),
            ("dvs", &self.dvs),
            ("dhs", &self.dhs),
            ("ileaks", &self.ileaks),
            ("isyns", &self.isyns),
            ("inas", &self.inas),
            ("itotals", &self.itotals),
            ("minfs", &self.minfs),
            ("hinfs", &self.hinfs),
            ("tauhs", &self.tauhs),
        ]
    }
}
