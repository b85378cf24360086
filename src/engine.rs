use std::mem;
use std::sync::Arc;

use log::{debug, info};
use simple_error::{try_with, SimpleError, SimpleResult};

use crate::incidence::PostsynapticIncidence;
use crate::network::{NetworkArrays, NeuronTerms, StepResult, SynapseTerms};
use crate::params::{self, NetworkParams, TechnicalParams};
use crate::partition;
use crate::record::SimulationRecord;
use crate::time_series::TimeSeries;
use crate::util;

pub fn create_engine(params: NetworkParams) -> Result<NetworkEngine, SimpleError> {
    try_with!(
        params::validate_network_params(&params),
        "invalid network parameters"
    );

    let arrays = NetworkArrays::new(&params);

    debug!(
        "created engine with {} neurons and {} synapses",
        arrays.num_neurons(),
        arrays.num_synapses()
    );

    Ok(NetworkEngine {
        arrays: Arc::new(arrays),
        technical_params: params.technical_params,
        config: None,
        record: SimulationRecord::new(Vec::new(), 0, 0),
    })
}

#[derive(Debug, Clone)]
pub struct SimulationConfig {
    pub tf: f64,
    pub dt: f64,
    pub applied_currents: TimeSeries,
    pub initial_voltages: Vec<f64>,
    pub initial_gates: Vec<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Divergence {
    pub timestep: usize,
    pub t: f64,
    pub nid: usize,
}

pub struct NetworkEngine {
    arrays: Arc<NetworkArrays>,
    technical_params: TechnicalParams,
    config: Option<SimulationConfig>,
    record: SimulationRecord,
}

impl NetworkEngine {
    pub fn get_num_neurons(&self) -> usize {
        self.arrays.num_neurons()
    }

    pub fn get_num_synapses(&self) -> usize {
        self.arrays.num_synapses()
    }

    pub fn get_num_timesteps(&self) -> usize {
        self.record.num_timesteps()
    }

    pub fn get_config(&self) -> Option<&SimulationConfig> {
        self.config.as_ref()
    }

    pub fn get_sodium_conductances(&self) -> &[f64] {
        &self.arrays.gnas
    }

    pub fn get_incidence(&self) -> &PostsynapticIncidence {
        &self.arrays.incidence
    }

    pub fn record(&self) -> &SimulationRecord {
        &self.record
    }

    pub fn into_record(self) -> SimulationRecord {
        self.record
    }

    pub fn set_simulation_properties(
        &mut self,
        tf: f64,
        dt: f64,
        applied_currents: Option<TimeSeries>,
    ) -> SimpleResult<()> {
        if !(dt > 0.0) || !dt.is_finite() {
            return Err(SimpleError::new("dt must be strictly positive and finite"));
        }

        if !(tf >= 0.0) || !tf.is_finite() {
            return Err(SimpleError::new("tf must be non-negative and finite"));
        }

        let num_neurons = self.get_num_neurons();
        let trace_width = num_neurons.max(self.get_num_synapses()).max(1);

        let num_timesteps = util::get_num_timesteps(tf, dt)
            .filter(|num_timesteps| {
                num_timesteps
                    .checked_mul(trace_width)
                    .and_then(|len| len.checked_mul(mem::size_of::<f64>()))
                    .map_or(false, |num_bytes| num_bytes <= isize::MAX as usize)
            })
            .ok_or_else(|| {
                SimpleError::new(format!(
                    "time grid with tf = {} s and dt = {} s has too many timesteps",
                    tf, dt
                ))
            })?;

        let applied_currents = match applied_currents {
            Some(applied_currents) => {
                self.validate_applied_currents(&applied_currents, num_timesteps)?;
                applied_currents
            }
            None => TimeSeries::zeros(num_timesteps, num_neurons),
        };

        let (initial_voltages, initial_gates) = self.arrays.initial_state();
        let ts = (0..num_timesteps).map(|k| k as f64 * dt).collect();

        debug!(
            "simulation properties: tf = {} s, dt = {} s, {} timesteps",
            tf, dt, num_timesteps
        );

        self.config = Some(SimulationConfig {
            tf,
            dt,
            applied_currents,
            initial_voltages,
            initial_gates,
        });
        self.record = SimulationRecord::new(ts, num_neurons, self.get_num_synapses());

        Ok(())
    }

    pub fn set_applied_currents(&mut self, applied_currents: TimeSeries) -> SimpleResult<()> {
        let num_timesteps = self.get_num_timesteps();

        self.validate_applied_currents(&applied_currents, num_timesteps)?;

        match self.config.as_mut() {
            Some(config) => {
                config.applied_currents = applied_currents;
                Ok(())
            }
            None => Err(SimpleError::new(
                "simulation properties must be set before applied currents",
            )),
        }
    }

    fn validate_applied_currents(
        &self,
        applied_currents: &TimeSeries,
        num_timesteps: usize,
    ) -> SimpleResult<()> {
        if applied_currents.num_rows() != num_timesteps {
            return Err(SimpleError::new(format!(
                "applied currents have {} rows, but there are {} timesteps",
                applied_currents.num_rows(),
                num_timesteps
            )));
        }

        if applied_currents.num_cols() != self.get_num_neurons() {
            return Err(SimpleError::new(format!(
                "applied currents have {} columns, but there are {} neurons",
                applied_currents.num_cols(),
                self.get_num_neurons()
            )));
        }

        Ok(())
    }

    pub fn step(&self, v: &[f64], h: &[f64], i_app: &[f64]) -> StepResult {
        let num_neurons = self.get_num_neurons();
        let num_synapses = self.get_num_synapses();

        let mut neuron_terms = NeuronTerms::with_len(num_neurons);
        let mut synapse_terms = SynapseTerms::with_len(num_synapses);
        let mut result = StepResult::with_dims(num_neurons, num_synapses);

        self.arrays
            .evaluate_neurons(0..num_neurons, v, h, &mut neuron_terms);
        self.arrays
            .evaluate_synapses(0..num_synapses, v, &mut synapse_terms);
        self.arrays
            .complete_step(h, i_app, &neuron_terms, &synapse_terms, &mut result);

        result
    }

    pub fn simulate(&mut self) -> SimpleResult<()> {
        let config = match &self.config {
            Some(config) => config,
            None => {
                return Err(SimpleError::new(
                    "simulation properties must be set before simulating",
                ))
            }
        };

        let arrays = &self.arrays;
        let record = &mut self.record;
        let num_timesteps = record.num_timesteps();

        let mut evaluator = partition::create_evaluator(Arc::clone(arrays), &self.technical_params);
        let mut neuron_terms = NeuronTerms::with_len(arrays.num_neurons());
        let mut synapse_terms = SynapseTerms::with_len(arrays.num_synapses());
        let mut result = StepResult::with_dims(arrays.num_neurons(), arrays.num_synapses());

        let mut v = config.initial_voltages.clone();
        let mut h = config.initial_gates.clone();

        info!(
            "simulating {} neurons and {} synapses over {} timesteps",
            arrays.num_neurons(),
            arrays.num_synapses(),
            num_timesteps
        );

        let mut advance = |k: usize, v: &[f64], h: &[f64], result: &mut StepResult| {
            evaluator.evaluate(v, h, &mut neuron_terms, &mut synapse_terms)?;
            arrays.complete_step(
                h,
                config.applied_currents.row(k),
                &neuron_terms,
                &synapse_terms,
                result,
            );
            record.store(k, v, h, result);
            SimpleResult::Ok(())
        };

        for k in 0..num_timesteps - 1 {
            advance(k, &v, &h, &mut result)?;

            for (v, dv) in v.iter_mut().zip(&result.dv) {
                *v += config.dt * dv;
            }

            for (h, dh) in h.iter_mut().zip(&result.dh) {
                *h += config.dt * dh;
            }
        }

        // The loop leaves the final state integrated but its currents, gates
        // and derivatives unset. One more step fills them in.
        advance(num_timesteps - 1, &v, &h, &mut result)?;

        info!("simulation finished");

        Ok(())
    }

    pub fn find_divergence(&self) -> Option<Divergence> {
        (0..self.get_num_timesteps()).find_map(|timestep| {
            self.record
                .vs
                .row(timestep)
                .iter()
                .zip(self.record.hs.row(timestep))
                .position(|(v, h)| !v.is_finite() || !h.is_finite())
                .map(|nid| Divergence {
                    timestep,
                    t: self.record.ts[timestep],
                    nid,
                })
        })
    }
}
