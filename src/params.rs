use log::warn;
use serde::{Deserialize, Serialize};
use simple_error::SimpleError;

use crate::synapse;
use crate::types::HashSet;

#[derive(Default, Debug, Clone, Serialize, Deserialize)]
pub struct NetworkParams {
    pub neurons: Vec<NeuronParams>,
    pub synapses: Vec<SynapseSpec>,
    #[serde(default)]
    pub technical_params: TechnicalParams,
}

/// `d_` potentials are relative to `er`. Without `gna`, the sodium conductance
/// is derived from `voltage_range`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NeuronParams {
    pub cm: f64,
    pub gm: f64,
    pub er: f64,
    pub am: f64,
    pub sm: f64,
    pub d_em: f64,
    pub ah: f64,
    pub sh: f64,
    pub d_eh: f64,
    pub d_ena: f64,
    pub tauh_max: f64,
    #[serde(default)]
    pub gna: Option<f64>,
    pub voltage_range: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SynapseParams {
    pub gmax: f64,
    pub e_syn: f64,
    pub e_hi: f64,
    pub e_lo: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SynapseSpec {
    pub pre_index: usize,
    pub post_index: usize,
    pub synapse_params: SynapseParams,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TechnicalParams {
    pub num_threads: Option<usize>,
    pub pin_threads: bool,
}

pub const DEFAULT_VOLTAGE_RANGE: f64 = 20e-3;
pub const DEFAULT_SYNAPTIC_REVERSAL_POTENTIAL: f64 = -100e-3;
pub const DEFAULT_HALF_CENTER_DELTA: f64 = 0.01e-3;

impl Default for NeuronParams {
    fn default() -> Self {
        Self {
            cm: 5e-9,
            gm: 1e-6,
            er: -60e-3,
            am: 1.0,
            sm: -50.0,
            d_em: DEFAULT_VOLTAGE_RANGE,
            ah: 0.5,
            sh: 50.0,
            d_eh: 0.0,
            d_ena: 110e-3,
            tauh_max: 0.3,
            gna: None,
            voltage_range: DEFAULT_VOLTAGE_RANGE,
        }
    }
}

impl NeuronParams {
    pub fn passive() -> Self {
        Self {
            gna: Some(0.0),
            ..Self::default()
        }
    }
}

impl Default for SynapseParams {
    fn default() -> Self {
        let neuron_params = NeuronParams::default();

        Self {
            gmax: synapse::derive_half_center_max_conductance(
                &neuron_params,
                DEFAULT_HALF_CENTER_DELTA,
                DEFAULT_SYNAPTIC_REVERSAL_POTENTIAL - neuron_params.er,
            ),
            e_syn: DEFAULT_SYNAPTIC_REVERSAL_POTENTIAL,
            e_hi: neuron_params.er + neuron_params.voltage_range,
            e_lo: neuron_params.er,
        }
    }
}

impl Default for TechnicalParams {
    fn default() -> Self {
        Self {
            num_threads: Some(1),
            pin_threads: false,
        }
    }
}

impl SynapseSpec {
    pub fn new(pre_index: usize, post_index: usize, synapse_params: SynapseParams) -> Self {
        Self {
            pre_index,
            post_index,
            synapse_params,
        }
    }
}

pub fn half_center(neuron_params: NeuronParams, e_syn: f64, delta: f64) -> NetworkParams {
    let synapse_params = SynapseParams {
        gmax: synapse::derive_half_center_max_conductance(
            &neuron_params,
            delta,
            e_syn - neuron_params.er,
        ),
        e_syn,
        e_hi: neuron_params.er + neuron_params.voltage_range,
        e_lo: neuron_params.er,
    };

    NetworkParams {
        neurons: vec![neuron_params.clone(), neuron_params],
        synapses: vec![
            SynapseSpec::new(0, 1, synapse_params.clone()),
            SynapseSpec::new(1, 0, synapse_params),
        ],
        technical_params: TechnicalParams::default(),
    }
}

pub fn validate_network_params(network_params: &NetworkParams) -> Result<(), SimpleError> {
    for (nid, neuron_params) in network_params.neurons.iter().enumerate() {
        validate_neuron_params(neuron_params)
            .map_err(|err| SimpleError::new(format!("neuron {}: {}", nid, err)))?;
    }

    let num_neurons = network_params.neurons.len();
    let mut seen_pre_post_pairs = HashSet::default();

    for (syn_idx, synapse_spec) in network_params.synapses.iter().enumerate() {
        if synapse_spec.pre_index >= num_neurons {
            return Err(SimpleError::new(format!(
                "invalid pre_index of synapse {}: {}",
                syn_idx, synapse_spec.pre_index
            )));
        }

        if synapse_spec.post_index >= num_neurons {
            return Err(SimpleError::new(format!(
                "invalid post_index of synapse {}: {}",
                syn_idx, synapse_spec.post_index
            )));
        }

        validate_synapse_params(&synapse_spec.synapse_params)
            .map_err(|err| SimpleError::new(format!("synapse {}: {}", syn_idx, err)))?;

        if !seen_pre_post_pairs.insert((synapse_spec.pre_index, synapse_spec.post_index)) {
            warn!(
                "duplicate synapse from neuron {} to neuron {}, conductances will add up",
                synapse_spec.pre_index, synapse_spec.post_index
            );
        }
    }

    validate_technical_params(&network_params.technical_params)?;

    Ok(())
}

fn validate_neuron_params(neuron_params: &NeuronParams) -> Result<(), SimpleError> {
    let finite_values = [
        neuron_params.er,
        neuron_params.d_em,
        neuron_params.d_eh,
        neuron_params.d_ena,
        neuron_params.sm,
        neuron_params.sh,
    ];

    if finite_values.iter().any(|value| !value.is_finite()) {
        return Err(SimpleError::new(
            "potentials and gating slopes must be finite",
        ));
    }

    if !(neuron_params.cm > 0.0) {
        return Err(SimpleError::new("cm must be strictly positive"));
    }

    if !(neuron_params.gm > 0.0) {
        return Err(SimpleError::new("gm must be strictly positive"));
    }

    if !(neuron_params.am >= 0.0) {
        return Err(SimpleError::new("am must not be negative"));
    }

    if !(neuron_params.ah > 0.0) {
        return Err(SimpleError::new("ah must be strictly positive"));
    }

    if !(neuron_params.tauh_max > 0.0) {
        return Err(SimpleError::new("tauh_max must be strictly positive"));
    }

    match neuron_params.gna {
        Some(gna) => {
            if !(gna >= 0.0) || !gna.is_finite() {
                return Err(SimpleError::new("gna must be finite and not negative"));
            }
        }
        None => {
            if !(neuron_params.voltage_range > 0.0) {
                return Err(SimpleError::new(
                    "voltage_range must be strictly positive when gna is derived",
                ));
            }

            if neuron_params.d_ena <= neuron_params.voltage_range {
                return Err(SimpleError::new(
                    "d_ena must be greater than voltage_range when gna is derived",
                ));
            }
        }
    }

    Ok(())
}

fn validate_synapse_params(synapse_params: &SynapseParams) -> Result<(), SimpleError> {
    if !synapse_params.e_syn.is_finite()
        || !synapse_params.e_lo.is_finite()
        || !synapse_params.e_hi.is_finite()
    {
        return Err(SimpleError::new("synaptic potentials must be finite"));
    }

    if !(synapse_params.gmax >= 0.0) || !synapse_params.gmax.is_finite() {
        return Err(SimpleError::new("gmax must be finite and not negative"));
    }

    if synapse_params.e_hi <= synapse_params.e_lo {
        return Err(SimpleError::new("e_hi must be greater than e_lo"));
    }

    Ok(())
}

fn validate_technical_params(technical_params: &TechnicalParams) -> Result<(), SimpleError> {
    if let Some(num_threads) = technical_params.num_threads {
        if num_threads == 0 {
            return Err(SimpleError::new("num_threads must be strictly positive"));
        }

        if num_cpus::get() < num_threads {
            return Err(SimpleError::new(
                "num_threads must not be greater than number of available CPUs",
            ));
        }
    }

    Ok(())
}
