use crate::{
    neuron::steady_state_gate,
    params::{NeuronParams, SynapseParams},
};

impl SynapseParams {
    pub fn voltage_range(&self) -> f64 {
        self.e_hi - self.e_lo
    }

    pub fn conductance(&self, v_pre: f64) -> f64 {
        graded_conductance(v_pre, self.gmax, self.e_lo, self.voltage_range())
    }
}

pub fn graded_conductance(v_pre: f64, gmax: f64, e_lo: f64, r: f64) -> f64 {
    gmax * ((v_pre - e_lo) / r).max(0.0).min(1.0)
}

/// `d_e_syn` is relative to rest.
pub fn derive_half_center_max_conductance(
    neuron_params: &NeuronParams,
    delta: f64,
    d_e_syn: f64,
) -> f64 {
    let gna = neuron_params.sodium_conductance();
    let minf = steady_state_gate(
        delta,
        neuron_params.am,
        neuron_params.sm,
        neuron_params.d_em,
    );
    let hinf = steady_state_gate(
        delta,
        neuron_params.ah,
        neuron_params.sh,
        neuron_params.d_eh,
    );
    let sodium_drive = gna * minf * hinf;

    (-delta * neuron_params.gm - delta * sodium_drive + sodium_drive * neuron_params.d_ena)
        / (delta - d_e_syn)
}
