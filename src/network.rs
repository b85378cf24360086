use std::ops::Range;

use itertools::izip;
use serde::Serialize;

use crate::{
    incidence::PostsynapticIncidence,
    neuron::{deactivation_time_constant, steady_state_gate},
    params::NetworkParams,
    synapse::graded_conductance,
};

#[derive(Debug, Clone)]
pub struct NetworkArrays {
    pub cms: Vec<f64>,
    pub gms: Vec<f64>,
    pub ers: Vec<f64>,
    pub ams: Vec<f64>,
    pub sms: Vec<f64>,
    pub ems: Vec<f64>,
    pub ahs: Vec<f64>,
    pub shs: Vec<f64>,
    pub ehs: Vec<f64>,
    pub enas: Vec<f64>,
    pub tauh_maxs: Vec<f64>,
    pub gnas: Vec<f64>,
    pub pre_indices: Vec<usize>,
    pub post_indices: Vec<usize>,
    pub gmaxs: Vec<f64>,
    pub e_syns: Vec<f64>,
    pub e_los: Vec<f64>,
    pub syn_ranges: Vec<f64>,
    pub incidence: PostsynapticIncidence,
}

#[derive(Debug, Clone, Default)]
pub struct NeuronTerms {
    pub ileak: Vec<f64>,
    pub ina: Vec<f64>,
    pub minf: Vec<f64>,
    pub hinf: Vec<f64>,
    pub tauh: Vec<f64>,
}

#[derive(Debug, Clone, Default)]
pub struct SynapseTerms {
    pub gsyn: Vec<f64>,
    pub current: Vec<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StepResult {
    pub dv: Vec<f64>,
    pub dh: Vec<f64>,
    pub gsyn: Vec<f64>,
    pub ileak: Vec<f64>,
    pub isyn: Vec<f64>,
    pub ina: Vec<f64>,
    pub itotal: Vec<f64>,
    pub minf: Vec<f64>,
    pub hinf: Vec<f64>,
    pub tauh: Vec<f64>,
}

impl NetworkArrays {
    pub fn new(params: &NetworkParams) -> Self {
        let neurons = &params.neurons;
        let synapses = &params.synapses;

        let post_indices: Vec<usize> = synapses.iter().map(|syn| syn.post_index).collect();
        let incidence = PostsynapticIncidence::new(neurons.len(), &post_indices);

        Self {
            cms: neurons.iter().map(|n| n.cm).collect(),
            gms: neurons.iter().map(|n| n.gm).collect(),
            ers: neurons.iter().map(|n| n.er).collect(),
            ams: neurons.iter().map(|n| n.am).collect(),
            sms: neurons.iter().map(|n| n.sm).collect(),
            ems: neurons.iter().map(|n| n.e_m()).collect(),
            ahs: neurons.iter().map(|n| n.ah).collect(),
            shs: neurons.iter().map(|n| n.sh).collect(),
            ehs: neurons.iter().map(|n| n.e_h()).collect(),
            enas: neurons.iter().map(|n| n.e_na()).collect(),
            tauh_maxs: neurons.iter().map(|n| n.tauh_max).collect(),
            gnas: neurons.iter().map(|n| n.sodium_conductance()).collect(),
            pre_indices: synapses.iter().map(|syn| syn.pre_index).collect(),
            post_indices,
            gmaxs: synapses.iter().map(|syn| syn.synapse_params.gmax).collect(),
            e_syns: synapses.iter().map(|syn| syn.synapse_params.e_syn).collect(),
            e_los: synapses.iter().map(|syn| syn.synapse_params.e_lo).collect(),
            syn_ranges: synapses
                .iter()
                .map(|syn| syn.synapse_params.voltage_range())
                .collect(),
            incidence,
        }
    }

    pub fn num_neurons(&self) -> usize {
        self.cms.len()
    }

    pub fn num_synapses(&self) -> usize {
        self.gmaxs.len()
    }

    pub fn initial_state(&self) -> (Vec<f64>, Vec<f64>) {
        let hs = izip!(&self.ers, &self.ahs, &self.shs, &self.ehs)
            .map(|(&er, &ah, &sh, &eh)| steady_state_gate(er, ah, sh, eh))
            .collect();

        (self.ers.clone(), hs)
    }

    pub fn evaluate_neurons(
        &self,
        nid_range: Range<usize>,
        v: &[f64],
        h: &[f64],
        terms: &mut NeuronTerms,
    ) {
        for (local_idx, nid) in nid_range.enumerate() {
            let v = v[nid];
            let (ah, sh, eh) = (self.ahs[nid], self.shs[nid], self.ehs[nid]);

            let minf = steady_state_gate(v, self.ams[nid], self.sms[nid], self.ems[nid]);
            let hinf = steady_state_gate(v, ah, sh, eh);

            terms.ileak[local_idx] = self.gms[nid] * (self.ers[nid] - v);
            terms.minf[local_idx] = minf;
            terms.hinf[local_idx] = hinf;
            terms.tauh[local_idx] =
                deactivation_time_constant(v, self.tauh_maxs[nid], hinf, ah, sh, eh);
            terms.ina[local_idx] = self.gnas[nid] * minf * h[nid] * (self.enas[nid] - v);
        }
    }

    pub fn evaluate_synapses(
        &self,
        syn_range: Range<usize>,
        v: &[f64],
        terms: &mut SynapseTerms,
    ) {
        for (local_idx, syn_idx) in syn_range.enumerate() {
            let gsyn = graded_conductance(
                v[self.pre_indices[syn_idx]],
                self.gmaxs[syn_idx],
                self.e_los[syn_idx],
                self.syn_ranges[syn_idx],
            );

            terms.gsyn[local_idx] = gsyn;
            let v_post = v[self.post_indices[syn_idx]];
            terms.current[local_idx] = gsyn * (self.e_syns[syn_idx] - v_post);
        }
    }

    pub fn complete_step(
        &self,
        h: &[f64],
        i_app: &[f64],
        neuron_terms: &NeuronTerms,
        synapse_terms: &SynapseTerms,
        result: &mut StepResult,
    ) {
        self.incidence
            .scatter_add(&synapse_terms.current, &mut result.isyn);

        result.gsyn.copy_from_slice(&synapse_terms.gsyn);
        result.ileak.copy_from_slice(&neuron_terms.ileak);
        result.ina.copy_from_slice(&neuron_terms.ina);
        result.minf.copy_from_slice(&neuron_terms.minf);
        result.hinf.copy_from_slice(&neuron_terms.hinf);
        result.tauh.copy_from_slice(&neuron_terms.tauh);

        for nid in 0..self.num_neurons() {
            let itotal = result.ileak[nid] + result.isyn[nid] + result.ina[nid] + i_app[nid];

            result.itotal[nid] = itotal;
            result.dv[nid] = itotal / self.cms[nid];
            result.dh[nid] = (result.hinf[nid] - h[nid]) / result.tauh[nid];
        }
    }
}

impl NeuronTerms {
    pub fn with_len(len: usize) -> Self {
        Self {
            ileak: vec![0.0; len],
            ina: vec![0.0; len],
            minf: vec![0.0; len],
            hinf: vec![0.0; len],
            tauh: vec![0.0; len],
        }
    }

    pub fn copy_to(&self, offset: usize, target: &mut NeuronTerms) {
        let range = offset..offset + self.ileak.len();

        target.ileak[range.clone()].copy_from_slice(&self.ileak);
        target.ina[range.clone()].copy_from_slice(&self.ina);
        target.minf[range.clone()].copy_from_slice(&self.minf);
        target.hinf[range.clone()].copy_from_slice(&self.hinf);
        target.tauh[range].copy_from_slice(&self.tauh);
    }
}

impl SynapseTerms {
    pub fn with_len(len: usize) -> Self {
        Self {
            gsyn: vec![0.0; len],
            current: vec![0.0; len],
        }
    }

    pub fn copy_to(&self, offset: usize, target: &mut SynapseTerms) {
        let range = offset..offset + self.gsyn.len();

        target.gsyn[range.clone()].copy_from_slice(&self.gsyn);
        target.current[range].copy_from_slice(&self.current);
    }
}

impl StepResult {
    pub fn with_dims(num_neurons: usize, num_synapses: usize) -> Self {
        Self {
            dv: vec![0.0; num_neurons],
            dh: vec![0.0; num_neurons],
            gsyn: vec![0.0; num_synapses],
            ileak: vec![0.0; num_neurons],
            isyn: vec![0.0; num_neurons],
            ina: vec![0.0; num_neurons],
            itotal: vec![0.0; num_neurons],
            minf: vec![0.0; num_neurons],
            hinf: vec![0.0; num_neurons],
            tauh: vec![0.0; num_neurons],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::{NeuronParams, SynapseParams, SynapseSpec, TechnicalParams};
    use crate::util::test_util::assert_approx_eq_slice;
    use float_cmp::assert_approx_eq;

    fn converging_params() -> NetworkParams {
        let synapse_params = SynapseParams {
            gmax: 1e-6,
            e_syn: -100e-3,
            e_hi: -40e-3,
            e_lo: -60e-3,
        };

        NetworkParams {
            neurons: vec![
                NeuronParams::default(),
                NeuronParams::passive(),
                NeuronParams::passive(),
            ],
            synapses: vec![
                SynapseSpec::new(0, 2, synapse_params.clone()),
                SynapseSpec::new(1, 2, synapse_params.clone()),
                SynapseSpec::new(2, 0, synapse_params),
            ],
            technical_params: TechnicalParams::default(),
        }
    }

    fn evaluate(arrays: &NetworkArrays, v: &[f64], h: &[f64], i_app: &[f64]) -> StepResult {
        let mut neuron_terms = NeuronTerms::with_len(arrays.num_neurons());
        let mut synapse_terms = SynapseTerms::with_len(arrays.num_synapses());
        let mut result = StepResult::with_dims(arrays.num_neurons(), arrays.num_synapses());

        arrays.evaluate_neurons(0..arrays.num_neurons(), v, h, &mut neuron_terms);
        arrays.evaluate_synapses(0..arrays.num_synapses(), v, &mut synapse_terms);
        arrays.complete_step(h, i_app, &neuron_terms, &synapse_terms, &mut result);

        result
    }

    #[test]
    fn projected_arrays() {
        let arrays = NetworkArrays::new(&converging_params());

        assert_eq!(arrays.num_neurons(), 3);
        assert_eq!(arrays.num_synapses(), 3);
        assert_eq!(arrays.pre_indices, [0, 1, 2]);
        assert_eq!(arrays.post_indices, [2, 2, 0]);
        assert_approx_eq!(f64, arrays.gnas[0], NeuronParams::default().sodium_conductance());
        assert_approx_eq!(f64, arrays.gnas[1], 0.0);
        assert_approx_eq!(f64, arrays.ems[0], -40e-3, epsilon = 1e-15);
        assert_approx_eq!(f64, arrays.syn_ranges[2], 20e-3, epsilon = 1e-15);
        assert_eq!(arrays.incidence.incoming(2), [0, 1]);
    }

    #[test]
    fn initial_state() {
        let arrays = NetworkArrays::new(&converging_params());
        let (vs, hs) = arrays.initial_state();

        assert_approx_eq_slice(&vs, &[-60e-3, -60e-3, -60e-3]);
        assert_approx_eq_slice(&hs, &[1.0 / 1.5, 1.0 / 1.5, 1.0 / 1.5]);
    }

    #[test]
    fn converging_synaptic_currents_add_up() {
        let arrays = NetworkArrays::new(&converging_params());
        let v = [-50e-3, -40e-3, -70e-3];
        let h = [0.5, 0.5, 0.5];

        let result = evaluate(&arrays, &v, &h, &[0.0; 3]);

        assert_approx_eq!(f64, result.gsyn[0], 0.5e-6, epsilon = 1e-18);
        assert_approx_eq!(f64, result.gsyn[1], 1e-6, epsilon = 1e-18);
        assert_approx_eq!(f64, result.gsyn[2], 0.0);

        let expected_isyn_2 = (0.5e-6 + 1e-6) * (-100e-3 - -70e-3);
        assert_approx_eq!(f64, result.isyn[2], expected_isyn_2, epsilon = 1e-18);
        assert_approx_eq!(f64, result.isyn[0], 0.0);
        assert_approx_eq!(f64, result.isyn[1], 0.0);
    }

    #[test]
    fn totals_and_derivatives() {
        let arrays = NetworkArrays::new(&converging_params());
        let v = [-55e-3, -60e-3, -65e-3];
        let h = [0.3, 0.6, 0.9];
        let i_app = [1e-9, 2e-9, 0.0];

        let result = evaluate(&arrays, &v, &h, &i_app);

        for nid in 0..3 {
            assert_approx_eq!(
                f64,
                result.ileak[nid],
                arrays.gms[nid] * (arrays.ers[nid] - v[nid]),
                epsilon = 1e-20
            );

            let itotal = result.ileak[nid] + result.isyn[nid] + result.ina[nid] + i_app[nid];
            assert_approx_eq!(f64, result.itotal[nid], itotal, epsilon = 1e-20);
            assert_approx_eq!(f64, result.dv[nid], itotal / arrays.cms[nid], epsilon = 1e-12);
            assert_approx_eq!(
                f64,
                result.dh[nid],
                (result.hinf[nid] - h[nid]) / result.tauh[nid],
                epsilon = 1e-12
            );
        }

        // sodium current follows the state gate, not its steady state
        let expected_ina_0 = arrays.gnas[0] * result.minf[0] * h[0] * (arrays.enas[0] - v[0]);
        assert_approx_eq!(f64, result.ina[0], expected_ina_0, epsilon = 1e-20);
        assert_approx_eq!(f64, result.ina[1], 0.0);
    }

    #[test]
    fn partial_ranges_match_full_evaluation() {
        let arrays = NetworkArrays::new(&converging_params());
        let v = [-55e-3, -45e-3, -65e-3];
        let h = [0.3, 0.6, 0.9];

        let mut full_neurons = NeuronTerms::with_len(3);
        arrays.evaluate_neurons(0..3, &v, &h, &mut full_neurons);

        let mut assembled = NeuronTerms::with_len(3);
        let mut head = NeuronTerms::with_len(1);
        let mut tail = NeuronTerms::with_len(2);
        arrays.evaluate_neurons(0..1, &v, &h, &mut head);
        arrays.evaluate_neurons(1..3, &v, &h, &mut tail);
        head.copy_to(0, &mut assembled);
        tail.copy_to(1, &mut assembled);

        assert_eq!(assembled.ina, full_neurons.ina);
        assert_eq!(assembled.tauh, full_neurons.tauh);

        let mut full_synapses = SynapseTerms::with_len(3);
        arrays.evaluate_synapses(0..3, &v, &mut full_synapses);

        let mut assembled = SynapseTerms::with_len(3);
        let mut tail = SynapseTerms::with_len(1);
        arrays.evaluate_synapses(2..3, &v, &mut tail);
        tail.copy_to(2, &mut assembled);

        assert_eq!(assembled.current[2], full_synapses.current[2]);
        assert_eq!(assembled.gsyn[2], full_synapses.gsyn[2]);
    }
}
