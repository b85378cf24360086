use std::ops::Range;
use std::sync::mpsc::channel as mpsc_channel;
use std::sync::mpsc::Receiver as MpscReceiver;
use std::sync::mpsc::Sender as MpscSender;
use std::sync::Arc;
use std::thread;
use std::thread::JoinHandle;

use bus::{Bus, BusReader};
use core_affinity::CoreId;
use log::debug;
use simple_error::{SimpleError, SimpleResult};

use crate::network::{NetworkArrays, NeuronTerms, SynapseTerms};
use crate::params::TechnicalParams;
use crate::util;

pub trait TermEvaluator {
    fn evaluate(
        &mut self,
        v: &[f64],
        h: &[f64],
        neuron_terms: &mut NeuronTerms,
        synapse_terms: &mut SynapseTerms,
    ) -> SimpleResult<()>;
}

pub fn create_evaluator(
    arrays: Arc<NetworkArrays>,
    technical_params: &TechnicalParams,
) -> Box<dyn TermEvaluator> {
    let num_threads = technical_params
        .num_threads
        .unwrap_or_else(num_cpus::get)
        .max(1);

    if num_threads == 1 {
        Box::new(InlineEvaluator { arrays })
    } else {
        Box::new(WorkerPool::spawn(
            arrays,
            num_threads,
            technical_params.pin_threads,
        ))
    }
}

pub struct InlineEvaluator {
    arrays: Arc<NetworkArrays>,
}

impl TermEvaluator for InlineEvaluator {
    fn evaluate(
        &mut self,
        v: &[f64],
        h: &[f64],
        neuron_terms: &mut NeuronTerms,
        synapse_terms: &mut SynapseTerms,
    ) -> SimpleResult<()> {
        self.arrays
            .evaluate_neurons(0..self.arrays.num_neurons(), v, h, neuron_terms);
        self.arrays
            .evaluate_synapses(0..self.arrays.num_synapses(), v, synapse_terms);
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct StepRequest {
    pub v: Arc<Vec<f64>>,
    pub h: Arc<Vec<f64>>,
}

pub struct PartitionResult {
    pub nid_start: usize,
    pub syn_start: usize,
    pub neuron_terms: NeuronTerms,
    pub synapse_terms: SynapseTerms,
}

pub struct Partition {
    nid_range: Range<usize>,
    syn_range: Range<usize>,
}

impl Partition {
    pub fn new(num_threads: usize, thread_id: usize, arrays: &NetworkArrays) -> Self {
        Self {
            nid_range: util::get_partition_range(num_threads, thread_id, arrays.num_neurons()),
            syn_range: util::get_partition_range(num_threads, thread_id, arrays.num_synapses()),
        }
    }

    pub fn evaluate(&self, arrays: &NetworkArrays, request: &StepRequest) -> PartitionResult {
        let mut neuron_terms = NeuronTerms::with_len(self.nid_range.len());
        let mut synapse_terms = SynapseTerms::with_len(self.syn_range.len());

        arrays.evaluate_neurons(
            self.nid_range.clone(),
            &request.v,
            &request.h,
            &mut neuron_terms,
        );
        arrays.evaluate_synapses(self.syn_range.clone(), &request.v, &mut synapse_terms);

        PartitionResult {
            nid_start: self.nid_range.start,
            syn_start: self.syn_range.start,
            neuron_terms,
            synapse_terms,
        }
    }

    pub fn run(
        &self,
        arrays: &NetworkArrays,
        mut broadcast_rx: BusReader<StepRequest>,
        result_tx: MpscSender<PartitionResult>,
    ) {
        while let Ok(request) = broadcast_rx.recv() {
            if result_tx.send(self.evaluate(arrays, &request)).is_err() {
                break;
            }
        }
    }
}

pub struct WorkerPool {
    broadcast_tx: Option<Bus<StepRequest>>,
    result_rx: MpscReceiver<PartitionResult>,
    num_partitions: usize,
    join_handles: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    pub fn spawn(arrays: Arc<NetworkArrays>, num_threads: usize, pin_threads: bool) -> Self {
        let mut broadcast_tx = Bus::new(1);
        let (result_tx, result_rx) = mpsc_channel();
        let mut join_handles = Vec::new();

        for thread_id in 0..num_threads {
            let broadcast_rx = broadcast_tx.add_rx();
            let result_tx = result_tx.clone();
            let arrays = Arc::clone(&arrays);

            join_handles.push(thread::spawn(move || {
                if pin_threads {
                    let core_id = CoreId { id: thread_id };
                    core_affinity::set_for_current(core_id);
                }

                let partition = Partition::new(num_threads, thread_id, &arrays);
                partition.run(&arrays, broadcast_rx, result_tx);
            }));
        }

        debug!("spawned {} partition workers", num_threads);

        Self {
            broadcast_tx: Some(broadcast_tx),
            result_rx,
            num_partitions: num_threads,
            join_handles,
        }
    }
}

impl TermEvaluator for WorkerPool {
    fn evaluate(
        &mut self,
        v: &[f64],
        h: &[f64],
        neuron_terms: &mut NeuronTerms,
        synapse_terms: &mut SynapseTerms,
    ) -> SimpleResult<()> {
        let request = StepRequest {
            v: Arc::new(v.to_vec()),
            h: Arc::new(h.to_vec()),
        };

        match self.broadcast_tx.as_mut() {
            Some(broadcast_tx) => broadcast_tx.broadcast(request),
            None => return Err(SimpleError::new("worker pool has been shut down")),
        }

        for _ in 0..self.num_partitions {
            let partition_result = self
                .result_rx
                .recv()
                .map_err(|_| SimpleError::new("partition worker terminated unexpectedly"))?;

            partition_result
                .neuron_terms
                .copy_to(partition_result.nid_start, neuron_terms);
            partition_result
                .synapse_terms
                .copy_to(partition_result.syn_start, synapse_terms);
        }

        Ok(())
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        drop(self.broadcast_tx.take()); // signals the worker threads to exit the loop

        self.join_handles.drain(..).for_each(|join_handle| {
            join_handle.join().ok();
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::{NetworkParams, NeuronParams, SynapseParams, SynapseSpec};

    fn ring_arrays(num_neurons: usize) -> Arc<NetworkArrays> {
        let neurons = (0..num_neurons)
            .map(|nid| {
                let mut neuron_params = NeuronParams::default();
                neuron_params.gm *= 1.0 + nid as f64 * 0.1;
                neuron_params
            })
            .collect();

        let synapses = (0..num_neurons)
            .flat_map(|nid| {
                [
                    SynapseSpec::new(nid, (nid + 1) % num_neurons, SynapseParams::default()),
                    SynapseSpec::new(nid, (nid + 3) % num_neurons, SynapseParams::default()),
                ]
            })
            .collect();

        let params = NetworkParams {
            neurons,
            synapses,
            technical_params: TechnicalParams::default(),
        };

        Arc::new(NetworkArrays::new(&params))
    }

    fn state(num_neurons: usize) -> (Vec<f64>, Vec<f64>) {
        let v = (0..num_neurons)
            .map(|nid| -70e-3 + nid as f64 * 3e-3)
            .collect();
        let h = (0..num_neurons).map(|nid| 0.1 + nid as f64 * 0.05).collect();
        (v, h)
    }

    #[test]
    fn partitions_cover_network() {
        let arrays = ring_arrays(7);

        let partitions: Vec<_> = (0..3).map(|id| Partition::new(3, id, &arrays)).collect();

        assert_eq!(partitions[0].nid_range, 0..3);
        assert_eq!(partitions[1].nid_range, 3..5);
        assert_eq!(partitions[2].nid_range, 5..7);
        assert_eq!(partitions[0].syn_range, 0..5);
        assert_eq!(partitions[1].syn_range, 5..10);
        assert_eq!(partitions[2].syn_range, 10..14);
    }

    #[test]
    fn worker_pool_matches_inline_evaluation() {
        let num_neurons = 11;
        let arrays = ring_arrays(num_neurons);
        let (v, h) = state(num_neurons);

        let mut inline_neuron_terms = NeuronTerms::with_len(num_neurons);
        let mut inline_synapse_terms = SynapseTerms::with_len(arrays.num_synapses());
        InlineEvaluator {
            arrays: Arc::clone(&arrays),
        }
        .evaluate(&v, &h, &mut inline_neuron_terms, &mut inline_synapse_terms)
        .unwrap();

        let mut pool = WorkerPool::spawn(Arc::clone(&arrays), 3, false);

        for _ in 0..2 {
            let mut neuron_terms = NeuronTerms::with_len(num_neurons);
            let mut synapse_terms = SynapseTerms::with_len(arrays.num_synapses());
            pool.evaluate(&v, &h, &mut neuron_terms, &mut synapse_terms)
                .unwrap();

            assert_eq!(neuron_terms.ileak, inline_neuron_terms.ileak);
            assert_eq!(neuron_terms.ina, inline_neuron_terms.ina);
            assert_eq!(neuron_terms.minf, inline_neuron_terms.minf);
            assert_eq!(neuron_terms.hinf, inline_neuron_terms.hinf);
            assert_eq!(neuron_terms.tauh, inline_neuron_terms.tauh);
            assert_eq!(synapse_terms.gsyn, inline_synapse_terms.gsyn);
            assert_eq!(synapse_terms.current, inline_synapse_terms.current);
        }
    }

    #[test]
    fn more_workers_than_neurons() {
        let arrays = ring_arrays(2);
        let (v, h) = state(2);

        let mut pool = WorkerPool::spawn(Arc::clone(&arrays), 5, false);
        let mut neuron_terms = NeuronTerms::with_len(2);
        let mut synapse_terms = SynapseTerms::with_len(arrays.num_synapses());

        pool.evaluate(&v, &h, &mut neuron_terms, &mut synapse_terms)
            .unwrap();

        assert!(neuron_terms.tauh.iter().all(|tauh| *tauh > 0.0));
    }

    #[test]
    fn single_thread_evaluates_inline() {
        let arrays = ring_arrays(3);
        let (v, h) = state(3);
        let technical_params = TechnicalParams::default();

        let mut evaluator = create_evaluator(Arc::clone(&arrays), &technical_params);
        let mut neuron_terms = NeuronTerms::with_len(3);
        let mut synapse_terms = SynapseTerms::with_len(arrays.num_synapses());

        evaluator
            .evaluate(&v, &h, &mut neuron_terms, &mut synapse_terms)
            .unwrap();

        assert!(neuron_terms.minf.iter().all(|minf| *minf > 0.0 && *minf < 1.0));
    }
}
