#[derive(Debug, Clone)]
pub struct PostsynapticIncidence {
    post_indices: Vec<usize>,
    incoming: Vec<Vec<usize>>,
}

impl PostsynapticIncidence {
    pub fn new(num_neurons: usize, post_indices: &[usize]) -> Self {
        let mut incoming = vec![Vec::new(); num_neurons];

        for (syn_idx, &post_index) in post_indices.iter().enumerate() {
            incoming[post_index].push(syn_idx);
        }

        Self {
            post_indices: post_indices.to_vec(),
            incoming,
        }
    }

    pub fn num_neurons(&self) -> usize {
        self.incoming.len()
    }

    pub fn num_synapses(&self) -> usize {
        self.post_indices.len()
    }

    pub fn post_index(&self, syn_idx: usize) -> usize {
        self.post_indices[syn_idx]
    }

    pub fn incoming(&self, nid: usize) -> &[usize] {
        &self.incoming[nid]
    }

    /// Sums in ascending synapse order.
    pub fn scatter_add(&self, per_synapse: &[f64], per_neuron: &mut [f64]) {
        for (sum, syn_indices) in per_neuron.iter_mut().zip(&self.incoming) {
            *sum = syn_indices.iter().map(|&syn_idx| per_synapse[syn_idx]).sum();
        }
    }

    pub fn to_dense(&self) -> Vec<Vec<u8>> {
        self.post_indices
            .iter()
            .map(|&post_index| {
                let mut row = vec![0; self.num_neurons()];
                row[post_index] = 1;
                row
            })
            .collect()
    }
}
