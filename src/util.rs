use std::ops::Range;

/// Samples of `0, dt, 2 dt, ...` up to and including `tf`, with a small
/// relative tolerance on `tf / dt`.
pub fn get_num_timesteps(tf: f64, dt: f64) -> Option<usize> {
    let num_intervals = ((tf / dt) * (1.0 + 1e-9)).floor();

    if !(num_intervals >= 0.0) || num_intervals >= usize::MAX as f64 {
        return None;
    }

    (num_intervals as usize).checked_add(1)
}

pub fn get_partition_range(
    num_threads: usize,
    thread_id: usize,
    num_elements: usize,
) -> Range<usize> {
    let min_partition_size = num_elements / num_threads;
    let remainder = num_elements % num_threads;

    if thread_id < remainder {
        let partition_size = min_partition_size + 1;
        let start = partition_size * thread_id;
        let end = start + partition_size;
        Range { start, end }
    } else {
        let start =
            (min_partition_size + 1) * remainder + min_partition_size * (thread_id - remainder);
        let end = start + min_partition_size;
        Range { start, end }
    }
}
