//! Parallel Radix Sort
//!
//! Stable LSD radix sort over the 64-bit draw key: eight passes of an
//! 8-bit digit, each pass fanning histogram and scatter work across the
//! worker pool and double-buffering between the list and its scratch
//! buffer. Eight passes is an even count, so the sorted result lands back
//! in the original buffer with no copy-back.
//!
//! Per pass:
//! 1. **Histogram (parallel)** — each worker counts digit occurrences in
//!    its contiguous chunk into a private, cache-line-padded histogram.
//! 2. **Prefix sum (serial)** — private histograms reduce to a global
//!    exclusive scan: the starting offset of every bucket in the output.
//! 3. **Offsets (serial)** — worker `w`'s bucket cursor starts after the
//!    bucket's global offset plus all lower workers' counts for that
//!    bucket, which is exactly what makes the scatter stable.
//! 4. **Scatter (parallel)** — each worker walks its chunk in order and
//!    writes through its private cursors into the output buffer.
//!
//! The frame thread blocks on a [`WaitCounter`] after each parallel phase;
//! input chunks are disjoint, per-worker histograms are disjoint, and the
//! stable offsets partition the output, so the raw-pointer fan-out below
//! never aliases.

use std::sync::Arc;

use crate::worker::{WaitCounter, WorkerPool};

use super::DrawCall;

const RADIX_BITS: u32 = 8;
const BUCKET_COUNT: usize = 1 << RADIX_BITS;
const DIGIT_MASK: u64 = (BUCKET_COUNT as u64) - 1;
const PASS_COUNT: u32 = u64::BITS / RADIX_BITS;

/// Per-worker digit histogram, padded to a cache line so neighboring
/// workers never write-share a line.
#[repr(align(64))]
#[derive(Clone, Copy)]
struct PaddedHistogram {
    counts: [u32; BUCKET_COUNT],
}

impl PaddedHistogram {
    const ZERO: Self = Self {
        counts: [0; BUCKET_COUNT],
    };
}

struct SendConstPtr<T>(*const T);
// SAFETY: the pointer targets a buffer the submitting thread keeps alive
// and does not mutate until the batch's WaitCounter releases it.
unsafe impl<T: Send + Sync> Send for SendConstPtr<T> {}

struct SendMutPtr<T>(*mut T);
// SAFETY: every job writes a region disjoint from all other jobs in the
// batch, and the submitting thread blocks on the WaitCounter before
// touching the buffer again.
unsafe impl<T: Send> Send for SendMutPtr<T> {}

fn fill_histogram(chunk: &[DrawCall], shift: u32, counts: &mut [u32; BUCKET_COUNT]) {
    for call in chunk {
        let digit = ((call.sort_key >> shift) & DIGIT_MASK) as usize;
        counts[digit] += 1;
    }
}

/// Sorts `calls` ascending on `sort_key`, using `scratch` as the second
/// buffer of the ping-pong. Stability is load-bearing: material batching
/// must survive the distance tiebreak.
pub(crate) fn parallel_sort_by_key(
    calls: &mut Vec<DrawCall>,
    scratch: &mut Vec<DrawCall>,
    pool: &WorkerPool,
) {
    if calls.len() < 2 {
        return;
    }
    scratch.clear();
    scratch.extend_from_slice(calls);

    let mut histograms: Vec<PaddedHistogram> = Vec::new();
    for pass in 0..PASS_COUNT {
        radix_pass(calls, scratch, pass * RADIX_BITS, pool, &mut histograms);
        std::mem::swap(calls, scratch);
    }
    // PASS_COUNT is even: the final swap lands the sorted data back in the
    // caller's original allocation.
}

fn radix_pass(
    src: &[DrawCall],
    dst: &mut [DrawCall],
    shift: u32,
    pool: &WorkerPool,
    histograms: &mut Vec<PaddedHistogram>,
) {
    let len = src.len();
    let worker_count = pool.worker_count().min(len).max(1);
    let chunk_len = len.div_ceil(worker_count);

    histograms.clear();
    histograms.resize(worker_count, PaddedHistogram::ZERO);

    // Base pointers are taken once, before any job runs, so no borrow of
    // the buffers is formed while workers write through them.
    let src_base = src.as_ptr();
    let histogram_base = histograms.as_mut_ptr();

    // Phase 1: parallel histogram over disjoint chunks.
    let counter = Arc::new(WaitCounter::new(worker_count));
    for worker in 0..worker_count {
        let start = worker * chunk_len;
        let end = (start + chunk_len).min(len);
        let src_ptr = SendConstPtr(src_base);
        // SAFETY: `worker` is in bounds of the freshly-resized histogram vec.
        let histogram_ptr = SendMutPtr(unsafe { histogram_base.add(worker) });
        let counter = Arc::clone(&counter);
        pool.submit(move || {
            // Bind the whole wrapper (not just its `.0` field) so the
            // closure captures `SendConstPtr`/`SendMutPtr` themselves,
            // preserving their `unsafe impl Send` under RFC 2229 precise
            // capture.
            let (src_ptr, histogram_ptr) = (src_ptr, histogram_ptr);
            // SAFETY: [start, end) chunks are disjoint across jobs and in
            // bounds; the histogram pointer is private to this job; both
            // buffers outlive the counter wait below.
            let chunk = unsafe { std::slice::from_raw_parts(src_ptr.0.add(start), end - start) };
            let histogram = unsafe { &mut *histogram_ptr.0 };
            fill_histogram(chunk, shift, &mut histogram.counts);
            counter.decrement();
        });
    }
    counter.wait();

    // Phase 2: serial reduction to a global exclusive scan.
    let mut bucket_start = [0u32; BUCKET_COUNT];
    let mut running = 0u32;
    for bucket in 0..BUCKET_COUNT {
        bucket_start[bucket] = running;
        for histogram in histograms.iter() {
            running += histogram.counts[bucket];
        }
    }
    debug_assert_eq!(running as usize, len);

    // Phase 3: serial per-worker cursors. Worker w's bucket starts after
    // every lower worker's items for that bucket — the stability rule.
    let mut cursors: Vec<[u32; BUCKET_COUNT]> = Vec::with_capacity(worker_count);
    let mut next = bucket_start;
    for histogram in histograms.iter() {
        cursors.push(next);
        for bucket in 0..BUCKET_COUNT {
            next[bucket] += histogram.counts[bucket];
        }
    }

    // Phase 4: parallel scatter into disjoint output regions.
    let dst_base = dst.as_mut_ptr();
    let counter = Arc::new(WaitCounter::new(worker_count));
    for (worker, mut cursor) in cursors.into_iter().enumerate() {
        let start = worker * chunk_len;
        let end = (start + chunk_len).min(len);
        let src_ptr = SendConstPtr(src_base);
        let dst_ptr = SendMutPtr(dst_base);
        let counter = Arc::clone(&counter);
        pool.submit(move || {
            // Bind the whole wrapper (not just its `.0` field) so the
            // closure captures `SendConstPtr`/`SendMutPtr` themselves,
            // preserving their `unsafe impl Send` under RFC 2229 precise
            // capture.
            let (src_ptr, dst_ptr) = (src_ptr, dst_ptr);
            // SAFETY: the chunk is in bounds; the cursors computed in
            // phase 3 partition the output, so no two jobs write the same
            // element; the frame thread waits before reading `dst`.
            let chunk = unsafe { std::slice::from_raw_parts(src_ptr.0.add(start), end - start) };
            for call in chunk {
                let digit = ((call.sort_key >> shift) & DIGIT_MASK) as usize;
                let at = cursor[digit] as usize;
                cursor[digit] += 1;
                unsafe { dst_ptr.0.add(at).write(*call) };
            }
            counter.decrement();
        });
    }
    counter.wait();
}

#[cfg(test)]
mod tests {
    use glam::Mat4;

    use crate::draw::GeometryId;

    use super::*;

    fn call(sort_key: u64, user_data: u64) -> DrawCall {
        DrawCall {
            geometry: GeometryId(0),
            material_id: (sort_key >> 32) as u32,
            model_matrix: Mat4::IDENTITY,
            sort_key,
            user_data,
        }
    }

    #[test]
    fn worker_histograms_sum_to_input_length() {
        let calls: Vec<DrawCall> = (0..1000).map(|i| call(i * 0x0123_4567, i)).collect();
        for pass in 0..PASS_COUNT {
            let shift = pass * RADIX_BITS;
            let chunk_len = calls.len().div_ceil(4);
            let mut total = 0u32;
            for chunk in calls.chunks(chunk_len) {
                let mut counts = [0u32; BUCKET_COUNT];
                fill_histogram(chunk, shift, &mut counts);
                total += counts.iter().sum::<u32>();
            }
            assert_eq!(total as usize, calls.len());
        }
    }

    #[test]
    fn parallel_sort_matches_serial_stable_sort() {
        let pool = WorkerPool::new(4);
        let mut calls: Vec<DrawCall> = (0u32..4096)
            .map(|i| {
                let material = u64::from(i.wrapping_mul(2_654_435_761) % 97);
                call(material << 32, u64::from(i))
            })
            .collect();
        let mut expected = calls.clone();
        expected.sort_by_key(|c| c.sort_key);

        let mut scratch = Vec::new();
        parallel_sort_by_key(&mut calls, &mut scratch, &pool);

        for (got, want) in calls.iter().zip(&expected) {
            assert_eq!(got.sort_key, want.sort_key);
            // Equal keys must keep insertion order (user_data is the
            // insertion index).
            assert_eq!(got.user_data, want.user_data);
        }
    }

    #[test]
    fn single_element_and_empty_inputs_are_noops() {
        let pool = WorkerPool::new(2);
        let mut scratch = Vec::new();

        let mut empty: Vec<DrawCall> = Vec::new();
        parallel_sort_by_key(&mut empty, &mut scratch, &pool);
        assert!(empty.is_empty());

        let mut one = vec![call(42, 7)];
        parallel_sort_by_key(&mut one, &mut scratch, &pool);
        assert_eq!(one[0].sort_key, 42);
    }
}
