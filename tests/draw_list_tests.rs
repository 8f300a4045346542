//! Draw List Tests
//!
//! Tests for:
//! - Sort-key encoding: material-major, distance-minor, float-bit ordering
//! - Sort variants: front-to-back, back-to-front, material, full key
//! - Stability: equal keys keep insertion order on every variant
//! - Parallel radix sort: parity with the serial path, fallback rules
//! - PassDrawList filtering

use glam::Mat4;
use rand::RngExt;

use kiln::{
    DrawCall, DrawList, GeometryId, PARALLEL_SORT_THRESHOLD, PassDrawList, WorkerPool,
    encode_sort_key,
};

fn tagged(material_id: u32, distance_sq: f32, tag: u64) -> DrawCall {
    DrawCall {
        geometry: GeometryId(tag as u32),
        material_id,
        model_matrix: Mat4::IDENTITY,
        sort_key: encode_sort_key(material_id, distance_sq),
        user_data: tag,
    }
}

// ============================================================================
// Sort-Key Encoding
// ============================================================================

#[test]
fn raw_bit_ordering_matches_numeric_ordering_for_non_negative_floats() {
    let mut rng = rand::rng();
    let mut values: Vec<f32> = (0..1000)
        .map(|_| rng.random::<f32>() * rng.random_range(1.0f32..1.0e12))
        .collect();
    values.extend([0.0, f32::MIN_POSITIVE, 1.0, f32::MAX]);

    for pair in values.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        assert_eq!(
            a < b,
            a.to_bits() < b.to_bits(),
            "bit ordering diverged for {a} vs {b}"
        );
    }
}

#[test]
fn full_key_orders_material_major_distance_minor() {
    let near_far = encode_sort_key(1, 100.0);
    let near_near = encode_sort_key(1, 1.0);
    let far_material = encode_sort_key(2, 0.5);

    assert!(near_near < near_far);
    assert!(near_far < far_material);
}

// ============================================================================
// Sort Variants & Stability
// ============================================================================

#[test]
fn front_to_back_and_back_to_front_are_inverse_orders() {
    let mut list = DrawList::new();
    for (tag, distance) in [4.0f32, 1.0, 9.0, 0.25].iter().enumerate() {
        list.push(tagged(0, *distance, tag as u64));
    }

    list.sort_front_to_back();
    let near_first: Vec<u64> = list.iter().map(|c| c.user_data).collect();
    assert_eq!(near_first, [3, 1, 0, 2]);

    list.sort_back_to_front();
    let far_first: Vec<u64> = list.iter().map(|c| c.user_data).collect();
    assert_eq!(far_first, [2, 0, 1, 3]);
}

#[test]
fn every_sort_variant_is_stable() {
    let build = || {
        let mut list = DrawList::new();
        // Three ties per key, tagged with insertion order.
        for tag in 0..30u64 {
            list.push(tagged((tag % 10) as u32, 0.0, tag));
        }
        list
    };

    let assert_stable = |list: &DrawList| {
        for pair in list.calls().windows(2) {
            if pair[0].sort_key == pair[1].sort_key {
                assert!(
                    pair[0].user_data < pair[1].user_data,
                    "tied keys reordered: {} after {}",
                    pair[0].user_data,
                    pair[1].user_data
                );
            }
        }
    };

    let mut list = build();
    list.sort_by_material();
    assert_stable(&list);

    let mut list = build();
    list.sort_by_sort_key();
    assert_stable(&list);

    let mut list = build();
    list.sort_front_to_back();
    assert_stable(&list);

    let mut list = build();
    list.sort_back_to_front();
    assert_stable(&list);
}

#[test]
fn full_key_sort_batches_materials_with_distance_tiebreak() {
    let mut list = DrawList::new();
    let mut rng = rand::rng();
    for tag in 0..200u64 {
        let material = rng.random_range(0..4u32);
        let distance = rng.random_range(0.0f32..1.0e6);
        list.push(tagged(material, distance, tag));
    }
    list.sort_by_sort_key();

    for pair in list.calls().windows(2) {
        assert!(pair[0].sort_key <= pair[1].sort_key);
        if pair[0].material_id == pair[1].material_id {
            let da = f32::from_bits(pair[0].sort_key as u32);
            let db = f32::from_bits(pair[1].sort_key as u32);
            assert!(da <= db, "distance tiebreak broken within a batch");
        }
    }
}

// ============================================================================
// Parallel Radix Sort
// ============================================================================

#[test]
fn parallel_sort_matches_serial_on_ten_thousand_calls() {
    let pool = WorkerPool::new(4);
    let mut rng = rand::rng();

    let mut serial = DrawList::with_capacity(10_000);
    for tag in 0..10_000u64 {
        let material = rng.random::<u32>();
        let distance = rng.random_range(0.0f32..1.0e9);
        serial.push(tagged(material, distance, tag));
    }
    let mut parallel = DrawList::with_capacity(10_000);
    for call in serial.iter() {
        parallel.push(*call);
    }

    serial.sort_by_sort_key();
    parallel.sort_by_sort_key_parallel(Some(&pool));

    assert_eq!(serial.len(), parallel.len());
    for (a, b) in serial.iter().zip(parallel.iter()) {
        assert_eq!(a.sort_key, b.sort_key);
        assert_eq!(a.user_data, b.user_data);
    }
}

#[test]
fn parallel_sort_output_is_a_sorted_permutation() {
    let pool = WorkerPool::new(3);
    let mut rng = rand::rng();

    let mut list = DrawList::new();
    for tag in 0..2048u64 {
        list.push(tagged(rng.random_range(0..64u32), rng.random_range(0.0f32..100.0), tag));
    }
    let mut input_tags: Vec<u64> = list.iter().map(|c| c.user_data).collect();

    list.sort_by_sort_key_parallel(Some(&pool));

    for pair in list.calls().windows(2) {
        assert!(pair[0].sort_key <= pair[1].sort_key);
    }
    // Same multiset of calls in, same out.
    let mut output_tags: Vec<u64> = list.iter().map(|c| c.user_data).collect();
    input_tags.sort_unstable();
    output_tags.sort_unstable();
    assert_eq!(input_tags, output_tags);
}

#[test]
fn small_lists_and_missing_scheduler_fall_back_to_serial() {
    let pool = WorkerPool::new(4);
    let mut rng = rand::rng();

    let calls: Vec<DrawCall> = (0..PARALLEL_SORT_THRESHOLD as u64 - 1)
        .map(|tag| tagged(rng.random_range(0..16u32), 0.0, tag))
        .collect();

    let mut expected = DrawList::new();
    let mut below_threshold = DrawList::new();
    let mut no_scheduler = DrawList::new();
    for call in &calls {
        expected.push(*call);
        below_threshold.push(*call);
        no_scheduler.push(*call);
    }

    expected.sort_by_sort_key();
    below_threshold.sort_by_sort_key_parallel(Some(&pool));
    no_scheduler.sort_by_sort_key_parallel(None);

    for (a, b) in expected.iter().zip(below_threshold.iter()) {
        assert_eq!(a.user_data, b.user_data);
    }
    for (a, b) in expected.iter().zip(no_scheduler.iter()) {
        assert_eq!(a.user_data, b.user_data);
    }
}

#[test]
fn parallel_sort_preserves_insertion_order_on_ties() {
    let pool = WorkerPool::new(4);
    let mut list = DrawList::with_capacity(4096);
    // Heavily tied keys across chunk boundaries.
    for tag in 0..4096u64 {
        list.push(tagged((tag % 8) as u32, 0.0, tag));
    }
    list.sort_by_sort_key_parallel(Some(&pool));

    for pair in list.calls().windows(2) {
        if pair[0].sort_key == pair[1].sort_key {
            assert!(pair[0].user_data < pair[1].user_data);
        }
    }
}

// ============================================================================
// Per-Pass Filtering
// ============================================================================

#[test]
fn pass_view_keeps_only_participating_materials_in_sorted_order() {
    const MATERIAL_A: u32 = 10;
    const MATERIAL_B: u32 = 20;
    const MATERIAL_C: u32 = 30;

    let mut list = DrawList::new();
    let mut rng = rand::rng();
    let mut expected_kept = 0u32;
    for tag in 0..100u64 {
        let material = [MATERIAL_A, MATERIAL_B, MATERIAL_C][rng.random_range(0..3usize)];
        if material != MATERIAL_B {
            expected_kept += 1;
        }
        list.push(tagged(material, rng.random_range(0.0f32..50.0), tag));
    }
    list.sort_by_sort_key();

    let mut view = PassDrawList::new(&list, "forward");
    view.build_for_pass(|material, pass| {
        assert_eq!(pass, "forward");
        material == MATERIAL_A || material == MATERIAL_C
    });

    assert_eq!(view.len() as u32, expected_kept);

    // Filtered iteration follows the sorted main-list order.
    let mut previous = 0u64;
    for call in view.iter() {
        assert_ne!(call.material_id, MATERIAL_B);
        assert!(call.sort_key >= previous);
        previous = call.sort_key;
    }
}

#[test]
fn filter_by_returns_matching_indices_in_order() {
    let mut list = DrawList::new();
    for tag in 0..10u64 {
        list.push(tagged((tag % 2) as u32, 0.0, tag));
    }
    let odd_material = list.filter_by(|call| call.material_id == 1);
    assert_eq!(odd_material, [1, 3, 5, 7, 9]);
}

#[test]
fn clear_retains_storage_and_empties_the_list() {
    let mut list = DrawList::new();
    for tag in 0..100u64 {
        list.push(tagged(0, 0.0, tag));
    }
    list.clear();
    assert!(list.is_empty());
    list.push(tagged(1, 0.0, 0));
    assert_eq!(list.len(), 1);
}
