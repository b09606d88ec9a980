//! Property tests for spec.md §8's P1–P10, one `proptest!` block per
//! property.

use proptest::prelude::*;

use offheap::facade::{alloc_object, alloc_slice, append, concat_slices, free_object};
use offheap::Store;

proptest! {
    /// P1 — Round-trip: write a value through an `ObjectRef`, read it back
    /// through a second call to `value()`, get the same value.
    #[test]
    fn p1_round_trip(v in any::<u64>()) {
        let _ = env_logger::try_init();
        let s = Store::new();
        let r = alloc_object::<u64>(&s);
        *r.value() = v;
        prop_assert_eq!(*r.value(), v);
    }

    /// P2 — Slot identity under mutation: two consecutive `value()` calls
    /// on a live `ObjectRef` return the same address.
    #[test]
    fn p2_slot_identity(v in any::<u64>()) {
        let _ = env_logger::try_init();
        let s = Store::new();
        let r = alloc_object::<u64>(&s);
        *r.value() = v;
        let a = r.value() as *mut u64;
        let b = r.value() as *mut u64;
        prop_assert_eq!(a, b);
    }

    /// P3 — Capacity discipline: `alloc_slice(len, cap)` reports `len`
    /// unchanged and a capacity that is the next power of two at least
    /// `cap`.
    #[test]
    fn p3_capacity_discipline(cap in 1usize..512, len_seed in 0usize..512) {
        let _ = env_logger::try_init();
        let len = len_seed.min(cap);
        let s = Store::new();
        let r = alloc_slice::<u8>(&s, len, cap);
        prop_assert_eq!(r.len(), len);
        prop_assert!(r.capacity() >= cap);
        prop_assert_eq!(r.capacity(), r.capacity().next_power_of_two());
    }

    /// P4 — Append law: `append(r, v).value() == r.value() ++ [v]`, and
    /// the original ref is invalid afterward.
    #[test]
    fn p4_append_law(mut initial in prop::collection::vec(any::<u8>(), 0..32), v in any::<u8>()) {
        let _ = env_logger::try_init();
        let s = Store::new();
        let r = alloc_slice::<u8>(&s, initial.len(), initial.len().max(1));
        r.value().copy_from_slice(&initial);

        let expected = { initial.push(v); initial };
        let r2 = append(&s, r, v);
        prop_assert_eq!(r2.value(), expected.as_slice());

        let failed = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| r.value().to_vec()));
        prop_assert!(failed.is_err());
    }

    /// P5 — Concat law: `concat_slices(a, b, c).value() == a ++ b ++ c`.
    #[test]
    fn p5_concat_law(
        a in prop::collection::vec(any::<u8>(), 0..16),
        b in prop::collection::vec(any::<u8>(), 0..16),
        c in prop::collection::vec(any::<u8>(), 0..16),
    ) {
        let _ = env_logger::try_init();
        let s = Store::new();
        let ra = alloc_slice::<u8>(&s, a.len(), a.len().max(1));
        ra.value().copy_from_slice(&a);
        let rb = alloc_slice::<u8>(&s, b.len(), b.len().max(1));
        rb.value().copy_from_slice(&b);
        let rc = alloc_slice::<u8>(&s, c.len(), c.len().max(1));
        rc.value().copy_from_slice(&c);

        let joined = concat_slices(&s, &[ra, rb, rc]);
        let expected: Vec<u8> = a.into_iter().chain(b).chain(c).collect();
        prop_assert_eq!(joined.value(), expected.as_slice());
    }

    /// P6 — Free-list LIFO: freeing r1..rN and reallocating N times
    /// returns slots in reverse order.
    #[test]
    fn p6_free_list_is_lifo(n in 1usize..32) {
        let _ = env_logger::try_init();
        let s = Store::new();
        let refs: Vec<_> = (0..n).map(|_| alloc_object::<u32>(&s)).collect();
        let addrs: Vec<usize> = refs.iter().map(|r| r.value() as *mut u32 as usize).collect();

        for r in &refs {
            free_object(&s, *r);
        }

        let reused: Vec<usize> = (0..n)
            .map(|_| alloc_object::<u32>(&s).value() as *mut u32 as usize)
            .collect();

        let expected: Vec<usize> = addrs.into_iter().rev().collect();
        prop_assert_eq!(reused, expected);
    }

    /// P9 — Stats consistency: `live = allocs - frees`,
    /// `raw_allocs = allocs - reused`, after any sequence of allocs/frees.
    #[test]
    fn p9_stats_consistency(alloc_count in 1usize..32, free_count in 0usize..32) {
        let _ = env_logger::try_init();
        let s = Store::new();
        let refs: Vec<_> = (0..alloc_count).map(|_| alloc_object::<u32>(&s)).collect();
        for r in refs.into_iter().take(free_count.min(alloc_count)) {
            free_object(&s, r);
        }
        let stats = s.stats().total();
        prop_assert_eq!(stats.live(), stats.allocs - stats.frees);
        prop_assert_eq!(stats.raw_allocs(), stats.allocs - stats.reused);
    }
}

/// P7 — Use-after-free detection: `alloc(); free(r); r.value()` fails.
/// Not a property over random input, so a plain `#[test]`.
#[test]
fn p7_use_after_free_detected() {
    let _ = env_logger::try_init();
    let s = Store::new();
    let r = alloc_object::<u32>(&s);
    free_object(&s, r);
    let failed = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| *r.value()));
    assert!(failed.is_err());
}

/// P8 — Double-free detection: `alloc(); free(r); free(r)` fails on the
/// second call. Not a property over random input, so a plain `#[test]`.
#[test]
fn p8_double_free_detected() {
    let _ = env_logger::try_init();
    let s = Store::new();
    let r = alloc_object::<u32>(&s);
    free_object(&s, r);
    let failed = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| free_object(&s, r)));
    assert!(failed.is_err());
}

/// P10 — Slab layout: for the i-th allocation into a freshly opened size
/// class, the data pointer equals
/// `slab[i / slots_per_slab].data + (i % slots_per_slab) * slot_size`.
/// Exercised directly against `SlotLayout`/`Store::alloc_configs` since
/// the façade doesn't expose raw slab addresses.
#[test]
fn p10_slab_layout_matches_formula() {
    let _ = env_logger::try_init();
    let s = Store::new_sized(64);
    let refs: Vec<_> = (0..10).map(|_| alloc_object::<u8>(&s)).collect();
    let layout = s.alloc_configs().into_iter().next().unwrap();

    let addrs: Vec<usize> = refs.iter().map(|r| r.value() as *mut u8 as usize).collect();
    for window in addrs.chunks(layout.slots_per_slab) {
        if window.len() < 2 {
            continue;
        }
        for pair in window.windows(2) {
            assert_eq!(pair[1] - pair[0], layout.slot_size);
        }
    }
}
