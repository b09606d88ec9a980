//! Byte-driven fuzz harness (spec.md §8): interpret the input byte stream
//! as a sequence of {alloc, free-at-random-index, mutate-at-random-index}
//! operations, spread across objects, slices, and strings, and assert a
//! shadow model stays in sync with the live allocator after every step.
//!
//! Slices and strings get their own op set because their growth protocol
//! (in-place reissue vs. copy-to-a-new-class) is the most invalidation-prone
//! code in the crate, and the plain object path alone never exercises it.
//!
//! Run as a plain binary over a corpus file
//! (`cargo run --bin fuzz < corpus-file`) — the same idea as a
//! `cargo-fuzz` target, minus the `libFuzzer` harness this crate doesn't
//! otherwise depend on.

use std::io::Read;

use arbitrary::{Arbitrary, Unstructured};

use offheap::facade::{
    alloc_object, alloc_slice, alloc_string_from_bytes, append, append_string, free_object,
    free_slice, free_string, ObjectRef, SliceRef, StringRef,
};
use offheap::Store;

#[derive(Arbitrary, Debug)]
enum Op {
    AllocObject(u32),
    FreeObject(u8),
    MutateObject(u8, u32),
    AllocSlice(Vec<u8>, u8),
    AppendSlice(u8, u8),
    FreeSlice(u8),
    AllocString(Vec<u8>),
    AppendString(u8, Vec<u8>),
    FreeString(u8),
}

fn main() {
    let mut bytes = Vec::new();
    std::io::stdin()
        .read_to_end(&mut bytes)
        .expect("failed to read fuzz input from stdin");

    let mut u = Unstructured::new(&bytes);
    let store = Store::new();

    let mut objects: Vec<Option<ObjectRef<u32>>> = Vec::new();
    let mut object_shadow: Vec<Option<u32>> = Vec::new();

    let mut slices: Vec<Option<SliceRef<u8>>> = Vec::new();
    let mut slice_shadow: Vec<Option<Vec<u8>>> = Vec::new();

    let mut strings: Vec<Option<StringRef>> = Vec::new();
    let mut string_shadow: Vec<Option<Vec<u8>>> = Vec::new();

    let mut steps = 0usize;

    while let Ok(op) = Op::arbitrary(&mut u) {
        match op {
            Op::AllocObject(v) => {
                let r = alloc_object::<u32>(&store);
                *r.value() = v;
                objects.push(Some(r));
                object_shadow.push(Some(v));
            }
            Op::FreeObject(idx) => {
                if objects.is_empty() {
                    continue;
                }
                let idx = idx as usize % objects.len();
                if let Some(slot) = objects[idx].take() {
                    free_object(&store, slot);
                    object_shadow[idx] = None;
                }
            }
            Op::MutateObject(idx, v) => {
                if objects.is_empty() {
                    continue;
                }
                let idx = idx as usize % objects.len();
                if let Some(r) = objects[idx] {
                    *r.value() = v;
                    object_shadow[idx] = Some(v);
                }
            }
            Op::AllocSlice(data, extra_cap) => {
                let capacity = data.len() + (extra_cap as usize % 8);
                let r = alloc_slice::<u8>(&store, data.len(), capacity.max(1));
                if !data.is_empty() {
                    r.value().copy_from_slice(&data);
                }
                slices.push(Some(r));
                slice_shadow.push(Some(data));
            }
            Op::AppendSlice(idx, byte) => {
                if slices.is_empty() {
                    continue;
                }
                let idx = idx as usize % slices.len();
                if let Some(slot) = slices[idx].take() {
                    let grown = append(&store, slot, byte);
                    slices[idx] = Some(grown);
                    slice_shadow[idx].as_mut().unwrap().push(byte);
                }
            }
            Op::FreeSlice(idx) => {
                if slices.is_empty() {
                    continue;
                }
                let idx = idx as usize % slices.len();
                if let Some(slot) = slices[idx].take() {
                    free_slice(&store, slot);
                    slice_shadow[idx] = None;
                }
            }
            Op::AllocString(data) => {
                let r = alloc_string_from_bytes(&store, &data);
                strings.push(Some(r));
                string_shadow.push(Some(data));
            }
            Op::AppendString(idx, more) => {
                if strings.is_empty() {
                    continue;
                }
                let idx = idx as usize % strings.len();
                let Ok(more_str) = std::str::from_utf8(&more) else {
                    continue;
                };
                if let Some(slot) = strings[idx].take() {
                    let grown = append_string(&store, slot, more_str);
                    strings[idx] = Some(grown);
                    string_shadow[idx]
                        .as_mut()
                        .unwrap()
                        .extend_from_slice(more_str.as_bytes());
                }
            }
            Op::FreeString(idx) => {
                if strings.is_empty() {
                    continue;
                }
                let idx = idx as usize % strings.len();
                if let Some(slot) = strings[idx].take() {
                    free_string(&store, slot);
                    string_shadow[idx] = None;
                }
            }
        }

        for (i, slot) in objects.iter().enumerate() {
            if let Some(r) = slot {
                assert_eq!(
                    Some(*r.value()),
                    object_shadow[i],
                    "object shadow/live mismatch at index {i} after {steps} ops"
                );
            }
        }
        for (i, slot) in slices.iter().enumerate() {
            if let Some(r) = slot {
                assert_eq!(
                    Some(r.value().to_vec()),
                    slice_shadow[i],
                    "slice shadow/live mismatch at index {i} after {steps} ops"
                );
            }
        }
        for (i, slot) in strings.iter().enumerate() {
            if let Some(r) = slot {
                assert_eq!(
                    Some(r.value().as_bytes().to_vec()),
                    string_shadow[i],
                    "string shadow/live mismatch at index {i} after {steps} ops"
                );
            }
        }
        steps += 1;
    }

    eprintln!(
        "fuzz: ran {steps} ops, {} objects, {} slices, {} strings still live",
        objects.iter().flatten().count(),
        slices.iter().flatten().count(),
        strings.iter().flatten().count(),
    );
}
