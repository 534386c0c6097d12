#![no_main]

use libfuzzer_sys::fuzz_target;
use skiplite_storage::Arena;

fuzz_target!(|sizes: Vec<(u16, bool)>| {
    let mut arena = Arena::new();
    let mut slices = Vec::new();
    let mut last_usage = 0;

    for (i, &(size, aligned)) in sizes.iter().take(1_000).enumerate() {
        let size = size as usize % 8192 + 1;
        let slice = if aligned {
            arena.allocate_aligned(size).unwrap()
        } else {
            arena.allocate(size).unwrap()
        };
        arena.bytes_mut(slice).fill(i as u8);
        slices.push((slice, i as u8));

        // Usage never shrinks
        assert!(arena.memory_usage() >= last_usage);
        last_usage = arena.memory_usage();
    }

    for (slice, fill) in slices {
        assert!(arena.bytes(slice).iter().all(|b| *b == fill));
    }
});
