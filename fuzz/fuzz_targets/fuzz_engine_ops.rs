#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use skiplite::{Engine, EngineConfig, NodeStorage};
use std::collections::BTreeMap;

#[derive(Arbitrary, Debug)]
enum EngineOp {
    Insert { key: u16, value: u8 },
    Search { key: u16 },
    Delete { key: u16 },
}

fuzz_target!(|input: (bool, Vec<EngineOp>)| {
    let (arena, ops) = input;
    let storage = if arena { NodeStorage::Arena } else { NodeStorage::Heap };
    let config = EngineConfig::default()
        .with_node_storage(storage)
        .with_bloom_bits(Some(256))
        .with_lru_capacity(4);
    let engine: Engine<u16, String> = match Engine::with_config(config) {
        Ok(engine) => engine,
        Err(_) => return,
    };
    let mut model = BTreeMap::new();

    // Limit operations to prevent timeout
    for op in ops.iter().take(500) {
        match *op {
            EngineOp::Insert { key, value } => {
                engine.insert(key, value.to_string()).unwrap();
                model.insert(key, value.to_string());
            }
            EngineOp::Search { key } => {
                assert_eq!(engine.search(&key).unwrap(), model.get(&key).cloned());
            }
            EngineOp::Delete { key } => {
                assert_eq!(engine.delete(&key).unwrap(), model.remove(&key).is_some());
            }
        }
    }

    let entries: Vec<(u16, String)> = model.into_iter().collect();
    assert_eq!(engine.entries().unwrap(), entries);
});
