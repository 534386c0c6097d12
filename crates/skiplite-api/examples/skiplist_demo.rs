use skiplite::logging::LogConfig;
use skiplite::{Engine, EngineConfig, SnapshotConfig, SweepConfig, Sweeper, Ttl};
use std::time::Duration;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Debug level shows every insert and delete
    let _guard = LogConfig::debug().init()?;

    println!("=== SkipLite Demo ===\n");

    let config = EngineConfig::default()
        .with_max_level(6)
        .with_snapshot(SnapshotConfig::at("store/dumpFile.txt"));
    let engine: Engine<u32, String> = Engine::with_config(config)?;

    println!("1. Inserting data...");
    engine.insert(1, "sing".to_string())?;
    engine.insert(2, "dance".to_string())?;
    engine.insert(3, "rap".to_string())?;
    engine.insert(5, "basketball".to_string())?;
    println!("size: {}", engine.len()?);

    println!("\n2. Level layout...");
    let levels = engine.levels()?;
    for (i, keys) in levels.iter().enumerate() {
        println!("level {}: {:?}", levels.len() - 1 - i, keys);
    }

    println!("\n3. Reading data...");
    match engine.search(&2)? {
        Some(value) => println!("2 => {}", value),
        None => println!("2 not found"),
    }
    println!("9 => {:?}", engine.search(&9)?);

    println!("\n4. Expiring a key...");
    engine.set_ttl(&5, 1)?;
    if let Ttl::Remaining(secs) = engine.ttl(&5)? {
        println!("5 expires in {}s", secs);
    }

    let sweeper = Sweeper::spawn(
        engine.clone(),
        SweepConfig {
            interval: Duration::from_millis(500),
            dump: true,
        },
    )?;
    std::thread::sleep(Duration::from_millis(2_500));
    sweeper.stop();
    println!("after sweep: {:?}", engine.entries()?);

    println!("\n5. Reloading the snapshot...");
    engine.delete(&2)?;
    let fresh: Engine<u32, String> = Engine::with_config(engine.config().clone())?;
    let stats = fresh.load()?;
    println!("applied {}, skipped {}", stats.applied, stats.skipped);
    println!("reloaded: {:?}", fresh.entries()?);

    println!("\n{:#?}", engine.stats()?);
    println!("\n=== Demo Complete ===");
    Ok(())
}
