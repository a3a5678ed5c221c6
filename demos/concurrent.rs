//! Three workers report on their own child nodes while the root counts finished workers.
//!
//! Run with `cargo run --example concurrent`.

use std::{thread, time::Duration};

use tree_progress::{ProgressRenderer, Result};

fn main() -> Result<()> {
    let renderer = ProgressRenderer::new()?;
    let root = renderer.create_root("Downloading files...");

    let durations = [2000u64, 2300, 1500];
    root.set_total(durations.len() as u64);

    let workers: Vec<_> = durations
        .into_iter()
        .map(|millis| {
            let root = root.clone();
            thread::spawn(move || {
                let step = millis / 100;
                let child = root.spawn(100);
                child.set_message(format!("Duration: {millis}"));

                for i in 0..100 {
                    thread::sleep(Duration::from_millis(step));
                    child.tick_with_message(format!("Finished {} of {millis}", step * i));
                }

                child.tick_with_message("Done");
                root.tick();
            })
        })
        .collect();

    for worker in workers {
        if worker.join().is_err() {
            root.set_message("A worker panicked");
        }
    }

    renderer.shutdown();
    println!("All downloads finished.");
    Ok(())
}
