//! Load command implementation for the rekindle CLI.
//!
//! Loads a module once and prints its dependency closure.

use std::path::Path;
use std::time::Instant;

use rekindle_core::{HotReloader, ModuleId};
use rekindle_script::ScriptHost;

use crate::colors;

/// Execute the load command.
pub fn execute(module: &str, root: &str) -> anyhow::Result<()> {
    let start = Instant::now();

    let root_path = Path::new(root);
    if !root_path.is_dir() {
        anyhow::bail!("Script root not found: {}", root);
    }

    let module = ModuleId::module(module);
    let reloader = HotReloader::new(module, ScriptHost::new(root_path))?;

    // Print header
    println!(
        "\n{}Rekindle Load{} - {}{}{}",
        colors::BOLD,
        colors::RESET,
        colors::CYAN,
        reloader.module(),
        colors::RESET
    );
    println!("{}", colors::rule());

    let handle = reloader.reload()?;
    let script = match handle.try_result() {
        Some(Ok(script)) => script,
        Some(Err(error)) => anyhow::bail!("Load failed: {}", error),
        None => anyhow::bail!("Load did not settle"),
    };

    println!("\n{}Dependencies:{}", colors::BOLD, colors::RESET);
    println!("{}", colors::rule());
    if script.dependencies.is_empty() {
        println!("{}(none){}", colors::DIM, colors::RESET);
    } else {
        for dep in &script.dependencies {
            println!("  {}", dep);
        }
    }

    // Summary
    let total_time = start.elapsed();
    println!("\n{}", colors::rule());
    println!(
        "{}Loaded{} {} ({} bytes, {} dependencies) in {:.2}s",
        colors::GREEN,
        colors::RESET,
        script.module,
        script.source.len(),
        script.dependencies.len(),
        total_time.as_secs_f64()
    );

    Ok(())
}
