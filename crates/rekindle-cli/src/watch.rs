//! Watch command implementation for the rekindle CLI.
//!
//! Runs a reloader over the script host and drives it from file events.

use std::path::Path;

use rekindle_core::{DependencyChange, HotReloader, LoadHandle, ModuleId};
use rekindle_script::{FileEvent, FileWatcher, LoadedScript, ScriptEnvironment, ScriptHost};

use crate::colors;

/// Execute the watch command.
pub async fn execute(module: &str, root: &str, no_auto: bool) -> anyhow::Result<()> {
    let root_path = Path::new(root);
    if !root_path.is_dir() {
        anyhow::bail!("Script root not found: {}", root);
    }
    let root_path = root_path.canonicalize()?;

    let module = ModuleId::module(module);
    let reloader = HotReloader::new(module, ScriptHost::new(&root_path))?;
    if no_auto {
        reloader.set_auto_reload(false);
    }

    // Print header
    println!(
        "\n{}Rekindle Watch{} - {}{}{}",
        colors::BOLD,
        colors::RESET,
        colors::CYAN,
        reloader.module(),
        colors::RESET
    );
    println!("{}", colors::rule());

    let _started = reloader
        .reload_started()
        .connect(|handle: &LoadHandle<LoadedScript>| report_cycle(handle));
    let _changed = reloader.dependency_changed().connect(
        |change: &DependencyChange<ScriptEnvironment>| {
            println!(
                "\n{}Changed:{} {} (environment {})",
                colors::YELLOW,
                colors::RESET,
                change.module,
                change.environment.id()
            );
        },
    );

    // Initial load; a failed load keeps watching so a fix can retry it.
    reloader.reload()?;
    print_watch_status();

    let mut watcher = FileWatcher::new(&root_path)
        .map_err(|e| anyhow::anyhow!("Failed to create file watcher: {}", e))?;

    // Watch loop
    loop {
        tokio::select! {
            event = watcher.recv() => match event {
                Some(event) => {
                    handle_event(&reloader, &event, no_auto)?;
                    print_watch_status();
                }
                None => break,
            },
            _ = tokio::signal::ctrl_c() => {
                println!("\n{}Stopping.{}", colors::DIM, colors::RESET);
                break;
            }
        }
    }

    reloader.destroy();
    Ok(())
}

/// Feed one file event into the current environment.
fn handle_event(
    reloader: &HotReloader<ScriptHost>,
    event: &FileEvent,
    no_auto: bool,
) -> anyhow::Result<()> {
    if let FileEvent::Removed(path) = event {
        eprintln!(
            "\n{}Warning:{} File removed: {}",
            colors::YELLOW,
            colors::RESET,
            path.display()
        );
    }

    let Some(environment) = reloader.environment() else {
        return Ok(());
    };
    let fired = environment.notice_change(event.path());
    if fired && no_auto {
        // The change was announced but auto-reload is off; reload here.
        reloader.reload()?;
    }
    Ok(())
}

/// Print the outcome of one reload cycle.
fn report_cycle(handle: &LoadHandle<LoadedScript>) {
    match handle.try_result() {
        Some(Ok(script)) => {
            println!(
                "{}Reloaded{} {} ({} bytes, {} dependencies)",
                colors::GREEN,
                colors::RESET,
                script.module,
                script.source.len(),
                script.dependencies.len()
            );
        }
        Some(Err(error)) => {
            eprintln!("{}Error:{} {}", colors::RED, colors::RESET, error);
        }
        None => {
            println!("{}Reload started...{}", colors::DIM, colors::RESET);
        }
    }
}

fn print_watch_status() {
    println!(
        "{}Watching for changes... (Ctrl+C to stop){}",
        colors::DIM,
        colors::RESET
    );
    colors::flush_stdout();
}
