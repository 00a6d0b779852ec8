//! Interactive profile picker
//!
//! Shows the profiles root as a directory tree. Selections are turned into
//! deploys and reloads through the same `Deployer` the CLI uses.

mod app;
mod render;
mod tree;

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::event::{self, Event as TermEvent, KeyEventKind};
use tracing::{error, info};

use crate::constants::tui::TICK_MS;
use crate::waybar::{Deployer, Reload};

pub use app::{PickerAction, PickerApp, PickerEvent};
pub use tree::DirTree;

/// Run the picker until the user quits
pub fn run<R: Reload>(deployer: &Deployer<R>, process_name: &str, root: &Path) -> Result<()> {
    let tree = DirTree::new(root)
        .with_context(|| format!("Failed to read profiles directory {:?}", root))?;
    let mut app = PickerApp::new(tree);

    let mut terminal = render::init_terminal().context("Failed to initialise terminal")?;
    let result = event_loop(&mut app, &mut terminal, deployer, process_name);
    if let Err(e) = render::restore_terminal(&mut terminal) {
        error!(error = %e, "Failed to restore terminal");
    }
    result
}

fn event_loop<R: Reload>(
    app: &mut PickerApp,
    terminal: &mut render::TuiTerminal,
    deployer: &Deployer<R>,
    process_name: &str,
) -> Result<()> {
    loop {
        render::draw(app, terminal)?;

        if !event::poll(Duration::from_millis(TICK_MS))? {
            continue;
        }
        let TermEvent::Key(key) = event::read()? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }

        let action = app.handle_key(key);
        for PickerEvent::PathSelected(path) in app.take_events() {
            info!(path = ?path, "Profile selection changed");
        }

        match action {
            PickerAction::None => {}
            PickerAction::Quit => return Ok(()),
            PickerAction::Deploy(path) => {
                app.busy = true;
                app.set_status(format!("Deploying {}…", path.display()));
                render::draw(app, terminal)?;

                let status = match deployer.deploy_path(&path) {
                    Ok(result) => result.render(),
                    Err(e) => format!("⚠️ {e}"),
                };
                app.set_status(status);
                app.busy = false;
            }
            PickerAction::Reload => {
                app.busy = true;
                app.set_status(format!("Reloading {process_name}…"));
                render::draw(app, terminal)?;

                let outcome = deployer.reloader().reload();
                let marker = if outcome.is_fatal() { "❌" } else { "•" };
                app.set_status(format!("{marker} {}", outcome.summary(process_name)));
                app.busy = false;
            }
        }
    }
}
