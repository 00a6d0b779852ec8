//! Picker state and key handling
//!
//! Key handling is pure state transition; anything touching the outside
//! world (deploying, reloading) comes back to the event loop as an action.

use std::path::PathBuf;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tracing::{debug, warn};

use super::tree::DirTree;

/// Notifications produced by the picker
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PickerEvent {
    PathSelected(PathBuf),
}

/// Work the event loop performs on behalf of the picker
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PickerAction {
    None,
    Deploy(PathBuf),
    Reload,
    Quit,
}

pub struct PickerApp {
    pub tree: DirTree,
    pub cursor: usize,
    pub selected_path: Option<PathBuf>,
    pub status: String,
    pub busy: bool,
    events: Vec<PickerEvent>,
}

impl PickerApp {
    pub fn new(tree: DirTree) -> Self {
        let status = if tree.is_empty() {
            format!("No profiles found in {}", tree.root().display())
        } else {
            "Select a profile and press d to deploy".to_string()
        };
        Self {
            tree,
            cursor: 0,
            selected_path: None,
            status,
            busy: false,
            events: Vec::new(),
        }
    }

    /// Drain selection notifications raised since the last call
    pub fn take_events(&mut self) -> Vec<PickerEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn set_status(&mut self, status: impl Into<String>) {
        self.status = status.into();
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> PickerAction {
        if self.busy {
            return PickerAction::None;
        }

        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => PickerAction::Quit,
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                PickerAction::Quit
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.cursor = self.cursor.saturating_sub(1);
                PickerAction::None
            }
            KeyCode::Down | KeyCode::Char('j') => {
                if self.cursor + 1 < self.tree.len() {
                    self.cursor += 1;
                }
                PickerAction::None
            }
            KeyCode::Enter | KeyCode::Right | KeyCode::Char('l') => {
                self.activate();
                PickerAction::None
            }
            KeyCode::Left | KeyCode::Char('h') => {
                self.collapse_or_parent();
                PickerAction::None
            }
            KeyCode::Char('d') => match &self.selected_path {
                Some(path) => PickerAction::Deploy(path.clone()),
                None => {
                    self.set_status("⚠️ No profile selected.");
                    PickerAction::None
                }
            },
            KeyCode::Char('r') => PickerAction::Reload,
            KeyCode::F(5) => {
                self.refresh();
                PickerAction::None
            }
            _ => PickerAction::None,
        }
    }

    /// Select the row under the cursor and expand it when it is a directory
    fn activate(&mut self) {
        let Some(row) = self.tree.get(self.cursor).cloned() else {
            return;
        };

        let kind = if row.is_dir { "directory" } else { "file" };
        self.set_status(format!("Selected {kind}: {}", row.path.display()));
        self.selected_path = Some(row.path.clone());
        debug!(path = ?row.path, "Path selected");
        self.events.push(PickerEvent::PathSelected(row.path.clone()));

        if row.is_dir
            && let Err(e) = self.tree.expand(self.cursor)
        {
            warn!(path = ?row.path, error = %e, "Failed to read directory");
            self.set_status(format!("⚠️ Cannot read {}: {e}", row.path.display()));
        }
    }

    fn collapse_or_parent(&mut self) {
        if self.tree.collapse(self.cursor) {
            return;
        }
        if let Some(parent) = self.tree.parent_of(self.cursor) {
            self.cursor = parent;
        }
    }

    fn refresh(&mut self) {
        match self.tree.refresh() {
            Ok(()) => {
                self.cursor = 0;
                self.set_status("Profiles reloaded from disk");
            }
            Err(e) => self.set_status(format!("⚠️ Refresh failed: {e}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyEventKind, KeyEventState};
    use std::fs;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent {
            code,
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Press,
            state: KeyEventState::NONE,
        }
    }

    fn app() -> (tempfile::TempDir, PickerApp) {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("dark")).unwrap();
        fs::write(dir.path().join("dark").join("config"), "{}").unwrap();
        fs::create_dir(dir.path().join("light")).unwrap();
        let tree = DirTree::new(dir.path()).unwrap();
        (dir, PickerApp::new(tree))
    }

    #[test]
    fn test_deploy_without_selection_warns() {
        let (_dir, mut app) = app();
        assert_eq!(app.handle_key(key(KeyCode::Char('d'))), PickerAction::None);
        assert_eq!(app.status, "⚠️ No profile selected.");
    }

    #[test]
    fn test_select_directory_emits_event_and_expands() {
        let (dir, mut app) = app();
        app.handle_key(key(KeyCode::Enter));

        let dark = dir.path().join("dark");
        assert_eq!(app.selected_path.as_ref(), Some(&dark));
        assert_eq!(app.status, format!("Selected directory: {}", dark.display()));
        assert_eq!(app.take_events(), vec![PickerEvent::PathSelected(dark.clone())]);
        assert!(app.take_events().is_empty());
        assert_eq!(app.tree.len(), 3);

        assert_eq!(
            app.handle_key(key(KeyCode::Char('d'))),
            PickerAction::Deploy(dark)
        );
    }

    #[test]
    fn test_select_file_inside_profile() {
        let (dir, mut app) = app();
        app.handle_key(key(KeyCode::Enter));
        app.handle_key(key(KeyCode::Down));
        app.handle_key(key(KeyCode::Enter));

        let config = dir.path().join("dark").join("config");
        assert_eq!(app.status, format!("Selected file: {}", config.display()));
        assert_eq!(
            app.handle_key(key(KeyCode::Char('d'))),
            PickerAction::Deploy(config)
        );
    }

    #[test]
    fn test_cursor_movement_is_clamped() {
        let (_dir, mut app) = app();
        app.handle_key(key(KeyCode::Up));
        assert_eq!(app.cursor, 0);
        for _ in 0..5 {
            app.handle_key(key(KeyCode::Char('j')));
        }
        assert_eq!(app.cursor, 1);
    }

    #[test]
    fn test_left_collapses_then_moves_to_parent() {
        let (_dir, mut app) = app();
        app.handle_key(key(KeyCode::Enter));
        app.handle_key(key(KeyCode::Down));
        app.handle_key(key(KeyCode::Left));
        assert_eq!(app.cursor, 0);
        app.handle_key(key(KeyCode::Left));
        assert_eq!(app.tree.len(), 2);
    }

    #[test]
    fn test_busy_ignores_keys() {
        let (_dir, mut app) = app();
        app.busy = true;
        assert_eq!(app.handle_key(key(KeyCode::Char('q'))), PickerAction::None);
        app.busy = false;
        assert_eq!(app.handle_key(key(KeyCode::Char('q'))), PickerAction::Quit);
        assert_eq!(app.handle_key(key(KeyCode::Char('r'))), PickerAction::Reload);
    }
}
