//! Lazily expanded directory tree flattened into display rows

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeRow {
    pub path: PathBuf,
    pub name: String,
    pub depth: usize,
    pub is_dir: bool,
    pub expanded: bool,
}

/// Visible rows of a directory tree. Children are read from disk when a
/// directory is expanded and dropped again when it collapses.
#[derive(Debug)]
pub struct DirTree {
    root: PathBuf,
    rows: Vec<TreeRow>,
}

impl DirTree {
    pub fn new(root: impl Into<PathBuf>) -> io::Result<Self> {
        let root = root.into();
        let rows = read_children(&root, 0)?;
        Ok(Self { root, rows })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn rows(&self) -> &[TreeRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&TreeRow> {
        self.rows.get(index)
    }

    /// Expand a collapsed directory row. Returns false for files and rows
    /// that are already expanded.
    pub fn expand(&mut self, index: usize) -> io::Result<bool> {
        let Some(row) = self.rows.get(index) else {
            return Ok(false);
        };
        if !row.is_dir || row.expanded {
            return Ok(false);
        }

        let children = read_children(&row.path, row.depth + 1)?;
        self.rows[index].expanded = true;
        self.rows.splice(index + 1..index + 1, children);
        Ok(true)
    }

    /// Collapse an expanded directory row, removing all of its descendants
    pub fn collapse(&mut self, index: usize) -> bool {
        let Some(row) = self.rows.get(index) else {
            return false;
        };
        if !row.expanded {
            return false;
        }

        let depth = row.depth;
        let end = self.rows[index + 1..]
            .iter()
            .position(|r| r.depth <= depth)
            .map(|offset| index + 1 + offset)
            .unwrap_or(self.rows.len());
        self.rows.drain(index + 1..end);
        self.rows[index].expanded = false;
        true
    }

    /// Index of the nearest ancestor row, if any
    pub fn parent_of(&self, index: usize) -> Option<usize> {
        let depth = self.rows.get(index)?.depth;
        if depth == 0 {
            return None;
        }
        self.rows[..index].iter().rposition(|r| r.depth < depth)
    }

    /// Re-read the root, keeping nothing expanded
    pub fn refresh(&mut self) -> io::Result<()> {
        self.rows = read_children(&self.root, 0)?;
        Ok(())
    }
}

/// Directories first, then files, each sorted by name; dotfiles hidden
fn read_children(dir: &Path, depth: usize) -> io::Result<Vec<TreeRow>> {
    let mut rows = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().to_string();
        if name.starts_with('.') {
            continue;
        }
        let path = entry.path();
        rows.push(TreeRow {
            is_dir: path.is_dir(),
            path,
            name,
            depth,
            expanded: false,
        });
    }

    rows.sort_by(|a, b| b.is_dir.cmp(&a.is_dir).then_with(|| a.name.cmp(&b.name)));
    Ok(rows)
}
