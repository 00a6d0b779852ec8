//! Drawing the picker with `ratatui`

use std::io::{self, Stdout};

use chrono::Local;
use crossterm::event::{DisableMouseCapture, EnableMouseCapture};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, SetTitle, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, List, ListItem, ListState, Paragraph, Wrap};

use super::app::PickerApp;
use crate::constants::tui::STATUS_HEIGHT;

pub type TuiTerminal = Terminal<CrosstermBackend<Stdout>>;

/// Enable raw mode and enter the alternate screen
pub fn init_terminal() -> io::Result<TuiTerminal> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture, SetTitle("waypy"))?;
    let backend = CrosstermBackend::new(stdout);
    Terminal::new(backend)
}

/// Undo everything `init_terminal` did
pub fn restore_terminal(terminal: &mut TuiTerminal) -> io::Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
    terminal.show_cursor()?;
    Ok(())
}

pub fn draw(app: &PickerApp, terminal: &mut TuiTerminal) -> io::Result<()> {
    terminal.draw(|frame| {
        let area = frame.size();
        let vertical = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Min(3),
                Constraint::Length(STATUS_HEIGHT),
                Constraint::Length(1),
            ])
            .split(area);

        let header = Line::from(vec![
            Span::styled(
                " waypy ",
                Style::default().fg(Color::Black).bg(Color::Cyan).add_modifier(Modifier::BOLD),
            ),
            Span::raw(" Waybar profiles  "),
            Span::styled(
                Local::now().format("%H:%M:%S").to_string(),
                Style::default().fg(Color::DarkGray),
            ),
        ]);
        frame.render_widget(Paragraph::new(header), vertical[0]);

        let items: Vec<ListItem> = app
            .tree
            .rows()
            .iter()
            .map(|row| {
                let indent = "  ".repeat(row.depth);
                let (icon, style) = if row.is_dir {
                    let icon = if row.expanded { "▼ " } else { "▶ " };
                    (icon, Style::default().fg(Color::Blue).add_modifier(Modifier::BOLD))
                } else {
                    ("  ", Style::default())
                };
                let selected = app.selected_path.as_deref() == Some(row.path.as_path());
                let name_style = if selected {
                    style.fg(Color::Green)
                } else {
                    style
                };
                ListItem::new(Line::from(vec![
                    Span::raw(indent),
                    Span::styled(icon, Style::default().fg(Color::DarkGray)),
                    Span::styled(row.name.clone(), name_style),
                ]))
            })
            .collect();

        let tree_title = format!(" {} ", app.tree.root().display());
        let list = List::new(items)
            .block(
                Block::default()
                    .title(tree_title)
                    .borders(Borders::ALL)
                    .border_type(BorderType::Rounded),
            )
            .highlight_style(Style::default().bg(Color::DarkGray))
            .highlight_symbol("› ");
        let mut state = ListState::default();
        if !app.tree.is_empty() {
            state.select(Some(app.cursor));
        }
        frame.render_stateful_widget(list, vertical[1], &mut state);

        let status_title = if app.busy { " Status (working…) " } else { " Status " };
        let status = Paragraph::new(app.status.as_str())
            .block(
                Block::default()
                    .title(status_title)
                    .borders(Borders::ALL)
                    .border_type(BorderType::Rounded),
            )
            .wrap(Wrap { trim: false });
        frame.render_widget(status, vertical[2]);

        let footer = Line::from(
            [
                ("↑↓", "move"),
                ("⏎", "select"),
                ("←", "collapse"),
                ("d", "deploy"),
                ("r", "reload"),
                ("F5", "refresh"),
                ("q", "quit"),
            ]
            .iter()
            .flat_map(|(key, label)| {
                [
                    Span::styled(format!(" {key} "), Style::default().fg(Color::Cyan)),
                    Span::styled(format!("{label} "), Style::default().fg(Color::Gray)),
                ]
            })
            .collect::<Vec<_>>(),
        );
        frame.render_widget(Paragraph::new(footer), vertical[3]);
    })?;
    Ok(())
}
