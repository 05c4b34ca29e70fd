use std::io;
use ratatui::{
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
    layout::{Layout, Constraint, Direction, Rect},
    style::{Style, Color, Modifier},
    Terminal, Frame,
    text::Line,
    prelude::{Span, Text},
};
use crossterm::{
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    execute,
    event::{DisableMouseCapture, EnableMouseCapture},
};

use crate::controllers::interaction::{can_delete, Notice, Panel, PostView};
use crate::models::{CurrentUser, Post};

/// Everything one frame of the feed shows.
pub struct FeedScreen<'a> {
    pub posts: &'a [Post],
    /// One entry per post, same order as `posts`.
    pub views: &'a [PostView],
    pub user: Option<&'a CurrentUser>,
    pub status: &'a str,
    pub notice: Option<&'a Notice>,
}

pub fn setup_terminal() -> io::Result<Terminal<ratatui::backend::CrosstermBackend<io::Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = ratatui::backend::CrosstermBackend::new(stdout);
    Terminal::new(backend)
}

pub fn restore_terminal(terminal: &mut Terminal<ratatui::backend::CrosstermBackend<io::Stdout>>) -> io::Result<()> {
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()
}

pub fn render_ui<B: ratatui::backend::Backend>(
    f: &mut Frame<B>,
    screen: &FeedScreen,
    list_state: &mut ListState,
) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([Constraint::Min(3), Constraint::Length(1)].as_ref())
        .split(f.size());

    let items: Vec<ListItem> = screen.posts
        .iter()
        .zip(screen.views)
        .map(|(post, view)| post_item(post, view))
        .collect();

    let title = match screen.user {
        Some(user) => format!("{} - @{}", screen.status, user.display_name()),
        None => format!("{} - not logged in", screen.status),
    };

    let list = List::new(items)
        .block(Block::default().title(title).borders(Borders::ALL))
        .highlight_style(
            Style::default()
                .bg(Color::Gray)
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD)
        );

    f.render_stateful_widget(list, chunks[0], list_state);
    f.render_widget(notice_line(screen.notice), chunks[1]);

    let selected = list_state.selected()
        .and_then(|i| screen.posts.get(i).zip(screen.views.get(i)));
    if let Some((post, view)) = selected {
        match view.open_panel {
            Panel::None => {}
            Panel::Options => render_options(f, post, view, screen.user),
            Panel::Comments => render_comments(f, post, view),
        }
    }
}

fn post_item<'a>(post: &'a Post, view: &PostView) -> ListItem<'a> {
    let mut header = post.author_name().to_string();
    if let Some(datetime) = post.datetime() {
        header.push_str(&format!(" posted at {}", datetime));
    }

    let heart = if view.is_liked {
        Span::styled("♥", Style::default().fg(Color::Red))
    } else {
        Span::raw("♡")
    };
    let mut likes = vec![heart, Span::raw(format!(" {} likes", view.like_count))];
    if view.busy {
        likes.push(Span::styled("  …", Style::default().fg(Color::DarkGray)));
    }

    let mut all_lines = vec![
        Line::from(Span::styled(
            header,
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(post.image(), Style::default().fg(Color::DarkGray))),
    ];
    all_lines.push(Line::from(likes));
    all_lines.extend(Text::raw(post.caption()).lines);
    all_lines.push(Line::from(Span::styled(
        format!("View all {} comments", post.comments.len()),
        Style::default().fg(Color::DarkGray),
    )));
    all_lines.push(Line::from(""));

    ListItem::new(all_lines).style(Style::default())
}

fn notice_line(notice: Option<&Notice>) -> Paragraph<'_> {
    match notice {
        Some(n) if n.is_failure() => Paragraph::new(n.message()).style(Style::default().fg(Color::Red)),
        Some(n) => Paragraph::new(n.message()).style(Style::default().fg(Color::Green)),
        None => Paragraph::new("j/k move  l like  o options  c comments  r refresh  q quit")
            .style(Style::default().fg(Color::DarkGray)),
    }
}

fn render_options<B: ratatui::backend::Backend>(
    f: &mut Frame<B>,
    post: &Post,
    view: &PostView,
    user: Option<&CurrentUser>,
) {
    let mut lines = Vec::new();
    match user {
        Some(user) => {
            let author_id = post.author_id();
            if author_id.is_some() && author_id != Some(user.id.as_str()) {
                let following = author_id.is_some_and(|id| user.is_following(id));
                lines.push(Line::from(if following { "[f] Unfollow" } else { "[f] Follow" }));
            }
            if can_delete(post, Some(user)) {
                lines.push(Line::from("[d] Delete"));
            }
        }
        None => lines.push(Line::from("Log in to follow or delete")),
    }
    lines.push(Line::from("[c] Comments"));
    lines.push(Line::from("[Esc] Close"));
    if view.busy {
        lines.push(Line::from(Span::styled("working…", Style::default().fg(Color::DarkGray))));
    }

    let area = centered_rect(40, 30, f.size());
    f.render_widget(Clear, area);
    f.render_widget(
        Paragraph::new(lines)
            .block(Block::default().title("Options").borders(Borders::ALL)),
        area,
    );
}

fn render_comments<B: ratatui::backend::Backend>(f: &mut Frame<B>, post: &Post, view: &PostView) {
    let area = centered_rect(70, 70, f.size());
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(3)].as_ref())
        .split(area);

    let mut lines: Vec<Line> = post.comments
        .iter()
        .map(|c| {
            let name = c.author.as_ref().map_or(crate::models::post::DEFAULT_USERNAME, |a| a.display_name());
            Line::from(vec![
                Span::styled(name, Style::default().add_modifier(Modifier::BOLD)),
                Span::raw(" "),
                Span::raw(c.text.as_str()),
            ])
        })
        .collect();
    if lines.is_empty() {
        lines.push(Line::from(Span::styled("No comments yet", Style::default().fg(Color::DarkGray))));
    }

    let input_title = if view.busy { "Posting…" } else { "Add a comment (Enter to post, Esc to close)" };

    f.render_widget(Clear, area);
    f.render_widget(
        Paragraph::new(lines)
            .wrap(Wrap { trim: false })
            .block(Block::default().title(format!("{} - comments", post.author_name())).borders(Borders::ALL)),
        chunks[0],
    );
    f.render_widget(
        Paragraph::new(format!("> {}", view.comment_draft))
            .block(Block::default().title(input_title).borders(Borders::ALL)),
        chunks[1],
    );
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ].as_ref())
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ].as_ref())
        .split(vertical[1])[1]
}
