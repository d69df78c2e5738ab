use std::{cmp, collections::HashSet, io, thread, time::Duration};

use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use gametrack_core::{
    config::BrowseConfig,
    filter::{Membership, RatingFilter, SortKey},
    CatalogEntry, CatalogId, CatalogQuery, EntryId, EntryRequest, EntryUpdate, GameView,
    LibraryError, ListEntryView, ListQuery, LocalStore, Library, Page, PageRequest, ProfileStats,
    Rating,
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Tabs, Wrap},
    Frame, Terminal,
};
use tokio::sync::mpsc;
use tracing::{info, warn};

const TICK_RATE: Duration = Duration::from_millis(250);

#[derive(Debug, Clone)]
struct Theme {
    primary_fg: Color,
    accent: Color,
    muted: Color,
    selection_bg: Color,
    success: Color,
    danger: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            primary_fg: Color::White,
            accent: Color::Cyan,
            muted: Color::DarkGray,
            selection_bg: Color::DarkGray,
            success: Color::Green,
            danger: Color::Red,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Screen {
    Catalog,
    MyList,
}

impl Screen {
    fn index(self) -> usize {
        match self {
            Self::Catalog => 0,
            Self::MyList => 1,
        }
    }

    fn toggle(self) -> Self {
        match self {
            Self::Catalog => Self::MyList,
            Self::MyList => Self::Catalog,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Browse,
    Search,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PromptTarget {
    Add(CatalogId),
    Edit(EntryId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PromptField {
    Rating,
    Note,
}

/// Rating and note editor shown over either screen.
#[derive(Debug, Clone)]
struct EntryPrompt {
    target: PromptTarget,
    title: String,
    rating: u8,
    note: String,
    field: PromptField,
}

impl EntryPrompt {
    fn add(game: &CatalogEntry) -> Self {
        Self {
            target: PromptTarget::Add(game.id),
            title: game.title.clone(),
            rating: Rating::MAX,
            note: String::new(),
            field: PromptField::Rating,
        }
    }

    fn edit(view: &ListEntryView) -> Self {
        Self {
            target: PromptTarget::Edit(view.id),
            title: view.title.clone(),
            rating: view.rating.value(),
            note: view.note.clone().unwrap_or_default(),
            field: PromptField::Rating,
        }
    }

    fn step_rating(&mut self, delta: i8) {
        let next = self.rating as i8 + delta;
        self.rating = next.clamp(Rating::MIN as i8, Rating::MAX as i8) as u8;
    }

    fn switch_field(&mut self) {
        self.field = match self.field {
            PromptField::Rating => PromptField::Note,
            PromptField::Note => PromptField::Rating,
        };
    }

    /// The note exactly as typed; only an empty field means "no note".
    fn note(&self) -> Option<String> {
        (!self.note.is_empty()).then(|| self.note.clone())
    }
}

enum PromptAction {
    Keep,
    Cancel,
    Submit,
}

enum AppEvent {
    Input(Event),
    Tick,
}

struct CatalogPane {
    query: CatalogQuery,
    page: Page<CatalogEntry>,
    on_list: HashSet<CatalogId>,
    cursor: usize,
}

struct ListPane {
    query: ListQuery,
    page: Page<ListEntryView>,
    cursor: usize,
}

/// Terminal front end over a [`Library`].
pub struct GametrackApp {
    library: Library<LocalStore, LocalStore>,
    user: String,
    screen: Screen,
    mode: Mode,
    search_backup: Option<String>,
    catalog: CatalogPane,
    list: ListPane,
    prompt: Option<EntryPrompt>,
    profile: ProfileStats,
    status: String,
    status_is_error: bool,
    should_quit: bool,
    theme: Theme,
}

impl GametrackApp {
    pub fn new(store: LocalStore, user: impl Into<String>, browse: &BrowseConfig) -> Self {
        let catalog_query = CatalogQuery {
            page: PageRequest::first(browse.catalog_page_size),
            ..CatalogQuery::default()
        };
        let list_query = ListQuery {
            page: PageRequest::first(browse.list_page_size),
            ..ListQuery::default()
        };
        let mut app = Self {
            library: Library::new(store.clone(), store),
            user: user.into(),
            screen: Screen::Catalog,
            mode: Mode::Browse,
            search_backup: None,
            catalog: CatalogPane {
                query: catalog_query,
                page: Page::empty(),
                on_list: HashSet::new(),
                cursor: 0,
            },
            list: ListPane {
                query: list_query,
                page: Page::empty(),
                cursor: 0,
            },
            prompt: None,
            profile: ProfileStats {
                completed: 0,
                average_rating: None,
            },
            status: "Ready".to_string(),
            status_is_error: false,
            should_quit: false,
            theme: Theme::default(),
        };
        app.refresh();
        app
    }

    pub fn set_status(&mut self, status: impl Into<String>) {
        self.status = status.into();
        self.status_is_error = false;
    }

    fn report(&mut self, err: &LibraryError) {
        warn!(kind = err.kind().as_str(), error = %err, "library operation failed");
        self.status = err.user_message();
        self.status_is_error = true;
    }

    pub async fn run(&mut self) -> Result<()> {
        let mut stdout = io::stdout();
        enable_raw_mode().context("failed to enter raw mode")?;
        execute!(stdout, EnterAlternateScreen).context("failed to enter alternate screen")?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend).context("failed to create terminal")?;
        terminal.hide_cursor()?;
        terminal.clear()?;

        let (event_tx, mut event_rx) = mpsc::channel::<AppEvent>(128);
        spawn_input_thread(event_tx);

        let result = self.event_loop(&mut terminal, &mut event_rx).await;
        restore_terminal(&mut terminal)?;
        info!(user = %self.user, "session ended");
        result
    }

    async fn event_loop(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
        events: &mut mpsc::Receiver<AppEvent>,
    ) -> Result<()> {
        loop {
            terminal.draw(|frame| self.draw(frame))?;
            match events.recv().await {
                Some(AppEvent::Input(Event::Key(key))) if key.kind == KeyEventKind::Press => {
                    self.handle_key(key);
                }
                Some(AppEvent::Input(_)) | Some(AppEvent::Tick) => {}
                None => break,
            }
            if self.should_quit {
                break;
            }
        }
        Ok(())
    }

    /// Reload both panes and the profile from the library.
    fn refresh(&mut self) {
        if let Err(err) = self.refresh_catalog() {
            self.report(&err);
        }
        if let Err(err) = self.refresh_list() {
            self.report(&err);
        }
        match self.library.profile(&self.user) {
            Ok(profile) => self.profile = profile,
            Err(err) => self.report(&err),
        }
    }

    fn refresh_catalog(&mut self) -> Result<(), LibraryError> {
        self.catalog.on_list = self.library.catalog_ids_on_list(&self.user)?;
        let mut page = self.library.browse_catalog(&self.user, &self.catalog.query)?;
        if page.items.is_empty() && page.has_previous {
            self.catalog.query.page = self.catalog.query.page.previous();
            page = self.library.browse_catalog(&self.user, &self.catalog.query)?;
        }
        self.catalog.page = page;
        self.catalog.cursor = clamp_cursor(self.catalog.cursor, self.catalog.page.items.len());
        Ok(())
    }

    fn refresh_list(&mut self) -> Result<(), LibraryError> {
        let mut page = self.library.browse_list(&self.user, &self.list.query)?;
        if page.items.is_empty() && page.has_previous {
            self.list.query.page = self.list.query.page.previous();
            page = self.library.browse_list(&self.user, &self.list.query)?;
        }
        self.list.page = page;
        self.list.cursor = clamp_cursor(self.list.cursor, self.list.page.items.len());
        Ok(())
    }

    fn handle_key(&mut self, key: KeyEvent) {
        if self.prompt.is_some() {
            self.handle_prompt_key(key);
            return;
        }
        match self.mode {
            Mode::Search => self.handle_search_key(key),
            Mode::Browse => self.handle_browse_key(key),
        }
    }

    fn search_term_mut(&mut self) -> &mut Option<String> {
        match self.screen {
            Screen::Catalog => &mut self.catalog.query.search,
            Screen::MyList => &mut self.list.query.search,
        }
    }

    fn reset_page(&mut self) {
        match self.screen {
            Screen::Catalog => {
                self.catalog.query.page = PageRequest::first(self.catalog.query.page.size);
                self.catalog.cursor = 0;
            }
            Screen::MyList => {
                self.list.query.page = PageRequest::first(self.list.query.page.size);
                self.list.cursor = 0;
            }
        }
    }

    fn handle_search_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => {
                let backup = self.search_backup.take();
                *self.search_term_mut() = backup;
                self.mode = Mode::Browse;
                self.reset_page();
                self.refresh();
                self.set_status("Search cancelled");
            }
            KeyCode::Enter => {
                self.search_backup = None;
                self.mode = Mode::Browse;
                let term = self.search_term_mut().clone().unwrap_or_default();
                self.set_status(format!("Search applied: {term}"));
            }
            KeyCode::Backspace => {
                let term = self.search_term_mut();
                if let Some(text) = term.as_mut() {
                    text.pop();
                }
                if term.as_deref() == Some("") {
                    *term = None;
                }
                self.reset_page();
                self.refresh();
            }
            KeyCode::Char(ch)
                if key.modifiers.is_empty() || key.modifiers == KeyModifiers::SHIFT =>
            {
                self.search_term_mut().get_or_insert_with(String::new).push(ch);
                self.reset_page();
                self.refresh();
            }
            _ => {}
        }
    }

    fn handle_browse_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') if key.modifiers.is_empty() => self.should_quit = true,
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.should_quit = true
            }
            KeyCode::Tab => {
                self.screen = self.screen.toggle();
                self.refresh();
            }
            KeyCode::Char('j') | KeyCode::Down => self.move_cursor(1),
            KeyCode::Char('k') | KeyCode::Up => self.move_cursor(-1),
            KeyCode::Char('n') | KeyCode::PageDown => self.change_page(true),
            KeyCode::Char('p') | KeyCode::PageUp => self.change_page(false),
            KeyCode::Char('/') => {
                self.search_backup = self.search_term_mut().clone();
                self.mode = Mode::Search;
                self.set_status("Type to search, Enter to keep, Esc to cancel");
            }
            KeyCode::Char('s') => self.cycle_sort(),
            KeyCode::Char('m') if self.screen == Screen::Catalog => self.cycle_membership(),
            KeyCode::Char('f') if self.screen == Screen::MyList => self.cycle_rating_filter(),
            KeyCode::Char('a') | KeyCode::Enter => self.open_prompt(),
            KeyCode::Char('d') if self.screen == Screen::MyList => self.remove_selected(),
            _ => {}
        }
    }

    fn move_cursor(&mut self, delta: isize) {
        let (cursor, len) = match self.screen {
            Screen::Catalog => (&mut self.catalog.cursor, self.catalog.page.items.len()),
            Screen::MyList => (&mut self.list.cursor, self.list.page.items.len()),
        };
        let next = (*cursor as isize + delta).max(0) as usize;
        *cursor = clamp_cursor(next, len);
    }

    fn change_page(&mut self, forward: bool) {
        let (has_next, has_previous) = match self.screen {
            Screen::Catalog => (self.catalog.page.has_next, self.catalog.page.has_previous),
            Screen::MyList => (self.list.page.has_next, self.list.page.has_previous),
        };
        if (forward && !has_next) || (!forward && !has_previous) {
            return;
        }
        let step = |page: PageRequest| if forward { page.next() } else { page.previous() };
        match self.screen {
            Screen::Catalog => {
                self.catalog.query.page = step(self.catalog.query.page);
                self.catalog.cursor = 0;
            }
            Screen::MyList => {
                self.list.query.page = step(self.list.query.page);
                self.list.cursor = 0;
            }
        }
        self.refresh();
    }

    fn cycle_sort(&mut self) {
        let sort = match self.screen {
            Screen::Catalog => &mut self.catalog.query.sort,
            Screen::MyList => &mut self.list.query.sort,
        };
        *sort = next_sort(*sort);
        let label = sort.map_or("none", SortKey::as_str);
        self.reset_page();
        self.refresh();
        self.set_status(format!("Sort: {label}"));
    }

    fn cycle_membership(&mut self) {
        let next = match self.catalog.query.membership {
            None => Some(Membership::In),
            Some(Membership::In) => Some(Membership::NotIn),
            Some(Membership::NotIn) => None,
        };
        self.catalog.query.membership = next;
        self.reset_page();
        self.refresh();
        self.set_status(format!("Showing: {}", membership_label(next)));
    }

    fn cycle_rating_filter(&mut self) {
        let next = match self.list.query.rating.rating() {
            None => RatingFilter::from_raw(Some(i64::from(Rating::MIN))),
            Some(rating) => RatingFilter::from_raw(Some(i64::from(rating.value()) + 1)),
        };
        self.list.query.rating = next;
        self.reset_page();
        self.refresh();
        self.set_status(format!("Rating filter: {}", rating_filter_label(next)));
    }

    fn selected_game(&self) -> Option<&CatalogEntry> {
        self.catalog.page.items.get(self.catalog.cursor)
    }

    fn selected_entry(&self) -> Option<&ListEntryView> {
        self.list.page.items.get(self.list.cursor)
    }

    fn open_prompt(&mut self) {
        let prompt = match self.screen {
            Screen::Catalog => self.selected_game().map(EntryPrompt::add),
            Screen::MyList => self.selected_entry().map(EntryPrompt::edit),
        };
        match prompt {
            Some(prompt) => self.prompt = Some(prompt),
            None => self.set_status("Nothing selected"),
        }
    }

    fn remove_selected(&mut self) {
        let Some((id, title)) = self
            .selected_entry()
            .map(|entry| (entry.id, entry.title.clone()))
        else {
            self.set_status("Nothing selected");
            return;
        };
        match self.library.remove_entry(&self.user, id) {
            Ok(()) => {
                self.refresh();
                self.set_status(format!("Removed {title}"));
            }
            Err(err) => self.report(&err),
        }
    }

    fn handle_prompt_key(&mut self, key: KeyEvent) {
        let Some(prompt) = self.prompt.as_mut() else {
            return;
        };
        let action = match (prompt.field, key.code) {
            (_, KeyCode::Esc) => PromptAction::Cancel,
            (_, KeyCode::Enter) => PromptAction::Submit,
            (_, KeyCode::Tab) | (_, KeyCode::BackTab) => {
                prompt.switch_field();
                PromptAction::Keep
            }
            (PromptField::Rating, KeyCode::Left | KeyCode::Down) => {
                prompt.step_rating(-1);
                PromptAction::Keep
            }
            (PromptField::Rating, KeyCode::Right | KeyCode::Up) => {
                prompt.step_rating(1);
                PromptAction::Keep
            }
            (PromptField::Rating, KeyCode::Char(ch)) => {
                if let Some(digit) = ch.to_digit(10) {
                    if (u32::from(Rating::MIN)..=u32::from(Rating::MAX)).contains(&digit) {
                        prompt.rating = digit as u8;
                    }
                }
                PromptAction::Keep
            }
            (PromptField::Note, KeyCode::Backspace) => {
                prompt.note.pop();
                PromptAction::Keep
            }
            (PromptField::Note, KeyCode::Char(ch))
                if key.modifiers.is_empty() || key.modifiers == KeyModifiers::SHIFT =>
            {
                prompt.note.push(ch);
                PromptAction::Keep
            }
            _ => PromptAction::Keep,
        };

        match action {
            PromptAction::Keep => {}
            PromptAction::Cancel => {
                self.prompt = None;
                self.set_status("Cancelled");
            }
            PromptAction::Submit => self.submit_prompt(),
        }
    }

    fn submit_prompt(&mut self) {
        let Some(prompt) = self.prompt.clone() else {
            return;
        };
        let rating = i64::from(prompt.rating);
        let outcome = match prompt.target {
            PromptTarget::Add(catalog_id) => self
                .library
                .add_entry(
                    &self.user,
                    EntryRequest {
                        catalog_id,
                        rating,
                        note: prompt.note(),
                    },
                )
                .map(|_| format!("Added {} to your list", prompt.title)),
            PromptTarget::Edit(id) => self
                .library
                .update_entry(
                    &self.user,
                    id,
                    EntryUpdate {
                        rating,
                        note: prompt.note(),
                    },
                )
                .map(|_| format!("Updated {}", prompt.title)),
        };

        match outcome {
            Ok(message) => {
                self.prompt = None;
                self.refresh();
                self.set_status(message);
            }
            // Validation failures keep the prompt open for correction.
            Err(err @ LibraryError::Validation(_)) => self.report(&err),
            Err(err) => {
                self.prompt = None;
                self.refresh();
                self.report(&err);
            }
        }
    }

    fn draw(&self, frame: &mut Frame) {
        let size = frame.size();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(8),
                Constraint::Length(4),
            ])
            .split(size);

        self.render_tabs(frame, chunks[0]);
        let body = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
            .split(chunks[1]);
        match self.screen {
            Screen::Catalog => {
                self.render_catalog(frame, body[0]);
                self.render_game_details(frame, body[1]);
            }
            Screen::MyList => {
                self.render_list(frame, body[0]);
                self.render_entry_details(frame, body[1]);
            }
        }
        self.render_status(frame, chunks[2]);
        if let Some(prompt) = &self.prompt {
            self.render_prompt(frame, prompt);
        }
    }

    fn render_tabs(&self, frame: &mut Frame, area: Rect) {
        let tabs = Tabs::new(vec!["Catalog", "My List"])
            .select(self.screen.index())
            .block(Block::default().borders(Borders::ALL).title(format!("gametrack · {}", self.user)))
            .highlight_style(
                Style::default()
                    .fg(self.theme.accent)
                    .add_modifier(Modifier::BOLD),
            );
        frame.render_widget(tabs, area);
    }

    fn list_title(&self) -> String {
        match self.screen {
            Screen::Catalog => {
                let query = &self.catalog.query;
                format!(
                    "Games · page {} · sort {} · {}{}",
                    query.page.index + 1,
                    query.sort.map_or("none", SortKey::as_str),
                    membership_label(query.membership),
                    search_label(query.search.as_deref()),
                )
            }
            Screen::MyList => {
                let query = &self.list.query;
                format!(
                    "My List · page {} · sort {} · rating {}{}",
                    query.page.index + 1,
                    query.sort.map_or("none", SortKey::as_str),
                    rating_filter_label(query.rating),
                    search_label(query.search.as_deref()),
                )
            }
        }
    }

    fn render_rows(&self, frame: &mut Frame, area: Rect, rows: Vec<Line<'static>>, cursor: usize) {
        let mut list_state = ListState::default();
        if !rows.is_empty() {
            list_state.select(Some(cursor.min(rows.len() - 1)));
        }
        let items: Vec<ListItem> = rows
            .into_iter()
            .enumerate()
            .map(|(idx, line)| {
                let marker = if idx == cursor {
                    Span::styled(
                        "▶ ",
                        Style::default()
                            .fg(self.theme.accent)
                            .add_modifier(Modifier::BOLD),
                    )
                } else {
                    Span::raw("  ")
                };
                let mut spans = vec![marker];
                spans.extend(line.spans);
                ListItem::new(Line::from(spans))
            })
            .collect();
        let list = List::new(items)
            .block(Block::default().borders(Borders::ALL).title(self.list_title()))
            .highlight_style(Style::default().bg(self.theme.selection_bg));
        frame.render_stateful_widget(list, area, &mut list_state);
    }

    fn render_catalog(&self, frame: &mut Frame, area: Rect) {
        let rows = self
            .catalog
            .page
            .items
            .iter()
            .map(|game| {
                let on_list = self.catalog.on_list.contains(&game.id);
                let mut spans = vec![Span::styled(
                    game.title.clone(),
                    Style::default()
                        .fg(self.theme.primary_fg)
                        .add_modifier(Modifier::BOLD),
                )];
                spans.push(Span::styled(
                    format!(" · {}", game.release_date.format("%Y")),
                    Style::default().fg(self.theme.muted),
                ));
                if on_list {
                    spans.push(Span::styled(" ✓", Style::default().fg(self.theme.success)));
                }
                Line::from(spans)
            })
            .collect();
        self.render_rows(frame, area, rows, self.catalog.cursor);
    }

    fn render_list(&self, frame: &mut Frame, area: Rect) {
        let rows = self
            .list
            .page
            .items
            .iter()
            .map(|view| {
                Line::from(vec![
                    Span::styled(
                        stars(view.rating),
                        Style::default().fg(self.theme.accent),
                    ),
                    Span::raw(" "),
                    Span::styled(
                        view.title.clone(),
                        Style::default()
                            .fg(self.theme.primary_fg)
                            .add_modifier(Modifier::BOLD),
                    ),
                ])
            })
            .collect();
        self.render_rows(frame, area, rows, self.list.cursor);
    }

    fn detail_lines(&self, game: &impl GameView) -> Vec<Line<'static>> {
        vec![
            Line::from(Span::styled(
                game.title().to_string(),
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::from(format!("Developer: {}", game.developer())),
            Line::from(format!("Publisher: {}", game.publisher())),
            Line::from(format!("Released: {}", game.release_date().format("%Y-%m-%d"))),
        ]
    }

    fn render_game_details(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default().borders(Borders::ALL).title("Game Details");
        let Some(game) = self.selected_game() else {
            frame.render_widget(Paragraph::new("No games to show").block(block), area);
            return;
        };
        let mut lines = self.detail_lines(game);
        if let Some(url) = &game.cover_url {
            lines.push(Line::from(Span::styled(
                format!("Cover: {url}"),
                Style::default().fg(self.theme.muted),
            )));
        }
        lines.push(Line::from(""));
        if self.catalog.on_list.contains(&game.id) {
            lines.push(Line::from(Span::styled(
                "On your list",
                Style::default().fg(self.theme.success),
            )));
        } else {
            lines.push(Line::from("Press a to add to your list"));
        }
        let paragraph = Paragraph::new(lines).block(block).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);
    }

    fn render_entry_details(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default().borders(Borders::ALL).title("Entry");
        let Some(view) = self.selected_entry() else {
            frame.render_widget(Paragraph::new("Your list is empty").block(block), area);
            return;
        };
        let mut lines = self.detail_lines(view);
        lines.push(Line::from(""));
        lines.push(Line::from(format!("Rating: {} ({}/5)", stars(view.rating), view.rating)));
        lines.push(Line::from(format!(
            "Note: {}",
            view.note.as_deref().unwrap_or("-")
        )));
        lines.push(Line::from(""));
        lines.push(Line::from("Enter edit  d remove"));
        let paragraph = Paragraph::new(lines).block(block).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);
    }

    fn render_status(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default().borders(Borders::ALL).title("Status");
        let primary = if self.mode == Mode::Search {
            let term = match self.screen {
                Screen::Catalog => self.catalog.query.search.as_deref(),
                Screen::MyList => self.list.query.search.as_deref(),
            };
            Line::from(format!("Search: {}", term.unwrap_or_default()))
        } else if self.status_is_error {
            Line::from(Span::styled(
                self.status.clone(),
                Style::default().fg(self.theme.danger),
            ))
        } else {
            Line::from(self.status.clone())
        };
        let average = self
            .profile
            .average_rating
            .map_or_else(|| "-".to_string(), |avg| format!("{avg:.1}"));
        let secondary = Line::from(Span::styled(
            format!(
                "Completed: {}  Avg rating: {}  │  Tab screens  / search  s sort  m/f filter  n/p page  q quit",
                self.profile.completed, average
            ),
            Style::default().fg(self.theme.muted),
        ));
        let paragraph = Paragraph::new(vec![primary, secondary])
            .block(block)
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);
    }

    fn render_prompt(&self, frame: &mut Frame, prompt: &EntryPrompt) {
        let frame_area = frame.size();
        let mut width = cmp::min(64_u16, frame_area.width.saturating_sub(4));
        width = cmp::max(width, 28_u16);
        let height = 8_u16.min(frame_area.height.saturating_sub(2)).max(6_u16);
        let x = frame_area.x + (frame_area.width.saturating_sub(width)) / 2;
        let y = frame_area.y + (frame_area.height.saturating_sub(height)) / 2;
        let area = Rect::new(x, y, width, height);

        frame.render_widget(Clear, area);

        let title = match prompt.target {
            PromptTarget::Add(_) => format!("Add - {}", prompt.title),
            PromptTarget::Edit(_) => format!("Edit - {}", prompt.title),
        };
        let focus = |field: PromptField| {
            if prompt.field == field {
                Style::default()
                    .fg(self.theme.accent)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(self.theme.muted)
            }
        };
        let rating_line = Line::from(vec![
            Span::styled("Rating: ", focus(PromptField::Rating)),
            Span::raw(format!("{} ({})", "★".repeat(prompt.rating as usize), prompt.rating)),
        ]);
        let note_line = Line::from(vec![
            Span::styled("Note:   ", focus(PromptField::Note)),
            Span::raw(prompt.note.clone()),
        ]);
        let helper = Line::from(vec![
            Span::styled("Enter", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(" save  "),
            Span::styled("Tab", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(" field  "),
            Span::styled("1-5/←→", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(" rating  "),
            Span::styled("Esc", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(" cancel"),
        ]);

        let paragraph = Paragraph::new(vec![
            rating_line,
            note_line,
            Line::from(""),
            helper,
        ])
        .block(Block::default().borders(Borders::ALL).title(title))
        .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);

        if prompt.field == PromptField::Note {
            let offset = 8 + prompt.note.chars().count() as u16;
            let cursor_x = (area.x + 1 + offset).min(area.x + area.width.saturating_sub(2));
            frame.set_cursor(cursor_x, area.y + 2);
        }
    }
}

fn clamp_cursor(cursor: usize, len: usize) -> usize {
    cursor.min(len.saturating_sub(1))
}

fn next_sort(current: Option<SortKey>) -> Option<SortKey> {
    match current {
        None => SortKey::ALL.first().copied(),
        Some(key) => SortKey::ALL
            .iter()
            .position(|candidate| *candidate == key)
            .and_then(|idx| SortKey::ALL.get(idx + 1).copied()),
    }
}

fn membership_label(membership: Option<Membership>) -> &'static str {
    match membership {
        None => "all games",
        Some(Membership::In) => "on my list",
        Some(Membership::NotIn) => "not on my list",
    }
}

fn rating_filter_label(filter: RatingFilter) -> String {
    filter
        .rating()
        .map_or_else(|| "any".to_string(), |rating| rating.to_string())
}

fn search_label(term: Option<&str>) -> String {
    match term {
        Some(term) if !term.is_empty() => format!(" · \"{term}\""),
        _ => String::new(),
    }
}

fn stars(rating: Rating) -> String {
    let filled = rating.value() as usize;
    let empty = Rating::MAX as usize - filled;
    format!("{}{}", "★".repeat(filled), "☆".repeat(empty))
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    disable_raw_mode().context("failed to disable raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("failed to leave alternate screen")?;
    terminal.show_cursor()?;
    Ok(())
}

fn spawn_input_thread(sender: mpsc::Sender<AppEvent>) {
    thread::spawn(move || loop {
        match event::poll(TICK_RATE) {
            Ok(true) => match event::read() {
                Ok(evt) => {
                    if sender.blocking_send(AppEvent::Input(evt)).is_err() {
                        break;
                    }
                }
                Err(_) => break,
            },
            Ok(false) => {
                if sender.blocking_send(AppEvent::Tick).is_err() {
                    break;
                }
            }
            Err(_) => break,
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use chrono::NaiveDate;
    use gametrack_core::{models::NewCatalogEntry, store::CatalogRepository};

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn app_with(titles: &[&str]) -> Result<GametrackApp> {
        let store = LocalStore::in_memory();
        for (idx, title) in titles.iter().enumerate() {
            let date = NaiveDate::from_ymd_opt(2000 + idx as i32, 1, 1).unwrap();
            store.insert_game(NewCatalogEntry::new(*title, date))?;
        }
        let browse = BrowseConfig {
            catalog_page_size: 2,
            list_page_size: 2,
        };
        Ok(GametrackApp::new(store, "ana", &browse))
    }

    #[test]
    fn sort_cycle_wraps_to_none() {
        let mut sort = None;
        let mut seen = Vec::new();
        for _ in 0..4 {
            sort = next_sort(sort);
            seen.push(sort);
        }
        assert_eq!(
            seen,
            [
                Some(SortKey::Title),
                Some(SortKey::ReleaseDate),
                Some(SortKey::Rating),
                None
            ]
        );
    }

    #[test]
    fn prompt_rating_stays_in_range() -> Result<()> {
        let app = app_with(&["Hades"])?;
        let game = app.selected_game().cloned().unwrap();
        let mut prompt = EntryPrompt::add(&game);
        prompt.step_rating(3);
        assert_eq!(prompt.rating, Rating::MAX);
        for _ in 0..10 {
            prompt.step_rating(-1);
        }
        assert_eq!(prompt.rating, Rating::MIN);
        assert_eq!(prompt.note(), None);
        prompt.note = "   ".to_string();
        assert_eq!(prompt.note().as_deref(), Some("   "));
        Ok(())
    }

    #[test]
    fn add_edit_and_remove_through_keys() -> Result<()> {
        let mut app = app_with(&["Hades", "Celeste", "Inside"])?;
        assert!(app.catalog.page.has_next);

        app.handle_key(press(KeyCode::Char('a')));
        app.handle_key(press(KeyCode::Char('3')));
        app.handle_key(press(KeyCode::Tab));
        for ch in "great".chars() {
            app.handle_key(press(KeyCode::Char(ch)));
        }
        app.handle_key(press(KeyCode::Enter));
        assert!(app.prompt.is_none());
        assert_eq!(app.profile.completed, 1);
        assert_eq!(app.profile.average_rating, Some(3.0));

        // A second add of the same game surfaces the conflict message.
        app.handle_key(press(KeyCode::Enter));
        app.handle_key(press(KeyCode::Enter));
        assert!(app.status_is_error);
        assert_eq!(app.status, "Game is already in your list.");

        app.handle_key(press(KeyCode::Tab));
        assert_eq!(app.screen, Screen::MyList);
        assert_eq!(app.list.page.items.len(), 1);
        assert_eq!(app.list.page.items[0].note.as_deref(), Some("great"));

        app.handle_key(press(KeyCode::Enter));
        app.handle_key(press(KeyCode::Right));
        app.handle_key(press(KeyCode::Enter));
        assert_eq!(app.list.page.items[0].rating.value(), 4);

        app.handle_key(press(KeyCode::Char('d')));
        assert!(app.list.page.items.is_empty());
        assert_eq!(app.profile.completed, 0);
        Ok(())
    }

    #[test]
    fn search_and_paging_update_the_catalog_pane() -> Result<()> {
        let mut app = app_with(&["Hades", "Celeste", "Inside"])?;

        app.handle_key(press(KeyCode::Char('n')));
        assert_eq!(app.catalog.query.page.index, 1);
        assert_eq!(app.catalog.page.items.len(), 1);
        app.handle_key(press(KeyCode::Char('n')));
        assert_eq!(app.catalog.query.page.index, 1);

        app.handle_key(press(KeyCode::Char('/')));
        for ch in "in".chars() {
            app.handle_key(press(KeyCode::Char(ch)));
        }
        assert_eq!(app.catalog.query.page.index, 0);
        let titles: Vec<_> = app.catalog.page.items.iter().map(|g| g.title.clone()).collect();
        assert_eq!(titles, ["Inside"]);

        app.handle_key(press(KeyCode::Esc));
        assert_eq!(app.mode, Mode::Browse);
        assert_eq!(app.catalog.query.search, None);
        assert_eq!(app.catalog.page.items.len(), 2);

        app.handle_key(press(KeyCode::Char('m')));
        assert_eq!(app.catalog.query.membership, Some(Membership::In));
        assert!(app.catalog.page.items.is_empty());
        Ok(())
    }

    #[test]
    fn overlong_note_with_trailing_spaces_is_rejected() -> Result<()> {
        let mut app = app_with(&["Hades"])?;
        app.handle_key(press(KeyCode::Char('a')));
        app.handle_key(press(KeyCode::Tab));
        for ch in format!("{}{}", "x".repeat(255), " ".repeat(5)).chars() {
            app.handle_key(press(KeyCode::Char(ch)));
        }
        app.handle_key(press(KeyCode::Enter));

        assert!(app.prompt.is_some());
        assert!(app.status_is_error);
        assert_eq!(app.profile.completed, 0);
        assert!(app.list.page.items.is_empty());
        Ok(())
    }
}
