use std::{
    io::{self, Write},
    thread,
    time::Duration,
};

use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Gauge, List, ListItem, ListState, Paragraph, Wrap},
    Frame, Terminal,
};
use showdown_core::{
    catalog::{CustomLegendStore, CustomLegendWatcher, LegendFileEvent},
    clock::{IntervalScheduler, SchedulerTick, TickScheduler},
    AppConfig, CategorySequencer, ClockEvent, GameEngine, LegendCatalog, Outcome, SessionConfig,
    SettingsStore, Standing, Team, TurnResolution,
};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::countdown_font;

const INPUT_POLL: Duration = Duration::from_millis(250);
const MAX_INPUT_LEN: usize = 32;
const MIN_TEAMS: usize = 2;
const MAX_TEAMS: usize = 8;

const RULES: &[&str] = &[
    "Split into at least two teams and pick how many rounds to play.",
    "On your turn choose a category. A legend from it appears on the card.",
    "Act out, describe or hint at the legend without saying its name.",
    "When the clock runs out, mark whether your team guessed it.",
    "Every correct guess is worth one point.",
    "After the last round the team with the most points wins.",
    "Need a break? Press p to call a time-out.",
];

#[derive(Debug, Clone)]
struct Theme {
    primary_fg: Color,
    accent: Color,
    muted: Color,
    selection_bg: Color,
    card_bg: Color,
    success: Color,
    warning: Color,
    danger: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            primary_fg: Color::White,
            accent: Color::Cyan,
            muted: Color::DarkGray,
            selection_bg: Color::DarkGray,
            card_bg: Color::Rgb(0, 72, 212),
            success: Color::Green,
            warning: Color::Yellow,
            danger: Color::Red,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Screen {
    Menu,
    Setup,
    Category,
    Play,
    Stats,
    Legends,
    Settings,
    Rules,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MenuItem {
    NewGame,
    CustomLegends,
    Settings,
    Rules,
    Quit,
}

impl MenuItem {
    const ALL: [MenuItem; 5] = [
        MenuItem::NewGame,
        MenuItem::CustomLegends,
        MenuItem::Settings,
        MenuItem::Rules,
        MenuItem::Quit,
    ];

    fn label(self) -> &'static str {
        match self {
            MenuItem::NewGame => "New Game",
            MenuItem::CustomLegends => "Custom Legends",
            MenuItem::Settings => "Settings",
            MenuItem::Rules => "Rules",
            MenuItem::Quit => "Quit",
        }
    }
}

#[derive(Debug, Clone, Default)]
struct TextField {
    value: String,
}

impl TextField {
    fn push(&mut self, ch: char) {
        if !ch.is_control() && self.value.chars().count() < MAX_INPUT_LEN {
            self.value.push(ch);
        }
    }

    fn pop(&mut self) {
        self.value.pop();
    }

    fn is_blank(&self) -> bool {
        self.value.trim().is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SetupFocus {
    Team(usize),
    AddTeam,
    Rounds,
    Time,
    Start,
}

/// Form state of the setup screen.
#[derive(Debug, Clone)]
struct SetupState {
    teams: Vec<TextField>,
    rounds: usize,
    time: usize,
    focus: usize,
}

impl SetupState {
    fn new() -> Self {
        Self {
            teams: vec![TextField::default(); MIN_TEAMS],
            rounds: 0,
            time: 0,
            focus: 0,
        }
    }

    fn field_count(&self) -> usize {
        self.teams.len() + 4
    }

    fn focused(&self) -> SetupFocus {
        let teams = self.teams.len();
        match self.focus {
            idx if idx < teams => SetupFocus::Team(idx),
            idx if idx == teams => SetupFocus::AddTeam,
            idx if idx == teams + 1 => SetupFocus::Rounds,
            idx if idx == teams + 2 => SetupFocus::Time,
            _ => SetupFocus::Start,
        }
    }

    fn focus_next(&mut self) {
        self.focus = (self.focus + 1) % self.field_count();
    }

    fn focus_prev(&mut self) {
        let count = self.field_count();
        self.focus = (self.focus + count - 1) % count;
    }

    fn add_team(&mut self) -> bool {
        if self.teams.len() >= MAX_TEAMS {
            return false;
        }
        self.teams.push(TextField::default());
        self.focus = self.teams.len() - 1;
        true
    }

    fn remove_team(&mut self, index: usize) -> bool {
        if self.teams.len() <= MIN_TEAMS || index >= self.teams.len() {
            return false;
        }
        self.teams.remove(index);
        self.focus = index.min(self.teams.len() - 1);
        true
    }

    fn is_ready(&self) -> bool {
        self.teams.iter().all(|team| !team.is_blank())
    }

    fn session_config(&self, config: &AppConfig) -> SessionConfig {
        SessionConfig::new(
            self.teams.iter().map(|team| team.value.clone()),
            option_at(&config.round_options, self.rounds),
            option_at(&config.time_options, self.time),
        )
    }
}

#[derive(Debug, Clone, Default)]
struct LegendForm {
    name: TextField,
    category: TextField,
    editing_category: bool,
}

impl LegendForm {
    fn active_field(&mut self) -> &mut TextField {
        if self.editing_category {
            &mut self.category
        } else {
            &mut self.name
        }
    }
}

/// Terminal bell played when a turn clock runs out.
#[derive(Debug, Clone, Copy)]
struct ExpiryCue {
    enabled: bool,
}

impl ExpiryCue {
    fn play(&self) {
        if !self.enabled {
            return;
        }
        let mut stdout = io::stdout();
        if let Err(err) = stdout.write_all(b"\x07").and_then(|_| stdout.flush()) {
            warn!(?err, "Failed to play expiry cue");
        }
    }
}

#[derive(Debug)]
enum AppEvent {
    Input(Event),
    Tick,
}

/// Terminal frontend for Legends Showdown.
pub struct ShowdownApp {
    config: AppConfig,
    engine: GameEngine,
    catalog: LegendCatalog,
    sequencer: CategorySequencer,
    custom_legends: CustomLegendStore,
    settings: SettingsStore,
    scheduler: IntervalScheduler,
    cue: ExpiryCue,
    screen: Screen,
    menu_cursor: usize,
    setup: SetupState,
    categories: Vec<String>,
    category_cursor: usize,
    legend_cursor: usize,
    legend_form: Option<LegendForm>,
    paused: bool,
    last_config: Option<SessionConfig>,
    clock_tx: Option<mpsc::Sender<SchedulerTick>>,
    legend_rx: Option<mpsc::Receiver<LegendFileEvent>>,
    legend_watcher: Option<CustomLegendWatcher>,
    status: String,
    should_quit: bool,
    theme: Theme,
}

impl ShowdownApp {
    pub fn new(
        config: AppConfig,
        catalog: LegendCatalog,
        custom_legends: CustomLegendStore,
        settings: SettingsStore,
    ) -> Self {
        let scheduler = IntervalScheduler::new(config.tick_period());
        let sequencer = CategorySequencer::new(config.category_repeat);
        let cue = ExpiryCue {
            enabled: settings.settings().music_enabled,
        };
        Self {
            config,
            engine: GameEngine::new(),
            catalog,
            sequencer,
            custom_legends,
            settings,
            scheduler,
            cue,
            screen: Screen::Menu,
            menu_cursor: 0,
            setup: SetupState::new(),
            categories: Vec::new(),
            category_cursor: 0,
            legend_cursor: 0,
            legend_form: None,
            paused: false,
            last_config: None,
            clock_tx: None,
            legend_rx: None,
            legend_watcher: None,
            status: String::new(),
            should_quit: false,
            theme: Theme::default(),
        }
    }

    pub fn attach_legend_watch(
        &mut self,
        watcher: CustomLegendWatcher,
        receiver: mpsc::Receiver<LegendFileEvent>,
    ) {
        debug!(path = %watcher.path().display(), "Watching custom legends");
        self.legend_watcher = Some(watcher);
        self.legend_rx = Some(receiver);
    }

    pub async fn run(&mut self) -> Result<()> {
        self.status = format!(
            "{} legends in {} categories",
            self.catalog.legends().len(),
            self.catalog.categories().len()
        );

        let mut stdout = io::stdout();
        enable_raw_mode().context("failed to enter raw mode")?;
        execute!(stdout, EnterAlternateScreen).context("failed to enter alternate screen")?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend).context("failed to create terminal")?;
        terminal.hide_cursor()?;
        terminal.clear()?;

        let (event_tx, mut event_rx) = mpsc::channel::<AppEvent>(128);
        spawn_input_thread(event_tx);
        let (clock_tx, mut clock_rx) = mpsc::channel::<SchedulerTick>(16);
        self.clock_tx = Some(clock_tx);

        let mut legend_rx = self.legend_rx.take();

        loop {
            terminal.draw(|frame| self.draw(frame))?;
            if self.should_quit {
                break;
            }

            if let Some(rx) = legend_rx.as_mut() {
                let mut legends_closed = false;
                tokio::select! {
                    maybe_event = event_rx.recv() => {
                        if !self.process_app_event(maybe_event) {
                            break;
                        }
                    }
                    Some(tick) = clock_rx.recv() => self.handle_clock_tick(tick),
                    maybe_change = rx.recv() => {
                        match maybe_change {
                            Some(event) => self.handle_legend_file_event(event),
                            None => legends_closed = true,
                        }
                    }
                }
                if legends_closed {
                    legend_rx = None;
                    self.legend_watcher = None;
                }
            } else {
                tokio::select! {
                    maybe_event = event_rx.recv() => {
                        if !self.process_app_event(maybe_event) {
                            break;
                        }
                    }
                    Some(tick) = clock_rx.recv() => self.handle_clock_tick(tick),
                }
            }
        }

        self.scheduler.disarm();
        self.engine.abandon();
        restore_terminal(&mut terminal)?;
        self.clock_tx = None;
        Ok(())
    }

    fn process_app_event(&mut self, maybe_event: Option<AppEvent>) -> bool {
        match maybe_event {
            Some(AppEvent::Input(event)) => {
                if let Err(err) = self.handle_input(event) {
                    error!(?err, "Input handling failed");
                    self.status = format!("Error: {err}");
                }
                true
            }
            Some(AppEvent::Tick) => true,
            None => false,
        }
    }

    fn handle_clock_tick(&mut self, tick: SchedulerTick) {
        if !self.scheduler.is_current(&tick) {
            debug!(
                generation = tick.generation,
                sequence = tick.sequence,
                "Ignoring stale clock tick"
            );
            return;
        }

        match self.engine.tick() {
            Ok(ClockEvent::Expired) => {
                self.scheduler.disarm();
                self.cue.play();
                self.status = "Time's up! Did your team guess it? (c) correct / (i) incorrect"
                    .to_string();
            }
            Ok(ClockEvent::Ticked { .. }) => {}
            Ok(ClockEvent::Idle) => self.scheduler.disarm(),
            Err(err) => {
                warn!(?err, "Clock ticked without an active game");
                self.scheduler.disarm();
            }
        }
    }

    fn handle_legend_file_event(&mut self, event: LegendFileEvent) {
        match event {
            LegendFileEvent::Changed(path) => match self.custom_legends.reload() {
                Ok(()) => {
                    info!(path = %path.display(), "Custom legends changed on disk");
                    self.refresh_catalog();
                }
                Err(err) => {
                    warn!(?err, path = %path.display(), "Failed to reload custom legends");
                    self.status = format!("Custom legends unreadable: {err}");
                }
            },
            LegendFileEvent::Error(err) => {
                warn!(%err, "Custom legend watcher error");
                self.status = format!("Watcher error: {err}");
            }
        }
    }

    fn refresh_catalog(&mut self) {
        self.catalog.refresh(self.custom_legends.legends());
        let count = self.custom_legends.entries().len();
        self.legend_cursor = self.legend_cursor.min(count.saturating_sub(1));
        if self.screen == Screen::Category {
            self.categories = self.sequencer.available(&self.catalog);
            self.category_cursor = self
                .category_cursor
                .min(self.categories.len().saturating_sub(1));
        }
    }

    fn handle_input(&mut self, event: Event) -> Result<()> {
        let Event::Key(key) = event else {
            return Ok(());
        };
        if key.kind != KeyEventKind::Press {
            return Ok(());
        }
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.quit();
            return Ok(());
        }

        match self.screen {
            Screen::Menu => self.handle_menu_key(key),
            Screen::Setup => self.handle_setup_key(key),
            Screen::Category => self.handle_category_key(key),
            Screen::Play => self.handle_play_key(key),
            Screen::Stats => self.handle_stats_key(key),
            Screen::Legends => self.handle_legends_key(key),
            Screen::Settings => self.handle_settings_key(key),
            Screen::Rules => {
                if matches!(key.code, KeyCode::Esc | KeyCode::Enter | KeyCode::Char('q')) {
                    self.screen = Screen::Menu;
                }
                Ok(())
            }
        }
    }

    fn quit(&mut self) {
        self.scheduler.disarm();
        self.engine.abandon();
        self.should_quit = true;
    }

    fn handle_menu_key(&mut self, key: KeyEvent) -> Result<()> {
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => {
                self.menu_cursor = self.menu_cursor.saturating_sub(1);
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.menu_cursor = (self.menu_cursor + 1).min(MenuItem::ALL.len() - 1);
            }
            KeyCode::Enter => {
                let item = MenuItem::ALL
                    .get(self.menu_cursor)
                    .copied()
                    .unwrap_or(MenuItem::NewGame);
                self.open_menu_item(item);
            }
            KeyCode::Char('q') | KeyCode::Esc => self.quit(),
            _ => {}
        }
        Ok(())
    }

    fn open_menu_item(&mut self, item: MenuItem) {
        match item {
            MenuItem::NewGame => {
                self.setup = SetupState::new();
                self.screen = Screen::Setup;
                self.status = "Name your teams".to_string();
            }
            MenuItem::CustomLegends => {
                self.legend_form = None;
                self.screen = Screen::Legends;
            }
            MenuItem::Settings => self.screen = Screen::Settings,
            MenuItem::Rules => self.screen = Screen::Rules,
            MenuItem::Quit => self.quit(),
        }
    }

    fn handle_setup_key(&mut self, key: KeyEvent) -> Result<()> {
        let focus = self.setup.focused();
        match (focus, key.code) {
            (_, KeyCode::Esc) => {
                self.screen = Screen::Menu;
                return Ok(());
            }
            (_, KeyCode::Up | KeyCode::BackTab) => self.setup.focus_prev(),
            (_, KeyCode::Down | KeyCode::Tab) => self.setup.focus_next(),
            (SetupFocus::Team(_), KeyCode::Enter) => self.setup.focus_next(),
            (SetupFocus::Team(index), KeyCode::Delete) => {
                if !self.setup.remove_team(index) {
                    self.status = format!("At least {MIN_TEAMS} teams are required");
                }
            }
            (SetupFocus::Team(index), KeyCode::Backspace) => {
                if let Some(field) = self.setup.teams.get_mut(index) {
                    field.pop();
                }
            }
            (SetupFocus::Team(index), KeyCode::Char(ch)) => {
                if let Some(field) = self.setup.teams.get_mut(index) {
                    field.push(ch);
                }
            }
            (SetupFocus::AddTeam, KeyCode::Enter | KeyCode::Char(' ')) => {
                if !self.setup.add_team() {
                    self.status = format!("At most {MAX_TEAMS} teams can play");
                }
            }
            (SetupFocus::Rounds, KeyCode::Left) => {
                cycle(&mut self.setup.rounds, self.config.round_options.len(), false)
            }
            (SetupFocus::Rounds, KeyCode::Right | KeyCode::Enter | KeyCode::Char(' ')) => {
                cycle(&mut self.setup.rounds, self.config.round_options.len(), true)
            }
            (SetupFocus::Time, KeyCode::Left) => {
                cycle(&mut self.setup.time, self.config.time_options.len(), false)
            }
            (SetupFocus::Time, KeyCode::Right | KeyCode::Enter | KeyCode::Char(' ')) => {
                cycle(&mut self.setup.time, self.config.time_options.len(), true)
            }
            (SetupFocus::Start, KeyCode::Enter) => self.start_from_setup(),
            _ => {}
        }
        Ok(())
    }

    fn start_from_setup(&mut self) {
        if !self.setup.is_ready() {
            self.status = "Every team needs a name".to_string();
            return;
        }
        let config = self.setup.session_config(&self.config);
        self.launch(config);
    }

    fn launch(&mut self, config: SessionConfig) {
        self.scheduler.disarm();
        match self.engine.start_game(config.clone()) {
            Ok(id) => {
                self.sequencer.reset();
                self.last_config = Some(config);
                self.paused = false;
                self.enter_category_screen();
                debug!(session = %id, "Frontend switched to category pick");
            }
            Err(err) => {
                warn!(?err, "Rejected game configuration");
                self.status = format!("Cannot start: {err}");
            }
        }
    }

    fn enter_category_screen(&mut self) {
        self.categories = self.sequencer.available(&self.catalog);
        self.category_cursor = 0;
        self.screen = Screen::Category;
        self.status = match self.engine.current_team() {
            Ok(team) => format!("{team}, pick a category"),
            Err(err) => format!("Error: {err}"),
        };
    }

    fn leave_game(&mut self, message: &str) {
        self.scheduler.disarm();
        self.engine.abandon();
        self.paused = false;
        self.screen = Screen::Menu;
        self.status = message.to_string();
    }

    fn handle_category_key(&mut self, key: KeyEvent) -> Result<()> {
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => {
                self.category_cursor = self.category_cursor.saturating_sub(1);
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.category_cursor =
                    (self.category_cursor + 1).min(self.categories.len().saturating_sub(1));
            }
            KeyCode::Enter => self.begin_selected_turn(),
            KeyCode::Esc => self.leave_game("Game abandoned"),
            _ => {}
        }
        Ok(())
    }

    fn begin_selected_turn(&mut self) {
        let Some(category) = self.categories.get(self.category_cursor).cloned() else {
            self.status = "No categories available".to_string();
            return;
        };

        let mut rng = rand::rng();
        let sentinel = match self.engine.begin_turn(&category, &self.catalog, &mut rng) {
            Ok(turn) => turn.drawn().is_sentinel(),
            Err(err) => {
                error!(?err, %category, "Could not begin turn");
                self.status = format!("Cannot begin turn: {err}");
                return;
            }
        };

        self.sequencer.record(&category);
        self.paused = false;
        self.arm_clock();
        self.screen = Screen::Play;
        self.status = if sentinel {
            format!("{category} has no legends yet, improvise!")
        } else {
            "Go! Press p for a time-out".to_string()
        };
    }

    fn arm_clock(&mut self) {
        match self.clock_tx.clone() {
            Some(sender) => self.scheduler.arm(sender),
            None => warn!("Clock channel not attached; turn will not count down"),
        }
    }

    fn handle_play_key(&mut self, key: KeyEvent) -> Result<()> {
        if self.paused {
            match key.code {
                KeyCode::Char('m') | KeyCode::Char('M') => {
                    self.leave_game("Returned to main menu");
                }
                KeyCode::Char('c')
                | KeyCode::Char('C')
                | KeyCode::Char('p')
                | KeyCode::Char(' ')
                | KeyCode::Enter
                | KeyCode::Esc => self.continue_turn()?,
                _ => {}
            }
            return Ok(());
        }

        let expired = self
            .engine
            .turn()
            .map(|turn| turn.clock().is_expired())
            .unwrap_or(false);
        if expired {
            match key.code {
                KeyCode::Char('c') | KeyCode::Char('C') | KeyCode::Right => {
                    self.resolve(Outcome::Correct)
                }
                KeyCode::Char('i') | KeyCode::Char('I') | KeyCode::Left => {
                    self.resolve(Outcome::Incorrect)
                }
                _ => {}
            }
        } else if matches!(
            key.code,
            KeyCode::Char('p') | KeyCode::Char(' ') | KeyCode::Esc
        ) {
            self.call_time_out()?;
        }
        Ok(())
    }

    fn call_time_out(&mut self) -> Result<()> {
        if self.engine.pause_turn()? {
            self.scheduler.disarm();
            self.paused = true;
            self.status = "Time-out called".to_string();
        }
        Ok(())
    }

    fn continue_turn(&mut self) -> Result<()> {
        self.paused = false;
        if self.engine.resume_turn()? {
            self.arm_clock();
            self.status = "Back in play".to_string();
        }
        Ok(())
    }

    fn resolve(&mut self, outcome: Outcome) {
        match self.engine.resolve_turn(outcome) {
            Ok(TurnResolution::NextTurn { cursor }) => {
                debug!(round = cursor.round, team = cursor.team_index, "Next turn");
                self.enter_category_screen();
            }
            Ok(TurnResolution::GameComplete { .. }) => {
                self.scheduler.disarm();
                self.screen = Screen::Stats;
                self.status = "Game over!".to_string();
            }
            Ok(TurnResolution::Discarded) => self.enter_category_screen(),
            Err(err) => {
                error!(?err, ?outcome, "Failed to resolve turn");
                self.leave_game(&format!("Game ended unexpectedly: {err}"));
            }
        }
    }

    fn handle_stats_key(&mut self, key: KeyEvent) -> Result<()> {
        match key.code {
            KeyCode::Char('r') | KeyCode::Char('R') => match self.last_config.clone() {
                Some(config) => self.launch(config),
                None => self.leave_game("Nothing to replay"),
            },
            KeyCode::Enter | KeyCode::Esc | KeyCode::Char('q') => {
                self.leave_game("Thanks for playing!")
            }
            _ => {}
        }
        Ok(())
    }

    fn handle_legends_key(&mut self, key: KeyEvent) -> Result<()> {
        if self.legend_form.is_some() {
            return self.handle_legend_form_key(key);
        }

        let count = self.custom_legends.entries().len();
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => {
                self.legend_cursor = self.legend_cursor.saturating_sub(1);
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.legend_cursor = (self.legend_cursor + 1).min(count.saturating_sub(1));
            }
            KeyCode::Char('a') => {
                self.legend_form = Some(LegendForm::default());
                self.status = "Type a name, Tab to the category, Enter to save".to_string();
            }
            KeyCode::Char('d') | KeyCode::Delete if count > 0 => {
                let removed = self.custom_legends.remove(self.legend_cursor)?;
                self.refresh_catalog();
                self.status = format!("Removed {}", removed.name);
            }
            KeyCode::Esc | KeyCode::Char('q') => self.screen = Screen::Menu,
            _ => {}
        }
        Ok(())
    }

    fn handle_legend_form_key(&mut self, key: KeyEvent) -> Result<()> {
        let Some(form) = self.legend_form.as_mut() else {
            return Ok(());
        };
        match key.code {
            KeyCode::Esc => {
                self.legend_form = None;
                self.status = "Cancelled".to_string();
            }
            KeyCode::Tab | KeyCode::BackTab | KeyCode::Up | KeyCode::Down => {
                form.editing_category = !form.editing_category;
            }
            KeyCode::Backspace => form.active_field().pop(),
            KeyCode::Char(ch) => form.active_field().push(ch),
            KeyCode::Enter if !form.editing_category => form.editing_category = true,
            KeyCode::Enter => {
                let name = form.name.value.clone();
                let category = form.category.value.clone();
                match self.custom_legends.add(&name, &category) {
                    Ok(entry) => {
                        self.status = format!("Added {} to {}", entry.name, entry.category);
                        self.legend_form = None;
                        self.legend_cursor = self.custom_legends.entries().len().saturating_sub(1);
                        self.refresh_catalog();
                    }
                    Err(err) => self.status = format!("Cannot add legend: {err}"),
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn handle_settings_key(&mut self, key: KeyEvent) -> Result<()> {
        match key.code {
            KeyCode::Enter | KeyCode::Char(' ') | KeyCode::Char('m') => {
                let enabled = self.settings.toggle_music()?;
                self.cue.enabled = enabled;
                self.status = format!("Music {}", if enabled { "on" } else { "off" });
            }
            KeyCode::Esc | KeyCode::Char('q') => self.screen = Screen::Menu,
            _ => {}
        }
        Ok(())
    }

    fn draw(&self, frame: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(10),
                Constraint::Length(3),
            ])
            .split(frame.size());

        self.render_title(frame, chunks[0]);
        match self.screen {
            Screen::Menu => self.render_menu(frame, chunks[1]),
            Screen::Setup => self.render_setup(frame, chunks[1]),
            Screen::Category => self.render_categories(frame, chunks[1]),
            Screen::Play => self.render_play(frame, chunks[1]),
            Screen::Stats => self.render_stats(frame, chunks[1]),
            Screen::Legends => self.render_legends(frame, chunks[1]),
            Screen::Settings => self.render_settings(frame, chunks[1]),
            Screen::Rules => self.render_rules(frame, chunks[1]),
        }
        self.render_status(frame, chunks[2]);

        if self.screen == Screen::Play && self.paused {
            self.render_time_out(frame);
        }
        if self.screen == Screen::Legends {
            if let Some(form) = self.legend_form.as_ref() {
                self.render_legend_form(frame, form);
            }
        }
    }

    fn render_title(&self, frame: &mut Frame, area: Rect) {
        let subtitle = match self.screen {
            Screen::Menu => "Main Menu",
            Screen::Setup => "Set Up Your Game",
            Screen::Category => "Choose a Category",
            Screen::Play => "Showdown",
            Screen::Stats => "Final Scores",
            Screen::Legends => "Custom Legends",
            Screen::Settings => "Settings",
            Screen::Rules => "Rules",
        };
        let title = Paragraph::new(Line::from(vec![
            Span::styled(
                "LEGENDS SHOWDOWN",
                Style::default()
                    .fg(self.theme.accent)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(format!(" · {subtitle}"), Style::default().fg(self.theme.muted)),
        ]))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));
        frame.render_widget(title, area);
    }

    fn render_status(&self, frame: &mut Frame, area: Rect) {
        let hint = match self.screen {
            Screen::Menu => "↑↓ move · Enter select · q quit",
            Screen::Setup => "↑↓ field · type names · Del remove team · ←→ change · Esc back",
            Screen::Category => "↑↓ move · Enter play · Esc abandon",
            Screen::Play if self.paused => "m main menu · c continue",
            Screen::Play => "p time-out · c correct · i incorrect (after the buzzer)",
            Screen::Stats => "r play again · Enter main menu",
            Screen::Legends => "a add · d delete · Esc back",
            Screen::Settings => "Enter toggle · Esc back",
            Screen::Rules => "Esc back",
        };
        let paragraph = Paragraph::new(vec![Line::from(vec![
            Span::raw(self.status.clone()),
            Span::styled(format!("  [{hint}]"), Style::default().fg(self.theme.muted)),
        ])])
        .block(Block::default().borders(Borders::ALL));
        frame.render_widget(paragraph, area);
    }

    fn render_menu(&self, frame: &mut Frame, area: Rect) {
        let area = centered_rect(30, MenuItem::ALL.len() as u16 + 2, area);
        let items: Vec<ListItem> = MenuItem::ALL
            .iter()
            .map(|item| ListItem::new(Line::from(item.label())))
            .collect();
        let mut state = ListState::default();
        state.select(Some(self.menu_cursor));
        let list = List::new(items)
            .block(Block::default().borders(Borders::ALL))
            .highlight_style(
                Style::default()
                    .bg(self.theme.selection_bg)
                    .add_modifier(Modifier::BOLD),
            )
            .highlight_symbol("▶ ");
        frame.render_stateful_widget(list, area, &mut state);
    }

    fn render_setup(&self, frame: &mut Frame, area: Rect) {
        let focus = self.setup.focused();
        let selected = |target: SetupFocus| -> Style {
            if focus == target {
                Style::default()
                    .fg(self.theme.accent)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(self.theme.primary_fg)
            }
        };

        let mut lines = vec![Line::from(Span::styled(
            "TEAMS",
            Style::default().fg(self.theme.muted),
        ))];
        for (index, team) in self.setup.teams.iter().enumerate() {
            let placeholder = team.value.is_empty();
            let text = if placeholder {
                format!("Team {}", index + 1)
            } else {
                team.value.clone()
            };
            let mut style = selected(SetupFocus::Team(index));
            if placeholder {
                style = style.fg(self.theme.muted);
            }
            let cursor = if focus == SetupFocus::Team(index) { "_" } else { "" };
            lines.push(Line::from(vec![
                Span::styled(format!("{:>2}. ", index + 1), selected(SetupFocus::Team(index))),
                Span::styled(text, style),
                Span::styled(cursor, selected(SetupFocus::Team(index))),
            ]));
        }
        lines.push(Line::from(Span::styled(
            "  + Add team",
            selected(SetupFocus::AddTeam),
        )));
        lines.push(Line::from(""));
        lines.push(Line::from(vec![
            Span::styled("ROUNDS  ", Style::default().fg(self.theme.muted)),
            Span::styled(
                option_row(&self.config.round_options, self.setup.rounds, |v| v.to_string()),
                selected(SetupFocus::Rounds),
            ),
        ]));
        lines.push(Line::from(vec![
            Span::styled("TIME    ", Style::default().fg(self.theme.muted)),
            Span::styled(
                option_row(&self.config.time_options, self.setup.time, |v| {
                    format!("{}min", v / 60)
                }),
                selected(SetupFocus::Time),
            ),
        ]));
        lines.push(Line::from(""));
        let start_style = if self.setup.is_ready() {
            selected(SetupFocus::Start)
        } else {
            Style::default().fg(self.theme.muted)
        };
        lines.push(Line::from(Span::styled("[ NEXT ]", start_style)));

        let paragraph = Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL).title("Setup"))
            .wrap(Wrap { trim: false });
        frame.render_widget(paragraph, centered_rect(60, area.height, area));
    }

    fn render_categories(&self, frame: &mut Frame, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Min(3)])
            .split(area);
        frame.render_widget(self.turn_header(), chunks[0]);

        let items: Vec<ListItem> = self
            .categories
            .iter()
            .map(|category| {
                let count = self.catalog.legends_by_category(category).len();
                ListItem::new(Line::from(vec![
                    Span::styled(
                        category.clone(),
                        Style::default()
                            .fg(self.theme.primary_fg)
                            .add_modifier(Modifier::BOLD),
                    ),
                    Span::styled(
                        format!(" · {count} legends"),
                        Style::default().fg(self.theme.muted),
                    ),
                ]))
            })
            .collect();
        let mut state = ListState::default();
        if !self.categories.is_empty() {
            state.select(Some(self.category_cursor));
        }
        let list = List::new(items)
            .block(Block::default().borders(Borders::ALL).title("Categories"))
            .highlight_style(Style::default().bg(self.theme.selection_bg))
            .highlight_symbol("▶ ");
        frame.render_stateful_widget(list, chunks[1], &mut state);
    }

    fn turn_header(&self) -> Paragraph<'static> {
        let (team, round, rounds, score) = match self.engine.session() {
            Some(session) => {
                let cursor = session.cursor();
                (
                    session.current_team().to_string(),
                    cursor.round + 1,
                    session.config().num_rounds,
                    session.scores().get(cursor.team_index).unwrap_or(0),
                )
            }
            None => (String::from("-"), 0, 0, 0),
        };
        Paragraph::new(Line::from(vec![
            Span::styled(
                team,
                Style::default()
                    .fg(self.theme.accent)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::raw(format!("   Round {round}/{rounds}   Score {score}")),
        ]))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL))
    }

    fn render_play(&self, frame: &mut Frame, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(5),
                Constraint::Length(7),
                Constraint::Length(3),
            ])
            .split(area);
        frame.render_widget(self.turn_header(), chunks[0]);

        let Some(turn) = self.engine.turn() else {
            frame.render_widget(
                Paragraph::new("No turn in progress").alignment(Alignment::Center),
                chunks[1],
            );
            return;
        };

        let card = Paragraph::new(vec![
            Line::from(""),
            Line::from(Span::styled(
                turn.drawn().name().to_uppercase(),
                Style::default()
                    .fg(Color::White)
                    .add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
            Line::from(Span::styled(
                turn.category().to_string(),
                Style::default().fg(Color::White),
            )),
        ])
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .style(Style::default().bg(self.theme.card_bg))
        .block(Block::default().borders(Borders::ALL).title("Legend"));
        frame.render_widget(card, centered_rect(44, chunks[1].height, chunks[1]));

        let clock = turn.clock();
        if clock.is_expired() {
            let verdict = Paragraph::new(vec![
                Line::from(""),
                Line::from(Span::styled(
                    "TIME'S UP!",
                    Style::default()
                        .fg(self.theme.warning)
                        .add_modifier(Modifier::BOLD),
                )),
                Line::from(""),
                Line::from(vec![
                    Span::styled(
                        "[I] INCORRECT",
                        Style::default()
                            .fg(self.theme.danger)
                            .add_modifier(Modifier::BOLD),
                    ),
                    Span::raw("     "),
                    Span::styled(
                        "[C] CORRECT",
                        Style::default()
                            .fg(self.theme.success)
                            .add_modifier(Modifier::BOLD),
                    ),
                ]),
            ])
            .alignment(Alignment::Center);
            frame.render_widget(verdict, chunks[2]);
        } else {
            let digits: Vec<Line> =
                countdown_font::render(&countdown_font::clock_label(clock.remaining()))
                    .into_iter()
                    .map(|row| Line::from(Span::styled(row, Style::default().fg(self.theme.accent))))
                    .collect();
            let countdown = Paragraph::new(digits)
                .alignment(Alignment::Center)
                .block(Block::default());
            frame.render_widget(countdown, chunks[2]);
        }

        let gauge = Gauge::default()
            .block(Block::default().borders(Borders::ALL))
            .gauge_style(Style::default().fg(self.theme.accent))
            .ratio(clock.progress().clamp(0.0, 1.0))
            .label(countdown_font::clock_label(clock.remaining()));
        frame.render_widget(gauge, chunks[3]);
    }

    fn render_time_out(&self, frame: &mut Frame) {
        let area = centered_rect(44, 8, frame.size());
        frame.render_widget(Clear, area);
        let paragraph = Paragraph::new(vec![
            Line::from(Span::styled(
                "Time-Out Called!",
                Style::default()
                    .fg(self.theme.warning)
                    .add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
            Line::from("The clock is stopped. Take a breather."),
            Line::from(""),
            Line::from(vec![
                Span::styled("[M]", Style::default().add_modifier(Modifier::BOLD)),
                Span::raw(" Main Menu    "),
                Span::styled("[C]", Style::default().add_modifier(Modifier::BOLD)),
                Span::raw(" Continue"),
            ]),
        ])
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL).title("Paused"));
        frame.render_widget(paragraph, area);
    }

    fn render_stats(&self, frame: &mut Frame, area: Rect) {
        let Some(session) = self.engine.session() else {
            frame.render_widget(Paragraph::new("No finished game"), area);
            return;
        };

        let teams = &session.config().teams;
        let leaders = session.leaders();
        let headline = stats_headline(&leaders, teams);

        let mut lines = vec![
            Line::from(Span::styled(
                headline,
                Style::default()
                    .fg(self.theme.success)
                    .add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
        ];
        for (rank, standing) in session.standings().iter().enumerate() {
            let is_leader = is_leader(&leaders, standing);
            let style = if is_leader {
                Style::default()
                    .fg(self.theme.accent)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(self.theme.primary_fg)
            };
            lines.push(Line::from(vec![
                Span::styled(format!("{:>2}. ", rank + 1), style),
                Span::styled(format!("{:<24}", team_label(standing, teams)), style),
                Span::styled(format!("{:>3} pts", standing.score), style),
            ]));
        }
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            format!(
                "{} rounds · {} turns played",
                session.config().num_rounds,
                session.turns_played()
            ),
            Style::default().fg(self.theme.muted),
        )));

        let paragraph = Paragraph::new(lines)
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL).title("Results"));
        frame.render_widget(paragraph, centered_rect(50, area.height, area));
    }

    fn render_legends(&self, frame: &mut Frame, area: Rect) {
        let entries = self.custom_legends.entries();
        let title = format!("Custom Legends ({})", entries.len());
        if entries.is_empty() {
            let paragraph = Paragraph::new(vec![
                Line::from(""),
                Line::from("No custom legends yet."),
                Line::from("Press a to add one."),
            ])
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL).title(title));
            frame.render_widget(paragraph, area);
            return;
        }

        let items: Vec<ListItem> = entries
            .iter()
            .map(|entry| {
                ListItem::new(Line::from(vec![
                    Span::styled(
                        entry.name.clone(),
                        Style::default()
                            .fg(self.theme.primary_fg)
                            .add_modifier(Modifier::BOLD),
                    ),
                    Span::styled(
                        format!(" · {}", entry.category),
                        Style::default().fg(self.theme.muted),
                    ),
                ]))
            })
            .collect();
        let mut state = ListState::default();
        state.select(Some(self.legend_cursor.min(entries.len() - 1)));
        let list = List::new(items)
            .block(Block::default().borders(Borders::ALL).title(title))
            .highlight_style(Style::default().bg(self.theme.selection_bg))
            .highlight_symbol("▶ ");
        frame.render_stateful_widget(list, area, &mut state);
    }

    fn render_legend_form(&self, frame: &mut Frame, form: &LegendForm) {
        let area = centered_rect(50, 8, frame.size());
        frame.render_widget(Clear, area);

        let field = |label: &str, value: &TextField, active: bool| -> Line<'static> {
            let style = if active {
                Style::default()
                    .fg(self.theme.accent)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(self.theme.primary_fg)
            };
            Line::from(vec![
                Span::styled(format!("{label:<10}"), Style::default().fg(self.theme.muted)),
                Span::styled(value.value.clone(), style),
                Span::styled(if active { "_" } else { "" }, style),
            ])
        };

        let paragraph = Paragraph::new(vec![
            field("Name", &form.name, !form.editing_category),
            field("Category", &form.category, form.editing_category),
            Line::from(""),
            Line::from(vec![
                Span::styled("Enter", Style::default().add_modifier(Modifier::BOLD)),
                Span::raw(" save  "),
                Span::styled("Tab", Style::default().add_modifier(Modifier::BOLD)),
                Span::raw(" switch  "),
                Span::styled("Esc", Style::default().add_modifier(Modifier::BOLD)),
                Span::raw(" cancel"),
            ]),
        ])
        .block(Block::default().borders(Borders::ALL).title("Add Legend"));
        frame.render_widget(paragraph, area);
    }

    fn render_settings(&self, frame: &mut Frame, area: Rect) {
        let enabled = self.settings.settings().music_enabled;
        let (label, color) = if enabled {
            ("ON", self.theme.success)
        } else {
            ("OFF", self.theme.danger)
        };
        let paragraph = Paragraph::new(vec![
            Line::from(vec![
                Span::raw("Music  "),
                Span::styled(
                    format!("[{label}]"),
                    Style::default().fg(color).add_modifier(Modifier::BOLD),
                ),
            ]),
            Line::from(""),
            Line::from(Span::styled(
                format!("Saved to {}", self.settings.path().display()),
                Style::default().fg(self.theme.muted),
            )),
        ])
        .block(Block::default().borders(Borders::ALL).title("Settings"));
        frame.render_widget(paragraph, centered_rect(60, 6, area));
    }

    fn render_rules(&self, frame: &mut Frame, area: Rect) {
        let lines: Vec<Line> = RULES
            .iter()
            .enumerate()
            .map(|(index, rule)| Line::from(format!("{}. {rule}", index + 1)))
            .collect();
        let paragraph = Paragraph::new(lines)
            .wrap(Wrap { trim: true })
            .block(Block::default().borders(Borders::ALL).title("How to play"));
        frame.render_widget(paragraph, centered_rect(70, area.height, area));
    }
}

/// Team name, suffixed with its seat number when another team shares it.
fn team_label(standing: &Standing, teams: &[Team]) -> String {
    let shared = teams
        .iter()
        .filter(|team| team.name() == standing.team.name())
        .count()
        > 1;
    if shared {
        format!("{} #{}", standing.team, standing.team_index + 1)
    } else {
        standing.team.to_string()
    }
}

fn stats_headline(leaders: &[Standing], teams: &[Team]) -> String {
    match leaders {
        [] => "No scores recorded".to_string(),
        [winner] => format!("{} wins!", team_label(winner, teams)),
        _ => format!(
            "Tie between {}",
            leaders
                .iter()
                .map(|leader| team_label(leader, teams))
                .collect::<Vec<_>>()
                .join(", ")
        ),
    }
}

fn is_leader(leaders: &[Standing], standing: &Standing) -> bool {
    leaders
        .iter()
        .any(|leader| leader.team_index == standing.team_index)
}

fn option_at(values: &[u32], index: usize) -> u32 {
    values
        .get(index)
        .or_else(|| values.first())
        .copied()
        .unwrap_or_default()
}

fn cycle(index: &mut usize, len: usize, forward: bool) {
    if len == 0 {
        return;
    }
    *index = if forward {
        (*index + 1) % len
    } else {
        (*index + len - 1) % len
    };
}

fn option_row(values: &[u32], selected: usize, label: impl Fn(u32) -> String) -> String {
    values
        .iter()
        .enumerate()
        .map(|(index, value)| {
            if index == selected {
                format!("[{}]", label(*value))
            } else {
                format!(" {} ", label(*value))
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width, height)
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
        match event::poll(INPUT_POLL) {
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

    fn config() -> AppConfig {
        AppConfig {
            round_options: vec![2, 3, 5],
            time_options: vec![60, 120, 180],
            ..AppConfig::default()
        }
    }

    #[test]
    fn setup_requires_every_name() {
        let mut setup = SetupState::new();
        assert!(!setup.is_ready());
        for ch in "Red".chars() {
            setup.teams[0].push(ch);
        }
        setup.teams[1].push(' ');
        assert!(!setup.is_ready());
        setup.teams[1].push('B');
        assert!(setup.is_ready());
    }

    #[test]
    fn setup_keeps_two_teams_minimum() {
        let mut setup = SetupState::new();
        assert!(!setup.remove_team(0));
        assert!(setup.add_team());
        assert_eq!(setup.focused(), SetupFocus::Team(2));
        assert!(setup.remove_team(2));
        assert_eq!(setup.teams.len(), MIN_TEAMS);
        assert_eq!(setup.focused(), SetupFocus::Team(1));
    }

    #[test]
    fn focus_wraps_through_all_fields() {
        let mut setup = SetupState::new();
        setup.focus_prev();
        assert_eq!(setup.focused(), SetupFocus::Start);
        setup.focus_next();
        setup.focus_next();
        setup.focus_next();
        assert_eq!(setup.focused(), SetupFocus::AddTeam);
        setup.focus_next();
        assert_eq!(setup.focused(), SetupFocus::Rounds);
    }

    #[test]
    fn session_config_uses_selected_options() {
        let mut setup = SetupState::new();
        setup.teams[0].value = " Red ".to_string();
        setup.teams[1].value = "Blue".to_string();
        cycle(&mut setup.rounds, 3, true);
        cycle(&mut setup.time, 3, false);

        let session = setup.session_config(&config());
        assert_eq!(session.num_rounds, 3);
        assert_eq!(session.time_per_turn, 180);
        assert_eq!(session.teams.len(), 2);
    }

    #[test]
    fn text_field_limits_input() {
        let mut field = TextField::default();
        for _ in 0..(MAX_INPUT_LEN + 5) {
            field.push('x');
        }
        field.push('\n');
        assert_eq!(field.value.chars().count(), MAX_INPUT_LEN);
        field.pop();
        assert_eq!(field.value.chars().count(), MAX_INPUT_LEN - 1);
    }

    #[test]
    fn shared_names_are_ranked_by_seat() {
        let mut engine = GameEngine::new();
        engine
            .start_game(SessionConfig::new(["Red", "Red", "Blue"], 1, 10))
            .unwrap();
        engine.resolve_turn(Outcome::Incorrect).unwrap();
        engine.resolve_turn(Outcome::Correct).unwrap();
        engine.resolve_turn(Outcome::Incorrect).unwrap();

        let session = engine.session().unwrap();
        let teams = &session.config().teams;
        let leaders = session.leaders();
        let standings = session.standings();

        assert_eq!(stats_headline(&leaders, teams), "Red #2 wins!");
        let marked: Vec<usize> = standings
            .iter()
            .filter(|standing| is_leader(&leaders, standing))
            .map(|standing| standing.team_index)
            .collect();
        assert_eq!(marked, vec![1]);

        let blue = standings
            .iter()
            .find(|standing| standing.team_index == 2)
            .unwrap();
        assert_eq!(team_label(blue, teams), "Blue");
    }

    #[test]
    fn option_row_marks_selection() {
        assert_eq!(option_row(&[2, 3], 1, |v| v.to_string()), " 2  [3]");
        assert_eq!(option_at(&[], 4), 0);
        assert_eq!(option_at(&[7, 8], 9), 7);
    }
}
