use std::time::{Duration, Instant};

use crossterm::event::{
    self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent,
    MouseEventKind,
};
use ratatui::{style::Style, widgets::Block, Frame};
use tracing::info;

use crate::cli::screens::{self, Focus, View};
use crate::effects::{self, ConfettiField, Particle, BACKGROUND};
use crate::error::Result;
use crate::motion::Presence;
use crate::sequencer::{CardState, Input, Sequencer, Step};
use crate::settings::Settings;
use crate::tui::{self, HitMap, Target, TextField};

const MIN_TICK: Duration = Duration::from_millis(10);

pub enum Flow {
    Continue,
    Quit,
}

/// Fixed-rate animation clock. Events may arrive at any rate; ticks don't.
struct Ticker {
    interval: Duration,
    last: Instant,
}

impl Ticker {
    fn new(interval: Duration, now: Instant) -> Self {
        Self { interval, last: now }
    }

    /// How long to wait for input before the next tick is due.
    fn timeout(&self, now: Instant) -> Duration {
        self.interval.saturating_sub(now.saturating_duration_since(self.last))
    }

    fn due(&mut self, now: Instant) -> bool {
        if now.saturating_duration_since(self.last) < self.interval {
            return false;
        }
        self.last = now;
        true
    }
}

pub struct CardApp {
    sequencer: Sequencer<ConfettiField>,
    presence: Presence,
    field: TextField,
    focus: Focus,
    motes: Vec<Particle>,
    max_motes: usize,
    hits: HitMap,
    width: u16,
    height: u16,
    phase: f64,
    start: Instant,
}

impl CardApp {
    pub fn new(settings: &Settings, width: u16, height: u16) -> Self {
        let now = Instant::now();
        Self {
            sequencer: Sequencer::new(ConfettiField::new(settings.confetti, width, height)),
            presence: Presence::new(Step::default(), now),
            field: TextField::default(),
            focus: Focus::default(),
            motes: effects::pre_seed_particles(settings.ambient_particles, width, height),
            max_motes: settings.ambient_particles,
            hits: HitMap::default(),
            width,
            height,
            phase: 0.0,
            start: now,
        }
    }

    pub fn state(&self) -> &CardState {
        self.sequencer.state()
    }

    fn dispatch(&mut self, input: Input) {
        self.sequencer.dispatch(input);
        let state = self.sequencer.state();
        if state.draft() != self.field.value() {
            self.field.reset(state.draft());
        }
        if state.step() != self.presence.current() {
            self.focus = Focus::default();
        }
        self.presence.observe(state.step(), Instant::now());
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Flow {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        if key.code == KeyCode::Esc || (ctrl && key.code == KeyCode::Char('c')) {
            return Flow::Quit;
        }

        match self.sequencer.state().step() {
            Step::Sugar | Step::Moon => match key.code {
                KeyCode::Char('y') | KeyCode::Char('Y') => self.dispatch(Input::Yes),
                KeyCode::Char('n') | KeyCode::Char('N') => self.dispatch(Input::No),
                KeyCode::Left | KeyCode::Right | KeyCode::Tab | KeyCode::BackTab => {
                    self.focus = self.focus.toggle();
                }
                KeyCode::Enter | KeyCode::Char(' ') => {
                    let answer = match self.focus {
                        Focus::Yes => Input::Yes,
                        Focus::No => Input::No,
                    };
                    self.dispatch(answer);
                }
                _ => {}
            },
            Step::SugarResponse | Step::MoonResponse => {
                if matches!(key.code, KeyCode::Enter | KeyCode::Char(' ') | KeyCode::Right) {
                    self.dispatch(Input::Continue);
                }
            }
            Step::Name => match key.code {
                KeyCode::Enter => self.dispatch(Input::Submit),
                KeyCode::Char(_) if ctrl || key.modifiers.contains(KeyModifiers::ALT) => {}
                code => {
                    if self.field.handle_key(code) {
                        let text = self.field.value().to_string();
                        self.dispatch(Input::EditDraft(text));
                    }
                }
            },
            Step::Gift => {
                if matches!(key.code, KeyCode::Enter | KeyCode::Char(' ')) {
                    self.dispatch(Input::OpenGift);
                }
            }
            Step::Opened => {
                if matches!(key.code, KeyCode::Enter | KeyCode::Char('r') | KeyCode::Char('R')) {
                    self.dispatch(Input::Restart);
                }
            }
        }
        Flow::Continue
    }

    pub fn handle_mouse(&mut self, mouse: MouseEvent) {
        if mouse.kind != MouseEventKind::Down(MouseButton::Left) {
            return;
        }
        let Some(target) = self.hits.target_at(mouse.column, mouse.row) else {
            return;
        };
        let input = match target {
            Target::Yes => Input::Yes,
            Target::No => Input::No,
            Target::Continue => Input::Continue,
            Target::Send => Input::Submit,
            Target::Gift => Input::OpenGift,
            Target::Restart => Input::Restart,
        };
        self.dispatch(input);
    }

    pub fn handle_event(&mut self, event: Event) -> Flow {
        match event {
            Event::Key(key) if key.kind == KeyEventKind::Press => self.handle_key(key),
            Event::Mouse(mouse) => {
                self.handle_mouse(mouse);
                Flow::Continue
            }
            _ => Flow::Continue,
        }
    }

    /// One pass of the event loop after polling: handle what arrived, then
    /// tick if the interval has passed.
    fn pump(&mut self, event: Option<Event>, ticker: &mut Ticker, now: Instant) -> Flow {
        if let Some(event) = event {
            if let Flow::Quit = self.handle_event(event) {
                return Flow::Quit;
            }
        }
        if ticker.due(now) {
            self.tick();
        }
        Flow::Continue
    }

    pub fn tick(&mut self) {
        self.phase += 1.0 / 70.0;
        effects::tick_particles(&mut self.motes, self.max_motes, self.width, self.height);
        self.sequencer.celebration_mut().tick();
    }

    pub fn draw(&mut self, frame: &mut Frame) {
        let area = frame.area();
        self.width = area.width;
        self.height = area.height;
        self.sequencer.celebration_mut().resize(area.width, area.height);

        frame.render_widget(Block::default().style(Style::new().bg(BACKGROUND)), area);
        let secs = self.start.elapsed().as_secs_f64();
        effects::render_particles(&self.motes, frame, area);
        effects::render_ornaments(secs, frame, area);

        self.hits.clear();
        let view = View {
            state: self.sequencer.state(),
            shown: self.presence.shown(Instant::now()),
            field: &self.field,
            focus: self.focus,
            phase: self.phase,
            secs,
        };
        screens::draw(frame, area, &view, &mut self.hits);

        self.sequencer.celebration().render(frame, area);
    }
}

/// Run the card until the user leaves.
pub fn run(settings: &Settings) -> Result<()> {
    let tick = Duration::from_millis(settings.tick_ms).max(MIN_TICK);
    let (width, height) = crossterm::terminal::size().unwrap_or((80, 24));
    let mut app = CardApp::new(settings, width, height);
    info!(width, height, confetti = settings.confetti, "card opened");

    let mut ticker = Ticker::new(tick, Instant::now());
    tui::with_terminal(|terminal| loop {
        terminal.draw(|frame| app.draw(frame))?;

        let event = if event::poll(ticker.timeout(Instant::now()))? {
            Some(event::read()?)
        } else {
            None
        };
        if let Flow::Quit = app.pump(event, &mut ticker, Instant::now()) {
            info!(
                step = %app.state().step(),
                bursts = app.sequencer.celebration().bursts(),
                "card closed"
            );
            return Ok(());
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;

    fn quiet_settings() -> Settings {
        Settings {
            confetti: false,
            ambient_particles: 0,
            ..Settings::default()
        }
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn press(app: &mut CardApp, codes: &[KeyCode]) {
        for &code in codes {
            app.handle_key(key(code));
        }
    }

    fn type_text(app: &mut CardApp, text: &str) {
        for c in text.chars() {
            app.handle_key(key(KeyCode::Char(c)));
        }
    }

    fn to_name_screen(app: &mut CardApp) {
        press(
            app,
            &[KeyCode::Char('y'), KeyCode::Enter, KeyCode::Char('n'), KeyCode::Enter],
        );
        assert_eq!(app.state().step(), Step::Name);
    }

    fn render(app: &mut CardApp) -> Terminal<TestBackend> {
        let mut terminal = Terminal::new(TestBackend::new(80, 24)).unwrap();
        terminal.draw(|frame| app.draw(frame)).unwrap();
        terminal
    }

    fn screen_text(terminal: &Terminal<TestBackend>) -> String {
        let buf = terminal.backend().buffer();
        let mut out = String::new();
        for y in 0..buf.area.height {
            for x in 0..buf.area.width {
                out.push_str(buf[(x, y)].symbol());
            }
            out.push('\n');
        }
        out
    }

    fn locate(terminal: &Terminal<TestBackend>, needle: &str) -> Option<(u16, u16)> {
        let buf = terminal.backend().buffer();
        let needle: Vec<String> = needle.chars().map(|c| c.to_string()).collect();
        for y in 0..buf.area.height {
            for x in 0..=buf.area.width.saturating_sub(needle.len() as u16) {
                let hit = needle
                    .iter()
                    .enumerate()
                    .all(|(i, s)| buf[(x + i as u16, y)].symbol() == s);
                if hit {
                    return Some((x, y));
                }
            }
        }
        None
    }

    fn mouse(kind: MouseEventKind, (column, row): (u16, u16)) -> MouseEvent {
        MouseEvent {
            kind,
            column,
            row,
            modifiers: KeyModifiers::NONE,
        }
    }

    fn click(app: &mut CardApp, at: (u16, u16)) {
        app.handle_mouse(mouse(MouseEventKind::Down(MouseButton::Left), at));
    }

    fn to_gift_screen(app: &mut CardApp) {
        to_name_screen(app);
        type_text(app, "Alex");
        press(app, &[KeyCode::Enter]);
        assert_eq!(app.state().step(), Step::Gift);
    }

    fn confetti_heights(app: &CardApp) -> Vec<f64> {
        app.sequencer.celebration().pieces().iter().map(|p| p.y).collect()
    }

    #[test]
    fn answer_keys_advance_both_questions() {
        let mut app = CardApp::new(&quiet_settings(), 80, 24);
        app.handle_key(key(KeyCode::Char('n')));
        assert_eq!(app.state().step(), Step::SugarResponse);
        app.handle_key(key(KeyCode::Right));
        assert_eq!(app.state().step(), Step::Moon);
        app.handle_key(key(KeyCode::Char('Y')));
        assert_eq!(app.state().step(), Step::MoonResponse);
    }

    #[test]
    fn focused_button_answers_on_enter() {
        let mut app = CardApp::new(&quiet_settings(), 80, 24);
        press(&mut app, &[KeyCode::Tab, KeyCode::Enter]);
        assert_eq!(app.state().step(), Step::SugarResponse);
        assert_eq!(app.focus, Focus::Yes);
    }

    #[test]
    fn letters_do_nothing_outside_the_name_screen() {
        let mut app = CardApp::new(&quiet_settings(), 80, 24);
        type_text(&mut app, "xyz");
        assert_eq!(app.state().step(), Step::SugarResponse);
        type_text(&mut app, "abc");
        assert_eq!(app.state().step(), Step::SugarResponse);
        assert!(app.state().draft().is_empty());
    }

    #[test]
    fn typing_fills_the_draft() {
        let mut app = CardApp::new(&quiet_settings(), 80, 24);
        to_name_screen(&mut app);
        type_text(&mut app, "Alexx");
        press(&mut app, &[KeyCode::Backspace]);
        assert_eq!(app.state().draft(), "Alex");
        assert_eq!(app.field.value(), "Alex");
    }

    #[test]
    fn enter_on_empty_name_is_ignored() {
        let mut app = CardApp::new(&quiet_settings(), 80, 24);
        to_name_screen(&mut app);
        press(&mut app, &[KeyCode::Enter]);
        assert_eq!(app.state().step(), Step::Name);
        assert!(app.state().name().is_empty());
    }

    #[test]
    fn ctrl_chords_are_not_typed() {
        let mut app = CardApp::new(&quiet_settings(), 80, 24);
        to_name_screen(&mut app);
        app.handle_key(KeyEvent::new(KeyCode::Char('u'), KeyModifiers::CONTROL));
        assert!(app.state().draft().is_empty());
    }

    #[test]
    fn escape_and_ctrl_c_quit() {
        let mut app = CardApp::new(&quiet_settings(), 80, 24);
        assert!(matches!(app.handle_key(key(KeyCode::Esc)), Flow::Quit));
        let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert!(matches!(app.handle_key(ctrl_c), Flow::Quit));
        assert!(matches!(app.handle_key(key(KeyCode::Char('c'))), Flow::Continue));
    }

    #[test]
    fn full_cycle_by_keyboard_celebrates_each_time() {
        let settings = Settings {
            ambient_particles: 0,
            ..Settings::default()
        };
        let mut app = CardApp::new(&settings, 80, 24);
        for round in 1..=2 {
            to_name_screen(&mut app);
            type_text(&mut app, "Alex");
            press(&mut app, &[KeyCode::Enter]);
            assert_eq!(app.state().step(), Step::Gift);
            assert_eq!(app.state().name(), "Alex");

            press(&mut app, &[KeyCode::Enter]);
            assert_eq!(app.state().step(), Step::Opened);
            assert_eq!(app.sequencer.celebration().bursts(), round);
            assert!(!app.sequencer.celebration().pieces().is_empty());

            press(&mut app, &[KeyCode::Char('r')]);
            assert_eq!(app.state(), &CardState::default());
            assert_eq!(app.field.value(), "");
        }
    }

    #[test]
    fn gift_screen_shows_the_delivery() {
        let mut app = CardApp::new(&quiet_settings(), 80, 24);
        to_name_screen(&mut app);
        type_text(&mut app, "Alex");
        press(&mut app, &[KeyCode::Enter]);
        app.presence.settle();

        let text = screen_text(&render(&mut app));
        assert!(text.contains("A special delivery for"));
        assert!(text.contains("Alex"));
        assert!(text.contains("TAP TO OPEN"));
    }

    #[test]
    fn opened_screen_shouts_the_name() {
        let mut app = CardApp::new(&quiet_settings(), 80, 24);
        to_name_screen(&mut app);
        type_text(&mut app, "Alex");
        press(&mut app, &[KeyCode::Enter, KeyCode::Enter]);
        app.presence.settle();

        let text = screen_text(&render(&mut app));
        assert!(text.contains("HAPPY BIRTHDAY, ALEX!"));
        assert!(text.contains("RESTART MAGIC"));
    }

    #[test]
    fn clicking_buttons_walks_the_card() {
        let mut app = CardApp::new(&quiet_settings(), 80, 24);
        app.presence.settle();
        let terminal = render(&mut app);
        assert!(screen_text(&terminal).contains("Are you a sugar?"));
        click(&mut app, locate(&terminal, "No").unwrap());
        assert_eq!(app.state().step(), Step::SugarResponse);

        app.presence.settle();
        let terminal = render(&mut app);
        click(&mut app, locate(&terminal, "CONTINUE").unwrap());
        assert_eq!(app.state().step(), Step::Moon);
    }

    #[test]
    fn send_button_appears_with_a_draft() {
        let mut app = CardApp::new(&quiet_settings(), 80, 24);
        to_name_screen(&mut app);
        app.presence.settle();
        let terminal = render(&mut app);
        assert!(screen_text(&terminal).contains("Type here..."));
        assert!(locate(&terminal, "\u{27a4}").is_none());

        type_text(&mut app, "Alex");
        let terminal = render(&mut app);
        click(&mut app, locate(&terminal, "\u{27a4}").unwrap());
        assert_eq!(app.state().step(), Step::Gift);
        assert_eq!(app.state().name(), "Alex");
    }

    #[test]
    fn restart_is_clickable_before_it_fades_in() {
        let mut app = CardApp::new(&quiet_settings(), 80, 24);
        to_name_screen(&mut app);
        type_text(&mut app, "Alex");
        press(&mut app, &[KeyCode::Enter, KeyCode::Enter]);

        let terminal = render(&mut app);
        click(&mut app, locate(&terminal, "RESTART MAGIC").unwrap());
        assert_eq!(app.state().step(), Step::Sugar);
    }

    #[test]
    fn clicks_on_a_leaving_screen_are_ignored() {
        let mut app = CardApp::new(&quiet_settings(), 80, 24);
        app.presence.settle();
        let settled = render(&mut app);
        let yes = locate(&settled, "Yes").unwrap();

        app.handle_key(key(KeyCode::Char('y')));
        // Sugar is still playing its exit; nothing on it is clickable.
        render(&mut app);
        assert_eq!(app.hits.target_at(yes.0, yes.1), None);
        assert_eq!(app.state().step(), Step::SugarResponse);
    }

    #[test]
    fn tick_moves_confetti() {
        let settings = Settings {
            ambient_particles: 0,
            ..Settings::default()
        };
        let mut app = CardApp::new(&settings, 80, 24);
        to_name_screen(&mut app);
        type_text(&mut app, "Alex");
        press(&mut app, &[KeyCode::Enter, KeyCode::Enter]);
        let before = confetti_heights(&app);
        app.tick();
        assert_ne!(before, confetti_heights(&app));
    }

    #[test]
    fn mouse_motion_does_not_advance_confetti() {
        let settings = Settings {
            ambient_particles: 0,
            ..Settings::default()
        };
        let mut app = CardApp::new(&settings, 80, 24);
        to_gift_screen(&mut app);
        press(&mut app, &[KeyCode::Enter]);
        let before = confetti_heights(&app);
        assert_eq!(before.len(), 150);

        let t0 = Instant::now();
        let mut ticker = Ticker::new(Duration::from_millis(33), t0);
        for i in 0..120u16 {
            let moved = Event::Mouse(mouse(MouseEventKind::Moved, (i % 80, 5)));
            let now = t0 + Duration::from_micros(200 * i as u64);
            app.pump(Some(moved), &mut ticker, now);
        }
        assert_eq!(confetti_heights(&app), before);

        app.pump(None, &mut ticker, t0 + Duration::from_millis(33));
        assert_ne!(confetti_heights(&app), before);
    }

    #[test]
    fn ticker_fires_once_per_interval() {
        let t0 = Instant::now();
        let interval = Duration::from_millis(33);
        let mut ticker = Ticker::new(interval, t0);
        assert_eq!(ticker.timeout(t0), interval);
        assert!(!ticker.due(t0 + Duration::from_millis(10)));
        assert_eq!(ticker.timeout(t0 + Duration::from_millis(10)), Duration::from_millis(23));

        assert!(ticker.due(t0 + interval));
        assert!(!ticker.due(t0 + interval));
        assert_eq!(ticker.timeout(t0 + Duration::from_secs(1)), Duration::ZERO);
    }

    #[test]
    fn escape_through_the_loop_quits() {
        let mut app = CardApp::new(&quiet_settings(), 80, 24);
        let t0 = Instant::now();
        let mut ticker = Ticker::new(Duration::from_millis(33), t0);
        let esc = Event::Key(key(KeyCode::Esc));
        assert!(matches!(app.pump(Some(esc), &mut ticker, t0), Flow::Quit));
        assert!(matches!(app.pump(None, &mut ticker, t0), Flow::Continue));
    }

    #[test]
    fn clicking_the_gift_opens_it() {
        let mut app = CardApp::new(&quiet_settings(), 80, 24);
        to_gift_screen(&mut app);
        app.presence.settle();
        let terminal = render(&mut app);
        let (x, y) = locate(&terminal, "|____||____|").unwrap();
        click(&mut app, (x + 2, y));
        assert_eq!(app.state().step(), Step::Opened);
    }

    #[test]
    fn clicking_tap_to_open_opens_the_gift() {
        let mut app = CardApp::new(&quiet_settings(), 80, 24);
        to_gift_screen(&mut app);
        app.presence.settle();
        let terminal = render(&mut app);
        let tap = locate(&terminal, "TAP TO OPEN").unwrap();
        click(&mut app, tap);
        assert_eq!(app.state().step(), Step::Opened);
    }

    #[test]
    fn clicks_beside_the_gift_miss() {
        let mut app = CardApp::new(&quiet_settings(), 80, 24);
        to_gift_screen(&mut app);
        app.presence.settle();
        let terminal = render(&mut app);
        let (_, y) = locate(&terminal, "|____||____|").unwrap();
        click(&mut app, (0, y));
        assert_eq!(app.state().step(), Step::Gift);
    }

    #[test]
    fn disabled_confetti_still_opens_the_gift() {
        let mut app = CardApp::new(&quiet_settings(), 80, 24);
        to_gift_screen(&mut app);
        press(&mut app, &[KeyCode::Enter]);
        assert_eq!(app.state().step(), Step::Opened);
        assert_eq!(app.sequencer.celebration().bursts(), 0);
        assert!(app.sequencer.celebration().pieces().is_empty());
    }

    #[test]
    fn space_opens_the_gift() {
        let mut app = CardApp::new(&quiet_settings(), 80, 24);
        to_gift_screen(&mut app);
        press(&mut app, &[KeyCode::Char('x'), KeyCode::Left]);
        assert_eq!(app.state().step(), Step::Gift);
        press(&mut app, &[KeyCode::Char(' ')]);
        assert_eq!(app.state().step(), Step::Opened);
    }

    #[test]
    fn enter_restarts_from_the_finale() {
        let mut app = CardApp::new(&quiet_settings(), 80, 24);
        to_gift_screen(&mut app);
        press(&mut app, &[KeyCode::Enter]);
        assert_eq!(app.state().step(), Step::Opened);
        press(&mut app, &[KeyCode::Char(' ')]);
        assert_eq!(app.state().step(), Step::Opened);
        press(&mut app, &[KeyCode::Enter]);
        assert_eq!(app.state(), &CardState::default());
    }

    #[test]
    fn hints_follow_the_screen_being_drawn() {
        let mut app = CardApp::new(&quiet_settings(), 80, 24);
        app.handle_key(key(KeyCode::Char('y')));
        assert_eq!(app.state().step(), Step::SugarResponse);

        // Sugar is still on its way out.
        let text = screen_text(&render(&mut app));
        assert!(text.contains("y/n or"));
        assert!(!text.contains("Enter to continue"));

        app.presence.settle();
        let text = screen_text(&render(&mut app));
        assert!(text.contains("Enter to continue"));
    }
}
