use std::future::Future;
use std::io;
use std::sync::Arc;

use anyhow::Context;
use chrono::Utc;
use clap::Parser;
use crossterm::{
    event::{Event, EventStream, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use futures::StreamExt;
use log::{debug, info, warn};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Layout},
    widgets::{Block, Borders},
    Frame, Terminal,
};
use serde_json::Value;
use tokio::sync::mpsc;
use tokio::time::{interval, Duration};

use cryptodash::{
    api::{connect_updates, ApiClient},
    chart::{
        panels,
        render::{render_message, render_volume},
        render_chart, ChartKind,
    },
    cli::Args,
    config::DashboardConfig,
    models::{
        Alert, AnalysisReport, CoinInfo, Envelope, ExchangeReply, ManualAnalysisAck, PriceBoard,
        ServiceStatus, TimeRange,
    },
    services::{
        demo_history, load_history, poller, AlertBoard, ChatSession, HistoryView,
        OhlcSynthesizer, PollHandle,
    },
};

const REDRAW_EVERY: Duration = Duration::from_secs(1);

/// Results of one-off requests spawned from key presses.
enum Background {
    ChatLoaded(cryptodash::Result<ChatSession>),
    ChatSwitched(cryptodash::Result<ChatSession>),
    ChatSent(cryptodash::Result<Envelope<ExchangeReply>>),
    AnalysisRequested(cryptodash::Result<ManualAnalysisAck>),
}

#[derive(Debug, Clone, Copy)]
enum ChatAction {
    New,
    Next,
    Delete,
}

/// One refresh loop and its results; dropping it stops the loop.
struct Feed<T> {
    handle: Option<PollHandle>,
    rx: mpsc::Receiver<cryptodash::Result<T>>,
}

impl<T: Send + 'static> Feed<T> {
    fn live<F, Fut>(name: &'static str, period: Duration, fetch: F) -> Self
    where
        F: Fn() -> Fut + Send + 'static,
        Fut: Future<Output = cryptodash::Result<T>> + Send + 'static,
    {
        let (handle, rx) = poller::spawn(name, period, fetch);
        Self {
            handle: Some(handle),
            rx,
        }
    }

    /// A feed that never yields, for demo mode.
    fn idle() -> Self {
        let (_tx, rx) = mpsc::channel(1);
        Self { handle: None, rx }
    }

    fn refresh(&self) {
        if let Some(handle) = &self.handle {
            handle.refresh_now();
        }
    }
}

struct App {
    config: DashboardConfig,
    client: Arc<ApiClient>,
    synthesizer: Arc<OhlcSynthesizer>,
    background: mpsc::Sender<Background>,

    coin: CoinInfo,
    range: TimeRange,
    chart_kind: ChartKind,
    show_volume: bool,
    history: Option<HistoryView>,
    history_error: Option<String>,
    showing_demo: bool,
    prices: PriceBoard,
    alerts: AlertBoard,
    analysis: Option<AnalysisReport>,
    status: Option<ServiceStatus>,
    chat: ChatSession,
    chat_connecting: bool,
    notice: String,
    should_quit: bool,
}

impl App {
    fn new(
        config: DashboardConfig,
        client: ApiClient,
        synthesizer: OhlcSynthesizer,
        background: mpsc::Sender<Background>,
    ) -> Self {
        Self {
            coin: config.coin.clone(),
            range: config.range,
            chat: ChatSession::new(config.chat_user.clone()),
            showing_demo: config.demo,
            config,
            client: Arc::new(client),
            synthesizer: Arc::new(synthesizer),
            background,
            chart_kind: ChartKind::default(),
            show_volume: true,
            history: None,
            history_error: None,
            prices: PriceBoard::new(),
            alerts: AlertBoard::default(),
            analysis: None,
            status: None,
            chat_connecting: false,
            notice: String::new(),
            should_quit: false,
        }
    }

    fn history_feed(&self) -> Feed<HistoryView> {
        let coin = self.coin.id.clone();
        let range = self.range;
        let seed = self.config.seed;
        let period = self.config.refresh;

        if self.config.demo {
            return Feed::live("history", period, move || {
                let coin = coin.clone();
                async move { demo_history(&coin, range, seed) }
            });
        }

        let client = self.client.clone();
        let synthesizer = self.synthesizer.clone();
        Feed::live("history", period, move || {
            let client = client.clone();
            let synthesizer = synthesizer.clone();
            let coin = coin.clone();
            async move { load_history(&*client, &coin, range, &synthesizer, seed).await }
        })
    }

    fn feed<T, F, Fut>(&self, name: &'static str, fetch: F) -> Feed<T>
    where
        T: Send + 'static,
        F: Fn(Arc<ApiClient>) -> Fut + Send + 'static,
        Fut: Future<Output = cryptodash::Result<T>> + Send + 'static,
    {
        if self.config.demo {
            return Feed::idle();
        }
        let client = self.client.clone();
        Feed::live(name, self.config.refresh, move || fetch(client.clone()))
    }

    fn on_history(&mut self, outcome: cryptodash::Result<HistoryView>) {
        match outcome {
            Ok(view) => {
                self.history = Some(view);
                self.history_error = None;
                self.showing_demo = self.config.demo;
            }
            Err(e) => {
                warn!("{}: history fetch failed: {e}", self.coin.id);
                self.notice = format!("History unavailable: {e}");
                if self.history.is_some() {
                    return;
                }
                match demo_history(&self.coin.id, self.range, self.config.seed) {
                    Ok(view) => {
                        self.history = Some(view);
                        self.showing_demo = true;
                    }
                    Err(demo_error) => self.history_error = Some(demo_error.to_string()),
                }
            }
        }
    }

    fn on_prices(&mut self, outcome: cryptodash::Result<PriceBoard>) {
        match outcome {
            Ok(prices) => self.prices = prices,
            Err(e) => self.notice = format!("Prices unavailable: {e}"),
        }
    }

    fn on_alerts(&mut self, outcome: cryptodash::Result<Vec<Alert>>) {
        match outcome {
            Ok(alerts) => self.alerts.replace(alerts),
            Err(e) => self.notice = format!("Alerts unavailable: {e}"),
        }
    }

    fn on_analysis(&mut self, outcome: cryptodash::Result<AnalysisReport>) {
        match outcome {
            Ok(report) => self.analysis = Some(report),
            Err(e) => debug!("analysis unavailable: {e}"),
        }
    }

    fn on_status(&mut self, outcome: cryptodash::Result<ServiceStatus>) {
        match outcome {
            Ok(status) => self.status = Some(status),
            Err(e) => {
                debug!("status unavailable: {e}");
                self.status = None;
            }
        }
    }

    fn on_background(&mut self, event: Background) {
        match event {
            Background::ChatLoaded(Ok(loaded)) => {
                self.chat_connecting = false;
                self.chat.adopt(loaded);
            }
            Background::ChatLoaded(Err(e)) => {
                self.chat_connecting = false;
                self.notice = format!("Chat unavailable: {e}");
            }
            Background::ChatSwitched(Ok(switched)) => {
                self.chat_connecting = false;
                self.chat.switch_to(switched);
            }
            Background::ChatSwitched(Err(e)) => {
                self.chat_connecting = false;
                self.notice = format!("Chat request failed: {e}");
            }
            Background::ChatSent(outcome) => self.chat.finish_send(outcome),
            Background::AnalysisRequested(Ok(ack)) => {
                self.notice = if ack.success {
                    format!("Analysis requested: {}", ack.message)
                } else {
                    format!("Analysis request rejected: {}", ack.message)
                };
            }
            Background::AnalysisRequested(Err(e)) => {
                self.notice = format!("Analysis request failed: {e}")
            }
        }
    }

    fn connect_chat(&mut self) {
        if self.config.demo || self.chat_connecting || !self.chat.needs_conversation() {
            return;
        }
        self.chat_connecting = true;

        let client = self.client.clone();
        let tx = self.background.clone();
        let mut loading = self.chat.clone();
        tokio::spawn(async move {
            let outcome = loading.ensure_conversation(&*client).await.map(|_| loading);
            let _ = tx.send(Background::ChatLoaded(outcome)).await;
        });
    }

    fn manage_chat(&mut self, action: ChatAction) {
        if self.config.demo || self.chat_connecting || self.chat.is_loading() {
            return;
        }
        self.chat_connecting = true;

        let client = self.client.clone();
        let tx = self.background.clone();
        let mut working = self.chat.clone();
        tokio::spawn(async move {
            let outcome = match action {
                ChatAction::New => working.new_conversation(&*client).await,
                ChatAction::Next => working.next_conversation(&*client).await,
                ChatAction::Delete => working.delete_current(&*client).await.map(|deleted| {
                    if !deleted {
                        warn!("conversation was not deleted");
                    }
                }),
            };
            let _ = tx
                .send(Background::ChatSwitched(outcome.map(|_| working)))
                .await;
        });
    }

    fn send_chat(&mut self) {
        let Some(outgoing) = self.chat.begin_send() else {
            return;
        };
        let client = self.client.clone();
        let tx = self.background.clone();
        tokio::spawn(async move {
            let outcome = client.send_message(&outgoing).await;
            let _ = tx.send(Background::ChatSent(outcome)).await;
        });
    }

    fn request_analysis(&mut self) {
        if self.config.demo {
            self.notice = "Analysis is not available in demo mode".to_string();
            return;
        }
        self.notice = "Requesting analysis...".to_string();
        let client = self.client.clone();
        let tx = self.background.clone();
        tokio::spawn(async move {
            let outcome = client.trigger_manual_analysis().await;
            let _ = tx.send(Background::AnalysisRequested(outcome)).await;
        });
    }

    fn next_coin(&mut self) -> bool {
        let mut candidates: Vec<String> = self
            .prices
            .keys()
            .filter(|id| CoinInfo::lookup(id).has_history())
            .cloned()
            .collect();
        if candidates.is_empty() {
            candidates = vec!["bitcoin".to_string(), "ethereum".to_string()];
        }

        let next = match candidates.iter().position(|id| *id == self.coin.id) {
            Some(i) => candidates[(i + 1) % candidates.len()].clone(),
            None => candidates[0].clone(),
        };
        if next == self.coin.id {
            return false;
        }
        self.coin = CoinInfo::lookup(&next);
        true
    }

    fn clear_history(&mut self) {
        self.history = None;
        self.history_error = None;
        self.showing_demo = self.config.demo;
    }

    /// Returns true when the history feed must be restarted.
    fn on_key(&mut self, key: KeyEvent) -> bool {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.should_quit = true;
            return false;
        }

        if self.chat.is_open && !self.chat.is_minimized {
            if key.modifiers.contains(KeyModifiers::CONTROL) {
                match key.code {
                    KeyCode::Char('n') => self.manage_chat(ChatAction::New),
                    KeyCode::Char('o') => self.manage_chat(ChatAction::Next),
                    KeyCode::Char('d') => self.manage_chat(ChatAction::Delete),
                    _ => {}
                }
                return false;
            }
            match key.code {
                KeyCode::Esc => self.chat.toggle_open(),
                KeyCode::Tab => self.chat.toggle_minimized(),
                KeyCode::Enter => self.send_chat(),
                KeyCode::Backspace => {
                    self.chat.input.pop();
                }
                KeyCode::Char(c) => self.chat.input.push(c),
                _ => {}
            }
            return false;
        }

        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
            KeyCode::Char('t') => {
                self.range = self.range.next();
                self.clear_history();
                return true;
            }
            KeyCode::Char('n') => {
                if self.next_coin() {
                    self.clear_history();
                    return true;
                }
            }
            KeyCode::Char('k') => self.chart_kind = self.chart_kind.toggle(),
            KeyCode::Char('v') => self.show_volume = !self.show_volume,
            KeyCode::Char('f') => self.alerts.filter = self.alerts.filter.next(),
            KeyCode::Char('s') => self.alerts.sort = self.alerts.sort.toggle(),
            KeyCode::Char('d') => {
                let top = self.alerts.visible().first().map(|a| a.id);
                if let Some(id) = top {
                    self.alerts.dismiss(id);
                }
            }
            KeyCode::Char('a') => self.request_analysis(),
            KeyCode::Char('c') => {
                self.chat.toggle_open();
                self.connect_chat();
            }
            KeyCode::Tab if self.chat.is_open => self.chat.toggle_minimized(),
            _ => {}
        }
        false
    }

    fn draw(&self, frame: &mut Frame) {
        let [body, status_line] =
            Layout::vertical([Constraint::Min(0), Constraint::Length(1)]).areas(frame.area());
        let [top, middle, bottom] = Layout::vertical([
            Constraint::Percentage(50),
            Constraint::Length(10),
            Constraint::Min(6),
        ])
        .areas(body);
        let [chart_column, summary_area] =
            Layout::horizontal([Constraint::Min(40), Constraint::Length(46)]).areas(top);
        let volume_height = if self.show_volume { 7 } else { 0 };
        let [chart_area, volume_area] =
            Layout::vertical([Constraint::Min(6), Constraint::Length(volume_height)])
                .areas(chart_column);
        let [recent_area, prices_area] =
            Layout::horizontal([Constraint::Percentage(55), Constraint::Percentage(45)])
                .areas(middle);
        let [alerts_area, analysis_area] =
            Layout::horizontal([Constraint::Percentage(50), Constraint::Percentage(50)])
                .areas(bottom);

        let title = format!(
            " {} ({}) {} {:?}{} ",
            self.coin.name,
            self.coin.symbol,
            self.range,
            self.chart_kind,
            if self.showing_demo { " (demo data)" } else { "" }
        );
        match (&self.history, &self.history_error) {
            (Some(view), _) => render_chart(frame, chart_area, self.chart_kind, &view.records, &title),
            (None, Some(error)) => render_message(
                frame,
                chart_area,
                Block::default().borders(Borders::ALL).title(title),
                error,
            ),
            (None, None) => render_message(
                frame,
                chart_area,
                Block::default().borders(Borders::ALL).title(title),
                "Loading...",
            ),
        }

        if self.show_volume {
            if let Some(view) = &self.history {
                render_volume(frame, volume_area, &view.records);
            }
        }
        panels::render_summary(frame, summary_area, &self.coin, self.history.as_ref());
        panels::render_recent(frame, recent_area, self.history.as_ref());
        panels::render_prices(frame, prices_area, &self.prices, &self.coin.id);
        panels::render_alerts(frame, alerts_area, &self.alerts, Utc::now());
        panels::render_analysis(frame, analysis_area, self.analysis.as_ref());
        panels::render_status(frame, status_line, self.status.as_ref(), &self.notice);
        panels::render_chat(frame, body, &self.chat);
    }
}

async fn next_update(updates: &mut Option<mpsc::Receiver<Value>>) -> Option<Value> {
    match updates {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}

async fn run(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    config: DashboardConfig,
) -> anyhow::Result<()> {
    let client = ApiClient::new(&config.api_url)?;
    let synthesizer = OhlcSynthesizer::new(config.synthesis)?;
    let (background_tx, mut background_rx) = mpsc::channel(16);

    let mut updates = match (&config.ws_url, config.demo) {
        (Some(url), false) => match connect_updates(url).await {
            Ok((_task, rx)) => Some(rx),
            Err(e) => {
                warn!("live updates disabled: {e}");
                None
            }
        },
        _ => None,
    };

    let mut app = App::new(config, client, synthesizer, background_tx);
    let mut history = app.history_feed();
    let mut prices = app.feed("prices", |client| async move { client.prices().await });
    let mut alerts = app.feed("alerts", |client| async move { client.alerts().await });
    let mut analysis = app.feed("analysis", |client| async move { client.analysis().await });
    let mut status = app.feed("status", |client| async move { client.status().await });

    let mut events = EventStream::new();
    let mut redraw = interval(REDRAW_EVERY);

    while !app.should_quit {
        terminal.draw(|frame| app.draw(frame))?;

        tokio::select! {
            event = events.next() => match event {
                Some(Ok(Event::Key(key))) if key.kind == KeyEventKind::Press => {
                    if key.code == KeyCode::Char('r') && !(app.chat.is_open && !app.chat.is_minimized) {
                        history.refresh();
                        prices.refresh();
                        alerts.refresh();
                        analysis.refresh();
                        status.refresh();
                    } else if app.on_key(key) {
                        history = app.history_feed();
                    }
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => return Err(e).context("terminal input"),
                None => break,
            },
            Some(outcome) = history.rx.recv() => app.on_history(outcome),
            Some(outcome) = prices.rx.recv() => app.on_prices(outcome),
            Some(outcome) = alerts.rx.recv() => app.on_alerts(outcome),
            Some(outcome) = analysis.rx.recv() => app.on_analysis(outcome),
            Some(outcome) = status.rx.recv() => app.on_status(outcome),
            Some(event) = background_rx.recv() => app.on_background(event),
            update = next_update(&mut updates) => match update {
                Some(update) => {
                    debug!("live update: {update}");
                    prices.refresh();
                    alerts.refresh();
                }
                None => {
                    app.notice = "Live updates disconnected".to_string();
                    updates = None;
                }
            },
            _ = redraw.tick() => {}
        }
    }

    info!("shutting down");
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logging to stderr would draw over the alternate screen unless redirected.
    if std::env::var_os("RUST_LOG").is_some() {
        env_logger::init();
    }

    let args = Args::parse();
    let config = DashboardConfig::from_args(&args).context("invalid configuration")?;

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout))?;

    let result = run(&mut terminal, config).await;

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}
