mod app;
mod ui;

use anyhow::{Context, Result};
use app::{App, Fetched};
use campaign_map::aggregate::BuildingMatch;
use campaign_map::client::{BanDuration, ControlOutcome, DataSource, WebDataSource};
use campaign_map::config::{Cli, Command, Settings};
use campaign_map::controller::{load_day, DayNavigator, DayRequest, DaySelection};
use campaign_map::export;
use campaign_map::map::WorldTransform;
use campaign_map::model::pilot::PilotFilter;
use campaign_map::timeline;
use clap::Parser;
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, MouseButton,
    MouseEvent, MouseEventKind,
};
use crossterm::execute;
use ratatui::layout::Rect;
use ratatui::DefaultTerminal;
use std::fs::File;
use std::path::Path;
use std::process::ExitCode;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::runtime::{Handle, Runtime};
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("campaign_map=info"))
}

/// Command-line commands log to stderr
fn init_stderr_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(std::io::stderr)
        .init();
}

/// The dashboard owns the terminal, so it logs to a file
fn init_file_logging(path: &Path) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create log file {}", path.display()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .init();
    Ok(())
}

fn main() -> ExitCode {
    // Load environment variables
    let _ = dotenvy::dotenv();

    if let Err(e) = run() {
        eprintln!("Error: {:#}", e);
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    let runtime = Runtime::new().context("Failed to start async runtime")?;

    match cli.command {
        None | Some(Command::Map) => {
            init_file_logging(&cli.settings.log_file)?;
            run_dashboard(&cli.settings, &runtime)
        }
        Some(command) => {
            init_stderr_logging();
            runtime.block_on(run_command(&cli.settings, command))
        }
    }
}

async fn run_command(settings: &Settings, command: Command) -> Result<()> {
    let source = settings.data_source();
    match command {
        Command::Map => anyhow::bail!("The map is the interactive dashboard"),
        Command::Timeline => {
            let world = source.world().await?;
            let dates = source.dates().await?;
            let days = timeline::collect(&source, &world, &dates, settings.building_match()).await;
            print!("{}", timeline::table(&days));
        }
        Command::Status => println!("{}", source.sync_state().await?),
        Command::Control { verb } => match settings.admin_client()?.control(&verb).await? {
            ControlOutcome::Accepted(reply) => println!("{}", reply),
            ControlOutcome::Rejected(reason) => {
                anyhow::bail!("Command '{}' rejected: {}", verb, reason)
            }
        },
        Command::Ban { guid, days, hours } => {
            settings
                .admin_client()?
                .ban(&guid, BanDuration { days, hours })
                .await?;
            println!("Banned {} for {} days {} hours", guid, days, hours);
        }
        Command::Unban { guid } => {
            settings.admin_client()?.unban(&guid).await?;
            println!("Lifted ban of {}", guid);
        }
        Command::Pilots(args) => {
            for pilot in source.pilots(&PilotFilter::from(args)).await? {
                println!(
                    "{:<12} {:<6} {:<28} {:<12} {:>4} flights {:>3} kills  {}",
                    pilot.id,
                    pilot.rank_abbrev,
                    pilot.full_name(),
                    pilot.country,
                    pilot.flights,
                    pilot.air_kills,
                    pilot.health
                );
            }
        }
        Command::Players { name } => {
            for player in source.players(name.as_deref()).await? {
                println!(
                    "{:<24} {} ({} pilots)",
                    player.name,
                    player.guid.guid,
                    player.pilots.len()
                );
            }
        }
        Command::Pilot { id } => {
            let record = source.pilot(&id).await?;
            println!("{} ({})", record.pilot.full_name(), record.pilot.health);
            println!("Last status: {}", record.last_status());
            for mission in &record.missions {
                println!(
                    "  {} {} from {}: {}",
                    mission.start_date, mission.plane, mission.start_airfield, mission.return_status
                );
            }
        }
        Command::Online => {
            let online = source.online().await?;
            println!("{} players online", online.players.len());
            for name in &online.players {
                println!("  {}", name);
            }
        }
        Command::Scenarios => {
            for scenario in source.scenarios().await? {
                println!("{}", scenario);
            }
        }
        Command::Region { day, id } => {
            let (supplies, capacity) = tokio::try_join!(
                source.region_supplies(day, &id),
                source.region_capacity(day, &id)
            )?;
            println!("{}: supplies {:.0} m^3/h, storage {:.0} m^3", id, supplies, capacity);
        }
        Command::Airfield { day, id } => {
            let capacity = source.airfield_capacity(day, &id).await?;
            println!("{}: storage {:.0} m^3", id, capacity);
        }
        Command::Transport { day, from, to } => {
            let capacity = source.land_transport(day, &from, &to).await?;
            println!("{} -> {}: {:.0} m^3/h by land", from, to, capacity);
        }
        Command::Export { day, output } => {
            let world = source.world().await?;
            let dates = source.dates().await?;
            let mut navigator = DayNavigator::new(dates.len());
            let selection = day.map(DaySelection::Day).unwrap_or(DaySelection::Latest);
            let request = navigator.select(selection)?;
            let state = source.state(request.day).await?;
            let transform = WorldTransform::for_world(&world);
            let collection = export::feature_collection(
                &world,
                &transform,
                &state,
                settings.building_match(),
            );
            export::write_geojson(&output, collection)?;
            println!("Wrote {} ({})", output.display(), dates[request.day]);
        }
    }
    Ok(())
}

/// Spawns fetches on the runtime and reports their results over a channel
struct Fetcher {
    handle: Handle,
    source: Arc<WebDataSource>,
    tx: mpsc::UnboundedSender<Fetched>,
}

impl Fetcher {
    fn world(&self) {
        let (source, tx) = (self.source.clone(), self.tx.clone());
        self.handle.spawn(async move {
            let (world, dates) = tokio::join!(source.world(), source.dates());
            let fetched = match (world, dates) {
                (Ok(world), Ok(dates)) => Fetched::World { world, dates },
                (Err(e), _) | (_, Err(e)) => {
                    tracing::error!(error = %e, "Failed to load campaign");
                    Fetched::Failed(format!("Failed to load campaign: {}", e))
                }
            };
            let _ = tx.send(fetched);
        });
    }

    fn day(&self, request: DayRequest) {
        let (source, tx) = (self.source.clone(), self.tx.clone());
        self.handle.spawn(async move {
            let data = load_day(source.as_ref(), request.day).await;
            let _ = tx.send(Fetched::Day { request, data });
        });
    }

    fn timeline(&self, app: &App) {
        let Some(world) = app.world.clone() else {
            return;
        };
        let dates = app.dates.clone();
        let matching: BuildingMatch = app.matching();
        let (source, tx) = (self.source.clone(), self.tx.clone());
        self.handle.spawn(async move {
            let days = timeline::collect(source.as_ref(), &world, &dates, matching).await;
            let _ = tx.send(Fetched::Timeline(days));
        });
    }

    fn sync_state(&self) {
        let (source, tx) = (self.source.clone(), self.tx.clone());
        self.handle.spawn(async move {
            let fetched = match source.sync_state().await {
                Ok(state) => Fetched::SyncState(state),
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to fetch sync state");
                    Fetched::Failed(format!("Sync state unavailable: {}", e))
                }
            };
            let _ = tx.send(fetched);
        });
    }
}

fn run_dashboard(settings: &Settings, runtime: &Runtime) -> Result<()> {
    tracing::info!(server = %settings.server_url, "Starting dashboard");
    let (tx, rx) = mpsc::unbounded_channel();
    let fetcher = Fetcher {
        handle: runtime.handle().clone(),
        source: Arc::new(settings.data_source()),
        tx,
    };

    // Initialize terminal
    let mut terminal = ratatui::init();
    terminal.clear()?;

    // Enable mouse capture
    execute!(std::io::stdout(), EnableMouseCapture)?;

    let result = run_loop(&mut terminal, &fetcher, rx, settings.building_match());

    // Disable mouse capture and restore terminal
    let _ = execute!(std::io::stdout(), DisableMouseCapture);
    ratatui::restore();

    result
}

/// Handle mouse events for panning, zooming and popups
fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    // Always track mouse position for cursor marker
    app.set_mouse_pos(mouse.column, mouse.row);

    match mouse.kind {
        // Scroll wheel for zooming towards mouse position
        MouseEventKind::ScrollUp => app.zoom_in_at(mouse.column, mouse.row),
        MouseEventKind::ScrollDown => app.zoom_out_at(mouse.column, mouse.row),
        // Horizontal scroll for panning (trackpad two-finger swipe)
        MouseEventKind::ScrollLeft => app.pan(-15, 0),
        MouseEventKind::ScrollRight => app.pan(15, 0),
        // Click opens the popup of a marker; dragging pans
        MouseEventKind::Down(MouseButton::Left) => {
            app.click(mouse.column, mouse.row);
            app.last_mouse = Some((mouse.column, mouse.row));
        }
        MouseEventKind::Drag(MouseButton::Left) => {
            app.handle_drag(mouse.column, mouse.row);
        }
        MouseEventKind::Up(MouseButton::Left) => {
            app.end_drag();
        }
        _ => {}
    }
}

fn run_loop(
    terminal: &mut DefaultTerminal,
    fetcher: &Fetcher,
    mut rx: mpsc::UnboundedReceiver<Fetched>,
    matching: BuildingMatch,
) -> Result<()> {
    let size = terminal.size()?;
    let mut app = App::new(
        ui::map_inner(Rect::new(0, 0, size.width, size.height)),
        matching,
    );
    fetcher.world();

    loop {
        // Apply finished fetches
        while let Ok(fetched) = rx.try_recv() {
            if let Some(request) = app.apply(fetched) {
                fetcher.day(request);
            }
        }

        terminal.draw(|frame| ui::render(frame, &app))?;

        // Handle events with ~60fps target
        if event::poll(Duration::from_millis(16))? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => match key.code {
                    KeyCode::Char('q') => app.quit(),
                    KeyCode::Esc => {
                        if !app.close_popup() {
                            app.quit();
                        }
                    }

                    // Lists
                    KeyCode::Tab => app.toggle_focus(),
                    KeyCode::Char('j') => app.move_cursor(1),
                    KeyCode::Char('k') => app.move_cursor(-1),
                    KeyCode::Enter => {
                        if let Some(request) = app.select_cursor_day() {
                            fetcher.day(request);
                        }
                    }
                    KeyCode::Char('n') => {
                        if let Some(request) = app.step_day(1) {
                            fetcher.day(request);
                        }
                    }
                    KeyCode::Char('p') => {
                        if let Some(request) = app.step_day(-1) {
                            fetcher.day(request);
                        }
                    }

                    // Pan with arrow keys
                    KeyCode::Left => app.pan(-10, 0),
                    KeyCode::Right => app.pan(10, 0),
                    KeyCode::Up => app.pan(0, -6),
                    KeyCode::Down => app.pan(0, 6),

                    // Zoom
                    KeyCode::Char('+') | KeyCode::Char('=') => app.zoom_in(),
                    KeyCode::Char('-') | KeyCode::Char('_') => app.zoom_out(),

                    // Layer toggles
                    KeyCode::Char('b') | KeyCode::Char('B') => app.renderer.toggle_borders(),
                    KeyCode::Char('m') | KeyCode::Char('M') => app.renderer.toggle_markers(),
                    KeyCode::Char('L') | KeyCode::Char('l') => app.renderer.toggle_labels(),

                    KeyCode::Char('g') | KeyCode::Char('G') => {
                        if app.toggle_screen() {
                            fetcher.timeline(&app);
                        }
                    }
                    KeyCode::Char('s') | KeyCode::Char('S') => fetcher.sync_state(),
                    KeyCode::Char('r') | KeyCode::Char('0') => app.reset_view(),
                    _ => {}
                },
                Event::Mouse(mouse) => handle_mouse(&mut app, mouse),
                Event::Resize(width, height) => {
                    app.set_map_area(ui::map_inner(Rect::new(0, 0, width, height)));
                }
                _ => {}
            }
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}
