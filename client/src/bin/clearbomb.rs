use anyhow::{Context, bail};
use clap::{Parser, ValueEnum};
use clearbomb_client::*;
use clearbomb_core::{
    BoardGeometry, BoardView, CellRange, CellState, Difficulty, GameConfig, GameStatus, Point,
};
use clearbomb_protocol::GameService;
use futures_executor::block_on;
use std::io::{self, BufRead, Write};
use std::str::FromStr;
use std::time::{Duration, Instant};

#[derive(Copy, Clone, Debug, ValueEnum)]
enum Preset {
    Beginner,
    Intermediate,
    Expert,
}

impl From<Preset> for Difficulty {
    fn from(preset: Preset) -> Self {
        match preset {
            Preset::Beginner => Self::Beginner,
            Preset::Intermediate => Self::Intermediate,
            Preset::Expert => Self::Expert,
        }
    }
}

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// What log level to use
    #[command(flatten)]
    verbose: clap_verbosity_flag::Verbosity,

    /// Force a seed instead of random
    #[arg(short, long)]
    seed: Option<u64>,

    /// Board preset, ignored when a custom size is given
    #[arg(short, long, value_enum, default_value_t = Preset::Intermediate)]
    difficulty: Preset,

    #[arg(long, requires_all = ["columns", "mines"])]
    rows: Option<u32>,

    #[arg(long, requires_all = ["rows", "mines"])]
    columns: Option<u32>,

    #[arg(long, requires_all = ["rows", "columns"])]
    mines: Option<u32>,

    /// Size of a cell in pixels, used by `drag`
    #[arg(long, default_value_t = 32.0)]
    cell_size: f64,
}

impl Args {
    fn config(&self) -> anyhow::Result<GameConfig> {
        match (self.rows, self.columns, self.mines) {
            (Some(rows), Some(columns), Some(mines)) => {
                Ok(GameConfig::new(rows, columns, mines)?)
            }
            _ => Difficulty::from(self.difficulty)
                .config()
                .context("preset without a board size"),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
enum Command {
    Reveal(u8, u8),
    Flag(u8, u8),
    Mark(CellRange),
    Drag(Point, Point),
    New(Option<(u32, u32, u32)>),
    Show,
    Help,
    Quit,
}

impl FromStr for Command {
    type Err = anyhow::Error;

    fn from_str(line: &str) -> anyhow::Result<Self> {
        let mut words = line.split_whitespace();
        let Some(verb) = words.next() else {
            return Ok(Self::Show);
        };
        let args: Vec<&str> = words.collect();

        let command = match (verb, args.as_slice()) {
            ("r" | "reveal", [row, column]) => Self::Reveal(row.parse()?, column.parse()?),
            ("f" | "flag", [row, column]) => Self::Flag(row.parse()?, column.parse()?),
            ("m" | "mark", [r0, c0, r1, c1]) => Self::Mark(CellRange::spanning(
                (r0.parse()?, c0.parse()?),
                (r1.parse()?, c1.parse()?),
            )),
            ("d" | "drag", [x0, y0, x1, y1]) => Self::Drag(
                Point::new(x0.parse()?, y0.parse()?),
                Point::new(x1.parse()?, y1.parse()?),
            ),
            ("n" | "new", []) => Self::New(None),
            ("n" | "new", [rows, columns, mines]) => {
                Self::New(Some((rows.parse()?, columns.parse()?, mines.parse()?)))
            }
            ("s" | "show", []) => Self::Show,
            ("?" | "h" | "help", _) => Self::Help,
            ("q" | "quit", []) => Self::Quit,
            _ => bail!("unknown command {line:?}, try `help`"),
        };
        Ok(command)
    }
}

const HELP: &str = "\
commands:
  r ROW COL            reveal a cell
  f ROW COL            toggle a flag
  m R0 C0 R1 C1        auto-mark the cells between two corners
  d X0 Y0 X1 Y1        auto-mark the cells under a pointer drag (pixels)
  n [ROWS COLS MINES]  start a new game
  s                    show the board
  q                    quit";

fn render(view: &BoardView, elapsed_secs: u32, out: &mut impl Write) -> io::Result<()> {
    writeln!(
        out,
        "{:?}  mines left: {}  time: {}s  {:?}",
        view.difficulty, view.mines_left, elapsed_secs, view.status
    )?;
    write!(out, "    ")?;
    for column in 0..view.columns {
        write!(out, "{:>3}", column)?;
    }
    writeln!(out)?;

    for row in 0..view.rows {
        write!(out, "{:>3} ", row)?;
        for column in 0..view.columns {
            let glyph = match view.cell((row, column)) {
                Some(cell) if cell.mine => '*',
                Some(cell) => match (cell.state, cell.adjacent_mines) {
                    (CellState::Hidden, _) => '#',
                    (CellState::Flagged, _) => 'F',
                    (CellState::Revealed, Some(0)) => '.',
                    (CellState::Revealed, Some(count)) => char::from(b'0' + count),
                    (CellState::Revealed, None) => '?',
                },
                None => ' ',
            };
            write!(out, "{:>3}", glyph)?;
        }
        writeln!(out)?;
    }

    match view.status {
        GameStatus::Victory => writeln!(out, "You win!")?,
        GameStatus::Defeat => writeln!(out, "Boom.")?,
        _ => {}
    }
    Ok(())
}

/// Catches the client and service timers up with wall time.
fn catch_up(client: &SyncClient<LocalTransport>, last_tick: &mut Instant) -> anyhow::Result<()> {
    const SECOND: Duration = Duration::from_secs(1);

    while last_tick.elapsed() >= SECOND {
        *last_tick += SECOND;
        client.tick();
        client.transport().with_service(GameService::tick)?;
    }
    Ok(())
}

fn run(args: Args) -> anyhow::Result<()> {
    let config = args.config()?;
    let service = match args.seed {
        Some(seed) => GameService::with_seed(config, seed)?,
        None => GameService::new(config)?,
    };
    let geometry = BoardGeometry {
        cell_size: args.cell_size,
        origin: Point::new(0.0, 0.0),
    };

    let client = block_on(SyncClient::connect(LocalTransport::new(service), config))?;
    let mut tracker = SelectionTracker::new();
    let mut last_tick = Instant::now();

    let stdout = io::stdout();
    let mut out = stdout.lock();
    render(&client.view(), client.elapsed_secs(), &mut out)?;
    writeln!(out, "{HELP}")?;

    for line in io::stdin().lock().lines() {
        let line = line?;
        catch_up(&client, &mut last_tick)?;

        let command = match line.parse::<Command>() {
            Ok(command) => command,
            Err(err) => {
                writeln!(out, "{err}")?;
                continue;
            }
        };
        log::debug!("command: {:?}", command);

        let result = match command {
            Command::Reveal(row, column) => block_on(client.reveal((row, column))),
            Command::Flag(row, column) => block_on(client.flag((row, column))),
            Command::Mark(range) => block_on(client.auto_mark_cells(range)),
            Command::Drag(from, to) => {
                tracker.begin(from);
                let view = client.view();
                log::debug!("dragging over {:?}", tracker.cells(geometry, view.rows, view.columns));
                match tracker.end(to) {
                    Some(rect) => block_on(client.auto_mark(rect, geometry)),
                    None => Ok(Reconciled::Unchanged),
                }
            }
            Command::New(size) => {
                let config = size
                    .map(|(rows, columns, mines)| GameConfig::new(rows, columns, mines))
                    .transpose();
                match config {
                    Ok(config) => {
                        last_tick = Instant::now();
                        block_on(client.reset(config))
                    }
                    Err(err) => Err(err.into()),
                }
            }
            Command::Show => block_on(client.refresh()),
            Command::Help => {
                writeln!(out, "{HELP}")?;
                continue;
            }
            Command::Quit => break,
        };

        if let Err(err) = result {
            log::warn!("{}", err);
            writeln!(out, "{err}")?;
        }
        render(&client.view(), client.elapsed_secs(), &mut out)?;
    }

    Ok(())
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_max_level(args.verbose.tracing_level_filter())
        .with_writer(io::stderr)
        .init();
    log::debug!("seed: {:?}", args.seed);

    run(args)
}
