use std::path::PathBuf;

use anyhow::{anyhow, Context};
use clap::Parser;
use log::info;
use maze::{Maze, MazeConfig, MazeObserver, NoopObserver, PathResult};

mod canvas;

use canvas::Canvas;

#[derive(Parser, Debug)]
#[command(version, about = "Generate and solve rectangular mazes", long_about = None)]
struct Args {
    /// JSON file with a maze configuration, the flags below override its fields
    #[arg(long)]
    config: Option<PathBuf>,

    /// Number of columns
    #[arg(long)]
    cols: Option<usize>,

    /// Number of rows
    #[arg(long)]
    rows: Option<usize>,

    /// Width and height of a cell in pixels
    #[arg(long, value_parser = clap::value_parser!(i32).range(1..))]
    cell_size: Option<i32>,

    /// Random seed, omit for a different maze every time
    #[arg(long)]
    seed: Option<u64>,

    /// Number of mazes to generate and solve in a row
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    runs: u32,

    /// Write a drawing of the last maze and its solution to this PNG file
    #[arg(long)]
    png: Option<PathBuf>,

    /// Do not print the mazes
    #[arg(long)]
    quiet: bool,
}

fn load_config(args: &Args) -> Result<MazeConfig, anyhow::Error> {
    let mut config: MazeConfig = match &args.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            serde_json::from_str(&text)
                .with_context(|| format!("failed to parse {}", path.display()))?
        }
        None => MazeConfig::default(),
    };

    if let Some(cols) = args.cols {
        config.num_cols = cols;
    }
    if let Some(rows) = args.rows {
        config.num_rows = rows;
    }
    if let Some(size) = args.cell_size {
        config.cell_size_x = size;
        config.cell_size_y = size;
    }
    if args.seed.is_some() {
        config.seed = args.seed;
    }

    config.validate()?;
    Ok(config)
}

/// The configuration of run number `run`: a fixed seed is offset by the run index so consecutive
/// runs still get different mazes
fn config_for_run(base: &MazeConfig, run: u32) -> MazeConfig {
    MazeConfig {
        seed: base.seed.map(|seed| seed.wrapping_add(run as u64)),
        ..base.clone()
    }
}

fn generate_and_solve<O: MazeObserver>(
    config: &MazeConfig,
    observer: O,
) -> Result<(Maze<O>, PathResult), anyhow::Error> {
    let mut maze = Maze::with_observer(config, observer)?;
    maze.generate();
    maze.draw();

    let result = maze.find_path()?.ok_or_else(|| {
        anyhow!(
            "no path through the {}x{} maze",
            maze.num_cols(),
            maze.num_rows()
        )
    })?;
    Ok((maze, result))
}

fn main() -> Result<(), anyhow::Error> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let base = load_config(&args)?;

    for run in 0..args.runs {
        let config = config_for_run(&base, run);
        if run > 0 {
            info!("regenerating ({}/{})", run + 1, args.runs);
        }

        let last = run + 1 == args.runs;
        match (&args.png, last) {
            (Some(png), true) => {
                let canvas = Canvas::for_config(&config)?;
                let (maze, result) = generate_and_solve(&config, canvas)?;
                if !args.quiet {
                    println!("{}", maze.display_path(&result.path));
                }
                info!("solver took {} steps", maze.observer().ticks());
                maze.into_observer()
                    .save(png)
                    .with_context(|| format!("failed to write {}", png.display()))?;
                info!("wrote {}", png.display());
            }
            _ => {
                let (maze, result) = generate_and_solve(&config, NoopObserver)?;
                if !args.quiet {
                    println!("{}", maze.display_path(&result.path));
                }
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use maze::MazeError;

    fn parse_args(args: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("mazesolver").chain(args.iter().copied())).unwrap()
    }

    fn write_config(name: &str, text: &str) -> PathBuf {
        let file = format!("mazesolver-{}-{}.json", std::process::id(), name);
        let path = std::env::temp_dir().join(file);
        std::fs::write(&path, text).unwrap();
        path
    }

    #[test]
    fn test_defaults_without_flags() {
        let args = parse_args(&[]);
        assert_eq!(args.runs, 1);
        assert_eq!(load_config(&args).unwrap(), MazeConfig::default());
    }

    #[test]
    fn test_flags_override_defaults() {
        let args = parse_args(&["--cols", "7", "--rows", "3", "--cell-size", "12", "--seed", "5"]);
        let config = load_config(&args).unwrap();

        assert_eq!(
            config,
            MazeConfig {
                num_cols: 7,
                num_rows: 3,
                cell_size_x: 12,
                cell_size_y: 12,
                seed: Some(5),
                ..MazeConfig::default()
            }
        );
    }

    #[test]
    fn test_config_file_with_overrides() {
        let path = write_config("overrides", r#"{ "num_cols": 9, "num_rows": 4, "seed": 1 }"#);
        let file = path.to_str().unwrap();

        // missing fields fall back to the defaults
        let config = load_config(&parse_args(&["--config", file])).unwrap();
        assert_eq!(
            config,
            MazeConfig {
                num_cols: 9,
                num_rows: 4,
                seed: Some(1),
                ..MazeConfig::default()
            }
        );

        // flags win over the file
        let config = load_config(&parse_args(&["--config", file, "--rows", "6", "--seed", "8"]))
            .unwrap();
        assert_eq!((config.num_cols, config.num_rows, config.seed), (9, 6, Some(8)));

        std::fs::remove_file(path).unwrap();
    }

    #[test]
    fn test_zero_columns_rejected() {
        let err = load_config(&parse_args(&["--cols", "0"])).unwrap_err();
        assert_eq!(
            err.downcast_ref::<MazeError>(),
            Some(&MazeError::DegenerateGrid {
                num_cols: 0,
                num_rows: 15
            })
        );
    }

    #[test]
    fn test_invalid_config_file() {
        let path = write_config("invalid", "{ \"num_cols\": \"many\" }");
        let args = parse_args(&["--config", path.to_str().unwrap()]);
        assert!(load_config(&args).is_err());
        std::fs::remove_file(path).unwrap();

        let args = parse_args(&["--config", "/nonexistent/mazesolver.json"]);
        assert!(load_config(&args).is_err());
    }

    #[test]
    fn test_runs_offset_seed() {
        let base = MazeConfig::new(4, 4).with_seed(10);
        assert_eq!(config_for_run(&base, 0).seed, Some(10));
        assert_eq!(config_for_run(&base, 3).seed, Some(13));
        assert_eq!(config_for_run(&base, 3).num_cols, 4);

        let max = MazeConfig::new(4, 4).with_seed(u64::MAX);
        assert_eq!(config_for_run(&max, 1).seed, Some(0));

        let unseeded = MazeConfig::new(4, 4);
        assert_eq!(config_for_run(&unseeded, 2).seed, None);
    }

    #[test]
    fn test_zero_runs_rejected() {
        let result = Args::try_parse_from(["mazesolver", "--runs", "0"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_generate_and_solve() {
        let config = MazeConfig::new(6, 5).with_seed(2);
        let (maze, result) = generate_and_solve(&config, NoopObserver).unwrap();
        assert!(maze.is_perfect());
        assert_eq!(result.path.first(), Some(&maze::Point::new(0, 0)));
        assert_eq!(result.path.last(), Some(&maze::Point::new(5, 4)));
    }
}
