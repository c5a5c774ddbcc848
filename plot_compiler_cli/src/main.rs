use std::error::Error;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::process;

use clap::{Args, Parser, Subcommand};
use log::info;
use plot_compiler::grid::GridFrame;
use plot_compiler::io::{write_atomically, DelimitedWriter};
use plot_compiler::render::{RenderSink, SvgRenderer};
use plot_compiler::store::{create_plot_database, MemoryStore, SqliteStore, PLOT_TABLE};
use plot_compiler::{CompileReport, PlotCompiler, RunConfig};

/// Diameters are recorded in centimetres and distances in metres.
const FIELD_DIAMETER_SCALE: f64 = 0.01;

#[derive(Parser)]
#[command(author, version, about = "Forest plot tree positioning")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Derive diameters and coordinates for every tree of a plot.
    Compile {
        /// SQLite plot database, or a delimited file ending in .csv or .txt.
        input: PathBuf,
        /// Destination of the compiled delimited file.
        output: PathBuf,
        /// JSON run configuration; flags given on the command line win.
        #[arg(long)]
        config: Option<PathBuf>,
        /// Table holding the plot records.
        #[arg(long)]
        table: Option<String>,
        /// Overwrite existing outputs.
        #[arg(long)]
        force: bool,
        #[command(flatten)]
        options: RunOptions,
    },
    /// Create an empty plot database with grid posts and tree ids.
    Generate {
        db: PathBuf,
        start: u32,
        end: u32,
        #[arg(long)]
        force: bool,
    },
    /// Print the grid posts as label,x,y lines.
    Grid {
        #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
        plot_azimuth: f64,
        #[arg(long)]
        north_oriented: bool,
        #[arg(long)]
        letters_abscissa: bool,
        #[arg(long)]
        number_first_labels: bool,
    },
    /// Write a run configuration file with field defaults.
    InitConfig {
        path: PathBuf,
        #[arg(long, allow_hyphen_values = true)]
        plot_azimuth: f64,
        #[arg(long)]
        force: bool,
    },
}

/// Run options given on the command line. Each switch has a `--no-…` form
/// that clears a value set in the configuration file.
#[derive(Args)]
struct RunOptions {
    #[arg(long, allow_hyphen_values = true)]
    plot_azimuth: Option<f64>,
    #[arg(long, overrides_with = "no_north_oriented")]
    north_oriented: bool,
    #[arg(long, overrides_with = "north_oriented")]
    no_north_oriented: bool,
    #[arg(long, overrides_with = "no_relative")]
    relative: bool,
    #[arg(long, overrides_with = "relative")]
    no_relative: bool,
    #[arg(long, overrides_with = "no_letters_abscissa")]
    letters_abscissa: bool,
    #[arg(long, overrides_with = "letters_abscissa")]
    no_letters_abscissa: bool,
    #[arg(long, overrides_with = "no_number_first_labels")]
    number_first_labels: bool,
    #[arg(long, overrides_with = "number_first_labels")]
    no_number_first_labels: bool,
    #[arg(long)]
    csv_separator: Option<char>,
    /// Render the plot as SVG to this path.
    #[arg(long)]
    output_plot: Option<PathBuf>,
    #[arg(long)]
    diameter_scale: Option<f64>,
    #[arg(long)]
    fallback_diameter: Option<f64>,
    #[arg(long)]
    max_chain_depth: Option<usize>,
    /// Keep records with malformed measurements instead of failing.
    #[arg(long, overrides_with = "no_lenient")]
    lenient: bool,
    #[arg(long, overrides_with = "lenient")]
    no_lenient: bool,
}

/// Value of a switch given as `--name`/`--no-name`, or `current` if neither.
fn switch(current: bool, on: bool, off: bool) -> bool {
    if on {
        true
    } else if off {
        false
    } else {
        current
    }
}

impl RunOptions {
    /// Applies the options on top of `config`, or on top of field defaults
    /// when no configuration file was given.
    fn into_config(self, config: Option<RunConfig>) -> Result<RunConfig, Box<dyn Error>> {
        let mut config = match (config, self.plot_azimuth) {
            (Some(mut config), azimuth) => {
                if let Some(azimuth) = azimuth {
                    config.plot_azimuth = azimuth;
                }
                config
            }
            (None, Some(azimuth)) => field_config(azimuth),
            (None, None) => return Err("--plot-azimuth or --config is required".into()),
        };
        config.north_oriented = switch(
            config.north_oriented,
            self.north_oriented,
            self.no_north_oriented,
        );
        config.relative = switch(config.relative, self.relative, self.no_relative);
        config.letters_abscissa = switch(
            config.letters_abscissa,
            self.letters_abscissa,
            self.no_letters_abscissa,
        );
        config.number_first_labels = switch(
            config.number_first_labels,
            self.number_first_labels,
            self.no_number_first_labels,
        );
        config.lenient = switch(config.lenient, self.lenient, self.no_lenient);
        if let Some(sep) = self.csv_separator {
            config.csv_separator = sep;
        }
        if let Some(path) = self.output_plot {
            config.output_render_path = Some(path);
        }
        if let Some(scale) = self.diameter_scale {
            config.diameter_scale = scale;
        }
        if let Some(diameter) = self.fallback_diameter {
            config.fallback_diameter = diameter;
        }
        if let Some(depth) = self.max_chain_depth {
            config.max_chain_depth = depth;
        }
        Ok(config)
    }
}

fn field_config(plot_azimuth: f64) -> RunConfig {
    let mut config = RunConfig::new(plot_azimuth);
    config.diameter_scale = FIELD_DIAMETER_SCALE;
    config
}

fn is_delimited(path: &Path) -> bool {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    matches!(extension.as_deref(), Some("csv") | Some("txt"))
}

fn refuse_overwrite(path: &Path, force: bool) -> Result<(), Box<dyn Error>> {
    if path.exists() && !force {
        return Err(format!("{} already exists, use --force to overwrite", path.display()).into());
    }
    Ok(())
}

fn compile_plot(
    input: &Path,
    output: &Path,
    config_path: Option<&Path>,
    table: Option<&str>,
    force: bool,
    options: RunOptions,
) -> Result<CompileReport, Box<dyn Error>> {
    let loaded = config_path.map(RunConfig::load).transpose()?;
    let config = options.into_config(loaded)?;
    if input == output {
        return Err("input and output must differ".into());
    }
    refuse_overwrite(output, force)?;
    if let Some(render) = &config.output_render_path {
        refuse_overwrite(render, force)?;
    }

    let store = if is_delimited(input) {
        MemoryStore::open_delimited(input, config.csv_separator)?
    } else {
        let db = SqliteStore::open_table(input, table.unwrap_or(PLOT_TABLE))?;
        MemoryStore::snapshot(&db)?
    };
    info!("loaded {} records from {}", store.len(), input.display());

    let mut renderer = config.output_render_path.clone().map(SvgRenderer::new);
    let compiler = PlotCompiler::new(config);
    let report = write_atomically(output, |file| {
        let separator = compiler.config().csv_separator;
        let mut writer = DelimitedWriter::new(BufWriter::new(file), separator);
        let render = renderer.as_mut().map(|r| r as &mut dyn RenderSink);
        let report = compiler.compile(&store, &mut writer, render)?;
        writer.flush()?;
        Ok::<_, plot_compiler::Error>(report)
    })?;
    Ok(report)
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();
    match cli.command {
        Commands::Compile {
            input,
            output,
            config,
            table,
            force,
            options,
        } => match compile_plot(
            &input,
            &output,
            config.as_deref(),
            table.as_deref(),
            force,
            options,
        ) {
            Ok(report) => {
                for warning in &report.warnings {
                    eprintln!("Warning: {}", warning);
                }
                println!(
                    "Compiled {} rows ({} trees positioned) to {}",
                    report.rows_written,
                    report.positioned,
                    output.display()
                );
            }
            Err(e) => {
                eprintln!("Error: {}", e);
                process::exit(1);
            }
        },
        Commands::Generate {
            db,
            start,
            end,
            force,
        } => {
            let created = refuse_overwrite(&db, force).and_then(|()| {
                create_plot_database(&db, start, end)?;
                Ok(())
            });
            match created {
                Ok(()) => println!("Created {} with trees {}..={}", db.display(), start, end),
                Err(e) => {
                    eprintln!("Error: {}", e);
                    process::exit(1);
                }
            }
        }
        Commands::Grid {
            plot_azimuth,
            north_oriented,
            letters_abscissa,
            number_first_labels,
        } => {
            let mut config = RunConfig::new(plot_azimuth);
            config.north_oriented = north_oriented;
            config.letters_abscissa = letters_abscissa;
            config.number_first_labels = number_first_labels;
            let grid = GridFrame::from_config(&config);
            for anchor in grid.anchors() {
                let p = grid.position(anchor);
                println!("{},{:.3},{:.3}", anchor.label, p.x, p.y);
            }
        }
        Commands::InitConfig {
            path,
            plot_azimuth,
            force,
        } => {
            let saved = refuse_overwrite(&path, force)
                .and_then(|()| Ok(field_config(plot_azimuth).save(&path)?));
            match saved {
                Ok(()) => println!("Wrote {}", path.display()),
                Err(e) => {
                    eprintln!("Error: {}", e);
                    process::exit(1);
                }
            }
        }
    }
}
