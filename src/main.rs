use anyhow::{Context, Result};
use chrono::Local;
use clap::{Parser, Subcommand};
use pricegrid::report;
use pricegrid::selection::{fuel_options, maker_options, model_options};
use pricegrid::serve::{self, DashboardConfig, Dataset};
use pricegrid::{load_table, AgeScale, Measure, Selection};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "pricegrid")]
#[command(
    author,
    version,
    about = "Used-car price distribution dashboard over MOLIT transfer statistics"
)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the interactive dashboard in the browser
    Serve {
        /// Statistics files, as PATH or LABEL=PATH (one per data-quality tier)
        #[arg(required = true)]
        datasets: Vec<Dataset>,

        /// Port to listen on
        #[arg(short, long, default_value = "3001")]
        port: u16,

        /// Don't open the browser
        #[arg(long)]
        no_open: bool,

        /// Age bucket granularity: coarse (11 buckets) or fine (21 buckets)
        #[arg(long, default_value = "coarse")]
        age_scale: AgeScale,
    },

    /// List the options of the next cascading picker
    Options {
        /// Statistics file (.xlsx, .csv)
        file: PathBuf,

        /// Chosen manufacturer (lists models)
        #[arg(long)]
        maker: Option<String>,

        /// Chosen model (lists fuels, requires --maker)
        #[arg(long, requires = "maker")]
        model: Option<String>,
    },

    /// Write a static dashboard page for one selection
    Render {
        /// Statistics file (.xlsx, .csv)
        file: PathBuf,

        #[arg(long)]
        maker: String,

        #[arg(long)]
        model: String,

        #[arg(long)]
        fuel: String,

        /// Statistic column set: plain, price or depreciation
        #[arg(long)]
        measure: Option<Measure>,

        /// Age bucket granularity: coarse (11 buckets) or fine (21 buckets)
        #[arg(long, default_value = "coarse")]
        age_scale: AgeScale,

        /// Output file (default: pricegrid_<timestamp>.html)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let code = match run(args.command) {
        Ok(code) => code,
        Err(e) => {
            log::error!("{:#}", e);
            1
        }
    };
    std::process::exit(code);
}

fn run(command: Command) -> Result<i32> {
    match command {
        Command::Serve {
            datasets,
            port,
            no_open,
            age_scale,
        } => {
            let config = DashboardConfig {
                datasets,
                port,
                open_browser: !no_open,
                age_scale,
            };
            serve::start(config).context("server error")?;
            Ok(0)
        }

        Command::Options { file, maker, model } => {
            let table = load_table(&file)
                .with_context(|| format!("failed to load {}", file.display()))?;
            let options = match (maker.as_deref(), model.as_deref()) {
                (Some(maker), Some(model)) => fuel_options(&table, maker, model),
                (Some(maker), None) => model_options(&table, maker),
                _ => maker_options(&table),
            };
            if options.is_empty() {
                eprintln!("No options for this selection.");
            }
            for option in options {
                println!("{}", option);
            }
            Ok(0)
        }

        Command::Render {
            file,
            maker,
            model,
            fuel,
            measure,
            age_scale,
            output,
        } => {
            let table = load_table(&file)
                .with_context(|| format!("failed to load {}", file.display()))?;
            table.warn_unknown_buckets(age_scale);

            let selection = Selection::new(&maker, &model, &fuel);
            let view = report::build_view(&table, selection, measure, age_scale)
                .generated_at(Local::now().format("%Y-%m-%d %H:%M").to_string());

            let output = output.unwrap_or_else(|| {
                let timestamp = Local::now().format("%Y%m%d_%H%M%S");
                PathBuf::from(format!("pricegrid_{}.html", timestamp))
            });
            report::generate(&output, &view)
                .with_context(|| format!("failed to write {}", output.display()))?;
            eprintln!("\x1b[32mReport saved: {}\x1b[0m", output.display());

            if view.has_data() {
                Ok(0)
            } else {
                eprintln!("\x1b[33m{}\x1b[0m", report::html::NO_DATA);
                Ok(2)
            }
        }
    }
}
