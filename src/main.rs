pub mod api;
extern crate clap;
pub mod calculators;
pub mod chart;
pub mod config;
pub mod dates;
pub mod discord;
pub mod project;
pub mod queries;
pub mod stats;
pub mod types;

use std::io::{self, Write};
use std::process;

use chrono::{DateTime, Utc};
use clap::{App, Arg, ArgMatches};
use log::{debug, info, warn};

use crate::calculators::{BurndownCalculator, Policy};
use crate::chart::{color_cycle, BurndownChart, BurndownChartData, ChartSeries};
use crate::config::{Config, ConfigError, ProjectType};
use crate::stats::ProjectStats;
extern crate log;

#[tokio::main]
async fn main() {
    env_logger::init();

    let matches = App::new("Burndown Chart Builder")
        .version("0.3")
        .arg(
            Arg::with_name("type")
                .short("t")
                .long("type")
                .value_name("type")
                .takes_value(true)
                .possible_values(&["repository", "organization", "user"])
                .help("The type of project to generate a burndown chart for.")
                .required(true),
        )
        .arg(
            Arg::with_name("name")
                .short("n")
                .long("name")
                .value_name("name")
                .takes_value(true)
                .help("The name of the project as it appears in the config.json")
                .required(true),
        )
        .arg(
            Arg::with_name("sprint")
                .short("s")
                .long("sprint")
                .value_name("sprint")
                .takes_value(true)
                .help("The name of the sprint.")
                .required(true),
        )
        .arg(
            Arg::with_name("filepath")
                .long("filepath")
                .value_name("filepath")
                .takes_value(true)
                .help("The filepath where the burndown chart is saved.")
                .default_value("./burndown.svg"),
        )
        .arg(
            Arg::with_name("sprint_start")
                .long("sprint-start")
                .value_name("sprint-start")
                .takes_value(true)
                .help("Override the configured sprint start date (YYYY-MM-DD)."),
        )
        .arg(
            Arg::with_name("sprint_end")
                .long("sprint-end")
                .value_name("sprint-end")
                .takes_value(true)
                .help("Override the configured sprint end date (YYYY-MM-DD)."),
        )
        .arg(
            Arg::with_name("config_directory")
                .short("c")
                .long("config-directory")
                .help("Directory holding config.json and secrets.json.")
                .env("BURNDOWN_CONFIG_DIRECTORY")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("discord")
                .long("discord")
                .help("If present, posts the burndown chart to the configured webhook")
                .takes_value(false),
        )
        .arg(
            Arg::with_name("no_cache")
                .long("no-cache")
                .help("Force fetch fresh data from the GitHub API. Ignore previously cached results.")
                .takes_value(false),
        )
        .get_matches();

    debug!("Arguments: {:?}", matches);
    if let Err(e) = run(&matches).await {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

/// Sprint window resolved from CLI overrides and config.
struct SprintWindow {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    chart_end: DateTime<Utc>,
}

fn resolve_sprint_window(
    matches: &ArgMatches<'_>,
    config: &Config,
) -> Result<SprintWindow, Box<dyn std::error::Error>> {
    let cli_date = |key: &str,
                    setting: &'static str|
     -> Result<Option<DateTime<Utc>>, ConfigError> {
        match matches.value_of(key) {
            None => Ok(None),
            Some(raw) => dates::parse_to_utc(raw)
                .map(|dt| Some(dates::midnight(dt)))
                .map_err(|_| ConfigError::BadDate {
                    key: setting,
                    value: raw.to_owned(),
                }),
        }
    };

    let start = cli_date("sprint_start", "sprint_start_date")?
        .or(config.utc_sprint_start()?)
        .ok_or(ConfigError::MissingSetting("sprint_start_date"))?;
    let end = cli_date("sprint_end", "sprint_end_date")?
        .or(config.utc_sprint_end()?)
        .ok_or(ConfigError::MissingSetting("sprint_end_date"))?;
    let chart_end = config.utc_chart_end()?.unwrap_or(end);

    Ok(SprintWindow {
        start,
        end,
        chart_end,
    })
}

fn prepare_chart_data(
    stats: &ProjectStats,
    config: &Config,
    window: &SprintWindow,
    sprint_name: &str,
) -> BurndownChartData {
    let mut colors = color_cycle();
    let mut series_list: Vec<ChartSeries> = vec![];

    let default_calculators = vec!["burndown".to_owned()];
    let calc_types = config
        .project
        .settings
        .calculators
        .as_ref()
        .unwrap_or(&default_calculators);

    for pts_type in calc_types {
        let policy: Policy = match pts_type.parse() {
            Ok(policy) => policy,
            Err(e) => {
                warn!("{}. Skipping.", e);
                continue;
            }
        };

        // The burndown policy plots the exact remaining value and stops at
        // today; the others plot their cumulative value across the range.
        let data = match policy {
            Policy::Burndown => stats.remaining_points_by_date(),
            _ => {
                let calculator = policy.calculator(stats.project.cards());
                stats
                    .points_by_date(calculator.as_ref())
                    .into_iter()
                    .map(|(date, value)| (date, Some(value)))
                    .collect()
            }
        };

        series_list.push(ChartSeries {
            name: policy.label().to_owned(),
            color: colors.next().unwrap_or("#1f77b4").to_owned(),
            dashed: false,
            data,
        });
    }

    series_list.push(ChartSeries {
        name: "Ideal".to_owned(),
        color: "#aaaaaa".to_owned(),
        dashed: true,
        data: stats
            .ideal_burndown()
            .into_iter()
            .map(|(date, value)| (date, Some(value)))
            .collect(),
    });

    let points_label = config
        .project
        .settings
        .points_label
        .clone()
        .filter(|label| !label.is_empty())
        .unwrap_or_else(|| "Points".to_owned());

    BurndownChartData {
        sprint_name: format!("{} - {}", stats.project.name, sprint_name),
        utc_chart_start: window.start,
        utc_chart_end: window.chart_end,
        utc_sprint_start: window.start,
        utc_sprint_end: window.end,
        total_points: stats.total_points(),
        series: series_list,
        points_label: format!("Outstanding {}", points_label),
    }
}

async fn run(matches: &ArgMatches<'_>) -> Result<(), Box<dyn std::error::Error>> {
    let stdout = io::stdout();
    let mut handle = io::BufWriter::new(&stdout);

    let project_type: ProjectType = matches.value_of("type").unwrap_or("user").parse()?;
    let project_name = matches.value_of("name").unwrap_or("");
    let sprint_name = matches.value_of("sprint").unwrap_or("");
    let config_directory = matches.value_of("config_directory").unwrap_or("");
    let use_cache = !matches.is_present("no_cache");

    let config = Config::load(config_directory, project_type, project_name)?;
    let window = resolve_sprint_window(matches, &config)?;

    writeln!(handle, "Fetching data for {}...", project_name).unwrap_or_default();
    let _ = handle.flush();

    let client = reqwest::Client::new();
    let project = api::fetch_project(&client, &config, use_cache).await?;
    info!("Fetched project {:?}", project.name);

    let stats = ProjectStats::new(project, window.start, window.chart_end);

    writeln!(
        handle,
        "Project: {} : {} : {} total points.",
        project_name,
        project_type,
        stats.total_points()
    )
    .unwrap_or_default();
    writeln!(handle, "Sprint Start: {}", window.start).unwrap_or_default();
    writeln!(handle, "Sprint End:   {}", window.end).unwrap_or_default();
    if use_cache {
        writeln!(
            handle,
            "WARNING: using cached json data from system tmp directory."
        )
        .unwrap_or_default();
    }

    let burndown_calc = BurndownCalculator::new(stats.project.cards());
    writeln!(
        handle,
        "Velocity (14d): {:.2} points/day",
        burndown_calc.velocity(14)
    )
    .unwrap_or_default();
    match burndown_calc.estimate_completion() {
        Some(eta) => {
            writeln!(handle, "Projected completion: {}", eta.format("%Y-%m-%d"))
                .unwrap_or_default()
        }
        None => writeln!(handle, "Projected completion: none (no recent closures)")
            .unwrap_or_default(),
    }
    let _ = handle.flush();

    let chart_data = prepare_chart_data(&stats, &config, &window, sprint_name);
    let burndown_chart = BurndownChart::new(chart_data);

    let filepath = matches.value_of("filepath").unwrap_or("./burndown.svg");
    burndown_chart.generate_chart(filepath)?;
    writeln!(handle, "Saved to {}", filepath).unwrap_or_default();

    if matches.is_present("discord") {
        let webhook_url = config
            .secrets
            .discord_webhook_url
            .as_deref()
            .ok_or(ConfigError::MissingSetting("discord_webhook_url"))?;
        writeln!(handle, "Posting to Discord...").unwrap_or_default();
        let _ = handle.flush();
        discord::post_burndown_chart(&client, webhook_url, filepath).await?;
    }

    writeln!(handle, "Done.").unwrap_or_default();
    let _ = handle.flush();
    Ok(())
}
