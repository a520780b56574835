use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::task::JoinSet;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mlbb_meta::catalog;
use mlbb_meta::config::AppConfig;
use mlbb_meta::dashboard::{effect, Action, Dashboard, Effect, FilterSnapshot, Page};
use mlbb_meta::fetch::{HttpStatsApi, StatsApi, TeamQuery};
use mlbb_meta::models::{GroupingMode, HeroDetails, SummaryStats, Tournament};
use mlbb_meta::table::{SortColumn, SortDirection, SortState, TableRow};
use mlbb_meta::view::Resource;

#[derive(Parser)]
#[command(name = "mlbb-meta")]
#[command(about = "MLBB esports hero statistics with cascading filters")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(long, default_value = "./mlbb-meta.toml")]
    config: PathBuf,

    /// Statistics backend URL (overrides the config file and MLBB_API_URL)
    #[arg(long)]
    api_url: Option<String>,

    /// Log level (trace, debug, info, warn, error); defaults to the config value
    #[arg(long)]
    log_level: Option<String>,

    /// Output logs as JSON
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Debug, Default)]
struct FilterArgs {
    /// Tournament name or id (repeatable)
    #[arg(long = "tournament")]
    tournaments: Vec<String>,

    /// Stage name (repeatable; needs at least one tournament)
    #[arg(long = "stage")]
    stages: Vec<String>,

    /// Team name or id (repeatable)
    #[arg(long = "team")]
    teams: Vec<String>,
}

#[derive(Args, Debug)]
struct TableArgs {
    /// Only show heroes whose name contains this text
    #[arg(long)]
    filter: Option<String>,

    /// Sort column (e.g. presence, win_rate, blue_win_rate, hero)
    #[arg(long)]
    sort: Option<SortColumn>,

    /// Sort ascending instead of descending
    #[arg(long)]
    asc: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Hero statistics for the selected filters
    Stats {
        #[command(flatten)]
        filters: FilterArgs,

        #[command(flatten)]
        table: TableArgs,
    },

    /// One hero's results by team and against opponents
    Hero {
        /// Hero name
        name: String,

        #[command(flatten)]
        filters: FilterArgs,
    },

    /// List tournaments
    Tournaments {
        /// Group by split or region
        #[arg(long)]
        group_by: Option<GroupingMode>,
    },

    /// List teams
    Teams {
        /// Only teams that played in these tournaments (repeatable)
        #[arg(long = "tournament")]
        tournaments: Vec<String>,

        /// Only teams that fielded this hero
        #[arg(long)]
        hero: Option<String>,
    },

    /// List hero names
    Heroes,

    /// Interactive session reading commands from stdin
    Browse,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load(&cli.config)
        .with_context(|| format!("Failed to load config from {}", cli.config.display()))?;
    if let Some(url) = &cli.api_url {
        config.api.base_url = url.clone();
        config.validate()?;
    }

    // Initialize tracing
    let level = cli.log_level.as_deref().unwrap_or(&config.log_level);
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));
    let (plain, json) = if cli.json_logs {
        (None, Some(tracing_subscriber::fmt::layer().json()))
    } else {
        (Some(tracing_subscriber::fmt::layer()), None)
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(plain)
        .with(json)
        .init();

    tracing::info!("Starting mlbb-meta v{}", env!("CARGO_PKG_VERSION"));
    tracing::debug!("Backend: {}", config.api.base_url);

    let api: Arc<dyn StatsApi> = Arc::new(HttpStatsApi::new(config.client_config()?)?);

    match cli.command {
        Commands::Stats { filters, table } => {
            let mut dash = start(api.as_ref(), &config).await;
            apply_filters(&mut dash, api.as_ref(), &filters).await?;
            if let Some(text) = table.filter {
                dash.dispatch(Action::SetTextFilter(text));
            }
            apply_sort(&mut dash, table.sort, table.asc);
            print_stats_page(&dash)?;
        }

        Commands::Hero { name, filters } => {
            if name.trim().is_empty() {
                bail!("Hero name must not be empty");
            }
            let mut dash = start(api.as_ref(), &config).await;
            apply(&mut dash, api.as_ref(), Action::NavigateHero(name)).await;
            apply_filters(&mut dash, api.as_ref(), &filters).await?;
            print_hero_page(&dash)?;
        }

        Commands::Tournaments { group_by } => match group_by {
            None => {
                let load = catalog::load_all_tournaments(api.as_ref()).await;
                if let Some(e) = load.error {
                    return Err(e.into());
                }
                for t in &load.data {
                    print_tournament(t);
                }
            }
            Some(mode) => {
                let load = catalog::load_grouped_tournaments(api.as_ref(), mode).await;
                if let Some(e) = load.error {
                    return Err(e.into());
                }
                for (key, tournaments) in load.data.iter() {
                    println!("{}:", key);
                    for t in tournaments {
                        print!("  ");
                        print_tournament(t);
                    }
                }
            }
        },

        Commands::Teams { tournaments, hero } => {
            let query = if !tournaments.is_empty() {
                if hero.is_some() {
                    tracing::warn!("--hero is ignored when --tournament is given");
                }
                TeamQuery::Tournaments(tournaments)
            } else if let Some(hero) = hero {
                TeamQuery::Hero(hero)
            } else {
                TeamQuery::All
            };
            for team in api.teams(&query).await? {
                println!("{:>5}  {}", team.id, team.name);
            }
        }

        Commands::Heroes => {
            for hero in api.heroes().await? {
                println!("{}", hero);
            }
        }

        Commands::Browse => {
            browse(api, &config).await?;
        }
    }

    Ok(())
}

/// Load the catalog and the unfiltered stats page.
async fn start(api: &dyn StatsApi, config: &AppConfig) -> Dashboard {
    let mut dash = Dashboard::new(config.table.sort_state());
    apply(&mut dash, api, Action::Start).await;
    for e in dash.catalog_errors() {
        eprintln!("warning: {}", e);
    }
    dash
}

async fn apply(dash: &mut Dashboard, api: &dyn StatsApi, action: Action) {
    let effects = dash.dispatch(action);
    dash.drive(api, effects).await;
}

/// Select the requested filters in cascade order: tournaments first, then
/// stages and teams among the options those tournaments leave.
async fn apply_filters(
    dash: &mut Dashboard,
    api: &dyn StatsApi,
    filters: &FilterArgs,
) -> Result<()> {
    for needle in &filters.tournaments {
        let id = dash
            .catalog()
            .find_tournament(needle)
            .map(|t| t.id)
            .with_context(|| format!("Unknown tournament '{}'", needle))?;
        if !dash.filter().has_tournament(id) {
            apply(dash, api, Action::ToggleTournament(id)).await;
        }
    }

    for needle in &filters.stages {
        let stage = dash
            .stage_options()
            .iter()
            .find(|s| s.eq_ignore_ascii_case(needle.trim()))
            .cloned();
        match stage {
            Some(stage) if !dash.filter().has_stage(&stage) => {
                apply(dash, api, Action::ToggleStage(stage)).await;
            }
            Some(_) => {}
            None => tracing::warn!(
                "Ignoring stage '{}': not played in the selected tournaments",
                needle
            ),
        }
    }

    for needle in &filters.teams {
        let id = dash
            .catalog()
            .find_team(needle, dash.team_options())
            .map(|t| t.id)
            .filter(|id| dash.team_options().iter().any(|t| t.id == *id));
        match id {
            Some(id) if !dash.filter().has_team(id) => {
                apply(dash, api, Action::ToggleTeam(id)).await;
            }
            Some(_) => {}
            None => tracing::warn!(
                "Ignoring team '{}': not available for the selected filters",
                needle
            ),
        }
    }
    Ok(())
}

/// Bring the table to `column` and direction through the same toggles a
/// header click makes.
fn apply_sort(dash: &mut Dashboard, column: Option<SortColumn>, asc: bool) {
    if column.is_none() && !asc {
        return;
    }
    let column = column.unwrap_or(dash.table_query().sort.column);
    if dash.table_query().sort.column != column {
        dash.dispatch(Action::SortBy(column));
    }
    let wanted = if asc {
        SortDirection::Asc
    } else {
        SortDirection::Desc
    };
    if dash.table_query().sort.direction != wanted {
        dash.dispatch(Action::SortBy(column));
    }
}

async fn browse(api: Arc<dyn StatsApi>, config: &AppConfig) -> Result<()> {
    let mut dash = Dashboard::new(config.table.sort_state());
    let mut snapshots = dash.subscribe();
    let mut tasks: JoinSet<Action> = JoinSet::new();
    spawn_effects(&mut tasks, &api, dash.dispatch(Action::Start));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    print_help();

    loop {
        tokio::select! {
            Some(joined) = tasks.join_next() => {
                match joined {
                    Ok(action) => {
                        let effects = dash.dispatch(action);
                        spawn_effects(&mut tasks, &api, effects);
                        if tasks.is_empty() {
                            render(&dash);
                        }
                    }
                    Err(e) => tracing::error!("Background fetch failed to complete: {}", e),
                }
            }
            Ok(()) = snapshots.changed() => {
                // Selection changes show up at once; the page follows when idle.
                let snapshot = snapshots.borrow_and_update().clone();
                print_selection(&snapshot);
            }
            line = lines.next_line() => {
                let Some(line) = line? else {
                    break;
                };
                match parse_command(&line, &dash) {
                    Ok(Command::Quit) => break,
                    Ok(Command::Help) => print_help(),
                    Ok(Command::Show) => render(&dash),
                    Ok(Command::Dispatch(action)) => {
                        let effects = dash.dispatch(action);
                        let idle = effects.is_empty() && tasks.is_empty();
                        spawn_effects(&mut tasks, &api, effects);
                        if idle {
                            render(&dash);
                        }
                    }
                    Err(msg) => eprintln!("{}", msg),
                }
            }
        }
    }

    tasks.shutdown().await;
    Ok(())
}

fn spawn_effects(tasks: &mut JoinSet<Action>, api: &Arc<dyn StatsApi>, effects: Vec<Effect>) {
    for effect in effects {
        let api = Arc::clone(api);
        tasks.spawn(async move { effect::run(effect, api.as_ref()).await });
    }
}

enum Command {
    Dispatch(Action),
    Show,
    Help,
    Quit,
}

fn parse_command(line: &str, dash: &Dashboard) -> Result<Command, String> {
    let line = line.trim();
    let (verb, arg) = match line.split_once(' ') {
        Some((verb, arg)) => (verb, arg.trim()),
        None => (line, ""),
    };

    let action = match verb {
        "" | "show" => return Ok(Command::Show),
        "help" | "?" => return Ok(Command::Help),
        "quit" | "exit" | "q" => return Ok(Command::Quit),
        "t" | "tournament" => {
            let id = dash
                .filter()
                .tournaments()
                .iter()
                .find(|t| t.name.eq_ignore_ascii_case(arg))
                .or_else(|| dash.catalog().find_tournament(arg))
                .map(|t| t.id)
                .ok_or_else(|| format!("Unknown tournament '{}'", arg))?;
            Action::ToggleTournament(id)
        }
        "s" | "stage" => {
            let stage = dash
                .filter()
                .stages()
                .iter()
                .chain(dash.stage_options())
                .find(|s| s.eq_ignore_ascii_case(arg))
                .cloned()
                .unwrap_or_else(|| arg.to_string());
            Action::ToggleStage(stage)
        }
        "team" => {
            let id = dash
                .catalog()
                .find_team(arg, dash.filter().teams())
                .or_else(|| dash.catalog().find_team(arg, dash.team_options()))
                .map(|t| t.id)
                .ok_or_else(|| format!("Unknown team '{}'", arg))?;
            Action::ToggleTeam(id)
        }
        "group" => Action::SelectGroup {
            key: arg.to_string(),
            select_all: true,
        },
        "ungroup" => Action::SelectGroup {
            key: arg.to_string(),
            select_all: false,
        },
        "focus" => Action::SetActiveGroup(arg.to_string()),
        "mode" => Action::SetGroupingMode(arg.parse()?),
        "find" => Action::SetTextFilter(arg.to_string()),
        "sort" => Action::SortBy(arg.parse()?),
        "hero" => Action::NavigateHero(arg.to_string()),
        "back" => Action::LeaveHero,
        other => return Err(format!("Unknown command '{}' (try 'help')", other)),
    };
    Ok(Command::Dispatch(action))
}

fn print_help() {
    println!("Commands:");
    println!("  t <tournament>     toggle a tournament (name or id)");
    println!("  s <stage>          toggle a stage");
    println!("  team <team>        toggle a team (name or id)");
    println!("  group <key>        select every tournament of a group");
    println!("  ungroup <key>      clear every tournament of a group");
    println!("  focus <key>        show a group's tournaments");
    println!("  mode split|region  change tournament grouping");
    println!("  find <text>        filter heroes by name (empty clears)");
    println!("  sort <column>      sort by column; again to flip direction");
    println!("  hero <name>        open a hero's detail page");
    println!("  back               return to the stats table");
    println!("  show | help | quit");
}

fn print_selection(snapshot: &FilterSnapshot) {
    tracing::debug!("Filter snapshot {}", snapshot.sequence);
    let filter = &snapshot.filter;
    let mut parts = vec![format!("{} tournament(s)", filter.tournaments().len())];
    if !filter.stages().is_empty() {
        parts.push(format!("stages {}", filter.stages().join(", ")));
    }
    if !filter.teams().is_empty() {
        let teams: Vec<&str> = filter.teams().iter().map(|t| t.name.as_str()).collect();
        parts.push(format!("teams {}", teams.join(", ")));
    }
    match &snapshot.hero {
        Some(hero) => println!("[{}] {}", hero, parts.join("; ")),
        None => println!("[stats] {}", parts.join("; ")),
    }
}

fn render(dash: &Dashboard) {
    let filter = dash.filter();
    let join = |names: Vec<String>| {
        if names.is_empty() {
            "(all)".to_string()
        } else {
            names.join(", ")
        }
    };
    println!();
    println!("Tournaments: {}", join(filter.tournament_names()));
    if dash.stage_filter_enabled() {
        println!(
            "Stages:      {}  [options: {}]",
            join(filter.stages().to_vec()),
            dash.stage_options().join(", ")
        );
    } else {
        println!("Stages:      (select a tournament first)");
    }
    println!(
        "Teams:       {}  [{} available]",
        join(filter.teams().iter().map(|t| t.name.clone()).collect()),
        dash.team_options().len()
    );

    let keys = dash.catalog().group_keys();
    if !keys.is_empty() {
        let marked: Vec<String> = keys
            .iter()
            .map(|k| {
                if dash.catalog().active_group() == Some(*k) {
                    format!("[{}]", k)
                } else {
                    k.to_string()
                }
            })
            .collect();
        println!("Groups ({}): {}", filter.grouping_mode(), marked.join(" "));
        if let Some(active) = dash.catalog().active_group() {
            for t in dash.catalog().group(active) {
                let mark = if filter.has_tournament(t.id) { "x" } else { " " };
                println!("  [{}] {}", mark, t.name);
            }
        }
    }
    if let Some(e) = dash.cascade_error() {
        println!("(filter options may be out of date: {})", e);
    }
    println!();

    let result = match dash.page() {
        Page::Stats => print_stats_page(dash),
        Page::Hero => print_hero_page(dash),
    };
    if let Err(e) = result {
        eprintln!("{}", e);
    }
}

fn print_stats_page(dash: &Dashboard) -> Result<()> {
    match dash.stats().state() {
        Resource::Idle => return Ok(()),
        Resource::Loading => {
            println!("Loading statistics...");
            return Ok(());
        }
        Resource::Failed { message, .. } => bail!("Failed to fetch statistics: {}", message),
        Resource::Loaded { value, fetched_at } => {
            print_summary(&value.summary);
            tracing::debug!("Stats fetched at {}", fetched_at.to_rfc3339());
        }
    }

    let rows = dash.processed_rows();
    if rows.is_empty() {
        println!("No heroes match the current filters.");
        return Ok(());
    }
    print_table(&rows, &dash.table_query().sort);
    Ok(())
}

fn print_summary(summary: &SummaryStats) {
    let count = |n: Option<u32>| n.map_or_else(|| "N/A".to_string(), |n| n.to_string());
    println!("=== Summary ===");
    println!("Total matches:    {}", count(summary.total_matches));
    println!("Total games:      {}", count(summary.total_games));
    println!("Unique heroes:    {}", count(summary.total_heroes));
    match &summary.most_picked {
        Some(h) => println!("Most picked:      {} ({} picks)", h.hero_name, h.picks),
        None => println!("Most picked:      N/A (0 picks)"),
    }
    match &summary.highest_win_rate {
        Some(h) => println!("Highest win rate: {} ({:.2}% WR)", h.hero_name, h.win_rate),
        None => println!("Highest win rate: N/A (0.00% WR)"),
    }
    println!();
}

const COLUMNS: [(SortColumn, &str); 11] = [
    (SortColumn::HeroName, "Hero"),
    (SortColumn::Picks, "Picks"),
    (SortColumn::Bans, "Bans"),
    (SortColumn::Wins, "Wins"),
    (SortColumn::Losses, "Losses"),
    (SortColumn::PickRate, "Pick%"),
    (SortColumn::BanRate, "Ban%"),
    (SortColumn::Presence, "Presence"),
    (SortColumn::WinRate, "WR%"),
    (SortColumn::BlueWinRate, "Blue WR%"),
    (SortColumn::RedWinRate, "Red WR%"),
];

fn print_table(rows: &[TableRow<'_>], sort: &SortState) {
    let header: Vec<String> = COLUMNS
        .iter()
        .map(|(column, label)| format!("{}{}", label, sort.indicator(*column).unwrap_or("")))
        .collect();
    let mut line = format!("{:<18}", header[0]);
    for h in &header[1..] {
        line.push_str(&format!(" {:>10}", h));
    }
    println!("{}", line);

    for row in rows {
        let s = row.stat;
        println!(
            "{:<18} {:>10} {:>10} {:>10} {:>10} {:>10.2} {:>10.2} {:>10.2} {:>10.2} {:>10.2} {:>10.2}",
            s.hero_name,
            s.picks,
            s.bans,
            s.wins,
            s.losses,
            s.pick_rate,
            s.ban_rate,
            s.presence,
            s.win_rate,
            row.blue_win_rate,
            row.red_win_rate
        );
    }
}

fn print_hero_page(dash: &Dashboard) -> Result<()> {
    let Some(hero) = dash.hero() else {
        bail!("No hero page is open");
    };
    println!("=== {} ===", hero.hero());
    match hero.state() {
        Resource::Idle => Ok(()),
        Resource::Loading => {
            println!("Loading hero details...");
            Ok(())
        }
        Resource::Failed { message, .. } => {
            bail!("Failed to fetch details for {}: {}", hero.hero(), message)
        }
        Resource::Loaded { value, .. } => {
            print_hero_details(hero.hero(), value);
            Ok(())
        }
    }
}

fn print_hero_details(hero: &str, details: &HeroDetails) {
    if details.by_team.is_empty() && details.vs_opponents.is_empty() {
        println!("No data found for {}.", hero);
        return;
    }

    println!("Performance by team");
    println!("{:<24} {:>8} {:>8} {:>8}", "Team", "Games", "Wins", "WR%");
    for row in &details.by_team {
        println!(
            "{:<24} {:>8} {:>8} {:>8.2}",
            row.team_name, row.games_played, row.wins, row.win_rate
        );
    }
    println!();

    println!("Performance against opponents");
    println!("{:<24} {:>8} {:>8} {:>8}", "Opponent", "Faced", "Wins", "WR%");
    for row in &details.vs_opponents {
        println!(
            "{:<24} {:>8} {:>8} {:>8.2}",
            row.opponent_hero_name, row.games_faced, row.wins_against, row.win_rate_vs
        );
    }
}

fn print_tournament(t: &Tournament) {
    match &t.region {
        Some(region) => println!("{:>5}  {} ({})", t.id, t.name, region),
        None => println!("{:>5}  {}", t.id, t.name),
    }
}
