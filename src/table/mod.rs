//! Text filtering and column sorting over hero statistics rows.
//!
//! Processing is a pure function of the fetched rows and the user's table
//! controls; those controls are independent of the filter state and never
//! trigger a fetch.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::models::HeroStat;

/// Sortable table columns, including the two derived side win rates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortColumn {
    HeroName,
    Picks,
    Bans,
    Wins,
    Losses,
    PickRate,
    BanRate,
    Presence,
    WinRate,
    BluePicks,
    BlueWins,
    BlueWinRate,
    RedPicks,
    RedWins,
    RedWinRate,
}

impl SortColumn {
    pub const ALL: [SortColumn; 15] = [
        SortColumn::HeroName,
        SortColumn::Picks,
        SortColumn::Bans,
        SortColumn::Wins,
        SortColumn::Losses,
        SortColumn::PickRate,
        SortColumn::BanRate,
        SortColumn::Presence,
        SortColumn::WinRate,
        SortColumn::BluePicks,
        SortColumn::BlueWins,
        SortColumn::BlueWinRate,
        SortColumn::RedPicks,
        SortColumn::RedWins,
        SortColumn::RedWinRate,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SortColumn::HeroName => "hero_name",
            SortColumn::Picks => "picks",
            SortColumn::Bans => "bans",
            SortColumn::Wins => "wins",
            SortColumn::Losses => "losses",
            SortColumn::PickRate => "pick_rate",
            SortColumn::BanRate => "ban_rate",
            SortColumn::Presence => "presence",
            SortColumn::WinRate => "win_rate",
            SortColumn::BluePicks => "blue_picks",
            SortColumn::BlueWins => "blue_wins",
            SortColumn::BlueWinRate => "blue_win_rate",
            SortColumn::RedPicks => "red_picks",
            SortColumn::RedWins => "red_wins",
            SortColumn::RedWinRate => "red_win_rate",
        }
    }

    /// Whether the column is computed rather than read from the row.
    pub fn is_derived(self) -> bool {
        matches!(self, SortColumn::BlueWinRate | SortColumn::RedWinRate)
    }
}

impl fmt::Display for SortColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortColumn {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase().replace('-', "_");
        let wanted = if wanted == "hero" { "hero_name".to_string() } else { wanted };
        SortColumn::ALL
            .into_iter()
            .find(|c| c.as_str() == wanted)
            .ok_or_else(|| format!("unknown sort column '{}'", s))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn flip(self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }
}

/// Active sort column and direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortState {
    pub column: SortColumn,
    pub direction: SortDirection,
}

impl Default for SortState {
    fn default() -> Self {
        Self {
            column: SortColumn::Presence,
            direction: SortDirection::Desc,
        }
    }
}

impl SortState {
    pub fn new(column: SortColumn, direction: SortDirection) -> Self {
        Self { column, direction }
    }

    /// Clicking the active column flips direction; a new column starts descending.
    pub fn toggle(&mut self, column: SortColumn) {
        if self.column == column {
            self.direction = self.direction.flip();
        } else {
            self.column = column;
            self.direction = SortDirection::Desc;
        }
    }

    /// Header marker for `column`, if it is the active one.
    pub fn indicator(&self, column: SortColumn) -> Option<&'static str> {
        if self.column != column {
            return None;
        }
        Some(match self.direction {
            SortDirection::Asc => " ▲",
            SortDirection::Desc => " ▼",
        })
    }
}

/// User-controlled table state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableQuery {
    /// Case-insensitive hero-name substring; empty keeps every row
    pub text_filter: String,
    pub sort: SortState,
}

/// A row ready for display, with its derived columns computed once.
#[derive(Debug, Clone, PartialEq)]
pub struct TableRow<'a> {
    pub stat: &'a HeroStat,
    pub blue_win_rate: f64,
    pub red_win_rate: f64,
}

enum SortKey<'a> {
    Text(&'a str),
    Number(f64),
}

impl<'a> TableRow<'a> {
    fn new(stat: &'a HeroStat) -> Self {
        Self {
            stat,
            blue_win_rate: stat.blue_win_rate(),
            red_win_rate: stat.red_win_rate(),
        }
    }

    fn key(&self, column: SortColumn) -> SortKey<'a> {
        let s = self.stat;
        match column {
            SortColumn::HeroName => SortKey::Text(&s.hero_name),
            SortColumn::Picks => SortKey::Number(s.picks as f64),
            SortColumn::Bans => SortKey::Number(s.bans as f64),
            SortColumn::Wins => SortKey::Number(s.wins as f64),
            SortColumn::Losses => SortKey::Number(s.losses as f64),
            SortColumn::PickRate => SortKey::Number(s.pick_rate),
            SortColumn::BanRate => SortKey::Number(s.ban_rate),
            SortColumn::Presence => SortKey::Number(s.presence),
            SortColumn::WinRate => SortKey::Number(s.win_rate),
            SortColumn::BluePicks => SortKey::Number(s.blue_picks as f64),
            SortColumn::BlueWins => SortKey::Number(s.blue_wins as f64),
            SortColumn::BlueWinRate => SortKey::Number(self.blue_win_rate),
            SortColumn::RedPicks => SortKey::Number(s.red_picks as f64),
            SortColumn::RedWins => SortKey::Number(s.red_wins as f64),
            SortColumn::RedWinRate => SortKey::Number(self.red_win_rate),
        }
    }
}

/// Case-folded comparison first, raw code points only to order case variants.
fn compare_text(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

fn compare_keys(a: &SortKey<'_>, b: &SortKey<'_>) -> Ordering {
    match (a, b) {
        (SortKey::Text(a), SortKey::Text(b)) => compare_text(a, b),
        (SortKey::Number(a), SortKey::Number(b)) => a.partial_cmp(b).unwrap_or(Ordering::Equal),
        // A column yields one key kind for every row.
        _ => Ordering::Equal,
    }
}

/// Whether `stat` passes the hero-name text filter.
pub fn matches_filter(stat: &HeroStat, text_filter: &str) -> bool {
    text_filter.is_empty()
        || stat
            .hero_name
            .to_lowercase()
            .contains(&text_filter.to_lowercase())
}

/// Filter then stably sort `rows` for display.
pub fn process<'a>(rows: &'a [HeroStat], query: &TableQuery) -> Vec<TableRow<'a>> {
    let mut out: Vec<TableRow<'a>> = rows
        .iter()
        .filter(|s| matches_filter(s, &query.text_filter))
        .map(TableRow::new)
        .collect();

    let SortState { column, direction } = query.sort;
    // `sort_by` is stable: equal keys keep their incoming order in both directions.
    out.sort_by(|a, b| {
        let ord = compare_keys(&a.key(column), &b.key(column));
        match direction {
            SortDirection::Asc => ord,
            SortDirection::Desc => ord.reverse(),
        }
    });
    out
}
