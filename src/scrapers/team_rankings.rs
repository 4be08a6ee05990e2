use crate::error::{PipelineError, Result};
use crate::scrapers::table_source::{RawTable, TableSource};
use chrono::{DateTime, Local};
use std::time::Duration;
use tracing::{info, warn};

/// How the season column of a stat page should be read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatKind {
    Plain,
    /// `MM:SS`, converted to fractional minutes
    TimeOfPossession,
    /// Signed per-game margin such as `-0.4` or `+1.2`
    TurnoverMargin,
}

/// One statistic page, e.g. `points-per-game`
#[derive(Debug, Clone, PartialEq)]
pub struct StatSource {
    pub name: String,
    pub url: String,
    pub kind: StatKind,
}

impl StatSource {
    /// The stat name is the last path segment with dashes turned into underscores
    pub fn from_url(url: &str) -> Self {
        let name = url
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .unwrap_or(url)
            .replace('-', "_");

        let kind = if name.contains("time_of_possession") {
            StatKind::TimeOfPossession
        } else if name.contains("turnover_margin") {
            StatKind::TurnoverMargin
        } else {
            StatKind::Plain
        };

        Self {
            name,
            url: url.to_string(),
            kind,
        }
    }
}

/// A single fetched statistic, still keyed by the page's own team names
#[derive(Debug, Clone)]
pub struct StatTable {
    pub stat: String,
    pub fetched_at: DateTime<Local>,
    pub rows: Vec<(String, Option<f64>)>,
}

/// `"32:15"` -> 32.25. Each field is weighted by 60^position from the right,
/// and the total is expressed in minutes.
pub fn parse_time_of_possession(text: &str) -> Option<f64> {
    let mut seconds = 0.0;
    for (index, part) in text.trim().split(':').rev().enumerate() {
        let value: f64 = part.trim().parse().ok()?;
        seconds += value * 60f64.powi(index as i32);
    }
    Some(seconds / 60.0)
}

pub fn parse_turnover_margin(text: &str) -> Option<f64> {
    text.trim().parse().ok()
}

fn parse_plain(text: &str) -> Option<f64> {
    let cleaned: String = text
        .trim()
        .chars()
        .filter(|c| *c != '%' && *c != ',')
        .collect();
    cleaned.parse().ok()
}

pub fn parse_stat_value(kind: StatKind, text: &str) -> Option<f64> {
    match kind {
        StatKind::TimeOfPossession => parse_time_of_possession(text),
        StatKind::TurnoverMargin => parse_turnover_margin(text),
        StatKind::Plain => parse_plain(text),
    }
}

/// Pick the configured season column, or the most recent year on the page
fn season_column(table: &RawTable, season: Option<u16>) -> Option<usize> {
    if let Some(season) = season {
        return table.column(&season.to_string());
    }

    table
        .headers
        .iter()
        .enumerate()
        .filter(|(_, h)| h.len() == 4)
        .filter_map(|(i, h)| h.parse::<u16>().ok().map(|year| (i, year)))
        .max_by_key(|(_, year)| *year)
        .map(|(i, _)| i)
}

/// Fetches TeamRankings-style stat pages through any [`TableSource`]
pub struct StatFetcher<S> {
    source: S,
    season: Option<u16>,
    retry_delay: Duration,
}

impl<S: TableSource> StatFetcher<S> {
    pub fn new(source: S, season: Option<u16>, retry_delay: Duration) -> Self {
        Self {
            source,
            season,
            retry_delay,
        }
    }

    async fn try_fetch(&self, stat: &StatSource) -> Option<RawTable> {
        match self.source.fetch_table(&stat.url).await {
            Ok(table) => table,
            Err(e) => {
                warn!("Request for {} failed: {}", stat.url, e);
                None
            }
        }
    }

    /// Fetch one stat, waiting and retrying once when no table comes back
    pub async fn fetch(&self, stat: &StatSource) -> Result<StatTable> {
        let table = match self.try_fetch(stat).await {
            Some(table) => table,
            None => {
                warn!(
                    "Table not found for {}, retrying in {:?}",
                    stat.url, self.retry_delay
                );
                tokio::time::sleep(self.retry_delay).await;
                self.try_fetch(stat)
                    .await
                    .ok_or_else(|| PipelineError::unavailable(&stat.name, "no table found"))?
            }
        };

        let fetched_at = Local::now();
        let stat_table = self.to_stat_table(stat, &table, fetched_at)?;
        info!(
            "Fetched {} ({} teams)",
            stat_table.stat,
            stat_table.rows.len()
        );
        Ok(stat_table)
    }

    fn to_stat_table(
        &self,
        stat: &StatSource,
        table: &RawTable,
        fetched_at: DateTime<Local>,
    ) -> Result<StatTable> {
        let team_col = table
            .column("Team")
            .ok_or_else(|| PipelineError::unavailable(&stat.name, "no Team column"))?;
        let value_col = season_column(table, self.season)
            .ok_or_else(|| PipelineError::unavailable(&stat.name, "no season column"))?;

        let rows = table
            .rows
            .iter()
            .filter_map(|row| {
                let team = row.get(team_col)?.trim();
                if team.is_empty() {
                    return None;
                }
                let value = row
                    .get(value_col)
                    .and_then(|text| parse_stat_value(stat.kind, text));
                Some((team.to_string(), value))
            })
            .collect::<Vec<_>>();

        if rows.is_empty() {
            return Err(PipelineError::unavailable(&stat.name, "table has no team rows"));
        }

        Ok(StatTable {
            stat: stat.name.clone(),
            fetched_at,
            rows,
        })
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use std::cell::RefCell;
    use std::collections::HashMap;

    /// Serves canned tables by URL and counts requests
    #[derive(Default)]
    pub struct FixtureSource {
        pub tables: HashMap<String, RawTable>,
        /// Requests per URL answered with no table before the real one
        pub misses: HashMap<String, usize>,
        pub calls: RefCell<HashMap<String, usize>>,
    }

    impl FixtureSource {
        pub fn with(mut self, url: &str, rows: &[(&str, &str)]) -> Self {
            self.tables.insert(
                url.to_string(),
                RawTable {
                    headers: vec!["Rank", "Team", "2024", "Last 3", "2023"]
                        .into_iter()
                        .map(String::from)
                        .collect(),
                    rows: rows
                        .iter()
                        .enumerate()
                        .map(|(i, (team, value))| {
                            vec![
                                (i + 1).to_string(),
                                team.to_string(),
                                value.to_string(),
                                "0".to_string(),
                                "0".to_string(),
                            ]
                        })
                        .collect(),
                },
            );
            self
        }

        /// The first request for `url` finds no table
        pub fn missing_first(mut self, url: &str) -> Self {
            self.misses.insert(url.to_string(), 1);
            self
        }

        pub fn calls_for(&self, url: &str) -> usize {
            self.calls.borrow().get(url).copied().unwrap_or(0)
        }
    }

    impl TableSource for FixtureSource {
        async fn fetch_table(&self, url: &str) -> Result<Option<RawTable>> {
            let call = {
                let mut calls = self.calls.borrow_mut();
                let count = calls.entry(url.to_string()).or_default();
                *count += 1;
                *count
            };
            if call <= self.misses.get(url).copied().unwrap_or(0) {
                return Ok(None);
            }
            Ok(self.tables.get(url).cloned())
        }
    }
}
