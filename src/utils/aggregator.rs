use crate::error::{PipelineError, Result};
use crate::scrapers::table_source::TableSource;
use crate::scrapers::team_rankings::{StatFetcher, StatSource, StatTable};
use crate::utils::team_names::{normalize, Normalized, TeamCode};
use chrono::{DateTime, Local};
use std::collections::{BTreeMap, HashMap};
use tracing::{info, warn};

/// Every fetched statistic joined into one row per team
#[derive(Debug, Clone)]
pub struct TeamStats {
    columns: Vec<String>,
    rows: BTreeMap<TeamCode, Vec<Option<f64>>>,
    timestamp: DateTime<Local>,
    unmapped: Vec<String>,
    skipped: Vec<String>,
}

impl TeamStats {
    /// Join stat tables on team name. The first table's timestamp represents
    /// the whole snapshot.
    pub fn from_tables(tables: &[StatTable]) -> Result<Self> {
        let first = tables.first().ok_or(PipelineError::AllSourcesFailed)?;
        let timestamp = first.fetched_at;

        let mut columns: Vec<String> = Vec::new();
        let mut team_order: Vec<String> = Vec::new();
        let mut joined: HashMap<String, Vec<Option<f64>>> = HashMap::new();

        for table in tables {
            if columns.contains(&table.stat) {
                warn!("Skipping duplicate stat column {}", table.stat);
                continue;
            }
            let col = columns.len();
            columns.push(table.stat.clone());

            for (team, value) in &table.rows {
                let row = joined.entry(team.clone()).or_insert_with(|| {
                    team_order.push(team.clone());
                    Vec::new()
                });
                if row.len() > col {
                    warn!("{} listed twice in {}, keeping first", team, table.stat);
                    continue;
                }
                row.resize(col, None);
                row.push(*value);
            }
        }

        let mut rows = BTreeMap::new();
        let mut unmapped = Vec::new();

        for name in team_order {
            let mut values = joined.remove(&name).unwrap_or_default();
            values.resize(columns.len(), None);

            match normalize(&name) {
                Normalized::Mapped(team) => {
                    if rows.insert(team, values).is_some() {
                        return Err(PipelineError::DuplicateTeam(team));
                    }
                }
                Normalized::Unmapped(name) => {
                    warn!("Unmapped team name {:?} left out of stats", name);
                    unmapped.push(name);
                }
            }
        }

        Ok(Self {
            columns,
            rows,
            timestamp,
            unmapped,
            skipped: Vec::new(),
        })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn teams(&self) -> impl Iterator<Item = TeamCode> + '_ {
        self.rows.keys().copied()
    }

    pub fn row(&self, team: TeamCode) -> Option<&[Option<f64>]> {
        self.rows.get(&team).map(Vec::as_slice)
    }

    pub fn value(&self, team: TeamCode, stat: &str) -> Option<f64> {
        let col = self.columns.iter().position(|c| c == stat)?;
        self.rows.get(&team)?.get(col).copied().flatten()
    }

    pub fn timestamp(&self) -> DateTime<Local> {
        self.timestamp
    }

    /// Team names no alias matched
    pub fn unmapped(&self) -> &[String] {
        &self.unmapped
    }

    /// Stat names whose source could not be fetched
    pub fn skipped(&self) -> &[String] {
        &self.skipped
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Fetches a fixed list of stat sources, one after another, and joins them
pub struct StatAggregator<S> {
    fetcher: StatFetcher<S>,
    sources: Vec<StatSource>,
}

impl<S: TableSource> StatAggregator<S> {
    pub fn new(fetcher: StatFetcher<S>, sources: Vec<StatSource>) -> Self {
        Self { fetcher, sources }
    }

    pub fn sources(&self) -> &[StatSource] {
        &self.sources
    }

    /// Failed sources are skipped; only a run where nothing succeeds is an error
    pub async fn aggregate(&self) -> Result<TeamStats> {
        let mut tables = Vec::new();
        let mut skipped = Vec::new();

        for (i, source) in self.sources.iter().enumerate() {
            match self.fetcher.fetch(source).await {
                Ok(table) => {
                    info!("Fetched data from source {} ({})", i + 1, source.name);
                    tables.push(table);
                }
                Err(e) => {
                    warn!("Failed to scrape source {}: {}", i + 1, e);
                    skipped.push(source.name.clone());
                }
            }
        }

        if tables.is_empty() {
            return Err(PipelineError::AllSourcesFailed);
        }

        let mut stats = TeamStats::from_tables(&tables)?;
        if stats.is_empty() {
            warn!("No recognized teams in any fetched table");
            return Err(PipelineError::AllSourcesFailed);
        }
        stats.skipped = skipped;
        info!(
            "Aggregated {} stats for {} teams ({} skipped)",
            stats.columns.len(),
            stats.len(),
            stats.skipped.len()
        );
        Ok(stats)
    }
}
