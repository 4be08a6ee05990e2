use crate::models::InjuryEntry;
use crate::utils::team_names::{normalize, TeamCode};
use anyhow::{Context, Result};
use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use serde::Deserialize;
use std::cmp::Ordering;
use std::collections::HashMap;
use tracing::{info, warn};

const REPORT_WINDOW_DAYS: i64 = 7;

#[derive(Debug, Deserialize)]
struct InjuryRecord {
    team: String,
    #[serde(default)]
    gsis_id: String,
    full_name: String,
    #[serde(default)]
    position: String,
    report_primary_injury: Option<String>,
    report_secondary_injury: Option<String>,
    report_status: Option<String>,
    date_modified: String,
}

#[derive(Debug, Deserialize)]
struct DepthRecord {
    #[serde(default, deserialize_with = "csv::invalid_option")]
    week: Option<u8>,
    #[serde(default)]
    depth_team: String,
    #[serde(default)]
    gsis_id: String,
    #[serde(default)]
    full_name: String,
}

/// nflverse writes missing values either as empty cells or as `NA`
fn present(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty() && v != "NA")
}

fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S%:z") {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S")
        .ok()
        .map(|dt| dt.and_utc())
}

/// QB first, then WR, RB, CB, then everyone else
fn position_priority(position: &str) -> u8 {
    match position {
        "QB" => 0,
        "WR" => 1,
        "RB" => 2,
        "CB" => 3,
        _ => 4,
    }
}

fn depth_order(a: &InjuryEntry, b: &InjuryEntry) -> Ordering {
    let depth = |e: &InjuryEntry| e.depth.parse::<u32>().unwrap_or(u32::MAX);
    depth(a)
        .cmp(&depth(b))
        .then_with(|| position_priority(&a.position).cmp(&position_priority(&b.position)))
        .then_with(|| a.player.cmp(&b.player))
}

/// Latest injury per player over the last week, with depth chart slots
#[derive(Debug, Clone, Default)]
pub struct InjuryReport {
    entries: Vec<InjuryEntry>,
}

impl InjuryReport {
    pub fn from_csv(injuries_csv: &str, depth_csv: &str, now: DateTime<Utc>) -> Result<Self> {
        let cutoff = now - Duration::days(REPORT_WINDOW_DAYS);

        // (gsis_id, full_name) -> depth_team from the latest week listed
        let mut depth: HashMap<(String, String), (u8, String)> = HashMap::new();
        let mut reader = csv::Reader::from_reader(depth_csv.as_bytes());
        for record in reader.deserialize::<DepthRecord>() {
            let record = record.context("Failed to parse depth chart row")?;
            let week = record.week.unwrap_or(0);
            let key = (record.gsis_id, record.full_name);
            match depth.get(&key) {
                Some((seen, _)) if *seen > week => {}
                _ => {
                    depth.insert(key, (week, record.depth_team));
                }
            }
        }

        // latest report per (team, player)
        let mut latest: HashMap<(TeamCode, String), InjuryEntry> = HashMap::new();
        let mut reader = csv::Reader::from_reader(injuries_csv.as_bytes());
        for record in reader.deserialize::<InjuryRecord>() {
            let record = record.context("Failed to parse injury row")?;

            let Some(last_updated) = parse_timestamp(&record.date_modified) else {
                continue;
            };
            if last_updated < cutoff {
                continue;
            }
            let Some(team) = normalize(&record.team).code() else {
                warn!("Skipping injury for unmapped team {}", record.team);
                continue;
            };

            let primary_injury = present(record.report_primary_injury);
            let secondary_injury = present(record.report_secondary_injury);
            let depth_team = depth
                .get(&(record.gsis_id.clone(), record.full_name.clone()))
                .map(|(_, d)| d.clone())
                .unwrap_or_default();

            let entry = InjuryEntry {
                team,
                player: record.full_name.clone(),
                position: record.position,
                depth: depth_team,
                status: present(record.report_status).unwrap_or_default(),
                primary_injury,
                secondary_injury,
                last_updated,
            };

            let key = (team, record.full_name);
            match latest.get(&key) {
                Some(existing) if existing.last_updated >= entry.last_updated => {}
                _ => {
                    latest.insert(key, entry);
                }
            }
        }

        let mut entries: Vec<InjuryEntry> = latest
            .into_values()
            .filter(|e| e.primary_injury.is_some() || e.secondary_injury.is_some())
            .collect();
        entries.sort_by(|a, b| a.team.cmp(&b.team).then_with(|| depth_order(a, b)));

        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[InjuryEntry] {
        &self.entries
    }

    /// Teams with at least one reported injury
    pub fn teams(&self) -> Vec<TeamCode> {
        let mut teams: Vec<TeamCode> = self.entries.iter().map(|e| e.team).collect();
        teams.dedup();
        teams
    }

    pub fn for_team(&self, team: TeamCode) -> Vec<&InjuryEntry> {
        self.entries.iter().filter(|e| e.team == team).collect()
    }

    /// `Name (Status); Name (Status)` for the predictions CSV
    pub fn summary(&self, team: TeamCode) -> String {
        self.for_team(team)
            .iter()
            .map(|e| e.format())
            .collect::<Vec<_>>()
            .join("; ")
    }
}

pub struct InjuryClient {
    client: reqwest::Client,
}

impl InjuryClient {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    async fn download(&self, url: &str) -> Result<String> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("Failed to fetch {}", url))?;

        if !response.status().is_success() {
            anyhow::bail!("{} returned error: {}", url, response.status());
        }
        Ok(response.text().await?)
    }

    pub async fn fetch_report(&self, injuries_url: &str, depth_url: &str) -> Result<InjuryReport> {
        let injuries = self.download(injuries_url).await?;
        let depth = self.download(depth_url).await?;
        let report = InjuryReport::from_csv(&injuries, &depth, Utc::now())?;
        info!("Loaded {} current injury reports", report.entries().len());
        Ok(report)
    }
}

impl Default for InjuryClient {
    fn default() -> Self {
        Self::new()
    }
}
