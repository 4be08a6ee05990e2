use crate::models::ScheduleEntry;
use crate::utils::team_names::normalize;
use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::Deserialize;
use tracing::{info, warn};

/// A row of the nflverse `games.csv`; the many other columns are ignored
#[derive(Debug, Deserialize)]
struct GameRecord {
    game_id: String,
    season: u16,
    week: u8,
    gameday: NaiveDate,
    #[serde(default)]
    gametime: String,
    home_team: String,
    away_team: String,
    #[serde(deserialize_with = "csv::invalid_option")]
    home_score: Option<u16>,
    #[serde(deserialize_with = "csv::invalid_option")]
    away_score: Option<u16>,
}

/// Parse the games CSV, keeping one season. Games whose team codes do not
/// resolve are skipped with a warning.
pub fn parse_schedule(csv_text: &str, season: u16) -> Result<Vec<ScheduleEntry>> {
    let mut reader = csv::Reader::from_reader(csv_text.as_bytes());
    let mut games = Vec::new();

    for record in reader.deserialize::<GameRecord>() {
        let record = record.context("Failed to parse schedule row")?;
        if record.season != season {
            continue;
        }

        let (home, away) = match (
            normalize(&record.home_team).code(),
            normalize(&record.away_team).code(),
        ) {
            (Some(home), Some(away)) => (home, away),
            _ => {
                warn!(
                    "Skipping {}: unmapped team {} or {}",
                    record.game_id, record.home_team, record.away_team
                );
                continue;
            }
        };

        games.push(ScheduleEntry {
            game_id: record.game_id,
            season: record.season,
            week: record.week,
            gameday: record.gameday,
            gametime: record.gametime,
            home_team: home,
            away_team: away,
            home_score: record.home_score,
            away_score: record.away_score,
        });
    }

    Ok(games)
}

/// Games whose date falls in `start..=end`
pub fn upcoming_games(
    schedule: &[ScheduleEntry],
    start: NaiveDate,
    end: NaiveDate,
) -> Vec<ScheduleEntry> {
    schedule
        .iter()
        .filter(|game| game.gameday >= start && game.gameday <= end)
        .cloned()
        .collect()
}

pub struct ScheduleClient {
    client: reqwest::Client,
    url: String,
}

impl ScheduleClient {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
        }
    }

    /// Download the full games file and keep `season`
    pub async fn fetch_season(&self, season: u16) -> Result<Vec<ScheduleEntry>> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .context("Failed to fetch schedule")?;

        if !response.status().is_success() {
            anyhow::bail!("Schedule source returned error: {}", response.status());
        }

        let text = response
            .text()
            .await
            .context("Failed to read schedule body")?;
        let games = parse_schedule(&text, season)?;
        info!("Loaded {} games for the {} season", games.len(), season);
        Ok(games)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::team_names::TeamCode;

    const GAMES_CSV: &str = "\
game_id,season,game_type,week,gameday,weekday,gametime,away_team,away_score,home_team,home_score,location
2023_22_SF_KC,2023,SB,22,2024-02-11,Sunday,18:30,SF,22,KC,25,Neutral
2024_01_BAL_KC,2024,REG,1,2024-09-05,Thursday,20:20,BAL,20,KC,27,Home
2024_01_LA_DET,2024,REG,1,2024-09-08,Sunday,20:20,LA,20,DET,26,Home
2024_02_NYG_WAS,2024,REG,2,2024-09-15,Sunday,13:00,NYG,NA,WAS,NA,Home
2024_02_XYZ_DAL,2024,REG,2,2024-09-15,Sunday,16:25,XYZ,,DAL,,Home
";

    #[test]
    fn test_parse_schedule_filters_season() {
        let games = parse_schedule(GAMES_CSV, 2024).unwrap();
        assert_eq!(games.len(), 3);

        let opener = &games[0];
        assert_eq!(opener.home_team, TeamCode::KC);
        assert_eq!(opener.away_team, TeamCode::BAL);
        assert_eq!(opener.point_difference(), Some(7.0));
        assert_eq!(opener.gametime, "20:20");
    }

    #[test]
    fn test_parse_schedule_normalizes_codes() {
        let games = parse_schedule(GAMES_CSV, 2024).unwrap();
        assert_eq!(games[1].away_team, TeamCode::LAR);
    }

    #[test]
    fn test_unplayed_games_have_no_scores() {
        let games = parse_schedule(GAMES_CSV, 2024).unwrap();
        assert_eq!(games[2].home_score, None);
        assert_eq!(games[2].point_difference(), None);
    }

    #[test]
    fn test_upcoming_games_window() {
        let games = parse_schedule(GAMES_CSV, 2024).unwrap();
        let start = NaiveDate::from_ymd_opt(2024, 9, 8).unwrap();
        let end = start + chrono::Duration::days(7);

        let upcoming = upcoming_games(&games, start, end);
        let ids: Vec<_> = upcoming.iter().map(|g| g.game_id.as_str()).collect();
        assert_eq!(ids, vec!["2024_01_LA_DET", "2024_02_NYG_WAS"]);
    }

    #[tokio::test]
    #[ignore] // Requires network access
    async fn test_fetch_season() {
        let client = ScheduleClient::new(crate::config::Config::default().schedule_url);
        let games = client.fetch_season(2024).await.unwrap();
        assert!(games.len() >= 272);
    }
}
