use crate::models::{BookLine, OddsRow};
use crate::utils::team_names::{normalize, TeamCode};
use anyhow::{Context, Result};
use scraper::{Html, Selector};
use std::collections::BTreeMap;

const BOOK_COLUMNS: usize = 11;

/// Point lines and moneylines per sportsbook, one row per team
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OddsTable {
    pub books: Vec<String>,
    pub rows: Vec<OddsRow>,
}

impl OddsTable {
    fn book_index(&self, book: &str) -> Option<usize> {
        self.books.iter().position(|b| b.eq_ignore_ascii_case(book))
    }

    /// `(line, odds)` for a team at one sportsbook
    pub fn for_team(&self, team: TeamCode, book: &str) -> Option<&BookLine> {
        let i = self.book_index(book)?;
        self.rows
            .iter()
            .find(|row| row.team == team.mascot())
            .and_then(|row| row.lines.get(i))
    }

    pub fn team_lines(&self, book: &str) -> BTreeMap<TeamCode, BookLine> {
        let Some(i) = self.book_index(book) else {
            return BTreeMap::new();
        };
        self.rows
            .iter()
            .filter_map(|row| {
                let team = normalize(&row.team).code()?;
                Some((team, row.lines.get(i)?.clone()))
            })
            .collect()
    }

    pub fn headers(&self) -> Vec<String> {
        let mut headers = vec!["Number".to_string(), "Team".to_string()];
        for book in &self.books {
            headers.push(format!("{} Line", book));
            headers.push(format!("{} Odds", book));
        }
        headers
    }
}

/// Split a sportsbook cell such as `-3.5 -110` into line and odds
pub fn split_line_and_odds(cell: &str) -> BookLine {
    let cell = cell.trim();
    let (line, odds) = if cell.is_empty() {
        (String::new(), String::new())
    } else if cell.starts_with('+') || cell.starts_with('-') {
        match cell.split_once(char::is_whitespace) {
            Some((line, odds)) => (line.to_string(), odds.to_string()),
            None => (cell.to_string(), String::new()),
        }
    } else if cell.eq_ignore_ascii_case("n/a") {
        ("N/A".to_string(), String::new())
    } else {
        (String::new(), cell.to_string())
    };

    let mut odds = odds.replace("     +", "").trim().to_string();
    if odds.eq_ignore_ascii_case("even") {
        odds = "100".to_string();
    }

    BookLine {
        line: line.trim().to_string(),
        odds,
    }
}

pub fn parse_odds_html(html: &str) -> Result<OddsTable> {
    let document = Html::parse_document(html);
    let table_selector = Selector::parse("#full table")
        .ok()
        .context("Invalid table selector")?;
    let th_selector = Selector::parse("th").ok().context("Invalid th selector")?;
    let tr_selector = Selector::parse("tr").ok().context("Invalid tr selector")?;
    let td_selector = Selector::parse("td").ok().context("Invalid td selector")?;

    let table = document
        .select(&table_selector)
        .next()
        .context("Odds table not found")?;

    let books: Vec<String> = table
        .select(&th_selector)
        .map(|th| th.text().collect::<String>().trim().to_string())
        .take(BOOK_COLUMNS)
        .collect();

    let mut rows = Vec::new();
    for tr in table.select(&tr_selector).skip(1) {
        let cells: Vec<String> = tr
            .select(&td_selector)
            .map(|td| td.text().collect::<String>().trim().to_string())
            .collect();
        if cells.len() < BOOK_COLUMNS + 2 {
            continue;
        }

        let mut team_info = cells[0].split_whitespace();
        let number = team_info.next().unwrap_or_default().to_string();
        let team = team_info.collect::<Vec<_>>().join(" ");

        let lines = cells[1..=books.len()]
            .iter()
            .map(|cell| split_line_and_odds(cell))
            .collect();

        rows.push(OddsRow {
            number,
            team,
            lines,
        });
    }

    Ok(OddsTable { books, rows })
}

pub struct OddsScraper {
    client: reqwest::Client,
    url: String,
}

fn check_status(url: &str, status: reqwest::StatusCode) -> Result<()> {
    if !status.is_success() {
        anyhow::bail!("Odds page {} returned error: {}", url, status);
    }
    Ok(())
}

impl OddsScraper {
    pub fn new(url: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36")
            .build()
            .context("Failed to build odds client")?;

        Ok(Self {
            client,
            url: url.into(),
        })
    }

    pub async fn fetch_odds(&self) -> Result<OddsTable> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .context("Failed to fetch odds page")?;
        check_status(&self.url, response.status())?;

        let html = response.text().await?;
        parse_odds_html(&html)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page() -> String {
        let books = [
            "Open", "Consensus", "BetMGM", "DraftKings", "Caesars", "FanDuel", "bet365",
            "Fanatics", "ESPN BET", "BetRivers", "Hard Rock", "Extra",
        ];
        let header: String = books.iter().map(|b| format!("<th>{}</th>", b)).collect();
        let row = |team: &str, first: &str, draftkings: &str| {
            let mut cells = format!("<td>{}</td><td>{}</td>", team, first);
            cells.push_str("<td>n/a</td><td></td>");
            cells.push_str(&format!("<td>{}</td>", draftkings));
            for _ in 0..8 {
                cells.push_str("<td></td>");
            }
            format!("<tr>{}</tr>", cells)
        };

        format!(
            r#"<html><body><div id="full"><table>
            <tr>{}</tr>
            {}
            {}
            <tr><td>short</td><td>row</td></tr>
            </table></div></body></html>"#,
            header,
            row("451 Cowboys", "-3.5 -110", "-3 even"),
            row("452 Giants", "47.5", "+3 -105"),
        )
    }

    #[test]
    fn test_split_line_and_odds() {
        assert_eq!(
            split_line_and_odds("-3.5 -110"),
            BookLine { line: "-3.5".into(), odds: "-110".into() }
        );
        assert_eq!(
            split_line_and_odds("+7"),
            BookLine { line: "+7".into(), odds: "".into() }
        );
        assert_eq!(
            split_line_and_odds("N/A"),
            BookLine { line: "N/A".into(), odds: "".into() }
        );
        assert_eq!(
            split_line_and_odds("o47.5"),
            BookLine { line: "".into(), odds: "o47.5".into() }
        );
        assert_eq!(split_line_and_odds("-1 even").odds, "100");
        assert_eq!(split_line_and_odds(""), BookLine::default());
    }

    #[test]
    fn test_parse_odds_html() {
        let table = parse_odds_html(&page()).unwrap();
        assert_eq!(table.books.len(), BOOK_COLUMNS);
        assert_eq!(table.rows.len(), 2);

        let cowboys = &table.rows[0];
        assert_eq!(cowboys.number, "451");
        assert_eq!(cowboys.team, "Cowboys");
        assert_eq!(cowboys.lines[0].line, "-3.5");
        assert_eq!(cowboys.lines[1].line, "N/A");
        assert_eq!(table.headers()[2], "Open Line");
    }

    #[test]
    fn test_lookup_by_team() {
        let table = parse_odds_html(&page()).unwrap();
        let line = table.for_team(TeamCode::DAL, "DraftKings").unwrap();
        assert_eq!(line.line, "-3");
        assert_eq!(line.odds, "100");

        let lines = table.team_lines("draftkings");
        assert_eq!(lines[&TeamCode::NYG].odds, "-105");
        assert!(table.for_team(TeamCode::KC, "DraftKings").is_none());
        assert!(table.team_lines("Nowhere").is_empty());
    }

    #[test]
    fn test_error_status_is_reported() {
        let url = "https://www.vegasinsider.com/nfl/odds/las-vegas/";
        assert!(check_status(url, reqwest::StatusCode::OK).is_ok());

        let err = check_status(url, reqwest::StatusCode::FORBIDDEN).unwrap_err();
        assert!(err.to_string().contains("403"));
    }

    #[test]
    fn test_scraper_keeps_url() {
        let scraper = OddsScraper::new("https://example.com/odds").unwrap();
        assert_eq!(scraper.url, "https://example.com/odds");
    }

    #[test]
    fn test_missing_table() {
        assert!(parse_odds_html("<html><body></body></html>").is_err());
    }

    #[tokio::test]
    #[ignore] // Requires network access
    async fn test_fetch_odds() {
        let scraper = OddsScraper::new(crate::config::Config::default().odds_url).unwrap();
        let table = scraper.fetch_odds().await.unwrap();
        assert!(!table.rows.is_empty());
    }
}
