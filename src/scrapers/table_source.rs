use crate::error::Result;
use scraper::{ElementRef, Html, Selector};
use tracing::debug;

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

/// The first table found on a page: header texts plus non-empty data rows
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    pub fn column(&self, header: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == header)
    }
}

/// Anything that can turn a URL into a table. `Ok(None)` means the page
/// loaded but had no table element.
#[allow(async_fn_in_trait)]
pub trait TableSource {
    async fn fetch_table(&self, url: &str) -> Result<Option<RawTable>>;
}

pub struct HttpTableSource {
    client: reqwest::Client,
}

impl HttpTableSource {
    pub fn new() -> Result<Self> {
        Ok(Self {
            client: reqwest::Client::builder().user_agent(USER_AGENT).build()?,
        })
    }
}

impl TableSource for HttpTableSource {
    async fn fetch_table(&self, url: &str) -> Result<Option<RawTable>> {
        let html = self
            .client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        debug!("Fetched {} bytes from {}", html.len(), url);

        Ok(parse_first_table(&html))
    }
}

fn cell_text(el: ElementRef<'_>) -> String {
    el.text().collect::<String>().trim().to_string()
}

/// Extract the first `<table>` of a document
pub fn parse_first_table(html: &str) -> Option<RawTable> {
    let document = Html::parse_document(html);
    let table_selector = Selector::parse("table").ok()?;
    let th_selector = Selector::parse("th").ok()?;
    let tr_selector = Selector::parse("tr").ok()?;
    let td_selector = Selector::parse("td").ok()?;

    let table = document.select(&table_selector).next()?;

    let headers = table.select(&th_selector).map(cell_text).collect();
    let rows = table
        .select(&tr_selector)
        .map(|row| row.select(&td_selector).map(cell_text).collect::<Vec<_>>())
        .filter(|cells| cells.iter().any(|cell| !cell.is_empty()))
        .collect();

    Some(RawTable { headers, rows })
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
        <html><body>
        <table class="tr-table">
          <thead><tr><th>Rank</th><th>Team</th><th>2024</th><th>Last 3</th><th>2023</th></tr></thead>
          <tbody>
            <tr><td>1</td><td>Detroit</td><td>33.2</td><td>35.0</td><td>27.1</td></tr>
            <tr><td></td><td> </td><td></td><td></td><td></td></tr>
            <tr><td>2</td><td>Buffalo</td><td>30.9</td><td>31.3</td><td>26.5</td></tr>
          </tbody>
        </table>
        <table><tr><th>Other</th></tr></table>
        </body></html>
    "#;

    #[test]
    fn test_parse_first_table() {
        let table = parse_first_table(PAGE).unwrap();
        assert_eq!(table.headers, vec!["Rank", "Team", "2024", "Last 3", "2023"]);
        // header row has no <td> cells and the blank row is dropped
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0][1], "Detroit");
        assert_eq!(table.rows[1][2], "30.9");
        assert_eq!(table.column("Team"), Some(1));
    }

    #[test]
    fn test_page_without_table() {
        assert!(parse_first_table("<html><body><p>Loading…</p></body></html>").is_none());
    }
}
