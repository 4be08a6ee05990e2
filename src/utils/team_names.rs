use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Canonical franchise codes, as used by the schedule and the model schema
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TeamCode {
    ARI,
    ATL,
    BAL,
    BUF,
    CAR,
    CHI,
    CIN,
    CLE,
    DAL,
    DEN,
    DET,
    GB,
    HOU,
    IND,
    JAX,
    KC,
    LAC,
    LAR,
    LV,
    MIA,
    MIN,
    NE,
    NO,
    NYG,
    NYJ,
    PHI,
    PIT,
    SEA,
    SF,
    TB,
    TEN,
    WAS,
}

impl TeamCode {
    pub const ALL: [TeamCode; 32] = [
        TeamCode::ARI,
        TeamCode::ATL,
        TeamCode::BAL,
        TeamCode::BUF,
        TeamCode::CAR,
        TeamCode::CHI,
        TeamCode::CIN,
        TeamCode::CLE,
        TeamCode::DAL,
        TeamCode::DEN,
        TeamCode::DET,
        TeamCode::GB,
        TeamCode::HOU,
        TeamCode::IND,
        TeamCode::JAX,
        TeamCode::KC,
        TeamCode::LAC,
        TeamCode::LAR,
        TeamCode::LV,
        TeamCode::MIA,
        TeamCode::MIN,
        TeamCode::NE,
        TeamCode::NO,
        TeamCode::NYG,
        TeamCode::NYJ,
        TeamCode::PHI,
        TeamCode::PIT,
        TeamCode::SEA,
        TeamCode::SF,
        TeamCode::TB,
        TeamCode::TEN,
        TeamCode::WAS,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            TeamCode::ARI => "ARI",
            TeamCode::ATL => "ATL",
            TeamCode::BAL => "BAL",
            TeamCode::BUF => "BUF",
            TeamCode::CAR => "CAR",
            TeamCode::CHI => "CHI",
            TeamCode::CIN => "CIN",
            TeamCode::CLE => "CLE",
            TeamCode::DAL => "DAL",
            TeamCode::DEN => "DEN",
            TeamCode::DET => "DET",
            TeamCode::GB => "GB",
            TeamCode::HOU => "HOU",
            TeamCode::IND => "IND",
            TeamCode::JAX => "JAX",
            TeamCode::KC => "KC",
            TeamCode::LAC => "LAC",
            TeamCode::LAR => "LAR",
            TeamCode::LV => "LV",
            TeamCode::MIA => "MIA",
            TeamCode::MIN => "MIN",
            TeamCode::NE => "NE",
            TeamCode::NO => "NO",
            TeamCode::NYG => "NYG",
            TeamCode::NYJ => "NYJ",
            TeamCode::PHI => "PHI",
            TeamCode::PIT => "PIT",
            TeamCode::SEA => "SEA",
            TeamCode::SF => "SF",
            TeamCode::TB => "TB",
            TeamCode::TEN => "TEN",
            TeamCode::WAS => "WAS",
        }
    }

    /// Name variants seen across TeamRankings, nflverse and the odds pages.
    /// Relocated franchises keep their old codes as aliases.
    pub fn aliases(&self) -> &'static [&'static str] {
        match self {
            TeamCode::ARI => &["Arizona", "Cardinals", "Arizona Cardinals", "ARZ"],
            TeamCode::ATL => &["Atlanta", "Falcons", "Atlanta Falcons"],
            TeamCode::BAL => &["Baltimore", "Ravens", "Baltimore Ravens", "BLT"],
            TeamCode::BUF => &["Buffalo", "Bills", "Buffalo Bills"],
            TeamCode::CAR => &["Carolina", "Panthers", "Carolina Panthers"],
            TeamCode::CHI => &["Chicago", "Bears", "Chicago Bears"],
            TeamCode::CIN => &["Cincinnati", "Bengals", "Cincinnati Bengals"],
            TeamCode::CLE => &["Cleveland", "Browns", "Cleveland Browns", "CLV"],
            TeamCode::DAL => &["Dallas", "Cowboys", "Dallas Cowboys"],
            TeamCode::DEN => &["Denver", "Broncos", "Denver Broncos"],
            TeamCode::DET => &["Detroit", "Lions", "Detroit Lions"],
            TeamCode::GB => &["Green Bay", "Packers", "Green Bay Packers", "GNB"],
            TeamCode::HOU => &["Houston", "Texans", "Houston Texans", "HST"],
            TeamCode::IND => &["Indianapolis", "Colts", "Indianapolis Colts"],
            TeamCode::JAX => &["Jacksonville", "Jaguars", "Jacksonville Jaguars", "JAC"],
            TeamCode::KC => &["Kansas City", "Chiefs", "Kansas City Chiefs", "KAN"],
            TeamCode::LAC => &[
                "LA Chargers",
                "Chargers",
                "Los Angeles Chargers",
                "San Diego",
                "San Diego Chargers",
                "SD",
            ],
            TeamCode::LAR => &[
                "LA Rams",
                "Rams",
                "Los Angeles Rams",
                "St. Louis",
                "St. Louis Rams",
                "LA",
                "STL",
            ],
            TeamCode::LV => &[
                "Las Vegas",
                "Raiders",
                "Las Vegas Raiders",
                "Oakland",
                "Oakland Raiders",
                "OAK",
                "LVR",
            ],
            TeamCode::MIA => &["Miami", "Dolphins", "Miami Dolphins"],
            TeamCode::MIN => &["Minnesota", "Vikings", "Minnesota Vikings"],
            TeamCode::NE => &["New England", "Patriots", "New England Patriots", "NWE"],
            TeamCode::NO => &["New Orleans", "Saints", "New Orleans Saints", "NOR"],
            TeamCode::NYG => &["NY Giants", "Giants", "New York Giants"],
            TeamCode::NYJ => &["NY Jets", "Jets", "New York Jets"],
            TeamCode::PHI => &["Philadelphia", "Eagles", "Philadelphia Eagles"],
            TeamCode::PIT => &["Pittsburgh", "Steelers", "Pittsburgh Steelers"],
            TeamCode::SEA => &["Seattle", "Seahawks", "Seattle Seahawks"],
            TeamCode::SF => &["San Francisco", "49ers", "San Francisco 49ers", "SFO"],
            TeamCode::TB => &["Tampa Bay", "Buccaneers", "Tampa Bay Buccaneers", "TAM"],
            TeamCode::TEN => &["Tennessee", "Titans", "Tennessee Titans"],
            TeamCode::WAS => &[
                "Washington",
                "Commanders",
                "Washington Commanders",
                "Football Team",
                "Washington Football Team",
                "WSH",
            ],
        }
    }

    /// Mascot name, which is how the odds page labels teams
    pub fn mascot(&self) -> &'static str {
        self.aliases()[1]
    }

    pub fn from_code(code: &str) -> Option<Self> {
        let code = code.trim();
        TeamCode::ALL
            .iter()
            .copied()
            .find(|team| team.code().eq_ignore_ascii_case(code))
    }
}

impl fmt::Display for TeamCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.code())
    }
}

impl FromStr for TeamCode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s) {
            Normalized::Mapped(team) => Ok(team),
            Normalized::Unmapped(name) => Err(format!("unknown team: {}", name)),
        }
    }
}

impl Serialize for TeamCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.code())
    }
}

impl<'de> Deserialize<'de> for TeamCode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Outcome of looking a team name up in the alias table
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Normalized {
    Mapped(TeamCode),
    Unmapped(String),
}

impl Normalized {
    pub fn code(&self) -> Option<TeamCode> {
        match self {
            Normalized::Mapped(team) => Some(*team),
            Normalized::Unmapped(_) => None,
        }
    }
}

/// Resolve a free-text team name, city, mascot or alternate code
pub fn normalize(name: &str) -> Normalized {
    let trimmed = name.trim();

    if let Some(team) = TeamCode::from_code(trimmed) {
        return Normalized::Mapped(team);
    }

    TeamCode::ALL
        .iter()
        .copied()
        .find(|team| {
            team.aliases()
                .iter()
                .any(|alias| alias.eq_ignore_ascii_case(trimmed))
        })
        .map(Normalized::Mapped)
        .unwrap_or_else(|| Normalized::Unmapped(trimmed.to_string()))
}

/// Canonical code text for `name`, or `name` unchanged when it is unknown
pub fn standardize(name: &str) -> String {
    match normalize(name) {
        Normalized::Mapped(team) => team.code().to_string(),
        Normalized::Unmapped(_) => name.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_team_rankings_names() {
        assert_eq!(normalize("Dallas"), Normalized::Mapped(TeamCode::DAL));
        assert_eq!(normalize("NY Giants"), Normalized::Mapped(TeamCode::NYG));
        assert_eq!(normalize("LA Rams"), Normalized::Mapped(TeamCode::LAR));
        assert_eq!(normalize("LA Chargers"), Normalized::Mapped(TeamCode::LAC));
        assert_eq!(normalize("Green Bay"), Normalized::Mapped(TeamCode::GB));
    }

    #[test]
    fn test_normalize_mascots_and_full_names() {
        assert_eq!(normalize("49ers"), Normalized::Mapped(TeamCode::SF));
        assert_eq!(normalize("Rams"), Normalized::Mapped(TeamCode::LAR));
        assert_eq!(normalize("commanders"), Normalized::Mapped(TeamCode::WAS));
        assert_eq!(
            normalize("  Kansas City Chiefs "),
            Normalized::Mapped(TeamCode::KC)
        );
    }

    #[test]
    fn test_normalize_nflverse_codes() {
        assert_eq!(normalize("LA"), Normalized::Mapped(TeamCode::LAR));
        assert_eq!(normalize("OAK"), Normalized::Mapped(TeamCode::LV));
        assert_eq!(normalize("SD"), Normalized::Mapped(TeamCode::LAC));
    }

    #[test]
    fn test_normalize_is_idempotent() {
        for team in TeamCode::ALL {
            assert_eq!(normalize(team.code()), Normalized::Mapped(team));
            assert_eq!(standardize(team.code()), team.code());
            for alias in team.aliases() {
                let once = standardize(alias);
                assert_eq!(once, team.code());
                assert_eq!(standardize(&once), once);
            }
        }
    }

    #[test]
    fn test_aliases_are_unique() {
        let mut seen = std::collections::HashSet::new();
        for team in TeamCode::ALL {
            assert!(seen.insert(team.code().to_lowercase()));
            for alias in team.aliases() {
                assert!(seen.insert(alias.to_lowercase()), "duplicate alias {}", alias);
            }
        }
    }

    #[test]
    fn test_unmapped_names_pass_through() {
        assert_eq!(
            normalize("New York"),
            Normalized::Unmapped("New York".to_string())
        );
        assert_eq!(standardize("Los Angeles"), "Los Angeles");
        assert!(normalize("Springfield").code().is_none());
    }

    #[test]
    fn test_team_code_serde() {
        let json = serde_json::to_string(&TeamCode::NYJ).unwrap();
        assert_eq!(json, "\"NYJ\"");
        let team: TeamCode = serde_json::from_str("\"Jets\"").unwrap();
        assert_eq!(team, TeamCode::NYJ);
        assert_eq!(TeamCode::from_code("kc"), Some(TeamCode::KC));
    }
}
