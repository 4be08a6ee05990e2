pub mod table_source;
pub mod team_rankings;
pub mod vegas_insider;
