//! Normalization of the decoder's event tables into [`MatchEvents`].
//!
//! Decoder versions disagree on column names, boolean spelling and number
//! formats, all of that is resolved here and nowhere else.

use crate::event::{BombEvent, BombEventKind, Death, EventKind, MatchEvents, RoundEnd, Side, Tick};

#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("match '{match_id}' has no '{table}' table")]
    MissingTable { match_id: String, table: &'static str },
    #[error("table '{table}' has no '{column}' column")]
    MissingColumn { table: String, column: &'static str },
    #[error("table '{table}' row {row}: invalid {column} value '{value}'")]
    InvalidValue {
        table: String,
        column: &'static str,
        row: usize,
        value: String,
    },
    #[error("could not read table '{table}'")]
    Read {
        table: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

/// Anything that can provide the decoded events of a set of matches.
pub trait EventSource {
    /// The ids of all matches available, in a stable order.
    fn matches(&self) -> Result<Vec<String>, SourceError>;

    fn load(&self, match_id: &str) -> Result<MatchEvents, SourceError>;
}

/// A decoder table as plain text cells, before any interpretation.
#[derive(Debug, Clone, PartialEq)]
pub struct RawTable {
    name: String,
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

#[derive(Debug, Clone, Copy)]
struct ColumnRef {
    name: &'static str,
    index: Option<usize>,
}

struct Cell<'t> {
    table: &'t str,
    column: &'static str,
    row: usize,
    value: &'t str,
}

impl<'t> Cell<'t> {
    fn invalid(&self) -> SourceError {
        SourceError::InvalidValue {
            table: self.table.to_owned(),
            column: self.column,
            row: self.row,
            value: self.value.to_owned(),
        }
    }

    fn text(&self) -> String {
        let value = self.value.trim();
        if value.eq_ignore_ascii_case("nan") || value.eq_ignore_ascii_case("none") {
            return String::new();
        }
        value.to_owned()
    }

    /// Steam ids sometimes come out of a dataframe as floats.
    fn id(&self) -> String {
        let text = self.text();
        match text.strip_suffix(".0") {
            Some(stripped) if stripped.bytes().all(|b| b.is_ascii_digit()) => stripped.to_owned(),
            _ => text,
        }
    }

    fn tick(&self) -> Result<Tick, SourceError> {
        let value = self.value.trim();
        if value.is_empty() {
            return Err(self.invalid());
        }
        self.count()
    }

    /// Unsigned integer, also accepting integral floats such as `1234.0`. Empty is 0.
    fn count(&self) -> Result<u32, SourceError> {
        let value = self.text();
        if value.is_empty() {
            return Ok(0);
        }
        if let Ok(v) = value.parse::<u32>() {
            return Ok(v);
        }

        match value.parse::<f64>() {
            Ok(v) if v.fract() == 0.0 && v >= 0.0 && v <= u32::MAX as f64 => Ok(v as u32),
            _ => Err(self.invalid()),
        }
    }

    /// Empty and `nan` are 0.
    fn float(&self) -> Result<f64, SourceError> {
        let value = self.text();
        if value.is_empty() {
            return Ok(0.0);
        }
        match value.parse::<f64>() {
            Ok(v) if v.is_finite() => Ok(v),
            Ok(_) => Ok(0.0),
            Err(_) => Err(self.invalid()),
        }
    }

    fn flag(&self) -> Result<bool, SourceError> {
        match self.text().to_ascii_lowercase().as_str() {
            "" | "false" | "0" | "0.0" => Ok(false),
            "true" | "1" | "1.0" => Ok(true),
            _ => Err(self.invalid()),
        }
    }

    fn side(&self) -> Option<Side> {
        Side::parse(self.value)
    }
}

impl RawTable {
    pub fn new<N>(name: N, headers: Vec<String>, rows: Vec<Vec<String>>) -> Self
    where
        N: Into<String>,
    {
        let headers = headers
            .into_iter()
            .map(|h| h.trim_start_matches('\u{feff}').trim().to_ascii_lowercase())
            .collect();

        Self {
            name: name.into(),
            headers,
            rows,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn optional(&self, aliases: &[&'static str]) -> ColumnRef {
        let index = aliases
            .iter()
            .find_map(|alias| self.headers.iter().position(|h| h == alias));

        ColumnRef {
            name: aliases[0],
            index,
        }
    }

    fn required(&self, aliases: &[&'static str]) -> Result<ColumnRef, SourceError> {
        let column = self.optional(aliases);
        if column.index.is_none() {
            return Err(SourceError::MissingColumn {
                table: self.name.clone(),
                column: column.name,
            });
        }
        Ok(column)
    }

    fn cell(&self, row: usize, column: ColumnRef) -> Cell<'_> {
        let value = column
            .index
            .and_then(|i| self.rows[row].get(i))
            .map(|v| v.as_str())
            .unwrap_or("");

        Cell {
            table: &self.name,
            column: column.name,
            row: row + 1,
            value,
        }
    }

    pub fn round_ends(&self) -> Result<Vec<RoundEnd>, SourceError> {
        let tick = self.required(&["tick"])?;
        let winner = self.required(&["winner", "winning_team"])?;
        let reason = self.required(&["reason", "round_end_reason"])?;

        (0..self.rows.len())
            .map(|row| {
                Ok(RoundEnd {
                    tick: self.cell(row, tick).tick()?,
                    winner: self.cell(row, winner).side(),
                    reason: self.cell(row, reason).text(),
                })
            })
            .collect()
    }

    pub fn deaths(&self) -> Result<Vec<Death>, SourceError> {
        let tick = self.required(&["tick"])?;
        let attacker_name = self.required(&["attacker_name"])?;
        let attacker_steamid = self.required(&["attacker_steamid"])?;
        let victim_name = self.required(&["victim_name", "user_name"])?;
        let victim_steamid = self.required(&["victim_steamid", "user_steamid"])?;
        let weapon = self.required(&["weapon"])?;
        let headshot = self.required(&["headshot"])?;
        let distance = self.required(&["distance"])?;
        let dmg_health = self.required(&["dmg_health"])?;
        let dmg_armor = self.required(&["dmg_armor"])?;
        let thrusmoke = self.required(&["thrusmoke"])?;
        let noscope = self.required(&["noscope"])?;
        let attackerblind = self.required(&["attackerblind"])?;
        let penetrated = self.required(&["penetrated"])?;

        let attacker_side = self.optional(&["attacker_side", "attacker_team_name"]);
        let victim_side = self.optional(&["victim_side", "user_side", "user_team_name"]);
        let attackerinair = self.optional(&["attackerinair"]);
        let hitgroup = self.optional(&["hitgroup"]);
        let assister_name = self.optional(&["assister_name"]);
        let assister_steamid = self.optional(&["assister_steamid"]);
        let assistedflash = self.optional(&["assistedflash"]);

        (0..self.rows.len())
            .map(|row| {
                let cell = |column| self.cell(row, column);

                Ok(Death {
                    tick: cell(tick).tick()?,
                    attacker_name: cell(attacker_name).text(),
                    attacker_steamid: cell(attacker_steamid).id(),
                    attacker_side: cell(attacker_side).side(),
                    victim_name: cell(victim_name).text(),
                    victim_steamid: cell(victim_steamid).id(),
                    victim_side: cell(victim_side).side(),
                    weapon: cell(weapon).text(),
                    headshot: cell(headshot).flag()?,
                    distance: cell(distance).float()?,
                    dmg_health: cell(dmg_health).count()?,
                    dmg_armor: cell(dmg_armor).count()?,
                    thrusmoke: cell(thrusmoke).flag()?,
                    noscope: cell(noscope).flag()?,
                    attackerblind: cell(attackerblind).flag()?,
                    penetrated: cell(penetrated).count()?,
                    attackerinair: cell(attackerinair).flag()?,
                    hitgroup: cell(hitgroup).text(),
                    assister_name: cell(assister_name).text(),
                    assister_steamid: cell(assister_steamid).id(),
                    assistedflash: cell(assistedflash).flag()?,
                })
            })
            .collect()
    }

    pub fn bombs(&self, kind: BombEventKind) -> Result<Vec<BombEvent>, SourceError> {
        let tick = self.required(&["tick"])?;

        (0..self.rows.len())
            .map(|row| {
                Ok(BombEvent {
                    tick: self.cell(row, tick).tick()?,
                    kind,
                })
            })
            .collect()
    }
}

/// Assembles the events of one match from its tables.
///
/// `table` is asked once per [`EventKind`] and returns `None` for a table that
/// does not exist. The round end and death tables are required, missing bomb
/// tables mean the match had no such events.
pub fn decode_match<F>(match_id: &str, map_name: String, mut table: F) -> Result<MatchEvents, SourceError>
where
    F: FnMut(EventKind) -> Result<Option<RawTable>, SourceError>,
{
    let mut required = |kind: EventKind| match table(kind)? {
        Some(t) => Ok(t),
        None => Err(SourceError::MissingTable {
            match_id: match_id.to_owned(),
            table: kind.table_name(),
        }),
    };

    let round_ends = required(EventKind::RoundEnd)?.round_ends()?;
    let deaths = required(EventKind::Death)?.deaths()?;

    let mut bombs = Vec::new();
    for kind in [BombEventKind::Planted, BombEventKind::Defused, BombEventKind::Exploded] {
        match table(kind.event_kind())? {
            Some(t) => bombs.extend(t.bombs(kind)?),
            None => {
                tracing::debug!(match_id, table = kind.event_kind().table_name(), "No bomb table");
            }
        }
    }

    Ok(MatchEvents {
        match_id: match_id.to_owned(),
        map_name,
        round_ends,
        deaths,
        bombs,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(name: &str, headers: &[&str], rows: &[&[&str]]) -> RawTable {
        RawTable::new(
            name,
            headers.iter().map(|h| h.to_string()).collect(),
            rows.iter()
                .map(|r| r.iter().map(|c| c.to_string()).collect())
                .collect(),
        )
    }

    #[test]
    fn round_end_aliases() {
        let rounds = table(
            "round_end",
            &["tick", "winning_team", "round_end_reason"],
            &[&["1000.0", "CT", "t_killed"], &["2500", "TERRORIST", "bomb_exploded"]],
        )
        .round_ends()
        .unwrap();

        assert_eq!(1000, rounds[0].tick);
        assert_eq!(Some(Side::CT), rounds[0].winner);
        assert_eq!(Some(Side::T), rounds[1].winner);
        assert_eq!("bomb_exploded", rounds[1].reason);
    }

    #[test]
    fn missing_column() {
        let result = table("round_end", &["tick", "winner"], &[&["1", "T"]]).round_ends();

        assert!(matches!(
            result,
            Err(SourceError::MissingColumn { column: "reason", .. })
        ));
    }

    #[test]
    fn invalid_flag() {
        let cell = Cell {
            table: "player_death",
            column: "headshot",
            row: 3,
            value: "maybe",
        };

        assert!(matches!(cell.flag(), Err(SourceError::InvalidValue { row: 3, .. })));
    }

    #[test]
    fn float_steamids() {
        let cell = Cell {
            table: "player_death",
            column: "attacker_steamid",
            row: 1,
            value: "76561198000000001.0",
        };

        assert_eq!("76561198000000001", cell.id());
    }
}
