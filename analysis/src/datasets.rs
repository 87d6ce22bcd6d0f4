//! Model-ready tables built from the per-round features of many matches.

use std::collections::{BTreeMap, BTreeSet};

use crate::aggregate::{sample_std, PlayerMatchStat};
use crate::event::WinReason;
use crate::features::{flag, MatchFeatureRow};
use crate::weapons::WeaponCategory;

/// Everything the dataset builders need to know about one match.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchAnalysis {
    pub match_id: String,
    pub map_name: String,
    pub rounds: Vec<MatchFeatureRow>,
    pub players: Vec<PlayerMatchStat>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FeatureRow {
    pub keys: Vec<String>,
    pub values: Vec<f64>,
}

/// A table of string key columns followed by numeric value columns.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureTable {
    pub name: String,
    pub key_columns: Vec<String>,
    pub value_columns: Vec<String>,
    pub rows: Vec<FeatureRow>,
}

impl FeatureTable {
    pub fn new(name: &str, key_columns: &[&str]) -> Self {
        Self {
            name: name.to_owned(),
            key_columns: key_columns.iter().map(|c| c.to_string()).collect(),
            value_columns: Vec::new(),
            rows: Vec::new(),
        }
    }

    /// Adds a row. Columns the table has not seen before are appended and
    /// backfilled with 0, columns missing from this row are set to 0.
    pub fn push<S>(&mut self, keys: Vec<String>, values: Vec<(S, f64)>)
    where
        S: AsRef<str>,
    {
        let mut row = vec![0.0; self.value_columns.len()];
        for (column, value) in values {
            let column = column.as_ref();
            match self.value_columns.iter().position(|c| c == column) {
                Some(position) => row[position] = value,
                None => {
                    self.value_columns.push(column.to_owned());
                    for existing in self.rows.iter_mut() {
                        existing.values.push(0.0);
                    }
                    row.push(value);
                }
            }
        }

        self.rows.push(FeatureRow { keys, values: row });
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.value_columns.iter().position(|c| c == name)
    }

    pub fn column(&self, name: &str) -> Option<Vec<f64>> {
        let index = self.column_index(name)?;
        Some(self.rows.iter().map(|r| r.values[index]).collect())
    }

    pub fn renamed(&self, name: &str) -> Self {
        Self {
            name: name.to_owned(),
            ..self.clone()
        }
    }

    /// Every value column except the given ones.
    pub fn columns_except(&self, excluded: &[&str]) -> Vec<String> {
        self.value_columns
            .iter()
            .filter(|c| !excluded.contains(&c.as_str()))
            .cloned()
            .collect()
    }

    /// Replaces every value `v` of the given columns with `(v - offset) / scale`, where
    /// `(offset, scale)` is computed from the whole column. A scale of 0 maps to 0.
    fn rescale<F>(&self, name: &str, columns: &[String], parameters: F) -> Self
    where
        F: Fn(&[f64]) -> (f64, f64),
    {
        let mut table = self.renamed(name);
        for column in columns {
            let index = match self.column_index(column) {
                Some(i) => i,
                None => continue,
            };
            let values: Vec<f64> = self.rows.iter().map(|r| r.values[index]).collect();
            let (offset, scale) = parameters(&values);
            for row in table.rows.iter_mut() {
                row.values[index] = if scale > 0.0 {
                    (row.values[index] - offset) / scale
                } else {
                    0.0
                };
            }
        }
        table
    }

    /// A copy with only the given value columns, in that order, of the rows `keep` accepts.
    /// Columns the table does not have are left out.
    pub fn project<F>(&self, name: &str, columns: &[&str], keep: F) -> Self
    where
        F: Fn(&FeatureRow) -> bool,
    {
        let indices: Vec<(usize, &str)> = columns
            .iter()
            .filter_map(|c| Some((self.column_index(c)?, *c)))
            .collect();

        Self {
            name: name.to_owned(),
            key_columns: self.key_columns.clone(),
            value_columns: indices.iter().map(|(_, c)| c.to_string()).collect(),
            rows: self
                .rows
                .iter()
                .filter(|r| keep(*r))
                .map(|r| FeatureRow {
                    keys: r.keys.clone(),
                    values: indices.iter().map(|(i, _)| r.values[*i]).collect(),
                })
                .collect(),
        }
    }

    /// Scales the given columns into `[0, 1]`. Constant columns become 0.
    pub fn min_max(&self, name: &str, columns: &[String]) -> Self {
        self.rescale(name, columns, |values| {
            let min = values.iter().copied().fold(f64::INFINITY, f64::min);
            let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            (min, max - min)
        })
    }

    /// Centers the given columns on 0 with unit population variance. Constant columns become 0.
    pub fn standardize(&self, name: &str, columns: &[String]) -> Self {
        self.rescale(name, columns, mean_std)
    }
}

fn mean_std(values: &[f64]) -> (f64, f64) {
    if values.is_empty() {
        return (0.0, 0.0);
    }
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;
    (mean, variance.sqrt())
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Quantile with linear interpolation between the closest ranks.
pub fn quantile(values: &[f64], q: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let position = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    let fraction = position - lower as f64;

    sorted[lower] + (sorted[upper] - sorted[lower]) * fraction
}

/// Index of the right-closed bin `(edges[i], edges[i + 1]]` the value falls in,
/// clamped to the first and last bin.
fn bin_index(value: f64, edges: &[f64]) -> f64 {
    let bins = edges.len().saturating_sub(1);
    if bins == 0 {
        return 0.0;
    }
    let position = edges[1..].iter().position(|edge| value <= *edge).unwrap_or(bins - 1);
    position as f64
}

fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator
    }
}

/// Stable numeric codes for the maps, in lexical order.
fn map_codes<'r, I>(maps: I) -> BTreeMap<String, f64>
where
    I: IntoIterator<Item = &'r str>,
{
    maps.into_iter()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .enumerate()
        .map(|(i, m)| (m.to_owned(), i as f64))
        .collect()
}

fn weapon_kills(row: &MatchFeatureRow, category: WeaponCategory) -> f64 {
    row.stats.kills.weapons.get(category) as f64
}

fn special_kills(row: &MatchFeatureRow) -> f64 {
    let situational = &row.stats.kills.situational;
    (situational.smoke + situational.wallbang + situational.noscope) as f64
}

fn round_keys(row: &MatchFeatureRow) -> Vec<String> {
    vec![row.match_id.clone(), row.map_name.clone(), row.round.index.to_string()]
}

/// All per-round statistics and match-relative features.
pub fn round_features(rows: &[MatchFeatureRow]) -> FeatureTable {
    let mut table = FeatureTable::new(
        "round_features",
        &[
            "match_id",
            "map_name",
            "round_num",
            "winner",
            "reason",
            "most_common_weapon",
            "first_kill_attacker",
            "first_kill_weapon",
        ],
    );

    for row in rows {
        let stats = &row.stats;
        let kills = &stats.kills;
        let context = &row.context;

        let keys = vec![
            row.match_id.clone(),
            row.map_name.clone(),
            row.round.index.to_string(),
            row.round.winner.map(|w| w.to_string()).unwrap_or_default(),
            row.round.reason.clone(),
            stats.most_common_weapon.clone().unwrap_or_default(),
            stats.first_kill.as_ref().map(|f| f.attacker.clone()).unwrap_or_default(),
            stats.first_kill.as_ref().map(|f| f.weapon.clone()).unwrap_or_default(),
        ];

        let mut values: Vec<(String, f64)> = vec![
            ("tick_start".to_owned(), row.round.start_tick as f64),
            ("tick_end".to_owned(), row.round.end_tick as f64),
            ("bomb_planted".to_owned(), flag(row.bomb_planted)),
            ("bomb_defused".to_owned(), flag(row.bomb_defused)),
            ("bomb_exploded".to_owned(), flag(row.bomb_exploded)),
            ("total_kills".to_owned(), kills.count as f64),
            ("headshot_kills".to_owned(), kills.headshots as f64),
            ("headshot_rate".to_owned(), kills.headshot_rate()),
            ("avg_kill_distance".to_owned(), kills.avg_distance()),
            ("max_kill_distance".to_owned(), kills.max_distance()),
            ("min_kill_distance".to_owned(), kills.min_distance()),
            ("std_kill_distance".to_owned(), stats.distance_std),
            ("total_damage".to_owned(), kills.damage as f64),
            ("avg_damage_per_kill".to_owned(), stats.avg_damage_per_kill),
            ("max_damage".to_owned(), stats.max_damage as f64),
            ("armor_damage".to_owned(), kills.armor_damage as f64),
            ("smoke_kills".to_owned(), kills.situational.smoke as f64),
            ("noscope_kills".to_owned(), kills.situational.noscope as f64),
            ("wallbang_kills".to_owned(), kills.situational.wallbang as f64),
            ("blind_kills".to_owned(), kills.situational.blind as f64),
            ("airborne_kills".to_owned(), kills.situational.airborne as f64),
            ("head_hits".to_owned(), stats.hitgroups.head as f64),
            ("chest_hits".to_owned(), stats.hitgroups.chest as f64),
            ("limb_hits".to_owned(), stats.hitgroups.limbs as f64),
            ("unique_killers".to_owned(), stats.unique_killers as f64),
            ("unique_victims".to_owned(), stats.unique_victims as f64),
            ("first_kill_tick".to_owned(), stats.first_kill_tick as f64),
            ("last_kill_tick".to_owned(), stats.last_kill_tick as f64),
            ("kill_spread".to_owned(), stats.kill_spread as f64),
            ("kill_tempo".to_owned(), stats.kill_tempo),
            (
                "first_kill_headshot".to_owned(),
                flag(stats.first_kill.as_ref().map(|f| f.headshot).unwrap_or(false)),
            ),
        ];
        values.extend(
            kills
                .weapons
                .iter()
                .map(|(category, count)| (format!("{}_kills", category.name()), count as f64)),
        );
        values.extend([
            ("prev_t_win".to_owned(), flag(context.prev_t_win)),
            ("prev_ct_win".to_owned(), flag(context.prev_ct_win)),
            ("t_score".to_owned(), context.t_score as f64),
            ("ct_score".to_owned(), context.ct_score as f64),
            ("score_diff".to_owned(), context.score_diff as f64),
            ("win_streak".to_owned(), context.win_streak as f64),
            ("t_win_streak".to_owned(), context.t_win_streak as f64),
            ("ct_win_streak".to_owned(), context.ct_win_streak as f64),
            ("prev_round_kills".to_owned(), context.prev_round_kills as f64),
            ("cumulative_kills".to_owned(), context.cumulative_kills as f64),
            ("rolling_kills_avg".to_owned(), context.rolling_kills_avg),
            ("rolling_damage_avg".to_owned(), context.rolling_damage_avg),
            ("rolling_headshot_avg".to_owned(), context.rolling_headshot_avg),
            ("t_win".to_owned(), flag(row.t_win())),
            ("ct_win".to_owned(), flag(row.ct_win())),
        ]);

        table.push(keys, values);
    }

    table
}

/// One row per match.
pub fn match_features(matches: &[MatchAnalysis]) -> FeatureTable {
    let mut table = FeatureTable::new("match_features", &["match_id", "map_name"]);

    for analysis in matches {
        let rounds = &analysis.rounds;
        let total_rounds = rounds.len() as f64;
        let t_rounds = rounds.iter().filter(|r| r.t_win()).count() as f64;
        let ct_rounds = rounds.iter().filter(|r| r.ct_win()).count() as f64;
        let count = |f: fn(&MatchFeatureRow) -> bool| rounds.iter().filter(|r| f(r)).count() as f64;

        let kills: u32 = rounds.iter().map(|r| r.stats.kills.count).sum();
        let headshots: u32 = rounds.iter().map(|r| r.stats.kills.headshots).sum();
        let damage = rounds.iter().fold(0u32, |sum, r| sum.saturating_add(r.stats.kills.damage));
        let distance: f64 = rounds
            .iter()
            .map(|r| r.stats.kills.avg_distance() * r.stats.kills.count as f64)
            .sum();
        let unique_players = analysis.players.iter().filter(|p| p.kills.count > 0).count();

        table.push(
            vec![analysis.match_id.clone(), analysis.map_name.clone()],
            vec![
                ("total_rounds", total_rounds),
                ("t_rounds_won", t_rounds),
                ("ct_rounds_won", ct_rounds),
                ("t_win_pct", ratio(t_rounds, total_rounds) * 100.0),
                ("overtime", flag(rounds.len() > 30)),
                ("bomb_planted", count(|r| r.bomb_planted)),
                ("bomb_defused", count(|r| r.bomb_defused)),
                ("bomb_exploded", count(|r| r.bomb_exploded)),
                ("total_kills", kills as f64),
                ("total_headshots", headshots as f64),
                ("headshot_rate", ratio(headshots as f64, kills as f64)),
                ("avg_kill_distance", ratio(distance, kills as f64)),
                ("total_damage", damage as f64),
                ("unique_players", unique_players as f64),
            ],
        );
    }

    table
}

/// One row per player over every match the player appears in.
pub fn player_features(matches: &[MatchAnalysis]) -> FeatureTable {
    let mut per_player: BTreeMap<&str, Vec<&PlayerMatchStat>> = BTreeMap::new();
    for analysis in matches {
        for player in analysis.players.iter() {
            per_player.entry(player.steamid.as_str()).or_default().push(player);
        }
    }

    let mut table = FeatureTable::new("player_features", &["steamid", "player_name"]);
    for (steamid, stats) in per_player {
        let matches_played = stats.len() as f64;
        let kills: u32 = stats.iter().map(|s| s.kills.count).sum();
        let deaths: u32 = stats.iter().map(|s| s.deaths).sum();
        let assists: u32 = stats.iter().map(|s| s.assists).sum();
        let headshots: u32 = stats.iter().map(|s| s.kills.headshots).sum();
        let damage = stats.iter().fold(0u32, |sum, s| sum.saturating_add(s.kills.damage));
        let rounds: u32 = stats.iter().map(|s| s.rounds_played).sum();
        let opening_kills: u32 = stats.iter().map(|s| s.opening_kills).sum();
        let rounds_with_2k: u32 = stats.iter().map(|s| s.rounds_with_2k).sum();
        let rounds_with_3k: u32 = stats.iter().map(|s| s.rounds_with_3k).sum();
        let per_round = |value: u32| value as f64 / rounds.max(1) as f64;

        let kd: Vec<f64> = stats.iter().map(|s| s.kd_ratio()).collect();
        let headshot_pct: Vec<f64> = stats.iter().map(|s| s.headshot_pct()).collect();
        let avg_distance: Vec<f64> = stats.iter().map(|s| s.kills.avg_distance()).collect();
        let match_kills: Vec<f64> = stats.iter().map(|s| s.kills.count as f64).collect();

        let name = stats.first().map(|s| s.name.clone()).unwrap_or_default();

        let mut values: Vec<(String, f64)> = vec![
            ("matches_played".to_owned(), matches_played),
            ("total_kills".to_owned(), kills as f64),
            ("total_deaths".to_owned(), deaths as f64),
            ("total_assists".to_owned(), assists as f64),
            ("headshot_kills".to_owned(), headshots as f64),
            ("total_damage".to_owned(), damage as f64),
            ("avg_kill_distance".to_owned(), mean(&avg_distance)),
            ("kd_ratio".to_owned(), mean(&kd)),
            ("headshot_pct".to_owned(), mean(&headshot_pct)),
            ("overall_kd".to_owned(), kills as f64 / deaths.max(1) as f64),
            ("kills_per_match".to_owned(), kills as f64 / matches_played),
            ("deaths_per_match".to_owned(), deaths as f64 / matches_played),
            ("damage_per_match".to_owned(), damage as f64 / matches_played),
            ("kd_ratio_std".to_owned(), sample_std(kd.iter().copied())),
            ("kd_ratio_min".to_owned(), kd.iter().copied().fold(f64::INFINITY, f64::min)),
            ("kd_ratio_max".to_owned(), kd.iter().copied().fold(f64::NEG_INFINITY, f64::max)),
            ("headshot_pct_std".to_owned(), sample_std(headshot_pct.iter().copied())),
            ("kills_std".to_owned(), sample_std(match_kills.iter().copied())),
            ("rounds_played".to_owned(), rounds as f64),
            ("kills_per_round".to_owned(), per_round(kills)),
            ("assists_per_round".to_owned(), per_round(assists)),
            ("opening_kills".to_owned(), opening_kills as f64),
            ("opening_kill_rate".to_owned(), per_round(opening_kills)),
            ("rounds_with_2k".to_owned(), rounds_with_2k as f64),
            ("rounds_with_3k".to_owned(), rounds_with_3k as f64),
            ("multi_kill_rate".to_owned(), per_round(rounds_with_2k)),
        ];
        for category in WeaponCategory::ALL {
            let category_kills: u32 = stats.iter().map(|s| s.kills.weapons.get(category)).sum();
            values.push((
                format!("{}_kill_pct", category.name()),
                ratio(category_kills as f64, kills as f64) * 100.0,
            ));
        }

        table.push(vec![steamid.to_owned(), name], values);
    }

    table
}

const PLAYER_CLUSTER_COLUMNS: &[&str] = &[
    "overall_kd",
    "headshot_pct",
    "avg_kill_distance",
    "kills_per_match",
    "deaths_per_match",
    "kd_ratio_std",
    "matches_played",
    "kills_per_round",
    "assists_per_round",
    "opening_kill_rate",
    "multi_kill_rate",
    "awp_kill_pct",
    "rifle_kill_pct",
];

/// Players need this many matches before their play style is clustered.
pub const MIN_CLUSTER_MATCHES: f64 = 2.0;

/// Play-style features per player with at least [`MIN_CLUSTER_MATCHES`] matches.
/// Returns the raw and the min-max normalized table.
pub fn player_clustering(matches: &[MatchAnalysis]) -> (FeatureTable, FeatureTable) {
    let players = player_features(matches);
    let played = players.column_index("matches_played");

    let table = players.project("clustering_players", PLAYER_CLUSTER_COLUMNS, |row| {
        played.is_some_and(|i| row.values[i] >= MIN_CLUSTER_MATCHES)
    });
    let columns = table.value_columns.clone();
    let normalized = table.min_max("clustering_players_normalized", &columns);

    (table, normalized)
}

const CLASSIFICATION_UNSCALED: &[&str] = &["round_num", "t_win", "ct_win", "map_encoded"];

/// Round winner prediction: rounds with at least one kill, leakage-free predictors plus
/// derived ratio, interaction and polynomial terms. Returns the raw and the standardized table.
pub fn classification(rows: &[MatchFeatureRow]) -> (FeatureTable, FeatureTable) {
    let mut table = FeatureTable::new("classification_features", &["match_id", "map_name", "round"]);
    let codes = map_codes(rows.iter().map(|r| r.map_name.as_str()));

    for row in rows.iter().filter(|r| r.stats.kills.count > 0) {
        let kills = row.stats.kills.count as f64;
        let headshot_rate = row.stats.kills.headshot_rate();
        let distance = row.stats.kills.avg_distance();
        let rifle = weapon_kills(row, WeaponCategory::Rifle);
        let awp = weapon_kills(row, WeaponCategory::Awp);
        let pistol = weapon_kills(row, WeaponCategory::Pistol);

        let mut values: Vec<(String, f64)> = row
            .predictors()
            .into_iter()
            .map(|(name, value)| (name.to_owned(), value))
            .collect();
        values.extend([
            ("headshot_efficiency".to_owned(), row.stats.kills.headshots as f64 / (kills + 1.0)),
            ("rifle_ratio".to_owned(), rifle / (kills + 1.0)),
            ("awp_ratio".to_owned(), awp / (kills + 1.0)),
            ("pistol_ratio".to_owned(), pistol / (kills + 1.0)),
            ("special_kills_ratio".to_owned(), special_kills(row) / (kills + 1.0)),
            ("awp_long_range".to_owned(), awp * distance),
            ("rifle_headshot".to_owned(), rifle * headshot_rate),
            ("damage_per_distance".to_owned(), row.stats.kills.damage as f64 / (distance + 1.0)),
            ("kills_per_tick".to_owned(), kills / (row.stats.kill_spread as f64 + 1.0) * 1000.0),
            ("kills_squared".to_owned(), kills.powi(2)),
            ("distance_squared".to_owned(), distance.powi(2)),
            ("headshot_squared".to_owned(), headshot_rate.powi(2)),
            ("kill_level".to_owned(), bin_index(kills, &[0.0, 3.0, 5.0, 7.0, 10.0])),
            ("distance_level".to_owned(), bin_index(distance, &[0.0, 10.0, 20.0, 30.0, 100.0])),
            ("headshot_level".to_owned(), bin_index(headshot_rate, &[-0.01, 0.33, 0.66, 1.01])),
            ("map_encoded".to_owned(), codes.get(&row.map_name).copied().unwrap_or(0.0)),
        ]);
        for map in codes.keys() {
            values.push((format!("map_{}", map), flag(*map == row.map_name)));
        }
        values.extend([
            ("t_win".to_owned(), flag(row.t_win())),
            ("ct_win".to_owned(), flag(row.ct_win())),
        ]);

        table.push(round_keys(row), values);
    }

    let scaled = table.standardize(
        "classification_features_scaled",
        &table.columns_except(CLASSIFICATION_UNSCALED),
    );
    (table, scaled)
}

/// Kill/damage regression with log, interaction, polynomial and rolling terms.
pub fn regression(rows: &[MatchFeatureRow]) -> FeatureTable {
    let mut per_map: BTreeMap<&str, Vec<&MatchFeatureRow>> = BTreeMap::new();
    for row in rows {
        per_map.entry(row.map_name.as_str()).or_default().push(row);
    }
    let map_means: BTreeMap<&str, (f64, f64, f64)> = per_map
        .into_iter()
        .map(|(map, rows)| {
            let kills: Vec<f64> = rows.iter().map(|r| r.stats.kills.count as f64).collect();
            let headshots: Vec<f64> = rows.iter().map(|r| r.stats.kills.headshot_rate()).collect();
            let distance: Vec<f64> = rows.iter().map(|r| r.stats.kills.avg_distance()).collect();
            (map, (mean(&kills), mean(&headshots), mean(&distance)))
        })
        .collect();

    let mut table = FeatureTable::new("regression_features", &["match_id", "map_name", "round"]);
    for row in rows {
        let kills = row.stats.kills.count as f64;
        let damage = row.stats.kills.damage as f64;
        let headshot_rate = row.stats.kills.headshot_rate();
        let distance = row.stats.kills.avg_distance();
        let spread = row.stats.kill_spread as f64;
        let round = row.round.index as f64;
        let (map_kills, map_headshots, map_distance) =
            map_means.get(row.map_name.as_str()).copied().unwrap_or_default();

        table.push(
            round_keys(row),
            vec![
                ("target_kills", kills),
                ("target_damage", damage),
                ("target_headshot_rate", headshot_rate),
                ("bomb_planted", flag(row.bomb_planted)),
                ("prev_t_win", flag(row.context.prev_t_win)),
                ("prev_ct_win", flag(row.context.prev_ct_win)),
                ("t_score", row.context.t_score as f64),
                ("ct_score", row.context.ct_score as f64),
                ("score_diff", row.context.score_diff as f64),
                ("map_avg_total_kills", map_kills),
                ("map_avg_headshot_rate", map_headshots),
                ("map_avg_avg_kill_distance", map_distance),
                ("total_kills_log", kills.ln_1p()),
                ("total_damage_log", damage.ln_1p()),
                ("avg_kill_distance_log", distance.ln_1p()),
                ("kill_spread_log", spread.ln_1p()),
                ("rifle_x_headshot", weapon_kills(row, WeaponCategory::Rifle) * headshot_rate),
                ("awp_x_distance", weapon_kills(row, WeaponCategory::Awp) * distance),
                ("kills_x_damage", kills * row.stats.avg_damage_per_kill),
                ("kills_poly2", kills.powi(2)),
                ("distance_poly2", distance.powi(2)),
                ("damage_poly2", damage.powi(2)),
                ("round_normalized", round / 30.0),
                ("is_early_round", flag(row.round.index <= 5)),
                ("is_late_round", flag(row.round.index >= 25)),
                ("rolling_kills_avg", row.context.rolling_kills_avg),
                ("rolling_damage_avg", row.context.rolling_damage_avg),
                ("rolling_headshot_avg", row.context.rolling_headshot_avg),
                ("prob_t_win", flag(row.t_win())),
            ],
        );
    }

    table
}

/// Play-style features per round. Returns the min-max normalized and the standardized table.
pub fn clustering(rows: &[MatchFeatureRow]) -> (FeatureTable, FeatureTable) {
    let distances: Vec<f64> = rows.iter().map(|r| r.stats.kills.avg_distance()).collect();
    let min_distance = distances.iter().copied().fold(f64::INFINITY, f64::min);
    let max_distance = distances.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    let mut table = FeatureTable::new("clustering_features", &["match_id", "round", "winner", "map_name"]);
    for row in rows {
        let stats = &row.stats;
        let kills = stats.kills.count as f64;
        let headshot_rate = stats.kills.headshot_rate();
        let distance = stats.kills.avg_distance();
        let spread = stats.kill_spread as f64;

        let prop = |value: f64| value / (kills + 1.0);
        let rifle = weapon_kills(row, WeaponCategory::Rifle);
        let awp = weapon_kills(row, WeaponCategory::Awp);
        let pistol = weapon_kills(row, WeaponCategory::Pistol);
        let smg = weapon_kills(row, WeaponCategory::Smg);
        let prop_awp = prop(awp);
        let prop_special = prop(special_kills(row));

        table.push(
            vec![
                row.match_id.clone(),
                row.round.index.to_string(),
                row.round.winner.map(|w| w.to_string()).unwrap_or_default(),
                row.map_name.clone(),
            ],
            vec![
                ("total_kills", kills),
                ("headshot_rate", headshot_rate),
                ("avg_kill_distance", distance),
                ("std_kill_distance", stats.distance_std),
                ("total_damage", stats.kills.damage as f64),
                ("avg_damage_per_kill", stats.avg_damage_per_kill),
                ("kill_spread", spread),
                ("unique_killers", stats.unique_killers as f64),
                ("prop_rifle", prop(rifle)),
                ("prop_awp", prop_awp),
                ("prop_pistol", prop(pistol)),
                ("prop_smg", prop(smg)),
                ("prop_headshot", prop(stats.kills.headshots as f64)),
                ("prop_special", prop_special),
                (
                    "aggression_index",
                    (stats.kills.damage as f64 / 100.0) * (kills / 5.0) / (spread / 1000.0 + 1.0),
                ),
                ("precision_index", headshot_rate * (stats.avg_damage_per_kill / 100.0)),
                (
                    "range_preference",
                    (distance - min_distance) / (max_distance - min_distance + 1.0),
                ),
                ("team_play_index", stats.unique_killers as f64 / 5.0),
                ("kill_consistency", 1.0 - stats.distance_std / (distance + 1.0)),
                ("damage_consistency", stats.avg_damage_per_kill / (stats.max_damage as f64 + 1.0)),
                (
                    "economy_tier",
                    (rifle * 3.0 + awp * 4.0 + smg * 2.0 + pistol) / (kills + 1.0),
                ),
                (
                    "skill_expression",
                    headshot_rate * 0.4 + prop_awp * 0.3 + prop_special * 0.3,
                ),
            ],
        );
    }

    let columns = table.value_columns.clone();
    (
        table.min_max("clustering_features_normalized", &columns),
        table.standardize("clustering_features_standardized", &columns),
    )
}

const FPM_MAPS: &[&str] = &["inferno", "mirage", "dust2", "overpass", "train", "nuke", "ancient"];

fn reason_items(reason: &str) -> [(&'static str, bool); 4] {
    let parsed = WinReason::parse(reason);
    let text = reason.to_ascii_lowercase();

    [
        (
            "elimination",
            parsed.map(|r| r.is_elimination()).unwrap_or(false)
                || text.contains("killed")
                || text.contains("eliminated"),
        ),
        (
            "bomb_exploded",
            parsed == Some(WinReason::BombExploded) || text.contains("exploded"),
        ),
        (
            "bomb_defused",
            parsed == Some(WinReason::BombDefused) || text.contains("defused"),
        ),
        (
            "time_out",
            parsed.map(|r| r.is_time_out()).unwrap_or(false) || text.contains("time"),
        ),
    ]
}

/// Binary items per round for frequent pattern mining. Returns the item matrix and the
/// transaction table (`round_id`, comma separated `items`, `n_items`).
pub fn frequent_patterns(rows: &[MatchFeatureRow]) -> (FeatureTable, FeatureTable) {
    let spreads: Vec<f64> = rows.iter().map(|r| r.stats.kill_spread as f64).collect();
    let distances: Vec<f64> = rows.iter().map(|r| r.stats.kills.avg_distance()).collect();
    let distance_stds: Vec<f64> = rows.iter().map(|r| r.stats.distance_std).collect();

    let quick_round = quantile(&spreads, 0.25);
    let long_round = quantile(&spreads, 0.75);
    let close_range = quantile(&distances, 0.25);
    let long_range = quantile(&distances, 0.75);
    let mixed_range = quantile(&distance_stds, 0.75);

    let mut items_table = FeatureTable::new("fpm_binary_features", &["match_id", "round"]);
    let mut transactions = FeatureTable::new("fpm_transactions", &["round_id", "items"]);

    for row in rows {
        let stats = &row.stats;
        let has = |category| weapon_kills(row, category) > 0.0;
        let headshot_rate = stats.kills.headshot_rate();
        let situational = &stats.kills.situational;

        let mut items: Vec<(String, bool)> = vec![
            ("rifle_used", has(WeaponCategory::Rifle)),
            ("awp_used", has(WeaponCategory::Awp)),
            (
                "pistol_only",
                has(WeaponCategory::Pistol) && !has(WeaponCategory::Rifle) && !has(WeaponCategory::Awp),
            ),
            ("smg_used", has(WeaponCategory::Smg)),
            ("shotgun_used", has(WeaponCategory::Shotgun)),
            ("knife_kill", has(WeaponCategory::Knife)),
            ("grenade_kill", has(WeaponCategory::Grenade)),
            ("high_headshot", headshot_rate > 0.5),
            ("perfect_headshot", stats.kills.count > 0 && headshot_rate == 1.0),
            ("multi_kill", stats.kills.count >= 5),
            ("dominant", stats.kills.count >= 7),
            ("quick_round", (stats.kill_spread as f64) < quick_round),
            ("long_round", (stats.kill_spread as f64) > long_round),
            ("smoke_kill", situational.smoke > 0),
            ("wallbang", situational.wallbang > 0),
            ("noscope", situational.noscope > 0),
            ("blind_kill", situational.blind > 0),
            ("long_range", stats.kills.avg_distance() > long_range),
            ("close_range", stats.kills.avg_distance() < close_range),
            ("mixed_range", stats.distance_std > mixed_range),
            ("team_spread", stats.unique_killers >= 3),
            ("carry_performance", stats.unique_killers <= 2),
            ("t_win", row.t_win()),
            ("ct_win", row.ct_win()),
        ]
        .into_iter()
        .map(|(name, present)| (name.to_owned(), present))
        .collect();

        items.extend(
            reason_items(&row.round.reason)
                .into_iter()
                .map(|(name, present)| (name.to_owned(), present)),
        );
        let map = row.map_name.to_ascii_lowercase();
        items.extend(
            FPM_MAPS
                .iter()
                .map(|m| (format!("map_{}", m), map.contains(m))),
        );

        let present: Vec<&str> = items
            .iter()
            .filter(|(_, present)| *present)
            .map(|(name, _)| name.as_str())
            .collect();
        transactions.push(
            vec![format!("{}_{}", row.match_id, row.round.index), present.join(",")],
            vec![("n_items", present.len() as f64)],
        );

        items_table.push(
            vec![row.match_id.clone(), row.round.index.to_string()],
            items
                .into_iter()
                .map(|(name, present)| (format!("item_{}", name), flag(present)))
                .collect(),
        );
    }

    (items_table, transactions)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quantile_interpolates() {
        assert_eq!(2.5, quantile(&[4.0, 1.0, 2.0, 3.0], 0.5));
        assert_eq!(1.75, quantile(&[1.0, 2.0, 3.0, 4.0], 0.25));
        assert_eq!(0.0, quantile(&[], 0.5));
    }

    #[test]
    fn bins_are_right_closed() {
        let edges = [0.0, 3.0, 5.0, 7.0, 10.0];
        assert_eq!(0.0, bin_index(3.0, &edges));
        assert_eq!(1.0, bin_index(4.0, &edges));
        assert_eq!(3.0, bin_index(12.0, &edges));
    }

    #[test]
    fn push_backfills_new_columns() {
        let mut table = FeatureTable::new("t", &["k"]);
        table.push(vec!["a".to_owned()], vec![("x", 1.0)]);
        table.push(vec!["b".to_owned()], vec![("y", 2.0), ("x", 3.0)]);

        assert_eq!(vec!["x".to_owned(), "y".to_owned()], table.value_columns);
        assert_eq!(vec![1.0, 0.0], table.rows[0].values);
        assert_eq!(vec![3.0, 2.0], table.rows[1].values);
    }

    #[test]
    fn scaling_constant_columns() {
        let mut table = FeatureTable::new("t", &["k"]);
        table.push(vec!["a".to_owned()], vec![("x", 1.0), ("c", 5.0)]);
        table.push(vec!["b".to_owned()], vec![("x", 3.0), ("c", 5.0)]);
        let columns = table.value_columns.clone();

        let normalized = table.min_max("n", &columns);
        assert_eq!(vec![0.0, 1.0], normalized.column("x").unwrap());
        assert_eq!(vec![0.0, 0.0], normalized.column("c").unwrap());

        let standardized = table.standardize("s", &columns);
        assert_eq!(vec![-1.0, 1.0], standardized.column("x").unwrap());
        assert_eq!(vec![0.0, 0.0], standardized.column("c").unwrap());
    }
}
