use std::collections::{BTreeMap, BTreeSet};

use crate::event::{Death, Side};
use crate::segment::{RoundRecord, SegmentedMatch};
use crate::weapons::{WeaponCounts, WeaponTaxonomy};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SituationalKills {
    pub smoke: u32,
    pub noscope: u32,
    pub wallbang: u32,
    pub blind: u32,
    pub airborne: u32,
}

/// Totals over a set of kills. Every rate and distance of an empty set is 0.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KillStats {
    pub count: u32,
    pub headshots: u32,
    pub damage: u32,
    pub armor_damage: u32,
    pub weapons: WeaponCounts,
    pub situational: SituationalKills,
    distance_sum: f64,
    distance_min: Option<f64>,
    distance_max: Option<f64>,
}

impl KillStats {
    fn record(&mut self, taxonomy: &WeaponTaxonomy, death: &Death) {
        self.count += 1;
        if death.headshot {
            self.headshots += 1;
        }
        self.damage = self.damage.saturating_add(death.dmg_health);
        self.armor_damage = self.armor_damage.saturating_add(death.dmg_armor);
        self.weapons.record(taxonomy, &death.weapon);

        if death.thrusmoke {
            self.situational.smoke += 1;
        }
        if death.noscope {
            self.situational.noscope += 1;
        }
        if death.is_wallbang() {
            self.situational.wallbang += 1;
        }
        if death.attackerblind {
            self.situational.blind += 1;
        }
        if death.attackerinair {
            self.situational.airborne += 1;
        }

        self.distance_sum += death.distance;
        self.distance_min = Some(self.distance_min.map_or(death.distance, |m| m.min(death.distance)));
        self.distance_max = Some(self.distance_max.map_or(death.distance, |m| m.max(death.distance)));
    }

    pub fn headshot_rate(&self) -> f64 {
        if self.count == 0 {
            return 0.0;
        }
        self.headshots as f64 / self.count as f64
    }

    pub fn avg_distance(&self) -> f64 {
        if self.count == 0 {
            return 0.0;
        }
        self.distance_sum / self.count as f64
    }

    pub fn min_distance(&self) -> f64 {
        self.distance_min.unwrap_or(0.0)
    }

    pub fn max_distance(&self) -> f64 {
        self.distance_max.unwrap_or(0.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlayerRoundStat {
    pub steamid: String,
    pub name: String,
    pub round_num: u32,
    pub kills: KillStats,
    pub deaths: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlayerMatchStat {
    pub steamid: String,
    pub name: String,
    pub side: Option<Side>,
    pub kills: KillStats,
    pub deaths: u32,
    pub assists: u32,
    pub rounds_played: u32,
    /// Rounds in which the player made the first valid kill.
    pub opening_kills: u32,
    pub rounds_with_2k: u32,
    pub rounds_with_3k: u32,
}

impl PlayerMatchStat {
    fn new(steamid: String, name: String, side: Option<Side>, rounds_played: u32) -> Self {
        Self {
            steamid,
            name,
            side,
            kills: KillStats::default(),
            deaths: 0,
            assists: 0,
            rounds_played,
            opening_kills: 0,
            rounds_with_2k: 0,
            rounds_with_3k: 0,
        }
    }

    pub fn kd_ratio(&self) -> f64 {
        self.kills.count as f64 / self.deaths.max(1) as f64
    }

    /// Headshot rate as a percentage, rounded to one decimal.
    pub fn headshot_pct(&self) -> f64 {
        (self.kills.headshot_rate() * 1000.0).round() / 10.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FirstKill {
    pub attacker: String,
    pub weapon: String,
    pub headshot: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HitGroups {
    pub head: u32,
    pub chest: u32,
    pub limbs: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RoundStat {
    pub round_num: u32,
    pub kills: KillStats,
    pub distance_std: f64,
    pub avg_damage_per_kill: f64,
    pub max_damage: u32,
    pub hitgroups: HitGroups,
    pub unique_killers: u32,
    pub unique_victims: u32,
    /// Ticks since the start of the round.
    pub first_kill_tick: u32,
    pub last_kill_tick: u32,
    pub kill_spread: u32,
    pub kill_tempo: f64,
    pub first_kill: Option<FirstKill>,
    pub most_common_weapon: Option<String>,
}

/// Every player taking part in a valid kill of the match, keyed by id, with the first name seen.
fn roster(segmented: &SegmentedMatch) -> BTreeMap<String, String> {
    let mut players = BTreeMap::new();
    for (_, death) in segmented.valid_deaths() {
        players
            .entry(death.attacker_id().to_owned())
            .or_insert_with(|| death.attacker_name.clone());
        players
            .entry(death.victim_id().to_owned())
            .or_insert_with(|| death.victim_name.clone());
    }
    players
}

/// One row per player and round, including all-zero rows for rounds the player did nothing in.
#[tracing::instrument(skip_all, fields(match_id = %segmented.match_id))]
pub fn player_round_stats(segmented: &SegmentedMatch, taxonomy: &WeaponTaxonomy) -> Vec<PlayerRoundStat> {
    let players = roster(segmented);

    let mut stats = Vec::with_capacity(players.len() * segmented.rounds.len());
    for (steamid, name) in players.iter() {
        for record in segmented.rounds.iter() {
            let mut stat = PlayerRoundStat {
                steamid: steamid.clone(),
                name: name.clone(),
                round_num: record.round.index,
                kills: KillStats::default(),
                deaths: 0,
            };

            for death in record.valid_deaths() {
                if death.attacker_id() == steamid {
                    stat.kills.record(taxonomy, death);
                }
                if death.victim_id() == steamid {
                    stat.deaths += 1;
                }
            }

            stats.push(stat);
        }
    }

    stats.sort_by(|a, b| a.steamid.cmp(&b.steamid).then(a.round_num.cmp(&b.round_num)));
    stats
}

#[tracing::instrument(skip_all, fields(match_id = %segmented.match_id))]
pub fn player_match_stats(segmented: &SegmentedMatch, taxonomy: &WeaponTaxonomy) -> Vec<PlayerMatchStat> {
    let rounds_played = segmented.rounds.len() as u32;
    let mut stats: BTreeMap<String, PlayerMatchStat> = roster(segmented)
        .into_iter()
        .map(|(steamid, name)| (steamid.clone(), PlayerMatchStat::new(steamid, name, None, rounds_played)))
        .collect();

    for (_, death) in segmented.valid_deaths() {
        if let Some(attacker) = stats.get_mut(death.attacker_id()) {
            attacker.kills.record(taxonomy, death);
            attacker.side = attacker.side.or(death.attacker_side);
        }
        if let Some(victim) = stats.get_mut(death.victim_id()) {
            victim.deaths += 1;
            victim.side = victim.side.or(death.victim_side);
        }

        let assister = if death.assister_steamid.is_empty() {
            death.assister_name.as_str()
        } else {
            death.assister_steamid.as_str()
        };
        if assister.is_empty() || assister == death.victim_id() || assister == death.attacker_id() {
            continue;
        }
        let assister = stats.entry(assister.to_owned()).or_insert_with(|| {
            PlayerMatchStat::new(
                assister.to_owned(),
                death.assister_name.clone(),
                death.attacker_side,
                rounds_played,
            )
        });
        assister.assists += 1;
    }

    for record in segmented.rounds.iter() {
        let mut round_kills = BTreeMap::<&str, u32>::new();
        for death in record.valid_deaths() {
            *round_kills.entry(death.attacker_id()).or_default() += 1;
        }

        if let Some(opening) = record.valid_deaths().next() {
            if let Some(player) = stats.get_mut(opening.attacker_id()) {
                player.opening_kills += 1;
            }
        }
        for (attacker, kills) in round_kills {
            if let Some(player) = stats.get_mut(attacker) {
                if kills >= 2 {
                    player.rounds_with_2k += 1;
                }
                if kills >= 3 {
                    player.rounds_with_3k += 1;
                }
            }
        }
    }

    tracing::debug!(players = stats.len(), "Aggregated player stats");

    stats.into_values().collect()
}

/// Exactly one row per round, rounds without kills included.
#[tracing::instrument(skip_all, fields(match_id = %segmented.match_id))]
pub fn round_stats(segmented: &SegmentedMatch, taxonomy: &WeaponTaxonomy) -> Vec<RoundStat> {
    segmented
        .rounds
        .iter()
        .map(|record| round_stat(record, taxonomy))
        .collect()
}

fn round_stat(record: &RoundRecord, taxonomy: &WeaponTaxonomy) -> RoundStat {
    let deaths: Vec<&Death> = record.valid_deaths().collect();

    let mut kills = KillStats::default();
    let mut hitgroups = HitGroups::default();
    let mut killers = BTreeSet::new();
    let mut victims = BTreeSet::new();
    let mut weapons = BTreeMap::<&str, u32>::new();
    let mut max_damage = 0;

    for death in deaths.iter().copied() {
        kills.record(taxonomy, death);
        max_damage = max_damage.max(death.dmg_health);
        killers.insert(death.attacker_name.as_str());
        victims.insert(death.victim_name.as_str());
        *weapons.entry(death.weapon.as_str()).or_default() += 1;

        let hitgroup = death.hitgroup.to_ascii_lowercase();
        if hitgroup == "head" {
            hitgroups.head += 1;
        } else if hitgroup == "chest" {
            hitgroups.chest += 1;
        } else if hitgroup.contains("arm") || hitgroup.contains("leg") {
            hitgroups.limbs += 1;
        }
    }

    let distance_std = sample_std(deaths.iter().map(|d| d.distance));
    let avg_damage_per_kill = if kills.count == 0 {
        0.0
    } else {
        kills.damage as f64 / kills.count as f64
    };

    let start = record.round.start_tick;
    let first_tick = deaths.iter().map(|d| d.tick).min();
    let last_tick = deaths.iter().map(|d| d.tick).max();
    let (first_kill_tick, last_kill_tick, kill_spread) = match (first_tick, last_tick) {
        (Some(first), Some(last)) => (
            first.saturating_sub(start),
            last.saturating_sub(start),
            last - first,
        ),
        _ => (0, 0, 0),
    };
    let kill_tempo = if kill_spread > 0 {
        kills.count as f64 / kill_spread as f64 * 1000.0
    } else {
        0.0
    };

    // deaths are ordered by tick, so the first one is the opening kill
    let first_kill = deaths.first().map(|d| FirstKill {
        attacker: d.attacker_name.clone(),
        weapon: d.weapon.clone(),
        headshot: d.headshot,
    });

    let mut most_common_weapon: Option<(&str, u32)> = None;
    for (weapon, count) in weapons {
        if most_common_weapon.map_or(true, |(_, best)| count > best) {
            most_common_weapon = Some((weapon, count));
        }
    }

    RoundStat {
        round_num: record.round.index,
        kills,
        distance_std,
        avg_damage_per_kill,
        max_damage,
        hitgroups,
        unique_killers: killers.len() as u32,
        unique_victims: victims.len() as u32,
        first_kill_tick,
        last_kill_tick,
        kill_spread,
        kill_tempo,
        first_kill,
        most_common_weapon: most_common_weapon.map(|(w, _)| w.to_owned()),
    }
}

/// Sample standard deviation, 0 for fewer than two values.
pub fn sample_std<I>(values: I) -> f64
where
    I: IntoIterator<Item = f64>,
{
    let values: Vec<f64> = values.into_iter().collect();
    if values.len() < 2 {
        return 0.0;
    }

    let mean = values.iter().sum::<f64>() / values.len() as f64;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    variance.sqrt()
}
