//! Conversions between the analysis types and the rows of the written tables.

use analysis::aggregate::{KillStats, PlayerMatchStat, PlayerRoundStat};
use analysis::event::{Death, Side};
use analysis::segment::{Assigned, Round, RoundRecord, SegmentError, SegmentedMatch};
use analysis::weapons::WeaponCategory;
use common::tables::{DeathRow, PlayerRoundRow, PlayerRow, RoundRow};

fn side(side: Option<Side>) -> String {
    side.map(|s| s.to_string()).unwrap_or_default()
}

pub fn round_row(segmented: &SegmentedMatch, record: &RoundRecord) -> RoundRow {
    RoundRow {
        match_id: segmented.match_id.clone(),
        map_name: segmented.map_name.clone(),
        round_num: record.round.index,
        tick_start: record.round.start_tick,
        tick_end: record.round.end_tick,
        winner: side(record.round.winner),
        reason: record.round.reason.clone(),
        bomb_planted: record.bomb_planted,
        bomb_defused: record.bomb_defused,
        bomb_exploded: record.bomb_exploded,
    }
}

pub fn death_row(segmented: &SegmentedMatch, round: &Round, death: &Assigned<Death>) -> DeathRow {
    let Assigned { event, fallback } = death;

    DeathRow {
        match_id: segmented.match_id.clone(),
        map_name: segmented.map_name.clone(),
        round_num: round.index,
        fallback: *fallback,
        tick: event.tick,
        attacker_name: event.attacker_name.clone(),
        attacker_steamid: event.attacker_steamid.clone(),
        attacker_side: side(event.attacker_side),
        victim_name: event.victim_name.clone(),
        victim_steamid: event.victim_steamid.clone(),
        victim_side: side(event.victim_side),
        weapon: event.weapon.clone(),
        headshot: event.headshot,
        distance: event.distance,
        dmg_health: event.dmg_health,
        dmg_armor: event.dmg_armor,
        thrusmoke: event.thrusmoke,
        noscope: event.noscope,
        attackerblind: event.attackerblind,
        penetrated: event.penetrated,
        attackerinair: event.attackerinair,
        hitgroup: event.hitgroup.clone(),
        assister_name: event.assister_name.clone(),
        assister_steamid: event.assister_steamid.clone(),
        assistedflash: event.assistedflash,
    }
}

/// The valid deaths of the match, the only ones any later stage looks at.
pub fn death_rows(segmented: &SegmentedMatch) -> Vec<DeathRow> {
    segmented
        .deaths()
        .filter(|(_, death)| death.event.is_valid())
        .map(|(round, death)| death_row(segmented, round, death))
        .collect()
}

pub fn player_row(segmented: &SegmentedMatch, stat: &PlayerMatchStat) -> PlayerRow {
    let kills = &stat.kills;

    PlayerRow {
        match_id: segmented.match_id.clone(),
        map_name: segmented.map_name.clone(),
        steamid: stat.steamid.clone(),
        player_name: stat.name.clone(),
        side: side(stat.side),
        kills: kills.count,
        deaths: stat.deaths,
        assists: stat.assists,
        headshot_kills: kills.headshots,
        headshot_pct: stat.headshot_pct(),
        kd_ratio: stat.kd_ratio(),
        avg_kill_distance: kills.avg_distance(),
        max_kill_distance: kills.max_distance(),
        min_kill_distance: kills.min_distance(),
        total_damage: kills.damage,
        rifle_kills: kills.weapons.get(WeaponCategory::Rifle),
        awp_kills: kills.weapons.get(WeaponCategory::Awp),
        pistol_kills: kills.weapons.get(WeaponCategory::Pistol),
        smg_kills: kills.weapons.get(WeaponCategory::Smg),
        shotgun_kills: kills.weapons.get(WeaponCategory::Shotgun),
        knife_kills: kills.weapons.get(WeaponCategory::Knife),
        grenade_kills: kills.weapons.get(WeaponCategory::Grenade),
        smoke_kills: kills.situational.smoke,
        noscope_kills: kills.situational.noscope,
        wallbang_kills: kills.situational.wallbang,
        blind_kills: kills.situational.blind,
        airborne_kills: kills.situational.airborne,
        opening_kills: stat.opening_kills,
        rounds_with_2k: stat.rounds_with_2k,
        rounds_with_3k: stat.rounds_with_3k,
    }
}

pub fn player_round_row(segmented: &SegmentedMatch, stat: &PlayerRoundStat) -> PlayerRoundRow {
    let kills: &KillStats = &stat.kills;

    PlayerRoundRow {
        match_id: segmented.match_id.clone(),
        map_name: segmented.map_name.clone(),
        steamid: stat.steamid.clone(),
        player_name: stat.name.clone(),
        round_num: stat.round_num,
        kills: kills.count,
        deaths: stat.deaths,
        headshot_kills: kills.headshots,
        headshot_rate: kills.headshot_rate(),
        avg_kill_distance: kills.avg_distance(),
        max_kill_distance: kills.max_distance(),
        min_kill_distance: kills.min_distance(),
        total_damage: kills.damage,
        rifle_kills: kills.weapons.get(WeaponCategory::Rifle),
        awp_kills: kills.weapons.get(WeaponCategory::Awp),
        pistol_kills: kills.weapons.get(WeaponCategory::Pistol),
        smg_kills: kills.weapons.get(WeaponCategory::Smg),
        shotgun_kills: kills.weapons.get(WeaponCategory::Shotgun),
        knife_kills: kills.weapons.get(WeaponCategory::Knife),
        grenade_kills: kills.weapons.get(WeaponCategory::Grenade),
        smoke_kills: kills.situational.smoke,
        noscope_kills: kills.situational.noscope,
        wallbang_kills: kills.situational.wallbang,
        blind_kills: kills.situational.blind,
        airborne_kills: kills.situational.airborne,
    }
}

fn death(row: DeathRow) -> (u32, Assigned<Death>) {
    let event = Death {
        tick: row.tick,
        attacker_side: Side::parse(&row.attacker_side),
        victim_side: Side::parse(&row.victim_side),
        attacker_name: row.attacker_name,
        attacker_steamid: row.attacker_steamid,
        victim_name: row.victim_name,
        victim_steamid: row.victim_steamid,
        weapon: row.weapon,
        headshot: row.headshot,
        distance: row.distance,
        dmg_health: row.dmg_health,
        dmg_armor: row.dmg_armor,
        thrusmoke: row.thrusmoke,
        noscope: row.noscope,
        attackerblind: row.attackerblind,
        penetrated: row.penetrated,
        attackerinair: row.attackerinair,
        hitgroup: row.hitgroup,
        assister_name: row.assister_name,
        assister_steamid: row.assister_steamid,
        assistedflash: row.assistedflash,
    };

    (
        row.round_num,
        Assigned {
            event,
            fallback: row.fallback,
        },
    )
}

/// Rebuilds a segmented match from the rounds and deaths tables the parse stage wrote.
pub fn segmented_match(
    match_id: &str,
    rounds: Vec<RoundRow>,
    deaths: Vec<DeathRow>,
) -> Result<SegmentedMatch, SegmentError> {
    let map_name = rounds.first().map(|r| r.map_name.clone()).unwrap_or_default();

    let records = rounds
        .into_iter()
        .map(|row| RoundRecord {
            round: Round {
                index: row.round_num,
                start_tick: row.tick_start,
                end_tick: row.tick_end,
                winner: Side::parse(&row.winner),
                reason: row.reason,
            },
            deaths: Vec::new(),
            bomb_planted: row.bomb_planted,
            bomb_defused: row.bomb_defused,
            bomb_exploded: row.bomb_exploded,
        })
        .collect();

    SegmentedMatch::from_tables(match_id.to_owned(), map_name, records, deaths.into_iter().map(death))
}
