//! Rows of the tables written by the parse stage, in column order.

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct RoundRow {
    pub match_id: String,
    pub map_name: String,
    pub round_num: u32,
    pub tick_start: u32,
    pub tick_end: u32,
    pub winner: String,
    pub reason: String,
    pub bomb_planted: bool,
    pub bomb_defused: bool,
    pub bomb_exploded: bool,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct DeathRow {
    pub match_id: String,
    pub map_name: String,
    pub round_num: u32,
    pub fallback: bool,
    pub tick: u32,
    pub attacker_name: String,
    pub attacker_steamid: String,
    pub attacker_side: String,
    pub victim_name: String,
    pub victim_steamid: String,
    pub victim_side: String,
    pub weapon: String,
    pub headshot: bool,
    pub distance: f64,
    pub dmg_health: u32,
    pub dmg_armor: u32,
    pub thrusmoke: bool,
    pub noscope: bool,
    pub attackerblind: bool,
    pub penetrated: u32,
    pub attackerinair: bool,
    pub hitgroup: String,
    pub assister_name: String,
    pub assister_steamid: String,
    pub assistedflash: bool,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PlayerRow {
    pub match_id: String,
    pub map_name: String,
    pub steamid: String,
    pub player_name: String,
    pub side: String,
    pub kills: u32,
    pub deaths: u32,
    pub assists: u32,
    pub headshot_kills: u32,
    pub headshot_pct: f64,
    pub kd_ratio: f64,
    pub avg_kill_distance: f64,
    pub max_kill_distance: f64,
    pub min_kill_distance: f64,
    pub total_damage: u32,
    pub rifle_kills: u32,
    pub awp_kills: u32,
    pub pistol_kills: u32,
    pub smg_kills: u32,
    pub shotgun_kills: u32,
    pub knife_kills: u32,
    pub grenade_kills: u32,
    pub smoke_kills: u32,
    pub noscope_kills: u32,
    pub wallbang_kills: u32,
    pub blind_kills: u32,
    pub airborne_kills: u32,
    pub opening_kills: u32,
    pub rounds_with_2k: u32,
    pub rounds_with_3k: u32,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PlayerRoundRow {
    pub match_id: String,
    pub map_name: String,
    pub steamid: String,
    pub player_name: String,
    pub round_num: u32,
    pub kills: u32,
    pub deaths: u32,
    pub headshot_kills: u32,
    pub headshot_rate: f64,
    pub avg_kill_distance: f64,
    pub max_kill_distance: f64,
    pub min_kill_distance: f64,
    pub total_damage: u32,
    pub rifle_kills: u32,
    pub awp_kills: u32,
    pub pistol_kills: u32,
    pub smg_kills: u32,
    pub shotgun_kills: u32,
    pub knife_kills: u32,
    pub grenade_kills: u32,
    pub smoke_kills: u32,
    pub noscope_kills: u32,
    pub wallbang_kills: u32,
    pub blind_kills: u32,
    pub airborne_kills: u32,
}
