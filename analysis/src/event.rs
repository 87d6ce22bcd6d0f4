//! Normalized events as handed over by a demo decoder.

pub type Tick = u32;

/// Anything that happened at a specific tick of the demo.
pub trait Ticked {
    fn tick(&self) -> Tick;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
pub enum Side {
    T,
    CT,
}

impl Side {
    /// Parses the side labels and team numbers used by the different decoder versions.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "T" | "TERRORIST" | "TERRORISTS" | "2" => Some(Self::T),
            "CT" | "COUNTERTERRORIST" | "COUNTER-TERRORIST" | "COUNTERTERRORISTS" | "3" => {
                Some(Self::CT)
            }
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::T => "T",
            Self::CT => "CT",
        }
    }

    pub fn opponent(&self) -> Self {
        match self {
            Self::T => Self::CT,
            Self::CT => Self::T,
        }
    }
}

impl core::fmt::Display for Side {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum WinReason {
    StillInProgress,
    BombExploded,
    VipEscaped,
    VipKilled,
    TSaved,
    CtStoppedEscape,
    RoundEndReasonTerroristsStopped,
    BombDefused,
    TKilled,
    CTKilled,
    Draw,
    HostageRescued,
    TimeRanOut,
    RoundEndReasonHostagesNotRescued,
    TerroristsNotEscaped,
    VipNotEscaped,
    GameStart,
    TSurrender,
    CTSurrender,
    TPlanted,
    CTReachedHostage,
}

// https://github.com/markus-wa/demoinfocs-golang/blob/205b0bb25e9f3e96e1d306d154199b4a6292940e/pkg/demoinfocs/events/events.go#L53
pub static ROUND_WIN_REASON: phf::Map<i32, WinReason> = phf::phf_map! {
    0_i32 => WinReason::StillInProgress,
    1_i32 => WinReason::BombExploded,
    2_i32 => WinReason::VipEscaped,
    3_i32 => WinReason::VipKilled,
    4_i32 => WinReason::TSaved,
    5_i32 => WinReason::CtStoppedEscape,
    6_i32 => WinReason::RoundEndReasonTerroristsStopped,
    7_i32 => WinReason::BombDefused,
    8_i32 => WinReason::TKilled,
    9_i32 => WinReason::CTKilled,
    10_i32 => WinReason::Draw,
    11_i32 => WinReason::HostageRescued,
    12_i32 => WinReason::TimeRanOut,
    13_i32 => WinReason::RoundEndReasonHostagesNotRescued,
    14_i32 => WinReason::TerroristsNotEscaped,
    15_i32 => WinReason::VipNotEscaped,
    16_i32 => WinReason::GameStart,
    17_i32 => WinReason::TSurrender,
    18_i32 => WinReason::CTSurrender,
    19_i32 => WinReason::TPlanted,
    20_i32 => WinReason::CTReachedHostage,
};

/// Names emitted by decoders that export the reason as text instead of the numeric code.
pub static ROUND_WIN_REASON_NAMES: phf::Map<&'static str, WinReason> = phf::phf_map! {
    "still_in_progress" => WinReason::StillInProgress,
    "bomb_exploded" => WinReason::BombExploded,
    "target_bombed" => WinReason::BombExploded,
    "vip_escaped" => WinReason::VipEscaped,
    "vip_killed" => WinReason::VipKilled,
    "t_saved" => WinReason::TSaved,
    "t_escaped" => WinReason::TSaved,
    "ct_stopped_escape" => WinReason::CtStoppedEscape,
    "t_stopped" => WinReason::RoundEndReasonTerroristsStopped,
    "bomb_defused" => WinReason::BombDefused,
    "t_killed" => WinReason::TKilled,
    "ct_killed" => WinReason::CTKilled,
    "draw" => WinReason::Draw,
    "hostage_rescued" => WinReason::HostageRescued,
    "hostages_rescued" => WinReason::HostageRescued,
    "time_ran_out" => WinReason::TimeRanOut,
    "target_saved" => WinReason::TimeRanOut,
    "hostages_not_rescued" => WinReason::RoundEndReasonHostagesNotRescued,
    "t_not_escaped" => WinReason::TerroristsNotEscaped,
    "vip_not_escaped" => WinReason::VipNotEscaped,
    "game_start" => WinReason::GameStart,
    "t_surrender" => WinReason::TSurrender,
    "ct_surrender" => WinReason::CTSurrender,
    "t_planted" => WinReason::TPlanted,
    "ct_reached_hostage" => WinReason::CTReachedHostage,
};

impl WinReason {
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if let Ok(code) = raw.parse::<i32>() {
            return ROUND_WIN_REASON.get(&code).copied();
        }

        ROUND_WIN_REASON_NAMES
            .get(raw.to_ascii_lowercase().as_str())
            .copied()
    }

    pub fn is_elimination(&self) -> bool {
        matches!(self, Self::TKilled | Self::CTKilled)
    }

    pub fn is_time_out(&self) -> bool {
        matches!(self, Self::TimeRanOut)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub enum EventKind {
    RoundEnd,
    Death,
    BombPlanted,
    BombDefused,
    BombExploded,
}

impl EventKind {
    pub const ALL: [EventKind; 5] = [
        Self::RoundEnd,
        Self::Death,
        Self::BombPlanted,
        Self::BombDefused,
        Self::BombExploded,
    ];

    /// The event name, which is also the name of the table it is exported in.
    pub fn table_name(&self) -> &'static str {
        match self {
            Self::RoundEnd => "round_end",
            Self::Death => "player_death",
            Self::BombPlanted => "bomb_planted",
            Self::BombDefused => "bomb_defused",
            Self::BombExploded => "bomb_exploded",
        }
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RoundEnd {
    pub tick: Tick,
    pub winner: Option<Side>,
    pub reason: String,
}

impl RoundEnd {
    pub fn win_reason(&self) -> Option<WinReason> {
        WinReason::parse(&self.reason)
    }
}

#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Death {
    pub tick: Tick,
    pub attacker_name: String,
    pub attacker_steamid: String,
    pub attacker_side: Option<Side>,
    pub victim_name: String,
    pub victim_steamid: String,
    pub victim_side: Option<Side>,
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

impl Death {
    /// Steam id of the attacker, or the name if the decoder did not resolve the id.
    pub fn attacker_id(&self) -> &str {
        if self.attacker_steamid.is_empty() {
            &self.attacker_name
        } else {
            &self.attacker_steamid
        }
    }

    pub fn victim_id(&self) -> &str {
        if self.victim_steamid.is_empty() {
            &self.victim_name
        } else {
            &self.victim_steamid
        }
    }

    /// Self-kills and world-kills (no attacker or no victim) are not counted anywhere.
    pub fn is_valid(&self) -> bool {
        if self.attacker_name.is_empty() || self.victim_name.is_empty() {
            return false;
        }
        if self.attacker_name == self.victim_name {
            return false;
        }

        self.attacker_steamid.is_empty() || self.attacker_steamid != self.victim_steamid
    }

    pub fn is_wallbang(&self) -> bool {
        self.penetrated > 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum BombEventKind {
    Planted,
    Defused,
    Exploded,
}

impl BombEventKind {
    pub fn event_kind(&self) -> EventKind {
        match self {
            Self::Planted => EventKind::BombPlanted,
            Self::Defused => EventKind::BombDefused,
            Self::Exploded => EventKind::BombExploded,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct BombEvent {
    pub tick: Tick,
    pub kind: BombEventKind,
}

impl Ticked for RoundEnd {
    fn tick(&self) -> Tick {
        self.tick
    }
}

impl Ticked for Death {
    fn tick(&self) -> Tick {
        self.tick
    }
}

impl Ticked for BombEvent {
    fn tick(&self) -> Tick {
        self.tick
    }
}

impl<T> Ticked for &T
where
    T: Ticked,
{
    fn tick(&self) -> Tick {
        (*self).tick()
    }
}

/// Everything the decoder produced for a single match.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MatchEvents {
    pub match_id: String,
    pub map_name: String,
    pub round_ends: Vec<RoundEnd>,
    pub deaths: Vec<Death>,
    pub bombs: Vec<BombEvent>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn side_labels() {
        assert_eq!(Some(Side::T), Side::parse("TERRORIST"));
        assert_eq!(Some(Side::CT), Side::parse(" ct "));
        assert_eq!(Some(Side::CT), Side::parse("3"));
        assert_eq!(None, Side::parse(""));
    }

    #[test]
    fn win_reason_codes_and_names() {
        assert_eq!(Some(WinReason::BombDefused), WinReason::parse("7"));
        assert_eq!(Some(WinReason::CTKilled), WinReason::parse("ct_killed"));
        assert_eq!(Some(WinReason::BombExploded), WinReason::parse("Target_Bombed"));
        assert_eq!(None, WinReason::parse("something"));
    }

    #[test]
    fn self_and_world_kills_are_invalid() {
        let kill = Death {
            attacker_name: "a".to_owned(),
            attacker_steamid: "1".to_owned(),
            victim_name: "b".to_owned(),
            victim_steamid: "2".to_owned(),
            ..Default::default()
        };
        assert!(kill.is_valid());

        let world = Death {
            attacker_name: String::new(),
            ..kill.clone()
        };
        assert!(!world.is_valid());

        let suicide = Death {
            victim_steamid: "1".to_owned(),
            ..kill.clone()
        };
        assert!(!suicide.is_valid());
    }
}
