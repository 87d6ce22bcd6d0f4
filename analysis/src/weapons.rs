#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeaponCategory {
    Rifle,
    Awp,
    Pistol,
    Smg,
    Shotgun,
    Knife,
    Grenade,
}

impl WeaponCategory {
    pub const ALL: [WeaponCategory; 7] = [
        Self::Rifle,
        Self::Awp,
        Self::Pistol,
        Self::Smg,
        Self::Shotgun,
        Self::Knife,
        Self::Grenade,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Rifle => "rifle",
            Self::Awp => "awp",
            Self::Pistol => "pistol",
            Self::Smg => "smg",
            Self::Shotgun => "shotgun",
            Self::Knife => "knife",
            Self::Grenade => "grenade",
        }
    }

    fn position(&self) -> usize {
        match self {
            Self::Rifle => 0,
            Self::Awp => 1,
            Self::Pistol => 2,
            Self::Smg => 3,
            Self::Shotgun => 4,
            Self::Knife => 5,
            Self::Grenade => 6,
        }
    }
}

/// Substring patterns that put a weapon name into one or more categories.
///
/// Matching is case-insensitive and every category is checked on its own, so a
/// weapon name matching patterns of two categories counts towards both.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct WeaponTaxonomy {
    pub rifle: Vec<String>,
    pub awp: Vec<String>,
    pub pistol: Vec<String>,
    pub smg: Vec<String>,
    pub shotgun: Vec<String>,
    pub knife: Vec<String>,
    pub grenade: Vec<String>,
}

impl Default for WeaponTaxonomy {
    fn default() -> Self {
        let owned = |names: &[&str]| names.iter().map(|n| n.to_string()).collect::<Vec<_>>();

        Self {
            rifle: owned(&["ak47", "m4a1", "m4a4", "famas", "galil", "aug", "sg553"]),
            awp: owned(&["awp", "ssg08"]),
            pistol: owned(&["glock", "usp", "p2000", "p250", "deagle", "fiveseven", "tec9", "cz75"]),
            smg: owned(&["mp7", "mp9", "mp5", "mac10", "ump45", "bizon", "p90"]),
            shotgun: owned(&["nova", "xm1014", "sawedoff", "mag7"]),
            knife: owned(&["knife"]),
            grenade: owned(&["hegrenade", "inferno", "molotov"]),
        }
    }
}

impl WeaponTaxonomy {
    pub fn patterns(&self, category: WeaponCategory) -> &[String] {
        match category {
            WeaponCategory::Rifle => &self.rifle,
            WeaponCategory::Awp => &self.awp,
            WeaponCategory::Pistol => &self.pistol,
            WeaponCategory::Smg => &self.smg,
            WeaponCategory::Shotgun => &self.shotgun,
            WeaponCategory::Knife => &self.knife,
            WeaponCategory::Grenade => &self.grenade,
        }
    }

    pub fn matches(&self, category: WeaponCategory, weapon: &str) -> bool {
        let weapon = weapon.to_ascii_lowercase();
        self.patterns(category)
            .iter()
            .any(|p| !p.is_empty() && weapon.contains(&p.to_ascii_lowercase()))
    }

    pub fn categories<'s>(&'s self, weapon: &'s str) -> impl Iterator<Item = WeaponCategory> + 's {
        WeaponCategory::ALL
            .into_iter()
            .filter(move |c| self.matches(*c, weapon))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct WeaponCounts([u32; 7]);

impl WeaponCounts {
    pub fn record(&mut self, taxonomy: &WeaponTaxonomy, weapon: &str) {
        for category in taxonomy.categories(weapon) {
            self.0[category.position()] += 1;
        }
    }

    pub fn get(&self, category: WeaponCategory) -> u32 {
        self.0[category.position()]
    }

    pub fn iter(&self) -> impl Iterator<Item = (WeaponCategory, u32)> + '_ {
        WeaponCategory::ALL.into_iter().map(|c| (c, self.get(c)))
    }

    pub fn merge(&mut self, other: &WeaponCounts) {
        for (own, other) in self.0.iter_mut().zip(other.0.iter()) {
            *own += *other;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn case_insensitive_substring() {
        let taxonomy = WeaponTaxonomy::default();

        assert_eq!(vec![WeaponCategory::Rifle], taxonomy.categories("AK47").collect::<Vec<_>>());
        assert_eq!(vec![WeaponCategory::Pistol], taxonomy.categories("usp_silencer").collect::<Vec<_>>());
        assert_eq!(vec![WeaponCategory::Knife], taxonomy.categories("knife_karambit").collect::<Vec<_>>());
        assert_eq!(0, taxonomy.categories("world").count());
    }

    #[test]
    fn counts() {
        let taxonomy = WeaponTaxonomy::default();
        let mut counts = WeaponCounts::default();
        counts.record(&taxonomy, "awp");
        counts.record(&taxonomy, "ssg08");
        counts.record(&taxonomy, "molotov");

        assert_eq!(2, counts.get(WeaponCategory::Awp));
        assert_eq!(1, counts.get(WeaponCategory::Grenade));
        assert_eq!(0, counts.get(WeaponCategory::Rifle));
    }
}
