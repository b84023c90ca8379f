use serde::Deserialize;

/// Lowest counter-attack roll; a monster's attack power is the inclusive upper bound.
pub const MIN_MONSTER_DAMAGE: i32 = 5;

#[derive(Debug, Clone, Deserialize)]
pub struct MonsterTemplate {
    pub name: String,
    pub health: i32,
    pub attack_power: i32,
    #[serde(default)]
    pub experience: u32,
    #[serde(default)]
    pub gold: u32,
    #[serde(default)]
    pub loot: Vec<String>,
}

impl MonsterTemplate {
    pub fn validate(&self, key: &str) -> anyhow::Result<()> {
        if self.name.trim().is_empty() {
            anyhow::bail!("monster template {key}: empty name");
        }
        if self.health <= 0 {
            anyhow::bail!("monster template {key}: health must be positive");
        }
        if self.attack_power < MIN_MONSTER_DAMAGE {
            anyhow::bail!(
                "monster template {key}: attack_power {} is below the minimum counter-attack of {MIN_MONSTER_DAMAGE}",
                self.attack_power
            );
        }
        Ok(())
    }

    pub fn spawn(&self) -> Monster {
        Monster {
            name: self.name.clone(),
            health: self.health,
            max_health: self.health,
            attack_power: self.attack_power,
            experience: self.experience,
            gold: self.gold,
            loot: self.loot.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Monster {
    pub name: String,
    pub health: i32,
    pub max_health: i32,
    pub attack_power: i32,
    pub experience: u32,
    pub gold: u32,
    pub loot: Vec<String>,
}

impl Monster {
    pub fn is_alive(&self) -> bool {
        self.health > 0
    }

    pub fn take_damage(&mut self, dmg: i32) {
        self.health = (self.health - dmg.max(0)).max(0);
    }

    pub fn matches(&self, token: &str) -> bool {
        let t = token.trim().to_lowercase();
        !t.is_empty() && self.name.to_lowercase().contains(&t)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wolf() -> MonsterTemplate {
        MonsterTemplate {
            name: "Wolf".to_string(),
            health: 30,
            attack_power: 15,
            experience: 15,
            gold: 5,
            loot: vec!["wolf_pelt".to_string()],
        }
    }

    #[test]
    fn damage_clamps_at_zero() {
        let mut m = wolf().spawn();
        m.take_damage(12);
        assert_eq!(m.health, 18);
        assert!(m.is_alive());
        m.take_damage(50);
        assert_eq!(m.health, 0);
        assert!(!m.is_alive());
    }

    #[test]
    fn spawn_starts_at_full_health() {
        let m = wolf().spawn();
        assert_eq!(m.health, m.max_health);
        assert_eq!(m.loot, vec!["wolf_pelt".to_string()]);
    }

    #[test]
    fn weak_attack_power_is_rejected() {
        let mut t = wolf();
        assert!(t.validate("wolf").is_ok());
        t.attack_power = 4;
        let err = t.validate("wolf").unwrap_err().to_string();
        assert!(err.contains("attack_power"), "{err}");
    }

    #[test]
    fn name_match_is_substring_and_case_insensitive() {
        let m = wolf().spawn();
        assert!(m.matches("WOL"));
        assert!(m.matches("olf"));
        assert!(!m.matches("goblin"));
        assert!(!m.matches(" "));
    }
}
