use std::collections::{BTreeMap, HashMap};

use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Weapon,
    Armor,
    Consumable,
    Misc,
}

impl Category {
    pub fn as_str(self) -> &'static str {
        match self {
            Category::Weapon => "weapon",
            Category::Armor => "armor",
            Category::Consumable => "consumable",
            Category::Misc => "misc",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EquipSlot {
    Weapon,
    Armor,
    Helmet,
    Boots,
}

impl EquipSlot {
    pub fn all() -> &'static [EquipSlot] {
        &[
            EquipSlot::Weapon,
            EquipSlot::Armor,
            EquipSlot::Helmet,
            EquipSlot::Boots,
        ]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            EquipSlot::Weapon => "weapon",
            EquipSlot::Armor => "armor",
            EquipSlot::Helmet => "helmet",
            EquipSlot::Boots => "boots",
        }
    }

    pub fn parse(token: &str) -> Option<Self> {
        match token.trim().to_ascii_lowercase().as_str() {
            "weapon" | "wield" | "sword" => Some(EquipSlot::Weapon),
            "armor" | "armour" | "body" => Some(EquipSlot::Armor),
            "helmet" | "helm" | "head" => Some(EquipSlot::Helmet),
            "boots" | "feet" | "shoes" => Some(EquipSlot::Boots),
            _ => None,
        }
    }
}

/// Catalog entry. Items in play are plain names; this is what a name means.
#[derive(Debug, Clone)]
pub struct ItemDef {
    pub key: String,
    pub name: String,
    pub description: String,
    pub category: Category,
    pub value: u32,
    pub stats: BTreeMap<String, i32>,
    pub slot: Option<EquipSlot>,
}

impl ItemDef {
    pub fn equip_slot(&self) -> Option<EquipSlot> {
        match self.category {
            Category::Weapon => Some(EquipSlot::Weapon),
            Category::Armor => Some(self.slot.unwrap_or(EquipSlot::Armor)),
            Category::Consumable | Category::Misc => None,
        }
    }

    pub fn heal_amount(&self) -> Option<i32> {
        if self.category != Category::Consumable {
            return None;
        }
        self.stats.get("heal").copied().filter(|h| *h > 0)
    }

    pub fn render(&self) -> String {
        let mut s = format!("{} ({})\n", self.name, self.category.as_str());
        s.push_str(&self.description);
        s.push('\n');
        s.push_str(&format!("Value: {} gold", self.value));
        for (stat, v) in &self.stats {
            s.push_str(&format!("\n  {stat}: {v:+}"));
        }
        s
    }
}

#[derive(Debug, Clone, Default)]
pub struct Catalog {
    items: HashMap<String, ItemDef>,
}

impl Catalog {
    pub fn new(defs: impl IntoIterator<Item = ItemDef>) -> Self {
        Self {
            items: defs
                .into_iter()
                .map(|d| (d.key.to_ascii_lowercase(), d))
                .collect(),
        }
    }

    /// Look up by catalog key first, then by display name. Case-insensitive.
    pub fn lookup(&self, name: &str) -> Option<&ItemDef> {
        let t = name.trim().to_ascii_lowercase();
        if t.is_empty() {
            return None;
        }
        self.items
            .get(&t)
            .or_else(|| self.items.values().find(|d| d.name.eq_ignore_ascii_case(&t)))
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[derive(Debug, Clone, Default)]
pub struct Equipment {
    slots: HashMap<EquipSlot, String>,
}

impl Equipment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, slot: EquipSlot) -> Option<&String> {
        self.slots.get(&slot)
    }

    /// Put `item` in `slot`, returning whatever was there.
    pub fn set(&mut self, slot: EquipSlot, item: String) -> Option<String> {
        self.slots.insert(slot, item)
    }

    pub fn clear(&mut self, slot: EquipSlot) -> Option<String> {
        self.slots.remove(&slot)
    }
}

/// Index of the first name containing `token`, ignoring case.
pub fn find_containing<S: AsRef<str>>(names: &[S], token: &str) -> Option<usize> {
    let t = token.trim().to_lowercase();
    if t.is_empty() {
        return None;
    }
    names
        .iter()
        .position(|n| n.as_ref().to_lowercase().contains(&t))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn potion() -> ItemDef {
        ItemDef {
            key: "potion".to_string(),
            name: "Health Potion".to_string(),
            description: "Restores 30 health".to_string(),
            category: Category::Consumable,
            value: 20,
            stats: BTreeMap::from([("heal".to_string(), 30)]),
            slot: None,
        }
    }

    #[test]
    fn catalog_finds_by_key_or_display_name() {
        let c = Catalog::new([potion()]);
        assert_eq!(c.lookup("POTION").map(|d| d.value), Some(20));
        assert_eq!(c.lookup("health potion").map(|d| d.value), Some(20));
        assert!(c.lookup("sword").is_none());
        assert!(c.lookup("  ").is_none());
    }

    #[test]
    fn slots_follow_category() {
        let mut d = potion();
        assert_eq!(d.equip_slot(), None);
        assert_eq!(d.heal_amount(), Some(30));

        d.category = Category::Armor;
        assert_eq!(d.equip_slot(), Some(EquipSlot::Armor));
        assert_eq!(d.heal_amount(), None);
        d.slot = Some(EquipSlot::Boots);
        assert_eq!(d.equip_slot(), Some(EquipSlot::Boots));

        d.category = Category::Weapon;
        assert_eq!(d.equip_slot(), Some(EquipSlot::Weapon));
    }

    #[test]
    fn first_substring_match_wins() {
        let ground = vec!["wolf_pelt", "potion", "potion"];
        assert_eq!(find_containing(&ground, "POT"), Some(1));
        assert_eq!(find_containing(&ground, "pelt"), Some(0));
        assert_eq!(find_containing(&ground, "sword"), None);
        assert_eq!(find_containing(&ground, ""), None);
    }

    #[test]
    fn equipment_swaps_return_previous() {
        let mut eq = Equipment::new();
        assert_eq!(eq.set(EquipSlot::Weapon, "sword".to_string()), None);
        assert_eq!(
            eq.set(EquipSlot::Weapon, "rusty_dagger".to_string()),
            Some("sword".to_string())
        );
        assert_eq!(eq.clear(EquipSlot::Weapon), Some("rusty_dagger".to_string()));
        assert!(eq.get(EquipSlot::Weapon).is_none());
    }

    #[test]
    fn slot_parse_accepts_aliases() {
        assert_eq!(EquipSlot::parse("Helm"), Some(EquipSlot::Helmet));
        assert_eq!(EquipSlot::parse("armour"), Some(EquipSlot::Armor));
        assert_eq!(EquipSlot::parse("ring"), None);
    }
}
