use serde::Serialize;
use std::collections::HashMap;
use thiserror::Error;

pub const DEFAULT_SEARCH_LIMIT: usize = 25;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    #[error("duplicate activity id '{0}'")]
    DuplicateId(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActivityDefinition {
    pub id: String,
    pub name: String,
    pub category: String,
    pub base_reward: i64,
    pub vip_reward: i64,
}

/// Read-only activity reference data, grouped by category.
#[derive(Debug, Clone)]
pub struct Catalog {
    categories: Vec<String>,
    activities: Vec<ActivityDefinition>,
    by_id: HashMap<String, usize>,
}

// (id, name, base reward, vip reward)
type Row = (&'static str, &'static str, i64, i64);

const SOLO: &[Row] = &[
    ("browser", "Visit any website in the browser", 1, 2),
    ("brawl", "Join any channel in Brawl", 1, 2),
    ("match_like", "Like any profile in Match", 1, 2),
    ("dp_case", "Open a silver or gold case for DP", 10, 20),
    ("pet_ball", "Throw the ball to your pet 15 times", 2, 4),
    ("pet_commands", "15 commands performed by your pet", 2, 4),
    ("casino_wheel", "Place a bet on the casino wheel of fortune", 3, 6),
    ("metro", "Ride the metro for 1 station", 2, 4),
    ("fishing", "Catch 20 fish", 4, 8),
    ("club_quests", "Complete 2 quests for any club", 4, 8),
    ("car_repair", "Repair a part at the car service", 1, 2),
    ("basketball", "Score 2 baskets in basketball", 1, 2),
    ("football", "Score 2 goals in football", 1, 2),
    ("darts", "Win a game of darts", 1, 2),
    ("online_3h", "Spend 3 hours online (repeatable)", 2, 4),
    ("casino_zeros", "Zeros in the casino", 2, 4),
    ("construction", "25 actions at the construction site", 2, 4),
    ("port", "25 actions at the port", 2, 4),
    ("mine", "25 actions in the mine", 2, 4),
    ("gym", "20 sets at the gym", 1, 2),
    ("shooting_range", "Successful session at the shooting range", 1, 2),
    ("post_office", "Deliver 10 parcels at the post office", 1, 2),
    ("film_studio", "Rent the film studio", 2, 4),
    ("lottery", "Buy a lottery ticket", 1, 2),
    ("farm", "10 actions on the farm", 1, 2),
    ("firefighter", "Put out 25 fires as a firefighter", 1, 2),
    ("treasure", "Dig up 1 treasure (not junk)", 1, 2),
    ("trucker", "Complete 15 trucker deliveries to the port", 2, 4),
    ("surgeon", "Pay for an appearance change at the EMS surgeon twice", 2, 4),
    ("cinema", "Add 5 videos at the cinema", 1, 2),
    ("bus", "Drive 2 laps on any bus route", 2, 4),
    ("hunting", "Take a 100% hide from animals 5 times", 2, 4),
];

const PAIRED: &[Row] = &[
    ("table_tennis", "Play table tennis for 1 minute", 1, 2),
    ("tennis", "Play tennis for 1 minute", 1, 2),
    ("mafia", "Play mafia at the casino", 3, 6),
    ("dance_battle", "Win 3 dance battles", 2, 4),
    ("karting_pair", "Win a karting race", 1, 2),
    ("street_race", "Finish 1 street race with a bet (from $1000)", 1, 2),
    ("training_complex", "Win 5 games at the training complex with a bet (from $100)", 1, 2),
    ("arena", "Win 3 games at the arena with a bet (from $100)", 1, 2),
];

impl Catalog {
    pub fn builtin() -> Self {
        let mut catalog = Self {
            categories: Vec::new(),
            activities: Vec::new(),
            by_id: HashMap::new(),
        };
        for (category, rows) in [("Solo", SOLO), ("Paired", PAIRED)] {
            catalog.categories.push(category.to_string());
            for &(id, name, base_reward, vip_reward) in rows {
                catalog.push(ActivityDefinition {
                    id: id.to_string(),
                    name: name.to_string(),
                    category: category.to_string(),
                    base_reward,
                    vip_reward,
                });
            }
        }
        catalog
    }

    /// Builds a catalog from externally supplied definitions, rejecting duplicate ids.
    pub fn from_definitions(definitions: Vec<ActivityDefinition>) -> Result<Self, CatalogError> {
        let mut catalog = Self {
            categories: Vec::new(),
            activities: Vec::with_capacity(definitions.len()),
            by_id: HashMap::with_capacity(definitions.len()),
        };
        for definition in definitions {
            if catalog.by_id.contains_key(&definition.id) {
                return Err(CatalogError::DuplicateId(definition.id));
            }
            if !catalog.categories.contains(&definition.category) {
                catalog.categories.push(definition.category.clone());
            }
            catalog.push(definition);
        }
        Ok(catalog)
    }

    fn push(&mut self, definition: ActivityDefinition) {
        self.by_id.insert(definition.id.clone(), self.activities.len());
        self.activities.push(definition);
    }

    pub fn get(&self, id: &str) -> Option<&ActivityDefinition> {
        self.by_id.get(id).map(|&index| &self.activities[index])
    }

    pub fn all(&self) -> &[ActivityDefinition] {
        &self.activities
    }

    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    pub fn in_category<'a>(&'a self, category: &'a str) -> impl Iterator<Item = &'a ActivityDefinition> + 'a {
        self.activities
            .iter()
            .filter(move |activity| activity.category == category)
    }

    pub fn len(&self) -> usize {
        self.activities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.activities.is_empty()
    }

    /// Case-insensitive substring match on id or name, in catalog order.
    pub fn search(&self, query: &str, limit: usize) -> Vec<&ActivityDefinition> {
        let needle = query.trim().to_lowercase();
        self.activities
            .iter()
            .filter(|activity| {
                needle.is_empty()
                    || activity.id.to_lowercase().contains(&needle)
                    || activity.name.to_lowercase().contains(&needle)
            })
            .take(limit)
            .collect()
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn builtin_catalog_has_unique_ids() {
        let catalog = Catalog::builtin();
        let ids: HashSet<_> = catalog.all().iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids.len(), catalog.len());
        assert_eq!(catalog.len(), 40);
        assert_eq!(catalog.categories(), ["Solo", "Paired"]);
        assert_eq!(catalog.in_category("Paired").count(), 8);
    }

    #[test]
    fn vip_rewards_double_base_rewards() {
        for activity in Catalog::builtin().all() {
            assert!(activity.base_reward > 0, "{}", activity.id);
            assert_eq!(activity.vip_reward, activity.base_reward * 2, "{}", activity.id);
        }
    }

    #[test]
    fn lookup_by_id() {
        let catalog = Catalog::builtin();
        let case = catalog.get("dp_case").expect("dp_case exists");
        assert_eq!(case.base_reward, 10);
        assert_eq!(case.category, "Solo");
        assert!(catalog.get("missing").is_none());
    }

    #[test]
    fn search_matches_id_and_name_case_insensitively() {
        let catalog = Catalog::builtin();
        let hits: Vec<_> = catalog.search("TENNIS", 25).iter().map(|a| a.id.as_str()).collect();
        assert_eq!(hits, ["table_tennis", "tennis"]);

        let hits = catalog.search("casino", 25);
        assert!(hits.iter().any(|a| a.id == "casino_wheel"));
        assert!(hits.iter().any(|a| a.id == "mafia"));
    }

    #[test]
    fn empty_search_returns_first_entries_up_to_limit() {
        let catalog = Catalog::builtin();
        let hits = catalog.search("", DEFAULT_SEARCH_LIMIT);
        assert_eq!(hits.len(), DEFAULT_SEARCH_LIMIT);
        assert_eq!(hits[0].id, "browser");
    }

    #[test]
    fn duplicate_definitions_are_rejected() {
        let definition = ActivityDefinition {
            id: "a".into(),
            name: "A".into(),
            category: "Solo".into(),
            base_reward: 1,
            vip_reward: 2,
        };
        let err = Catalog::from_definitions(vec![definition.clone(), definition]).unwrap_err();
        assert_eq!(err, CatalogError::DuplicateId("a".into()));
        assert_eq!(err.to_string(), "duplicate activity id 'a'");
    }
}
