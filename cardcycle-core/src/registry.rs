//! Card id -> cycle definition registry.
//!
//! Loadable from TOML (`[cards.<id>]` tables) or from the compact JSON export
//! `{ "<id>": [start, end, due, offset] }`.

use std::collections::BTreeMap;
use std::fmt;
use std::marker::PhantomData;

use log::info;
use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Serialize};

use crate::cycle::{CycleDefinition, CycleWindow};
use crate::error::{CycleError, Result};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct CycleRegistry {
    cards: BTreeMap<String, CycleDefinition>,
}

impl<'de> Deserialize<'de> for CycleRegistry {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let Entries(cards) = Entries::<CycleDefinition>::deserialize(deserializer)?;
        let mut registry = CycleRegistry::new();
        for (id, def) in cards {
            registry.insert(id, def).map_err(serde::de::Error::custom)?;
        }
        Ok(registry)
    }
}

/// Map entries in document order, repeated keys kept, so `insert` sees them.
struct Entries<V>(Vec<(String, V)>);

impl<'de, V: Deserialize<'de>> Deserialize<'de> for Entries<V> {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        struct EntriesVisitor<V>(PhantomData<V>);

        impl<'de, V: Deserialize<'de>> Visitor<'de> for EntriesVisitor<V> {
            type Value = Entries<V>;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map keyed by card id")
            }

            fn visit_map<A>(self, mut map: A) -> std::result::Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some(entry) = map.next_entry::<String, V>()? {
                    entries.push(entry);
                }
                Ok(Entries(entries))
            }
        }

        deserializer.deserialize_map(EntriesVisitor(PhantomData))
    }
}

#[derive(Deserialize)]
struct RegistryFile {
    #[serde(default)]
    cards: CycleRegistry,
}

impl CycleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Default cards: (start, end, due, offset).
    pub fn builtin() -> Self {
        let defaults: [(&str, (u32, u32, u32, u32)); 6] = [
            ("Amex", (22, 21, 10, 1)),
            ("HSBC", (19, 18, 5, 1)),
            ("HSBC Cash", (8, 7, 27, 0)),
            // Bill generated on the 21st, due the 8th of the next month
            ("ICICI", (22, 21, 8, 1)),
            ("One", (19, 18, 8, 1)),
            ("SBI", (25, 24, 13, 1)),
        ];

        let cards = defaults
            .into_iter()
            .map(|(id, (start, end, due, offset))| {
                (
                    id.to_string(),
                    CycleDefinition {
                        start_day: start,
                        end_day: end,
                        due_day: due,
                        due_offset_months: offset,
                    },
                )
            })
            .collect();
        Self { cards }
    }

    /// Add a card. Ids are case-sensitive and must be unique and non-empty.
    pub fn insert(&mut self, id: impl Into<String>, def: CycleDefinition) -> Result<()> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(CycleError::EmptyCardId);
        }
        if self.cards.contains_key(&id) {
            return Err(CycleError::DuplicateCard(id));
        }
        self.cards.insert(id, def);
        Ok(())
    }

    pub fn with_card(mut self, id: impl Into<String>, def: CycleDefinition) -> Result<Self> {
        self.insert(id, def)?;
        Ok(self)
    }

    pub fn get(&self, id: &str) -> Option<&CycleDefinition> {
        self.cards.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.cards.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// Card ids in sorted order.
    pub fn card_ids(&self) -> impl Iterator<Item = &str> {
        self.cards.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &CycleDefinition)> {
        self.cards.iter().map(|(id, def)| (id.as_str(), def))
    }

    /// Window of the cycle for `card_id` that ends in `(year, month)`.
    pub fn resolve(&self, card_id: &str, year: i32, month: u32) -> Result<CycleWindow> {
        let def = self
            .get(card_id)
            .ok_or_else(|| CycleError::UnknownCard(card_id.to_string()))?;
        def.window_ending_in(year, month)
    }

    /// Layer `custom` over `self`: cards in `custom` replace same-id defaults,
    /// new ids are added.
    pub fn merged_with(&self, custom: &CycleRegistry) -> CycleRegistry {
        let mut cards = self.cards.clone();
        for (id, def) in &custom.cards {
            cards.insert(id.clone(), *def);
        }
        CycleRegistry { cards }
    }

    /// Parse a TOML document with a `[cards.<id>]` table per card.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let file: RegistryFile = toml::from_str(s).map_err(|e| CycleError::Config(e.to_string()))?;
        info!("loaded {} card cycle(s) from TOML", file.cards.len());
        Ok(file.cards)
    }

    /// Parse the compact export `{ "<id>": [start, end, due, offset] }`.
    /// A card id given twice is `DuplicateCard`.
    pub fn from_days_json(s: &str) -> Result<Self> {
        let Entries(raw) = serde_json::from_str::<Entries<[u32; 4]>>(s)
            .map_err(|e| CycleError::Config(e.to_string()))?;
        let mut registry = CycleRegistry::new();
        for (id, [start, end, due, offset]) in raw {
            registry.insert(id, CycleDefinition::new(start, end, due, offset)?)?;
        }
        info!("loaded {} card cycle(s) from days JSON", registry.len());
        Ok(registry)
    }

    /// Inverse of [`CycleRegistry::from_days_json`].
    pub fn to_days_json(&self) -> Result<String> {
        let raw: BTreeMap<&str, [u32; 4]> = self
            .iter()
            .map(|(id, d)| (id, [d.start_day, d.end_day, d.due_day, d.due_offset_months]))
            .collect();
        serde_json::to_string_pretty(&raw).map_err(|e| CycleError::Config(e.to_string()))
    }
}
