use anyhow::{Context, Result};
use cardcycle_cards::{CardMatcher, CardRule};
use cardcycle_core::{CycleRegistry, CycleResolver, OverrideBook, OverrideDates, OverrideKey};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// On-disk layout of `config.toml`.
///
/// `cards` are layered over the built-in cycles; `rules`, when present,
/// replace the built-in identification rules (order = priority).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub cards: CycleRegistry,
    #[serde(default)]
    pub rules: Vec<CardRule>,
    #[serde(default)]
    pub aliases: BTreeMap<String, String>,
    /// `"YYYY-MM::Card" = { start, end, due }`
    #[serde(default)]
    pub overrides: BTreeMap<String, OverrideDates>,
}

impl Config {
    /// Config written by `cardcycle init`.
    pub fn starter() -> Self {
        Self {
            cards: CycleRegistry::builtin(),
            rules: CardMatcher::builtin().rules,
            aliases: BTreeMap::new(),
            overrides: BTreeMap::new(),
        }
    }

    pub fn from_toml_str(s: &str) -> Result<Self> {
        toml::from_str(s).context("parse config.toml")
    }
}

/// Everything the commands need, validated.
#[derive(Debug, Clone)]
pub struct Loaded {
    pub resolver: CycleResolver,
    pub matcher: CardMatcher,
}

impl Loaded {
    pub fn from_config(cfg: Config) -> Result<Self> {
        let registry = CycleRegistry::builtin().merged_with(&cfg.cards);

        let rules = if cfg.rules.is_empty() {
            CardMatcher::builtin().rules
        } else {
            cfg.rules
        };
        let matcher = CardMatcher {
            rules,
            aliases: cfg.aliases,
        };
        matcher
            .validate_against(&registry)
            .context("card rules out of sync with [cards]")?;

        let mut book = OverrideBook::new();
        for (key, dates) in cfg.overrides {
            let key: OverrideKey = key
                .parse()
                .with_context(|| format!("override key '{key}'"))?;
            book.set(key, dates);
        }

        info!(
            "{} card(s), {} rule(s), {} override(s)",
            registry.len(),
            matcher.rules.len(),
            book.len()
        );

        Ok(Self {
            resolver: CycleResolver::new(registry).with_overrides(book),
            matcher,
        })
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    if !path.exists() {
        debug!("no config at {}; using built-in cards", path.display());
        return Ok(Config::default());
    }
    let s = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    Config::from_toml_str(&s).with_context(|| format!("in {}", path.display()))
}

pub fn save_config(path: &Path, cfg: &Config) -> Result<()> {
    let s = toml::to_string_pretty(cfg).context("serialize config")?;
    fs::write(path, s).with_context(|| format!("write {}", path.display()))?;
    Ok(())
}

/// Write the starter config unless one already exists. Returns false if it did.
pub fn init_config(path: &Path) -> Result<bool> {
    if path.exists() {
        return Ok(false);
    }
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).with_context(|| format!("create {}", dir.display()))?;
    }
    save_config(path, &Config::starter())?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cardcycle_core::CardMatch;
    use chrono::NaiveDate;

    #[test]
    fn test_missing_file_uses_builtin() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load_config(&dir.path().join("nope.toml")).unwrap();
        let loaded = Loaded::from_config(cfg).unwrap();
        assert_eq!(loaded.resolver.registry().len(), 6);
        assert_eq!(
            loaded.matcher.identify("amex"),
            CardMatch::Matched("Amex".into())
        );
    }

    #[test]
    fn test_init_then_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        assert!(init_config(&path).unwrap());
        assert!(!init_config(&path).unwrap());

        let cfg = load_config(&path).unwrap();
        assert_eq!(cfg.cards, CycleRegistry::builtin());
        assert_eq!(cfg.rules, CardMatcher::builtin().rules);
    }

    #[test]
    fn test_custom_card_rule_alias_and_override() {
        let toml = r#"
[cards.Kotak]
start_day = 5
end_day = 4
due_day = 20
due_offset_months = 1

[cards.Amex]
start_day = 1
end_day = 31
due_day = 15
due_offset_months = 1

[[rules]]
card = "Kotak"
fragments = ["kotak"]

[[rules]]
card = "Amex"
fragments = ["amex"]

[aliases]
"Office card" = "Kotak"

[overrides."2025-10::Kotak"]
start = "2025-09-01"
end = "2025-09-30"
due = "2025-10-18"
"#;
        let loaded = Loaded::from_config(Config::from_toml_str(toml).unwrap()).unwrap();
        let reg = loaded.resolver.registry();
        assert_eq!(reg.len(), 7);
        assert_eq!(reg.get("Amex").unwrap().start_day, 1);

        assert_eq!(loaded.matcher.identify("Office card"), CardMatch::Matched("Kotak".into()));
        assert_eq!(loaded.matcher.identify("SBI"), CardMatch::Unmapped);

        let c = loaded.resolver.resolve_effective("Kotak", 2025, 10).unwrap();
        assert!(c.overridden);
        assert_eq!(c.window.due_date, NaiveDate::from_ymd_opt(2025, 10, 18).unwrap());
    }

    #[test]
    fn test_rule_for_unknown_card_rejected() {
        let toml = r#"
[[rules]]
card = "Ghost"
fragments = ["ghost"]
"#;
        let err = Loaded::from_config(Config::from_toml_str(toml).unwrap()).unwrap_err();
        assert!(format!("{err:#}").contains("Ghost"));
    }

    #[test]
    fn test_bad_override_key_rejected() {
        let toml = r#"
[overrides."Oct 2025::Amex"]
start = "2025-09-01"
end = "2025-09-30"
due = "2025-10-18"
"#;
        assert!(Loaded::from_config(Config::from_toml_str(toml).unwrap()).is_err());
    }
}
