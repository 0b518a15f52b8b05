//! Deterministic card identification: payment-mode text -> canonical card id.
//!
//! Exact aliases first, then an ordered rule list of case-insensitive
//! fragments. First matching rule wins, so more specific rules ("hsbc cash")
//! must come before broader ones ("hsbc").

use std::collections::{BTreeMap, BTreeSet};
use std::sync::LazyLock;

use cardcycle_core::{CardMatch, CycleRegistry};
use log::debug;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("whitespace pattern"));

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CardError {
    /// Matcher can produce ids the registry does not know.
    #[error("cards not in the cycle registry: {}", .0.join(", "))]
    UnregisteredCard(Vec<String>),

    #[error("rule for '{0}' has no fragments")]
    EmptyRule(String),
}

/// One identification rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardRule {
    pub card: String,
    pub fragments: Vec<String>,
    /// If any of these also occurs the text is left unmapped (e.g. a closed card).
    #[serde(default)]
    pub excludes: Vec<String>,
}

impl CardRule {
    pub fn new(card: impl Into<String>, fragments: &[&str]) -> Self {
        Self {
            card: card.into(),
            fragments: fragments.iter().map(|f| normalize(f)).collect(),
            excludes: Vec::new(),
        }
    }

    pub fn excluding(mut self, excludes: &[&str]) -> Self {
        self.excludes = excludes.iter().map(|f| normalize(f)).collect();
        self
    }

    fn matches(&self, text: &str) -> bool {
        self.fragments
            .iter()
            .any(|f| !f.is_empty() && text.contains(&normalize(f)))
    }

    fn excluded(&self, text: &str) -> bool {
        self.excludes
            .iter()
            .any(|f| !f.is_empty() && text.contains(&normalize(f)))
    }
}

/// Lower-case, trim and collapse whitespace runs.
pub fn normalize(text: &str) -> String {
    WHITESPACE
        .replace_all(text.trim(), " ")
        .to_lowercase()
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardMatcher {
    /// Evaluated in order.
    #[serde(default)]
    pub rules: Vec<CardRule>,
    /// Exact payment-mode string -> card id; checked before rules.
    #[serde(default)]
    pub aliases: BTreeMap<String, String>,
}

impl CardMatcher {
    pub fn new(rules: Vec<CardRule>) -> Self {
        Self {
            rules,
            aliases: BTreeMap::new(),
        }
    }

    /// Rules for the built-in cards, in priority order.
    pub fn builtin() -> Self {
        Self::new(vec![
            CardRule::new("Amex", &["amex", "american express", "americanexpress", "platinum"]),
            CardRule::new("ICICI", &["icici"]),
            CardRule::new("SBI", &["sbi"]),
            CardRule::new("One", &["onecard", "oncecard"]).excluding(&["closed"]),
            CardRule::new("HSBC Cash", &["hsbc cash", "hsbccash", "hsbcl", "cashback"]),
            CardRule::new("HSBC", &["hsbc"]),
        ])
    }

    pub fn with_alias(mut self, payment_mode: impl Into<String>, card: impl Into<String>) -> Self {
        self.aliases.insert(payment_mode.into(), card.into());
        self
    }

    /// Map a payment-mode string to a card. Pure; the same input always gives
    /// the same answer.
    pub fn identify(&self, payment_mode: &str) -> CardMatch {
        if payment_mode.trim().is_empty() {
            return CardMatch::Unmapped;
        }

        if let Some(card) = self.aliases.get(payment_mode) {
            return CardMatch::Matched(card.clone());
        }

        let text = normalize(payment_mode);
        for rule in &self.rules {
            if rule.matches(&text) {
                if rule.excluded(&text) {
                    debug!("'{payment_mode}' matched {} but is excluded", rule.card);
                    return CardMatch::Unmapped;
                }
                return CardMatch::Matched(rule.card.clone());
            }
        }

        CardMatch::Unmapped
    }

    /// Every card id this matcher can produce.
    pub fn card_ids(&self) -> BTreeSet<&str> {
        self.rules
            .iter()
            .map(|r| r.card.as_str())
            .chain(self.aliases.values().map(String::as_str))
            .collect()
    }

    /// Check rules are usable and every producible id is a registry key.
    pub fn validate_against(&self, registry: &CycleRegistry) -> Result<(), CardError> {
        if let Some(rule) = self
            .rules
            .iter()
            .find(|r| r.fragments.iter().all(|f| f.trim().is_empty()))
        {
            return Err(CardError::EmptyRule(rule.card.clone()));
        }

        let missing: Vec<String> = self
            .card_ids()
            .into_iter()
            .filter(|id| !registry.contains(id))
            .map(str::to_string)
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(CardError::UnregisteredCard(missing))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cardcycle_core::CycleDefinition;

    fn matched(id: &str) -> CardMatch {
        CardMatch::Matched(id.to_string())
    }

    #[test]
    fn test_amex_variants() {
        let m = CardMatcher::builtin();
        assert_eq!(m.identify("3. May Amex"), matched("Amex"));
        assert_eq!(m.identify("AMERICAN   EXPRESS"), matched("Amex"));
        assert_eq!(m.identify("Platinum travel"), matched("Amex"));
    }

    #[test]
    fn test_hsbc_cash_beats_hsbc() {
        let m = CardMatcher::builtin();
        assert_eq!(m.identify("HSBC Cash card"), matched("HSBC Cash"));
        assert_eq!(m.identify("hsbc\tcash"), matched("HSBC Cash"));
        assert_eq!(m.identify("HSBC Visa"), matched("HSBC"));
    }

    #[test]
    fn test_closed_onecard_is_unmapped() {
        let m = CardMatcher::builtin();
        assert_eq!(m.identify("OneCard"), matched("One"));
        assert_eq!(m.identify("OneCard (closed)"), CardMatch::Unmapped);
    }

    #[test]
    fn test_unmatched_and_blank_are_unmapped() {
        let m = CardMatcher::builtin();
        assert_eq!(m.identify("Cash"), CardMatch::Unmapped);
        assert_eq!(m.identify("UPI - GPay"), CardMatch::Unmapped);
        assert_eq!(m.identify("   "), CardMatch::Unmapped);
    }

    #[test]
    fn test_alias_wins_over_rules() {
        let m = CardMatcher::builtin().with_alias("Amex via SBI netbanking", "SBI");
        assert_eq!(m.identify("Amex via SBI netbanking"), matched("SBI"));
        // Alias lookup is exact.
        assert_eq!(m.identify("amex via sbi netbanking"), matched("Amex"));
    }

    #[test]
    fn test_identify_is_idempotent() {
        let m = CardMatcher::builtin();
        for text in ["ICICI Coral", "random wallet", "HSBC cashback", ""] {
            assert_eq!(m.identify(text), m.identify(text));
        }
    }

    #[test]
    fn test_builtin_matcher_in_sync_with_builtin_registry() {
        CardMatcher::builtin()
            .validate_against(&CycleRegistry::builtin())
            .unwrap();
    }

    #[test]
    fn test_validate_reports_unregistered_ids() {
        let registry = CycleRegistry::new()
            .with_card("Amex", CycleDefinition::new(22, 21, 10, 1).unwrap())
            .unwrap();
        let m = CardMatcher::new(vec![CardRule::new("Amex", &["amex"]), CardRule::new("Kotak", &["kotak"])])
            .with_alias("Mystery", "Zeta");
        assert_eq!(
            m.validate_against(&registry),
            Err(CardError::UnregisteredCard(vec!["Kotak".into(), "Zeta".into()]))
        );
    }

    #[test]
    fn test_validate_rejects_empty_rule() {
        let m = CardMatcher::new(vec![CardRule::new("Amex", &[" "])]);
        assert_eq!(
            m.validate_against(&CycleRegistry::builtin()),
            Err(CardError::EmptyRule("Amex".into()))
        );
    }
}
