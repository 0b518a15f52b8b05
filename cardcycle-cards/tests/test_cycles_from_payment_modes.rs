use cardcycle_cards::statement::{statements_due_in, statements_generated_in};
use cardcycle_cards::{CardMatcher, FlagKey, InMemoryFlagStore, PaidFlagStore};
use cardcycle_core::{
    CardMatch, CycleError, CycleRegistry, CycleResolver, OverrideBook, OverrideDates, OverrideKey,
    TransactionKind, TransactionRecord,
};
use chrono::{Datelike, NaiveDate};

fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Rows as the ingestion side would hand them over: (date, amount, payment mode, type).
fn sample_rows() -> Vec<(NaiveDate, f64, &'static str, &'static str)> {
    vec![
        (ymd(2025, 9, 23), 1200.0, "3. May Amex", "Expense"),
        (ymd(2025, 10, 5), 800.50, "American Express Platinum", "expense"),
        (ymd(2025, 10, 21), 99.50, "amex", "Expense"),
        (ymd(2025, 10, 22), 450.0, "amex", "Expense"),
        (ymd(2025, 10, 2), 20000.0, "Amex", "Payment"),
        (ymd(2025, 9, 30), 640.0, "HSBC Cash", "Expense"),
        (ymd(2025, 10, 6), 310.0, "hsbc cashback card", "Expense"),
        (ymd(2025, 10, 8), 999.0, "HSBC Cash", "Expense"),
        (ymd(2025, 10, 10), 150.0, "SBI SimplySave", "Expense"),
        (ymd(2025, 10, 11), 75.0, "OneCard closed", "Expense"),
        (ymd(2025, 10, 12), 5000.0, "Cash", "Expense"),
    ]
}

fn records(matcher: &CardMatcher) -> Vec<TransactionRecord> {
    sample_rows()
        .into_iter()
        .map(|(date, amount, mode, tag)| {
            TransactionRecord::new(date, amount, matcher.identify(mode), TransactionKind::from_tag(tag), mode)
        })
        .collect()
}

#[test]
fn test_unmapped_rows_never_reach_card_statements() {
    let matcher = CardMatcher::builtin();
    let records = records(&matcher);
    let unmapped = records.iter().filter(|r| r.card.is_unmapped()).count();
    assert_eq!(unmapped, 2, "closed OneCard and Cash are unmapped");

    let resolver = CycleResolver::new(CycleRegistry::builtin());
    let statements = statements_generated_in(&resolver, &records, 2025, 10).unwrap();
    let listed: usize = statements.iter().map(|s| s.len()).sum();
    assert!(statements
        .iter()
        .flat_map(|s| s.charges.iter())
        .all(|r| !r.card.is_unmapped()));
    assert!(listed <= records.len() - unmapped);
}

#[test]
fn test_october_statements_per_card() {
    let matcher = CardMatcher::builtin();
    let records = records(&matcher);
    let resolver = CycleResolver::new(CycleRegistry::builtin());

    let statements = statements_generated_in(&resolver, &records, 2025, 10).unwrap();
    let amex = statements.iter().find(|s| s.card == "Amex").unwrap();
    // 2025-09-22 .. 2025-10-21; the 22 Oct charge and the payment are out.
    assert_eq!(amex.len(), 3);
    assert_eq!(amex.total(), 2100.0);

    // HSBC Cash closes on the 7th: 2025-09-08 .. 2025-10-07.
    let hsbc_cash = statements.iter().find(|s| s.card == "HSBC Cash").unwrap();
    assert_eq!(hsbc_cash.window.cycle_start, ymd(2025, 9, 8));
    assert_eq!(hsbc_cash.window.cycle_end, ymd(2025, 10, 7));
    assert_eq!(hsbc_cash.total(), 950.0);
}

#[test]
fn test_bills_due_in_november_with_paid_flags() {
    let matcher = CardMatcher::builtin();
    let records = records(&matcher);
    let resolver = CycleResolver::new(CycleRegistry::builtin());

    let due = statements_due_in(&resolver, &records, 2025, 11).unwrap();
    assert!(due.iter().all(|s| s.window.is_due_in(2025, 11)));

    let mut flags = InMemoryFlagStore::new();
    for s in due.iter().filter(|s| !s.is_empty()) {
        flags.set(&FlagKey::card(&s.card, 2025, 11), true);
    }
    assert!(flags.is_paid(&FlagKey::card("Amex", 2025, 11)));
    assert!(flags.is_paid(&FlagKey::card("SBI", 2025, 11)));
    assert!(!flags.is_paid(&FlagKey::card("ICICI", 2025, 11)));
}

#[test]
fn test_override_reshapes_statement() {
    let matcher = CardMatcher::builtin();
    let records = records(&matcher);
    let mut book = OverrideBook::new();
    book.set(
        OverrideKey::new("Amex", 2025, 10).unwrap(),
        OverrideDates {
            start: ymd(2025, 9, 25),
            end: ymd(2025, 10, 22),
            due: ymd(2025, 11, 12),
        },
    );
    let resolver = CycleResolver::new(CycleRegistry::builtin()).with_overrides(book);

    let statements = statements_generated_in(&resolver, &records, 2025, 10).unwrap();
    let amex = statements.iter().find(|s| s.card == "Amex").unwrap();
    // 23 Sep drops out, 22 Oct comes in.
    assert_eq!(amex.total(), 800.50 + 99.50 + 450.0);
    assert_eq!(amex.window.due_date, ymd(2025, 11, 12));
}

#[test]
fn test_identified_cards_resolve_for_five_years() {
    let matcher = CardMatcher::builtin();
    let resolver = CycleResolver::new(CycleRegistry::builtin());

    for mode in ["Amex Gold", "ICICI Amazon Pay", "SBI Elite", "OneCard", "HSBC Cash", "HSBC Premier"] {
        let CardMatch::Matched(card) = matcher.identify(mode) else {
            panic!("{mode} should map to a card");
        };
        for year in 2024..=2028 {
            for month in 1..=12 {
                let w = resolver.resolve(&card, year, month).unwrap();
                assert!(w.cycle_start <= w.cycle_end);
                assert_eq!((w.cycle_end.year(), w.cycle_end.month()), (year, month));
            }
        }
    }
}

#[test]
fn test_resolver_errors_propagate() {
    let resolver = CycleResolver::new(CycleRegistry::builtin());
    assert_eq!(
        resolver.resolve("DoesNotExist", 2025, 10),
        Err(CycleError::UnknownCard("DoesNotExist".into()))
    );
    assert_eq!(resolver.resolve("Amex", 2025, 13), Err(CycleError::InvalidMonth(13)));
}
