//! Tests for group resolution

use pretty_assertions::assert_eq;
use takeoff::prelude::*;
use takeoff::{resolve, resolve_with_options};

fn fixed_point() -> ResolveOptions {
    ResolveOptions {
        strategy: ResolutionStrategy::FixedPoint,
        ..Default::default()
    }
}

/// Group with plain inputs A and B plus the given `(code, expression)` formulas
fn group_with(formulas: &[(&str, &str)]) -> CalculationGroup {
    let mut group = CalculationGroup::new("g", "Test");
    group.variables.push(Variable::input("va", "A", "Input A"));
    group.variables.push(Variable::input("vb", "B", "Input B"));
    for (index, (code, value)) in formulas.iter().enumerate() {
        let id = format!("f{}", index);
        group
            .formulas
            .push(Formula::new(id.clone(), *code, *value, "pc"));
        group
            .variables
            .push(Variable::formula_result(format!("vf{}", index), *code, *code, id));
    }
    group
}

fn inputs(pairs: &[(&str, f64)]) -> InputState {
    pairs.iter().map(|(code, value)| (*code, *value)).collect()
}

/// A + B resolves, inputs first, then formulas
#[test]
fn test_sum_of_inputs() {
    let group = group_with(&[("C", "[A] + [B]")]);
    let items = resolve(&group, &inputs(&[("A", 2.0), ("B", 3.0)]));

    assert_eq!(
        items,
        vec![
            CalculatedItem::new("Input A", 2.0, "un"),
            CalculatedItem::new("Input B", 3.0, "un"),
            CalculatedItem::new("C", 5.0, "pc"),
        ]
    );
}

/// Formulas may read results declared after them; output keeps declaration order
#[test]
fn test_declaration_order_is_kept() {
    let group = group_with(&[("TOTAL", "[DOUBLE] + [A]"), ("DOUBLE", "[A] * 2")]);
    let values = inputs(&[("A", 4.0)]);

    for options in [ResolveOptions::default(), fixed_point()] {
        let resolution = resolve_with_options(&group, &values, &options);
        let names: Vec<_> = resolution.items.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["Input A", "TOTAL", "DOUBLE"]);
        assert_eq!(resolution.items[1].quantity, 12.0);
    }
}

/// Cycles terminate and omit only the formulas involved
#[test]
fn test_cycle_terminates() {
    let group = group_with(&[
        ("X", "[Y] + 1"),
        ("Y", "[X] + 1"),
        ("SELF", "[SELF] * 2"),
        ("OK", "[A] + 1"),
    ]);
    let values = inputs(&[("A", 1.0)]);

    for options in [ResolveOptions::default(), fixed_point()] {
        let resolution = resolve_with_options(&group, &values, &options);
        assert_eq!(
            resolution.items,
            vec![
                CalculatedItem::new("Input A", 1.0, "un"),
                CalculatedItem::new("OK", 2.0, "pc"),
            ]
        );
        assert_eq!(resolution.unresolved().count(), 3);
        assert_eq!(resolution.stats.resolved, 1);
    }

    let topo = resolve_with_options(&group, &values, &ResolveOptions::default());
    assert_eq!(topo.stats.circular_references, 3);
    assert!(topo
        .unresolved()
        .all(|(_, reason)| *reason == Unresolved::CircularReference));
}

/// Negative and zero results are left out of the items
#[test]
fn test_non_positive_results_omitted() {
    let group = group_with(&[("NEG", "[A] - [B]"), ("ZERO", "[A] * 0"), ("POS", "[B] - [A]")]);
    let items = resolve(&group, &inputs(&[("A", 1.0), ("B", 5.0)]));

    let names: Vec<_> = items.iter().map(|i| i.name.as_str()).collect();
    assert_eq!(names, vec!["Input A", "Input B", "POS"]);
}

/// A result read by another formula is used unclamped
#[test]
fn test_negative_intermediate_is_not_clamped() {
    let group = group_with(&[("DELTA", "[A] - [B]"), ("ABS", "0 - [DELTA]")]);
    let items = resolve(&group, &inputs(&[("A", 1.0), ("B", 4.0)]));
    assert_eq!(items.last(), Some(&CalculatedItem::new("ABS", 3.0, "pc")));
}

/// Half-typed expressions leave the rest of the group alone
#[test]
fn test_malformed_formula_is_skipped() {
    let group = group_with(&[("BAD", "[A] * ("), ("GOOD", "[A] * 3")]);
    let resolution = resolve_with_options(&group, &inputs(&[("A", 2.0)]), &ResolveOptions::default());

    assert_eq!(resolution.items.last(), Some(&CalculatedItem::new("GOOD", 6.0, "pc")));
    let (report, reason) = resolution.unresolved().next().unwrap();
    assert_eq!(report.name, "BAD");
    assert!(matches!(reason, Unresolved::Expression(_)));
}

/// Deeply nested or very long expressions are reported, not evaluated
#[test]
fn test_oversized_formulas_are_unresolvable() {
    let nested = format!("{}[A]{}", "(".repeat(500), ")".repeat(500));
    let long_sum = format!("[A]{}", "+[B]".repeat(2000));
    let group = group_with(&[("NESTED", &nested), ("LONG", &long_sum), ("GOOD", "[A] + 1")]);

    for options in [ResolveOptions::default(), fixed_point()] {
        let resolution = resolve_with_options(&group, &inputs(&[("A", 1.0), ("B", 1.0)]), &options);
        assert_eq!(resolution.items.last(), Some(&CalculatedItem::new("GOOD", 2.0, "pc")));
        assert_eq!(resolution.unresolved().count(), 2);
        assert!(resolution.unresolved().all(|(_, reason)| matches!(
            reason,
            Unresolved::Expression(takeoff::FormulaError::TooComplex(_))
        )));
    }
}

/// Unknown codes read as 0, text inputs are coerced
#[test]
fn test_input_coercion() {
    let group = group_with(&[("C", "[A] + [NOT_A_VARIABLE] + 1")]);
    let mut values = InputState::new();
    values.set_text("A", " 2.5 ");
    values.set_text("B", "abc");

    let items = resolve(&group, &values);
    assert_eq!(
        items,
        vec![
            CalculatedItem::new("Input A", 2.5, "un"),
            CalculatedItem::new("C", 3.5, "pc"),
        ]
    );
}

/// An untouched group produces nothing
#[test]
fn test_empty_inputs_produce_no_items() {
    for group in builtin_groups().iter() {
        let items = resolve(group, &group.initial_inputs());
        assert!(items.is_empty(), "{}", group.name);
    }
}

/// Electrical cable tray: chained results through several formulas
#[test]
fn test_builtin_cable_tray() {
    let groups = builtin_groups();
    let tray = groups.find_by_name("Electrical Cable Tray").unwrap();

    let mut values = tray.initial_inputs();
    values.set_number("TRAY_METERS", 10.0);
    values.set_number("HORIZONTAL_TEE", 1.0);

    let items: Vec<(String, f64)> = tray
        .resolve(&values)
        .into_iter()
        .map(|item| (item.name, item.quantity))
        .collect();
    let expected: Vec<(String, f64)> = [
        ("Cable Tray (Meters)", 10.0),
        ("Horizontal Tee", 1.0),
        ("Suspension Support", 5.0),
        ("Bolt with Lock", 44.0),
        ("Nut", 71.0),
        ("Washer", 71.0),
        ("Anchor Bolt", 5.0),
        ("Rebar", 2.0),
    ]
    .into_iter()
    .map(|(name, quantity)| (name.to_string(), quantity))
    .collect();
    assert_eq!(items, expected);
}

/// Both strategies agree on every built-in group
#[test]
fn test_strategies_agree_on_builtin_groups() {
    for group in builtin_groups().iter() {
        let mut values = group.initial_inputs();
        for (n, variable) in group.variables.iter().filter(|v| v.is_plain_input()).enumerate() {
            if variable.is_info {
                values.set_text(variable.code.clone(), format!("info{}", n));
            } else {
                values.set_number(variable.code.clone(), (n % 7 + 1) as f64);
            }
        }

        let topo = group.resolve_with_options(&values, &ResolveOptions::default());
        let fixed = group.resolve_with_options(&values, &fixed_point());
        assert_eq!(topo.items, fixed.items, "{}", group.name);
        assert_eq!(topo.unresolved().count(), 0, "{}", group.name);
        assert_eq!(topo.stats.formula_count, group.formulas.len());
    }
}
