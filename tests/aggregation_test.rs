// Copyright 2026 Relatica Contributors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Aggregation Tests
//!
//! Tests grouped transforms driven by fold expressions: sum, count and
//! average per group, accumulator slot isolation, and grouping behavior
//! independent of the source row order.

use std::sync::Arc;

use relatica::catalog::MemoryCatalog;
use relatica::core::{Column, DataType, Error, Heading, Row, Value};
use relatica::executor::{Builtin, CompiledExpr, Evaluator, ExprKind, Instr, Program};
use relatica::storage::{LocalTable, Relation};

fn heading(cols: &[(&str, DataType)]) -> Heading {
    Heading::tuple(cols.iter().map(|(n, t)| Column::new(*n, *t)).collect())
        .expect("valid heading")
}

fn num(n: f64) -> Value {
    Value::Number(n)
}

// sales(g: Text, n: Number)
fn sales(rows: &[(&str, f64)]) -> LocalTable {
    let h = heading(&[("g", DataType::Text), ("n", DataType::Number)]);
    let mut t = LocalTable::new(h);
    for (g, n) in rows {
        t.add_values(vec![Value::text(*g), num(*n)]).expect("valid row");
    }
    t
}

// fold step: running value + field
fn step_add(field: &str) -> Arc<CompiledExpr> {
    Arc::new(CompiledExpr::coded(
        "step",
        ExprKind::IsFolded,
        Program::new(vec![
            Instr::LoadAgg(num(0.0)),
            Instr::LoadField(field.into()),
            Instr::Call {
                builtin: Builtin::Add,
                args: 2,
            },
            Instr::EndOfStatement,
        ]),
        DataType::Number,
        None,
        0,
    ))
}

// fold step: running value + 1
fn step_count() -> Arc<CompiledExpr> {
    Arc::new(CompiledExpr::coded(
        "step",
        ExprKind::IsFolded,
        Program::new(vec![
            Instr::LoadAgg(num(0.0)),
            Instr::LoadConst(num(1.0)),
            Instr::Call {
                builtin: Builtin::Add,
                args: 2,
            },
            Instr::EndOfStatement,
        ]),
        DataType::Number,
        None,
        0,
    ))
}

// one fold over accumulator slot `index`
fn fold_instrs(index: usize, step: Arc<CompiledExpr>) -> Vec<Instr> {
    vec![
        Instr::LoadAccBlock,
        Instr::LoadConst(num(index as f64)),
        Instr::LoadConst(num(0.0)),
        Instr::LoadSegment(step),
        Instr::Call {
            builtin: Builtin::Fold,
            args: 4,
        },
    ]
}

fn fold_expr(name: &str, index: usize, step: Arc<CompiledExpr>) -> CompiledExpr {
    let mut instrs = fold_instrs(index, step);
    instrs.push(Instr::EndOfStatement);
    CompiledExpr::coded(
        name,
        ExprKind::HasFold,
        Program::new(instrs),
        DataType::Number,
        None,
        1,
    )
}

fn group_key() -> CompiledExpr {
    CompiledExpr::renaming("g", "g", DataType::Text)
}

// expected rows given as (g, value); add_row realigns them to the
// canonical column order of `h`
fn expect_groups(result: &LocalTable, h: &Heading, value_col: &str, rows: &[(&str, f64)]) {
    let by_name = Heading::new(vec![
        Column::new("g", DataType::Text),
        Column::new(value_col, DataType::Number),
    ])
    .expect("valid heading");
    let mut expected = LocalTable::new(h.clone());
    for (g, v) in rows {
        let row = Row::new(by_name.clone(), vec![Value::text(*g), num(*v)]).expect("valid row");
        expected.add_row(&row).expect("conforming row");
    }
    assert_eq!(*result, expected);
}

#[test]
fn sum_by_group() {
    let t = sales(&[("a", 1.0), ("a", 2.0), ("b", 5.0)]);
    let catalog = MemoryCatalog::new();
    let mut ev = Evaluator::new(&catalog);

    let h = heading(&[("g", DataType::Text), ("total", DataType::Number)]);
    let exprs = vec![group_key(), fold_expr("total", 0, step_add("n"))];
    let result = t.transform_aggregate(&h, &exprs, &mut ev).unwrap();

    expect_groups(&result, &h, "total", &[("a", 3.0), ("b", 5.0)]);
}

#[test]
fn sum_is_independent_of_row_order() {
    let t1 = sales(&[("a", 1.0), ("b", 5.0), ("a", 2.0)]);
    let t2 = sales(&[("b", 5.0), ("a", 2.0), ("a", 1.0)]);
    let catalog = MemoryCatalog::new();
    let mut ev = Evaluator::new(&catalog);

    let h = heading(&[("g", DataType::Text), ("total", DataType::Number)]);
    let exprs = vec![group_key(), fold_expr("total", 0, step_add("n"))];
    let r1 = t1.transform_aggregate(&h, &exprs, &mut ev).unwrap();
    let r2 = t2.transform_aggregate(&h, &exprs, &mut ev).unwrap();

    assert_eq!(r1, r2);
}

#[test]
fn count_by_group() {
    let t = sales(&[("a", 1.0), ("a", 2.0), ("a", 7.0), ("b", 5.0)]);
    let catalog = MemoryCatalog::new();
    let mut ev = Evaluator::new(&catalog);

    let h = heading(&[("g", DataType::Text), ("cnt", DataType::Number)]);
    let exprs = vec![group_key(), fold_expr("cnt", 0, step_count())];
    let result = t.transform_aggregate(&h, &exprs, &mut ev).unwrap();

    expect_groups(&result, &h, "cnt", &[("a", 3.0), ("b", 1.0)]);
}

// two fold columns in one pass; each owns a distinct slot
#[test]
fn sum_and_count_use_separate_slots() {
    let t = sales(&[("a", 1.0), ("a", 2.0), ("b", 5.0)]);
    let catalog = MemoryCatalog::new();
    let mut ev = Evaluator::new(&catalog);

    let h = heading(&[
        ("g", DataType::Text),
        ("total", DataType::Number),
        ("cnt", DataType::Number),
    ]);
    let exprs = vec![
        group_key(),
        fold_expr("total", 0, step_add("n")),
        fold_expr("cnt", 1, step_count()),
    ];
    let result = t.transform_aggregate(&h, &exprs, &mut ev).unwrap();

    let by_name = Heading::new(vec![
        Column::new("g", DataType::Text),
        Column::new("total", DataType::Number),
        Column::new("cnt", DataType::Number),
    ])
    .unwrap();
    let mut expected = LocalTable::new(h);
    for (g, total, cnt) in [("a", 3.0, 2.0), ("b", 5.0, 1.0)] {
        let row = Row::new(by_name.clone(), vec![Value::text(g), num(total), num(cnt)]).unwrap();
        expected.add_row(&row).unwrap();
    }
    assert_eq!(result, expected);
}

// one expression folding twice: sum / count
#[test]
fn average_accumulates_two_slots() {
    let t = sales(&[("a", 1.0), ("a", 2.0), ("b", 5.0)]);
    let catalog = MemoryCatalog::new();
    let mut ev = Evaluator::new(&catalog);

    let mut instrs = fold_instrs(0, step_add("n"));
    instrs.extend(fold_instrs(1, step_count()));
    instrs.push(Instr::Call {
        builtin: Builtin::Div,
        args: 2,
    });
    instrs.push(Instr::EndOfStatement);
    let avg = CompiledExpr::coded(
        "avg",
        ExprKind::HasFold,
        Program::new(instrs),
        DataType::Number,
        None,
        2,
    );

    let h = heading(&[("g", DataType::Text), ("avg", DataType::Number)]);
    let exprs = vec![group_key(), avg];
    let result = t.transform_aggregate(&h, &exprs, &mut ev).unwrap();

    expect_groups(&result, &h, "avg", &[("a", 1.5), ("b", 5.0)]);
}

#[test]
fn grouping_over_no_folds_is_projection() {
    let t = sales(&[("a", 1.0), ("a", 2.0), ("b", 5.0)]);
    let catalog = MemoryCatalog::new();
    let mut ev = Evaluator::new(&catalog);

    let h = heading(&[("g", DataType::Text)]);
    let exprs = vec![group_key()];
    let result = t.transform_aggregate(&h, &exprs, &mut ev).unwrap();

    let mut expected = LocalTable::new(h);
    expected.add_values(vec![Value::text("a")]).unwrap();
    expected.add_values(vec![Value::text("b")]).unwrap();
    assert_eq!(result, expected);
}

#[test]
fn fold_over_empty_table_yields_no_groups() {
    let t = sales(&[]);
    let catalog = MemoryCatalog::new();
    let mut ev = Evaluator::new(&catalog);

    let h = heading(&[("g", DataType::Text), ("total", DataType::Number)]);
    let exprs = vec![group_key(), fold_expr("total", 0, step_add("n"))];
    let result = t.transform_aggregate(&h, &exprs, &mut ev).unwrap();
    assert_eq!(result.cardinality(), 0);
}

// a fold call missing its default and step arguments must error, not panic
#[test]
fn fold_call_with_missing_arguments_is_an_error() {
    let t = sales(&[("a", 1.0)]);
    let catalog = MemoryCatalog::new();
    let mut ev = Evaluator::new(&catalog);

    let truncated = CompiledExpr::coded(
        "total",
        ExprKind::HasFold,
        Program::new(vec![
            Instr::LoadAccBlock,
            Instr::LoadConst(num(0.0)),
            Instr::Call {
                builtin: Builtin::Fold,
                args: 2,
            },
            Instr::EndOfStatement,
        ]),
        DataType::Number,
        None,
        1,
    );
    let h = heading(&[("g", DataType::Text), ("total", DataType::Number)]);
    let exprs = vec![group_key(), truncated];
    let err = t.transform_aggregate(&h, &exprs, &mut ev).unwrap_err();
    assert!(matches!(err, Error::EmptyStack));
}
