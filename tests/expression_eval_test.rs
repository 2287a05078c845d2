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

//! Expression Evaluation Tests
//!
//! Tests the interpreter surface beyond plain arithmetic: user-defined
//! function invocation, accumulator bases across call boundaries, tuple
//! components, and catalog-resolved code.

use std::sync::Arc;

use relatica::catalog::{Catalog, MemoryCatalog};
use relatica::core::{AccumulatorBlock, Column, DataType, Error, Heading, Row, Value};
use relatica::executor::{Builtin, CompiledExpr, Evaluator, ExprKind, Instr, Program};

fn num(n: f64) -> Value {
    Value::Number(n)
}

fn call(builtin: Builtin, args: usize) -> Instr {
    Instr::Call { builtin, args }
}

fn arg_heading(names: &[&str]) -> Heading {
    Heading::new(
        names
            .iter()
            .map(|n| Column::new(*n, DataType::Number))
            .collect(),
    )
    .expect("valid heading")
}

// fn f(a, b) = a + b
fn add_function() -> Arc<CompiledExpr> {
    Arc::new(CompiledExpr::coded(
        "f",
        ExprKind::Open,
        Program::new(vec![
            Instr::LoadField("a".into()),
            Instr::LoadField("b".into()),
            call(Builtin::Add, 2),
            Instr::EndOfStatement,
        ]),
        DataType::Number,
        Some(arg_heading(&["a", "b"])),
        0,
    ))
}

// fn g(v) = fold(+, v), one accumulator slot
fn summing_function() -> Arc<CompiledExpr> {
    let step = Arc::new(CompiledExpr::coded(
        "step",
        ExprKind::IsFolded,
        Program::new(vec![
            Instr::LoadAgg(num(0.0)),
            Instr::LoadField("v".into()),
            call(Builtin::Add, 2),
            Instr::EndOfStatement,
        ]),
        DataType::Number,
        None,
        0,
    ));
    Arc::new(CompiledExpr::coded(
        "g",
        ExprKind::HasFold,
        Program::new(vec![
            Instr::LoadAccBlock,
            Instr::LoadConst(num(0.0)),
            Instr::LoadConst(num(0.0)),
            Instr::LoadSegment(step),
            call(Builtin::Fold, 4),
            Instr::EndOfStatement,
        ]),
        DataType::Number,
        Some(arg_heading(&["v"])),
        1,
    ))
}

#[test]
fn invoke_binds_arguments_by_position() {
    let catalog = MemoryCatalog::new();
    let mut ev = Evaluator::new(&catalog);

    let program = Program::new(vec![
        Instr::LoadSegment(add_function()),
        Instr::LoadConst(Value::None),
        Instr::LoadConst(num(0.0)),
        Instr::LoadConst(num(2.0)),
        Instr::LoadConst(num(3.0)),
        Instr::CallVariadic {
            builtin: Builtin::Invoke,
            fixed: 3,
            var: 2,
            as_code: false,
        },
        Instr::EndOfStatement,
    ]);
    let result = ev.exec(&program, None, None, None).unwrap();
    assert_eq!(result, num(5.0));
}

#[test]
fn invoked_fold_accumulates_at_the_caller_base() {
    let catalog = MemoryCatalog::new();
    let mut ev = Evaluator::new(&catalog);
    let block = AccumulatorBlock::shared();

    let invoke_g = |v: f64| {
        Program::new(vec![
            Instr::LoadSegment(summing_function()),
            Instr::LoadAccBlock,
            Instr::LoadConst(num(1.0)),
            Instr::LoadConst(num(v)),
            Instr::CallVariadic {
                builtin: Builtin::Invoke,
                fixed: 3,
                var: 1,
                as_code: false,
            },
            Instr::EndOfStatement,
        ])
    };

    let first = ev.exec(&invoke_g(5.0), None, None, Some(&block)).unwrap();
    assert_eq!(first, num(5.0));
    let second = ev.exec(&invoke_g(7.0), None, None, Some(&block)).unwrap();
    assert_eq!(second, num(12.0));

    // the running value lives at base 1, slot 0 was never touched
    block.borrow_mut().set_index_base(0);
    assert_eq!(block.borrow().get(1, num(0.0)), num(12.0));
    assert_eq!(block.borrow().get(0, Value::None), Value::None);
}

#[test]
fn invoke_without_a_block_reports_missing_accumulator() {
    let catalog = MemoryCatalog::new();
    let mut ev = Evaluator::new(&catalog);

    let program = Program::new(vec![
        Instr::LoadSegment(summing_function()),
        Instr::LoadAccBlock,
        Instr::LoadConst(num(0.0)),
        Instr::LoadConst(num(5.0)),
        Instr::CallVariadic {
            builtin: Builtin::Invoke,
            fixed: 3,
            var: 1,
            as_code: false,
        },
    ]);
    // no block supplied, so LoadAccBlock pushes None
    let result = ev.exec(&program, None, None, None);
    assert_eq!(result, Err(Error::MissingAccumulator));
}

#[test]
fn variadic_code_arguments_are_checked() {
    let catalog = MemoryCatalog::new();
    let mut ev = Evaluator::new(&catalog);

    let program = Program::new(vec![
        Instr::LoadSegment(add_function()),
        Instr::LoadConst(Value::None),
        Instr::LoadConst(num(0.0)),
        Instr::LoadConst(num(2.0)),
        Instr::CallVariadic {
            builtin: Builtin::Invoke,
            fixed: 3,
            var: 1,
            as_code: true,
        },
    ]);
    assert!(matches!(
        ev.exec(&program, None, None, None),
        Err(Error::InvalidOperand { .. })
    ));
}

#[test]
fn cumulative_fold_starts_from_the_type_default() {
    let catalog = MemoryCatalog::new();
    let mut ev = Evaluator::new(&catalog);

    let step = Arc::new(CompiledExpr::coded(
        "step",
        ExprKind::IsFolded,
        Program::new(vec![
            Instr::LoadAgg(num(0.0)),
            Instr::LoadConst(num(1.0)),
            call(Builtin::Add, 2),
            Instr::EndOfStatement,
        ]),
        DataType::Number,
        None,
        0,
    ));

    let with_seed = |seed: Value| {
        Program::new(vec![
            Instr::LoadConst(seed),
            Instr::LoadSegment(step.clone()),
            call(Builtin::CumFold, 2),
            Instr::EndOfStatement,
        ])
    };

    let fresh = ev.exec(&with_seed(Value::None), None, None, None).unwrap();
    assert_eq!(fresh, num(0.0));
    let stepped = ev.exec(&with_seed(num(10.0)), None, None, None).unwrap();
    assert_eq!(stepped, num(11.0));
}

#[test]
fn component_access_on_tuple_values() {
    let catalog = MemoryCatalog::new();
    let mut ev = Evaluator::new(&catalog);

    let h = Heading::tuple(vec![
        Column::new("x", DataType::Number),
        Column::new("y", DataType::Text),
    ])
    .unwrap();
    let row = Row::new(h, vec![num(3.0), Value::text("a")]).unwrap();

    let program = Program::new(vec![
        Instr::LoadConst(Value::Tuple(row.clone())),
        Instr::LoadComponent("x".into()),
        Instr::EndOfStatement,
    ]);
    assert_eq!(ev.exec(&program, None, None, None).unwrap(), num(3.0));

    let missing = Program::new(vec![
        Instr::LoadConst(Value::Tuple(row)),
        Instr::LoadComponent("z".into()),
    ]);
    assert_eq!(
        ev.exec(&missing, None, None, None),
        Err(Error::ComponentNotFound("z".into()))
    );
}

#[test]
fn concat_formats_both_operands() {
    let catalog = MemoryCatalog::new();
    let mut ev = Evaluator::new(&catalog);

    let program = Program::new(vec![
        Instr::LoadConst(Value::text("n=")),
        Instr::LoadConst(num(4.0)),
        call(Builtin::Concat, 2),
        Instr::EndOfStatement,
    ]);
    assert_eq!(ev.exec(&program, None, None, None).unwrap(), Value::text("n=4"));
}

#[test]
fn ordering_comparisons_reject_mixed_types() {
    let catalog = MemoryCatalog::new();
    let mut ev = Evaluator::new(&catalog);

    let program = Program::new(vec![
        Instr::LoadConst(num(1.0)),
        Instr::LoadConst(Value::text("a")),
        call(Builtin::Lt, 2),
    ]);
    assert!(matches!(
        ev.exec(&program, None, None, None),
        Err(Error::TypeMismatch { .. })
    ));
}

#[test]
fn catalog_raw_pushes_code_unevaluated() {
    let catalog = MemoryCatalog::new();
    catalog.set("body", Value::Code(add_function()));
    let mut ev = Evaluator::new(&catalog);

    let program = Program::new(vec![
        Instr::LoadCatalogRaw("body".into()),
        Instr::LoadConst(Value::None),
        Instr::LoadConst(num(0.0)),
        Instr::LoadConst(num(20.0)),
        Instr::LoadConst(num(22.0)),
        Instr::CallVariadic {
            builtin: Builtin::Invoke,
            fixed: 3,
            var: 2,
            as_code: false,
        },
        Instr::EndOfStatement,
    ]);
    assert_eq!(ev.exec(&program, None, None, None).unwrap(), num(42.0));
}

#[test]
fn catalog_raw_rejects_plain_values() {
    let catalog = MemoryCatalog::new();
    catalog.set("n", num(1.0));
    let mut ev = Evaluator::new(&catalog);

    let program = Program::new(vec![Instr::LoadCatalogRaw("n".into())]);
    assert!(matches!(
        ev.exec(&program, None, None, None),
        Err(Error::NotCode(_))
    ));
}
