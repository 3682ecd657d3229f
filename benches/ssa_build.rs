//! Benchmarks for SSA construction and emission.
//!
//! The input is a chain of diamonds over a handful of locals and one global, followed by a
//! counting loop, so phi placement, renaming and chi/mu attachment all see real work.

extern crate meir;

use criterion::{criterion_group, criterion_main, Criterion};
use meir::{
    me::{build_module, MeFunction},
    mir::{
        BaseNode, Callee, LabelIdx, MirFunction, MirModule, Opcode, PrimType, PuIdx, StmtKind,
        StmtNode, SymbolTable,
    },
    MeConfig,
};
use std::hint::black_box;

fn diamond_chain(name: &str, diamonds: u32) -> MirFunction {
    let mut symbols = SymbolTable::new();
    let c = symbols.declare_formal("c", PrimType::I32);
    let g = symbols.declare_global("g", PrimType::I32);
    let vars: Vec<_> = (0..4)
        .map(|i| symbols.declare_local(&format!("v{i}"), PrimType::I32))
        .collect();
    let read = |st| BaseNode::dread(PrimType::I32, st);

    let mut body = Vec::new();
    let mut next_label = 1;
    for d in 0..diamonds {
        let (else_arm, join) = (LabelIdx::new(next_label), LabelIdx::new(next_label + 1));
        next_label += 2;
        let v = vars[d as usize % vars.len()];
        body.push(StmtNode::cond_goto(Opcode::Brfalse, read(c), else_arm));
        body.push(StmtNode::dassign(
            v,
            BaseNode::operator(Opcode::Add, PrimType::I32, vec![read(v), read(g)]),
        ));
        body.push(StmtNode::new(
            Opcode::Call,
            StmtKind::Call {
                callee: Callee::Direct(PuIdx::new(d)),
                args: vec![read(v)],
                rets: Vec::new(),
            },
        ));
        body.push(StmtNode::goto(join));
        body.push(StmtNode::label(else_arm));
        body.push(StmtNode::dassign(v, BaseNode::int(PrimType::I32, i64::from(d))));
        body.push(StmtNode::label(join));
    }

    let head = LabelIdx::new(next_label);
    body.push(StmtNode::label(head));
    body.push(StmtNode::dassign(
        vars[0],
        BaseNode::operator(
            Opcode::Add,
            PrimType::I32,
            vec![read(vars[0]), BaseNode::int(PrimType::I32, 1)],
        ),
    ));
    body.push(StmtNode::cond_goto(
        Opcode::Brtrue,
        BaseNode::operator(Opcode::Lt, PrimType::U1, vec![read(vars[0]), read(c)]),
        head,
    ));
    body.push(StmtNode::ret(vars.iter().map(|&v| read(v)).collect()));
    MirFunction::new(name, symbols, body)
}

fn bench_build_function(c: &mut Criterion) {
    let func = diamond_chain("chain", 64);
    let config = MeConfig::minimal();

    c.bench_function("ssa_build_64_diamonds", |b| {
        b.iter(|| {
            let built = MeFunction::build(black_box(&func), &config).unwrap();
            black_box(built)
        });
    });
}

fn bench_build_with_aliasing(c: &mut Criterion) {
    let func = diamond_chain("chain", 64);
    let config = MeConfig {
        verify_after_build: false,
        ..MeConfig::default()
    };

    c.bench_function("ssa_build_64_diamonds_alias", |b| {
        b.iter(|| {
            let built = MeFunction::build(black_box(&func), &config).unwrap();
            black_box(built)
        });
    });
}

fn bench_emit(c: &mut Criterion) {
    let func = MeFunction::build(&diamond_chain("chain", 64), &MeConfig::minimal()).unwrap();

    c.bench_function("ssa_emit_64_diamonds", |b| {
        b.iter(|| black_box(black_box(&func).emit()));
    });
}

fn bench_build_module(c: &mut Criterion) {
    let mut module = MirModule::new();
    for i in 0..32 {
        module.add_function(diamond_chain(&format!("chain{i}"), 32));
    }
    let config = MeConfig::minimal();

    c.bench_function("ssa_build_module_32_functions", |b| {
        b.iter(|| black_box(build_module(black_box(&module), &config)));
    });
}

criterion_group!(
    benches,
    bench_build_function,
    bench_build_with_aliasing,
    bench_emit,
    bench_build_module
);
criterion_main!(benches);
