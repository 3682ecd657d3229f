//! SSA integration tests.
//!
//! These tests drive the complete pipeline through the public API:
//! 1. Describe a routine as a flat statement list over a symbol table
//! 2. Build its SSA form
//! 3. Check phi placement, versions and the may-def/may-use lists
//! 4. Emit the statement list back and compare it with the input

use meir::{
    me::{build_module, verify, MeDefBy, MeFunction, MeStmtKind, OStIdx},
    mir::{
        BaseNode, CallReturn, Callee, LabelIdx, MirFunction, MirModule, Opcode, PrimType, PuIdx,
        StIdx, StmtKind, StmtNode, SymbolTable, TyIdx,
    },
    Error, MeConfig, Result,
};

fn i32_read(st: StIdx) -> BaseNode {
    BaseNode::dread(PrimType::I32, st)
}

fn i32_const(value: i64) -> BaseNode {
    BaseNode::int(PrimType::I32, value)
}

fn ost_of(func: &MeFunction, st: StIdx) -> OStIdx {
    func.ssatab()
        .find_symbol(st, 0)
        .expect("symbol not in the SSA table")
}

/// ```text
///         switch (s) @L3 { 1: @L1, 2: @L2 }
/// @L1:    y = 10; goto @L4
/// @L2:    y = 20; goto @L4
/// @L3:    y = 30
/// @L4:    return y
/// ```
fn switch_function() -> (MirFunction, StIdx) {
    let mut symbols = SymbolTable::new();
    let s = symbols.declare_formal("s", PrimType::I32);
    let y = symbols.declare_local("y", PrimType::I32);
    let [l1, l2, l3, l4] = [1, 2, 3, 4].map(LabelIdx::new);

    let body = vec![
        StmtNode::new(
            Opcode::Switch,
            StmtKind::Switch {
                opnd: i32_read(s),
                default: l3,
                cases: vec![(1, l1), (2, l2)],
            },
        ),
        StmtNode::label(l1),
        StmtNode::dassign(y, i32_const(10)),
        StmtNode::goto(l4),
        StmtNode::label(l2),
        StmtNode::dassign(y, i32_const(20)),
        StmtNode::goto(l4),
        StmtNode::label(l3),
        StmtNode::dassign(y, i32_const(30)),
        StmtNode::label(l4),
        StmtNode::ret(vec![i32_read(y)]),
    ];
    (MirFunction::new("switch", symbols, body), y)
}

/// ```text
///         *p = 1
///         call f()
///         return g + *p
/// ```
fn memory_function() -> (MirFunction, StIdx) {
    let mut symbols = SymbolTable::new();
    let p = symbols.declare_formal("p", PrimType::Ptr);
    let g = symbols.declare_global("g", PrimType::I32);
    let ptr = TyIdx::new(3);

    let body = vec![
        StmtNode::new(
            Opcode::Iassign,
            StmtKind::Iassign {
                ty: ptr,
                field_id: 0,
                addr: BaseNode::dread(PrimType::Ptr, p),
                rhs: i32_const(1),
            },
        ),
        StmtNode::new(
            Opcode::Call,
            StmtKind::Call {
                callee: Callee::Direct(PuIdx::new(7)),
                args: Vec::new(),
                rets: Vec::new(),
            },
        ),
        StmtNode::ret(vec![BaseNode::operator(
            Opcode::Add,
            PrimType::I32,
            vec![
                i32_read(g),
                BaseNode::iread(PrimType::I32, ptr, BaseNode::dread(PrimType::Ptr, p)),
            ],
        )]),
    ];
    (MirFunction::new("memory", symbols, body), g)
}

#[test]
fn test_switch_join_phi() -> Result<()> {
    let (mir, y) = switch_function();
    let func = MeFunction::build(&mir, &MeConfig::default())?;
    let layout = func.cfg().layout();
    assert_eq!(layout.len(), 5);

    let entry = func.cfg().bb(layout[0]);
    assert_eq!(entry.succs().len(), 3);

    let join = func.cfg().bb(layout[4]);
    assert_eq!(join.preds().len(), 3);
    let y = ost_of(&func, y);
    let phi = func.irmap().phi(join.var_phis[&y]);
    assert_eq!(phi.opnds().len(), 3);
    for &opnd in phi.opnds() {
        let def = func.irmap().expr(opnd).def_by();
        assert!(matches!(def, Some(MeDefBy::Stmt(_))));
    }
    verify(&func)
}

#[test]
fn test_switch_round_trip() -> Result<()> {
    let (mir, _) = switch_function();
    let func = MeFunction::build(&mir, &MeConfig::default())?;
    assert_eq!(func.emit(), mir.body);
    Ok(())
}

#[test]
fn test_memory_effects() -> Result<()> {
    let (mir, g) = memory_function();
    let func = MeFunction::build(&mir, &MeConfig::default())?;
    let irmap = func.irmap();
    let g = ost_of(&func, g);
    let heap = func.ssatab().heap_ost().expect("indirect accesses need the heap");

    let stmts: Vec<_> = func.stmts(func.cfg().layout()[0]).collect();
    assert_eq!(stmts.len(), 3);

    let store = irmap.stmt(stmts[0]);
    assert!(matches!(store.kind(), MeStmtKind::Iassign(_)));
    let store_chi = store.chi_list().expect("iassign carries a chi list");
    assert!(store_chi.contains_key(&heap) && store_chi.contains_key(&g));

    let call = irmap.stmt(stmts[1]);
    let call_mu = call.mu_list().expect("call carries a mu list");
    assert_eq!(call_mu[&g], irmap.chi(store_chi[&g]).lhs());
    let call_chi = call.chi_list().expect("call carries a chi list");

    // The return reads what the call may have written.
    let ret = irmap.stmt(stmts[2]);
    let sum = irmap.expr(ret.opnd(0));
    let g_read = sum.opnd(0);
    assert_eq!(g_read, irmap.chi(call_chi[&g]).lhs());
    let g_vst = irmap.expr(g_read).vst().expect("g is a variable");
    let resolved = func.resolve_may_defs(g_vst).expect("defined by a chi");
    assert!(std::ptr::eq(resolved, call_chi));

    assert_eq!(func.emit(), mir.body);
    Ok(())
}

#[test]
fn test_alias_modeling_off() -> Result<()> {
    let (mir, _) = memory_function();
    let func = MeFunction::build(&mir, &MeConfig::minimal())?;
    for stmt in func.stmts(func.cfg().layout()[0]) {
        let node = func.irmap().stmt(stmt);
        assert!(node.chi_list().map_or(true, |chi| chi.is_empty()));
        assert!(node.mu_list().map_or(true, |mu| mu.is_empty()));
    }
    assert_eq!(func.emit(), mir.body);
    Ok(())
}

#[test]
fn test_call_results_are_must_defs() -> Result<()> {
    let mut symbols = SymbolTable::new();
    let r = symbols.declare_local("r", PrimType::I32);
    let body = vec![
        StmtNode::new(
            Opcode::Callassigned,
            StmtKind::Call {
                callee: Callee::Direct(PuIdx::new(2)),
                args: vec![i32_const(4)],
                rets: vec![CallReturn::Var(r, 0)],
            },
        ),
        StmtNode::ret(vec![i32_read(r)]),
    ];
    let mir = MirFunction::new("callee_result", symbols, body);
    let func = MeFunction::build(&mir, &MeConfig::default())?;
    let irmap = func.irmap();

    let stmts: Vec<_> = func.stmts(func.cfg().layout()[0]).collect();
    let must_defs = irmap.stmt(stmts[0]).must_def_list().expect("assigned call");
    assert_eq!(must_defs.len(), 1);
    let result = irmap.must_def(must_defs[0]).lhs();
    assert_eq!(irmap.expr(result).def_by(), Some(MeDefBy::MustDef(must_defs[0])));
    assert_eq!(irmap.stmt(stmts[1]).opnd(0), result);

    assert_eq!(func.emit(), mir.body);
    Ok(())
}

#[test]
fn test_module_build() {
    let mut module = MirModule::new();
    module.add_function(switch_function().0);
    module.add_function(memory_function().0);
    module.add_function(MirFunction::new("empty", SymbolTable::new(), Vec::new()));

    let built = build_module(&module, &MeConfig::default());
    assert_eq!(built.len(), 3);
    assert!(matches!(built[0], Some(Ok(_))));
    assert!(matches!(built[1], Some(Ok(_))));
    assert!(matches!(built[2], Some(Err(Error::Empty))));
}

#[test]
fn test_dump_lists_every_block() -> Result<()> {
    let (mir, _) = switch_function();
    let func = MeFunction::build(&mir, &MeConfig::default())?;
    let text = func.dump(&MeConfig::default());
    for &bb in func.cfg().layout() {
        assert!(text.contains(&format!("{bb} ")));
    }
    assert!(text.contains("switch (s_0) @L3 {1: @L1, 2: @L2}"));
    Ok(())
}
