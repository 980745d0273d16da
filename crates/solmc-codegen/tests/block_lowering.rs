//! Block-level lowering fixtures: each test feeds an annotated body
//! through the block converter and compares the exact emitted text.

use solmc_analysis::{AnalysisStack, TranslationConfig};
use solmc_ast::ast::*;
use solmc_ast::builder as b;
use solmc_ast::types::SolType;
use solmc_cemit::CStmt;
use solmc_codegen::block::BlockLowering;
use solmc_codegen::specialization::FunctionSpecialization;

fn lower_function(unit: &SourceUnit, contract: ContractId, func: FunctionId) -> String {
    let stack = AnalysisStack::build(unit, &TranslationConfig::default()).expect("analysis");
    let spec = FunctionSpecialization::entry(func, contract);
    let stmts = BlockLowering::function(&stack, &spec, stack.registry.function(func), true)
        .expect("converter")
        .convert()
        .expect("lowering");
    CStmt::Block(stmts).to_string()
}

fn lower_modifier(
    unit: &SourceUnit,
    contract: ContractId,
    func: FunctionId,
    index: usize,
) -> String {
    let stack = AnalysisStack::build(unit, &TranslationConfig::default()).expect("analysis");
    let spec = FunctionSpecialization::entry(func, contract);
    let f = stack.registry.function(func);
    let flat = stack.inheritance.flat(contract);
    let mods = solmc_codegen::func::filtered_modifiers(&stack, flat, f);
    let (def, invocation) = mods[index];
    let next = if index + 1 < mods.len() {
        spec.mod_name(&stack, index + 1)
    } else {
        spec.base_name(&stack)
    };
    let stmts = BlockLowering::modifier(&stack, &spec, def, invocation, f, next)
        .expect("converter")
        .convert()
        .expect("lowering");
    CStmt::Block(stmts).to_string()
}

// Parameters are registered as declarations and unwrap on use.
#[test]
fn argument_registration() {
    let pa = b::var_decl("a", b::t_int());
    let pb = b::var_decl("b", b::t_int());
    let f = b::FunctionBuilder::new("f")
        .param(pa.clone())
        .param(pb.clone())
        .body(vec![
            b::expr_stmt(b::decl_ref(&pa)),
            b::expr_stmt(b::decl_ref(&pb)),
        ]);
    let fid = f.id;
    let a = b::ContractBuilder::new("A").function(f).build();
    let aid = a.id;
    let unit = b::unit(vec![a]);

    assert_eq!(
        lower_function(&unit, aid, fid),
        "{(func_user_a).v;(func_user_b).v;}"
    );
}

// Nested maps fold into a single flattened read.
#[test]
fn read_only_map_access() {
    // A second map shape ahead of `m` fixes its dense id at 2.
    let arr2 = b::var_decl("arr2", b::mapping(b::t_int(), b::mapping(b::t_int(), b::t_int())));
    let m = b::var_decl("m", b::mapping(b::t_int(), b::mapping(b::t_int(), b::t_int())));
    let inner = b::index(
        b::decl_ref(&m),
        b::num_typed(10, b::t_int()),
        b::mapping(b::t_int(), b::t_int()),
    );
    let outer = b::index(inner, b::num_typed(10, b::t_int()), b::t_int());
    let f = b::FunctionBuilder::new("f").body(vec![b::expr_stmt(outer)]);
    let fid = f.id;
    let a = b::ContractBuilder::new("A")
        .structure(b::struct_def("B", vec![arr2]))
        .state(m)
        .function(f)
        .build();
    let aid = a.id;
    let unit = b::unit(vec![a]);

    assert_eq!(
        lower_function(&unit, aid, fid),
        "{(Read_Map_2(&(self->user_m),Init_sol_int256_t(10),Init_sol_int256_t(10))).v;}"
    );
}

// Compound assignment on a map folds a read into the written value.
#[test]
fn compound_map_assignment() {
    let cm = b::var_decl("m", b::mapping(b::t_int(), b::t_int()));
    let a_map = b::var_decl("a", b::mapping(b::t_int(), b::t_int()));
    let lhs = b::index(b::decl_ref(&a_map), b::num_typed(1, b::t_int()), b::t_int());
    let f = b::FunctionBuilder::new("f").body(vec![b::expr_stmt(b::assign_op(
        AssignOp::Add,
        lhs,
        b::num_typed(2, b::t_int()),
    ))]);
    let fid = f.id;
    let a = b::ContractBuilder::new("A")
        .structure(b::struct_def("C", vec![cm]))
        .state(a_map)
        .function(f)
        .build();
    let aid = a.id;
    let unit = b::unit(vec![a]);

    assert_eq!(
        lower_function(&unit, aid, fid),
        "{Write_Map_2(&(self->user_a),Init_sol_int256_t(1),Init_sol_int256_t(((Read_Map_2(\
         &(self->user_a),Init_sol_int256_t(1))).v)+(2)));}"
    );
}

// Simple assignment on a map is a direct write.
#[test]
fn simple_map_assignment() {
    let a_map = b::var_decl("a", b::mapping(b::t_int(), b::t_int()));
    let lhs = b::index(b::decl_ref(&a_map), b::num_typed(1, b::t_int()), b::t_int());
    let f = b::FunctionBuilder::new("f").body(vec![b::expr_stmt(b::assign(
        lhs,
        b::num_typed(2, b::t_int()),
    ))]);
    let fid = f.id;
    let a = b::ContractBuilder::new("A").state(a_map).function(f).build();
    let aid = a.id;
    let unit = b::unit(vec![a]);

    assert_eq!(
        lower_function(&unit, aid, fid),
        "{Write_Map_1(&(self->user_a),Init_sol_int256_t(1),Init_sol_int256_t(2));}"
    );
}

// The payable pre-amble is the first lowered statement.
#[test]
fn payable_preamble() {
    let f = b::FunctionBuilder::new("f").payable().body(vec![]);
    let fid = f.id;
    let a = b::ContractBuilder::new("A").function(f).build();
    let aid = a.id;
    let unit = b::unit(vec![a]);

    assert_eq!(
        lower_function(&unit, aid, fid),
        "{if(((paid).v)==(1))(((self)->model_balance).v)+=((value).v);}"
    );
}

// Transfer and send lower into the payment primitives.
#[test]
fn payment_lowering() {
    let dst = b::var_decl("dst", b::t_address_payable());
    let f = b::FunctionBuilder::new("f").param(dst.clone()).body(vec![
        b::expr_stmt(b::transfer(b::decl_ref(&dst), b::num(5))),
        b::expr_stmt(b::send(b::decl_ref(&dst), b::num(10))),
    ]);
    let fid = f.id;
    let a = b::ContractBuilder::new("A").function(f).build();
    let aid = a.id;
    let unit = b::unit(vec![a]);

    assert_eq!(
        lower_function(&unit, aid, fid),
        "{_pay(&((self)->model_balance),Init_sol_address_t((func_user_dst).v),\
         Init_sol_uint256_t(5));\
         _pay_use_rv(&((self)->model_balance),Init_sol_address_t((func_user_dst).v),\
         Init_sol_uint256_t(10));}"
    );
}

// Assertions discard their message and carry a zero message id.
#[test]
fn verification_calls() {
    let f = b::FunctionBuilder::new("f").body(vec![
        b::expr_stmt(b::require(b::boolean(true))),
        b::expr_stmt(b::assert_call(b::boolean(true))),
    ]);
    let fid = f.id;
    let a = b::ContractBuilder::new("A").function(f).build();
    let aid = a.id;
    let unit = b::unit(vec![a]);

    assert_eq!(
        lower_function(&unit, aid, fid),
        "{sol_require(1,0);sol_assert(1,0);}"
    );
}

// Branch bodies are scoped; shadowed locals resolve to the inner frame.
#[test]
fn scoped_declarations() {
    let state_a = b::var_decl("a", b::t_int());
    let state_c = b::var_decl("c", b::t_int());
    let local_b = b::var_decl("b", b::t_int());
    let local_c = b::var_decl("c", b::t_int());

    let inner_block = b::block(vec![
        b::declare(local_c.clone()),
        b::expr_stmt(b::decl_ref(&state_a)),
        b::expr_stmt(b::decl_ref(&local_b)),
        b::expr_stmt(b::decl_ref(&local_c)),
    ]);
    let f = b::FunctionBuilder::new("f").body(vec![
        b::declare(local_b.clone()),
        inner_block,
        b::expr_stmt(b::decl_ref(&state_a)),
        b::expr_stmt(b::decl_ref(&local_b)),
        b::expr_stmt(b::decl_ref(&state_c)),
    ]);
    let fid = f.id;
    let a = b::ContractBuilder::new("A")
        .state(state_a)
        .state(state_c)
        .function(f)
        .build();
    let aid = a.id;
    let unit = b::unit(vec![a]);

    assert_eq!(
        lower_function(&unit, aid, fid),
        "{sol_int256_t func_user_b;\
         {sol_int256_t func_user_c;(self->user_a).v;(func_user_b).v;(func_user_c).v;}\
         (self->user_a).v;(func_user_b).v;(self->user_c).v;}"
    );
}

// Named return variables are implicitly declared and returned.
#[test]
fn named_return_variables() {
    let rv = b::var_decl("a", b::t_int());
    let f = b::FunctionBuilder::new("f")
        .returns(rv.clone())
        .body(vec![b::expr_stmt(b::assign(
            b::decl_ref(&rv),
            b::num_typed(5, b::t_int()),
        ))]);
    let fid = f.id;
    let a = b::ContractBuilder::new("A").function(f).build();
    let aid = a.id;
    let unit = b::unit(vec![a]);

    assert_eq!(
        lower_function(&unit, aid, fid),
        "{sol_int256_t func_user_a;((func_user_a).v)=(5);return func_user_a;}"
    );
}

// Unnamed returns wrap the returned expression.
#[test]
fn unnamed_return_wraps() {
    let rv = b::var_decl("", b::t_int());
    let f = b::FunctionBuilder::new("f").returns(rv).body(vec![b::ret(b::binary(
        BinaryOp::Add,
        b::num_typed(10, b::t_int()),
        b::num_typed(5, b::t_int()),
        b::t_int(),
    ))]);
    let fid = f.id;
    let a = b::ContractBuilder::new("A").function(f).build();
    let aid = a.id;
    let unit = b::unit(vec![a]);

    assert_eq!(
        lower_function(&unit, aid, fid),
        "{return Init_sol_int256_t((10)+(5));}"
    );
}

// Call-state members resolve to the threaded locals.
#[test]
fn magic_members() {
    let f = b::FunctionBuilder::new("f").payable().body(vec![
        b::expr_stmt(b::block_number()),
        b::expr_stmt(b::block_timestamp()),
        b::expr_stmt(b::msg_sender()),
        b::expr_stmt(b::msg_value()),
        b::expr_stmt(b::tx_origin()),
    ]);
    let fid = f.id;
    let a = b::ContractBuilder::new("A").function(f).build();
    let aid = a.id;
    let unit = b::unit(vec![a]);

    assert_eq!(
        lower_function(&unit, aid, fid),
        "{if(((paid).v)==(1))(((self)->model_balance).v)+=((value).v);\
         (blocknum).v;(timestamp).v;(sender).v;(value).v;(origin).v;}"
    );
}

// Internal calls pass self and an unpaid next call-state.
#[test]
fn internal_calls() {
    let g = b::FunctionBuilder::new("g").body(vec![]);
    let g_id = g.id;
    let pa = b::var_decl("a", b::t_int());
    let h = b::FunctionBuilder::new("h").param(pa).body(vec![]);
    let h_id = h.id;
    let test = b::FunctionBuilder::new("test").body(vec![
        b::expr_stmt(b::internal_call(
            b::func_ref("g", g_id),
            vec![],
            SolType::Tuple(vec![]),
        )),
        b::expr_stmt(b::internal_call(
            b::func_ref("h", h_id),
            vec![b::num_typed(1, b::t_int())],
            SolType::Tuple(vec![]),
        )),
    ]);
    let test_id = test.id;
    let a = b::ContractBuilder::new("A")
        .function(g)
        .function(h)
        .function(test)
        .build();
    let aid = a.id;
    let unit = b::unit(vec![a]);

    assert_eq!(
        lower_function(&unit, aid, test_id),
        "{Method_A_Funcg(self,sender,value,blocknum,timestamp,Init_sol_bool_t(0),origin);\
         Method_A_Funch(self,sender,value,blocknum,timestamp,Init_sol_bool_t(0),origin,\
         Init_sol_int256_t(1));}"
    );
}

// External calls pass the receiver by reference and a paid call-state.
#[test]
fn external_calls() {
    let mut contracts = Vec::new();
    let target_f = b::FunctionBuilder::new("f").body(vec![]);
    let target_fid = target_f.id;
    let target = b::ContractBuilder::new("A").function(target_f).build();
    let target_id = target.id;
    contracts.push(target);

    let field = b::var_decl("a", SolType::Contract(target_id));
    let this_id = b::fresh_contract_id();
    let callee_via_field = b::member_resolved(
        b::decl_ref(&field),
        "f",
        DeclRef::Function(target_fid),
        SolType::Function,
    );
    let test = b::FunctionBuilder::new("test").body(vec![b::expr_stmt(b::external_call(
        callee_via_field,
        vec![],
        SolType::Tuple(vec![]),
    ))]);
    let test_id = test.id;
    let caller = Contract {
        id: this_id,
        ..b::ContractBuilder::new("B").state(field).function(test).build()
    };
    contracts.push(caller);
    let unit = b::unit(contracts);

    assert_eq!(
        lower_function(&unit, this_id, test_id),
        "{Method_A_Funcf(&(self->user_a),(self)->model_address,Init_sol_uint256_t(0),\
         blocknum,timestamp,Init_sol_bool_t(1),origin);}"
    );
}

// Contract construction emits in place through the assigned identifier.
#[test]
fn contract_construction() {
    let pa = b::var_decl("_a", b::t_int());
    let ctor_field = b::var_decl("a", b::t_int());
    let ctor = b::FunctionBuilder::new("")
        .constructor()
        .param(pa.clone())
        .body(vec![b::expr_stmt(b::assign(
            b::decl_ref(&ctor_field),
            b::decl_ref(&pa),
        ))]);
    let target = b::ContractBuilder::new("B")
        .state(ctor_field)
        .function(ctor)
        .build();
    let target_id = target.id;

    let field = b::var_decl("b", SolType::Contract(target_id));
    let f = b::FunctionBuilder::new("f").body(vec![b::expr_stmt(b::assign(
        b::decl_ref(&field),
        b::new_contract(target_id, vec![b::num_typed(10, b::t_int())]),
    ))]);
    let fid = f.id;
    let caller = b::ContractBuilder::new("C").state(field).function(f).build();
    let caller_id = caller.id;
    let unit = b::unit(vec![target, caller]);

    assert_eq!(
        lower_function(&unit, caller_id, fid),
        "{Init_B(&(self->user_b),(self)->model_address,Init_sol_uint256_t(0),blocknum,\
         timestamp,Init_sol_bool_t(1),origin,Init_sol_int256_t(10));}"
    );
}

// Storage locals are pointers into contract state.
#[test]
fn storage_locals() {
    let field_i = b::var_decl("i", b::t_int());
    let s = b::struct_def("B", vec![field_i.clone()]);
    let sid = s.id;
    let state_b = b::var_decl("b", SolType::Struct(sid));
    let local = b::storage_decl("b_ref", SolType::Struct(sid));
    let local_with_init = VarDecl {
        init: Some(b::decl_ref(&state_b)),
        ..local.clone()
    };
    let member = b::member_resolved(
        b::var_ref("b_ref", local.id, SolType::Struct(sid)),
        "i",
        DeclRef::Var(field_i.id),
        b::t_int(),
    );
    let f = b::FunctionBuilder::new("f").view().body(vec![
        b::declare(local_with_init),
        b::expr_stmt(member),
    ]);
    let fid = f.id;
    let a = b::ContractBuilder::new("A")
        .structure(s)
        .state(state_b)
        .function(f)
        .build();
    let aid = a.id;
    let unit = b::unit(vec![a]);

    assert_eq!(
        lower_function(&unit, aid, fid),
        "{struct A_StructB*func_user_b__ref=&(self->user_b);\
         ((func_user_b__ref)->user_i).v;}"
    );
}

// Loops, branch scoping, and the else-if shape.
#[test]
fn control_flow() {
    let i = b::var_decl("i", b::t_int());
    let cond = b::binary(
        BinaryOp::Lt,
        b::decl_ref(&i),
        b::num_typed(10, b::t_int()),
        b::t_bool(),
    );
    let update = b::unary(UnaryOp::Inc, true, b::decl_ref(&i));
    let i_init = VarDecl {
        init: Some(b::num_typed(0, b::t_int())),
        ..i.clone()
    };
    let f = b::FunctionBuilder::new("f").body(vec![
        b::if_else(b::boolean(true), vec![], vec![]),
        b::while_stmt(b::boolean(false), vec![Stmt::Break]),
        b::for_stmt(Some(b::declare(i_init)), Some(cond), Some(update), vec![Stmt::Continue]),
    ]);
    let fid = f.id;
    let a = b::ContractBuilder::new("A").function(f).build();
    let aid = a.id;
    let unit = b::unit(vec![a]);

    assert_eq!(
        lower_function(&unit, aid, fid),
        "{if(1){}else {}\
         while(0){break;}\
         for(sol_int256_t func_user_i=Init_sol_int256_t(0);((func_user_i).v)<(10);\
         ++((func_user_i).v)){continue;}}"
    );
}

// Modifier arguments evaluate against the wrapped function's shadowed
// parameters, and the placeholder forwards them to the next link.
#[test]
fn modifier_arguments_and_placeholder() {
    let ma = b::var_decl("a", b::t_int());
    let mb = b::var_decl("b", b::t_int());
    let guard = b::require(b::binary(
        BinaryOp::Gt,
        b::decl_ref(&ma),
        b::decl_ref(&mb),
        b::t_bool(),
    ));
    let mod_a = b::modifier_def(
        "modA",
        vec![ma, mb],
        vec![b::expr_stmt(guard), Stmt::Placeholder],
    );

    let fa = b::var_decl("a", b::t_int());
    let fb = b::var_decl("b", b::t_int());
    let inv_args = vec![
        b::binary(
            BinaryOp::Add,
            b::decl_ref(&fb),
            b::num_typed(5, b::t_int()),
            b::t_int(),
        ),
        b::decl_ref(&fa),
    ];
    let f = b::FunctionBuilder::new("f")
        .param(fa)
        .param(fb)
        .invokes("modA", inv_args)
        .body(vec![]);
    let fid = f.id;
    let a = b::ContractBuilder::new("A").modifier(mod_a).function(f).build();
    let aid = a.id;
    let unit = b::unit(vec![a]);

    assert_eq!(
        lower_modifier(&unit, aid, fid, 0),
        "{sol_int256_t func_user_a=Init_sol_int256_t(((func_model_b).v)+(5));\
         sol_int256_t func_user_b=Init_sol_int256_t((func_model_a).v);\
         sol_require(((func_user_a).v)>((func_user_b).v),0);\
         Method_A_Funcf_base(self,sender,value,blocknum,timestamp,Init_sol_bool_t(0),origin,\
         func_model_a,func_model_b);}"
    );
}

// A return ahead of the placeholder keeps the wrapped body from running,
// via the synthesized holder.
#[test]
fn modifier_return_holder() {
    let mod_a = b::modifier_def(
        "modA",
        vec![],
        vec![Stmt::Placeholder, b::ret_void(), Stmt::Placeholder],
    );
    let rv = b::var_decl("", b::t_int());
    let f = b::FunctionBuilder::new("f")
        .invokes("modA", vec![])
        .returns(rv)
        .body(vec![b::ret(b::num_typed(5, b::t_int()))]);
    let fid = f.id;
    let a = b::ContractBuilder::new("A").modifier(mod_a).function(f).build();
    let aid = a.id;
    let unit = b::unit(vec![a]);

    assert_eq!(
        lower_modifier(&unit, aid, fid, 0),
        "{sol_int256_t func_model_rv;\
         (func_model_rv)=(Method_A_Funcf_base(self,sender,value,blocknum,timestamp,\
         Init_sol_bool_t(0),origin));\
         return func_model_rv;\
         (func_model_rv)=(Method_A_Funcf_base(self,sender,value,blocknum,timestamp,\
         Init_sol_bool_t(0),origin));\
         return func_model_rv;}"
    );
}

// Supported casts, including the address-literal index space.
#[test]
fn type_casts() {
    let sa = b::var_decl("a", b::t_address());
    let ss = b::var_decl("s", b::t_int());
    let su = b::var_decl("u", b::t_uint());
    let f = b::FunctionBuilder::new("f").view().body(vec![
        b::expr_stmt(b::cast(b::num(5), b::t_address())),
        b::expr_stmt(b::cast(b::decl_ref(&sa), b::t_int())),
        b::expr_stmt(b::cast(b::decl_ref(&sa), b::t_uint())),
        b::expr_stmt(b::cast(b::decl_ref(&ss), b::t_uint())),
        b::expr_stmt(b::cast(b::decl_ref(&su), b::t_int())),
        b::expr_stmt(b::cast(b::this_ref(b::fresh_contract_id()), b::t_address())),
    ]);
    let fid = f.id;
    let a = b::ContractBuilder::new("A")
        .state(sa)
        .state(ss)
        .state(su)
        .function(f)
        .build();
    let aid = a.id;
    let unit = b::unit(vec![a]);

    assert_eq!(
        lower_function(&unit, aid, fid),
        "{((int)(global_index_const_5));\
         (self->user_a).v;\
         ((unsigned int)((self->user_a).v));\
         ((unsigned int)((self->user_s).v));\
         ((int)((self->user_u).v));\
         ((self)->model_address).v;}"
    );
}

// Sub-denominations fold into the literal.
#[test]
fn denomination_folding() {
    let f = b::FunctionBuilder::new("f").body(vec![
        b::expr_stmt(b::num_denom(1, SubDenomination::Ether, b::t_uint())),
        b::expr_stmt(b::num_denom(2, SubDenomination::Minute, b::t_uint())),
    ]);
    let fid = f.id;
    let a = b::ContractBuilder::new("A").function(f).build();
    let aid = a.id;
    let unit = b::unit(vec![a]);

    assert_eq!(
        lower_function(&unit, aid, fid),
        "{1000000000000000000;120;}"
    );
}

// Unsupported statements abort the translation.
#[test]
fn unsupported_statements_are_fatal() {
    for stmt in [Stmt::Throw, Stmt::InlineAssembly] {
        let f = b::FunctionBuilder::new("f").body(vec![stmt]);
        let fid = f.id;
        let a = b::ContractBuilder::new("A").function(f).build();
        let aid = a.id;
        let unit = b::unit(vec![a]);
        let stack = AnalysisStack::build(&unit, &TranslationConfig::default()).unwrap();
        let spec = FunctionSpecialization::entry(fid, aid);
        let result = BlockLowering::function(&stack, &spec, stack.registry.function(fid), true)
            .unwrap()
            .convert();
        assert!(result.is_err());
    }
}

// Events are filtered out of the lowered body.
#[test]
fn emit_statements_are_filtered() {
    let event = b::call(
        CallKind::Event,
        b::func_ref("Logged", b::fresh_function_id()),
        vec![],
        SolType::Tuple(vec![]),
    );
    let f = b::FunctionBuilder::new("f").body(vec![Stmt::Emit(event)]);
    let fid = f.id;
    let a = b::ContractBuilder::new("A").function(f).build();
    let aid = a.id;
    let unit = b::unit(vec![a]);

    assert_eq!(lower_function(&unit, aid, fid), "{}");
}
