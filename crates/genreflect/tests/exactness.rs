//! Member-type resolution scenarios: exactness, partial resolution,
//! annotation propagation, owner chains, and capture conversion.

use genreflect::{
    annotate, erase, merge_annotations, unbounded_wildcard, AnnotatedClass, AnnotatedKind,
    AnnotatedType, AnnotationId, ClassDef, ClassId, ClassKind, ConstructorDef, Error, FieldDef,
    MethodDef, PrimitiveType, ResolveContext, Type, TypeEnv, TypeStore, TypeVarId,
};
use pretty_assertions::assert_eq;

/// `interface O<@A1 T, @A1 S> { Map<@A2 T, @A3 S> mapOf(); Set<@A2 T[]> setOf(); }`
/// and `class W<T> implements O<String, T>`.
struct OwFixture {
    store: TypeStore,
    a1: AnnotationId,
    a2: AnnotationId,
    a3: AnnotationId,
    o: ClassId,
    o_t: TypeVarId,
    o_s: TypeVarId,
    w: ClassId,
    w_t: TypeVarId,
}

fn ow_fixture() -> OwFixture {
    let mut store = TypeStore::with_minimal_jdk();
    let string = store.class_id("java.lang.String").unwrap();
    let set = store.class_id("java.util.Set").unwrap();
    let map = store.class_id("java.util.Map").unwrap();
    let a1 = store.add_annotation("A1");
    let a2 = store.add_annotation("A2");
    let a3 = store.add_annotation("A3");

    let o = store.intern_class_id("com.example.O");
    let o_t = store.add_type_param("T", Some(o), vec![]);
    let o_s = store.add_type_param("S", Some(o), vec![]);
    store.type_param_mut(o_t).unwrap().annotations = vec![a1];
    store.type_param_mut(o_s).unwrap().annotations = vec![a1];

    let mut map_of = AnnotatedType::class(
        map,
        vec![AnnotatedType::type_var(o_t), AnnotatedType::type_var(o_s)],
    );
    if let AnnotatedKind::Class(c) = &mut map_of.kind {
        c.args[0].annotations = vec![a2];
        c.args[1].annotations = vec![a3];
    }
    let mut component = AnnotatedType::type_var(o_t);
    component.annotations = vec![a2];
    let set_of = AnnotatedType::class(set, vec![AnnotatedType::array(component)]);

    store.define_class(
        o,
        ClassDef {
            type_params: vec![o_t, o_s],
            methods: vec![
                MethodDef {
                    name: "mapOf".into(),
                    type_params: vec![],
                    params: vec![],
                    return_type: map_of,
                    is_static: false,
                },
                MethodDef {
                    name: "setOf".into(),
                    type_params: vec![],
                    params: vec![],
                    return_type: set_of,
                    is_static: false,
                },
            ],
            ..ClassDef::new("com.example.O", ClassKind::Interface)
        },
    );

    let w = store.intern_class_id("com.example.W");
    let w_t = store.add_type_param("T", Some(w), vec![]);
    store.define_class(
        w,
        ClassDef {
            type_params: vec![w_t],
            interfaces: vec![Type::class(
                o,
                vec![Type::raw(string), Type::TypeVar(w_t)],
            )],
            ..ClassDef::new("com.example.W", ClassKind::Class)
        },
    );

    OwFixture {
        store,
        a1,
        a2,
        a3,
        o,
        o_t,
        o_s,
        w,
        w_t,
    }
}

#[test]
fn member_types_resolve_through_an_interface_edge_with_annotations() {
    let f = ow_fixture();
    let string = f.store.class_id("java.lang.String").unwrap();
    let integer = f.store.class_id("java.lang.Integer").unwrap();
    let map = f.store.class_id("java.util.Map").unwrap();
    let map_of = f.store.method_id(f.o, "mapOf").unwrap();

    let ctx = AnnotatedType::class(f.w, vec![AnnotatedType::raw(integer)]);
    let mut rc = ResolveContext::new(&f.store);
    let out = rc.exact_return_type(map_of, &ctx).unwrap();
    assert_eq!(
        out.strip(),
        Type::class(map, vec![Type::raw(string), Type::raw(integer)])
    );
    let AnnotatedKind::Class(c) = &out.kind else {
        panic!("expected a class node");
    };
    // Use-site markers from the member, declaration-site markers from O's
    // parameters.
    assert!(c.args[0].has_annotation(f.a2) && c.args[0].has_annotation(f.a1));
    assert!(c.args[1].has_annotation(f.a3) && c.args[1].has_annotation(f.a1));
}

#[test]
fn raw_context_still_resolves_members_that_only_need_declared_edge_arguments() {
    let f = ow_fixture();
    let string = f.store.class_id("java.lang.String").unwrap();
    let set = f.store.class_id("java.util.Set").unwrap();
    let set_of = f.store.method_id(f.o, "setOf").unwrap();

    let mut rc = ResolveContext::new(&f.store);
    let out = rc
        .exact_return_type(set_of, &AnnotatedType::raw(f.w))
        .unwrap();
    assert_eq!(
        out.strip(),
        Type::class(set, vec![Type::array(Type::raw(string))])
    );
    let AnnotatedKind::Class(c) = &out.kind else {
        panic!("expected a class node");
    };
    let AnnotatedKind::Array(component) = &c.args[0].kind else {
        panic!("expected an array argument");
    };
    assert!(component.has_annotation(f.a2) && component.has_annotation(f.a1));
}

#[test]
fn raw_context_fails_exactness_where_it_does_not_determine_a_variable() {
    let f = ow_fixture();
    let string = f.store.class_id("java.lang.String").unwrap();
    let map = f.store.class_id("java.util.Map").unwrap();
    let map_of = f.store.method_id(f.o, "mapOf").unwrap();

    let mut rc = ResolveContext::new(&f.store);
    let err = rc
        .exact_return_type(map_of, &AnnotatedType::raw(f.w))
        .unwrap_err();
    assert!(matches!(err, Error::UnresolvedVariable { .. }));

    // The partial variant keeps W's own parameter in place.
    let out = rc.return_type(map_of, &AnnotatedType::raw(f.w)).unwrap();
    assert_eq!(
        out.strip(),
        Type::class(map, vec![Type::raw(string), Type::TypeVar(f.w_t)])
    );
}

#[test]
fn type_parameter_reads_arguments_off_the_hierarchy() {
    let f = ow_fixture();
    let string = f.store.class_id("java.lang.String").unwrap();
    let integer = f.store.class_id("java.lang.Integer").unwrap();

    let ctx = AnnotatedType::class(f.w, vec![AnnotatedType::raw(integer)]);
    let mut rc = ResolveContext::new(&f.store);
    assert_eq!(
        rc.type_parameter(&ctx, f.o_t).map(|t| t.strip()),
        Some(Type::raw(string))
    );
    assert_eq!(
        rc.type_parameter(&ctx, f.o_s).map(|t| t.strip()),
        Some(Type::raw(integer))
    );
    // A method-level variable has no declaring class to look up.
    let method_var = TypeVarId::new(u32::MAX >> 1);
    assert_eq!(rc.type_parameter(&ctx, method_var), None);
}

#[test]
fn method_level_variables_stay_free_but_their_bounds_resolve() {
    // class Q<G> { <S extends G> S m(S s); }
    let mut store = TypeStore::with_minimal_jdk();
    let string = store.class_id("java.lang.String").unwrap();
    let q = store.intern_class_id("com.example.Q");
    let g = store.add_type_param("G", Some(q), vec![]);
    let s = store.add_type_param("S", None, vec![Type::TypeVar(g)]);
    store.define_class(
        q,
        ClassDef {
            type_params: vec![g],
            methods: vec![MethodDef {
                name: "m".into(),
                type_params: vec![s],
                params: vec![AnnotatedType::type_var(s)],
                return_type: AnnotatedType::type_var(s),
                is_static: false,
            }],
            ..ClassDef::new("com.example.Q", ClassKind::Class)
        },
    );
    let m = store.method_id(q, "m").unwrap();

    let ctx = AnnotatedType::class(q, vec![AnnotatedType::raw(string)]);
    let mut rc = ResolveContext::new(&store);

    // Exact: the method's own variable is the call site's to instantiate.
    let out = rc.exact_return_type(m, &ctx).unwrap();
    assert_eq!(out.strip(), Type::TypeVar(s));
    let params = rc.exact_parameter_types(m, &ctx).unwrap();
    assert_eq!(params.len(), 1);
    assert_eq!(params[0].strip(), Type::TypeVar(s));

    // Partial: `S extends G` becomes a capture with `S extends String`.
    let out = rc.return_type(m, &ctx).unwrap();
    let AnnotatedKind::TypeVar(rewritten) = out.kind else {
        panic!("expected a type variable");
    };
    assert!(rewritten.is_capture());
    assert_eq!(
        rc.type_param(rewritten).unwrap().upper_bounds,
        vec![Type::raw(string)]
    );
}

#[test]
fn constructor_parameters_resolve_with_primitives_intact() {
    let mut store = TypeStore::with_minimal_jdk();
    let string = store.class_id("java.lang.String").unwrap();
    let holder = store.intern_class_id("com.example.Holder");
    let t = store.add_type_param("T", Some(holder), vec![]);
    store.define_class(
        holder,
        ClassDef {
            type_params: vec![t],
            constructors: vec![ConstructorDef {
                params: vec![
                    annotate(&Type::Primitive(PrimitiveType::Int)),
                    annotate(&Type::TypeVar(t)),
                ],
            }],
            ..ClassDef::new("com.example.Holder", ClassKind::Class)
        },
    );
    let ctor = store.constructor_id(holder, 0).unwrap();

    let ctx = AnnotatedType::class(holder, vec![AnnotatedType::raw(string)]);
    let mut rc = ResolveContext::new(&store);
    let params = rc.exact_constructor_parameter_types(ctor, &ctx).unwrap();
    assert_eq!(
        params.iter().map(AnnotatedType::strip).collect::<Vec<_>>(),
        vec![Type::Primitive(PrimitiveType::Int), Type::raw(string)]
    );
}

#[test]
fn shadowed_fields_resolve_by_declaring_identity() {
    let mut store = TypeStore::with_minimal_jdk();
    let list = store.class_id("java.util.List").unwrap();
    let string = store.class_id("java.lang.String").unwrap();
    let integer = store.class_id("java.lang.Integer").unwrap();

    let gummy = store.intern_class_id("com.example.Gummy");
    let t = store.add_type_param("T", Some(gummy), vec![]);
    store.define_class(
        gummy,
        ClassDef {
            type_params: vec![t],
            fields: vec![FieldDef {
                name: "value".into(),
                ty: annotate(&Type::class(list, vec![Type::TypeVar(t)])),
                is_static: false,
            }],
            ..ClassDef::new("com.example.Gummy", ClassKind::Class)
        },
    );
    let worm = store.add_class(ClassDef {
        super_class: Some(Type::class(gummy, vec![Type::raw(integer)])),
        fields: vec![FieldDef {
            name: "value".into(),
            ty: annotate(&Type::raw(string)),
            is_static: false,
        }],
        ..ClassDef::new("com.example.GummyWorm", ClassKind::Class)
    });
    let pen = store.add_class(ClassDef {
        fields: vec![FieldDef {
            name: "value".into(),
            ty: annotate(&Type::raw(string)),
            is_static: false,
        }],
        ..ClassDef::new("com.example.Pen", ClassKind::Class)
    });

    let ctx = AnnotatedType::raw(worm);
    let mut rc = ResolveContext::new(&store);

    // The inherited (shadowed) field, queried by its own identity.
    let inherited = store.field_id(gummy, "value").unwrap();
    let out = rc.exact_field_type(inherited, &ctx).unwrap();
    assert_eq!(out.strip(), Type::class(list, vec![Type::raw(integer)]));

    // The shadowing field itself.
    let own = store.field_id(worm, "value").unwrap();
    let out = rc.exact_field_type(own, &ctx).unwrap();
    assert_eq!(out.strip(), Type::raw(string));

    // A same-named field on an unrelated declaration is not a member.
    let unrelated = store.field_id(pen, "value").unwrap();
    let err = rc.exact_field_type(unrelated, &ctx).unwrap_err();
    assert!(matches!(err, Error::NotAMember { .. }));
}

#[test]
fn owner_chains_resolve_members_of_nested_generics() {
    // class Box<@A1 T> { class Lock<@A2 S> { Lock<T> echo(); Lock<S> echo2(); } }
    let mut store = TypeStore::with_minimal_jdk();
    let integer = store.class_id("java.lang.Integer").unwrap();
    let double = store.class_id("java.lang.Double").unwrap();
    let a1 = store.add_annotation("A1");
    let a2 = store.add_annotation("A2");
    let a4 = store.add_annotation("A4");
    let a5 = store.add_annotation("A5");

    let boxed = store.intern_class_id("com.example.Box");
    let t = store.add_type_param("T", Some(boxed), vec![]);
    store.type_param_mut(t).unwrap().annotations = vec![a1];
    store.define_class(
        boxed,
        ClassDef {
            type_params: vec![t],
            ..ClassDef::new("com.example.Box", ClassKind::Class)
        },
    );

    let lock = store.intern_class_id("com.example.Box.Lock");
    let s = store.add_type_param("S", Some(lock), vec![]);
    store.type_param_mut(s).unwrap().annotations = vec![a2];
    let lock_of = |arg: TypeVarId| {
        AnnotatedType::new(AnnotatedKind::Class(AnnotatedClass {
            def: lock,
            args: vec![AnnotatedType::type_var(arg)],
            owner: Some(Box::new(AnnotatedType::class(
                boxed,
                vec![AnnotatedType::type_var(t)],
            ))),
        }))
    };
    store.define_class(
        lock,
        ClassDef {
            type_params: vec![s],
            enclosing: Some(boxed),
            is_inner: true,
            methods: vec![
                MethodDef {
                    name: "echo".into(),
                    type_params: vec![],
                    params: vec![],
                    return_type: lock_of(t),
                    is_static: false,
                },
                MethodDef {
                    name: "echo2".into(),
                    type_params: vec![],
                    params: vec![],
                    return_type: lock_of(s),
                    is_static: false,
                },
            ],
            ..ClassDef::new("com.example.Box.Lock", ClassKind::Class)
        },
    );

    // Context: Box<@A4 Integer>.Lock<@A5 Double>.
    let mut outer_arg = AnnotatedType::raw(integer);
    outer_arg.annotations = vec![a4];
    let mut inner_arg = AnnotatedType::raw(double);
    inner_arg.annotations = vec![a5];
    let ctx = AnnotatedType::new(AnnotatedKind::Class(AnnotatedClass {
        def: lock,
        args: vec![inner_arg],
        owner: Some(Box::new(AnnotatedType::class(boxed, vec![outer_arg]))),
    }));

    let mut rc = ResolveContext::new(&store);
    let echo = store.method_id(lock, "echo").unwrap();
    let out = rc.exact_return_type(echo, &ctx).unwrap();
    let AnnotatedKind::Class(c) = &out.kind else {
        panic!("expected a class node");
    };
    assert_eq!(c.def, lock);
    assert_eq!(c.args[0].strip(), Type::raw(integer));
    // Instantiation marker, T's declaration marker, and the parameter
    // position's marker all land on the argument.
    assert!(c.args[0].has_annotation(a4));
    assert!(c.args[0].has_annotation(a1));
    assert!(c.args[0].has_annotation(a2));
    let owner = c.owner.as_deref().unwrap();
    let AnnotatedKind::Class(oc) = &owner.kind else {
        panic!("expected a class owner");
    };
    assert_eq!(oc.args[0].strip(), Type::raw(integer));
    assert!(oc.args[0].has_annotation(a4) && oc.args[0].has_annotation(a1));

    let echo2 = store.method_id(lock, "echo2").unwrap();
    let out = rc.exact_return_type(echo2, &ctx).unwrap();
    let AnnotatedKind::Class(c) = &out.kind else {
        panic!("expected a class node");
    };
    assert_eq!(c.args[0].strip(), Type::raw(double));
    assert!(c.args[0].has_annotation(a5) && c.args[0].has_annotation(a2));
}

#[test]
fn wildcard_contexts_are_captured_before_member_resolution() {
    // class ComplexBounds<T extends Number, U extends T> { U u; }
    let mut store = TypeStore::with_minimal_jdk();
    let number = store.class_id("java.lang.Number").unwrap();
    let cb = store.intern_class_id("com.example.ComplexBounds");
    let t = store.add_type_param("T", Some(cb), vec![Type::raw(number)]);
    let u = store.add_type_param("U", Some(cb), vec![Type::TypeVar(t)]);
    store.define_class(
        cb,
        ClassDef {
            type_params: vec![t, u],
            fields: vec![FieldDef {
                name: "u".into(),
                ty: annotate(&Type::TypeVar(u)),
                is_static: false,
            }],
            ..ClassDef::new("com.example.ComplexBounds", ClassKind::Class)
        },
    );
    let field = store.field_id(cb, "u").unwrap();

    let ctx = AnnotatedType::class(cb, vec![unbounded_wildcard(), unbounded_wildcard()]);
    let mut rc = ResolveContext::new(&store);
    let out = rc.exact_field_type(field, &ctx).unwrap();
    let AnnotatedKind::TypeVar(cap) = out.kind else {
        panic!("expected a capture variable");
    };
    assert!(cap.is_capture());
    // The capture's bound chain bottoms out at Number.
    assert_eq!(erase(&rc, &out.strip()), Type::raw(number));
}

#[test]
fn erasure_of_resolved_members_is_invariant_across_hierarchy_depth() {
    // class Holder<T> { List<T> items; }
    // class Mid extends Holder<String>; class Leaf extends Mid.
    let mut store = TypeStore::with_minimal_jdk();
    let list = store.class_id("java.util.List").unwrap();
    let string = store.class_id("java.lang.String").unwrap();

    let holder = store.intern_class_id("com.example.Holder");
    let t = store.add_type_param("T", Some(holder), vec![]);
    store.define_class(
        holder,
        ClassDef {
            type_params: vec![t],
            fields: vec![FieldDef {
                name: "items".into(),
                ty: annotate(&Type::class(list, vec![Type::TypeVar(t)])),
                is_static: false,
            }],
            ..ClassDef::new("com.example.Holder", ClassKind::Class)
        },
    );
    let mid = store.add_class(ClassDef {
        super_class: Some(Type::class(holder, vec![Type::raw(string)])),
        ..ClassDef::new("com.example.Mid", ClassKind::Class)
    });
    let leaf = store.add_class(ClassDef {
        super_class: Some(Type::raw(mid)),
        ..ClassDef::new("com.example.Leaf", ClassKind::Class)
    });
    let field = store.field_id(holder, "items").unwrap();

    let mut rc = ResolveContext::new(&store);
    let direct_ctx = AnnotatedType::class(holder, vec![AnnotatedType::raw(string)]);
    let direct = rc.exact_field_type(field, &direct_ctx).unwrap();
    let deep = rc
        .exact_field_type(field, &AnnotatedType::raw(leaf))
        .unwrap();

    // The member resolves identically whether the context names the
    // declaration directly or reaches it two edges down, so the erasures
    // agree as well.
    assert_eq!(direct.strip(), deep.strip());
    assert_eq!(erase(&rc, &direct.strip()), erase(&rc, &deep.strip()));
    assert_eq!(erase(&rc, &direct.strip()), Type::raw(list));
}

#[test]
fn resolution_against_a_context_substitutes_reachable_variables_only() {
    let mut f = ow_fixture();
    let integer = f.store.class_id("java.lang.Integer").unwrap();
    let list = f.store.class_id("java.util.List").unwrap();
    let free = f.store.add_type_param("Z", None, vec![]);

    let ctx = AnnotatedType::class(f.w, vec![AnnotatedType::raw(integer)]);
    let mut rc = ResolveContext::new(&f.store);

    let ty = annotate(&Type::class(list, vec![Type::TypeVar(f.o_s)]));
    let out = rc.resolve_exact_type(&ty, &ctx).unwrap();
    assert_eq!(out.strip(), Type::class(list, vec![Type::raw(integer)]));

    // A variable with no declaring class and no bindings stays free in the
    // partial variant and fails the exact one.
    let ty = annotate(&Type::class(list, vec![Type::TypeVar(free)]));
    let out = rc.resolve_type(&ty, &ctx).unwrap();
    assert_eq!(out.strip(), Type::class(list, vec![Type::TypeVar(free)]));
    let err = rc.resolve_exact_type(&ty, &ctx).unwrap_err();
    assert!(matches!(err, Error::UnresolvedVariable { .. }));
}

#[test]
fn annotations_never_merge_across_positions() {
    let f = ow_fixture();
    let string = f.store.class_id("java.lang.String").unwrap();
    let map = f.store.class_id("java.util.Map").unwrap();

    let mut left = AnnotatedType::class(
        map,
        vec![AnnotatedType::raw(string), AnnotatedType::raw(string)],
    );
    let mut right = left.clone();
    if let AnnotatedKind::Class(c) = &mut left.kind {
        c.args[0].annotations = vec![f.a2];
    }
    if let AnnotatedKind::Class(c) = &mut right.kind {
        c.args[1].annotations = vec![f.a3];
    }
    let merged = merge_annotations(&left, &right).unwrap();
    let AnnotatedKind::Class(c) = &merged.kind else {
        panic!("expected a class node");
    };
    assert_eq!(c.args[0].annotations, vec![f.a2]);
    assert_eq!(c.args[1].annotations, vec![f.a3]);
}
