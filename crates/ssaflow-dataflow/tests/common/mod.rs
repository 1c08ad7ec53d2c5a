#![allow(dead_code)]

use ssaflow_core::{InstId, Program, ProgramBuilder};
use ssaflow_dataflow::Value;
use std::collections::HashMap;
use std::sync::{Arc, Once};

pub fn init_tracing() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_test_writer()
            .with_max_level(tracing_subscriber::filter::LevelFilter::DEBUG)
            .try_init();
    });
}

pub struct Fixture {
    pub program: Arc<Program>,
    ids: HashMap<&'static str, InstId>,
}

impl Fixture {
    fn new(builder: ProgramBuilder, ids: Vec<(&'static str, InstId)>) -> Self {
        init_tracing();
        Self {
            program: builder.finish().unwrap(),
            ids: ids.into_iter().collect(),
        }
    }

    pub fn id(&self, name: &str) -> InstId {
        *self
            .ids
            .get(name)
            .unwrap_or_else(|| panic!("fixture has no value {:?}", name))
    }

    pub fn value(&self, name: &str) -> Value {
        Value::new(&self.program, self.id(name)).unwrap()
    }

    pub fn all_values(&self) -> Vec<Value> {
        self.program
            .instructions()
            .map(|inst| Value::new(&self.program, inst.id).unwrap())
            .collect()
    }
}

/// `a = {}; a.b = 1; if e { a.b = 3 }; d = a.b`
pub fn phi_merge() -> Fixture {
    let mut builder = ProgramBuilder::new("phi_merge");
    let mut main = builder.main();
    let a = main.make("a");
    let key = main.constant("b");
    let one = main.constant(1);
    main.member(one, a, key);
    let e = main.undefined("e");
    let three = main.constant(3);
    main.member(three, a, key);
    let phi = main.phi(vec![one, three]);
    main.member(phi, a, key);
    let d = main.assign("d", phi);

    let ids = vec![("a", a), ("one", one), ("three", three), ("e", e), ("d", d)];
    Fixture::new(builder, ids)
}

/// `a = 1; b = i => i; c = b(a)`
pub fn pass_through() -> Fixture {
    let mut builder = ProgramBuilder::new("pass_through");
    let mut main = builder.main();
    let one = main.constant(1);
    let a = main.assign("a", one);
    let (b, i) = {
        let mut b = main.function("b");
        let i = b.param("i");
        b.ret(vec![i]);
        (b.id(), i)
    };
    let call = main.call(b, vec![a]);
    let c = main.assign("c", call);

    let ids = vec![("a", a), ("b", b), ("i", i), ("c", c)];
    Fixture::new(builder, ids)
}

/// `c = () => { return 1, 2 }; r = c(); a = r[0]; b = r[1]; sa = a + 10`
pub fn multi_return() -> Fixture {
    let mut builder = ProgramBuilder::new("multi_return");
    let mut main = builder.main();
    let (c, one, two) = {
        let mut c = main.function("c");
        let one = c.constant(1);
        let two = c.constant(2);
        c.ret(vec![one, two]);
        (c.id(), one, two)
    };
    let call = main.call(c, vec![]);
    let r = main.assign("r", call);
    let k0 = main.constant(0);
    let k1 = main.constant(1);
    let field_a = main.field(r, k0);
    let a = main.assign("a", field_a);
    let field_b = main.field(r, k1);
    let b = main.assign("b", field_b);
    let ten = main.constant(10);
    let sum = main.add(a, ten);
    let sa = main.assign("sa", sum);

    let ids = vec![
        ("c", c),
        ("one", one),
        ("two", two),
        ("r", r),
        ("a", a),
        ("b", b),
        ("sa", sa),
    ];
    Fixture::new(builder, ids)
}

/// `a = 1; b = i => i + 1; c = b(a); e = c + 1; sink = i => { println(i) }; sink(e)`
pub fn deep_call() -> Fixture {
    let mut builder = ProgramBuilder::new("deep_call");
    let mut main = builder.main();
    let one = main.constant(1);
    let a = main.assign("a", one);
    let b = {
        let mut b = main.function("b");
        let i = b.param("i");
        let one = b.constant(1);
        let sum = b.add(i, one);
        b.ret(vec![sum]);
        b.id()
    };
    let call = main.call(b, vec![a]);
    let c = main.assign("c", call);
    let one_more = main.constant(1);
    let sum = main.add(c, one_more);
    let e = main.assign("e", sum);
    let println = main.undefined("println");
    let (sink, printed) = {
        let mut sink = main.function("sink");
        let i = sink.param("i");
        let printed = sink.call(println, vec![i]);
        (sink.id(), printed)
    };
    let sink_call = main.call(sink, vec![e]);

    let ids = vec![
        ("a", a),
        ("b", b),
        ("c", c),
        ("e", e),
        ("println", println),
        ("printed", printed),
        ("sink", sink),
        ("sink_call", sink_call),
    ];
    Fixture::new(builder, ids)
}

/// `a = 1; b = () => { a = 2 }; if e { b() }; c = a`
pub fn side_effect() -> Fixture {
    let mut builder = ProgramBuilder::new("side_effect");
    let mut main = builder.main();
    let one = main.constant(1);
    let a = main.assign("a", one);
    let (b, two) = {
        let mut b = main.function("b");
        let two = b.constant(2);
        b.assign("a", two);
        b.declare_side_effect("a", two);
        (b.id(), two)
    };
    let e = main.undefined("e");
    let call = main.call(b, vec![]);
    let after = main.side_effect("a", call, two);
    let phi = main.phi(vec![a, after]);
    let c = main.assign("c", phi);

    let ids = vec![
        ("a", a),
        ("b", b),
        ("two", two),
        ("e", e),
        ("call", call),
        ("after", after),
        ("c", c),
    ];
    Fixture::new(builder, ids)
}

/// `f1(x) = f2(x); ... f5(x) = f1(x); r = f1(1)`
pub fn recursion_chain() -> Fixture {
    let mut builder = ProgramBuilder::new("recursion_chain");
    let mut main = builder.main();
    let functions: Vec<InstId> = ["f1", "f2", "f3", "f4", "f5"]
        .iter()
        .map(|name| main.declare_function(name))
        .collect();
    for (index, function) in functions.iter().enumerate() {
        let next = functions[(index + 1) % functions.len()];
        let mut f = main.enter(*function);
        let x = f.param("x");
        let call = f.call(next, vec![x]);
        f.ret(vec![call]);
    }
    let one = main.constant(1);
    let call = main.call(functions[0], vec![one]);
    let r = main.assign("r", call);

    let ids = vec![("one", one), ("r", r), ("f1", functions[0])];
    Fixture::new(builder, ids)
}

/// `b = a + 1; c = b + e; d = c + f; g = d`
pub fn depth_chain() -> Fixture {
    let mut builder = ProgramBuilder::new("depth_chain");
    let mut main = builder.main();
    let a = main.undefined("a");
    let one = main.constant(1);
    let sum = main.add(a, one);
    let b = main.assign("b", sum);
    let e = main.undefined("e");
    let sum = main.add(b, e);
    let c = main.assign("c", sum);
    let f = main.undefined("f");
    let sum = main.add(c, f);
    let g = main.assign("g", sum);

    let ids = vec![("a", a), ("b", b), ("c", c), ("e", e), ("f", f), ("g", g)];
    Fixture::new(builder, ids)
}

/// `f = (x, ...rest) => rest; r = f(1, 2, 3)`
pub fn variadic() -> Fixture {
    let mut builder = ProgramBuilder::new("variadic");
    let mut main = builder.main();
    let f = {
        let mut f = main.function("f");
        f.param("x");
        let rest = f.param("rest");
        f.ret(vec![rest]);
        f.id()
    };
    let one = main.constant(1);
    let two = main.constant(2);
    let three = main.constant(3);
    let call = main.call(f, vec![one, two, three]);
    let r = main.assign("r", call);

    let ids = vec![("one", one), ("three", three), ("r", r)];
    Fixture::new(builder, ids)
}

/// `a = 1; f = () => a; r1 = f() with a bound to 7; r2 = f()`
pub fn free_values() -> Fixture {
    let mut builder = ProgramBuilder::new("free_values");
    let mut main = builder.main();
    let one = main.constant(1);
    main.assign("a", one);
    let f = {
        let mut f = main.function("f");
        let a = f.free_value("a");
        f.ret(vec![a]);
        f.id()
    };
    let seven = main.constant(7);
    let bound = main.call_with_binding(f, vec![], vec![("a", seven)]);
    let r1 = main.assign("r1", bound);
    let unbound = main.call(f, vec![]);
    let r2 = main.assign("r2", unbound);

    let ids = vec![("one", one), ("seven", seven), ("r1", r1), ("r2", r2)];
    Fixture::new(builder, ids)
}

/// `f = () => 5; r1 = f(); r2 = f(); s = r1 + 1`
pub fn shared_callee() -> Fixture {
    let mut builder = ProgramBuilder::new("shared_callee");
    let mut main = builder.main();
    let (f, five) = {
        let mut f = main.function("f");
        let five = f.constant(5);
        f.ret(vec![five]);
        (f.id(), five)
    };
    let call = main.call(f, vec![]);
    let r1 = main.assign("r1", call);
    let call = main.call(f, vec![]);
    let r2 = main.assign("r2", call);
    let one = main.constant(1);
    let sum = main.add(r1, one);
    let s = main.assign("s", sum);

    let ids = vec![("f", f), ("five", five), ("r1", r1), ("r2", r2), ("s", s)];
    Fixture::new(builder, ids)
}

/// `o = {}; o.b = 1; w = () => { o.b = 2 }; d = o.b` with both writes recorded as masks on `d`
pub fn masked_member() -> Fixture {
    let mut builder = ProgramBuilder::new("masked_member");
    let mut main = builder.main();
    let o = main.make("o");
    let key = main.constant("b");
    let one = main.constant(1);
    main.member(one, o, key);
    let two = {
        let mut w = main.function("w");
        let two = w.constant(2);
        w.member(two, o, key);
        w.declare_side_effect("o.b", two);
        two
    };
    let read = main.field(o, key);
    let d = main.assign("d", read);
    main.add_mask(d, one);
    main.add_mask(d, two);

    let ids = vec![("o", o), ("one", one), ("two", two), ("d", d)];
    Fixture::new(builder, ids)
}

/// `f = x => x; f(1); apply = cb => cb(); apply(f)`
pub fn callbacks() -> Fixture {
    let mut builder = ProgramBuilder::new("callbacks");
    let mut main = builder.main();
    let f = {
        let mut f = main.function("f");
        let x = f.param("x");
        f.ret(vec![x]);
        f.id()
    };
    let one = main.constant(1);
    let direct = main.call(f, vec![one]);
    let apply = {
        let mut apply = main.function("apply");
        let cb = apply.param("cb");
        apply.call(cb, vec![]);
        apply.id()
    };
    let indirect = main.call(apply, vec![f]);

    let ids = vec![
        ("f", f),
        ("direct", direct),
        ("apply", apply),
        ("indirect", indirect),
    ];
    Fixture::new(builder, ids)
}

/// `x0 = a; x1 = x0 + 1; ...; last = x{len - 1} + 1`
pub fn long_chain(len: usize) -> Fixture {
    let mut builder = ProgramBuilder::new("long_chain");
    let mut main = builder.main();
    let a = main.undefined("a");
    let one = main.constant(1);
    let mut x = a;
    for _ in 0..len {
        x = main.add(x, one);
    }

    let ids = vec![("a", a), ("one", one), ("last", x)];
    Fixture::new(builder, ids)
}

/// `f = (x, y) => y; r = f(1)`
pub fn missing_argument() -> Fixture {
    let mut builder = ProgramBuilder::new("missing_argument");
    let mut main = builder.main();
    let (f, y) = {
        let mut f = main.function("f");
        f.param("x");
        let y = f.param("y");
        f.ret(vec![y]);
        (f.id(), y)
    };
    let one = main.constant(1);
    let call = main.call(f, vec![one]);
    let r = main.assign("r", call);

    let ids = vec![("f", f), ("y", y), ("r", r)];
    Fixture::new(builder, ids)
}

/// `c = () => { return 1 }; r = c(); b = r[1]; n = () => {}; m = n()`
pub fn short_return() -> Fixture {
    let mut builder = ProgramBuilder::new("short_return");
    let mut main = builder.main();
    let c = {
        let mut c = main.function("c");
        let one = c.constant(1);
        c.ret(vec![one]);
        c.id()
    };
    let call = main.call(c, vec![]);
    let r = main.assign("r", call);
    let k1 = main.constant(1);
    let field = main.field(r, k1);
    let b = main.assign("b", field);
    let n = main.function("n").id();
    let call = main.call(n, vec![]);
    let m = main.assign("m", call);

    let ids = vec![("c", c), ("r", r), ("b", b), ("n", n), ("m", m)];
    Fixture::new(builder, ids)
}

/// `f` returns `1` but also lists the constant `2` as a return; `g` lists only `3`;
/// `rf = f(); rg = g()`
pub fn malformed_returns() -> Fixture {
    let mut builder = ProgramBuilder::new("malformed_returns");
    let mut main = builder.main();
    let (f, one) = {
        let mut f = main.function("f");
        let one = f.constant(1);
        f.ret(vec![one]);
        let two = f.constant(2);
        f.declare_return(two);
        (f.id(), one)
    };
    let g = {
        let mut g = main.function("g");
        let three = g.constant(3);
        g.declare_return(three);
        g.id()
    };
    let call = main.call(f, vec![]);
    let rf = main.assign("rf", call);
    let call = main.call(g, vec![]);
    let rg = main.assign("rg", call);

    let ids = vec![("f", f), ("one", one), ("g", g), ("rf", rf), ("rg", rg)];
    Fixture::new(builder, ids)
}

/// `obj = {}; m = obj.exec; r = m(1)`
pub fn member_method() -> Fixture {
    let mut builder = ProgramBuilder::new("member_method");
    let mut main = builder.main();
    let obj = main.make("obj");
    let key = main.constant("exec");
    let read = main.field(obj, key);
    let m = main.assign("m", read);
    let one = main.constant(1);
    let call = main.call(m, vec![one]);
    let r = main.assign("r", call);

    let ids = vec![("obj", obj), ("key", key), ("m", m), ("one", one), ("r", r)];
    Fixture::new(builder, ids)
}
