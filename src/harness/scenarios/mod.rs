//! The scenario catalogue.
//!
//! Every scenario is generic over the resource tracker so it can also be driven
//! directly against an unlimited runtime; the harness instantiates them with
//! `LimitedTracker`.

use crate::harness::Scenario;

/// Pushes one `Scenario` per `name => run, expect;` line.
macro_rules! register {
    ($out:ident, $container:ident, { $($name:ident => $run:expr, $expect:expr;)* }) => {
        $(
            $out.push($crate::harness::Scenario {
                name: stringify!($name),
                container: $crate::harness::Container::$container,
                expect: $expect,
                run: $run,
            });
        )*
    };
}

mod dict;
mod list;
mod sequence;
mod set;
mod tuple;

/// Every registered scenario, in registration order.
#[must_use]
pub fn catalogue() -> Vec<Scenario> {
    let mut out = Vec::new();
    tuple::register(&mut out);
    list::register(&mut out);
    dict::register(&mut out);
    set::register(&mut out);
    out
}
