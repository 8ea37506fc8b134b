//! The built-in demonstration suite.
//!
//! Two modules exercise every runner feature: value and dependent
//! fixtures, a parametrized test with named cases and an expected failure,
//! a custom `slow` mark, stacked parametrization, and a module skipped as a
//! whole.

use std::thread;
use std::time::Duration;

use crate::assertions::{ensure, ensure_eq, ensure_type};
use crate::case::{ParamCase, ParamSet, Suite, TestDef, TestModule};
use crate::errors::Result;
use crate::fixtures::{FixtureDef, FixtureRegistry};
use crate::marks::Mark;
use crate::value::{Value, ValueType};
use crate::values;

pub const GREETING: &str = "Какой чудесный день!";
pub const NAMES: &str = "Яша, Саша, Маша, Даша";
pub const DEFAULT_SLOW_DELAY: Duration = Duration::from_secs(3);

pub fn one_more(x: i64) -> i64 {
    x + 1
}

/// Splits on `", "` and sorts by code point.
pub fn get_sort_list(names: &str) -> Vec<String> {
    let mut list: Vec<String> = names.split(", ").map(str::to_string).collect();
    list.sort();
    list
}

pub fn cartesian_product(a: &Value, b: &Value) -> Result<Value> {
    a.mul(b)
}

pub fn transform_list(mut list: Vec<i64>) -> Vec<i64> {
    list.push(1);
    list.extend([2, 3]);
    list
}

pub fn fixtures() -> Result<FixtureRegistry> {
    let mut registry = FixtureRegistry::new();
    // Registered before its dependency on purpose: lookup is by name.
    registry.register(
        FixtureDef::new("pack_to_list", |args| {
            Ok(Value::List(vec![args.get("give_me_a_string")?.clone()]))
        })
        .requires("give_me_a_string"),
    )?;
    registry.register(FixtureDef::new("give_me_a_string", |_| {
        Ok(Value::from(GREETING))
    }))?;
    Ok(registry)
}

pub fn suite() -> Result<Suite> {
    suite_with_delay(DEFAULT_SLOW_DELAY)
}

/// The demo suite with a custom sleep for the `slow` test.
pub fn suite_with_delay(slow_delay: Duration) -> Result<Suite> {
    Ok(Suite::new(fixtures()?)
        .module(example_module(slow_delay))
        .module(pdb_module()))
}

fn example_module(slow_delay: Duration) -> TestModule {
    TestModule::new("test_example")
        .test(
            TestDef::new("test_string_fixture", |args| {
                let packed = args.get("pack_to_list")?;
                let string = args.get("give_me_a_string")?;
                ensure_eq(packed, &Value::List(vec![string.clone()]))
            })
            .fixture("pack_to_list")
            .fixture("give_me_a_string"),
        )
        .test(
            TestDef::new("test_one_more", |args| {
                ensure_eq(
                    one_more(args.int("input_arg")?),
                    args.int("expected_result")?,
                )
            })
            .parametrize(
                ParamSet::new(
                    "input_arg, expected_result",
                    vec![
                        ParamCase::new(values![4, 5]),
                        ParamCase::new(values![3, 5]).mark(Mark::xfail()),
                    ],
                )
                .ids(["First parameter", "Second parameter"]),
            ),
        )
        .test(TestDef::new("test_sort", |_| {
            ensure_eq(get_sort_list(NAMES), vec!["Даша", "Маша", "Саша", "Яша"])
        }))
        .test(
            // Fails on purpose: the result is a list, not an integer.
            TestDef::new("test_type", move |_| {
                thread::sleep(slow_delay);
                ensure_type(&Value::from(get_sort_list(NAMES)), ValueType::Int)
            })
            .mark(Mark::custom("slow")),
        )
        .test(
            TestDef::new("test_cartesian_product", |args| {
                let product = cartesian_product(args.get("x")?, args.get("y")?)?;
                ensure(!product.is_nil(), "assert cartesian_product(x, y) is not None")
            })
            .parametrize(ParamSet::single("y", ["one", "two"]))
            .parametrize(ParamSet::single("x", [1, 2])),
        )
}

fn pdb_module() -> TestModule {
    TestModule::new("test_pdb")
        .mark(Mark::skip())
        .test(TestDef::new("test_list", |_| {
            let mut list = vec![4];
            list.extend(transform_list(Vec::new()));
            ensure_eq(list, vec![1_i64, 2, 3, 4])
        }))
        .test(TestDef::new("test_will_be_skipped", |_| ensure(true, "")).mark(Mark::skip()))
}
