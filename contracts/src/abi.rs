//! Checks that two contracts expose the same outer interface.
//!
//! A single transformer may index many contracts at once, which only works
//! if they all share one ABI. Contracts are compared through a canonical
//! string for the constructor and for every function and event, so that
//! differences in parameter names, types, indexing or mutability all count.
//!
//! Names are visited in lexicographic order, which makes the first reported
//! mismatch the same on every run.

use std::collections::BTreeMap;

use ethabi::{Constructor, Contract, Event, Function, StateMutability};
use thiserror::Error;

/// The first structural difference found between two ABIs. `one` is always
/// the rendering from the reference ABI and `two` the one from the ABI
/// compared against it; a side that lacks the entry renders as `""`.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum AbiMismatch {
    #[error("constructors don't match constructorOne: {one}, constructorTwo: {two}")]
    Constructor { one: String, two: String },
    #[error("outer methods don't match for method {method}, method one: {one}, method two: {two}")]
    Method {
        method: String,
        one: String,
        two: String,
    },
    #[error("outer events don't match for event {event}, event one: {one}, event two: {two}")]
    Event {
        event: String,
        one: String,
        two: String,
    },
}

/// How much of the second ABI has to agree with the first.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AbiCheck {
    /// Every method and event of the first ABI must appear unchanged in the
    /// second. Extra entries in the second ABI are ignored.
    #[default]
    Subset,
    /// Like `Subset`, but entries only the second ABI has are mismatches too.
    Exact,
}

/// Compare `b` against `a` and report the first mismatch, if any.
///
/// This only looks at names present in `a`; use [`compare_abi`] with
/// [`AbiCheck::Exact`] to also reject names that only `b` defines.
pub fn compare_contract_abi(a: &Contract, b: &Contract) -> Result<(), AbiMismatch> {
    compare_abi(a, b, AbiCheck::Subset)
}

pub fn compare_abi(a: &Contract, b: &Contract, check: AbiCheck) -> Result<(), AbiMismatch> {
    let (one, two) = (
        constructor_string(a.constructor.as_ref()),
        constructor_string(b.constructor.as_ref()),
    );
    if one != two {
        return Err(AbiMismatch::Constructor { one, two });
    }

    if let Some((method, one, two)) = first_difference(&a.functions, &b.functions, functions_string)
    {
        return Err(AbiMismatch::Method { method, one, two });
    }
    if let Some((event, one, two)) = first_difference(&a.events, &b.events, events_string) {
        return Err(AbiMismatch::Event { event, one, two });
    }

    if check == AbiCheck::Exact {
        if let Some((method, two)) = first_extra(&a.functions, &b.functions, functions_string) {
            return Err(AbiMismatch::Method {
                method,
                one: String::new(),
                two,
            });
        }
        if let Some((event, two)) = first_extra(&a.events, &b.events, events_string) {
            return Err(AbiMismatch::Event {
                event,
                one: String::new(),
                two,
            });
        }
    }

    Ok(())
}

fn first_difference<T>(
    a: &BTreeMap<String, Vec<T>>,
    b: &BTreeMap<String, Vec<T>>,
    render: fn(&[T]) -> String,
) -> Option<(String, String, String)> {
    a.iter().find_map(|(name, entries)| {
        let one = render(entries);
        let two = b.get(name).map(|entries| render(entries)).unwrap_or_default();
        (one != two).then(|| (name.clone(), one, two))
    })
}

fn first_extra<T>(
    a: &BTreeMap<String, Vec<T>>,
    b: &BTreeMap<String, Vec<T>>,
    render: fn(&[T]) -> String,
) -> Option<(String, String)> {
    b.iter()
        .find(|(name, _)| !a.contains_key(*name))
        .map(|(name, entries)| (name.clone(), render(entries)))
}

/// `constructor(uint256 wad, address guy)`, or `""` when the ABI has no
/// constructor.
pub fn constructor_string(constructor: Option<&Constructor>) -> String {
    match constructor {
        Some(constructor) => format!(
            "constructor({})",
            params(constructor.inputs.iter().map(|p| (p.kind.to_string(), &p.name)))
        ),
        None => String::new(),
    }
}

/// `function transfer(address dst, uint256 wad) returns(bool)`. Non-payable
/// functions carry no mutability keyword.
pub fn function_string(function: &Function) -> String {
    let mutability = match function.state_mutability {
        StateMutability::Pure => "pure ",
        StateMutability::View => "view ",
        StateMutability::Payable => "payable ",
        StateMutability::NonPayable => "",
    };
    format!(
        "function {}({}) {}returns({})",
        function.name,
        params(function.inputs.iter().map(|p| (p.kind.to_string(), &p.name))),
        mutability,
        params(function.outputs.iter().map(|p| (p.kind.to_string(), &p.name))),
    )
}

/// `event Transfer(address indexed src, address indexed dst, uint256 wad)`
pub fn event_string(event: &Event) -> String {
    let mut out = format!(
        "event {}({})",
        event.name,
        params(event.inputs.iter().map(|p| {
            let kind = if p.indexed {
                format!("{} indexed", p.kind)
            } else {
                p.kind.to_string()
            };
            (kind, &p.name)
        }))
    );
    if event.anonymous {
        out.push_str(" anonymous");
    }
    out
}

fn functions_string(functions: &[Function]) -> String {
    functions
        .iter()
        .map(function_string)
        .collect::<Vec<_>>()
        .join("; ")
}

fn events_string(events: &[Event]) -> String {
    events
        .iter()
        .map(event_string)
        .collect::<Vec<_>>()
        .join("; ")
}

fn params<'a>(params: impl Iterator<Item = (String, &'a String)>) -> String {
    params
        .map(|(kind, name)| {
            if name.is_empty() {
                kind
            } else {
                format!("{} {}", kind, name)
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOKEN: &str = r#"[
        {"type":"constructor","inputs":[{"name":"symbol_","type":"bytes32"}]},
        {"type":"function","name":"transfer","stateMutability":"nonpayable",
         "inputs":[{"name":"dst","type":"address"},{"name":"wad","type":"uint256"}],
         "outputs":[{"name":"","type":"bool"}]},
        {"type":"function","name":"balanceOf","stateMutability":"view",
         "inputs":[{"name":"guy","type":"address"}],
         "outputs":[{"name":"","type":"uint256"}]},
        {"type":"event","name":"Transfer","anonymous":false,
         "inputs":[{"name":"src","type":"address","indexed":true},
                   {"name":"dst","type":"address","indexed":true},
                   {"name":"wad","type":"uint256","indexed":false}]}
    ]"#;

    fn parse(abi: &str) -> Contract {
        Contract::load(abi.as_bytes()).unwrap()
    }

    #[test]
    fn canonical_strings() {
        let token = parse(TOKEN);

        assert_eq!(
            "constructor(bytes32 symbol_)",
            constructor_string(token.constructor.as_ref())
        );
        assert_eq!(
            "function transfer(address dst, uint256 wad) returns(bool)",
            function_string(token.function("transfer").unwrap())
        );
        assert_eq!(
            "function balanceOf(address guy) view returns(uint256)",
            function_string(token.function("balanceOf").unwrap())
        );
        assert_eq!(
            "event Transfer(address indexed src, address indexed dst, uint256 wad)",
            event_string(token.event("Transfer").unwrap())
        );
        assert_eq!("", constructor_string(None));
    }

    #[test]
    fn identical_abis_match() {
        assert_eq!(Ok(()), compare_contract_abi(&parse(TOKEN), &parse(TOKEN)));
        assert_eq!(
            Ok(()),
            compare_abi(&parse(TOKEN), &parse(TOKEN), AbiCheck::Exact)
        );
    }

    #[test]
    fn constructor_mismatch() {
        let other = TOKEN.replace(r#""name":"symbol_","type":"bytes32""#, r#""name":"symbol_","type":"string""#);

        let err = compare_contract_abi(&parse(TOKEN), &parse(&other)).unwrap_err();
        assert_eq!(
            AbiMismatch::Constructor {
                one: "constructor(bytes32 symbol_)".to_string(),
                two: "constructor(string symbol_)".to_string(),
            },
            err
        );
    }

    #[test]
    fn method_mismatch_names_the_method() {
        let other = TOKEN.replace(r#""name":"guy","type":"address""#, r#""name":"usr","type":"address""#);

        let err = compare_contract_abi(&parse(TOKEN), &parse(&other)).unwrap_err();
        assert_eq!(
            AbiMismatch::Method {
                method: "balanceOf".to_string(),
                one: "function balanceOf(address guy) view returns(uint256)".to_string(),
                two: "function balanceOf(address usr) view returns(uint256)".to_string(),
            },
            err
        );
        assert_eq!(
            "outer methods don't match for method balanceOf, \
             method one: function balanceOf(address guy) view returns(uint256), \
             method two: function balanceOf(address usr) view returns(uint256)",
            err.to_string()
        );
    }

    #[test]
    fn event_mismatch_shows_both_sides() {
        let other = TOKEN.replace(
            r#"{"name":"wad","type":"uint256","indexed":false}"#,
            r#"{"name":"wad","type":"uint256","indexed":true}"#,
        );

        let err = compare_contract_abi(&parse(TOKEN), &parse(&other)).unwrap_err();
        assert_eq!(
            AbiMismatch::Event {
                event: "Transfer".to_string(),
                one: "event Transfer(address indexed src, address indexed dst, uint256 wad)"
                    .to_string(),
                two: "event Transfer(address indexed src, address indexed dst, uint256 indexed wad)"
                    .to_string(),
            },
            err
        );
    }

    #[test]
    fn method_missing_from_second_abi() {
        let a = parse(TOKEN);
        let mut b = parse(TOKEN);
        b.functions.remove("transfer");

        let err = compare_contract_abi(&a, &b).unwrap_err();
        assert_eq!(
            AbiMismatch::Method {
                method: "transfer".to_string(),
                one: "function transfer(address dst, uint256 wad) returns(bool)".to_string(),
                two: String::new(),
            },
            err
        );
    }

    #[test]
    fn extra_entries_only_fail_exact_check() {
        let a = parse(TOKEN);
        let mut b = parse(TOKEN);
        let approve = r#"[{"type":"function","name":"approve","stateMutability":"nonpayable",
            "inputs":[{"name":"usr","type":"address"}],"outputs":[]}]"#;
        b.functions.extend(parse(approve).functions);

        assert_eq!(Ok(()), compare_contract_abi(&a, &b));
        assert_eq!(
            Err(AbiMismatch::Method {
                method: "approve".to_string(),
                one: String::new(),
                two: "function approve(address usr) returns()".to_string(),
            }),
            compare_abi(&a, &b, AbiCheck::Exact)
        );
    }

    #[test]
    fn first_mismatch_is_lexicographic() {
        let a = parse(TOKEN);
        let mut b = parse(TOKEN);
        b.functions.clear();

        match compare_contract_abi(&a, &b) {
            Err(AbiMismatch::Method { method, .. }) => assert_eq!("balanceOf", method),
            other => panic!("expected a method mismatch, got {:?}", other),
        }
    }
}
