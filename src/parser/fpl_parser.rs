use pest::iterators::Pair;
use pest::Parser;

use crate::error::FplError;
use crate::formulas::{CplFormula, ModalFormula};

#[derive(Parser)]
#[grammar = "parser/fpl.pest"]
struct FplParser;

/// Parses a single modal formula.
///
/// All binary connectives are right-associative; `¬` binds tighter than any
/// binary connective. The leaves of the modal level are probability atoms
/// `P(…)` wrapping a CPL formula — a bare identifier at the modal level is a
/// parse error.
///
/// # Examples
///
/// ```
/// use fplsol::parser::parse_modal_formula;
///
/// let formula = parse_modal_formula("P(p) ⊕ ¬P(p ∧ q)").unwrap();
/// assert_eq!(formula.canonical(), "(P(p) ⊕ ¬(P((p ∧ q))))");
/// assert!(parse_modal_formula("p ⊕ q").is_err());
/// ```
pub fn parse_modal_formula<I: AsRef<str>>(input: I) -> Result<ModalFormula, FplError> {
    let parsed = FplParser::parse(Rule::modal_input, input.as_ref())
        .map_err(|e| FplError::Parse(e.to_string()))?
        .next()
        .unwrap();
    let equiv = parsed.into_inner().next().unwrap();
    Ok(parse_modal_equiv(equiv))
}

/// Parses a single CPL formula, as accepted inside `P(…)`.
pub fn parse_cpl_formula<I: AsRef<str>>(input: I) -> Result<CplFormula, FplError> {
    let parsed = FplParser::parse(Rule::cpl_input, input.as_ref())
        .map_err(|e| FplError::Parse(e.to_string()))?
        .next()
        .unwrap();
    let equiv = parsed.into_inner().next().unwrap();
    Ok(parse_cpl_equiv(equiv))
}

fn parse_modal_equiv(equiv: Pair<Rule>) -> ModalFormula {
    let mut implications = equiv.into_inner().rev();
    let mut form = parse_modal_impl(implications.next().unwrap());
    for implication in implications {
        form = ModalFormula::equivalence(parse_modal_impl(implication), form);
    }
    form
}

fn parse_modal_impl(implication: Pair<Rule>) -> ModalFormula {
    let mut disjunctions = implication.into_inner().rev();
    let mut form = parse_modal_or(disjunctions.next().unwrap());
    for disjunction in disjunctions {
        form = ModalFormula::implication(parse_modal_or(disjunction), form);
    }
    form
}

fn parse_modal_or(disjunction: Pair<Rule>) -> ModalFormula {
    let mut conjunctions = disjunction.into_inner().rev();
    let mut form = parse_modal_and(conjunctions.next().unwrap());
    for conjunction in conjunctions {
        form = ModalFormula::or(parse_modal_and(conjunction), form);
    }
    form
}

fn parse_modal_and(conjunction: Pair<Rule>) -> ModalFormula {
    let mut odots = conjunction.into_inner().rev();
    let mut form = parse_modal_odot(odots.next().unwrap());
    for odot in odots {
        form = ModalFormula::and(parse_modal_odot(odot), form);
    }
    form
}

fn parse_modal_odot(odot: Pair<Rule>) -> ModalFormula {
    let mut opluses = odot.into_inner().rev();
    let mut form = parse_modal_oplus(opluses.next().unwrap());
    for oplus in opluses {
        form = ModalFormula::odot(parse_modal_oplus(oplus), form);
    }
    form
}

fn parse_modal_oplus(oplus: Pair<Rule>) -> ModalFormula {
    let mut unaries = oplus.into_inner().rev();
    let mut form = parse_modal_unary(unaries.next().unwrap());
    for unary in unaries {
        form = ModalFormula::oplus(parse_modal_unary(unary), form);
    }
    form
}

fn parse_modal_unary(unary: Pair<Rule>) -> ModalFormula {
    let mut tokens = unary.into_inner();
    let mut x = tokens.next().unwrap();
    let mut negations = 0;
    while x.as_rule() == Rule::neg {
        negations += 1;
        x = tokens.next().unwrap();
    }
    let mut form = parse_modal_primary(x);
    for _ in 0..negations {
        form = ModalFormula::not(form);
    }
    form
}

fn parse_modal_primary(primary: Pair<Rule>) -> ModalFormula {
    let inner = primary.into_inner().next().unwrap();
    match inner.as_rule() {
        Rule::p_atom => {
            let phi = inner.into_inner().next().unwrap();
            ModalFormula::patom(parse_cpl_equiv(phi))
        }
        Rule::modal_equiv => parse_modal_equiv(inner),
        _ => unreachable!(),
    }
}

fn parse_cpl_equiv(equiv: Pair<Rule>) -> CplFormula {
    let mut implications = equiv.into_inner().rev();
    let mut form = parse_cpl_impl(implications.next().unwrap());
    for implication in implications {
        form = CplFormula::equivalence(parse_cpl_impl(implication), form);
    }
    form
}

fn parse_cpl_impl(implication: Pair<Rule>) -> CplFormula {
    let mut disjunctions = implication.into_inner().rev();
    let mut form = parse_cpl_or(disjunctions.next().unwrap());
    for disjunction in disjunctions {
        form = CplFormula::implication(parse_cpl_or(disjunction), form);
    }
    form
}

fn parse_cpl_or(disjunction: Pair<Rule>) -> CplFormula {
    let mut conjunctions = disjunction.into_inner().rev();
    let mut form = parse_cpl_and(conjunctions.next().unwrap());
    for conjunction in conjunctions {
        form = CplFormula::or(parse_cpl_and(conjunction), form);
    }
    form
}

fn parse_cpl_and(conjunction: Pair<Rule>) -> CplFormula {
    let mut unaries = conjunction.into_inner().rev();
    let mut form = parse_cpl_unary(unaries.next().unwrap());
    for unary in unaries {
        form = CplFormula::and(parse_cpl_unary(unary), form);
    }
    form
}

fn parse_cpl_unary(unary: Pair<Rule>) -> CplFormula {
    let mut tokens = unary.into_inner();
    let mut x = tokens.next().unwrap();
    let mut negations = 0;
    while x.as_rule() == Rule::neg {
        negations += 1;
        x = tokens.next().unwrap();
    }
    let mut form = parse_cpl_primary(x);
    for _ in 0..negations {
        form = CplFormula::not(form);
    }
    form
}

fn parse_cpl_primary(primary: Pair<Rule>) -> CplFormula {
    let inner = primary.into_inner().next().unwrap();
    match inner.as_rule() {
        Rule::identifier => CplFormula::variable(inner.as_str()),
        Rule::cpl_equiv => parse_cpl_equiv(inner),
        _ => unreachable!(),
    }
}
