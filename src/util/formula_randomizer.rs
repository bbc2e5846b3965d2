use fastrand::Rng;

use crate::formulas::{CplFormula, ModalFormula};

/// A configuration for randomizing formulas.
///
/// The seed makes the generated sequence deterministic; the variable list is
/// drawn from uniformly.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct FormulaRandomizerConfig {
    pub(crate) seed: u64,
    pub(crate) variables: Vec<String>,
}

impl FormulaRandomizerConfig {
    /// Constructs a configuration with `num_vars` variables named `v0`,
    /// `v1`, ….
    pub fn default_with_num_vars(num_vars: usize) -> Self {
        Self { seed: 0, variables: (0..num_vars).map(|i| format!("v{i}")).collect() }
    }

    /// Constructs a configuration with the given variable names.
    pub fn default_with_variables(variables: Vec<String>) -> Self {
        Self { seed: 0, variables }
    }

    /// Updates the seed of the random generator.
    #[must_use]
    pub const fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

/// A randomizer for CPL and modal formulas, used to stress the parser and
/// the encoder with structurally diverse inputs.
pub struct FormulaRandomizer {
    rng: Rng,
    variables: Vec<String>,
}

impl FormulaRandomizer {
    /// Constructs a new randomizer from a configuration.
    pub fn new(config: FormulaRandomizerConfig) -> Self {
        assert!(!config.variables.is_empty(), "randomizer requires at least one variable");
        Self { rng: Rng::with_seed(config.seed), variables: config.variables }
    }

    /// Generates a random CPL formula of at most the given connective depth.
    pub fn cpl_formula(&mut self, depth: usize) -> CplFormula {
        if depth == 0 {
            return self.variable();
        }
        match self.rng.usize(0..6) {
            0 => self.variable(),
            1 => CplFormula::not(self.cpl_formula(depth - 1)),
            2 => CplFormula::and(self.cpl_formula(depth - 1), self.cpl_formula(depth - 1)),
            3 => CplFormula::or(self.cpl_formula(depth - 1), self.cpl_formula(depth - 1)),
            4 => CplFormula::implication(self.cpl_formula(depth - 1), self.cpl_formula(depth - 1)),
            _ => CplFormula::equivalence(self.cpl_formula(depth - 1), self.cpl_formula(depth - 1)),
        }
    }

    /// Generates a random modal formula of at most the given connective
    /// depth. The probability atoms wrap random CPL formulas of depth two.
    pub fn modal_formula(&mut self, depth: usize) -> ModalFormula {
        if depth == 0 {
            return self.patom();
        }
        match self.rng.usize(0..8) {
            0 => self.patom(),
            1 => ModalFormula::not(self.modal_formula(depth - 1)),
            2 => ModalFormula::and(self.modal_formula(depth - 1), self.modal_formula(depth - 1)),
            3 => ModalFormula::or(self.modal_formula(depth - 1), self.modal_formula(depth - 1)),
            4 => {
                ModalFormula::implication(self.modal_formula(depth - 1), self.modal_formula(depth - 1))
            }
            5 => {
                ModalFormula::equivalence(self.modal_formula(depth - 1), self.modal_formula(depth - 1))
            }
            6 => ModalFormula::oplus(self.modal_formula(depth - 1), self.modal_formula(depth - 1)),
            _ => ModalFormula::odot(self.modal_formula(depth - 1), self.modal_formula(depth - 1)),
        }
    }

    fn variable(&mut self) -> CplFormula {
        let idx = self.rng.usize(0..self.variables.len());
        CplFormula::variable(self.variables[idx].clone())
    }

    fn patom(&mut self) -> ModalFormula {
        let phi = self.cpl_formula(2);
        ModalFormula::patom(phi)
    }
}

#[cfg(test)]
mod tests {
    use super::{FormulaRandomizer, FormulaRandomizerConfig};

    #[test]
    fn test_deterministic_for_equal_seeds() {
        let config = FormulaRandomizerConfig::default_with_num_vars(3).seed(11);
        let mut r1 = FormulaRandomizer::new(config.clone());
        let mut r2 = FormulaRandomizer::new(config);
        for _ in 0..50 {
            assert_eq!(r1.modal_formula(3), r2.modal_formula(3));
        }
    }

    #[test]
    fn test_respects_variable_pool() {
        let config =
            FormulaRandomizerConfig::default_with_variables(vec!["a".to_string(), "b".to_string()]);
        let mut randomizer = FormulaRandomizer::new(config);
        for _ in 0..20 {
            let canonical = randomizer.cpl_formula(3).canonical().to_string();
            for token in canonical.split(|c: char| !c.is_alphanumeric() && c != '_') {
                if !token.is_empty() {
                    assert!(token == "a" || token == "b", "unexpected token {token}");
                }
            }
        }
    }
}
