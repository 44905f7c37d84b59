//! Slash-path command classification.
//!
//! Commands are matched by substring containment against fixed markers, in a
//! fixed order, and the first matching rule wins. Identifiers are the path
//! segment after the relevant marker; a missing segment yields an empty id.
//!
//! `/register-material` is a prefix of `/register-material-prices/`, so the
//! relative order of those two rules decides how a price registration is
//! classified. [`Precedence::SpecificFirst`] (default) checks the prices
//! marker first. [`Precedence::Reference`] keeps the historical order, where
//! every price registration is classified as a plain registration.

use crate::domain::model::Operation;
use serde::{Deserialize, Serialize};

const REGISTER_MATERIAL: &str = "/register-material";
const REGISTER_MATERIAL_PRICES: &str = "/register-material-prices/";
const MATERIALS: &str = "/materials";
const MATERIALS_SLASH: &str = "/materials/";
const PIECE_PRICES: &str = "/piece-prices";
const REMOVE_MATERIAL: &str = "/remove/material/";
const UPDATE_MATERIAL: &str = "/update/material/";
const ADD_MATERIAL: &str = "/add/material/";
const PIECE: &str = "/piece";
const MATERIAL_SLASH: &str = "/material/";
const OPTIMIZE_CUTS: &str = "/optimize-cuts/";

const HELP_WORDS: [&str; 3] = ["help", "/help", "?"];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Precedence {
    #[default]
    SpecificFirst,
    Reference,
}

struct Rule {
    name: &'static str,
    matches: fn(&str) -> bool,
    build: fn(&str) -> Operation,
}

static REGISTER_RULE: Rule = Rule {
    name: "register-material",
    matches: |c| c.contains(REGISTER_MATERIAL),
    build: |_| Operation::RegisterMaterial,
};

static REGISTER_PRICES_RULE: Rule = Rule {
    name: "register-material-prices",
    matches: |c| c.contains(REGISTER_MATERIAL_PRICES),
    build: |c| Operation::RegisterMaterialPrices {
        material_id: segment_after(c, REGISTER_MATERIAL_PRICES),
    },
};

// 規則 3 之後的順序在兩種模式下都相同
static TAIL_RULES: [Rule; 7] = [
    Rule {
        name: "list-materials",
        matches: |c| c.contains(MATERIALS) && !c.contains(MATERIALS_SLASH),
        build: |_| Operation::ListMaterials,
    },
    Rule {
        name: "get-material",
        matches: |c| c.contains(MATERIALS_SLASH) && !c.contains(PIECE_PRICES),
        build: |c| Operation::GetMaterial {
            material_id: segment_after(c, MATERIALS_SLASH),
        },
    },
    Rule {
        name: "get-piece-prices",
        matches: |c| c.contains(MATERIALS_SLASH) && c.contains(PIECE_PRICES),
        build: |c| Operation::GetPiecePrices {
            material_id: segment_after(c, MATERIALS_SLASH),
        },
    },
    Rule {
        name: "delete-material",
        matches: |c| c.contains(REMOVE_MATERIAL),
        build: |c| Operation::DeleteMaterial {
            material_id: segment_after(c, REMOVE_MATERIAL),
        },
    },
    Rule {
        name: "update-piece",
        matches: |c| c.contains(UPDATE_MATERIAL) && c.contains(PIECE),
        build: |c| Operation::UpdatePiece {
            material_id: segment_after(c, UPDATE_MATERIAL),
        },
    },
    Rule {
        name: "add-piece",
        matches: |c| c.contains(ADD_MATERIAL) && c.contains(PIECE),
        build: |c| Operation::AddPiece {
            material_id: segment_after(c, ADD_MATERIAL),
        },
    },
    Rule {
        name: "optimize-cuts",
        matches: |c| c.contains(MATERIAL_SLASH) && c.contains(OPTIMIZE_CUTS),
        build: |c| Operation::OptimizeCuts {
            material_id: segment_after(c, MATERIAL_SLASH),
            length: segment_after(c, OPTIMIZE_CUTS),
        },
    },
];

#[derive(Debug, Clone, Copy, Default)]
pub struct Classifier {
    precedence: Precedence,
}

impl Classifier {
    pub fn new(precedence: Precedence) -> Self {
        Self { precedence }
    }

    pub fn precedence(&self) -> Precedence {
        self.precedence
    }

    fn rules(&self) -> impl Iterator<Item = &'static Rule> {
        let head: [&'static Rule; 2] = match self.precedence {
            Precedence::SpecificFirst => [&REGISTER_PRICES_RULE, &REGISTER_RULE],
            Precedence::Reference => [&REGISTER_RULE, &REGISTER_PRICES_RULE],
        };
        head.into_iter().chain(TAIL_RULES.iter())
    }

    /// Rule names in evaluation order.
    pub fn rule_order(&self) -> Vec<&'static str> {
        self.rules().map(|rule| rule.name).collect()
    }

    pub fn classify(&self, command: &str) -> Operation {
        if let Some(rule) = self.rules().find(|rule| (rule.matches)(command)) {
            return (rule.build)(command);
        }

        let trimmed = command.trim();
        if HELP_WORDS
            .iter()
            .any(|word| trimmed.eq_ignore_ascii_case(word))
        {
            return Operation::Help;
        }

        Operation::Unknown
    }
}

/// Classifies with the default precedence.
pub fn classify(command: &str) -> Operation {
    Classifier::default().classify(command)
}

/// 取出 marker 之後的第一個路徑片段，找不到時回傳空字串
fn segment_after(command: &str, marker: &str) -> String {
    command
        .find(marker)
        .map(|idx| &command[idx + marker.len()..])
        .map(|rest| {
            rest.split(|c: char| c == '/' || c == '?' || c.is_whitespace())
                .next()
                .unwrap_or_default()
                .to_string()
        })
        .unwrap_or_default()
}
