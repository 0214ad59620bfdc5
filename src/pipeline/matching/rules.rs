//! Biomarker rule table: synonyms, accepted units, panel keywords.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;

use crate::models::{Biomarker, Panel};
use crate::pipeline::extraction::TextLine;

/// How one biomarker is printed on a lab document.
#[derive(Debug)]
pub struct BiomarkerRule {
    pub biomarker: Biomarker,
    /// Lowercase names matched at line start.
    pub synonyms: &'static [&'static str],
    /// Accepted unit spellings. The first one is canonical.
    pub units: &'static [&'static str],
}

impl BiomarkerRule {
    pub fn canonical_unit(&self) -> &'static str {
        self.units.first().copied().unwrap_or("")
    }

    /// Table spelling of `printed` when it is an accepted unit.
    pub fn accepts(&self, printed: &str) -> Option<&'static str> {
        self.units
            .iter()
            .copied()
            .find(|unit| unit.eq_ignore_ascii_case(printed))
    }
}

#[derive(Debug)]
pub struct PanelRules {
    pub panel: Panel,
    pub rules: &'static [BiomarkerRule],
}

const MOLAR: &[&str] = &["mmol/L", "mEq/L"];
const MASS: &[&str] = &["mg/dL", "mmol/L"];
const PERCENT: &[&str] = &["%"];
const THOUSANDS_PER_UL: &[&str] = &[
    "K/uL", "x10E3/uL", "x10^3/uL", "10^3/uL", "10*3/uL", "thou/uL", "x10^9/L", "10^9/L",
];
const MILLIONS_PER_UL: &[&str] = &[
    "M/uL", "x10E6/uL", "x10^6/uL", "10^6/uL", "10*6/uL", "mill/uL", "x10^12/L", "10^12/L",
];

const GLUCOSE_SYNONYMS: &[&str] = &[
    "glucose",
    "glucose, serum",
    "glucose, plasma",
    "glucose serum",
];

const FASTING_GLUCOSE_SYNONYMS: &[&str] = &[
    "glucose",
    "fasting glucose",
    "glucose, fasting",
    "glucose fasting",
    "fasting blood glucose",
    "blood glucose",
    "glucose, serum",
    "glucose, plasma",
];

/// Panels in table order. Priority at match time puts the document's panel first.
pub static RULE_TABLE: &[PanelRules] = &[
    PanelRules {
        panel: Panel::MetabolicPanel,
        rules: &[
            BiomarkerRule {
                biomarker: Biomarker::Glucose,
                synonyms: GLUCOSE_SYNONYMS,
                units: MASS,
            },
            BiomarkerRule {
                biomarker: Biomarker::Sodium,
                synonyms: &["sodium", "sodium, serum"],
                units: MOLAR,
            },
            BiomarkerRule {
                biomarker: Biomarker::Potassium,
                synonyms: &["potassium", "potassium, serum"],
                units: MOLAR,
            },
            BiomarkerRule {
                biomarker: Biomarker::Chloride,
                synonyms: &["chloride", "chloride, serum"],
                units: MOLAR,
            },
            BiomarkerRule {
                biomarker: Biomarker::Co2,
                synonyms: &[
                    "carbon dioxide",
                    "carbon dioxide, total",
                    "co2",
                    "co2, total",
                    "total co2",
                    "bicarbonate",
                    "hco3",
                ],
                units: MOLAR,
            },
            BiomarkerRule {
                biomarker: Biomarker::Bun,
                synonyms: &[
                    "bun",
                    "urea nitrogen",
                    "blood urea nitrogen",
                    "urea nitrogen (bun)",
                ],
                units: MASS,
            },
            BiomarkerRule {
                biomarker: Biomarker::Creatinine,
                synonyms: &["creatinine", "creatinine, serum"],
                units: &["mg/dL", "umol/L", "µmol/L"],
            },
            BiomarkerRule {
                biomarker: Biomarker::Calcium,
                synonyms: &["calcium", "calcium, serum"],
                units: MASS,
            },
            BiomarkerRule {
                biomarker: Biomarker::Egfr,
                synonyms: &["egfr", "estimated gfr", "gfr, estimated", "egfr (ckd-epi)"],
                units: &["mL/min/1.73m2", "mL/min/1.73m²", "mL/min"],
            },
        ],
    },
    PanelRules {
        panel: Panel::CompleteBloodCount,
        rules: &[
            BiomarkerRule {
                biomarker: Biomarker::Wbc,
                synonyms: &[
                    "wbc",
                    "wbc count",
                    "white blood cell count",
                    "white blood cells",
                    "leukocytes",
                ],
                units: THOUSANDS_PER_UL,
            },
            BiomarkerRule {
                biomarker: Biomarker::Rbc,
                synonyms: &[
                    "rbc",
                    "rbc count",
                    "red blood cell count",
                    "red blood cells",
                    "erythrocytes",
                ],
                units: MILLIONS_PER_UL,
            },
            BiomarkerRule {
                biomarker: Biomarker::Hemoglobin,
                synonyms: &["hemoglobin", "haemoglobin", "hgb"],
                units: &["g/dL", "g/L"],
            },
            BiomarkerRule {
                biomarker: Biomarker::Hematocrit,
                synonyms: &["hematocrit", "haematocrit", "hct"],
                units: PERCENT,
            },
            BiomarkerRule {
                biomarker: Biomarker::Mcv,
                synonyms: &["mcv", "mean corpuscular volume"],
                units: &["fL"],
            },
            BiomarkerRule {
                biomarker: Biomarker::Mch,
                synonyms: &["mch", "mean corpuscular hemoglobin"],
                units: &["pg"],
            },
            BiomarkerRule {
                biomarker: Biomarker::Mchc,
                synonyms: &["mchc", "mean corpuscular hemoglobin concentration"],
                units: &["g/dL", "g/L"],
            },
            BiomarkerRule {
                biomarker: Biomarker::Rdw,
                synonyms: &["rdw", "rdw-cv", "red cell distribution width"],
                units: PERCENT,
            },
            BiomarkerRule {
                biomarker: Biomarker::Platelets,
                synonyms: &["platelets", "platelet count", "platelet", "plt"],
                units: THOUSANDS_PER_UL,
            },
            BiomarkerRule {
                biomarker: Biomarker::Neutrophils,
                synonyms: &["neutrophils", "neutrophil", "neutrophils %", "neut %", "neut"],
                units: PERCENT,
            },
            BiomarkerRule {
                biomarker: Biomarker::Lymphocytes,
                synonyms: &["lymphocytes", "lymphocyte", "lymphocytes %", "lymph %", "lymphs"],
                units: PERCENT,
            },
            BiomarkerRule {
                biomarker: Biomarker::Monocytes,
                synonyms: &["monocytes", "monocyte", "monocytes %", "monos"],
                units: PERCENT,
            },
            BiomarkerRule {
                biomarker: Biomarker::Eosinophils,
                synonyms: &["eosinophils", "eosinophil", "eosinophils %", "eos"],
                units: PERCENT,
            },
            BiomarkerRule {
                biomarker: Biomarker::Basophils,
                synonyms: &["basophils", "basophil", "basophils %", "basos"],
                units: PERCENT,
            },
        ],
    },
    PanelRules {
        panel: Panel::Glucose,
        rules: &[BiomarkerRule {
            biomarker: Biomarker::Glucose,
            synonyms: FASTING_GLUCOSE_SYNONYMS,
            units: MASS,
        }],
    },
];

/// Unit spellings that are never part of a range or a flag.
const UNIT_VOCAB: &[&str] = &[
    "%", "fl", "pg", "g/dl", "g/l", "mg/dl", "mg/l", "mmol/l", "meq/l", "umol/l", "µmol/l",
    "u/l", "iu/l", "ng/ml", "ml/min", "ml/min/1.73m2", "ml/min/1.73m²", "/ul", "10^3/ul",
    "10*3/ul", "10^6/ul", "10*6/ul", "10^9/l", "10^12/l",
];

static METABOLIC_KEYWORD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:basic\s+metabolic|comprehensive\s+metabolic|metabolic\s+panel|bmp|cmp)\b")
        .unwrap()
});

static CBC_KEYWORD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:cbc|complete\s+blood\s+count|hemogram)\b").unwrap()
});

static GLUCOSE_KEYWORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bglucose\b").unwrap());

/// A biomarker name found at the start of a line.
#[derive(Debug)]
pub struct RuleMatch<'a> {
    pub panel: Panel,
    pub rule: &'static BiomarkerRule,
    /// Text after the name and an optional colon.
    pub tail: &'a str,
}

pub fn panel_rules(panel: Panel) -> &'static [BiomarkerRule] {
    RULE_TABLE
        .iter()
        .find(|p| p.panel == panel)
        .map(|p| p.rules)
        .unwrap_or(&[])
}

/// Match priority: `primary` first, then the remaining panels in table order.
pub fn panel_order(primary: Panel) -> Vec<Panel> {
    std::iter::once(primary)
        .chain(RULE_TABLE.iter().map(|p| p.panel).filter(|p| *p != primary))
        .collect()
}

/// Remainder of `line` after `name`, if the line starts with it as a whole word.
fn strip_name<'a>(line: &'a str, name: &str) -> Option<&'a str> {
    let head = line.get(..name.len())?;
    if !head.eq_ignore_ascii_case(name) {
        return None;
    }
    let tail = &line[name.len()..];
    match tail.chars().next() {
        Some(c) if c.is_alphanumeric() => None,
        _ => Some(tail),
    }
}

/// Every synonym of `panel` naming the start of `line`, longest first.
fn candidates_in_panel<'a>(line: &'a str, panel: Panel) -> Vec<RuleMatch<'a>> {
    let mut found: Vec<(usize, RuleMatch<'a>)> = panel_rules(panel)
        .iter()
        .flat_map(|rule| rule.synonyms.iter().map(move |syn| (rule, *syn)))
        .filter_map(|(rule, syn)| {
            let tail = strip_name(line, syn)?;
            Some((
                syn.len(),
                RuleMatch {
                    panel,
                    rule,
                    tail: tail.trim_start_matches(|c: char| c == ':' || c.is_whitespace()),
                },
            ))
        })
        .collect();
    // Stable sort keeps table order among equal lengths
    found.sort_by(|a, b| b.0.cmp(&a.0));
    found.into_iter().map(|(_, hit)| hit).collect()
}

/// Longest synonym of any rule of `panel` at the start of `line`.
fn match_in_panel<'a>(line: &'a str, panel: Panel) -> Option<RuleMatch<'a>> {
    candidates_in_panel(line, panel).into_iter().next()
}

/// Every rule naming the start of `line`: panels in `order`, longest synonym
/// first within a panel. The caller keeps the first one whose value parses.
pub fn match_candidates<'a>(line: &'a str, order: &[Panel]) -> Vec<RuleMatch<'a>> {
    order
        .iter()
        .flat_map(|panel| candidates_in_panel(line, *panel))
        .collect()
}

/// First panel in `order` with a rule naming the start of `line`.
pub fn match_line<'a>(line: &'a str, order: &[Panel]) -> Option<RuleMatch<'a>> {
    order.iter().find_map(|panel| match_in_panel(line, *panel))
}

/// Whether a token is shaped like a unit rather than a value, range, or flag.
pub fn looks_like_unit(token: &str) -> bool {
    let lower = token.to_lowercase();
    if UNIT_VOCAB.contains(&lower.as_str()) {
        return true;
    }
    if RULE_TABLE
        .iter()
        .flat_map(|p| p.rules)
        .any(|rule| rule.accepts(token).is_some())
    {
        return true;
    }
    let starts_with_digit = token.chars().next().is_some_and(|c| c.is_ascii_digit());
    token.contains('/') && token.chars().any(char::is_alphabetic) && !starts_with_digit
}

/// Panel named by a filename, then by document content.
pub fn infer_panel(file_name: &str, lines: &[TextLine]) -> Option<Panel> {
    let name = file_name.replace(['_', '-'], " ");
    if METABOLIC_KEYWORD.is_match(&name) {
        return Some(Panel::MetabolicPanel);
    }
    if CBC_KEYWORD.is_match(&name) {
        return Some(Panel::CompleteBloodCount);
    }
    if GLUCOSE_KEYWORD.is_match(&name) {
        return Some(Panel::Glucose);
    }

    for line in lines {
        if METABOLIC_KEYWORD.is_match(&line.content) {
            return Some(Panel::MetabolicPanel);
        }
        if CBC_KEYWORD.is_match(&line.content) {
            return Some(Panel::CompleteBloodCount);
        }
    }

    panel_from_results(lines)
}

/// Panel whose rules name the most distinct biomarkers; ties go to the smaller panel.
fn panel_from_results(lines: &[TextLine]) -> Option<Panel> {
    RULE_TABLE
        .iter()
        .map(|p| {
            let hits: BTreeSet<Biomarker> = lines
                .iter()
                .filter_map(|line| match_in_panel(&line.content, p.panel))
                .map(|m| m.rule.biomarker)
                .collect();
            (p, hits.len())
        })
        .filter(|(_, hits)| *hits > 0)
        .max_by(|(a, a_hits), (b, b_hits)| {
            a_hits
                .cmp(b_hits)
                .then_with(|| b.rules.len().cmp(&a.rules.len()))
        })
        .map(|(p, _)| p.panel)
}
