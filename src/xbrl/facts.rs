use std::collections::HashMap;
use std::str::FromStr;

use super::{XBRLI_NS, XSI_NS};

/// The `decimals` attribute. Carried through for reference, never applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decimals {
    Finite(i32),
    Infinite,
}

impl FromStr for Decimals {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "INF" => Ok(Decimals::Infinite),
            other => other
                .parse::<i32>()
                .map(Decimals::Finite)
                .map_err(|_| format!("invalid decimals: {}", other)),
        }
    }
}

/// One disclosed value before interpretation.
#[derive(Debug, Clone, PartialEq)]
pub struct RawFact {
    /// `prefix:local`, as written in the document.
    pub tag_name: String,
    pub prefix: String,
    pub local_name: String,
    pub context_ref: String,
    /// `None` exactly when the fact is nil.
    pub value: Option<String>,
    pub is_nil: bool,
    pub decimals: Option<Decimals>,
    pub unit_ref: Option<String>,
}

impl RawFact {
    /// A non-nil fact with some text in it.
    pub fn has_value(&self) -> bool {
        self.value.as_deref().map_or(false, |v| !v.trim().is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Unit {
    pub numerator: Vec<String>,
    pub denominator: Vec<String>,
}

impl Unit {
    /// ISO 4217 code for plain monetary units (`iso4217:JPY`). Ratios such as
    /// yen per share have none.
    pub fn currency(&self) -> Option<&str> {
        match (self.numerator.as_slice(), self.denominator.is_empty()) {
            ([measure], true) => measure.strip_prefix("iso4217:"),
            _ => None,
        }
    }
}

pub type UnitTable = HashMap<String, Unit>;

pub fn extract_units(document: &roxmltree::Document) -> UnitTable {
    let mut units = UnitTable::new();

    let unit_ele = document
        .root_element()
        .children()
        .filter(|e| e.is_element() && e.tag_name().name() == "unit");

    for child in unit_ele {
        let Some(id) = child.attribute("id") else {
            log::debug!("unit without id skipped");
            continue;
        };
        let mut unit = Unit::default();
        for measure in child
            .descendants()
            .filter(|e| e.is_element() && e.tag_name().name() == "measure")
        {
            let value = measure.text().unwrap_or("").trim().to_string();
            let in_denominator = measure
                .ancestors()
                .any(|a| a.tag_name().name() == "unitDenominator");
            if in_denominator {
                unit.denominator.push(value);
            } else {
                unit.numerator.push(value);
            }
        }
        log::debug!("Unit: {} {:?}/{:?}", id, unit.numerator, unit.denominator);
        units.insert(id.to_string(), unit);
    }

    units
}

/// Every item fact directly under the root, in document order. Elements
/// without a `contextRef` (schema refs, footnote links, tuples) are skipped.
pub fn extract_facts(document: &roxmltree::Document) -> Vec<RawFact> {
    let mut facts = Vec::new();

    let fact_ele = document.root_element().children().filter(|e| {
        e.is_element()
            && e.tag_name().namespace() != Some(XBRLI_NS)
            && e.has_attribute("contextRef")
    });

    for child in fact_ele {
        let local_name = child.tag_name().name().to_string();
        let namespace = child.tag_name().namespace().unwrap_or("");
        let prefix = child.lookup_prefix(namespace).unwrap_or("").to_string();
        let context_ref = child.attribute("contextRef").unwrap_or("").to_string();
        let is_nil = matches!(child.attribute((XSI_NS, "nil")), Some("true") | Some("1"));

        let value = if is_nil {
            None
        } else {
            let text: String = child
                .descendants()
                .filter(|n| n.is_text())
                .filter_map(|n| n.text())
                .collect();
            Some(text.trim().to_string())
        };

        let decimals = child
            .attribute("decimals")
            .and_then(|d| d.parse::<Decimals>().ok());

        let tag_name = if prefix.is_empty() {
            local_name.clone()
        } else {
            format!("{}:{}", prefix, local_name)
        };

        log::debug!(
            "Fact: {} {} {}",
            tag_name,
            context_ref,
            if is_nil { "nil" } else { "value" }
        );

        facts.push(RawFact {
            tag_name,
            prefix,
            local_name,
            context_ref,
            value,
            is_nil,
            decimals,
            unit_ref: child.attribute("unitRef").map(str::to_string),
        });
    }

    facts
}
