use chrono::NaiveDate;
use std::collections::HashMap;

use crate::core::{ConsolidationScope, PeriodKind};
use crate::error::DocumentParseError;

const SCOPE_AXIS: &str = "ConsolidatedOrNonConsolidatedAxis";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextPeriod {
    Instant(NaiveDate),
    Duration { start: NaiveDate, end: NaiveDate },
    Forever,
}

impl ContextPeriod {
    pub fn kind(&self) -> Option<PeriodKind> {
        match self {
            ContextPeriod::Instant(_) => Some(PeriodKind::Instant),
            ContextPeriod::Duration { .. } => Some(PeriodKind::Duration),
            ContextPeriod::Forever => None,
        }
    }

    /// Instant date, or the end of a duration.
    pub fn date(&self) -> Option<NaiveDate> {
        match self {
            ContextPeriod::Instant(date) => Some(*date),
            ContextPeriod::Duration { end, .. } => Some(*end),
            ContextPeriod::Forever => None,
        }
    }
}

/// An explicit or typed member on a dimension axis.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Dimension {
    pub axis_prefix: String,
    pub axis_name: String,
    pub member_prefix: String,
    pub member_name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ContextDescriptor {
    pub context_ref: String,
    pub entity_identifier: Option<String>,
    pub period: ContextPeriod,
    /// Scope stated by the context itself. `None` means the filer's default
    /// reporting entity.
    pub consolidation_scope: Option<ConsolidationScope>,
    /// Dimension members other than the consolidation axis.
    pub qualifiers: Vec<Dimension>,
}

impl ContextDescriptor {
    pub fn period_kind(&self) -> Option<PeriodKind> {
        self.period.kind()
    }

    pub fn date(&self) -> Option<NaiveDate> {
        self.period.date()
    }

    pub fn is_dimensional(&self) -> bool {
        !self.qualifiers.is_empty()
    }

    /// The scope this context reports, given the filing's own consolidation
    /// type for contexts that do not state one.
    pub fn effective_scope(&self, filing: ConsolidationScope) -> ConsolidationScope {
        self.consolidation_scope.unwrap_or(filing)
    }
}

pub type ContextTable = HashMap<String, ContextDescriptor>;

/// Builds the context table from every `xbrli:context` under the root.
pub fn resolve_contexts(document: &roxmltree::Document) -> Result<ContextTable, DocumentParseError> {
    let mut contexts = ContextTable::new();

    let context_ele = document
        .root_element()
        .children()
        .filter(|e| e.is_element() && e.tag_name().name() == "context");

    for child in context_ele {
        let descriptor = parse_context(child)?;
        log::debug!("Context: {} {:?}", descriptor.context_ref, descriptor.period);
        if contexts.contains_key(&descriptor.context_ref) {
            return Err(DocumentParseError::MalformedContext {
                context_ref: descriptor.context_ref,
                reason: "defined more than once".to_string(),
            });
        }
        contexts.insert(descriptor.context_ref.clone(), descriptor);
    }

    Ok(contexts)
}

fn parse_context(node: roxmltree::Node) -> Result<ContextDescriptor, DocumentParseError> {
    let id = node
        .attribute("id")
        .ok_or_else(|| malformed("<missing id>", "context has no id"))?;

    let mut entity_identifier = None;
    let mut period = None;
    let mut explicit_scope = None;
    let mut qualifiers = Vec::new();

    for child_ele in node.children().filter(|e| e.is_element()) {
        match child_ele.tag_name().name() {
            "entity" => {
                entity_identifier = child_ele
                    .children()
                    .find(|e| e.tag_name().name() == "identifier")
                    .and_then(|e| e.text())
                    .map(|t| t.trim().to_string());

                // Dimensions may sit in the entity segment or in a scenario.
                for member in dimension_members(child_ele) {
                    let dimension = parse_member(id, member)?;
                    push_dimension(dimension, &mut explicit_scope, &mut qualifiers);
                }
            }
            "period" => period = Some(parse_period(id, child_ele)?),
            "scenario" => {
                for member in dimension_members(child_ele) {
                    let dimension = parse_member(id, member)?;
                    push_dimension(dimension, &mut explicit_scope, &mut qualifiers);
                }
            }
            _ => {}
        }
    }

    let period = period.ok_or_else(|| malformed(id, "context has no period"))?;

    // Some filers only encode the scope in the context id.
    if explicit_scope.is_none() && id.contains("NonConsolidated") {
        explicit_scope = Some(ConsolidationScope::NonConsolidated);
    }

    Ok(ContextDescriptor {
        context_ref: id.to_string(),
        entity_identifier,
        period,
        consolidation_scope: explicit_scope,
        qualifiers,
    })
}

fn dimension_members<'a, 'input>(
    node: roxmltree::Node<'a, 'input>,
) -> impl Iterator<Item = roxmltree::Node<'a, 'input>> {
    node.descendants().filter(|e| {
        e.is_element() && matches!(e.tag_name().name(), "explicitMember" | "typedMember")
    })
}

fn push_dimension(
    dimension: Dimension,
    scope: &mut Option<ConsolidationScope>,
    qualifiers: &mut Vec<Dimension>,
) {
    if dimension.axis_name == SCOPE_AXIS {
        *scope = match dimension.member_name.as_str() {
            "NonConsolidatedMember" => Some(ConsolidationScope::NonConsolidated),
            "ConsolidatedMember" => Some(ConsolidationScope::Consolidated),
            _ => {
                log::debug!("unknown consolidation member {}", dimension.member_name);
                *scope
            }
        };
    } else {
        qualifiers.push(dimension);
    }
}

fn parse_member(context_ref: &str, node: roxmltree::Node) -> Result<Dimension, DocumentParseError> {
    let axis = node
        .attribute("dimension")
        .ok_or_else(|| malformed(context_ref, "dimension member has no axis"))?;
    let (axis_prefix, axis_name) = split_qname(axis);

    let (member_prefix, member_name) = if node.tag_name().name() == "typedMember" {
        let text: String = node
            .descendants()
            .filter(|n| n.is_text())
            .filter_map(|n| n.text())
            .collect();
        (String::new(), text.trim().to_string())
    } else {
        split_qname(node.text().unwrap_or("").trim())
    };

    log::debug!(
        "Segment: {} {} {} {}",
        axis_prefix,
        axis_name,
        member_prefix,
        member_name
    );

    Ok(Dimension {
        axis_prefix,
        axis_name,
        member_prefix,
        member_name,
    })
}

fn parse_period(context_ref: &str, node: roxmltree::Node) -> Result<ContextPeriod, DocumentParseError> {
    let child = |name: &str| {
        node.children()
            .find(|e| e.is_element() && e.tag_name().name() == name)
            .map(|e| e.text().unwrap_or("").trim())
    };

    if let Some(instant) = child("instant") {
        return Ok(ContextPeriod::Instant(parse_date(context_ref, instant)?));
    }
    if child("forever").is_some() {
        return Ok(ContextPeriod::Forever);
    }
    match (child("startDate"), child("endDate")) {
        (Some(start), Some(end)) => {
            let start = parse_date(context_ref, start)?;
            let end = parse_date(context_ref, end)?;
            if end < start {
                return Err(malformed(context_ref, "duration ends before it starts"));
            }
            Ok(ContextPeriod::Duration { start, end })
        }
        _ => Err(malformed(context_ref, "period has neither instant nor start/end dates")),
    }
}

/// Accepts `YYYY-MM-DD`, optionally followed by a time part.
fn parse_date(context_ref: &str, raw: &str) -> Result<NaiveDate, DocumentParseError> {
    let date_part = raw.get(..10).unwrap_or(raw);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
        .map_err(|_| malformed(context_ref, &format!("invalid date '{}'", raw)))
}

fn split_qname(qname: &str) -> (String, String) {
    match qname.split_once(':') {
        Some((prefix, name)) => (prefix.to_string(), name.to_string()),
        None => (String::new(), qname.to_string()),
    }
}

fn malformed(context_ref: &str, reason: &str) -> DocumentParseError {
    DocumentParseError::MalformedContext {
        context_ref: context_ref.to_string(),
        reason: reason.to_string(),
    }
}
