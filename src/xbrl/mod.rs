//! XBRL instance reading: raw facts, units and contexts pulled out of one
//! document with `roxmltree`. Nothing here interprets tag names.

pub mod context;
pub mod facts;

pub use context::{resolve_contexts, ContextDescriptor, ContextPeriod, ContextTable, Dimension};
pub use facts::{extract_facts, extract_units, Decimals, RawFact, Unit, UnitTable};

use crate::error::DocumentParseError;

pub const XBRLI_NS: &str = "http://www.xbrl.org/2003/instance";
pub const XSI_NS: &str = "http://www.w3.org/2001/XMLSchema-instance";

/// Everything the normalizer needs from one instance document, detached
/// from the XML tree.
#[derive(Debug, Clone)]
pub struct Instance {
    pub facts: Vec<RawFact>,
    pub contexts: ContextTable,
    pub units: UnitTable,
}

impl Instance {
    pub fn parse(raw_xml: &str) -> Result<Self, DocumentParseError> {
        let document = parse_document(raw_xml)?;
        let contexts = resolve_contexts(&document)?;
        let units = extract_units(&document);
        let facts = extract_facts(&document);
        log::debug!(
            "instance: {} facts, {} contexts, {} units",
            facts.len(),
            contexts.len(),
            units.len()
        );
        Ok(Self {
            facts,
            contexts,
            units,
        })
    }
}

/// Parses `raw_xml` and checks that the root element is an `xbrl` instance.
pub fn parse_document(raw_xml: &str) -> Result<roxmltree::Document<'_>, DocumentParseError> {
    let document = roxmltree::Document::parse(raw_xml)?;
    let root = document.root_element();
    if root.tag_name().name() != "xbrl" {
        return Err(DocumentParseError::NotAnInstance(
            root.tag_name().name().to_string(),
        ));
    }
    Ok(document)
}
