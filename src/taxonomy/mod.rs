//! Tag mapping tables: canonical key rules, the output key catalog, DEI tag
//! lists and null-classification policy. Loaded once, validated, then shared
//! read-only by every filing.

mod schema;

pub use schema::{DeiTags, PeriodMatching, TaxonomyFile};

use once_cell::sync::OnceCell;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;

use crate::core::{AccountingStandard, PeriodKind, RuleScope, StatementType, ValueType};
use crate::error::ConfigurationError;

const BUILTIN_TAXONOMY: &str = include_str!("../../config/taxonomy.json");

static TAXONOMY: OnceCell<Taxonomy> = OnceCell::new();

/// Installs the process-wide taxonomy. The first installation wins; later
/// calls get the already-installed table back.
pub fn install(taxonomy: Taxonomy) -> &'static Taxonomy {
    if TAXONOMY.get().is_some() {
        log::warn!("taxonomy already installed, keeping the existing table");
    }
    TAXONOMY.get_or_init(|| taxonomy)
}

pub fn global() -> Option<&'static Taxonomy> {
    TAXONOMY.get()
}

/// A candidate tag. Without a prefix it matches on local name alone.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TagName {
    prefix: Option<String>,
    local: String,
}

impl TagName {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().split_once(':') {
            Some((prefix, local)) => Self {
                prefix: Some(prefix.to_string()),
                local: local.to_string(),
            },
            None => Self {
                prefix: None,
                local: raw.trim().to_string(),
            },
        }
    }

    pub fn local(&self) -> &str {
        &self.local
    }

    pub fn matches(&self, prefix: &str, local: &str) -> bool {
        self.local == local && self.prefix.as_deref().map_or(true, |p| p == prefix)
    }
}

impl fmt::Display for TagName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.prefix {
            Some(prefix) => write!(f, "{}:{}", prefix, self.local),
            None => write!(f, "{}", self.local),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CanonicalKeyRule {
    pub key: String,
    pub statement: StatementType,
    pub period_kind: PeriodKind,
    pub value_type: ValueType,
    pub scope: RuleScope,
    candidates: BTreeMap<AccountingStandard, Vec<TagName>>,
    pub gap_hints: Vec<String>,
    pub not_applicable_profiles: Vec<String>,
}

impl CanonicalKeyRule {
    /// Candidate tags for `standard`, highest priority first.
    pub fn candidates(&self, standard: AccountingStandard) -> &[TagName] {
        self.candidates
            .get(&standard)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn has_candidates(&self, standard: AccountingStandard) -> bool {
        !self.candidates(standard).is_empty()
    }
}

/// One entry of the output catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FactKey {
    pub key: String,
    pub derived: bool,
    /// Rule keys in precedence order.
    pub sources: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct Profile {
    pub name: String,
    pub indicator_tags: Vec<String>,
    pub min_matches: usize,
}

impl Profile {
    /// True when at least `min_matches` indicator fragments occur in the
    /// document's tag local names.
    pub fn matches(&self, local_names: &HashSet<&str>) -> bool {
        let hits = self
            .indicator_tags
            .iter()
            .filter(|indicator| local_names.iter().any(|name| name.contains(indicator.as_str())))
            .count();
        hits >= self.min_matches
    }
}

#[derive(Debug, Clone)]
pub struct Taxonomy {
    aliases: HashMap<String, AccountingStandard>,
    default_currency: String,
    skip_file_patterns: Vec<String>,
    period_matching: PeriodMatching,
    dei: DeiTags,
    profiles: Vec<Profile>,
    anchor_keys: Vec<String>,
    rules: Vec<CanonicalKeyRule>,
    rule_index: HashMap<String, usize>,
    /// Candidate local name -> keys of the rules listing it.
    tag_owners: HashMap<String, Vec<String>>,
    fact_keys: Vec<FactKey>,
}

impl Taxonomy {
    /// The tables shipped in `config/taxonomy.json`.
    pub fn builtin() -> Result<Self, ConfigurationError> {
        Self::from_json_str(BUILTIN_TAXONOMY)
    }

    pub fn from_json_str(raw: &str) -> Result<Self, ConfigurationError> {
        let file: TaxonomyFile = serde_json::from_str(raw)?;
        Self::from_file(file)
    }

    pub fn from_file(file: TaxonomyFile) -> Result<Self, ConfigurationError> {
        let mut aliases = HashMap::new();
        for (alias, target) in &file.accounting_standard_aliases {
            let standard = target.parse::<AccountingStandard>().map_err(|_| {
                ConfigurationError::UnknownStandardAlias {
                    alias: alias.clone(),
                    target: target.clone(),
                }
            })?;
            aliases.insert(alias.trim().to_string(), standard);
        }

        let matching = file.period_matching;
        if matching.max_year_end_drift_days < 0 || matching.max_anchor_drift_days < 0 {
            return Err(ConfigurationError::PeriodMatching(format!(
                "drift tolerances must be non-negative: {:?}",
                matching
            )));
        }

        if file.dei.security_code.is_empty() {
            return Err(ConfigurationError::MissingDeiField("security_code"));
        }
        if file.dei.accounting_standard.is_empty() {
            return Err(ConfigurationError::MissingDeiField("accounting_standard"));
        }
        if file.dei.fiscal_year_end.is_empty() {
            return Err(ConfigurationError::MissingDeiField("fiscal_year_end"));
        }

        let profiles: Vec<Profile> = file
            .profiles
            .into_iter()
            .map(|p| Profile {
                name: p.name,
                indicator_tags: p.indicator_tags,
                min_matches: p.min_matches.max(1),
            })
            .collect();

        let mut rules = Vec::with_capacity(file.rules.len());
        let mut rule_index = HashMap::new();
        let mut tag_owners: HashMap<String, Vec<String>> = HashMap::new();
        for def in file.rules {
            if rule_index.contains_key(&def.key) {
                return Err(ConfigurationError::DuplicateRule(def.key));
            }
            if def.candidates.is_empty() {
                return Err(ConfigurationError::EmptyCandidates(def.key));
            }
            for profile in &def.not_applicable_profiles {
                if !profiles.iter().any(|p| &p.name == profile) {
                    return Err(ConfigurationError::UnknownProfile {
                        key: def.key.clone(),
                        profile: profile.clone(),
                    });
                }
            }

            let mut candidates: BTreeMap<AccountingStandard, Vec<TagName>> = BTreeMap::new();
            for candidate in &def.candidates {
                if candidate.tag.trim().is_empty() {
                    return Err(ConfigurationError::BlankTag { key: def.key.clone() });
                }
                let tag = TagName::parse(&candidate.tag);
                let list = candidates.entry(candidate.standard).or_default();
                if list.contains(&tag) {
                    return Err(ConfigurationError::DuplicateCandidate {
                        key: def.key.clone(),
                        standard: candidate.standard.to_string(),
                        tag: candidate.tag.clone(),
                    });
                }
                let owners = tag_owners.entry(tag.local().to_string()).or_default();
                if !owners.contains(&def.key) {
                    owners.push(def.key.clone());
                }
                list.push(tag);
            }

            rule_index.insert(def.key.clone(), rules.len());
            rules.push(CanonicalKeyRule {
                period_kind: def
                    .period_kind
                    .unwrap_or_else(|| def.statement.default_period_kind()),
                key: def.key,
                statement: def.statement,
                value_type: def.value_type,
                scope: def.scope,
                candidates,
                gap_hints: def.gap_hints,
                not_applicable_profiles: def.not_applicable_profiles,
            });
        }

        for key in &file.bs_anchor_keys {
            let is_bs = rule_index
                .get(key)
                .map(|&i| rules[i].statement == StatementType::BalanceSheet)
                .unwrap_or(false);
            if !is_bs {
                return Err(ConfigurationError::InvalidAnchorKey(key.clone()));
            }
        }

        let mut fact_keys: Vec<FactKey> = Vec::with_capacity(file.fact_keys.len());
        for def in file.fact_keys {
            if fact_keys.iter().any(|k| k.key == def.key) {
                return Err(ConfigurationError::DuplicateFactKey(def.key));
            }
            let sources = if def.sources.is_empty() && !def.derived {
                if !rule_index.contains_key(&def.key) {
                    return Err(ConfigurationError::NoSources(def.key));
                }
                vec![def.key.clone()]
            } else {
                def.sources
            };
            if let Some(missing) = sources.iter().find(|s| !rule_index.contains_key(*s)) {
                return Err(ConfigurationError::UnknownSource {
                    fact_key: def.key,
                    source_key: missing.clone(),
                });
            }
            fact_keys.push(FactKey {
                key: def.key,
                derived: def.derived,
                sources,
            });
        }

        log::debug!(
            "taxonomy loaded: {} rules, {} fact keys, {} profiles",
            rules.len(),
            fact_keys.len(),
            profiles.len()
        );

        Ok(Self {
            aliases,
            default_currency: file.default_currency,
            skip_file_patterns: file.skip_file_patterns,
            period_matching: matching,
            dei: file.dei,
            profiles,
            anchor_keys: file.bs_anchor_keys,
            rules,
            rule_index,
            tag_owners,
            fact_keys,
        })
    }

    /// Maps the DEI accounting standard text onto a known standard.
    pub fn resolve_standard(&self, raw: &str) -> Option<AccountingStandard> {
        let raw = raw.trim();
        self.aliases
            .get(raw)
            .copied()
            .or_else(|| raw.parse::<AccountingStandard>().ok())
    }

    pub fn rules(&self) -> &[CanonicalKeyRule] {
        &self.rules
    }

    pub fn rules_for(&self, statement: StatementType) -> impl Iterator<Item = &CanonicalKeyRule> {
        self.rules.iter().filter(move |r| r.statement == statement)
    }

    pub fn rule(&self, key: &str) -> Option<&CanonicalKeyRule> {
        self.rule_index.get(key).map(|&i| &self.rules[i])
    }

    /// Whether `local` is a candidate tag of a rule other than `key`.
    pub fn is_claimed_elsewhere(&self, key: &str, local: &str) -> bool {
        self.tag_owners
            .get(local)
            .map_or(false, |owners| owners.iter().any(|owner| owner != key))
    }

    pub fn fact_keys(&self) -> &[FactKey] {
        &self.fact_keys
    }

    /// Catalog keys that appear in every record.
    pub fn output_keys(&self) -> impl Iterator<Item = &FactKey> {
        self.fact_keys.iter().filter(|k| !k.derived)
    }

    pub fn is_derived(&self, key: &str) -> bool {
        self.fact_keys.iter().any(|k| k.derived && k.key == key)
    }

    /// Balance-sheet anchor rules in fallback order.
    pub fn anchor_rules(&self) -> impl Iterator<Item = &CanonicalKeyRule> {
        self.anchor_keys.iter().filter_map(|key| self.rule(key))
    }

    pub fn profiles(&self) -> &[Profile] {
        &self.profiles
    }

    pub fn dei(&self) -> &DeiTags {
        &self.dei
    }

    pub fn period_matching(&self) -> PeriodMatching {
        self.period_matching
    }

    pub fn default_currency(&self) -> &str {
        &self.default_currency
    }

    pub fn should_skip_file(&self, file_name: &str) -> bool {
        let lower = file_name.to_lowercase();
        self.skip_file_patterns
            .iter()
            .any(|pattern| lower.contains(&pattern.to_lowercase()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal(rules: &str, fact_keys: &str) -> String {
        format!(
            r#"{{
                "dei": {{
                    "security_code": ["SecurityCodeDEI"],
                    "accounting_standard": ["AccountingStandardsDEI"],
                    "fiscal_year_end": ["CurrentFiscalYearEndDateDEI"]
                }},
                "bs_anchor_keys": [],
                "rules": {},
                "fact_keys": {}
            }}"#,
            rules, fact_keys
        )
    }

    #[test]
    fn test_builtin_taxonomy_loads() {
        let taxonomy = Taxonomy::builtin().unwrap();
        assert!(taxonomy.rule("total_assets").is_some());
        assert_eq!(taxonomy.anchor_rules().count(), 3);
        assert!(taxonomy.output_keys().all(|k| !k.derived));
        assert!(taxonomy.is_derived("interest_bearing_debt"));
        assert!(taxonomy.output_keys().any(|k| k.key == "equity"));
    }

    #[test]
    fn test_candidate_order_is_preserved_per_standard() {
        let taxonomy = Taxonomy::builtin().unwrap();
        let rule = taxonomy.rule("net_sales").unwrap();
        let jgaap: Vec<_> = rule
            .candidates(AccountingStandard::Jgaap)
            .iter()
            .map(|t| t.local().to_string())
            .collect();
        assert_eq!(jgaap[0], "NetSales");
        assert_eq!(jgaap[1], "OperatingRevenue1");
        assert!(!taxonomy
            .rule("ordinary_income")
            .unwrap()
            .has_candidates(AccountingStandard::Ifrs));
    }

    #[test]
    fn test_standard_aliases() {
        let taxonomy = Taxonomy::builtin().unwrap();
        assert_eq!(taxonomy.resolve_standard("Japan GAAP"), Some(AccountingStandard::Jgaap));
        assert_eq!(taxonomy.resolve_standard(" IFRS "), Some(AccountingStandard::Ifrs));
        assert_eq!(taxonomy.resolve_standard("US GAAP"), Some(AccountingStandard::UsGaap));
        assert_eq!(taxonomy.resolve_standard("Klingon GAAP"), None);
    }

    #[test]
    fn test_duplicate_candidate_is_rejected() {
        let raw = minimal(
            r#"[{"key": "net_sales", "statement": "PL", "candidates": [
                {"standard": "JGAAP", "tag": "NetSales"},
                {"standard": "JGAAP", "tag": "NetSales"}
            ]}]"#,
            r#"[{"key": "net_sales"}]"#,
        );
        let err = Taxonomy::from_json_str(&raw).unwrap_err();
        assert!(matches!(err, ConfigurationError::DuplicateCandidate { .. }));
    }

    #[test]
    fn test_same_tag_under_two_standards_is_allowed() {
        let raw = minimal(
            r#"[{"key": "dps", "statement": "PL", "candidates": [
                {"standard": "JGAAP", "tag": "DividendPaidPerShareSummaryOfBusinessResults"},
                {"standard": "IFRS", "tag": "DividendPaidPerShareSummaryOfBusinessResults"}
            ]}]"#,
            r#"[{"key": "dps"}]"#,
        );
        assert!(Taxonomy::from_json_str(&raw).is_ok());
    }

    #[test]
    fn test_unknown_source_is_rejected() {
        let raw = minimal(
            r#"[{"key": "net_sales", "statement": "PL", "candidates": [
                {"standard": "JGAAP", "tag": "NetSales"}
            ]}]"#,
            r#"[{"key": "revenue", "sources": ["sales"]}]"#,
        );
        let err = Taxonomy::from_json_str(&raw).unwrap_err();
        assert!(matches!(err, ConfigurationError::UnknownSource { .. }));
    }

    #[test]
    fn test_missing_rule_for_plain_fact_key() {
        let raw = minimal(
            r#"[{"key": "net_sales", "statement": "PL", "candidates": [
                {"standard": "JGAAP", "tag": "NetSales"}
            ]}]"#,
            r#"[{"key": "operating_income"}]"#,
        );
        let err = Taxonomy::from_json_str(&raw).unwrap_err();
        assert!(matches!(err, ConfigurationError::NoSources(_)));
    }

    #[test]
    fn test_anchor_key_must_be_balance_sheet() {
        let raw = minimal(
            r#"[{"key": "net_sales", "statement": "PL", "candidates": [
                {"standard": "JGAAP", "tag": "NetSales"}
            ]}]"#,
            r#"[{"key": "net_sales"}]"#,
        )
        .replace(r#""bs_anchor_keys": []"#, r#""bs_anchor_keys": ["net_sales"]"#);
        let err = Taxonomy::from_json_str(&raw).unwrap_err();
        assert!(matches!(err, ConfigurationError::InvalidAnchorKey(_)));
    }

    #[test]
    fn test_malformed_json_is_configuration_error() {
        let err = Taxonomy::from_json_str("{ not json").unwrap_err();
        assert!(matches!(err, ConfigurationError::Parse(_)));
    }

    #[test]
    fn test_tag_name_matching() {
        let bare = TagName::parse("NetSales");
        assert!(bare.matches("jppfs_cor", "NetSales"));
        let qualified = TagName::parse("ifrs-full:Revenue");
        assert!(qualified.matches("ifrs-full", "Revenue"));
        assert!(!qualified.matches("jpigp_cor", "Revenue"));
    }

    #[test]
    fn test_skip_patterns() {
        let taxonomy = Taxonomy::builtin().unwrap();
        assert!(taxonomy.should_skip_file("jpaud-aar-cn-001_E00001.xbrl"));
        assert!(!taxonomy.should_skip_file("jpcrp030000-asr-001_E00001.xbrl"));
    }

    #[test]
    fn test_candidate_ownership() {
        let taxonomy = Taxonomy::builtin().unwrap();
        assert!(taxonomy.is_claimed_elsewhere("net_assets", "LiabilitiesAndNetAssets"));
        assert!(!taxonomy.is_claimed_elsewhere("liabilities_and_net_assets", "LiabilitiesAndNetAssets"));
        assert!(!taxonomy.is_claimed_elsewhere("net_assets", "NetAssetsPerShare"));
    }
}
