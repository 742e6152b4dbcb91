//! CSAF VEX decoder.
//!
//! Products come from the product tree; only products with an identification
//! helper are addressable. Each (vulnerability, status category, product)
//! triple becomes one statement. Flags supply justifications, `impact`
//! threats the impact statement, and remediations the action statement.

use super::{non_empty, statement, VexError, VexJustification, VexProduct, VexStatement, VexStatus};
use crate::model::Purl;
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Deserialize)]
struct CsafDocument {
    product_tree: Option<ProductTree>,
    #[serde(default)]
    vulnerabilities: Vec<CsafVulnerability>,
}

#[derive(Debug, Default, Deserialize)]
struct ProductTree {
    #[serde(default)]
    branches: Vec<Branch>,
    #[serde(default)]
    full_product_names: Vec<FullProductName>,
    #[serde(default)]
    relationships: Vec<Relationship>,
}

#[derive(Debug, Deserialize)]
struct Branch {
    #[serde(default)]
    branches: Vec<Branch>,
    product: Option<FullProductName>,
}

#[derive(Debug, Deserialize)]
struct Relationship {
    full_product_name: FullProductName,
}

#[derive(Debug, Deserialize)]
struct FullProductName {
    product_id: String,
    product_identification_helper: Option<IdentificationHelper>,
}

#[derive(Debug, Deserialize)]
struct IdentificationHelper {
    purl: Option<String>,
    cpe: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CsafVulnerability {
    cve: Option<String>,
    #[serde(default)]
    ids: Vec<CsafId>,
    #[serde(default)]
    product_status: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    flags: Vec<ProductNote>,
    #[serde(default)]
    threats: Vec<ProductNote>,
    #[serde(default)]
    remediations: Vec<ProductNote>,
    discovery_date: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CsafId {
    text: String,
}

/// Flags, threats and remediations share this shape
#[derive(Debug, Deserialize)]
struct ProductNote {
    label: Option<String>,
    category: Option<String>,
    details: Option<String>,
    #[serde(default)]
    product_ids: Vec<String>,
}

impl ProductNote {
    fn covers(&self, product_id: &str) -> bool {
        self.product_ids.iter().any(|p| p == product_id)
    }
}

/// Map a CSAF product status category to a VEX status
fn map_category(category: &str) -> Option<VexStatus> {
    match category {
        "first_affected" | "known_affected" | "last_affected" => Some(VexStatus::Affected),
        "known_not_affected" => Some(VexStatus::NotAffected),
        "first_fixed" | "fixed" => Some(VexStatus::Fixed),
        "under_investigation" => Some(VexStatus::UnderInvestigation),
        _ => None,
    }
}

fn collect_branch<'a>(branch: &'a Branch, out: &mut Vec<&'a FullProductName>) {
    if let Some(product) = &branch.product {
        out.push(product);
    }
    for child in &branch.branches {
        collect_branch(child, out);
    }
}

/// Addressable products by product id
fn product_index(tree: &ProductTree) -> HashMap<&str, VexProduct> {
    let mut names: Vec<&FullProductName> = Vec::new();
    for branch in &tree.branches {
        collect_branch(branch, &mut names);
    }
    names.extend(&tree.full_product_names);
    names.extend(tree.relationships.iter().map(|r| &r.full_product_name));

    names
        .into_iter()
        .filter_map(|name| {
            let helper = name.product_identification_helper.as_ref()?;
            let purl = helper.purl.as_deref().and_then(|p| Purl::parse(p).ok());
            if purl.is_none() && helper.cpe.is_none() {
                return None;
            }
            let product = VexProduct {
                id: Some(name.product_id.clone()),
                purl,
                subcomponents: Vec::new(),
            };
            Some((name.product_id.as_str(), product))
        })
        .collect()
}

fn convert(vuln: &CsafVulnerability, products: &HashMap<&str, VexProduct>) -> Vec<VexStatement> {
    let name = non_empty(vuln.cve.clone()).or_else(|| vuln.ids.first().map(|id| id.text.clone()));
    let Some(name) = name else {
        tracing::warn!("Skipping CSAF vulnerability without a CVE or id");
        return Vec::new();
    };
    let aliases: Vec<String> = vuln
        .ids
        .iter()
        .map(|id| id.text.clone())
        .filter(|id| *id != name)
        .collect();

    let mut statements = Vec::new();
    for (category, product_ids) in &vuln.product_status {
        let Some(status) = map_category(category) else {
            tracing::debug!("Ignoring CSAF product status category '{}'", category);
            continue;
        };
        for product_id in product_ids {
            let Some(product) = products.get(product_id.as_str()) else {
                tracing::debug!("CSAF product {} has no identification helper", product_id);
                continue;
            };

            let mut out = statement(name.clone(), status);
            out.aliases.clone_from(&aliases);
            out.justification = vuln
                .flags
                .iter()
                .filter(|f| f.covers(product_id))
                .find_map(|f| f.label.as_deref().and_then(VexJustification::parse));
            out.impact_statement = vuln
                .threats
                .iter()
                .filter(|t| t.category.as_deref() == Some("impact") && t.covers(product_id))
                .find_map(|t| non_empty(t.details.clone()));
            out.action_statement = vuln
                .remediations
                .iter()
                .filter(|r| r.covers(product_id))
                .find_map(|r| non_empty(r.details.clone()));
            out.timestamp.clone_from(&vuln.discovery_date);
            out.products = vec![product.clone()];
            statements.push(out);
        }
    }
    statements
}

/// Decode a CSAF VEX document into statements.
pub(super) fn decode(content: &str) -> Result<Vec<VexStatement>, VexError> {
    let doc: CsafDocument = serde_json::from_str(content)?;
    let tree = doc.product_tree.unwrap_or_default();
    let products = product_index(&tree);
    Ok(doc
        .vulnerabilities
        .iter()
        .flat_map(|v| convert(v, &products))
        .collect())
}
