use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

use crate::types::*;

/// Typical loan profile for an industry, used to prefill an analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndustryTemplate {
    pub id: String,
    pub name: String,
    pub description: String,
    pub average_loan_amount: Money,
    pub typical_term: Years,
    pub average_rate: Percent,
    pub typical_ebitda: Money,
    /// Annual debt service on existing obligations.
    pub existing_debt: Money,
    /// Lending notes for the sector.
    pub insights: Vec<String>,
}

#[allow(clippy::too_many_arguments)]
fn template(
    id: &str,
    name: &str,
    description: &str,
    average_loan_amount: Money,
    typical_term: Years,
    average_rate: Percent,
    typical_ebitda: Money,
    existing_debt: Money,
    insights: &[&str],
) -> IndustryTemplate {
    IndustryTemplate {
        id: id.to_string(),
        name: name.to_string(),
        description: description.to_string(),
        average_loan_amount,
        typical_term,
        average_rate,
        typical_ebitda,
        existing_debt,
        insights: insights.iter().map(|s| s.to_string()).collect(),
    }
}

fn build() -> Vec<IndustryTemplate> {
    vec![
        template(
            "restaurant",
            "Restaurant & Food Service",
            "Full-service restaurants, cafes, food trucks, and catering businesses",
            dec!(350000),
            dec!(10),
            dec!(8.5),
            dec!(120000),
            dec!(30000),
            &[
                "Average SBA 7(a) loan for restaurants: $250K-$500K",
                "Typical use: Equipment, renovation, working capital",
                "DSCR requirement: Minimum 1.25 (1.5+ preferred)",
                "Term: 10 years for equipment, 25 years for real estate",
            ],
        ),
        template(
            "retail",
            "Retail Store",
            "Brick-and-mortar retail, e-commerce, specialty shops",
            dec!(275000),
            dec!(10),
            dec!(8.0),
            dec!(95000),
            dec!(25000),
            &[
                "Average SBA 7(a) loan for retail: $150K-$400K",
                "Typical use: Inventory, fixtures, expansion",
                "Seasonal businesses: Factor in cash flow variations",
                "E-commerce: Lower DSCR acceptable with proven online sales",
            ],
        ),
        template(
            "healthcare",
            "Healthcare & Medical",
            "Medical practices, dental offices, urgent care, veterinary clinics",
            dec!(500000),
            dec!(15),
            dec!(7.5),
            dec!(200000),
            dec!(50000),
            &[
                "Average SBA 7(a) loan for healthcare: $400K-$750K",
                "Typical use: Medical equipment, practice acquisition",
                "Strong approval rates due to recession-resistant sector",
                "Equipment financing: Up to 100% loan-to-value",
            ],
        ),
        template(
            "professional-services",
            "Professional Services",
            "Consulting, legal, accounting, marketing agencies",
            dec!(200000),
            dec!(7),
            dec!(8.25),
            dec!(150000),
            dec!(20000),
            &[
                "Average SBA 7(a) loan for services: $100K-$300K",
                "Typical use: Working capital, technology, talent acquisition",
                "Lower collateral requirements for established firms",
                "Personal guarantee typically required",
            ],
        ),
        template(
            "manufacturing",
            "Manufacturing",
            "Light manufacturing, assembly, production facilities",
            dec!(750000),
            dec!(20),
            dec!(7.75),
            dec!(300000),
            dec!(80000),
            &[
                "Average SBA 7(a) loan for manufacturing: $500K-$1.5M",
                "Typical use: Machinery, facility expansion, automation",
                "Longer terms available for real estate and heavy equipment",
                "Strong collateral position with equipment and inventory",
            ],
        ),
        template(
            "construction",
            "Construction & Trades",
            "General contractors, specialty trades, landscaping",
            dec!(400000),
            dec!(10),
            dec!(8.75),
            dec!(140000),
            dec!(45000),
            &[
                "Average SBA 7(a) loan for construction: $250K-$600K",
                "Typical use: Equipment, vehicles, bonding capacity",
                "Requires: 2+ years in business, strong backlog",
                "Seasonal cash flow: Factor in payment timing",
            ],
        ),
        template(
            "hospitality",
            "Hospitality & Lodging",
            "Hotels, motels, bed & breakfasts, event venues",
            dec!(1200000),
            dec!(25),
            dec!(7.5),
            dec!(350000),
            dec!(100000),
            &[
                "Average SBA 7(a) loan for hospitality: $750K-$2M",
                "Typical use: Property acquisition, renovation, expansion",
                "Real estate portion: Up to 25-year term",
                "RevPAR and occupancy rates critical for approval",
            ],
        ),
        template(
            "franchise",
            "Franchise Business",
            "Fast food, fitness, automotive, cleaning franchises",
            dec!(450000),
            dec!(10),
            dec!(8.0),
            dec!(160000),
            dec!(35000),
            &[
                "Average SBA 7(a) loan for franchises: $300K-$700K",
                "Typical use: Franchise fee, build-out, equipment",
                "Must be on SBA Franchise Directory for streamlined approval",
                "Territory exclusivity and brand recognition boost approval odds",
            ],
        ),
    ]
}

/// The built-in industry presets.
pub fn industry_templates() -> &'static [IndustryTemplate] {
    static TEMPLATES: OnceLock<Vec<IndustryTemplate>> = OnceLock::new();
    TEMPLATES.get_or_init(build)
}

pub fn find_template(id: &str) -> Option<&'static IndustryTemplate> {
    industry_templates().iter().find(|t| t.id == id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_eight_unique_templates() {
        let all = industry_templates();
        assert_eq!(all.len(), 8);
        let mut ids: Vec<&str> = all.iter().map(|t| t.id.as_str()).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), 8);
    }

    #[test]
    fn test_find_template() {
        let t = find_template("healthcare").unwrap();
        assert_eq!(t.average_loan_amount, dec!(500000));
        assert_eq!(t.typical_term, dec!(15));
        assert!(find_template("aerospace").is_none());
    }

    #[test]
    fn test_every_template_carries_insights() {
        for t in industry_templates() {
            assert_eq!(t.insights.len(), 4, "template={}", t.id);
        }
        let franchise = find_template("franchise").unwrap();
        assert!(franchise.insights[2].contains("SBA Franchise Directory"));
    }
}
