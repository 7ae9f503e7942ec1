pub mod loan_analysis;
pub mod templates;

pub use loan_analysis::{analyze_loan, LoanAnalysis, LoanAnalysisInput};
pub use templates::{find_template, industry_templates, IndustryTemplate};
