use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::LendingError;
use crate::types::{round_money, round_to_nearest_hundred, with_methodology, CalcOutput, Money};
use crate::LendingResult;

/// Share of monthly income an installment may take up.
const INSTALLMENT_INCOME_SHARE: Decimal = dec!(0.30);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmploymentCategory {
    Salaried,
    PublicServant,
    Retired,
    Pensioner,
    SelfEmployed,
    BusinessOwner,
    Unemployed,
    Other,
}

impl EmploymentCategory {
    /// Income-multiple applied to the maximum installment to suggest a
    /// principal. Fixed policy values, not a credit score.
    fn principal_multiplier(&self) -> Decimal {
        match self {
            EmploymentCategory::Salaried => dec!(12),
            EmploymentCategory::PublicServant => dec!(15),
            EmploymentCategory::Retired => dec!(10),
            EmploymentCategory::Pensioner => dec!(10),
            EmploymentCategory::SelfEmployed => dec!(8),
            EmploymentCategory::BusinessOwner => dec!(8),
            EmploymentCategory::Unemployed => dec!(4),
            EmploymentCategory::Other => dec!(6),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub monthly_income: Option<Money>,
    /// Unknown category falls back to the default multiplier.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub employment: Option<EmploymentCategory>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreditRecommendation {
    pub suggested_principal: Money,
    pub max_installment: Money,
}

/// Suggest a principal and a maximum monthly installment from income and
/// employment category. Advisory only; never blocks request creation.
pub fn recommend_credit(
    input: &RecommendationInput,
) -> LendingResult<CalcOutput<CreditRecommendation>> {
    let mut warnings = Vec::new();

    let income = input.monthly_income.unwrap_or(Decimal::ZERO);
    if income < Decimal::ZERO {
        return Err(LendingError::InvalidInput {
            field: "monthly_income".into(),
            reason: "must not be negative".into(),
        });
    }

    if income.is_zero() {
        warnings.push("no income on file; recommendation is zero".to_string());
        return Ok(with_methodology(
            "Income-multiple heuristic (30% installment cap)",
            warnings,
            CreditRecommendation {
                suggested_principal: Decimal::ZERO,
                max_installment: Decimal::ZERO,
            },
        ));
    }

    let multiplier = input
        .employment
        .map(|e| e.principal_multiplier())
        .unwrap_or_else(|| EmploymentCategory::Other.principal_multiplier());

    let max_installment = round_money(income * INSTALLMENT_INCOME_SHARE);
    let suggested_principal = round_to_nearest_hundred(max_installment * multiplier);

    Ok(with_methodology(
        "Income-multiple heuristic (30% installment cap)",
        warnings,
        CreditRecommendation {
            suggested_principal,
            max_installment,
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_salaried_recommendation() {
        let out = recommend_credit(&RecommendationInput {
            monthly_income: Some(dec!(3000)),
            employment: Some(EmploymentCategory::Salaried),
        })
        .unwrap();
        // max installment 900, principal 900 * 12 = 10800
        assert_eq!(out.result.max_installment, dec!(900));
        assert_eq!(out.result.suggested_principal, dec!(10800));
    }

    #[test]
    fn test_public_servant_gets_largest_multiple() {
        let out = recommend_credit(&RecommendationInput {
            monthly_income: Some(dec!(3000)),
            employment: Some(EmploymentCategory::PublicServant),
        })
        .unwrap();
        assert_eq!(out.result.suggested_principal, dec!(13500));
    }

    #[test]
    fn test_principal_rounds_to_nearest_hundred() {
        // income 1234.56 -> max installment 370.37 -> x12 = 4444.44 -> 4400
        let out = recommend_credit(&RecommendationInput {
            monthly_income: Some(dec!(1234.56)),
            employment: Some(EmploymentCategory::Salaried),
        })
        .unwrap();
        assert_eq!(out.result.max_installment, dec!(370.37));
        assert_eq!(out.result.suggested_principal, dec!(4400));
    }

    #[test]
    fn test_missing_income_yields_zero() {
        let out = recommend_credit(&RecommendationInput {
            monthly_income: None,
            employment: Some(EmploymentCategory::Salaried),
        })
        .unwrap();
        assert_eq!(out.result.max_installment, Decimal::ZERO);
        assert_eq!(out.result.suggested_principal, Decimal::ZERO);
        assert_eq!(out.warnings.len(), 1);
    }

    #[test]
    fn test_unemployed_and_unknown_multipliers() {
        let unemployed = recommend_credit(&RecommendationInput {
            monthly_income: Some(dec!(1000)),
            employment: Some(EmploymentCategory::Unemployed),
        })
        .unwrap();
        // 300 * 4 = 1200
        assert_eq!(unemployed.result.suggested_principal, dec!(1200));

        let unknown = recommend_credit(&RecommendationInput {
            monthly_income: Some(dec!(1000)),
            employment: None,
        })
        .unwrap();
        // 300 * 6 = 1800
        assert_eq!(unknown.result.suggested_principal, dec!(1800));
    }

    #[test]
    fn test_negative_income_rejected() {
        let err = recommend_credit(&RecommendationInput {
            monthly_income: Some(dec!(-10)),
            employment: None,
        })
        .unwrap_err();
        assert!(matches!(err, LendingError::InvalidInput { .. }));
    }
}
