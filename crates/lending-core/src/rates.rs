use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::LendingError;
use crate::store::{with_transaction, LendingStore};
use crate::types::{RatePercent, RateTableId};
use crate::LendingResult;

/// Policy ceiling on the number of installments any tier may cover.
pub const MAX_TENOR: u32 = 120;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// One contiguous range of tenors mapped to a monthly rate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateTier {
    pub from_installments: u32,
    pub to_installments: u32,
    pub monthly_rate: RatePercent,
}

/// A named, versioned tier set. Tiers are replaced wholesale on edit so the
/// non-overlap invariant only ever has to hold for a complete set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateTable {
    #[serde(default)]
    pub id: RateTableId,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference_year: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub active: bool,
    pub tiers: Vec<RateTier>,
}

/// Input shape for creating or replacing a rate table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateTableSpec {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference_year: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default = "default_active")]
    pub active: bool,
    pub tiers: Vec<RateTier>,
}

fn default_active() -> bool {
    true
}

// ---------------------------------------------------------------------------
// Validation and resolution
// ---------------------------------------------------------------------------

/// Validate a tier set and return it normalized (sorted by lower bound).
///
/// Rules: at least one tier; positive ordered bounds per tier; after sorting,
/// each tier must start above the previous tier's upper bound (gaps are fine,
/// overlap and regression are not); no tier may reach past `MAX_TENOR`.
pub fn validate_tiers(tiers: &[RateTier]) -> LendingResult<Vec<RateTier>> {
    if tiers.is_empty() {
        return Err(LendingError::InvalidInput {
            field: "tiers".into(),
            reason: "at least one rate tier is required".into(),
        });
    }

    for (i, tier) in tiers.iter().enumerate() {
        if tier.from_installments == 0 || tier.to_installments == 0 {
            return Err(LendingError::InvalidRateTable {
                tier_index: i,
                reason: "installment bounds must be positive".into(),
            });
        }
        if tier.to_installments < tier.from_installments {
            return Err(LendingError::InvalidRateTable {
                tier_index: i,
                reason: "upper bound must not be below lower bound".into(),
            });
        }
        if tier.monthly_rate < Decimal::ZERO {
            return Err(LendingError::InvalidRateTable {
                tier_index: i,
                reason: "monthly rate must not be negative".into(),
            });
        }
        if tier.to_installments > MAX_TENOR {
            return Err(LendingError::InvalidRateTable {
                tier_index: i,
                reason: format!("upper bound exceeds the {MAX_TENOR}-installment ceiling"),
            });
        }
    }

    let mut sorted = tiers.to_vec();
    sorted.sort_by_key(|t| t.from_installments);

    for i in 1..sorted.len() {
        let previous_end = sorted[i - 1].to_installments;
        if sorted[i].from_installments <= previous_end {
            return Err(LendingError::InvalidRateTable {
                tier_index: i,
                reason: format!("must start above {previous_end}"),
            });
        }
    }

    Ok(sorted)
}

impl RateTable {
    /// Highest tenor any tier covers; 0 for an empty tier set.
    pub fn max_tenor(&self) -> u32 {
        self.tiers
            .iter()
            .map(|t| t.to_installments)
            .max()
            .unwrap_or(0)
    }

    /// Find the tier whose interval contains the requested tenor.
    pub fn resolve_rate(&self, installments: u32) -> LendingResult<RatePercent> {
        if self.tiers.is_empty() {
            return Err(LendingError::InvalidInput {
                field: "tiers".into(),
                reason: "rate table has no tiers defined".into(),
            });
        }

        self.tiers
            .iter()
            .find(|t| installments >= t.from_installments && installments <= t.to_installments)
            .map(|t| t.monthly_rate)
            .ok_or(LendingError::RateNotConfigured {
                requested: installments,
                max_configured: self.max_tenor(),
            })
    }
}

// ---------------------------------------------------------------------------
// Store-backed operations
// ---------------------------------------------------------------------------

/// Create a rate table. Header and full tier set are persisted atomically.
pub fn create_rate_table<S>(store: &mut S, spec: &RateTableSpec) -> LendingResult<RateTableId>
where
    S: LendingStore + ?Sized,
{
    if spec.name.trim().is_empty() {
        return Err(LendingError::InvalidInput {
            field: "name".into(),
            reason: "table name is required".into(),
        });
    }
    let tiers = validate_tiers(&spec.tiers)?;

    with_transaction(store, |tx| {
        tx.insert_rate_table(RateTable {
            id: 0,
            name: spec.name.trim().to_string(),
            reference_year: spec.reference_year,
            description: spec.description.clone(),
            active: spec.active,
            tiers,
        })
    })
}

/// Replace a rate table wholesale: header fields and the entire tier set.
pub fn update_rate_table<S>(
    store: &mut S,
    id: RateTableId,
    spec: &RateTableSpec,
) -> LendingResult<()>
where
    S: LendingStore + ?Sized,
{
    if spec.name.trim().is_empty() {
        return Err(LendingError::InvalidInput {
            field: "name".into(),
            reason: "table name is required".into(),
        });
    }
    let tiers = validate_tiers(&spec.tiers)?;

    // Existence check up front so the caller gets NotFound, not a silent no-op.
    store.rate_table(id)?;

    with_transaction(store, |tx| {
        tx.update_rate_table(&RateTable {
            id,
            name: spec.name.trim().to_string(),
            reference_year: spec.reference_year,
            description: spec.description.clone(),
            active: spec.active,
            tiers,
        })
    })
}

/// Soft exclusion: the table stays resolvable by id but is flagged inactive.
pub fn deactivate_rate_table<S>(store: &mut S, id: RateTableId) -> LendingResult<()>
where
    S: LendingStore + ?Sized,
{
    let mut table = store.rate_table(id)?;
    table.active = false;
    store.update_rate_table(&table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn tier(from: u32, to: u32, rate: Decimal) -> RateTier {
        RateTier {
            from_installments: from,
            to_installments: to,
            monthly_rate: rate,
        }
    }

    fn two_tier_table() -> RateTable {
        RateTable {
            id: 1,
            name: "2025 standard".into(),
            reference_year: Some(2025),
            description: None,
            active: true,
            tiers: vec![tier(1, 12, dec!(2.0)), tier(13, 24, dec!(2.5))],
        }
    }

    #[test]
    fn test_resolve_rate_inside_tiers() {
        let table = two_tier_table();
        assert_eq!(table.resolve_rate(1).unwrap(), dec!(2.0));
        assert_eq!(table.resolve_rate(12).unwrap(), dec!(2.0));
        assert_eq!(table.resolve_rate(18).unwrap(), dec!(2.5));
        assert_eq!(table.resolve_rate(24).unwrap(), dec!(2.5));
    }

    #[test]
    fn test_resolve_rate_above_coverage_reports_max() {
        let table = two_tier_table();
        let err = table.resolve_rate(30).unwrap_err();
        match err {
            LendingError::RateNotConfigured {
                requested,
                max_configured,
            } => {
                assert_eq!(requested, 30);
                assert_eq!(max_configured, 24);
            }
            other => panic!("Expected RateNotConfigured, got {other:?}"),
        }
    }

    #[test]
    fn test_resolve_rate_in_gap_fails() {
        let table = RateTable {
            tiers: vec![tier(1, 6, dec!(1.8)), tier(10, 24, dec!(2.2))],
            ..two_tier_table()
        };
        assert!(matches!(
            table.resolve_rate(8),
            Err(LendingError::RateNotConfigured { .. })
        ));
    }

    #[test]
    fn test_validate_rejects_empty() {
        let err = validate_tiers(&[]).unwrap_err();
        assert!(matches!(err, LendingError::InvalidInput { .. }));
    }

    #[test]
    fn test_validate_rejects_inverted_bounds() {
        let err = validate_tiers(&[tier(12, 6, dec!(2.0))]).unwrap_err();
        match err {
            LendingError::InvalidRateTable { tier_index, .. } => assert_eq!(tier_index, 0),
            other => panic!("Expected InvalidRateTable, got {other:?}"),
        }
    }

    #[test]
    fn test_validate_rejects_overlap_after_sorting() {
        // Given out of order on purpose; sorted they are [1,12], [10,24].
        let tiers = vec![tier(10, 24, dec!(2.5)), tier(1, 12, dec!(2.0))];
        let err = validate_tiers(&tiers).unwrap_err();
        match err {
            LendingError::InvalidRateTable { tier_index, reason } => {
                assert_eq!(tier_index, 1);
                assert!(reason.contains("above 12"));
            }
            other => panic!("Expected InvalidRateTable, got {other:?}"),
        }
    }

    #[test]
    fn test_validate_rejects_ceiling_breach() {
        let err = validate_tiers(&[tier(1, 121, dec!(2.0))]).unwrap_err();
        match err {
            LendingError::InvalidRateTable { reason, .. } => {
                assert!(reason.contains("120"));
            }
            other => panic!("Expected InvalidRateTable, got {other:?}"),
        }
    }

    #[test]
    fn test_validate_allows_gaps_and_sorts() {
        let tiers = vec![tier(13, 24, dec!(2.5)), tier(1, 6, dec!(2.0))];
        let sorted = validate_tiers(&tiers).unwrap();
        assert_eq!(sorted[0].from_installments, 1);
        assert_eq!(sorted[1].from_installments, 13);
    }

    #[test]
    fn test_update_replaces_tiers_wholesale() {
        let mut store = crate::store::MemoryStore::new();
        let id = create_rate_table(
            &mut store,
            &RateTableSpec {
                name: "2025 standard".into(),
                reference_year: Some(2025),
                description: None,
                active: true,
                tiers: vec![tier(1, 12, dec!(2.0)), tier(13, 24, dec!(2.5))],
            },
        )
        .unwrap();

        update_rate_table(
            &mut store,
            id,
            &RateTableSpec {
                name: "2026 revision".into(),
                reference_year: Some(2026),
                description: None,
                active: true,
                tiers: vec![tier(1, 36, dec!(1.9))],
            },
        )
        .unwrap();

        let table = crate::store::LendingStore::rate_table(&store, id).unwrap();
        assert_eq!(table.name, "2026 revision");
        assert_eq!(table.tiers.len(), 1);
        assert_eq!(table.resolve_rate(30).unwrap(), dec!(1.9));
    }

    #[test]
    fn test_update_missing_table_fails() {
        let mut store = crate::store::MemoryStore::new();
        let err = update_rate_table(
            &mut store,
            77,
            &RateTableSpec {
                name: "ghost".into(),
                reference_year: None,
                description: None,
                active: true,
                tiers: vec![tier(1, 6, dec!(2.0))],
            },
        )
        .unwrap_err();
        assert!(matches!(err, LendingError::NotFound { .. }));
    }

    #[test]
    fn test_deactivate_keeps_table_resolvable() {
        let mut store = crate::store::MemoryStore::new();
        let id = create_rate_table(
            &mut store,
            &RateTableSpec {
                name: "retiring".into(),
                reference_year: None,
                description: None,
                active: true,
                tiers: vec![tier(1, 12, dec!(2.0))],
            },
        )
        .unwrap();

        deactivate_rate_table(&mut store, id).unwrap();
        let table = crate::store::LendingStore::rate_table(&store, id).unwrap();
        assert!(!table.active);
        assert_eq!(table.resolve_rate(6).unwrap(), dec!(2.0));
    }
}
