use serde::{Deserialize, Serialize};
use surrealdb::sql::Thing;

use crate::database::client::Db;
use crate::database::surrdb_utils::{check_transaction_custom_error, with_conflict_retry};
use crate::entities::amount::Amount;
use crate::entities::balance::{AccountKey, TREASURY_PLATFORM, TREASURY_REVIEWER_POOL};
use crate::entities::data_package::PackageStatus;
use crate::entities::supplier::SupplierStatus;
use crate::interfaces::repositories::balance_ifce::BalanceRepositoryInterface;
use crate::interfaces::repositories::data_package_ifce::DataPackageRepositoryInterface;
use crate::interfaces::repositories::supplier_ifce::SupplierRepositoryInterface;
use crate::middleware::error::{AppError, AppResult};

const FULL_BPS: u32 = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RevenueSplit {
    pub supplier_bps: u32,
    pub reviewer_pool_bps: u32,
}

impl Default for RevenueSplit {
    fn default() -> Self {
        Self {
            supplier_bps: 7_000,
            reviewer_pool_bps: 2_000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevenueShares {
    pub supplier: Amount,
    pub reviewer_pool: Amount,
    pub platform: Amount,
}

impl RevenueSplit {
    pub fn new(supplier_bps: u32, reviewer_pool_bps: u32) -> AppResult<Self> {
        if supplier_bps + reviewer_pool_bps > FULL_BPS {
            return Err(AppError::Validation {
                description: "revenue split exceeds 100%".to_string(),
            });
        }
        Ok(Self {
            supplier_bps,
            reviewer_pool_bps,
        })
    }

    /// The platform takes what is left, so the shares always add up to `price`.
    pub fn split(&self, price: Amount) -> RevenueShares {
        let supplier = price.basis_points(self.supplier_bps);
        let reviewer_pool = price.basis_points(self.reviewer_pool_bps);
        RevenueShares {
            supplier,
            reviewer_pool,
            platform: price - supplier - reviewer_pool,
        }
    }
}

pub struct RevenueService<'a, P, U, B>
where
    P: DataPackageRepositoryInterface + Send + Sync,
    U: SupplierRepositoryInterface + Send + Sync,
    B: BalanceRepositoryInterface + Send + Sync,
{
    db: &'a Db,
    packages: &'a P,
    suppliers: &'a U,
    balances: &'a B,
    split: RevenueSplit,
}

impl<'a, P, U, B> RevenueService<'a, P, U, B>
where
    P: DataPackageRepositoryInterface + Send + Sync,
    U: SupplierRepositoryInterface + Send + Sync,
    B: BalanceRepositoryInterface + Send + Sync,
{
    pub fn new(
        db: &'a Db,
        packages: &'a P,
        suppliers: &'a U,
        balances: &'a B,
        split: RevenueSplit,
    ) -> Self {
        Self {
            db,
            packages,
            suppliers,
            balances,
            split,
        }
    }

    /// Credits the three shares of one paid query in a single transaction.
    pub async fn record_query(&self, package_id: &Thing) -> AppResult<RevenueShares> {
        let package = self
            .packages
            .get(package_id)
            .await?
            .ok_or(AppError::EntityFailIdNotFound {
                ident: package_id.to_raw(),
            })?;
        let supplier = self
            .suppliers
            .get(&package.supplier)
            .await?
            .ok_or(AppError::EntityFailIdNotFound {
                ident: package.supplier.to_raw(),
            })?;
        if supplier.status != SupplierStatus::Active || package.status != PackageStatus::Active {
            return Err(AppError::Unavailable {
                description: format!("Package {} is not available", package.name),
            });
        }

        let shares = self.split.split(package.price_per_query);
        let credits = [
            (AccountKey::supplier(supplier.id.id.to_raw()), shares.supplier),
            (AccountKey::treasury(TREASURY_REVIEWER_POOL), shares.reviewer_pool),
            (AccountKey::treasury(TREASURY_PLATFORM), shares.platform),
        ];
        let credits = &credits;
        with_conflict_retry(|| async move {
            let mut query = self.db.query("BEGIN TRANSACTION");
            for (index, (account, amount)) in credits.iter().enumerate() {
                query = self.balances.build_credit_query(query, index, account, *amount);
            }
            let mut res = query.query("COMMIT TRANSACTION").await?;
            check_transaction_custom_error(&mut res)
        })
        .await?;

        tracing::info!(
            package = %package.id,
            price = %package.price_per_query,
            supplier_share = %shares.supplier,
            "query revenue recorded"
        );
        Ok(shares)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shares_sum_to_price() {
        let split = RevenueSplit::default();
        for micros in [1, 7, 333, 10_000, 123_457, 2_500_000] {
            let price = Amount::from_micros(micros);
            let shares = split.split(price);
            assert_eq!(shares.supplier + shares.reviewer_pool + shares.platform, price);
        }
    }

    #[test]
    fn default_split_of_one_dollar() {
        let shares = RevenueSplit::default().split(Amount::from_units(1));
        assert_eq!(shares.supplier, Amount::from_micros(700_000));
        assert_eq!(shares.reviewer_pool, Amount::from_micros(200_000));
        assert_eq!(shares.platform, Amount::from_micros(100_000));
    }

    #[test]
    fn rejects_split_over_full() {
        assert!(RevenueSplit::new(8_000, 3_000).is_err());
        assert!(RevenueSplit::new(7_000, 3_000).is_ok());
    }
}
