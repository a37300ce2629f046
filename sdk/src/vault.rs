// ============ Vault Query Seam ============
// Read-only view of a deployed vault. The contract runtime (or a test double)
// implements `VaultQuery`; the oracle functions snapshot it into a
// `PoolMathContext` before doing any math.

use catalyst_math::liquidity_math::{self, LiquidityEstimate};
use catalyst_math::swap_math::{self, SwapEstimate};
use catalyst_math::{CurveKind, MathError, PoolAsset, PoolMathContext, Real, U256};
use tracing::debug;

pub trait VaultQuery {
    /// Number of assets the vault indexes (1 to 3).
    fn asset_count(&self) -> usize;

    fn balance(&self, asset: usize) -> U256;

    fn weight(&self, asset: usize) -> U256;

    /// X64 amplification; `None` for volatile vaults.
    fn amplification_x64(&self) -> Option<U256>;

    /// Pool tokens in circulation.
    fn total_supply(&self) -> U256;

    /// Units sent minus units received, as tracked by amplified vaults.
    /// Storage that keeps the sign apart maps through `Real::from_x64_signed`.
    fn unit_tracker(&self) -> Real {
        Real::zero()
    }
}

pub fn math_context<V: VaultQuery + ?Sized>(vault: &V) -> Result<PoolMathContext, MathError> {
    let curve = match vault.amplification_x64() {
        Some(amp) => CurveKind::from_x64(amp)?,
        None => CurveKind::ConstantProduct,
    };
    let assets = (0..vault.asset_count())
        .map(|index| PoolAsset::new(vault.balance(index), vault.weight(index)))
        .collect();

    Ok(PoolMathContext::new(assets, curve)?
        .with_total_supply(vault.total_supply())
        .with_unit_tracker(vault.unit_tracker()))
}

/// Expected output of swapping `amount` of `from_asset` for `to_asset`.
/// Pass the same vault twice for a local swap.
pub fn compute_expected_swap<F, T>(
    amount: U256,
    from_asset: usize,
    to_asset: usize,
    from_vault: &F,
    to_vault: &T,
) -> Result<SwapEstimate, MathError>
where
    F: VaultQuery + ?Sized,
    T: VaultQuery + ?Sized,
{
    let from_pool = math_context(from_vault)?;
    let to_pool = math_context(to_vault)?;
    let estimate =
        swap_math::expected_swap_between(amount, from_asset, to_asset, &from_pool, &to_pool)?;
    debug!(%amount, from_asset, to_asset, units = %estimate.units, out = %estimate.amount_out, "expected swap");
    Ok(estimate)
}

/// Expected pool tokens minted on `to_vault` for `pool_tokens` burnt on `from_vault`.
pub fn compute_expected_liquidity_swap<F, T>(
    pool_tokens: U256,
    from_vault: &F,
    to_vault: &T,
) -> Result<LiquidityEstimate, MathError>
where
    F: VaultQuery + ?Sized,
    T: VaultQuery + ?Sized,
{
    let from_pool = math_context(from_vault)?;
    let to_pool = math_context(to_vault)?;
    let estimate = liquidity_math::expected_liquidity_swap(pool_tokens, &from_pool, &to_pool)?;
    debug!(%pool_tokens, units = %estimate.units, out = %estimate.amount_out, "expected liquidity swap");
    Ok(estimate)
}
