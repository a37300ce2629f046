// ============ Catalyst Reference Math ============
// Independent model of the Catalyst vault curves, used as a test oracle.
// Volatile pools follow the weighted constant-product curve, amplified pools
// the constant-mean curve with exponent (1 - theta).
//
// Inputs and outputs are 256-bit token amounts; everything in between runs on
// `Real`, so rounding only happens where the vaults round (outputs, up).

pub mod real;

pub use primitive_types::U256;
pub use real::Real;

use num::BigInt;
use thiserror::Error;

// ============ Constants ============

/// Amplification identity in the vaults' X64 representation.
pub const ONE_X64: u128 = 1 << 64;

/// Amplification identity in pool configs (18 decimals).
pub const WAD: u128 = 1_000_000_000_000_000_000;

pub const MAX_POOL_ASSETS: usize = 3;

/// Bit width the exact constant-product invariant may reach.
pub const MAX_INVARIANT_BITS: u64 = 1 << 20;

// ============ Error Types ============

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MathError {
    #[error("invalid input: {0}")]
    InvalidInput(&'static str),
    #[error("division by zero")]
    DivisionByZero,
    #[error("logarithm of a non-positive value")]
    LogOfNonPositive,
    #[error("value out of range")]
    OutOfRange,
}

// ============ Curve ============

/// Which bonding curve a pool prices on.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CurveKind {
    ConstantProduct,
    /// Amplification fraction, strictly inside (0, 1).
    Amplified(Real),
}

impl CurveKind {
    /// From the vaults' X64 amplification, where 2^64 means no amplification.
    pub fn from_x64(amp: U256) -> Result<Self, MathError> {
        Self::from_scaled(amp, ONE_X64)
    }

    /// From a config amplification, where 10^18 means no amplification.
    pub fn from_wad(amp: U256) -> Result<Self, MathError> {
        Self::from_scaled(amp, WAD)
    }

    pub fn amplified(theta: Real) -> Result<Self, MathError> {
        if !theta.is_positive() || theta >= Real::one() {
            return Err(MathError::InvalidInput("amplification must be in (0, 1)"));
        }
        Ok(Self::Amplified(theta))
    }

    fn from_scaled(amp: U256, identity: u128) -> Result<Self, MathError> {
        let identity = U256::from(identity);
        if amp == identity {
            return Ok(Self::ConstantProduct);
        }
        if amp.is_zero() || amp > identity {
            return Err(MathError::InvalidInput("amplification must be in (0, identity]"));
        }
        Ok(Self::Amplified(Real::from_ratio(
            real::u256_to_big(amp),
            real::u256_to_big(identity),
        )?))
    }

    pub fn is_amplified(&self) -> bool {
        matches!(self, Self::Amplified(_))
    }

    /// Curve exponent `1 - theta`; `None` for constant product.
    pub fn one_minus_theta(&self) -> Option<Real> {
        match self {
            Self::ConstantProduct => None,
            Self::Amplified(theta) => Some(Real::one() - theta),
        }
    }

    /// X64 amplification as the vaults store it.
    pub fn to_x64(&self) -> Result<U256, MathError> {
        match self {
            Self::ConstantProduct => Ok(U256::from(ONE_X64)),
            Self::Amplified(theta) => theta.to_x64(),
        }
    }
}

// ============ Pool Context ============

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PoolAsset {
    pub balance: U256,
    pub weight: U256,
}

impl PoolAsset {
    pub fn new(balance: impl Into<U256>, weight: impl Into<U256>) -> Self {
        Self {
            balance: balance.into(),
            weight: weight.into(),
        }
    }
}

/// Snapshot of everything the pool math reads from a vault.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PoolMathContext {
    pub assets: Vec<PoolAsset>,
    pub curve: CurveKind,
    pub total_supply: U256,
    /// Signed running total of units the vault has sent minus received.
    pub unit_tracker: Real,
}

impl PoolMathContext {
    pub fn new(assets: Vec<PoolAsset>, curve: CurveKind) -> Result<Self, MathError> {
        if assets.is_empty() || assets.len() > MAX_POOL_ASSETS {
            return Err(MathError::InvalidInput("pool must hold 1 to 3 assets"));
        }
        for asset in &assets {
            validate_asset(asset.balance, asset.weight)?;
        }
        Ok(Self {
            assets,
            curve,
            total_supply: U256::zero(),
            unit_tracker: Real::zero(),
        })
    }

    pub fn with_total_supply(mut self, total_supply: impl Into<U256>) -> Self {
        self.total_supply = total_supply.into();
        self
    }

    pub fn with_unit_tracker(mut self, unit_tracker: Real) -> Self {
        self.unit_tracker = unit_tracker;
        self
    }

    pub fn asset(&self, index: usize) -> Result<&PoolAsset, MathError> {
        self.assets
            .get(index)
            .ok_or(MathError::InvalidInput("asset index out of range"))
    }

    pub fn weight_sum(&self) -> Real {
        self.assets
            .iter()
            .fold(Real::zero(), |acc, asset| acc + Real::from(asset.weight))
    }
}

fn validate_asset(balance: U256, weight: U256) -> Result<(), MathError> {
    if balance.is_zero() {
        return Err(MathError::InvalidInput("balance must be positive"));
    }
    if weight.is_zero() {
        return Err(MathError::InvalidInput("weight must be positive"));
    }
    Ok(())
}

// ============ Swap Math ============

pub mod swap_math {
    use super::*;

    #[derive(Clone, Debug, PartialEq, Eq)]
    pub struct SwapEstimate {
        pub units: Real,
        pub amount_out: U256,
    }

    /// Withdrawal half: units released by selling `amount` into the pool.
    pub fn units_for_input(
        amount: U256,
        balance: U256,
        weight: U256,
        curve: &CurveKind,
    ) -> Result<Real, MathError> {
        validate_asset(balance, weight)?;
        if amount.is_zero() {
            return Ok(Real::zero());
        }

        let w = Real::from(weight);
        match curve.one_minus_theta() {
            None => {
                let a = Real::from(balance);
                let ratio = (&a + Real::from(amount)).checked_div(&a)?;
                Ok(w * ratio.log2()?)
            }
            Some(k) => {
                let a = Real::from(balance) * &w;
                let x = Real::from(amount) * &w;
                Ok((&a + x).pow(&k)? - a.pow(&k)?)
            }
        }
    }

    /// Deposit half: tokens paid out for `units`, rounded up.
    pub fn output_for_units(
        units: &Real,
        balance: U256,
        weight: U256,
        curve: &CurveKind,
    ) -> Result<U256, MathError> {
        validate_asset(balance, weight)?;
        if units.is_negative() {
            return Err(MathError::InvalidInput("units must be non-negative"));
        }
        if units.is_zero() {
            return Ok(U256::zero());
        }

        let w = Real::from(weight);
        let b = Real::from(balance);
        let share = match curve.one_minus_theta() {
            None => {
                let exponent = -(units.checked_div(&w)?);
                Real::one() - exponent.exp2()?
            }
            Some(k) => {
                let b_amp = (&b * &w).pow(&k)?;
                if units >= &b_amp {
                    return Ok(balance);
                }
                let remaining = (&b_amp - units).checked_div(&b_amp)?;
                Real::one() - remaining.pow(&Real::one().checked_div(&k)?)?
            }
        };

        // Never pays out more than the pool holds.
        Ok((b * share).to_u256_ceil()?.min(balance))
    }

    pub fn expected_swap(
        swap_amount: U256,
        balance_in: U256,
        balance_out: U256,
        weight_in: U256,
        weight_out: U256,
        curve: &CurveKind,
    ) -> Result<SwapEstimate, MathError> {
        validate_asset(balance_in, weight_in)?;
        validate_asset(balance_out, weight_out)?;
        if swap_amount.is_zero() {
            return Ok(SwapEstimate {
                units: Real::zero(),
                amount_out: U256::zero(),
            });
        }

        let units = units_for_input(swap_amount, balance_in, weight_in, curve)?;

        let amount_out = if !curve.is_amplified() && weight_in == weight_out {
            // Exact: ceil(b * x / (a + x))
            let a = real::u256_to_big(balance_in);
            let b = real::u256_to_big(balance_out);
            let x = real::u256_to_big(swap_amount);
            let denominator: BigInt = a + &x;
            let numerator = b * x + &denominator - 1;
            real::big_to_u256(&(numerator / denominator))?
        } else {
            output_for_units(&units, balance_out, weight_out, curve)?
        };

        Ok(SwapEstimate { units, amount_out })
    }

    pub fn expected_swap_amount(
        swap_amount: U256,
        balance_in: U256,
        balance_out: U256,
        weight_in: U256,
        weight_out: U256,
        curve: &CurveKind,
    ) -> Result<U256, MathError> {
        expected_swap(
            swap_amount,
            balance_in,
            balance_out,
            weight_in,
            weight_out,
            curve,
        )
        .map(|estimate| estimate.amount_out)
    }

    /// Swap between two pool snapshots. Pass the same context twice for a
    /// local swap. Priced on the sending pool's curve.
    pub fn expected_swap_between(
        swap_amount: U256,
        from_asset: usize,
        to_asset: usize,
        from_pool: &PoolMathContext,
        to_pool: &PoolMathContext,
    ) -> Result<SwapEstimate, MathError> {
        let source = from_pool.asset(from_asset)?;
        let target = to_pool.asset(to_asset)?;
        expected_swap(
            swap_amount,
            source.balance,
            target.balance,
            source.weight,
            target.weight,
            &from_pool.curve,
        )
    }
}

// ============ Liquidity Math ============

pub mod liquidity_math {
    use super::*;
    use num::One;

    #[derive(Clone, Debug, PartialEq, Eq)]
    pub struct LiquidityEstimate {
        pub units: Real,
        pub amount_out: U256,
    }

    pub fn invariant(pool: &PoolMathContext) -> Result<Real, MathError> {
        match pool.curve.one_minus_theta() {
            None => {
                let mut bits: u64 = 0;
                let mut product = BigInt::one();
                for asset in &pool.assets {
                    if asset.weight > U256::from(u64::MAX) {
                        return Err(MathError::InvalidInput("weight too large"));
                    }
                    let weight = asset.weight.low_u64();
                    bits = bits.saturating_add((asset.balance.bits() as u64).saturating_mul(weight));
                    if bits > MAX_INVARIANT_BITS {
                        return Err(MathError::InvalidInput("invariant too large"));
                    }
                    product *= num::pow(real::u256_to_big(asset.balance), weight as usize);
                }
                Ok(Real::from_int(product))
            }
            Some(k) => pool.assets.iter().try_fold(Real::zero(), |acc, asset| -> Result<Real, MathError> {
                let weighted = Real::from(asset.balance) * Real::from(asset.weight);
                Ok(acc + weighted.pow(&k)?)
            }),
        }
    }

    /// Amplified pools only.
    pub fn balance_0(pool: &PoolMathContext) -> Result<Real, MathError> {
        let k = pool
            .curve
            .one_minus_theta()
            .ok_or(MathError::InvalidInput("balance 0 needs an amplified pool"))?;
        let walpha_theta = invariant(pool)? - &pool.unit_tracker;
        if !walpha_theta.is_positive() {
            return Err(MathError::InvalidInput("unit tracker exceeds invariant"));
        }
        walpha_theta.pow(&Real::one().checked_div(&k)?)
    }

    pub fn expected_liquidity_swap(
        pool_share_amount: U256,
        from_pool: &PoolMathContext,
        to_pool: &PoolMathContext,
    ) -> Result<LiquidityEstimate, MathError> {
        if from_pool.total_supply.is_zero() || to_pool.total_supply.is_zero() {
            return Err(MathError::InvalidInput("pool has no supply"));
        }
        if pool_share_amount.is_zero() {
            return Ok(LiquidityEstimate {
                units: Real::zero(),
                amount_out: U256::zero(),
            });
        }

        let pt = Real::from(pool_share_amount);
        let from_pt = Real::from(from_pool.total_supply);
        let to_pt = Real::from(to_pool.total_supply);

        let (units, amount) = match from_pool.curve.one_minus_theta() {
            None => {
                if pool_share_amount >= from_pool.total_supply {
                    return Err(MathError::InvalidInput("share exceeds total supply"));
                }
                let ratio = from_pt.checked_div(&(&from_pt - &pt))?;
                let units = ratio.log2()? * from_pool.weight_sum();
                let exponent = -(units.checked_div(&to_pool.weight_sum())?);
                let share = Real::one() - exponent.exp2()?;
                let amount = (to_pt * &share).checked_div(&(Real::one() - share))?;
                (units, amount)
            }
            Some(k) => {
                let to_k = to_pool
                    .curve
                    .one_minus_theta()
                    .ok_or(MathError::InvalidInput("destination pool is not amplified"))?;
                let a0 = balance_0(from_pool)?;
                let b0 = balance_0(to_pool)?;

                let grown = &a0 + (&a0 * &pt).checked_div(&from_pt)?;
                let n_from = Real::from(from_pool.assets.len() as u64);
                let n_to = Real::from(to_pool.assets.len() as u64);
                let units = (grown.pow(&k)? - a0.pow(&k)?) * n_from;

                let wpt = (b0.pow(&to_k)? + units.checked_div(&n_to)?)
                    .pow(&Real::one().checked_div(&to_k)?)?
                    - &b0;
                let amount = (wpt * to_pt).checked_div(&b0)?;
                (units, amount)
            }
        };

        Ok(LiquidityEstimate {
            units,
            amount_out: amount.to_u256_ceil()?,
        })
    }

    pub fn expected_liquidity_swap_amount(
        pool_share_amount: U256,
        from_pool: &PoolMathContext,
        to_pool: &PoolMathContext,
    ) -> Result<U256, MathError> {
        expected_liquidity_swap(pool_share_amount, from_pool, to_pool)
            .map(|estimate| estimate.amount_out)
    }
}

// ============ Tests ============
