// ============ Catalyst Test Harness SDK ============
// Everything a cross-chain vault test needs around the reference math:
// pool configs, balance expressions, the vault query seam, tolerance checks,
// payload construction and an in-process two-chain relay.

pub mod config;
pub mod expr;
pub mod relay;
pub mod tolerance;
pub mod vault;

pub use catalyst_math::{self, CurveKind, PoolMathContext, Real, U256};
pub use catalyst_types::{
    self, primitive_types::H160, AssetSwapPayload, CustomData, LiquiditySwapPayload, Payload,
    PayloadError, CTX_ASSET_SWAP, CTX_LIQUIDITY_SWAP,
};

// ============ Payload Builder ============

/// Optional asset-swap fields; defaults match a plain swap.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AssetSwapOptions {
    pub asset_index: u8,
    pub min_out: U256,
    pub escrow_amount: U256,
    pub escrow_token: H160,
    pub context: u8,
    pub custom_data: Option<CustomData>,
}

impl Default for AssetSwapOptions {
    fn default() -> Self {
        Self {
            asset_index: 0,
            min_out: U256::zero(),
            escrow_amount: U256::zero(),
            escrow_token: H160::zero(),
            context: CTX_ASSET_SWAP,
            custom_data: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LiquiditySwapOptions {
    pub min_out: U256,
    pub escrow_amount: U256,
    pub context: u8,
}

impl Default for LiquiditySwapOptions {
    fn default() -> Self {
        Self {
            min_out: U256::zero(),
            escrow_amount: U256::zero(),
            context: CTX_LIQUIDITY_SWAP,
        }
    }
}

/// Builds the messages a source vault would emit, for feeding straight into
/// a destination vault in tests.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PayloadBuilder {
    pub from_pool: H160,
    pub to_pool: H160,
    pub who: H160,
}

impl PayloadBuilder {
    pub fn new(from_pool: H160, to_pool: H160, who: H160) -> Self {
        Self {
            from_pool,
            to_pool,
            who,
        }
    }

    pub fn asset_swap(&self, units: U256, options: AssetSwapOptions) -> AssetSwapPayload {
        AssetSwapPayload {
            context: options.context,
            from_pool: self.from_pool,
            to_pool: self.to_pool,
            who: self.who,
            units,
            asset_index: options.asset_index,
            min_out: options.min_out,
            escrow_amount: options.escrow_amount,
            escrow_token: options.escrow_token,
            custom_data: options.custom_data,
        }
    }

    pub fn liquidity_swap(&self, units: U256, options: LiquiditySwapOptions) -> LiquiditySwapPayload {
        LiquiditySwapPayload {
            context: options.context,
            from_pool: self.from_pool,
            to_pool: self.to_pool,
            who: self.who,
            units,
            min_out: options.min_out,
            escrow_amount: options.escrow_amount,
        }
    }

    /// Encoded asset swap.
    pub fn send_asset(&self, units: U256, options: AssetSwapOptions) -> Result<Vec<u8>, PayloadError> {
        self.asset_swap(units, options).encode()
    }

    /// Encoded liquidity swap followed by a zero two-byte length, the shape
    /// vaults emit for liquidity messages.
    pub fn send_liquidity(
        &self,
        units: U256,
        options: LiquiditySwapOptions,
    ) -> Result<Vec<u8>, PayloadError> {
        let mut bytes = self.liquidity_swap(units, options).encode()?;
        bytes.extend_from_slice(&[0, 0]);
        Ok(bytes)
    }
}

// ============ Tests ============
