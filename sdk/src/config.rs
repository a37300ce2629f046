// ============ Pool Test Config ============
// Declarative pool set loaded once per test session:
//
//   {
//     "amplification": "10**18 / 2",
//     "pools": [
//       { "tokens": [0, 1], "initBalances": ["1000 * 10**18", "1000 * 10**18"],
//         "weights": [1, 1], "name": "Pool 1", "symbol": "P1" }
//     ]
//   }

use std::fmt;
use std::path::Path;

use catalyst_math::{
    CurveKind, MathError, PoolAsset, PoolMathContext, MAX_POOL_ASSETS, U256, WAD,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::expr::{self, ExprError};

/// Pool tokens minted to the deployer when a vault is set up.
pub const INITIAL_POOL_TOKENS: u128 = WAD;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Json(#[from] serde_json::Error),
    #[error("pool {pool}: {reason}")]
    InvalidPool { pool: usize, reason: &'static str },
    #[error("expression {input:?}: {source}")]
    Expression { input: String, source: ExprError },
    #[error("amplification must be in (0, 10^18), got {0}")]
    Amplification(U256),
    #[error("amplified pools need an amplification value")]
    MissingAmplification,
    #[error(transparent)]
    Math(#[from] MathError),
}

// ============ Raw Config ============

/// Either a JSON integer or an integer expression string.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AmountExpr {
    Number(u64),
    Text(String),
}

impl AmountExpr {
    pub fn evaluate(&self) -> Result<U256, ConfigError> {
        match self {
            Self::Number(value) => Ok(U256::from(*value)),
            Self::Text(input) => evaluate_expr(input),
        }
    }
}

impl fmt::Display for AmountExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(value) => write!(f, "{}", value),
            Self::Text(input) => f.write_str(input),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawPoolConfig {
    pub tokens: Vec<usize>,
    pub init_balances: Vec<AmountExpr>,
    pub weights: Vec<u64>,
    pub name: String,
    pub symbol: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amplification: Option<AmountExpr>,
    pub pools: Vec<RawPoolConfig>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PoolType {
    Volatile,
    Amplified,
}

impl PoolType {
    /// Factory template the vault is cloned from.
    pub fn template_index(self) -> u8 {
        match self {
            Self::Volatile => 0,
            Self::Amplified => 1,
        }
    }
}

pub fn load_test_config(path: impl AsRef<Path>) -> Result<TestConfig, ConfigError> {
    let path = path.as_ref();
    debug!(path = %path.display(), "loading pool config");
    TestConfig::from_json(&std::fs::read_to_string(path)?)
}

impl TestConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn verify(&self) -> Result<(), ConfigError> {
        for (index, pool) in self.pools.iter().enumerate() {
            pool.verify(index)?;
        }
        Ok(())
    }

    /// Amplification for an amplified session. `overrides` wins over the file.
    pub fn amplification(&self, overrides: Option<&str>) -> Result<U256, ConfigError> {
        let amp = match (overrides, &self.amplification) {
            (Some(input), _) => evaluate_expr(input)?,
            (None, Some(value)) => value.evaluate()?,
            (None, None) => return Err(ConfigError::MissingAmplification),
        };
        if amp.is_zero() || amp >= U256::from(WAD) {
            return Err(ConfigError::Amplification(amp));
        }
        Ok(amp)
    }

    /// Verify and evaluate every pool. Volatile sessions ignore amplification.
    pub fn resolve(
        &self,
        pool_type: PoolType,
        amplification_override: Option<&str>,
    ) -> Result<Vec<PoolConfig>, ConfigError> {
        self.verify()?;
        let amplification = match pool_type {
            PoolType::Volatile => None,
            PoolType::Amplified => Some(self.amplification(amplification_override)?),
        };

        self.pools
            .iter()
            .map(|raw| -> Result<PoolConfig, ConfigError> {
                let init_balances = raw
                    .init_balances
                    .iter()
                    .map(AmountExpr::evaluate)
                    .collect::<Result<Vec<_>, _>>()?;
                debug!(name = %raw.name, ?init_balances, ?amplification, "resolved pool");
                Ok(PoolConfig {
                    tokens: raw.tokens.clone(),
                    init_balances,
                    weights: raw.weights.clone(),
                    name: raw.name.clone(),
                    symbol: raw.symbol.clone(),
                    amplification,
                })
            })
            .collect()
    }
}

impl RawPoolConfig {
    pub fn verify(&self, pool: usize) -> Result<(), ConfigError> {
        let invalid = |reason| Err(ConfigError::InvalidPool { pool, reason });
        if self.tokens.is_empty() || self.tokens.len() > MAX_POOL_ASSETS {
            return invalid("pools hold 1 to 3 tokens");
        }
        if self.init_balances.len() != self.tokens.len() {
            return invalid("initBalances must match tokens");
        }
        if self.weights.len() != self.tokens.len() {
            return invalid("weights must match tokens");
        }
        if self.weights.contains(&0) {
            return invalid("weights must be positive");
        }
        if self.name.is_empty() || self.symbol.is_empty() {
            return invalid("name and symbol are required");
        }
        Ok(())
    }
}

fn evaluate_expr(input: &str) -> Result<U256, ConfigError> {
    expr::evaluate(input).map_err(|source| ConfigError::Expression {
        input: input.to_string(),
        source,
    })
}

// ============ Resolved Config ============

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolConfig {
    pub tokens: Vec<usize>,
    pub init_balances: Vec<U256>,
    pub weights: Vec<u64>,
    pub name: String,
    pub symbol: String,
    pub amplification: Option<U256>,
}

impl PoolConfig {
    pub fn pool_type(&self) -> PoolType {
        match self.amplification {
            Some(_) => PoolType::Amplified,
            None => PoolType::Volatile,
        }
    }

    pub fn template_index(&self) -> u8 {
        self.pool_type().template_index()
    }

    /// Amplification handed to the factory; 10^18 when not amplified.
    pub fn deploy_amplification(&self) -> U256 {
        self.amplification.unwrap_or_else(|| U256::from(WAD))
    }

    pub fn curve(&self) -> Result<CurveKind, ConfigError> {
        Ok(CurveKind::from_wad(self.deploy_amplification())?)
    }

    /// Fresh context for a just-deployed vault.
    pub fn math_context(&self) -> Result<PoolMathContext, ConfigError> {
        let assets = self
            .init_balances
            .iter()
            .zip(&self.weights)
            .map(|(balance, weight)| PoolAsset::new(*balance, *weight))
            .collect();
        Ok(PoolMathContext::new(assets, self.curve()?)?.with_total_supply(INITIAL_POOL_TOKENS))
    }
}
