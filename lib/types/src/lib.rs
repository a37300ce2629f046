// ============ Catalyst Wire Types ============
// Cross-chain swap messages exchanged between Catalyst vaults.
// Fixed offsets, big-endian integers, addresses right-aligned in 32-byte words.
// Low bit of the context byte picks the layout: set = liquidity swap.

use primitive_types::{H160, U256};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use primitive_types;

// ============ Context Flags ============

pub const CTX_LIQUIDITY_SWAP: u8 = 0x01;
pub const CTX_ASSET_SWAP: u8 = 0x00;

// ============ Layout ============

pub const WORD: usize = 32;
pub const ADDRESS_LEN: usize = 20;

pub const CONTEXT_OFFSET: usize = 0;
pub const FROM_POOL_OFFSET: usize = 1;
pub const TO_POOL_OFFSET: usize = 33;
pub const WHO_OFFSET: usize = 65;
pub const UNITS_OFFSET: usize = 97;

// Asset swap
pub const ASSET_INDEX_OFFSET: usize = 129;
pub const ASSET_MIN_OUT_OFFSET: usize = 130;
pub const ASSET_ESCROW_AMOUNT_OFFSET: usize = 162;
pub const ESCROW_TOKEN_OFFSET: usize = 194;
pub const CUSTOM_DATA_LENGTH_OFFSET: usize = 226;
pub const CUSTOM_DATA_TARGET_OFFSET: usize = 228;
pub const CUSTOM_DATA_OFFSET: usize = 260;

// Liquidity swap
pub const LIQUIDITY_MIN_OUT_OFFSET: usize = 129;
pub const LIQUIDITY_ESCROW_AMOUNT_OFFSET: usize = 161;

pub const ASSET_SWAP_HEADER_SIZE: usize = 228;
pub const LIQUIDITY_SWAP_SIZE: usize = 193;

// ============ Errors ============

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PayloadError {
    #[error("malformed payload: {field} needs {needed} bytes at offset {offset}, payload has {len}")]
    Malformed {
        field: &'static str,
        offset: usize,
        needed: usize,
        len: usize,
    },
    #[error("custom data length {0} is shorter than its 32-byte target")]
    CustomDataLength(u16),
    #[error("context 0x{0:02x} does not match the payload layout")]
    ContextMismatch(u8),
    #[error("custom data of {0} bytes does not fit the 16-bit length field")]
    CustomDataTooLarge(usize),
    #[error("empty payload")]
    EmptyPayload,
    #[error("invalid hex: {0}")]
    Hex(#[from] hex::FromHexError),
}

pub fn is_liquidity_context(context: u8) -> bool {
    context & CTX_LIQUIDITY_SWAP != 0
}

// ============ Asset Swap ============

/// Call made on the destination chain after the swap settles.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomData {
    pub target: H160,
    #[serde(with = "hex_bytes")]
    pub data: Vec<u8>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetSwapPayload {
    pub context: u8,
    pub from_pool: H160,
    pub to_pool: H160,
    pub who: H160,
    pub units: U256,
    pub asset_index: u8,
    pub min_out: U256,
    pub escrow_amount: U256,
    pub escrow_token: H160,
    pub custom_data: Option<CustomData>,
}

impl AssetSwapPayload {
    /// Value of the two-byte length field: target plus data, or zero.
    pub fn custom_data_length(&self) -> Result<u16, PayloadError> {
        match &self.custom_data {
            None => Ok(0),
            Some(custom) => {
                let length = WORD + custom.data.len();
                u16::try_from(length).map_err(|_| PayloadError::CustomDataTooLarge(custom.data.len()))
            }
        }
    }

    pub fn encoded_len(&self) -> usize {
        ASSET_SWAP_HEADER_SIZE
            + self
                .custom_data
                .as_ref()
                .map_or(0, |custom| WORD + custom.data.len())
    }

    pub fn encode(&self) -> Result<Vec<u8>, PayloadError> {
        if is_liquidity_context(self.context) {
            return Err(PayloadError::ContextMismatch(self.context));
        }
        let custom_data_length = self.custom_data_length()?;

        let mut buf = vec![0u8; self.encoded_len()];
        buf[CONTEXT_OFFSET] = self.context;
        write_address(&mut buf, FROM_POOL_OFFSET, &self.from_pool);
        write_address(&mut buf, TO_POOL_OFFSET, &self.to_pool);
        write_address(&mut buf, WHO_OFFSET, &self.who);
        write_u256(&mut buf, UNITS_OFFSET, &self.units);
        buf[ASSET_INDEX_OFFSET] = self.asset_index;
        write_u256(&mut buf, ASSET_MIN_OUT_OFFSET, &self.min_out);
        write_u256(&mut buf, ASSET_ESCROW_AMOUNT_OFFSET, &self.escrow_amount);
        write_address(&mut buf, ESCROW_TOKEN_OFFSET, &self.escrow_token);
        buf[CUSTOM_DATA_LENGTH_OFFSET..CUSTOM_DATA_LENGTH_OFFSET + 2]
            .copy_from_slice(&custom_data_length.to_be_bytes());

        if let Some(custom) = &self.custom_data {
            write_address(&mut buf, CUSTOM_DATA_TARGET_OFFSET, &custom.target);
            buf[CUSTOM_DATA_OFFSET..].copy_from_slice(&custom.data);
        }

        Ok(buf)
    }

    pub fn decode(data: &[u8]) -> Result<Self, PayloadError> {
        let context = read_context(data)?;
        if is_liquidity_context(context) {
            return Err(PayloadError::ContextMismatch(context));
        }

        let length_bytes = read(data, "custom_data_length", CUSTOM_DATA_LENGTH_OFFSET, 2)?;
        let custom_data_length = u16::from_be_bytes([length_bytes[0], length_bytes[1]]);

        let custom_data = match custom_data_length {
            0 => None,
            length if (length as usize) < WORD => {
                return Err(PayloadError::CustomDataLength(length));
            }
            length => Some(CustomData {
                target: read_address(data, "custom_data_target", CUSTOM_DATA_TARGET_OFFSET)?,
                data: read(data, "custom_data", CUSTOM_DATA_OFFSET, length as usize - WORD)?
                    .to_vec(),
            }),
        };

        Ok(Self {
            context,
            from_pool: read_address(data, "from_pool", FROM_POOL_OFFSET)?,
            to_pool: read_address(data, "to_pool", TO_POOL_OFFSET)?,
            who: read_address(data, "who", WHO_OFFSET)?,
            units: read_u256(data, "units", UNITS_OFFSET)?,
            asset_index: read(data, "asset_index", ASSET_INDEX_OFFSET, 1)?[0],
            min_out: read_u256(data, "min_out", ASSET_MIN_OUT_OFFSET)?,
            escrow_amount: read_u256(data, "escrow_amount", ASSET_ESCROW_AMOUNT_OFFSET)?,
            escrow_token: read_address(data, "escrow_token", ESCROW_TOKEN_OFFSET)?,
            custom_data,
        })
    }
}

// ============ Liquidity Swap ============

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiquiditySwapPayload {
    pub context: u8,
    pub from_pool: H160,
    pub to_pool: H160,
    pub who: H160,
    pub units: U256,
    pub min_out: U256,
    pub escrow_amount: U256,
}

impl Default for LiquiditySwapPayload {
    fn default() -> Self {
        Self {
            context: CTX_LIQUIDITY_SWAP,
            from_pool: H160::zero(),
            to_pool: H160::zero(),
            who: H160::zero(),
            units: U256::zero(),
            min_out: U256::zero(),
            escrow_amount: U256::zero(),
        }
    }
}

impl LiquiditySwapPayload {
    pub fn encode(&self) -> Result<Vec<u8>, PayloadError> {
        if !is_liquidity_context(self.context) {
            return Err(PayloadError::ContextMismatch(self.context));
        }

        let mut buf = vec![0u8; LIQUIDITY_SWAP_SIZE];
        buf[CONTEXT_OFFSET] = self.context;
        write_address(&mut buf, FROM_POOL_OFFSET, &self.from_pool);
        write_address(&mut buf, TO_POOL_OFFSET, &self.to_pool);
        write_address(&mut buf, WHO_OFFSET, &self.who);
        write_u256(&mut buf, UNITS_OFFSET, &self.units);
        write_u256(&mut buf, LIQUIDITY_MIN_OUT_OFFSET, &self.min_out);
        write_u256(&mut buf, LIQUIDITY_ESCROW_AMOUNT_OFFSET, &self.escrow_amount);
        Ok(buf)
    }

    /// Bytes past the fixed layout are ignored.
    pub fn decode(data: &[u8]) -> Result<Self, PayloadError> {
        let context = read_context(data)?;
        if !is_liquidity_context(context) {
            return Err(PayloadError::ContextMismatch(context));
        }

        Ok(Self {
            context,
            from_pool: read_address(data, "from_pool", FROM_POOL_OFFSET)?,
            to_pool: read_address(data, "to_pool", TO_POOL_OFFSET)?,
            who: read_address(data, "who", WHO_OFFSET)?,
            units: read_u256(data, "units", UNITS_OFFSET)?,
            min_out: read_u256(data, "min_out", LIQUIDITY_MIN_OUT_OFFSET)?,
            escrow_amount: read_u256(data, "escrow_amount", LIQUIDITY_ESCROW_AMOUNT_OFFSET)?,
        })
    }
}

// ============ Payload ============

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Payload {
    AssetSwap(AssetSwapPayload),
    LiquiditySwap(LiquiditySwapPayload),
}

impl Payload {
    pub fn decode(data: &[u8]) -> Result<Self, PayloadError> {
        if is_liquidity_context(read_context(data)?) {
            LiquiditySwapPayload::decode(data).map(Self::LiquiditySwap)
        } else {
            AssetSwapPayload::decode(data).map(Self::AssetSwap)
        }
    }

    pub fn encode(&self) -> Result<Vec<u8>, PayloadError> {
        match self {
            Self::AssetSwap(payload) => payload.encode(),
            Self::LiquiditySwap(payload) => payload.encode(),
        }
    }

    pub fn context(&self) -> u8 {
        match self {
            Self::AssetSwap(payload) => payload.context,
            Self::LiquiditySwap(payload) => payload.context,
        }
    }

    pub fn units(&self) -> U256 {
        match self {
            Self::AssetSwap(payload) => payload.units,
            Self::LiquiditySwap(payload) => payload.units,
        }
    }

    pub fn to_hex(&self) -> Result<String, PayloadError> {
        Ok(to_hex(&self.encode()?))
    }

    pub fn from_hex(s: &str) -> Result<Self, PayloadError> {
        Self::decode(&from_hex(s)?)
    }
}

// ============ Hex ============

pub fn to_hex(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}

/// Accepts input with or without a `0x` prefix.
pub fn from_hex(s: &str) -> Result<Vec<u8>, PayloadError> {
    let s = s.trim();
    let digits = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s);
    Ok(hex::decode(digits)?)
}

mod hex_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::to_hex(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        super::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

// ============ Field Access ============

fn read<'a>(
    data: &'a [u8],
    field: &'static str,
    offset: usize,
    needed: usize,
) -> Result<&'a [u8], PayloadError> {
    data.get(offset..offset + needed)
        .ok_or(PayloadError::Malformed {
            field,
            offset,
            needed,
            len: data.len(),
        })
}

fn read_context(data: &[u8]) -> Result<u8, PayloadError> {
    data.first().copied().ok_or(PayloadError::EmptyPayload)
}

fn read_u256(data: &[u8], field: &'static str, offset: usize) -> Result<U256, PayloadError> {
    Ok(U256::from_big_endian(read(data, field, offset, WORD)?))
}

/// Low 20 bytes of the word; the high 12 are not checked.
fn read_address(data: &[u8], field: &'static str, offset: usize) -> Result<H160, PayloadError> {
    let word = read(data, field, offset, WORD)?;
    Ok(H160::from_slice(&word[WORD - ADDRESS_LEN..]))
}

fn write_u256(buf: &mut [u8], offset: usize, value: &U256) {
    value.to_big_endian(&mut buf[offset..offset + WORD]);
}

fn write_address(buf: &mut [u8], offset: usize, address: &H160) {
    buf[offset..offset + WORD - ADDRESS_LEN].fill(0);
    buf[offset + WORD - ADDRESS_LEN..offset + WORD].copy_from_slice(address.as_bytes());
}

// ============ Tests ============
