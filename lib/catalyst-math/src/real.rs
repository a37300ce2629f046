// ============ High-Precision Real Arithmetic ============
// Signed binary fixed point on top of an arbitrary-precision integer:
//   value = mantissa / 2^FRAC_BITS
//
// The on-chain vaults evaluate log2 / pow2 in X64 fixed point. The reference
// math must be far more precise than that so that any divergence the tests see
// comes from the contracts, not from the oracle.

use core::fmt;
use core::ops::{Add, Mul, Neg, Sub};
use std::sync::LazyLock;

use num::bigint::Sign;
use num::{BigInt, Integer, One, Signed, ToPrimitive, Zero};
use primitive_types::U256;

use crate::MathError;

// ============ Constants ============

/// Fractional bits carried by every [`Real`].
pub const FRAC_BITS: usize = 256;

/// Largest power of two `exp2` will materialise (in bits).
pub const MAX_EXP2_BITS: i64 = 1 << 20;

const X64_SHIFT: usize = FRAC_BITS - 64;
const DISPLAY_DIGITS: usize = 18;

// ln(2) = 2 * atanh(1/3)
static LN2: LazyLock<BigInt> = LazyLock::new(|| ln_near_one(&(BigInt::from(2u8) << FRAC_BITS)));

// ============ Real ============

#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Real(BigInt);

impl Real {
    pub fn zero() -> Self {
        Self(BigInt::zero())
    }

    pub fn one() -> Self {
        Self(BigInt::one() << FRAC_BITS)
    }

    /// Exact conversion of an integer.
    pub fn from_int(value: impl Into<BigInt>) -> Self {
        Self(value.into() << FRAC_BITS)
    }

    /// `numerator / denominator`, truncated at `FRAC_BITS`.
    pub fn from_ratio(
        numerator: impl Into<BigInt>,
        denominator: impl Into<BigInt>,
    ) -> Result<Self, MathError> {
        let denominator = denominator.into();
        if denominator.is_zero() {
            return Err(MathError::DivisionByZero);
        }
        Ok(Self((numerator.into() << FRAC_BITS) / denominator))
    }

    /// Interpret a 256-bit word as X64 fixed point (value / 2^64).
    pub fn from_x64(value: U256) -> Self {
        Self(u256_to_big(value) << X64_SHIFT)
    }

    /// Signed X64 value, as kept by the amplified vaults' unit tracker.
    pub fn from_x64_signed(magnitude: U256, negative: bool) -> Self {
        let value = Self::from_x64(magnitude);
        if negative {
            -value
        } else {
            value
        }
    }

    /// Floor to X64 fixed point, the representation units travel in.
    pub fn to_x64(&self) -> Result<U256, MathError> {
        big_to_u256(&(&self.0 >> X64_SHIFT))
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn is_positive(&self) -> bool {
        self.0.is_positive()
    }

    pub fn is_negative(&self) -> bool {
        self.0.is_negative()
    }

    pub fn abs(&self) -> Self {
        Self(self.0.abs())
    }

    /// Largest integer not above `self`.
    pub fn floor(&self) -> BigInt {
        // Shr on BigInt rounds toward negative infinity.
        &self.0 >> FRAC_BITS
    }

    /// Smallest integer not below `self`.
    pub fn ceil(&self) -> BigInt {
        -((-&self.0) >> FRAC_BITS)
    }

    pub fn to_u256_floor(&self) -> Result<U256, MathError> {
        big_to_u256(&self.floor())
    }

    pub fn to_u256_ceil(&self) -> Result<U256, MathError> {
        big_to_u256(&self.ceil())
    }

    /// Lossy conversion for diagnostics and tolerance reports.
    pub fn to_f64(&self) -> f64 {
        let at_x64 = &self.0 >> X64_SHIFT;
        let fallback = if self.is_negative() {
            f64::NEG_INFINITY
        } else {
            f64::INFINITY
        };
        at_x64.to_f64().unwrap_or(fallback) / 2f64.powi(64)
    }

    pub fn checked_div(&self, rhs: &Real) -> Result<Real, MathError> {
        if rhs.is_zero() {
            return Err(MathError::DivisionByZero);
        }
        Ok(Self((&self.0 << FRAC_BITS) / &rhs.0))
    }

    /// Base-2 logarithm.
    pub fn log2(&self) -> Result<Real, MathError> {
        if !self.is_positive() {
            return Err(MathError::LogOfNonPositive);
        }

        // x = 2^n * y with y in [1, 2)
        let n = self.0.bits() as i64 - 1 - FRAC_BITS as i64;
        let y = if n >= 0 {
            &self.0 >> (n as usize)
        } else {
            &self.0 << ((-n) as usize)
        };

        let fraction = (ln_near_one(&y) << FRAC_BITS) / &*LN2;
        Ok(Self((BigInt::from(n) << FRAC_BITS) + fraction))
    }

    /// `2^self`.
    pub fn exp2(&self) -> Result<Real, MathError> {
        let whole = self.floor();
        let fraction = &self.0 - (&whole << FRAC_BITS);

        let whole = whole.to_i64().ok_or(MathError::OutOfRange)?;
        if whole > MAX_EXP2_BITS {
            return Err(MathError::OutOfRange);
        }
        if whole < -(2 * FRAC_BITS as i64) {
            return Ok(Self::zero());
        }

        // 2^f = e^(f * ln2), f in [0, 1)
        let t = (&fraction * &*LN2) >> FRAC_BITS;
        let mut term = BigInt::one() << FRAC_BITS;
        let mut sum = term.clone();
        let mut k = 1u32;
        loop {
            term = ((&term * &t) >> FRAC_BITS) / k;
            if term.is_zero() {
                break;
            }
            sum += &term;
            k += 1;
        }

        Ok(Self(if whole >= 0 {
            sum << (whole as usize)
        } else {
            sum >> ((-whole) as usize)
        }))
    }

    /// `self^exponent` for `self >= 0`.
    pub fn pow(&self, exponent: &Real) -> Result<Real, MathError> {
        if exponent.is_zero() {
            return Ok(Self::one());
        }
        if self.is_zero() {
            return match exponent.is_positive() {
                true => Ok(Self::zero()),
                false => Err(MathError::DivisionByZero),
            };
        }
        (exponent * &self.log2()?).exp2()
    }
}

// ============ Operators ============

impl Add<&Real> for &Real {
    type Output = Real;

    fn add(self, rhs: &Real) -> Real {
        Real(&self.0 + &rhs.0)
    }
}

impl Sub<&Real> for &Real {
    type Output = Real;

    fn sub(self, rhs: &Real) -> Real {
        Real(&self.0 - &rhs.0)
    }
}

impl Mul<&Real> for &Real {
    type Output = Real;

    fn mul(self, rhs: &Real) -> Real {
        Real((&self.0 * &rhs.0) >> FRAC_BITS)
    }
}

macro_rules! forward_owned_binop {
    ($imp:ident, $method:ident) => {
        impl $imp<Real> for Real {
            type Output = Real;

            fn $method(self, rhs: Real) -> Real {
                <&Real as $imp<&Real>>::$method(&self, &rhs)
            }
        }

        impl $imp<&Real> for Real {
            type Output = Real;

            fn $method(self, rhs: &Real) -> Real {
                <&Real as $imp<&Real>>::$method(&self, rhs)
            }
        }

        impl $imp<Real> for &Real {
            type Output = Real;

            fn $method(self, rhs: Real) -> Real {
                <&Real as $imp<&Real>>::$method(self, &rhs)
            }
        }
    };
}

forward_owned_binop!(Add, add);
forward_owned_binop!(Sub, sub);
forward_owned_binop!(Mul, mul);

impl Neg for &Real {
    type Output = Real;

    fn neg(self) -> Real {
        Real(-&self.0)
    }
}

impl Neg for Real {
    type Output = Real;

    fn neg(self) -> Real {
        Real(-self.0)
    }
}

// ============ Conversions ============

impl From<u64> for Real {
    fn from(value: u64) -> Self {
        Self::from_int(value)
    }
}

impl From<u128> for Real {
    fn from(value: u128) -> Self {
        Self::from_int(value)
    }
}

impl From<i64> for Real {
    fn from(value: i64) -> Self {
        Self::from_int(value)
    }
}

impl From<U256> for Real {
    fn from(value: U256) -> Self {
        Self::from_int(u256_to_big(value))
    }
}

impl fmt::Display for Real {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let scale = BigInt::from(10u8).pow(DISPLAY_DIGITS as u32);
        let scaled = (self.0.abs() * &scale) >> FRAC_BITS;
        let (whole, fraction) = scaled.div_rem(&scale);
        let fraction = fraction.to_string();
        let sign = if self.is_negative() { "-" } else { "" };
        write!(
            f,
            "{}{}.{}{}",
            sign,
            whole,
            "0".repeat(DISPLAY_DIGITS - fraction.len()),
            fraction
        )
    }
}

impl fmt::Debug for Real {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Real({})", self)
    }
}

// ============ U256 <-> BigInt ============

pub fn u256_to_big(value: U256) -> BigInt {
    let mut bytes = [0u8; 32];
    value.to_big_endian(&mut bytes);
    BigInt::from_bytes_be(Sign::Plus, &bytes)
}

/// Fails if the integer is negative or wider than 256 bits.
pub fn big_to_u256(value: &BigInt) -> Result<U256, MathError> {
    if value.is_negative() {
        return Err(MathError::OutOfRange);
    }
    let (_, bytes) = value.to_bytes_be();
    if bytes.len() > 32 {
        return Err(MathError::OutOfRange);
    }
    let mut padded = [0u8; 32];
    padded[32 - bytes.len()..].copy_from_slice(&bytes);
    Ok(U256::from_big_endian(&padded))
}

// ============ Series ============

// ln(y) = 2 * atanh((y - 1) / (y + 1)), converges fast for y in [1, 2].
fn ln_near_one(y: &BigInt) -> BigInt {
    let one = BigInt::one() << FRAC_BITS;
    let z = ((y - &one) << FRAC_BITS) / (y + &one);
    let z2 = (&z * &z) >> FRAC_BITS;

    let mut term = z;
    let mut sum = BigInt::zero();
    let mut k = 0u32;
    while !term.is_zero() {
        sum += &term / (2 * k + 1);
        term = (&term * &z2) >> FRAC_BITS;
        k += 1;
    }
    sum << 1
}

// ============ Tests ============
