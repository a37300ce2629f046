// ============ Catalyst Adversarial Tests ============
// Hostile or broken input at every seam: truncated and forged payloads,
// degenerate pools, bad configs and a relay peer that goes away.
//
// Every case must surface as an error value. Nothing here may panic.

use catalyst_math::liquidity_math::{balance_0, expected_liquidity_swap, invariant};
use catalyst_math::swap_math::{expected_swap, output_for_units};
use catalyst_math::{CurveKind, MathError, PoolAsset, PoolMathContext, Real, ONE_X64, U256, WAD};
use catalyst_sdk::config::{ConfigError, PoolType, TestConfig};
use catalyst_sdk::expr::{self, ExprError};
use catalyst_sdk::relay::{self, link_pair, ChainLink, RelayError, RelayMessage};
use catalyst_sdk::tolerance::check_relative_error;
use catalyst_sdk::{
    AssetSwapOptions, LiquiditySwapOptions, Payload, PayloadBuilder, PayloadError, H160,
};
use catalyst_types::{
    AssetSwapPayload, CustomData, LiquiditySwapPayload, ASSET_SWAP_HEADER_SIZE,
    CUSTOM_DATA_LENGTH_OFFSET, LIQUIDITY_SWAP_SIZE,
};

// ============ Helpers ============

fn builder() -> PayloadBuilder {
    PayloadBuilder::new(
        H160::repeat_byte(0x11),
        H160::repeat_byte(0x22),
        H160::repeat_byte(0x33),
    )
}

fn asset_swap_with_custom_data() -> Vec<u8> {
    builder()
        .send_asset(
            U256::from(ONE_X64),
            AssetSwapOptions {
                custom_data: Some(CustomData {
                    target: H160::repeat_byte(0x44),
                    data: vec![0xab; 17],
                }),
                ..Default::default()
            },
        )
        .unwrap()
}

fn u(value: u128) -> U256 {
    U256::from(value)
}

// ============ Payload Truncation ============

#[test]
fn test_every_truncated_asset_swap_is_rejected() {
    let bytes = asset_swap_with_custom_data();
    for len in 0..bytes.len() {
        let result = Payload::decode(&bytes[..len]);
        match (len, result) {
            (0, Err(PayloadError::EmptyPayload)) => {}
            (_, Err(PayloadError::Malformed { len: reported, .. })) => assert_eq!(reported, len),
            (_, other) => panic!("prefix of {} bytes decoded to {:?}", len, other),
        }
    }
    assert!(Payload::decode(&bytes).is_ok());
}

#[test]
fn test_every_truncated_liquidity_swap_is_rejected() {
    let bytes = builder()
        .send_liquidity(U256::from(5u64), LiquiditySwapOptions::default())
        .unwrap();
    for len in 1..LIQUIDITY_SWAP_SIZE {
        assert!(
            matches!(
                Payload::decode(&bytes[..len]),
                Err(PayloadError::Malformed { .. })
            ),
            "prefix of {} bytes",
            len
        );
    }
    assert!(Payload::decode(&bytes[..LIQUIDITY_SWAP_SIZE]).is_ok());
}

#[test]
fn test_truncation_reports_the_missing_field() {
    let bytes = asset_swap_with_custom_data();
    // Header intact, custom data cut short.
    let err = Payload::decode(&bytes[..ASSET_SWAP_HEADER_SIZE + 40]).unwrap_err();
    assert_eq!(
        err,
        PayloadError::Malformed {
            field: "custom_data",
            offset: 260,
            needed: 17,
            len: ASSET_SWAP_HEADER_SIZE + 40,
        }
    );
}

// ============ Forged Payloads ============

#[test]
fn test_custom_data_length_below_target_size() {
    let mut bytes = builder()
        .send_asset(U256::one(), AssetSwapOptions::default())
        .unwrap();
    for length in [1u16, 20, 31] {
        bytes[CUSTOM_DATA_LENGTH_OFFSET..CUSTOM_DATA_LENGTH_OFFSET + 2]
            .copy_from_slice(&length.to_be_bytes());
        assert_eq!(
            AssetSwapPayload::decode(&bytes),
            Err(PayloadError::CustomDataLength(length))
        );
    }
}

#[test]
fn test_custom_data_length_past_end() {
    let mut bytes = asset_swap_with_custom_data();
    bytes[CUSTOM_DATA_LENGTH_OFFSET..CUSTOM_DATA_LENGTH_OFFSET + 2]
        .copy_from_slice(&u16::MAX.to_be_bytes());
    assert!(matches!(
        AssetSwapPayload::decode(&bytes),
        Err(PayloadError::Malformed { field: "custom_data", .. })
    ));
}

#[test]
fn test_oversized_custom_data_refused_on_encode() {
    let payload = AssetSwapPayload {
        custom_data: Some(CustomData {
            target: H160::zero(),
            data: vec![0; u16::MAX as usize],
        }),
        ..Default::default()
    };
    assert_eq!(
        payload.encode(),
        Err(PayloadError::CustomDataTooLarge(u16::MAX as usize))
    );
}

#[test]
fn test_context_mismatch_both_ways() {
    let liquidity = builder()
        .send_liquidity(U256::one(), LiquiditySwapOptions::default())
        .unwrap();
    assert_eq!(
        AssetSwapPayload::decode(&liquidity),
        Err(PayloadError::ContextMismatch(0x01))
    );

    let asset = builder()
        .send_asset(U256::one(), AssetSwapOptions::default())
        .unwrap();
    assert_eq!(
        LiquiditySwapPayload::decode(&asset),
        Err(PayloadError::ContextMismatch(0x00))
    );

    // A liquidity context on the asset layout cannot be built.
    let options = AssetSwapOptions {
        context: 0x03,
        ..Default::default()
    };
    assert_eq!(
        builder().send_asset(U256::one(), options),
        Err(PayloadError::ContextMismatch(0x03))
    );
}

#[test]
fn test_flipped_context_bit_changes_layout() {
    // Same bytes, liquidity bit set: decoded under the shorter layout.
    let mut bytes = asset_swap_with_custom_data();
    bytes[0] |= 0x01;
    let Payload::LiquiditySwap(decoded) = Payload::decode(&bytes).unwrap() else {
        panic!("expected the liquidity layout");
    };
    assert_eq!(decoded.units, U256::from(ONE_X64));
    assert_eq!(decoded.from_pool, H160::repeat_byte(0x11));
}

#[test]
fn test_bad_hex_rejected() {
    assert!(matches!(Payload::from_hex("0xzz"), Err(PayloadError::Hex(_))));
    assert!(matches!(Payload::from_hex("0x123"), Err(PayloadError::Hex(_))));
    assert_eq!(Payload::from_hex("0x"), Err(PayloadError::EmptyPayload));
}

// ============ Degenerate Pools ============

#[test]
fn test_zero_balance_and_weight_rejected() {
    let curve = CurveKind::ConstantProduct;
    assert_eq!(
        expected_swap(u(1), U256::zero(), u(1), u(1), u(1), &curve),
        Err(MathError::InvalidInput("balance must be positive"))
    );
    assert_eq!(
        expected_swap(u(1), u(1), U256::zero(), u(1), u(1), &curve),
        Err(MathError::InvalidInput("balance must be positive"))
    );
    assert_eq!(
        expected_swap(u(1), u(1), u(1), U256::zero(), u(1), &curve),
        Err(MathError::InvalidInput("weight must be positive"))
    );
    assert_eq!(
        PoolMathContext::new(vec![PoolAsset::new(5u64, 0u64)], curve),
        Err(MathError::InvalidInput("weight must be positive"))
    );
}

#[test]
fn test_amplification_out_of_range() {
    assert!(CurveKind::from_x64(U256::zero()).is_err());
    assert!(CurveKind::from_x64(u(ONE_X64 + 1)).is_err());
    assert!(CurveKind::from_wad(u(WAD * 2)).is_err());
    assert!(CurveKind::amplified(-Real::from_ratio(1, 2).unwrap()).is_err());
}

#[test]
fn test_negative_units_rejected() {
    let units = -Real::one();
    assert_eq!(
        output_for_units(&units, u(100), u(1), &CurveKind::ConstantProduct),
        Err(MathError::InvalidInput("units must be non-negative"))
    );
}

#[test]
fn test_share_at_or_above_supply() {
    let pool = PoolMathContext::new(vec![PoolAsset::new(100u64, 1u64)], CurveKind::ConstantProduct)
        .unwrap()
        .with_total_supply(1_000u64);
    for share in [1_000u64, 1_001, u64::MAX] {
        assert_eq!(
            expected_liquidity_swap(U256::from(share), &pool, &pool),
            Err(MathError::InvalidInput("share exceeds total supply"))
        );
    }
}

#[test]
fn test_amplified_liquidity_into_volatile_pool() {
    let amplified = PoolMathContext::new(
        vec![PoolAsset::new(100u64, 1u64)],
        CurveKind::from_x64(u(ONE_X64 / 2)).unwrap(),
    )
    .unwrap()
    .with_total_supply(1_000u64);
    let volatile = PoolMathContext::new(vec![PoolAsset::new(100u64, 1u64)], CurveKind::ConstantProduct)
        .unwrap()
        .with_total_supply(1_000u64);
    assert_eq!(
        expected_liquidity_swap(u(10), &amplified, &volatile),
        Err(MathError::InvalidInput("destination pool is not amplified"))
    );
    assert!(balance_0(&volatile).is_err());
}

#[test]
fn test_unit_tracker_beyond_invariant() {
    let pool = PoolMathContext::new(
        vec![PoolAsset::new(100u64, 1u64)],
        CurveKind::from_x64(u(ONE_X64 / 2)).unwrap(),
    )
    .unwrap();
    // Invariant is sqrt(100) = 10.
    let drained = pool.with_unit_tracker(Real::from(11u64));
    assert_eq!(
        balance_0(&drained),
        Err(MathError::InvalidInput("unit tracker exceeds invariant"))
    );
}

#[test]
fn test_invariant_refuses_huge_exponents() {
    let pool = PoolMathContext::new(
        vec![PoolAsset::new(U256::MAX, U256::from(u64::MAX))],
        CurveKind::ConstantProduct,
    )
    .unwrap();
    assert!(invariant(&pool).is_err());

    let pool = PoolMathContext::new(
        vec![PoolAsset::new(U256::from(3u64), U256::MAX)],
        CurveKind::ConstantProduct,
    )
    .unwrap();
    assert_eq!(invariant(&pool), Err(MathError::InvalidInput("weight too large")));
}

// ============ Config and Expressions ============

#[test]
fn test_expression_overflow_and_garbage() {
    assert!(matches!(expr::evaluate("2**256"), Err(ExprError::Overflow { .. })));
    assert!(matches!(expr::evaluate("10**18 * 10**60"), Err(ExprError::Overflow { .. })));
    assert!(matches!(expr::evaluate("1 - 2"), Err(ExprError::Negative { .. })));
    assert!(matches!(expr::evaluate("5 / 0"), Err(ExprError::DivisionByZero { .. })));
    assert!(matches!(expr::evaluate("7 $ 3"), Err(ExprError::UnexpectedChar { ch: '$', .. })));
    assert!(matches!(expr::evaluate("(1 + 2"), Err(ExprError::Expected { .. })));
    assert!(matches!(expr::evaluate("1 2"), Err(ExprError::TrailingInput { .. })));
    assert!(expr::evaluate("").is_err());
}

#[test]
fn test_config_with_four_tokens() {
    let json = r#"{
        "pools": [{
            "tokens": [0, 1, 2, 3],
            "initBalances": [1, 1, 1, 1],
            "weights": [1, 1, 1, 1],
            "name": "Too wide",
            "symbol": "TW"
        }]
    }"#;
    let config = TestConfig::from_json(json).unwrap();
    assert!(matches!(
        config.resolve(PoolType::Volatile, None),
        Err(ConfigError::InvalidPool { pool: 0, .. })
    ));
}

#[test]
fn test_config_bad_balance_expression() {
    let json = r#"{
        "pools": [{
            "tokens": [0],
            "initBalances": ["10**"],
            "weights": [1],
            "name": "Broken",
            "symbol": "BR"
        }]
    }"#;
    let config = TestConfig::from_json(json).unwrap();
    assert!(matches!(
        config.resolve(PoolType::Volatile, None),
        Err(ConfigError::Expression { .. })
    ));
}

#[test]
fn test_config_amplification_bounds() {
    let json = r#"{
        "pools": [{
            "tokens": [0],
            "initBalances": [1000],
            "weights": [1],
            "name": "Stable",
            "symbol": "ST"
        }]
    }"#;
    let config = TestConfig::from_json(json).unwrap();
    assert!(matches!(
        config.resolve(PoolType::Amplified, None),
        Err(ConfigError::MissingAmplification)
    ));
    for bad in ["0", "10**18", "10**18 + 1"] {
        assert!(matches!(
            config.resolve(PoolType::Amplified, Some(bad)),
            Err(ConfigError::Amplification(_))
        ));
    }
    // Volatile sessions never look at it.
    assert!(config.resolve(PoolType::Volatile, Some("0")).is_ok());
}

#[test]
fn test_config_not_json() {
    assert!(matches!(
        TestConfig::from_json("pools: []"),
        Err(ConfigError::Json(_))
    ));
}

// ============ Relay ============

#[test]
fn test_relay_peer_hangs_up() {
    let (a, b) = link_pair("a", "b");
    drop(b);
    assert!(matches!(a.send(&RelayMessage::Done), Err(RelayError::Disconnected)));
    assert!(matches!(a.recv(), Err(RelayError::Disconnected)));
}

#[test]
fn test_relay_wrong_message_kind() {
    let result = relay::simulate(
        ("a", |link: ChainLink| link.send(&RelayMessage::Done)),
        ("b", |link: ChainLink| link.recv_payload()),
    );
    assert!(matches!(
        result,
        Err(RelayError::UnexpectedMessage { expected: "payload", .. })
    ));
}

#[test]
fn test_relay_forged_payload_hex() {
    let result = relay::simulate(
        ("a", |link: ChainLink| {
            link.send(&RelayMessage::Payload {
                hex: "0x0000".to_string(),
            })
        }),
        ("b", |link: ChainLink| link.recv_payload()),
    );
    assert!(matches!(
        result,
        Err(RelayError::Payload(PayloadError::Malformed { .. }))
    ));
}

#[test]
fn test_tolerance_flags_overpayment() {
    // A vault paying 1% more than the oracle allows is caught.
    let err = check_relative_error(101.0, 100.0, -1e-9, 1e-9, Some("overpay")).unwrap_err();
    assert!(err.to_string().contains("ERR: overpay"));
}
