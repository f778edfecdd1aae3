use alloy::primitives::{Address, Bytes, U256};
use alloy::sol;
use alloy::sol_types::SolCall;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use super::SettlementError;

sol! {
    function mint(address to, uint256 amount) external returns (bool);
    function transfer(address to, uint256 amount) external returns (bool);
}

/// Reward token decimals.
pub const TOKEN_DECIMALS: u32 = 18;

/// `amount` in whole tokens → base units, truncating sub-wei dust.
pub fn to_token_units(amount: Decimal) -> Result<U256, SettlementError> {
    if amount <= Decimal::ZERO {
        return Err(SettlementError::InvalidAmount(amount));
    }
    let scale = Decimal::from(10u64.pow(TOKEN_DECIMALS));
    let units = amount
        .checked_mul(scale)
        .and_then(|v| v.trunc().to_u128())
        .ok_or(SettlementError::InvalidAmount(amount))?;
    if units == 0 {
        return Err(SettlementError::InvalidAmount(amount));
    }
    Ok(U256::from(units))
}

pub fn parse_address(raw: &str) -> Result<Address, SettlementError> {
    raw.trim()
        .parse::<Address>()
        .map_err(|_| SettlementError::InvalidAddress(raw.to_string()))
}

pub fn mint_calldata(to: Address, amount: U256) -> Bytes {
    mintCall { to, amount }.abi_encode().into()
}

pub fn transfer_calldata(to: Address, amount: U256) -> Bytes {
    transferCall { to, amount }.abi_encode().into()
}

#[cfg(test)]
mod tests {
    use super::*;

    const RECIPIENT: &str = "0x8502496d6739dd6e18ced318c4b5fc12a5fb2c2c";

    #[test]
    fn test_token_units_scaling() {
        let units = to_token_units(Decimal::new(15, 1)).unwrap();
        assert_eq!(units, U256::from(1_500_000_000_000_000_000u128));
    }

    #[test]
    fn test_token_units_truncates_dust() {
        // 1.0000000000000000009 → 1e18 + 0 (last digit below one wei)
        let amount = Decimal::from_str_exact("1.0000000000000000009").unwrap();
        assert_eq!(to_token_units(amount).unwrap(), U256::from(1_000_000_000_000_000_000u128));
    }

    #[test]
    fn test_token_units_rejects_non_positive() {
        assert!(matches!(
            to_token_units(Decimal::ZERO),
            Err(SettlementError::InvalidAmount(_))
        ));
        assert!(matches!(
            to_token_units(Decimal::NEGATIVE_ONE),
            Err(SettlementError::InvalidAmount(_))
        ));
        // Below one wei
        let dust = Decimal::from_str_exact("0.0000000000000000001").unwrap();
        assert!(matches!(to_token_units(dust), Err(SettlementError::InvalidAmount(_))));
    }

    #[test]
    fn test_calldata_selectors() {
        let to = parse_address(RECIPIENT).unwrap();
        let mint = mint_calldata(to, U256::from(1u8));
        let transfer = transfer_calldata(to, U256::from(1u8));

        assert_eq!(&mint[..4], &[0x40, 0xc1, 0x0f, 0x19]);
        assert_eq!(&transfer[..4], &[0xa9, 0x05, 0x9c, 0xbb]);
        // selector + two 32-byte words
        assert_eq!(mint.len(), 68);
        assert_eq!(&mint[16..36], to.as_slice());
    }

    #[test]
    fn test_parse_address_rejects_garbage() {
        assert!(parse_address(RECIPIENT).is_ok());
        assert!(matches!(
            parse_address("not-a-wallet"),
            Err(SettlementError::InvalidAddress(_))
        ));
    }
}
