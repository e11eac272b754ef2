use rust_decimal::Decimal;

use crate::errors::TrackerError;
use crate::polymarket::rpc_client::parse_hex_u64;
use crate::polymarket::types::{InvestmentLog, RpcLog};

/// Keccak256 of LogInvestmentChanged(address,address,uint256,uint256[],uint256,uint256)
pub const LOG_INVESTMENT_CHANGED_TOPIC: &str =
    "0x0fc4f57fc2348dcb424de393534db45bcb81827e1cab81bc395f155d7a81703b";

/// USDC on Polygon has 6 decimals.
pub const USDC_DECIMALS: u32 = 6;

/// Width of one ABI word in hex characters.
const WORD: usize = 64;

/// Decode one `LogInvestmentChanged` log.
///
/// Layout:
/// - topics[0] = event signature
/// - topics[1] = buyer (indexed, zero-padded)
/// - topics[2] = market (indexed, zero-padded)
/// - data = investmentAmount, offset(sharesBought), oldLiquidity, newLiquidity, sharesBought[]
///
/// Only `investmentAmount` is read from the data section. The returned
/// `timestamp` is zero; the caller fills it in from the block header.
pub fn decode_investment_log(log: &RpcLog) -> Result<InvestmentLog, TrackerError> {
    if log.topics.len() < 3 {
        return Err(TrackerError::Decode(format!(
            "expected 3 topics, got {}",
            log.topics.len()
        )));
    }
    if !log.topics[0].eq_ignore_ascii_case(LOG_INVESTMENT_CHANGED_TOPIC) {
        return Err(TrackerError::Decode(format!(
            "unexpected event signature {}",
            log.topics[0]
        )));
    }

    let buyer = extract_address(&log.topics[1]);
    let market = extract_address(&log.topics[2]);

    let data = log.data.as_deref().unwrap_or_default();
    let data = data.strip_prefix("0x").unwrap_or(data);
    if !data.is_ascii() || data.len() < 4 * WORD {
        return Err(TrackerError::Decode(format!(
            "data too short for LogInvestmentChanged ({} hex chars)",
            data.len()
        )));
    }

    let amount_usd = parse_uint256_decimal(&data[..WORD], USDC_DECIMALS).ok_or_else(|| {
        TrackerError::Decode(format!("investmentAmount not decodable: {}", &data[..WORD]))
    })?;

    let block_number = log
        .block_number
        .as_deref()
        .and_then(parse_hex_u64)
        .ok_or_else(|| TrackerError::Decode("log has no block number".into()))?;

    let tx_hash = log
        .transaction_hash
        .as_deref()
        .filter(|h| !h.is_empty())
        .ok_or_else(|| TrackerError::Decode("log has no transaction hash".into()))?;
    let log_index = log
        .log_index
        .as_deref()
        .and_then(parse_hex_u64)
        .unwrap_or_default();

    Ok(InvestmentLog {
        id: format!("{}:{}", tx_hash.to_lowercase(), log_index),
        buyer,
        market,
        amount_usd,
        block_number,
        timestamp: 0,
    })
}

/// Extract a 20-byte address from a 32-byte zero-padded hex topic.
/// Input: "0x000000000000000000000000abcdef1234567890abcdef1234567890abcdef12"
/// Output: "0xabcdef1234567890abcdef1234567890abcdef12"
pub fn extract_address(topic: &str) -> String {
    let hex = topic.strip_prefix("0x").unwrap_or(topic);
    if hex.len() < 40 || !hex.is_ascii() {
        return format!("0x{hex}").to_lowercase();
    }
    let addr = &hex[hex.len() - 40..];
    format!("0x{addr}").to_lowercase()
}

/// Parse a 64-char hex uint256 into a Decimal with the given decimal places.
/// Returns `None` for non-hex input or values beyond 96 bits.
pub fn parse_uint256_decimal(hex: &str, decimals: u32) -> Option<Decimal> {
    let digits = hex.trim_start_matches('0');
    if digits.is_empty() {
        return Some(Decimal::ZERO);
    }
    if digits.len() > 32 {
        return None;
    }
    let value = u128::from_str_radix(digits, 16).ok()?;
    let value = i128::try_from(value).ok()?;
    Decimal::try_from_i128_with_scale(value, decimals).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    const BUYER_TOPIC: &str = "0x0000000000000000000000004bfb41d5b3570defd03c39a9a4d8de6bd8b8982e";
    const MARKET_TOPIC: &str = "0x000000000000000000000000c5d563a36ae78145c45a50134d48a1215220f80a";

    fn word(value: u128) -> String {
        format!("{value:064x}")
    }

    fn make_log(amount_raw: u128) -> RpcLog {
        let data = format!(
            "0x{}{}{}{}{}",
            word(amount_raw),
            word(0x80),
            word(0),
            word(0),
            word(0)
        );
        RpcLog {
            address: Some("0x8b9805a2f595b6705e74f7310829f2d299d21522".into()),
            topics: vec![
                LOG_INVESTMENT_CHANGED_TOPIC.into(),
                BUYER_TOPIC.into(),
                MARKET_TOPIC.into(),
            ],
            data: Some(data),
            block_number: Some("0x3e8".into()),
            transaction_hash: Some("0xABC".into()),
            log_index: Some("0x2".into()),
        }
    }

    #[test]
    fn test_extract_address() {
        assert_eq!(
            extract_address(BUYER_TOPIC),
            "0x4bfb41d5b3570defd03c39a9a4d8de6bd8b8982e"
        );
    }

    #[test]
    fn test_extract_address_short() {
        assert_eq!(extract_address("0xABCD"), "0xabcd");
    }

    #[test]
    fn test_parse_uint256_decimal() {
        // 1_000_000 in hex = 0xF4240
        let hex = "00000000000000000000000000000000000000000000000000000000000f4240";
        assert_eq!(parse_uint256_decimal(hex, 6), Some(Decimal::from(1)));
    }

    #[test]
    fn test_parse_uint256_decimal_whale_amount() {
        // 60_000 USDC
        let hex = word(60_000_000_000);
        assert_eq!(parse_uint256_decimal(&hex, 6), Some(Decimal::from(60_000)));
    }

    #[test]
    fn test_parse_uint256_decimal_overflow() {
        let hex = "ffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffff";
        assert_eq!(parse_uint256_decimal(hex, 6), None);
    }

    #[test]
    fn test_decode_investment_log() {
        let decoded = decode_investment_log(&make_log(75_500_000_000)).unwrap();
        assert_eq!(decoded.id, "0xabc:2");
        assert_eq!(decoded.buyer, "0x4bfb41d5b3570defd03c39a9a4d8de6bd8b8982e");
        assert_eq!(decoded.market, "0xc5d563a36ae78145c45a50134d48a1215220f80a");
        assert_eq!(decoded.amount_usd, Decimal::from(75_500));
        assert_eq!(decoded.block_number, 1000);
    }

    #[test]
    fn test_decode_rejects_short_data() {
        let mut log = make_log(1);
        log.data = Some(format!("0x{}", word(1)));
        assert!(matches!(
            decode_investment_log(&log),
            Err(TrackerError::Decode(_))
        ));
    }

    #[test]
    fn test_decode_rejects_wrong_signature() {
        let mut log = make_log(1);
        log.topics[0] = "0xd0a08e8c493f9c94f29311604c9de1b4e8c8d4c06bd0c789af57f2d65bfec0f6".into();
        assert!(decode_investment_log(&log).is_err());
    }

    #[test]
    fn test_decode_rejects_missing_tx_hash() {
        let mut log = make_log(1);
        log.transaction_hash = None;
        assert!(decode_investment_log(&log).is_err());
    }
}
