//! Hex loading utilities

use std::{fs, io::Read};

use alloy_primitives::{hex, Bytes};

use super::{McallError, Result};

/// Load hex-encoded bytes from an argument or a file. If the file is a dash (-), read from stdin.
/// Priority: arg > file. Returns `None` if neither is provided.
pub fn load_hex(arg: Option<&str>, file: Option<&str>) -> Result<Option<Bytes>> {
    let hex_string = if let Some(arg) = arg {
        arg.to_string()
    } else if let Some(file) = file {
        if file == "-" {
            let mut buffer = String::new();
            std::io::stdin().read_to_string(&mut buffer)?;
            buffer
        } else {
            fs::read_to_string(file)?
        }
    } else {
        return Ok(None);
    };

    decode_hex(&hex_string).map(|bytes| Some(Bytes::from(bytes)))
}

/// Decode hex string, handling optional 0x prefix
pub fn decode_hex(s: &str) -> Result<Vec<u8>> {
    let s = s.trim();
    let hex_str = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")).unwrap_or(s);

    if hex_str.len() % 2 != 0 {
        return Err(McallError::InvalidInput(format!(
            "Invalid hex string length: {} (must be even)",
            hex_str.len()
        )));
    }

    Ok(hex::decode(hex_str)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_hex() {
        assert_eq!(decode_hex("0xc0ffee").unwrap(), [0xc0, 0xff, 0xee]);
        assert_eq!(decode_hex(" C0FFEE\n").unwrap(), [0xc0, 0xff, 0xee]);
        assert!(decode_hex("").unwrap().is_empty());
        assert!(matches!(decode_hex("0xabc"), Err(McallError::InvalidInput(_))));
        assert!(matches!(decode_hex("0xzz"), Err(McallError::InvalidHex(_))));
    }

    #[test]
    fn test_load_hex_priority() {
        let loaded = load_hex(Some("0x01"), Some("/nonexistent")).unwrap();
        assert_eq!(loaded, Some(Bytes::from_static(&[1])));
        assert_eq!(load_hex(None, None).unwrap(), None);
    }
}
