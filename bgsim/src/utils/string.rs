// SPDX-License-Identifier: MIT

pub fn pretty_bytes(n: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KiB", "MiB", "GiB", "TiB"];
    let mut val = n as f64;
    let mut idx = 0usize;
    while val >= 1024.0 && idx + 1 < UNITS.len() {
        val /= 1024.0;
        idx += 1;
    }
    if idx == 0 {
        format!("{n} {}", UNITS[0])
    } else {
        format!("{val:.1} {}", UNITS[idx])
    }
}

/// Parses `"512"`, `"4K"`, `"10M"`, `"1G"` (binary multiples) into bytes.
pub fn parse_size(size: &str) -> anyhow::Result<u64> {
    let lower = size.trim().to_lowercase();
    let (num, mult) = if let Some(num) = lower.strip_suffix('k') {
        (num, 1u64 << 10)
    } else if let Some(num) = lower.strip_suffix('m') {
        (num, 1 << 20)
    } else if let Some(num) = lower.strip_suffix('g') {
        (num, 1 << 30)
    } else {
        (lower.as_str(), 1)
    };

    let value: u64 = num.trim().parse().map_err(|_| {
        anyhow::anyhow!("Invalid size '{size}'. Use a number with an optional K, M or G suffix.")
    })?;
    value
        .checked_mul(mult)
        .ok_or_else(|| anyhow::anyhow!("Size '{size}' overflows"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_size() {
        assert_eq!(parse_size("512").unwrap(), 512);
        assert_eq!(parse_size("4K").unwrap(), 4096);
        assert_eq!(parse_size(" 10m ").unwrap(), 10 * 1024 * 1024);
        assert_eq!(parse_size("1G").unwrap(), 1 << 30);
        assert!(parse_size("ten").is_err());
        assert!(parse_size("").is_err());
        assert!(parse_size("99999999999G").is_err());
    }

    #[test]
    fn test_pretty_bytes() {
        assert_eq!(pretty_bytes(1000), "1000 B");
        assert_eq!(pretty_bytes(1536), "1.5 KiB");
        assert_eq!(pretty_bytes(10 * 1024 * 1024), "10.0 MiB");
    }
}
