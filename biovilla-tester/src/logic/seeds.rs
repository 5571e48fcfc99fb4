use anyhow::{Context, Result, bail};

/// Seeds used when none are given.
pub const DEFAULT_SEEDS: [u64; 3] = [1, 42, 1337];

/// Resolve CLI seed tokens: decimal, `0x` hexadecimal, or `default` for the
/// built-in set. Duplicates are dropped, first occurrence wins.
pub fn resolve_seed_inputs(tokens: &[String]) -> Result<Vec<u64>> {
    let mut seeds: Vec<u64> = Vec::new();
    for token in tokens {
        if token.eq_ignore_ascii_case("default") {
            seeds.extend_from_slice(&DEFAULT_SEEDS);
            continue;
        }
        let seed = if let Some(hex) = token
            .strip_prefix("0x")
            .or_else(|| token.strip_prefix("0X"))
        {
            u64::from_str_radix(&hex.replace('_', ""), 16)
                .with_context(|| format!("invalid hex seed '{token}'"))?
        } else {
            token
                .replace('_', "")
                .parse::<u64>()
                .with_context(|| format!("invalid seed '{token}'"))?
        };
        seeds.push(seed);
    }
    let mut unique = Vec::with_capacity(seeds.len());
    for seed in seeds {
        if !unique.contains(&seed) {
            unique.push(seed);
        }
    }
    if unique.is_empty() {
        bail!("no seeds provided");
    }
    Ok(unique)
}
