//! Record id generation.

use chrono::Utc;

const SUFFIX_LEN: usize = 9;
const ALPHABET: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// `"<prefix>-<unix millis>-<9 random base36 chars>"`.
pub fn generate_id(prefix: &str) -> String {
    format!(
        "{}-{}-{}",
        prefix,
        Utc::now().timestamp_millis(),
        random_suffix()
    )
}

/// `"<prefix>-<n>"`, used for seed records.
pub fn counter_id(prefix: &str, n: usize) -> String {
    format!("{}-{}", prefix, n)
}

fn random_suffix() -> String {
    let mut value = uuid::Uuid::new_v4().as_u128();
    let mut out = String::with_capacity(SUFFIX_LEN);
    for _ in 0..SUFFIX_LEN {
        out.push(ALPHABET[(value % 36) as usize] as char);
        value /= 36;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_id_shape() {
        let id = generate_id("don");
        let parts: Vec<&str> = id.split('-').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "don");
        assert!(parts[1].parse::<i64>().is_ok());
        assert_eq!(parts[2].len(), SUFFIX_LEN);
        assert!(parts[2].chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_generated_ids_differ() {
        assert_ne!(generate_id("pet"), generate_id("pet"));
    }

    #[test]
    fn test_counter_id() {
        assert_eq!(counter_id("vol", 3), "vol-3");
    }
}
