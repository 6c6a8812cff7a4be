pub mod markup;

use rand::Rng;
use uuid::Uuid;

use crate::db_types::OrderId;

/// Generates the correlation token attached to every provider submission. Unique per
/// submission attempt; the provider echoes it back in status reports.
pub fn new_correlation_id() -> String {
    Uuid::new_v4().to_string()
}

/// Generates a short 5-digit id for local orders and deposit requests. Uniqueness is
/// enforced by the UNIQUE column constraint; callers retry on collision.
pub fn new_short_id() -> OrderId {
    let n = rand::thread_rng().gen_range(10_000..=99_999);
    OrderId(n.to_string())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn short_ids_are_five_digits() {
        for _ in 0..100 {
            let id = new_short_id();
            assert_eq!(id.as_str().len(), 5);
            assert!(id.as_str().parse::<u32>().is_ok());
        }
    }

    #[test]
    fn correlation_ids_are_unique() {
        let a = new_correlation_id();
        let b = new_correlation_id();
        assert_ne!(a, b);
    }
}
