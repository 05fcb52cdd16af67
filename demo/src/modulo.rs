//! The baseline consistent hashing replaces: `hash(key) % N`.
//!
//! Only the demo uses this, to show how much data a resize would move
//! without a ring. Same digest as the ring so the comparison is fair.

use ring::position;

pub struct ModuloHash {
    nodes: Vec<String>,
}

impl ModuloHash {
    pub fn new<I, S>(nodes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            nodes: nodes.into_iter().map(Into::into).collect(),
        }
    }

    pub fn add_node(&mut self, node: &str) {
        if !self.nodes.iter().any(|n| n == node) {
            self.nodes.push(node.to_owned());
        }
    }

    pub fn remove_node(&mut self, node: &str) {
        self.nodes.retain(|n| n != node);
    }

    pub fn get_node(&self, key: &str) -> Option<&str> {
        if self.nodes.is_empty() {
            return None;
        }
        let index = (position(key) % self.nodes.len() as u128) as usize;
        Some(self.nodes[index].as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resize_remaps_almost_everything() {
        let mut hasher = ModuloHash::new((0..4).map(|i| format!("node-{i}")));

        let keys: Vec<String> = (0..2000).map(|i| format!("user_{i}")).collect();
        let before: Vec<String> = keys
            .iter()
            .map(|k| hasher.get_node(k).unwrap().to_owned())
            .collect();

        hasher.add_node("node-4");

        let moved = keys
            .iter()
            .zip(&before)
            .filter(|(k, old)| hasher.get_node(k).unwrap() != old.as_str())
            .count();
        let fraction = moved as f64 / keys.len() as f64;

        // Going from N to N+1 buckets strands ~N/(N+1) of all keys. This is
        // the whole reason the ring exists.
        assert!(
            fraction > 0.6,
            "modulo hashing moved only {fraction:.3} of keys?"
        );
    }

    #[test]
    fn empty_hasher_routes_nowhere() {
        let mut hasher = ModuloHash::new(["node-0"]);
        hasher.remove_node("node-0");
        assert_eq!(hasher.get_node("user_42"), None);
    }
}
