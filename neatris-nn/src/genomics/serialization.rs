use super::{Connection, InnovationCounter, NetworkGenome, SerializationError};

use serde::{Deserialize, Serialize};

/// The JSON shape of a saved genome.
///
/// Innovation numbers, fitness and node kinds are not stored;
/// they are rebuilt when the record is loaded.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GenomeRecord {
    pub input_size: usize,
    pub output_size: usize,
    /// `[source, destination, weight, enabled]` entries, in any order.
    pub connections: Vec<Connection>,
}

impl From<&NetworkGenome> for GenomeRecord {
    fn from(genome: &NetworkGenome) -> GenomeRecord {
        GenomeRecord {
            input_size: genome.input_size(),
            output_size: genome.output_size(),
            connections: genome.connections(),
        }
    }
}

impl GenomeRecord {
    /// Rebuilds a genome, drawing fresh innovation numbers from `history`.
    pub fn into_genome(
        self,
        history: &InnovationCounter,
    ) -> Result<NetworkGenome, SerializationError> {
        Ok(NetworkGenome::new(
            &self.connections,
            self.input_size,
            self.output_size,
            history,
        )?)
    }
}

impl NetworkGenome {
    /// Serializes the genome's sizes and connections as JSON.
    ///
    /// # Examples
    /// ```
    /// use neatris_nn::genomics::{InnovationCounter, NetworkGenome};
    ///
    /// let history = InnovationCounter::new();
    /// let genome = NetworkGenome::new(&[(1, 2, 0.5, true)], 1, 1, &history).unwrap();
    /// assert_eq!(
    ///     genome.to_json().unwrap(),
    ///     r#"{"input_size":1,"output_size":1,"connections":[[1,2,0.5,true]]}"#
    /// );
    /// ```
    pub fn to_json(&self) -> Result<String, SerializationError> {
        Ok(serde_json::to_string(&GenomeRecord::from(self))?)
    }

    /// Loads a genome saved with [`to_json`](NetworkGenome::to_json).
    /// Innovation numbers are drawn from `history` in connection order.
    ///
    /// # Errors
    /// Fails if `json` is not a genome record, or if its
    /// connections don't form a valid genome.
    pub fn from_json(
        json: &str,
        history: &InnovationCounter,
    ) -> Result<NetworkGenome, SerializationError> {
        serde_json::from_str::<GenomeRecord>(json)?.into_genome(history)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genomics::ConstructionError;
    use crate::networks::FeedForwardNetwork;

    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use std::collections::BTreeSet;

    fn connection_set(genome: &NetworkGenome) -> BTreeSet<String> {
        genome
            .connections()
            .into_iter()
            .map(|c| format!("{:?}", c))
            .collect()
    }

    #[test]
    fn round_trip() {
        let history = InnovationCounter::new();
        let genome = NetworkGenome::new(
            &[(1, 5, 3.0, true), (5, 6, -3.4, false), (6, 4, 5.0, true), (3, 6, 4.0, true)],
            3,
            1,
            &history,
        )
        .unwrap();

        let json = genome.to_json().unwrap();
        let loaded = NetworkGenome::from_json(&json, &history).unwrap();

        assert_eq!(connection_set(&loaded), connection_set(&genome));
        assert_eq!(loaded.input_size(), 3);
        assert_eq!(loaded.output_size(), 1);
        // Loading draws new innovations.
        assert_eq!(loaded.max_innovation(), Some(7));
    }

    #[test]
    fn unconnected_nodes_survive_a_round_trip() {
        let history = InnovationCounter::new();
        let mut genome = NetworkGenome::empty(2, 2);
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        genome.mutate_add_connection(1.0, &history, &mut rng).unwrap();

        let loaded = NetworkGenome::from_json(&genome.to_json().unwrap(), &history).unwrap();
        let nodes = |g: &NetworkGenome| g.nodes().copied().collect::<Vec<_>>();
        assert_eq!(nodes(&loaded), nodes(&genome));

        let mut before = FeedForwardNetwork::new(&genome);
        let mut after = FeedForwardNetwork::new(&loaded);
        assert_eq!(after.output_size(), 2);
        assert_eq!(
            after.forward(&[0.3, -1.0]).unwrap(),
            before.forward(&[0.3, -1.0]).unwrap()
        );
    }

    #[test]
    fn connection_order_is_irrelevant() {
        let history = InnovationCounter::new();
        let json = r#"{
            "input_size": 2,
            "output_size": 1,
            "connections": [[2, 3, -1.0, true], [1, 3, 1.0, false]]
        }"#;
        let genome = NetworkGenome::from_json(json, &history).unwrap();
        assert_eq!(genome.connections(), vec![(1, 3, 1.0, false), (2, 3, -1.0, true)]);
    }

    #[test]
    fn rejects_malformed_input() {
        let history = InnovationCounter::new();
        assert!(matches!(
            NetworkGenome::from_json(r#"{"input_size": 2}"#, &history),
            Err(SerializationError::Json(_))
        ));
        assert!(matches!(
            NetworkGenome::from_json(
                r#"{"input_size": 1, "output_size": 1, "connections": [[2, 2, 1.0, true]]}"#,
                &history
            ),
            Err(SerializationError::Construction(ConstructionError::SelfLoop(2)))
        ));
    }
}
