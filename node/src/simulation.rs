//! The discrete-event simulation driver.
//!
//! Single-threaded cooperative stepping: each tick the network delivers
//! everything due, in deterministic order, then every node reacts to its
//! deliveries in node-id order. Messages produced by reactions are handed
//! back to the network in that same order, consuming randomness from the one
//! seeded generator in program order. Nothing else in the loop is random, so
//! a (seed, config) pair fully determines the run.

use std::{
    collections::{BTreeMap, VecDeque},
    fmt::{self, Display, Formatter},
};

use itertools::Itertools;
use rand::SeedableRng;
use serde::Serialize;
use tracing::{debug, error, info, warn};

use chainsim_hashing::Digest;

use crate::{
    components::{
        consensus::{Payload, ProtocolOutcome, ProtocolOutcomes, Validator, ValidatorRegistry},
        network::{MessageKind, NetworkSimulator},
    },
    config::{Config, ConfigError},
    crypto::SecretKey,
    event::{EventKind, EventLog},
    types::{NodeId, NodeRng, Timestamp, Transaction},
};

/// A pending local delivery: (recipient, original sender, payload).
type LocalDelivery = (NodeId, NodeId, Payload);

/// A full simulation run: the network, the validators and the event log.
pub struct Simulation {
    config: Config,
    registry: ValidatorRegistry,
    rng: NodeRng,
    network: NetworkSimulator<Payload>,
    validators: BTreeMap<NodeId, Validator>,
    events: EventLog,
    now: Timestamp,
    /// First height each stalled node got stuck at.
    stalled: BTreeMap<NodeId, u64>,
}

impl Simulation {
    /// Validates the configuration and sets up nodes, keys and transactions.
    ///
    /// Everything is derived from the configured seed in a fixed order:
    /// validator keys in node-id order first, then one account key per
    /// transaction.
    pub fn new(config: Config) -> Result<Self, ConfigError> {
        config.validate()?;
        let mut rng = NodeRng::seed_from_u64(config.seed);
        let mut events = EventLog::new();

        let mut secret_keys: BTreeMap<NodeId, SecretKey> = BTreeMap::new();
        for id in 0..config.num_nodes {
            secret_keys.insert(NodeId(id), SecretKey::generate(&mut rng));
        }
        let registry = ValidatorRegistry::new(
            config.chain_id.clone(),
            secret_keys
                .iter()
                .map(|(node_id, key)| (*node_id, key.public_key())),
        );
        let mut validators: BTreeMap<NodeId, Validator> = secret_keys
            .into_iter()
            .map(|(node_id, key)| (node_id, Validator::new(node_id, registry.clone(), key)))
            .collect();

        // Transactions are signed by freshly generated account keys and
        // distributed round-robin over the nodes' pending pools.
        for index in 0..config.num_transactions {
            let account_key = SecretKey::generate(&mut rng);
            let sender = format!("user{}", index);
            let key = format!("user{}/balance", index);
            let value = ((u64::from(index) + 1) * 100).to_string();
            let transaction =
                Transaction::new(sender.clone(), key.clone(), value, &account_key, &config.chain_id);
            events.record(
                Timestamp::zero(),
                EventKind::TransactionCreated { sender, key },
            );
            let target = NodeId((index % u32::from(config.num_nodes)) as u8);
            validators
                .get_mut(&target)
                .expect("round-robin target must be a registered node")
                .add_transaction(transaction);
        }

        let network = NetworkSimulator::new(config.network.clone(), registry.ids().to_vec());

        Ok(Simulation {
            config,
            registry,
            rng,
            network,
            validators,
            events,
            now: Timestamp::zero(),
            stalled: BTreeMap::new(),
        })
    }

    /// Deterministic fault injection: force-drops all future deliveries of
    /// `kind` addressed to `recipient`.
    pub fn block_deliveries(&mut self, kind: MessageKind, recipient: NodeId) {
        self.network.block_deliveries(kind, recipient);
    }

    /// The event log recorded so far.
    pub fn events(&self) -> &EventLog {
        &self.events
    }

    /// Runs the configured number of heights and returns the summary.
    pub fn run(&mut self) -> SimulationReport {
        info!(
            chain_id = %self.config.chain_id,
            num_nodes = self.config.num_nodes,
            num_blocks = self.config.num_blocks,
            seed = self.config.seed,
            "starting simulation"
        );
        for height in 1..=self.config.num_blocks {
            self.run_height(height);
        }
        self.check_global_safety();
        let report = self.report();
        info!(
            log_digest = %report.log_digest,
            stalled = report.stalled_nodes.len(),
            "simulation finished"
        );
        report
    }

    /// Drives one height: the scheduled leader proposes, then the network is
    /// stepped until every node finalized the height or the step budget is
    /// exhausted. Unfinished nodes are reported as stalled, never as errors.
    fn run_height(&mut self, height: u64) {
        let leader = self.registry.leader(height);
        let outcomes = {
            let validator = self
                .validators
                .get_mut(&leader)
                .expect("leader must be a registered node");
            if validator.expected_height() == height {
                validator.propose(self.now, &mut self.events)
            } else {
                warn!(%leader, height, "scheduled proposer is behind; no proposal this height");
                Vec::new()
            }
        };
        let mut local = VecDeque::new();
        self.dispatch(leader, outcomes, &mut local);
        self.drain_local(&mut local);

        let deadline = self.now + self.config.step_budget;
        while self.now < deadline && !self.all_finalized(height) {
            self.step();
        }

        for (node_id, validator) in &self.validators {
            if validator.expected_height() == height {
                warn!(
                    node = %node_id, height,
                    "no majority precommit within the step budget; height stalled"
                );
                self.events.record(
                    self.now,
                    EventKind::HeightStalled {
                        node: *node_id,
                        height,
                    },
                );
                self.stalled.entry(*node_id).or_insert(height);
            }
        }
    }

    /// One tick: advance the network, then let nodes react in id order.
    fn step(&mut self) {
        self.now += 1;
        let delivered = self.network.advance(self.now, &mut self.events);

        let mut per_node: BTreeMap<NodeId, Vec<(NodeId, Payload)>> = BTreeMap::new();
        for (recipient, message) in delivered {
            let sender = message.sender;
            per_node
                .entry(recipient)
                .or_default()
                .push((sender, message.into_payload()));
        }

        let mut local = VecDeque::new();
        for (recipient, messages) in per_node {
            for (sender, payload) in messages {
                local.push_back((recipient, sender, payload));
            }
        }
        self.drain_local(&mut local);
    }

    /// Processes local deliveries until none remain. Reactions may enqueue
    /// further self-deliveries (a node observing its own gossip), so this
    /// loops rather than recursing.
    fn drain_local(&mut self, local: &mut VecDeque<LocalDelivery>) {
        while let Some((recipient, sender, payload)) = local.pop_front() {
            let outcomes = self
                .validators
                .get_mut(&recipient)
                .expect("recipient must be a registered node")
                .handle_message(self.now, sender, payload, &mut self.events);
            self.dispatch(recipient, outcomes, local);
        }
    }

    fn dispatch(
        &mut self,
        origin: NodeId,
        outcomes: ProtocolOutcomes,
        local: &mut VecDeque<LocalDelivery>,
    ) {
        for outcome in outcomes {
            match outcome {
                ProtocolOutcome::CreatedGossipMessage(payload) => {
                    // The creator observes its own message without touching
                    // the network; everyone else gets it via broadcast.
                    local.push_back((origin, origin, payload.clone()));
                    self.network.broadcast(
                        self.now,
                        origin,
                        payload,
                        &mut self.rng,
                        &mut self.events,
                    );
                }
                ProtocolOutcome::FinalizedBlock(finalized) => {
                    debug!(
                        node = %origin,
                        height = finalized.height,
                        block_hash = %finalized.block_hash,
                        "finalization outcome"
                    );
                }
            }
        }
    }

    fn all_finalized(&self, height: u64) -> bool {
        self.validators
            .values()
            .all(|validator| validator.ledger().height() >= height)
    }

    /// Cross-checks all nodes' finality records. Any disagreement is raised
    /// as a safety-violation event; it can never be recovered from.
    fn check_global_safety(&mut self) {
        for height in 1..=self.config.num_blocks {
            let mut first_recorded: Option<Digest> = None;
            for (node_id, validator) in &self.validators {
                let hash = match validator.ledger().finalized_hash(height) {
                    Some(hash) => hash,
                    None => continue,
                };
                match first_recorded {
                    None => first_recorded = Some(hash),
                    Some(first) if first == hash => {}
                    Some(first) => {
                        error!(
                            node = %node_id, height, %first, conflicting = %hash,
                            "nodes finalized conflicting blocks"
                        );
                        self.events.record(
                            self.now,
                            EventKind::SafetyViolation {
                                node: *node_id,
                                height,
                                recorded: first,
                                conflicting: hash,
                            },
                        );
                    }
                }
            }
        }
    }

    fn report(&self) -> SimulationReport {
        let total_nodes = self.validators.len();
        let mut finalized_nodes_per_height = BTreeMap::new();
        for height in 1..=self.config.num_blocks {
            let count = self
                .validators
                .values()
                .filter(|validator| validator.ledger().finalized_hash(height).is_some())
                .count();
            finalized_nodes_per_height.insert(height, count);
        }

        SimulationReport {
            chain_id: self.config.chain_id.clone(),
            blocks_requested: self.config.num_blocks,
            total_nodes,
            finalized_nodes_per_height,
            node_heights: self
                .validators
                .iter()
                .map(|(node_id, validator)| (node_id.to_string(), validator.ledger().height()))
                .collect(),
            state_commitments: self
                .validators
                .iter()
                .map(|(node_id, validator)| (node_id.to_string(), validator.state_commitment()))
                .collect(),
            stalled_nodes: self
                .stalled
                .iter()
                .map(|(node_id, height)| (node_id.to_string(), *height))
                .collect(),
            event_counts: self
                .events
                .counts()
                .into_iter()
                .map(|(name, count)| (name.to_string(), count))
                .collect(),
            log_digest: self.events.digest(),
        }
    }
}

/// Summary of a finished run.
#[derive(Clone, Debug, Serialize)]
pub struct SimulationReport {
    /// The chain identifier.
    pub chain_id: String,
    /// How many blocks the run tried to finalize.
    pub blocks_requested: u64,
    /// The validator count.
    pub total_nodes: usize,
    /// For each height, how many nodes finalized it.
    pub finalized_nodes_per_height: BTreeMap<u64, usize>,
    /// Each node's finalized chain height.
    pub node_heights: BTreeMap<String, u64>,
    /// Each node's state commitment after its last finalized block.
    pub state_commitments: BTreeMap<String, Digest>,
    /// Nodes that stalled, with the first height they got stuck at.
    pub stalled_nodes: BTreeMap<String, u64>,
    /// Event counts by event name.
    pub event_counts: BTreeMap<String, usize>,
    /// The determinism digest over the whole event log.
    pub log_digest: Digest,
}

impl SimulationReport {
    /// True iff every configured block was finalized by a strict majority of
    /// nodes.
    pub fn succeeded(&self) -> bool {
        (1..=self.blocks_requested).all(|height| {
            self.finalized_nodes_per_height
                .get(&height)
                .map_or(false, |count| 2 * count > self.total_nodes)
        })
    }

    /// True iff a safety violation was recorded.
    pub fn safety_violated(&self) -> bool {
        self.event_counts.contains_key("safety_violation")
    }
}

impl Display for SimulationReport {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        writeln!(
            f,
            "chain {:?}: {} block(s) requested, {} validator(s)",
            self.chain_id, self.blocks_requested, self.total_nodes
        )?;
        for (height, count) in &self.finalized_nodes_per_height {
            writeln!(
                f,
                "  height {}: {}/{} nodes finalized",
                height, count, self.total_nodes
            )?;
        }
        for (node, height) in &self.node_heights {
            let commitment = self
                .state_commitments
                .get(node)
                .copied()
                .map(Digest::to_hex)
                .unwrap_or_default();
            writeln!(f, "  {}: height {}, state {}", node, height, commitment)?;
        }
        if !self.stalled_nodes.is_empty() {
            let stalled = self
                .stalled_nodes
                .iter()
                .map(|(node, height)| format!("{} (height {})", node, height))
                .join(", ");
            writeln!(f, "  stalled: {}", stalled)?;
        }
        writeln!(f, "  log digest: {}", self.log_digest.to_hex())?;
        write!(
            f,
            "  result: {}",
            if self.succeeded() { "success" } else { "failure" }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::Simulation;
    use crate::{
        components::network::{self, MessageKind},
        config::Config,
        types::NodeId,
    };

    fn lossless_config() -> Config {
        Config {
            num_nodes: 4,
            num_blocks: 2,
            network: network::Config {
                min_delay: 1,
                max_delay: 3,
                drop_rate: 0.0,
                duplicate_rate: 0.0,
                rate_limit: 100,
            },
            ..Config::default()
        }
    }

    #[test]
    fn perfect_network_finalizes_everything() {
        let mut simulation = Simulation::new(lossless_config()).unwrap();
        let report = simulation.run();

        assert!(report.succeeded(), "report: {}", report);
        assert!(!report.safety_violated());
        assert!(report.stalled_nodes.is_empty());
        for height in 1..=2 {
            assert_eq!(report.finalized_nodes_per_height[&height], 4);
        }
        // All nodes agree on the final state.
        let commitments: Vec<_> = report.state_commitments.values().collect();
        assert!(commitments.windows(2).all(|pair| pair[0] == pair[1]));
    }

    #[test]
    fn blocked_precommits_stall_only_the_victim() {
        let mut simulation = Simulation::new(lossless_config()).unwrap();
        simulation.block_deliveries(MessageKind::Precommit, NodeId(3));
        let report = simulation.run();

        // Nodes 0..2 finalize every height; node 3 never observes a majority
        // of precommits and stalls at height 1.
        assert!(report.succeeded(), "report: {}", report);
        for height in 1..=2 {
            assert_eq!(report.finalized_nodes_per_height[&height], 3);
        }
        assert_eq!(report.node_heights["node3"], 0);
        assert_eq!(report.stalled_nodes.get("node3"), Some(&1));
        assert!(!report.safety_violated());
    }

    #[test]
    fn duplicated_deliveries_are_never_double_counted() {
        let mut config = lossless_config();
        config.network.duplicate_rate = 1.0;
        let mut simulation = Simulation::new(config).unwrap();
        let report = simulation.run();

        assert!(report.succeeded(), "report: {}", report);
        // Duplicates were scheduled but no voter was ever counted twice.
        assert!(report.event_counts.contains_key("message_duplicated"));
        assert!(!report.event_counts.contains_key("equivocation_detected"));
        assert!(!report.safety_violated());
    }

    #[test]
    fn identical_seed_and_config_reproduce_the_run_byte_for_byte() {
        let run = |seed: u64| {
            let mut config = lossless_config();
            config.seed = seed;
            config.network.drop_rate = 0.1;
            config.network.duplicate_rate = 0.05;
            let mut simulation = Simulation::new(config).unwrap();
            let report = simulation.run();
            (
                simulation.events().digest(),
                report.node_heights,
                report.state_commitments,
            )
        };

        assert_eq!(run(7), run(7));
    }

    #[test]
    fn different_seeds_produce_different_delivery_schedules() {
        let run = |seed: u64| {
            let mut config = lossless_config();
            config.seed = seed;
            config.network.drop_rate = 0.1;
            config.network.duplicate_rate = 0.05;
            let mut simulation = Simulation::new(config).unwrap();
            simulation.run();
            simulation.events().digest()
        };

        assert_ne!(run(1), run(2));
    }

    #[test]
    fn lossy_network_still_finalizes_for_a_majority_over_repeated_trials() {
        // drop_rate 0.2 and duplicate_rate 0.1 with an honest majority: a
        // strict majority of nodes should finalize the block in most trials.
        let mut successes = 0;
        let trials = 8;
        for seed in 0..trials {
            let config = Config {
                num_nodes: 7,
                num_blocks: 1,
                seed,
                step_budget: 100,
                network: network::Config {
                    min_delay: 1,
                    max_delay: 5,
                    drop_rate: 0.2,
                    duplicate_rate: 0.1,
                    rate_limit: 100,
                },
                ..Config::default()
            };
            let mut simulation = Simulation::new(config).unwrap();
            let report = simulation.run();
            assert!(!report.safety_violated(), "safety must hold in every trial");
            if report.succeeded() {
                successes += 1;
            }
        }
        assert!(
            successes * 2 >= trials,
            "only {}/{} lossy trials reached majority finality",
            successes,
            trials
        );
    }

    #[test]
    fn safety_holds_across_all_nodes_under_loss() {
        // Whatever the loss pattern, no two nodes may ever finalize different
        // blocks at the same height.
        for seed in 0..5 {
            let config = Config {
                num_nodes: 5,
                num_blocks: 3,
                seed,
                network: network::Config {
                    min_delay: 1,
                    max_delay: 6,
                    drop_rate: 0.3,
                    duplicate_rate: 0.1,
                    rate_limit: 3,
                },
                ..Config::default()
            };
            let mut simulation = Simulation::new(config).unwrap();
            let report = simulation.run();
            assert!(!report.safety_violated(), "seed {} violated safety", seed);
        }
    }
}
