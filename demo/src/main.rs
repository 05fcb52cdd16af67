use std::collections::HashMap;

use clap::Parser;
use log::info;
use ring::{HashRing, RingConfig};

mod modulo;
use modulo::ModuloHash;

#[derive(Parser)]
#[command(version, about, long_about = None)]
struct DemoArgs {
    /// Number of initial nodes.
    #[arg(short, long, default_value_t = 3)]
    nodes: usize,
    /// Number of sample keys to route.
    #[arg(short, long, default_value_t = 20)]
    keys: usize,
    /// Virtual nodes per unit of node weight.
    #[arg(long, default_value_t = 100)]
    vnodes: usize,
    /// Distinct physical nodes per replica set.
    #[arg(short, long, default_value_t = 3)]
    replication: usize,
}

fn main() -> ring::Result<()> {
    env_logger::init();
    let args = DemoArgs::parse();

    let nodes: Vec<String> = (0..args.nodes).map(|i| format!("node-{i}")).collect();
    let keys: Vec<String> = (0..args.keys).map(|i| format!("user_{i}")).collect();

    consistent_simulation(&args, &nodes, &keys)?;
    println!();
    modulo_simulation(&nodes, &keys);
    Ok(())
}

/// Seed a ring, route every key, resize by one node, and report how few
/// keys moved compared to the 1/(N+1) ideal.
fn consistent_simulation(args: &DemoArgs, nodes: &[String], keys: &[String]) -> ring::Result<()> {
    println!("== Consistent hashing ==");
    let config = RingConfig {
        vnodes_per_weight_unit: args.vnodes,
        replication_factor: args.replication,
    };
    let mut ring = HashRing::with_nodes(config, nodes.iter().map(|n| (n, 1)))?;
    info!(
        "seeded {} nodes, {} vnodes total",
        ring.len(),
        ring.vnode_count()
    );

    let mut initial: HashMap<String, String> = HashMap::new();
    let mut counts: HashMap<String, usize> = HashMap::new();
    for key in keys {
        let owner = ring
            .get_node(key)?
            .expect("the ring was just seeded")
            .to_owned();
        *counts.entry(owner.clone()).or_default() += 1;
        initial.insert(key.clone(), owner);
    }

    println!("initial distribution over {} nodes:", ring.len());
    for node in nodes {
        println!("  {node}: {} keys", counts.get(node).copied().unwrap_or(0));
    }

    println!("\nvirtual-node routing for the first keys:");
    for key in keys.iter().take(5) {
        if let Some((owner, vnode)) = ring.get_node_with_vnode(key)? {
            println!("  {key} -> {owner} (via {vnode})");
        }
    }

    println!("\nreplica sets (factor {}):", args.replication);
    for key in keys.iter().take(3) {
        println!("  {key} -> {:?}", ring.get_replicas(key)?);
    }

    let newcomer = format!("node-{}", nodes.len());
    println!("\n--- adding {newcomer} ---");
    ring.add_node(&newcomer, 1)?;

    let mut moved = 0usize;
    for key in keys {
        let owner = ring.get_node(key)?.expect("nodes were only added");
        if initial[key] != owner {
            moved += 1;
            println!("  {key} moved {} -> {owner}", initial[key]);
        }
    }

    let percent = 100.0 * moved as f64 / keys.len() as f64;
    let expected = 100.0 / (nodes.len() + 1) as f64;
    println!("moved {moved}/{} keys ({percent:.2}%)", keys.len());
    println!("consistent hashing expects ~1/(N+1) to move: ~{expected:.2}%");
    Ok(())
}

/// The same resize against the naive baseline, which strands ~N/(N+1) of
/// all keys.
fn modulo_simulation(nodes: &[String], keys: &[String]) {
    println!("== Modulo hashing (baseline) ==");
    let mut hasher = ModuloHash::new(nodes.iter().cloned());

    let mut initial: HashMap<String, String> = HashMap::new();
    for key in keys {
        let owner = hasher
            .get_node(key)
            .expect("the node list is not empty")
            .to_owned();
        initial.insert(key.clone(), owner);
    }

    let newcomer = format!("node-{}", nodes.len());
    println!("--- adding {newcomer} ---");
    hasher.add_node(&newcomer);

    let mut moved = 0usize;
    for key in keys {
        let owner = hasher.get_node(key).expect("nodes were only added");
        if initial[key] != owner {
            moved += 1;
            println!("  {key} moved {} -> {owner}", initial[key]);
        }
    }

    let percent = 100.0 * moved as f64 / keys.len() as f64;
    let expected = 100.0 * nodes.len() as f64 / (nodes.len() + 1) as f64;
    println!("moved {moved}/{} keys ({percent:.2}%)", keys.len());
    println!("modulo hashing expects ~N/(N+1) to move: ~{expected:.2}%");
}
