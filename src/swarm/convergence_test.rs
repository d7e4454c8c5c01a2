//! Convergence analysis: how long does a stage-1 swarm take to settle,
//! and how does that change with population size?
//!
//! Run: cargo test --release convergence_analysis -- --nocapture --ignored

#[cfg(test)]
mod tests {
    use crate::core::config::{IntegrationPolicy, MonitorConfig, SwarmConfig};
    use crate::swarm::engine::SwarmEngine;
    use std::time::Instant;

    /// Energy trace of the default swarm, sampled every 50 ticks.
    #[test]
    #[ignore]
    fn convergence_analysis() {
        let sep = "=".repeat(72);
        println!("\n{}", sep);
        println!("  CONVERGENCE ANALYSIS: stage-1 swarm, J=8 K=-4");
        println!("{}\n", sep);

        for n in [50usize, 100, 200] {
            let mut engine = SwarmEngine::new(SwarmConfig::with_population(n)).unwrap();
            let t = Instant::now();

            println!("N = {}", n);
            println!("{:<8} | {:<14} | {:<14} | {:<8}", "Tick", "Energy", "Display max", "Idle");
            println!("{}", "-".repeat(52));
            for _ in 0..20 {
                let mut last = engine.step();
                for _ in 1..50 {
                    last = engine.step();
                }
                println!(
                    "{:<8} | {:<14.6e} | {:<14.6e} | {:<8}",
                    last.tick,
                    last.energy,
                    engine.monitor().display_max(),
                    engine.monitor().idle_frames()
                );
                if last.is_dead() {
                    println!("  -> equilibrium at tick {}", last.tick);
                    break;
                }
            }
            println!("  elapsed {:.2?}\n", t.elapsed());
        }
    }

    /// Overdamped vs damped regimes from the same initial condition.
    #[test]
    #[ignore]
    fn integration_policy_comparison() {
        for policy in [
            IntegrationPolicy::Overdamped,
            IntegrationPolicy::Damped { coefficient: 0.95 },
            IntegrationPolicy::Damped { coefficient: 0.8 },
        ] {
            let cfg = SwarmConfig {
                integration: policy,
                time_scale: 1.0,
                dt: 1.0,
                monitor: MonitorConfig {
                    capacity: 1000,
                    threshold_per_agent: 1e-6,
                    kill_frame_count: 100,
                },
                ..SwarmConfig::with_population(100)
            };
            let mut engine = SwarmEngine::new(cfg).unwrap();
            let last = engine.run_until_equilibrium(20_000);
            println!(
                "{:<40} -> {:?}",
                format!("{:?}", policy),
                last.map(|s| (s.tick, s.energy, s.state))
            );
        }
    }
}
