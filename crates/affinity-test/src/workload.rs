//! Workload generator - access streams with planted communities
//!
//! Each community owns a private pool of objects. Its identities draw their
//! accesses from that pool, with an occasional access into another
//! community's pool as noise.

use std::collections::BTreeSet;

use affinity_core::{AffinityGroup, Identity, ObjectId};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

/// Workload configuration
#[derive(Clone, Debug)]
pub struct WorkloadConfig {
    /// Number of planted communities
    pub communities: usize,
    pub identities_per_community: usize,
    pub objects_per_community: usize,
    /// Access events per identity
    pub accesses_per_identity: usize,
    /// Objects touched per access event
    pub objects_per_access: usize,
    /// Probability (0.0 - 1.0) that an object is drawn from another
    /// community. Out-of-range values are clamped; NaN means no noise.
    pub noise_prob: f64,
    /// Random seed
    pub seed: u64,
}

impl Default for WorkloadConfig {
    fn default() -> Self {
        WorkloadConfig {
            communities: 8,
            identities_per_community: 16,
            objects_per_community: 32,
            accesses_per_identity: 20,
            objects_per_access: 4,
            noise_prob: 0.02,
            seed: 42,
        }
    }
}

impl WorkloadConfig {
    /// Small, noise-free communities where every access touches the whole pool
    pub fn light() -> Self {
        WorkloadConfig {
            communities: 4,
            identities_per_community: 5,
            objects_per_community: 3,
            accesses_per_identity: 2,
            objects_per_access: 3,
            noise_prob: 0.0,
            seed: 42,
        }
    }

    /// Many communities with cross-community noise
    pub fn heavy() -> Self {
        WorkloadConfig {
            communities: 32,
            identities_per_community: 32,
            objects_per_community: 64,
            accesses_per_identity: 50,
            objects_per_access: 6,
            noise_prob: 0.05,
            seed: 42,
        }
    }

    pub fn identity_count(&self) -> usize {
        self.communities * self.identities_per_community
    }

    /// `noise_prob` as a valid probability
    pub fn noise(&self) -> f64 {
        if self.noise_prob.is_nan() {
            0.0
        } else {
            self.noise_prob.clamp(0.0, 1.0)
        }
    }
}

/// One unit of work
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AccessEvent {
    pub identity: Identity,
    pub objects: Vec<ObjectId>,
}

/// Seeded generator of access events
pub struct WorkloadGenerator {
    config: WorkloadConfig,
    rng: StdRng,
}

impl WorkloadGenerator {
    pub fn new(config: WorkloadConfig) -> Self {
        let rng = StdRng::seed_from_u64(config.seed);
        Self { config, rng }
    }

    pub fn config(&self) -> &WorkloadConfig {
        &self.config
    }

    fn identity(community: usize, index: usize) -> Identity {
        Identity::new(format!("c{:03}-i{:03}", community, index).as_str())
    }

    /// Object ids start at 1; 0 is the absent sentinel
    fn object(config: &WorkloadConfig, community: usize, index: usize) -> ObjectId {
        ObjectId::new(1 + (community * config.objects_per_community + index) as u64)
    }

    /// The planted partition, one group per community
    pub fn planted(&self) -> Vec<AffinityGroup> {
        (0..self.config.communities)
            .map(|c| {
                let members: BTreeSet<Identity> = (0..self.config.identities_per_community)
                    .map(|i| Self::identity(c, i))
                    .collect();
                AffinityGroup::new(c as u64, members)
            })
            .collect()
    }

    /// Generate the full access stream, interleaved across identities
    pub fn events(&mut self) -> Vec<AccessEvent> {
        let cfg = self.config.clone();
        let per_access = cfg.objects_per_access.min(cfg.objects_per_community);
        let pool: Vec<usize> = (0..cfg.objects_per_community).collect();
        let noise = cfg.noise();

        let mut events = Vec::with_capacity(cfg.identity_count() * cfg.accesses_per_identity);
        for _ in 0..cfg.accesses_per_identity {
            for c in 0..cfg.communities {
                for i in 0..cfg.identities_per_community {
                    let objects = pool
                        .choose_multiple(&mut self.rng, per_access)
                        .map(|&j| {
                            if cfg.communities > 1 && self.rng.gen_bool(noise) {
                                let other = (c + self.rng.gen_range(1..cfg.communities))
                                    % cfg.communities;
                                Self::object(&cfg, other, j)
                            } else {
                                Self::object(&cfg, c, j)
                            }
                        })
                        .collect();
                    events.push(AccessEvent {
                        identity: Self::identity(c, i),
                        objects,
                    });
                }
            }
        }
        events.shuffle(&mut self.rng);
        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_planted_partition() {
        let generator = WorkloadGenerator::new(WorkloadConfig::light());
        let planted = generator.planted();
        assert_eq!(planted.len(), 4);
        assert!(planted.iter().all(|g| g.len() == 5));
    }

    #[test]
    fn test_events_stay_in_community_without_noise() {
        let config = WorkloadConfig::light();
        let mut generator = WorkloadGenerator::new(config.clone());
        let events = generator.events();
        assert_eq!(events.len(), config.identity_count() * config.accesses_per_identity);

        for event in &events {
            assert_eq!(event.objects.len(), 3);
            let community: usize = event.identity.name()[1..4].parse().unwrap();
            for object in &event.objects {
                assert!(!object.is_absent());
                let owner = (object.0 as usize - 1) / config.objects_per_community;
                assert_eq!(owner, community);
            }
        }
    }

    #[test]
    fn test_seeded_streams_repeat() {
        let config = WorkloadConfig::default();
        let first = WorkloadGenerator::new(config.clone()).events();
        let second = WorkloadGenerator::new(config).events();
        assert_eq!(first, second);
    }

    #[test]
    fn test_out_of_range_noise_is_clamped() {
        let mut config = WorkloadConfig::light();
        for (raw, clamped) in [(1.5, 1.0), (-0.3, 0.0), (f64::NAN, 0.0), (0.25, 0.25)] {
            config.noise_prob = raw;
            assert_eq!(config.noise(), clamped);
        }

        // Always-noise: every object comes from another community
        config.noise_prob = 7.0;
        let events = WorkloadGenerator::new(config.clone()).events();
        for event in &events {
            let community: usize = event.identity.name()[1..4].parse().unwrap();
            for object in &event.objects {
                let owner = (object.0 as usize - 1) / config.objects_per_community;
                assert_ne!(owner, community);
            }
        }

        config.noise_prob = -2.0;
        assert_eq!(WorkloadGenerator::new(config).events().len(), 40);
    }

    proptest! {
        #[test]
        fn prop_object_ids_stay_in_range(
            communities in 1usize..6,
            per_community in 1usize..6,
            pool in 1usize..8,
            noise in -1.0f64..2.0,
            seed in any::<u64>(),
        ) {
            let config = WorkloadConfig {
                communities,
                identities_per_community: per_community,
                objects_per_community: pool,
                accesses_per_identity: 3,
                objects_per_access: 4,
                noise_prob: noise,
                seed,
            };
            let max = (communities * pool) as u64;
            let events = WorkloadGenerator::new(config.clone()).events();

            prop_assert_eq!(events.len(), config.identity_count() * 3);
            for event in &events {
                prop_assert_eq!(event.objects.len(), pool.min(4));
                for object in &event.objects {
                    prop_assert!(object.0 >= 1 && object.0 <= max);
                }
            }
        }
    }
}
