//! Address-space registry.
//!
//! This file tracks the subnets consumed during a run (plus those already
//! claimed by the host's container runtime) and hands out the next free
//! block from the configured pool. Allocation is deterministic: for a fixed
//! pool, fixed exclusion set, and fixed call order the same sequence of
//! subnets comes back every time.

use std::collections::HashSet;
use std::net::Ipv4Addr;

use ipnetwork::{IpNetwork, Ipv4Network};
use log::debug;

/// Errors that can occur while carving subnets from the pool.
#[derive(Debug, thiserror::Error)]
pub enum SubnetError {
    #[error("Subnet pool {pool} is exhausted: no free /{prefix} block left. Use a larger pool or declare fewer links")]
    PoolExhausted { pool: Ipv4Network, prefix: u8 },

    #[error("Requested prefix /{prefix} is shorter than the pool prefix /{pool_prefix}")]
    PrefixTooShort { prefix: u8, pool_prefix: u8 },

    #[error("Requested prefix /{prefix} is not a valid IPv4 prefix length")]
    InvalidPrefix { prefix: u8 },
}

/// Registry of claimed address space.
///
/// `used` holds blocks handed out this run; `existing` holds blocks
/// discovered from the container runtime at startup and is read-only for
/// the rest of the run. A block is never handed out if it equals or
/// overlaps a member of either set, and once handed out it is never reused
/// or freed within the run.
#[derive(Debug)]
pub struct AddressSpaceRegistry {
    used: HashSet<Ipv4Network>,
    existing: Vec<Ipv4Network>,
}

impl AddressSpaceRegistry {
    pub fn new(existing: Vec<Ipv4Network>) -> Self {
        debug!("Address registry seeded with {} existing subnets", existing.len());
        AddressSpaceRegistry {
            used: HashSet::new(),
            existing,
        }
    }

    /// Build a registry from subnets reported by the container runtime.
    ///
    /// The pool is IPv4, so IPv6 subnets cannot collide with it and are
    /// skipped.
    pub fn from_discovered(subnets: Vec<IpNetwork>) -> Self {
        let mut existing = Vec::new();
        for subnet in subnets {
            match subnet {
                IpNetwork::V4(net) => existing.push(net),
                IpNetwork::V6(net) => debug!("Ignoring IPv6 runtime subnet {}", net),
            }
        }
        Self::new(existing)
    }

    /// Hand out the next free block of the requested prefix length.
    ///
    /// Candidates are enumerated in ascending address order from the pool's
    /// network address. The first candidate that overlaps neither a block
    /// handed out this run nor a discovered block is recorded and returned.
    /// Overlap is symmetric: a candidate inside a larger claimed block is
    /// excluded, and so is a candidate that contains a smaller claimed one.
    pub fn next_subnet(
        &mut self,
        pool: Ipv4Network,
        prefix: u8,
    ) -> Result<Ipv4Network, SubnetError> {
        if prefix > 32 {
            return Err(SubnetError::InvalidPrefix { prefix });
        }
        if prefix < pool.prefix() {
            return Err(SubnetError::PrefixTooShort {
                prefix,
                pool_prefix: pool.prefix(),
            });
        }

        let block_size = 1u64 << (32 - prefix);
        let block_count = 1u64 << (prefix - pool.prefix());
        let base = u64::from(u32::from(pool.network()));

        for index in 0..block_count {
            let address = Ipv4Addr::from((base + index * block_size) as u32);
            let candidate = Ipv4Network::new(address, prefix)
                .map_err(|_| SubnetError::InvalidPrefix { prefix })?;
            if self.is_free(candidate) {
                debug!("Allocated subnet {}", candidate);
                self.used.insert(candidate);
                return Ok(candidate);
            }
        }

        Err(SubnetError::PoolExhausted { pool, prefix })
    }

    fn is_free(&self, candidate: Ipv4Network) -> bool {
        !self.used.iter().any(|used| used.overlaps(candidate))
            && !self.existing.iter().any(|existing| existing.overlaps(candidate))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn net(cidr: &str) -> Ipv4Network {
        cidr.parse().unwrap()
    }

    #[test]
    fn test_allocates_in_ascending_order() {
        let mut registry = AddressSpaceRegistry::new(Vec::new());
        let pool = net("172.16.0.0/16");

        assert_eq!(registry.next_subnet(pool, 24).unwrap(), net("172.16.0.0/24"));
        assert_eq!(registry.next_subnet(pool, 24).unwrap(), net("172.16.1.0/24"));
        assert_eq!(registry.next_subnet(pool, 24).unwrap(), net("172.16.2.0/24"));
    }

    #[test]
    fn test_skips_existing_subnets() {
        let existing = vec![net("172.16.0.0/24"), net("172.16.2.0/24")];
        let mut registry = AddressSpaceRegistry::new(existing);
        let pool = net("172.16.0.0/16");

        assert_eq!(registry.next_subnet(pool, 24).unwrap(), net("172.16.1.0/24"));
        assert_eq!(registry.next_subnet(pool, 24).unwrap(), net("172.16.3.0/24"));
    }

    #[test]
    fn test_deterministic_for_identical_seeds() {
        let seed = vec![net("172.16.1.0/24"), net("172.16.4.0/24")];
        let pool = net("172.16.0.0/16");

        let mut first = AddressSpaceRegistry::new(seed.clone());
        let mut second = AddressSpaceRegistry::new(seed);

        let sequence_a: Vec<_> = (0..5).map(|_| first.next_subnet(pool, 24).unwrap()).collect();
        let sequence_b: Vec<_> = (0..5).map(|_| second.next_subnet(pool, 24).unwrap()).collect();
        assert_eq!(sequence_a, sequence_b);
    }

    #[test]
    fn test_allocations_pairwise_disjoint_and_clear_of_exclusions() {
        let existing = vec![net("172.16.3.0/24"), net("172.16.7.0/24")];
        let mut registry = AddressSpaceRegistry::new(existing.clone());
        let pool = net("172.16.0.0/16");

        let allocated: Vec<_> = (0..10)
            .map(|_| registry.next_subnet(pool, 24).unwrap())
            .collect();

        for (i, a) in allocated.iter().enumerate() {
            for b in allocated.iter().skip(i + 1) {
                assert!(!a.overlaps(*b), "{} overlaps {}", a, b);
            }
            for excluded in &existing {
                assert!(!a.overlaps(*excluded), "{} overlaps excluded {}", a, excluded);
            }
        }
    }

    #[test]
    fn test_excludes_candidate_inside_larger_existing_block() {
        // The whole pool is already claimed by one big block.
        let mut registry = AddressSpaceRegistry::new(vec![net("172.16.0.0/16")]);
        let pool = net("172.16.0.0/16");

        assert!(matches!(
            registry.next_subnet(pool, 24),
            Err(SubnetError::PoolExhausted { .. })
        ));
    }

    #[test]
    fn test_excludes_candidate_containing_smaller_existing_block() {
        // A /30 inside 172.16.0.0/24 must knock out that whole /24 candidate.
        let mut registry = AddressSpaceRegistry::new(vec![net("172.16.0.64/30")]);
        let pool = net("172.16.0.0/16");

        assert_eq!(registry.next_subnet(pool, 24).unwrap(), net("172.16.1.0/24"));
    }

    #[test]
    fn test_pool_exhaustion() {
        let mut registry = AddressSpaceRegistry::new(Vec::new());
        let pool = net("10.99.0.0/24");

        assert_eq!(registry.next_subnet(pool, 24).unwrap(), net("10.99.0.0/24"));
        assert!(matches!(
            registry.next_subnet(pool, 24),
            Err(SubnetError::PoolExhausted { .. })
        ));
    }

    #[test]
    fn test_prefix_shorter_than_pool_rejected() {
        let mut registry = AddressSpaceRegistry::new(Vec::new());
        let pool = net("172.16.0.0/16");

        assert!(matches!(
            registry.next_subnet(pool, 8),
            Err(SubnetError::PrefixTooShort { prefix: 8, pool_prefix: 16 })
        ));
    }

    #[test]
    fn test_invalid_prefix_rejected() {
        let mut registry = AddressSpaceRegistry::new(Vec::new());
        let pool = net("172.16.0.0/16");

        assert!(matches!(
            registry.next_subnet(pool, 33),
            Err(SubnetError::InvalidPrefix { prefix: 33 })
        ));
    }

    #[test]
    fn test_non_canonical_pool_is_normalized() {
        let mut registry = AddressSpaceRegistry::new(Vec::new());
        // Host bits set in the pool spec; enumeration starts from the
        // network address regardless.
        let pool = net("172.16.5.9/16");

        assert_eq!(registry.next_subnet(pool, 24).unwrap(), net("172.16.0.0/24"));
    }

    #[test]
    fn test_from_discovered_skips_ipv6() {
        let discovered = vec![
            "172.17.0.0/16".parse::<IpNetwork>().unwrap(),
            "fd00:dead:beef::/64".parse::<IpNetwork>().unwrap(),
        ];
        let mut registry = AddressSpaceRegistry::from_discovered(discovered);
        let pool = net("172.16.0.0/15");

        // 172.16.0.0/15 spans 172.16.0.0 - 172.17.255.255; the discovered
        // IPv4 block excludes its upper half, the IPv6 block excludes nothing.
        assert_eq!(registry.next_subnet(pool, 24).unwrap(), net("172.16.0.0/24"));
    }
}
