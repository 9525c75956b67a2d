//! Route controller module.
//!
//! Turns suffix set membership answers into host route announcements. The
//! actual routing protocol lives behind the [`RouteSink`] trait; this module
//! only decides which host prefixes to announce or withdraw and with which
//! next hop.

use std::collections::HashSet;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::sync::Arc;

use ipnet::IpNet;
use parking_lot::Mutex;
use serde::Deserialize;
use tracing::debug;

use crate::error::{Result, RouteErrorKind, SetError};
use crate::matcher::HostMatcher;

/// Next hop used for IPv6 routes when none is configured
pub const DEFAULT_NEXT_HOP_IPV6: Ipv6Addr = Ipv6Addr::new(0xfd00, 0, 0, 0, 0, 0, 0, 1);

/// Route controller configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RouteConfig {
    /// Router identifier, last-resort IPv4 next hop
    pub router_id: Ipv4Addr,
    /// Explicit IPv4 next hop
    #[serde(default)]
    pub next_hop: Option<Ipv4Addr>,
    /// Explicit IPv6 next hop
    #[serde(default)]
    pub next_hop_ipv6: Option<Ipv6Addr>,
    /// Local source address; used as IPv4 next hop when it is IPv4
    #[serde(default)]
    pub source_ip: Option<IpAddr>,
    /// Announce IPv6 host routes
    #[serde(default)]
    pub ipv6: bool,
}

impl RouteConfig {
    /// Create a config with only a router id
    pub fn new(router_id: Ipv4Addr) -> Self {
        Self {
            router_id,
            next_hop: None,
            next_hop_ipv6: None,
            source_ip: None,
            ipv6: false,
        }
    }

    /// Parse and validate a JSON config
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Set explicit IPv4 next hop
    pub fn with_next_hop(mut self, next_hop: Ipv4Addr) -> Self {
        self.next_hop = Some(next_hop);
        self
    }

    /// Set explicit IPv6 next hop
    pub fn with_next_hop_ipv6(mut self, next_hop: Ipv6Addr) -> Self {
        self.next_hop_ipv6 = Some(next_hop);
        self
    }

    /// Set source address
    pub fn with_source_ip(mut self, source_ip: IpAddr) -> Self {
        self.source_ip = Some(source_ip);
        self
    }

    /// Enable or disable IPv6 routes
    pub fn with_ipv6(mut self, enabled: bool) -> Self {
        self.ipv6 = enabled;
        self
    }

    /// Check the config for unusable addresses
    pub fn validate(&self) -> Result<()> {
        if self.router_id.is_unspecified() {
            return Err(SetError::ConfigError(
                "router_id must not be 0.0.0.0".to_string(),
            ));
        }
        if self.next_hop.is_some_and(|nh| nh.is_unspecified()) {
            return Err(SetError::ConfigError(
                "next_hop must not be unspecified".to_string(),
            ));
        }
        if self.next_hop_ipv6.is_some_and(|nh| nh.is_unspecified()) {
            return Err(SetError::ConfigError(
                "next_hop_ipv6 must not be unspecified".to_string(),
            ));
        }
        Ok(())
    }

    /// IPv4 next hop: explicit, then IPv4 source address, then router id
    fn next_hop_v4(&self) -> Ipv4Addr {
        if let Some(nh) = self.next_hop {
            return nh;
        }
        match self.source_ip {
            Some(IpAddr::V4(src)) => src,
            _ => self.router_id,
        }
    }

    fn next_hop_v6(&self) -> Ipv6Addr {
        self.next_hop_ipv6.unwrap_or(DEFAULT_NEXT_HOP_IPV6)
    }
}

/// Host route for a single address
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HostRoute {
    /// `/32` or `/128` prefix covering exactly one address
    pub prefix: IpNet,
    /// Next hop announced for the prefix
    pub next_hop: IpAddr,
}

/// Destination for route announcements (the routing protocol speaker)
pub trait RouteSink: Send + Sync {
    /// Announce a host route
    fn announce(&self, route: &HostRoute) -> Result<()>;

    /// Withdraw a previously announced host route
    fn withdraw(&self, route: &HostRoute) -> Result<()>;
}

/// In-memory route sink, for dry runs and tests
#[derive(Debug, Default)]
pub struct MemorySink {
    routes: Mutex<HashSet<HostRoute>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Currently announced routes
    pub fn routes(&self) -> Vec<HostRoute> {
        self.routes.lock().iter().copied().collect()
    }

    /// Check if a route for `ip` is announced
    pub fn has(&self, ip: IpAddr) -> bool {
        self.routes.lock().iter().any(|r| r.prefix.addr() == ip)
    }

    pub fn len(&self) -> usize {
        self.routes.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.lock().is_empty()
    }
}

impl RouteSink for MemorySink {
    fn announce(&self, route: &HostRoute) -> Result<()> {
        self.routes.lock().insert(*route);
        Ok(())
    }

    fn withdraw(&self, route: &HostRoute) -> Result<()> {
        self.routes.lock().remove(route);
        Ok(())
    }
}

impl<S: RouteSink + ?Sized> RouteSink for Arc<S> {
    fn announce(&self, route: &HostRoute) -> Result<()> {
        (**self).announce(route)
    }

    fn withdraw(&self, route: &HostRoute) -> Result<()> {
        (**self).withdraw(route)
    }
}

/// Announces host routes for addresses of names that match a domain set
pub struct RouteController<M, S> {
    matcher: Arc<M>,
    sink: S,
    config: RouteConfig,
    announced: Mutex<HashSet<HostRoute>>,
}

impl<M: HostMatcher, S: RouteSink> RouteController<M, S> {
    /// Create a controller. Fails if the config does not validate.
    pub fn new(matcher: Arc<M>, sink: S, config: RouteConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            matcher,
            sink,
            config,
            announced: Mutex::new(HashSet::new()),
        })
    }

    /// Matcher consulted by [`observe`](Self::observe)
    pub fn matcher(&self) -> &Arc<M> {
        &self.matcher
    }

    /// Controller configuration
    pub fn config(&self) -> &RouteConfig {
        &self.config
    }

    /// Build the host route for `ip`.
    ///
    /// Returns `None` for IPv6 addresses when IPv6 routes are disabled.
    pub fn host_route(&self, ip: IpAddr) -> Option<HostRoute> {
        let (prefix_len, next_hop) = match ip {
            IpAddr::V4(_) => (32, IpAddr::V4(self.config.next_hop_v4())),
            IpAddr::V6(_) => {
                if !self.config.ipv6 {
                    return None;
                }
                (128, IpAddr::V6(self.config.next_hop_v6()))
            }
        };
        let prefix = IpNet::new(ip, prefix_len).ok()?;
        Some(HostRoute { prefix, next_hop })
    }

    /// Announce a host route for `ip`.
    ///
    /// Returns `Ok(true)` if a new route was announced, `Ok(false)` if it was
    /// already announced or the address family is disabled.
    pub fn add_host(&self, ip: IpAddr) -> Result<bool> {
        let Some(route) = self.host_route(ip) else {
            return Ok(false);
        };

        let mut announced = self.announced.lock();
        if announced.contains(&route) {
            return Ok(false);
        }
        self.sink.announce(&route).map_err(|e| reject(&route, "announce", e))?;
        announced.insert(route);
        debug!(prefix = %route.prefix, next_hop = %route.next_hop, "host route announced");
        Ok(true)
    }

    /// Withdraw the host route for `ip`, if announced.
    pub fn del_host(&self, ip: IpAddr) -> Result<bool> {
        let Some(route) = self.host_route(ip) else {
            return Ok(false);
        };

        let mut announced = self.announced.lock();
        if !announced.contains(&route) {
            return Ok(false);
        }
        self.sink.withdraw(&route).map_err(|e| reject(&route, "withdraw", e))?;
        announced.remove(&route);
        debug!(prefix = %route.prefix, "host route withdrawn");
        Ok(true)
    }

    /// Announce every address of `name` if the name matches the domain set.
    /// Returns the number of newly announced routes.
    pub fn observe(&self, name: &str, ips: &[IpAddr]) -> Result<usize> {
        if !self.matcher.matches(name) {
            return Ok(0);
        }

        let mut added = 0;
        for ip in ips {
            if self.add_host(*ip)? {
                added += 1;
            }
        }
        Ok(added)
    }

    /// Withdraw all announced routes. Returns the number withdrawn.
    pub fn withdraw_all(&self) -> Result<usize> {
        let mut announced = self.announced.lock();
        let routes: Vec<HostRoute> = announced.iter().copied().collect();
        for route in &routes {
            self.sink.withdraw(route).map_err(|e| reject(route, "withdraw", e))?;
            announced.remove(route);
        }
        Ok(routes.len())
    }

    /// Number of routes currently announced through this controller
    pub fn announced(&self) -> usize {
        self.announced.lock().len()
    }
}

fn reject(route: &HostRoute, op: &str, err: SetError) -> SetError {
    match err {
        e @ SetError::RouteError { .. } => e,
        e => SetError::RouteError {
            kind: RouteErrorKind::Rejected,
            message: format!("Unable to {} {}: {}", op, route.prefix, e),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matcher::SuffixSet;

    /// Matches every non-empty name
    struct AllMatcher;

    impl HostMatcher for AllMatcher {
        fn matches(&self, name: &str) -> bool {
            !name.is_empty()
        }
    }

    fn config() -> RouteConfig {
        RouteConfig::new(Ipv4Addr::new(10, 0, 0, 1))
    }

    fn controller(
        domains: &[&str],
        config: RouteConfig,
    ) -> RouteController<SuffixSet, Arc<MemorySink>> {
        let set = Arc::new(SuffixSet::new());
        set.build(domains.iter().copied()).unwrap();
        RouteController::new(set, Arc::new(MemorySink::new()), config).unwrap()
    }

    struct FailingSink;

    impl RouteSink for FailingSink {
        fn announce(&self, _route: &HostRoute) -> Result<()> {
            Err(SetError::ConfigError("peer down".into()))
        }

        fn withdraw(&self, _route: &HostRoute) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_next_hop_selection_v4() {
        let ip: IpAddr = "192.0.2.7".parse().unwrap();

        let c = controller(&["example.com"], config());
        let route = c.host_route(ip).unwrap();
        assert_eq!(route.prefix, "192.0.2.7/32".parse::<IpNet>().unwrap());
        assert_eq!(route.next_hop, IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1)));

        let c = controller(
            &["example.com"],
            config().with_source_ip("10.0.0.9".parse().unwrap()),
        );
        assert_eq!(c.host_route(ip).unwrap().next_hop.to_string(), "10.0.0.9");

        let c = controller(
            &["example.com"],
            config()
                .with_source_ip("10.0.0.9".parse().unwrap())
                .with_next_hop(Ipv4Addr::new(10, 0, 0, 254)),
        );
        assert_eq!(c.host_route(ip).unwrap().next_hop.to_string(), "10.0.0.254");

        // IPv6 source address is not a usable IPv4 next hop
        let c = controller(
            &["example.com"],
            config().with_source_ip("2001:db8::9".parse().unwrap()),
        );
        assert_eq!(c.host_route(ip).unwrap().next_hop.to_string(), "10.0.0.1");
    }

    #[test]
    fn test_next_hop_selection_v6() {
        let ip: IpAddr = "2001:db8::7".parse().unwrap();

        let c = controller(&["example.com"], config());
        assert!(c.host_route(ip).is_none());
        assert!(!c.add_host(ip).unwrap());

        let c = controller(&["example.com"], config().with_ipv6(true));
        let route = c.host_route(ip).unwrap();
        assert_eq!(route.prefix, "2001:db8::7/128".parse::<IpNet>().unwrap());
        assert_eq!(route.next_hop, IpAddr::V6(DEFAULT_NEXT_HOP_IPV6));

        let c = controller(
            &["example.com"],
            config()
                .with_ipv6(true)
                .with_next_hop_ipv6("2001:db8::1".parse().unwrap()),
        );
        assert_eq!(c.host_route(ip).unwrap().next_hop.to_string(), "2001:db8::1");
    }

    #[test]
    fn test_observe_announces_matching_names() {
        let sink = Arc::new(MemorySink::new());
        let set = Arc::new(SuffixSet::new());
        set.build(["example.com"]).unwrap();
        let c = RouteController::new(set, sink.clone(), config()).unwrap();

        let ips: Vec<IpAddr> = vec!["192.0.2.1".parse().unwrap(), "192.0.2.2".parse().unwrap()];
        assert_eq!(c.observe("www.example.com", &ips).unwrap(), 2);
        let other: IpAddr = "192.0.2.3".parse().unwrap();
        assert_eq!(c.observe("notexample.com", &[other]).unwrap(), 0);

        // Already announced
        assert_eq!(c.observe("mail.example.com", &ips).unwrap(), 0);

        assert_eq!(sink.len(), 2);
        assert_eq!(c.announced(), 2);
        assert!(sink.has("192.0.2.1".parse().unwrap()));
        assert!(!sink.has(other));
    }

    #[test]
    fn test_observe_follows_rebuilt_set() {
        let sink = Arc::new(MemorySink::new());
        let set = Arc::new(SuffixSet::new());
        set.build(["example.com"]).unwrap();
        let c = RouteController::new(set.clone(), sink.clone(), config()).unwrap();

        let ip: IpAddr = "192.0.2.10".parse().unwrap();
        assert_eq!(c.observe("example.org", &[ip]).unwrap(), 0);

        set.build(["example.org"]).unwrap();
        assert_eq!(c.observe("example.org", &[ip]).unwrap(), 1);
        assert!(Arc::ptr_eq(c.matcher(), &set));
    }

    #[test]
    fn test_del_host_and_withdraw_all() {
        let sink = Arc::new(MemorySink::new());
        let c = RouteController::new(Arc::new(AllMatcher), sink.clone(), config()).unwrap();

        let a: IpAddr = "192.0.2.1".parse().unwrap();
        let b: IpAddr = "192.0.2.2".parse().unwrap();
        assert!(c.add_host(a).unwrap());
        assert!(c.add_host(b).unwrap());
        assert!(!c.add_host(a).unwrap());

        assert!(c.del_host(a).unwrap());
        assert!(!c.del_host(a).unwrap());
        assert_eq!(sink.routes().len(), 1);

        assert_eq!(c.withdraw_all().unwrap(), 1);
        assert!(sink.is_empty());
        assert_eq!(c.announced(), 0);
    }

    #[test]
    fn test_sink_failure_is_route_error() {
        let c = RouteController::new(Arc::new(AllMatcher), FailingSink, config()).unwrap();
        let err = c.add_host("192.0.2.1".parse().unwrap()).unwrap_err();
        assert!(matches!(
            err,
            SetError::RouteError {
                kind: RouteErrorKind::Rejected,
                ..
            }
        ));
        assert_eq!(c.announced(), 0);
    }

    #[test]
    fn test_config_from_json() {
        let json = r#"{
            "router_id": "10.0.0.1",
            "next_hop_ipv6": "2001:db8::1",
            "ipv6": true
        }"#;
        let config = RouteConfig::from_json(json).unwrap();
        assert_eq!(config.router_id, Ipv4Addr::new(10, 0, 0, 1));
        assert_eq!(config.next_hop, None);
        assert!(config.ipv6);

        let minimal = RouteConfig::from_json(r#"{"router_id": "10.0.0.1"}"#).unwrap();
        assert_eq!(minimal, RouteConfig::new(Ipv4Addr::new(10, 0, 0, 1)));
    }

    #[test]
    fn test_config_validation() {
        let result = RouteConfig::from_json(r#"{"router_id": "0.0.0.0"}"#);
        assert!(matches!(result, Err(SetError::ConfigError(_))));

        let result = RouteConfig::from_json(r#"{"router_id": "10.0.0.1", "next_hop": "0.0.0.0"}"#);
        assert!(matches!(result, Err(SetError::ConfigError(_))));

        let result = RouteConfig::from_json("not json");
        assert!(matches!(result, Err(SetError::JsonError(_))));

        let set = Arc::new(SuffixSet::new());
        let bad = RouteConfig::new(Ipv4Addr::UNSPECIFIED);
        assert!(RouteController::new(set, MemorySink::new(), bad).is_err());
    }
}
