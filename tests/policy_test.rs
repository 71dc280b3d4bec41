//! Integration tests for access decisions over real list files

mod common;

use common::*;
use curfew::{AccessGate, AccessPolicy, Config, ListKind, RuleSet};
use time::macros::datetime;

fn rules(fx: &Fixture, name: &str, content: &str) -> RuleSet {
    RuleSet::load(fx.write(name, content)).unwrap()
}

#[test]
fn test_school_hours_blacklist() {
    let fx = Fixture::new();
    let blacklist = rules(
        &fx,
        "blacklist",
        "# no videos during school hours\n\
         * 8-15 * * 1-5 (?i)(youtube|tiktok)\n\
         \n\
         // games all week\n\
         * * * * * \\.roblox\\.com$\n",
    );
    let policy = AccessPolicy::new(Some(blacklist), None, false);

    let decision = policy.decide(WEEKDAY, "www.YouTube.com").unwrap();
    assert!(!decision.allowed);
    assert_eq!(decision.matched.as_ref().unwrap().rule.line(), 2);

    assert!(policy.decide(WEEKEND, "www.youtube.com").unwrap().allowed);
    assert!(policy
        .decide(datetime!(2024-05-15 16:00 UTC), "www.youtube.com")
        .unwrap()
        .allowed);

    let decision = policy.decide(WEEKEND, "web.roblox.com").unwrap();
    assert!(!decision.allowed);
    assert_eq!(decision.matched.unwrap().rule.line(), 5);

    assert!(policy.decide(WEEKDAY, "roblox.com.example").unwrap().allowed);
}

#[test]
fn test_first_matching_rule_reported() {
    let fx = Fixture::new();
    let whitelist = rules(
        &fx,
        "whitelist",
        "* 9-17 * * * wiki\n* * * * * wikipedia\n",
    );
    let policy = AccessPolicy::new(None, Some(whitelist), true);

    let decision = policy.decide(WEEKDAY, "en.wikipedia.org").unwrap();
    assert!(decision.allowed);
    let matched = decision.matched.unwrap();
    assert_eq!(matched.list, ListKind::Whitelist);
    assert_eq!(matched.rule.line(), 1);

    let evening = datetime!(2024-05-15 20:00 UTC);
    let decision = policy.decide(evening, "en.wikipedia.org").unwrap();
    assert_eq!(decision.matched.unwrap().rule.line(), 2);
}

#[test]
fn test_month_and_day_fields() {
    let fx = Fixture::new();
    let blacklist = rules(
        &fx,
        "blacklist",
        "* * 24-26 12 * shop\n* * * 7,8 * homework\n",
    );
    let policy = AccessPolicy::new(Some(blacklist), None, true);

    assert!(!policy
        .decide(datetime!(2024-12-25 10:00 UTC), "shop.example")
        .unwrap()
        .allowed);
    assert!(policy
        .decide(datetime!(2024-12-27 10:00 UTC), "shop.example")
        .unwrap()
        .allowed);
    assert!(!policy
        .decide(datetime!(2024-08-01 10:00 UTC), "homework.example")
        .unwrap()
        .allowed);
    assert!(policy.decide(WEEKDAY, "homework.example").unwrap().allowed);
}

#[test]
fn test_sunday_is_day_zero() {
    let fx = Fixture::new();
    let blacklist = rules(&fx, "blacklist", "* * * * 0 games\n");
    let policy = AccessPolicy::new(Some(blacklist), None, true);

    let sunday = datetime!(2024-05-19 12:00 UTC);
    assert!(!policy.decide(sunday, "games.example").unwrap().allowed);
    assert!(policy.decide(WEEKEND, "games.example").unwrap().allowed);
}

#[test]
fn test_gate_from_config_file() {
    let fx = Fixture::new();
    let blacklist = fx.write("blocked.txt", "* * * * 1-5 youtube\n");
    let whitelist = fx.write("allowed.txt", "* * * * * wiki\n");
    let config_path = fx.write(
        "curfew.toml",
        &format!(
            "[lists]\nblacklist = {:?}\nwhitelist = {:?}\nuserlist = \"\"\ndefault_allow = false\n\n[logging]\nlog_requests = {{ allowed = false }}\n",
            blacklist.to_string_lossy(),
            whitelist.to_string_lossy(),
        ),
    );

    let config = Config::from_file(&config_path).unwrap();
    let gate = AccessGate::from_config(&config).unwrap();
    assert!(gate.credentials().is_none());
    assert!(!gate.policy().default_allow());

    assert!(!gate.decide(WEEKDAY, "youtube.com").unwrap().allowed);
    assert!(gate.decide(WEEKDAY, "wikipedia.org").unwrap().allowed);
    let fallback = gate.decide(WEEKDAY, "example.com").unwrap();
    assert!(!fallback.allowed);
    assert!(fallback.is_default());
}

#[test]
fn test_bad_rule_file_fails_load() {
    let fx = Fixture::new();
    let path = fx.write("blacklist", "* * * * * ok\n* 9-x * * * broken\n");
    let err = RuleSet::load(&path).unwrap_err();
    assert!(err.to_string().contains("line 2"), "{}", err);

    let path = fx.write("whitelist", "* * * * * (unclosed\n");
    assert!(RuleSet::load(&path).is_err());
}

#[test]
fn test_concurrent_decisions() {
    let fx = Fixture::new();
    let blacklist = rules(&fx, "blacklist", "* * * * 1-5 youtube\n");
    let policy = AccessPolicy::new(Some(blacklist), None, true);

    std::thread::scope(|s| {
        for i in 0..8 {
            let policy = &policy;
            s.spawn(move || {
                for _ in 0..200 {
                    let host = if i % 2 == 0 { "youtube.com" } else { "example.com" };
                    let decision = policy.decide(WEEKDAY, host).unwrap();
                    assert_eq!(decision.allowed, i % 2 == 1);
                }
            });
        }
    });
}
