//! Unit tests for the gmrender source

#![allow(clippy::unwrap_used)]

use super::{GMRENDER_INTERFACE, instance_path, state_match_rule};

#[test]
fn instance_path_replaces_dashes() {
    assert_eq!(
        instance_path("5d1c2a9e-0b7f-4c1e-9a53-2f6b3e8d4c10"),
        "/com/hzeller/gmedia_resurrect/5d1c2a9e_0b7f_4c1e_9a53_2f6b3e8d4c10"
    );
}

#[test]
fn match_rule_without_uuid_follows_every_instance() {
    let rule = state_match_rule(None).unwrap().to_string();

    assert!(rule.contains("type='signal'"), "rule was {rule}");
    assert!(rule.contains(&format!("interface='{GMRENDER_INTERFACE}'")));
    assert!(rule.contains("member='State'"));
    assert!(!rule.contains("path="));
}

#[test]
fn match_rule_with_uuid_follows_one_instance() {
    let rule = state_match_rule(Some("living-room")).unwrap().to_string();

    assert!(
        rule.contains("path='/com/hzeller/gmedia_resurrect/living_room'"),
        "rule was {rule}"
    );
}

#[test]
fn uuid_that_is_no_valid_path_is_rejected() {
    assert!(state_match_rule(Some("not a uuid!")).is_err());
}
